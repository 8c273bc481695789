// Copyright (c) 2022, Tiny Shading Language Project
//
// All rights reserved.
//
// Redistribution and use in source and binary forms, with or without modification,
// are permitted provided that the following conditions are met:
//
//     * Redistributions of source code must retain the above copyright notice,
//       this list of conditions and the following disclaimer.
//     * Redistributions in binary form must reproduce the above copyright notice,
//       this list of conditions and the following disclaimer in the documentation
//       and/or other materials provided with the distribution.
//     * Neither the name of the Tiny Shading Language Project nor the names of its
//       contributors may be used to endorse or promote products derived from this
//       software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS
// "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT
// LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR
// A PARTICULAR PURPOSE ARE DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT OWNER OR
// CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL,
// EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO,
// PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES; LOSS OF USE, DATA, OR
// PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF
// LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING
// NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE OF THIS
// SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use inkwell::module::Linkage;
use inkwell::types::BasicMetadataTypeEnum;
use inkwell::values::{BasicMetadataValueEnum, PointerValue};
use inkwell::AddressSpace;
use log::{debug, error};
use tsl_lang::ast::{DataType, Expr};

use crate::args::{ExposedArgDescriptor, GlobalVarList, ShaderUnitInputDefaultValue};
use crate::codegen::global_module::declare_global_module;
use crate::codegen::{codegen_value, CompileContext};
use crate::status::ResolvingStatus;
use crate::system::compiler::build_tsl_global;
use crate::system::shader_unit::ShaderUnitTemplate;
use crate::system::shading_context::ShadingContext;

struct GroupExposedArg {
    unit: String,
    param: String,
    is_output: bool,
    alias: Option<String>
}

/// A composition of shader units wired together by named connections.
///
/// The group is a builder: adding units, connections, exposed arguments and
/// input defaults only caches the requests, everything happens when the
/// group resolves through [`ShadingContext::end_shader_group_template`],
/// which synthesises a wrapper root calling every member in dependency
/// order and returns the combined template.
pub struct ShaderGroupTemplate<'ctx> {
    pub(crate) name: String,
    pub(crate) context: &'ctx ShadingContext,
    units: HashMap<String, Rc<ShaderUnitTemplate<'ctx>>>,
    root: Option<String>,
    /// target unit -> target parameter -> (source unit, source parameter)
    connections: HashMap<String, HashMap<String, (String, String)>>,
    exposed: Vec<GroupExposedArg>,
    defaults: HashMap<String, HashMap<String, ShaderUnitInputDefaultValue>>,
    tsl_global: GlobalVarList,
    verification_enabled: bool
}

impl<'ctx> ShaderGroupTemplate<'ctx> {
    pub(crate) fn new(name: &str, context: &'ctx ShadingContext) -> ShaderGroupTemplate<'ctx> {
        ShaderGroupTemplate {
            name: name.into(),
            context,
            units: HashMap::new(),
            root: None,
            connections: HashMap::new(),
            exposed: Vec::new(),
            defaults: HashMap::new(),
            tsl_global: GlobalVarList::default(),
            verification_enabled: false
        }
    }

    /// Add a shader unit under a group local name. The same template may be
    /// added any number of times under distinct names; exactly one unit has
    /// to be the root.
    pub fn add_shader_unit(
        &mut self,
        name: &str,
        shader_unit: Rc<ShaderUnitTemplate<'ctx>>,
        is_root: bool
    ) -> bool {
        if self.units.contains_key(name) {
            return false;
        }
        if is_root {
            if self.root.is_some() {
                return false;
            }
            self.root = Some(name.into());
        }
        self.units.insert(name.into(), shader_unit);
        true
    }

    /// Cache a connection from an output of one unit to an input of
    /// another. Names are the group local ones.
    pub fn connect_shader_units(
        &mut self,
        source_unit: &str,
        source_param: &str,
        target_unit: &str,
        target_param: &str
    ) {
        self.connections
            .entry(target_unit.into())
            .or_default()
            .insert(target_param.into(), (source_unit.into(), source_param.into()));
    }

    /// Expose a parameter of a member unit on the synthesised wrapper. The
    /// wrapper's parameter order is the order of these calls.
    pub fn expose_shader_argument(
        &mut self,
        unit: &str,
        param: &str,
        is_output: bool,
        alias: Option<&str>
    ) {
        self.exposed.push(GroupExposedArg {
            unit: unit.into(),
            param: param.into(),
            is_output,
            alias: alias.map(str::to_owned)
        });
    }

    /// Default value of an unconnected, unexposed input.
    pub fn init_shader_input(&mut self, unit: &str, param: &str, value: ShaderUnitInputDefaultValue) {
        self.defaults
            .entry(unit.into())
            .or_default()
            .insert(param.into(), value);
    }

    /// Register the TSL global layout of the group. Member units that
    /// registered one themselves have to agree with it.
    pub fn register_tsl_global(&mut self, layout: &GlobalVarList) -> bool {
        if !self.tsl_global.is_empty() {
            return false;
        }
        self.tsl_global = layout.clone();
        true
    }

    pub fn set_verification_enabled(&mut self, enabled: bool) {
        self.verification_enabled = enabled;
    }

    fn argument_of(&self, unit: &str, param: &str) -> Option<ExposedArgDescriptor> {
        self.units
            .get(unit)?
            .exposed_args
            .iter()
            .find(|descriptor| descriptor.name == param)
            .cloned()
    }
}

fn unit_call_order(group: &ShaderGroupTemplate<'_>) -> Result<Vec<String>, ResolvingStatus> {
    fn visit(
        unit: &str,
        connections: &HashMap<String, HashMap<String, (String, String)>>,
        visited: &mut HashSet<String>,
        being_visited: &mut HashSet<String>,
        order: &mut Vec<String>
    ) -> Result<(), ResolvingStatus> {
        if visited.contains(unit) {
            return Ok(());
        }
        if !being_visited.insert(unit.into()) {
            return Err(ResolvingStatus::ShaderGroupWithCycles);
        }
        if let Some(inputs) = connections.get(unit) {
            for source in inputs.values() {
                visit(&source.0, connections, visited, being_visited, order)?;
            }
        }
        being_visited.remove(unit);
        visited.insert(unit.into());
        order.push(unit.into());
        Ok(())
    }

    let root = group.root.as_deref().expect("the root is checked before ordering");
    let mut visited = HashSet::new();
    let mut being_visited = HashSet::new();
    let mut order = Vec::new();
    visit(root, &group.connections, &mut visited, &mut being_visited, &mut order)?;

    // units whose outputs the host reads still run even when nothing
    // connects them to the root
    for exposed in &group.exposed {
        if exposed.is_output {
            visit(
                &exposed.unit,
                &group.connections,
                &mut visited,
                &mut being_visited,
                &mut order
            )?;
        }
    }
    Ok(order)
}

fn validate_group(group: &ShaderGroupTemplate<'_>) -> Result<(), ResolvingStatus> {
    if group.root.is_none() {
        return Err(ResolvingStatus::ShaderGroupWithoutRoot);
    }

    let known = |name: &str| group.units.contains_key(name);
    let mut referenced: Vec<&str> = Vec::new();
    for (target, inputs) in &group.connections {
        referenced.push(target);
        for source in inputs.values() {
            referenced.push(&source.0);
        }
    }
    referenced.extend(group.exposed.iter().map(|e| e.unit.as_str()));
    referenced.extend(group.defaults.keys().map(String::as_str));
    if referenced.into_iter().any(|name| !known(name)) {
        return Err(ResolvingStatus::UndefinedShaderUnit);
    }

    for unit in group.units.values() {
        if unit.module.is_none() {
            return Err(ResolvingStatus::InvalidShaderGroupTemplate);
        }
        // every member has to agree on the TSL global layout
        if !unit.tsl_global.is_empty() && unit.tsl_global != group.tsl_global {
            return Err(ResolvingStatus::InconsistentTSLGlobalType);
        }
    }

    // connections have to run from an output to an input
    for (target, inputs) in &group.connections {
        for (target_param, source) in inputs {
            let source_arg = group
                .argument_of(&source.0, &source.1)
                .ok_or(ResolvingStatus::InvalidShaderGroupTemplate)?;
            let target_arg = group
                .argument_of(target, target_param)
                .ok_or(ResolvingStatus::InvalidShaderGroupTemplate)?;
            if !source_arg.is_output || target_arg.is_output {
                return Err(ResolvingStatus::InvalidShaderGroupTemplate);
            }
        }
    }
    Ok(())
}

/// Combine the group members into one module with a synthesised wrapper
/// root and hand back the resulting unit template.
pub(crate) fn resolve_group<'ctx>(
    group: ShaderGroupTemplate<'ctx>
) -> Result<ShaderUnitTemplate<'ctx>, ResolvingStatus> {
    validate_group(&group)?;
    let order = unit_call_order(&group)?;

    let llvm = group.context.llvm();
    let module = llvm.create_module(&group.name);
    let builder = llvm.create_builder();
    let resources = HashMap::new();
    let mut ctx = CompileContext::new(llvm, &module, &builder, &resources);
    declare_global_module(&mut ctx);

    if !group.tsl_global.is_empty() {
        ctx.tsl_global = Some(
            build_tsl_global(&ctx, &group.tsl_global)
                .map_err(|_| ResolvingStatus::InvalidArgType)?
        );
    }

    // inline a private copy of every member so the same template can show
    // up several times; the clone's root gets the group local name
    let mut linked_roots: HashMap<String, String> = HashMap::new();
    for local_name in &order {
        let unit = &group.units[local_name];
        let unit_module = unit.module.as_ref().expect("validated above");

        let buffer = unit_module.write_bitcode_to_memory();
        let clone = llvm.create_module_from_ir(buffer).map_err(|err| {
            error!("failed to clone shader unit '{}': {}", local_name, err);
            ResolvingStatus::UnspecifiedError
        })?;
        let root_fn = clone
            .get_function(&unit.root_function_name)
            .ok_or(ResolvingStatus::InvalidShaderGroupTemplate)?;
        let unique_name = format!("{}_{}", group.name, local_name);
        root_fn.as_global_value().set_name(&unique_name);
        module.link_in_module(clone).map_err(|err| {
            error!("failed to link shader unit '{}': {}", local_name, err);
            ResolvingStatus::UnspecifiedError
        })?;
        linked_roots.insert(local_name.clone(), unique_name);
    }

    // the wrapper's parameters are the exposed arguments in expose order
    let ptr_ty = ctx.context.ptr_type(AddressSpace::default());
    let mut param_types: Vec<BasicMetadataTypeEnum> = Vec::new();
    let mut wrapper_args: Vec<ExposedArgDescriptor> = Vec::new();
    let mut input_index: HashMap<(String, String), u32> = HashMap::new();
    for (index, exposed) in group.exposed.iter().enumerate() {
        let descriptor = group
            .argument_of(&exposed.unit, &exposed.param)
            .ok_or(ResolvingStatus::InvalidExposedParameter)?;
        if descriptor.is_output != exposed.is_output {
            return Err(ResolvingStatus::InvalidExposedParameter);
        }
        if exposed.is_output {
            param_types.push(ptr_ty.into());
        } else {
            let llvm_ty = ctx
                .llvm_type(&descriptor.ty)
                .map_err(|_| ResolvingStatus::InvalidArgType)?;
            param_types.push(llvm_ty.into());
            input_index.insert((exposed.unit.clone(), exposed.param.clone()), index as u32);
        }
        wrapper_args.push(ExposedArgDescriptor {
            name: exposed.alias.clone().unwrap_or_else(|| exposed.param.clone()),
            ty: descriptor.ty,
            is_output: exposed.is_output
        });
    }
    if !group.tsl_global.is_empty() {
        param_types.push(ptr_ty.into());
    }

    let wrapper_ty = ctx.context.void_type().fn_type(&param_types, false);
    let wrapper = module.add_function(&group.name, wrapper_ty, Some(Linkage::External));
    let entry = ctx.context.append_basic_block(wrapper, "entry");
    builder.position_at_end(entry);

    if !group.tsl_global.is_empty() {
        let tsl_param = wrapper
            .get_nth_param(group.exposed.len() as u32)
            .expect("the tsl global parameter is declared")
            .into_pointer_value();
        if let Some(tsl) = ctx.tsl_global.as_mut() {
            tsl.value = Some(tsl_param);
        }
    }

    // run every unit in dependency order, feeding captured outputs forward
    let mut outputs: HashMap<(String, String), (PointerValue, DataType)> = HashMap::new();
    for local_name in &order {
        let unit = &group.units[local_name];
        let function = module
            .get_function(&linked_roots[local_name])
            .ok_or(ResolvingStatus::UnspecifiedError)?;

        let mut call_args: Vec<BasicMetadataValueEnum> = Vec::new();
        for descriptor in &unit.exposed_args {
            if descriptor.is_output {
                let llvm_ty = ctx
                    .llvm_type(&descriptor.ty)
                    .map_err(|_| ResolvingStatus::InvalidArgType)?;
                let slot = builder
                    .build_alloca(llvm_ty, &format!("{}_{}", local_name, descriptor.name))
                    .map_err(|_| ResolvingStatus::UnspecifiedError)?;
                outputs.insert(
                    (local_name.clone(), descriptor.name.clone()),
                    (slot, descriptor.ty.clone())
                );
                call_args.push(slot.into());
                continue;
            }

            let connection = group
                .connections
                .get(local_name)
                .and_then(|inputs| inputs.get(&descriptor.name));
            if let Some((source_unit, source_param)) = connection {
                // value produced by an earlier unit, captured in a stack slot
                let (slot, ty) = outputs
                    .get(&(source_unit.clone(), source_param.clone()))
                    .ok_or(ResolvingStatus::InvalidShaderGroupTemplate)?;
                let llvm_ty = ctx
                    .llvm_type(ty)
                    .map_err(|_| ResolvingStatus::InvalidArgType)?;
                let value = builder
                    .build_load(llvm_ty, *slot, "routed")
                    .map_err(|_| ResolvingStatus::UnspecifiedError)?;
                call_args.push(value.into());
            } else if let Some(index) = input_index.get(&(local_name.clone(), descriptor.name.clone())) {
                let value = wrapper.get_nth_param(*index).expect("exposed inputs are parameters");
                call_args.push(value.into());
            } else if let Some(default) = group
                .defaults
                .get(local_name)
                .and_then(|defaults| defaults.get(&descriptor.name))
            {
                let value = materialize_default(&mut ctx, default, &descriptor.ty)?;
                call_args.push(value);
            } else {
                return Err(ResolvingStatus::ArgumentWithoutInitialization);
            }
        }

        if !unit.tsl_global.is_empty() {
            let tsl_value = ctx
                .tsl_global
                .as_ref()
                .and_then(|tsl| tsl.value)
                .ok_or(ResolvingStatus::InconsistentTSLGlobalType)?;
            call_args.push(tsl_value.into());
        }

        builder
            .build_call(function, &call_args, "")
            .map_err(|_| ResolvingStatus::UnspecifiedError)?;
    }

    // copy captured outputs into the wrapper's output parameters
    for (index, exposed) in group.exposed.iter().enumerate() {
        if !exposed.is_output {
            continue;
        }
        let (slot, ty) = outputs
            .get(&(exposed.unit.clone(), exposed.param.clone()))
            .ok_or(ResolvingStatus::InvalidExposedParameter)?;
        let llvm_ty = ctx
            .llvm_type(ty)
            .map_err(|_| ResolvingStatus::InvalidArgType)?;
        let value = builder
            .build_load(llvm_ty, *slot, "out")
            .map_err(|_| ResolvingStatus::UnspecifiedError)?;
        let out_param = wrapper
            .get_nth_param(index as u32)
            .expect("exposed outputs are parameters")
            .into_pointer_value();
        builder
            .build_store(out_param, value)
            .map_err(|_| ResolvingStatus::UnspecifiedError)?;
    }

    builder
        .build_return(None)
        .map_err(|_| ResolvingStatus::UnspecifiedError)?;

    drop(ctx);
    debug!("resolved shader group '{}' with {} unit call(s)", group.name, order.len());

    let mut template = ShaderUnitTemplate::new(&group.name, group.context);
    template.module = Some(module);
    template.exposed_args = wrapper_args;
    template.tsl_global = group.tsl_global.clone();
    template.verification_enabled = group.verification_enabled;
    Ok(template)
}

/// Lower a cached default value by rewriting it into the literal expression
/// it stands for; `tsl_global_ref` defaults read the group's global record.
fn materialize_default<'a, 'ctx>(
    ctx: &mut CompileContext<'a, 'ctx>,
    default: &ShaderUnitInputDefaultValue,
    expected: &DataType
) -> Result<BasicMetadataValueEnum<'ctx>, ResolvingStatus> {
    let expr = match default {
        ShaderUnitInputDefaultValue::Int(value) => Expr::LiteralInt(*value),
        ShaderUnitInputDefaultValue::Float(value) => Expr::LiteralFloat(*value),
        ShaderUnitInputDefaultValue::Double(value) => Expr::LiteralDouble(*value),
        ShaderUnitInputDefaultValue::Bool(value) => Expr::LiteralBool(*value),
        ShaderUnitInputDefaultValue::Float3(value) => Expr::Float3Constructor(vec![
            Expr::LiteralFloat(value.x),
            Expr::LiteralFloat(value.y),
            Expr::LiteralFloat(value.z),
        ]),
        ShaderUnitInputDefaultValue::TslGlobalRef(name) => Expr::GlobalValue(name.clone())
    };

    let value = codegen_value(ctx, &expr).map_err(|err| {
        error!("failed to materialize a default input: {}", err);
        ResolvingStatus::InvalidShaderGroupTemplate
    })?;

    let expected_ty = ctx
        .llvm_type(expected)
        .map_err(|_| ResolvingStatus::InvalidArgType)?;
    if value.get_type() != expected_ty {
        return Err(ResolvingStatus::InvalidArgType);
    }
    Ok(value.into())
}
