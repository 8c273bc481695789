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

//! The closure registry and the built in declarations every module carries.
//!
//! Registered closure types are pure descriptions kept process wide; their
//! constructor thunks and the host intrinsic declarations are regenerated
//! inside each shading context's own LLVM context, which is what stands in
//! for cloning a shared module between contexts.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use inkwell::context::Context;
use inkwell::module::{Linkage, Module};
use inkwell::types::BasicMetadataTypeEnum;
use inkwell::AddressSpace;
use log::debug;
use tsl_lang::ast::{DataType, Expr, Program, Stmt};

use crate::closure::{ClosureId, ClosureTreeNodeBase, ClosureVarList, INVALID_CLOSURE_ID};
use crate::codegen::{CompileContext, Error, FunctionEntry, StructMeta};

/// A registered closure type: its id, parameter list and the byte size of
/// the host side parameter structure.
#[derive(Debug, Clone)]
pub struct ClosureItem {
    pub id: ClosureId,
    pub vars: ClosureVarList,
    pub size: i32
}

#[derive(Default)]
struct RegistryInner {
    closures: HashMap<String, ClosureItem>,
    next_id: ClosureId
}

/// Process wide closure registry. Registration is idempotent by name and
/// safe to call from any thread; ids are dense and start at 1.
pub struct ClosureRegistry {
    inner: Mutex<RegistryInner>
}

impl ClosureRegistry {
    pub fn new() -> ClosureRegistry {
        ClosureRegistry {
            inner: Mutex::new(RegistryInner {
                closures: HashMap::new(),
                next_id: 1
            })
        }
    }

    pub fn register(&self, name: &str, vars: ClosureVarList, size: i32) -> ClosureId {
        if size < 0 {
            return INVALID_CLOSURE_ID;
        }

        let mut inner = self.inner.lock().unwrap();
        if let Some(existing) = inner.closures.get(name) {
            return existing.id;
        }

        let id = inner.next_id;
        inner.next_id += 1;
        inner.closures.insert(name.into(), ClosureItem { id, vars, size });
        debug!("registered closure type '{}' with id {}", name, id);
        id
    }

    pub fn lookup(&self, name: &str) -> Option<ClosureItem> {
        self.inner.lock().unwrap().closures.get(name).cloned()
    }

    pub fn snapshot(&self) -> Vec<(String, ClosureItem)> {
        let inner = self.inner.lock().unwrap();
        let mut items: Vec<_> = inner
            .closures
            .iter()
            .map(|(name, item)| (name.clone(), item.clone()))
            .collect();
        items.sort_by_key(|(_, item)| item.id);
        items
    }
}

impl Default for ClosureRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Declare into a fresh compilation everything every module relies on: the
/// `float3` structure with its member aliases, the closure tree node types
/// and the host intrinsics.
pub fn declare_global_module(ctx: &mut CompileContext<'_, '_>) {
    let f32_ty = ctx.context.f32_type();
    let i32_ty = ctx.context.i32_type();
    let ptr_ty = ctx.context.ptr_type(AddressSpace::default());
    let void_ty = ctx.context.void_type();

    // float3 doubles as vector and color in shaders
    let float3_ty = ctx.context.opaque_struct_type("float3");
    float3_ty.set_body(&[f32_ty.into(), f32_ty.into(), f32_ty.into()], false);
    let mut members = HashMap::new();
    members.insert("x".into(), (0u32, DataType::FLOAT));
    members.insert("y".into(), (1u32, DataType::FLOAT));
    members.insert("z".into(), (2u32, DataType::FLOAT));
    members.insert("r".into(), (0u32, DataType::FLOAT));
    members.insert("g".into(), (1u32, DataType::FLOAT));
    members.insert("b".into(), (2u32, DataType::FLOAT));
    ctx.structs.insert(
        "float3".into(),
        StructMeta {
            llvm_type: float3_ty,
            members
        }
    );

    // closure tree node layouts, these mirror the host visible records and
    // the padding of the first field is implied by pointer alignment
    let base_ty = ctx.context.opaque_struct_type("closure_base");
    base_ty.set_body(&[i32_ty.into(), ptr_ty.into()], false);
    let mul_ty = ctx.context.opaque_struct_type("closure_mul");
    mul_ty.set_body(&[i32_ty.into(), ptr_ty.into(), f32_ty.into(), ptr_ty.into()], false);
    let add_ty = ctx.context.opaque_struct_type("closure_add");
    add_ty.set_body(&[i32_ty.into(), ptr_ty.into(), ptr_ty.into(), ptr_ty.into()], false);
    for (name, llvm_type) in [("closure_base", base_ty), ("closure_mul", mul_ty), ("closure_add", add_ty)] {
        ctx.structs.insert(
            name.into(),
            StructMeta {
                llvm_type,
                members: HashMap::new()
            }
        );
    }

    // host intrinsics, resolved to the callback shims at JIT time
    let malloc_ty = ptr_ty.fn_type(&[i32_ty.into()], false);
    let malloc = ctx.module.add_function("TSL_MALLOC", malloc_ty, Some(Linkage::External));
    ctx.functions.insert(
        "TSL_MALLOC".into(),
        FunctionEntry {
            function: malloc,
            prototype: None
        }
    );

    let sample_ty = void_ty.fn_type(
        &[ptr_ty.into(), ptr_ty.into(), f32_ty.into(), f32_ty.into()],
        false
    );
    let sample = ctx
        .module
        .add_function("TSL_TEXTURE2D_SAMPLE", sample_ty, Some(Linkage::External));
    ctx.functions.insert(
        "TSL_TEXTURE2D_SAMPLE".into(),
        FunctionEntry {
            function: sample,
            prototype: None
        }
    );

    let sample_alpha = ctx
        .module
        .add_function("TSL_TEXTURE2D_SAMPLE_ALPHA", sample_ty, Some(Linkage::External));
    ctx.functions.insert(
        "TSL_TEXTURE2D_SAMPLE_ALPHA".into(),
        FunctionEntry {
            function: sample_alpha,
            prototype: None
        }
    );
}

fn thunk_name(closure: &str) -> String {
    format!("make_closure_{}", closure)
}

fn thunk_arg_types<'ctx>(
    ctx: &CompileContext<'_, 'ctx>,
    item: &ClosureItem
) -> Result<Vec<BasicMetadataTypeEnum<'ctx>>, Error> {
    item.vars
        .iter()
        .map(|var| Ok(ctx.llvm_type(&var.ty.to_data_type())?.into()))
        .collect()
}

/// Declare the constructor thunk of a registered closure type so a shader
/// unit can call it; the definition lives in the global module linked in at
/// JIT time.
pub fn declare_closure_thunk(
    ctx: &mut CompileContext<'_, '_>,
    name: &str,
    item: &ClosureItem
) -> Result<(), Error> {
    let arg_types = thunk_arg_types(ctx, item)?;
    let ptr_ty = ctx.context.ptr_type(AddressSpace::default());
    let fn_ty = ptr_ty.fn_type(&arg_types, false);
    let function = ctx
        .module
        .add_function(&thunk_name(name), fn_ty, Some(Linkage::External));
    ctx.closures.insert(name.into(), function);
    Ok(())
}

/// Emit the constructor thunk of one closure type: allocate the parameter
/// record through `TSL_MALLOC`, copy every argument into it, allocate the
/// tree node and tag it with the closure id.
pub fn define_closure_thunk(
    ctx: &mut CompileContext<'_, '_>,
    name: &str,
    item: &ClosureItem
) -> Result<(), Error> {
    let arg_types = thunk_arg_types(ctx, item)?;
    let ptr_ty = ctx.context.ptr_type(AddressSpace::default());
    let fn_ty = ptr_ty.fn_type(&arg_types, false);
    let function = ctx
        .module
        .add_function(&thunk_name(name), fn_ty, Some(Linkage::External));

    let param_member_types: Vec<_> = item
        .vars
        .iter()
        .map(|var| ctx.llvm_type(&var.ty.to_data_type()))
        .collect::<Result<_, _>>()?;
    let param_ty = ctx.context.opaque_struct_type(&format!("closure_type_{}", name));
    param_ty.set_body(&param_member_types, false);

    let entry = ctx.context.append_basic_block(function, "entry");
    ctx.builder.position_at_end(entry);

    let malloc = ctx.functions["TSL_MALLOC"].function;
    let i32_ty = ctx.context.i32_type();

    // parameter record first
    let size = i32_ty.const_int(item.size as u64, false);
    let param_buf = ctx
        .builder
        .build_call(malloc, &[size.into()], "params")?
        .try_as_basic_value()
        .left()
        .ok_or(Error::VoidValue)?
        .into_pointer_value();

    for (i, var) in item.vars.iter().enumerate() {
        let value = function
            .get_nth_param(i as u32)
            .expect("thunk parameter count matches the registration");
        let address = ctx
            .builder
            .build_struct_gep(param_ty, param_buf, i as u32, &var.name)?;
        ctx.builder.build_store(address, value)?;
    }

    // then the tree node itself
    let node_size = i32_ty.const_int(std::mem::size_of::<ClosureTreeNodeBase>() as u64, false);
    let node = ctx
        .builder
        .build_call(malloc, &[node_size.into()], "node")?
        .try_as_basic_value()
        .left()
        .ok_or(Error::VoidValue)?
        .into_pointer_value();

    let base_ty = ctx.structs["closure_base"].llvm_type;
    let id = i32_ty.const_int(item.id as u64, true);
    let id_ptr = ctx.builder.build_struct_gep(base_ty, node, 0, "id")?;
    ctx.builder.build_store(id_ptr, id)?;
    let params_ptr = ctx.builder.build_struct_gep(base_ty, node, 1, "params")?;
    ctx.builder.build_store(params_ptr, param_buf)?;

    ctx.builder.build_return(Some(&node))?;

    ctx.closures.insert(name.into(), function);
    Ok(())
}

/// Build the module holding the thunk definitions of every registered
/// closure type, inside the given LLVM context.
pub fn build_global_module<'ctx>(
    llvm: &'ctx Context,
    registry: &ClosureRegistry
) -> Result<Module<'ctx>, Error> {
    let module = llvm.create_module("tsl_global_module");
    let builder = llvm.create_builder();
    let resources = HashMap::new();
    let mut ctx = CompileContext::new(llvm, &module, &builder, &resources);

    declare_global_module(&mut ctx);
    for (name, item) in registry.snapshot() {
        define_closure_thunk(&mut ctx, &name, &item)?;
    }

    drop(ctx);
    Ok(module)
}

/// Names of every closure type touched by a parsed program.
pub fn collect_closure_names(program: &Program) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for function in &program.functions {
        if let Some(body) = &function.body {
            for stmt in body {
                collect_stmt(stmt, &mut names);
            }
        }
    }
    for stmt in &program.globals {
        collect_stmt(stmt, &mut names);
    }
    names
}

fn collect_stmt(stmt: &Stmt, names: &mut BTreeSet<String>) {
    match stmt {
        Stmt::Expression(expr) | Stmt::Return(Some(expr)) => collect_expr(expr, names),
        Stmt::VariableDecl(decls) => {
            for decl in decls {
                if let Some(init) = &decl.init {
                    collect_expr(init, names);
                }
            }
        },
        Stmt::ArrayDecl { count, init, .. } => {
            collect_expr(count, names);
            if let Some(init) = init {
                init.iter().for_each(|e| collect_expr(e, names));
            }
        },
        Stmt::If { cond, then_branch, else_branch } => {
            collect_expr(cond, names);
            collect_stmt(then_branch, names);
            if let Some(else_branch) = else_branch {
                collect_stmt(else_branch, names);
            }
        },
        Stmt::While { cond, body } | Stmt::DoWhile { cond, body } => {
            collect_expr(cond, names);
            collect_stmt(body, names);
        },
        Stmt::For { init, cond, iter, body } => {
            if let Some(init) = init {
                collect_stmt(init, names);
            }
            if let Some(cond) = cond {
                collect_expr(cond, names);
            }
            if let Some(iter) = iter {
                collect_expr(iter, names);
            }
            collect_stmt(body, names);
        },
        Stmt::Block(statements) => statements.iter().for_each(|s| collect_stmt(s, names)),
        _ => {}
    }
}

fn collect_expr(expr: &Expr, names: &mut BTreeSet<String>) {
    match expr {
        Expr::MakeClosure { name, args } => {
            names.insert(name.clone());
            args.iter().for_each(|a| collect_expr(a, names));
        },
        Expr::Unary { operand, .. } => collect_expr(operand, names),
        Expr::Binary { left, right, .. } => {
            collect_expr(left, names);
            collect_expr(right, names);
        },
        Expr::PreInc(e) | Expr::PreDec(e) | Expr::PostInc(e) | Expr::PostDec(e) => {
            collect_expr(e, names)
        },
        Expr::Ternary { cond, true_expr, false_expr } => {
            collect_expr(cond, names);
            collect_expr(true_expr, names);
            collect_expr(false_expr, names);
        },
        Expr::Assign { target, value, .. } => {
            collect_expr(target, names);
            collect_expr(value, names);
        },
        Expr::FunctionCall { args, .. }
        | Expr::Float3Constructor(args)
        | Expr::Texture2dSample { args, .. } => {
            args.iter().for_each(|a| collect_expr(a, names));
        },
        Expr::ArrayAccess { var, index } => {
            collect_expr(var, names);
            collect_expr(index, names);
        },
        Expr::MemberRef { var, .. } => collect_expr(var, names),
        Expr::TypeCast { operand, .. } => collect_expr(operand, names),
        _ => {}
    }
}
