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

use std::collections::HashMap;
use std::ffi::c_void;
use std::rc::{Rc, Weak};

use inkwell::execution_engine::ExecutionEngine;
use inkwell::module::Module;
use log::{error, warn};

use crate::args::{ExposedArgDescriptor, GlobalVarList};
use crate::callback::{emit_debug, DebugLevel};
use crate::system::compiler::{compile_unit, ShaderError};
use crate::system::shading_context::ShadingContext;

/// One compiled shader source.
///
/// A template cannot be executed by itself, it instantiates
/// [`ShaderInstance`]s which carry the JIT compiled entry point. Once a
/// template is sealed through
/// [`ShadingContext::end_shader_unit_template`] it stays immutable.
pub struct ShaderUnitTemplate<'ctx> {
    pub(crate) name: String,
    pub(crate) context: &'ctx ShadingContext,
    pub(crate) module: Option<Module<'ctx>>,
    pub(crate) root_function_name: String,
    pub(crate) exposed_args: Vec<ExposedArgDescriptor>,
    pub(crate) tsl_global: GlobalVarList,
    pub(crate) resources: HashMap<String, usize>,
    pub(crate) verification_enabled: bool,
    /// Backlink to the shared handle, filled in when the template seals.
    /// Instances clone it to keep their template alive.
    pub(crate) self_ref: Weak<ShaderUnitTemplate<'ctx>>
}

impl<'ctx> ShaderUnitTemplate<'ctx> {
    pub(crate) fn new(name: &str, context: &'ctx ShadingContext) -> ShaderUnitTemplate<'ctx> {
        ShaderUnitTemplate {
            name: name.into(),
            context,
            module: None,
            root_function_name: name.into(),
            exposed_args: Vec::new(),
            tsl_global: GlobalVarList::default(),
            resources: HashMap::new(),
            verification_enabled: false,
            self_ref: Weak::new()
        }
    }

    pub(crate) fn seal(mut self) -> Rc<ShaderUnitTemplate<'ctx>> {
        Rc::new_cyclic(|weak| {
            self.self_ref = weak.clone();
            self
        })
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Register the TSL global memory layout of this template. Only one
    /// layout can be registered.
    pub fn register_tsl_global(&mut self, layout: &GlobalVarList) -> bool {
        if !self.tsl_global.is_empty() {
            warn!("TSL global already registered in shader unit template {}", self.name);
            return false;
        }
        self.tsl_global = layout.clone();
        true
    }

    /// Bind an opaque host resource (a texture, a measured brdf...) under
    /// the name shaders declare it with.
    pub fn register_shader_resource(&mut self, name: &str, handle: *const c_void) -> bool {
        if handle.is_null() || self.resources.contains_key(name) {
            return false;
        }
        self.resources.insert(name.into(), handle as usize);
        true
    }

    /// Enable verification of the generated IR when instances resolve. Off
    /// by default for faster compilation.
    pub fn set_verification_enabled(&mut self, enabled: bool) {
        self.verification_enabled = enabled;
    }

    /// Compile the shader source of this template. Compiling a template a
    /// second time fails.
    pub fn compile_shader_source(&mut self, source: &str) -> Result<(), ShaderError> {
        if self.module.is_some() {
            return Err(ShaderError::AlreadyCompiled);
        }

        match compile_unit(
            self.context.llvm(),
            &self.root_function_name,
            source,
            &self.resources,
            &self.tsl_global,
            self.context.registry()
        ) {
            Ok((module, exposed_args)) => {
                self.module = Some(module);
                self.exposed_args = exposed_args;
                Ok(())
            },
            Err(err) => {
                error!("failed to compile shader unit '{}': {}", self.name, err);
                emit_debug(DebugLevel::Error, &err.to_string());
                Err(err)
            }
        }
    }

    /// Descriptors of the arguments the root function exposes, in
    /// declaration order.
    pub fn exposed_arguments(&self) -> &[ExposedArgDescriptor] {
        &self.exposed_args
    }

    /// Make a shader instance of this template. The instance holds on to
    /// its template, which in turn pins the owning shading context.
    ///
    /// Only sealed templates can instantiate, which the bracketed
    /// `begin_*` / `end_*` construction guarantees.
    pub fn make_shader_instance(&self) -> ShaderInstance<'ctx> {
        let template = self
            .self_ref
            .upgrade()
            .expect("the template has to be sealed through its end_*_template call first");
        ShaderInstance {
            template,
            engine: None,
            module: None,
            function_pointer: 0
        }
    }
}

/// A resolved realisation of a shader template.
///
/// Resolution happens through
/// [`ShadingContext::resolve_shader_instance`]; after it succeeds the cached
/// function pointer may be called from any number of threads at once, as
/// long as each invocation brings its own output memory.
pub struct ShaderInstance<'ctx> {
    pub(crate) template: Rc<ShaderUnitTemplate<'ctx>>,
    pub(crate) engine: Option<ExecutionEngine<'ctx>>,
    pub(crate) module: Option<Module<'ctx>>,
    pub(crate) function_pointer: u64
}

impl<'ctx> ShaderInstance<'ctx> {
    pub fn template(&self) -> &ShaderUnitTemplate<'ctx> {
        &self.template
    }

    /// The raw entry point address. It is up to the host to cast it to the
    /// signature matching the exposed arguments (plus the TSL global
    /// pointer when a layout is registered); a mismatch is undefined
    /// behavior. Zero until the instance resolves successfully.
    pub fn get_function(&self) -> u64 {
        self.function_pointer
    }
}
