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

use std::rc::Rc;

use inkwell::context::Context;
use inkwell::OptimizationLevel;
use log::{debug, error};

use crate::callback::{tsl_malloc, tsl_texture2d_sample, tsl_texture2d_sample_alpha};
use crate::codegen::global_module::{build_global_module, ClosureRegistry};
use crate::status::ResolvingStatus;
use crate::system::shader_group::{resolve_group, ShaderGroupTemplate};
use crate::system::shader_unit::{ShaderInstance, ShaderUnitTemplate};

/// Per thread factory for shader templates and instances.
///
/// A shading context owns the LLVM context every template and instance made
/// from it lives in, which is why it is not `Send`: two threads wanting to
/// compile concurrently each make their own context.
pub struct ShadingContext {
    llvm: Context,
    registry: &'static ClosureRegistry
}

impl ShadingContext {
    pub(crate) fn new(registry: &'static ClosureRegistry) -> ShadingContext {
        ShadingContext {
            llvm: Context::create(),
            registry
        }
    }

    pub(crate) fn llvm(&self) -> &Context {
        &self.llvm
    }

    pub(crate) fn registry(&self) -> &'static ClosureRegistry {
        self.registry
    }

    /// Start building a shader unit template. Configure and compile it,
    /// then seal it with [`ShadingContext::end_shader_unit_template`].
    pub fn begin_shader_unit_template(&self, name: &str) -> ShaderUnitTemplate<'_> {
        ShaderUnitTemplate::new(name, self)
    }

    /// Seal a shader unit template. The returned handle is immutable and
    /// shareable between groups and instances.
    pub fn end_shader_unit_template<'ctx>(
        &self,
        template: ShaderUnitTemplate<'ctx>
    ) -> Rc<ShaderUnitTemplate<'ctx>> {
        template.seal()
    }

    /// Start building a shader group template.
    pub fn begin_shader_group_template(&self, name: &str) -> ShaderGroupTemplate<'_> {
        ShaderGroupTemplate::new(name, self)
    }

    /// Resolve a shader group: wire the member units together and produce
    /// the combined template the group instantiates from.
    pub fn end_shader_group_template<'ctx>(
        &self,
        group: ShaderGroupTemplate<'ctx>
    ) -> Result<Rc<ShaderUnitTemplate<'ctx>>, ResolvingStatus> {
        resolve_group(group).map(ShaderUnitTemplate::seal)
    }

    /// JIT link a shader instance and cache its entry point.
    pub fn resolve_shader_instance<'ctx>(
        &self,
        instance: &mut ShaderInstance<'ctx>
    ) -> ResolvingStatus {
        let template = Rc::clone(&instance.template);
        let template_module = match template.module.as_ref() {
            Some(module) => module,
            None => return ResolvingStatus::InvalidInput
        };
        let llvm = template.context.llvm();

        // work on a clone so one template can resolve any number of instances
        let buffer = template_module.write_bitcode_to_memory();
        let module = match llvm.create_module_from_ir(buffer) {
            Ok(module) => module,
            Err(err) => {
                error!("failed to clone module of '{}': {}", template.name, err);
                return ResolvingStatus::UnspecifiedError;
            }
        };

        // pull in the closure constructors and intrinsic declarations
        let globals = match build_global_module(llvm, template.context.registry()) {
            Ok(globals) => globals,
            Err(err) => {
                error!("failed to build the global module: {}", err);
                return ResolvingStatus::UnspecifiedError;
            }
        };
        if let Err(err) = module.link_in_module(globals) {
            error!("failed to link the global module into '{}': {}", template.name, err);
            return ResolvingStatus::UnspecifiedError;
        }

        if template.verification_enabled {
            if let Err(message) = module.verify() {
                error!("verification of '{}' failed: {}", template.name, message.to_string());
                return ResolvingStatus::FunctionVerificationFailed;
            }
        }

        let engine = match module.create_jit_execution_engine(OptimizationLevel::Default) {
            Ok(engine) => engine,
            Err(err) => {
                error!("failed to create the execution engine: {}", err);
                return ResolvingStatus::UnspecifiedError;
            }
        };

        // bind the intrinsics to the callback shims before anything compiles
        let shims: [(&str, usize); 3] = [
            ("TSL_MALLOC", tsl_malloc as usize),
            ("TSL_TEXTURE2D_SAMPLE", tsl_texture2d_sample as usize),
            ("TSL_TEXTURE2D_SAMPLE_ALPHA", tsl_texture2d_sample_alpha as usize)
        ];
        for (name, address) in shims {
            if let Some(function) = module.get_function(name) {
                engine.add_global_mapping(&function, address);
            }
        }

        let address = match engine.get_function_address(&template.root_function_name) {
            Ok(address) => address,
            Err(err) => {
                error!(
                    "failed to look up root function '{}': {}",
                    template.root_function_name, err
                );
                return ResolvingStatus::UnspecifiedError;
            }
        };

        debug!("resolved shader instance of '{}'", template.name);
        instance.engine = Some(engine);
        instance.module = Some(module);
        instance.function_pointer = address as u64;
        ResolvingStatus::Succeed
    }
}
