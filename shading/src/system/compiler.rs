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

//! Compilation of one shader unit source into its LLVM module.

use std::collections::HashMap;

use inkwell::context::Context;
use inkwell::module::Module;
use log::debug;
use thiserror::Error;
use tsl_lang::ast::{DataKind, VariableConfig};
use tsl_lang::parser::{ParseError, Parser};

use crate::args::{ExposedArgDescriptor, GlobalVarList};
use crate::codegen::global_module::{
    collect_closure_names,
    declare_closure_thunk,
    declare_global_module,
    ClosureRegistry
};
use crate::codegen::{
    codegen_function,
    codegen_global_statement,
    codegen_struct_declaration,
    CompileContext,
    Error as CodegenError,
    TslGlobal
};

/// Reasons a shader unit fails to compile. Each of these also reaches the
/// host through `catch_debug`.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("{0}")]
    Parse(#[from] ParseError),
    #[error("{0}")]
    Codegen(#[from] CodegenError),
    #[error("shader unit template is already compiled")]
    AlreadyCompiled
}

/// Build the TSL global structure type for a registered layout.
pub(crate) fn build_tsl_global<'ctx>(
    ctx: &CompileContext<'_, 'ctx>,
    layout: &GlobalVarList
) -> Result<TslGlobal<'ctx>, CodegenError> {
    let field_types: Vec<_> = layout
        .var_list
        .iter()
        .map(|var| ctx.llvm_type(&var.ty.to_data_type()))
        .collect::<Result<_, _>>()?;
    let struct_type = ctx.context.opaque_struct_type("tsl_global");
    struct_type.set_body(&field_types, false);
    Ok(TslGlobal {
        struct_type,
        layout: layout.clone(),
        value: None
    })
}

/// Compile one source text into a fresh module. The shader root function is
/// emitted under `root_name` with external linkage; everything else stays
/// internal.
pub(crate) fn compile_unit<'ctx>(
    llvm: &'ctx Context,
    root_name: &str,
    source: &str,
    resources: &HashMap<String, usize>,
    tsl_global: &GlobalVarList,
    registry: &ClosureRegistry
) -> Result<(Module<'ctx>, Vec<ExposedArgDescriptor>), ShaderError> {
    let program = Parser::parse_source(source)?;

    // a shader unit has exactly one externally visible root
    let shader_count = program.functions.iter().filter(|f| f.is_shader).count();
    if shader_count != 1 {
        return Err(CodegenError::MissingShaderRoot.into());
    }

    let module = llvm.create_module(root_name);
    let builder = llvm.create_builder();
    let mut ctx = CompileContext::new(llvm, &module, &builder, resources);

    declare_global_module(&mut ctx);
    if !tsl_global.is_empty() {
        ctx.tsl_global = Some(build_tsl_global(&ctx, tsl_global)?);
    }

    // the constructor thunks live in the global module; here the touched
    // ones only need their declarations
    for closure in collect_closure_names(&program) {
        if let Some(item) = registry.lookup(&closure) {
            declare_closure_thunk(&mut ctx, &closure, &item)?;
        }
    }

    for declaration in &program.structures {
        codegen_struct_declaration(&mut ctx, declaration)?;
    }
    for statement in &program.globals {
        codegen_global_statement(&mut ctx, statement)?;
    }

    let mut exposed_args = Vec::new();
    for function in &program.functions {
        let link_name = function.is_shader.then(|| root_name);
        codegen_function(&mut ctx, function, link_name)?;
        if function.is_shader {
            for param in &function.params {
                if param.ty.kind == DataKind::Void {
                    return Err(CodegenError::InvalidDataType.into());
                }
                exposed_args.push(ExposedArgDescriptor {
                    name: param.name.clone(),
                    ty: param.ty.clone(),
                    is_output: param.config.contains(VariableConfig::OUTPUT)
                });
            }
        }
    }

    drop(ctx);
    debug!("compiled shader unit '{}'", root_name);
    Ok((module, exposed_args))
}
