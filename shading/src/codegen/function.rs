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

use inkwell::module::Linkage;
use inkwell::types::{BasicMetadataTypeEnum, BasicType};
use inkwell::values::FunctionValue;
use inkwell::AddressSpace;
use tsl_lang::ast::{
    DataKind,
    Expr,
    FunctionPrototype,
    Stmt,
    StructDeclaration,
    VariableConfig
};

use crate::codegen::stmt::codegen_stmt;
use crate::codegen::{CompileContext, Error, FunctionEntry, StructMeta};

/// Lower a structure declaration into a named LLVM type plus member
/// metadata. A second declaration of the same name is ignored.
pub fn codegen_struct_declaration<'a, 'ctx>(
    ctx: &mut CompileContext<'a, 'ctx>,
    declaration: &StructDeclaration
) -> Result<(), Error> {
    if ctx.structs.contains_key(&declaration.name) {
        return Ok(());
    }

    let mut member_types = Vec::with_capacity(declaration.members.len());
    let mut members = HashMap::new();
    for (index, member) in declaration.members.iter().enumerate() {
        member_types.push(ctx.llvm_type(&member.ty)?);
        members.insert(member.name.clone(), (index as u32, member.ty.clone()));
    }

    let llvm_type = ctx.context.opaque_struct_type(&declaration.name);
    llvm_type.set_body(&member_types, false);

    ctx.structs
        .insert(declaration.name.clone(), StructMeta { llvm_type, members });
    Ok(())
}

/// Lower a function prototype, and its body when it has one.
///
/// Output parameters become pointers; when a TSL global layout is registered
/// the record pointer is appended as an implicit trailing parameter. Only
/// the shader root gets external linkage, under `link_name`.
pub fn codegen_function<'a, 'ctx>(
    ctx: &mut CompileContext<'a, 'ctx>,
    prototype: &'a FunctionPrototype,
    link_name: Option<&str>
) -> Result<FunctionValue<'ctx>, Error> {
    // no function overloading, a name identifies exactly one function
    if ctx.functions.contains_key(&prototype.name) {
        return Err(Error::DuplicatedFunction(prototype.name.clone()));
    }

    let ptr_ty = ctx.context.ptr_type(AddressSpace::default());

    let mut param_types: Vec<BasicMetadataTypeEnum> = Vec::with_capacity(prototype.params.len() + 1);
    for param in &prototype.params {
        if param.config.contains(VariableConfig::OUTPUT) {
            param_types.push(ptr_ty.into());
        } else {
            param_types.push(ctx.llvm_type(&param.ty)?.into());
        }
    }
    let has_tsl_global = ctx.tsl_global.is_some();
    if has_tsl_global {
        param_types.push(ptr_ty.into());
    }

    let fn_type = if prototype.return_type.kind == DataKind::Void {
        ctx.context.void_type().fn_type(&param_types, false)
    } else {
        ctx.llvm_type(&prototype.return_type)?.fn_type(&param_types, false)
    };

    let linkage = if prototype.is_shader {
        Linkage::External
    } else {
        Linkage::Internal
    };
    let name = link_name.unwrap_or(&prototype.name);
    let function = ctx.module.add_function(name, fn_type, Some(linkage));

    ctx.functions.insert(
        prototype.name.clone(),
        FunctionEntry {
            function,
            prototype: Some(prototype)
        }
    );

    if let Some(body) = &prototype.body {
        let entry = ctx.context.append_basic_block(function, "entry");
        ctx.builder.position_at_end(entry);

        ctx.push_var_symbol_layer();
        let result = codegen_function_body(ctx, prototype, function, has_tsl_global, body);
        ctx.pop_var_symbol_layer();
        if let Some(tsl) = ctx.tsl_global.as_mut() {
            tsl.value = None;
        }
        result?;
    }

    Ok(function)
}

fn codegen_function_body<'a, 'ctx>(
    ctx: &mut CompileContext<'a, 'ctx>,
    prototype: &'a FunctionPrototype,
    function: FunctionValue<'ctx>,
    has_tsl_global: bool,
    body: &'a [Stmt]
) -> Result<(), Error> {
    for (i, param) in prototype.params.iter().enumerate() {
        let incoming = function
            .get_nth_param(i as u32)
            .expect("parameter count mismatch");
        if param.config.contains(VariableConfig::OUTPUT) {
            // output parameters are slots of the caller, keep the pointer
            ctx.push_var_symbol(&param.name, incoming.into_pointer_value(), param.ty.clone())?;
        } else {
            let llvm_ty = ctx.llvm_type(&param.ty)?;
            let slot = ctx.builder.build_alloca(llvm_ty, &param.name)?;
            ctx.builder.build_store(slot, incoming)?;
            ctx.push_var_symbol(&param.name, slot, param.ty.clone())?;
        }
    }

    if has_tsl_global {
        let incoming = function
            .get_nth_param(prototype.params.len() as u32)
            .expect("tsl global parameter is declared");
        if let Some(tsl) = ctx.tsl_global.as_mut() {
            tsl.value = Some(incoming.into_pointer_value());
        }
    }

    for stmt in body {
        codegen_stmt(ctx, stmt)?;
    }

    // close the last block if the source fell off the end of the function
    let open = ctx
        .builder
        .get_insert_block()
        .map(|block| block.get_terminator().is_none())
        .unwrap_or(false);
    if open {
        if prototype.return_type.kind == DataKind::Void {
            ctx.builder.build_return(None)?;
        } else {
            ctx.builder.build_unreachable()?;
        }
    }
    Ok(())
}

/// File scope declarations: module globals, texture and resource handles.
///
/// Globals land in the bottom scope layer so every function of the unit can
/// see them. Initializers have to be literal constants, anything else zero
/// initializes.
pub fn codegen_global_statement<'a, 'ctx>(
    ctx: &mut CompileContext<'a, 'ctx>,
    stmt: &Stmt
) -> Result<(), Error> {
    match stmt {
        Stmt::TextureDecl(_) | Stmt::ShaderResourceDecl(_) => codegen_stmt(ctx, stmt),
        Stmt::VariableDecl(decls) => {
            for decl in decls {
                if ctx.has_var_symbol_in_top_layer(&decl.name) {
                    return Err(Error::RedefinedVariable(decl.name.clone()));
                }
                let llvm_ty = ctx.llvm_type(&decl.ty)?;
                let global = ctx.module.add_global(llvm_ty, None, &decl.name);
                global.set_linkage(Linkage::Internal);
                match &decl.init {
                    Some(init) => {
                        let value = codegen_const_initializer(ctx, init)?;
                        global.set_initializer(&value);
                    },
                    None => global.set_initializer(&llvm_ty.const_zero())
                }
                ctx.push_var_symbol(&decl.name, global.as_pointer_value(), decl.ty.clone())?;
            }
            Ok(())
        },
        Stmt::ArrayDecl { name, ty, count, .. } => {
            if ctx.has_var_symbol_in_top_layer(name) {
                return Err(Error::RedefinedVariable(name.clone()));
            }
            let length = match **count {
                Expr::LiteralInt(n) if n >= 0 => n as u32,
                _ => return Err(Error::NonConstantGlobalArraySize)
            };
            let llvm_ty = ctx.llvm_type(ty)?;
            let array_ty = llvm_ty.array_type(length);
            let global = ctx.module.add_global(array_ty, None, name);
            global.set_linkage(Linkage::Internal);
            global.set_initializer(&array_ty.const_zero());
            ctx.push_var_symbol(name, global.as_pointer_value(), ty.clone())
        },
        _ => Ok(())
    }
}

fn codegen_const_initializer<'a, 'ctx>(
    ctx: &CompileContext<'a, 'ctx>,
    init: &Expr
) -> Result<inkwell::values::BasicValueEnum<'ctx>, Error> {
    match init {
        Expr::LiteralInt(value) => {
            Ok(ctx.context.i32_type().const_int(*value as u64, true).into())
        },
        Expr::LiteralFloat(value) => {
            Ok(ctx.context.f32_type().const_float(*value as f64).into())
        },
        Expr::LiteralDouble(value) => Ok(ctx.context.f64_type().const_float(*value).into()),
        Expr::LiteralBool(value) => {
            Ok(ctx.context.bool_type().const_int(*value as u64, false).into())
        },
        _ => Err(Error::InvalidOperands("global initializer"))
    }
}
