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

use inkwell::basic_block::BasicBlock;
use inkwell::values::FunctionValue;
use inkwell::AddressSpace;
use tsl_lang::ast::{DataType, Expr, Stmt, VariableDecl};

use crate::codegen::expr::{codegen_expr, codegen_value};
use crate::codegen::{CompileContext, Error, LoopBlocks};

fn current_function<'ctx>(ctx: &CompileContext<'_, 'ctx>) -> FunctionValue<'ctx> {
    ctx.builder
        .get_insert_block()
        .and_then(|block| block.get_parent())
        .expect("statements are lowered inside a function")
}

fn block_is_open(ctx: &CompileContext) -> bool {
    ctx.builder
        .get_insert_block()
        .map(|block| block.get_terminator().is_none())
        .unwrap_or(false)
}

fn branch_if_open<'ctx>(ctx: &CompileContext<'_, 'ctx>, target: BasicBlock<'ctx>) -> Result<(), Error> {
    if block_is_open(ctx) {
        ctx.builder.build_unconditional_branch(target)?;
    }
    Ok(())
}

pub fn codegen_stmt<'a, 'ctx>(ctx: &mut CompileContext<'a, 'ctx>, stmt: &Stmt) -> Result<(), Error> {
    match stmt {
        Stmt::Expression(expr) => {
            codegen_expr(ctx, expr)?;
            Ok(())
        },
        Stmt::VariableDecl(decls) => {
            for decl in decls {
                codegen_variable_decl(ctx, decl)?;
            }
            Ok(())
        },
        Stmt::ArrayDecl { name, ty, count, init, .. } => {
            codegen_array_decl(ctx, name, ty, count, init.as_deref())
        },
        Stmt::Return(expr) => {
            match expr {
                Some(expr) => {
                    let value = codegen_value(ctx, expr)?;
                    ctx.builder.build_return(Some(&value))?;
                },
                None => {
                    ctx.builder.build_return(None)?;
                }
            }
            Ok(())
        },
        Stmt::If { cond, then_branch, else_branch } => {
            codegen_if(ctx, cond, then_branch, else_branch.as_deref())
        },
        Stmt::While { cond, body } => codegen_while(ctx, cond, body),
        Stmt::DoWhile { cond, body } => codegen_do_while(ctx, cond, body),
        Stmt::For { init, cond, iter, body } => {
            codegen_for(ctx, init.as_deref(), cond.as_ref(), iter.as_ref(), body)
        },
        Stmt::Break => codegen_jump(ctx, true),
        Stmt::Continue => codegen_jump(ctx, false),
        Stmt::Block(statements) => {
            ctx.push_var_symbol_layer();
            let result = statements.iter().try_for_each(|s| codegen_stmt(ctx, s));
            ctx.pop_var_symbol_layer();
            result
        },
        Stmt::TextureDecl(name) | Stmt::ShaderResourceDecl(name) => {
            codegen_resource_decl(ctx, name)
        }
    }
}

fn codegen_variable_decl<'a, 'ctx>(
    ctx: &mut CompileContext<'a, 'ctx>,
    decl: &VariableDecl
) -> Result<(), Error> {
    if ctx.has_var_symbol_in_top_layer(&decl.name) {
        return Err(Error::RedefinedVariable(decl.name.clone()));
    }

    let llvm_ty = ctx.llvm_type(&decl.ty)?;
    let slot = ctx.builder.build_alloca(llvm_ty, &decl.name)?;
    if let Some(init) = &decl.init {
        let value = codegen_value(ctx, init)?;
        ctx.builder.build_store(slot, value)?;
    }
    ctx.push_var_symbol(&decl.name, slot, decl.ty.clone())
}

fn codegen_array_decl<'a, 'ctx>(
    ctx: &mut CompileContext<'a, 'ctx>,
    name: &str,
    ty: &DataType,
    count: &Expr,
    init: Option<&[Expr]>
) -> Result<(), Error> {
    if ctx.has_var_symbol_in_top_layer(name) {
        return Err(Error::RedefinedVariable(name.into()));
    }

    let count = codegen_value(ctx, count)?;
    if !count.is_int_value() {
        return Err(Error::NonIntegerArraySize);
    }

    // the element count may only be known at run time, the storage is a
    // sized stack allocation either way
    let llvm_ty = ctx.llvm_type(ty)?;
    let slot = ctx
        .builder
        .build_array_alloca(llvm_ty, count.into_int_value(), name)?;

    if let Some(values) = init {
        for (i, value) in values.iter().enumerate() {
            let value = codegen_value(ctx, value)?;
            let index = ctx.context.i32_type().const_int(i as u64, false);
            let address = unsafe { ctx.builder.build_gep(llvm_ty, slot, &[index], "init")? };
            ctx.builder.build_store(address, value)?;
        }
    }

    ctx.push_var_symbol(name, slot, ty.clone())
}

fn codegen_if<'a, 'ctx>(
    ctx: &mut CompileContext<'a, 'ctx>,
    cond: &Expr,
    then_branch: &Stmt,
    else_branch: Option<&Stmt>
) -> Result<(), Error> {
    let cond = codegen_value(ctx, cond)?;
    let cond = ctx.convert_to_bool(cond)?;

    let function = current_function(ctx);
    let then_bb = ctx.context.append_basic_block(function, "then");
    let else_bb = else_branch.map(|_| ctx.context.append_basic_block(function, "else"));
    let merge_bb = ctx.context.append_basic_block(function, "ifcont");

    ctx.builder
        .build_conditional_branch(cond, then_bb, else_bb.unwrap_or(merge_bb))?;

    ctx.builder.position_at_end(then_bb);
    ctx.push_var_symbol_layer();
    let result = codegen_stmt(ctx, then_branch);
    ctx.pop_var_symbol_layer();
    result?;
    branch_if_open(ctx, merge_bb)?;

    if let (Some(else_bb), Some(else_branch)) = (else_bb, else_branch) {
        ctx.builder.position_at_end(else_bb);
        ctx.push_var_symbol_layer();
        let result = codegen_stmt(ctx, else_branch);
        ctx.pop_var_symbol_layer();
        result?;
        branch_if_open(ctx, merge_bb)?;
    }

    ctx.builder.position_at_end(merge_bb);
    Ok(())
}

fn codegen_while<'a, 'ctx>(
    ctx: &mut CompileContext<'a, 'ctx>,
    cond: &Expr,
    body: &Stmt
) -> Result<(), Error> {
    let function = current_function(ctx);
    let loop_begin = ctx.context.append_basic_block(function, "loop_begin");
    let loop_body = ctx.context.append_basic_block(function, "loop_body");
    let loop_end = ctx.context.append_basic_block(function, "loop_end");

    ctx.builder.build_unconditional_branch(loop_begin)?;

    ctx.push_var_symbol_layer();
    ctx.loop_blocks.push(LoopBlocks {
        continue_target: loop_begin,
        break_target: loop_end
    });

    ctx.builder.position_at_end(loop_begin);
    let cond = codegen_value(ctx, cond).and_then(|c| ctx.convert_to_bool(c));
    let result = cond.and_then(|cond| {
        ctx.builder.build_conditional_branch(cond, loop_body, loop_end)?;
        ctx.builder.position_at_end(loop_body);
        codegen_stmt(ctx, body)?;
        branch_if_open(ctx, loop_begin)
    });

    ctx.loop_blocks.pop();
    ctx.pop_var_symbol_layer();
    result?;

    ctx.builder.position_at_end(loop_end);
    Ok(())
}

fn codegen_do_while<'a, 'ctx>(
    ctx: &mut CompileContext<'a, 'ctx>,
    cond: &Expr,
    body: &Stmt
) -> Result<(), Error> {
    let function = current_function(ctx);
    let loop_body = ctx.context.append_basic_block(function, "loop_block");
    let loop_end = ctx.context.append_basic_block(function, "loop_end");

    ctx.builder.build_unconditional_branch(loop_body)?;

    ctx.push_var_symbol_layer();
    ctx.loop_blocks.push(LoopBlocks {
        continue_target: loop_body,
        break_target: loop_end
    });

    ctx.builder.position_at_end(loop_body);
    let result = codegen_stmt(ctx, body).and_then(|_| {
        if block_is_open(ctx) {
            let cond = codegen_value(ctx, cond)?;
            let cond = ctx.convert_to_bool(cond)?;
            ctx.builder.build_conditional_branch(cond, loop_body, loop_end)?;
        }
        Ok(())
    });

    ctx.loop_blocks.pop();
    ctx.pop_var_symbol_layer();
    result?;

    ctx.builder.position_at_end(loop_end);
    Ok(())
}

fn codegen_for<'a, 'ctx>(
    ctx: &mut CompileContext<'a, 'ctx>,
    init: Option<&Stmt>,
    cond: Option<&Expr>,
    iter: Option<&Expr>,
    body: &Stmt
) -> Result<(), Error> {
    let function = current_function(ctx);
    let loop_begin = ctx.context.append_basic_block(function, "for_begin");
    let loop_body = ctx.context.append_basic_block(function, "for_body");
    let loop_iter = ctx.context.append_basic_block(function, "for_iter");
    let loop_end = ctx.context.append_basic_block(function, "for_end");

    // the init statement lives in the scope of the loop
    ctx.push_var_symbol_layer();
    ctx.loop_blocks.push(LoopBlocks {
        continue_target: loop_iter,
        break_target: loop_end
    });

    let result = (|| -> Result<(), Error> {
        if let Some(init) = init {
            codegen_stmt(ctx, init)?;
        }
        ctx.builder.build_unconditional_branch(loop_begin)?;

        ctx.builder.position_at_end(loop_begin);
        match cond {
            Some(cond) => {
                let cond = codegen_value(ctx, cond)?;
                let cond = ctx.convert_to_bool(cond)?;
                ctx.builder.build_conditional_branch(cond, loop_body, loop_end)?;
            },
            // unlike while, a for loop is allowed to have no condition
            None => {
                ctx.builder.build_unconditional_branch(loop_body)?;
            }
        }

        ctx.builder.position_at_end(loop_body);
        codegen_stmt(ctx, body)?;
        branch_if_open(ctx, loop_iter)?;

        ctx.builder.position_at_end(loop_iter);
        if let Some(iter) = iter {
            codegen_expr(ctx, iter)?;
        }
        ctx.builder.build_unconditional_branch(loop_begin)?;
        Ok(())
    })();

    ctx.loop_blocks.pop();
    ctx.pop_var_symbol_layer();
    result?;

    ctx.builder.position_at_end(loop_end);
    Ok(())
}

/// `break` and `continue` branch to the recorded loop targets. Emission
/// continues in a fresh block so whatever follows stays well formed.
fn codegen_jump<'a, 'ctx>(ctx: &mut CompileContext<'a, 'ctx>, is_break: bool) -> Result<(), Error> {
    let target = match ctx.loop_blocks.last() {
        Some(blocks) => {
            if is_break {
                blocks.break_target
            } else {
                blocks.continue_target
            }
        },
        None => return Err(Error::JumpOutsideLoop)
    };

    ctx.builder.build_unconditional_branch(target)?;

    let function = current_function(ctx);
    let next = ctx.context.append_basic_block(function, "next_block");
    ctx.builder.position_at_end(next);
    Ok(())
}

/// Texture and resource handle declarations embed the host pointer as an
/// internal module constant. The declared name carries a sentinel type, it
/// only makes sense inside `texture2d_sample` style expressions.
fn codegen_resource_decl<'a, 'ctx>(
    ctx: &mut CompileContext<'a, 'ctx>,
    name: &str
) -> Result<(), Error> {
    let address = *ctx
        .resources
        .get(name)
        .ok_or_else(|| Error::UnregisteredResource(name.into()))?;

    let ptr_ty = ctx.context.ptr_type(AddressSpace::default());
    let handle = ctx
        .context
        .i64_type()
        .const_int(address as u64, false)
        .const_to_pointer(ptr_ty);

    let global = ctx.module.add_global(ptr_ty, None, name);
    global.set_linkage(inkwell::module::Linkage::Internal);
    global.set_constant(true);
    global.set_initializer(&handle);

    ctx.push_var_symbol(name, global.as_pointer_value(), DataType::VOID)
}
