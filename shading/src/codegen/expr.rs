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

use inkwell::values::{BasicMetadataValueEnum, BasicValueEnum, FloatValue, PointerValue};
use inkwell::{AddressSpace, FloatPredicate, IntPredicate};
use log::warn;
use tsl_lang::ast::{AssignOp, BinaryOp, DataKind, DataType, Expr, UnaryOp, VariableConfig};

use crate::callback::{emit_debug, DebugLevel};
use crate::closure::{ClosureTreeNodeAdd, ClosureTreeNodeMul, CLOSURE_ADD, CLOSURE_MUL};
use crate::codegen::{CompileContext, Error};

/// Whether an expression evaluates to a closure.
///
/// Mixing closures and non closures under `+`, or multiplying two closures
/// together, is rejected here before any code is emitted for the operands.
pub fn expr_is_closure(ctx: &CompileContext, expr: &Expr) -> Result<bool, Error> {
    match expr {
        Expr::MakeClosure { .. } => Ok(true),
        Expr::VariableRef(name) => Ok(ctx.get_var_type(name)?.kind == DataKind::Closure),
        Expr::Binary { op: BinaryOp::Add, left, right } => {
            let left = expr_is_closure(ctx, left)?;
            let right = expr_is_closure(ctx, right)?;
            if left != right {
                return Err(Error::ClosureAddMismatch);
            }
            Ok(left && right)
        },
        Expr::Binary { op: BinaryOp::Mul, left, right } => {
            let left = expr_is_closure(ctx, left)?;
            let right = expr_is_closure(ctx, right)?;
            if left && right {
                return Err(Error::ClosureMulPair);
            }
            Ok(left || right)
        },
        _ => Ok(false)
    }
}

/// Emit code for an expression. Calls to void functions produce no value.
pub fn codegen_expr<'a, 'ctx>(
    ctx: &mut CompileContext<'a, 'ctx>,
    expr: &Expr
) -> Result<Option<BasicValueEnum<'ctx>>, Error> {
    match expr {
        Expr::LiteralInt(value) => {
            Ok(Some(ctx.context.i32_type().const_int(*value as u64, true).into()))
        },
        Expr::LiteralFloat(value) => {
            Ok(Some(ctx.context.f32_type().const_float(*value as f64).into()))
        },
        Expr::LiteralDouble(value) => {
            Ok(Some(ctx.context.f64_type().const_float(*value).into()))
        },
        Expr::LiteralBool(value) => {
            Ok(Some(ctx.context.bool_type().const_int(*value as u64, false).into()))
        },
        Expr::GlobalValue(name) => codegen_global_value(ctx, name).map(Some),
        Expr::VariableRef(_) | Expr::ArrayAccess { .. } | Expr::MemberRef { .. } => {
            let (address, ty) = codegen_lvalue(ctx, expr)?;
            let llvm_ty = ctx.llvm_type(&ty)?;
            Ok(Some(ctx.builder.build_load(llvm_ty, address, "load")?))
        },
        Expr::Unary { op, operand } => codegen_unary(ctx, *op, operand),
        Expr::Binary { op, left, right } => codegen_binary(ctx, *op, left, right),
        Expr::PreInc(var) => codegen_incdec(ctx, var, true, true),
        Expr::PreDec(var) => codegen_incdec(ctx, var, false, true),
        Expr::PostInc(var) => codegen_incdec(ctx, var, true, false),
        Expr::PostDec(var) => codegen_incdec(ctx, var, false, false),
        Expr::Ternary { cond, true_expr, false_expr } => {
            let cond = codegen_value(ctx, cond)?;
            let cond = ctx.convert_to_bool(cond)?;
            let true_value = codegen_value(ctx, true_expr)?;
            let false_value = codegen_value(ctx, false_expr)?;
            Ok(Some(ctx.builder.build_select(cond, true_value, false_value, "select")?))
        },
        Expr::Assign { op, target, value } => codegen_assign(ctx, *op, target, value).map(Some),
        Expr::FunctionCall { name, args } => codegen_call(ctx, name, args),
        Expr::Float3Constructor(args) => codegen_float3_constructor(ctx, args).map(Some),
        Expr::MakeClosure { name, args } => codegen_make_closure(ctx, name, args).map(Some),
        Expr::Texture2dSample { handle, args, sample_alpha } => {
            codegen_texture_sample(ctx, handle, args, *sample_alpha).map(Some)
        },
        Expr::TypeCast { target, operand } => codegen_type_cast(ctx, target, operand).map(Some)
    }
}

/// Emit code for an expression that must produce a value.
pub fn codegen_value<'a, 'ctx>(
    ctx: &mut CompileContext<'a, 'ctx>,
    expr: &Expr
) -> Result<BasicValueEnum<'ctx>, Error> {
    codegen_expr(ctx, expr)?.ok_or(Error::VoidValue)
}

/// Resolve an lvalue to its storage slot and declared type, without loading.
pub fn codegen_lvalue<'a, 'ctx>(
    ctx: &mut CompileContext<'a, 'ctx>,
    expr: &Expr
) -> Result<(PointerValue<'ctx>, DataType), Error> {
    match expr {
        Expr::VariableRef(name) => ctx.get_var_symbol(name),
        Expr::ArrayAccess { var, index } => {
            let (base, elem_ty) = codegen_lvalue(ctx, var)?;
            let index = codegen_value(ctx, index)?;
            if !index.is_int_value() {
                return Err(Error::NonIntegerArrayIndex);
            }
            let llvm_elem = ctx.llvm_type(&elem_ty)?;
            // a single index over the element type, the slot is a plain run of elements
            let address = unsafe {
                ctx.builder
                    .build_gep(llvm_elem, base, &[index.into_int_value()], "elem_addr")?
            };
            Ok((address, elem_ty))
        },
        Expr::MemberRef { var, member } => {
            let (base, base_ty) = codegen_lvalue(ctx, var)?;
            let struct_name = base_ty
                .struct_name
                .clone()
                .ok_or_else(|| Error::UndefinedStruct(String::new()))?;
            let meta = ctx
                .structs
                .get(&struct_name)
                .ok_or_else(|| Error::UndefinedStruct(struct_name.clone()))?;
            let (index, member_ty) = meta
                .members
                .get(member)
                .cloned()
                .ok_or_else(|| Error::UndefinedMember {
                    name: struct_name.clone(),
                    member: member.clone()
                })?;
            let llvm_struct = meta.llvm_type;
            let address = ctx
                .builder
                .build_struct_gep(llvm_struct, base, index, member)?;
            Ok((address, member_ty))
        },
        _ => Err(Error::OutputArgNotLvalue)
    }
}

fn codegen_global_value<'a, 'ctx>(
    ctx: &mut CompileContext<'a, 'ctx>,
    name: &str
) -> Result<BasicValueEnum<'ctx>, Error> {
    let (struct_type, value_ptr, index, field_ty) = {
        let tsl = ctx.tsl_global.as_ref().ok_or(Error::TslGlobalNotRegistered)?;
        let index = tsl
            .layout
            .var_list
            .iter()
            .position(|var| var.name == name)
            .ok_or_else(|| Error::UnregisteredGlobalValue(name.into()))?;
        let value_ptr = tsl.value.ok_or(Error::TslGlobalNotRegistered)?;
        let field_ty = tsl.layout.var_list[index].ty.to_data_type();
        (tsl.struct_type, value_ptr, index as u32, field_ty)
    };

    let field_llvm = ctx.llvm_type(&field_ty)?;
    let address = ctx
        .builder
        .build_struct_gep(struct_type, value_ptr, index, name)?;
    Ok(ctx.builder.build_load(field_llvm, address, name)?)
}

fn codegen_unary<'a, 'ctx>(
    ctx: &mut CompileContext<'a, 'ctx>,
    op: UnaryOp,
    operand: &Expr
) -> Result<Option<BasicValueEnum<'ctx>>, Error> {
    match op {
        UnaryOp::Pos => codegen_expr(ctx, operand),
        UnaryOp::Neg => {
            let value = codegen_value(ctx, operand)?;
            if value.is_float_value() {
                Ok(Some(ctx.builder.build_float_neg(value.into_float_value(), "neg")?.into()))
            } else if value.is_int_value() {
                Ok(Some(ctx.builder.build_int_neg(value.into_int_value(), "neg")?.into()))
            } else if ctx.is_float3(value) {
                let negated = ctx.float3_elementwise(value, value, |elem, _| {
                    Ok(ctx.builder.build_float_neg(elem, "neg")?)
                })?;
                Ok(Some(negated))
            } else {
                Err(Error::InvalidOperands("-"))
            }
        },
        UnaryOp::Not => {
            let value = codegen_value(ctx, operand)?;
            let value = ctx.convert_to_bool(value)?;
            Ok(Some(ctx.builder.build_not(value, "not")?.into()))
        },
        UnaryOp::Compl => {
            let value = codegen_value(ctx, operand)?;
            if !value.is_int_value() {
                return Err(Error::IntegerOnlyOperator("~"));
            }
            let value = value.into_int_value();
            let zero = value.get_type().const_zero();
            Ok(Some(ctx.builder.build_xor(zero, value, "compl")?.into()))
        }
    }
}

fn codegen_binary<'a, 'ctx>(
    ctx: &mut CompileContext<'a, 'ctx>,
    op: BinaryOp,
    left: &Expr,
    right: &Expr
) -> Result<Option<BasicValueEnum<'ctx>>, Error> {
    // closure arithmetic allocates tree nodes instead of computing values
    match op {
        BinaryOp::Add => {
            let left_closure = expr_is_closure(ctx, left)?;
            let right_closure = expr_is_closure(ctx, right)?;
            if left_closure || right_closure {
                if !(left_closure && right_closure) {
                    return Err(Error::ClosureAddMismatch);
                }
                return codegen_closure_add(ctx, left, right).map(Some);
            }
        },
        BinaryOp::Mul => {
            let left_closure = expr_is_closure(ctx, left)?;
            let right_closure = expr_is_closure(ctx, right)?;
            if left_closure && right_closure {
                return Err(Error::ClosureMulPair);
            }
            if left_closure || right_closure {
                return codegen_closure_mul(ctx, left, right, left_closure).map(Some);
            }
        },
        _ => {}
    }

    let left = codegen_value(ctx, left)?;
    let right = codegen_value(ctx, right)?;

    let value = match op {
        BinaryOp::Add => codegen_arith(ctx, left, right, CompileContext::llvm_add)?,
        BinaryOp::Sub => codegen_arith(ctx, left, right, CompileContext::llvm_sub)?,
        BinaryOp::Mul => codegen_arith(ctx, left, right, CompileContext::llvm_mul)?,
        BinaryOp::Div => codegen_arith(ctx, left, right, CompileContext::llvm_div)?,
        BinaryOp::Mod => ctx.llvm_mod(left, right)?,
        BinaryOp::And => {
            let left = ctx.convert_to_bool(left)?;
            let right = ctx.convert_to_bool(right)?;
            ctx.builder.build_and(left, right, "and")?.into()
        },
        BinaryOp::Or => {
            let left = ctx.convert_to_bool(left)?;
            let right = ctx.convert_to_bool(right)?;
            ctx.builder.build_or(left, right, "or")?.into()
        },
        BinaryOp::Eq => codegen_compare(ctx, left, right, FloatPredicate::OEQ, IntPredicate::EQ)?,
        BinaryOp::Ne => codegen_compare(ctx, left, right, FloatPredicate::ONE, IntPredicate::NE)?,
        BinaryOp::Gt => codegen_compare(ctx, left, right, FloatPredicate::OGT, IntPredicate::SGT)?,
        BinaryOp::Lt => codegen_compare(ctx, left, right, FloatPredicate::OLT, IntPredicate::SLT)?,
        BinaryOp::Ge => codegen_compare(ctx, left, right, FloatPredicate::OGE, IntPredicate::SGE)?,
        BinaryOp::Le => codegen_compare(ctx, left, right, FloatPredicate::OLE, IntPredicate::SLE)?,
        BinaryOp::Shl => {
            let (left, right) = int_pair(left, right, "<<")?;
            ctx.builder.build_left_shift(left, right, "shl")?.into()
        },
        BinaryOp::Shr => {
            // shift right is arithmetic
            let (left, right) = int_pair(left, right, ">>")?;
            ctx.builder.build_right_shift(left, right, true, "shr")?.into()
        },
        BinaryOp::BitAnd => {
            let (left, right) = int_pair(left, right, "&")?;
            ctx.builder.build_and(left, right, "bit_and")?.into()
        },
        BinaryOp::BitOr => {
            let (left, right) = int_pair(left, right, "|")?;
            ctx.builder.build_or(left, right, "bit_or")?.into()
        },
        BinaryOp::BitXor => {
            let (left, right) = int_pair(left, right, "^")?;
            ctx.builder.build_xor(left, right, "bit_xor")?.into()
        }
    };
    Ok(Some(value))
}

fn int_pair<'ctx>(
    left: BasicValueEnum<'ctx>,
    right: BasicValueEnum<'ctx>,
    op: &'static str
) -> Result<(inkwell::values::IntValue<'ctx>, inkwell::values::IntValue<'ctx>), Error> {
    if !left.is_int_value() || !right.is_int_value() {
        return Err(Error::IntegerOnlyOperator(op));
    }
    Ok((left.into_int_value(), right.into_int_value()))
}

/// `+ - * /` over scalars and float3, with broadcast for mixed
/// scalar/vector operands.
fn codegen_arith<'a, 'ctx>(
    ctx: &CompileContext<'a, 'ctx>,
    left: BasicValueEnum<'ctx>,
    right: BasicValueEnum<'ctx>,
    scalar_op: fn(
        &CompileContext<'a, 'ctx>,
        BasicValueEnum<'ctx>,
        BasicValueEnum<'ctx>
    ) -> Result<BasicValueEnum<'ctx>, Error>
) -> Result<BasicValueEnum<'ctx>, Error> {
    if ctx.is_float3(left) || ctx.is_float3(right) {
        return ctx.float3_elementwise(left, right, |l, r| {
            scalar_op(ctx, l.into(), r.into()).map(BasicValueEnum::into_float_value)
        });
    }
    scalar_op(ctx, left, right)
}

fn codegen_compare<'a, 'ctx>(
    ctx: &CompileContext<'a, 'ctx>,
    left: BasicValueEnum<'ctx>,
    right: BasicValueEnum<'ctx>,
    float_pred: FloatPredicate,
    int_pred: IntPredicate
) -> Result<BasicValueEnum<'ctx>, Error> {
    if left.is_float_value() && right.is_float_value() {
        // ordered compares, NaN compares false
        Ok(ctx
            .builder
            .build_float_compare(float_pred, left.into_float_value(), right.into_float_value(), "cmp")?
            .into())
    } else if left.is_int_value() && right.is_int_value() {
        Ok(ctx
            .builder
            .build_int_compare(int_pred, left.into_int_value(), right.into_int_value(), "cmp")?
            .into())
    } else {
        Err(Error::InvalidOperands("comparison"))
    }
}

fn codegen_incdec<'a, 'ctx>(
    ctx: &mut CompileContext<'a, 'ctx>,
    var: &Expr,
    increment: bool,
    prefix: bool
) -> Result<Option<BasicValueEnum<'ctx>>, Error> {
    let (address, ty) = codegen_lvalue(ctx, var)?;
    let llvm_ty = ctx.llvm_type(&ty)?;
    let value = ctx.builder.build_load(llvm_ty, address, "load")?;

    if !value.is_int_value() {
        // wrong usage, leave the operand untouched
        return Ok(Some(value));
    }

    let int_value = value.into_int_value();
    let one = int_value.get_type().const_int(1, false);
    let updated = if increment {
        ctx.builder.build_int_add(int_value, one, "inc")?
    } else {
        ctx.builder.build_int_sub(int_value, one, "dec")?
    };
    ctx.builder.build_store(address, updated)?;

    Ok(Some(if prefix { updated.into() } else { value }))
}

fn codegen_assign<'a, 'ctx>(
    ctx: &mut CompileContext<'a, 'ctx>,
    op: AssignOp,
    target: &Expr,
    value: &Expr
) -> Result<BasicValueEnum<'ctx>, Error> {
    let (address, ty) = codegen_lvalue(ctx, target)?;

    if op == AssignOp::Assign {
        let to_assign = codegen_value(ctx, value)?;
        ctx.builder.build_store(address, to_assign)?;
        return Ok(to_assign);
    }

    let llvm_ty = ctx.llvm_type(&ty)?;
    let old = ctx.builder.build_load(llvm_ty, address, "load")?;
    let to_assign = codegen_value(ctx, value)?;

    let updated = match op {
        AssignOp::AddAssign => codegen_arith(ctx, old, to_assign, CompileContext::llvm_add)?,
        AssignOp::SubAssign => codegen_arith(ctx, old, to_assign, CompileContext::llvm_sub)?,
        AssignOp::MulAssign => codegen_arith(ctx, old, to_assign, CompileContext::llvm_mul)?,
        AssignOp::DivAssign => codegen_arith(ctx, old, to_assign, CompileContext::llvm_div)?,
        AssignOp::ModAssign => ctx.llvm_mod(old, to_assign)?,
        AssignOp::AndAssign => codegen_bitwise_assign(ctx, old, to_assign, "&=", |l, r| {
            Ok(ctx.builder.build_and(l, r, "and")?)
        })?,
        AssignOp::OrAssign => codegen_bitwise_assign(ctx, old, to_assign, "|=", |l, r| {
            Ok(ctx.builder.build_or(l, r, "or")?)
        })?,
        AssignOp::XorAssign => codegen_bitwise_assign(ctx, old, to_assign, "^=", |l, r| {
            Ok(ctx.builder.build_xor(l, r, "xor")?)
        })?,
        AssignOp::ShlAssign => codegen_bitwise_assign(ctx, old, to_assign, "<<=", |l, r| {
            Ok(ctx.builder.build_left_shift(l, r, "shl")?)
        })?,
        AssignOp::ShrAssign => codegen_bitwise_assign(ctx, old, to_assign, ">>=", |l, r| {
            Ok(ctx.builder.build_right_shift(l, r, true, "shr")?)
        })?,
        AssignOp::Assign => unreachable!("handled above")
    };

    ctx.builder.build_store(address, updated)?;
    Ok(updated)
}

/// The integer only compound assignments; a wider right hand side is
/// truncated to the width of the stored value.
fn codegen_bitwise_assign<'a, 'ctx, F>(
    ctx: &CompileContext<'a, 'ctx>,
    old: BasicValueEnum<'ctx>,
    to_assign: BasicValueEnum<'ctx>,
    op: &'static str,
    apply: F
) -> Result<BasicValueEnum<'ctx>, Error>
where
    F: Fn(
        inkwell::values::IntValue<'ctx>,
        inkwell::values::IntValue<'ctx>
    ) -> Result<inkwell::values::IntValue<'ctx>, Error>
{
    if !old.is_int_value() || !to_assign.is_int_value() {
        return Err(Error::IntegerOnlyOperator(op));
    }
    let old = old.into_int_value();
    let mut rhs = to_assign.into_int_value();
    if rhs.get_type().get_bit_width() != old.get_type().get_bit_width() {
        rhs = ctx.builder.build_int_cast(rhs, old.get_type(), "cast")?;
    }
    Ok(apply(old, rhs)?.into())
}

fn codegen_call<'a, 'ctx>(
    ctx: &mut CompileContext<'a, 'ctx>,
    name: &str,
    args: &[Expr]
) -> Result<Option<BasicValueEnum<'ctx>>, Error> {
    let entry = *ctx
        .functions
        .get(name)
        .ok_or_else(|| Error::UndefinedFunction(name.into()))?;

    let mut call_args: Vec<BasicMetadataValueEnum> = Vec::with_capacity(args.len() + 1);
    match entry.prototype {
        Some(prototype) => {
            if prototype.params.len() != args.len() {
                return Err(Error::ArgumentCountMismatch(name.into()));
            }
            for (param, arg) in prototype.params.iter().zip(args) {
                if param.config.contains(VariableConfig::OUTPUT) {
                    // output arguments are passed by pointer and must be lvalues
                    if !arg.is_lvalue() {
                        return Err(Error::OutputArgNotLvalue);
                    }
                    let (address, _) = codegen_lvalue(ctx, arg)?;
                    call_args.push(address.into());
                } else {
                    call_args.push(codegen_value(ctx, arg)?.into());
                }
            }
            // every function of a template with a TSL global layout takes the
            // record pointer as its implicit trailing argument
            if let Some(tsl) = &ctx.tsl_global {
                if let Some(value) = tsl.value {
                    call_args.push(value.into());
                }
            }
        },
        None => {
            for arg in args {
                call_args.push(codegen_value(ctx, arg)?.into());
            }
        }
    }

    let call = ctx.builder.build_call(entry.function, &call_args, "call")?;
    Ok(call.try_as_basic_value().left())
}

fn codegen_float3_constructor<'a, 'ctx>(
    ctx: &mut CompileContext<'a, 'ctx>,
    args: &[Expr]
) -> Result<BasicValueEnum<'ctx>, Error> {
    let float3_ty = ctx.float3_type();

    if args.is_empty() {
        let zero = ctx.context.f32_type().const_float(0.0);
        return Ok(float3_ty
            .const_named_struct(&[zero.into(), zero.into(), zero.into()])
            .into());
    }

    if args.len() > 3 {
        let message = "Too many arguments in vector constructor, the dummy ones will be ignored.";
        warn!("{}", message);
        emit_debug(DebugLevel::Warning, message);
    }

    let mut result = float3_ty.get_undef();
    let mut last = None;
    for i in 0..3u32 {
        let element = match args.get(i as usize) {
            Some(arg) => {
                let value = codegen_value(ctx, arg)?;
                let value = coerce_to_f32(ctx, value)?;
                last = Some(value);
                value
            },
            // fewer than three arguments broadcast the last one
            None => last.expect("args is non-empty")
        };
        result = ctx
            .builder
            .build_insert_value(result, element, i, "vec")?
            .into_struct_value();
    }
    Ok(result.into())
}

fn coerce_to_f32<'a, 'ctx>(
    ctx: &CompileContext<'a, 'ctx>,
    value: BasicValueEnum<'ctx>
) -> Result<FloatValue<'ctx>, Error> {
    if value.is_float_value() {
        let fv = value.into_float_value();
        if fv.get_type() == ctx.context.f32_type() {
            Ok(fv)
        } else {
            Ok(ctx.builder.build_float_trunc(fv, ctx.context.f32_type(), "trunc")?)
        }
    } else if value.is_int_value() {
        Ok(ctx.builder.build_signed_int_to_float(
            value.into_int_value(),
            ctx.context.f32_type(),
            "itof"
        )?)
    } else {
        Err(Error::InvalidOperands("vector constructor"))
    }
}

fn codegen_make_closure<'a, 'ctx>(
    ctx: &mut CompileContext<'a, 'ctx>,
    name: &str,
    args: &[Expr]
) -> Result<BasicValueEnum<'ctx>, Error> {
    let function = *ctx
        .closures
        .get(name)
        .ok_or_else(|| Error::UnregisteredClosure(name.into()))?;

    if function.count_params() as usize != args.len() {
        return Err(Error::ArgumentCountMismatch(format!("make_closure<{}>", name)));
    }

    let mut call_args: Vec<BasicMetadataValueEnum> = Vec::with_capacity(args.len());
    for arg in args {
        call_args.push(codegen_value(ctx, arg)?.into());
    }

    let call = ctx.builder.build_call(function, &call_args, "make_closure")?;
    call.try_as_basic_value().left().ok_or(Error::VoidValue)
}

/// `closure + closure` allocates an add node pointing at both operands.
fn codegen_closure_add<'a, 'ctx>(
    ctx: &mut CompileContext<'a, 'ctx>,
    left: &Expr,
    right: &Expr
) -> Result<BasicValueEnum<'ctx>, Error> {
    let left = codegen_value(ctx, left)?;
    let right = codegen_value(ctx, right)?;

    let node_ty = ctx.structs["closure_add"].llvm_type;
    let node = codegen_closure_node_alloc(ctx, std::mem::size_of::<ClosureTreeNodeAdd>())?;

    let id = ctx.context.i32_type().const_int(CLOSURE_ADD as u64, true);
    let id_ptr = ctx.builder.build_struct_gep(node_ty, node, 0, "id")?;
    ctx.builder.build_store(id_ptr, id)?;

    let left_ptr = ctx.builder.build_struct_gep(node_ty, node, 2, "closure0")?;
    ctx.builder.build_store(left_ptr, left)?;

    let right_ptr = ctx.builder.build_struct_gep(node_ty, node, 3, "closure1")?;
    ctx.builder.build_store(right_ptr, right)?;

    Ok(node.into())
}

/// `scalar * closure` allocates a mul node carrying the weight.
fn codegen_closure_mul<'a, 'ctx>(
    ctx: &mut CompileContext<'a, 'ctx>,
    left: &Expr,
    right: &Expr,
    left_is_closure: bool
) -> Result<BasicValueEnum<'ctx>, Error> {
    let left = codegen_value(ctx, left)?;
    let right = codegen_value(ctx, right)?;
    let (closure, weight) = if left_is_closure { (left, right) } else { (right, left) };
    let weight = coerce_to_f32(ctx, weight)?;

    let node_ty = ctx.structs["closure_mul"].llvm_type;
    let node = codegen_closure_node_alloc(ctx, std::mem::size_of::<ClosureTreeNodeMul>())?;

    let id = ctx.context.i32_type().const_int(CLOSURE_MUL as u64, true);
    let id_ptr = ctx.builder.build_struct_gep(node_ty, node, 0, "id")?;
    ctx.builder.build_store(id_ptr, id)?;

    let weight_ptr = ctx.builder.build_struct_gep(node_ty, node, 2, "weight")?;
    ctx.builder.build_store(weight_ptr, weight)?;

    let child_ptr = ctx.builder.build_struct_gep(node_ty, node, 3, "closure")?;
    ctx.builder.build_store(child_ptr, closure)?;

    Ok(node.into())
}

fn codegen_closure_node_alloc<'a, 'ctx>(
    ctx: &CompileContext<'a, 'ctx>,
    size: usize
) -> Result<PointerValue<'ctx>, Error> {
    let malloc = ctx
        .functions
        .get("TSL_MALLOC")
        .ok_or_else(|| Error::UndefinedFunction("TSL_MALLOC".into()))?
        .function;
    let size = ctx.context.i32_type().const_int(size as u64, false);
    let call = ctx.builder.build_call(malloc, &[size.into()], "closure_node")?;
    Ok(call
        .try_as_basic_value()
        .left()
        .ok_or(Error::VoidValue)?
        .into_pointer_value())
}

fn codegen_texture_sample<'a, 'ctx>(
    ctx: &mut CompileContext<'a, 'ctx>,
    handle: &str,
    args: &[Expr],
    sample_alpha: bool
) -> Result<BasicValueEnum<'ctx>, Error> {
    let (handle_slot, _) = ctx
        .get_var_symbol(handle)
        .map_err(|_| Error::UnregisteredResource(handle.into()))?;

    if args.is_empty() {
        return Err(Error::MissingSampleArguments);
    }

    let ptr_ty = ctx.context.ptr_type(AddressSpace::default());
    let handle_value = ctx.builder.build_load(ptr_ty, handle_slot, "handle")?;

    let (intrinsic, out_ty): (_, inkwell::types::BasicTypeEnum) = if sample_alpha {
        ("TSL_TEXTURE2D_SAMPLE_ALPHA", ctx.context.f32_type().into())
    } else {
        ("TSL_TEXTURE2D_SAMPLE", ctx.float3_type().into())
    };
    let function = ctx
        .functions
        .get(intrinsic)
        .ok_or_else(|| Error::UndefinedFunction(intrinsic.into()))?
        .function;

    let out = ctx.builder.build_alloca(out_ty, "sample_out")?;

    let mut call_args: Vec<BasicMetadataValueEnum> = vec![handle_value.into(), out.into()];
    for arg in args {
        call_args.push(codegen_value(ctx, arg)?.into());
    }
    ctx.builder.build_call(function, &call_args, "")?;

    Ok(ctx.builder.build_load(out_ty, out, "sample")?)
}

fn codegen_type_cast<'a, 'ctx>(
    ctx: &mut CompileContext<'a, 'ctx>,
    target: &DataType,
    operand: &Expr
) -> Result<BasicValueEnum<'ctx>, Error> {
    let value = codegen_value(ctx, operand)?;
    let builder = ctx.builder;

    match target.kind {
        DataKind::Int => {
            let i32_ty = ctx.context.i32_type();
            if value.is_int_value() {
                let iv = value.into_int_value();
                if iv.get_type().get_bit_width() == 32 {
                    Ok(value)
                } else {
                    Ok(builder.build_int_z_extend(iv, i32_ty, "cast")?.into())
                }
            } else if value.is_float_value() {
                Ok(builder
                    .build_float_to_signed_int(value.into_float_value(), i32_ty, "cast")?
                    .into())
            } else {
                Err(Error::InvalidTypeCast)
            }
        },
        DataKind::Float => cast_to_fp(ctx, value, ctx.context.f32_type()),
        DataKind::Double => cast_to_fp(ctx, value, ctx.context.f64_type()),
        DataKind::Bool => Ok(ctx.convert_to_bool(value)?.into()),
        _ => {
            // same type structure casts pass through, anything else is rejected
            let llvm_ty = ctx.llvm_type(target)?;
            if value.get_type() == llvm_ty {
                Ok(value)
            } else {
                Err(Error::InvalidTypeCast)
            }
        }
    }
}

fn cast_to_fp<'a, 'ctx>(
    ctx: &CompileContext<'a, 'ctx>,
    value: BasicValueEnum<'ctx>,
    target: inkwell::types::FloatType<'ctx>
) -> Result<BasicValueEnum<'ctx>, Error> {
    if value.is_float_value() {
        let fv = value.into_float_value();
        if fv.get_type() == target {
            Ok(value)
        } else if fv.get_type() == ctx.context.f32_type() {
            Ok(ctx.builder.build_float_ext(fv, target, "cast")?.into())
        } else {
            Ok(ctx.builder.build_float_trunc(fv, target, "cast")?.into())
        }
    } else if value.is_int_value() {
        let iv = value.into_int_value();
        if iv.get_type().get_bit_width() == 1 {
            Ok(ctx.builder.build_unsigned_int_to_float(iv, target, "cast")?.into())
        } else {
            Ok(ctx.builder.build_signed_int_to_float(iv, target, "cast")?.into())
        }
    } else {
        Err(Error::InvalidTypeCast)
    }
}
