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

use inkwell::basic_block::BasicBlock;
use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::types::{BasicTypeEnum, StructType};
use inkwell::values::{BasicValueEnum, FloatValue, FunctionValue, IntValue, PointerValue};
use inkwell::{AddressSpace, FloatPredicate, IntPredicate};
use tsl_lang::ast::{DataKind, DataType, FunctionPrototype};

use crate::args::GlobalVarList;
use crate::codegen::Error;

/// Metadata of a structure type known to the compilation: the LLVM type and
/// the field index plus declared type of each member.
#[derive(Clone)]
pub struct StructMeta<'ctx> {
    pub llvm_type: StructType<'ctx>,
    pub members: HashMap<String, (u32, DataType)>
}

/// A function known to the compilation. Host intrinsics carry no prototype.
#[derive(Clone, Copy)]
pub struct FunctionEntry<'a, 'ctx> {
    pub function: FunctionValue<'ctx>,
    pub prototype: Option<&'a FunctionPrototype>
}

/// TSL global record registered on the current template.
pub struct TslGlobal<'ctx> {
    pub struct_type: StructType<'ctx>,
    pub layout: GlobalVarList,
    /// Pointer passed as the implicit trailing argument of the function
    /// currently being generated.
    pub value: Option<PointerValue<'ctx>>
}

/// Targets of `continue` and `break` of the innermost loop.
pub struct LoopBlocks<'ctx> {
    pub continue_target: BasicBlock<'ctx>,
    pub break_target: BasicBlock<'ctx>
}

/// Compiling context of a single shader unit.
///
/// Keeps track of everything needed while lowering the AST: variable scopes,
/// function and structure tables, the loop stack and the TSL global slot.
/// It owns none of the LLVM objects it points at.
pub struct CompileContext<'a, 'ctx> {
    pub context: &'ctx Context,
    pub module: &'a Module<'ctx>,
    pub builder: &'a Builder<'ctx>,

    pub structs: HashMap<String, StructMeta<'ctx>>,
    pub functions: HashMap<String, FunctionEntry<'a, 'ctx>>,
    pub closures: HashMap<String, FunctionValue<'ctx>>,
    pub loop_blocks: Vec<LoopBlocks<'ctx>>,
    pub tsl_global: Option<TslGlobal<'ctx>>,
    pub resources: &'a HashMap<String, usize>,

    var_symbols: Vec<HashMap<String, (PointerValue<'ctx>, DataType)>>
}

impl<'a, 'ctx> CompileContext<'a, 'ctx> {
    pub fn new(
        context: &'ctx Context,
        module: &'a Module<'ctx>,
        builder: &'a Builder<'ctx>,
        resources: &'a HashMap<String, usize>
    ) -> CompileContext<'a, 'ctx> {
        CompileContext {
            context,
            module,
            builder,
            structs: HashMap::new(),
            functions: HashMap::new(),
            closures: HashMap::new(),
            loop_blocks: Vec::new(),
            tsl_global: None,
            resources,
            // the bottom layer holds global variables
            var_symbols: vec![HashMap::new()]
        }
    }

    pub fn push_var_symbol_layer(&mut self) {
        self.var_symbols.push(HashMap::new());
    }

    pub fn pop_var_symbol_layer(&mut self) {
        self.var_symbols.pop();
    }

    pub fn push_var_symbol(
        &mut self,
        name: &str,
        value: PointerValue<'ctx>,
        ty: DataType
    ) -> Result<(), Error> {
        let top = self.var_symbols.last_mut().expect("scope stack is never empty");
        if top.contains_key(name) {
            return Err(Error::RedefinedVariable(name.into()));
        }
        top.insert(name.into(), (value, ty));
        Ok(())
    }

    pub fn get_var_symbol(&self, name: &str) -> Result<(PointerValue<'ctx>, DataType), Error> {
        for layer in self.var_symbols.iter().rev() {
            if let Some(symbol) = layer.get(name) {
                return Ok(symbol.clone());
            }
        }
        Err(Error::UndefinedVariable(name.into()))
    }

    pub fn has_var_symbol_in_top_layer(&self, name: &str) -> bool {
        self.var_symbols
            .last()
            .map(|layer| layer.contains_key(name))
            .unwrap_or(false)
    }

    pub fn get_var_type(&self, name: &str) -> Result<DataType, Error> {
        self.get_var_symbol(name).map(|(_, ty)| ty)
    }

    pub fn float3_type(&self) -> StructType<'ctx> {
        self.structs["float3"].llvm_type
    }

    /// Translate a declared type into the LLVM type it lowers to. Closures
    /// and resources are opaque pointers.
    pub fn llvm_type(&self, ty: &DataType) -> Result<BasicTypeEnum<'ctx>, Error> {
        match ty.kind {
            DataKind::Int => Ok(self.context.i32_type().into()),
            DataKind::Float => Ok(self.context.f32_type().into()),
            DataKind::Double => Ok(self.context.f64_type().into()),
            DataKind::Bool => Ok(self.context.bool_type().into()),
            DataKind::Closure => Ok(self.context.ptr_type(AddressSpace::default()).into()),
            DataKind::Struct => {
                let name = ty.struct_name.as_deref().unwrap_or("");
                let meta = self
                    .structs
                    .get(name)
                    .ok_or_else(|| Error::UndefinedStruct(name.into()))?;
                Ok(meta.llvm_type.into())
            },
            DataKind::Void => Err(Error::InvalidDataType)
        }
    }

    pub fn is_float3(&self, value: BasicValueEnum<'ctx>) -> bool {
        value.is_struct_value() && value.into_struct_value().get_type() == self.float3_type()
    }

    fn is_f32(&self, value: BasicValueEnum<'ctx>) -> bool {
        value.is_float_value() && value.into_float_value().get_type() == self.context.f32_type()
    }

    fn is_fp(&self, value: BasicValueEnum<'ctx>) -> bool {
        value.is_float_value()
    }

    fn is_i32(&self, value: BasicValueEnum<'ctx>) -> bool {
        value.is_int_value() && value.into_int_value().get_type().get_bit_width() == 32
    }

    /// Coerce a value to `bool`: ints compare against zero, floats compare
    /// against 0.0, an existing bool passes through.
    pub fn convert_to_bool(&self, value: BasicValueEnum<'ctx>) -> Result<IntValue<'ctx>, Error> {
        if self.is_fp(value) {
            let fv = value.into_float_value();
            let zero = fv.get_type().const_float(0.0);
            Ok(self
                .builder
                .build_float_compare(FloatPredicate::ONE, fv, zero, "tobool")?)
        } else if value.is_int_value() {
            let iv = value.into_int_value();
            if iv.get_type().get_bit_width() == 1 {
                Ok(iv)
            } else {
                let zero = iv.get_type().const_zero();
                Ok(self.builder.build_int_compare(IntPredicate::NE, iv, zero, "tobool")?)
            }
        } else {
            Err(Error::InvalidOperands("bool conversion"))
        }
    }

    pub fn llvm_add(
        &self,
        left: BasicValueEnum<'ctx>,
        right: BasicValueEnum<'ctx>
    ) -> Result<BasicValueEnum<'ctx>, Error> {
        if self.is_fp(left) && self.is_fp(right) {
            Ok(self
                .builder
                .build_float_add(left.into_float_value(), right.into_float_value(), "add")?
                .into())
        } else if self.is_i32(left) && self.is_i32(right) {
            Ok(self
                .builder
                .build_int_add(left.into_int_value(), right.into_int_value(), "add")?
                .into())
        } else {
            Err(Error::InvalidOperands("+"))
        }
    }

    pub fn llvm_sub(
        &self,
        left: BasicValueEnum<'ctx>,
        right: BasicValueEnum<'ctx>
    ) -> Result<BasicValueEnum<'ctx>, Error> {
        if self.is_fp(left) && self.is_fp(right) {
            Ok(self
                .builder
                .build_float_sub(left.into_float_value(), right.into_float_value(), "sub")?
                .into())
        } else if self.is_i32(left) && self.is_i32(right) {
            Ok(self
                .builder
                .build_int_sub(left.into_int_value(), right.into_int_value(), "sub")?
                .into())
        } else {
            Err(Error::InvalidOperands("-"))
        }
    }

    pub fn llvm_mul(
        &self,
        left: BasicValueEnum<'ctx>,
        right: BasicValueEnum<'ctx>
    ) -> Result<BasicValueEnum<'ctx>, Error> {
        if self.is_fp(left) && self.is_fp(right) {
            Ok(self
                .builder
                .build_float_mul(left.into_float_value(), right.into_float_value(), "mul")?
                .into())
        } else if self.is_i32(left) && self.is_i32(right) {
            Ok(self
                .builder
                .build_int_mul(left.into_int_value(), right.into_int_value(), "mul")?
                .into())
        } else {
            Err(Error::InvalidOperands("*"))
        }
    }

    pub fn llvm_div(
        &self,
        left: BasicValueEnum<'ctx>,
        right: BasicValueEnum<'ctx>
    ) -> Result<BasicValueEnum<'ctx>, Error> {
        if self.is_fp(left) && self.is_fp(right) {
            Ok(self
                .builder
                .build_float_div(left.into_float_value(), right.into_float_value(), "div")?
                .into())
        } else if self.is_i32(left) && self.is_i32(right) {
            Ok(self
                .builder
                .build_int_signed_div(left.into_int_value(), right.into_int_value(), "div")?
                .into())
        } else {
            Err(Error::InvalidOperands("/"))
        }
    }

    pub fn llvm_mod(
        &self,
        left: BasicValueEnum<'ctx>,
        right: BasicValueEnum<'ctx>
    ) -> Result<BasicValueEnum<'ctx>, Error> {
        if self.is_fp(left) && self.is_fp(right) {
            Ok(self
                .builder
                .build_float_rem(left.into_float_value(), right.into_float_value(), "mod")?
                .into())
        } else if self.is_i32(left) && self.is_i32(right) {
            Ok(self
                .builder
                .build_int_signed_rem(left.into_int_value(), right.into_int_value(), "mod")?
                .into())
        } else {
            Err(Error::InvalidOperands("%"))
        }
    }

    /// Elementwise float3 operation; `right` may be a broadcast scalar.
    pub fn float3_elementwise<F>(
        &self,
        left: BasicValueEnum<'ctx>,
        right: BasicValueEnum<'ctx>,
        op: F
    ) -> Result<BasicValueEnum<'ctx>, Error>
    where
        F: Fn(FloatValue<'ctx>, FloatValue<'ctx>) -> Result<FloatValue<'ctx>, Error>
    {
        let float3_ty = self.float3_type();
        let mut result = float3_ty.get_undef();
        for i in 0..3u32 {
            let l = self.float3_element(left, i)?;
            let r = self.float3_element(right, i)?;
            let v = op(l, r)?;
            result = self
                .builder
                .build_insert_value(result, v, i, "vec")?
                .into_struct_value();
        }
        Ok(result.into())
    }

    fn float3_element(
        &self,
        value: BasicValueEnum<'ctx>,
        index: u32
    ) -> Result<FloatValue<'ctx>, Error> {
        if self.is_float3(value) {
            Ok(self
                .builder
                .build_extract_value(value.into_struct_value(), index, "elem")?
                .into_float_value())
        } else if self.is_f32(value) {
            Ok(value.into_float_value())
        } else {
            Err(Error::InvalidOperands("vector arithmetic"))
        }
    }
}
