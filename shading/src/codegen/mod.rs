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

//! Lowering of the AST to LLVM IR.

mod context;
mod expr;
mod function;
pub mod global_module;
mod stmt;

pub use context::{CompileContext, FunctionEntry, LoopBlocks, StructMeta, TslGlobal};
pub use expr::{codegen_expr, codegen_lvalue, codegen_value, expr_is_closure};
pub use function::{codegen_function, codegen_global_statement, codegen_struct_declaration};
pub use stmt::codegen_stmt;

use inkwell::builder::BuilderError;
use thiserror::Error as ThisError;

/// Semantic errors raised while generating code.
///
/// Every one of these is surfaced to the host through `catch_debug` and
/// fails the compilation of the enclosing shader unit.
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),
    #[error("redefined variable '{0}'")]
    RedefinedVariable(String),
    #[error("undefined function '{0}'")]
    UndefinedFunction(String),
    #[error("duplicated function named '{0}'")]
    DuplicatedFunction(String),
    #[error("undefined struct '{0}'")]
    UndefinedStruct(String),
    #[error("undefined member variable '{member}' in struct '{name}'")]
    UndefinedMember { name: String, member: String },
    #[error("unregistered closure '{0}'")]
    UnregisteredClosure(String),
    #[error("unregistered global value '{0}'")]
    UnregisteredGlobalValue(String),
    #[error("TSL global variable is not registered")]
    TslGlobalNotRegistered,
    #[error("texture handle '{0}' not registered")]
    UnregisteredResource(String),
    #[error("closure color can't be added with non closure color")]
    ClosureAddMismatch,
    #[error("closure color can't multiply with each other")]
    ClosureMulPair,
    #[error("incorrect number of arguments passed in function '{0}'")]
    ArgumentCountMismatch(String),
    #[error("right value can't be used as an output argument")]
    OutputArgNotLvalue,
    #[error("array index has to be an integer")]
    NonIntegerArrayIndex,
    #[error("invalid type of array size, it has to be an integer")]
    NonIntegerArraySize,
    #[error("'{0}' is only valid for integers")]
    IntegerOnlyOperator(&'static str),
    #[error("'break' or 'continue' outside of a loop")]
    JumpOutsideLoop,
    #[error("invalid operands of operator '{0}'")]
    InvalidOperands(&'static str),
    #[error("a shader unit needs exactly one shader function")]
    MissingShaderRoot,
    #[error("void value used in an expression")]
    VoidValue,
    #[error("unsupported type cast")]
    InvalidTypeCast,
    #[error("invalid data type")]
    InvalidDataType,
    #[error("texture sampling requires uv coordinates")]
    MissingSampleArguments,
    #[error("global array size has to be a constant integer")]
    NonConstantGlobalArraySize,
    #[error("llvm builder failure: {0}")]
    Builder(#[from] BuilderError)
}
