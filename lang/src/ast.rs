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

//! Abstract syntax tree of the shading language.
//!
//! The tree is a plain owned data structure: the parser builds a [`Program`]
//! and everything below it is dropped together with it once compilation is
//! over, whether compilation succeeded or not.

use bitflags::bitflags;

bitflags! {
    pub struct VariableConfig: u32
    {
        const NONE = 0;
        const INPUT = 0x1;
        const OUTPUT = 0x2;
        const CONST = 0x4;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind
{
    Void,
    Int,
    Float,
    Double,
    Bool,
    Closure,
    Struct
}

/// Type of a value in the language. Two types are equal iff both the kind
/// and the structure name match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataType
{
    pub kind: DataKind,
    pub struct_name: Option<String>
}

impl DataType
{
    pub const VOID: DataType = DataType { kind: DataKind::Void, struct_name: None };
    pub const INT: DataType = DataType { kind: DataKind::Int, struct_name: None };
    pub const FLOAT: DataType = DataType { kind: DataKind::Float, struct_name: None };
    pub const DOUBLE: DataType = DataType { kind: DataKind::Double, struct_name: None };
    pub const BOOL: DataType = DataType { kind: DataKind::Bool, struct_name: None };
    pub const CLOSURE: DataType = DataType { kind: DataKind::Closure, struct_name: None };

    pub fn structure(name: impl Into<String>) -> DataType
    {
        DataType {
            kind: DataKind::Struct,
            struct_name: Some(name.into())
        }
    }

    /// `vector` and `color` both alias this built-in structure.
    pub fn float3() -> DataType
    {
        Self::structure("float3")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp
{
    Pos,
    Neg,
    Not,
    Compl
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp
{
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp
{
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    ShlAssign,
    ShrAssign
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr
{
    LiteralInt(i32),
    LiteralFloat(f32),
    LiteralDouble(f64),
    LiteralBool(bool),
    /// `global_value<field>`
    GlobalValue(String),
    VariableRef(String),
    ArrayAccess
    {
        var: Box<Expr>, index: Box<Expr>
    },
    MemberRef
    {
        var: Box<Expr>, member: String
    },
    Unary
    {
        op: UnaryOp, operand: Box<Expr>
    },
    Binary
    {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>
    },
    PreInc(Box<Expr>),
    PreDec(Box<Expr>),
    PostInc(Box<Expr>),
    PostDec(Box<Expr>),
    Ternary
    {
        cond: Box<Expr>,
        true_expr: Box<Expr>,
        false_expr: Box<Expr>
    },
    Assign
    {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>
    },
    FunctionCall
    {
        name: String, args: Vec<Expr>
    },
    /// `vector(...)` / `color(...)` constructor.
    Float3Constructor(Vec<Expr>),
    MakeClosure
    {
        name: String, args: Vec<Expr>
    },
    Texture2dSample
    {
        handle: String,
        args: Vec<Expr>,
        sample_alpha: bool
    },
    TypeCast
    {
        target: DataType, operand: Box<Expr>
    }
}

impl Expr
{
    /// An lvalue designates a storage slot: a variable, an array element or
    /// a structure field.
    pub fn is_lvalue(&self) -> bool
    {
        matches!(
            self,
            Expr::VariableRef(_) | Expr::ArrayAccess { .. } | Expr::MemberRef { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl
{
    pub name: String,
    pub ty: DataType,
    pub config: VariableConfig,
    pub init: Option<Expr>
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt
{
    Expression(Expr),
    VariableDecl(Vec<VariableDecl>),
    ArrayDecl
    {
        name: String,
        ty: DataType,
        config: VariableConfig,
        count: Box<Expr>,
        init: Option<Vec<Expr>>
    },
    Return(Option<Expr>),
    If
    {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>
    },
    While
    {
        cond: Expr, body: Box<Stmt>
    },
    DoWhile
    {
        cond: Expr, body: Box<Stmt>
    },
    For
    {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        iter: Option<Expr>,
        body: Box<Stmt>
    },
    Break,
    Continue,
    /// A `{ ... }` block; introduces a variable scope of its own.
    Block(Vec<Stmt>),
    TextureDecl(String),
    ShaderResourceDecl(String)
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructMember
{
    pub name: String,
    pub ty: DataType
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDeclaration
{
    pub name: String,
    pub members: Vec<StructMember>
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionPrototype
{
    pub name: String,
    pub is_shader: bool,
    pub return_type: DataType,
    pub params: Vec<VariableDecl>,
    pub body: Option<Vec<Stmt>>
}

/// A parsed translation unit. Owns every node produced by the parser.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program
{
    pub structures: Vec<StructDeclaration>,
    pub globals: Vec<Stmt>,
    pub functions: Vec<FunctionPrototype>
}

impl Program
{
    /// The single `shader`-marked function of the unit, if any.
    pub fn shader_root(&self) -> Option<&FunctionPrototype>
    {
        self.functions.iter().find(|f| f.is_shader)
    }
}
