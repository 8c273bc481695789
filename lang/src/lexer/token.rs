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

use std::fmt::{Display, Formatter};

use phf::phf_map;

/// Keyword table of the language. `true` and `false` lex directly into
/// boolean literals so they don't appear here.
pub static KEYWORDS: phf::Map<&'static str, Token> = phf_map! {
    "shader" => Token::Shader,
    "in" => Token::In,
    "out" => Token::Out,
    "const" => Token::Const,
    "struct" => Token::Struct,
    "return" => Token::Return,
    "break" => Token::Break,
    "continue" => Token::Continue,
    "if" => Token::If,
    "else" => Token::Else,
    "while" => Token::While,
    "do" => Token::Do,
    "for" => Token::For,
    "int" => Token::Int,
    "float" => Token::Float,
    "double" => Token::Double,
    "bool" => Token::Bool,
    "vector" => Token::Vector,
    "color" => Token::Color,
    "matrix" => Token::Matrix,
    "closure" => Token::Closure,
    "void" => Token::Void,
    "texture2d" => Token::Texture2d,
    "shader_resource" => Token::ShaderResource,
    "global_value" => Token::GlobalValue,
    "make_closure" => Token::MakeClosure,
    "texture2d_sample" => Token::Texture2dSample,
    "texture2d_sample_alpha" => Token::Texture2dSampleAlpha
};

#[derive(Clone, Debug, PartialEq)]
pub enum Token
{
    // keywords
    Shader,
    In,
    Out,
    Const,
    Struct,
    Return,
    Break,
    Continue,
    If,
    Else,
    While,
    Do,
    For,

    // type keywords
    Int,
    Float,
    Double,
    Bool,
    Vector,
    Color,
    Matrix,
    Closure,
    Void,

    // resource keywords
    Texture2d,
    ShaderResource,
    GlobalValue,
    MakeClosure,
    Texture2dSample,
    Texture2dSampleAlpha,

    // literals
    IntLiteral(i32),
    FloatLiteral(f32),
    DoubleLiteral(f64),
    BoolLiteral(bool),
    Identifier(String),

    // punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Dot,
    Colon,
    Question,

    // assignment operators
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
    ShrAssign,

    // arithmetic and logic operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Inc,
    Dec,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    AndAnd,
    OrOr,
    Not,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Shl,
    Shr
}

impl Token
{
    pub fn name(&self) -> &'static str
    {
        match self {
            Token::Shader => "shader",
            Token::In => "in",
            Token::Out => "out",
            Token::Const => "const",
            Token::Struct => "struct",
            Token::Return => "return",
            Token::Break => "break",
            Token::Continue => "continue",
            Token::If => "if",
            Token::Else => "else",
            Token::While => "while",
            Token::Do => "do",
            Token::For => "for",
            Token::Int => "int",
            Token::Float => "float",
            Token::Double => "double",
            Token::Bool => "bool",
            Token::Vector => "vector",
            Token::Color => "color",
            Token::Matrix => "matrix",
            Token::Closure => "closure",
            Token::Void => "void",
            Token::Texture2d => "texture2d",
            Token::ShaderResource => "shader_resource",
            Token::GlobalValue => "global_value",
            Token::MakeClosure => "make_closure",
            Token::Texture2dSample => "texture2d_sample",
            Token::Texture2dSampleAlpha => "texture2d_sample_alpha",
            Token::IntLiteral(_) => "int literal",
            Token::FloatLiteral(_) => "float literal",
            Token::DoubleLiteral(_) => "double literal",
            Token::BoolLiteral(_) => "bool literal",
            Token::Identifier(_) => "identifier",
            Token::LParen => "'('",
            Token::RParen => "')'",
            Token::LBrace => "'{'",
            Token::RBrace => "'}'",
            Token::LBracket => "'['",
            Token::RBracket => "']'",
            Token::Comma => "','",
            Token::Semicolon => "';'",
            Token::Dot => "'.'",
            Token::Colon => "':'",
            Token::Question => "'?'",
            Token::Assign => "'='",
            Token::AddAssign => "'+='",
            Token::SubAssign => "'-='",
            Token::MulAssign => "'*='",
            Token::DivAssign => "'/='",
            Token::ModAssign => "'%='",
            Token::AndAssign => "'&='",
            Token::OrAssign => "'|='",
            Token::XorAssign => "'^='",
            Token::ShlAssign => "'<<='",
            Token::ShrAssign => "'>>='",
            Token::Plus => "'+'",
            Token::Minus => "'-'",
            Token::Star => "'*'",
            Token::Slash => "'/'",
            Token::Percent => "'%'",
            Token::Inc => "'++'",
            Token::Dec => "'--'",
            Token::Eq => "'=='",
            Token::Ne => "'!='",
            Token::Lt => "'<'",
            Token::Gt => "'>'",
            Token::Le => "'<='",
            Token::Ge => "'>='",
            Token::AndAnd => "'&&'",
            Token::OrOr => "'||'",
            Token::Not => "'!'",
            Token::Amp => "'&'",
            Token::Pipe => "'|'",
            Token::Caret => "'^'",
            Token::Tilde => "'~'",
            Token::Shl => "'<<'",
            Token::Shr => "'>>'"
        }
    }

    pub fn identifier(self) -> Option<String>
    {
        if let Token::Identifier(s) = self {
            Some(s)
        } else {
            None
        }
    }

    pub fn int(self) -> Option<i32>
    {
        if let Token::IntLiteral(i) = self {
            Some(i)
        } else {
            None
        }
    }

    /// Whether this token starts a built-in type specifier.
    pub fn is_type_keyword(&self) -> bool
    {
        matches!(
            self,
            Token::Int
                | Token::Float
                | Token::Double
                | Token::Bool
                | Token::Vector
                | Token::Color
                | Token::Matrix
                | Token::Closure
                | Token::Void
        )
    }
}

impl Display for Token
{
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result
    {
        match self {
            Token::IntLiteral(i) => write!(formatter, "int({})", i),
            Token::FloatLiteral(f) => write!(formatter, "float({})", f),
            Token::DoubleLiteral(d) => write!(formatter, "double({})", d),
            Token::BoolLiteral(b) => write!(formatter, "bool({})", b),
            Token::Identifier(s) => write!(formatter, "identifier({})", s),
            _ => formatter.write_str(self.name())
        }
    }
}
