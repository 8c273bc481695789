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

use thiserror::Error;

use crate::lexer::token::Token;

#[derive(Debug, Error, PartialEq)]
pub enum Error
{
    #[error("[{line}:{col}] expected {expected}, got {actual}")]
    UnexpectedToken
    {
        line: usize,
        col: usize,
        expected: &'static str,
        actual: Token
    },

    #[error("[{line}:{col}] unexpected end of input")]
    Eof
    {
        line: usize, col: usize
    },

    #[error("[{line}:{col}] duplicated function named '{name}'")]
    DuplicateFunction
    {
        line: usize, col: usize, name: String
    },

    #[error("[{line}:{col}] expression does not designate a storage location")]
    NotAnLvalue
    {
        line: usize, col: usize
    },

    #[error("[{line}:{col}] the '{keyword}' type cannot be used in a declaration")]
    UnsupportedType
    {
        line: usize,
        col: usize,
        keyword: &'static str
    }
}
