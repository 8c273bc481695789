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

use std::collections::VecDeque;

use crate::lexer::{
    error::Error,
    token::{Token, KEYWORDS}
};

#[derive(Clone, Debug, PartialEq)]
pub struct TokenEntry
{
    pub line: usize,
    pub col: usize,
    pub token: Token
}

fn is_ident_start(chr: u8) -> bool
{
    chr.is_ascii_alphabetic() || chr == b'_'
}

fn is_ident_part(chr: u8) -> bool
{
    chr.is_ascii_alphanumeric() || chr == b'_'
}

pub struct Lexer
{
    tokens: VecDeque<TokenEntry>,
    cur_line: usize,
    cur_col: usize
}

impl Default for Lexer
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl Lexer
{
    pub fn new() -> Lexer
    {
        Lexer {
            tokens: VecDeque::new(),
            cur_line: 1,
            cur_col: 1
        }
    }

    fn push(&mut self, token: Token)
    {
        self.tokens.push_back(TokenEntry {
            token,
            line: self.cur_line,
            col: self.cur_col
        });
    }

    /// Advance past `len` bytes which are known to contain no newline.
    fn advance(&mut self, pos: &mut usize, len: usize)
    {
        *pos += len;
        self.cur_col += len;
    }

    fn newline(&mut self, pos: &mut usize)
    {
        *pos += 1;
        self.cur_line += 1;
        self.cur_col = 1;
    }

    /// Skip bytes until `pattern` is found, keeping line/column tracking
    /// intact. Returns false if the input runs out first.
    fn skip_until(&mut self, code: &[u8], pos: &mut usize, pattern: &[u8]) -> bool
    {
        while *pos < code.len() {
            if code[*pos..].starts_with(pattern) {
                self.advance(pos, pattern.len());
                return true;
            }
            if code[*pos] == b'\n' {
                self.newline(pos);
            } else {
                self.advance(pos, 1);
            }
        }
        false
    }

    fn scan_number(&mut self, code: &[u8], pos: &mut usize) -> Result<(), Error>
    {
        let start = *pos;
        let (line, col) = (self.cur_line, self.cur_col);

        let mut end = *pos;
        while end < code.len() && code[end].is_ascii_digit() {
            end += 1;
        }

        let mut is_float = false;
        if end < code.len() && code[end] == b'.' {
            is_float = true;
            end += 1;
            while end < code.len() && code[end].is_ascii_digit() {
                end += 1;
            }
        }

        // SAFETY: the scanned range only contains ascii digits and '.'
        let digits = unsafe { std::str::from_utf8_unchecked(&code[start..end]) };

        let mut suffix = 0;
        let token = if end < code.len() && code[end] == b'd' {
            suffix = 1;
            digits
                .parse()
                .map(Token::DoubleLiteral)
                .map_err(|_| Error::MalformedNumber { line, col, text: digits.into() })?
        } else if is_float {
            if end < code.len() && code[end] == b'f' {
                suffix = 1;
            }
            // forms like "2." parse fine through the float parser
            digits
                .parse()
                .map(Token::FloatLiteral)
                .map_err(|_| Error::MalformedNumber { line, col, text: digits.into() })?
        } else {
            digits
                .parse()
                .map(Token::IntLiteral)
                .map_err(|_| Error::MalformedNumber { line, col, text: digits.into() })?
        };

        self.push(token);
        self.advance(pos, end - start + suffix);
        Ok(())
    }

    fn scan_identifier(&mut self, code: &[u8], pos: &mut usize)
    {
        let start = *pos;
        let mut end = *pos;
        while end < code.len() && is_ident_part(code[end]) {
            end += 1;
        }

        // SAFETY: identifier characters are all ascii
        let text = unsafe { std::str::from_utf8_unchecked(&code[start..end]) };
        let token = match text {
            "true" => Token::BoolLiteral(true),
            "false" => Token::BoolLiteral(false),
            _ => match KEYWORDS.get(text) {
                Some(tok) => tok.clone(),
                None => Token::Identifier(text.into())
            }
        };

        self.push(token);
        self.advance(pos, end - start);
    }

    /// Longest-match scan of operator and punctuation tokens.
    fn scan_punct(&mut self, code: &[u8], pos: &mut usize) -> Result<(), Error>
    {
        static THREE: [(&[u8], Token); 2] = [(b"<<=", Token::ShlAssign), (b">>=", Token::ShrAssign)];
        static TWO: [(&[u8], Token); 18] = [
            (b"==", Token::Eq),
            (b"!=", Token::Ne),
            (b"<=", Token::Le),
            (b">=", Token::Ge),
            (b"&&", Token::AndAnd),
            (b"||", Token::OrOr),
            (b"++", Token::Inc),
            (b"--", Token::Dec),
            (b"+=", Token::AddAssign),
            (b"-=", Token::SubAssign),
            (b"*=", Token::MulAssign),
            (b"/=", Token::DivAssign),
            (b"%=", Token::ModAssign),
            (b"&=", Token::AndAssign),
            (b"|=", Token::OrAssign),
            (b"^=", Token::XorAssign),
            (b"<<", Token::Shl),
            (b">>", Token::Shr)
        ];

        for (pattern, token) in &THREE {
            if code[*pos..].starts_with(pattern) {
                self.push(token.clone());
                self.advance(pos, 3);
                return Ok(());
            }
        }
        for (pattern, token) in &TWO {
            if code[*pos..].starts_with(pattern) {
                self.push(token.clone());
                self.advance(pos, 2);
                return Ok(());
            }
        }

        let token = match code[*pos] {
            b'(' => Token::LParen,
            b')' => Token::RParen,
            b'{' => Token::LBrace,
            b'}' => Token::RBrace,
            b'[' => Token::LBracket,
            b']' => Token::RBracket,
            b',' => Token::Comma,
            b';' => Token::Semicolon,
            b'.' => Token::Dot,
            b':' => Token::Colon,
            b'?' => Token::Question,
            b'=' => Token::Assign,
            b'+' => Token::Plus,
            b'-' => Token::Minus,
            b'*' => Token::Star,
            b'/' => Token::Slash,
            b'%' => Token::Percent,
            b'<' => Token::Lt,
            b'>' => Token::Gt,
            b'!' => Token::Not,
            b'&' => Token::Amp,
            b'|' => Token::Pipe,
            b'^' => Token::Caret,
            b'~' => Token::Tilde,
            chr => {
                return Err(Error::UnexpectedCharacter {
                    line: self.cur_line,
                    col: self.cur_col,
                    chr: chr as char
                })
            }
        };
        self.push(token);
        self.advance(pos, 1);
        Ok(())
    }

    pub fn process(&mut self, code: &str) -> Result<(), Error>
    {
        let code = code.as_bytes();
        let mut pos = 0;

        while pos < code.len() {
            let chr = code[pos];
            if chr == b'\n' {
                self.newline(&mut pos);
            } else if chr == b' ' || chr == b'\t' || chr == b'\r' {
                self.advance(&mut pos, 1);
            } else if code[pos..].starts_with(b"//") {
                while pos < code.len() && code[pos] != b'\n' {
                    self.advance(&mut pos, 1);
                }
            } else if code[pos..].starts_with(b"/*") {
                let (line, col) = (self.cur_line, self.cur_col);
                self.advance(&mut pos, 2);
                // block comments do not nest
                if !self.skip_until(code, &mut pos, b"*/") {
                    return Err(Error::UnterminatedComment { line, col });
                }
            } else if code[pos..].starts_with(b"<<<") {
                // metadata markers carry no runtime semantics, drop the block
                let (line, col) = (self.cur_line, self.cur_col);
                self.advance(&mut pos, 3);
                if !self.skip_until(code, &mut pos, b">>>") {
                    return Err(Error::UnterminatedMetadata { line, col });
                }
            } else if chr.is_ascii_digit() {
                self.scan_number(code, &mut pos)?;
            } else if is_ident_start(chr) {
                self.scan_identifier(code, &mut pos);
            } else {
                self.scan_punct(code, &mut pos)?;
            }
        }
        Ok(())
    }

    pub fn into_tokens(self) -> VecDeque<TokenEntry>
    {
        self.tokens
    }
}
