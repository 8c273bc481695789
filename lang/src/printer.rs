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

//! Renders an AST back to source form, mainly for debugging and tooling.
//!
//! Every printed expression is fully parenthesized so the output does not
//! depend on operator precedence; parsing it back yields the same tree.

use std::fmt::Write;

use crate::ast::{
    AssignOp,
    BinaryOp,
    DataKind,
    DataType,
    Expr,
    FunctionPrototype,
    Program,
    Stmt,
    StructDeclaration,
    UnaryOp,
    VariableConfig,
    VariableDecl
};

pub fn print_program(program: &Program) -> String
{
    let mut out = String::new();
    for declaration in &program.structures {
        print_struct(&mut out, declaration);
    }
    for global in &program.globals {
        print_stmt(&mut out, global, 0);
    }
    for function in &program.functions {
        print_function(&mut out, function);
    }
    out
}

fn type_name(ty: &DataType) -> &str
{
    match ty.kind {
        DataKind::Void => "void",
        DataKind::Int => "int",
        DataKind::Float => "float",
        DataKind::Double => "double",
        DataKind::Bool => "bool",
        DataKind::Closure => "closure",
        DataKind::Struct => ty.struct_name.as_deref().unwrap_or("struct")
    }
}

fn indent(out: &mut String, depth: usize)
{
    for _ in 0..depth {
        out.push_str("    ");
    }
}

fn print_struct(out: &mut String, declaration: &StructDeclaration)
{
    let _ = writeln!(out, "struct {} {{", declaration.name);
    for member in &declaration.members {
        let _ = writeln!(out, "    {} {};", type_name(&member.ty), member.name);
    }
    out.push_str("};\n");
}

fn print_param(out: &mut String, param: &VariableDecl)
{
    if param.config.contains(VariableConfig::CONST) {
        out.push_str("const ");
    }
    if param.config.contains(VariableConfig::OUTPUT) {
        out.push_str("out ");
    } else {
        out.push_str("in ");
    }
    let _ = write!(out, "{} {}", type_name(&param.ty), param.name);
}

fn print_function(out: &mut String, function: &FunctionPrototype)
{
    if function.is_shader {
        let _ = write!(out, "shader {}(", function.name);
    } else {
        let _ = write!(out, "{} {}(", type_name(&function.return_type), function.name);
    }
    for (i, param) in function.params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        print_param(out, param);
    }
    match &function.body {
        Some(body) => {
            out.push_str("){\n");
            for stmt in body {
                print_stmt(out, stmt, 1);
            }
            out.push_str("}\n");
        },
        None => out.push_str(");\n")
    }
}

fn print_stmt(out: &mut String, stmt: &Stmt, depth: usize)
{
    match stmt {
        Stmt::Expression(expr) => {
            indent(out, depth);
            print_expr(out, expr);
            out.push_str(";\n");
        },
        Stmt::VariableDecl(decls) => {
            indent(out, depth);
            let mut first = true;
            for decl in decls {
                if first {
                    if decl.config.contains(VariableConfig::CONST) {
                        out.push_str("const ");
                    }
                    let _ = write!(out, "{} ", type_name(&decl.ty));
                    first = false;
                } else {
                    out.push_str(", ");
                }
                out.push_str(&decl.name);
                if let Some(init) = &decl.init {
                    out.push_str(" = ");
                    print_expr(out, init);
                }
            }
            out.push_str(";\n");
        },
        Stmt::ArrayDecl { name, ty, config, count, init } => {
            indent(out, depth);
            if config.contains(VariableConfig::CONST) {
                out.push_str("const ");
            }
            let _ = write!(out, "{} {}[", type_name(ty), name);
            print_expr(out, count);
            out.push(']');
            if let Some(values) = init {
                out.push_str(" = { ");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    print_expr(out, value);
                }
                out.push_str(" }");
            }
            out.push_str(";\n");
        },
        Stmt::Return(expr) => {
            indent(out, depth);
            out.push_str("return");
            if let Some(expr) = expr {
                out.push(' ');
                print_expr(out, expr);
            }
            out.push_str(";\n");
        },
        Stmt::If { cond, then_branch, else_branch } => {
            indent(out, depth);
            out.push_str("if( ");
            print_expr(out, cond);
            out.push_str(" )\n");
            print_stmt(out, then_branch, depth + 1);
            if let Some(else_branch) = else_branch {
                indent(out, depth);
                out.push_str("else\n");
                print_stmt(out, else_branch, depth + 1);
            }
        },
        Stmt::While { cond, body } => {
            indent(out, depth);
            out.push_str("while( ");
            print_expr(out, cond);
            out.push_str(" )\n");
            print_stmt(out, body, depth + 1);
        },
        Stmt::DoWhile { cond, body } => {
            indent(out, depth);
            out.push_str("do\n");
            print_stmt(out, body, depth + 1);
            indent(out, depth);
            out.push_str("while( ");
            print_expr(out, cond);
            out.push_str(" );\n");
        },
        Stmt::For { init, cond, iter, body } => {
            indent(out, depth);
            out.push_str("for( ");
            match init {
                // the init statement prints with its own semicolon and newline,
                // strip the layout so it fits the header
                Some(init) => {
                    let mut prefix = String::new();
                    print_stmt(&mut prefix, init, 0);
                    out.push_str(prefix.trim_end_matches('\n'));
                    out.push(' ');
                },
                None => out.push_str("; ")
            }
            if let Some(cond) = cond {
                print_expr(out, cond);
            }
            out.push_str(" ; ");
            if let Some(iter) = iter {
                print_expr(out, iter);
            }
            out.push_str(" )\n");
            print_stmt(out, body, depth + 1);
        },
        Stmt::Break => {
            indent(out, depth);
            out.push_str("break;\n");
        },
        Stmt::Continue => {
            indent(out, depth);
            out.push_str("continue;\n");
        },
        Stmt::Block(statements) => {
            indent(out, depth.saturating_sub(1));
            out.push_str("{\n");
            for stmt in statements {
                print_stmt(out, stmt, depth + 1);
            }
            indent(out, depth.saturating_sub(1));
            out.push_str("}\n");
        },
        Stmt::TextureDecl(name) => {
            indent(out, depth);
            let _ = writeln!(out, "texture2d {};", name);
        },
        Stmt::ShaderResourceDecl(name) => {
            indent(out, depth);
            let _ = writeln!(out, "shader_resource {};", name);
        }
    }
}

fn binary_op_text(op: BinaryOp) -> &'static str
{
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        BinaryOp::And => "&&",
        BinaryOp::Or => "||",
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
        BinaryOp::Gt => ">",
        BinaryOp::Lt => "<",
        BinaryOp::Ge => ">=",
        BinaryOp::Le => "<=",
        BinaryOp::Shl => "<<",
        BinaryOp::Shr => ">>",
        BinaryOp::BitAnd => "&",
        BinaryOp::BitOr => "|",
        BinaryOp::BitXor => "^"
    }
}

fn assign_op_text(op: AssignOp) -> &'static str
{
    match op {
        AssignOp::Assign => "=",
        AssignOp::AddAssign => "+=",
        AssignOp::SubAssign => "-=",
        AssignOp::MulAssign => "*=",
        AssignOp::DivAssign => "/=",
        AssignOp::ModAssign => "%=",
        AssignOp::AndAssign => "&=",
        AssignOp::OrAssign => "|=",
        AssignOp::XorAssign => "^=",
        AssignOp::ShlAssign => "<<=",
        AssignOp::ShrAssign => ">>="
    }
}

fn print_args(out: &mut String, args: &[Expr])
{
    out.push('(');
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        print_expr(out, arg);
    }
    out.push(')');
}

fn print_expr(out: &mut String, expr: &Expr)
{
    match expr {
        Expr::LiteralInt(value) => {
            let _ = write!(out, "{}", value);
        },
        Expr::LiteralFloat(value) => {
            // keep a decimal point so the literal lexes as a float again
            if value.fract() == 0.0 && value.is_finite() {
                let _ = write!(out, "{:.1}f", value);
            } else {
                let _ = write!(out, "{}f", value);
            }
        },
        Expr::LiteralDouble(value) => {
            if value.fract() == 0.0 && value.is_finite() {
                let _ = write!(out, "{:.1}d", value);
            } else {
                let _ = write!(out, "{}d", value);
            }
        },
        Expr::LiteralBool(value) => {
            let _ = write!(out, "{}", value);
        },
        Expr::GlobalValue(name) => {
            let _ = write!(out, "global_value<{}>", name);
        },
        Expr::VariableRef(name) => out.push_str(name),
        Expr::ArrayAccess { var, index } => {
            print_expr(out, var);
            out.push('[');
            print_expr(out, index);
            out.push(']');
        },
        Expr::MemberRef { var, member } => {
            print_expr(out, var);
            out.push('.');
            out.push_str(member);
        },
        Expr::Unary { op, operand } => {
            out.push_str(match op {
                UnaryOp::Pos => "+",
                UnaryOp::Neg => "-",
                UnaryOp::Not => "!",
                UnaryOp::Compl => "~"
            });
            out.push('(');
            print_expr(out, operand);
            out.push(')');
        },
        Expr::Binary { op, left, right } => {
            out.push('(');
            print_expr(out, left);
            let _ = write!(out, " {} ", binary_op_text(*op));
            print_expr(out, right);
            out.push(')');
        },
        Expr::PreInc(var) => {
            out.push_str("++");
            print_expr(out, var);
        },
        Expr::PreDec(var) => {
            out.push_str("--");
            print_expr(out, var);
        },
        Expr::PostInc(var) => {
            print_expr(out, var);
            out.push_str("++");
        },
        Expr::PostDec(var) => {
            print_expr(out, var);
            out.push_str("--");
        },
        Expr::Ternary { cond, true_expr, false_expr } => {
            out.push('(');
            print_expr(out, cond);
            out.push_str(" ? ");
            print_expr(out, true_expr);
            out.push_str(" : ");
            print_expr(out, false_expr);
            out.push(')');
        },
        Expr::Assign { op, target, value } => {
            print_expr(out, target);
            let _ = write!(out, " {} ", assign_op_text(*op));
            print_expr(out, value);
        },
        Expr::FunctionCall { name, args } => {
            out.push_str(name);
            print_args(out, args);
        },
        Expr::Float3Constructor(args) => {
            out.push_str("vector");
            print_args(out, args);
        },
        Expr::MakeClosure { name, args } => {
            let _ = write!(out, "make_closure<{}>", name);
            print_args(out, args);
        },
        Expr::Texture2dSample { handle, args, sample_alpha } => {
            if *sample_alpha {
                let _ = write!(out, "texture2d_sample_alpha<{}>", handle);
            } else {
                let _ = write!(out, "texture2d_sample<{}>", handle);
            }
            print_args(out, args);
        },
        Expr::TypeCast { target, operand } => {
            let _ = write!(out, "({})", type_name(target));
            out.push('(');
            print_expr(out, operand);
            out.push(')');
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::parser::Parser;

    fn roundtrip(source: &str)
    {
        let first = Parser::parse_source(source).unwrap();
        let printed = print_program(&first);
        let second = Parser::parse_source(&printed)
            .unwrap_or_else(|err| panic!("printed source failed to parse: {}\n{}", err, printed));
        let reprinted = print_program(&second);
        assert_eq!(printed, reprinted);
    }

    #[test]
    fn print_simple_shader()
    {
        let program = Parser::parse_source("shader f(out float v){ v = 5.0f; }").unwrap();
        let printed = print_program(&program);
        assert_eq!(printed, "shader f(out float v){\n    v = 5.0f;\n}\n");
    }

    #[test]
    fn roundtrip_arithmetic()
    {
        roundtrip(
            r#"
                shader f(int a, int b, out int o0){
                    o0 = a + b * 3 - (a ^ b) % 7;
                }
            "#
        );
    }

    #[test]
    fn roundtrip_control_flow()
    {
        roundtrip(
            r#"
                int fib(int n){
                    if( n < 2 )
                        return n;
                    return fib(n-1) + fib(n-2);
                }

                shader main(int a, out int r){
                    for( int i = 0 ; i < a ; ++i ){
                        if( i % 2 == 0 )
                            continue;
                        r += fib(i);
                    }
                    while( r > 100 )
                        r -= 100;
                }
            "#
        );
    }

    #[test]
    fn roundtrip_structures_and_arrays()
    {
        roundtrip(
            r#"
                struct light { vector position; float attenuation; };

                shader main(out float o0){
                    float a[2] = { 1.0f, 5.0f };
                    light l;
                    l.attenuation = a[1];
                    o0 = l.attenuation;
                }
            "#
        );
    }

    #[test]
    fn roundtrip_closures_and_resources()
    {
        roundtrip(
            r#"
                texture2d g_tex;

                shader main(float u, float v, out closure o){
                    color base = texture2d_sample<g_tex>(u, v);
                    o = 0.5f * make_closure<lambert>(1, base.r);
                }
            "#
        );
    }
}
