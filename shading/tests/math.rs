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

mod common;

use common::compile_shader;
use tsl_shading::{Float3, ShadingSystem};

#[test]
fn integer_arithmetic() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let instance = compile_shader(
        &context,
        "integer_arithmetic",
        r#"
            shader function_name(int a, int b, out int o0, out int o1, out int o2, out int o3, out int o4){
                o0 = a + b;
                o1 = a - b;
                o2 = a * b;
                o3 = a / b;
                o4 = a % b;
            }
        "#
    );

    let shader: extern "C" fn(i32, i32, *mut i32, *mut i32, *mut i32, *mut i32, *mut i32) =
        unsafe { std::mem::transmute(instance.get_function()) };
    let (mut o0, mut o1, mut o2, mut o3, mut o4) = (0, 0, 0, 0, 0);
    shader(23, 12, &mut o0, &mut o1, &mut o2, &mut o3, &mut o4);
    assert_eq!(35, o0);
    assert_eq!(11, o1);
    assert_eq!(276, o2);
    assert_eq!(1, o3);
    assert_eq!(11, o4);
}

#[test]
fn integer_wrapping() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let instance = compile_shader(
        &context,
        "integer_wrapping",
        r#"
            shader function_name(int a, int b, out int o0){
                o0 = a + b;
            }
        "#
    );

    let shader: extern "C" fn(i32, i32, *mut i32) =
        unsafe { std::mem::transmute(instance.get_function()) };
    let mut value = 0;
    shader(i32::MAX, 1, &mut value);
    assert_eq!(i32::MAX.wrapping_add(1), value);
}

#[test]
fn float_arithmetic() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let instance = compile_shader(
        &context,
        "float_arithmetic",
        r#"
            shader function_name(float a, float b, out float o0, out float o1, out float o2, out float o3){
                o0 = a + b;
                o1 = a - b;
                o2 = a * b;
                o3 = a / b;
            }
        "#
    );

    let shader: extern "C" fn(f32, f32, *mut f32, *mut f32, *mut f32, *mut f32) =
        unsafe { std::mem::transmute(instance.get_function()) };
    let (mut o0, mut o1, mut o2, mut o3) = (0.0f32, 0.0f32, 0.0f32, 0.0f32);
    shader(6.0, 1.5, &mut o0, &mut o1, &mut o2, &mut o3);
    assert_eq!(7.5, o0);
    assert_eq!(4.5, o1);
    assert_eq!(9.0, o2);
    assert_eq!(4.0, o3);
}

#[test]
fn compound_assignments() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let instance = compile_shader(
        &context,
        "compound_assignments",
        r#"
            shader function_name(int a, out int o0){
                int k = a;
                k += 3;
                k -= 1;
                k *= 4;
                k /= 2;
                k %= 100;
                o0 = k;
            }
        "#
    );

    let shader: extern "C" fn(i32, *mut i32) =
        unsafe { std::mem::transmute(instance.get_function()) };
    let mut value = 0;
    shader(10, &mut value);
    // ((10 + 3 - 1) * 4 / 2) % 100
    assert_eq!(24, value);
}

#[test]
fn bitwise_operators() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let instance = compile_shader(
        &context,
        "bitwise_operators",
        r#"
            shader function_name(int a, int b, out int o0, out int o1, out int o2, out int o3, out int o4){
                o0 = a & b;
                o1 = a | b;
                o2 = a ^ b;
                o3 = a << 2;
                o4 = a >> 1;
            }
        "#
    );

    let shader: extern "C" fn(i32, i32, *mut i32, *mut i32, *mut i32, *mut i32, *mut i32) =
        unsafe { std::mem::transmute(instance.get_function()) };
    let (mut o0, mut o1, mut o2, mut o3, mut o4) = (0, 0, 0, 0, 0);
    shader(0b1100, 0b1010, &mut o0, &mut o1, &mut o2, &mut o3, &mut o4);
    assert_eq!(0b1000, o0);
    assert_eq!(0b1110, o1);
    assert_eq!(0b0110, o2);
    assert_eq!(0b110000, o3);
    assert_eq!(0b110, o4);
}

#[test]
fn arithmetic_shift_right() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let instance = compile_shader(
        &context,
        "arithmetic_shift_right",
        r#"
            shader function_name(int a, out int o0){
                o0 = a >> 2;
            }
        "#
    );

    let shader: extern "C" fn(i32, *mut i32) =
        unsafe { std::mem::transmute(instance.get_function()) };
    let mut value = 0;
    shader(-64, &mut value);
    assert_eq!(-16, value);
}

#[test]
fn increment_and_decrement() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let instance = compile_shader(
        &context,
        "increment_and_decrement",
        r#"
            shader function_name(int a, out int o0, out int o1, out int o2){
                int k = a;
                o0 = k++;
                o1 = ++k;
                o2 = --k + k--;
            }
        "#
    );

    let shader: extern "C" fn(i32, *mut i32, *mut i32, *mut i32) =
        unsafe { std::mem::transmute(instance.get_function()) };
    let (mut o0, mut o1, mut o2) = (0, 0, 0);
    shader(5, &mut o0, &mut o1, &mut o2);
    assert_eq!(5, o0);
    assert_eq!(7, o1);
    // --k yields 6, k-- yields 6
    assert_eq!(12, o2);
}

#[test]
fn ternary_select() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let instance = compile_shader(
        &context,
        "ternary_select",
        r#"
            shader function_name(int a, out int o0){
                o0 = a > 0 ? a : -a;
            }
        "#
    );

    let shader: extern "C" fn(i32, *mut i32) =
        unsafe { std::mem::transmute(instance.get_function()) };
    let mut value = 0;
    shader(-13, &mut value);
    assert_eq!(13, value);
    shader(9, &mut value);
    assert_eq!(9, value);
}

#[test]
fn type_cast() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let instance = compile_shader(
        &context,
        "type_cast",
        r#"
            shader function_name(float a, out int o0, out float o1){
                o0 = (int)a;
                o1 = (float)((int)a);
            }
        "#
    );

    let shader: extern "C" fn(f32, *mut i32, *mut f32) =
        unsafe { std::mem::transmute(instance.get_function()) };
    let mut truncated = 0;
    let mut rounded = 0.0f32;
    shader(3.75, &mut truncated, &mut rounded);
    assert_eq!(3, truncated);
    assert_eq!(3.0, rounded);
}

#[test]
fn vector_arithmetic() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let instance = compile_shader(
        &context,
        "vector_arithmetic",
        r#"
            shader function_name(out color o0, out color o1, out color o2){
                o0 = vector( 3.0f, 2.0f, 1.0f ) - vector( 1.0f, 2.0f, 3.0f );
                o1 = vector( 1.0f, 2.0f, 3.0f ) * 2.0f;
                o2 = 6.0f / vector( 1.0f, 2.0f, 3.0f );
            }
        "#
    );

    let shader: extern "C" fn(*mut Float3, *mut Float3, *mut Float3) =
        unsafe { std::mem::transmute(instance.get_function()) };
    let mut o0 = Float3::default();
    let mut o1 = Float3::default();
    let mut o2 = Float3::default();
    shader(&mut o0, &mut o1, &mut o2);
    assert_eq!(tsl_shading::make_float3(2.0, 0.0, -2.0), o0);
    assert_eq!(tsl_shading::make_float3(2.0, 4.0, 6.0), o1);
    assert_eq!(tsl_shading::make_float3(6.0, 3.0, 2.0), o2);
}

#[test]
fn vector_members() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let instance = compile_shader(
        &context,
        "vector_members",
        r#"
            shader function_name(out float o0){
                color c = vector( 1.0f, 123.0f, 3.0f );
                c.b = c.r + c.g;
                o0 = c.z;
            }
        "#
    );

    let shader: extern "C" fn(*mut f32) = unsafe { std::mem::transmute(instance.get_function()) };
    let mut value = 0.0f32;
    shader(&mut value);
    assert_eq!(124.0, value);
}

#[test]
fn vector_broadcast_constructor() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let instance = compile_shader(
        &context,
        "vector_broadcast_constructor",
        r#"
            shader function_name(out color o0, out color o1){
                o0 = vector();
                o1 = vector( 2.0f );
            }
        "#
    );

    let shader: extern "C" fn(*mut Float3, *mut Float3) =
        unsafe { std::mem::transmute(instance.get_function()) };
    let mut zero = tsl_shading::make_float3(9.0, 9.0, 9.0);
    let mut broadcast = Float3::default();
    shader(&mut zero, &mut broadcast);
    assert_eq!(tsl_shading::make_float3(0.0, 0.0, 0.0), zero);
    assert_eq!(tsl_shading::make_float3(2.0, 2.0, 2.0), broadcast);
}

#[test]
fn vector_negation() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let instance = compile_shader(
        &context,
        "vector_negation",
        r#"
            shader function_name(out color o0){
                o0 = -vector( 1.0f, -2.0f, 3.0f );
            }
        "#
    );

    let shader: extern "C" fn(*mut Float3) = unsafe { std::mem::transmute(instance.get_function()) };
    let mut value = Float3::default();
    shader(&mut value);
    assert_eq!(tsl_shading::make_float3(-1.0, 2.0, -3.0), value);
}

#[test]
fn double_arithmetic() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let instance = compile_shader(
        &context,
        "double_arithmetic",
        r#"
            shader function_name(double a, double b, out double o0){
                o0 = a * b + 1.5d;
            }
        "#
    );

    let shader: extern "C" fn(f64, f64, *mut f64) =
        unsafe { std::mem::transmute(instance.get_function()) };
    let mut value = 0.0f64;
    shader(2.5, 4.0, &mut value);
    assert_eq!(11.5, value);
}
