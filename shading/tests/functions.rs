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
use tsl_shading::ShadingSystem;

#[test]
fn factorial() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let instance = compile_shader(
        &context,
        "factorial",
        r#"
            int factorial(int k){
                if(!k)
                    return 1;
                return k * factorial(k-1);
            }

            shader main(int a, out int r){
                r = factorial(a);
            }
        "#
    );

    let shader: extern "C" fn(i32, *mut i32) =
        unsafe { std::mem::transmute(instance.get_function()) };
    let mut value = 0;
    shader(10, &mut value);
    assert_eq!(3628800, value);
}

#[test]
fn fibonacci() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let instance = compile_shader(
        &context,
        "fibonacci",
        r#"
            int fib(int n){
                if( n < 2 )
                    return n;
                return fib(n-1) + fib(n-2);
            }

            shader main(int a, out int r){
                r = fib(a);
            }
        "#
    );

    let shader: extern "C" fn(i32, *mut i32) =
        unsafe { std::mem::transmute(instance.get_function()) };
    let mut value = 0;
    shader(10, &mut value);
    assert_eq!(55, value);
}

#[test]
fn function_with_output_argument() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let instance = compile_shader(
        &context,
        "function_with_output_argument",
        r#"
            void min_max(int a, int b, out int lo, out int hi){
                lo = a < b ? a : b;
                hi = a > b ? a : b;
            }

            shader main(int a, int b, out int lo, out int hi){
                min_max(a, b, lo, hi);
            }
        "#
    );

    let shader: extern "C" fn(i32, i32, *mut i32, *mut i32) =
        unsafe { std::mem::transmute(instance.get_function()) };
    let (mut lo, mut hi) = (0, 0);
    shader(42, 7, &mut lo, &mut hi);
    assert_eq!(7, lo);
    assert_eq!(42, hi);
}

#[test]
fn count_primes_with_runtime_sized_array() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let instance = compile_shader(
        &context,
        "count_primes",
        r#"
            int countPrimes(int n) {
                if(n<2) return 0;

                int a[n];
                for( int k = 0 ; k < n ; ++k )
                    a[k] = 0;

                int count = 0;
                for(int i = 2; i<n; ++i){
                    if(a[i] == 0){
                        count++;
                        for(int j = 1; j*i<n; ++j){
                            a[i*j] = 1;
                        }
                    }
                }
                return count;
            }

            shader main( int m, out int o0 ){
                o0 = countPrimes(m);
            }
        "#
    );

    let shader: extern "C" fn(i32, *mut i32) =
        unsafe { std::mem::transmute(instance.get_function()) };
    let mut value = 0;
    shader(100, &mut value);
    assert_eq!(25, value);
    shader(2, &mut value);
    assert_eq!(0, value);
}

#[test]
fn array_initializer() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let instance = compile_shader(
        &context,
        "array_initializer",
        r#"
            shader function_name(out float var){
                float a[2] = { 1.0f, 5.0f };
                var = a[1];
            }
        "#
    );

    let shader: extern "C" fn(*mut f32) = unsafe { std::mem::transmute(instance.get_function()) };
    let mut value = 0.0f32;
    shader(&mut value);
    assert_eq!(5.0, value);
}

#[test]
fn structures() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let instance = compile_shader(
        &context,
        "structures",
        r#"
            struct vertex {
                float x;
                float y;
                int tag;
            };

            shader main(float a, out float o0, out int o1){
                vertex v;
                v.x = a;
                v.y = a * 2.0f;
                v.tag = 7;
                o0 = v.x + v.y;
                o1 = v.tag;
            }
        "#
    );

    let shader: extern "C" fn(f32, *mut f32, *mut i32) =
        unsafe { std::mem::transmute(instance.get_function()) };
    let mut sum = 0.0f32;
    let mut tag = 0;
    shader(2.0, &mut sum, &mut tag);
    assert_eq!(6.0, sum);
    assert_eq!(7, tag);
}

#[test]
fn global_variables() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let instance = compile_shader(
        &context,
        "global_variables",
        r#"
            const float scale = 2.5f;
            int counter = 3;

            shader main(float a, out float o0){
                counter = counter + 1;
                o0 = a * scale + (float)counter;
            }
        "#
    );

    let shader: extern "C" fn(f32, *mut f32) =
        unsafe { std::mem::transmute(instance.get_function()) };
    let mut value = 0.0f32;
    shader(2.0, &mut value);
    assert_eq!(9.0, value);
}

#[test]
fn duplicated_function_is_rejected() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let mut unit = context.begin_shader_unit_template("duplicated_function");
    assert!(unit
        .compile_shader_source(
            r#"
                int helper(int a){ return a; }
                int helper(int a){ return a + 1; }
                shader main(out int o0){ o0 = helper(1); }
            "#
        )
        .is_err());
}

#[test]
fn calling_unknown_function_is_rejected() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let mut unit = context.begin_shader_unit_template("unknown_function");
    assert!(unit
        .compile_shader_source("shader main(out int o0){ o0 = missing(1); }")
        .is_err());
}

#[test]
fn wrong_arity_is_rejected() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let mut unit = context.begin_shader_unit_template("wrong_arity");
    assert!(unit
        .compile_shader_source(
            r#"
                int helper(int a, int b){ return a + b; }
                shader main(out int o0){ o0 = helper(1); }
            "#
        )
        .is_err());
}
