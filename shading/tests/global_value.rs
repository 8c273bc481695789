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

use common::compile_shader_with_global;
use tsl_shading::{make_float3, Float3, GlobalVar, GlobalVarList, ShaderArgType, ShadingSystem};

/// Host side mirror of the TSL global layout used across these tests.
#[repr(C)]
struct TslGlobal {
    intensity: f32,
    diffuse: Float3
}

fn tsl_global_layout() -> GlobalVarList {
    GlobalVarList::new(vec![
        GlobalVar::new("intensity", ShaderArgType::Float),
        GlobalVar::new("diffuse", ShaderArgType::Float3),
    ])
}

#[test]
fn access_data() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let instance = compile_shader_with_global(
        &context,
        "access_data",
        r#"
            shader function_name(out float var){
                var = global_value<intensity>;
            }
        "#,
        &tsl_global_layout()
    );

    let shader: extern "C" fn(*mut f32, *mut TslGlobal) =
        unsafe { std::mem::transmute(instance.get_function()) };
    let mut tsl_global = TslGlobal {
        intensity: 123.0,
        diffuse: make_float3(0.0, 0.0, 0.0)
    };
    let mut value = 0.0f32;
    shader(&mut value, &mut tsl_global);
    assert_eq!(123.0, value);
}

#[test]
fn access_float3_data() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let instance = compile_shader_with_global(
        &context,
        "access_float3_data",
        r#"
            shader function_name(out float var){
                color diff = global_value<diffuse>;
                var = diff.g;
            }
        "#,
        &tsl_global_layout()
    );

    let shader: extern "C" fn(*mut f32, *mut TslGlobal) =
        unsafe { std::mem::transmute(instance.get_function()) };
    let mut tsl_global = TslGlobal {
        intensity: 321.0,
        diffuse: make_float3(1.0, 123.0, 3.0)
    };
    let mut value = 0.0f32;
    shader(&mut value, &mut tsl_global);
    assert_eq!(123.0, value);
}

#[test]
fn global_value_reaches_helper_functions() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let instance = compile_shader_with_global(
        &context,
        "global_value_reaches_helper_functions",
        r#"
            float scaled(float s){
                return global_value<intensity> * s;
            }

            shader function_name(out float var){
                var = scaled(2.0f);
            }
        "#,
        &tsl_global_layout()
    );

    let shader: extern "C" fn(*mut f32, *mut TslGlobal) =
        unsafe { std::mem::transmute(instance.get_function()) };
    let mut tsl_global = TslGlobal {
        intensity: 21.0,
        diffuse: make_float3(0.0, 0.0, 0.0)
    };
    let mut value = 0.0f32;
    shader(&mut value, &mut tsl_global);
    assert_eq!(42.0, value);
}

#[test]
fn unknown_global_value_is_rejected() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let mut unit = context.begin_shader_unit_template("unknown_global_value");
    assert!(unit.register_tsl_global(&tsl_global_layout()));
    assert!(unit
        .compile_shader_source(
            r#"
                shader function_name(out float var){
                    var = global_value<no_such_field>;
                }
            "#
        )
        .is_err());
}

#[test]
fn global_value_without_layout_is_rejected() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let mut unit = context.begin_shader_unit_template("global_value_without_layout");
    assert!(unit
        .compile_shader_source(
            r#"
                shader function_name(out float var){
                    var = global_value<intensity>;
                }
            "#
        )
        .is_err());
}
