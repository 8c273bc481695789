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

use std::ffi::c_void;

use tsl_shading::{make_float3, Float3, ResolvingStatus, ShadingSystem};

// stands in for a renderer owned texture object
struct FakeTexture {
    _width: u32,
    _height: u32
}

#[test]
fn sample_texture_color() {
    common::setup();
    let texture = FakeTexture { _width: 16, _height: 16 };
    let context = ShadingSystem::instance().make_shading_context();

    let mut unit = context.begin_shader_unit_template("sample_texture_color");
    assert!(unit.register_shader_resource(
        "g_texture",
        &texture as *const FakeTexture as *const c_void
    ));
    unit.compile_shader_source(
        r#"
            texture2d g_texture;

            shader function_name(float u, float v, out color result){
                result = texture2d_sample<g_texture>(u, v);
            }
        "#
    )
    .unwrap();
    let unit = context.end_shader_unit_template(unit);

    let mut instance = unit.make_shader_instance();
    assert_eq!(
        ResolvingStatus::Succeed,
        context.resolve_shader_instance(&mut instance)
    );

    let shader: extern "C" fn(f32, f32, *mut Float3) =
        unsafe { std::mem::transmute(instance.get_function()) };
    let mut color = Float3::default();
    // the test callback answers (2u, 2v, u + v)
    shader(0.25, 0.5, &mut color);
    assert_eq!(make_float3(0.5, 1.0, 0.75), color);
}

#[test]
fn sample_texture_alpha() {
    common::setup();
    let texture = FakeTexture { _width: 4, _height: 4 };
    let context = ShadingSystem::instance().make_shading_context();

    let mut unit = context.begin_shader_unit_template("sample_texture_alpha");
    assert!(unit.register_shader_resource(
        "g_texture",
        &texture as *const FakeTexture as *const c_void
    ));
    unit.compile_shader_source(
        r#"
            texture2d g_texture;

            shader function_name(float u, float v, out float alpha){
                alpha = texture2d_sample_alpha<g_texture>(u, v);
            }
        "#
    )
    .unwrap();
    let unit = context.end_shader_unit_template(unit);

    let mut instance = unit.make_shader_instance();
    assert_eq!(
        ResolvingStatus::Succeed,
        context.resolve_shader_instance(&mut instance)
    );

    let shader: extern "C" fn(f32, f32, *mut f32) =
        unsafe { std::mem::transmute(instance.get_function()) };
    let mut alpha = 0.0f32;
    shader(0.5, 0.5, &mut alpha);
    assert_eq!(0.25, alpha);
}

#[test]
fn unregistered_texture_is_rejected() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let mut unit = context.begin_shader_unit_template("unregistered_texture");
    assert!(unit
        .compile_shader_source(
            r#"
                texture2d g_texture;

                shader function_name(float u, float v, out color result){
                    result = texture2d_sample<g_texture>(u, v);
                }
            "#
        )
        .is_err());
}
