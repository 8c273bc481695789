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

use std::rc::Rc;

use common::{register_lambert, ClosureTypeLambert};
use tsl_shading::{
    make_float3,
    make_tsl_global_ref,
    ClosureTreeNodeBase,
    Float3,
    GlobalVar,
    GlobalVarList,
    ResolvingStatus,
    ShaderArgType,
    ShaderUnitInputDefaultValue,
    ShaderUnitTemplate,
    ShadingContext,
    ShadingSystem,
    CLOSURE_MUL
};

#[repr(C)]
struct TslGlobal {
    intensity: f32
}

fn intensity_layout() -> GlobalVarList {
    GlobalVarList::new(vec![GlobalVar::new("intensity", ShaderArgType::Float)])
}

fn compile_unit<'ctx>(
    context: &'ctx ShadingContext,
    name: &str,
    source: &str,
    layout: Option<&GlobalVarList>
) -> Rc<ShaderUnitTemplate<'ctx>> {
    let mut unit = context.begin_shader_unit_template(name);
    if let Some(layout) = layout {
        assert!(unit.register_tsl_global(layout));
    }
    unit.compile_shader_source(source).expect("shader compilation failed");
    context.end_shader_unit_template(unit)
}

#[test]
fn group_with_default_input_from_tsl_global() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let layout = intensity_layout();

    let root_unit = compile_unit(
        &context,
        "random_root_shader",
        r#"
            shader output_node( float in_var, out float out_bxdf ){
                out_bxdf = in_var;
            }
        "#,
        Some(&layout)
    );

    let mut group = context.begin_shader_group_template("default_from_tsl_global");
    assert!(group.add_shader_unit("root_shader", root_unit, true));
    assert!(group.register_tsl_global(&layout));
    group.expose_shader_argument("root_shader", "out_bxdf", true, None);
    group.init_shader_input("root_shader", "in_var", make_tsl_global_ref("intensity"));

    let group = context.end_shader_group_template(group).expect("group resolution failed");
    let mut instance = group.make_shader_instance();
    assert_eq!(
        ResolvingStatus::Succeed,
        context.resolve_shader_instance(&mut instance)
    );

    let shader: extern "C" fn(*mut f32, *mut TslGlobal) =
        unsafe { std::mem::transmute(instance.get_function()) };
    let mut tsl_global = TslGlobal { intensity: 123.0 };
    let mut value = 0.0f32;
    shader(&mut value, &mut tsl_global);
    assert_eq!(123.0, value);
}

#[test]
fn group_with_constant_default_input() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();

    let root_unit = compile_unit(
        &context,
        "constant_default_root",
        r#"
            shader output_node( float in_var, out float out_var ){
                out_var = in_var * 2.0f;
            }
        "#,
        None
    );

    let mut group = context.begin_shader_group_template("constant_default");
    assert!(group.add_shader_unit("root", root_unit, true));
    group.expose_shader_argument("root", "out_var", true, None);
    group.init_shader_input("root", "in_var", ShaderUnitInputDefaultValue::Float(21.0));

    let group = context.end_shader_group_template(group).expect("group resolution failed");
    let mut instance = group.make_shader_instance();
    assert_eq!(
        ResolvingStatus::Succeed,
        context.resolve_shader_instance(&mut instance)
    );

    let shader: extern "C" fn(*mut f32) = unsafe { std::mem::transmute(instance.get_function()) };
    let mut value = 0.0f32;
    shader(&mut value);
    assert_eq!(42.0, value);
}

#[test]
fn connected_units_with_closures() {
    let lambert_id = register_lambert();
    let context = ShadingSystem::instance().make_shading_context();
    let layout = intensity_layout();

    let root_unit = compile_unit(
        &context,
        "closure_scaling_root",
        r#"
            shader output_node( in closure in_bxdf , out closure out_bxdf ){
                out_bxdf = in_bxdf * global_value<intensity>;
            }
        "#,
        Some(&layout)
    );
    let bxdf_unit = compile_unit(
        &context,
        "closure_source",
        r#"
            shader lambert_node( out closure out_bxdf ){
                out_bxdf = make_closure<lambert>( 111, 4.0f );
            }
        "#,
        Some(&layout)
    );

    let mut group = context.begin_shader_group_template("closure_group");
    assert!(group.add_shader_unit("root_shader", root_unit, true));
    assert!(group.add_shader_unit("bxdf_shader", bxdf_unit, false));
    group.connect_shader_units("bxdf_shader", "out_bxdf", "root_shader", "in_bxdf");
    assert!(group.register_tsl_global(&layout));
    group.expose_shader_argument("root_shader", "out_bxdf", true, None);

    let group = context.end_shader_group_template(group).expect("group resolution failed");
    let mut instance = group.make_shader_instance();
    assert_eq!(
        ResolvingStatus::Succeed,
        context.resolve_shader_instance(&mut instance)
    );

    let shader: extern "C" fn(*mut *const ClosureTreeNodeBase, *mut TslGlobal) =
        unsafe { std::mem::transmute(instance.get_function()) };
    let mut tsl_global = TslGlobal { intensity: 123.0 };
    let mut root: *const ClosureTreeNodeBase = std::ptr::null();
    shader(&mut root, &mut tsl_global);

    let node = unsafe { &*root };
    assert_eq!(CLOSURE_MUL, node.id);
    let node = node.as_mul_node().unwrap();
    assert_eq!(123.0, node.weight);

    let lambert = unsafe { &*node.closure };
    assert_eq!(lambert_id, lambert.id);
    let params = unsafe { &*(lambert.params as *const ClosureTypeLambert) };
    assert_eq!(111, params.base_color);
    assert_eq!(4.0, params.normal);
}

#[test]
fn single_unit_group_matches_the_unit() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let source = r#"
        shader simple_node( float a, float b, out float sum, out float product ){
            sum = a + b;
            product = a * b;
        }
    "#;

    // the unit on its own
    let unit = compile_unit(&context, "standalone_unit", source, None);
    let mut unit_instance = unit.make_shader_instance();
    assert_eq!(
        ResolvingStatus::Succeed,
        context.resolve_shader_instance(&mut unit_instance)
    );

    // the same unit wrapped into a group exposing every parameter
    let mut group = context.begin_shader_group_template("wrapped_unit");
    assert!(group.add_shader_unit("only", unit.clone(), true));
    group.expose_shader_argument("only", "a", false, None);
    group.expose_shader_argument("only", "b", false, None);
    group.expose_shader_argument("only", "sum", true, None);
    group.expose_shader_argument("only", "product", true, None);
    let group = context.end_shader_group_template(group).expect("group resolution failed");
    let mut group_instance = group.make_shader_instance();
    assert_eq!(
        ResolvingStatus::Succeed,
        context.resolve_shader_instance(&mut group_instance)
    );

    let direct: extern "C" fn(f32, f32, *mut f32, *mut f32) =
        unsafe { std::mem::transmute(unit_instance.get_function()) };
    let wrapped: extern "C" fn(f32, f32, *mut f32, *mut f32) =
        unsafe { std::mem::transmute(group_instance.get_function()) };

    for (a, b) in [(1.0f32, 2.0f32), (0.5, -4.25), (1e6, 1e-6)] {
        let (mut s0, mut p0, mut s1, mut p1) = (0.0, 0.0, 0.0, 0.0);
        direct(a, b, &mut s0, &mut p0);
        wrapped(a, b, &mut s1, &mut p1);
        assert_eq!(s0.to_bits(), s1.to_bits());
        assert_eq!(p0.to_bits(), p1.to_bits());
    }
}

#[test]
fn same_template_twice_in_one_group() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();

    let double_unit = compile_unit(
        &context,
        "doubler",
        r#"
            shader double_node( float in_var, out float out_var ){
                out_var = in_var * 2.0f;
            }
        "#,
        None
    );

    let mut group = context.begin_shader_group_template("quadrupler");
    assert!(group.add_shader_unit("first", double_unit.clone(), false));
    assert!(group.add_shader_unit("second", double_unit, true));
    group.connect_shader_units("first", "out_var", "second", "in_var");
    group.expose_shader_argument("first", "in_var", false, None);
    group.expose_shader_argument("second", "out_var", true, None);

    let group = context.end_shader_group_template(group).expect("group resolution failed");
    let mut instance = group.make_shader_instance();
    assert_eq!(
        ResolvingStatus::Succeed,
        context.resolve_shader_instance(&mut instance)
    );

    let shader: extern "C" fn(f32, *mut f32) =
        unsafe { std::mem::transmute(instance.get_function()) };
    let mut value = 0.0f32;
    shader(10.0, &mut value);
    assert_eq!(40.0, value);
}

#[test]
fn exposed_argument_order_matches_expose_calls() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();

    let unit = compile_unit(
        &context,
        "ordered_args",
        r#"
            shader mix_node( float a, float b, out float out_var ){
                out_var = a - b;
            }
        "#,
        None
    );

    // expose b before a; the wrapper has to follow the expose order
    let mut group = context.begin_shader_group_template("ordered_group");
    assert!(group.add_shader_unit("mix", unit, true));
    group.expose_shader_argument("mix", "b", false, None);
    group.expose_shader_argument("mix", "a", false, None);
    group.expose_shader_argument("mix", "out_var", true, None);

    let group = context.end_shader_group_template(group).expect("group resolution failed");
    assert_eq!(
        vec!["b", "a", "out_var"],
        group
            .exposed_arguments()
            .iter()
            .map(|arg| arg.name.as_str())
            .collect::<Vec<_>>()
    );

    let mut instance = group.make_shader_instance();
    assert_eq!(
        ResolvingStatus::Succeed,
        context.resolve_shader_instance(&mut instance)
    );

    let shader: extern "C" fn(f32, f32, *mut f32) =
        unsafe { std::mem::transmute(instance.get_function()) };
    let mut value = 0.0f32;
    shader(3.0, 10.0, &mut value);
    // first parameter is b, second is a, result is a - b
    assert_eq!(7.0, value);
}

#[test]
fn float3_default_value() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();

    let unit = compile_unit(
        &context,
        "float3_default_unit",
        r#"
            shader tint_node( color tint, out color out_var ){
                out_var = tint * 2.0f;
            }
        "#,
        None
    );

    let mut group = context.begin_shader_group_template("float3_default_group");
    assert!(group.add_shader_unit("tint", unit, true));
    group.expose_shader_argument("tint", "out_var", true, None);
    group.init_shader_input(
        "tint",
        "tint",
        ShaderUnitInputDefaultValue::Float3(make_float3(1.0, 2.0, 3.0))
    );

    let group = context.end_shader_group_template(group).expect("group resolution failed");
    let mut instance = group.make_shader_instance();
    assert_eq!(
        ResolvingStatus::Succeed,
        context.resolve_shader_instance(&mut instance)
    );

    let shader: extern "C" fn(*mut Float3) = unsafe { std::mem::transmute(instance.get_function()) };
    let mut value = Float3::default();
    shader(&mut value);
    assert_eq!(make_float3(2.0, 4.0, 6.0), value);
}

#[test]
fn group_without_root_is_rejected() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let unit = compile_unit(
        &context,
        "rootless_unit",
        "shader node( out float o ){ o = 1.0f; }",
        None
    );

    let mut group = context.begin_shader_group_template("rootless_group");
    assert!(group.add_shader_unit("a", unit, false));
    group.expose_shader_argument("a", "o", true, None);
    assert_eq!(
        Err(ResolvingStatus::ShaderGroupWithoutRoot),
        context.end_shader_group_template(group).map(|_| ())
    );
}

#[test]
fn cyclic_group_is_rejected() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let unit = compile_unit(
        &context,
        "cycle_unit",
        "shader node( float i, out float o ){ o = i; }",
        None
    );

    let mut group = context.begin_shader_group_template("cyclic_group");
    assert!(group.add_shader_unit("a", unit.clone(), true));
    assert!(group.add_shader_unit("b", unit, false));
    group.connect_shader_units("a", "o", "b", "i");
    group.connect_shader_units("b", "o", "a", "i");
    group.expose_shader_argument("a", "o", true, None);
    assert_eq!(
        Err(ResolvingStatus::ShaderGroupWithCycles),
        context.end_shader_group_template(group).map(|_| ())
    );
}

#[test]
fn uninitialized_input_is_rejected() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let unit = compile_unit(
        &context,
        "uninitialized_unit",
        "shader node( float i, out float o ){ o = i; }",
        None
    );

    let mut group = context.begin_shader_group_template("uninitialized_group");
    assert!(group.add_shader_unit("a", unit, true));
    group.expose_shader_argument("a", "o", true, None);
    assert_eq!(
        Err(ResolvingStatus::ArgumentWithoutInitialization),
        context.end_shader_group_template(group).map(|_| ())
    );
}

#[test]
fn unknown_unit_is_rejected() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let unit = compile_unit(
        &context,
        "known_unit",
        "shader node( out float o ){ o = 1.0f; }",
        None
    );

    let mut group = context.begin_shader_group_template("unknown_unit_group");
    assert!(group.add_shader_unit("a", unit, true));
    group.expose_shader_argument("missing", "o", true, None);
    assert_eq!(
        Err(ResolvingStatus::UndefinedShaderUnit),
        context.end_shader_group_template(group).map(|_| ())
    );
}

#[test]
fn inconsistent_tsl_global_is_rejected() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let layout = intensity_layout();

    let with_global = compile_unit(
        &context,
        "unit_with_global",
        "shader node( out float o ){ o = global_value<intensity>; }",
        Some(&layout)
    );

    let mut group = context.begin_shader_group_template("inconsistent_group");
    assert!(group.add_shader_unit("a", with_global, true));
    // the group never registers a layout of its own
    group.expose_shader_argument("a", "o", true, None);
    assert_eq!(
        Err(ResolvingStatus::InconsistentTSLGlobalType),
        context.end_shader_group_template(group).map(|_| ())
    );
}

#[test]
fn second_root_is_rejected() {
    common::setup();
    let context = ShadingSystem::instance().make_shading_context();
    let unit = compile_unit(
        &context,
        "root_candidate",
        "shader node( out float o ){ o = 1.0f; }",
        None
    );

    let mut group = context.begin_shader_group_template("two_roots");
    assert!(group.add_shader_unit("a", unit.clone(), true));
    assert!(!group.add_shader_unit("b", unit, true));
}
