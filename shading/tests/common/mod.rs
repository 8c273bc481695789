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

#![allow(dead_code)]

use std::ffi::c_void;
use std::sync::Once;

use tsl_shading::{
    make_float3,
    ClosureId,
    ClosureVar,
    DebugLevel,
    Float3,
    GlobalVarList,
    ResolvingStatus,
    ShaderArgType,
    ShaderInstance,
    ShadingContext,
    ShadingSystem,
    ShadingSystemInterface
};

/// Host side mirror of the `lambert` closure registered for the tests.
#[repr(C)]
pub struct ClosureTypeLambert {
    pub base_color: i32,
    pub normal: f32
}

/// Host side mirror of the `microfacet` closure registered for the tests.
#[repr(C)]
pub struct ClosureTypeMicrofacet {
    pub roughness: f32,
    pub specular: f32
}

struct TestInterface;

impl ShadingSystemInterface for TestInterface {
    fn allocate(&self, size: u32, _tsl_global: *mut c_void) -> *mut c_void {
        // the host owns shader allocated memory; the tests simply leak it
        let layout = std::alloc::Layout::from_size_align(size.max(1) as usize, 16).unwrap();
        unsafe { std::alloc::alloc_zeroed(layout) as *mut c_void }
    }

    fn catch_debug(&self, level: DebugLevel, message: &str) {
        eprintln!("[{:?}] {}", level, message);
    }

    fn sample_2d(&self, _texture: *const c_void, u: f32, v: f32, color: &mut Float3) {
        *color = make_float3(u * 2.0, v * 2.0, u + v);
    }

    fn sample_alpha_2d(&self, _texture: *const c_void, u: f32, v: f32, alpha: &mut f32) {
        *alpha = u * v;
    }
}

static SETUP: Once = Once::new();

/// Register the callback once per test binary. Closure registration is
/// idempotent so tests fetch ids by registering again.
pub fn setup() {
    SETUP.call_once(|| {
        ShadingSystem::register_shadingsystem_interface(Box::new(TestInterface));
    });
}

pub fn register_lambert() -> ClosureId {
    setup();
    ShadingSystem::instance().register_closure_type(
        "lambert",
        vec![
            ClosureVar::new("base_color", ShaderArgType::Int),
            ClosureVar::new("normal", ShaderArgType::Float),
        ],
        std::mem::size_of::<ClosureTypeLambert>() as i32
    )
}

pub fn register_microfacet() -> ClosureId {
    setup();
    ShadingSystem::instance().register_closure_type(
        "microfacet",
        vec![
            ClosureVar::new("roughness", ShaderArgType::Float),
            ClosureVar::new("specular", ShaderArgType::Float),
        ],
        std::mem::size_of::<ClosureTypeMicrofacet>() as i32
    )
}

/// Compile one source into a resolved shader instance.
pub fn compile_shader<'ctx>(
    context: &'ctx ShadingContext,
    name: &str,
    source: &str
) -> ShaderInstance<'ctx> {
    compile_shader_with_global(context, name, source, &GlobalVarList::default())
}

/// Compile one source with a TSL global layout registered on the template.
pub fn compile_shader_with_global<'ctx>(
    context: &'ctx ShadingContext,
    name: &str,
    source: &str,
    tsl_global: &GlobalVarList
) -> ShaderInstance<'ctx> {
    setup();
    let mut unit = context.begin_shader_unit_template(name);
    if !tsl_global.is_empty() {
        assert!(unit.register_tsl_global(tsl_global));
    }
    unit.compile_shader_source(source).expect("shader compilation failed");
    let unit = context.end_shader_unit_template(unit);

    let mut instance = unit.make_shader_instance();
    assert_eq!(
        ResolvingStatus::Succeed,
        context.resolve_shader_instance(&mut instance)
    );
    assert_ne!(0, instance.get_function());
    instance
}
