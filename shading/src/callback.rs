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

//! Host callback surface.
//!
//! The host registers one implementation of [`ShadingSystemInterface`]. The
//! `extern "C"` shims below are what the generated code actually calls, they
//! forward into the registered implementation.

use std::ffi::c_void;
use std::sync::{Arc, RwLock};

use log::error;
use once_cell::sync::Lazy;

use crate::args::Float3;

/// Debug information levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugLevel {
    /// General debugging information.
    Info,
    /// Badly written code in shader sources.
    Warning,
    /// Will most likely result in a failed shader compilation.
    Error
}

/// Renderer implemented services used from inside TSL.
///
/// Every method may be called from multiple shader invocations at the same
/// time, implementations have to be thread safe. TSL never synchronizes
/// around these calls.
pub trait ShadingSystemInterface: Send + Sync {
    /// Allocate memory inside shaders. The host owns the lifetime of the
    /// returned buffer, TSL never frees it.
    fn allocate(&self, size: u32, tsl_global: *mut c_void) -> *mut c_void;

    /// Receives errors and warnings produced during shader compilation.
    fn catch_debug(&self, level: DebugLevel, message: &str);

    /// Sample the RGB channels of a 2d texture.
    fn sample_2d(&self, texture: *const c_void, u: f32, v: f32, color: &mut Float3);

    /// Sample the alpha channel of a 2d texture.
    fn sample_alpha_2d(&self, texture: *const c_void, u: f32, v: f32, alpha: &mut f32);
}

static CALLBACK: Lazy<RwLock<Option<Arc<dyn ShadingSystemInterface>>>> =
    Lazy::new(|| RwLock::new(None));

pub(crate) fn register_callback(callback: Box<dyn ShadingSystemInterface>) {
    *CALLBACK.write().unwrap() = Some(Arc::from(callback));
}

pub(crate) fn current_callback() -> Option<Arc<dyn ShadingSystemInterface>> {
    CALLBACK.read().unwrap().clone()
}

/// Report a compilation diagnostic through the registered callback.
pub(crate) fn emit_debug(level: DebugLevel, message: &str) {
    if let Some(callback) = current_callback() {
        callback.catch_debug(level, message);
    }
}

/// `TSL_MALLOC`, memory allocation from within shaders.
pub(crate) extern "C" fn tsl_malloc(size: u32) -> *mut c_void {
    match current_callback() {
        Some(callback) => callback.allocate(size, std::ptr::null_mut()),
        None => {
            error!("no shading system interface registered, allocation of {} bytes failed", size);
            std::ptr::null_mut()
        }
    }
}

/// `TSL_TEXTURE2D_SAMPLE`, RGB texture sampling from within shaders.
pub(crate) extern "C" fn tsl_texture2d_sample(
    texture: *const c_void,
    color: *mut Float3,
    u: f32,
    v: f32
) {
    if let Some(callback) = current_callback() {
        // SAFETY: the generated code passes a pointer to a stack allocated float3
        callback.sample_2d(texture, u, v, unsafe { &mut *color });
    }
}

/// `TSL_TEXTURE2D_SAMPLE_ALPHA`, alpha channel sampling from within shaders.
pub(crate) extern "C" fn tsl_texture2d_sample_alpha(
    texture: *const c_void,
    alpha: *mut f32,
    u: f32,
    v: f32
) {
    if let Some(callback) = current_callback() {
        // SAFETY: the generated code passes a pointer to a stack allocated float
        callback.sample_alpha_2d(texture, u, v, unsafe { &mut *alpha });
    }
}
