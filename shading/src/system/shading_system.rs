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

use inkwell::targets::{InitializationConfig, Target};
use once_cell::sync::Lazy;

use crate::callback::{register_callback, ShadingSystemInterface};
use crate::closure::{ClosureId, ClosureVarList};
use crate::codegen::global_module::ClosureRegistry;
use crate::system::shading_context::ShadingContext;

static SYSTEM: Lazy<ShadingSystem> = Lazy::new(|| {
    Target::initialize_native(&InitializationConfig::default())
        .expect("failed to initialize the native JIT target");
    ShadingSystem {
        registry: ClosureRegistry::new()
    }
});

/// Root of the whole shading system, one per process.
///
/// It owns the closure registry and the registered host callback. The
/// handle returned by [`ShadingSystem::instance`] is how everything else is
/// reached; there is no way to construct a second instance.
pub struct ShadingSystem {
    registry: ClosureRegistry
}

impl ShadingSystem {
    /// The process wide instance.
    pub fn instance() -> &'static ShadingSystem {
        &SYSTEM
    }

    /// Register the host callback. This has to happen before any shader
    /// resolves; the system takes ownership of the implementation.
    pub fn register_shadingsystem_interface(callback: Box<dyn ShadingSystemInterface>) {
        register_callback(callback);
    }

    /// Register a closure type under a unique name. Registration is
    /// idempotent, the same name always maps to the same id.
    ///
    /// `closure_size` is the byte size of the host side parameter structure
    /// the `vars` describe.
    pub fn register_closure_type(
        &self,
        name: &str,
        vars: ClosureVarList,
        closure_size: i32
    ) -> ClosureId {
        self.registry.register(name, vars, closure_size)
    }

    /// Make a shading context for the calling thread. Contexts are
    /// independent; two threads may compile at the same time as long as each
    /// sticks to its own context.
    pub fn make_shading_context(&'static self) -> ShadingContext {
        ShadingContext::new(&self.registry)
    }
}
