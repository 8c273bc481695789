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

//! JIT compiler and runtime of the tiny shading language.
//!
//! Shaders written in the language compile to native code through LLVM and
//! execute per shading point inside a host renderer. The host drives
//! everything through [`ShadingSystem`] and per thread [`ShadingContext`]s:
//! compile sources into [`ShaderUnitTemplate`]s, optionally wire several of
//! them into a [`ShaderGroupTemplate`], then resolve [`ShaderInstance`]s
//! into raw function pointers.

pub mod args;
pub mod callback;
pub mod closure;
mod codegen;
mod status;
mod system;

pub use args::{
    make_float3,
    make_tsl_global_ref,
    ExposedArgDescriptor,
    Float3,
    GlobalVar,
    GlobalVarList,
    ShaderArgType,
    ShaderUnitInputDefaultValue
};
pub use callback::{DebugLevel, ShadingSystemInterface};
pub use closure::{
    ClosureId,
    ClosureTreeNodeAdd,
    ClosureTreeNodeBase,
    ClosureTreeNodeMul,
    ClosureVar,
    ClosureVarList,
    CLOSURE_ADD,
    CLOSURE_MUL,
    INVALID_CLOSURE_ID
};
pub use status::ResolvingStatus;
pub use system::{
    ShaderError,
    ShaderGroupTemplate,
    ShaderInstance,
    ShaderUnitTemplate,
    ShadingContext,
    ShadingSystem
};
