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

/// Outcome of resolving shader templates and instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvingStatus {
    Succeed,
    /// Input is invalid, commonly an empty or missing source.
    InvalidInput,
    /// One of the data types is invalid.
    InvalidDataType,
    /// No shader unit defined as root in the input shader group.
    ShaderGroupWithoutRoot,
    /// There is a cycle detected in the shader group.
    ShaderGroupWithCycles,
    /// Invalid shader group template.
    InvalidShaderGroupTemplate,
    /// Verification of the generated function failed.
    FunctionVerificationFailed,
    /// A specific shader unit is not defined in the shader group.
    UndefinedShaderUnit,
    /// One of the argument types defined in the shader group template is unknown.
    InvalidArgType,
    /// One of the arguments has no connection, no default and is not exposed.
    ArgumentWithoutInitialization,
    /// Shader units in the group disagree on the TSL global layout.
    InconsistentTSLGlobalType,
    /// Shader group exposes a parameter that does not exist.
    InvalidExposedParameter,
    /// This error type is not specified somehow.
    UnspecifiedError
}
