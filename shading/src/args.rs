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

//! Argument related data structures shared between shaders and the host.

use std::ops::{Add, Mul, Sub};

use tsl_lang::ast::{DataKind, DataType};

/// Basic float3 type shared with shaders. The layout has to match what the
/// generated code writes through output pointers.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Float3 {
    pub x: f32,
    pub y: f32,
    pub z: f32
}

pub fn make_float3(x: f32, y: f32, z: f32) -> Float3 {
    Float3 { x, y, z }
}

impl Add for Float3 {
    type Output = Float3;

    fn add(self, rhs: Float3) -> Float3 {
        make_float3(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Float3 {
    type Output = Float3;

    fn sub(self, rhs: Float3) -> Float3 {
        make_float3(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul for Float3 {
    type Output = Float3;

    fn mul(self, rhs: Float3) -> Float3 {
        make_float3(self.x * rhs.x, self.y * rhs.y, self.z * rhs.z)
    }
}

/// Type of an argument crossing the host/shader boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderArgType {
    Int,
    Float,
    Double,
    Bool,
    Float3,
    Closure
}

impl ShaderArgType {
    pub fn to_data_type(self) -> DataType {
        match self {
            ShaderArgType::Int => DataType::INT,
            ShaderArgType::Float => DataType::FLOAT,
            ShaderArgType::Double => DataType::DOUBLE,
            ShaderArgType::Bool => DataType::BOOL,
            ShaderArgType::Float3 => DataType::float3(),
            ShaderArgType::Closure => DataType::CLOSURE
        }
    }

    pub fn from_data_type(ty: &DataType) -> Option<ShaderArgType> {
        match ty.kind {
            DataKind::Int => Some(ShaderArgType::Int),
            DataKind::Float => Some(ShaderArgType::Float),
            DataKind::Double => Some(ShaderArgType::Double),
            DataKind::Bool => Some(ShaderArgType::Bool),
            DataKind::Closure => Some(ShaderArgType::Closure),
            DataKind::Struct if ty.struct_name.as_deref() == Some("float3") => {
                Some(ShaderArgType::Float3)
            },
            _ => None
        }
    }
}

/// One field of the TSL global structure.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalVar {
    pub name: String,
    pub ty: ShaderArgType
}

impl GlobalVar {
    pub fn new(name: impl Into<String>, ty: ShaderArgType) -> GlobalVar {
        GlobalVar { name: name.into(), ty }
    }
}

/// Memory layout of the host defined global structure read by shaders
/// through `global_value<field>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalVarList {
    pub var_list: Vec<GlobalVar>
}

impl GlobalVarList {
    pub fn new(var_list: Vec<GlobalVar>) -> GlobalVarList {
        GlobalVarList { var_list }
    }

    pub fn is_empty(&self) -> bool {
        self.var_list.is_empty()
    }
}

/// Exposed argument descriptor of a shader template.
///
/// A shader unit exposes everything its root function declares; a shader
/// group exposes only what the host asked for, in call order.
#[derive(Debug, Clone, PartialEq)]
pub struct ExposedArgDescriptor {
    pub name: String,
    pub ty: DataType,
    pub is_output: bool
}

/// Default value for an unconnected shader group input.
///
/// `TslGlobalRef` points the input at a field of the TSL global structure
/// instead of a fixed constant.
#[derive(Debug, Clone, PartialEq)]
pub enum ShaderUnitInputDefaultValue {
    Int(i32),
    Float(f32),
    Double(f64),
    Bool(bool),
    Float3(Float3),
    TslGlobalRef(String)
}

/// Shortcut mirroring the host side helper of the C interface.
pub fn make_tsl_global_ref(name: impl Into<String>) -> ShaderUnitInputDefaultValue {
    ShaderUnitInputDefaultValue::TslGlobalRef(name.into())
}
