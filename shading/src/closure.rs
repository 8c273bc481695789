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

//! Closure tree nodes written by shaders and walked by the host renderer.
//!
//! The layouts below are generated from LLVM as well, both sides have to
//! agree on the exact byte layout or reading the tree will crash.

use std::ffi::c_void;

use crate::args::ShaderArgType;

pub type ClosureId = i32;

pub const INVALID_CLOSURE_ID: ClosureId = 0;
pub const CLOSURE_ADD: ClosureId = -1;
pub const CLOSURE_MUL: ClosureId = -2;

/// Common prefix of every closure tree node.
#[repr(C)]
#[derive(Debug)]
pub struct ClosureTreeNodeBase {
    pub id: ClosureId,
    _pad: u32,
    pub params: *mut c_void
}

/// `left + right` of two closures.
#[repr(C)]
#[derive(Debug)]
pub struct ClosureTreeNodeAdd {
    pub base: ClosureTreeNodeBase,
    pub closure0: *const ClosureTreeNodeBase,
    pub closure1: *const ClosureTreeNodeBase
}

/// A closure scaled by a float weight.
#[repr(C)]
#[derive(Debug)]
pub struct ClosureTreeNodeMul {
    pub base: ClosureTreeNodeBase,
    pub weight: f32,
    _pad: u32,
    pub closure: *const ClosureTreeNodeBase
}

impl ClosureTreeNodeBase {
    /// View this node as an add node. Only valid when `id` says so.
    pub fn as_add_node(&self) -> Option<&ClosureTreeNodeAdd> {
        if self.id == CLOSURE_ADD {
            // SAFETY: add nodes are allocated with the add layout and tagged CLOSURE_ADD
            Some(unsafe { &*(self as *const ClosureTreeNodeBase as *const ClosureTreeNodeAdd) })
        } else {
            None
        }
    }

    /// View this node as a mul node. Only valid when `id` says so.
    pub fn as_mul_node(&self) -> Option<&ClosureTreeNodeMul> {
        if self.id == CLOSURE_MUL {
            // SAFETY: mul nodes are allocated with the mul layout and tagged CLOSURE_MUL
            Some(unsafe { &*(self as *const ClosureTreeNodeBase as *const ClosureTreeNodeMul) })
        } else {
            None
        }
    }
}

// The generated code hard-codes these layouts, a mismatch corrupts memory.
const _: () = assert!(
    std::mem::size_of::<ClosureTreeNodeBase>()
        == std::mem::size_of::<ClosureId>() + 4 + std::mem::size_of::<*mut c_void>()
);
const _: () = assert!(
    std::mem::size_of::<ClosureTreeNodeAdd>()
        == std::mem::size_of::<ClosureTreeNodeBase>() + 2 * std::mem::size_of::<*const ClosureTreeNodeBase>()
);
const _: () = assert!(
    std::mem::size_of::<ClosureTreeNodeMul>()
        == std::mem::size_of::<ClosureTreeNodeBase>() + 8 + std::mem::size_of::<*const ClosureTreeNodeBase>()
);

/// One field of a registered closure parameter structure.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosureVar {
    pub name: String,
    pub ty: ShaderArgType
}

impl ClosureVar {
    pub fn new(name: impl Into<String>, ty: ShaderArgType) -> ClosureVar {
        ClosureVar { name: name.into(), ty }
    }
}

pub type ClosureVarList = Vec<ClosureVar>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_views_check_the_id() {
        let node = ClosureTreeNodeBase {
            id: CLOSURE_ADD,
            _pad: 0,
            params: std::ptr::null_mut()
        };
        assert!(node.as_add_node().is_some());
        assert!(node.as_mul_node().is_none());
    }

    #[test]
    fn layouts() {
        let ptr = std::mem::size_of::<*const ClosureTreeNodeBase>();
        assert_eq!(std::mem::size_of::<ClosureTreeNodeBase>(), 8 + ptr);
        assert_eq!(std::mem::size_of::<ClosureTreeNodeAdd>(), 8 + 3 * ptr);
        assert_eq!(std::mem::size_of::<ClosureTreeNodeMul>(), 16 + ptr + ptr);
    }
}
