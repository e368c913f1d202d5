//! GPU-facing vertex layouts for the FillSTC stencil-then-cover passes.
//! Four `u32`/`f32` slots per vertex, exactly as described in the external
//! interfaces: line-stencil carries raw floats, the other three passes
//! carry static-data block indices so the heavy per-vertex payload (curve
//! endpoints) lives once in a `StaticDataBlock`, not duplicated per vertex.

use bytemuck::{Pod, Zeroable};

/// Triangle-fan vertex for the flat part of a contour's fill. `[0..3]` are
/// the two endpoints of the edge this vertex's triangle-fan wedge spans.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable, PartialEq)]
pub struct LineStencilVertex {
    pub path_a: [f32; 2],
    pub path_b: [f32; 2],
}

/// One of three vertices of a conic-coverage triangle. `tex_coord` is one
/// of `(0,0)`, `(0.5,0)`, `(1,1)` per vertex position in the triangle, so
/// the fragment shader's interior test reduces to `x^2 - y < 0`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable, PartialEq)]
pub struct ConicStencilVertex {
    pub static_data_index: u32,
    pub tex_coord: [f32; 2],
    pub triangle_v0_static_data_index: u32,
}

/// Anti-alias fuzz vertex for a line segment (explicit edge or implicit
/// closing edge).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable, PartialEq)]
pub struct LineFuzzVertex {
    pub static_data_index: u32,
    /// 0 = segment start, 1 = segment end.
    pub endpoint_selector: u32,
    /// -1.0 or +1.0, picking which side of the segment's normal this fuzz
    /// vertex sits on.
    pub normal_sign: f32,
    pub _pad: u32,
}

bitflags::bitflags! {
    /// Which corner of a conic triangle's AA fuzz quad this vertex occupies.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ConicFuzzCorner: u32 {
        const MAX_MAJOR = 0b01;
        const MAX_MINOR = 0b10;
    }
}

/// Anti-alias fuzz vertex for a conic triangle.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable, PartialEq)]
pub struct ConicFuzzVertex {
    pub static_data_index: u32,
    pub _pad0: u32,
    pub _pad1: u32,
    pub corner: u32,
}

/// A `gvec4`-sized static-data record: either a conic triangle's three
/// corner blocks or a line segment's two endpoint blocks, each carrying
/// `(pathA.x, pathA.y, pathB.x, pathB.y)`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable, PartialEq)]
pub struct StaticDataBlock {
    pub path_a: [f32; 2],
    pub path_b: [f32; 2],
}

impl StaticDataBlock {
    pub fn endpoint(p: [f32; 2]) -> Self {
        StaticDataBlock {
            path_a: p,
            path_b: [0.0, 0.0],
        }
    }
}
