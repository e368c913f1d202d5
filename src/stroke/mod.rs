//! Stroke item-data & dash-pattern packing into GPU `gvec4` blocks.
//!
//! Reuses the sign-encoded-flag-in-a-float idiom for the graceful-thin and
//! miter-overflow bits; see `DESIGN.md` for the field layout's provenance.

pub mod dash;

pub use dash::{AdjustmentMode, DashPattern};

use crate::error::StrokePackError;

/// One GPU-sized `vec4`/`uvec4` block.
pub type GVec4 = [f32; 4];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiterOverflowPolicy {
    Clip,
    Bevel,
}

/// Stroke parameters feeding `ItemDataPacker::pack_base`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeParameters {
    pub radius: f32,
    /// When the stroke is thinner than can be faithfully rasterised, the
    /// renderer may fall back to a 1px "graceful thin" line; the packed
    /// radius carries this as a sign bit rather than a separate field.
    pub graceful_thin: bool,
    pub interpolation_t: f32,
    pub transform_handle: u32,
    pub miter_limit: f32,
    pub miter_overflow: MiterOverflowPolicy,
}

/// Packs stroke descriptors into `gvec4` blocks and reports their size
/// without requiring a scratch buffer first (`packed_size`).
pub struct ItemDataPacker;

impl ItemDataPacker {
    /// Packs the base stroke descriptor (one `gvec4`, regardless of whether
    /// a dash pattern follows): `(radius, t, transform_handle, miter_limit)`
    /// with `radius`/`miter_limit` sign-encoding `graceful_thin` and
    /// `miter_overflow` respectively.
    pub fn pack_base(params: &StrokeParameters) -> GVec4 {
        debug_assert!(params.radius >= 0.0, "stroke radius must be non-negative before sign-encoding");
        debug_assert!(params.miter_limit >= 0.0, "miter limit must be non-negative before sign-encoding");
        let radius = if params.graceful_thin { -params.radius } else { params.radius };
        let miter_limit = match params.miter_overflow {
            MiterOverflowPolicy::Clip => params.miter_limit,
            MiterOverflowPolicy::Bevel => -params.miter_limit,
        };
        [radius, params.interpolation_t, f32::from_bits(params.transform_handle), miter_limit]
    }

    pub fn unpack_base(block: GVec4) -> StrokeParameters {
        let [radius, t, handle, miter_limit] = block;
        StrokeParameters {
            radius: radius.abs(),
            graceful_thin: radius < 0.0,
            interpolation_t: t,
            transform_handle: handle.to_bits(),
            miter_limit: miter_limit.abs(),
            miter_overflow: if miter_limit < 0.0 { MiterOverflowPolicy::Bevel } else { MiterOverflowPolicy::Clip },
        }
    }

    /// Whether caps/joins collapse to nothing visible at `pixel_scale`
    /// (device pixels per logical unit), so the renderer can skip
    /// generating their geometry entirely for sub-pixel strokes.
    pub fn caps_joins_collapse(params: &StrokeParameters, pixel_scale: f32) -> bool {
        const MIN_VISIBLE_RADIUS_PX: f32 = 0.5;
        params.radius * pixel_scale < MIN_VISIBLE_RADIUS_PX
    }

    /// Number of `gvec4` blocks `pack` will write for these parameters: one
    /// base block, plus (if `dash` is given) two header blocks and
    /// `ceil(num_intervals / 4)` interval blocks.
    pub fn packed_size(dash: Option<&DashPattern>) -> Result<usize, StrokePackError> {
        let mut blocks = 1;
        if let Some(dash) = dash {
            let canonical = dash.canonicalize()?;
            blocks += 2 + canonical.len().div_ceil(4);
        }
        Ok(blocks)
    }

    /// Writes the base block (and, if `dash` is `Some`, the dash header and
    /// interval blocks) to `out`, in order.
    pub fn pack(params: &StrokeParameters, dash: Option<&DashPattern>, out: &mut Vec<GVec4>) -> Result<(), StrokePackError> {
        out.push(Self::pack_base(params));
        if let Some(dash) = dash {
            dash.pack_into(out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_block_round_trips_through_sign_encoding() {
        let params = StrokeParameters {
            radius: 2.5,
            graceful_thin: true,
            interpolation_t: 0.3,
            transform_handle: 0xDEAD_BEEF,
            miter_limit: 4.0,
            miter_overflow: MiterOverflowPolicy::Bevel,
        };
        let block = ItemDataPacker::pack_base(&params);
        assert_eq!(ItemDataPacker::unpack_base(block), params);
    }

    #[test]
    fn thin_stroke_below_half_pixel_collapses_caps_and_joins() {
        let params = StrokeParameters {
            radius: 0.1,
            graceful_thin: false,
            interpolation_t: 0.0,
            transform_handle: 0,
            miter_limit: 4.0,
            miter_overflow: MiterOverflowPolicy::Clip,
        };
        assert!(ItemDataPacker::caps_joins_collapse(&params, 1.0));
        assert!(!ItemDataPacker::caps_joins_collapse(&params, 20.0));
    }

    #[test]
    fn packed_size_matches_actual_pack_len_with_dash() {
        let dash = DashPattern::new(
            vec![(4.0, 2.0), (4.0, 2.0), (4.0, 2.0)],
            0.0,
            AdjustmentMode::Stretch,
            false,
            None,
        );
        let params = StrokeParameters {
            radius: 3.0,
            graceful_thin: false,
            interpolation_t: 1.0,
            transform_handle: 7,
            miter_limit: 4.0,
            miter_overflow: MiterOverflowPolicy::Clip,
        };
        let expected = ItemDataPacker::packed_size(Some(&dash)).unwrap();
        let mut out = Vec::new();
        ItemDataPacker::pack(&params, Some(&dash), &mut out).unwrap();
        assert_eq!(out.len(), expected);
    }
}
