//! `RenderEngine`: the pluggable GPU binding-layer seam for optional
//! rendering attached by trait object.
//!
//! The core crate — allocators, contour/path geometry, the FillSTC builder,
//! the glyph cache — never calls a GPU API directly; it produces data
//! (vertex streams, static-data blocks, tile geometry) and hands it to
//! whatever `RenderEngine` the caller constructed. This trait is the only
//! seam; a compliant implementation must reproduce the allocator/geometry
//! algorithms, not this particular binding.
//!
//! The one concrete implementation owns an `Arc<wgpu::Device>`/
//! `Arc<wgpu::Queue>`, hands out stable ids, and grows texture storage on
//! demand, gated behind the `wgpu-backend` feature so the core crate never
//! pulls `wgpu` in as a hard dependency.

/// A stable handle to a block of GPU-resident read-only static data
/// (conic-triangle or line-segment `gvec4` blocks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StaticDataHandle(pub u64);

/// A stable handle to an uploaded vertex-data buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexDataHandle(pub u64);

/// A stable handle to a GPU-resident shadow-map backing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShadowMapHandle(pub u64);

/// The GPU binding layer the core engine drives. Object-safe so a
/// `RenderEncoder` can hold `&mut dyn RenderEngine` without committing to a
/// concrete backend at compile time.
pub trait RenderEngine {
    /// Uploads `blocks` (already interleaved as `gvec4`s by `FillSTC`'s
    /// `pack_render_data` or `ItemDataPacker::pack`) as one contiguous
    /// static-data allocation.
    fn allocate_static_data(&mut self, blocks: &[[f32; 4]]) -> StaticDataHandle;

    /// Uploads a vertex buffer's raw bytes (already `bytemuck`-cast by the
    /// caller from one of the `vertex` module's `Pod` types).
    fn allocate_vertex_data(&mut self, bytes: &[u8]) -> VertexDataHandle;

    /// Current color-backing layer count and per-layer texel dimensions, so
    /// `ImageAtlas::flush` can decide whether a layer grow is needed.
    fn color_backing_layers(&self) -> (u32, u32, u32);

    /// Grows the color backing by `additional` layers. `false` if the
    /// backend's own hard limit (distinct from `ImageAtlas::max_color_layers`)
    /// is reached.
    fn grow_color_backing(&mut self, additional: u32) -> bool;

    /// Grows the index backing by `additional` layers.
    fn grow_index_backing(&mut self, additional: u32) -> bool;

    /// Allocates a shadow-map backing of `size` texels. `None` if the
    /// backend has no spare shadow-map budget.
    fn allocate_shadow_map(&mut self, size: (u32, u32)) -> Option<ShadowMapHandle>;
}

/// A `RenderEngine` that records allocations without touching any GPU API,
/// for use in tests and non-rendering contexts (geometry-only consumers).
#[derive(Debug, Default)]
pub struct NullRenderEngine {
    next_static: u64,
    next_vertex: u64,
    next_shadow: u64,
    color_layers: u32,
    index_layers: u32,
    layer_texels: u32,
}

impl NullRenderEngine {
    pub fn new(layer_texels: u32) -> Self {
        NullRenderEngine {
            layer_texels,
            ..Default::default()
        }
    }
}

impl RenderEngine for NullRenderEngine {
    fn allocate_static_data(&mut self, _blocks: &[[f32; 4]]) -> StaticDataHandle {
        let id = self.next_static;
        self.next_static += 1;
        StaticDataHandle(id)
    }

    fn allocate_vertex_data(&mut self, _bytes: &[u8]) -> VertexDataHandle {
        let id = self.next_vertex;
        self.next_vertex += 1;
        VertexDataHandle(id)
    }

    fn color_backing_layers(&self) -> (u32, u32, u32) {
        (self.color_layers, self.layer_texels, self.layer_texels)
    }

    fn grow_color_backing(&mut self, additional: u32) -> bool {
        self.color_layers += additional;
        true
    }

    fn grow_index_backing(&mut self, additional: u32) -> bool {
        self.index_layers += additional;
        true
    }

    fn allocate_shadow_map(&mut self, _size: (u32, u32)) -> Option<ShadowMapHandle> {
        let id = self.next_shadow;
        self.next_shadow += 1;
        Some(ShadowMapHandle(id))
    }
}

#[cfg(feature = "wgpu-backend")]
pub mod wgpu_backend {
    //! A concrete `RenderEngine` backed by `wgpu` texture arrays, grounded
    //! on `texture_manager.rs`'s `Arc<wgpu::Device>` + growable
    //! `HashMap<u64, wgpu::Texture>` storage idiom. Demonstrates that the
    //! binding layer is pluggable; it is not exercised by this crate's own
    //! tests (those run without a GPU adapter) since owning a GPU backend
    //! is out of scope for this crate.

    use std::sync::Arc;

    use super::{RenderEngine, ShadowMapHandle, StaticDataHandle, VertexDataHandle};

    /// Texture-array backed `RenderEngine`. `max_layers` mirrors the
    /// backend's own hardware limit, independent of (and typically larger
    /// than) `ImageAtlas::max_color_layers`/`max_index_layers`.
    pub struct WgpuRenderEngine {
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        static_data_buffers: Vec<wgpu::Buffer>,
        vertex_buffers: Vec<wgpu::Buffer>,
        shadow_maps: Vec<wgpu::Texture>,
        color_layers: u32,
        index_layers: u32,
        layer_texels: u32,
        max_layers: u32,
    }

    impl WgpuRenderEngine {
        pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>, layer_texels: u32, max_layers: u32) -> Self {
            WgpuRenderEngine {
                device,
                queue,
                static_data_buffers: Vec::new(),
                vertex_buffers: Vec::new(),
                shadow_maps: Vec::new(),
                color_layers: 0,
                index_layers: 0,
                layer_texels,
                max_layers,
            }
        }
    }

    impl RenderEngine for WgpuRenderEngine {
        fn allocate_static_data(&mut self, blocks: &[[f32; 4]]) -> StaticDataHandle {
            use wgpu::util::DeviceExt;
            let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("astral static data block"),
                contents: bytemuck::cast_slice(blocks),
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            });
            let id = self.static_data_buffers.len() as u64;
            self.static_data_buffers.push(buffer);
            StaticDataHandle(id)
        }

        fn allocate_vertex_data(&mut self, bytes: &[u8]) -> VertexDataHandle {
            use wgpu::util::DeviceExt;
            let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("astral vertex data"),
                contents: bytes,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });
            let id = self.vertex_buffers.len() as u64;
            self.vertex_buffers.push(buffer);
            VertexDataHandle(id)
        }

        fn color_backing_layers(&self) -> (u32, u32, u32) {
            (self.color_layers, self.layer_texels, self.layer_texels)
        }

        fn grow_color_backing(&mut self, additional: u32) -> bool {
            if self.color_layers + additional > self.max_layers {
                tracing::warn!(
                    requested = additional,
                    current = self.color_layers,
                    max = self.max_layers,
                    "wgpu color backing at hardware layer limit"
                );
                return false;
            }
            self.color_layers += additional;
            true
        }

        fn grow_index_backing(&mut self, additional: u32) -> bool {
            if self.index_layers + additional > self.max_layers {
                return false;
            }
            self.index_layers += additional;
            true
        }

        fn allocate_shadow_map(&mut self, size: (u32, u32)) -> Option<ShadowMapHandle> {
            let texture = self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("astral shadow map"),
                size: wgpu::Extent3d {
                    width: size.0,
                    height: size.1,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Depth32Float,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            });
            let id = self.shadow_maps.len() as u64;
            self.shadow_maps.push(texture);
            let _ = &self.queue;
            Some(ShadowMapHandle(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_engine_hands_out_distinct_handles() {
        let mut engine = NullRenderEngine::new(60);
        let a = engine.allocate_static_data(&[[0.0; 4]]);
        let b = engine.allocate_static_data(&[[0.0; 4]]);
        assert_ne!(a, b);
        assert!(engine.grow_color_backing(1));
        assert_eq!(engine.color_backing_layers().0, 1);
    }
}
