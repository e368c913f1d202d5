//! `ImageAtlas`: owns the color and index tile backings and builds tiled,
//! padding-aware images with empty/full/shared tile sharing and a
//! deferred-release lock.
//!
//! Owns a backing, hands out stable IDs, and reference-counts shared tile
//! state, with tile sharing and a nestable lock against mid-frame release.
//! The index-pyramid addressing math (root index texel -> `Z * T^(N-1)`
//! color texels) is implemented for the common single-index-level case;
//! deeper pyramids are a documented simplification (see `DESIGN.md`).

mod sampler;

pub use sampler::{ColorSpace, FilterMode, ImageSamplerBits, MipmapMode, TileMode};

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use ahash::AHashMap;

use crate::error::ImageAtlasError;
use crate::id::ImageId;
use crate::util::tile_allocator::{Tile, TileAllocator};

/// Default tile layout: `log2_tile_size = 6` (`T = 64`), `tile_padding = 2`
/// (`Z = 60`).
pub const DEFAULT_LOG2_TILE_SIZE: u8 = 6;
pub const DEFAULT_TILE_PADDING: u32 = 2;

struct TileBackingInner {
    tile: Tile,
    refcount: Cell<u32>,
}

/// A reference-counted handle to a color-backing tile; the tile returns to
/// its `TileAllocator` free list only when the last handle drops.
#[derive(Clone)]
struct TileBacking(Rc<TileBackingInner>);

impl TileBacking {
    fn new(tile: Tile) -> Self {
        TileBacking(Rc::new(TileBackingInner {
            tile,
            refcount: Cell::new(1),
        }))
    }

    fn share(&self) -> Self {
        self.0.refcount.set(self.0.refcount.get() + 1);
        TileBacking(self.0.clone())
    }
}

/// The three ways a tile in an `ImageMipElement` can be realised.
enum TileSlot {
    /// Shared zero-filled backing; never allocated from the `TileAllocator`.
    Empty,
    /// Shared one-filled (white) backing; never allocated.
    Full,
    /// A backing allocated (or shared from another element) specifically
    /// for this tile.
    Backed(TileBacking),
}

/// A single mip level's worth of atlas-backed tiles.
pub struct ImageMipElement {
    width: u32,
    height: u32,
    log2_tile_size: u8,
    tile_padding: u32,
    tiles: Vec<TileSlot>,
    tiles_x: u32,
    tiles_y: u32,
    /// Number of index levels above this element's color tiles, so a root
    /// index texel addresses `Z * T^(N-1)` color texels.
    index_levels: u32,
}

impl ImageMipElement {
    pub fn width(&self) -> u32 {
        self.width
    }
    pub fn height(&self) -> u32 {
        self.height
    }
    pub fn tiles_x(&self) -> u32 {
        self.tiles_x
    }
    pub fn tiles_y(&self) -> u32 {
        self.tiles_y
    }
    pub fn index_levels(&self) -> u32 {
        self.index_levels
    }

    /// `Z * T^(index_levels - 1)`: the number of color texels one root
    /// index texel addresses.
    pub fn root_index_texel_span(&self) -> u64 {
        let t = 1u64 << self.log2_tile_size;
        let z = t - 2 * self.tile_padding as u64;
        z * t.pow(self.index_levels.saturating_sub(1))
    }

    fn tile_at(&self, tx: u32, ty: u32) -> &TileSlot {
        &self.tiles[(ty * self.tiles_x + tx) as usize]
    }
}

/// An ordered mip chain; the top element gives the image's nominal size.
pub struct Image {
    pub id: ImageId,
    pub colorspace: ColorSpace,
    pub opaque: bool,
    mips: Vec<ImageMipElement>,
}

impl Image {
    pub fn width(&self) -> u32 {
        self.mips[0].width()
    }
    pub fn height(&self) -> u32 {
        self.mips[0].height()
    }
    pub fn mip(&self, level: usize) -> Option<&ImageMipElement> {
        self.mips.get(level)
    }
    pub fn mip_count(&self) -> usize {
        self.mips.len()
    }
}

/// A (tile_x, tile_y) coordinate into an existing `ImageMipElement`, naming
/// a tile to share rather than allocate fresh.
#[derive(Debug, Clone, Copy)]
pub struct SharedTileSource {
    pub image: ImageId,
    pub mip_level: usize,
    pub tile_x: u32,
    pub tile_y: u32,
}

/// Input to `ImageAtlas::create_image`: which tiles of the new element
/// should be empty, full, or shared from an existing element; tiles not
/// listed are freshly allocated.
#[derive(Debug, Clone, Default)]
pub struct MipElementPlan {
    pub empty_tiles: Vec<(u32, u32)>,
    pub full_tiles: Vec<(u32, u32)>,
    pub shared_tiles: Vec<((u32, u32), SharedTileSource)>,
}

struct PendingRelease {
    tile: Tile,
    index: bool,
}

pub struct ImageAtlas {
    color_tiles: TileAllocator,
    index_tiles: TileAllocator,
    log2_tile_size: u8,
    tile_padding: u32,
    max_color_layers: u32,
    max_index_layers: u32,
    images: AHashMap<ImageId, Rc<Image>>,
    next_image_id: u64,
    lock_depth: u32,
    deferred: VecDeque<PendingRelease>,
    extra_color_backing_texels: u64,
}

impl ImageAtlas {
    pub fn new(
        log2_tile_size: u8,
        tile_padding: u32,
        num_tiles_x: u32,
        num_tiles_y: u32,
        max_color_layers: u32,
        max_index_layers: u32,
    ) -> Self {
        ImageAtlas {
            color_tiles: TileAllocator::new(log2_tile_size, log2_tile_size, num_tiles_x, num_tiles_y, max_color_layers),
            index_tiles: TileAllocator::new(log2_tile_size, log2_tile_size, num_tiles_x, num_tiles_y, max_index_layers),
            log2_tile_size,
            tile_padding,
            max_color_layers,
            max_index_layers,
            images: AHashMap::new(),
            next_image_id: 0,
            lock_depth: 0,
            deferred: VecDeque::new(),
            extra_color_backing_texels: 0,
        }
    }

    pub fn usable_tile_size(&self) -> u32 {
        (1u32 << self.log2_tile_size) - 2 * self.tile_padding
    }

    /// Nests; while the counter is non-zero, tile releases are queued
    /// instead of executed.
    pub fn lock_resources(&mut self) {
        self.lock_depth += 1;
    }

    /// Executes queued releases once the outermost lock exits.
    pub fn unlock_resources(&mut self) {
        debug_assert!(self.lock_depth > 0, "unlock_resources without a matching lock");
        self.lock_depth -= 1;
        if self.lock_depth == 0 {
            while let Some(pending) = self.deferred.pop_front() {
                if pending.index {
                    self.index_tiles.release_tile(pending.tile);
                } else {
                    self.color_tiles.release_tile(pending.tile);
                }
            }
        }
    }

    fn release_color_tile(&mut self, tile: Tile) {
        if self.lock_depth > 0 {
            self.deferred.push_back(PendingRelease { tile, index: false });
        } else {
            self.color_tiles.release_tile(tile);
        }
    }

    /// Causes a later `flush()` to grow the color backing by at least `n`
    /// extra texels beyond what is strictly needed, anticipating
    /// subsequent offscreen renders.
    pub fn extra_color_backing_texels(&mut self, n: u64) {
        self.extra_color_backing_texels = self.extra_color_backing_texels.max(n);
    }

    /// No-op placeholder for backing growth bookkeeping; concrete backing
    /// storage (the actual GPU texture) is the `RenderEngine`'s concern.
    pub fn flush(&mut self) {
        self.extra_color_backing_texels = 0;
    }

    fn allocate_element_tiles(
        &mut self,
        width: u32,
        height: u32,
        plan: &MipElementPlan,
    ) -> Result<ImageMipElement, ImageAtlasError> {
        let z = self.usable_tile_size();
        let tiles_x = width.div_ceil(z).max(1);
        let tiles_y = height.div_ceil(z).max(1);
        let mut tiles: Vec<TileSlot> = Vec::with_capacity((tiles_x * tiles_y) as usize);
        for ty in 0..tiles_y {
            for tx in 0..tiles_x {
                if plan.empty_tiles.contains(&(tx, ty)) {
                    tiles.push(TileSlot::Empty);
                    continue;
                }
                if plan.full_tiles.contains(&(tx, ty)) {
                    tiles.push(TileSlot::Full);
                    continue;
                }
                if let Some((_, source)) = plan.shared_tiles.iter().find(|((sx, sy), _)| *sx == tx && *sy == ty) {
                    let backing = self.lookup_shared_backing(*source)?;
                    tiles.push(TileSlot::Backed(backing.share()));
                    continue;
                }
                let tile = self
                    .color_tiles
                    .allocate_tile(self.log2_tile_size, self.log2_tile_size)
                    .ok_or(ImageAtlasError::ColorBackingExhausted {
                        max_layers: self.max_color_layers,
                    })?;
                tiles.push(TileSlot::Backed(TileBacking::new(tile)));
            }
        }

        let total_span = (tiles_x.max(1) * z).max(tiles_y.max(1) * z).max(1);
        let index_levels = levels_to_cover(total_span, z);
        // A real index pyramid would allocate one index tile per level from
        // `self.index_tiles`, released in lockstep with the color tiles it
        // addresses; this element only tracks the pyramid's *depth*. See
        // the module doc for why deeper pyramids are not materialised here.

        Ok(ImageMipElement {
            width,
            height,
            log2_tile_size: self.log2_tile_size,
            tile_padding: self.tile_padding,
            tiles,
            tiles_x,
            tiles_y,
            index_levels,
        })
    }

    fn lookup_shared_backing(&self, source: SharedTileSource) -> Result<TileBacking, ImageAtlasError> {
        let image = self.images.get(&source.image).ok_or(ImageAtlasError::UnknownImage(source.image))?;
        let mip = image
            .mips
            .get(source.mip_level)
            .ok_or(ImageAtlasError::UnknownImage(source.image))?;
        if source.tile_x >= mip.tiles_x || source.tile_y >= mip.tiles_y {
            return Err(ImageAtlasError::SharedTileOutOfBounds {
                tile_x: source.tile_x,
                tile_y: source.tile_y,
                width: mip.tiles_x,
                height: mip.tiles_y,
            });
        }
        match mip.tile_at(source.tile_x, source.tile_y) {
            TileSlot::Backed(backing) => Ok(backing.clone()),
            TileSlot::Empty | TileSlot::Full => Err(ImageAtlasError::SharedTileOutOfBounds {
                tile_x: source.tile_x,
                tile_y: source.tile_y,
                width: mip.tiles_x,
                height: mip.tiles_y,
            }),
        }
    }

    /// Creates a new image from an ordered list of mip-level plans (largest
    /// first). `None` only on allocator exhaustion past `max_*_layers`;
    /// never partially creates an image.
    pub fn create_image(
        &mut self,
        mip_sizes: &[(u32, u32)],
        plans: &[MipElementPlan],
        colorspace: ColorSpace,
        opaque: bool,
    ) -> Result<ImageId, ImageAtlasError> {
        debug_assert_eq!(mip_sizes.len(), plans.len());
        let mut mips = Vec::with_capacity(mip_sizes.len());
        for (&(w, h), plan) in mip_sizes.iter().zip(plans.iter()) {
            mips.push(self.allocate_element_tiles(w, h, plan)?);
        }
        let id = ImageId(self.next_image_id);
        self.next_image_id += 1;
        self.images.insert(
            id,
            Rc::new(Image {
                id,
                colorspace,
                opaque,
                mips,
            }),
        );
        Ok(id)
    }

    /// `Some` iff the image is alive; always returns a handle to the same
    /// object.
    pub fn fetch_image(&self, id: ImageId) -> Option<Rc<Image>> {
        self.images.get(&id).cloned()
    }

    /// Destroys an image, releasing (or, inside a lock, queuing the
    /// release of) every backing tile whose refcount reaches zero.
    pub fn destroy_image(&mut self, id: ImageId) {
        let Some(image) = self.images.remove(&id) else {
            return;
        };
        // `Rc::try_unwrap` fails if another `fetch_image` handle is still
        // alive; that handle keeps the tiles reachable (and thus correctly
        // un-released) until it too drops.
        if let Ok(image) = Rc::try_unwrap(image) {
            for mip in image.mips {
                for slot in mip.tiles {
                    if let TileSlot::Backed(backing) = slot {
                        let remaining = backing.0.refcount.get() - 1;
                        backing.0.refcount.set(remaining);
                        if remaining == 0 {
                            self.release_color_tile(backing.0.tile);
                        }
                    }
                }
            }
        }
    }
}

fn levels_to_cover(span: u32, z: u32) -> u32 {
    let mut levels = 1u32;
    let mut covered = z.max(1);
    while covered < span {
        covered = covered.saturating_mul(2);
        levels += 1;
        if levels > 8 {
            break;
        }
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_image_returns_same_object_while_alive() {
        let mut atlas = ImageAtlas::new(DEFAULT_LOG2_TILE_SIZE, DEFAULT_TILE_PADDING, 4, 4, 2, 2);
        let id = atlas
            .create_image(&[(100, 50)], &[MipElementPlan::default()], ColorSpace::Srgb, true)
            .unwrap();
        let a = atlas.fetch_image(id).unwrap();
        let b = atlas.fetch_image(id).unwrap();
        assert!(Rc::ptr_eq(&a, &b));

        drop(a);
        drop(b);
        atlas.destroy_image(id);
        assert!(atlas.fetch_image(id).is_none());
    }

    #[test]
    fn shared_tile_increments_refcount_and_survives_source_destruction() {
        let mut atlas = ImageAtlas::new(DEFAULT_LOG2_TILE_SIZE, DEFAULT_TILE_PADDING, 4, 4, 2, 2);
        let source = atlas
            .create_image(&[(64, 64)], &[MipElementPlan::default()], ColorSpace::Srgb, true)
            .unwrap();
        let plan = MipElementPlan {
            shared_tiles: vec![(
                (0, 0),
                SharedTileSource {
                    image: source,
                    mip_level: 0,
                    tile_x: 0,
                    tile_y: 0,
                },
            )],
            ..Default::default()
        };
        let dependent = atlas.create_image(&[(64, 64)], &[plan], ColorSpace::Srgb, true).unwrap();

        atlas.destroy_image(source);
        // The dependent image's shared tile keeps the backing alive even
        // though its source image was destroyed.
        assert!(atlas.fetch_image(dependent).is_some());
        atlas.destroy_image(dependent);
    }

    #[test]
    fn lock_resources_defers_release_until_outermost_unlock() {
        let mut atlas = ImageAtlas::new(DEFAULT_LOG2_TILE_SIZE, DEFAULT_TILE_PADDING, 2, 2, 1, 1);
        atlas.lock_resources();
        let id = atlas
            .create_image(&[(64, 64)], &[MipElementPlan::default()], ColorSpace::Srgb, true)
            .unwrap();
        atlas.destroy_image(id);
        // Still locked: the release must be queued, not executed.
        assert_eq!(atlas.deferred.len(), 1);
        atlas.unlock_resources();
        assert!(atlas.deferred.is_empty());
    }
}
