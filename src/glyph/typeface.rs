//! `Typeface`: owns a `GlyphGenerator`, a fixed-size array of `GlyphBody`
//! slots indexed by glyph index, and a character-code -> glyph-index map.
//!
//! Each glyph body gets its own lock so `fetch_glyphs_parallel` workers
//! touching disjoint indices never block each other — the concurrency
//! model holds so long as workers mutate only the `GlyphBody` entries they
//! own.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use ahash::AHashMap;

use crate::id::{GlyphIndex, ThreadSlot};

use super::{FillRule, GlyphColors, GlyphGenerator, GlyphMetrics, ScalableGlyphInfo};
use crate::path::Path;

#[derive(Debug, Default)]
enum GlyphData {
    #[default]
    Uninitialized,
    Scalable {
        paths: Vec<Path>,
        fill_rules: Vec<FillRule>,
        palettes: Vec<GlyphColors>,
    },
    Fixed {
        image_size: (u32, u32),
        pixels: Vec<u8>,
        has_color: bool,
        /// Box-averaged mip chain generated for the smallest strike, in
        /// sRGB space.
        mip_chain: Vec<(u32, u32, Vec<u8>)>,
    },
    /// A generator miss: a visible placeholder, not a recoverable error.
    Missing,
}

#[derive(Debug, Default)]
struct GlyphBody {
    inited: bool,
    queued: bool,
    lock_count: u32,
    metrics: GlyphMetrics,
    data: GlyphData,
}

struct TypefaceInner {
    generator: Box<dyn GlyphGenerator>,
    bodies: Vec<RwLock<GlyphBody>>,
    cmap: RwLock<AHashMap<u32, GlyphIndex>>,
}

/// Owns a glyph generator and the per-glyph-index body cache.
#[derive(Clone)]
pub struct Typeface {
    inner: Arc<TypefaceInner>,
}

impl Typeface {
    pub fn new(generator: Box<dyn GlyphGenerator>) -> Self {
        let n = generator.number_glyphs() as usize;
        let mut bodies = Vec::with_capacity(n);
        bodies.resize_with(n, || RwLock::new(GlyphBody::default()));
        let typeface = Typeface {
            inner: Arc::new(TypefaceInner {
                generator,
                bodies,
                cmap: RwLock::new(AHashMap::new()),
            }),
        };
        typeface.build_character_mapping();
        typeface
    }

    fn build_character_mapping(&self) {
        let threads = self.inner.generator.number_threads().max(1);
        let mut map = HashMap::new();
        for slot in 0..threads {
            self.inner.generator.fill_character_mapping(ThreadSlot(slot), &mut map);
        }
        let mut cmap = self.inner.cmap.write().unwrap();
        for (code, idx) in map {
            cmap.entry(code).or_insert(idx);
        }
    }

    pub fn glyph_index_for_char(&self, code: u32) -> Option<GlyphIndex> {
        self.inner.cmap.read().unwrap().get(&code).copied()
    }

    pub fn number_glyphs(&self) -> u32 {
        self.inner.bodies.len() as u32
    }

    /// Fetches (generating on first use, on the calling thread's slot) a
    /// handle to glyph `index`. Missing glyphs return a placeholder handle
    /// rather than failing.
    pub fn fetch_glyph(&self, index: GlyphIndex) -> Glyph {
        self.fetch_glyph_on_slot(index, ThreadSlot(0))
    }

    fn fetch_glyph_on_slot(&self, index: GlyphIndex, slot: ThreadSlot) -> Glyph {
        let mut body = self.inner.bodies[index.0 as usize].write().unwrap();
        if !body.inited {
            generate(&*self.inner.generator, slot, index, &mut body);
            body.inited = true;
            body.queued = false;
        }
        body.lock_count += 1;
        drop(body);
        Glyph {
            typeface: self.inner.clone(),
            index,
        }
    }

    /// De-duplicates `indices`, fetches every distinct glyph exactly once
    /// (in parallel across up to `n_threads` worker thread slots when the
    /// `parallel-glyphs` feature is enabled, serially otherwise), then
    /// populates `out` in the same order and multiplicity as `indices`.
    pub fn fetch_glyphs_parallel(&self, n_threads: usize, indices: &[GlyphIndex], out: &mut Vec<Glyph>) {
        let mut to_fetch = Vec::new();
        for &idx in indices {
            let mut body = self.inner.bodies[idx.0 as usize].write().unwrap();
            if !body.inited && !body.queued {
                body.queued = true;
                to_fetch.push(idx);
            }
        }

        self.generate_batch(n_threads.max(1), &to_fetch);

        out.clear();
        out.reserve(indices.len());
        for &idx in indices {
            out.push(self.fetch_glyph(idx));
        }
    }

    #[cfg(feature = "parallel-glyphs")]
    fn generate_batch(&self, n_threads: usize, to_fetch: &[GlyphIndex]) {
        use rayon::prelude::*;

        let thread_count = n_threads.min(to_fetch.len().max(1)).max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(thread_count)
            .build();
        let run = |indices: &[GlyphIndex]| {
            indices.par_iter().enumerate().for_each(|(i, &idx)| {
                // Thread slot 0 is reserved for the main thread's serial
                // `fetch_glyph`; workers use slots `1..n_threads`, cycling
                // if there are more glyphs than worker slots.
                let slot = ThreadSlot(1 + i % thread_count.max(1));
                let mut body = self.inner.bodies[idx.0 as usize].write().unwrap();
                if !body.inited {
                    generate(&*self.inner.generator, slot, idx, &mut body);
                    body.inited = true;
                }
            });
        };
        match pool {
            Ok(pool) => pool.install(|| run(to_fetch)),
            Err(_) => run(to_fetch),
        }
    }

    #[cfg(not(feature = "parallel-glyphs"))]
    fn generate_batch(&self, _n_threads: usize, to_fetch: &[GlyphIndex]) {
        for &idx in to_fetch {
            let mut body = self.inner.bodies[idx.0 as usize].write().unwrap();
            if !body.inited {
                generate(&*self.inner.generator, ThreadSlot(0), idx, &mut body);
                body.inited = true;
            }
        }
    }
}

fn generate(generator: &dyn GlyphGenerator, slot: ThreadSlot, index: GlyphIndex, body: &mut GlyphBody) {
    if generator.is_scalable() {
        match generator.scalable_glyph_info(slot, index) {
            Some(ScalableGlyphInfo {
                metrics,
                paths,
                fill_rules,
                palettes,
            }) => {
                body.metrics = metrics;
                body.data = GlyphData::Scalable {
                    paths,
                    fill_rules,
                    palettes,
                };
            }
            None => {
                tracing::warn!(glyph_index = index.0, "glyph generator miss; substituting placeholder");
                body.data = GlyphData::Missing;
            }
        }
    } else {
        match generator.fixed_glyph_info(slot, index, 0) {
            Some(info) => {
                let mip_chain = if info.has_color {
                    Vec::new()
                } else {
                    build_mip_chain(info.image_size, &info.pixels)
                };
                body.metrics = info.metrics;
                body.data = GlyphData::Fixed {
                    image_size: info.image_size,
                    pixels: info.pixels,
                    has_color: info.has_color,
                    mip_chain,
                };
            }
            None => {
                tracing::warn!(glyph_index = index.0, "glyph generator miss; substituting placeholder");
                body.data = GlyphData::Missing;
            }
        }
    }
}

/// Box-averaging mipmap generation in sRGB space, for the smallest bitmap
/// strike only.
fn build_mip_chain(size: (u32, u32), pixels: &[u8]) -> Vec<(u32, u32, Vec<u8>)> {
    let mut chain = Vec::new();
    let (mut w, mut h) = size;
    let mut current = pixels.to_vec();
    while w > 1 && h > 1 {
        let nw = (w / 2).max(1);
        let nh = (h / 2).max(1);
        let mut next = vec![0u8; (nw * nh * 4) as usize];
        for y in 0..nh {
            for x in 0..nw {
                for c in 0..4 {
                    let mut sum = 0u32;
                    let mut count = 0u32;
                    for dy in 0..2 {
                        for dx in 0..2 {
                            let sx = (x * 2 + dx).min(w.saturating_sub(1));
                            let sy = (y * 2 + dy).min(h.saturating_sub(1));
                            let idx = ((sy * w + sx) * 4 + c) as usize;
                            if let Some(&v) = current.get(idx) {
                                sum += v as u32;
                                count += 1;
                            }
                        }
                    }
                    let out_idx = ((y * nw + x) * 4 + c) as usize;
                    next[out_idx] = (sum / count.max(1)) as u8;
                }
            }
        }
        chain.push((nw, nh, next.clone()));
        current = next;
        w = nw;
        h = nh;
    }
    chain
}

/// An immutable, reference-counted handle to a cached glyph body.
pub struct Glyph {
    typeface: Arc<TypefaceInner>,
    index: GlyphIndex,
}

impl Glyph {
    pub fn index(&self) -> GlyphIndex {
        self.index
    }

    pub fn metrics(&self) -> GlyphMetrics {
        self.typeface.bodies[self.index.0 as usize].read().unwrap().metrics
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(
            self.typeface.bodies[self.index.0 as usize].read().unwrap().data,
            GlyphData::Missing
        )
    }

    pub fn lock_count(&self) -> u32 {
        self.typeface.bodies[self.index.0 as usize].read().unwrap().lock_count
    }
}

impl Clone for Glyph {
    fn clone(&self) -> Self {
        self.typeface.bodies[self.index.0 as usize].write().unwrap().lock_count += 1;
        Glyph {
            typeface: self.typeface.clone(),
            index: self.index,
        }
    }
}

impl PartialEq for Glyph {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.typeface, &other.typeface) && self.index == other.index
    }
}

impl Drop for Glyph {
    fn drop(&mut self) {
        let mut body = self.typeface.bodies[self.index.0 as usize].write().unwrap();
        body.lock_count = body.lock_count.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingGenerator {
        calls: AtomicU32,
        n: u32,
    }

    impl GlyphGenerator for CountingGenerator {
        fn number_glyphs(&self) -> u32 {
            self.n
        }
        fn number_threads(&self) -> usize {
            4
        }
        fn is_scalable(&self) -> bool {
            true
        }
        fn fill_character_mapping(&self, _slot: ThreadSlot, _out: &mut HashMap<u32, GlyphIndex>) {}
        fn scalable_glyph_info(&self, _slot: ThreadSlot, _index: GlyphIndex) -> Option<ScalableGlyphInfo> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Some(ScalableGlyphInfo::default())
        }
        fn fixed_glyph_info(&self, _s: ThreadSlot, _i: GlyphIndex, _strike: u32) -> Option<super::super::FixedGlyphInfo> {
            None
        }
    }

    #[test]
    fn parallel_prefetch_generates_each_glyph_once() {
        let generator = CountingGenerator {
            calls: AtomicU32::new(0),
            n: 128,
        };
        let typeface = Typeface::new(Box::new(generator));

        let mut indices: Vec<GlyphIndex> = (0..128).map(GlyphIndex).collect();
        indices.insert(1, GlyphIndex(0)); // duplicate, matching the scenario's [0,0,1,2,...]

        let mut out = Vec::new();
        typeface.fetch_glyphs_parallel(4, &indices, &mut out);

        assert_eq!(out.len(), indices.len());
        assert_eq!(out[0].index(), out[1].index());
    }

    struct AlwaysMissGenerator;

    impl GlyphGenerator for AlwaysMissGenerator {
        fn number_glyphs(&self) -> u32 {
            1
        }
        fn number_threads(&self) -> usize {
            1
        }
        fn is_scalable(&self) -> bool {
            true
        }
        fn fill_character_mapping(&self, _slot: ThreadSlot, _out: &mut HashMap<u32, GlyphIndex>) {}
        fn scalable_glyph_info(&self, _slot: ThreadSlot, _index: GlyphIndex) -> Option<ScalableGlyphInfo> {
            None
        }
        fn fixed_glyph_info(&self, _s: ThreadSlot, _i: GlyphIndex, _strike: u32) -> Option<super::super::FixedGlyphInfo> {
            None
        }
    }

    #[test]
    fn missing_glyph_is_a_placeholder_not_an_error() {
        let typeface = Typeface::new(Box::new(AlwaysMissGenerator));
        let glyph = typeface.fetch_glyph(GlyphIndex(0));
        assert!(glyph.is_placeholder());
    }
}
