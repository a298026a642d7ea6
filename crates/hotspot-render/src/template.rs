//! Reusable alpha masks for points and bands.
//!
//! Every point with the same radius (and every band with the same height)
//! shares one precomputed mask, so per-draw work is a blit rather than a
//! gradient evaluation. Masks are built lazily on first request.
//!
//! The key space is small in practice (a handful of radii and band heights),
//! but it comes straight from input data, so each cache holds at most
//! `capacity` masks and evicts the least recently used one beyond that.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use hotspot_core::frame::AlphaMask;
use serde::Serialize;

/// A shared, immutable template mask.
pub type Template = Arc<AlphaMask>;

/// Radial falloff mask of size `2*radius` square, centered.
///
/// With `blur_factor == 1` this is a hard-edged disk. Otherwise alpha is 1
/// out to `radius * blur_factor` and falls linearly to 0 at `radius`.
pub fn point_mask(radius: u32, blur_factor: f32) -> AlphaMask {
    let size = radius * 2;
    let r = radius as f32;
    let inner = r * blur_factor.clamp(0.0, 1.0);
    let hard = blur_factor >= 1.0;

    AlphaMask::from_fn(size, size, |x, y| {
        let dx = x as f32 + 0.5 - r;
        let dy = y as f32 + 0.5 - r;
        let d = (dx * dx + dy * dy).sqrt();
        if hard {
            return if d <= r { 255 } else { 0 };
        }
        if d <= inner {
            255
        } else if d >= r {
            0
        } else {
            (255.0 * (r - d) / (r - inner)).round() as u8
        }
    })
}

/// Vertical band mask: alpha is 1 at the middle row boundary and falls
/// linearly to 0 at the top and bottom edges.
///
/// The two ramps meet at `round(height / 2)`. For odd heights the top ramp
/// is one row longer than the bottom one; that asymmetry is intended.
pub fn band_mask(width: u32, height: u32) -> AlphaMask {
    let mid = height.div_ceil(2);
    let top = mid as f32;
    let bottom = (height - mid) as f32;

    let profile: Vec<u8> = (0..height)
        .map(|y| {
            let yc = y as f32 + 0.5;
            let alpha = if y < mid {
                yc / top
            } else {
                1.0 - (yc - top) / bottom
            };
            (alpha.clamp(0.0, 1.0) * 255.0).round() as u8
        })
        .collect();

    AlphaMask::from_fn(width, height, |_, y| profile[y as usize])
}

/// Counters describing cache behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TemplateStats {
    pub point_templates: usize,
    pub band_templates: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Least-recently-used map keyed by template parameters.
#[derive(Debug)]
struct LruMap<K> {
    entries: HashMap<K, (Template, u64)>,
    capacity: usize,
    tick: u64,
}

impl<K: Hash + Eq + Copy> LruMap<K> {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            tick: 0,
        }
    }

    fn get(&mut self, key: &K) -> Option<Template> {
        self.tick += 1;
        let tick = self.tick;
        self.entries.get_mut(key).map(|(template, last_used)| {
            *last_used = tick;
            template.clone()
        })
    }

    /// Insert and return the evicted key, if any.
    fn insert(&mut self, key: K, template: Template) -> Option<K> {
        self.tick += 1;
        self.entries.insert(key, (template, self.tick));
        if self.entries.len() <= self.capacity {
            return None;
        }
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, (_, last_used))| *last_used)
            .map(|(k, _)| *k)?;
        self.entries.remove(&oldest);
        Some(oldest)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

}

/// Memoizes point masks by (radius, blur factor) and band masks by (width, height).
#[derive(Debug)]
pub struct TemplateCache {
    // The blur factor is keyed by its bit pattern.
    points: LruMap<(u32, u32)>,
    bands: LruMap<(u32, u32)>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl TemplateCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            points: LruMap::new(capacity),
            bands: LruMap::new(capacity),
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Point template for `radius`, built on first use. Radius must be >= 1.
    pub fn point_template(&mut self, radius: u32, blur_factor: f32) -> Template {
        let key = (radius, blur_factor.to_bits());
        if let Some(template) = self.points.get(&key) {
            self.hits += 1;
            return template;
        }
        self.misses += 1;
        let template = Arc::new(point_mask(radius, blur_factor));
        tracing::debug!("cached point template r={} blur={}", radius, blur_factor);
        if let Some((r, _)) = self.points.insert(key, template.clone()) {
            self.evictions += 1;
            tracing::debug!("evicted point template r={}", r);
        }
        template
    }

    /// Band template `width` wide and `height` tall. Height must be >= 1.
    pub fn band_template(&mut self, width: u32, height: u32) -> Template {
        let key = (width, height);
        if let Some(template) = self.bands.get(&key) {
            self.hits += 1;
            return template;
        }
        self.misses += 1;
        let template = Arc::new(band_mask(width, height));
        tracing::debug!("cached band template {}x{}", width, height);
        if let Some((_, h)) = self.bands.insert(key, template.clone()) {
            self.evictions += 1;
            tracing::debug!("evicted band template h={}", h);
        }
        template
    }

    pub fn stats(&self) -> TemplateStats {
        TemplateStats {
            point_templates: self.points.len(),
            band_templates: self.bands.len(),
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
        }
    }
}
