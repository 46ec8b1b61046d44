//! Turns the per-frame raster into the displayed image.
//!
//! The displayed frame persists between frames. Each composite:
//!
//! 1. [`Compositor::fade`] lays a translucent black fill over the previous
//!    frame, so old content decays instead of vanishing.
//! 2. [`Compositor::glow_pass`] box-blurs the raster, brightens it and draws
//!    it with ordinary source-over blending.
//! 3. [`Compositor::additive_pass`] draws the raster again, saturated, with
//!    additive blending: energy only ever accumulates in this pass.
//!
//! The displayed frame is kept as linear `f32` RGB over an opaque black
//! background so that slow fades do not stall on 8-bit rounding.

use glam::UVec2;

use crate::{config::Config, raster::RasterBuffer};

/// Filter parameters of the three compositing steps.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositeSettings {
    pub background_fade: f32,
    pub blur_radius: usize,
    pub blur_brightness: f32,
    pub additive_saturation: f32,
}

impl From<&Config> for CompositeSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            background_fade: cfg.background_fade,
            blur_radius: cfg.blur_radius,
            blur_brightness: cfg.blur_brightness,
            additive_saturation: cfg.additive_saturation,
        }
    }
}

impl Default for CompositeSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

#[derive(Clone, Debug, Default)]
pub struct Compositor {
    settings: CompositeSettings,
    size: UVec2,
    /// Displayed frame, RGB in `[0, 255]`.
    frame: Vec<[f32; 3]>,
    /// Premultiplied RGBA scratch space for the blur.
    glow: Vec<[f32; 4]>,
    glow_tmp: Vec<[f32; 4]>,
}

impl Compositor {
    /// Creates a black frame of the given size.
    pub fn new(size: UVec2, settings: CompositeSettings) -> Self {
        let mut c = Self {
            settings,
            ..Self::default()
        };
        c.resize(size);
        c
    }

    pub fn settings(&self) -> &CompositeSettings {
        &self.settings
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    /// Reallocates every buffer for a new size; the frame restarts black.
    pub fn resize(&mut self, size: UVec2) {
        let n = size.x as usize * size.y as usize;
        self.size = size;
        self.frame = vec![[0.0; 3]; n];
        self.glow = vec![[0.0; 4]; n];
        self.glow_tmp = vec![[0.0; 4]; n];
    }

    /// Drops every buffer; the compositor becomes `0 x 0`.
    pub fn release(&mut self) {
        self.size = UVec2::ZERO;
        self.frame = Vec::new();
        self.glow = Vec::new();
        self.glow_tmp = Vec::new();
    }

    /// Runs all three steps for one frame.
    ///
    /// ### Panics
    /// Panics if `raster` and the compositor disagree on size; the
    /// simulation resizes both together at frame boundaries.
    pub fn composite(&mut self, raster: &RasterBuffer) {
        assert_eq!(raster.size(), self.size, "raster and frame sizes differ");
        self.fade(self.settings.background_fade);
        self.glow_pass(raster, self.settings.blur_radius, self.settings.blur_brightness);
        self.additive_pass(raster, self.settings.additive_saturation);
    }

    /// Source-over fill with black at the given alpha.
    pub fn fade(&mut self, alpha: f32) {
        let keep = 1.0 - alpha.clamp(0.0, 1.0);
        for px in &mut self.frame {
            for c in px.iter_mut() {
                *c *= keep;
            }
        }
    }

    /// Blurred, brightened copy of `raster`, source-over onto the frame.
    pub fn glow_pass(&mut self, raster: &RasterBuffer, radius: usize, brightness: f32) {
        for (dst, src) in self.glow.iter_mut().zip(raster.pixels().chunks_exact(4)) {
            let a = src[3] as f32 / 255.0;
            *dst = [src[0] as f32 * a, src[1] as f32 * a, src[2] as f32 * a, a];
        }

        let w = self.size.x as usize;
        let h = self.size.y as usize;
        box_blur_rows(&self.glow, &mut self.glow_tmp, w, h, radius);
        box_blur_cols(&self.glow_tmp, &mut self.glow, w, h, radius);

        for (dst, src) in self.frame.iter_mut().zip(&self.glow) {
            let a = src[3].clamp(0.0, 1.0);
            if a <= 0.0 {
                continue;
            }
            for c in 0..3 {
                let lit = (src[c] * brightness).min(255.0);
                dst[c] = lit + dst[c] * (1.0 - a);
            }
        }
    }

    /// Saturated copy of `raster`, added onto the frame and clamped at 255.
    pub fn additive_pass(&mut self, raster: &RasterBuffer, saturation: f32) {
        for (dst, src) in self.frame.iter_mut().zip(raster.pixels().chunks_exact(4)) {
            if src[3] == 0 {
                continue;
            }
            let a = src[3] as f32 / 255.0;
            let rgb = saturate(
                [src[0] as f32, src[1] as f32, src[2] as f32],
                saturation,
            );
            for c in 0..3 {
                dst[c] = (dst[c] + rgb[c] * a).min(255.0);
            }
        }
    }

    /// Displayed RGB of one pixel.
    pub fn pixel(&self, x: usize, y: usize) -> [f32; 3] {
        self.frame[x + y * self.size.x as usize]
    }

    /// Relative luminance of one displayed pixel.
    pub fn luminance(&self, x: usize, y: usize) -> f32 {
        let [r, g, b] = self.pixel(x, y);
        0.2126 * r + 0.7152 * g + 0.0722 * b
    }

    /// Writes the displayed frame as opaque RGBA8 into `out`.
    pub fn write_rgba8(&self, out: &mut Vec<u8>) {
        out.clear();
        out.reserve(self.frame.len() * 4);
        for px in &self.frame {
            out.extend(px.iter().map(|c| c.round().clamp(0.0, 255.0) as u8));
            out.push(255);
        }
    }
}

/// Saturation matrix (the `saturate()` filter of CSS), clamped to `[0, 255]`.
pub fn saturate(rgb: [f32; 3], s: f32) -> [f32; 3] {
    let [r, g, b] = rgb;
    [
        (0.213 + 0.787 * s) * r + (0.715 - 0.715 * s) * g + (0.072 - 0.072 * s) * b,
        (0.213 - 0.213 * s) * r + (0.715 + 0.285 * s) * g + (0.072 - 0.072 * s) * b,
        (0.213 - 0.213 * s) * r + (0.715 - 0.715 * s) * g + (0.072 + 0.928 * s) * b,
    ]
    .map(|c| c.clamp(0.0, 255.0))
}

/// Horizontal box blur with a running sum; pixels past the edge count as transparent.
fn box_blur_rows(src: &[[f32; 4]], dst: &mut [[f32; 4]], w: usize, h: usize, r: usize) {
    let norm = 1.0 / (2 * r + 1) as f32;
    for y in 0..h {
        let row = &src[y * w..(y + 1) * w];
        let out = &mut dst[y * w..(y + 1) * w];
        let mut sum = [0.0f32; 4];
        for px in row.iter().take(r.min(w)) {
            add(&mut sum, px);
        }
        for x in 0..w {
            if x + r < w {
                add(&mut sum, &row[x + r]);
            }
            out[x] = sum.map(|v| v * norm);
            if x >= r {
                sub(&mut sum, &row[x - r]);
            }
        }
    }
}

fn box_blur_cols(src: &[[f32; 4]], dst: &mut [[f32; 4]], w: usize, h: usize, r: usize) {
    let norm = 1.0 / (2 * r + 1) as f32;
    for x in 0..w {
        let mut sum = [0.0f32; 4];
        for y in 0..r.min(h) {
            add(&mut sum, &src[x + y * w]);
        }
        for y in 0..h {
            if y + r < h {
                add(&mut sum, &src[x + (y + r) * w]);
            }
            dst[x + y * w] = sum.map(|v| v * norm);
            if y >= r {
                sub(&mut sum, &src[x + (y - r) * w]);
            }
        }
    }
}

#[inline]
fn add(sum: &mut [f32; 4], px: &[f32; 4]) {
    for c in 0..4 {
        sum[c] += px[c];
    }
}

#[inline]
fn sub(sum: &mut [f32; 4], px: &[f32; 4]) {
    for c in 0..4 {
        sum[c] = (sum[c] - px[c]).max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn random_raster(seed: u64, size: UVec2, count: usize) -> RasterBuffer {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut raster = RasterBuffer::with_size(size);
        for _ in 0..count {
            let x = rng.random_range(0..size.x as i64);
            let y = rng.random_range(0..size.y as i64);
            raster.put(x, y, [rng.random(), rng.random(), rng.random(), rng.random()]);
        }
        raster
    }

    #[test]
    fn additive_pass_never_darkens() {
        let size = UVec2::new(32, 24);
        for seed in 0..8 {
            let raster = random_raster(seed, size, 200);

            let mut once = Compositor::new(size, CompositeSettings::default());
            once.additive_pass(&raster, 2.0);

            let mut twice = once.clone();
            twice.additive_pass(&raster, 2.0);

            for y in 0..24 {
                for x in 0..32 {
                    let (a, b) = (once.pixel(x, y), twice.pixel(x, y));
                    for c in 0..3 {
                        assert!(b[c] >= a[c], "pixel ({x}, {y}) darkened");
                        assert!(b[c] <= 255.0);
                    }
                    assert!(twice.luminance(x, y) >= once.luminance(x, y));
                }
            }
        }
    }

    #[test]
    fn fade_decays_gradually() {
        let size = UVec2::new(4, 4);
        let mut raster = RasterBuffer::with_size(size);
        raster.put(1, 1, [200, 100, 50, 255]);

        let mut c = Compositor::new(size, CompositeSettings::default());
        c.composite(&raster);
        let lit = c.luminance(1, 1);
        assert!(lit > 0.0);

        raster.clear();
        c.composite(&raster);
        let faded = c.luminance(1, 1);
        assert!(faded < lit);
        assert!((faded - lit * 0.9).abs() < 1e-3);

        for _ in 0..200 {
            c.composite(&raster);
        }
        assert!(c.luminance(1, 1) < 1e-3);
    }

    #[test]
    fn glow_spreads_to_neighbours() {
        let size = UVec2::new(16, 16);
        let mut raster = RasterBuffer::with_size(size);
        raster.put(8, 8, [255, 255, 255, 255]);

        let mut c = Compositor::new(size, CompositeSettings::default());
        c.glow_pass(&raster, 4, 1.5);

        assert!(c.luminance(8, 8) > 0.0);
        assert!(c.luminance(11, 8) > 0.0);
        assert!(c.luminance(8, 12) > 0.0);
        assert_eq!(c.luminance(13, 8), 0.0);
        assert_eq!(c.luminance(0, 0), 0.0);
    }

    #[test]
    fn box_blur_preserves_total_energy_away_from_edges() {
        let (w, h, r) = (9, 9, 2);
        let mut src = vec![[0.0f32; 4]; w * h];
        src[4 + 4 * w] = [25.0, 0.0, 0.0, 1.0];
        let mut tmp = vec![[0.0f32; 4]; w * h];
        let mut out = vec![[0.0f32; 4]; w * h];

        box_blur_rows(&src, &mut tmp, w, h, r);
        box_blur_cols(&tmp, &mut out, w, h, r);

        let total: f32 = out.iter().map(|p| p[0]).sum();
        assert!((total - 25.0).abs() < 1e-3);
        assert!((out[4 + 4 * w][0] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn saturate_identity_and_grey() {
        let c = [120.0, 60.0, 30.0];
        let same = saturate(c, 1.0);
        for i in 0..3 {
            assert!((same[i] - c[i]).abs() < 1e-3);
        }
        let grey = saturate([80.0, 80.0, 80.0], 2.0);
        for v in grey {
            assert!((v - 80.0).abs() < 1e-3);
        }
    }

    #[test]
    fn rgba8_output_is_opaque() {
        let size = UVec2::new(3, 2);
        let mut raster = RasterBuffer::with_size(size);
        raster.put(0, 0, [255, 0, 0, 255]);
        let mut c = Compositor::new(size, CompositeSettings::default());
        c.composite(&raster);

        let mut out = Vec::new();
        c.write_rgba8(&mut out);
        assert_eq!(out.len(), 3 * 2 * 4);
        assert!(out.chunks_exact(4).all(|px| px[3] == 255));
        assert!(out[0] > 0);
    }
}
