use glam::{UVec2, Vec2};

/// Per-frame RGBA8 target that particles are rasterized into.
///
/// Pixels are stored row-major, four bytes per pixel, non-premultiplied.
/// The buffer is cleared to transparent at the start of every frame and
/// each particle writes exactly one pixel; a later write to the same pixel
/// replaces the earlier one. Blending only happens in
/// [`crate::compositor::Compositor`].
#[derive(Clone, Debug, Default)]
pub struct RasterBuffer {
    pixels: Vec<u8>,
    size: UVec2,
}

impl RasterBuffer {
    /// Creates a transparent buffer of the given size.
    ///
    /// ### Parameters
    /// - `size` - Width and height in pixels.
    ///
    /// ### Returns
    /// A new [`RasterBuffer`] with `size.x * size.y` zeroed pixels.
    pub fn with_size(size: UVec2) -> Self {
        Self {
            pixels: vec![0; pixel_count(size) * 4],
            size,
        }
    }

    /// Ensures the buffer has exactly the given size.
    ///
    /// The backing storage is reallocated if the size differs. After this
    /// call every pixel is transparent, even if the size was already
    /// correct.
    pub fn ensure_size(&mut self, size: UVec2) {
        if self.size != size {
            self.pixels.resize(pixel_count(size) * 4, 0);
            self.size = size;
        }
        self.clear();
    }

    /// Sets every byte to zero, keeping the size.
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Drops the backing storage; the buffer becomes `0 x 0`.
    pub fn release(&mut self) {
        self.pixels = Vec::new();
        self.size = UVec2::ZERO;
    }

    #[inline]
    pub fn size(&self) -> UVec2 {
        self.size
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.size.x as usize
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.size.y as usize
    }

    /// Writes one pixel. Coordinates outside the buffer are ignored.
    ///
    /// ### Returns
    /// `true` if the pixel was inside the buffer and written.
    #[inline]
    pub fn put(&mut self, x: i64, y: i64, rgba: [u8; 4]) -> bool {
        if x < 0 || y < 0 || x >= self.size.x as i64 || y >= self.size.y as i64 {
            return false;
        }
        let i = 4 * (x as usize + y as usize * self.width());
        self.pixels[i..i + 4].copy_from_slice(&rgba);
        true
    }

    /// Writes the pixel containing `pos` (coordinates are floored).
    #[inline]
    pub fn plot(&mut self, pos: Vec2, rgba: [u8; 4]) -> bool {
        self.put(pos.x.floor() as i64, pos.y.floor() as i64, rgba)
    }

    /// Reads one pixel. Panics if the coordinate is outside the buffer.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> [u8; 4] {
        let i = 4 * (x + y * self.width());
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// Raw RGBA bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns an iterator over `(x, y)` of every non-transparent pixel.
    pub fn lit_pixels(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let width = self.width().max(1);
        self.pixels
            .chunks_exact(4)
            .enumerate()
            .filter(|(_, px)| px[3] > 0)
            .map(move |(i, _)| (i % width, i / width))
    }
}

#[inline]
fn pixel_count(size: UVec2) -> usize {
    size.x as usize * size.y as usize
}
