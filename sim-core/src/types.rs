use glam::{UVec2, Vec2};

/// Slot index of a particle in a [`crate::store::ParticleStore`].
///
/// Slots are reused on every recycle, so an id only names "whatever
/// particle currently lives in this slot".
pub type ParticleId = usize;

/// Returns the canvas center for a size in device pixels.
#[inline]
pub fn canvas_center(size: UVec2) -> Vec2 {
    size.as_vec2() * 0.5
}

/// Returns `true` if `pos` lies outside `[0, width) x [0, height)`.
#[inline]
pub fn out_of_bounds(pos: Vec2, size: UVec2) -> bool {
    pos.x < 0.0 || pos.y < 0.0 || pos.x >= size.x as f32 || pos.y >= size.y as f32
}
