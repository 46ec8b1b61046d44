use glam::Vec2;
use std::f32::consts::TAU;

/// A point source of inverse-square pull.
///
/// Positive strength attracts, negative strength repels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attractor {
    pub pos: Vec2,
    pub strength: f32,
}

#[derive(Clone, Debug, Default)]
pub struct AttractorSet {
    pub points: Vec<Attractor>,
}

impl AttractorSet {
    pub fn from_points(points: Vec<Attractor>) -> Self {
        Self { points }
    }

    /// `count` equal attractors spaced evenly on a ring, the first one on the +x axis.
    pub fn ring(center: Vec2, radius: f32, count: usize, strength: f32) -> Self {
        let points = (0..count)
            .map(|i| {
                let angle = i as f32 * TAU / count as f32;
                Attractor {
                    pos: center + Vec2::from_angle(angle) * radius,
                    strength,
                }
            })
            .collect();

        Self { points }
    }

    /// Sums the inverse-square pull of every attractor at `pos`.
    ///
    /// Distances are softened by adding `softening` before squaring, which
    /// keeps the field finite on top of an attractor.
    ///
    /// ### Parameters
    /// - `pos` - Sample position.
    /// - `softening` - Added to every distance.
    /// - `gain` - Overall scale applied to each contribution.
    pub fn pull(&self, pos: Vec2, softening: f32, gain: f32) -> Vec2 {
        self.points.iter().fold(Vec2::ZERO, |acc, a| {
            let d = a.pos - pos;
            let dist = d.length() + softening;
            let force = a.strength / (dist * dist);
            acc + d / dist * force * gain
        })
    }
}
