//! Time-varying vector fields and the timer that cycles through them.
//!
//! Eight motion regimes share one signature: given a position, the frame
//! tick, and the canvas size, return a small 2D bias that the lifecycle
//! blends into each particle's velocity. A [`ModeScheduler`] advances the
//! active regime on a fixed wall-clock interval, and [`FieldEngine`] owns
//! the per-regime state (attractor sets) so that it exists only while its
//! regime is active.

use std::f32::consts::TAU;

use glam::{UVec2, Vec2};

use crate::{
    attractor::{Attractor, AttractorSet},
    noise::SimplexNoise,
    types::canvas_center,
};

pub const MODE_COUNT: usize = 8;

/// The eight motion regimes, in cycling order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldMode {
    CurlNoise,
    GravityWells,
    StrangeAttractor,
    Vortex,
    Flocking,
    Dipole,
    ReactionDiffusion,
    Rose,
}

impl FieldMode {
    pub const ALL: [FieldMode; MODE_COUNT] = [
        FieldMode::CurlNoise,
        FieldMode::GravityWells,
        FieldMode::StrangeAttractor,
        FieldMode::Vortex,
        FieldMode::Flocking,
        FieldMode::Dipole,
        FieldMode::ReactionDiffusion,
        FieldMode::Rose,
    ];

    /// Maps any integer onto a mode (`index mod 8`).
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % MODE_COUNT]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldMode::CurlNoise => "curl noise",
            FieldMode::GravityWells => "gravity wells",
            FieldMode::StrangeAttractor => "strange attractor",
            FieldMode::Vortex => "vortex",
            FieldMode::Flocking => "flocking",
            FieldMode::Dipole => "dipole",
            FieldMode::ReactionDiffusion => "reaction-diffusion",
            FieldMode::Rose => "rose",
        }
    }
}

const WELL_COUNT: usize = 3;
const WELL_RING_RADIUS: f32 = 200.0;
const WELL_STRENGTH: f32 = 5000.0;
const DIPOLE_OFFSET: f32 = 150.0;
const DIPOLE_STRENGTH: f32 = 500.0;
const SOFTENING: f32 = 50.0;

/// Active regime together with the state that only lives while it is active.
///
/// Stateful variants start out empty and build their attractors on the
/// first sample, using the canvas size seen at that moment.
#[derive(Clone, Debug)]
pub enum Field {
    CurlNoise,
    GravityWells { wells: Option<AttractorSet> },
    StrangeAttractor,
    Vortex,
    Flocking,
    Dipole { charges: Option<AttractorSet> },
    ReactionDiffusion,
    Rose,
}

impl Field {
    /// Fresh state for `mode`.
    pub fn enter(mode: FieldMode) -> Self {
        match mode {
            FieldMode::CurlNoise => Field::CurlNoise,
            FieldMode::GravityWells => Field::GravityWells { wells: None },
            FieldMode::StrangeAttractor => Field::StrangeAttractor,
            FieldMode::Vortex => Field::Vortex,
            FieldMode::Flocking => Field::Flocking,
            FieldMode::Dipole => Field::Dipole { charges: None },
            FieldMode::ReactionDiffusion => Field::ReactionDiffusion,
            FieldMode::Rose => Field::Rose,
        }
    }

    pub fn mode(&self) -> FieldMode {
        match self {
            Field::CurlNoise => FieldMode::CurlNoise,
            Field::GravityWells { .. } => FieldMode::GravityWells,
            Field::StrangeAttractor => FieldMode::StrangeAttractor,
            Field::Vortex => FieldMode::Vortex,
            Field::Flocking => FieldMode::Flocking,
            Field::Dipole { .. } => FieldMode::Dipole,
            Field::ReactionDiffusion => FieldMode::ReactionDiffusion,
            Field::Rose => FieldMode::Rose,
        }
    }

    /// Attractors of the active regime, if it has built any yet.
    pub fn attractors(&self) -> Option<&AttractorSet> {
        match self {
            Field::GravityWells { wells } => wells.as_ref(),
            Field::Dipole { charges } => charges.as_ref(),
            _ => None,
        }
    }

    /// Evaluates the field at `pos`.
    ///
    /// ### Parameters
    /// - `noise` - Shared noise generator.
    /// - `pos` - Sample position in canvas pixels.
    /// - `tick` - Frame counter; field time is `tick * 0.01`.
    /// - `size` - Canvas size; regimes are laid out around its center.
    ///
    /// ### Returns
    /// A bias whose components lie in `[-2, 2]` for gravity wells and in
    /// `[-1, 1]` for every other regime.
    pub fn sample(&mut self, noise: &SimplexNoise, pos: Vec2, tick: u64, size: UVec2) -> Vec2 {
        let center = canvas_center(size);
        let t = field_time(tick);

        match self {
            Field::CurlNoise => curl_noise(noise, pos, t),
            Field::GravityWells { wells } => {
                let wells = wells.get_or_insert_with(|| {
                    AttractorSet::ring(center, WELL_RING_RADIUS, WELL_COUNT, WELL_STRENGTH)
                });
                wells
                    .pull(pos, SOFTENING, 0.001)
                    .clamp(Vec2::splat(-2.0), Vec2::splat(2.0))
            }
            Field::StrangeAttractor => strange_attractor(pos - center),
            Field::Vortex => vortex(pos - center),
            Field::Flocking => flocking(noise, pos, center, t),
            Field::Dipole { charges } => {
                // Sign flipped: a positive charge pushes particles away.
                let charges = charges.get_or_insert_with(|| {
                    AttractorSet::from_points(vec![
                        Attractor {
                            pos: center - Vec2::X * DIPOLE_OFFSET,
                            strength: -DIPOLE_STRENGTH,
                        },
                        Attractor {
                            pos: center + Vec2::X * DIPOLE_OFFSET,
                            strength: DIPOLE_STRENGTH,
                        },
                    ])
                });
                clamp_unit(charges.pull(pos, SOFTENING, 0.01))
            }
            Field::ReactionDiffusion => reaction_diffusion(noise, pos, t),
            Field::Rose => rose(pos, center),
        }
    }
}

/// Field time for a frame counter: `tick * 0.01`, computed in `f64` so
/// that it keeps advancing every frame on long runs.
#[inline]
pub fn field_time(tick: u64) -> f32 {
    (tick as f64 * 0.01) as f32
}

#[inline]
fn clamp_unit(v: Vec2) -> Vec2 {
    v.clamp(Vec2::NEG_ONE, Vec2::ONE)
}

/// Two noise octaves give an angle; the result is a fixed-length step along it.
fn curl_noise(noise: &SimplexNoise, pos: Vec2, t: f32) -> Vec2 {
    let a = noise.noise3(pos.x * 0.003, pos.y * 0.003, t * 0.5) * TAU;
    let b = noise.noise3(pos.x * 0.001, pos.y * 0.001, t * 0.2) * TAU * 0.5;
    Vec2::from_angle(a + b) * 0.5
}

/// Lorenz flow sampled in the plane. The `rho` term omits the usual `- z`
/// coupling, which keeps the flow from drifting to one side.
fn strange_attractor(offset: Vec2) -> Vec2 {
    const SIGMA: f32 = 10.0;
    const RHO: f32 = 28.0;
    const SCALE: f32 = 0.1;

    let p = offset * 0.01;
    clamp_unit(Vec2::new(
        SIGMA * (p.y - p.x) * SCALE,
        (p.x * RHO - p.y) * SCALE,
    ))
}

fn vortex(offset: Vec2) -> Vec2 {
    const SWIRL: f32 = 0.0005;
    const RADIAL: f32 = -0.0001;

    clamp_unit(offset.perp() * SWIRL + offset * RADIAL)
}

fn flocking(noise: &SimplexNoise, pos: Vec2, center: Vec2, t: f32) -> Vec2 {
    let heading = noise.noise3(pos.x * 0.002, pos.y * 0.002, t * 0.3) * TAU;
    let cohesion = (center - pos) * 0.0001;
    let alignment = Vec2::from_angle(heading) * 0.3;
    clamp_unit(cohesion + alignment)
}

/// Gray-Scott style rates over two noise "concentrations".
///
/// The diffusion terms are offsets between nearby noise samples rather than
/// true Laplacians, giving a bounded, slowly oscillating push.
fn reaction_diffusion(noise: &SimplexNoise, pos: Vec2, t: f32) -> Vec2 {
    const SCALE: f32 = 0.005;
    const DU: f32 = 0.16;
    const DV: f32 = 0.08;
    const FEED: f32 = 0.035;
    const KILL: f32 = 0.065;

    let z = t * 0.1;
    let at = |k: f32| noise.noise3(pos.x * SCALE * k, pos.y * SCALE * k, z);

    let u = at(1.0);
    let v = at(2.0);
    let lap_u = at(1.1) - u;
    let lap_v = at(2.1) - v;

    let uvv = u * v * v;
    let du = DU * lap_u - uvv + FEED * (1.0 - u);
    let dv = DV * lap_v + uvv - (FEED + KILL) * v;
    clamp_unit(Vec2::new(du, dv) * 5.0)
}

/// Weak pull toward a five-petal rose curve at the particle's polar angle.
fn rose(pos: Vec2, center: Vec2) -> Vec2 {
    const PETALS: f32 = 5.0;
    const RADIUS: f32 = 100.0;
    const PULL: f32 = 0.0005;

    let offset = pos - center;
    let theta = offset.y.atan2(offset.x);
    let r = (PETALS * theta).cos() * RADIUS;
    let target = center + Vec2::from_angle(theta) * r;
    clamp_unit((target - pos) * PULL)
}

/// Advances the mode on a fixed wall-clock interval.
///
/// Times are seconds on any monotonic clock; only differences matter.
#[derive(Clone, Debug)]
pub struct ModeScheduler {
    mode: FieldMode,
    started: f64,
    interval: f64,
}

impl ModeScheduler {
    pub fn new(interval: f64, now: f64) -> Self {
        Self {
            mode: FieldMode::CurlNoise,
            started: now,
            interval,
        }
    }

    pub fn mode(&self) -> FieldMode {
        self.mode
    }

    /// Seconds the current mode has been active at `now`.
    pub fn elapsed(&self, now: f64) -> f64 {
        now - self.started
    }

    /// Moves to the next mode if a full interval has passed.
    ///
    /// Switches stay on the interval grid; if the caller fell more than one
    /// interval behind (a stalled host), the grid restarts at `now` instead
    /// of replaying every missed switch.
    ///
    /// ### Returns
    /// The new mode when a switch happened, `None` otherwise.
    pub fn update(&mut self, now: f64) -> Option<FieldMode> {
        if now - self.started < self.interval {
            return None;
        }

        self.mode = self.mode.next();
        self.started += self.interval;
        if now - self.started >= self.interval {
            self.started = now;
        }
        Some(self.mode)
    }

    /// Jumps to `mode` and restarts its interval at `now`.
    pub fn force(&mut self, mode: FieldMode, now: f64) {
        self.mode = mode;
        self.started = now;
    }
}

/// Scheduler plus the state of the currently active regime.
#[derive(Clone, Debug)]
pub struct FieldEngine {
    scheduler: ModeScheduler,
    field: Field,
}

impl FieldEngine {
    pub fn new(interval: f64, now: f64) -> Self {
        let scheduler = ModeScheduler::new(interval, now);
        let field = Field::enter(scheduler.mode());
        Self { scheduler, field }
    }

    pub fn mode(&self) -> FieldMode {
        self.scheduler.mode()
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    /// Runs the timer check once per frame, before any field sample.
    ///
    /// ### Returns
    /// `true` if the mode changed; the previous regime's state is dropped.
    pub fn begin_frame(&mut self, now: f64) -> bool {
        match self.scheduler.update(now) {
            Some(mode) => {
                self.field = Field::enter(mode);
                log::info!("switching to field mode {} ({})", mode.index(), mode.name());
                true
            }
            None => false,
        }
    }

    /// Jumps straight to `mode`, discarding the current regime's state.
    pub fn force_mode(&mut self, mode: FieldMode, now: f64) {
        self.scheduler.force(mode, now);
        self.field = Field::enter(mode);
        log::info!("field mode set to {} ({})", mode.index(), mode.name());
    }

    #[inline]
    pub fn field_at(&mut self, noise: &SimplexNoise, pos: Vec2, tick: u64, size: UVec2) -> Vec2 {
        self.field.sample(noise, pos, tick, size)
    }
}
