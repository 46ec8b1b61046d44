//! Per-frame particle lifecycle.
//!
//! One frame of the simulation is a single pass over the store in index
//! order. For every particle:
//!
//! 1. Age it by one frame and compute its alpha from [`alpha_envelope`].
//! 2. If it has reached its ttl or sits outside the canvas, [`spawn`] a
//!    replacement into the same slot (it is not drawn this frame).
//! 3. Otherwise blend its velocity toward the field bias plus noise jitter,
//!    move and clamp it, and plot it into the [`RasterBuffer`].
//!
//! Because of step 2, every pixel written in a frame belongs to a particle
//! with `age < ttl` that lies inside the canvas.

use std::f32::consts::TAU;

use glam::{UVec2, Vec2};
use rand::Rng;

use crate::{
    config::Config,
    error::{Result, SimError},
    field::FieldEngine,
    noise::SimplexNoise,
    palette::{Palette, vivid},
    raster::RasterBuffer,
    store::{Particle, ParticleStore},
    types::{canvas_center, out_of_bounds},
};

/// Three-segment opacity envelope in `[0, 1]`.
///
/// Linear fade-in over the first 10% of life, full opacity up to 70%,
/// then a linear fade-out to zero at `age == ttl`.
pub fn alpha_envelope(age: f32, ttl: f32) -> f32 {
    let t = age / ttl;
    if t < 0.1 {
        t / 0.1
    } else if t > 0.7 {
        ((1.0 - t) / 0.3).max(0.0)
    } else {
        1.0
    }
}

/// Envelope scaled to `[0, 255]`, multiplied by `boost` and clamped.
#[inline]
pub fn boosted_alpha(age: f32, ttl: f32, boost: f32) -> f32 {
    (alpha_envelope(age, ttl) * 255.0 * boost).min(255.0)
}

/// Draws a fresh particle.
///
/// The particle starts at rest, with age zero, somewhere within
/// `cfg.spawn_radius` of `center`, with a ttl drawn from
/// `[cfg.ttl_min, cfg.ttl_max)` and a boosted palette color.
///
/// ### Parameters
/// - `rng` - Random source for every drawn attribute.
/// - `palette` - Palette the color is picked from.
/// - `cfg` - Spawn ranges and color boosts.
/// - `center` - Canvas center in pixels.
pub fn spawn(rng: &mut impl Rng, palette: &Palette, cfg: &Config, center: Vec2) -> Particle {
    let theta = rng.random_range(0.0..TAU);
    let dist = rng.random::<f32>() * cfg.spawn_radius;

    Particle {
        pos: center + Vec2::from_angle(theta) * dist,
        vel: Vec2::ZERO,
        alpha: 0.0,
        age: 0.0,
        ttl: draw(rng, cfg.ttl_min, cfg.ttl_max),
        coupling: draw(rng, cfg.coupling_min, cfg.coupling_max),
        color: vivid(
            palette.pick(rng),
            cfg.saturation_boost,
            cfg.brightness_boost,
        ),
    }
}

/// Uniform draw from `[min, max)`, or `min` for an empty range.
fn draw(rng: &mut impl Rng, min: f32, max: f32) -> f32 {
    if max > min {
        rng.random_range(min..max)
    } else {
        min
    }
}

/// Fills every slot of `store` with a freshly spawned particle.
pub fn seed_phase(
    store: &mut ParticleStore,
    rng: &mut impl Rng,
    palette: &Palette,
    cfg: &Config,
    size: UVec2,
) {
    let center = canvas_center(size);
    for id in 0..store.len() {
        store.put(id, &spawn(rng, palette, cfg, center));
    }
}

/// Read-only inputs shared by every particle in a frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameParams<'a> {
    pub cfg: &'a Config,
    pub noise: &'a SimplexNoise,
    pub palette: &'a Palette,
    /// Frame counter, the time axis of every noise lookup.
    pub tick: u64,
    pub size: UVec2,
}

/// Counts gathered by [`update_phase`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PhaseStats {
    /// Particles integrated and plotted this frame.
    pub drawn: usize,
    /// Particles respawned this frame.
    pub recycled: usize,
}

/// Ages, recycles, integrates and rasterizes every particle.
///
/// `raster` is cleared first and must already have the canvas size.
/// Particles are visited in index order, so a later particle overwrites an
/// earlier one that lands on the same pixel.
///
/// ### Parameters
/// - `store` - Particle store, updated in place.
/// - `raster` - Frame raster to draw into.
/// - `field` - Vector field engine; its mode must already be settled for
///   this frame (see [`FieldEngine::begin_frame`]).
/// - `rng` - Random source for respawns.
/// - `params` - Config, noise, palette, tick and canvas size.
///
/// ### Returns
/// - `Ok(PhaseStats)` on success.
/// - `Err(SimError::NonFinite)` if integration produced a NaN or infinite
///   value. The pass stops at that particle; the offending slot is left
///   untouched.
pub fn update_phase(
    store: &mut ParticleStore,
    raster: &mut RasterBuffer,
    field: &mut FieldEngine,
    rng: &mut impl Rng,
    params: &FrameParams<'_>,
) -> Result<PhaseStats> {
    let FrameParams {
        cfg,
        noise,
        palette,
        tick,
        size,
    } = *params;

    raster.clear();
    let center = canvas_center(size);
    let max_pos = (size.as_vec2() - Vec2::ONE).max(Vec2::ZERO);
    let jitter_t = (tick as f64 * cfg.jitter_time_scale as f64) as f32;
    let mut stats = PhaseStats::default();

    for id in 0..store.len() {
        let p = store.particle(id);
        let age = p.age + 1.0;

        if age >= p.ttl || out_of_bounds(p.pos, size) {
            store.put(id, &spawn(rng, palette, cfg, center));
            stats.recycled += 1;
            continue;
        }

        let alpha = boosted_alpha(age, p.ttl, cfg.alpha_boost);
        let bias = field.field_at(noise, p.pos, tick, size);

        let f = cfg.jitter_frequency;
        let heading = noise.noise3(p.pos.x * f, p.pos.y * f, jitter_t) * TAU;
        let jitter = Vec2::from_angle(heading) * p.coupling * cfg.jitter_scale;

        let vel = p.vel.lerp(bias + jitter, cfg.velocity_blend);
        let moved = p.pos + vel;
        if !moved.is_finite() {
            return Err(SimError::NonFinite { index: id, tick });
        }
        let pos = moved.clamp(Vec2::ZERO, max_pos);

        store.set_row(id, &[pos.x, pos.y, vel.x, vel.y, alpha, age]);

        let [r, g, b] = p.color;
        if raster.plot(pos, [r as u8, g as u8, b as u8, alpha as u8]) {
            stats.drawn += 1;
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{palette::Rgb, store::Attribute};
    use rand::{SeedableRng, rngs::StdRng};

    const SIZE: UVec2 = UVec2::new(800, 600);

    fn small_config(count: usize) -> Config {
        Config {
            particle_count: count,
            ..Config::default()
        }
    }

    #[test]
    fn envelope_boundaries() {
        assert_eq!(alpha_envelope(0.0, 100.0), 0.0);
        assert!((alpha_envelope(5.0, 100.0) - 0.5).abs() < 1e-5);
        assert_eq!(alpha_envelope(50.0, 100.0), 1.0);
        assert_eq!(alpha_envelope(70.0, 100.0), 1.0);
        assert_eq!(alpha_envelope(100.0, 100.0), 0.0);

        let late = alpha_envelope(95.0, 100.0);
        assert!(late > 0.0 && late < 1.0);
        assert!(alpha_envelope(97.0, 100.0) < late);
        assert!(alpha_envelope(99.0, 100.0) < alpha_envelope(97.0, 100.0));
    }

    #[test]
    fn boosted_alpha_is_clamped() {
        assert_eq!(boosted_alpha(50.0, 100.0, 1.6), 255.0);
        assert_eq!(boosted_alpha(0.0, 100.0, 1.6), 0.0);
        let fading = boosted_alpha(95.0, 100.0, 1.6);
        assert!(fading > 0.0 && fading < 255.0);
    }

    #[test]
    fn spawned_particles_have_fresh_shape() {
        let cfg = Config::default();
        let palette = Palette::default();
        let center = canvas_center(SIZE);

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            for _ in 0..500 {
                let p = spawn(&mut rng, &palette, &cfg, center);
                assert_eq!(p.age, 0.0);
                assert_eq!(p.alpha, 0.0);
                assert_eq!(p.vel, Vec2::ZERO);
                assert!(p.ttl >= 100.0 && p.ttl < 300.0);
                assert!(p.coupling >= 1.0 && p.coupling < 10.0);
                assert!(p.pos.distance(center) <= 250.0 + 1e-3);
                assert!(p.color.iter().all(|c| (0.0..=255.0).contains(c)));
            }
        }
    }

    #[test]
    fn rasterized_particles_are_young_and_in_bounds() {
        let cfg = small_config(2000);
        let palette = Palette::default();
        let noise = SimplexNoise::from_seed(1);

        for seed in 0..5 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut store = ParticleStore::with_len(cfg.particle_count);
            let mut raster = RasterBuffer::with_size(SIZE);
            let mut field = FieldEngine::new(cfg.mode_interval, 0.0);
            seed_phase(&mut store, &mut rng, &palette, &cfg, SIZE);

            for tick in 1..=150u64 {
                // One simulated second per frame walks through every regime.
                field.begin_frame(tick as f64);
                let params = FrameParams {
                    cfg: &cfg,
                    noise: &noise,
                    palette: &palette,
                    tick,
                    size: SIZE,
                };
                let stats =
                    update_phase(&mut store, &mut raster, &mut field, &mut rng, &params).unwrap();
                assert_eq!(stats.drawn + stats.recycled, store.len());

                let mut drawn = 0;
                store.for_each(|p, id| {
                    if p.age > 0.0 {
                        drawn += 1;
                        assert!(p.age < p.ttl, "particle {id} drawn past its ttl");
                        assert!(!out_of_bounds(p.pos, SIZE), "particle {id} drawn at {}", p.pos);
                    }
                });
                assert_eq!(drawn, stats.drawn);
                assert!(raster.lit_pixels().count() <= stats.drawn);
            }
        }
    }

    #[test]
    fn out_of_bounds_particle_is_recycled_without_drawing() {
        let cfg = small_config(1);
        let palette = Palette::default();
        let noise = SimplexNoise::from_seed(0);
        let mut rng = StdRng::seed_from_u64(0);
        let mut store = ParticleStore::with_len(1);
        let mut raster = RasterBuffer::with_size(SIZE);
        let mut field = FieldEngine::new(cfg.mode_interval, 0.0);

        store.put(
            0,
            &Particle {
                pos: Vec2::new(-5.0, 10.0),
                ttl: 200.0,
                age: 3.0,
                ..Particle::default()
            },
        );

        let params = FrameParams {
            cfg: &cfg,
            noise: &noise,
            palette: &palette,
            tick: 1,
            size: SIZE,
        };
        let stats = update_phase(&mut store, &mut raster, &mut field, &mut rng, &params).unwrap();

        assert_eq!(stats, PhaseStats { drawn: 0, recycled: 1 });
        assert_eq!(store.get(0, Attribute::Age), 0.0);
        assert_eq!(raster.lit_pixels().count(), 0);
    }

    #[test]
    fn non_finite_particle_is_reported() {
        let cfg = small_config(2);
        let palette = Palette::default();
        let noise = SimplexNoise::from_seed(0);
        let mut rng = StdRng::seed_from_u64(0);
        let mut store = ParticleStore::with_len(2);
        let mut raster = RasterBuffer::with_size(SIZE);
        let mut field = FieldEngine::new(cfg.mode_interval, 0.0);
        seed_phase(&mut store, &mut rng, &palette, &cfg, SIZE);
        store.set(1, Attribute::Vx, f32::NAN);

        let params = FrameParams {
            cfg: &cfg,
            noise: &noise,
            palette: &palette,
            tick: 1,
            size: SIZE,
        };
        let err = update_phase(&mut store, &mut raster, &mut field, &mut rng, &params);
        assert!(matches!(err, Err(SimError::NonFinite { index: 1, tick: 1 })));
    }

    #[test]
    fn fixed_ttl_particles_recycle_with_palette_color() {
        let mut cfg = small_config(3);
        cfg.ttl_min = 100.0;
        cfg.ttl_max = 100.0;

        let color = Rgb::new(0x40, 0x80, 0xc0);
        let palette = Palette::new(vec![color]);
        let expected = vivid(color, cfg.saturation_boost, cfg.brightness_boost);
        let noise = SimplexNoise::from_seed(21);
        let mut rng = StdRng::seed_from_u64(21);
        let mut store = ParticleStore::with_len(3);
        let mut raster = RasterBuffer::with_size(SIZE);
        let mut field = FieldEngine::new(cfg.mode_interval, 0.0);
        seed_phase(&mut store, &mut rng, &palette, &cfg, SIZE);

        let mut recycles = [0usize; 3];
        for tick in 1..=301u64 {
            field.begin_frame(tick as f64 / 60.0);
            let params = FrameParams {
                cfg: &cfg,
                noise: &noise,
                palette: &palette,
                tick,
                size: SIZE,
            };
            update_phase(&mut store, &mut raster, &mut field, &mut rng, &params).unwrap();

            for (id, count) in recycles.iter_mut().enumerate() {
                let p = store.particle(id);
                assert_eq!(p.color, expected);
                if p.age == 0.0 {
                    *count += 1;
                    assert_eq!(p.ttl, 100.0);
                }
            }
        }

        for (id, count) in recycles.iter().enumerate() {
            assert!(*count >= 2, "particle {id} recycled only {count} times");
        }
    }
}
