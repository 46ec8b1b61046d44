use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// Tunables for the particle field.
///
/// Every field has a default matching the reference look; a JSON file can
/// override any subset of them (missing keys keep their default).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fixed capacity of the particle store.
    pub particle_count: usize,
    /// Lower bound of the time-to-live draw, in frames.
    pub ttl_min: f32,
    /// Exclusive upper bound of the time-to-live draw. Equal to `ttl_min` for a fixed ttl.
    pub ttl_max: f32,
    /// Particles spawn within this radius (px) of the canvas center.
    pub spawn_radius: f32,
    /// Range of the per-particle noise coupling coefficient.
    pub coupling_min: f32,
    pub coupling_max: f32,
    /// Blend factor pulling velocity toward the field + jitter target each frame.
    pub velocity_blend: f32,
    /// Jitter magnitude per unit of coupling.
    pub jitter_scale: f32,
    pub jitter_frequency: f32,
    pub jitter_time_scale: f32,
    /// Multiplier applied to the fade envelope before clamping to 255.
    pub alpha_boost: f32,
    /// Seconds between vector field mode switches.
    pub mode_interval: f64,
    pub saturation_boost: f32,
    pub brightness_boost: f32,
    /// Alpha of the dark fill laid over the previous frame.
    pub background_fade: f32,
    pub blur_radius: usize,
    pub blur_brightness: f32,
    pub additive_saturation: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            particle_count: 20_000,
            ttl_min: 100.0,
            ttl_max: 300.0,
            spawn_radius: 250.0,
            coupling_min: 1.0,
            coupling_max: 10.0,
            velocity_blend: 0.08,
            jitter_scale: 0.1,
            jitter_frequency: 0.002,
            jitter_time_scale: 0.0003,
            alpha_boost: 1.6,
            mode_interval: 15.0,
            saturation_boost: 2.2,
            brightness_boost: 1.4,
            background_fade: 0.1,
            blur_radius: 4,
            blur_brightness: 1.5,
            additive_saturation: 2.0,
        }
    }
}

/// Largest accepted glow blur radius, in pixels.
pub const MAX_BLUR_RADIUS: usize = 64;

impl Config {
    /// Parses a (possibly partial) JSON configuration and validates it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Config = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads and validates a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Checks that all values describe a runnable simulation.
    ///
    /// ### Returns
    /// - `Ok(())` if the configuration is usable.
    /// - `Err(SimError::InvalidConfig)` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(SimError::InvalidConfig(msg.to_owned()));

        let floats = [
            ("ttl_min", self.ttl_min),
            ("ttl_max", self.ttl_max),
            ("spawn_radius", self.spawn_radius),
            ("coupling_min", self.coupling_min),
            ("coupling_max", self.coupling_max),
            ("velocity_blend", self.velocity_blend),
            ("jitter_scale", self.jitter_scale),
            ("jitter_frequency", self.jitter_frequency),
            ("jitter_time_scale", self.jitter_time_scale),
            ("alpha_boost", self.alpha_boost),
            ("saturation_boost", self.saturation_boost),
            ("brightness_boost", self.brightness_boost),
            ("background_fade", self.background_fade),
            ("blur_brightness", self.blur_brightness),
            ("additive_saturation", self.additive_saturation),
        ];
        if let Some((name, _)) = floats.iter().find(|(_, v)| !v.is_finite()) {
            return Err(SimError::InvalidConfig(format!("{name} must be finite")));
        }
        if !self.mode_interval.is_finite() {
            return invalid("mode_interval must be finite");
        }

        if self.particle_count == 0 {
            return invalid("particle_count must be at least 1");
        }
        if !(self.ttl_min >= 1.0 && self.ttl_max >= self.ttl_min) {
            return invalid("ttl range must satisfy 1 <= ttl_min <= ttl_max");
        }
        if !(self.coupling_max >= self.coupling_min) {
            return invalid("coupling_max must not be below coupling_min");
        }
        if !(self.spawn_radius >= 0.0) {
            return invalid("spawn_radius must be non-negative");
        }
        if !(self.velocity_blend > 0.0 && self.velocity_blend <= 1.0) {
            return invalid("velocity_blend must lie in (0, 1]");
        }
        if !(self.mode_interval > 0.0) {
            return invalid("mode_interval must be positive");
        }
        if !(0.0..=1.0).contains(&self.background_fade) {
            return invalid("background_fade must lie in [0, 1]");
        }
        if self.blur_radius > MAX_BLUR_RADIUS {
            return Err(SimError::InvalidConfig(format!(
                "blur_radius must not exceed {MAX_BLUR_RADIUS}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults_for_missing_keys() {
        let cfg = Config::from_json_str(r#"{ "particle_count": 500, "mode_interval": 2.5 }"#)
            .unwrap();

        assert_eq!(cfg.particle_count, 500);
        assert_eq!(cfg.mode_interval, 2.5);
        assert_eq!(cfg.ttl_min, Config::default().ttl_min);
        assert_eq!(cfg.blur_radius, Config::default().blur_radius);
    }

    #[test]
    fn fixed_ttl_is_accepted() {
        let mut cfg = Config::default();
        cfg.ttl_min = 100.0;
        cfg.ttl_max = 100.0;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_inverted_ttl_range() {
        let mut cfg = Config::default();
        cfg.ttl_min = 300.0;
        cfg.ttl_max = 100.0;
        assert!(matches!(cfg.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_zero_particles_and_bad_blend() {
        let mut cfg = Config::default();
        cfg.particle_count = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.velocity_blend = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.mode_interval = f64::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_oversized_blur_radius() {
        let mut cfg = Config::default();
        cfg.blur_radius = MAX_BLUR_RADIUS;
        assert!(cfg.validate().is_ok());

        let err = Config::from_json_str(r#"{ "blur_radius": 18446744073709551615 }"#);
        assert!(matches!(err, Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_overflowing_float_values() {
        // 1e300 does not fit an f32 and parses as infinity.
        let err = Config::from_json_str(r#"{ "ttl_max": 1e300 }"#);
        assert!(matches!(err, Err(SimError::InvalidConfig(msg)) if msg.contains("ttl_max")));

        let mut cfg = Config::default();
        cfg.blur_brightness = f32::INFINITY;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.jitter_scale = f32::NAN;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.mode_interval = f64::INFINITY;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(
            Config::from_json_str("{ not json"),
            Err(SimError::Json(_))
        ));
    }
}
