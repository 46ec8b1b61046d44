//! Core library of the swirl particle-field animation.
//!
//! Main components:
//! - [`simulation`] - the owned per-run context a host drives once per frame.
//! - [`store`] - structure-of-arrays particle attributes.
//! - [`lifecycle`] - spawn, integrate, fade, recycle and rasterize.
//! - [`field`] - the eight motion regimes and the mode scheduler.
//! - [`noise`] - seeded 2-D/3-D simplex noise.
//! - [`attractor`] - point attractors used by the well and dipole regimes.
//! - [`raster`] - per-frame RGBA8 particle raster.
//! - [`compositor`] - fading background, glow and additive passes.
//! - [`palette`] / [`fetch`] - particle colors and asynchronous palette lookup.
//! - [`clock`] - frame-rate measurement.
//! - [`config`] - tunables, loadable from JSON.
//! - [`error`] / [`types`] - shared error and helper types.

pub mod attractor;
pub mod clock;
pub mod compositor;
pub mod config;
pub mod error;
pub mod fetch;
pub mod field;
pub mod lifecycle;
pub mod noise;
pub mod palette;
pub mod raster;
pub mod simulation;
pub mod store;
pub mod types;

pub use config::Config;
pub use error::{Result, SimError};
pub use simulation::{FrameStats, RunState, Simulation};
