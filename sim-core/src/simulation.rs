//! The owned simulation context.
//!
//! [`Simulation`] holds every piece of per-run state: particle store,
//! raster, compositor, field engine, noise, palette and RNG. A host drives
//! it with one [`Simulation::tick`] per display refresh and forwards
//! window-size changes through [`Simulation::resize`]; nothing else writes
//! to it.

use glam::UVec2;
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    compositor::{CompositeSettings, Compositor},
    config::Config,
    error::{Result, SimError},
    field::{FieldEngine, FieldMode},
    lifecycle::{self, FrameParams},
    noise::SimplexNoise,
    palette::Palette,
    raster::RasterBuffer,
    store::ParticleStore,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Running,
    /// A frame failed; state is frozen as it was when the error surfaced.
    Halted,
    /// [`Simulation::shutdown`] released the buffers.
    Stopped,
}

/// Summary of one completed frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameStats {
    pub tick: u64,
    pub mode: FieldMode,
    pub drawn: usize,
    pub recycled: usize,
}

pub struct Simulation {
    cfg: Config,
    noise: SimplexNoise,
    rng: StdRng,
    store: ParticleStore,
    raster: RasterBuffer,
    compositor: Compositor,
    field: FieldEngine,
    palette: Palette,
    size: UVec2,
    pending_size: Option<UVec2>,
    /// Host time of the first tick; field timing counts from here.
    origin: Option<f64>,
    elapsed: f64,
    tick: u64,
    state: RunState,
}

impl Simulation {
    /// Validates `cfg`, allocates every buffer and spawns all particles.
    ///
    /// ### Parameters
    /// - `cfg` - Simulation configuration.
    /// - `size` - Initial canvas size in device pixels; must be non-zero.
    /// - `seed` - Fixed seed for a reproducible run, or `None` for OS entropy.
    pub fn new(cfg: Config, size: UVec2, seed: Option<u64>) -> Result<Self> {
        cfg.validate()?;
        if size.x == 0 || size.y == 0 {
            return Err(SimError::InvalidConfig(format!(
                "canvas size must be non-zero, got {}x{}",
                size.x, size.y
            )));
        }

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let noise = SimplexNoise::new(&mut rng);
        let palette = Palette::default();

        let mut store = ParticleStore::with_len(cfg.particle_count);
        lifecycle::seed_phase(&mut store, &mut rng, &palette, &cfg, size);

        log::info!(
            "simulation started: {} particles on {}x{} canvas",
            cfg.particle_count,
            size.x,
            size.y
        );

        Ok(Self {
            raster: RasterBuffer::with_size(size),
            compositor: Compositor::new(size, CompositeSettings::from(&cfg)),
            field: FieldEngine::new(cfg.mode_interval, 0.0),
            cfg,
            noise,
            rng,
            store,
            palette,
            size,
            pending_size: None,
            origin: None,
            elapsed: 0.0,
            tick: 0,
            state: RunState::Running,
        })
    }

    /// Advances the simulation by one frame.
    ///
    /// A pending resize is applied first, then the mode timer is checked
    /// once, then every particle is updated and the frame is composited.
    ///
    /// ### Parameters
    /// - `now` - Host time in seconds (any monotonic origin).
    ///
    /// ### Returns
    /// - `Ok(FrameStats)` for a completed frame.
    /// - `Err(SimError::Stopped)` once the simulation is halted or shut down.
    /// - Any frame error; the simulation halts and nothing is composited.
    pub fn tick(&mut self, now: f64) -> Result<FrameStats> {
        if self.state != RunState::Running {
            return Err(SimError::Stopped);
        }

        self.apply_pending_resize();

        let origin = *self.origin.get_or_insert(now);
        self.elapsed = (now - origin).max(self.elapsed);
        self.tick += 1;
        self.field.begin_frame(self.elapsed);

        let params = FrameParams {
            cfg: &self.cfg,
            noise: &self.noise,
            palette: &self.palette,
            tick: self.tick,
            size: self.size,
        };
        let stats = match lifecycle::update_phase(
            &mut self.store,
            &mut self.raster,
            &mut self.field,
            &mut self.rng,
            &params,
        ) {
            Ok(stats) => stats,
            Err(e) => {
                log::error!("frame {} failed, halting: {e}", self.tick);
                self.state = RunState::Halted;
                return Err(e);
            }
        };

        self.compositor.composite(&self.raster);
        log::debug!(
            "frame {}: {} drawn, {} recycled",
            self.tick,
            stats.drawn,
            stats.recycled
        );

        Ok(FrameStats {
            tick: self.tick,
            mode: self.field.mode(),
            drawn: stats.drawn,
            recycled: stats.recycled,
        })
    }

    /// Requests a new canvas size, applied at the start of the next frame.
    ///
    /// Zero-sized requests (minimized windows) are ignored.
    pub fn resize(&mut self, size: UVec2) {
        if size.x == 0 || size.y == 0 {
            log::debug!("ignoring resize to {}x{}", size.x, size.y);
            return;
        }
        if size == self.size {
            self.pending_size = None;
        } else {
            self.pending_size = Some(size);
        }
    }

    fn apply_pending_resize(&mut self) {
        let Some(size) = self.pending_size.take() else {
            return;
        };
        self.raster.ensure_size(size);
        self.compositor.resize(size);
        self.size = size;
        log::info!("canvas resized to {}x{}", size.x, size.y);
    }

    /// Swaps the palette. Live particles keep their color; every particle
    /// spawned from now on draws from `palette`.
    pub fn set_palette(&mut self, palette: Palette) {
        log::debug!("palette changed to {} colors", palette.len());
        self.palette = palette;
    }

    /// Jumps to a field mode and restarts its interval.
    pub fn force_mode(&mut self, mode: FieldMode) {
        self.field.force_mode(mode, self.elapsed);
    }

    /// Stops the simulation and releases the raster and frame buffers.
    ///
    /// Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.state == RunState::Stopped {
            return;
        }
        self.raster.release();
        self.compositor.release();
        self.pending_size = None;
        self.state = RunState::Stopped;
        log::info!("simulation stopped after {} frames", self.tick);
    }

    /// Writes the displayed frame as RGBA8 into `out`.
    pub fn frame_rgba(&self, out: &mut Vec<u8>) {
        self.compositor.write_rgba8(out);
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn mode(&self) -> FieldMode {
        self.field.mode()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Canvas size the current frame buffers were allocated for.
    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn store(&self) -> &ParticleStore {
        &self.store
    }

    /// Direct access to particle attributes between frames.
    pub fn store_mut(&mut self) -> &mut ParticleStore {
        &mut self.store
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn raster(&self) -> &RasterBuffer {
        &self.raster
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.shutdown();
    }
}
