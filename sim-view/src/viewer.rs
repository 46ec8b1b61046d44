//! Interactive swirl viewer built with eframe/egui.
//!
//! [`Viewer`] owns the [`Simulation`] and implements [`eframe::App`]: every
//! egui frame it forwards the canvas size, ticks the simulation once,
//! uploads the composited frame as a texture and draws it full-bleed.

use eframe::App;
use glam::UVec2;
use swirl_core::{
    Config, FrameStats, Simulation,
    clock::FpsCounter,
    error::{Result, SimError},
    fetch::{HexListSource, PaletteFetcher},
};

/// Canvas size used until the first layout pass reports the real one.
const INITIAL_SIZE: UVec2 = UVec2::new(1280, 720);

/// Main application state for the viewer.
///
/// ### Fields
/// - `sim` - The running simulation.
/// - `fetcher` - Palette lookups, polled once per frame.
/// - `fps` - Frame-rate counter shown in the status bar.
/// - `texture` - GPU copy of the last composited frame.
/// - `rgba` - Reused staging buffer for the texture upload.
/// - `palette_text` - Contents of the palette text box.
/// - `show_ui` - Whether the control and status panels are visible.
/// - `last_stats` - Stats of the last completed frame.
/// - `error` - Set once a frame fails; the loop stops for good.
pub struct Viewer {
    sim: Simulation,
    fetcher: PaletteFetcher,
    fps: FpsCounter,
    texture: Option<egui::TextureHandle>,
    rgba: Vec<u8>,
    palette_text: String,
    show_ui: bool,
    last_stats: Option<FrameStats>,
    error: Option<String>,
}

impl Viewer {
    /// Creates the simulation and an idle viewer around it.
    ///
    /// ### Parameters
    /// - `cfg` - Simulation configuration.
    /// - `seed` - Optional RNG seed for a reproducible run.
    pub fn new(cfg: Config, seed: Option<u64>) -> Result<Self> {
        Ok(Self {
            sim: Simulation::new(cfg, INITIAL_SIZE, seed)?,
            fetcher: PaletteFetcher::new(HexListSource),
            fps: FpsCounter::default(),
            texture: None,
            rgba: Vec::new(),
            palette_text: String::new(),
            show_ui: true,
            last_stats: None,
            error: None,
        })
    }

    /// Runs one frame of the simulation at host time `now`.
    ///
    /// Finished palette lookups are applied first so that particles
    /// recycled this frame already use the new colors.
    fn step(&mut self, now: f64) {
        if let Some(palette) = self.fetcher.poll() {
            self.sim.set_palette(palette);
        }
        if !self.sim.is_running() {
            return;
        }

        self.fps.frame(now);
        match self.sim.tick(now) {
            Ok(stats) => self.last_stats = Some(stats),
            Err(SimError::Stopped) => {}
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    /// Copies the composited frame into the egui texture.
    fn upload(&mut self, ctx: &egui::Context) {
        let size = self.sim.compositor().size();
        if size.x == 0 || size.y == 0 {
            return;
        }
        self.sim.frame_rgba(&mut self.rgba);
        let image = egui::ColorImage::from_rgba_unmultiplied(
            [size.x as usize, size.y as usize],
            &self.rgba,
        );

        match &mut self.texture {
            Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
            None => {
                self.texture =
                    Some(ctx.load_texture("swirl-frame", image, egui::TextureOptions::LINEAR));
            }
        }
    }

    /// Stops the simulation and frees its frame buffers.
    fn close(&mut self) {
        self.sim.shutdown();
        self.texture = None;
        self.rgba = Vec::new();
    }

    fn submit_palette(&mut self) {
        let text = self.palette_text.trim();
        if !text.is_empty() {
            log::debug!("palette lookup for {text:?}");
            self.fetcher.request(text);
        }
    }

    /// Builds the top panel (palette entry, mode control, hide toggle).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Palette:");
                let edit = ui.add(
                    egui::TextEdit::singleline(&mut self.palette_text)
                        .hint_text("#ff9999, #99c9ff, ...")
                        .desired_width(320.0),
                );
                let entered = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.button("Apply").clicked() || entered {
                    self.submit_palette();
                }
                if self.fetcher.is_busy() {
                    ui.spinner();
                }

                ui.separator();
                if ui.button("Next mode").clicked() {
                    self.sim.force_mode(self.sim.mode().next());
                }

                ui.separator();
                if ui.button("Hide UI (H)").clicked() {
                    self.show_ui = false;
                }
            });
        });
    }

    /// Builds the bottom status bar (mode, fps, frame counters).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("{:.1} fps", self.fps.fps()));
                ui.separator();
                if let Some(stats) = self.last_stats {
                    ui.label(format!("recycled = {}", stats.recycled));
                    ui.label(format!("drawn = {}", stats.drawn));
                    ui.label(format!("frame = {}", stats.tick));
                    ui.separator();
                }
                let mode = self.sim.mode();
                ui.label(format!("mode {} ({})", mode.index(), mode.name()));

                if let Some(error) = &self.error {
                    ui.separator();
                    ui.colored_label(egui::Color32::LIGHT_RED, format!("stopped: {error}"));
                }
            });
        });
    }

    /// Draws the frame over the whole central area and reports its size.
    fn ui_canvas(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                let (rect, _) = ui.allocate_exact_size(ui.available_size(), egui::Sense::hover());
                self.sim.resize(canvas_size(rect, ctx.pixels_per_point()));

                if let Some(texture) = &self.texture {
                    let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                    ui.painter()
                        .image(texture.id(), rect, uv, egui::Color32::WHITE);
                }
            });
    }
}

/// Converts a layout rectangle in points to a canvas size in pixels.
fn canvas_size(rect: egui::Rect, pixels_per_point: f32) -> UVec2 {
    let px = rect.size() * pixels_per_point;
    UVec2::new(px.x.round().max(0.0) as u32, px.y.round().max(0.0) as u32)
}

impl App for Viewer {
    /// eframe callback: input, panels, one simulation tick, repaint.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !ctx.wants_keyboard_input() && ctx.input(|i| i.key_pressed(egui::Key::H)) {
            self.show_ui = !self.show_ui;
        }

        if self.show_ui {
            self.ui_top_panel(ctx);
            self.ui_status_bar(ctx);
        }
        self.ui_canvas(ctx);

        let now = ctx.input(|i| i.time);
        self.step(now);
        self.upload(ctx);

        if self.sim.is_running() || self.fetcher.is_busy() {
            ctx.request_repaint();
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.close();
    }
}
