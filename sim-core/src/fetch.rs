//! Asynchronous palette lookup.
//!
//! A [`PaletteSource`] turns free text into a palette; it may be slow (a
//! network service) or fail. [`PaletteFetcher`] runs it on a worker thread
//! and hands results back over a channel that the frame loop drains
//! without blocking.

use std::{
    sync::{
        Arc,
        mpsc::{self, Receiver, Sender, TryRecvError},
    },
    thread,
};

use crate::palette::Palette;

/// Maps a text prompt to a palette.
///
/// `None` means "no usable palette"; the caller keeps its current one.
pub trait PaletteSource: Send + Sync {
    fn palette_for(&self, text: &str) -> Option<Palette>;
}

/// Reads the text itself as a list of hex colors separated by whitespace
/// or commas, e.g. `"#ff0000, 00ff00 #0000ff"`.
#[derive(Clone, Copy, Debug, Default)]
pub struct HexListSource;

impl PaletteSource for HexListSource {
    fn palette_for(&self, text: &str) -> Option<Palette> {
        let colors: Vec<&str> = text
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .collect();
        if colors.is_empty() {
            return None;
        }
        match Palette::from_hex(&colors) {
            Ok(palette) => Some(palette),
            Err(e) => {
                log::warn!("ignoring palette {text:?}: {e}");
                None
            }
        }
    }
}

/// Answers one lookup exactly once. Dropped unanswered (the source
/// panicked), it reports "no palette" so the request still completes.
struct Reply(Option<Sender<Option<Palette>>>);

impl Reply {
    fn send(mut self, palette: Option<Palette>) {
        if let Some(tx) = self.0.take() {
            // The fetcher may already be gone; nothing to deliver to then.
            let _ = tx.send(palette);
        }
    }
}

impl Drop for Reply {
    fn drop(&mut self) {
        if let Some(tx) = self.0.take() {
            let _ = tx.send(None);
        }
    }
}

/// Runs palette lookups off the frame thread.
pub struct PaletteFetcher {
    source: Arc<dyn PaletteSource>,
    tx: Sender<Option<Palette>>,
    rx: Receiver<Option<Palette>>,
    in_flight: usize,
}

impl PaletteFetcher {
    pub fn new(source: impl PaletteSource + 'static) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source: Arc::new(source),
            tx,
            rx,
            in_flight: 0,
        }
    }

    /// Starts a lookup for `text` on a new worker thread.
    pub fn request(&mut self, text: impl Into<String>) {
        let text = text.into();
        let source = Arc::clone(&self.source);
        let reply = Reply(Some(self.tx.clone()));
        // Counted up front: a closure that never runs still drops its reply.
        self.in_flight += 1;

        let spawned = thread::Builder::new()
            .name("palette-fetch".into())
            .spawn(move || {
                let palette = source.palette_for(&text);
                reply.send(palette);
            });

        if let Err(e) = spawned {
            log::warn!("could not start palette lookup: {e}");
        }
    }

    /// Drains finished lookups without blocking.
    ///
    /// ### Returns
    /// The most recently delivered palette, or `None` if nothing usable
    /// arrived since the last poll.
    pub fn poll(&mut self) -> Option<Palette> {
        let mut latest = None;
        loop {
            match self.rx.try_recv() {
                Ok(result) => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    if result.is_some() {
                        latest = result;
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        latest
    }

    /// `true` while at least one lookup has not reported back.
    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }
}
