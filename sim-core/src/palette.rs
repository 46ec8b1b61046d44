//! Particle colors.
//!
//! A [`Palette`] is never empty: an empty input falls back to a fixed
//! pastel set. Spawned particles pick a palette entry uniformly and store
//! its boosted ("vivid") version for their whole life.

use rand::Rng;
use serde::Deserialize;

use crate::error::{Result, SimError};

/// An 8-bit RGB triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` or `rrggbb` (case-insensitive).
    pub fn from_hex(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SimError::InvalidColor(text.to_owned()));
        }

        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| SimError::InvalidColor(text.to_owned()))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Boosts saturation around the channel minimum, then brightness, and
/// clamps the result to `[0, 255]`.
///
/// Grey inputs (all channels equal) skip the saturation step.
pub fn vivid(color: Rgb, saturation_boost: f32, brightness_boost: f32) -> [f32; 3] {
    let mut c = [color.r as f32, color.g as f32, color.b as f32];
    let max = c[0].max(c[1]).max(c[2]);
    let min = c[0].min(c[1]).min(c[2]);

    if max > min {
        for v in &mut c {
            *v = min + (*v - min) * saturation_boost;
        }
    }
    for v in &mut c {
        *v = (*v * brightness_boost).clamp(0.0, 255.0);
    }
    c
}

const DEFAULT_COLORS: [Rgb; 7] = [
    Rgb::new(0xff, 0x99, 0x99),
    Rgb::new(0xff, 0xc9, 0x99),
    Rgb::new(0xff, 0xf9, 0x99),
    Rgb::new(0xc9, 0xff, 0x99),
    Rgb::new(0x99, 0xff, 0xc9),
    Rgb::new(0x99, 0xc9, 0xff),
    Rgb::new(0xc9, 0x99, 0xff),
];

/// Ordered, non-empty color sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    /// Wraps `colors`, falling back to the default set when it is empty.
    pub fn new(colors: Vec<Rgb>) -> Self {
        if colors.is_empty() {
            Self::default()
        } else {
            Self { colors }
        }
    }

    /// Parses a sequence of hex strings. Any malformed entry rejects the whole palette.
    pub fn from_hex<I, S>(colors: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let colors = colors
            .into_iter()
            .map(|c| Rgb::from_hex(c.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(colors))
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Picks an entry uniformly at random.
    pub fn pick(&self, rng: &mut impl Rng) -> Rgb {
        self.colors[rng.random_range(0..self.colors.len())]
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_COLORS.to_vec(),
        }
    }
}

/// JSON reply of the text-to-palette service.
///
/// Only `colors` matters to the core; other keys of the reply are ignored.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PaletteResponse {
    #[serde(default)]
    pub colors: Option<Vec<String>>,
}

impl PaletteResponse {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Converts the reply into a palette.
    ///
    /// ### Returns
    /// `None` when the reply carries no colors or any color is malformed,
    /// meaning "keep the current palette".
    pub fn into_palette(self) -> Option<Palette> {
        let colors = self.colors.filter(|c| !c.is_empty())?;
        match Palette::from_hex(&colors) {
            Ok(p) => Some(p),
            Err(e) => {
                log::warn!("ignoring palette reply: {e}");
                None
            }
        }
    }
}
