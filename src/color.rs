//! Color palette referenced by triangle color indices.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{GeometryError, Result};
use crate::mesh::ColorIndex;

/// Maximal number of colors a palette can hold.
pub const MAX_PALETTE_COLORS: usize = 16;

/// Colors of a freshly created palette.
pub const DEFAULT_PALETTE: [u32; 4] = [0x0001_7BDA, 0x00EB_5757, 0x00F2_994A, 0x0029_2E33];

/// RGBA color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    /// Creates a color from its components.
    #[must_use]
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from a `0xRRGGBB` value.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| f32::from(((hex >> shift) & 0xFF) as u8) / 255.0;
        Self::new(channel(16), channel(8), channel(0), 1.0)
    }

    /// Opaque color from hue, saturation and value, all in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_hsv(hue: f32, saturation: f32, value: f32) -> Self {
        let h = hue.rem_euclid(1.0) * 6.0;
        let sector = h.floor();
        let f = h - sector;
        let p = value * (1.0 - saturation);
        let q = value * (1.0 - saturation * f);
        let t = value * (1.0 - saturation * (1.0 - f));
        let (r, g, b) = match sector as u32 % 6 {
            0 => (value, t, p),
            1 => (q, value, p),
            2 => (p, value, t),
            3 => (p, q, value),
            4 => (t, p, value),
            _ => (value, p, q),
        };
        Self::new(r, g, b, 1.0)
    }
}

/// Ordered palette of colors and the currently active color.
///
/// The palette is never empty once constructed through [`ColorManager::new`],
/// [`ColorManager::with_colors`] or [`ColorManager::generated`] with a
/// non-zero count, and holds at most [`MAX_PALETTE_COLORS`] entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorManager {
    colors: Vec<Rgba>,
    active: ColorIndex,
}

impl Default for ColorManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorManager {
    /// Palette with the four default colors.
    #[must_use]
    pub fn new() -> Self {
        Self {
            colors: DEFAULT_PALETTE.iter().map(|&hex| Rgba::from_hex(hex)).collect(),
            active: 0,
        }
    }

    /// Palette with the given colors, trimmed to [`MAX_PALETTE_COLORS`].
    #[must_use]
    pub fn with_colors(colors: impl IntoIterator<Item = Rgba>) -> Self {
        Self {
            colors: colors.into_iter().take(MAX_PALETTE_COLORS).collect(),
            active: 0,
        }
    }

    /// Palette with `count` generated colors.
    #[must_use]
    pub fn generated<R: Rng>(count: usize, rng: &mut R) -> Self {
        Self::with_colors(Self::generate_colors(count, rng))
    }

    /// Returns the color at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidColorIndex`] if `index` is outside the palette.
    pub fn color(&self, index: ColorIndex) -> Result<Rgba> {
        self.colors.get(index).copied().ok_or_else(|| {
            GeometryError::InvalidColorIndex {
                index,
                len: self.colors.len(),
            }
            .into()
        })
    }

    /// All colors in palette order.
    #[must_use]
    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }

    /// Number of colors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Returns `true` if the palette holds no colors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Checks that `index` refers to a palette entry.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidColorIndex`] otherwise.
    pub fn check_index(&self, index: ColorIndex) -> Result<()> {
        self.color(index).map(|_| ())
    }

    /// Appends a color.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::PaletteFull`] if the palette is at its limit.
    pub fn add_color(&mut self, color: Rgba) -> Result<ColorIndex> {
        if self.colors.len() >= MAX_PALETTE_COLORS {
            return Err(GeometryError::PaletteFull {
                max: MAX_PALETTE_COLORS,
            }
            .into());
        }
        self.colors.push(color);
        Ok(self.colors.len() - 1)
    }

    /// Replaces the color at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidColorIndex`] if `index` is outside the palette.
    pub fn set_color(&mut self, index: ColorIndex, color: Rgba) -> Result<()> {
        self.check_index(index)?;
        self.colors[index] = color;
        Ok(())
    }

    /// Removes the color at `index` and returns it.
    ///
    /// # Errors
    ///
    /// - [`GeometryError::InvalidColorIndex`] if `index` is outside the palette.
    /// - [`GeometryError::EmptyPalette`] if it is the last remaining color.
    pub fn remove_color(&mut self, index: ColorIndex) -> Result<Rgba> {
        self.check_index(index)?;
        if self.colors.len() == 1 {
            return Err(GeometryError::EmptyPalette.into());
        }
        let removed = self.colors.remove(index);
        self.clamp_active();
        Ok(removed)
    }

    /// Exchanges two palette entries.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidColorIndex`] if either index is outside the palette.
    pub fn swap_colors(&mut self, a: ColorIndex, b: ColorIndex) -> Result<()> {
        self.check_index(a)?;
        self.check_index(b)?;
        self.colors.swap(a, b);
        Ok(())
    }

    /// Replaces all colors, trimming to [`MAX_PALETTE_COLORS`].
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::EmptyPalette`] if `colors` is empty.
    pub fn replace_colors(&mut self, colors: impl IntoIterator<Item = Rgba>) -> Result<()> {
        let colors: Vec<Rgba> = colors.into_iter().take(MAX_PALETTE_COLORS).collect();
        if colors.is_empty() {
            return Err(GeometryError::EmptyPalette.into());
        }
        self.colors = colors;
        self.clamp_active();
        Ok(())
    }

    /// Index of the currently active color.
    #[must_use]
    pub fn active_color_index(&self) -> ColorIndex {
        self.active
    }

    /// Sets the active color, clamping to the last palette entry.
    pub fn set_active_color_index(&mut self, index: ColorIndex) {
        self.active = index.min(self.colors.len().saturating_sub(1));
    }

    /// The currently active color.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidColorIndex`] if the palette is empty.
    pub fn active_color(&self) -> Result<Rgba> {
        self.color(self.active)
    }

    fn clamp_active(&mut self) {
        self.set_active_color_index(self.active);
    }

    /// Generates `count` well-separated colors.
    ///
    /// Hues start at a random offset and spread over 70% of the hue circle;
    /// values are drawn from `[0.6, 1.0)` at full saturation.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn generate_colors<R: Rng>(count: usize, rng: &mut R) -> Vec<Rgba> {
        let start: f32 = rng.random_range(0.0..1.0);
        (0..count)
            .map(|i| {
                let hue = (start + i as f32 / count as f32 * 0.7).fract();
                let value: f32 = rng.random_range(0.6..1.0);
                Rgba::from_hsv(hue, 1.0, value)
            })
            .collect()
    }

    /// A single random opaque color.
    #[must_use]
    pub fn random_color<R: Rng>(rng: &mut R) -> Rgba {
        Rgba::new(rng.random(), rng.random(), rng.random(), 1.0)
    }
}
