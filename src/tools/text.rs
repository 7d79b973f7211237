use std::fmt;
use std::sync::Arc;

use crate::error::{ImportError, Result};
use crate::geometry::{Geometry, GeometryCommand, LetterTriangles};
use crate::math::distance_3d::orthonormal_basis;
use crate::math::{Point2, Ray};
use crate::mesh::{ColorIndex, TriangleId};
use crate::progress::AtomicProgress;

use super::{Overlay, Tool, ToolId, ToolInput};

/// Triangles of one glyph in em units, baseline at `y = 0`.
pub type GlyphTriangles = Vec<[Point2; 3]>;

/// Rasterized glyphs provided by the host application.
pub trait GlyphSource: fmt::Debug + Send + Sync {
    /// Triangles of `c`, or `None` if the font has no such glyph.
    fn glyph(&self, c: char) -> Option<GlyphTriangles>;

    /// Horizontal advance after `c`, in em units.
    fn advance(&self, _c: char) -> f64 {
        1.0
    }
}

/// Stamps a line of text centered on the clicked point.
#[derive(Debug)]
pub struct TextStamp {
    glyphs: Box<dyn GlyphSource>,
    text: String,
    color: ColorIndex,
    size: f64,
    progress: Option<Arc<AtomicProgress>>,
    hovered: Option<TriangleId>,
}

impl TextStamp {
    #[must_use]
    pub fn new(glyphs: Box<dyn GlyphSource>, color: ColorIndex) -> Self {
        Self {
            glyphs,
            text: String::new(),
            color,
            size: 0.1,
            progress: None,
            hovered: None,
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Sets the em size in model units.
    #[must_use]
    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    /// Shares a progress with the stamp commands, for reporting and cancellation.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<AtomicProgress>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// World-space letter triangles in the plane through the ray origin,
    /// orthogonal to the ray.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::AssetNotFound`] if a non-whitespace character has
    /// no glyph.
    pub fn letters(&self, ray: &Ray) -> Result<Vec<LetterTriangles>> {
        let ray = ray.normalized();
        let (u, v) = orthonormal_basis(&ray.direction);
        let width: f64 = self.text.chars().map(|c| self.glyphs.advance(c)).sum::<f64>() * self.size;

        let mut pen = -width / 2.0;
        let baseline = -self.size / 2.0;
        let mut letters = Vec::new();
        for c in self.text.chars() {
            if !c.is_whitespace() {
                let glyph = self
                    .glyphs
                    .glyph(c)
                    .ok_or_else(|| ImportError::AssetNotFound(format!("glyph {c:?}")))?;
                let place = |p: &Point2| {
                    ray.origin + u * (pen + p.x * self.size) + v * (baseline + p.y * self.size)
                };
                letters.push(
                    glyph
                        .iter()
                        .map(|t| [place(&t[0]), place(&t[1]), place(&t[2])])
                        .collect(),
                );
            }
            pen += self.glyphs.advance(c) * self.size;
        }
        Ok(letters)
    }

    /// Command stamping the text along `ray`.
    ///
    /// # Errors
    ///
    /// See [`letters`](Self::letters).
    pub fn stamp_command(&self, ray: &Ray) -> Result<GeometryCommand> {
        Ok(GeometryCommand::PaintText {
            ray: *ray,
            letters: self.letters(ray)?,
            color: self.color,
            progress: self.progress.clone(),
        })
    }
}

impl Tool for TextStamp {
    fn id(&self) -> ToolId {
        ToolId::TextStamp
    }

    fn on_deactivate(&mut self, _geometry: &mut Geometry) {
        self.hovered = None;
    }

    fn draw_overlay(&self, _geometry: &Geometry) -> Overlay {
        Overlay {
            triangles: self.hovered.into_iter().collect(),
            circle: None,
            label: (!self.text.is_empty()).then(|| self.text.clone()),
        }
    }

    fn handle_input(&mut self, geometry: &mut Geometry, input: &ToolInput) -> Result<()> {
        match input {
            ToolInput::Hover(ray) => {
                self.hovered = geometry.cast_ray(ray).map(|hit| hit.triangle);
                Ok(())
            }
            ToolInput::Press(ray) => {
                if self.text.trim().is_empty() || geometry.cast_ray(ray).is_none() {
                    return Ok(());
                }
                geometry.execute(self.stamp_command(ray)?)
            }
            ToolInput::Drag(_) | ToolInput::Release => Ok(()),
        }
    }
}
