use crate::error::Result;
use crate::geometry::{BucketSettings, ColorStopping, Geometry, GeometryCommand, StoppingCriterion};
use crate::mesh::{ColorIndex, TriangleId};

use super::{Overlay, Tool, ToolId, ToolInput};

/// Flood-fills the region around the clicked triangle.
///
/// Hovering previews the region the fill would paint.
#[derive(Debug)]
pub struct PaintBucket {
    color: ColorIndex,
    criterion: Box<dyn StoppingCriterion>,
    preview: Vec<TriangleId>,
}

impl PaintBucket {
    /// Same-color bucket painting `color`.
    #[must_use]
    pub fn new(color: ColorIndex) -> Self {
        Self {
            color,
            criterion: Box::new(ColorStopping),
            preview: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_criterion(mut self, criterion: Box<dyn StoppingCriterion>) -> Self {
        self.criterion = criterion;
        self
    }

    #[must_use]
    pub fn with_settings(self, settings: &BucketSettings) -> Self {
        self.with_criterion(settings.criterion())
    }

    pub fn set_color(&mut self, color: ColorIndex) {
        self.color = color;
    }

    /// Triangles the fill from `seed` reaches.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidTriangleId`](crate::error::GeometryError::InvalidTriangleId)
    /// if `seed` is unknown.
    pub fn fill(&self, geometry: &Geometry, seed: TriangleId) -> Result<Vec<TriangleId>> {
        geometry.bucket(seed, self.criterion.as_ref())
    }

    /// Command painting the fill from `seed`.
    ///
    /// # Errors
    ///
    /// See [`fill`](Self::fill).
    pub fn fill_command(&self, geometry: &Geometry, seed: TriangleId) -> Result<GeometryCommand> {
        Ok(GeometryCommand::PaintRegion {
            triangles: self.fill(geometry, seed)?,
            color: self.color,
        })
    }
}

impl Tool for PaintBucket {
    fn id(&self) -> ToolId {
        ToolId::PaintBucket
    }

    fn on_deactivate(&mut self, _geometry: &mut Geometry) {
        self.preview.clear();
    }

    fn draw_overlay(&self, _geometry: &Geometry) -> Overlay {
        Overlay {
            triangles: self.preview.clone(),
            ..Overlay::default()
        }
    }

    fn handle_input(&mut self, geometry: &mut Geometry, input: &ToolInput) -> Result<()> {
        match input {
            ToolInput::Hover(ray) => {
                self.preview = match geometry.cast_ray(ray) {
                    Some(hit) => self.fill(geometry, hit.triangle)?,
                    None => Vec::new(),
                };
                Ok(())
            }
            ToolInput::Press(ray) => {
                let Some(hit) = geometry.cast_ray(ray) else {
                    return Ok(());
                };
                let command = self.fill_command(geometry, hit.triangle)?;
                self.preview.clear();
                geometry.execute(command)
            }
            ToolInput::Drag(_) | ToolInput::Release => Ok(()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::NormalStopping;
    use crate::math::{Point3, Ray, Vector3};
    use crate::mesh::fixtures;

    #[test]
    fn fill_follows_the_criterion() {
        let mut g = Geometry::from_triangles(fixtures::cube()).unwrap();
        g.paint_triangle(TriangleId(1), 1).unwrap();

        let by_color = PaintBucket::new(2);
        assert_eq!(by_color.fill(&g, TriangleId(1)).unwrap(), vec![TriangleId(1)]);

        let by_normal = PaintBucket::new(2).with_criterion(Box::new(NormalStopping::new(10.0)));
        let mut face = by_normal.fill(&g, TriangleId(1)).unwrap();
        face.sort();
        assert_eq!(face, vec![TriangleId(0), TriangleId(1)]);

        let settings = BucketSettings {
            by_color: false,
            by_normal: None,
        };
        let everything = PaintBucket::new(2).with_settings(&settings);
        assert_eq!(everything.fill(&g, TriangleId(1)).unwrap().len(), 12);
    }

    #[test]
    fn hover_previews_and_press_paints() {
        let mut g = Geometry::from_triangles(fixtures::cube()).unwrap();
        let mut bucket = PaintBucket::new(3).with_criterion(Box::new(NormalStopping::new(10.0)));
        // Straight down onto the top face (triangles 2 and 3).
        let ray = Ray::new(Point3::new(0.3, 0.6, 4.0), -Vector3::z());

        bucket.handle_input(&mut g, &ToolInput::Hover(ray)).unwrap();
        let mut preview = bucket.draw_overlay(&g).triangles;
        preview.sort();
        assert_eq!(preview, vec![TriangleId(2), TriangleId(3)]);
        assert!(!g.can_undo());

        bucket.handle_input(&mut g, &ToolInput::Press(ray)).unwrap();
        assert_eq!(g.triangle_color(TriangleId(2)).unwrap(), 3);
        assert_eq!(g.triangle_color(TriangleId(3)).unwrap(), 3);
        assert_eq!(g.triangle_color(TriangleId(0)).unwrap(), 0);
        assert!(bucket.draw_overlay(&g).is_empty());
    }
}
