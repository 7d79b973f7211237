use crate::error::Result;
use crate::geometry::{Geometry, GeometryCommand};
use crate::mesh::{ColorIndex, DetailedTriangleId};

use super::{Overlay, Tool, ToolId, ToolInput};

/// Paints the triangle, or sub-triangle, under the pointer.
#[derive(Debug, Clone, Default)]
pub struct TrianglePainter {
    color: ColorIndex,
    hovered: Option<DetailedTriangleId>,
}

impl TrianglePainter {
    #[must_use]
    pub fn new(color: ColorIndex) -> Self {
        Self { color, hovered: None }
    }

    #[must_use]
    pub fn color(&self) -> ColorIndex {
        self.color
    }

    pub fn set_color(&mut self, color: ColorIndex) {
        self.color = color;
    }
}

impl Tool for TrianglePainter {
    fn id(&self) -> ToolId {
        ToolId::TrianglePainter
    }

    fn on_deactivate(&mut self, _geometry: &mut Geometry) {
        self.hovered = None;
    }

    fn draw_overlay(&self, _geometry: &Geometry) -> Overlay {
        Overlay {
            triangles: self.hovered.map(|id| id.base).into_iter().collect(),
            ..Overlay::default()
        }
    }

    fn handle_input(&mut self, geometry: &mut Geometry, input: &ToolInput) -> Result<()> {
        match input {
            ToolInput::Hover(ray) => {
                self.hovered = geometry.cast_ray_detailed(ray).map(|(id, _)| id);
                Ok(())
            }
            ToolInput::Press(ray) | ToolInput::Drag(ray) => {
                let Some((id, _)) = geometry.cast_ray_detailed(ray) else {
                    return Ok(());
                };
                self.hovered = Some(id);
                // Repainting with the same color would only add an empty undo step.
                if geometry.detailed_color(id)? == self.color {
                    return Ok(());
                }
                geometry.execute(GeometryCommand::PaintTriangle {
                    triangle: id,
                    color: self.color,
                })
            }
            ToolInput::Release => Ok(()),
        }
    }
}
