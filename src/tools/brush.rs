use crate::error::Result;
use crate::geometry::{BrushSettings, Geometry, GeometryCommand};
use crate::math::Ray;

use super::{Overlay, Tool, ToolId, ToolInput};

/// Paints brush strokes; a whole stroke is one undo step.
#[derive(Debug, Clone, Default)]
pub struct BrushTool {
    settings: BrushSettings,
    last_stamp: Option<Ray>,
}

impl BrushTool {
    #[must_use]
    pub fn new(settings: BrushSettings) -> Self {
        Self {
            settings,
            last_stamp: None,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &BrushSettings {
        &self.settings
    }

    /// Changes the brush; an ongoing stroke ends.
    pub fn set_settings(&mut self, settings: BrushSettings) {
        self.settings = settings;
        self.last_stamp = None;
    }

    #[must_use]
    pub fn is_stroking(&self) -> bool {
        self.last_stamp.is_some()
    }
}

impl Tool for BrushTool {
    fn id(&self) -> ToolId {
        ToolId::Brush
    }

    fn on_deactivate(&mut self, geometry: &mut Geometry) {
        self.last_stamp = None;
        geometry.clear_highlight();
    }

    fn draw_overlay(&self, geometry: &Geometry) -> Overlay {
        let highlight = geometry.highlight();
        Overlay {
            triangles: highlight.triangles.clone(),
            circle: highlight.center.map(|center| (center, highlight.radius)),
            label: None,
        }
    }

    fn handle_input(&mut self, geometry: &mut Geometry, input: &ToolInput) -> Result<()> {
        match input {
            ToolInput::Hover(ray) => {
                geometry.highlight_area(ray, &self.settings);
                Ok(())
            }
            ToolInput::Press(ray) => {
                geometry.highlight_area(ray, &self.settings);
                self.last_stamp = Some(*ray);
                geometry.execute(GeometryCommand::PaintBrush {
                    strokes: vec![*ray],
                    settings: self.settings,
                })
            }
            ToolInput::Drag(ray) => {
                geometry.highlight_area(ray, &self.settings);
                // The previous stamp is repeated so a continuous brush fills the gap.
                let strokes = match self.last_stamp.replace(*ray) {
                    Some(previous) => vec![previous, *ray],
                    None => {
                        return geometry.execute(GeometryCommand::PaintBrush {
                            strokes: vec![*ray],
                            settings: self.settings,
                        })
                    }
                };
                geometry.execute_joined(GeometryCommand::PaintBrush {
                    strokes,
                    settings: self.settings,
                })
            }
            ToolInput::Release => {
                self.last_stamp = None;
                Ok(())
            }
        }
    }
}
