//! Interactive tools translating pointer input into geometry commands.
//!
//! Every tool implements the [`Tool`] capability interface. A
//! [`ToolRegistry`] owns the tools, keeps at most one of them active and
//! routes input to it.

mod brush;
mod bucket;
mod painter;
mod segmentation;
mod text;

pub use brush::BrushTool;
pub use bucket::PaintBucket;
pub use painter::TrianglePainter;
pub use segmentation::{SegmentationTool, SemiautomaticTool};
pub use text::{GlyphSource, GlyphTriangles, TextStamp};

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::error::Result;
use crate::geometry::Geometry;
use crate::math::{Point3, Ray};
use crate::mesh::TriangleId;

/// Identity of a tool in the [`ToolRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ToolId {
    TrianglePainter,
    PaintBucket,
    Brush,
    TextStamp,
    Segmentation,
    Semiautomatic,
}

/// Pointer input expressed as rays into the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolInput {
    /// Pointer moved without a pressed button.
    Hover(Ray),
    /// Button pressed.
    Press(Ray),
    /// Pointer moved with the button held.
    Drag(Ray),
    /// Button released.
    Release,
}

/// What a tool wants drawn on top of the model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    /// Triangles to highlight.
    pub triangles: Vec<TriangleId>,
    /// Brush outline as center and radius.
    pub circle: Option<(Point3, f64)>,
    /// Status text.
    pub label: Option<String>,
}

impl Overlay {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty() && self.circle.is_none() && self.label.is_none()
    }
}

/// Capability interface of an interactive tool.
pub trait Tool: fmt::Debug + Send {
    fn id(&self) -> ToolId;

    /// Called when the tool becomes the active one.
    fn on_activate(&mut self, _geometry: &mut Geometry) {}

    /// Called when another tool takes over; drop transient state here.
    fn on_deactivate(&mut self, _geometry: &mut Geometry) {}

    /// Overlay for the current tool state.
    fn draw_overlay(&self, _geometry: &Geometry) -> Overlay {
        Overlay::default()
    }

    /// Reacts to pointer input, issuing commands against `geometry`.
    ///
    /// # Errors
    ///
    /// Propagates errors of the commands the tool executes.
    fn handle_input(&mut self, geometry: &mut Geometry, input: &ToolInput) -> Result<()>;
}

/// Tools keyed by [`ToolId`], at most one active.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<ToolId, Box<dyn Tool>>,
    active: Option<ToolId>,
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool, returning the one it replaces.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Option<Box<dyn Tool>> {
        self.tools.insert(tool.id(), tool)
    }

    #[must_use]
    pub fn contains(&self, id: ToolId) -> bool {
        self.tools.contains_key(&id)
    }

    #[must_use]
    pub fn ids(&self) -> Vec<ToolId> {
        self.tools.keys().copied().collect()
    }

    #[must_use]
    pub fn active_id(&self) -> Option<ToolId> {
        self.active
    }

    #[must_use]
    pub fn get(&self, id: ToolId) -> Option<&dyn Tool> {
        self.tools.get(&id).map(AsRef::as_ref)
    }

    pub fn get_mut(&mut self, id: ToolId) -> Option<&mut (dyn Tool + 'static)> {
        self.tools.get_mut(&id).map(AsMut::as_mut)
    }

    /// Makes `id` the active tool, deactivating the previous one.
    ///
    /// Returns `false` if no such tool is registered.
    pub fn activate(&mut self, id: ToolId, geometry: &mut Geometry) -> bool {
        if !self.tools.contains_key(&id) {
            return false;
        }
        if self.active == Some(id) {
            return true;
        }
        self.deactivate(geometry);
        if let Some(tool) = self.tools.get_mut(&id) {
            tool.on_activate(geometry);
            self.active = Some(id);
            debug!(tool = ?id, "tool activated");
        }
        true
    }

    /// Deactivates the active tool, if any.
    pub fn deactivate(&mut self, geometry: &mut Geometry) {
        if let Some(id) = self.active.take() {
            if let Some(tool) = self.tools.get_mut(&id) {
                tool.on_deactivate(geometry);
                debug!(tool = ?id, "tool deactivated");
            }
        }
    }

    /// Routes input to the active tool. Without an active tool this is a no-op.
    ///
    /// # Errors
    ///
    /// Propagates the active tool's error.
    pub fn handle_input(&mut self, geometry: &mut Geometry, input: &ToolInput) -> Result<()> {
        match self.active.and_then(|id| self.tools.get_mut(&id)) {
            Some(tool) => tool.handle_input(geometry, input),
            None => Ok(()),
        }
    }

    /// Overlay of the active tool.
    #[must_use]
    pub fn draw_overlay(&self, geometry: &Geometry) -> Overlay {
        self.active
            .and_then(|id| self.tools.get(&id))
            .map_or_else(Overlay::default, |tool| tool.draw_overlay(geometry))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::BrushSettings;
    use crate::math::Vector3;
    use crate::mesh::fixtures;

    fn down_at(x: f64, y: f64) -> Ray {
        Ray::new(Point3::new(x, y, 5.0), -Vector3::z())
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(TrianglePainter::new(1)));
        registry.register(Box::new(PaintBucket::new(2)));
        registry.register(Box::new(BrushTool::new(BrushSettings::new(3, 0.2))));
        registry
    }

    #[test]
    fn input_goes_to_the_active_tool_only() {
        let mut g = Geometry::from_triangles(fixtures::grid(2)).unwrap();
        let mut registry = registry();
        registry.handle_input(&mut g, &ToolInput::Press(down_at(0.7, 0.2))).unwrap();
        assert!(!g.can_undo());

        assert!(registry.activate(ToolId::TrianglePainter, &mut g));
        registry.handle_input(&mut g, &ToolInput::Press(down_at(0.7, 0.2))).unwrap();
        assert_eq!(g.triangle_color(TriangleId(0)).unwrap(), 1);
        assert_eq!(g.triangle_color(TriangleId(1)).unwrap(), 0);

        assert!(registry.activate(ToolId::PaintBucket, &mut g));
        registry.handle_input(&mut g, &ToolInput::Press(down_at(1.2, 1.7))).unwrap();
        assert_eq!(g.triangle_color(TriangleId(0)).unwrap(), 1);
        assert_eq!(g.triangle_color(TriangleId(7)).unwrap(), 2);
        assert_eq!(g.history().undo_len(), 2);
    }

    #[test]
    fn unknown_tool_is_not_activated() {
        let mut g = Geometry::from_triangles(fixtures::grid(2)).unwrap();
        let mut registry = registry();
        assert!(!registry.activate(ToolId::TextStamp, &mut g));
        assert_eq!(registry.active_id(), None);
        assert_eq!(registry.ids().len(), 3);
        assert!(registry.draw_overlay(&g).is_empty());
    }

    #[test]
    fn switching_tools_clears_the_brush_highlight() {
        let mut g = Geometry::from_triangles(fixtures::grid(2)).unwrap();
        let mut registry = registry();
        registry.activate(ToolId::Brush, &mut g);
        registry.handle_input(&mut g, &ToolInput::Hover(down_at(1.0, 1.0))).unwrap();
        assert!(!g.highlight().is_empty());
        assert!(registry.draw_overlay(&g).circle.is_some());

        registry.activate(ToolId::PaintBucket, &mut g);
        assert!(g.highlight().is_empty());
        assert_eq!(registry.active_id(), Some(ToolId::PaintBucket));
    }
}
