use std::collections::BTreeMap;

use rand::Rng;

use crate::error::Result;
use crate::geometry::Geometry;
use crate::mesh::{ColorIndex, TriangleId};
use crate::progress::{NoProgress, ProgressIndicator};
use crate::segmentation::{
    SdfParams, SemiautomaticCriterion, SemiautomaticParams, SemiautomaticSegmentation, Segmentation,
    SegmentationResult,
};

use super::{Overlay, Tool, ToolId, ToolInput};

/// Automatic segmentation; pressing on the model paints the segments.
#[derive(Debug, Default)]
pub struct SegmentationTool {
    segmentation: Segmentation,
    sdf: SdfParams,
    result: Option<SegmentationResult>,
    hovered: Option<TriangleId>,
}

impl SegmentationTool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_segmentation(mut self, segmentation: Segmentation) -> Self {
        self.segmentation = segmentation;
        self
    }

    #[must_use]
    pub fn with_sdf_params(mut self, params: SdfParams) -> Self {
        self.sdf = params;
        self
    }

    /// Last computed segmentation.
    #[must_use]
    pub fn result(&self) -> Option<&SegmentationResult> {
        self.result.as_ref()
    }

    /// Segments the geometry, computing SDF values first if they are missing.
    ///
    /// # Errors
    ///
    /// Propagates SDF and segmentation errors, including cancellation.
    pub fn compute(
        &mut self,
        geometry: &mut Geometry,
        progress: &dyn ProgressIndicator,
    ) -> Result<&SegmentationResult> {
        if !geometry.has_sdf() {
            geometry.compute_sdf(&self.sdf, progress)?;
        }
        Ok(self.result.insert(self.segmentation.execute_with_progress(geometry, progress)?))
    }

    /// Paints the segments with generated colors as one undo step.
    ///
    /// # Errors
    ///
    /// See [`compute`](Self::compute).
    pub fn apply<R: Rng>(&mut self, geometry: &mut Geometry, rng: &mut R) -> Result<()> {
        let current = matches!(
            &self.result,
            Some(result) if result.assignments().len() == geometry.triangle_count()
        );
        if !current {
            self.compute(geometry, &NoProgress)?;
        }
        let Some(result) = &self.result else {
            return Ok(());
        };
        geometry.execute(result.to_command(rng))
    }
}

impl Tool for SegmentationTool {
    fn id(&self) -> ToolId {
        ToolId::Segmentation
    }

    fn on_deactivate(&mut self, _geometry: &mut Geometry) {
        self.hovered = None;
    }

    fn draw_overlay(&self, _geometry: &Geometry) -> Overlay {
        let Some(result) = &self.result else {
            return Overlay::default();
        };
        let triangles = self
            .hovered
            .and_then(|id| result.assignments().get(id.0).copied())
            .map(|segment| {
                result
                    .assignments()
                    .iter()
                    .enumerate()
                    .filter(|(_, &s)| s == segment)
                    .map(|(index, _)| TriangleId(index))
                    .collect()
            })
            .unwrap_or_default();
        Overlay {
            triangles,
            circle: None,
            label: Some(format!("{} segments", result.segment_count())),
        }
    }

    fn handle_input(&mut self, geometry: &mut Geometry, input: &ToolInput) -> Result<()> {
        match input {
            ToolInput::Hover(ray) => {
                self.hovered = geometry.cast_ray(ray).map(|hit| hit.triangle);
                Ok(())
            }
            ToolInput::Press(ray) => {
                if geometry.cast_ray(ray).is_none() {
                    return Ok(());
                }
                self.apply(geometry, &mut rand::rng())
            }
            ToolInput::Drag(_) | ToolInput::Release => Ok(()),
        }
    }
}

/// Seeds placed by pressing on the model spread over it; [`apply`](Self::apply)
/// paints the grown regions.
#[derive(Debug, Default)]
pub struct SemiautomaticTool {
    segmentation: SemiautomaticSegmentation,
    color: ColorIndex,
    sdf: SdfParams,
    preview: BTreeMap<ColorIndex, Vec<TriangleId>>,
}

impl SemiautomaticTool {
    #[must_use]
    pub fn new(color: ColorIndex) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: SemiautomaticParams) -> Self {
        self.segmentation = self.segmentation.with_params(params);
        self
    }

    /// Color given to the next seed.
    pub fn set_color(&mut self, color: ColorIndex) {
        self.color = color;
    }

    #[must_use]
    pub fn preview(&self) -> &BTreeMap<ColorIndex, Vec<TriangleId>> {
        &self.preview
    }

    /// Changes the spread tolerance and regrows the seeds.
    ///
    /// # Errors
    ///
    /// See [`SemiautomaticSegmentation::spread`].
    pub fn set_spread(&mut self, geometry: &Geometry, spread: f64) -> Result<()> {
        let params = self.segmentation.params().with_spread(spread);
        self.segmentation.set_params(params);
        self.preview = self.segmentation.spread(geometry)?;
        Ok(())
    }

    /// Paints the previewed regions as one undo step and clears the seeds.
    ///
    /// # Errors
    ///
    /// See [`SemiautomaticSegmentation::spread`].
    pub fn apply(&mut self, geometry: &mut Geometry) -> Result<()> {
        if self.segmentation.seeds().is_empty() {
            return Ok(());
        }
        geometry.execute(self.segmentation.spread_command(geometry)?)?;
        self.segmentation.clear();
        self.preview.clear();
        Ok(())
    }
}

impl Tool for SemiautomaticTool {
    fn id(&self) -> ToolId {
        ToolId::Semiautomatic
    }

    fn on_deactivate(&mut self, _geometry: &mut Geometry) {
        self.segmentation.clear();
        self.preview.clear();
    }

    fn draw_overlay(&self, _geometry: &Geometry) -> Overlay {
        Overlay {
            triangles: self.preview.values().flatten().copied().collect(),
            circle: None,
            label: Some(format!("{} seeds", self.segmentation.seeds().len())),
        }
    }

    fn handle_input(&mut self, geometry: &mut Geometry, input: &ToolInput) -> Result<()> {
        let ToolInput::Press(ray) = input else {
            return Ok(());
        };
        let Some(hit) = geometry.cast_ray(ray) else {
            return Ok(());
        };
        let by_sdf = self.segmentation.params().criterion == SemiautomaticCriterion::Sdf;
        if by_sdf && !geometry.has_sdf() {
            geometry.compute_sdf(&self.sdf, &NoProgress)?;
        }
        self.segmentation.add_seed(geometry, hit.triangle, self.color)?;
        self.preview = self.segmentation.spread(geometry)?;
        Ok(())
    }
}
