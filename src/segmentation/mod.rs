//! Automatic and seed-driven segmentation of the mesh into regions.
//!
//! [`Segmentation`] clusters the shape diameter function of every triangle
//! and splits the clusters into connected segments. [`SemiautomaticSegmentation`]
//! grows user-picked seeds over the adjacency graph.

mod clustering;
mod sdf;
mod semiautomatic;

pub use clustering::{ClusterCount, Clustering, ClusteringStrategy, KMeans1D};
pub use sdf::{compute_sdf, SdfParams};
pub use semiautomatic::{
    SdfStopping, SemiautomaticCriterion, SemiautomaticParams, SemiautomaticSegmentation,
};

use std::collections::BTreeMap;
use std::time::Instant;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::color::{ColorManager, MAX_PALETTE_COLORS};
use crate::error::{JobError, Result, SegmentationError};
use crate::geometry::{Geometry, GeometryCommand};
use crate::mesh::TriangleId;
use crate::progress::{NoProgress, ProgressIndicator};

/// Parameters of automatic segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentationParams {
    /// Number of SDF clusters.
    pub clusters: ClusterCount,
    /// Weight of label agreement between neighbours, `0` disables smoothing.
    pub smoothing_lambda: f64,
    /// Sweeps of the smoothing pass.
    pub smoothing_iterations: usize,
}

impl Default for SegmentationParams {
    fn default() -> Self {
        Self {
            clusters: ClusterCount::Fixed(5),
            smoothing_lambda: 0.26,
            smoothing_iterations: 5,
        }
    }
}

impl SegmentationParams {
    #[must_use]
    pub fn with_clusters(mut self, clusters: ClusterCount) -> Self {
        self.clusters = clusters;
        self
    }

    #[must_use]
    pub fn with_smoothing(mut self, lambda: f64) -> Self {
        self.smoothing_lambda = lambda;
        self
    }
}

/// Connected segments found by [`Segmentation::execute`].
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationResult {
    segment_of: Vec<usize>,
    segment_count: usize,
}

impl SegmentationResult {
    /// Number of segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    /// Segment of every triangle, indexed by triangle id.
    #[must_use]
    pub fn assignments(&self) -> &[usize] {
        &self.segment_of
    }

    /// Triangles of every segment.
    #[must_use]
    pub fn segments(&self) -> BTreeMap<usize, Vec<TriangleId>> {
        let mut segments: BTreeMap<usize, Vec<TriangleId>> = BTreeMap::new();
        for (index, &segment) in self.segment_of.iter().enumerate() {
            segments.entry(segment).or_default().push(TriangleId(index));
        }
        segments
    }

    /// Command painting every segment with its own generated color.
    #[must_use]
    pub fn to_command<R: Rng>(&self, rng: &mut R) -> GeometryCommand {
        GeometryCommand::PaintSegments {
            colors: ColorManager::generate_colors(self.segment_count, rng),
            assignments: self.segment_of.clone(),
        }
    }
}

/// SDF clustering followed by connected-component extraction.
#[derive(Debug)]
pub struct Segmentation {
    params: SegmentationParams,
    strategy: Box<dyn ClusteringStrategy>,
}

impl Default for Segmentation {
    fn default() -> Self {
        Self::new()
    }
}

impl Segmentation {
    /// Segmentation with default parameters and [`KMeans1D`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            params: SegmentationParams::default(),
            strategy: Box::new(KMeans1D::default()),
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: SegmentationParams) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: Box<dyn ClusteringStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn params(&self) -> &SegmentationParams {
        &self.params
    }

    /// Segments the geometry using its stored SDF values.
    ///
    /// # Errors
    ///
    /// - [`SegmentationError::SdfNotComputed`] if SDF values are missing.
    /// - [`SegmentationError::InvalidParameters`] for a zero cluster count or
    ///   a negative smoothing weight.
    /// - [`SegmentationError::TooManySegments`] if the segments do not fit the palette.
    pub fn execute(&self, geometry: &Geometry) -> Result<SegmentationResult> {
        self.execute_with_progress(geometry, &NoProgress)
    }

    /// [`execute`](Self::execute) reporting progress after clustering and
    /// after each smoothing sweep, polling for cancellation in between.
    ///
    /// # Errors
    ///
    /// As [`execute`](Self::execute), plus [`JobError::Cancelled`] if
    /// `progress` requested cancellation.
    pub fn execute_with_progress(
        &self,
        geometry: &Geometry,
        progress: &dyn ProgressIndicator,
    ) -> Result<SegmentationResult> {
        let start = Instant::now();
        let values = geometry.sdf_values().ok_or(SegmentationError::SdfNotComputed)?;
        let lambda = self.params.smoothing_lambda;
        if lambda.is_nan() || lambda < 0.0 {
            return Err(SegmentationError::InvalidParameters(format!(
                "smoothing weight {lambda} is negative"
            ))
            .into());
        }

        if progress.is_cancelled() {
            return Err(JobError::Cancelled.into());
        }
        let clustering = self.strategy.cluster_with(values, self.params.clusters)?;
        let labels = if lambda > 0.0 {
            smooth_labels(geometry, values, &clustering, &self.params, progress)?
        } else {
            clustering.labels
        };
        let (segment_of, segment_count) = connected_segments(geometry, &labels);
        if segment_count > MAX_PALETTE_COLORS {
            return Err(SegmentationError::TooManySegments {
                segments: segment_count,
                max: MAX_PALETTE_COLORS,
            }
            .into());
        }

        progress.report_progress(1.0);
        info!(
            segments = segment_count,
            elapsed_ms = start.elapsed().as_millis(),
            "segmentation finished"
        );
        Ok(SegmentationResult {
            segment_of,
            segment_count,
        })
    }
}

/// Iterated conditional modes: each triangle takes the label minimizing its
/// distance to the cluster center plus `lambda` per disagreeing neighbour.
fn smooth_labels(
    geometry: &Geometry,
    values: &[f64],
    clustering: &Clustering,
    params: &SegmentationParams,
    progress: &dyn ProgressIndicator,
) -> Result<Vec<usize>> {
    let mut labels = clustering.labels.clone();
    let neighbours: Vec<Vec<TriangleId>> = (0..labels.len())
        .map(|i| geometry.polyhedron().neighbours(TriangleId(i)))
        .collect();
    // Clustering counts as the first of `sweeps + 1` steps.
    #[allow(clippy::cast_precision_loss)]
    let steps = (params.smoothing_iterations + 1) as f32;
    progress.report_progress(1.0 / steps);
    for sweep in 0..params.smoothing_iterations {
        if progress.is_cancelled() {
            return Err(JobError::Cancelled.into());
        }
        let mut changed = false;
        for index in 0..labels.len() {
            let cost = |label: usize| {
                let disagreeing = neighbours[index].iter().filter(|n| labels[n.0] != label).count();
                #[allow(clippy::cast_precision_loss)]
                let penalty = params.smoothing_lambda * disagreeing as f64;
                (values[index] - clustering.centers[label]).powi(2) + penalty
            };
            let best = (0..clustering.centers.len())
                .min_by(|&a, &b| cost(a).total_cmp(&cost(b)).then(a.cmp(&b)))
                .unwrap_or(labels[index]);
            if best != labels[index] {
                labels[index] = best;
                changed = true;
            }
        }
        #[allow(clippy::cast_precision_loss)]
        progress.report_progress((sweep + 2) as f32 / steps);
        if !changed {
            break;
        }
    }
    Ok(labels)
}

/// Splits labels into edge-connected components, numbered by their smallest triangle.
fn connected_segments(geometry: &Geometry, labels: &[usize]) -> (Vec<usize>, usize) {
    let mut segment_of = vec![usize::MAX; labels.len()];
    let mut count = 0;
    for seed in 0..labels.len() {
        if segment_of[seed] != usize::MAX {
            continue;
        }
        segment_of[seed] = count;
        let mut stack = vec![seed];
        while let Some(current) = stack.pop() {
            for neighbour in geometry.polyhedron().neighbours(TriangleId(current)) {
                if segment_of[neighbour.0] == usize::MAX && labels[neighbour.0] == labels[current] {
                    segment_of[neighbour.0] = count;
                    stack.push(neighbour.0);
                }
            }
        }
        count += 1;
    }
    (segment_of, count)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::mesh::fixtures;
    use crate::progress::{AtomicProgress, CancelOnFirstReport};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// 4x4 grid whose left half is thin and right half thick.
    fn two_halves() -> Geometry {
        let mut g = Geometry::from_triangles(fixtures::grid(4)).unwrap();
        let values: Vec<f64> = g
            .triangles()
            .iter()
            .map(|t| if t.centroid().x < 2.0 { 0.1 } else { 0.9 })
            .collect();
        g.set_sdf_values(values).unwrap();
        g
    }

    #[test]
    fn halves_become_two_segments() {
        let mut g = two_halves();
        let result = Segmentation::new()
            .with_params(SegmentationParams::default().with_clusters(ClusterCount::Fixed(2)))
            .execute(&g)
            .unwrap();
        assert_eq!(result.segment_count(), 2);
        let segments = result.segments();
        assert_eq!(segments[&0].len(), 16);
        assert_eq!(segments[&1].len(), 16);

        g.execute(result.to_command(&mut StdRng::seed_from_u64(7))).unwrap();
        assert_eq!(g.color_manager().len(), 2);
        assert_eq!(g.triangle_color(TriangleId(0)).unwrap(), 0);
        assert_eq!(g.triangle_color(TriangleId(31)).unwrap(), 1);
        g.undo();
        assert_eq!(g.color_manager().len(), 4);
    }

    #[test]
    fn same_cluster_in_separate_places_gives_separate_segments() {
        let mut g = Geometry::from_triangles(fixtures::grid(4)).unwrap();
        let values: Vec<f64> = g
            .triangles()
            .iter()
            .map(|t| if (1.0..3.0).contains(&t.centroid().x) { 0.9 } else { 0.1 })
            .collect();
        g.set_sdf_values(values).unwrap();
        let result = Segmentation::new()
            .with_params(SegmentationParams::default().with_clusters(ClusterCount::Fixed(2)))
            .execute(&g)
            .unwrap();
        assert_eq!(result.segment_count(), 3);
    }

    #[test]
    fn smoothing_absorbs_isolated_outliers() {
        let mut g = two_halves();
        let mut values = g.sdf_values().unwrap().to_vec();
        values[0] = 0.6;
        values[1] = 0.2;
        g.set_sdf_values(values).unwrap();
        let params = SegmentationParams::default().with_clusters(ClusterCount::Fixed(2));

        let raw = Segmentation::new().with_params(params.with_smoothing(0.0)).execute(&g).unwrap();
        assert_eq!(raw.segment_count(), 3);
        let smooth = Segmentation::new()
            .with_params(params.with_smoothing(0.5))
            .execute(&g)
            .unwrap();
        assert_eq!(smooth.segment_count(), 2);
    }

    #[test]
    fn checkerboard_exceeds_palette() {
        let mut g = Geometry::from_triangles(fixtures::grid(6)).unwrap();
        let values: Vec<f64> = (0..g.triangle_count())
            .map(|i| if i % 2 == 0 { 0.0 } else { 1.0 })
            .collect();
        g.set_sdf_values(values).unwrap();
        let result = Segmentation::new()
            .with_params(
                SegmentationParams::default()
                    .with_clusters(ClusterCount::Fixed(2))
                    .with_smoothing(0.0),
            )
            .execute(&g);
        assert!(matches!(
            result,
            Err(Error::Segmentation(SegmentationError::TooManySegments { max: 16, .. }))
        ));
    }

    #[test]
    fn missing_sdf_is_reported() {
        let g = Geometry::from_triangles(fixtures::cube()).unwrap();
        assert!(matches!(
            Segmentation::new().execute(&g),
            Err(Error::Segmentation(SegmentationError::SdfNotComputed))
        ));
    }

    #[test]
    fn cuboid_is_segmented_after_sdf() {
        let mut g = Geometry::from_triangles(fixtures::cuboid(4.0, 1.0, 1.0)).unwrap();
        g.compute_sdf(&SdfParams::default(), &NoProgress).unwrap();
        let result = Segmentation::new()
            .with_params(SegmentationParams::default().with_clusters(ClusterCount::Auto { max: 4 }))
            .execute(&g)
            .unwrap();
        assert!(result.segment_count() >= 1);
        assert_eq!(result.assignments().len(), 12);
    }

    #[test]
    fn progress_is_reported_and_cancellation_stops_smoothing() {
        let g = two_halves();
        let segmentation = Segmentation::new()
            .with_params(SegmentationParams::default().with_clusters(ClusterCount::Fixed(2)));

        let progress = AtomicProgress::new();
        segmentation.execute_with_progress(&g, &progress).unwrap();
        assert!((progress.fraction() - 1.0).abs() < f32::EPSILON);

        let cancelling = CancelOnFirstReport::default();
        assert!(matches!(
            segmentation.execute_with_progress(&g, &cancelling),
            Err(Error::Job(JobError::Cancelled))
        ));
        assert_eq!(cancelling.reports(), 1);
    }
}
