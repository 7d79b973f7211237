//! Shape diameter function: per-triangle thickness estimated by casting rays
//! into the solid.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{JobError, Result, SegmentationError};
use crate::geometry::Geometry;
use crate::math::distance_3d::orthonormal_basis;
use crate::math::{Ray, Vector3};
use crate::mesh::TriangleId;
use crate::progress::ProgressIndicator;

/// Golden angle in radians, spreads sample directions evenly over the cone.
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Parameters of the SDF computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SdfParams {
    /// Rays cast per triangle.
    pub rays: usize,
    /// Opening angle of the ray cone, in degrees.
    pub cone_angle_degrees: f64,
    /// Triangles processed between two cancellation checks.
    pub batch_size: usize,
}

impl Default for SdfParams {
    fn default() -> Self {
        Self {
            rays: 25,
            cone_angle_degrees: 120.0,
            batch_size: 32,
        }
    }
}

impl SdfParams {
    #[must_use]
    pub fn with_rays(mut self, rays: usize) -> Self {
        self.rays = rays;
        self
    }

    #[must_use]
    pub fn with_cone_angle(mut self, degrees: f64) -> Self {
        self.cone_angle_degrees = degrees;
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

/// Computes SDF values normalized to `[0, 1]`, one per triangle.
///
/// Triangles whose rays find no valid opposite wall take the average of
/// their neighbours.
///
/// # Errors
///
/// - [`SegmentationError::SdfValues`] if the mesh is not closed or no triangle
///   produced a valid value.
/// - [`SegmentationError::InvalidParameters`] if `params` casts no rays.
/// - [`JobError::Cancelled`] if `progress` requested cancellation.
pub fn compute_sdf(
    geometry: &Geometry,
    params: &SdfParams,
    progress: &dyn ProgressIndicator,
) -> Result<Vec<f64>> {
    let start = Instant::now();
    if params.rays == 0 || params.batch_size == 0 {
        return Err(SegmentationError::InvalidParameters(
            "SDF needs at least one ray and batch".into(),
        )
        .into());
    }
    let polyhedron = geometry.polyhedron();
    if !polyhedron.is_closed() {
        return Err(SegmentationError::SdfValues(format!(
            "mesh is not closed ({} boundary halfedges, {} non-manifold edges)",
            polyhedron.boundary_halfedge_count(),
            polyhedron.non_manifold_edge_count()
        ))
        .into());
    }

    let count = geometry.triangle_count();
    let mut raw: Vec<Option<f64>> = Vec::with_capacity(count);
    for batch_start in (0..count).step_by(params.batch_size) {
        if progress.is_cancelled() {
            info!(processed = batch_start, "SDF computation cancelled");
            return Err(JobError::Cancelled.into());
        }
        let batch_end = (batch_start + params.batch_size).min(count);
        for index in batch_start..batch_end {
            raw.push(triangle_sdf(geometry, TriangleId(index), params));
        }
        #[allow(clippy::cast_precision_loss)]
        progress.report_progress(batch_end as f32 / count as f32);
    }

    let missing = raw.iter().filter(|v| v.is_none()).count();
    if missing > 0 {
        warn!(missing, "triangles without a valid SDF ray hit");
    }
    let filled = fill_from_neighbours(geometry, raw)?;
    let values = normalize(&filled);

    info!(
        triangles = count,
        elapsed_ms = start.elapsed().as_millis(),
        "SDF computed"
    );
    Ok(values)
}

impl Geometry {
    /// Computes and stores SDF values. Triangle colors are not touched.
    ///
    /// # Errors
    ///
    /// See [`compute_sdf`].
    pub fn compute_sdf(
        &mut self,
        params: &SdfParams,
        progress: &dyn ProgressIndicator,
    ) -> Result<()> {
        let values = compute_sdf(self, params, progress)?;
        self.set_sdf_values(values)
    }
}

/// Robust average of the ray lengths cast from one triangle into the solid.
#[allow(clippy::cast_precision_loss)]
fn triangle_sdf(geometry: &Geometry, id: TriangleId, params: &SdfParams) -> Option<f64> {
    let triangle = geometry.triangle(id).ok()?;
    let inward = -triangle.normal;
    let origin = triangle.centroid();
    let (u, v) = orthonormal_basis(&inward);
    let cos_limit = (params.cone_angle_degrees.to_radians() * 0.5).cos();

    let mut lengths: Vec<f64> = (0..params.rays)
        .filter_map(|i| {
            let cos_theta = 1.0 - (1.0 - cos_limit) * (i as f64 + 0.5) / params.rays as f64;
            let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
            let phi = i as f64 * GOLDEN_ANGLE;
            let dir: Vector3 = inward * cos_theta + (u * phi.cos() + v * phi.sin()) * sin_theta;
            let hit = geometry.cast_ray_excluding(&Ray::new(origin, dir), id)?;
            let normal = geometry.triangle(hit.triangle).ok()?.normal;
            // Hits must reach the inside of the opposite wall.
            (normal.dot(&dir) > 0.0 && hit.distance > 0.0).then_some(hit.distance)
        })
        .collect();
    if lengths.is_empty() {
        return None;
    }

    lengths.sort_by(f64::total_cmp);
    let median = lengths[lengths.len() / 2];
    let mean = lengths.iter().sum::<f64>() / lengths.len() as f64;
    let variance = lengths.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / lengths.len() as f64;
    let deviation = variance.sqrt();
    let kept: Vec<f64> = lengths
        .iter()
        .copied()
        .filter(|l| (l - median).abs() <= deviation)
        .collect();
    if kept.is_empty() {
        Some(median)
    } else {
        Some(kept.iter().sum::<f64>() / kept.len() as f64)
    }
}

/// Replaces missing values with the average of known neighbours, spreading
/// inward until every triangle has a value.
fn fill_from_neighbours(geometry: &Geometry, mut values: Vec<Option<f64>>) -> Result<Vec<f64>> {
    if values.iter().all(Option::is_none) {
        return Err(
            SegmentationError::SdfValues("no triangle produced a valid SDF value".into()).into(),
        );
    }
    loop {
        let updates: Vec<(usize, f64)> = values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_none())
            .filter_map(|(index, _)| {
                let known: Vec<f64> = geometry
                    .polyhedron()
                    .neighbours(TriangleId(index))
                    .into_iter()
                    .filter_map(|n| values[n.0])
                    .collect();
                #[allow(clippy::cast_precision_loss)]
                let average = known.iter().sum::<f64>() / known.len() as f64;
                (!known.is_empty()).then_some((index, average))
            })
            .collect();
        if updates.is_empty() {
            break;
        }
        for (index, value) in updates {
            values[index] = Some(value);
        }
    }
    // Components without any valid value share the global mean.
    let known: Vec<f64> = values.iter().filter_map(|v| *v).collect();
    #[allow(clippy::cast_precision_loss)]
    let mean = known.iter().sum::<f64>() / known.len() as f64;
    Ok(values.into_iter().map(|v| v.unwrap_or(mean)).collect())
}

/// Linear rescale to `[0, 1]`; a constant input maps to zeros.
fn normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if range <= f64::EPSILON {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - min) / range).collect()
}
