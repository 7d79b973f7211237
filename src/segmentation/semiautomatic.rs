//! Seed-driven region growing with geometry-aware stopping criteria.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::{Geometry, GeometryCommand, NormalCompare, NormalStopping, StoppingCriterion};
use crate::mesh::{ColorIndex, TriangleId};
use crate::progress::{NoProgress, ProgressIndicator};

/// Admits neighbours whose SDF value is close to the SDF value of a seed.
///
/// The neighbour is compared with the closest seed value, so several seeds
/// can share one criterion.
#[derive(Debug, Clone, PartialEq)]
pub struct SdfStopping {
    seed_values: Vec<f64>,
    max_difference: f64,
}

impl SdfStopping {
    #[must_use]
    pub fn new(seed_values: impl IntoIterator<Item = f64>, max_difference: f64) -> Self {
        let mut seed_values: Vec<f64> = seed_values.into_iter().collect();
        seed_values.sort_by(f64::total_cmp);
        Self {
            seed_values,
            max_difference,
        }
    }

    /// Seed value closest to `value`.
    fn closest(&self, value: f64) -> Option<f64> {
        let above = self.seed_values.partition_point(|&s| s < value);
        let candidates = [
            above.checked_sub(1).and_then(|i| self.seed_values.get(i)),
            self.seed_values.get(above),
        ];
        candidates
            .into_iter()
            .flatten()
            .copied()
            .min_by(|a, b| (a - value).abs().total_cmp(&(b - value).abs()))
    }
}

impl StoppingCriterion for SdfStopping {
    fn admits(
        &self,
        geometry: &Geometry,
        _seed: TriangleId,
        _current: TriangleId,
        neighbour: TriangleId,
    ) -> bool {
        let Ok(value) = geometry.sdf_value(neighbour) else {
            return false;
        };
        self.closest(value)
            .is_some_and(|closest| (value - closest).abs() < self.max_difference)
    }
}

/// Geometric property the seeds spread along.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SemiautomaticCriterion {
    /// Stop where the thickness changes.
    #[default]
    Sdf,
    /// Stop at sharp creases between neighbouring triangles.
    Normal,
}

/// Parameters of [`SemiautomaticSegmentation`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SemiautomaticParams {
    pub criterion: SemiautomaticCriterion,
    /// Tolerance in `[0, 1]`: the SDF difference, or the fraction of 180
    /// degrees between neighbouring normals.
    pub spread: f64,
}

impl Default for SemiautomaticParams {
    fn default() -> Self {
        Self {
            criterion: SemiautomaticCriterion::Sdf,
            spread: 0.1,
        }
    }
}

impl SemiautomaticParams {
    #[must_use]
    pub fn with_criterion(mut self, criterion: SemiautomaticCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    #[must_use]
    pub fn with_spread(mut self, spread: f64) -> Self {
        self.spread = spread.clamp(0.0, 1.0);
        self
    }
}

/// Seeds with colors that grow simultaneously over the mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SemiautomaticSegmentation {
    seeds: BTreeMap<TriangleId, ColorIndex>,
    params: SemiautomaticParams,
}

impl SemiautomaticSegmentation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_params(mut self, params: SemiautomaticParams) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn params(&self) -> &SemiautomaticParams {
        &self.params
    }

    pub fn set_params(&mut self, params: SemiautomaticParams) {
        self.params = params;
    }

    #[must_use]
    pub fn seeds(&self) -> &BTreeMap<TriangleId, ColorIndex> {
        &self.seeds
    }

    /// Adds a seed, replacing the color of an existing seed on the same triangle.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`](crate::error::GeometryError) if the triangle or
    /// the color does not exist in `geometry`.
    pub fn add_seed(
        &mut self,
        geometry: &Geometry,
        triangle: TriangleId,
        color: ColorIndex,
    ) -> Result<()> {
        geometry.triangle(triangle)?;
        geometry.color_manager().check_index(color)?;
        self.seeds.insert(triangle, color);
        Ok(())
    }

    /// Removes a seed, returning its color.
    pub fn remove_seed(&mut self, triangle: TriangleId) -> Option<ColorIndex> {
        self.seeds.remove(&triangle)
    }

    pub fn clear(&mut self) {
        self.seeds.clear();
    }

    /// Grows every seed and returns the triangles reached per color.
    ///
    /// A triangle reached by several seeds goes to the nearest one.
    ///
    /// # Errors
    ///
    /// - [`SegmentationError::SdfNotComputed`](crate::error::SegmentationError::SdfNotComputed)
    ///   when spreading by SDF without stored SDF values.
    /// - [`GeometryError::InvalidTriangleId`](crate::error::GeometryError::InvalidTriangleId)
    ///   if a seed no longer exists.
    pub fn spread(&self, geometry: &Geometry) -> Result<BTreeMap<ColorIndex, Vec<TriangleId>>> {
        self.spread_with_progress(geometry, &NoProgress)
    }

    /// [`spread`](Self::spread) reporting the grown fraction of the mesh.
    ///
    /// # Errors
    ///
    /// As [`spread`](Self::spread), plus
    /// [`JobError::Cancelled`](crate::error::JobError::Cancelled) if `progress`
    /// requested cancellation.
    pub fn spread_with_progress(
        &self,
        geometry: &Geometry,
        progress: &dyn ProgressIndicator,
    ) -> Result<BTreeMap<ColorIndex, Vec<TriangleId>>> {
        if self.seeds.is_empty() {
            return Ok(BTreeMap::new());
        }
        let seed_ids: Vec<TriangleId> = self.seeds.keys().copied().collect();
        let criterion: Box<dyn StoppingCriterion> = match self.params.criterion {
            SemiautomaticCriterion::Sdf => {
                let values = seed_ids
                    .iter()
                    .map(|&id| geometry.sdf_value(id))
                    .collect::<Result<Vec<f64>>>()?;
                Box::new(SdfStopping::new(values, self.params.spread))
            }
            SemiautomaticCriterion::Normal => Box::new(
                NormalStopping::new(self.params.spread * 180.0)
                    .with_compare(NormalCompare::Neighbours),
            ),
        };

        let mut regions: BTreeMap<ColorIndex, Vec<TriangleId>> = BTreeMap::new();
        let grown = geometry.bucket_multi_with_progress(&seed_ids, criterion.as_ref(), progress)?;
        for (triangle, seed) in grown {
            if let Some(&color) = self.seeds.get(&seed) {
                regions.entry(color).or_default().push(triangle);
            }
        }
        for triangles in regions.values_mut() {
            triangles.sort();
        }
        Ok(regions)
    }

    /// Command painting the result of [`spread`](Self::spread) as one undo step.
    ///
    /// # Errors
    ///
    /// See [`spread`](Self::spread).
    pub fn spread_command(&self, geometry: &Geometry) -> Result<GeometryCommand> {
        Ok(GeometryCommand::PaintRegions {
            regions: self.spread(geometry)?.into_iter().collect(),
        })
    }
}
