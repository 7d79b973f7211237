//! Flood fill over the triangle adjacency graph.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{JobError, Result};
use crate::mesh::TriangleId;
use crate::progress::{NoProgress, ProgressIndicator};

use super::Geometry;

/// Decides whether the flood fill may step from `current` to `neighbour`.
pub trait StoppingCriterion: fmt::Debug + Send + Sync {
    /// Returns `true` if `neighbour` joins the region grown from `seed`.
    fn admits(
        &self,
        geometry: &Geometry,
        seed: TriangleId,
        current: TriangleId,
        neighbour: TriangleId,
    ) -> bool;
}

/// Triangles visited between two progress reports of a multi-seed fill.
const PROGRESS_STRIDE: usize = 256;

/// Admits neighbours sharing the seed's color.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorStopping;

impl StoppingCriterion for ColorStopping {
    fn admits(
        &self,
        geometry: &Geometry,
        seed: TriangleId,
        _current: TriangleId,
        neighbour: TriangleId,
    ) -> bool {
        match (geometry.triangle_color(seed), geometry.triangle_color(neighbour)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

/// Reference normal of a [`NormalStopping`] comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalCompare {
    /// Compare against the seed triangle.
    #[default]
    Seed,
    /// Compare against the triangle the fill steps from.
    Neighbours,
}

/// Admits neighbours whose normal deviates by at most a given angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalStopping {
    /// Largest admitted angle between normals, in degrees.
    pub max_angle_degrees: f64,
    /// Which normal the neighbour is compared with.
    pub compare: NormalCompare,
}

impl Default for NormalStopping {
    fn default() -> Self {
        Self {
            max_angle_degrees: 30.0,
            compare: NormalCompare::Seed,
        }
    }
}

impl NormalStopping {
    /// Criterion comparing against the seed normal.
    #[must_use]
    pub fn new(max_angle_degrees: f64) -> Self {
        Self {
            max_angle_degrees,
            compare: NormalCompare::Seed,
        }
    }

    /// Sets the reference normal.
    #[must_use]
    pub fn with_compare(mut self, compare: NormalCompare) -> Self {
        self.compare = compare;
        self
    }
}

impl StoppingCriterion for NormalStopping {
    fn admits(
        &self,
        geometry: &Geometry,
        seed: TriangleId,
        current: TriangleId,
        neighbour: TriangleId,
    ) -> bool {
        let reference = match self.compare {
            NormalCompare::Seed => seed,
            NormalCompare::Neighbours => current,
        };
        match (geometry.triangle(reference), geometry.triangle(neighbour)) {
            (Ok(a), Ok(b)) => {
                let cos = a.normal.dot(&b.normal).clamp(-1.0, 1.0);
                cos.acos().to_degrees() <= self.max_angle_degrees
            }
            _ => false,
        }
    }
}

/// Admits every reachable triangle.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoNotStop;

impl StoppingCriterion for DoNotStop {
    fn admits(&self, _: &Geometry, _: TriangleId, _: TriangleId, _: TriangleId) -> bool {
        true
    }
}

/// Admits a neighbour only if every inner criterion does.
#[derive(Debug, Default)]
pub struct AllOf(pub Vec<Box<dyn StoppingCriterion>>);

impl StoppingCriterion for AllOf {
    fn admits(
        &self,
        geometry: &Geometry,
        seed: TriangleId,
        current: TriangleId,
        neighbour: TriangleId,
    ) -> bool {
        self.0.iter().all(|c| c.admits(geometry, seed, current, neighbour))
    }
}

/// Persistable choice of bucket criteria.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BucketSettings {
    /// Stop at color changes.
    pub by_color: bool,
    /// Stop at sharp normal changes.
    pub by_normal: Option<NormalStopping>,
}

impl Default for BucketSettings {
    fn default() -> Self {
        Self {
            by_color: true,
            by_normal: None,
        }
    }
}

impl BucketSettings {
    /// Builds the combined criterion; no active criterion fills the whole component.
    #[must_use]
    pub fn criterion(&self) -> Box<dyn StoppingCriterion> {
        let mut parts: Vec<Box<dyn StoppingCriterion>> = Vec::new();
        if self.by_color {
            parts.push(Box::new(ColorStopping));
        }
        if let Some(normal) = self.by_normal {
            parts.push(Box::new(normal));
        }
        match parts.len() {
            0 => Box::new(DoNotStop),
            1 => parts.remove(0),
            _ => Box::new(AllOf(parts)),
        }
    }
}

impl Geometry {
    /// Triangles reached from `seed` while `criterion` admits each step, in
    /// visiting order starting with the seed.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidTriangleId`](crate::error::GeometryError::InvalidTriangleId)
    /// if `seed` is unknown.
    pub fn bucket(
        &self,
        seed: TriangleId,
        criterion: &dyn StoppingCriterion,
    ) -> Result<Vec<TriangleId>> {
        Ok(self
            .bucket_multi(&[seed], criterion)?
            .into_iter()
            .map(|(triangle, _)| triangle)
            .collect())
    }

    /// Grows regions from several seeds at once.
    ///
    /// The fronts advance in lockstep, so a triangle goes to the seed that
    /// reaches it in the fewest steps; ties go to the earlier seed. Returns
    /// `(triangle, seed)` pairs in visiting order.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidTriangleId`](crate::error::GeometryError::InvalidTriangleId)
    /// if a seed is unknown.
    pub fn bucket_multi(
        &self,
        seeds: &[TriangleId],
        criterion: &dyn StoppingCriterion,
    ) -> Result<Vec<(TriangleId, TriangleId)>> {
        self.bucket_multi_with_progress(seeds, criterion, &NoProgress)
    }

    /// [`bucket_multi`](Self::bucket_multi) reporting the visited fraction of
    /// the mesh and polling for cancellation every few hundred triangles.
    ///
    /// # Errors
    ///
    /// - [`GeometryError::InvalidTriangleId`](crate::error::GeometryError::InvalidTriangleId)
    ///   if a seed is unknown.
    /// - [`JobError::Cancelled`] if `progress` requested cancellation.
    pub fn bucket_multi_with_progress(
        &self,
        seeds: &[TriangleId],
        criterion: &dyn StoppingCriterion,
        progress: &dyn ProgressIndicator,
    ) -> Result<Vec<(TriangleId, TriangleId)>> {
        let mut visited: HashSet<TriangleId> = HashSet::new();
        let mut queue: VecDeque<(TriangleId, TriangleId)> = VecDeque::new();
        let mut order = Vec::new();

        for &seed in seeds {
            self.triangle(seed)?;
            if visited.insert(seed) {
                queue.push_back((seed, seed));
                order.push((seed, seed));
            }
        }

        let total = self.triangle_count().max(1);
        let mut popped = 0_usize;
        while let Some((current, seed)) = queue.pop_front() {
            if popped % PROGRESS_STRIDE == 0 {
                if progress.is_cancelled() {
                    return Err(JobError::Cancelled.into());
                }
                #[allow(clippy::cast_precision_loss)]
                progress.report_progress(order.len() as f32 / total as f32);
            }
            popped += 1;
            for neighbour in self.polyhedron.neighbours(current) {
                if visited.contains(&neighbour)
                    || !criterion.admits(self, seed, current, neighbour)
                {
                    continue;
                }
                visited.insert(neighbour);
                queue.push_back((neighbour, seed));
                order.push((neighbour, seed));
            }
        }
        progress.report_progress(1.0);
        Ok(order)
    }
}
