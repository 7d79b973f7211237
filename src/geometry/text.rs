//! Stamping pre-rasterized text onto the surface.

use std::collections::{HashSet, VecDeque};
use std::time::Instant;

use tracing::info;

use crate::error::{GeometryError, JobError, Result};
use crate::math::distance_3d::orthonormal_basis;
use crate::math::intersect_3d::{line_plane_intersect, LinePlaneRelation};
use crate::math::{Point2, Point3, Ray, Vector3};
use crate::mesh::{ColorIndex, TriangleId};
use crate::progress::ProgressIndicator;

use super::Geometry;

/// Triangles of one rasterized letter, in world space.
pub type LetterTriangles = Vec<[Point3; 3]>;

/// Axis-aligned rectangle in the plane orthogonal to the stamp direction.
#[derive(Debug, Clone, Copy)]
struct Footprint {
    min: Point2,
    max: Point2,
}

impl Footprint {
    fn of<'a>(
        points: impl IntoIterator<Item = &'a Point3>,
        u: &Vector3,
        v: &Vector3,
    ) -> Option<Self> {
        let mut iter = points.into_iter().map(|p| Point2::new(p.coords.dot(u), p.coords.dot(v)));
        let first = iter.next()?;
        Some(iter.fold(Self { min: first, max: first }, |acc, p| Self {
            min: Point2::new(acc.min.x.min(p.x), acc.min.y.min(p.y)),
            max: Point2::new(acc.max.x.max(p.x), acc.max.y.max(p.y)),
        }))
    }

    fn overlaps(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }
}

impl Geometry {
    /// Projects letter triangles along `ray` onto the surface facing it.
    ///
    /// Only triangles connected to the one hit by `ray` are painted.
    pub(crate) fn paint_text(
        &mut self,
        ray: &Ray,
        letters: &[LetterTriangles],
        color: ColorIndex,
        progress: &dyn ProgressIndicator,
    ) -> Result<()> {
        let start = Instant::now();
        self.palette.check_index(color)?;
        let ray = ray.normalized();
        let hit = self
            .cast_ray(&ray)
            .ok_or_else(|| GeometryError::Degenerate("text stamp ray misses the mesh".into()))?;
        let dir = ray.direction;
        let (u, v) = orthonormal_basis(&dir);

        let Some(text_footprint) = Footprint::of(letters.iter().flatten().flatten(), &u, &v) else {
            return Ok(());
        };
        let targets = self.facing_triangles(hit.triangle, &dir, &text_footprint, &u, &v);

        #[allow(clippy::cast_precision_loss)]
        let total = letters.len().max(1) as f32;
        for (index, letter) in letters.iter().enumerate() {
            if progress.is_cancelled() {
                return Err(JobError::Cancelled.into());
            }
            for glyph_triangle in letter {
                let Some(glyph_footprint) = Footprint::of(glyph_triangle, &u, &v) else {
                    continue;
                };
                for &id in &targets {
                    let triangle = &self.triangles[id.0];
                    let overlaps = Footprint::of(&triangle.vertices, &u, &v)
                        .is_some_and(|f| f.overlaps(&glyph_footprint));
                    if !overlaps {
                        continue;
                    }
                    let (origin, normal) = (triangle.vertices[0], triangle.normal);
                    let projected: Vec<Point3> = glyph_triangle
                        .iter()
                        .filter_map(|p| match line_plane_intersect(p, &dir, &origin, &normal) {
                            LinePlaneRelation::Point { point, .. } => Some(point),
                            _ => None,
                        })
                        .collect();
                    if projected.len() == 3 {
                        self.paint_area_clipped(id, &projected, color)?;
                    }
                }
            }
            #[allow(clippy::cast_precision_loss)]
            progress.report_progress((index + 1) as f32 / total);
        }

        info!(
            letters = letters.len(),
            triangles = targets.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "text painted"
        );
        Ok(())
    }

    /// Front-facing triangles connected to `start` whose footprint overlaps `area`.
    fn facing_triangles(
        &self,
        start: TriangleId,
        dir: &Vector3,
        area: &Footprint,
        u: &Vector3,
        v: &Vector3,
    ) -> Vec<TriangleId> {
        let accepts = |id: TriangleId| {
            let triangle = &self.triangles[id.0];
            triangle.normal.dot(dir) < 0.0
                && Footprint::of(&triangle.vertices, u, v).is_some_and(|f| f.overlaps(area))
        };
        let mut visited = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        let mut result = Vec::new();
        while let Some(current) = queue.pop_front() {
            if !accepts(current) {
                continue;
            }
            result.push(current);
            for neighbour in self.polyhedron.neighbours(current) {
                if visited.insert(neighbour) {
                    queue.push_back(neighbour);
                }
            }
        }
        result.sort();
        result
    }
}
