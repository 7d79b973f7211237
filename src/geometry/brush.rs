//! Brush painting and the brush highlight.

use std::collections::{HashSet, VecDeque};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::detail::MIN_DETAIL_AREA;
use crate::error::Result;
use crate::math::distance_3d::{
    circle_polygon, is_triangle_inside_sphere, point_triangle_distance, triangle_intersects_sphere,
};
use crate::math::intersect_3d::{line_plane_intersect, sphere_plane_intersect, LinePlaneRelation};
use crate::math::{Point3, Ray, Vector3, TOLERANCE};
use crate::mesh::{ColorIndex, TriangleId};

use super::{Geometry, RayHit};

/// Parameters of a brush stroke.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrushSettings {
    /// Palette index painted by the brush.
    pub color: ColorIndex,
    /// Brush radius in model units.
    pub size: f64,
    /// Fill the gaps between consecutive stamps of a stroke.
    pub continuous: bool,
    /// Also paint triangles facing away from the viewer.
    pub paint_backfaces: bool,
    /// Paint everything inside a sphere around the hit point; otherwise
    /// project a circle along the view ray.
    pub spherical: bool,
    /// Paint whole triangles instead of subdividing them.
    pub respect_original_triangles: bool,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            color: 0,
            size: 0.1,
            continuous: true,
            paint_backfaces: false,
            spherical: true,
            respect_original_triangles: false,
        }
    }
}

impl BrushSettings {
    /// Settings painting `color` with radius `size`.
    #[must_use]
    pub fn new(color: ColorIndex, size: f64) -> Self {
        Self {
            color,
            size,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_spherical(mut self, spherical: bool) -> Self {
        self.spherical = spherical;
        self
    }

    #[must_use]
    pub fn with_backfaces(mut self, paint_backfaces: bool) -> Self {
        self.paint_backfaces = paint_backfaces;
        self
    }

    #[must_use]
    pub fn with_continuous(mut self, continuous: bool) -> Self {
        self.continuous = continuous;
        self
    }

    #[must_use]
    pub fn with_respect_original_triangles(mut self, respect: bool) -> Self {
        self.respect_original_triangles = respect;
        self
    }
}

/// Triangles currently under the brush. Not part of the undo state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AreaHighlight {
    /// Triangles touched by the brush.
    pub triangles: Vec<TriangleId>,
    /// Brush center on the surface.
    pub center: Option<Point3>,
    /// Brush radius.
    pub radius: f64,
}

impl AreaHighlight {
    /// Returns `true` if nothing is highlighted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

impl Geometry {
    /// Paints every stamp of a brush stroke.
    pub(crate) fn paint_brush(&mut self, strokes: &[Ray], settings: &BrushSettings) -> Result<()> {
        let start = Instant::now();
        self.palette.check_index(settings.color)?;

        let stamps = if settings.continuous {
            self.interpolate_stamps(strokes, settings.size)
        } else {
            strokes.iter().map(Ray::normalized).collect()
        };
        for ray in &stamps {
            self.paint_stamp(ray, settings)?;
        }

        info!(
            stamps = stamps.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "brush stroke painted"
        );
        Ok(())
    }

    /// Records the triangles the brush would paint for `ray`.
    pub fn highlight_area(&mut self, ray: &Ray, settings: &BrushSettings) -> &AreaHighlight {
        let ray = ray.normalized();
        self.highlight = match self.cast_ray(&ray) {
            Some(hit) => AreaHighlight {
                triangles: self.brush_triangles(&hit, &ray.direction, settings),
                center: Some(hit.point),
                radius: settings.size,
            },
            None => AreaHighlight::default(),
        };
        &self.highlight
    }

    /// Inserts extra rays between consecutive hits further apart than half
    /// the brush radius.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn interpolate_stamps(&self, strokes: &[Ray], size: f64) -> Vec<Ray> {
        let strokes: Vec<Ray> = strokes.iter().map(Ray::normalized).collect();
        let mut stamps = Vec::with_capacity(strokes.len());
        let spacing = (size * 0.5).max(TOLERANCE);
        for (i, ray) in strokes.iter().enumerate() {
            if i > 0 {
                let previous = &strokes[i - 1];
                if let (Some(a), Some(b)) = (self.cast_ray(previous), self.cast_ray(ray)) {
                    let steps = ((b.point - a.point).norm() / spacing).ceil();
                    if steps.is_finite() && steps > 1.0 {
                        let steps = steps as usize;
                        for k in 1..steps {
                            let t = k as f64 / steps as f64;
                            let origin = previous.origin + (ray.origin - previous.origin) * t;
                            let direction = previous.direction.lerp(&ray.direction, t);
                            stamps.push(Ray::new(origin, direction).normalized());
                        }
                    }
                }
            }
            stamps.push(*ray);
        }
        stamps
    }

    fn paint_stamp(&mut self, ray: &Ray, settings: &BrushSettings) -> Result<()> {
        let Some(hit) = self.cast_ray(ray) else {
            return Ok(());
        };
        let dir = ray.direction;
        let radius = settings.size;
        for id in self.brush_triangles(&hit, &dir, settings) {
            let triangle = &self.triangles[id.0];
            let vertices = triangle.vertices;
            let normal = triangle.normal;
            let area = triangle.area();

            let inside = |p: &Point3| {
                if settings.spherical {
                    (p - hit.point).norm() <= radius
                } else {
                    distance_to_axis(p, &hit.point, &dir) <= radius
                }
            };
            let whole = if settings.spherical {
                is_triangle_inside_sphere(&vertices, &hit.point, radius)
            } else {
                vertices.iter().all(&inside)
            };
            if whole || settings.respect_original_triangles {
                self.set_triangle_color(id.into(), settings.color)?;
                continue;
            }
            if area < MIN_DETAIL_AREA {
                if inside(&self.triangles[id.0].centroid()) {
                    self.set_triangle_color(id.into(), settings.color)?;
                }
                continue;
            }

            if settings.spherical {
                let circle = sphere_plane_intersect(&hit.point, radius, &vertices[0], &normal);
                if let Some(circle) = circle {
                    self.paint_circle_area(id, &circle.center, circle.radius, settings.color)?;
                }
            } else {
                let polygon: Vec<Point3> = circle_polygon(&hit.point, &dir, radius)
                    .iter()
                    .filter_map(|p| match line_plane_intersect(p, &dir, &vertices[0], &normal) {
                        LinePlaneRelation::Point { point, .. } => Some(point),
                        _ => None,
                    })
                    .collect();
                if polygon.len() >= 3 {
                    self.paint_area_clipped(id, &polygon, settings.color)?;
                }
            }
        }
        Ok(())
    }

    /// Triangles connected to the hit triangle that lie within the brush.
    fn brush_triangles(
        &self,
        hit: &RayHit,
        dir: &Vector3,
        settings: &BrushSettings,
    ) -> Vec<TriangleId> {
        let touches = |id: TriangleId| -> bool {
            let triangle = &self.triangles[id.0];
            if !settings.paint_backfaces && triangle.normal.dot(dir) >= 0.0 {
                return false;
            }
            if settings.spherical {
                triangle_intersects_sphere(&triangle.vertices, &hit.point, settings.size)
            } else {
                let flat = triangle.vertices.map(|v| v - dir * dir.dot(&(v - hit.point)));
                point_triangle_distance(&hit.point, &flat) <= settings.size
            }
        };

        let mut visited = HashSet::from([hit.triangle]);
        let mut queue = VecDeque::from([hit.triangle]);
        let mut result = Vec::new();
        while let Some(current) = queue.pop_front() {
            if !touches(current) {
                continue;
            }
            result.push(current);
            for neighbour in self.polyhedron.neighbours(current) {
                if visited.insert(neighbour) {
                    queue.push_back(neighbour);
                }
            }
        }
        result
    }
}

/// Distance from `p` to the line through `origin` along unit `dir`.
fn distance_to_axis(p: &Point3, origin: &Point3, dir: &Vector3) -> f64 {
    let d = p - origin;
    (d - dir * dir.dot(&d)).norm()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::command::Snapshot;
    use crate::geometry::GeometryCommand;
    use crate::mesh::fixtures;
    use approx::assert_relative_eq;

    fn down(x: f64, y: f64) -> Ray {
        Ray::new(Point3::new(x, y, 5.0), -Vector3::z())
    }

    fn painted_area(g: &Geometry, color: ColorIndex) -> f64 {
        g.triangles()
            .iter()
            .map(|t| match g.detail(t.id) {
                Some(d) => (0..d.len())
                    .filter(|&i| d.color_of(i).unwrap() == color)
                    .map(|i| d.area_of(i).unwrap())
                    .sum(),
                None if t.color == color => t.area(),
                None => 0.0,
            })
            .sum()
    }

    #[test]
    fn sphere_brush_paints_disc_across_triangles() {
        let mut g = Geometry::from_triangles(fixtures::grid(4)).unwrap();
        let settings = BrushSettings::new(1, 0.5).with_continuous(false);
        g.execute(GeometryCommand::PaintBrush {
            strokes: vec![down(2.0, 2.0)],
            settings,
        })
        .unwrap();
        // Inscribed 50-gon of radius 0.5, split across the touching triangles.
        let expected = 0.5 * 50.0 * 0.25 * (std::f64::consts::TAU / 50.0).sin();
        assert_relative_eq!(painted_area(&g, 1), expected, epsilon = 1e-9);
        assert!(g.details().len() >= 6);
    }

    #[test]
    fn large_brush_paints_whole_triangles() {
        let mut g = Geometry::from_triangles(fixtures::grid(2)).unwrap();
        let settings = BrushSettings::new(2, 10.0);
        g.execute(GeometryCommand::PaintBrush {
            strokes: vec![down(1.0, 1.0)],
            settings,
        })
        .unwrap();
        assert!(g.details().is_empty());
        assert!(g.triangles().iter().all(|t| t.color == 2));
    }

    #[test]
    fn backfaces_are_skipped_unless_requested() {
        let mut g = Geometry::from_triangles(fixtures::cube()).unwrap();
        let ray = Ray::new(Point3::new(0.5, 0.5, -5.0), Vector3::z());
        let settings = BrushSettings::new(1, 5.0);
        g.execute(GeometryCommand::PaintBrush {
            strokes: vec![ray],
            settings,
        })
        .unwrap();
        // The sphere covers the whole cube; only faces turned to the viewer are painted.
        let painted = g.triangles().iter().filter(|t| t.color == 1).count();
        assert_eq!(painted, 2);

        g.undo();
        g.execute(GeometryCommand::PaintBrush {
            strokes: vec![ray],
            settings: settings.with_backfaces(true),
        })
        .unwrap();
        assert!(g.triangles().iter().all(|t| t.color == 1));
    }

    #[test]
    fn projected_brush_paints_circle() {
        let mut g = Geometry::from_triangles(fixtures::grid(4)).unwrap();
        let settings = BrushSettings::new(3, 0.3).with_spherical(false).with_continuous(false);
        g.execute(GeometryCommand::PaintBrush {
            strokes: vec![down(1.5, 1.5)],
            settings,
        })
        .unwrap();
        let n = 30.0;
        let expected = 0.5 * n * 0.09 * (std::f64::consts::TAU / n).sin();
        assert_relative_eq!(painted_area(&g, 3), expected, epsilon = 1e-9);
    }

    #[test]
    fn continuous_stroke_fills_gaps() {
        let mut sparse = Geometry::from_triangles(fixtures::grid(4)).unwrap();
        let mut dense = Geometry::from_triangles(fixtures::grid(4)).unwrap();
        let strokes = vec![down(0.5, 2.0), down(3.5, 2.0)];
        let settings = BrushSettings::new(1, 0.2).with_respect_original_triangles(true);
        sparse
            .execute(GeometryCommand::PaintBrush {
                strokes: strokes.clone(),
                settings: settings.with_continuous(false),
            })
            .unwrap();
        dense
            .execute(GeometryCommand::PaintBrush { strokes, settings })
            .unwrap();
        let count = |g: &Geometry| g.triangles().iter().filter(|t| t.color == 1).count();
        assert!(count(&dense) > count(&sparse));
    }

    #[test]
    fn missing_the_mesh_changes_nothing() {
        let mut g = Geometry::from_triangles(fixtures::grid(2)).unwrap();
        let before = g.snapshot();
        g.execute(GeometryCommand::PaintBrush {
            strokes: vec![down(10.0, 10.0)],
            settings: BrushSettings::new(1, 0.5),
        })
        .unwrap();
        assert_eq!(g.snapshot(), before);
    }

    #[test]
    fn highlight_is_not_part_of_the_state() {
        let mut g = Geometry::from_triangles(fixtures::grid(4)).unwrap();
        let before = g.snapshot();
        let highlight = g.highlight_area(&down(2.0, 2.0), &BrushSettings::new(1, 0.5));
        assert!(highlight.triangles.len() >= 6);
        assert_relative_eq!(highlight.center.unwrap().x, 2.0);
        assert_eq!(g.snapshot(), before);
        g.clear_highlight();
        assert!(g.highlight().is_empty());
    }
}
