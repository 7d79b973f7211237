//! Sub-triangle subdivision of a single base triangle.
//!
//! A [`TriangleDetail`] partitions its base triangle into sub-triangles, each
//! carrying its own color. Sub-triangle corners are stored as barycentric
//! triples of the base triangle; all orientation decisions use exact
//! predicates, so the partition never leaks outside the base triangle and
//! never overlaps itself.

mod clip;
mod triangulate;

pub use triangulate::triangulate_polygon;

use serde::{Deserialize, Serialize};

use crate::error::{GeometryError, Result};
use crate::math::distance_3d::circle_polygon;
use crate::math::polygon_2d::{
    bounds, is_convex, point_in_triangle, signed_area, simplify_polygon, to_counter_clockwise,
};
use crate::math::{Point2, Point3, Vector3, TOLERANCE};
use crate::mesh::{ColorIndex, DataTriangle, TriangleId};
use clip::{fan_triangulate, param, parametric_det, split_by_line};

/// Minimal base triangle area for which a detail can be created.
pub const MIN_DETAIL_AREA: f64 = 1e-12;

/// Parameter-space area below which a paint polygon counts as missing the
/// base triangle.
const MIN_OVERLAP_AREA: f64 = 1e-14;

/// Tolerance in parameter space used to detect shared sub-triangle edges.
const ADJACENCY_TOLERANCE: f64 = 1e-9;

/// Color and provenance of a sub-triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceInfo {
    /// Palette index of the sub-triangle.
    pub color: ColorIndex,
    /// Paint operation that last assigned the color (0 = inherited from the base).
    pub generation: u32,
}

/// One sub-triangle of a detail mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailTriangle {
    /// Counter-clockwise corners as barycentric coordinates of the base triangle.
    pub corners: [Vector3; 3],
    /// Color and provenance.
    pub info: FaceInfo,
}

impl DetailTriangle {
    fn param_corners(&self) -> [Point2; 3] {
        self.corners.map(|c| param(&c))
    }
}

/// Subdivision of one base triangle into independently colored sub-triangles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriangleDetail {
    base_id: TriangleId,
    base: [Point3; 3],
    normal: Vector3,
    base_area: f64,
    faces: Vec<DetailTriangle>,
    generation: u32,
}

impl TriangleDetail {
    /// Creates a detail consisting of the whole base triangle in its current color.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] if the base triangle has near-zero area.
    pub fn new(base: &DataTriangle) -> Result<Self> {
        let base_area = base.area();
        if base_area < MIN_DETAIL_AREA {
            return Err(GeometryError::Degenerate(format!(
                "triangle {} is too small to subdivide (area {base_area:e})",
                base.id
            ))
            .into());
        }
        Ok(Self {
            base_id: base.id,
            base: base.vertices,
            normal: base.normal,
            base_area,
            faces: vec![DetailTriangle {
                corners: [Vector3::x(), Vector3::y(), Vector3::z()],
                info: FaceInfo {
                    color: base.color,
                    generation: 0,
                },
            }],
            generation: 0,
        })
    }

    /// Sub-triangles of the partition.
    #[must_use]
    pub fn triangles(&self) -> &[DetailTriangle] {
        &self.faces
    }

    /// Number of sub-triangles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    /// A detail always holds at least one sub-triangle.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Unit normal of the base triangle.
    #[must_use]
    pub fn normal(&self) -> Vector3 {
        self.normal
    }

    /// Area of the base triangle.
    #[must_use]
    pub fn base_area(&self) -> f64 {
        self.base_area
    }

    /// World-space corners of sub-triangle `index`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidDetailId`] if `index` is out of range.
    pub fn world_vertices(&self, index: usize) -> Result<[Point3; 3]> {
        let face = self.face(index)?;
        Ok(face.corners.map(|c| self.to_world(&c)))
    }

    /// World-space area of sub-triangle `index`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidDetailId`] if `index` is out of range.
    pub fn area_of(&self, index: usize) -> Result<f64> {
        Ok(parametric_det(&self.face(index)?.corners) * self.base_area)
    }

    /// Sum of all sub-triangle areas.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.faces.iter().map(|f| parametric_det(&f.corners)).sum::<f64>() * self.base_area
    }

    /// Color of sub-triangle `index`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidDetailId`] if `index` is out of range.
    pub fn color_of(&self, index: usize) -> Result<ColorIndex> {
        Ok(self.face(index)?.info.color)
    }

    /// Recolors a single sub-triangle.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidDetailId`] if `index` is out of range.
    pub fn set_color(&mut self, index: usize, color: ColorIndex) -> Result<()> {
        self.face(index)?;
        self.generation += 1;
        let generation = self.generation;
        self.faces[index].info = FaceInfo { color, generation };
        Ok(())
    }

    /// Rewrites every sub-triangle color through `map`.
    pub fn remap_colors(&mut self, map: impl Fn(ColorIndex) -> ColorIndex) {
        for face in &mut self.faces {
            face.info.color = map(face.info.color);
        }
    }

    /// Returns the shared color if every sub-triangle has the same color.
    #[must_use]
    pub fn uniform_color(&self) -> Option<ColorIndex> {
        let first = self.faces.first()?.info.color;
        self.faces.iter().all(|f| f.info.color == first).then_some(first)
    }

    /// Returns `true` if all sub-triangles share one color.
    #[must_use]
    pub fn is_uniform(&self) -> bool {
        self.uniform_color().is_some()
    }

    /// Color covering the largest area; ties go to the lower index.
    #[must_use]
    pub fn dominant_color(&self) -> ColorIndex {
        let mut areas: Vec<(ColorIndex, f64)> = Vec::new();
        for face in &self.faces {
            let det = parametric_det(&face.corners);
            match areas.iter_mut().find(|(c, _)| *c == face.info.color) {
                Some((_, area)) => *area += det,
                None => areas.push((face.info.color, det)),
            }
        }
        areas
            .into_iter()
            .max_by(|(ca, a), (cb, b)| a.total_cmp(b).then(cb.cmp(ca)))
            .map_or(0, |(c, _)| c)
    }

    /// Sub-triangles sharing an edge (or part of one) with sub-triangle `index`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidDetailId`] if `index` is out of range.
    pub fn neighbours(&self, index: usize) -> Result<Vec<usize>> {
        let face = self.face(index)?.param_corners();
        Ok(self
            .faces
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != index)
            .filter(|(_, f)| {
                let other = f.param_corners();
                (0..3).any(|i| {
                    (0..3).any(|j| {
                        edges_overlap(
                            (&face[i], &face[(i + 1) % 3]),
                            (&other[j], &other[(j + 1) % 3]),
                        )
                    })
                })
            })
            .map(|(other, _)| other)
            .collect())
    }

    /// Sub-triangle containing the given barycentric point.
    ///
    /// Points slightly outside every sub-triangle (rounding of ray hits) are
    /// attributed to the sub-triangle with the nearest centroid.
    #[must_use]
    pub fn find(&self, barycentric: &Vector3) -> Option<usize> {
        let target = param(barycentric);
        self.faces
            .iter()
            .position(|f| point_in_triangle(&target, &f.param_corners()))
            .or_else(|| {
                self.faces
                    .iter()
                    .enumerate()
                    .map(|(i, f)| {
                        let c = f.param_corners();
                        let centroid =
                            Point2::from((c[0].coords + c[1].coords + c[2].coords) / 3.0);
                        (i, (centroid - target).norm_squared())
                    })
                    .min_by(|a, b| a.1.total_cmp(&b.1))
                    .map(|(i, _)| i)
            })
    }

    /// Paints the region of the base triangle covered by a world-space polygon.
    ///
    /// The polygon is projected onto the base triangle plane. Convex polygons
    /// clip the partition directly; other simple polygons are triangulated
    /// first. Parts of the polygon outside the base triangle are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] if the projected polygon has no
    /// area or intersects itself.
    pub fn paint_polygon(&mut self, polygon: &[Point3], color: ColorIndex) -> Result<()> {
        let projected = self.project(polygon);
        self.paint_parametric(&projected, color)
    }

    /// Like [`paint_polygon`](Self::paint_polygon), but a polygon missing the
    /// base triangle is not an error. Returns whether anything was painted.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] if the projected polygon has no
    /// area or intersects itself.
    pub fn paint_polygon_clipped(&mut self, polygon: &[Point3], color: ColorIndex) -> Result<bool> {
        let projected = self.project(polygon);
        self.paint_parametric_clipped(&projected, color)
    }

    /// Paints a world-space circle lying in the base triangle plane.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] if the radius is not positive or
    /// the circle misses the base triangle.
    pub fn paint_circle(&mut self, center: &Point3, radius: f64, color: ColorIndex) -> Result<()> {
        if radius <= TOLERANCE || !radius.is_finite() {
            return Err(GeometryError::Degenerate(format!("circle radius {radius}")).into());
        }
        let polygon = circle_polygon(center, &self.normal, radius);
        self.paint_polygon(&polygon, color)
    }

    /// Paints a polygon given in `(w1, w2)` parameter coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] if the polygon has no area,
    /// intersects itself or lies entirely outside the base triangle.
    pub fn paint_parametric(&mut self, polygon: &[Point2], color: ColorIndex) -> Result<()> {
        if self.paint_parametric_clipped(polygon, color)? {
            Ok(())
        } else {
            Err(GeometryError::Degenerate(format!(
                "paint polygon lies outside triangle {}",
                self.base_id
            ))
            .into())
        }
    }

    fn paint_parametric_clipped(&mut self, polygon: &[Point2], color: ColorIndex) -> Result<bool> {
        let polygon = to_counter_clockwise(&simplify_polygon(polygon));
        if polygon.len() < 3 {
            return Err(GeometryError::Degenerate("paint polygon has no area".into()).into());
        }
        if overlap_with_base(&polygon) <= MIN_OVERLAP_AREA {
            return Ok(false);
        }

        self.generation += 1;
        if is_convex(&polygon) {
            self.paint_convex(&polygon, color);
        } else {
            for tri in triangulate_polygon(&polygon)? {
                self.paint_convex(&tri, color);
            }
        }
        Ok(true)
    }

    fn paint_convex(&mut self, polygon: &[Point2], color: ColorIndex) {
        let Some((poly_min, poly_max)) = bounds(polygon) else {
            return;
        };
        let info = FaceInfo {
            color,
            generation: self.generation,
        };

        let mut result = Vec::with_capacity(self.faces.len() + 8);
        for face in self.faces.drain(..) {
            let corners = face.param_corners();
            let Some((face_min, face_max)) = bounds(&corners) else {
                continue;
            };
            let disjoint = face_max.x < poly_min.x
                || face_max.y < poly_min.y
                || face_min.x > poly_max.x
                || face_min.y > poly_max.y;
            if disjoint || face.info.color == color {
                result.push(face);
                continue;
            }

            let mut inside: Vec<Vector3> = face.corners.to_vec();
            let mut outside: Vec<Vec<Vector3>> = Vec::new();
            for i in 0..polygon.len() {
                let next = &polygon[(i + 1) % polygon.len()];
                let (left, right) = split_by_line(&inside, &polygon[i], next);
                if !right.is_empty() {
                    outside.push(right);
                }
                inside = left;
                if inside.is_empty() {
                    break;
                }
            }

            if inside.is_empty() {
                result.push(face);
            } else if outside.is_empty() {
                result.push(DetailTriangle {
                    corners: face.corners,
                    info,
                });
            } else {
                for piece in &outside {
                    result.extend(fan_triangulate(piece).into_iter().map(|corners| DetailTriangle {
                        corners,
                        info: face.info,
                    }));
                }
                result.extend(
                    fan_triangulate(&inside)
                        .into_iter()
                        .map(|corners| DetailTriangle { corners, info }),
                );
            }
        }
        self.faces = result;
    }

    fn face(&self, index: usize) -> Result<&DetailTriangle> {
        self.faces.get(index).ok_or_else(|| {
            GeometryError::InvalidDetailId {
                base: self.base_id.0,
                detail: index,
            }
            .into()
        })
    }

    fn to_world(&self, b: &Vector3) -> Point3 {
        let [a, p, q] = &self.base;
        a + (p - a) * b.y + (q - a) * b.z
    }

    /// `(w1, w2)` parameter coordinates of a world-space polygon.
    fn project(&self, polygon: &[Point3]) -> Vec<Point2> {
        polygon
            .iter()
            .map(|p| {
                let b = self.to_barycentric(p);
                Point2::new(b.y, b.z)
            })
            .collect()
    }

    fn to_barycentric(&self, point: &Point3) -> Vector3 {
        let [a, b, c] = &self.base;
        let e1 = b - a;
        let e2 = c - a;
        let d = point - a;
        let d00 = e1.dot(&e1);
        let d01 = e1.dot(&e2);
        let d11 = e2.dot(&e2);
        let d20 = d.dot(&e1);
        let d21 = d.dot(&e2);
        let denom = d00 * d11 - d01 * d01;
        let w1 = (d11 * d20 - d01 * d21) / denom;
        let w2 = (d00 * d21 - d01 * d20) / denom;
        Vector3::new(1.0 - w1 - w2, w1, w2)
    }
}

/// Parameter-space area of `polygon` inside the base triangle
/// `(0, 0), (1, 0), (0, 1)`.
fn overlap_with_base(polygon: &[Point2]) -> f64 {
    let base = [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0)];
    let mut clipped = polygon.to_vec();
    for i in 0..3 {
        clipped = keep_left_of(&clipped, &base[i], &base[(i + 1) % 3]);
        if clipped.len() < 3 {
            return 0.0;
        }
    }
    signed_area(&clipped)
}

/// Sutherland-Hodgman step keeping the part of `polygon` left of `a -> b`.
fn keep_left_of(polygon: &[Point2], a: &Point2, b: &Point2) -> Vec<Point2> {
    let side = |p: &Point2| (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
    let mut kept = Vec::with_capacity(polygon.len() + 1);
    for (i, current) in polygon.iter().enumerate() {
        let next = &polygon[(i + 1) % polygon.len()];
        let (sc, sn) = (side(current), side(next));
        if sc >= 0.0 {
            kept.push(*current);
        }
        if (sc >= 0.0) != (sn >= 0.0) {
            let t = sc / (sc - sn);
            kept.push(current + (next - current) * t);
        }
    }
    kept
}

/// Checks whether two segments lie on one line and overlap with positive length.
fn edges_overlap(a: (&Point2, &Point2), b: (&Point2, &Point2)) -> bool {
    let dir = a.1 - a.0;
    let len = dir.norm();
    if len < ADJACENCY_TOLERANCE {
        return false;
    }
    let unit = dir / len;
    let off_line = |p: &Point2| {
        let d = p - a.0;
        (d.x * unit.y - d.y * unit.x).abs()
    };
    if off_line(b.0) > ADJACENCY_TOLERANCE || off_line(b.1) > ADJACENCY_TOLERANCE {
        return false;
    }
    let s0 = (b.0 - a.0).dot(&unit);
    let s1 = (b.1 - a.0).dot(&unit);
    let overlap = s0.max(s1).min(len) - s0.min(s1).max(0.0);
    overlap > ADJACENCY_TOLERANCE
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::Error;
    use approx::assert_relative_eq;

    fn base() -> DataTriangle {
        DataTriangle::new(
            TriangleId(0),
            [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(4.0, 0.0, 0.0),
                Point3::new(0.0, 4.0, 0.0),
            ],
            0,
        )
        .unwrap()
    }

    fn assert_partition(detail: &TriangleDetail) {
        for i in 0..detail.len() {
            assert!(detail.area_of(i).unwrap() > 0.0, "sub-triangle {i} has no area");
        }
        assert_relative_eq!(detail.area(), detail.base_area(), epsilon = 1e-9);
    }

    #[test]
    fn new_detail_is_single_face() {
        let d = TriangleDetail::new(&base()).unwrap();
        assert_eq!(d.len(), 1);
        assert_eq!(d.uniform_color(), Some(0));
        assert_relative_eq!(d.area(), 8.0);
    }

    #[test]
    fn degenerate_base_is_rejected() {
        let mut tri = base();
        tri.vertices = [Point3::origin(), Point3::new(1e-7, 0.0, 0.0), Point3::new(0.0, 1e-7, 0.0)];
        assert!(matches!(
            TriangleDetail::new(&tri),
            Err(Error::Geometry(GeometryError::Degenerate(_)))
        ));
    }

    #[test]
    fn circle_paint_conserves_area() {
        let mut d = TriangleDetail::new(&base()).unwrap();
        d.paint_circle(&Point3::new(1.0, 1.0, 0.0), 0.5, 2).unwrap();
        assert!(d.len() > 1);
        assert_partition(&d);
        assert!(!d.is_uniform());

        let painted: f64 = (0..d.len())
            .filter(|&i| d.color_of(i).unwrap() == 2)
            .map(|i| d.area_of(i).unwrap())
            .sum();
        // Inscribed 50-gon of radius 0.5.
        let expected = 0.5 * 50.0 * 0.25 * (std::f64::consts::TAU / 50.0).sin();
        assert_relative_eq!(painted, expected, epsilon = 1e-9);
    }

    #[test]
    fn overlapping_paints_conserve_area() {
        let mut d = TriangleDetail::new(&base()).unwrap();
        d.paint_circle(&Point3::new(1.0, 1.0, 0.0), 0.8, 1).unwrap();
        d.paint_circle(&Point3::new(1.5, 1.2, 0.0), 0.7, 2).unwrap();
        d.paint_circle(&Point3::new(0.2, 0.2, 0.0), 1.0, 3).unwrap();
        assert_partition(&d);
    }

    #[test]
    fn shape_crossing_border_is_clipped() {
        let mut d = TriangleDetail::new(&base()).unwrap();
        let square = [
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(-1.0, 1.0, 0.0),
        ];
        d.paint_polygon(&square, 1).unwrap();
        assert_partition(&d);
        let painted: f64 = (0..d.len())
            .filter(|&i| d.color_of(i).unwrap() == 1)
            .map(|i| d.area_of(i).unwrap())
            .sum();
        assert_relative_eq!(painted, 1.0, epsilon = 1e-9);
        for face in d.triangles() {
            for c in &face.corners {
                assert!(c.x >= 0.0 && c.y >= 0.0 && c.z >= 0.0);
            }
        }
    }

    #[test]
    fn covering_polygon_recolors_everything() {
        let mut d = TriangleDetail::new(&base()).unwrap();
        let big = [
            Point3::new(-10.0, -10.0, 0.0),
            Point3::new(10.0, -10.0, 0.0),
            Point3::new(10.0, 10.0, 0.0),
            Point3::new(-10.0, 10.0, 0.0),
        ];
        d.paint_polygon(&big, 3).unwrap();
        assert_eq!(d.len(), 1);
        assert_eq!(d.uniform_color(), Some(3));
    }

    #[test]
    fn non_convex_polygon_is_triangulated() {
        let mut d = TriangleDetail::new(&base()).unwrap();
        let l = [
            Point3::new(0.5, 0.5, 0.0),
            Point3::new(2.0, 0.5, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(0.5, 2.0, 0.0),
        ];
        d.paint_polygon(&l, 1).unwrap();
        assert_partition(&d);
        let painted: f64 = (0..d.len())
            .filter(|&i| d.color_of(i).unwrap() == 1)
            .map(|i| d.area_of(i).unwrap())
            .sum();
        assert_relative_eq!(painted, 1.25, epsilon = 1e-9);
    }

    #[test]
    fn degenerate_polygon_is_rejected() {
        let mut d = TriangleDetail::new(&base()).unwrap();
        let line = [
            Point3::new(0.5, 0.5, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
        ];
        assert!(d.paint_polygon(&line, 1).is_err());
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn polygon_outside_base_is_rejected() {
        let mut d = TriangleDetail::new(&base()).unwrap();
        let beyond = [
            Point3::new(3.0, 3.0, 0.0),
            Point3::new(5.0, 3.0, 0.0),
            Point3::new(5.0, 5.0, 0.0),
            Point3::new(3.0, 5.0, 0.0),
        ];
        assert!(matches!(
            d.paint_polygon(&beyond, 1),
            Err(Error::Geometry(GeometryError::Degenerate(_)))
        ));
        assert!(!d.paint_polygon_clipped(&beyond, 1).unwrap());
        assert_eq!(d.len(), 1);
        assert_eq!(d.uniform_color(), Some(0));

        // Touching the hypotenuse at a single corner paints nothing either.
        let corner = [
            Point3::new(2.0, 2.0, 0.0),
            Point3::new(3.0, 2.0, 0.0),
            Point3::new(3.0, 3.0, 0.0),
            Point3::new(2.0, 3.0, 0.0),
        ];
        assert!(!d.paint_polygon_clipped(&corner, 1).unwrap());
        let inner = [
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(3.0, 1.0, 0.0),
            Point3::new(1.0, 3.0, 0.0),
        ];
        assert!(d.paint_polygon_clipped(&inner, 1).unwrap());
    }

    #[test]
    fn set_color_and_dominant_color() {
        let mut d = TriangleDetail::new(&base()).unwrap();
        d.paint_circle(&Point3::new(1.0, 1.0, 0.0), 0.5, 2).unwrap();
        assert_eq!(d.dominant_color(), 0);
        for i in 0..d.len() {
            d.set_color(i, 2).unwrap();
        }
        assert_eq!(d.uniform_color(), Some(2));
        assert!(matches!(
            d.set_color(d.len(), 1),
            Err(Error::Geometry(GeometryError::InvalidDetailId { .. }))
        ));
    }

    #[test]
    fn find_locates_painted_region() {
        let mut d = TriangleDetail::new(&base()).unwrap();
        d.paint_circle(&Point3::new(1.0, 1.0, 0.0), 0.5, 2).unwrap();
        let inside = d.find(&Vector3::new(0.5, 0.25, 0.25)).unwrap();
        assert_eq!(d.color_of(inside).unwrap(), 2);
        let outside = d.find(&Vector3::new(0.1, 0.8, 0.1)).unwrap();
        assert_eq!(d.color_of(outside).unwrap(), 0);
    }

    #[test]
    fn neighbours_share_edges() {
        let mut d = TriangleDetail::new(&base()).unwrap();
        let half = [
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(2.0, -1.0, 0.0),
            Point3::new(2.0, 5.0, 0.0),
            Point3::new(-1.0, 5.0, 0.0),
        ];
        d.paint_polygon(&half, 1).unwrap();
        assert_partition(&d);
        let painted = (0..d.len()).find(|&i| d.color_of(i).unwrap() == 1).unwrap();
        let neighbours = d.neighbours(painted).unwrap();
        assert!(!neighbours.is_empty());
        assert!(neighbours.iter().any(|&n| d.color_of(n).unwrap() == 0));
    }

    #[test]
    fn remap_colors_rewrites_all_faces() {
        let mut d = TriangleDetail::new(&base()).unwrap();
        d.paint_circle(&Point3::new(1.0, 1.0, 0.0), 0.5, 2).unwrap();
        d.remap_colors(|c| if c == 2 { 1 } else { c });
        assert!(d.triangles().iter().all(|f| f.info.color <= 1));
    }
}
