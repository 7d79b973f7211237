//! The painted model: triangles, their colors and details, the palette and
//! the undo/redo history of every color mutation.

mod brush;
mod bucket;
mod commands;
mod paint;
mod text;

pub use brush::{AreaHighlight, BrushSettings};
pub use bucket::{
    AllOf, BucketSettings, ColorStopping, DoNotStop, NormalCompare, NormalStopping,
    StoppingCriterion,
};
pub use commands::GeometryCommand;
pub use text::LetterTriangles;

use std::collections::BTreeMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::color::ColorManager;
use crate::command::{Command, CommandManager, Snapshot};
use crate::detail::TriangleDetail;
use crate::error::{GeometryError, ImportError, Result, SegmentationError};
use crate::math::intersect_3d::{ray_triangle_intersect, RayTriangleIntersection};
use crate::math::{Point3, Ray, Vector3};
use crate::mesh::{
    triangles_from_soup, AabbTree, ColorIndex, DataTriangle, DetailedTriangleId, ExportBuilder,
    ExportMesh, PolyhedronData, TriangleId, TriangleSoup,
};

/// Restorable color state of a [`Geometry`].
///
/// Derived structures (spatial index, halfedge view, SDF values) and the
/// brush highlight are not part of the state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryState {
    /// Color of every triangle, indexed by triangle id.
    pub colors: Vec<ColorIndex>,
    /// Details of subdivided triangles.
    pub details: BTreeMap<TriangleId, TriangleDetail>,
    /// The palette.
    pub palette: ColorManager,
}

/// Closest intersection of a ray with the mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Hit triangle.
    pub triangle: TriangleId,
    /// Hit point.
    pub point: Point3,
    /// Barycentric coordinates of `point` in the hit triangle.
    pub barycentric: Vector3,
    /// Distance from the ray origin.
    pub distance: f64,
}

/// Mesh, coloring and history of one painted model.
#[derive(Debug)]
pub struct Geometry {
    triangles: Vec<DataTriangle>,
    details: BTreeMap<TriangleId, TriangleDetail>,
    palette: ColorManager,
    tree: AabbTree,
    polyhedron: PolyhedronData,
    sdf: Option<Vec<f64>>,
    highlight: AreaHighlight,
    history: CommandManager<Geometry>,
}

impl Snapshot for Geometry {
    type State = GeometryState;

    fn snapshot(&self) -> GeometryState {
        GeometryState {
            colors: self.triangles.iter().map(|t| t.color).collect(),
            details: self.details.clone(),
            palette: self.palette.clone(),
        }
    }

    fn restore(&mut self, state: GeometryState) {
        for (triangle, color) in self.triangles.iter_mut().zip(state.colors) {
            triangle.color = color;
        }
        self.details = state.details;
        self.palette = state.palette;
    }
}

impl Geometry {
    /// Creates a geometry from imported triangles with the default palette.
    ///
    /// Triangles are renumbered to their position in `triangles`.
    ///
    /// # Errors
    ///
    /// - [`ImportError::EmptyMesh`] if `triangles` is empty.
    /// - [`GeometryError::InvalidColorIndex`] if a triangle color is outside the palette.
    pub fn from_triangles(triangles: Vec<DataTriangle>) -> Result<Self> {
        Self::with_palette(triangles, ColorManager::new())
    }

    /// Creates a geometry with an explicit palette.
    ///
    /// # Errors
    ///
    /// See [`from_triangles`](Self::from_triangles).
    pub fn with_palette(mut triangles: Vec<DataTriangle>, palette: ColorManager) -> Result<Self> {
        if triangles.is_empty() {
            return Err(ImportError::EmptyMesh.into());
        }
        for (index, triangle) in triangles.iter_mut().enumerate() {
            triangle.id = TriangleId(index);
            palette.check_index(triangle.color)?;
        }

        let mut geometry = Self {
            triangles,
            details: BTreeMap::new(),
            palette,
            tree: AabbTree::default(),
            polyhedron: PolyhedronData::default(),
            sdf: None,
            highlight: AreaHighlight::default(),
            history: CommandManager::new(),
        };
        geometry.rebuild_spatial_index();
        Ok(geometry)
    }

    /// Creates a geometry from a raw triangle soup.
    ///
    /// # Errors
    ///
    /// Propagates [`triangles_from_soup`] errors.
    pub fn from_soup(soup: &TriangleSoup) -> Result<Self> {
        Self::from_triangles(triangles_from_soup(soup)?)
    }

    // --- Queries ---

    /// Returns the triangle with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidTriangleId`] if `id` is unknown.
    pub fn triangle(&self, id: TriangleId) -> Result<&DataTriangle> {
        self.triangles.get(id.0).ok_or_else(|| {
            GeometryError::InvalidTriangleId {
                id: id.0,
                count: self.triangles.len(),
            }
            .into()
        })
    }

    /// All triangles in id order.
    #[must_use]
    pub fn triangles(&self) -> &[DataTriangle] {
        &self.triangles
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Color of a triangle; for a subdivided triangle, its dominant color.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidTriangleId`] if `id` is unknown.
    pub fn triangle_color(&self, id: TriangleId) -> Result<ColorIndex> {
        Ok(self.triangle(id)?.color)
    }

    /// Color of a triangle or of one of its sub-triangles.
    ///
    /// # Errors
    ///
    /// - [`GeometryError::InvalidTriangleId`] if the base triangle is unknown.
    /// - [`GeometryError::InvalidDetailId`] if the sub-triangle does not exist.
    pub fn detailed_color(&self, id: DetailedTriangleId) -> Result<ColorIndex> {
        match id.detail {
            None => self.triangle_color(id.base),
            Some(detail) => self.existing_detail(id.base, detail)?.color_of(detail),
        }
    }

    /// Returns `true` if the triangle has no detail.
    #[must_use]
    pub fn is_simple_triangle(&self, id: TriangleId) -> bool {
        !self.details.contains_key(&id)
    }

    /// Detail of a subdivided triangle.
    #[must_use]
    pub fn detail(&self, id: TriangleId) -> Option<&TriangleDetail> {
        self.details.get(&id)
    }

    /// All details, ordered by triangle id.
    #[must_use]
    pub fn details(&self) -> &BTreeMap<TriangleId, TriangleDetail> {
        &self.details
    }

    /// The palette.
    #[must_use]
    pub fn color_manager(&self) -> &ColorManager {
        &self.palette
    }

    /// Halfedge view of the mesh.
    #[must_use]
    pub fn polyhedron(&self) -> &PolyhedronData {
        &self.polyhedron
    }

    /// Current brush highlight.
    #[must_use]
    pub fn highlight(&self) -> &AreaHighlight {
        &self.highlight
    }

    /// Removes the brush highlight.
    pub fn clear_highlight(&mut self) {
        self.highlight = AreaHighlight::default();
    }

    // --- History ---

    /// Executes a command through the undo/redo history.
    ///
    /// # Errors
    ///
    /// Propagates the command's error; the geometry is left unchanged.
    pub fn execute<C: Command<Geometry> + 'static>(&mut self, command: C) -> Result<()> {
        let mut history = std::mem::take(&mut self.history);
        let result = history.execute(self, command);
        self.history = history;
        result
    }

    /// Executes a command, merging it into the previous step when possible.
    ///
    /// # Errors
    ///
    /// Propagates the command's error; the geometry is left unchanged.
    pub fn execute_joined<C: Command<Geometry> + 'static>(&mut self, command: C) -> Result<()> {
        let mut history = std::mem::take(&mut self.history);
        let result = history.execute_joined(self, command);
        self.history = history;
        result
    }

    /// Reverts the last command. Returns `false` if there was none.
    pub fn undo(&mut self) -> bool {
        let mut history = std::mem::take(&mut self.history);
        let done = history.undo(self);
        self.history = history;
        done
    }

    /// Re-applies the last undone command. Returns `false` if there was none.
    pub fn redo(&mut self) -> bool {
        let mut history = std::mem::take(&mut self.history);
        let done = history.redo(self);
        self.history = history;
        done
    }

    /// Returns `true` if [`undo`](Self::undo) would do something.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Returns `true` if [`redo`](Self::redo) would do something.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Read access to the history.
    #[must_use]
    pub fn history(&self) -> &CommandManager<Geometry> {
        &self.history
    }

    /// Paints a whole triangle, as one undo step.
    ///
    /// # Errors
    ///
    /// - [`GeometryError::InvalidTriangleId`] if `id` is unknown.
    /// - [`GeometryError::InvalidColorIndex`] if `color` is outside the palette.
    pub fn paint_triangle(&mut self, id: TriangleId, color: ColorIndex) -> Result<()> {
        self.execute(GeometryCommand::PaintTriangle {
            triangle: id.into(),
            color,
        })
    }

    /// Paints a set of triangles, as one undo step.
    ///
    /// # Errors
    ///
    /// See [`paint_triangle`](Self::paint_triangle).
    pub fn paint_region(&mut self, triangles: Vec<TriangleId>, color: ColorIndex) -> Result<()> {
        self.execute(GeometryCommand::PaintRegion { triangles, color })
    }

    /// Paints the part of a triangle covered by `polygon`, as one undo step.
    ///
    /// # Errors
    ///
    /// - [`GeometryError::InvalidTriangleId`] if `id` is unknown.
    /// - [`GeometryError::InvalidColorIndex`] if `color` is outside the palette.
    /// - [`GeometryError::Degenerate`] if the triangle or the polygon is degenerate.
    pub fn paint_sub_triangle_area(
        &mut self,
        id: TriangleId,
        polygon: Vec<Point3>,
        color: ColorIndex,
    ) -> Result<()> {
        self.execute(GeometryCommand::PaintSubTriangleArea {
            triangle: id,
            polygon,
            color,
        })
    }

    // --- Spatial queries ---

    /// Rebuilds the spatial index and the halfedge view from the triangles.
    pub fn rebuild_spatial_index(&mut self) {
        let start = Instant::now();
        self.tree = AabbTree::build(&self.triangles);
        self.polyhedron = PolyhedronData::build(&self.triangles);
        info!(
            triangles = self.triangles.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "spatial index rebuilt"
        );
    }

    /// Finds the closest triangle hit by `ray`.
    #[must_use]
    pub fn cast_ray(&self, ray: &Ray) -> Option<RayHit> {
        self.closest_hit(ray, None)
    }

    /// Like [`cast_ray`](Self::cast_ray), ignoring one triangle.
    #[must_use]
    pub fn cast_ray_excluding(&self, ray: &Ray, excluded: TriangleId) -> Option<RayHit> {
        self.closest_hit(ray, Some(excluded))
    }

    fn closest_hit(&self, ray: &Ray, excluded: Option<TriangleId>) -> Option<RayHit> {
        let (index, t) = self.tree.closest_hit(ray, |i| {
            if excluded == Some(TriangleId(i)) {
                return None;
            }
            ray_triangle_intersect(ray, &self.triangles[i].vertices).first_t()
        })?;
        let triangle = &self.triangles[index];
        let (point, barycentric) = match ray_triangle_intersect(ray, &triangle.vertices) {
            RayTriangleIntersection::Point {
                point, barycentric, ..
            } => (point, barycentric),
            _ => {
                let point = ray.point_at(t);
                (point, triangle.barycentric(&point))
            }
        };
        Some(RayHit {
            triangle: triangle.id,
            point,
            barycentric,
            distance: t * ray.direction.norm(),
        })
    }

    /// Like [`cast_ray`](Self::cast_ray), but resolves the sub-triangle of a
    /// subdivided triangle.
    #[must_use]
    pub fn cast_ray_detailed(&self, ray: &Ray) -> Option<(DetailedTriangleId, RayHit)> {
        let hit = self.cast_ray(ray)?;
        let id = match self.details.get(&hit.triangle) {
            Some(detail) => DetailedTriangleId {
                base: hit.triangle,
                detail: detail.find(&hit.barycentric),
            },
            None => DetailedTriangleId::whole(hit.triangle),
        };
        Some((id, hit))
    }

    // --- SDF ---

    /// Stores per-triangle SDF values computed by [`crate::segmentation::compute_sdf`].
    ///
    /// # Errors
    ///
    /// Returns [`SegmentationError::SdfValues`] if the value count does not
    /// match the triangle count.
    pub fn set_sdf_values(&mut self, values: Vec<f64>) -> Result<()> {
        if values.len() != self.triangles.len() {
            return Err(SegmentationError::SdfValues(format!(
                "{} values for {} triangles",
                values.len(),
                self.triangles.len()
            ))
            .into());
        }
        self.sdf = Some(values);
        Ok(())
    }

    /// Returns `true` once SDF values are available.
    #[must_use]
    pub fn has_sdf(&self) -> bool {
        self.sdf.is_some()
    }

    /// Normalized SDF value of a triangle.
    ///
    /// # Errors
    ///
    /// - [`GeometryError::InvalidTriangleId`] if `id` is unknown.
    /// - [`SegmentationError::SdfNotComputed`] if SDF values are missing.
    pub fn sdf_value(&self, id: TriangleId) -> Result<f64> {
        self.triangle(id)?;
        let values = self.sdf.as_ref().ok_or(SegmentationError::SdfNotComputed)?;
        Ok(values[id.0])
    }

    /// All normalized SDF values, if computed.
    #[must_use]
    pub fn sdf_values(&self) -> Option<&[f64]> {
        self.sdf.as_deref()
    }

    // --- Export ---

    /// Groups all triangles and sub-triangles into one mesh per color.
    #[must_use]
    pub fn export_meshes(&self) -> Vec<ExportMesh> {
        let mut builder = ExportBuilder::new();
        for triangle in &self.triangles {
            match self.details.get(&triangle.id) {
                Some(detail) => {
                    for (index, face) in detail.triangles().iter().enumerate() {
                        if let Ok(vertices) = detail.world_vertices(index) {
                            builder.push_triangle(face.info.color, vertices, triangle.normal);
                        }
                    }
                }
                None => builder.push_triangle(triangle.color, triangle.vertices, triangle.normal),
            }
        }
        builder.finish()
    }

    fn existing_detail(&self, base: TriangleId, detail: usize) -> Result<&TriangleDetail> {
        self.triangle(base)?;
        self.details.get(&base).ok_or_else(|| {
            GeometryError::InvalidDetailId {
                base: base.0,
                detail,
            }
            .into()
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::mesh::fixtures;
    use approx::assert_relative_eq;

    fn pair() -> Geometry {
        Geometry::from_triangles(fixtures::triangle_pair()).unwrap()
    }

    #[test]
    fn construction_renumbers_and_indexes() {
        let mut tris = fixtures::cube();
        tris.reverse();
        let g = Geometry::from_triangles(tris).unwrap();
        for (i, t) in g.triangles().iter().enumerate() {
            assert_eq!(t.id, TriangleId(i));
        }
        assert!(g.polyhedron().is_closed());
    }

    #[test]
    fn soup_is_imported_and_joined() {
        let soup = TriangleSoup::indexed(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        );
        let g = Geometry::from_soup(&soup).unwrap();
        assert_eq!(g.triangle_count(), 2);
        assert_eq!(g.polyhedron().neighbours(TriangleId(0)), vec![TriangleId(1)]);
        assert!(g.triangles().iter().all(|t| t.color == 0));
    }

    #[test]
    fn empty_mesh_is_rejected() {
        assert!(matches!(
            Geometry::from_triangles(Vec::new()),
            Err(Error::Import(ImportError::EmptyMesh))
        ));
    }

    #[test]
    fn unknown_triangle_is_reported() {
        let mut g = pair();
        assert!(matches!(
            g.paint_triangle(TriangleId(5), 1),
            Err(Error::Geometry(GeometryError::InvalidTriangleId { id: 5, count: 2 }))
        ));
        assert!(!g.can_undo());
    }

    #[test]
    fn invalid_color_is_reported() {
        let mut g = pair();
        assert!(matches!(
            g.paint_triangle(TriangleId(0), 9),
            Err(Error::Geometry(GeometryError::InvalidColorIndex { index: 9, .. }))
        ));
    }

    #[test]
    fn two_paints_and_two_undos_restore_color() {
        let mut g = pair();
        let t = TriangleId(1);
        let original = g.triangle_color(t).unwrap();
        g.paint_triangle(t, 2).unwrap();
        g.paint_triangle(t, 3).unwrap();
        assert_eq!(g.triangle_color(t).unwrap(), 3);
        assert!(g.undo());
        assert!(g.undo());
        assert_eq!(g.triangle_color(t).unwrap(), original);
        assert!(!g.undo());
        assert!(g.redo());
        assert_eq!(g.triangle_color(t).unwrap(), 2);
    }

    #[test]
    fn paint_region_is_one_step() {
        let mut g = pair();
        let before = g.snapshot();
        g.paint_region(vec![TriangleId(0), TriangleId(1)], 1).unwrap();
        assert_eq!(g.triangle_color(TriangleId(0)).unwrap(), 1);
        assert_eq!(g.triangle_color(TriangleId(1)).unwrap(), 1);
        g.undo();
        assert_eq!(g.snapshot(), before);
    }

    #[test]
    fn sub_triangle_paint_creates_detail() {
        let mut g = pair();
        let square = vec![
            Point3::new(0.6, 0.1, 0.0),
            Point3::new(0.9, 0.1, 0.0),
            Point3::new(0.9, 0.4, 0.0),
            Point3::new(0.6, 0.4, 0.0),
        ];
        g.paint_sub_triangle_area(TriangleId(0), square, 2).unwrap();
        assert!(!g.is_simple_triangle(TriangleId(0)));
        let detail = g.detail(TriangleId(0)).unwrap();
        let base_area = g.triangle(TriangleId(0)).unwrap().area();
        assert_relative_eq!(detail.area(), base_area, epsilon = 1e-9);
        for i in 0..detail.len() {
            assert!(detail.area_of(i).unwrap() > 0.0);
        }
        g.undo();
        assert!(g.is_simple_triangle(TriangleId(0)));
    }

    #[test]
    fn degenerate_sub_area_leaves_geometry_unchanged() {
        let mut g = pair();
        let before = g.snapshot();
        let line = vec![
            Point3::new(0.6, 0.1, 0.0),
            Point3::new(0.7, 0.2, 0.0),
            Point3::new(0.8, 0.3, 0.0),
        ];
        assert!(g.paint_sub_triangle_area(TriangleId(0), line, 2).is_err());
        assert_eq!(g.snapshot(), before);
        assert!(!g.can_undo());
    }

    #[test]
    fn sub_area_missing_the_triangle_is_rejected() {
        let mut g = pair();
        let before = g.snapshot();
        // Lies over triangle 1 only.
        let square = vec![
            Point3::new(0.1, 0.6, 0.0),
            Point3::new(0.3, 0.6, 0.0),
            Point3::new(0.3, 0.9, 0.0),
            Point3::new(0.1, 0.9, 0.0),
        ];
        assert!(matches!(
            g.paint_sub_triangle_area(TriangleId(0), square.clone(), 2),
            Err(Error::Geometry(GeometryError::Degenerate(_)))
        ));
        assert_eq!(g.snapshot(), before);
        assert!(!g.can_undo());

        g.paint_sub_triangle_area(TriangleId(1), square, 2).unwrap();
        assert!(!g.is_simple_triangle(TriangleId(1)));
    }

    #[test]
    fn cast_ray_finds_closest_triangle() {
        let g = Geometry::from_triangles(fixtures::cube()).unwrap();
        let hit = g
            .cast_ray(&Ray::new(Point3::new(0.25, 0.5, -3.0), Vector3::z()))
            .unwrap();
        assert_relative_eq!(hit.distance, 3.0, epsilon = 1e-9);
        assert_relative_eq!(hit.point.z, 0.0, epsilon = 1e-9);
        assert!(g.triangle(hit.triangle).unwrap().normal.z < -0.9);
        assert_relative_eq!(hit.barycentric.sum(), 1.0, epsilon = 1e-9);

        assert!(g.cast_ray(&Ray::new(Point3::new(5.0, 5.0, -3.0), Vector3::z())).is_none());
    }

    #[test]
    fn cast_ray_detailed_resolves_sub_triangle() {
        let mut g = pair();
        let square = vec![
            Point3::new(0.6, 0.1, 0.0),
            Point3::new(0.9, 0.1, 0.0),
            Point3::new(0.9, 0.4, 0.0),
            Point3::new(0.6, 0.4, 0.0),
        ];
        g.paint_sub_triangle_area(TriangleId(0), square, 2).unwrap();
        let (id, _) = g
            .cast_ray_detailed(&Ray::new(Point3::new(0.75, 0.25, 1.0), -Vector3::z()))
            .unwrap();
        assert_eq!(id.base, TriangleId(0));
        assert!(id.detail.is_some());
        assert_eq!(g.detailed_color(id).unwrap(), 2);

        let (outside, _) = g
            .cast_ray_detailed(&Ray::new(Point3::new(0.95, 0.6, 1.0), -Vector3::z()))
            .unwrap();
        assert_eq!(g.detailed_color(outside).unwrap(), 0);
    }

    #[test]
    fn export_groups_detail_faces_by_color() {
        let mut g = pair();
        let square = vec![
            Point3::new(0.6, 0.1, 0.0),
            Point3::new(0.9, 0.1, 0.0),
            Point3::new(0.9, 0.4, 0.0),
            Point3::new(0.6, 0.4, 0.0),
        ];
        g.paint_sub_triangle_area(TriangleId(0), square, 2).unwrap();
        let meshes = g.export_meshes();
        assert_eq!(meshes.len(), 2);
        let area = |m: &ExportMesh| -> f64 {
            m.indices
                .iter()
                .map(|[a, b, c]| {
                    let corner = |i: &u32| m.vertices[*i as usize];
                    let (a, b, c) = (corner(a), corner(b), corner(c));
                    (b - a).cross(&(c - a)).norm() * 0.5
                })
                .sum()
        };
        assert_relative_eq!(area(&meshes[1]), 0.09, epsilon = 1e-9);
        assert_relative_eq!(area(&meshes[0]) + area(&meshes[1]), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn sdf_values_require_computation() {
        let mut g = pair();
        assert!(matches!(
            g.sdf_value(TriangleId(0)),
            Err(Error::Segmentation(SegmentationError::SdfNotComputed))
        ));
        assert!(g.set_sdf_values(vec![0.5]).is_err());
        g.set_sdf_values(vec![0.25, 0.75]).unwrap();
        assert_relative_eq!(g.sdf_value(TriangleId(1)).unwrap(), 0.75);
    }

    #[test]
    fn state_round_trips_through_serde() {
        let mut g = pair();
        g.paint_triangle(TriangleId(1), 3).unwrap();
        let state = g.snapshot();
        let json = serde_json::to_string(&state).unwrap();
        let back: GeometryState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
