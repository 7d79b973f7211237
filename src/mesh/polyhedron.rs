use std::collections::HashMap;

use slotmap::SlotMap;

use super::{DataTriangle, TriangleId};
use crate::math::Point3;

slotmap::new_key_type! {
    /// Unique identifier for a joined mesh vertex.
    pub struct VertexKey;
}

slotmap::new_key_type! {
    /// Unique identifier for a halfedge.
    pub struct HalfedgeKey;
}

/// Vertex of the halfedge view.
#[derive(Debug, Clone)]
pub struct VertexData {
    /// Position shared by all triangle corners joined into this vertex.
    pub position: Point3,
}

/// Directed edge of one triangle.
#[derive(Debug, Clone)]
pub struct HalfedgeData {
    /// Start vertex.
    pub origin: VertexKey,
    /// Triangle this halfedge belongs to.
    pub face: TriangleId,
    /// Next halfedge around the same triangle.
    pub next: HalfedgeKey,
    /// Opposite halfedge of the neighbouring triangle, `None` on a boundary.
    pub twin: Option<HalfedgeKey>,
}

/// Halfedge topology built from the triangle array.
///
/// Corners with bit-identical positions are joined into one vertex, with
/// `-0.0` treated as `0.0`. An edge
/// shared by exactly two triangles links their halfedges as twins; edges used
/// once (open boundary) or more than twice (non-manifold) stay unlinked.
#[derive(Debug, Default)]
pub struct PolyhedronData {
    vertices: SlotMap<VertexKey, VertexData>,
    halfedges: SlotMap<HalfedgeKey, HalfedgeData>,
    face_halfedge: Vec<HalfedgeKey>,
    non_manifold_edges: usize,
}

impl PolyhedronData {
    /// Builds the halfedge view of `triangles`.
    ///
    /// Triangle `i` of the slice must carry the identifier `TriangleId(i)`.
    #[must_use]
    pub fn build(triangles: &[DataTriangle]) -> Self {
        let mut poly = Self::default();
        let mut joined: HashMap<[u64; 3], VertexKey> = HashMap::new();
        let mut edges: HashMap<(VertexKey, VertexKey), Vec<HalfedgeKey>> = HashMap::new();

        for (index, tri) in triangles.iter().enumerate() {
            let corners = tri.vertices.map(|p| {
                let key = [joining_bits(p.x), joining_bits(p.y), joining_bits(p.z)];
                *joined
                    .entry(key)
                    .or_insert_with(|| poly.vertices.insert(VertexData { position: p }))
            });

            let face = TriangleId(index);
            let keys: [HalfedgeKey; 3] = corners.map(|origin| {
                poly.halfedges.insert(HalfedgeData {
                    origin,
                    face,
                    next: HalfedgeKey::default(),
                    twin: None,
                })
            });

            for i in 0..3 {
                if let Some(he) = poly.halfedges.get_mut(keys[i]) {
                    he.next = keys[(i + 1) % 3];
                }
                let (a, b) = (corners[i], corners[(i + 1) % 3]);
                let undirected = if a < b { (a, b) } else { (b, a) };
                edges.entry(undirected).or_default().push(keys[i]);
            }
            poly.face_halfedge.push(keys[0]);
        }

        for users in edges.values() {
            match users.as_slice() {
                [a, b] => {
                    if let Some(he) = poly.halfedges.get_mut(*a) {
                        he.twin = Some(*b);
                    }
                    if let Some(he) = poly.halfedges.get_mut(*b) {
                        he.twin = Some(*a);
                    }
                }
                [_] => {}
                _ => poly.non_manifold_edges += 1,
            }
        }

        poly
    }

    /// Number of joined vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of halfedges (three per triangle).
    #[must_use]
    pub fn halfedge_count(&self) -> usize {
        self.halfedges.len()
    }

    /// Number of triangles.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.face_halfedge.len()
    }

    /// Returns the vertex data.
    #[must_use]
    pub fn vertex(&self, key: VertexKey) -> Option<&VertexData> {
        self.vertices.get(key)
    }

    /// Returns the halfedge data.
    #[must_use]
    pub fn halfedge(&self, key: HalfedgeKey) -> Option<&HalfedgeData> {
        self.halfedges.get(key)
    }

    /// Halfedges of a triangle in corner order.
    #[must_use]
    pub fn face_halfedges(&self, face: TriangleId) -> Vec<HalfedgeKey> {
        let Some(&first) = self.face_halfedge.get(face.0) else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(3);
        let mut current = first;
        loop {
            out.push(current);
            match self.halfedges.get(current) {
                Some(he) if he.next != first && out.len() < 3 => current = he.next,
                _ => break,
            }
        }
        out
    }

    /// Edge-adjacent triangles in halfedge order.
    #[must_use]
    pub fn neighbours(&self, face: TriangleId) -> Vec<TriangleId> {
        self.face_halfedges(face)
            .into_iter()
            .filter_map(|key| self.halfedges.get(key)?.twin)
            .filter_map(|twin| self.halfedges.get(twin).map(|he| he.face))
            .collect()
    }

    /// Number of halfedges without a twin.
    #[must_use]
    pub fn boundary_halfedge_count(&self) -> usize {
        self.halfedges.values().filter(|he| he.twin.is_none()).count()
    }

    /// Number of edges shared by more than two triangles.
    #[must_use]
    pub fn non_manifold_edge_count(&self) -> usize {
        self.non_manifold_edges
    }

    /// A mesh is closed when every halfedge has a twin.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        !self.face_halfedge.is_empty() && self.boundary_halfedge_count() == 0
    }
}

/// Bit pattern used to join corners. Adding `+0.0` turns `-0.0` into `+0.0`
/// and leaves every other value unchanged.
fn joining_bits(value: f64) -> u64 {
    (value + 0.0).to_bits()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mesh::fixtures;

    #[test]
    fn tetrahedron_is_closed() {
        let poly = PolyhedronData::build(&fixtures::tetrahedron());
        assert_eq!(poly.vertex_count(), 4);
        assert_eq!(poly.halfedge_count(), 12);
        assert!(poly.is_closed());
        for face in 0..4 {
            assert_eq!(poly.neighbours(TriangleId(face)).len(), 3);
        }
    }

    #[test]
    fn cube_is_closed() {
        let poly = PolyhedronData::build(&fixtures::cube());
        assert_eq!(poly.vertex_count(), 8);
        assert_eq!(poly.face_count(), 12);
        assert!(poly.is_closed());
        assert_eq!(poly.non_manifold_edge_count(), 0);
    }

    #[test]
    fn quad_pair_shares_one_edge() {
        let poly = PolyhedronData::build(&fixtures::triangle_pair());
        assert_eq!(poly.neighbours(TriangleId(0)), vec![TriangleId(1)]);
        assert_eq!(poly.neighbours(TriangleId(1)), vec![TriangleId(0)]);
        assert!(!poly.is_closed());
        assert_eq!(poly.boundary_halfedge_count(), 4);
    }

    #[test]
    fn face_halfedges_cycle() {
        let poly = PolyhedronData::build(&fixtures::tetrahedron());
        let hes = poly.face_halfedges(TriangleId(2));
        assert_eq!(hes.len(), 3);
        for he in hes {
            assert_eq!(poly.halfedge(he).unwrap().face, TriangleId(2));
        }
        assert!(poly.face_halfedges(TriangleId(99)).is_empty());
    }

    fn negative_zero(triangles: &mut [DataTriangle], faces: impl Fn(usize) -> bool) {
        for tri in triangles.iter_mut().filter(|t| faces(t.id.0)) {
            for p in &mut tri.vertices {
                for c in p.iter_mut() {
                    if c.abs() < f64::EPSILON {
                        *c = -0.0;
                    }
                }
            }
        }
    }

    #[test]
    fn signed_zero_corners_are_joined() {
        let mut pair = fixtures::triangle_pair();
        negative_zero(&mut pair, |face| face == 1);
        let poly = PolyhedronData::build(&pair);
        assert_eq!(poly.vertex_count(), 4);
        assert_eq!(poly.neighbours(TriangleId(0)), vec![TriangleId(1)]);

        let mut cube = fixtures::cube();
        negative_zero(&mut cube, |face| face % 2 == 1);
        let poly = PolyhedronData::build(&cube);
        assert_eq!(poly.vertex_count(), 8);
        assert!(poly.is_closed());
    }
}
