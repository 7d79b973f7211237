//! Triangle mesh data: triangles and their identifiers, import from a raw
//! triangle soup, the derived halfedge and bounding-volume structures, and
//! per-color export buffers.

mod aabb_tree;
mod export;
mod import;
mod polyhedron;
mod triangle;

#[cfg(test)]
pub(crate) mod fixtures;

pub use aabb_tree::{Aabb, AabbTree};
pub use export::{ExportBuilder, ExportMesh};
pub use import::{triangles_from_soup, TriangleSoup};
pub use polyhedron::{HalfedgeData, HalfedgeKey, PolyhedronData, VertexData, VertexKey};
pub use triangle::{
    face_normal, triangle_area, ColorIndex, DataTriangle, DetailedTriangleId, TriangleId,
};
