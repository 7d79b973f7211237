use std::collections::BTreeMap;

use super::ColorIndex;
use crate::math::{Point3, Vector3};

/// Triangle buffer holding all exported faces of one color.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportMesh {
    /// Palette index shared by every face of this mesh.
    pub color: ColorIndex,
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Vertex normals (flat shading, one per vertex).
    pub normals: Vec<Vector3>,
    /// Triangle indices (each triple defines a triangle).
    pub indices: Vec<[u32; 3]>,
}

impl ExportMesh {
    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }
}

/// Accumulates colored triangles into per-color [`ExportMesh`] buffers.
#[derive(Debug, Default)]
pub struct ExportBuilder {
    meshes: BTreeMap<ColorIndex, ExportMesh>,
}

impl ExportBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a flat-shaded triangle of the given color.
    #[allow(clippy::cast_possible_truncation)]
    pub fn push_triangle(&mut self, color: ColorIndex, vertices: [Point3; 3], normal: Vector3) {
        let mesh = self.meshes.entry(color).or_insert_with(|| ExportMesh {
            color,
            ..ExportMesh::default()
        });
        let base = mesh.vertices.len() as u32;
        mesh.vertices.extend_from_slice(&vertices);
        mesh.normals.extend_from_slice(&[normal; 3]);
        mesh.indices.push([base, base + 1, base + 2]);
    }

    /// Returns the meshes ordered by color index.
    #[must_use]
    pub fn finish(self) -> Vec<ExportMesh> {
        self.meshes.into_values().collect()
    }
}
