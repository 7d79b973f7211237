use serde::{Deserialize, Serialize};
use tracing::warn;

use super::triangle::face_normal;
use super::{DataTriangle, TriangleId};
use crate::error::{ImportError, Result};
use crate::math::{Point3, Vector3};

/// Raw mesh handed over by an import collaborator.
///
/// Without `indices`, consecutive triples of `positions` form triangles.
/// `normals`, when present, are per-position vertex normals used to orient
/// the triangles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangleSoup {
    /// Vertex positions.
    pub positions: Vec<Point3>,
    /// Optional triangle corner indices into `positions`.
    pub indices: Option<Vec<[usize; 3]>>,
    /// Optional vertex normals, one per position.
    pub normals: Option<Vec<Vector3>>,
}

impl TriangleSoup {
    /// Creates a soup where every three positions form a triangle.
    #[must_use]
    pub fn from_positions(positions: Vec<Point3>) -> Self {
        Self {
            positions,
            indices: None,
            normals: None,
        }
    }

    /// Creates an indexed soup.
    #[must_use]
    pub fn indexed(positions: Vec<Point3>, indices: Vec<[usize; 3]>) -> Self {
        Self {
            positions,
            indices: Some(indices),
            normals: None,
        }
    }

    /// Attaches vertex normals.
    #[must_use]
    pub fn with_normals(mut self, normals: Vec<Vector3>) -> Self {
        self.normals = Some(normals);
        self
    }
}

/// Converts a triangle soup into the triangle array owned by a geometry.
///
/// Degenerate triangles are dropped with a warning. Surviving triangles get
/// consecutive identifiers and color index 0. When vertex normals are given,
/// each triangle is flipped if its face normal disagrees with the average of
/// its corner normals.
///
/// # Errors
///
/// - [`ImportError::InvalidInput`] if the soup is not a whole number of triangles
///   or the normal count does not match the position count.
/// - [`ImportError::IndexOutOfRange`] if an index references a missing position.
/// - [`ImportError::EmptyMesh`] if no usable triangle remains.
pub fn triangles_from_soup(soup: &TriangleSoup) -> Result<Vec<DataTriangle>> {
    let vertex_count = soup.positions.len();

    if let Some(normals) = &soup.normals {
        if normals.len() != vertex_count {
            return Err(ImportError::InvalidInput(format!(
                "{} normals for {vertex_count} positions",
                normals.len()
            ))
            .into());
        }
    }

    let corners: Vec<[usize; 3]> = match &soup.indices {
        Some(indices) => {
            for &index in indices.iter().flatten() {
                if index >= vertex_count {
                    return Err(ImportError::IndexOutOfRange {
                        index,
                        vertices: vertex_count,
                    }
                    .into());
                }
            }
            indices.clone()
        }
        None => {
            if vertex_count % 3 != 0 {
                return Err(ImportError::InvalidInput(format!(
                    "{vertex_count} positions do not form whole triangles"
                ))
                .into());
            }
            (0..vertex_count / 3)
                .map(|i| [3 * i, 3 * i + 1, 3 * i + 2])
                .collect()
        }
    };

    let mut triangles = Vec::with_capacity(corners.len());
    let mut dropped = 0usize;
    for (source, [a, b, c]) in corners.into_iter().enumerate() {
        let mut vertices = [soup.positions[a], soup.positions[b], soup.positions[c]];
        let Some(normal) = face_normal(&vertices) else {
            dropped += 1;
            warn!(triangle = source, "dropping degenerate imported triangle");
            continue;
        };

        if let Some(normals) = &soup.normals {
            let average = normals[a] + normals[b] + normals[c];
            if average.dot(&normal) < 0.0 {
                vertices.swap(1, 2);
            }
        }

        triangles.push(DataTriangle::new(TriangleId(triangles.len()), vertices, 0)?);
    }

    if triangles.is_empty() {
        return Err(ImportError::EmptyMesh.into());
    }
    if dropped > 0 {
        warn!(dropped, kept = triangles.len(), "imported mesh contained degenerate triangles");
    }

    Ok(triangles)
}
