use thiserror::Error;

/// Top-level error type for the mesh painting core.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Segmentation(#[from] SegmentationError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Job(#[from] JobError),
}

/// Errors raised by mesh, detail and palette operations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("triangle {id} does not exist (mesh has {count} triangles)")]
    InvalidTriangleId { id: usize, count: usize },

    #[error("sub-triangle {detail} does not exist in the detail of triangle {base}")]
    InvalidDetailId { base: usize, detail: usize },

    #[error("color index {index} is outside of the palette (size {len})")]
    InvalidColorIndex { index: usize, len: usize },

    #[error("palette must keep at least one color")]
    EmptyPalette,

    #[error("palette is full ({max} colors)")]
    PaletteFull { max: usize },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,
}

/// Errors raised by SDF computation and segmentation.
#[derive(Debug, Error)]
pub enum SegmentationError {
    #[error("SDF values could not be computed: {0}")]
    SdfValues(String),

    #[error("SDF values have not been computed yet")]
    SdfNotComputed,

    #[error("segmentation produced {segments} segments, the palette holds at most {max}")]
    TooManySegments { segments: usize, max: usize },

    #[error("invalid segmentation parameters: {0}")]
    InvalidParameters(String),
}

/// Errors reported by the import collaborator contract.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("asset not found: {0}")]
    AssetNotFound(String),

    #[error("imported mesh contains no usable triangles")]
    EmptyMesh,

    #[error("vertex index {index} is out of range ({vertices} vertices)")]
    IndexOutOfRange { index: usize, vertices: usize },

    #[error("invalid import input: {0}")]
    InvalidInput(String),
}

/// Errors related to long-running background computations.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("computation was cancelled")]
    Cancelled,

    #[error("background worker panicked")]
    WorkerPanicked,

    #[error("geometry lock was poisoned")]
    LockPoisoned,
}

/// Convenience type alias for results using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
