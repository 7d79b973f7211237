pub mod color;
pub mod command;
pub mod detail;
pub mod error;
pub mod geometry;
pub mod jobs;
pub mod math;
pub mod mesh;
pub mod progress;
pub mod segmentation;
pub mod tools;

pub use color::{ColorManager, Rgba};
pub use command::{Command, CommandManager, Snapshot};
pub use error::{Error, Result};
pub use geometry::{Geometry, GeometryCommand, GeometryState};
