//! Static scene geometry and its upload.
//!
//! The scene is one quad: 4 positions, 6 indices, two triangles sharing the
//! top-right/bottom-left diagonal. Data is uploaded once and never mutated.

mod mesh;
mod upload;

pub use mesh::{Mesh, Vertex, QUAD_INDICES, QUAD_VERTICES};
pub use upload::{upload_mesh, GeometryHandles, POSITION_ATTRIBUTE};

use crate::driver::DriverError;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GeometryError {
    #[error("index {index} at position {position} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        position: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("{0} indices do not form whole triangles")]
    IncompleteTriangle(usize),

    #[error("triangle {0} has zero area")]
    DegenerateTriangle(usize),

    #[error("upload failed: {0}")]
    Upload(#[from] DriverError),
}
