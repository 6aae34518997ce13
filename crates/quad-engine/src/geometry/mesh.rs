use bytemuck::{Pod, Zeroable};

use super::GeometryError;

/// Vertex with an object-space position only.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { position: [x, y, z] }
    }
}

/// Quad corners: top-right, bottom-right, bottom-left, top-left.
pub const QUAD_VERTICES: [Vertex; 4] = [
    Vertex::new(0.5, 0.5, 0.0),
    Vertex::new(0.5, -0.5, 0.0),
    Vertex::new(-0.5, -0.5, 0.0),
    Vertex::new(-0.5, 0.5, 0.0),
];

/// Two triangles sharing the 0-2 diagonal.
pub const QUAD_INDICES: [u32; 6] = [0, 2, 3, 0, 1, 2];

/// Indexed triangle list borrowed from static data.
#[derive(Debug, Copy, Clone)]
pub struct Mesh<'a> {
    pub vertices: &'a [Vertex],
    pub indices: &'a [u32],
}

impl Mesh<'static> {
    pub const fn quad() -> Self {
        Self {
            vertices: &QUAD_VERTICES,
            indices: &QUAD_INDICES,
        }
    }
}

impl<'a> Mesh<'a> {
    /// Checks that every index references a vertex and every triangle has area.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.indices.len() % 3 != 0 {
            return Err(GeometryError::IncompleteTriangle(self.indices.len()));
        }

        for (position, &index) in self.indices.iter().enumerate() {
            if index as usize >= self.vertices.len() {
                return Err(GeometryError::IndexOutOfRange {
                    position,
                    index,
                    vertex_count: self.vertices.len(),
                });
            }
        }

        for (i, tri) in self.triangles().enumerate() {
            if signed_area_xy(&tri) == 0.0 {
                return Err(GeometryError::DegenerateTriangle(i));
            }
        }

        Ok(())
    }

    /// Triangles in index order. Indices must be in range (see [`Mesh::validate`]).
    pub fn triangles(&self) -> impl Iterator<Item = [Vertex; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]].map(|i| self.vertices[i as usize]))
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn vertex_bytes(&self) -> &'a [u8] {
        bytemuck::cast_slice(self.vertices)
    }

    pub fn index_bytes(&self) -> &'a [u8] {
        bytemuck::cast_slice(self.indices)
    }
}

/// Signed area of the triangle's projection onto the XY plane (CCW positive).
pub(crate) fn signed_area_xy(tri: &[Vertex; 3]) -> f32 {
    let [a, b, c] = tri.map(|v| v.position);
    0.5 * ((b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1]))
}
