use crate::driver::{
    BufferId, BufferTarget, DriverError, GraphicsDriver, IndexType, VertexArrayId, VertexAttribute,
};

use super::{GeometryError, Mesh, Vertex};

/// Attribute 0: three tightly packed floats per vertex.
pub const POSITION_ATTRIBUTE: VertexAttribute = VertexAttribute {
    index: 0,
    components: 3,
    stride: std::mem::size_of::<Vertex>() as u32,
    offset: 0,
};

/// Driver objects holding an uploaded mesh.
///
/// Release with [`GeometryHandles::release`]; the handles are not usable afterwards.
#[derive(Debug)]
pub struct GeometryHandles {
    pub vertex_array: VertexArrayId,
    pub vertex_buffer: BufferId,
    pub index_buffer: BufferId,
    pub index_count: u32,
    pub index_type: IndexType,
}

/// Uploads `mesh` and records its layout.
///
/// Order matters:
/// 1. the layout object is bound before the index buffer, which records into it
/// 2. the attribute is described after the vertex buffer it reads from is bound
pub fn upload_mesh<D>(driver: &mut D, mesh: &Mesh<'_>) -> Result<GeometryHandles, GeometryError>
where
    D: GraphicsDriver + ?Sized,
{
    mesh.validate()?;

    let vertex_array = driver.create_vertex_array();
    let vertex_buffer = driver.create_buffer();
    let index_buffer = driver.create_buffer();

    let handles = GeometryHandles {
        vertex_array,
        vertex_buffer,
        index_buffer,
        index_count: mesh.index_count(),
        index_type: IndexType::U32,
    };

    if let Err(err) = record_layout(driver, &handles, mesh) {
        // Objects were created; do not leak them on a half-recorded layout.
        if let Err(cleanup) = handles.release(driver) {
            log::warn!("failed to release a partially uploaded mesh: {cleanup}");
        }
        return Err(err.into());
    }

    log::debug!(
        "uploaded mesh: {} vertices, {} indices",
        mesh.vertices.len(),
        mesh.indices.len()
    );
    Ok(handles)
}

fn record_layout<D>(driver: &mut D, h: &GeometryHandles, mesh: &Mesh<'_>) -> Result<(), DriverError>
where
    D: GraphicsDriver + ?Sized,
{
    driver.bind_vertex_array(Some(h.vertex_array))?;

    driver.bind_buffer(BufferTarget::Array, Some(h.vertex_buffer))?;
    driver.buffer_data(BufferTarget::Array, mesh.vertex_bytes())?;

    driver.bind_buffer(BufferTarget::ElementArray, Some(h.index_buffer))?;
    driver.buffer_data(BufferTarget::ElementArray, mesh.index_bytes())?;

    driver.vertex_attrib_pointer(POSITION_ATTRIBUTE)?;
    driver.enable_vertex_attrib(POSITION_ATTRIBUTE.index)?;

    // The layout object keeps its element binding; the array binding is global.
    driver.bind_buffer(BufferTarget::Array, None)?;
    driver.bind_vertex_array(None)?;
    Ok(())
}

impl GeometryHandles {
    /// Deletes the layout object, then the vertex buffer, then the index buffer.
    ///
    /// Every deletion is attempted; the first error is returned.
    pub fn release<D>(self, driver: &mut D) -> Result<(), DriverError>
    where
        D: GraphicsDriver + ?Sized,
    {
        let results = [
            driver.delete_vertex_array(self.vertex_array),
            driver.delete_buffer(self.vertex_buffer),
            driver.delete_buffer(self.index_buffer),
        ];
        results.into_iter().collect()
    }
}
