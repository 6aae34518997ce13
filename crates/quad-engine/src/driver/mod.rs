//! Graphics driver seam.
//!
//! The frame loop, geometry upload and teardown talk to the GPU only through
//! [`GraphicsDriver`]. Objects are addressed by small copyable ids; the driver
//! owns the backing resources. Binding rules are enforced by [`ObjectState`],
//! which every implementation embeds.

mod state;
mod wgpu_driver;

pub use state::{BoundAttribute, DrawCall, ObjectState, ProgramRecord, MAX_VERTEX_ATTRIBS};
pub use wgpu_driver::WgpuDriver;

use crate::coords::{ColorRgba, Viewport};
use crate::shader::LinkedProgram;

/// Handle to a data buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BufferId(pub(crate) u32);

/// Handle to a vertex-layout object.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VertexArrayId(pub(crate) u32);

/// Handle to a linked program.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ProgramId(pub(crate) u32);

/// Binding point of a buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex attribute data. Global binding.
    Array,
    /// Index data. Recorded into the bound vertex-layout object.
    ElementArray,
}

/// Rasterization mode for polygons.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PolygonMode {
    Fill,
    /// Outlines only (wireframe).
    Line,
}

impl From<PolygonMode> for wgpu::PolygonMode {
    fn from(mode: PolygonMode) -> Self {
        match mode {
            PolygonMode::Fill => wgpu::PolygonMode::Fill,
            PolygonMode::Line => wgpu::PolygonMode::Line,
        }
    }
}

/// Primitive assembly for indexed draws.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Topology {
    Triangles,
}

/// Element type of an index buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum IndexType {
    U16,
    U32,
}

impl IndexType {
    pub const fn size(self) -> u64 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

impl From<IndexType> for wgpu::IndexFormat {
    fn from(t: IndexType) -> Self {
        match t {
            IndexType::U16 => wgpu::IndexFormat::Uint16,
            IndexType::U32 => wgpu::IndexFormat::Uint32,
        }
    }
}

/// Layout of one float vertex attribute within its source buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// Shader input location.
    pub index: u32,
    /// Float components per vertex, 1..=4.
    pub components: u8,
    /// Byte distance between consecutive vertices; 0 means tightly packed.
    pub stride: u32,
    /// Byte offset of the first component.
    pub offset: u64,
}

impl VertexAttribute {
    /// Stride with the tightly-packed shorthand resolved.
    pub fn effective_stride(&self) -> u64 {
        if self.stride == 0 {
            u64::from(self.components) * std::mem::size_of::<f32>() as u64
        } else {
            u64::from(self.stride)
        }
    }

    pub fn format(&self) -> wgpu::VertexFormat {
        match self.components {
            1 => wgpu::VertexFormat::Float32,
            2 => wgpu::VertexFormat::Float32x2,
            3 => wgpu::VertexFormat::Float32x3,
            _ => wgpu::VertexFormat::Float32x4,
        }
    }
}

/// What happened to the frame handed to [`GraphicsDriver::present`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PresentOutcome {
    Presented,
    /// Surface was busy or being reconfigured; the frame was dropped.
    Skipped,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DriverError {
    #[error("unknown buffer {0:?}")]
    UnknownBuffer(BufferId),

    #[error("unknown vertex array {0:?}")]
    UnknownVertexArray(VertexArrayId),

    #[error("unknown program {0:?}")]
    UnknownProgram(ProgramId),

    #[error("no vertex array bound")]
    NoVertexArrayBound,

    #[error("no buffer bound to {0:?}")]
    NoBufferBound(BufferTarget),

    #[error("no program in use")]
    NoProgram,

    #[error("vertex attribute {index} is out of range (max {max})", max = MAX_VERTEX_ATTRIBS - 1)]
    AttributeOutOfRange { index: u32 },

    #[error("vertex attribute {index} has {components} components (expected 1..=4)")]
    InvalidComponentCount { index: u32, components: u8 },

    #[error("vertex attribute {0} was never described")]
    UndescribedAttribute(u32),

    #[error("program reads vertex input {0} but no enabled attribute feeds it")]
    MissingVertexInput(u32),

    #[error("draw of {count} indices exceeds the {available} held by the element buffer")]
    IndexRangeExceeded { count: u32, available: u64 },

    #[error("surface error: {0}")]
    Surface(String),
}

/// Driver operations consumed by geometry upload, the frame loop and teardown.
///
/// The call shape mirrors a classic bind-then-operate graphics API: most calls act
/// on whatever is currently bound.
pub trait GraphicsDriver {
    /// Sets the viewport rectangle applied to subsequent draws.
    fn set_viewport(&mut self, viewport: Viewport);

    fn viewport(&self) -> Viewport;

    fn set_polygon_mode(&mut self, mode: PolygonMode);

    /// Creates a program object from the link result.
    ///
    /// A failed link still yields a program id; draws against it are skipped.
    fn create_program(&mut self, program: &LinkedProgram) -> ProgramId;

    fn delete_program(&mut self, id: ProgramId) -> Result<(), DriverError>;

    fn create_vertex_array(&mut self) -> VertexArrayId;

    fn delete_vertex_array(&mut self, id: VertexArrayId) -> Result<(), DriverError>;

    fn create_buffer(&mut self) -> BufferId;

    fn delete_buffer(&mut self, id: BufferId) -> Result<(), DriverError>;

    /// Binds a vertex-layout object, or unbinds with `None`.
    fn bind_vertex_array(&mut self, id: Option<VertexArrayId>) -> Result<(), DriverError>;

    fn bind_buffer(&mut self, target: BufferTarget, id: Option<BufferId>) -> Result<(), DriverError>;

    /// Replaces the contents of the buffer bound to `target`.
    fn buffer_data(&mut self, target: BufferTarget, data: &[u8]) -> Result<(), DriverError>;

    /// Describes an attribute sourced from the currently bound array buffer.
    fn vertex_attrib_pointer(&mut self, attribute: VertexAttribute) -> Result<(), DriverError>;

    fn enable_vertex_attrib(&mut self, index: u32) -> Result<(), DriverError>;

    fn clear_color(&mut self, color: ColorRgba);

    /// Clears the color buffer to the current clear color.
    fn clear(&mut self);

    fn use_program(&mut self, id: Option<ProgramId>) -> Result<(), DriverError>;

    /// Draws `count` indices from the bound vertex-layout object's element buffer.
    fn draw_elements(
        &mut self,
        topology: Topology,
        count: u32,
        index_type: IndexType,
    ) -> Result<(), DriverError>;

    /// Presents the back buffer.
    fn present(&mut self) -> Result<PresentOutcome, DriverError>;
}
