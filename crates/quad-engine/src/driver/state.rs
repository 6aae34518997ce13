use std::collections::HashMap;

use crate::coords::{ColorRgba, Viewport};
use crate::shader::LinkedProgram;

use super::{
    BufferId, BufferTarget, DriverError, IndexType, PolygonMode, ProgramId, VertexArrayId,
    VertexAttribute,
};

/// Number of vertex attribute slots per vertex-layout object.
pub const MAX_VERTEX_ATTRIBS: u32 = 16;

/// What the driver needs to know about a program at draw time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramRecord {
    /// False when linking failed; draws are skipped.
    pub usable: bool,
    /// Vertex input locations read by the vertex stage.
    pub vertex_inputs: Vec<u32>,
}

impl ProgramRecord {
    pub fn from_linked(program: &LinkedProgram) -> Self {
        Self {
            usable: program.status(),
            vertex_inputs: program.vertex_inputs().iter().map(|i| i.location).collect(),
        }
    }
}

#[derive(Debug, Default)]
struct BufferRecord {
    len: u64,
}

#[derive(Debug, Copy, Clone)]
struct AttributeSlot {
    layout: VertexAttribute,
    buffer: BufferId,
    enabled: bool,
}

#[derive(Debug, Default)]
struct VertexArrayRecord {
    element_buffer: Option<BufferId>,
    attributes: HashMap<u32, AttributeSlot>,
    // Enabled before being described; picked up by the next description.
    pending_enables: Vec<u32>,
}

/// Attribute as resolved for a draw.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BoundAttribute {
    pub layout: VertexAttribute,
    pub buffer: BufferId,
}

/// Fully resolved draw: everything a backend needs to encode it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawCall {
    pub program: ProgramId,
    pub vertex_array: VertexArrayId,
    pub element_buffer: BufferId,
    pub index_type: IndexType,
    pub count: u32,
    pub polygon_mode: PolygonMode,
    /// Enabled attributes, sorted by location.
    pub attributes: Vec<BoundAttribute>,
}

/// Object tables plus the current bindings of a driver.
///
/// Enforces the ordering rules of the bind-then-operate model:
/// - element-array bindings are recorded into the bound vertex-layout object,
///   so one must be bound first
/// - an attribute description captures the array buffer bound at that moment
#[derive(Debug)]
pub struct ObjectState {
    next_id: u32,

    buffers: HashMap<BufferId, BufferRecord>,
    vertex_arrays: HashMap<VertexArrayId, VertexArrayRecord>,
    programs: HashMap<ProgramId, ProgramRecord>,

    array_buffer: Option<BufferId>,
    vertex_array: Option<VertexArrayId>,
    program: Option<ProgramId>,

    pub viewport: Viewport,
    pub polygon_mode: PolygonMode,
    pub clear_color: ColorRgba,
}

impl ObjectState {
    /// `viewport` is the initial viewport, normally the full framebuffer.
    pub fn new(viewport: Viewport) -> Self {
        Self {
            next_id: 1,
            buffers: HashMap::new(),
            vertex_arrays: HashMap::new(),
            programs: HashMap::new(),
            array_buffer: None,
            vertex_array: None,
            program: None,
            viewport,
            polygon_mode: PolygonMode::Fill,
            clear_color: ColorRgba::new(0.0, 0.0, 0.0, 0.0),
        }
    }

    fn alloc(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    /// Number of buffers, vertex arrays and programs still alive.
    pub fn live_objects(&self) -> usize {
        self.buffers.len() + self.vertex_arrays.len() + self.programs.len()
    }

    // ── object tables ─────────────────────────────────────────────────────

    pub fn create_buffer(&mut self) -> BufferId {
        let id = BufferId(self.alloc());
        self.buffers.insert(id, BufferRecord::default());
        id
    }

    pub fn delete_buffer(&mut self, id: BufferId) -> Result<(), DriverError> {
        self.buffers.remove(&id).ok_or(DriverError::UnknownBuffer(id))?;

        if self.array_buffer == Some(id) {
            self.array_buffer = None;
        }
        // Deleting a buffer detaches it from every layout object that refers to it.
        for vao in self.vertex_arrays.values_mut() {
            if vao.element_buffer == Some(id) {
                vao.element_buffer = None;
            }
            vao.attributes.retain(|_, slot| slot.buffer != id);
        }
        Ok(())
    }

    pub fn create_vertex_array(&mut self) -> VertexArrayId {
        let id = VertexArrayId(self.alloc());
        self.vertex_arrays.insert(id, VertexArrayRecord::default());
        id
    }

    pub fn delete_vertex_array(&mut self, id: VertexArrayId) -> Result<(), DriverError> {
        self.vertex_arrays
            .remove(&id)
            .ok_or(DriverError::UnknownVertexArray(id))?;
        if self.vertex_array == Some(id) {
            self.vertex_array = None;
        }
        Ok(())
    }

    pub fn create_program(&mut self, record: ProgramRecord) -> ProgramId {
        let id = ProgramId(self.alloc());
        self.programs.insert(id, record);
        id
    }

    pub fn delete_program(&mut self, id: ProgramId) -> Result<(), DriverError> {
        self.programs.remove(&id).ok_or(DriverError::UnknownProgram(id))?;
        if self.program == Some(id) {
            self.program = None;
        }
        Ok(())
    }

    pub fn program(&self, id: ProgramId) -> Option<&ProgramRecord> {
        self.programs.get(&id)
    }

    pub fn buffer_len(&self, id: BufferId) -> Option<u64> {
        self.buffers.get(&id).map(|b| b.len)
    }

    // ── bindings ──────────────────────────────────────────────────────────

    pub fn bind_vertex_array(&mut self, id: Option<VertexArrayId>) -> Result<(), DriverError> {
        if let Some(id) = id {
            if !self.vertex_arrays.contains_key(&id) {
                return Err(DriverError::UnknownVertexArray(id));
            }
        }
        self.vertex_array = id;
        Ok(())
    }

    pub fn bound_vertex_array(&self) -> Option<VertexArrayId> {
        self.vertex_array
    }

    pub fn bind_buffer(
        &mut self,
        target: BufferTarget,
        id: Option<BufferId>,
    ) -> Result<(), DriverError> {
        if let Some(id) = id {
            if !self.buffers.contains_key(&id) {
                return Err(DriverError::UnknownBuffer(id));
            }
        }

        match target {
            BufferTarget::Array => {
                self.array_buffer = id;
            }
            BufferTarget::ElementArray => {
                let vao = self.bound_vertex_array_mut()?;
                vao.element_buffer = id;
            }
        }
        Ok(())
    }

    /// Buffer currently bound to `target`.
    pub fn bound_buffer(&self, target: BufferTarget) -> Option<BufferId> {
        match target {
            BufferTarget::Array => self.array_buffer,
            BufferTarget::ElementArray => self
                .vertex_array
                .and_then(|id| self.vertex_arrays.get(&id))
                .and_then(|vao| vao.element_buffer),
        }
    }

    /// Records a data upload of `len` bytes to the buffer bound at `target`.
    ///
    /// Returns the id of the buffer that received the data.
    pub fn buffer_data(&mut self, target: BufferTarget, len: u64) -> Result<BufferId, DriverError> {
        let id = self
            .bound_buffer(target)
            .ok_or(DriverError::NoBufferBound(target))?;
        let record = self
            .buffers
            .get_mut(&id)
            .ok_or(DriverError::UnknownBuffer(id))?;
        record.len = len;
        Ok(id)
    }

    pub fn vertex_attrib_pointer(&mut self, layout: VertexAttribute) -> Result<(), DriverError> {
        check_attribute_index(layout.index)?;
        if !(1..=4).contains(&layout.components) {
            return Err(DriverError::InvalidComponentCount {
                index: layout.index,
                components: layout.components,
            });
        }

        let buffer = self
            .array_buffer
            .ok_or(DriverError::NoBufferBound(BufferTarget::Array))?;
        let vao = self.bound_vertex_array_mut()?;

        let enabled = match vao.pending_enables.iter().position(|&i| i == layout.index) {
            Some(pos) => {
                vao.pending_enables.swap_remove(pos);
                true
            }
            None => vao
                .attributes
                .get(&layout.index)
                .is_some_and(|slot| slot.enabled),
        };

        vao.attributes.insert(layout.index, AttributeSlot { layout, buffer, enabled });
        Ok(())
    }

    pub fn enable_vertex_attrib(&mut self, index: u32) -> Result<(), DriverError> {
        check_attribute_index(index)?;
        let vao = self.bound_vertex_array_mut()?;
        match vao.attributes.get_mut(&index) {
            Some(slot) => slot.enabled = true,
            None => {
                if !vao.pending_enables.contains(&index) {
                    vao.pending_enables.push(index);
                }
            }
        }
        Ok(())
    }

    pub fn use_program(&mut self, id: Option<ProgramId>) -> Result<(), DriverError> {
        if let Some(id) = id {
            if !self.programs.contains_key(&id) {
                return Err(DriverError::UnknownProgram(id));
            }
        }
        self.program = id;
        Ok(())
    }

    pub fn bound_program(&self) -> Option<ProgramId> {
        self.program
    }

    // ── draws ─────────────────────────────────────────────────────────────

    /// Resolves an indexed draw against the current bindings.
    ///
    /// Returns `Ok(None)` when the current program failed to link: the draw has
    /// no defined output and is skipped.
    pub fn prepare_draw(
        &self,
        count: u32,
        index_type: IndexType,
    ) -> Result<Option<DrawCall>, DriverError> {
        let program_id = self.program.ok_or(DriverError::NoProgram)?;
        let program = self
            .programs
            .get(&program_id)
            .ok_or(DriverError::UnknownProgram(program_id))?;

        let vao_id = self.vertex_array.ok_or(DriverError::NoVertexArrayBound)?;
        let vao = self
            .vertex_arrays
            .get(&vao_id)
            .ok_or(DriverError::UnknownVertexArray(vao_id))?;

        let element_buffer = vao
            .element_buffer
            .ok_or(DriverError::NoBufferBound(BufferTarget::ElementArray))?;
        let available = self
            .buffer_len(element_buffer)
            .ok_or(DriverError::UnknownBuffer(element_buffer))?
            / index_type.size();
        if u64::from(count) > available {
            return Err(DriverError::IndexRangeExceeded { count, available });
        }

        if !program.usable {
            return Ok(None);
        }

        let mut attributes: Vec<BoundAttribute> = vao
            .attributes
            .values()
            .filter(|slot| slot.enabled)
            .map(|slot| BoundAttribute { layout: slot.layout, buffer: slot.buffer })
            .collect();
        attributes.sort_by_key(|a| a.layout.index);

        for &location in &program.vertex_inputs {
            if !attributes.iter().any(|a| a.layout.index == location) {
                return Err(DriverError::MissingVertexInput(location));
            }
        }

        Ok(Some(DrawCall {
            program: program_id,
            vertex_array: vao_id,
            element_buffer,
            index_type,
            count,
            polygon_mode: self.polygon_mode,
            attributes,
        }))
    }

    fn bound_vertex_array_mut(&mut self) -> Result<&mut VertexArrayRecord, DriverError> {
        let id = self.vertex_array.ok_or(DriverError::NoVertexArrayBound)?;
        self.vertex_arrays
            .get_mut(&id)
            .ok_or(DriverError::UnknownVertexArray(id))
    }
}

fn check_attribute_index(index: u32) -> Result<(), DriverError> {
    if index >= MAX_VERTEX_ATTRIBS {
        Err(DriverError::AttributeOutOfRange { index })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position_attr() -> VertexAttribute {
        VertexAttribute { index: 0, components: 3, stride: 12, offset: 0 }
    }

    fn usable(inputs: &[u32]) -> ProgramRecord {
        ProgramRecord { usable: true, vertex_inputs: inputs.to_vec() }
    }

    /// Builds the quad layout in the canonical order and returns (state, vao, vbo, ebo).
    fn quad_state() -> (ObjectState, VertexArrayId, BufferId, BufferId) {
        let mut s = ObjectState::new(Viewport::from_size(800, 600));
        let vao = s.create_vertex_array();
        let vbo = s.create_buffer();
        let ebo = s.create_buffer();

        s.bind_vertex_array(Some(vao)).unwrap();
        s.bind_buffer(BufferTarget::Array, Some(vbo)).unwrap();
        s.buffer_data(BufferTarget::Array, 48).unwrap();
        s.bind_buffer(BufferTarget::ElementArray, Some(ebo)).unwrap();
        s.buffer_data(BufferTarget::ElementArray, 24).unwrap();
        s.vertex_attrib_pointer(position_attr()).unwrap();
        s.enable_vertex_attrib(0).unwrap();
        (s, vao, vbo, ebo)
    }

    // ── ordering rules ────────────────────────────────────────────────────

    #[test]
    fn element_binding_requires_a_vertex_array() {
        let mut s = ObjectState::new(Viewport::default());
        let ebo = s.create_buffer();
        assert_eq!(
            s.bind_buffer(BufferTarget::ElementArray, Some(ebo)),
            Err(DriverError::NoVertexArrayBound)
        );
    }

    #[test]
    fn element_binding_is_recorded_into_the_vertex_array() {
        let (mut s, vao, _, ebo) = quad_state();
        s.bind_vertex_array(None).unwrap();
        assert_eq!(s.bound_buffer(BufferTarget::ElementArray), None);

        s.bind_vertex_array(Some(vao)).unwrap();
        assert_eq!(s.bound_buffer(BufferTarget::ElementArray), Some(ebo));
    }

    #[test]
    fn array_binding_is_global() {
        let (mut s, _, vbo, _) = quad_state();
        s.bind_vertex_array(None).unwrap();
        assert_eq!(s.bound_buffer(BufferTarget::Array), Some(vbo));
    }

    #[test]
    fn attribute_requires_a_bound_array_buffer() {
        let mut s = ObjectState::new(Viewport::default());
        let vao = s.create_vertex_array();
        s.bind_vertex_array(Some(vao)).unwrap();
        assert_eq!(
            s.vertex_attrib_pointer(position_attr()),
            Err(DriverError::NoBufferBound(BufferTarget::Array))
        );
    }

    #[test]
    fn attribute_captures_the_buffer_bound_at_description_time() {
        let (mut s, _, vbo, _) = quad_state();
        let other = s.create_buffer();
        s.bind_buffer(BufferTarget::Array, Some(other)).unwrap();
        let p = s.create_program(usable(&[0]));
        s.use_program(Some(p)).unwrap();

        let draw = s.prepare_draw(6, IndexType::U32).unwrap().unwrap();
        assert_eq!(draw.attributes[0].buffer, vbo);
    }

    #[test]
    fn upload_without_binding_fails() {
        let mut s = ObjectState::new(Viewport::default());
        assert_eq!(
            s.buffer_data(BufferTarget::Array, 12),
            Err(DriverError::NoBufferBound(BufferTarget::Array))
        );
    }

    #[test]
    fn enable_before_describe_is_honored() {
        let mut s = ObjectState::new(Viewport::default());
        let vao = s.create_vertex_array();
        let vbo = s.create_buffer();
        let ebo = s.create_buffer();
        s.bind_vertex_array(Some(vao)).unwrap();
        s.enable_vertex_attrib(0).unwrap();
        s.bind_buffer(BufferTarget::Array, Some(vbo)).unwrap();
        s.vertex_attrib_pointer(position_attr()).unwrap();
        s.bind_buffer(BufferTarget::ElementArray, Some(ebo)).unwrap();
        s.buffer_data(BufferTarget::ElementArray, 24).unwrap();

        let p = s.create_program(usable(&[0]));
        s.use_program(Some(p)).unwrap();
        assert!(s.prepare_draw(6, IndexType::U32).unwrap().is_some());
    }

    #[test]
    fn attribute_index_and_components_are_checked() {
        let (mut s, ..) = quad_state();
        let mut a = position_attr();
        a.index = MAX_VERTEX_ATTRIBS;
        assert_eq!(
            s.vertex_attrib_pointer(a),
            Err(DriverError::AttributeOutOfRange { index: MAX_VERTEX_ATTRIBS })
        );

        let mut a = position_attr();
        a.components = 5;
        assert!(matches!(
            s.vertex_attrib_pointer(a),
            Err(DriverError::InvalidComponentCount { components: 5, .. })
        ));
    }

    // ── draws ─────────────────────────────────────────────────────────────

    #[test]
    fn draw_resolves_all_bindings() {
        let (mut s, vao, vbo, ebo) = quad_state();
        let p = s.create_program(usable(&[0]));
        s.use_program(Some(p)).unwrap();
        s.polygon_mode = PolygonMode::Line;

        let draw = s.prepare_draw(6, IndexType::U32).unwrap().unwrap();
        assert_eq!(draw.program, p);
        assert_eq!(draw.vertex_array, vao);
        assert_eq!(draw.element_buffer, ebo);
        assert_eq!(draw.count, 6);
        assert_eq!(draw.polygon_mode, PolygonMode::Line);
        assert_eq!(draw.attributes, vec![BoundAttribute { layout: position_attr(), buffer: vbo }]);
    }

    #[test]
    fn draw_without_program_fails() {
        let (s, ..) = quad_state();
        assert_eq!(s.prepare_draw(6, IndexType::U32), Err(DriverError::NoProgram));
    }

    #[test]
    fn draw_with_unusable_program_is_skipped() {
        let (mut s, ..) = quad_state();
        let p = s.create_program(ProgramRecord { usable: false, vertex_inputs: vec![] });
        s.use_program(Some(p)).unwrap();
        assert_eq!(s.prepare_draw(6, IndexType::U32), Ok(None));
    }

    #[test]
    fn draw_past_the_element_buffer_fails() {
        let (mut s, ..) = quad_state();
        let p = s.create_program(usable(&[0]));
        s.use_program(Some(p)).unwrap();
        assert_eq!(
            s.prepare_draw(7, IndexType::U32),
            Err(DriverError::IndexRangeExceeded { count: 7, available: 6 })
        );
    }

    #[test]
    fn draw_requires_every_program_input() {
        let (mut s, ..) = quad_state();
        let p = s.create_program(usable(&[0, 1]));
        s.use_program(Some(p)).unwrap();
        assert_eq!(s.prepare_draw(6, IndexType::U32), Err(DriverError::MissingVertexInput(1)));
    }

    // ── lifetimes ─────────────────────────────────────────────────────────

    #[test]
    fn deleting_everything_leaves_no_live_objects() {
        let (mut s, vao, vbo, ebo) = quad_state();
        let p = s.create_program(usable(&[0]));
        assert_eq!(s.live_objects(), 4);

        s.delete_vertex_array(vao).unwrap();
        s.delete_buffer(vbo).unwrap();
        s.delete_buffer(ebo).unwrap();
        s.delete_program(p).unwrap();
        assert_eq!(s.live_objects(), 0);
        assert_eq!(s.bound_vertex_array(), None);
        assert_eq!(s.bound_buffer(BufferTarget::Array), None);
    }

    #[test]
    fn double_delete_is_reported() {
        let (mut s, _, vbo, _) = quad_state();
        s.delete_buffer(vbo).unwrap();
        assert_eq!(s.delete_buffer(vbo), Err(DriverError::UnknownBuffer(vbo)));
    }

    #[test]
    fn deleted_element_buffer_detaches_from_vertex_array() {
        let (mut s, _, _, ebo) = quad_state();
        s.delete_buffer(ebo).unwrap();
        assert_eq!(s.bound_buffer(BufferTarget::ElementArray), None);
    }

    #[test]
    fn ids_are_unique_across_kinds() {
        let mut s = ObjectState::new(Viewport::default());
        let a = s.create_buffer();
        let b = s.create_vertex_array();
        let c = s.create_program(usable(&[]));
        assert_ne!(a.0, b.0);
        assert_ne!(b.0, c.0);
    }
}
