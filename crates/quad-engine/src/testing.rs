//! Test doubles for the driver and window-host seams.

use std::collections::{HashSet, VecDeque};

use crate::coords::{ColorRgba, Viewport};
use crate::driver::{
    BufferId, BufferTarget, DriverError, GraphicsDriver, IndexType, ObjectState, PolygonMode,
    PresentOutcome, ProgramId, ProgramRecord, Topology, VertexArrayId, VertexAttribute,
};
use crate::input::{InputEvent, InputState, Key, KeyState};
use crate::shader::LinkedProgram;
use crate::window::{HostEvent, WindowHost};

/// One recorded driver call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SetViewport(Viewport),
    SetPolygonMode(PolygonMode),
    CreateProgram(ProgramId),
    DeleteProgram(ProgramId),
    CreateVertexArray(VertexArrayId),
    DeleteVertexArray(VertexArrayId),
    CreateBuffer(BufferId),
    DeleteBuffer(BufferId),
    BindVertexArray(Option<VertexArrayId>),
    BindBuffer(BufferTarget, Option<BufferId>),
    BufferData(BufferTarget, usize),
    VertexAttribPointer(VertexAttribute),
    EnableVertexAttrib(u32),
    ClearColor(ColorRgba),
    Clear,
    UseProgram(Option<ProgramId>),
    DrawElements(Topology, u32, IndexType),
    Present,
}

/// Create/delete tallies per object kind.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ObjectCounts {
    pub created: usize,
    pub deleted: usize,
}

impl ObjectCounts {
    pub fn live(&self) -> usize {
        self.created - self.deleted
    }
}

/// In-memory driver sharing the binding rules of the real one.
#[derive(Debug)]
pub struct MockDriver {
    state: ObjectState,
    calls: Vec<Call>,

    pub buffers: ObjectCounts,
    pub vertex_arrays: ObjectCounts,
    pub programs: ObjectCounts,

    pub draws: usize,
    pub skipped_draws: usize,
    pub presents: usize,
    pub warnings: usize,

    /// Fail the present with this index (0-based) as a lost device would.
    pub fail_present_at: Option<usize>,
    /// Reject every buffer upload.
    pub fail_buffer_data: bool,
    /// Reject every delete without releasing the object.
    pub fail_deletes: bool,

    warned_unusable: HashSet<ProgramId>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::with_framebuffer(800, 600)
    }

    pub fn with_framebuffer(width: u32, height: u32) -> Self {
        Self {
            state: ObjectState::new(Viewport::from_size(width, height)),
            calls: Vec::new(),
            buffers: ObjectCounts::default(),
            vertex_arrays: ObjectCounts::default(),
            programs: ObjectCounts::default(),
            draws: 0,
            skipped_draws: 0,
            presents: 0,
            warnings: 0,
            fail_present_at: None,
            fail_buffer_data: false,
            fail_deletes: false,
            warned_unusable: HashSet::new(),
        }
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn state(&self) -> &ObjectState {
        &self.state
    }

    pub fn buffer_data_error() -> DriverError {
        DriverError::Surface("buffer upload rejected".to_string())
    }

    fn check_delete(&self) -> Result<(), DriverError> {
        if self.fail_deletes {
            return Err(DriverError::Surface("delete rejected".to_string()));
        }
        Ok(())
    }

    /// Objects created and never deleted, over every kind.
    pub fn leaked(&self) -> usize {
        self.buffers.live() + self.vertex_arrays.live() + self.programs.live()
    }
}

impl GraphicsDriver for MockDriver {
    fn set_viewport(&mut self, viewport: Viewport) {
        self.calls.push(Call::SetViewport(viewport));
        self.state.viewport = viewport;
    }

    fn viewport(&self) -> Viewport {
        self.state.viewport
    }

    fn set_polygon_mode(&mut self, mode: PolygonMode) {
        self.calls.push(Call::SetPolygonMode(mode));
        self.state.polygon_mode = mode;
    }

    fn create_program(&mut self, program: &LinkedProgram) -> ProgramId {
        let id = self.state.create_program(ProgramRecord::from_linked(program));
        self.programs.created += 1;
        self.calls.push(Call::CreateProgram(id));
        id
    }

    fn delete_program(&mut self, id: ProgramId) -> Result<(), DriverError> {
        self.calls.push(Call::DeleteProgram(id));
        self.check_delete()?;
        self.state.delete_program(id)?;
        self.programs.deleted += 1;
        Ok(())
    }

    fn create_vertex_array(&mut self) -> VertexArrayId {
        let id = self.state.create_vertex_array();
        self.vertex_arrays.created += 1;
        self.calls.push(Call::CreateVertexArray(id));
        id
    }

    fn delete_vertex_array(&mut self, id: VertexArrayId) -> Result<(), DriverError> {
        self.calls.push(Call::DeleteVertexArray(id));
        self.check_delete()?;
        self.state.delete_vertex_array(id)?;
        self.vertex_arrays.deleted += 1;
        Ok(())
    }

    fn create_buffer(&mut self) -> BufferId {
        let id = self.state.create_buffer();
        self.buffers.created += 1;
        self.calls.push(Call::CreateBuffer(id));
        id
    }

    fn delete_buffer(&mut self, id: BufferId) -> Result<(), DriverError> {
        self.calls.push(Call::DeleteBuffer(id));
        self.check_delete()?;
        self.state.delete_buffer(id)?;
        self.buffers.deleted += 1;
        Ok(())
    }

    fn bind_vertex_array(&mut self, id: Option<VertexArrayId>) -> Result<(), DriverError> {
        self.calls.push(Call::BindVertexArray(id));
        self.state.bind_vertex_array(id)
    }

    fn bind_buffer(&mut self, target: BufferTarget, id: Option<BufferId>) -> Result<(), DriverError> {
        self.calls.push(Call::BindBuffer(target, id));
        self.state.bind_buffer(target, id)
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8]) -> Result<(), DriverError> {
        self.calls.push(Call::BufferData(target, data.len()));
        if self.fail_buffer_data {
            return Err(Self::buffer_data_error());
        }
        self.state.buffer_data(target, data.len() as u64).map(|_| ())
    }

    fn vertex_attrib_pointer(&mut self, attribute: VertexAttribute) -> Result<(), DriverError> {
        self.calls.push(Call::VertexAttribPointer(attribute));
        self.state.vertex_attrib_pointer(attribute)
    }

    fn enable_vertex_attrib(&mut self, index: u32) -> Result<(), DriverError> {
        self.calls.push(Call::EnableVertexAttrib(index));
        self.state.enable_vertex_attrib(index)
    }

    fn clear_color(&mut self, color: ColorRgba) {
        self.calls.push(Call::ClearColor(color));
        self.state.clear_color = color;
    }

    fn clear(&mut self) {
        self.calls.push(Call::Clear);
    }

    fn use_program(&mut self, id: Option<ProgramId>) -> Result<(), DriverError> {
        self.calls.push(Call::UseProgram(id));
        self.state.use_program(id)
    }

    fn draw_elements(
        &mut self,
        topology: Topology,
        count: u32,
        index_type: IndexType,
    ) -> Result<(), DriverError> {
        self.calls.push(Call::DrawElements(topology, count, index_type));
        match self.state.prepare_draw(count, index_type)? {
            Some(_) => self.draws += 1,
            None => {
                self.skipped_draws += 1;
                if let Some(program) = self.state.bound_program() {
                    if self.warned_unusable.insert(program) {
                        self.warnings += 1;
                    }
                }
            }
        }
        Ok(())
    }

    fn present(&mut self) -> Result<PresentOutcome, DriverError> {
        self.calls.push(Call::Present);
        let index = self.presents;
        self.presents += 1;
        if self.fail_present_at == Some(index) {
            return Err(DriverError::Surface("device lost".to_string()));
        }
        Ok(PresentOutcome::Presented)
    }
}

/// Scripted window host.
///
/// Scripts are keyed by poll count: an action scheduled at `n` happens during
/// the `n`-th call to [`WindowHost::poll_events`] (1-based).
#[derive(Debug)]
pub struct MockHost {
    should_close: bool,
    framebuffer: (u32, u32),
    polls: usize,
    close_at: Option<usize>,
    escape_at: Option<usize>,
    resizes: VecDeque<(usize, u32, u32)>,
    input: InputState,
}

impl MockHost {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            should_close: false,
            framebuffer: (width, height),
            polls: 0,
            close_at: None,
            escape_at: None,
            resizes: VecDeque::new(),
            input: InputState::default(),
        }
    }

    /// OS close button pressed during poll `n`.
    pub fn close_at_poll(mut self, n: usize) -> Self {
        self.close_at = Some(n);
        self
    }

    /// Escape goes down during poll `n` and stays held.
    pub fn press_escape_at_poll(mut self, n: usize) -> Self {
        self.escape_at = Some(n);
        self
    }

    pub fn resize_at_poll(mut self, n: usize, width: u32, height: u32) -> Self {
        self.resizes.push_back((n, width, height));
        self
    }

    /// Holds escape right away, before any poll.
    pub fn hold_escape(&mut self) {
        self.input.apply_event(InputEvent::Key {
            key: Key::Escape,
            state: KeyState::Pressed,
        });
    }

    pub fn polls(&self) -> usize {
        self.polls
    }
}

impl WindowHost for MockHost {
    fn should_close(&self) -> bool {
        self.should_close
    }

    fn set_should_close(&mut self, value: bool) {
        self.should_close = value;
    }

    fn key_state(&self, key: Key) -> KeyState {
        self.input.key_state(key)
    }

    fn poll_events(&mut self) -> Vec<HostEvent> {
        self.polls += 1;
        let n = self.polls;

        if self.close_at == Some(n) {
            self.should_close = true;
        }
        if self.escape_at == Some(n) {
            self.hold_escape();
        }

        let mut events = Vec::new();
        while let Some(&(at, width, height)) = self.resizes.front() {
            if at > n {
                break;
            }
            self.resizes.pop_front();
            self.framebuffer = (width, height);
            events.push(HostEvent::FramebufferResized { width, height });
        }
        events
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        self.framebuffer
    }
}
