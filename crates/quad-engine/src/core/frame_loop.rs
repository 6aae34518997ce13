use crate::coords::ColorRgba;
use crate::driver::{
    DriverError, GraphicsDriver, IndexType, PresentOutcome, ProgramId, Topology, VertexArrayId,
};
use crate::input::{Key, KeyState};
use crate::window::{HostEvent, WindowHost};

/// Handler for framebuffer resizes. Receives the new size in physical pixels.
pub type ResizeCallback<D> = fn(&mut D, u32, u32);

/// Frame loop state.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopState {
    Running,
    Closing,
}

/// What every frame draws.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameScene {
    pub program: ProgramId,
    pub vertex_array: VertexArrayId,
    pub index_count: u32,
    pub index_type: IndexType,
    pub clear_color: ColorRgba,
}

/// Clear, draw, present, poll. Repeats until the window's close flag is set.
pub struct FrameLoop<D: ?Sized> {
    scene: FrameScene,
    on_resize: Option<ResizeCallback<D>>,
    frames: u64,
    skipped: u64,
}

impl<D> FrameLoop<D>
where
    D: GraphicsDriver + ?Sized,
{
    pub fn new(scene: FrameScene) -> Self {
        Self {
            scene,
            on_resize: None,
            frames: 0,
            skipped: 0,
        }
    }

    pub fn set_resize_callback(&mut self, callback: ResizeCallback<D>) {
        self.on_resize = Some(callback);
    }

    /// Completed iterations.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Runs one iteration.
    ///
    /// Returns [`LoopState::Closing`] without touching the driver once the close
    /// flag is set; otherwise renders and presents one frame, then polls events.
    pub fn step<H>(&mut self, host: &mut H, driver: &mut D) -> Result<LoopState, DriverError>
    where
        H: WindowHost + ?Sized,
    {
        if host.should_close() {
            return Ok(LoopState::Closing);
        }

        process_input(host);

        driver.clear_color(self.scene.clear_color);
        driver.clear();

        driver.use_program(Some(self.scene.program))?;
        driver.bind_vertex_array(Some(self.scene.vertex_array))?;
        driver.draw_elements(
            Topology::Triangles,
            self.scene.index_count,
            self.scene.index_type,
        )?;

        if driver.present()? == PresentOutcome::Skipped {
            self.skipped += 1;
        }

        for event in host.poll_events() {
            match event {
                HostEvent::FramebufferResized { width, height } => {
                    log::debug!("framebuffer resized to {width}x{height}");
                    if let Some(callback) = self.on_resize {
                        callback(driver, width, height);
                    }
                }
            }
        }

        self.frames += 1;
        log::trace!("frame {} done", self.frames);
        Ok(LoopState::Running)
    }

    /// Steps until [`LoopState::Closing`]; returns the number of frames run.
    pub fn run<H>(&mut self, host: &mut H, driver: &mut D) -> Result<u64, DriverError>
    where
        H: WindowHost + ?Sized,
    {
        while self.step(host, driver)? == LoopState::Running {}

        log::info!(
            "frame loop exited after {} frame(s) ({} skipped)",
            self.frames,
            self.skipped
        );
        Ok(self.frames)
    }
}

/// Escape held: ask the window to close.
pub fn process_input<H>(host: &mut H)
where
    H: WindowHost + ?Sized,
{
    if host.key_state(Key::Escape) == KeyState::Pressed {
        host.set_should_close(true);
    }
}
