use std::sync::Arc;
use std::time::Duration;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::platform::scancode::PhysicalKeyExtScancode;
use winit::window::{Window, WindowId};

use crate::config::WindowConfig;
use crate::error::InitError;
use crate::input::{InputEvent, InputState, Key, KeyState};

use super::{HostEvent, WindowHost};

/// Upper bound on startup pumps while waiting for the platform to resume us.
const BOOTSTRAP_ATTEMPTS: u32 = 200;
const BOOTSTRAP_WAIT: Duration = Duration::from_millis(10);

/// `winit`-backed window host.
///
/// Drives the event loop by pumping it from the frame loop rather than handing
/// control to `run_app`, so each frame polls OS events exactly once.
pub struct WinitHost {
    event_loop: EventLoop<()>,
    state: HostState,
    window: Arc<Window>,
}

impl WinitHost {
    /// Creates the event loop and the window, and waits until the window exists.
    ///
    /// On failure everything created so far is dropped before returning.
    pub fn new(config: &WindowConfig) -> Result<Self, InitError> {
        let mut event_loop =
            EventLoop::new().map_err(|e| InitError::EventLoop(e.to_string()))?;
        let mut state = HostState::new(config.clone());

        for _ in 0..BOOTSTRAP_ATTEMPTS {
            if let PumpStatus::Exit(code) =
                event_loop.pump_app_events(Some(BOOTSTRAP_WAIT), &mut state)
            {
                return Err(InitError::WindowCreation(format!(
                    "event loop exited during startup with code {code}"
                )));
            }
            if let Some(err) = state.creation_error.take() {
                return Err(InitError::WindowCreation(err));
            }
            if state.window.is_some() {
                break;
            }
        }

        let window = state.window.clone().ok_or_else(|| {
            InitError::WindowCreation("platform did not resume the application".to_string())
        })?;

        Ok(Self {
            event_loop,
            state,
            window,
        })
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    /// Closes the window and shuts the event loop down.
    ///
    /// GPU objects referring to the window must be dropped first.
    pub fn terminate(self) {
        let Self { event_loop, mut state, window } = self;
        state.window = None;
        drop(window);
        drop(event_loop);
        log::debug!("window host terminated");
    }
}

impl WindowHost for WinitHost {
    fn should_close(&self) -> bool {
        self.state.should_close || self.state.exited
    }

    fn set_should_close(&mut self, value: bool) {
        self.state.should_close = value;
    }

    fn key_state(&self, key: Key) -> KeyState {
        self.state.input.key_state(key)
    }

    fn poll_events(&mut self) -> Vec<HostEvent> {
        if !self.state.exited {
            if let PumpStatus::Exit(code) =
                self.event_loop.pump_app_events(Some(Duration::ZERO), &mut self.state)
            {
                log::debug!("event loop exited with code {code}");
                self.state.exited = true;
            }
        }
        std::mem::take(&mut self.state.events)
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }
}

struct HostState {
    config: WindowConfig,
    window: Option<Arc<Window>>,
    creation_error: Option<String>,

    should_close: bool,
    exited: bool,

    input: InputState,
    events: Vec<HostEvent>,
}

impl HostState {
    fn new(config: WindowConfig) -> Self {
        Self {
            config,
            window: None,
            creation_error: None,
            should_close: false,
            exited: false,
            input: InputState::default(),
            events: Vec::new(),
        }
    }
}

impl ApplicationHandler for HostState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.creation_error.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(LogicalSize::new(
                f64::from(self.config.width),
                f64::from(self.config.height),
            ));

        match event_loop.create_window(attrs) {
            Ok(window) => {
                let size = window.inner_size();
                log::info!(
                    "window created: \"{}\" {}x{} (framebuffer {}x{})",
                    self.config.title,
                    self.config.width,
                    self.config.height,
                    size.width,
                    size.height
                );
                self.window = Some(Arc::new(window));
            }
            Err(e) => self.creation_error = Some(e.to_string()),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // Never block inside a pump; the frame loop sets the pace.
        event_loop.set_control_flow(ControlFlow::Poll);
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.window.as_ref().map(|w| w.id()) != Some(window_id) {
            return;
        }

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                self.should_close = true;
            }

            WindowEvent::Resized(size) => {
                self.events.push(HostEvent::FramebufferResized {
                    width: size.width,
                    height: size.height,
                });
            }

            WindowEvent::Focused(f) => self.input.apply_event(InputEvent::Focused(f)),

            WindowEvent::KeyboardInput { event, .. } => {
                let state = match event.state {
                    ElementState::Pressed => KeyState::Pressed,
                    ElementState::Released => KeyState::Released,
                };
                self.input.apply_event(InputEvent::Key {
                    key: map_key(event.physical_key),
                    state,
                });
            }

            _ => {}
        }
    }
}

fn map_key(pk: PhysicalKey) -> Key {
    // Unmapped keys carry the platform scancode.
    let unknown = || Key::Unknown(pk.to_scancode().unwrap_or(0));

    match pk {
        PhysicalKey::Code(KeyCode::Escape) => Key::Escape,
        _ => unknown(),
    }
}
