//! Core run sequence.
//!
//! Wires the pieces together in order: shader build, geometry upload, frame
//! loop, teardown. Everything here talks to the window and the GPU through the
//! [`WindowHost`](crate::window::WindowHost) and
//! [`GraphicsDriver`](crate::driver::GraphicsDriver) seams, so the whole
//! sequence runs against test doubles as well.

mod app;
mod frame_loop;
mod resize;

pub use app::{build_program, run, run_app, teardown, RunReport};
pub use frame_loop::{process_input, FrameLoop, FrameScene, LoopState, ResizeCallback};
pub use resize::framebuffer_size_callback;
