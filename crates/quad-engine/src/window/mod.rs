//! Window host.
//!
//! Owns the platform window and event loop. The frame loop polls it through
//! [`WindowHost`]; `winit` is the only implementation outside tests.

mod host;
mod runtime;

pub use host::{HostEvent, WindowHost};
pub use runtime::WinitHost;
