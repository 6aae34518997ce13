//! Quad engine crate.
//!
//! Opens one window and renders an indexed quad in wireframe until the window
//! closes or Escape is pressed. This crate owns the platform and GPU runtime
//! pieces; `quad-viewer` is the thin binary on top.

pub mod config;
pub mod coords;
pub mod core;
pub mod device;
pub mod driver;
pub mod error;
pub mod geometry;
pub mod input;
pub mod logging;
pub mod shader;
pub mod window;

#[cfg(test)]
mod testing;

pub use crate::config::AppConfig;
pub use crate::core::{run, RunReport};
pub use crate::error::{InitError, RunError};
