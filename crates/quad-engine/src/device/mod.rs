//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue for a [`ContextRequest`]
//! - creating & configuring the Surface (swapchain) and following window resizes
//! - acquiring frames and providing encoders/views for rendering
//!
//! [`ContextRequest`]: crate::config::ContextRequest

mod context;
mod error;
mod frame;
mod surface;

pub use context::Gpu;
pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
