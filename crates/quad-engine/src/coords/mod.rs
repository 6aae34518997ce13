//! Small value types shared by the driver, the frame loop and configuration.
//!
//! Pixel space:
//! - physical pixels of the drawable surface
//! - origin bottom-left for the viewport, matching the rasterizer convention

mod color;
mod viewport;

pub use color::ColorRgba;
pub use viewport::Viewport;
