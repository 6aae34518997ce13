//! Immutable configuration for a run.
//!
//! Every value the program needs (window size, context request, shader sources,
//! clear color) lives here and is handed to bootstrap and shader build explicitly.

use crate::coords::ColorRgba;
use crate::driver::PolygonMode;

/// Vertex stage: forwards the object-space position unchanged.
pub const VERTEX_SHADER_SOURCE: &str = "#version 450 core
layout (location = 0) in vec3 aPos;
void main()
{
    gl_Position = vec4(aPos.x, aPos.y, aPos.z, 1.0);
}
";

/// Fragment stage: constant orange.
pub const FRAGMENT_SHADER_SOURCE: &str = "#version 450 core
layout (location = 0) out vec4 FragColor;
void main()
{
    FragColor = vec4(1.0, 0.5, 0.2, 1.0);
}
";

/// Window configuration.
///
/// `width`/`height` are logical pixels; the framebuffer may be larger on HiDPI displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "OpenGL - Creating a window".to_string(),
            width: 800,
            height: 600,
        }
    }
}

/// Rendering API version requested from the context.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ApiVersion {
    pub major: u8,
    pub minor: u8,
}

impl ApiVersion {
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// Highest `#version` a shader may declare against this context (4.5 -> 450).
    pub const fn shading_language_version(self) -> u16 {
        self.major as u16 * 100 + self.minor as u16 * 10
    }
}

impl std::fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Context feature profile.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Profile {
    /// Restricted, forward-looking feature set.
    Core,
    /// Broadest device support, tightest limits.
    Compatibility,
}

impl Profile {
    /// Device limits requested for the profile.
    pub fn limits(self) -> wgpu::Limits {
        match self {
            Profile::Core => wgpu::Limits::downlevel_defaults(),
            Profile::Compatibility => wgpu::Limits::downlevel_webgl2_defaults(),
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Profile::Core => f.write_str("core"),
            Profile::Compatibility => f.write_str("compatibility"),
        }
    }
}

/// Parameters of the rendering context created for the window.
///
/// Keep this structure small. Add fields only for a concrete platform or backend need.
#[derive(Debug, Clone)]
pub struct ContextRequest {
    pub version: ApiVersion,
    pub profile: Profile,

    /// Backends the instance may pick from.
    pub backends: wgpu::Backends,

    pub power_preference: wgpu::PowerPreference,

    /// Prefer an sRGB surface format when available.
    ///
    /// Off by default: the clear color and fragment output are written linearly.
    pub prefer_srgb: bool,

    /// Present mode (swap behavior). FIFO is vsync and always supported.
    pub present_mode: wgpu::PresentMode,

    /// Features enabled when the adapter supports them; never required.
    pub optional_features: wgpu::Features,

    /// Hint; support depends on platform/backend.
    pub desired_maximum_frame_latency: u32,
}

impl Default for ContextRequest {
    fn default() -> Self {
        Self {
            version: ApiVersion::new(4, 5),
            profile: Profile::Core,
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            prefer_srgb: false,
            present_mode: wgpu::PresentMode::Fifo,
            optional_features: wgpu::Features::POLYGON_MODE_LINE,
            desired_maximum_frame_latency: 2,
        }
    }
}

/// Embedded shader source strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl Default for ShaderSources {
    fn default() -> Self {
        Self {
            vertex: VERTEX_SHADER_SOURCE.to_string(),
            fragment: FRAGMENT_SHADER_SOURCE.to_string(),
        }
    }
}

/// Complete configuration of one run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub context: ContextRequest,
    pub shaders: ShaderSources,
    pub clear_color: ColorRgba,
    pub polygon_mode: PolygonMode,

    /// Abort the run when a shader stage fails to compile or the program fails to link.
    ///
    /// When off, failures are logged and the loop draws with an unusable program.
    pub strict_shaders: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            context: ContextRequest::default(),
            shaders: ShaderSources::default(),
            clear_color: ColorRgba::dark_teal(),
            polygon_mode: PolygonMode::Line,
            strict_shaders: false,
        }
    }
}
