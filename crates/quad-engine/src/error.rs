use crate::driver::DriverError;
use crate::geometry::GeometryError;
use crate::shader::ShaderStage;

/// Failure while bringing up the window or the rendering context.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("failed to create the event loop: {0}")]
    EventLoop(String),

    #[error("failed to create the window: {0}")]
    WindowCreation(String),

    #[error("failed to initialize the graphics device: {0}")]
    GraphicsLoader(String),
}

/// Everything that can end a run early.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Init(#[from] InitError),

    /// Only raised with `strict_shaders`; otherwise logged and tolerated.
    #[error("{stage} shader build failed:\n{log}")]
    ShaderBuild { stage: ShaderBuildStage, log: String },

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// Step of the shader build that failed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ShaderBuildStage {
    Compile(ShaderStage),
    Link,
}

impl std::fmt::Display for ShaderBuildStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderBuildStage::Compile(stage) => write!(f, "{stage}"),
            ShaderBuildStage::Link => f.write_str("program"),
        }
    }
}
