//! Shader build: compile two GLSL stages, link them into one program.
//!
//! Compilation runs on the CPU through naga's GLSL front end and validator, so
//! status and diagnostics are available before any GPU object exists. Stage
//! objects are consumed by [`link`]; once linked, only the program remains.

pub(crate) mod compile;
mod link;
mod info_log;

pub use compile::{CompiledShader, ShaderCompiler, ShaderStage};
pub use link::{link, LinkedProgram, VertexInput};
pub use info_log::{InfoLog, INFO_LOG_CAPACITY};
