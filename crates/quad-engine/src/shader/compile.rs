use std::fmt::{self, Write as _};

use naga::front::glsl::{Frontend, Options, ParseErrors};
use naga::valid::{Capabilities, ValidationFlags, Validator};

use crate::config::ContextRequest;

use super::InfoLog;

/// Pipeline stage a shader source targets.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub(crate) fn to_naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// One compiled stage object.
///
/// Carries the compile status and diagnostic log. On success it also owns the
/// validated IR, which is moved into the program by [`super::link`].
#[derive(Debug)]
pub struct CompiledShader {
    stage: ShaderStage,
    log: InfoLog,
    module: Option<naga::Module>,
}

impl CompiledShader {
    fn failed(stage: ShaderStage, log: String) -> Self {
        Self {
            stage,
            log: InfoLog::new(log),
            module: None,
        }
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Compile status: true when the stage parsed and validated.
    pub fn status(&self) -> bool {
        self.module.is_some()
    }

    pub fn log(&self) -> &InfoLog {
        &self.log
    }

    pub(crate) fn into_module(self) -> Option<naga::Module> {
        self.module
    }
}

/// Compiles GLSL stages against the shading-language version a context exposes.
#[derive(Debug, Copy, Clone)]
pub struct ShaderCompiler {
    max_version: u16,
}

impl ShaderCompiler {
    pub fn new(max_version: u16) -> Self {
        Self { max_version }
    }

    pub fn for_context(request: &ContextRequest) -> Self {
        Self::new(request.version.shading_language_version())
    }

    /// Compiles one stage. Never fails outright: check [`CompiledShader::status`].
    pub fn compile(&self, stage: ShaderStage, source: &str) -> CompiledShader {
        if let Some(version) = declared_version(source) {
            if version > self.max_version {
                return CompiledShader::failed(
                    stage,
                    format!(
                        "0:1(1): error: #version {version} is not supported (maximum is {})\n",
                        self.max_version
                    ),
                );
            }
        }

        let mut frontend = Frontend::default();
        let module = match frontend.parse(&Options::from(stage.to_naga()), source) {
            Ok(module) => module,
            Err(errors) => return CompiledShader::failed(stage, format_parse_errors(&errors, source)),
        };

        let mut validator = Validator::new(ValidationFlags::all(), Capabilities::empty());
        if let Err(err) = validator.validate(&module) {
            return CompiledShader::failed(stage, format_validation_error(&err, source));
        }

        if !module.entry_points.iter().any(|ep| ep.stage == stage.to_naga()) {
            return CompiledShader::failed(
                stage,
                format!("error: no {stage} entry point defined\n"),
            );
        }

        log::debug!("{stage} shader compiled");
        CompiledShader {
            stage,
            log: InfoLog::empty(),
            module: Some(module),
        }
    }
}

/// Version number of the first `#version` directive, if any.
pub(crate) fn declared_version(source: &str) -> Option<u16> {
    source
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("#version"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|v| v.parse().ok())
}

fn format_parse_errors(errors: &ParseErrors, source: &str) -> String {
    let mut out = String::new();
    for err in &errors.errors {
        let loc = err.meta.location(source);
        let _ = writeln!(
            out,
            "0:{}({}): error: {}",
            loc.line_number, loc.line_position, err.kind
        );
    }
    if out.is_empty() {
        out.push_str("error: parse failed\n");
    }
    out
}

fn format_validation_error(
    err: &naga::WithSpan<naga::valid::ValidationError>,
    source: &str,
) -> String {
    let mut out = String::new();
    match err.spans().next() {
        Some((span, _)) => {
            let loc = span.location(source);
            let _ = write!(out, "0:{}({}): error: {err}", loc.line_number, loc.line_position);
        }
        None => {
            let _ = write!(out, "error: {err}");
        }
    }

    let mut cause = std::error::Error::source(err.as_inner());
    while let Some(c) = cause {
        let _ = write!(out, ": {c}");
        cause = c.source();
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FRAGMENT_SHADER_SOURCE, VERTEX_SHADER_SOURCE};
    use crate::shader::INFO_LOG_CAPACITY;

    fn compiler() -> ShaderCompiler {
        ShaderCompiler::new(450)
    }

    #[test]
    fn embedded_vertex_stage_compiles() {
        let vs = compiler().compile(ShaderStage::Vertex, VERTEX_SHADER_SOURCE);
        assert!(vs.status(), "log: {}", vs.log());
        assert!(vs.log().is_empty());
        assert_eq!(vs.stage(), ShaderStage::Vertex);
    }

    #[test]
    fn embedded_fragment_stage_compiles() {
        let fs = compiler().compile(ShaderStage::Fragment, FRAGMENT_SHADER_SOURCE);
        assert!(fs.status(), "log: {}", fs.log());
    }

    #[test]
    fn syntax_error_fails_with_bounded_log() {
        let broken = "#version 450 core\n\
                      layout (location = 0) out vec4 FragColor;\n\
                      void main()\n\
                      {\n\
                          FragColor = vec4(1.0, 0.5, 0.2, 1.0)\n\
                      }\n";
        let fs = compiler().compile(ShaderStage::Fragment, broken);
        assert!(!fs.status());
        assert!(!fs.log().is_empty());
        assert!(fs.log().len() <= INFO_LOG_CAPACITY);
        assert!(fs.log().as_str().contains("error"));
    }

    #[test]
    fn undeclared_identifier_fails() {
        let broken = "#version 450 core\n\
                      void main()\n\
                      {\n\
                          gl_Position = vec4(missing, 1.0);\n\
                      }\n";
        let vs = compiler().compile(ShaderStage::Vertex, broken);
        assert!(!vs.status());
        assert!(!vs.log().is_empty());
    }

    #[test]
    fn version_above_the_context_fails() {
        let vs = ShaderCompiler::new(330).compile(ShaderStage::Vertex, VERTEX_SHADER_SOURCE);
        assert!(!vs.status());
        assert!(vs.log().as_str().contains("#version 450"));
    }

    #[test]
    fn compiler_follows_the_context_version() {
        let req = ContextRequest::default();
        let vs = ShaderCompiler::for_context(&req).compile(ShaderStage::Vertex, VERTEX_SHADER_SOURCE);
        assert!(vs.status());
    }

    #[test]
    fn declared_version_parsing() {
        assert_eq!(declared_version("#version 450 core\nvoid main() {}"), Some(450));
        assert_eq!(declared_version("\n  #version 330\n"), Some(330));
        assert_eq!(declared_version("void main() {}"), None);
    }
}
