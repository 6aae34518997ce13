use naga::{Binding, BuiltIn, Handle, Module, Type, TypeInner};

use super::{CompiledShader, InfoLog, ShaderStage};

/// Vertex attribute consumed by the vertex stage.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VertexInput {
    pub location: u32,
    pub components: u8,
}

/// The linked, executable program.
///
/// A failed link still produces a `LinkedProgram` with `status() == false`; it
/// holds no IR and cannot render.
#[derive(Debug)]
pub struct LinkedProgram {
    log: InfoLog,
    stages: Option<(Module, Module)>,
    vertex_inputs: Vec<VertexInput>,
}

impl LinkedProgram {
    fn failed(log: String) -> Self {
        Self {
            log: InfoLog::new(log),
            stages: None,
            vertex_inputs: Vec::new(),
        }
    }

    /// Link status.
    pub fn status(&self) -> bool {
        self.stages.is_some()
    }

    pub fn log(&self) -> &InfoLog {
        &self.log
    }

    pub fn vertex_inputs(&self) -> &[VertexInput] {
        &self.vertex_inputs
    }

    /// Vertex and fragment IR of a successfully linked program.
    pub(crate) fn stages(&self) -> Option<(&Module, &Module)> {
        self.stages.as_ref().map(|(vs, fs)| (vs, fs))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Slot {
    Location { location: u32, ty: TypeInner },
    BuiltIn(BuiltIn),
}

/// Links a vertex and a fragment stage into one program.
///
/// Both stage objects are consumed regardless of the outcome.
pub fn link(vertex: CompiledShader, fragment: CompiledShader) -> LinkedProgram {
    if vertex.stage() != ShaderStage::Vertex || fragment.stage() != ShaderStage::Fragment {
        return LinkedProgram::failed(format!(
            "error: expected vertex and fragment stages, got {} and {}\n",
            vertex.stage(),
            fragment.stage()
        ));
    }

    let mut not_compiled = Vec::new();
    if !vertex.status() {
        not_compiled.push(ShaderStage::Vertex);
    }
    if !fragment.status() {
        not_compiled.push(ShaderStage::Fragment);
    }

    let (Some(vs), Some(fs)) = (vertex.into_module(), fragment.into_module()) else {
        let mut log = String::new();
        for stage in not_compiled {
            log.push_str(&format!("error: {stage} shader is not compiled\n"));
        }
        return LinkedProgram::failed(log);
    };

    let Some(vs_io) = entry_interface(&vs, naga::ShaderStage::Vertex) else {
        return LinkedProgram::failed("error: vertex stage has no entry point\n".to_string());
    };
    let Some(fs_io) = entry_interface(&fs, naga::ShaderStage::Fragment) else {
        return LinkedProgram::failed("error: fragment stage has no entry point\n".to_string());
    };

    let (vs_inputs, vs_outputs) = vs_io;
    let (fs_inputs, _) = fs_io;

    if !vs_outputs
        .iter()
        .any(|slot| matches!(slot, Slot::BuiltIn(BuiltIn::Position { .. })))
    {
        return LinkedProgram::failed(
            "error: vertex stage does not write the position built-in\n".to_string(),
        );
    }

    let mut log = String::new();
    for slot in &fs_inputs {
        let Slot::Location { location, ty } = slot else { continue };
        let produced = vs_outputs.iter().find_map(|out| match out {
            Slot::Location { location: l, ty } if l == location => Some(ty),
            _ => None,
        });
        match produced {
            None => log.push_str(&format!(
                "error: fragment input at location {location} is not written by the vertex stage\n"
            )),
            Some(out_ty) if out_ty != ty => log.push_str(&format!(
                "error: fragment input at location {location} does not match the vertex output type\n"
            )),
            Some(_) => {}
        }
    }
    if !log.is_empty() {
        return LinkedProgram::failed(log);
    }

    let vertex_inputs = vs_inputs
        .iter()
        .filter_map(|slot| match slot {
            Slot::Location { location, ty } => Some(VertexInput {
                location: *location,
                components: components(ty),
            }),
            Slot::BuiltIn(_) => None,
        })
        .collect();

    log::debug!("program linked");
    LinkedProgram {
        log: InfoLog::empty(),
        stages: Some((vs, fs)),
        vertex_inputs,
    }
}

/// Flattened (inputs, outputs) of the entry point for `stage`.
fn entry_interface(module: &Module, stage: naga::ShaderStage) -> Option<(Vec<Slot>, Vec<Slot>)> {
    let ep = module.entry_points.iter().find(|ep| ep.stage == stage)?;

    let mut inputs = Vec::new();
    for arg in &ep.function.arguments {
        flatten(module, arg.ty, arg.binding.as_ref(), &mut inputs);
    }

    let mut outputs = Vec::new();
    if let Some(result) = &ep.function.result {
        flatten(module, result.ty, result.binding.as_ref(), &mut outputs);
    }

    Some((inputs, outputs))
}

fn flatten(module: &Module, ty: Handle<Type>, binding: Option<&Binding>, out: &mut Vec<Slot>) {
    match binding {
        Some(Binding::Location { location, .. }) => out.push(Slot::Location {
            location: *location,
            ty: module.types[ty].inner.clone(),
        }),
        Some(Binding::BuiltIn(builtin)) => out.push(Slot::BuiltIn(*builtin)),
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    flatten(module, member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

fn components(ty: &TypeInner) -> u8 {
    match ty {
        TypeInner::Scalar(_) => 1,
        TypeInner::Vector { size, .. } => *size as u8,
        _ => 4,
    }
}
