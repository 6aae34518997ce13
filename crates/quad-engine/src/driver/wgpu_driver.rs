use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use wgpu::util::DeviceExt;

use crate::coords::{ColorRgba, Viewport};
use crate::device::{Gpu, GpuFrame, SurfaceErrorAction};
use crate::shader::LinkedProgram;

use super::{
    BufferId, BufferTarget, DrawCall, DriverError, GraphicsDriver, IndexType, ObjectState,
    PolygonMode, PresentOutcome, ProgramId, ProgramRecord, Topology, VertexArrayId,
    VertexAttribute,
};

/// Shader modules of a linked program.
struct ProgramModules {
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: ProgramId,
    attributes: Vec<VertexAttribute>,
    polygon_mode: PolygonMode,
    format: wgpu::TextureFormat,
}

/// Commands recorded since the last present.
#[derive(Default)]
struct FrameRecording {
    clear: Option<ColorRgba>,
    draws: Vec<DrawCall>,
}

/// [`GraphicsDriver`] over wgpu.
///
/// Calls between two presents are recorded, then encoded into a single render
/// pass when the frame is presented:
/// - `clear` turns into the pass load op and drops draws recorded before it
/// - each draw resolves a cached pipeline for its program, attribute layout and
///   polygon mode
pub struct WgpuDriver {
    gpu: Gpu,
    state: ObjectState,

    buffers: HashMap<BufferId, wgpu::Buffer>,
    programs: HashMap<ProgramId, ProgramModules>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    pipeline_layout: wgpu::PipelineLayout,

    line_mode_supported: bool,
    frame: FrameRecording,

    warned_unusable: HashSet<ProgramId>,
    warned_line_fallback: bool,
}

impl WgpuDriver {
    pub fn new(gpu: Gpu) -> Self {
        let size = gpu.size();
        let line_mode_supported = gpu.features().contains(wgpu::Features::POLYGON_MODE_LINE);

        let pipeline_layout = gpu
            .device()
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("quad pipeline layout"),
                bind_group_layouts: &[],
                immediate_size: 0,
            });

        Self {
            gpu,
            state: ObjectState::new(Viewport::from_size(size.width, size.height)),
            buffers: HashMap::new(),
            programs: HashMap::new(),
            pipelines: HashMap::new(),
            pipeline_layout,
            line_mode_supported,
            frame: FrameRecording::default(),
            warned_unusable: HashSet::new(),
            warned_line_fallback: false,
        }
    }

    fn effective_polygon_mode(&self, requested: PolygonMode) -> PolygonMode {
        match requested {
            PolygonMode::Line if !self.line_mode_supported => PolygonMode::Fill,
            mode => mode,
        }
    }

    /// Builds (or finds) the pipeline for `draw`. `None` if the program has no modules.
    fn ensure_pipeline(&mut self, draw: &DrawCall) -> Option<PipelineKey> {
        let key = PipelineKey {
            program: draw.program,
            attributes: draw.attributes.iter().map(|a| a.layout).collect(),
            polygon_mode: self.effective_polygon_mode(draw.polygon_mode),
            format: self.gpu.surface_format(),
        };
        if self.pipelines.contains_key(&key) {
            return Some(key);
        }

        let modules = self.programs.get(&draw.program)?;

        // One buffer slot per attribute; the attribute offset is applied to the
        // buffer slice at draw time.
        let attributes: Vec<[wgpu::VertexAttribute; 1]> = key
            .attributes
            .iter()
            .map(|a| {
                [wgpu::VertexAttribute {
                    format: a.format(),
                    offset: 0,
                    shader_location: a.index,
                }]
            })
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout<'_>> = key
            .attributes
            .iter()
            .zip(&attributes)
            .map(|(a, attrs)| wgpu::VertexBufferLayout {
                array_stride: a.effective_stride(),
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attrs,
            })
            .collect();

        let pipeline = self
            .gpu
            .device()
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("quad pipeline"),
                layout: Some(&self.pipeline_layout),

                vertex: wgpu::VertexState {
                    module: &modules.vertex,
                    entry_point: Some("main"),
                    compilation_options: Default::default(),
                    buffers: &buffers,
                },

                fragment: Some(wgpu::FragmentState {
                    module: &modules.fragment,
                    entry_point: Some("main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: key.format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),

                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: key.polygon_mode.into(),
                    unclipped_depth: false,
                    conservative: false,
                },

                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        log::debug!(
            "pipeline built: program {:?}, {} attribute(s), {:?}",
            key.program,
            key.attributes.len(),
            key.polygon_mode
        );
        self.pipelines.insert(key.clone(), pipeline);
        Some(key)
    }

    /// Encodes the recorded frame into `frame` as one render pass.
    fn encode(&mut self, frame: &mut GpuFrame, recording: FrameRecording) {
        // Mutating lookups first; the pass below only borrows immutably.
        let keys: Vec<Option<PipelineKey>> =
            recording.draws.iter().map(|d| self.ensure_pipeline(d)).collect();

        let size = self.gpu.size();
        let rect = pass_viewport(self.state.viewport, size.width, size.height);

        let load = match recording.clear {
            Some(c) => wgpu::LoadOp::Clear(c.into()),
            None => wgpu::LoadOp::Load,
        };

        let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("quad frame pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let Some((x, y, w, h)) = rect else {
            log::trace!("viewport lies outside the surface; draws dropped");
            return;
        };
        pass.set_viewport(x, y, w, h, 0.0, 1.0);

        for (draw, key) in recording.draws.iter().zip(&keys) {
            let Some(pipeline) = key.as_ref().and_then(|k| self.pipelines.get(k)) else {
                continue;
            };
            let Some(index_buffer) = self.buffers.get(&draw.element_buffer) else {
                log::warn!("draw skipped: element buffer {:?} has no data", draw.element_buffer);
                continue;
            };
            let vertex_buffers: Option<Vec<(&wgpu::Buffer, u64)>> = draw
                .attributes
                .iter()
                .map(|a| self.buffers.get(&a.buffer).map(|b| (b, a.layout.offset)))
                .collect();
            let Some(vertex_buffers) = vertex_buffers else {
                log::warn!("draw skipped: a vertex buffer has no data");
                continue;
            };

            pass.set_pipeline(pipeline);
            for (slot, (buffer, offset)) in vertex_buffers.into_iter().enumerate() {
                pass.set_vertex_buffer(slot as u32, buffer.slice(offset..));
            }
            pass.set_index_buffer(index_buffer.slice(..), draw.index_type.into());
            pass.draw_indexed(0..draw.count, 0, 0..1);
        }
    }
}

/// Converts a bottom-left-origin viewport to the top-left-origin rectangle of a
/// render pass, clamped to the surface.
fn pass_viewport(
    viewport: Viewport,
    surface_width: u32,
    surface_height: u32,
) -> Option<(f32, f32, f32, f32)> {
    let (x, y, w, h) = viewport.clamp_to(surface_width, surface_height)?;
    Some((x, surface_height as f32 - (y + h), w, h))
}

impl GraphicsDriver for WgpuDriver {
    fn set_viewport(&mut self, viewport: Viewport) {
        log::trace!("viewport -> {viewport:?}");
        self.state.viewport = viewport;
    }

    fn viewport(&self) -> Viewport {
        self.state.viewport
    }

    fn set_polygon_mode(&mut self, mode: PolygonMode) {
        if mode == PolygonMode::Line && !self.line_mode_supported && !self.warned_line_fallback {
            log::warn!("adapter does not support line polygon mode; drawing filled");
            self.warned_line_fallback = true;
        }
        self.state.polygon_mode = mode;
    }

    fn create_program(&mut self, program: &LinkedProgram) -> ProgramId {
        let id = self.state.create_program(ProgramRecord::from_linked(program));

        if let Some((vs, fs)) = program.stages() {
            let device = self.gpu.device();
            let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("quad vertex stage"),
                source: wgpu::ShaderSource::Naga(Cow::Owned(vs.clone())),
            });
            let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("quad fragment stage"),
                source: wgpu::ShaderSource::Naga(Cow::Owned(fs.clone())),
            });
            self.programs.insert(id, ProgramModules { vertex, fragment });
        }

        log::debug!("program {id:?} created (usable: {})", program.status());
        id
    }

    fn delete_program(&mut self, id: ProgramId) -> Result<(), DriverError> {
        self.state.delete_program(id)?;
        self.programs.remove(&id);
        self.pipelines.retain(|k, _| k.program != id);
        self.warned_unusable.remove(&id);
        log::debug!("program {id:?} deleted");
        Ok(())
    }

    fn create_vertex_array(&mut self) -> VertexArrayId {
        let id = self.state.create_vertex_array();
        log::debug!("vertex array {id:?} created");
        id
    }

    fn delete_vertex_array(&mut self, id: VertexArrayId) -> Result<(), DriverError> {
        self.state.delete_vertex_array(id)?;
        log::debug!("vertex array {id:?} deleted");
        Ok(())
    }

    fn create_buffer(&mut self) -> BufferId {
        let id = self.state.create_buffer();
        log::debug!("buffer {id:?} created");
        id
    }

    fn delete_buffer(&mut self, id: BufferId) -> Result<(), DriverError> {
        self.state.delete_buffer(id)?;
        if let Some(buffer) = self.buffers.remove(&id) {
            buffer.destroy();
        }
        log::debug!("buffer {id:?} deleted");
        Ok(())
    }

    fn bind_vertex_array(&mut self, id: Option<VertexArrayId>) -> Result<(), DriverError> {
        self.state.bind_vertex_array(id)
    }

    fn bind_buffer(&mut self, target: BufferTarget, id: Option<BufferId>) -> Result<(), DriverError> {
        self.state.bind_buffer(target, id)
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8]) -> Result<(), DriverError> {
        let id = self.state.buffer_data(target, data.len() as u64)?;

        let buffer = self
            .gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("quad data buffer"),
                contents: data,
                usage: wgpu::BufferUsages::VERTEX
                    | wgpu::BufferUsages::INDEX
                    | wgpu::BufferUsages::COPY_DST,
            });

        if let Some(old) = self.buffers.insert(id, buffer) {
            old.destroy();
        }
        log::debug!("buffer {id:?} <- {} bytes ({target:?})", data.len());
        Ok(())
    }

    fn vertex_attrib_pointer(&mut self, attribute: VertexAttribute) -> Result<(), DriverError> {
        self.state.vertex_attrib_pointer(attribute)
    }

    fn enable_vertex_attrib(&mut self, index: u32) -> Result<(), DriverError> {
        self.state.enable_vertex_attrib(index)
    }

    fn clear_color(&mut self, color: ColorRgba) {
        self.state.clear_color = color;
    }

    fn clear(&mut self) {
        self.frame.clear = Some(self.state.clear_color);
        self.frame.draws.clear();
    }

    fn use_program(&mut self, id: Option<ProgramId>) -> Result<(), DriverError> {
        self.state.use_program(id)
    }

    fn draw_elements(
        &mut self,
        topology: Topology,
        count: u32,
        index_type: IndexType,
    ) -> Result<(), DriverError> {
        match topology {
            Topology::Triangles => {}
        }

        match self.state.prepare_draw(count, index_type)? {
            Some(draw) => self.frame.draws.push(draw),
            None => {
                if let Some(program) = self.state.bound_program() {
                    if self.warned_unusable.insert(program) {
                        log::warn!("program {program:?} failed to link; its draws are skipped");
                    }
                }
            }
        }
        Ok(())
    }

    fn present(&mut self) -> Result<PresentOutcome, DriverError> {
        let recording = std::mem::take(&mut self.frame);

        self.gpu.sync_to_window();
        let size = self.gpu.size();
        if size.width == 0 || size.height == 0 {
            log::trace!("surface has zero area; frame skipped");
            return Ok(PresentOutcome::Skipped);
        }

        let mut frame = match self.gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => {
                let reason = err.to_string();
                return match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {
                        log::warn!("frame skipped: {reason}");
                        Ok(PresentOutcome::Skipped)
                    }
                    SurfaceErrorAction::Fatal => Err(DriverError::Surface(reason)),
                };
            }
        };

        self.encode(&mut frame, recording);
        self.gpu.submit(frame);
        Ok(PresentOutcome::Presented)
    }
}

impl Drop for WgpuDriver {
    fn drop(&mut self) {
        let leaked = self.state.live_objects();
        if leaked > 0 {
            log::warn!("driver dropped with {leaked} live object(s)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_viewport_maps_to_full_pass() {
        let v = Viewport::from_size(800, 600);
        assert_eq!(pass_viewport(v, 800, 600), Some((0.0, 0.0, 800.0, 600.0)));
    }

    #[test]
    fn bottom_left_origin_is_flipped() {
        let v = Viewport::new(10, 20, 100, 50);
        assert_eq!(pass_viewport(v, 800, 600), Some((10.0, 530.0, 100.0, 50.0)));
    }

    #[test]
    fn viewport_off_surface_is_dropped() {
        let v = Viewport::new(900, 0, 100, 100);
        assert_eq!(pass_viewport(v, 800, 600), None);
    }
}
