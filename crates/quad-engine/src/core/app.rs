use std::sync::Arc;

use crate::config::AppConfig;
use crate::coords::Viewport;
use crate::device::Gpu;
use crate::driver::{DriverError, GraphicsDriver, ProgramId, WgpuDriver};
use crate::error::{InitError, RunError, ShaderBuildStage};
use crate::geometry::{upload_mesh, GeometryHandles, Mesh};
use crate::shader::{link, ShaderCompiler, ShaderStage};
use crate::window::{WindowHost, WinitHost};

use super::frame_loop::{FrameLoop, FrameScene};
use super::resize::framebuffer_size_callback;

/// Summary of a finished run.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub frames: u64,
}

/// Opens the window, renders until it closes, and releases everything.
///
/// The driver is dropped before the window host is terminated.
pub fn run(config: &AppConfig) -> Result<RunReport, RunError> {
    let mut host = WinitHost::new(&config.window)?;

    let gpu = match pollster::block_on(Gpu::new(Arc::clone(host.window()), &config.context)) {
        Ok(gpu) => gpu,
        Err(err) => {
            host.terminate();
            return Err(InitError::GraphicsLoader(format!("{err:#}")).into());
        }
    };
    let mut driver = WgpuDriver::new(gpu);

    let result = run_app(&mut host, &mut driver, config);

    drop(driver);
    host.terminate();
    result
}

/// Shader build, geometry upload, frame loop and teardown against any host and driver.
///
/// Teardown runs whenever the program and geometry exist, including after a
/// driver error ends the loop.
pub fn run_app<H, D>(host: &mut H, driver: &mut D, config: &AppConfig) -> Result<RunReport, RunError>
where
    H: WindowHost + ?Sized,
    D: GraphicsDriver,
{
    let program = build_program(driver, config)?;

    let geometry = match upload_mesh(driver, &Mesh::quad()) {
        Ok(geometry) => geometry,
        Err(err) => {
            if let Err(cleanup) = driver.delete_program(program) {
                log::warn!("failed to delete the program after a failed upload: {cleanup}");
            }
            return Err(err.into());
        }
    };

    driver.set_polygon_mode(config.polygon_mode);
    let (width, height) = host.framebuffer_size();
    driver.set_viewport(Viewport::from_size(width, height));

    let mut frame_loop = FrameLoop::new(FrameScene {
        program,
        vertex_array: geometry.vertex_array,
        index_count: geometry.index_count,
        index_type: geometry.index_type,
        clear_color: config.clear_color,
    });
    frame_loop.set_resize_callback(framebuffer_size_callback::<D>);

    let outcome = frame_loop.run(host, driver);
    let released = teardown(driver, geometry, program);

    let frames = outcome?;
    released?;
    Ok(RunReport { frames })
}

/// Compiles both stages, links them and creates the program object.
///
/// Failures are logged with the stage they come from. Unless
/// `config.strict_shaders` is set they are tolerated: the program is still
/// created, and draws against it are skipped by the driver.
pub fn build_program<D>(driver: &mut D, config: &AppConfig) -> Result<ProgramId, RunError>
where
    D: GraphicsDriver + ?Sized,
{
    let compiler = ShaderCompiler::for_context(&config.context);
    let mut failure: Option<RunError> = None;

    let vertex = compiler.compile(ShaderStage::Vertex, &config.shaders.vertex);
    let fragment = compiler.compile(ShaderStage::Fragment, &config.shaders.fragment);

    for stage in [&vertex, &fragment] {
        if !stage.status() {
            log::error!("{} shader compilation failed:\n{}", stage.stage(), stage.log());
            if failure.is_none() {
                failure = Some(RunError::ShaderBuild {
                    stage: ShaderBuildStage::Compile(stage.stage()),
                    log: stage.log().to_string(),
                });
            }
        }
    }

    let program = link(vertex, fragment);
    if program.status() {
        log::info!("shader program linked");
    } else {
        log::error!("shader program linking failed:\n{}", program.log());
        if failure.is_none() {
            failure = Some(RunError::ShaderBuild {
                stage: ShaderBuildStage::Link,
                log: program.log().to_string(),
            });
        }
    }

    if config.strict_shaders {
        if let Some(err) = failure {
            return Err(err);
        }
    }

    Ok(driver.create_program(&program))
}

/// Deletes the layout object, vertex buffer, index buffer, then the program.
///
/// Every deletion is attempted; the first error is returned.
pub fn teardown<D>(driver: &mut D, geometry: GeometryHandles, program: ProgramId) -> Result<(), DriverError>
where
    D: GraphicsDriver + ?Sized,
{
    let geometry = geometry.release(driver);
    let program = driver.delete_program(program);
    log::debug!("GPU objects released");
    geometry.and(program)
}
