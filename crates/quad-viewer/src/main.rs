use std::process::ExitCode;

use quad_engine::logging::{init_logging, LoggingConfig};
use quad_engine::{run, AppConfig};

fn main() -> ExitCode {
    init_logging(LoggingConfig::default());

    match run(&AppConfig::default()) {
        Ok(report) => {
            log::info!("window closed after {} frame(s)", report.frames);
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
