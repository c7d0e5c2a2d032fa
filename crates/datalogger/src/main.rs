//! SensorTile Datalog - Main Entry Point

use acquisition::{GestureLine, LoggingMode};
use datalog_sink::{DirectoryMedium, StdoutSink};
use datalogger::{halt, init_logging, DatalogConfig, Output, Pipeline, LOGGING_MODE};
use sensor_source::{LatchedTap, SampleSource, SimulatedBoard};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = DatalogConfig::load()?;
    init_logging(&config.log_level);

    info!("=== SensorTile datalog v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Logging mode: {}", LOGGING_MODE);

    let source = SampleSource::new(SimulatedBoard::new())?;
    let tap = LatchedTap::new();

    let output = match LOGGING_MODE {
        LoggingMode::Streaming => Output::Stream(StdoutSink),
        LoggingMode::FileLogging => match DirectoryMedium::mount(&config.log_dir) {
            Ok(medium) => Output::File(medium),
            Err(e) => {
                halt(&e).await;
                return Ok(());
            }
        },
    };

    let pipeline = Pipeline::start(&config, source, tap.clone(), output);
    spawn_tap_input(tap, pipeline.gesture_line());
    if LOGGING_MODE == LoggingMode::FileLogging {
        info!("Press Enter to double-tap (start/stop logging)");
    }

    if let Err(e) = pipeline.join().await {
        halt(&e).await;
    }
    Ok(())
}

/// Every line on stdin counts as a double-tap on the board
fn spawn_tap_input(tap: LatchedTap, line: GestureLine) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(_)) = lines.next_line().await {
            tap.latch();
            line.raise();
        }
        debug!("Operator input closed");
    });
}
