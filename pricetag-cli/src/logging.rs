use std::{
    fs::{self, File},
    io,
};

use tracing::Level;
use tracing_error::ErrorLayer;
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer};

use crate::ARGUMENTS;

pub fn initialize_logging() -> anyhow::Result<()> {
    fs::create_dir_all(
        ARGUMENTS
            .log_location
            .parent()
            .ok_or(anyhow::anyhow!("Could not get log folder location"))?,
    )?;

    let log_file = File::options()
        .create(true)
        .append(true)
        .open(&ARGUMENTS.log_location)?;

    let file_subscriber = tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_filter(LevelFilter::from_level(ARGUMENTS.log_level));

    // Skipped tags and other warnings also go to the terminal.
    let stderr_subscriber = tracing_subscriber::fmt::layer()
        .without_time()
        .with_target(false)
        .with_writer(io::stderr)
        .with_filter(LevelFilter::from_level(Level::WARN.min(ARGUMENTS.log_level)));

    tracing_subscriber::registry()
        .with(file_subscriber)
        .with(stderr_subscriber)
        .with(ErrorLayer::default())
        .init();

    Ok(())
}
