//! fieldmeta - generate field meta data from Fortran meta modules
//!
//! This is the main entry point for the fieldmeta application.

use tracing::{error, info};

use fieldmeta::output::write_suite;
use fieldmeta::{
    generate_run_id, init_tracing, log_error, log_timed_operation, read_meta_data, Config, Result,
};

fn main() -> Result<()> {
    // Load configuration
    let (config, root) = Config::load()?;

    init_tracing(&config.log_level);
    info!(
        run_id = %generate_run_id(),
        "Starting fieldmeta v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Validate configuration
    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;

    info!("Reading meta data below {}", root.display());
    let report = read_meta_data(&root, &config).map_err(|e| {
        log_error(&e, "reading meta data");
        e
    })?;

    // Nothing is written unless every file was valid
    let meta_data = report.into_result().map_err(|e| {
        error!("Meta data is invalid, no files written: {}", e);
        e
    })?;

    let files = log_timed_operation("write_suite", || write_suite(&meta_data, &config))
        .map_err(|e| {
            log_error(&e, "writing suite files");
            e
        })?;

    info!("Wrote {}", files.rose_meta.display());
    info!("Wrote {}", files.json.display());
    Ok(())
}
