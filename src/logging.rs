//! Logging utilities for fieldmeta.
//!
//! Structured logging helpers so that a run over a large source tree leaves a
//! searchable record of what was read, what was rejected and how long it took.

use std::time::Instant;
use tracing::{debug, error, info, warn};

use uuid::Uuid;

use crate::registry::MetaData;

/// Initialize the tracing subscriber with the given log level
pub fn init_tracing(log_level: &str) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(val) => val,
        Err(_) => log_level.to_string(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}

/// Log a start message for a significant operation
pub fn log_operation_start(operation: &str, details: Option<&str>) {
    if let Some(details) = details {
        info!(
            operation = operation,
            details = details,
            "Starting operation"
        );
    } else {
        info!(operation = operation, "Starting operation");
    }
}

/// Log the completion of a significant operation
pub fn log_operation_end(operation: &str, start_time: Instant, success: bool) {
    let duration = start_time.elapsed();
    let duration_ms = duration.as_secs_f64() * 1000.0;

    if success {
        info!(
            operation = operation,
            duration_ms = duration_ms,
            "Operation completed successfully"
        );
    } else {
        warn!(
            operation = operation,
            duration_ms = duration_ms,
            "Operation completed with errors"
        );
    }
}

/// Log an operation with timing and result in a single statement
pub fn log_timed_operation<F, R>(operation: &str, f: F) -> R
where
    F: FnOnce() -> R,
{
    let start = Instant::now();
    let run_id = Uuid::new_v4();

    debug!(
        operation = operation,
        run_id = %run_id,
        "Starting operation"
    );

    let result = f();

    let duration = start.elapsed();

    info!(
        operation = operation,
        run_id = %run_id,
        duration_ms = duration.as_secs_f64() * 1000.0,
        "Operation completed"
    );

    result
}

/// Log a summary of the meta data that was read
pub fn log_load_stats(root: &str, meta_data: &MetaData, valid_files: usize, total_files: usize) {
    let groups = meta_data.registries().count();
    let sections: Vec<&str> = meta_data
        .sections()
        .map(|section| section.name())
        .collect();
    info!(
        operation = "meta_data_load",
        root = root,
        section_count = sections.len(),
        sections = %sections.join(", "),
        group_count = groups,
        field_count = meta_data.field_count(),
        non_spatial_dimension_count = meta_data.non_spatial_dimensions().count(),
        valid_files = valid_files,
        total_files = total_files,
        "Meta data loaded"
    );
}

/// Log an error with context
pub fn log_error(error: &crate::error::MetaError, context: &str) {
    error!(
        error = %error,
        context = context,
        error_type = std::any::type_name_of_val(error),
        "Error occurred"
    );
}

/// Generate a unique run ID
pub fn generate_run_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_generate_run_id() {
        let id1 = generate_run_id();
        let id2 = generate_run_id();

        assert!(!id1.is_empty());
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_log_timed_operation() {
        let result = log_timed_operation("test_operation", || {
            std::thread::sleep(Duration::from_millis(1));
            42
        });

        assert_eq!(result, 42);
    }

    #[test]
    fn test_log_load_stats_on_empty_meta_data() {
        log_load_stats("/nowhere", &MetaData::default(), 0, 0);
    }
}
