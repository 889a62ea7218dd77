//! Tessera demo driver.
//!
//! Loads configuration, attaches a cache to a JSON-lines file and runs a
//! short add/get/update/remove session with two logging observers.

mod telemetry;
mod walkthrough;

use std::process::ExitCode;

use tessera_core::CacheConfig;

fn main() -> ExitCode {
    let config = match CacheConfig::load() {
        Ok(config) => config,
        Err(e) => {
            let fallback = CacheConfig::default();
            telemetry::init_tracing(&fallback);
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    telemetry::init_tracing(&config);

    match walkthrough::run(&config) {
        Ok(report) if report.passed() => {
            tracing::info!(entry_count = report.stats.entry_count, "Walkthrough passed");
            ExitCode::SUCCESS
        }
        Ok(report) => {
            tracing::error!(?report, "Walkthrough observed unexpected results");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(error = %e, "Walkthrough aborted");
            ExitCode::FAILURE
        }
    }
}
