//! Demo binary: builds a synthetic converter population from
//! `netmeter-demo.yaml` (or built-in defaults if absent) and runs it for a
//! fixed number of ticks, logging a summary at the end.

use std::path::Path;

use netmeter_harness::{run_demo, HarnessConfig, NoOpObserver};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// # Errors
///
/// Returns an error if `netmeter-demo.yaml` is present but not valid
/// harness configuration.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("netmeter-demo starting");

    let config = load_config()?;
    info!(
        resource_count = config.resource_count,
        tick_count = config.tick_count,
        "configuration loaded"
    );

    let mut observer = NoOpObserver;
    let report = run_demo(&config, &mut observer);

    info!(
        ticks_run = report.ticks_run,
        converter_count = report.converter_count,
        resource_count = report.resources.len(),
        "demo harness finished"
    );

    for summary in &report.resources {
        info!(
            resource = %summary.resource,
            total_produced = summary.total_produced,
            total_required = summary.total_required,
            total_optional = summary.total_optional,
            endpoint_count = summary.endpoint_count,
            "final resource state"
        );
    }

    Ok(())
}

fn load_config() -> Result<HarnessConfig, Box<dyn std::error::Error>> {
    let path = Path::new("netmeter-demo.yaml");
    if !path.exists() {
        return Ok(HarnessConfig::default());
    }
    Ok(HarnessConfig::from_file(path)?)
}
