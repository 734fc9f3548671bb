//! Datalogger binary.
//!
//! Reads newline-delimited telemetry from a serial device into SQLite and
//! serves the accumulated log over HTTP.

use tracing::info;
use tracing_subscriber::EnvFilter;

use datalogd::{DatalogConfig, DatalogService};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("datalogd=info".parse()?))
        .init();

    info!("datalogd starting");

    let config = DatalogConfig::load()?;
    config.validate()?;
    info!(
        device = %config.device.address,
        baud_rate = config.device.baud_rate,
        db = %config.storage.path.display(),
        listen_addr = %config.server.listen_addr,
        "configuration loaded"
    );

    let service = DatalogService::new(config);
    service.run().await?;

    Ok(())
}
