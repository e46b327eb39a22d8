//! `diskwatch-agent` -- disk health monitoring daemon.
//!
//! Loads a JSON policy describing the disks and arrays to watch, resolves
//! each device reference against the host's block-device catalog, then
//! evaluates every device on a fixed interval via `smartctl`, `hddtemp`
//! and `mdadm`, logging a verdict per device per cycle.
//!
//! # Environment variables
//!
//! | Variable                       | Required | Default | Description                          |
//! |--------------------------------|----------|---------|--------------------------------------|
//! | `DISKWATCH_POLICY`             | yes      | --      | Path to the JSON policy file         |
//! | `DISKWATCH_INTERVAL_SECS`      | no       | `300`   | Seconds between evaluation cycles    |
//! | `DISKWATCH_DEVICE_TIMEOUT_SECS`| no       | `120`   | Per-device evaluation timeout        |

use diskwatch_agent::config::{self, Settings};
use diskwatch_agent::probes::{lsblk::HostCatalog, mdadm::MdadmProbe, smartctl::SmartctlProbe};
use diskwatch_agent::runner;

use diskwatch_core::registry::DeviceRegistry;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "diskwatch_agent=info,diskwatch_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid settings");
        std::process::exit(1);
    });

    let records = config::load_policy(&settings.policy_path).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Cannot load policy");
        std::process::exit(1);
    });

    let catalog = HostCatalog::discover().await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Cannot discover block devices");
        std::process::exit(1);
    });

    let registry = DeviceRegistry::build(&records, &catalog).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Policy rejected");
        std::process::exit(1);
    });

    tracing::info!(
        policy = %settings.policy_path.display(),
        devices = registry.len(),
        interval_secs = settings.interval.as_secs(),
        "Starting diskwatch-agent",
    );

    runner::run(
        &registry,
        &SmartctlProbe::new(),
        &MdadmProbe::new(),
        settings.interval,
        settings.device_timeout,
    )
    .await;
}
