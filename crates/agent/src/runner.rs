//! The evaluation loop: probe every device, log every verdict, repeat.
//!
//! Devices are independent once the registry is built, so each cycle
//! evaluates them concurrently through a bounded pool. One device's failure
//! (or timeout) never affects another's verdict, and nothing in a cycle can
//! escalate past a reason inside that device's verdict.

use std::path::Path;
use std::time::Duration;

use futures::stream::{self, StreamExt};

use diskwatch_core::probe::{ArrayStatusProbe, DeviceProbe};
use diskwatch_core::registry::DeviceRegistry;
use diskwatch_core::verdict::{HealthReason, HealthVerdict};

/// Upper bound on devices probed at the same time. Probes are subprocess
/// calls; a handful in flight keeps a large policy moving without
/// stampeding the I/O subsystem being health-checked.
const MAX_CONCURRENT_EVALUATIONS: usize = 4;

/// Evaluate every device in the registry once.
///
/// Each evaluation runs under `device_timeout`; expiry becomes a failed
/// verdict with a timeout reason. Verdict order follows completion, not
/// policy order.
pub async fn evaluate_all(
    registry: &DeviceRegistry,
    probe: &impl DeviceProbe,
    arrays: &impl ArrayStatusProbe,
    device_timeout: Duration,
) -> Vec<HealthVerdict> {
    stream::iter(registry.devices())
        .map(|device| async move {
            match tokio::time::timeout(device_timeout, device.evaluate_health(probe, arrays)).await
            {
                Ok(verdict) => verdict,
                Err(_elapsed) => {
                    tracing::warn!(device = %device.name(), "Evaluation timed out");
                    HealthVerdict::new(
                        device.name(),
                        device.code(),
                        vec![HealthReason::TimedOut {
                            seconds: device_timeout.as_secs(),
                        }],
                    )
                }
            }
        })
        .buffer_unordered(MAX_CONCURRENT_EVALUATIONS)
        .collect()
        .await
}

/// Log one cycle's verdicts; dump array diagnostics for degraded RAIDs.
async fn report(verdicts: &[HealthVerdict], arrays: &impl ArrayStatusProbe) {
    for verdict in verdicts {
        if verdict.passed {
            tracing::info!(device = %verdict.device, code = %verdict.code, "Healthy");
        } else {
            tracing::warn!(
                device = %verdict.device,
                code = %verdict.code,
                reasons = %verdict.summary(),
                "UNHEALTHY"
            );
        }

        for reason in &verdict.reasons {
            let array = match reason {
                HealthReason::ArrayDegraded { array, .. }
                | HealthReason::ArrayStateUnknown { array } => array,
                _ => continue,
            };
            let dump = arrays.diagnostic_report(Path::new(array)).await;
            tracing::warn!(device = %verdict.device, array = %array, "Array diagnostics:\n{dump}");
        }
    }
}

/// Run evaluation cycles forever on a fixed interval.
///
/// Never returns under normal operation. Nothing inside a cycle is fatal;
/// configuration problems were already rejected before this is called.
pub async fn run(
    registry: &DeviceRegistry,
    probe: &impl DeviceProbe,
    arrays: &impl ArrayStatusProbe,
    interval: Duration,
    device_timeout: Duration,
) {
    let mut ticker = tokio::time::interval(interval);

    loop {
        ticker.tick().await;

        tracing::debug!(devices = registry.len(), "Starting evaluation cycle");
        let verdicts = evaluate_all(registry, probe, arrays, device_timeout).await;
        report(&verdicts, arrays).await;

        let failed = verdicts.iter().filter(|v| !v.passed).count();
        tracing::info!(
            devices = verdicts.len(),
            failed,
            "Evaluation cycle complete"
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
