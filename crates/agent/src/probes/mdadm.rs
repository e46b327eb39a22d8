//! Software-RAID array state via `mdadm`.
//!
//! Binds [`ArrayStatusProbe`]: the daemon consults this only for devices
//! whose policy kind is `mdadm`. State extraction soft-fails to `None`
//! (unhealthy, state unknown); the diagnostic report never fails; tool
//! errors are embedded in the text, since its only consumer is an operator
//! reading logs.

use std::path::Path;
use std::time::Duration;

use diskwatch_core::probe::{ArrayState, ArrayStatusProbe};

use crate::subprocess::run_tool;

/// Timeout for one mdadm invocation.
const TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Kernel's RAID status file, appended to diagnostic reports.
const MDSTAT_PATH: &str = "/proc/mdstat";

/// The [`ArrayStatusProbe`] binding used by the daemon.
#[derive(Debug, Default)]
pub struct MdadmProbe;

impl MdadmProbe {
    pub fn new() -> Self {
        Self
    }
}

impl ArrayStatusProbe for MdadmProbe {
    async fn array_state(&self, path: &Path) -> Option<ArrayState> {
        let dev = path.to_string_lossy();
        let output = match run_tool("mdadm", &["--detail", &dev], TOOL_TIMEOUT).await {
            Ok(output) if output.success() => output,
            Ok(output) => {
                tracing::warn!(array = %dev, code = output.exit_code, stderr = %output.stderr.trim(), "mdadm --detail failed");
                return None;
            }
            Err(e) => {
                tracing::warn!(array = %dev, error = %e, "mdadm unavailable");
                return None;
            }
        };

        match extract_state(&output.stdout) {
            Some(state) => Some(ArrayState::from_state_text(&state)),
            None => {
                tracing::warn!(array = %dev, "No State line in mdadm --detail output");
                None
            }
        }
    }

    async fn diagnostic_report(&self, path: &Path) -> String {
        let dev = path.to_string_lossy();
        let mut report = String::new();

        match run_tool("mdadm", &["--detail", &dev], TOOL_TIMEOUT).await {
            Ok(output) if output.success() => {
                report.push_str(&format!("mdadm --detail {dev}:\n\n{}\n", output.stdout));
            }
            Ok(output) => {
                report.push_str(&format!(
                    "mdadm --detail {dev} exited with code {}: {}\n",
                    output.exit_code,
                    output.stderr.trim()
                ));
            }
            Err(e) => {
                report.push_str(&format!("Cannot run \"mdadm --detail {dev}\": {e}\n"));
            }
        }

        match tokio::fs::read_to_string(MDSTAT_PATH).await {
            Ok(mdstat) => {
                report.push_str(&format!("\n{MDSTAT_PATH}:\n\n{mdstat}"));
            }
            Err(e) => {
                report.push_str(&format!("\nCannot read {MDSTAT_PATH}: {e}\n"));
            }
        }

        report
    }
}

/// Pull the state text out of `mdadm --detail` output: the part after the
/// first colon of the line containing "State :".
fn extract_state(stdout: &str) -> Option<String> {
    let line = stdout.lines().find(|line| line.contains("State :"))?;
    let (_, state) = line.split_once(':')?;
    Some(state.trim().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
