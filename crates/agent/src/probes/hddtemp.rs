//! Primary temperature source: the `hddtemp` tool.
//!
//! hddtemp refuses to spin up a sleeping disk and prints "is sleeping"
//! instead of a reading. In that case we perform one small wake read
//! directly from the device, wait a fixed moment for the platters, and
//! retry exactly once. Every failure path yields `None`; the caller falls
//! back to a SMART-based reading.

use std::path::Path;
use std::time::Duration;

use tokio::io::AsyncReadExt;

use crate::subprocess::{run_tool, ToolOutput};

/// Bytes read from the device to wake a sleeping disk.
const WAKE_READ_BYTES: usize = 1024;

/// Delay between the wake read and the retry.
const WAKE_DELAY: Duration = Duration::from_secs(2);

/// Timeout for one hddtemp invocation.
const TOOL_TIMEOUT: Duration = Duration::from_secs(20);

/// Read the device temperature via hddtemp, or `None` if no reading is
/// available this cycle.
pub async fn read_temperature(path: &Path) -> Option<i64> {
    let dev = path.to_string_lossy();
    let mut output = invoke(&dev).await?;

    if output.stdout.contains("is sleeping") {
        tracing::debug!(device = %dev, "Disk is sleeping, performing wake read");
        wake(path).await;
        tokio::time::sleep(WAKE_DELAY).await;
        output = invoke(&dev).await?;
    }

    match parse_output(&output.stdout) {
        Some(celsius) => Some(celsius),
        None => {
            tracing::debug!(device = %dev, raw = %output.stdout.trim(), "Cannot parse hddtemp output");
            None
        }
    }
}

/// Run hddtemp once; `None` on spawn failure, timeout, or non-zero exit.
async fn invoke(dev: &str) -> Option<ToolOutput> {
    match run_tool("hddtemp", &[dev], TOOL_TIMEOUT).await {
        Ok(output) if output.success() => Some(output),
        Ok(output) => {
            tracing::debug!(device = %dev, code = output.exit_code, "hddtemp failed");
            None
        }
        Err(e) => {
            tracing::debug!(device = %dev, error = %e, "hddtemp unavailable");
            None
        }
    }
}

/// Bounded raw read from the device node. Errors are ignored; the point is
/// only to force the disk awake.
async fn wake(path: &Path) {
    let mut buf = vec![0u8; WAKE_READ_BYTES];
    if let Ok(mut file) = tokio::fs::File::open(path).await {
        let _ = file.read(&mut buf).await;
    }
}

/// Extract the temperature from a line like
/// `/dev/sda: ST31000528AS: 38°C` (or `38 C` depending on locale).
fn parse_output(stdout: &str) -> Option<i64> {
    let tail = stdout.trim().rsplit(':').next()?;
    let token = tail.split_whitespace().next()?;
    let digits: String = token
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '-')
        .collect();
    digits.parse().ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_celsius_with_unit_suffix() {
        assert_eq!(
            parse_output("/dev/sda: ST31000528AS: 38°C\n"),
            Some(38)
        );
    }

    #[test]
    fn parses_space_separated_unit() {
        assert_eq!(parse_output("/dev/sdb: WDC WD40EFRX: 41 C"), Some(41));
    }

    #[test]
    fn takes_the_last_colon_segment() {
        // Model names may themselves contain colons.
        assert_eq!(parse_output("/dev/sda: Model: X:9000: 35°C"), Some(35));
    }

    #[test]
    fn unparseable_output_yields_none() {
        assert_eq!(parse_output(""), None);
        assert_eq!(parse_output("/dev/sda: open: Permission denied"), None);
        assert_eq!(parse_output("/dev/sda: ST31000528AS: S.M.A.R.T. not available"), None);
    }
}
