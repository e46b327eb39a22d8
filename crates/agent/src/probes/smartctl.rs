//! SMART data extraction via `smartctl`, and the [`DeviceProbe`] binding.
//!
//! smartctl encodes device state in its exit-status bits, so a non-zero exit
//! does not mean "no output"; the table is parsed whenever it is present.
//! ATA devices report a numbered attribute table; NVMe devices report a
//! health log of labeled fields, which are exposed here under conventional
//! ATA-style attribute numbers so one policy grammar covers both protocols.

use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use tokio::io::AsyncReadExt;

use diskwatch_core::probe::{AttributeTable, DeviceProbe};
use diskwatch_core::types::AttributeId;

use crate::probes::hddtemp;
use crate::subprocess::run_tool;

/// Timeout for one smartctl invocation.
const TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Bytes read for the liveness check.
const LIVENESS_READ_BYTES: usize = 1024;

/// ATA attribute number for Temperature_Celsius.
const ATTR_TEMPERATURE: AttributeId = 194;

/// NVMe health-log fields and the attribute numbers they are exposed under.
const NVME_FIELD_IDS: &[(&str, AttributeId)] = &[
    ("Power On Hours", 9),
    ("Power Cycles", 12),
    ("Media and Data Integrity Errors", 187),
    ("Temperature", ATTR_TEMPERATURE),
    ("Unsafe Shutdowns", 199),
];

/// One ATA attribute-table row: id, then flag/value/worst/thresh/type/
/// updated/when_failed columns, then the raw value (leading integer only;
/// smartctl appends annotations like `(Min/Max 20/45)`).
fn ata_row_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?m)^\s*(\d+)\s+\S+\s+0x[0-9a-fA-F]+\s+\d+\s+\d+\s+(?:\d+|---)\s+\S+\s+\S+\s+\S+\s+(-?\d+)",
        )
        .expect("pattern is valid")
    })
}

/// The [`DeviceProbe`] binding used by the daemon: hddtemp first for
/// temperature, smartctl for everything else.
#[derive(Debug, Default)]
pub struct SmartctlProbe;

impl SmartctlProbe {
    pub fn new() -> Self {
        Self
    }
}

impl DeviceProbe for SmartctlProbe {
    async fn reachable(&self, path: &Path) -> bool {
        probe_liveness(path).await
    }

    async fn temperature(&self, path: &Path, kind_tag: &str) -> Option<i64> {
        // Primary source first; fall back to a SMART-based reading.
        if let Some(celsius) = hddtemp::read_temperature(path).await {
            return Some(celsius);
        }
        smart_temperature(path, kind_tag).await
    }

    async fn attributes(&self, path: &Path, kind_tag: &str) -> Option<AttributeTable> {
        let stdout = smart_output(path).await?;
        let table = if kind_tag == "nvme" {
            parse_nvme_health(&stdout)
        } else {
            parse_ata_table(&stdout)
        };
        if table.is_empty() {
            tracing::debug!(device = %path.display(), kind = kind_tag, "No SMART attributes parsed");
            None
        } else {
            Some(table)
        }
    }
}

/// The device node exists and supports a small bounded read.
async fn probe_liveness(path: &Path) -> bool {
    let mut buf = vec![0u8; LIVENESS_READ_BYTES];
    match tokio::fs::File::open(path).await {
        Ok(mut file) => file.read(&mut buf).await.is_ok(),
        Err(_) => false,
    }
}

/// Run `smartctl -A` and return its stdout whenever the tool produced any.
async fn smart_output(path: &Path) -> Option<String> {
    let dev = path.to_string_lossy();
    match run_tool("smartctl", &["-A", &dev], TOOL_TIMEOUT).await {
        Ok(output) if !output.stdout.trim().is_empty() => Some(output.stdout),
        Ok(output) => {
            tracing::debug!(device = %dev, code = output.exit_code, "smartctl produced no output");
            None
        }
        Err(e) => {
            tracing::debug!(device = %dev, error = %e, "smartctl unavailable");
            None
        }
    }
}

/// Protocol-specific temperature extraction from SMART data.
async fn smart_temperature(path: &Path, kind_tag: &str) -> Option<i64> {
    let stdout = smart_output(path).await?;
    if kind_tag == "nvme" {
        parse_nvme_health(&stdout).get(&ATTR_TEMPERATURE).copied()
    } else {
        parse_ata_table(&stdout).get(&ATTR_TEMPERATURE).copied()
    }
}

/// Parse the ATA attribute table: attribute id -> leading integer of the raw
/// value column.
fn parse_ata_table(stdout: &str) -> AttributeTable {
    ata_row_pattern()
        .captures_iter(stdout)
        .filter_map(|caps| {
            let id: AttributeId = caps[1].parse().ok()?;
            let raw: i64 = caps[2].parse().ok()?;
            Some((id, raw))
        })
        .collect()
}

/// Parse the NVMe health log ("Label: value" lines) into the conventional
/// attribute numbering from [`NVME_FIELD_IDS`].
fn parse_nvme_health(stdout: &str) -> AttributeTable {
    let mut table = AttributeTable::new();
    for line in stdout.lines() {
        let Some((label, rest)) = line.split_once(':') else {
            continue;
        };
        let Some(&(_, id)) = NVME_FIELD_IDS
            .iter()
            .find(|(name, _)| *name == label.trim())
        else {
            continue;
        };
        if let Some(value) = parse_nvme_value(rest) {
            table.insert(id, value);
        }
    }
    table
}

/// Leading integer of an NVMe field value, tolerating thousands separators
/// (`1,234,567`), unit suffixes (`35 Celsius`, `100%`), and `0x` prefixes.
fn parse_nvme_value(rest: &str) -> Option<i64> {
    let token = rest.split_whitespace().next()?;
    if let Some(hex) = token.strip_prefix("0x") {
        return i64::from_str_radix(hex, 16).ok();
    }
    let digits: String = token
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-')
        .collect();
    digits.parse().ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
