//! End-to-end tests over the agent's public surface: a policy file on disk,
//! loaded and compiled into a registry, evaluated through mock probes.
//!
//! The real smartctl/hddtemp/mdadm bindings are exercised by their own unit
//! tests against captured tool output; here the probes are in-memory so the
//! whole pipeline runs without storage hardware.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use diskwatch_agent::config::load_policy;
use diskwatch_agent::runner::evaluate_all;

use diskwatch_core::probe::{ArrayState, ArrayStatusProbe, AttributeTable, DeviceProbe};
use diskwatch_core::registry::DeviceRegistry;
use diskwatch_core::resolve::{BlockDevice, DeviceCatalog};
use diskwatch_core::verdict::HealthReason;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

const POLICY_JSON: &str = r#"{
    "devices": [
        {
            "name": "archive disk",
            "code": "arc0",
            "reference_kind": "dev",
            "reference": "/dev/sda",
            "kind": "ata",
            "max_temp": 45,
            "smart_checks": [
                { "attribute": 5, "problem_if": "x > 0" },
                { "attribute": 197, "problem_if": "x > 0" }
            ]
        },
        {
            "name": "scratch nvme",
            "code": "nvm0",
            "reference_kind": "uuid",
            "reference": "9c0c3dfc-74d8-4f1e-a3e9-6d4b2c5e7f10",
            "kind": "nvme",
            "max_temp": 60,
            "smart_checks": [
                { "attribute": 187, "problem_if": "x > 0" }
            ]
        },
        {
            "name": "main array",
            "code": "md0",
            "reference_kind": "dev",
            "reference": "/dev/md0",
            "kind": "mdadm",
            "max_temp": "none",
            "smart_checks": []
        }
    ]
}"#;

/// Catalog matching the policy above: every referenced path exists, and the
/// NVMe UUID maps to `nvme0n1`.
struct TestHost {
    devices: Vec<BlockDevice>,
}

impl TestHost {
    fn new() -> Self {
        Self {
            devices: vec![
                BlockDevice {
                    name: "sda".to_string(),
                    uuid: None,
                },
                BlockDevice {
                    name: "nvme0n1".to_string(),
                    uuid: Some("9c0c3dfc-74d8-4f1e-a3e9-6d4b2c5e7f10".to_string()),
                },
                BlockDevice {
                    name: "md0".to_string(),
                    uuid: None,
                },
            ],
        }
    }
}

impl DeviceCatalog for TestHost {
    fn block_devices(&self) -> &[BlockDevice] {
        &self.devices
    }
    fn exists(&self, _path: &Path) -> bool {
        true
    }
    fn canonical(&self, path: &Path) -> PathBuf {
        path.to_path_buf()
    }
}

/// Probe backed by fixed per-path tables and temperatures.
struct TableProbe {
    temperatures: HashMap<PathBuf, i64>,
    tables: HashMap<PathBuf, AttributeTable>,
}

impl DeviceProbe for TableProbe {
    async fn reachable(&self, _path: &Path) -> bool {
        true
    }
    async fn temperature(&self, path: &Path, _kind: &str) -> Option<i64> {
        self.temperatures.get(path).copied()
    }
    async fn attributes(&self, path: &Path, _kind: &str) -> Option<AttributeTable> {
        self.tables.get(path).cloned()
    }
}

/// Array probe with a single fixed state for every path.
struct FixedArrays {
    state: Option<&'static str>,
}

impl ArrayStatusProbe for FixedArrays {
    async fn array_state(&self, _path: &Path) -> Option<ArrayState> {
        self.state.map(ArrayState::from_state_text)
    }
    async fn diagnostic_report(&self, _path: &Path) -> String {
        "detail dump".to_string()
    }
}

fn write_policy(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn healthy_probe() -> TableProbe {
    TableProbe {
        temperatures: HashMap::from([
            (PathBuf::from("/dev/sda"), 30),
            (PathBuf::from("/dev/nvme0n1"), 40),
        ]),
        tables: HashMap::from([
            (PathBuf::from("/dev/sda"), AttributeTable::from([(5, 0), (197, 0)])),
            (PathBuf::from("/dev/nvme0n1"), AttributeTable::from([(187, 0)])),
        ]),
    }
}

// ---------------------------------------------------------------------------
// Test: policy file to verdicts, everything healthy
// ---------------------------------------------------------------------------

/// A well-formed policy loads, resolves (including the UUID reference) and
/// every device passes when the probes report clean data.
#[tokio::test]
async fn policy_to_passing_verdicts() {
    let file = write_policy(POLICY_JSON);
    let records = load_policy(file.path()).expect("policy should load");
    let registry = DeviceRegistry::build(&records, &TestHost::new()).expect("policy should compile");

    assert_eq!(registry.len(), 3);

    let verdicts = evaluate_all(
        &registry,
        &healthy_probe(),
        &FixedArrays {
            state: Some("clean"),
        },
        Duration::from_secs(5),
    )
    .await;

    assert_eq!(verdicts.len(), 3);
    assert!(verdicts.iter().all(|v| v.passed), "all devices should pass");
}

/// The UUID reference in the policy resolves to the catalog's device node.
#[test]
fn uuid_reference_resolves_through_the_catalog() {
    let file = write_policy(POLICY_JSON);
    let records = load_policy(file.path()).unwrap();
    let registry = DeviceRegistry::build(&records, &TestHost::new()).unwrap();

    let nvme = registry
        .devices()
        .iter()
        .find(|d| d.code() == "nvm0")
        .unwrap();
    assert_eq!(nvme.path(), Path::new("/dev/nvme0n1"));
}

// ---------------------------------------------------------------------------
// Test: failures surface as reasons, not errors
// ---------------------------------------------------------------------------

/// A degraded array fails only the RAID member; plain disks are unaffected.
#[tokio::test]
async fn degraded_array_fails_only_the_member() {
    let file = write_policy(POLICY_JSON);
    let records = load_policy(file.path()).unwrap();
    let registry = DeviceRegistry::build(&records, &TestHost::new()).unwrap();

    let verdicts = evaluate_all(
        &registry,
        &healthy_probe(),
        &FixedArrays {
            state: Some("degraded"),
        },
        Duration::from_secs(5),
    )
    .await;

    let failed: Vec<_> = verdicts.iter().filter(|v| !v.passed).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].code, "md0");
    assert!(matches!(
        &failed[0].reasons[0],
        HealthReason::ArrayDegraded { state, .. } if state == "degraded"
    ));
}

/// An attribute over its condition threshold produces a reason naming both
/// the attribute and the observed value.
#[tokio::test]
async fn failing_attribute_is_reported_with_its_value() {
    let file = write_policy(POLICY_JSON);
    let records = load_policy(file.path()).unwrap();
    let registry = DeviceRegistry::build(&records, &TestHost::new()).unwrap();

    let mut probe = healthy_probe();
    probe
        .tables
        .insert(PathBuf::from("/dev/sda"), AttributeTable::from([(5, 12), (197, 0)]));

    let verdicts = evaluate_all(
        &registry,
        &probe,
        &FixedArrays {
            state: Some("clean"),
        },
        Duration::from_secs(5),
    )
    .await;

    let sda = verdicts.iter().find(|v| v.code == "arc0").unwrap();
    assert!(!sda.passed);
    assert_eq!(
        sda.reasons,
        vec![HealthReason::AttributeProblem {
            attribute: 5,
            value: 12
        }]
    );
}

// ---------------------------------------------------------------------------
// Test: verdict wire shape
// ---------------------------------------------------------------------------

/// Verdicts serialize with tagged reasons so log consumers can match on the
/// `reason` discriminator.
#[tokio::test]
async fn verdict_serialization_is_tagged() {
    let file = write_policy(POLICY_JSON);
    let records = load_policy(file.path()).unwrap();
    let registry = DeviceRegistry::build(&records, &TestHost::new()).unwrap();

    let verdicts = evaluate_all(
        &registry,
        &healthy_probe(),
        &FixedArrays {
            state: Some("degraded"),
        },
        Duration::from_secs(5),
    )
    .await;

    let md0 = verdicts.iter().find(|v| v.code == "md0").unwrap();
    let json = serde_json::to_value(md0).unwrap();

    assert_eq!(json["device"], "main array");
    assert_eq!(json["passed"], false);
    assert_eq!(json["reasons"][0]["reason"], "array_degraded");
    assert_eq!(json["reasons"][0]["state"], "degraded");
    assert!(json["checked_at"].is_string());
}

// ---------------------------------------------------------------------------
// Test: bad policies are rejected before any probe runs
// ---------------------------------------------------------------------------

/// A malformed condition is rejected at build time with the device and
/// attribute named in the error.
#[test]
fn bad_condition_is_rejected_at_build_time() {
    let policy = POLICY_JSON.replace("x > 0", "x ** 2");
    let file = write_policy(&policy);
    let records = load_policy(file.path()).unwrap();

    let err = DeviceRegistry::build(&records, &TestHost::new()).unwrap_err();
    let text = err.to_string();
    assert!(text.contains("archive disk"), "got: {text}");
}
