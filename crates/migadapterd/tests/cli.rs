//! Command-line regression tests.
//!
//! Runs the built binary against snapshot and workload files in a temp dir.

use std::path::Path;
use std::process::{Command, Output};

use serde_json::{Value, json};

fn migadapterd(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_migadapterd"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .unwrap()
}

fn write_json(path: &Path, value: &Value) {
    std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn pending_workload() -> Value {
    json!({
        "meta": { "name": "podpending", "namespace": "test" },
        "spec": {
            "containers": [{
                "name": "c1",
                "resources": {
                    "requests": { "nvidia.com/mig-1g.5gb": "1" },
                    "limits": { "nvidia.com/mig-1g.5gb": "1" }
                }
            }]
        },
        "status": {
            "phase": "Pending",
            "conditions": [{
                "type": "PodScheduled",
                "status": "False",
                "reason": "Unschedulable",
                "message": "0/1 nodes are available, Insufficient nvidia.com/mig-1g.5gb,"
            }]
        }
    })
}

#[test]
fn reconcile_resizes_pending_workload() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("cluster.json");
    write_json(
        &snapshot,
        &json!({
            "hosts": [{
                "meta": { "name": "node1" },
                "allocatable": { "nvidia.com/mig-2g.10gb": "1" }
            }],
            "workloads": [pending_workload()]
        }),
    );

    let out = migadapterd(&[
        "reconcile",
        "--snapshot",
        snapshot.to_str().unwrap(),
        "--write-snapshot",
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let report: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report[0]["workload"]["name"], "podpending");
    assert_eq!(report[0]["outcome"]["action"], "resized");

    let written: Value =
        serde_json::from_str(&std::fs::read_to_string(&snapshot).unwrap()).unwrap();
    assert_eq!(written["workloads"].as_array().unwrap().len(), 0);
}

#[test]
fn reconcile_labels_idle_host_from_config_profiles() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("cluster.json");
    let config = dir.path().join("migadapter.toml");
    std::fs::write(
        &config,
        format!(
            "[profiles]\n\"nvidia.com/mig-1g.5gb\" = \"custom-1g\"\n\n[daemon]\nsnapshot = {:?}\n",
            snapshot.to_str().unwrap()
        ),
    )
    .unwrap();
    write_json(
        &snapshot,
        &json!({
            "hosts": [{ "meta": { "name": "node1" }, "allocatable": {} }],
            "workloads": [pending_workload()]
        }),
    );

    let out = migadapterd(&["--config", config.to_str().unwrap(), "reconcile"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let report: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report[0]["outcome"]["action"], "host_labeled");
    assert_eq!(report[0]["outcome"]["host"], "node1");
    assert_eq!(report[0]["outcome"]["profile"], "custom-1g");
}

#[test]
fn admit_applies_rules_file() {
    let dir = tempfile::tempdir().unwrap();
    let workload = dir.path().join("pod.json");
    let rules = dir.path().join("rules.json");

    let mut pod = pending_workload();
    pod["status"] = json!({});
    write_json(&workload, &pod);
    write_json(
        &rules,
        &json!({
            "test/podpending": {
                "c1": { "requests": { "nvidia.com/mig-3g.20gb": "1" } }
            }
        }),
    );

    let out = migadapterd(&[
        "admit",
        "--workload",
        workload.to_str().unwrap(),
        "--rules",
        rules.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let admitted: Value = serde_json::from_slice(&out.stdout).unwrap();
    let resources = &admitted["spec"]["containers"][0]["resources"];
    assert_eq!(resources["requests"]["nvidia.com/mig-3g.20gb"], "1");
    assert_eq!(resources["limits"]["nvidia.com/mig-1g.5gb"], "1");

    let original = admitted["meta"]["annotations"]["adapter.gpu.turbonomic.ibm.com/original"]
        .as_str()
        .unwrap();
    let original: Value = serde_json::from_str(original).unwrap();
    assert_eq!(original["c1"]["requests"]["nvidia.com/mig-1g.5gb"], "1");
}

#[test]
fn reconcile_rules_reach_the_recreated_workload() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("cluster.json");
    let rules = dir.path().join("rules.json");
    let recreated = dir.path().join("recreated.json");

    let mut pod = pending_workload();
    pod["meta"] = json!({ "name": "job-abc", "generate_name": "job-", "namespace": "test" });
    write_json(
        &snapshot,
        &json!({
            "hosts": [{
                "meta": { "name": "node1" },
                "allocatable": { "nvidia.com/mig-2g.10gb": "1" }
            }],
            "workloads": [pod.clone()]
        }),
    );

    let out = migadapterd(&[
        "reconcile",
        "--snapshot",
        snapshot.to_str().unwrap(),
        "--write-snapshot",
        "--rules-out",
        rules.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let written: Value = serde_json::from_str(&std::fs::read_to_string(&rules).unwrap()).unwrap();
    assert!(written["test/job-"]["c1"]["requests"]["nvidia.com/mig-2g.10gb"].is_string());

    // The controller brings the workload back under a fresh name.
    pod["meta"]["name"] = json!("job-xyz");
    pod["status"] = json!({});
    write_json(&recreated, &pod);

    let out = migadapterd(&[
        "admit",
        "--workload",
        recreated.to_str().unwrap(),
        "--rules",
        rules.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let admitted: Value = serde_json::from_slice(&out.stdout).unwrap();
    let resources = &admitted["spec"]["containers"][0]["resources"];
    assert_eq!(resources["requests"]["nvidia.com/mig-2g.10gb"], "1");
    assert_eq!(resources["limits"]["nvidia.com/mig-2g.10gb"], "1");

    let original = admitted["meta"]["annotations"]["adapter.gpu.turbonomic.ibm.com/original"]
        .as_str()
        .unwrap();
    let original: Value = serde_json::from_str(original).unwrap();
    assert_eq!(original["c1"]["requests"]["nvidia.com/mig-1g.5gb"], "1");
    assert_eq!(original["c1"]["limits"]["nvidia.com/mig-1g.5gb"], "1");

    let remaining: Value =
        serde_json::from_str(&std::fs::read_to_string(&rules).unwrap()).unwrap();
    assert!(remaining.get("test/job-").is_none());
}

#[test]
fn missing_snapshot_is_an_error() {
    let out = migadapterd(&["reconcile"]);
    assert!(!out.status.success());
}
