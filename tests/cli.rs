use std::path::Path;

use assert_cmd::Command;
use operation_flow::{Stage, StageCheckpoint};
use waymark_checkpoint_store::{CheckpointEnvelope, CheckpointStore, FileCheckpointStore};
use waymark_core_types::OperationId;

fn write_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("config.yaml");
    let yaml = format!(
        "store:\n  backend: file\n  root: {}\n  fsync: false\nflow:\n  max_attempts: 3\n",
        dir.join("store").display()
    );
    std::fs::write(&path, yaml).unwrap();
    path
}

fn waymark(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("waymark").unwrap();
    cmd.env_remove("WAYMARK_STORE_ROOT")
        .env_remove("WAYMARK_SCRIPTED_DISPATCH")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config);
    cmd
}

async fn seed(root: &Path, id: &str, aggregated: u32) {
    let store = FileCheckpointStore::open(root, false, 0).unwrap();
    let checkpoint = StageCheckpoint::create_initial(5, 3, 50)
        .builder()
        .stage(Stage::Aggregate)
        .aggregated(aggregated)
        .build();
    store
        .save(CheckpointEnvelope::new(
            OperationId::new(id),
            1,
            checkpoint.to_payload().unwrap(),
        ))
        .await
        .unwrap();
}

#[tokio::test]
async fn list_show_and_delete_round_trip_through_the_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    seed(&dir.path().join("store"), "feed-a", 2).await;
    seed(&dir.path().join("store"), "search-b", 5).await;

    let out = waymark(&config)
        .args(["--output", "json", "checkpoints", "list", "--prefix", "feed-"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let listed: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let rows = listed.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["operation_id"], "feed-a");
    assert_eq!(rows[0]["stage"], "Aggregate");
    assert_eq!(rows[0]["aggregated"], 2);

    let out = waymark(&config)
        .args(["checkpoints", "show", "search-b"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("5/5"), "{text}");
    assert!(text.contains("completed"), "{text}");

    waymark(&config)
        .args(["checkpoints", "delete", "feed-a"])
        .assert()
        .success();
    waymark(&config)
        .args(["checkpoints", "show", "feed-a"])
        .assert()
        .failure();
}

#[test]
fn config_show_reflects_file_and_environment() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());

    let out = waymark(&config)
        .env("WAYMARK_SCRIPTED_DISPATCH", "true")
        .args(["--output", "json", "config", "show"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let shown: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(shown["flow"]["max_attempts"], 3);
    assert_eq!(shown["click"]["scripted_dispatch_enabled"], true);
}

#[test]
fn bad_override_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    waymark(&config)
        .env("WAYMARK_SCRIPTED_DISPATCH", "sometimes")
        .args(["config", "show"])
        .assert()
        .failure();
}

#[test]
fn metrics_dump_prints_text_exposition() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    waymark(&config)
        .args(["metrics", "dump"])
        .assert()
        .success();
}
