use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tempfile::tempdir;

#[derive(Debug, Deserialize)]
struct ReplayLog {
    seed: u64,
    steps: Vec<ReplayStep>,
    #[serde(rename = "final")]
    final_snapshot: Value,
}

#[derive(Debug, Deserialize)]
struct ReplayStep {
    step: usize,
    action: Option<Value>,
    changed: bool,
    snapshot: Value,
}

fn path_arg(path: &Path) -> Result<&str> {
    path.to_str().context("temporary path is not valid UTF-8")
}

fn run_viewer(args: &[&str]) -> Result<std::process::Output> {
    Command::new(env!("CARGO_BIN_EXE_cell_viewer"))
        .args(args)
        .output()
        .context("executing cell_viewer")
}

#[test]
fn headless_replay_returns_to_overview() -> Result<()> {
    let dir = tempdir().context("creating temporary directory for replay")?;
    let script = dir.path().join("actions.json");
    fs::write(
        &script,
        r#"[
            {"action": "select_layer", "id": "cathode"},
            {"action": "toggle_micro"},
            {"action": "set_infusion", "value": 0.8},
            {"action": "wait", "seconds": 0.5},
            {"action": "navigate", "target": "overview"}
        ]"#,
    )?;
    let log_path = dir.path().join("state_log.json");

    let output = run_viewer(&[
        "--headless",
        "--seed",
        "7",
        "--actions",
        path_arg(&script)?,
        "--frames",
        "4",
        "--frame-dt",
        "0.05",
        "--state-log-json",
        path_arg(&log_path)?,
    ])?;
    assert!(output.status.success(), "cell_viewer exited with {output:?}");

    let data = fs::read_to_string(&log_path)
        .with_context(|| format!("reading {}", log_path.display()))?;
    let log: ReplayLog = serde_json::from_str(&data).context("parsing state log")?;
    assert_eq!(log.seed, 7);
    assert_eq!(log.steps.len(), 9);
    for (index, step) in log.steps.iter().enumerate() {
        assert_eq!(step.step, index);
    }

    let micro = &log.steps[1];
    assert!(micro.changed);
    assert_eq!(micro.snapshot["state"]["mode"], "micro");
    assert_eq!(micro.snapshot["state"]["selected_layer_id"], "cathode");

    let waited = &log.steps[3];
    assert!(!waited.changed);
    assert!(waited.snapshot["frame"].as_u64().unwrap_or(0) >= 10);

    let navigated = &log.steps[4];
    assert!(navigated.changed);
    assert_eq!(navigated.snapshot["state"]["mode"], "intro");

    assert!(log.steps[5..].iter().all(|step| step.action.is_none()));
    assert_eq!(log.final_snapshot["state"]["mode"], "intro");
    assert!(log.final_snapshot["state"]["selected_layer_id"].is_null());
    Ok(())
}

#[test]
fn illegal_actions_are_logged_as_unchanged() -> Result<()> {
    let dir = tempdir()?;
    let script = dir.path().join("actions.json");
    fs::write(
        &script,
        r#"[
            {"action": "toggle_micro"},
            {"action": "close_micro"},
            {"action": "select_layer", "id": "separator"},
            {"action": "toggle_micro"}
        ]"#,
    )?;
    let log_path = dir.path().join("state_log.json");

    let output = run_viewer(&[
        "--headless",
        "--actions",
        path_arg(&script)?,
        "--state-log-json",
        path_arg(&log_path)?,
    ])?;
    assert!(output.status.success(), "cell_viewer exited with {output:?}");

    let log: ReplayLog = serde_json::from_str(&fs::read_to_string(&log_path)?)?;
    let changed: Vec<bool> = log.steps.iter().map(|step| step.changed).collect();
    assert_eq!(changed, [false, false, true, false]);
    assert_eq!(log.final_snapshot["state"]["mode"], "exploded");
    assert_eq!(log.final_snapshot["state"]["selected_layer_id"], "separator");
    Ok(())
}

#[test]
fn dashboard_dump_writes_png() -> Result<()> {
    let dir = tempdir()?;
    let png_path = dir.path().join("dashboard.png");

    let output = run_viewer(&["--headless", "--dump-dashboard", path_arg(&png_path)?])?;
    assert!(output.status.success(), "cell_viewer exited with {output:?}");

    let bytes = fs::read(&png_path).with_context(|| format!("reading {}", png_path.display()))?;
    assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n']));
    Ok(())
}

#[test]
fn malformed_layer_stack_is_rejected() -> Result<()> {
    let dir = tempdir()?;
    let layers = dir.path().join("layers.json");
    fs::write(&layers, r#"{"layers": "not a list"}"#)?;

    let output = run_viewer(&["--headless", "--layers", path_arg(&layers)?])?;
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("loading layer stack"), "stderr: {stderr}");
    Ok(())
}
