use chessbench::bench::message::{MessageKind, ProgressMessage};
use std::process::Command;

const BIN: &str = env!("CARGO_BIN_EXE_chessbench");

#[test]
fn test_worker_subcommand_reports_moves() {
    let output = Command::new(BIN)
        .args([
            "worker", "--player", "2", "--moves", "3", "--interval-ms", "0",
            "--buffer-size", "100", "--scale", "2", "--seed", "9",
        ])
        .output()
        .expect("worker should run");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let messages: Vec<ProgressMessage> = stdout
        .lines()
        .map(|l| ProgressMessage::from_line(l).unwrap())
        .collect();

    assert_eq!(messages.len(), 4);
    for (i, message) in messages[..3].iter().enumerate() {
        assert_eq!(message.worker_id, 2);
        assert_eq!(message.kind, MessageKind::Move);
        assert_eq!(message.sequence, i as u32 + 1);
    }
    assert!(messages[3].is_done());
}

#[test]
fn test_malformed_moves_exit_with_message() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("chessbench.toml");

    let output = Command::new(BIN)
        .args(["run", "--moves", "abc", "--interval-ms", "100"])
        .arg("--config")
        .arg(&config)
        .output()
        .expect("binary should run");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("enter valid numbers"));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_json_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("chessbench.toml");

    let output = Command::new(BIN)
        .args(["run", "--moves", "1", "--interval-ms", "0", "--buffer-size", "500", "--seed", "4", "--json"])
        .arg("--config")
        .arg(&config)
        .output()
        .expect("binary should run");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    // progress lines precede the report
    let start = stdout.find("{\n").expect("report in output");
    let report: serde_json::Value = serde_json::from_str(&stdout[start..]).unwrap();
    assert!(report["comparison"]["faster"].is_string());
}
