use assert_cmd::cargo_bin;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_session_file_recovery() {
    let dir = tempdir().unwrap();
    let session = dir.path().join("session.json");

    // 1. First run: buy the base module
    let mut cmd1 = Command::new(cargo_bin!("agroportal"));
    cmd1.args(["purchase", "--instant", "--kind", "module", "--id", "shrimp"])
        .arg("--session")
        .arg(&session);

    let output1 = cmd1.output().expect("Failed to execute command");
    assert!(output1.status.success());

    // 2. Second run: the service gate sees the module bought in the first run
    let mut cmd2 = Command::new(cargo_bin!("agroportal"));
    cmd2.args(["purchase", "--instant", "--kind", "service", "--id", "genetics"])
        .arg("--session")
        .arg(&session);

    let output2 = cmd2.output().expect("Failed to execute command");
    assert!(output2.status.success());
    let owned: serde_json::Value = serde_json::from_slice(&output2.stdout).unwrap();
    assert_eq!(owned["ownedModules"], serde_json::json!(["shrimp"]));
    assert_eq!(owned["ownedServices"], serde_json::json!(["genetics"]));

    // 3. Another user of the same tenant starts from an empty ledger
    let mut cmd3 = Command::new(cargo_bin!("agroportal"));
    cmd3.args(["purchase", "--instant", "--kind", "service", "--id", "genetics"])
        .args(["--tenant", "other"])
        .arg("--session")
        .arg(&session);

    let output3 = cmd3.output().expect("Failed to execute command");
    assert!(!output3.status.success());
}

#[test]
fn test_failed_purchase_is_not_saved() {
    let dir = tempdir().unwrap();
    let session = dir.path().join("session.json");

    let mut cmd = Command::new(cargo_bin!("agroportal"));
    cmd.args(["purchase", "--instant", "--kind", "module", "--id", "salmon"])
        .args(["--fail-at", "purchase"])
        .arg("--session")
        .arg(&session);

    assert!(!cmd.output().unwrap().status.success());
    assert!(!session.exists());
}
