use std::process::Command;

#[test]
fn init_creates_valid_toml() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_kachow"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "kachow init failed: {}", String::from_utf8_lossy(&output.stderr));

    let config_path = dir.path().join(".kachow.toml");
    assert!(config_path.exists(), ".kachow.toml should exist");

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[scan]"));
    assert!(content.contains("[metrics]"));
    assert!(content.contains("[history]"));

    // Everything is commented out, so it parses to the defaults
    let config = kachow_core::KachowConfig::from_toml(&content).unwrap();
    assert_eq!(config.history.max_commits, 10);
    assert!(config.scan.write_map);
}

#[test]
fn init_refuses_if_exists() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".kachow.toml"), "# existing").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_kachow"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    let content = std::fs::read_to_string(dir.path().join(".kachow.toml")).unwrap();
    assert_eq!(content, "# existing");
}
