use std::path::Path;
use std::process::{Command, Output};

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Run the binary with metrics disabled through a config file.
fn kachow(config_dir: &Path, args: &[&str]) -> Output {
    let config = config_dir.join("kachow.toml");
    std::fs::write(&config, "[metrics]\nprovider = \"none\"\n").unwrap();

    Command::new(env!("CARGO_BIN_EXE_kachow"))
        .arg("--config")
        .arg(&config)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn scan_prints_json_graph() {
    let repo = tempfile::tempdir().unwrap();
    write(repo.path(), "pkg/a.py", "");
    write(repo.path(), "pkg/b.py", "import a\n");
    let cfg = tempfile::tempdir().unwrap();

    let root = repo.path().to_str().unwrap();
    let output = kachow(cfg.path(), &["--format", "json", "scan", "--path", root, "--no-map"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["nodes"].as_array().unwrap().len(), 3);
    assert_eq!(value["edges"].as_array().unwrap().len(), 3);
    assert_eq!(value["healthScore"], 100.0);
    assert_eq!(value["verdict"], "success");
    assert!(!repo.path().join("_kachow_architecture_map.md").exists());
}

#[test]
fn scan_writes_architecture_map_by_default() {
    let repo = tempfile::tempdir().unwrap();
    write(repo.path(), "main.py", "import os\n");
    let cfg = tempfile::tempdir().unwrap();

    let root = repo.path().to_str().unwrap();
    let output = kachow(cfg.path(), &["scan", "--path", root]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("main.py"));
    let map = std::fs::read_to_string(repo.path().join("_kachow_architecture_map.md")).unwrap();
    assert!(map.contains("- `main.py` (Type: file)"));
}

#[test]
fn scan_of_missing_path_fails() {
    let cfg = tempfile::tempdir().unwrap();
    let missing = cfg.path().join("does-not-exist");

    let output = kachow(cfg.path(), &["scan", "--path", missing.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not exist"));
}

#[test]
fn show_prints_file_and_refuses_escapes() {
    let workspace = tempfile::tempdir().unwrap();
    let repo = workspace.path().join("repo");
    write(&repo, "app/main.py", "print('hi')\n");
    write(workspace.path(), "secret.txt", "token\n");
    let cfg = tempfile::tempdir().unwrap();
    let root = repo.to_str().unwrap();

    let output = kachow(cfg.path(), &["show", "app/main.py", "--path", root]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "print('hi')\n");

    let output = kachow(cfg.path(), &["show", "../secret.txt", "--path", root]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("resolves outside"));
}

#[test]
fn branches_fall_back_to_main_outside_git() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_str().unwrap();

    let output = kachow(dir.path(), &["--format", "json", "branches", "--path", root]);
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["branches"], serde_json::json!(["main"]));
    assert!(value["current"].is_null());
}

#[test]
fn history_outside_git_fails() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_str().unwrap();

    let output = kachow(dir.path(), &["history", "--path", root]);
    assert!(!output.status.success());
}
