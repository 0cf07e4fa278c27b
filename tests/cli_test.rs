use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use assert_fs::prelude::*;
use predicates::prelude::*;

/// Run keyleash isolated from the user's own config.
fn keyleash(dir: &assert_fs::TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("keyleash");
    cmd.env("XDG_CONFIG_HOME", dir.path())
        .env("HOME", dir.path())
        .env_remove("KEYLEASH_SOCKET")
        .env_remove("RUST_LOG");
    cmd
}

fn hooks_file(dir: &assert_fs::TempDir) -> assert_fs::fixture::ChildPath {
    let file = dir.child("hooks.json");
    file.write_str(
        r#"[
            {"event": "sign", "command": "sh", "args": ["-c", "exit 0"]},
            {"event": "added", "command": "sh", "args": ["-c", "exit 2"], "allow_exit_code": 3},
            {"event": "removed", "command": "echo", "message": "key {subject} removed"}
        ]"#,
    )
    .unwrap();
    file
}

#[test]
fn help_lists_commands() {
    let dir = assert_fs::TempDir::new().unwrap();
    keyleash(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("hooks"));
}

#[test]
fn hooks_list_shows_each_hook() {
    let dir = assert_fs::TempDir::new().unwrap();
    let file = hooks_file(&dir);

    keyleash(&dir)
        .args(["hooks", "--hooks"])
        .arg(file.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("sign"))
        .stdout(predicate::str::contains("exit 3 allowed"))
        .stdout(predicate::str::contains("key <subject> removed"));
}

#[test]
fn hooks_list_without_file_warns() {
    let dir = assert_fs::TempDir::new().unwrap();
    keyleash(&dir)
        .args(["hooks", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No hooks file configured"));
}

#[test]
fn hooks_file_from_config() {
    let dir = assert_fs::TempDir::new().unwrap();
    let file = hooks_file(&dir);
    let config = dir.child("config.toml");
    config
        .write_str(&format!("[hooks]\nfile = {:?}\n", file.path()))
        .unwrap();

    keyleash(&dir)
        .arg("--config")
        .arg(config.path())
        .args(["hooks", "run", "sign", "SHA256:abc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("passed"));
}

#[test]
fn failing_hook_exits_with_error() {
    let dir = assert_fs::TempDir::new().unwrap();
    let file = hooks_file(&dir);

    keyleash(&dir)
        .args(["hooks", "--hooks"])
        .arg(file.path())
        .args(["run", "added", "SHA256:abc"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("reported failure"));
}

#[test]
fn unknown_event_is_rejected_by_parser() {
    let dir = assert_fs::TempDir::new().unwrap();
    let file = hooks_file(&dir);

    keyleash(&dir)
        .args(["hooks", "--hooks"])
        .arg(file.path())
        .args(["run", "deleted", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown hook event"));
}

#[test]
fn malformed_hooks_file_is_reported() {
    let dir = assert_fs::TempDir::new().unwrap();
    let file = dir.child("hooks.json");
    file.write_str("{ nope").unwrap();

    keyleash(&dir)
        .args(["hooks", "--hooks"])
        .arg(file.path())
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Hook error"));
}

#[test]
fn missing_explicit_config_fails() {
    let dir = assert_fs::TempDir::new().unwrap();
    keyleash(&dir)
        .args(["--config", "/nonexistent/keyleash.toml", "hooks", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn serve_refuses_existing_socket_path() {
    let dir = assert_fs::TempDir::new().unwrap();
    let taken = dir.child("taken.sock");
    taken.write_str("").unwrap();

    keyleash(&dir)
        .arg("--socket")
        .arg(taken.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    taken.assert(predicate::path::exists());
}
