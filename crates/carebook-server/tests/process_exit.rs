use std::fs;
use std::process::Command;

fn write_config(dir: &std::path::Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("carebook.toml");
    fs::write(&path, body).expect("write toml");
    path
}

#[test]
fn invalid_configuration_exits_with_code_2() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "[logging]\nlevel = \"chatty\"\n");

    let output = Command::new(env!("CARGO_BIN_EXE_carebook-server"))
        .arg("--config")
        .arg(&config)
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .output()
        .expect("spawn carebook-server");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("logging.level"), "{stderr}");
}

#[test]
fn occupied_port_exits_with_code_2() {
    let dir = tempfile::tempdir().unwrap();
    let taken = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = taken.local_addr().unwrap().port();
    let config = write_config(
        dir.path(),
        &format!("[server]\nhost = \"127.0.0.1\"\nport = {port}\n\n[storage]\nbackend = \"memory\"\n"),
    );

    let output = Command::new(env!("CARGO_BIN_EXE_carebook-server"))
        .arg(format!("--config={}", config.display()))
        .current_dir(dir.path())
        .output()
        .expect("spawn carebook-server");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cannot listen on"), "{stderr}");
    drop(taken);
}

#[test]
fn missing_document_without_create_exits_with_code_2() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "[server]\nhost = \"127.0.0.1\"\nport = 1\n\n[storage]\npath = \"absent.json\"\n",
    );

    let output = Command::new(env!("CARGO_BIN_EXE_carebook-server"))
        .arg("--config")
        .arg(&config)
        .current_dir(dir.path())
        .output()
        .expect("spawn carebook-server");

    assert_eq!(output.status.code(), Some(2));
    assert!(!dir.path().join("absent.json").exists());
}
