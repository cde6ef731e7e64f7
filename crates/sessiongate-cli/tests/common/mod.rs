#![allow(dead_code)]

use std::path::Path;
use std::process::{Command, Output};

/// Run the CLI binary against an isolated data directory and authority.
pub fn run_cli(args: &[&str], data_dir: &Path, base_url: &str) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_sessiongate"));
    cmd.args(args);
    cmd.env("SESSIONGATE_DATA_DIR", data_dir);
    cmd.env("SESSIONGATE_BASE_URL", base_url);
    cmd.env_remove("RUST_LOG");
    cmd.env("NO_COLOR", "1");
    cmd.output().expect("Failed to execute CLI")
}

/// Run the CLI and expect success.
pub fn run_cli_success(args: &[&str], data_dir: &Path, base_url: &str) -> String {
    let output = run_cli(args, data_dir, base_url);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Run the CLI off the async runtime so a mock server on it keeps serving.
pub async fn run_cli_async(args: &[&str], data_dir: &Path, base_url: &str) -> Output {
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    let data_dir = data_dir.to_path_buf();
    let base_url = base_url.to_string();

    tokio::task::spawn_blocking(move || {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        run_cli(&args, &data_dir, &base_url)
    })
    .await
    .expect("CLI task panicked")
}
