//! Stamps `SESSIONGATE_VERSION` as `<crate version> (<commit>)` when built
//! from a git checkout, or the plain crate version otherwise.

use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=../../.git/HEAD");
    println!("cargo:rerun-if-changed=../../.git/index");

    let version = env!("CARGO_PKG_VERSION");
    let stamped = match commit() {
        Some(commit) => format!("{version} ({commit})"),
        None => version.to_string(),
    };

    println!("cargo:rustc-env=SESSIONGATE_VERSION={stamped}");
}

fn commit() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=10", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())?;

    let hash = String::from_utf8(output.stdout).ok()?.trim().to_string();
    (!hash.is_empty()).then_some(hash)
}
