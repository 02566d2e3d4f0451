use std::env;
use std::process::Command;

/// Trimmed stdout of a command, if it ran and succeeded
fn command_output(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn set_env(key: &str, value: impl AsRef<str>) {
    println!("cargo:rustc-env={}={}", key, value.as_ref());
}

fn enabled_features() -> String {
    let mut features: Vec<String> = env::vars()
        .filter_map(|(key, _)| {
            key.strip_prefix("CARGO_FEATURE_")
                .map(|feature| feature.to_lowercase().replace('_', "-"))
        })
        .collect();
    if features.is_empty() {
        return "none".to_string();
    }
    features.sort();
    features.join(",")
}

/// CI ref first, then git, then the crate version
fn repository_version() -> String {
    env::var("CI_BUILD_REF")
        .ok()
        .filter(|reference| !reference.is_empty())
        .or_else(|| command_output("git", &["describe", "--always", "--dirty", "--long", "--tags"]))
        .or_else(|| command_output("git", &["rev-parse", "--short", "HEAD"]))
        .or_else(|| env::var("CARGO_PKG_VERSION").ok())
        .unwrap_or_else(|| "unknown".to_string())
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads");

    set_env(
        "BUILD_PROFILE",
        env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string()),
    );
    set_env("BUILD_FEATURES", enabled_features());
    set_env("REPO_VERSION", repository_version());
    set_env("BUILD_TIMESTAMP", chrono::Utc::now().to_rfc3339());
    set_env(
        "RUST_VERSION",
        command_output("rustc", &["--version"]).unwrap_or_else(|| "unknown".to_string()),
    );
    if let Ok(target) = env::var("TARGET") {
        set_env("BUILD_TARGET", target);
    }
}
