use std::process::Command;

fn git(args: &[&str]) -> Option<std::process::Output> {
    Command::new("git").args(args).output().ok()
}

fn main() {
    // Only HEAD movement changes the embedded revision.
    println!("cargo:rerun-if-changed=../../.git/HEAD");
    println!("cargo:rerun-if-changed=../../.git/refs");

    let sha = git(&["rev-parse", "--short=12", "HEAD"])
        .filter(|o| o.status.success())
        .map_or_else(
            || "unknown".to_string(),
            |o| String::from_utf8_lossy(&o.stdout).trim().to_string(),
        );

    // Outside a checkout there is nothing to compare against; report dirty.
    let dirty = git(&["status", "--porcelain", "--untracked-files=no"])
        .filter(|o| o.status.success())
        .map_or(true, |o| !o.stdout.is_empty());

    println!("cargo:rustc-env=MONITOR_GIT_SHA={sha}");
    println!("cargo:rustc-env=MONITOR_GIT_DIRTY={dirty}");
}
