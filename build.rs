use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn main() {
    for watched in [".git/HEAD", ".git/index", ".git/refs"] {
        println!("cargo:rerun-if-changed={watched}");
    }

    let Some(sha) = git(&["rev-parse", "--short=12", "HEAD"]) else {
        return;
    };
    // Uncommitted changes to tracked files mark the build dirty.
    let dirty = git(&["status", "--porcelain", "--untracked-files=no"]).is_some();
    let stamp = if dirty { format!("{sha}-dirty") } else { sha };
    println!("cargo:rustc-env=TASKLIST_BUILD_GIT_SHA={stamp}");
}
