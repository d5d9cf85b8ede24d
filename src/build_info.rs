/// Build-time git commit SHA stamped by build.rs when available.
pub fn git_sha() -> Option<&'static str> {
    option_env!("TASKLIST_BUILD_GIT_SHA")
}

/// Crate version from the manifest.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
