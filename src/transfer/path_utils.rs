//! Path joining for transfer endpoints
//!
//! Local paths use the platform separator. Remote FTP/SFTP paths always use
//! `/`, whatever OS either side runs.

use std::path::PathBuf;

/// Pseudo-location shown before the user picks a local folder
pub const THIS_PC: &str = "this_pc";

/// Destination recorded for browser downloads, which land in memory
pub const BROWSER_DESTINATION: &str = "browser";

/// Join a remote base and a name.
///
/// An empty base yields the name; an absolute name replaces the base.
pub fn join_remote_path(base: &str, name: &str) -> String {
    if base.is_empty() || name.starts_with('/') {
        return name.to_string();
    }
    if base.ends_with('/') {
        format!("{}{}", base, name)
    } else {
        format!("{}/{}", base, name)
    }
}

/// Remote working directory, defaulting to `/`
pub fn remote_base(cwd: &str) -> &str {
    if cwd.is_empty() {
        "/"
    } else {
        cwd
    }
}

/// Join a local base and one component using the platform separator.
pub fn join_local_path(base: &str, component: &str) -> String {
    let mut path = PathBuf::from(base);
    path.push(component);
    path.to_string_lossy().to_string()
}

/// Join a local base and a slash-separated relative path segment by segment.
pub fn join_local_relative(base: &str, relative: &str) -> String {
    let mut path = PathBuf::from(base);
    for segment in relative.split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    path.to_string_lossy().to_string()
}

/// Whether a local folder has been chosen as download destination
pub fn is_local_destination(path: &str) -> bool {
    !path.is_empty() && path != THIS_PC
}
