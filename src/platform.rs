// src/platform.rs - Host platform identification and executable lookup
use std::env;
use std::path::{Path, PathBuf};

/// Platform family the dispatcher selects a strategy table for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
    MacOs,
    Unknown,
}

impl Platform {
    /// Identify the platform the process is running on.
    pub fn current() -> Self {
        Self::from_os(env::consts::OS)
    }

    /// Map an OS identifier (as in `std::env::consts::OS`) to a platform family.
    pub fn from_os(os: &str) -> Self {
        match os {
            "windows" => Platform::Windows,
            "linux" => Platform::Linux,
            "macos" => Platform::MacOs,
            _ => Platform::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Linux => "linux",
            Platform::MacOs => "macos",
            Platform::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Resolve a tool name through the PATH environment variable.
///
/// Returns the first directory entry that is a regular file. On Windows the
/// `.exe` suffix is probed as well, since PATHEXT resolution is a shell concern.
pub fn find_in_path(tool: &str) -> Option<PathBuf> {
    let path_var = env::var_os("PATH")?;
    for dir in env::split_paths(&path_var) {
        let full = dir.join(tool);
        if full.is_file() {
            return Some(full);
        }
        #[cfg(windows)]
        {
            let exe = dir.join(format!("{tool}.exe"));
            if exe.is_file() {
                return Some(exe);
            }
        }
    }
    None
}

/// File name component of a path, lossily converted for display.
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_os_identifiers_map_to_families() {
        assert_eq!(Platform::from_os("windows"), Platform::Windows);
        assert_eq!(Platform::from_os("linux"), Platform::Linux);
        assert_eq!(Platform::from_os("macos"), Platform::MacOs);
        assert_eq!(Platform::from_os("freebsd"), Platform::Unknown);
        assert_eq!(Platform::from_os(""), Platform::Unknown);
    }

    #[test]
    fn current_platform_is_not_unknown_on_supported_hosts() {
        if matches!(env::consts::OS, "windows" | "linux" | "macos") {
            assert_ne!(Platform::current(), Platform::Unknown);
        }
    }

    #[cfg(unix)]
    #[test]
    fn find_in_path_locates_a_shell() {
        assert!(find_in_path("sh").is_some());
    }

    #[test]
    fn find_in_path_misses_nonexistent_tool() {
        assert!(find_in_path("definitely-not-a-real-tool-7f3a").is_none());
    }

    #[test]
    fn file_name_of_returns_final_component() {
        assert_eq!(file_name_of(Path::new("/tmp/docs/report.pdf")), "report.pdf");
    }
}
