//! Application paths

use std::path::PathBuf;

use directories::ProjectDirs;

const QUALIFIER: &str = "dev";
const ORGANIZATION: &str = "lazytree";
const APPLICATION: &str = "lazytree";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
}

/// Get the cache directory for regenerable data such as logs.
///
/// - Linux: `$XDG_CACHE_HOME/lazytree` or `~/.cache/lazytree`
/// - macOS: `~/Library/Caches/dev.lazytree.lazytree`
/// - Windows: `C:\Users\<User>\AppData\Local\lazytree\lazytree\cache`
pub fn cache_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Get the path of the log file, falling back to the working directory.
pub fn log_file() -> PathBuf {
    match cache_dir() {
        Some(dir) if std::fs::create_dir_all(&dir).is_ok() => dir.join("latest.log"),
        _ => PathBuf::from("lazytree.log"),
    }
}
