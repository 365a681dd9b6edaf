//! Locates the local daemon CLI before anything is spawned.

use std::ffi::OsStr;
use std::fs::Metadata;
use std::path::{Path, PathBuf};

#[cfg(unix)]
fn has_execute_bits(metadata: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;

    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn has_execute_bits(_metadata: &Metadata) -> bool {
    true
}

fn executable_file(path: PathBuf) -> Option<PathBuf> {
    let metadata = std::fs::metadata(&path).ok()?;
    (metadata.is_file() && has_execute_bits(&metadata)).then_some(path)
}

fn search_path_dir(dir: &Path, name: &str) -> Option<PathBuf> {
    let direct = executable_file(dir.join(name));
    if cfg!(windows) {
        direct.or_else(|| executable_file(dir.join(format!("{name}.exe"))))
    } else {
        direct
    }
}

/// Resolves `executable` to a runnable file.
///
/// Values containing a path separator are checked as given; bare names are
/// looked up on `PATH`.
pub fn resolve_executable(executable: &str) -> Option<PathBuf> {
    resolve_executable_in(executable, std::env::var_os("PATH").as_deref())
}

/// Same as [`resolve_executable`], searching `search_path` instead of `PATH`.
pub fn resolve_executable_in(executable: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
    let name = executable.trim();
    if name.is_empty() {
        return None;
    }
    let candidate = Path::new(name);
    if candidate.is_absolute() || name.contains(std::path::MAIN_SEPARATOR) {
        return executable_file(candidate.to_path_buf());
    }
    std::env::split_paths(search_path?).find_map(|dir| search_path_dir(&dir, name))
}
