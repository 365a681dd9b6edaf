use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{bail, Context, Result};

static STAGING_SEQUENCE: AtomicU64 = AtomicU64::new(0);

fn staging_path(parent: &Path, file_name: &str) -> PathBuf {
    let sequence = STAGING_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    parent.join(format!(
        ".{file_name}.{}.{sequence}.partial",
        std::process::id()
    ))
}

/// Replaces `path` with `content` through a sibling staging file and a rename.
///
/// Missing parent directories are created. A failed rename removes the
/// staging file and leaves any previous content in place.
pub fn write_text_atomic(path: &Path, content: &str) -> Result<()> {
    let Some(file_name) = path.file_name() else {
        bail!("destination '{}' does not name a file", path.display());
    };
    if path.is_dir() {
        bail!("destination path '{}' is a directory", path.display());
    }

    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create directory {}", parent.display()))?;

    let staging = staging_path(parent, &file_name.to_string_lossy());
    fs::write(&staging, content)
        .with_context(|| format!("failed to stage {}", staging.display()))?;
    if let Err(error) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(error)
            .with_context(|| format!("failed to move staged file into {}", path.display()));
    }
    Ok(())
}
