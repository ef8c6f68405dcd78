use std::path::{Path, PathBuf};

/// Path relative to `base` when one exists, for terminal output.
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

/// Path relative to the current directory.
pub fn display_path(path: &Path) -> String {
    match std::env::current_dir() {
        Ok(cwd) if path.is_absolute() => relative_to(path, &cwd).display().to_string(),
        _ => path.display().to_string(),
    }
}
