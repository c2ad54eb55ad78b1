#![allow(clippy::module_name_repetitions)]
//! Canonical file names inside an output directory.

use std::path::{Path, PathBuf};

/// Default output directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "data/outbreaks";

/// Day-level table.
#[must_use]
pub fn day_table_path(root: &Path) -> PathBuf {
    root.join("days.csv")
}

/// Per-year summary table.
#[must_use]
pub fn annual_summary_path(root: &Path) -> PathBuf {
    root.join("annual.csv")
}

/// Directory holding one profile per screened field.
#[must_use]
pub fn screens_dir(root: &Path) -> PathBuf {
    root.join("screens")
}

/// Profile of the screen against `column` (e.g. `cape_max`).
#[must_use]
pub fn screen_profile_path(root: &Path, column: &str) -> PathBuf {
    screens_dir(root).join(format!("{column}.csv"))
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_live_under_root() {
        let root = Path::new("/tmp/run");
        assert_eq!(day_table_path(root), PathBuf::from("/tmp/run/days.csv"));
        assert_eq!(
            screen_profile_path(root, "cape_max"),
            PathBuf::from("/tmp/run/screens/cape_max.csv")
        );
    }
}
