// Search paths for the collision table files
use crate::error::{DepositionError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Extension of the tabulated data files
pub const DATA_SUFFIX: &str = "TAB";
/// Directory below each XDG data dir that holds the tables
pub const DATA_SUBDIR: &str = "bichsel-deposition/data";

/// Ordered list of locations searched for the table files.
///
/// Entries may be files or directories. Configured paths come first, followed
/// by `$BICHSEL_DATA_DIR` and the `bichsel-deposition/data` directory inside
/// each `$XDG_DATA_DIRS` entry (defaulting to `/usr/local/share/:/usr/share/`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataPaths {
    pub paths: Vec<PathBuf>,
}

impl DataPaths {
    /// Only the given paths, without environment fallbacks
    pub fn new(paths: Vec<PathBuf>) -> Self {
        DataPaths { paths }
    }

    /// Configured paths followed by the environment defaults
    pub fn with_defaults(configured: &[PathBuf]) -> Self {
        let mut paths = configured.to_vec();
        if let Some(dir) = env::var_os("BICHSEL_DATA_DIR") {
            paths.push(PathBuf::from(dir));
        }
        let xdg = env::var("XDG_DATA_DIRS")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "/usr/local/share/:/usr/share/".to_string());
        for dir in xdg.split(':').filter(|d| !d.is_empty()) {
            paths.push(Path::new(dir).join(DATA_SUBDIR));
        }
        DataPaths { paths }
    }

    /// Locate the table file called `name` (e.g. `HEPS`)
    pub fn locate(&self, name: &str) -> Result<PathBuf> {
        for path in &self.paths {
            if path.is_file() {
                if matches_table(path, name) {
                    return Ok(path.clone());
                }
            } else if path.is_dir() {
                if let Some(found) = find_in_dir(path, name) {
                    return Ok(found);
                }
            }
        }
        Err(DepositionError::DataFileNotFound {
            name: format!("{}.{}", name, DATA_SUFFIX),
            searched: self.paths.clone(),
        })
    }
}

fn matches_table(path: &Path, name: &str) -> bool {
    let stem_ok = path.file_stem().map_or(false, |s| s == name);
    let ext_ok = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case(DATA_SUFFIX));
    stem_ok && ext_ok
}

fn find_in_dir(dir: &Path, name: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && matches_table(p, name))
        .collect();
    // read_dir order is platform dependent
    candidates.sort();
    candidates.into_iter().next()
}
