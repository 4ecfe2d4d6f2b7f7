//! Resolution of logical data paths against candidate roots.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{DataError, Result};

/// Find the first existing location of `logical`.
///
/// The path itself is tried first (absolute, or relative to the working
/// directory), then each root joined with it, in order.
pub fn resolve<P: AsRef<Path>>(logical: P, roots: &[PathBuf]) -> Result<PathBuf> {
    let logical = logical.as_ref();
    if logical.exists() {
        return Ok(logical.to_path_buf());
    }

    let mut searched = vec![logical.to_path_buf()];
    for root in roots {
        let candidate = root.join(logical);
        if candidate.exists() {
            debug!(path = %logical.display(), resolved = %candidate.display(), "Resolved data path");
            return Ok(candidate);
        }
        searched.push(candidate);
    }

    Err(DataError::NotFound {
        path: logical.to_path_buf(),
        searched,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_root_with_file_wins() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        std::fs::write(b.path().join("x"), b"").unwrap();

        let roots = vec![a.path().to_path_buf(), b.path().to_path_buf()];
        assert_eq!(resolve("x", &roots).unwrap(), b.path().join("x"));

        std::fs::write(a.path().join("x"), b"").unwrap();
        assert_eq!(resolve("x", &roots).unwrap(), a.path().join("x"));
    }

    #[test]
    fn test_missing_everywhere_fails() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        let roots = vec![a.path().to_path_buf(), b.path().to_path_buf()];

        match resolve("x", &roots) {
            Err(DataError::NotFound { searched, .. }) => {
                assert_eq!(searched.len(), 3);
                assert_eq!(searched[2], b.path().join("x"));
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_absolute_path_is_used_directly() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("sst.nc");
        std::fs::write(&file, b"").unwrap();
        assert_eq!(resolve(&file, &[]).unwrap(), file);
    }

    #[test]
    fn test_directories_resolve() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("run01")).unwrap();
        let roots = vec![root.path().to_path_buf()];
        assert_eq!(resolve("run01", &roots).unwrap(), root.path().join("run01"));
    }
}
