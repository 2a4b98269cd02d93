//! Entry-path sanitization shared by all format extractors.

use std::path::{Component, Path, PathBuf};

/// Sanitize an archive entry path to prevent path traversal
/// (e.g., `../../../etc/passwd`).
///
/// Removes parent references (`..`), current-dir references (`.`), absolute
/// prefixes (`/`), and drive letters (`C:\`). Returns `None` if nothing
/// remains after sanitization.
#[inline]
#[must_use = "returns the sanitized entry path"]
pub fn sanitize_entry_path(path: &Path) -> Option<PathBuf> {
    let mut sanitized = PathBuf::new();

    for component in path.components() {
        if let Component::Normal(part) = component {
            sanitized.push(part);
        }
    }

    if sanitized.as_os_str().is_empty() {
        None
    } else {
        Some(sanitized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_paths_unchanged() {
        assert_eq!(
            sanitize_entry_path(Path::new("logs/combo.txt")),
            Some(PathBuf::from("logs/combo.txt"))
        );
    }

    #[test]
    fn test_traversal_stripped() {
        assert_eq!(
            sanitize_entry_path(Path::new("../../etc/passwd")),
            Some(PathBuf::from("etc/passwd"))
        );
        assert_eq!(
            sanitize_entry_path(Path::new("/absolute/file.txt")),
            Some(PathBuf::from("absolute/file.txt"))
        );
    }

    #[test]
    fn test_fully_invalid_paths_rejected() {
        assert_eq!(sanitize_entry_path(Path::new("..")), None);
        assert_eq!(sanitize_entry_path(Path::new("")), None);
        assert_eq!(sanitize_entry_path(Path::new("./..")), None);
    }
}
