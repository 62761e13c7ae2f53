//! Local filesystem primitives
//!
//! Reference implementations of the two local bridge primitives, for hosts
//! that run in-process with this crate.

use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use super::error::TransferError;
use super::types::RecursiveListingEntry;

/// List every file and directory below `root` (root itself excluded).
///
/// Entries come in pre-order, so a directory always precedes its contents.
pub async fn list_local_files_recursive(
    root: &str,
) -> Result<Vec<RecursiveListingEntry>, TransferError> {
    let root = root.to_string();
    tokio::task::spawn_blocking(move || walk(Path::new(&root)))
        .await
        .map_err(|e| TransferError::Listing(format!("Listing task failed: {}", e)))?
}

fn walk(root: &Path) -> Result<Vec<RecursiveListingEntry>, TransferError> {
    if !root.is_dir() {
        return Err(TransferError::Listing(format!(
            "Not a directory: {}",
            root.display()
        )));
    }

    let mut entries = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| TransferError::Listing(e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| TransferError::Listing(e.to_string()))?;
        let relative_path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let is_dir = entry.file_type().is_dir();
        let size = if is_dir {
            None
        } else {
            entry.metadata().ok().map(|m| m.len())
        };

        entries.push(RecursiveListingEntry {
            relative_path,
            is_dir,
            size,
        });
    }

    debug!("Listed {} entries under {}", entries.len(), root.display());
    Ok(entries)
}

/// Create a local directory and any missing parents
pub async fn create_local_dir(path: &str) -> Result<(), TransferError> {
    tokio::fs::create_dir_all(path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_list_recursive_preorder() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        std::fs::create_dir_all(root.join("a/b")).unwrap();
        std::fs::write(root.join("a/b/deep.txt"), b"12345").unwrap();
        std::fs::write(root.join("top.txt"), b"xy").unwrap();

        let entries = list_local_files_recursive(&root.to_string_lossy())
            .await
            .unwrap();
        let paths: Vec<_> = entries.iter().map(|e| e.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["a", "a/b", "a/b/deep.txt", "top.txt"]);

        assert!(entries[0].is_dir);
        assert_eq!(entries[0].size, None);
        assert_eq!(entries[2].size, Some(5));
        assert_eq!(entries[3].size, Some(2));
    }

    #[tokio::test]
    async fn test_list_missing_root_fails() {
        let temp = tempdir().unwrap();
        let missing = temp.path().join("nope");
        let result = list_local_files_recursive(&missing.to_string_lossy()).await;
        assert!(matches!(result, Err(TransferError::Listing(_))));
    }

    #[tokio::test]
    async fn test_create_local_dir_is_idempotent() {
        let temp = tempdir().unwrap();
        let target = temp.path().join("x/y");
        let target = target.to_string_lossy();
        create_local_dir(&target).await.unwrap();
        create_local_dir(&target).await.unwrap();
        assert!(std::path::Path::new(target.as_ref()).is_dir());
    }
}
