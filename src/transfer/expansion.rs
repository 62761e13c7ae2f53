//! Recursive folder expansion (desktop)
//!
//! A selected folder becomes one queued item per file below it. The
//! destination tree is created first, parents before children, so no file
//! transfer ever targets a directory that does not exist yet.

use tracing::debug;

use super::bridge::NativeBridge;
use super::error::TransferError;
use super::path_utils::{join_local_relative, join_remote_path};
use super::types::{RecursiveListingEntry, TransferDirection, TransferItem};

/// Expand a local folder into upload items.
///
/// `local_root` is the folder on disk, `remote_root` the remote folder it
/// maps to (created if missing).
pub async fn expand_upload(
    bridge: &dyn NativeBridge,
    local_root: &str,
    remote_root: &str,
) -> Result<Vec<TransferItem>, TransferError> {
    let entries = bridge.list_local_files_recursive(local_root).await?;

    if let Err(e) = bridge.create_dir(remote_root).await {
        debug!("create_dir {} failed (may exist): {}", remote_root, e);
    }
    for dir in entries.iter().filter(|entry| entry.is_dir) {
        let path = join_remote_path(remote_root, &dir.relative_path);
        if let Err(e) = bridge.create_dir(&path).await {
            debug!("create_dir {} failed (may exist): {}", path, e);
        }
    }

    Ok(file_items(&entries, TransferDirection::Upload, |relative| {
        (
            join_local_relative(local_root, relative),
            join_remote_path(remote_root, relative),
        )
    }))
}

/// Expand a remote folder into download items.
///
/// `remote_root` is the remote folder, `local_root` the local folder it maps
/// to (created if missing).
pub async fn expand_download(
    bridge: &dyn NativeBridge,
    remote_root: &str,
    local_root: &str,
) -> Result<Vec<TransferItem>, TransferError> {
    let entries = bridge.list_remote_files_recursive(remote_root).await?;

    if let Err(e) = bridge.create_local_dir(local_root).await {
        debug!("create_local_dir {} failed (may exist): {}", local_root, e);
    }
    for dir in entries.iter().filter(|entry| entry.is_dir) {
        let path = join_local_relative(local_root, &dir.relative_path);
        if let Err(e) = bridge.create_local_dir(&path).await {
            debug!("create_local_dir {} failed (may exist): {}", path, e);
        }
    }

    Ok(file_items(&entries, TransferDirection::Download, |relative| {
        (
            join_local_relative(local_root, relative),
            join_remote_path(remote_root, relative),
        )
    }))
}

/// One queued item per file entry; `paths` maps a relative path to
/// `(local, remote)`.
fn file_items(
    entries: &[RecursiveListingEntry],
    direction: TransferDirection,
    paths: impl Fn(&str) -> (String, String),
) -> Vec<TransferItem> {
    entries
        .iter()
        .filter(|entry| !entry.is_dir)
        .map(|entry| {
            let (local, remote) = paths(&entry.relative_path);
            TransferItem::new(direction, entry.file_name(), local, remote, entry.size)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        ListLocal(String),
        ListRemote(String),
        CreateDir(String),
        CreateLocalDir(String),
    }

    struct RecordingBridge {
        listing: Vec<RecursiveListingEntry>,
        fail_listing: bool,
        calls: Mutex<Vec<Call>>,
    }

    impl RecordingBridge {
        fn new(listing: Vec<RecursiveListingEntry>) -> Self {
            Self {
                listing,
                fail_listing: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn listing(&self) -> Result<Vec<RecursiveListingEntry>, TransferError> {
            if self.fail_listing {
                Err(TransferError::Listing("permission denied".into()))
            } else {
                Ok(self.listing.clone())
            }
        }
    }

    #[async_trait]
    impl NativeBridge for RecordingBridge {
        async fn upload_file(&self, _: &str, _: &str, _: &str) -> Result<(), TransferError> {
            Ok(())
        }

        async fn download_file(&self, _: &str, _: &str, _: &str) -> Result<(), TransferError> {
            Ok(())
        }

        async fn list_local_files_recursive(
            &self,
            root: &str,
        ) -> Result<Vec<RecursiveListingEntry>, TransferError> {
            self.calls.lock().push(Call::ListLocal(root.into()));
            self.listing()
        }

        async fn list_remote_files_recursive(
            &self,
            path: &str,
        ) -> Result<Vec<RecursiveListingEntry>, TransferError> {
            self.calls.lock().push(Call::ListRemote(path.into()));
            self.listing()
        }

        async fn create_dir(&self, path: &str) -> Result<(), TransferError> {
            self.calls.lock().push(Call::CreateDir(path.into()));
            // Root already exists on the server
            if path == "/srv/site" {
                return Err(TransferError::Native("550 File exists".into()));
            }
            Ok(())
        }

        async fn create_local_dir(&self, path: &str) -> Result<(), TransferError> {
            self.calls.lock().push(Call::CreateLocalDir(path.into()));
            Ok(())
        }
    }

    fn dir(path: &str) -> RecursiveListingEntry {
        RecursiveListingEntry {
            relative_path: path.into(),
            is_dir: true,
            size: None,
        }
    }

    fn file(path: &str, size: u64) -> RecursiveListingEntry {
        RecursiveListingEntry {
            relative_path: path.into(),
            is_dir: false,
            size: Some(size),
        }
    }

    fn site_listing() -> Vec<RecursiveListingEntry> {
        vec![
            dir("css"),
            file("css/main.css", 120),
            dir("img"),
            file("img/logo.png", 2048),
            file("index.html", 512),
        ]
    }

    #[tokio::test]
    async fn test_upload_expansion_creates_dirs_first() {
        let bridge = RecordingBridge::new(site_listing());

        let items = expand_upload(&bridge, "/home/me/site", "/srv/site")
            .await
            .unwrap();

        assert_eq!(items.len(), 3);
        assert!(items
            .iter()
            .all(|i| i.direction == TransferDirection::Upload));
        let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["main.css", "logo.png", "index.html"]);
        assert_eq!(items[1].remote_path, "/srv/site/img/logo.png");
        assert_eq!(items[1].total, Some(2048));
        assert_eq!(
            items[1].local_path,
            join_local_relative("/home/me/site", "img/logo.png")
        );

        // Listing, root (whose failure is ignored), then each subfolder
        assert_eq!(
            *bridge.calls.lock(),
            vec![
                Call::ListLocal("/home/me/site".into()),
                Call::CreateDir("/srv/site".into()),
                Call::CreateDir("/srv/site/css".into()),
                Call::CreateDir("/srv/site/img".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_download_expansion() {
        let bridge = RecordingBridge::new(vec![dir("a"), dir("a/b"), file("a/b/c.txt", 3)]);

        let items = expand_download(&bridge, "/pub/data", "/tmp/data")
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "c.txt");
        assert_eq!(items[0].remote_path, "/pub/data/a/b/c.txt");
        assert_eq!(
            items[0].local_path,
            join_local_relative("/tmp/data", "a/b/c.txt")
        );

        assert_eq!(
            *bridge.calls.lock(),
            vec![
                Call::ListRemote("/pub/data".into()),
                Call::CreateLocalDir("/tmp/data".into()),
                Call::CreateLocalDir(join_local_relative("/tmp/data", "a")),
                Call::CreateLocalDir(join_local_relative("/tmp/data", "a/b")),
            ]
        );
    }

    #[tokio::test]
    async fn test_listing_failure_creates_nothing() {
        let mut bridge = RecordingBridge::new(site_listing());
        bridge.fail_listing = true;

        let result = expand_upload(&bridge, "/home/me/site", "/srv/site").await;

        assert!(matches!(result, Err(TransferError::Listing(_))));
        assert_eq!(
            *bridge.calls.lock(),
            vec![Call::ListLocal("/home/me/site".into())]
        );
    }
}
