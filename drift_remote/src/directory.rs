use crate::store::{EntryFilter, FOLDER_MIME_TYPE, RemoteEntry, RemoteId, RemoteStore, StoreError};
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};

/// Serves a local directory tree through the [`RemoteStore`] listing contract
///
/// Ids are `/` separated paths relative to the root directory, the root itself being
/// [`RemoteId::root`]. MIME types are guessed from file extensions.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

/// Extension to MIME type table used when listing files
const MIME_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("webp", "image/webp"),
    ("txt", "text/plain"),
    ("json", "application/json"),
    ("csv", "text/csv"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
    ("mp3", "audio/mpeg"),
];

pub fn guess_mime_type(name: &str) -> &'static str {
    Path::new(name)
        .extension()
        .and_then(|extension| extension.to_str())
        .and_then(|extension| {
            MIME_TYPES
                .iter()
                .find(|(known, _)| known.eq_ignore_ascii_case(extension))
        })
        .map(|(_, mime_type)| *mime_type)
        .unwrap_or("application/octet-stream")
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem location of `id`, rejecting ids escaping the root
    fn locate(&self, id: &RemoteId) -> Result<PathBuf, StoreError> {
        if id.is_root() {
            return Ok(self.root.clone());
        }
        let relative = Path::new(id.as_str());
        let escapes = relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)));
        if escapes {
            return Err(StoreError::UnknownId(id.clone()));
        }
        Ok(self.root.join(relative))
    }

    fn child_id(parent: &RemoteId, name: &str) -> RemoteId {
        if parent.is_root() {
            RemoteId::new(name)
        } else {
            RemoteId::new(format!("{}/{}", parent, name))
        }
    }

    async fn read(&self, id: &RemoteId) -> Result<Bytes, StoreError> {
        let path = self.locate(id)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Bytes::from(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::UnknownId(id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait::async_trait]
impl RemoteStore for DirectoryStore {
    async fn list_children(
        &self,
        parent: &RemoteId,
        name: Option<&str>,
        filter: EntryFilter<'_>,
    ) -> Result<Vec<RemoteEntry>, StoreError> {
        let directory = self.locate(parent)?;
        let mut read_dir = match tokio::fs::read_dir(&directory).await {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::UnknownId(parent.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            let Ok(file_name) = entry.file_name().into_string() else {
                continue;
            };
            if name.is_some_and(|name| name != file_name) {
                continue;
            }
            let mime_type = if entry.file_type().await?.is_dir() {
                FOLDER_MIME_TYPE
            } else {
                guess_mime_type(&file_name)
            };
            if mime_type != filter.mime_type() {
                continue;
            }
            entries.push(RemoteEntry {
                id: Self::child_id(parent, &file_name),
                name: file_name,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn download(&self, id: &RemoteId) -> Result<Bytes, StoreError> {
        self.read(id).await
    }

    /// A plain directory cannot convert content; only exporting to the file's own type works
    async fn export(&self, id: &RemoteId, target_mime: &str) -> Result<Bytes, StoreError> {
        if guess_mime_type(id.as_str()) != target_mime {
            return Err(StoreError::ExportUnsupported {
                id: id.clone(),
                mime_type: target_mime.to_string(),
            });
        }
        self.read(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, DirectoryStore) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("ui/icons")).unwrap();
        std::fs::write(dir.path().join("ui/icons/close.png"), b"png").unwrap();
        std::fs::write(dir.path().join("ui/icons/close.jpg"), b"jpg").unwrap();
        std::fs::write(dir.path().join("ui/readme.txt"), b"hello").unwrap();
        let store = DirectoryStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_guess_mime_type() {
        assert_eq!(guess_mime_type("a.PNG"), "image/png");
        assert_eq!(guess_mime_type("a.jpeg"), "image/jpeg");
        assert_eq!(guess_mime_type("a"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_list_children_filters() {
        let (_dir, store) = store();
        let folders = store
            .list_children(&RemoteId::root(), Some("ui"), EntryFilter::Folder)
            .await
            .unwrap();
        assert_eq!(
            folders,
            vec![RemoteEntry {
                id: RemoteId::new("ui"),
                name: "ui".to_string()
            }]
        );

        let icons = RemoteId::new("ui/icons");
        let pngs = store
            .list_children(&icons, None, EntryFilter::File { mime_type: "image/png" })
            .await
            .unwrap();
        assert_eq!(pngs.len(), 1);
        assert_eq!(pngs[0].id, RemoteId::new("ui/icons/close.png"));

        let none = store
            .list_children(&icons, Some("close.png"), EntryFilter::Folder)
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_download_and_export() {
        let (_dir, store) = store();
        let id = RemoteId::new("ui/readme.txt");
        assert_eq!(&store.download(&id).await.unwrap()[..], b"hello");
        assert_eq!(&store.export(&id, "text/plain").await.unwrap()[..], b"hello");
        assert!(matches!(
            store.export(&id, "application/pdf").await,
            Err(StoreError::ExportUnsupported { .. })
        ));
        assert!(matches!(
            store.download(&RemoteId::new("ui/missing.txt")).await,
            Err(StoreError::UnknownId(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_escaping_ids() {
        let (_dir, store) = store();
        assert!(matches!(
            store.download(&RemoteId::new("../secret")).await,
            Err(StoreError::UnknownId(_))
        ));
        assert!(matches!(
            store
                .list_children(&RemoteId::new("/etc"), None, EntryFilter::Folder)
                .await,
            Err(StoreError::UnknownId(_))
        ));
    }
}
