use drift_assets::{RawDataRepresentation, ResourcePath};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

const STAGING_DIR: &str = ".staging";

static STAGE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Write-through cache of raw fetched bytes, one file per path and representation
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_path(
        &self,
        path: &ResourcePath,
        representation: &RawDataRepresentation,
    ) -> PathBuf {
        self.dir.join(path.cache_file_name(representation.extension()))
    }

    /// Cached bytes of `path` in `representation`, `None` on a miss
    pub async fn read(
        &self,
        path: &ResourcePath,
        representation: &RawDataRepresentation,
    ) -> std::io::Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.file_path(path, representation)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// First cached representation of `path` among `candidates`, in order
    pub async fn lookup<'r>(
        &self,
        path: &ResourcePath,
        candidates: &'r [RawDataRepresentation],
    ) -> std::io::Result<Option<(&'r RawDataRepresentation, Vec<u8>)>> {
        for representation in candidates {
            if let Some(bytes) = self.read(path, representation).await? {
                return Ok(Some((representation, bytes)));
            }
        }
        Ok(None)
    }

    pub async fn contains(
        &self,
        path: &ResourcePath,
        representation: &RawDataRepresentation,
    ) -> bool {
        tokio::fs::try_exists(self.file_path(path, representation))
            .await
            .unwrap_or(false)
    }

    /// Writes `bytes` to a temporary file; nothing is visible in the cache until
    /// [`StagedWrite::commit`]
    ///
    /// The write runs on the blocking pool and owns its [`StagedWrite`] there, so dropping this
    /// future mid-write still removes the temporary file once the write is done.
    pub async fn stage(
        &self,
        path: &ResourcePath,
        representation: &RawDataRepresentation,
        bytes: &[u8],
    ) -> std::io::Result<StagedWrite> {
        let staging = self.dir.join(STAGING_DIR);
        let target = self.file_path(path, representation);
        let temp = staging.join(format!(
            "{}.{}.{}",
            path.cache_file_name(representation.extension()),
            std::process::id(),
            STAGE_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        let bytes = bytes.to_vec();
        tokio::task::spawn_blocking(move || -> std::io::Result<StagedWrite> {
            std::fs::create_dir_all(&staging)?;
            let staged = StagedWrite {
                temp,
                target,
                committed: false,
            };
            std::fs::write(&staged.temp, bytes)?;
            Ok(staged)
        })
        .await
        .map_err(std::io::Error::other)?
    }

    pub async fn write(
        &self,
        path: &ResourcePath,
        representation: &RawDataRepresentation,
        bytes: &[u8],
    ) -> std::io::Result<()> {
        self.stage(path, representation, bytes).await?.commit()
    }

    pub async fn remove(
        &self,
        path: &ResourcePath,
        representation: &RawDataRepresentation,
    ) -> std::io::Result<bool> {
        match tokio::fs::remove_file(self.file_path(path, representation)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Every cached path with the extension it was stored under
    pub async fn entries(&self) -> std::io::Result<Vec<(ResourcePath, String)>> {
        let mut read_dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let parsed = entry
                .file_name()
                .to_str()
                .and_then(ResourcePath::from_cache_file_name);
            if let Some(parsed) = parsed {
                entries.push(parsed);
            }
        }
        entries.sort();
        Ok(entries)
    }
}

/// Bytes written next to the cache but not yet part of it. Dropped uncommitted, the temporary
/// file is removed.
#[derive(Debug)]
pub struct StagedWrite {
    temp: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedWrite {
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Moves the bytes into place
    pub fn commit(mut self) -> std::io::Result<()> {
        std::fs::rename(&self.temp, &self.target)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedWrite {
    fn drop(&mut self) {
        if !self.committed {
            if let Err(e) = std::fs::remove_file(&self.temp) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to remove staged cache file {:?}: {e}", self.temp);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    const TXT: RawDataRepresentation = RawDataRepresentation::from_static("txt", "text/plain");
    const JSON: RawDataRepresentation =
        RawDataRepresentation::from_static("json", "application/json");

    fn path(path: &str) -> ResourcePath {
        ResourcePath::parse(path).unwrap()
    }

    #[tokio::test]
    async fn test_write_then_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path());
        let readme = path("ui/readme");

        assert!(cache.lookup(&readme, &[TXT, JSON]).await.unwrap().is_none());
        cache.write(&readme, &JSON, b"{}").await.unwrap();

        let candidates = [TXT, JSON];
        let (representation, bytes) = cache
            .lookup(&readme, &candidates)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(representation, &JSON);
        assert_eq!(bytes, b"{}");
        assert!(dir.path().join("ui~readme~~json").is_file());
        assert!(cache.contains(&readme, &JSON).await);
        assert!(!cache.contains(&readme, &TXT).await);
    }

    #[tokio::test]
    async fn test_dropped_stage_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path());
        let readme = path("ui/readme");

        let staged = cache.stage(&readme, &TXT, b"hello").await.unwrap();
        assert!(!cache.contains(&readme, &TXT).await);
        drop(staged);

        assert!(cache.entries().await.unwrap().is_empty());
        let staging = std::fs::read_dir(dir.path().join(STAGING_DIR)).unwrap();
        assert_eq!(staging.count(), 0);
    }

    #[tokio::test]
    async fn test_abandoned_stage_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path());
        let readme = path("ui/readme");
        let bytes = vec![7u8; 4 << 20];

        // polled once, then dropped while the write may still be running
        let _ = cache.stage(&readme, &TXT, &bytes).now_or_never();

        let staging = dir.path().join(STAGING_DIR);
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        let mut left = usize::MAX;
        for _ in 0..100 {
            left = std::fs::read_dir(&staging).map(|dir| dir.count()).unwrap_or(0);
            if left == 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert_eq!(left, 0);
        assert!(!cache.contains(&readme, &TXT).await);
    }

    #[tokio::test]
    async fn test_entries_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path());
        cache.write(&path("ui/b"), &TXT, b"b").await.unwrap();
        cache.write(&path("ui/a"), &JSON, b"a").await.unwrap();

        assert_eq!(
            cache.entries().await.unwrap(),
            vec![
                (path("ui/a"), "json".to_string()),
                (path("ui/b"), "txt".to_string()),
            ]
        );
        assert!(cache.remove(&path("ui/a"), &JSON).await.unwrap());
        assert!(!cache.remove(&path("ui/a"), &JSON).await.unwrap());
        assert_eq!(cache.entries().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_dir_has_no_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path().join("absent"));
        assert!(cache.entries().await.unwrap().is_empty());
    }
}
