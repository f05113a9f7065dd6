use crate::store::{EntryFilter, RemoteEntry, RemoteId, RemoteStore};
use drift_assets::{LoadError, RawDataRepresentation, ResourcePath};

/// Remote file found for a path, with the representation it was found in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub id: RemoteId,
    pub representation: RawDataRepresentation,
}

/// Walks a path through a store that only answers "children of X" queries
pub struct RemoteResolver<'a> {
    store: &'a dyn RemoteStore,
}

impl<'a> RemoteResolver<'a> {
    pub fn new(store: &'a dyn RemoteStore) -> Self {
        Self { store }
    }

    /// Id of the folder `path` names, resolved one segment at a time from the root
    pub async fn resolve_folder(&self, path: &ResourcePath) -> Result<RemoteId, LoadError> {
        let segments: Vec<&str> = path.segments().collect();
        self.walk(path, &segments).await
    }

    /// Resolves the parent folders of `path`, then probes for the file in each representation,
    /// in order, until one matches
    pub async fn resolve_file(
        &self,
        path: &ResourcePath,
        representations: &[RawDataRepresentation],
    ) -> Result<ResolvedFile, LoadError> {
        let segments: Vec<&str> = path.parent_segments().collect();
        let parent = self.walk(path, &segments).await?;
        let base = path.base_name();

        for representation in representations {
            let name = representation.file_name(base);
            let filter = EntryFilter::File {
                mime_type: representation.mime_type(),
            };
            let matches = self
                .store
                .list_children(&parent, Some(name.as_str()), filter)
                .await?;
            if let Some(entry) = first_match(path, &name, matches) {
                tracing::trace!(
                    "Resolved {path} to {} as {}",
                    entry.id,
                    representation.mime_type()
                );
                return Ok(ResolvedFile {
                    id: entry.id,
                    representation: representation.clone(),
                });
            }
        }
        Err(LoadError::NotFound(path.to_string()))
    }

    async fn walk(&self, path: &ResourcePath, segments: &[&str]) -> Result<RemoteId, LoadError> {
        let mut current = RemoteId::root();
        for segment in segments {
            let matches = self
                .store
                .list_children(&current, Some(*segment), EntryFilter::Folder)
                .await?;
            current = first_match(path, segment, matches)
                .map(|entry| entry.id)
                .ok_or_else(|| LoadError::NotFound(format!("{path} (folder {segment})")))?;
        }
        Ok(current)
    }
}

/// First of `matches`, warning when the name was ambiguous
fn first_match(path: &ResourcePath, name: &str, matches: Vec<RemoteEntry>) -> Option<RemoteEntry> {
    if matches.len() > 1 {
        tracing::warn!(
            "{} remote matches for {name} while resolving {path}, using the first",
            matches.len()
        );
    }
    matches.into_iter().next()
}
