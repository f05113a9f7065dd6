use bytes::Bytes;
use drift_assets::LoadError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// MIME type remote stores report for folders
pub const FOLDER_MIME_TYPE: &str = "application/x-directory";

/// Opaque identifier of a remote file or folder
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(String);

impl RemoteId {
    const ROOT: &'static str = "root";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Well known sentinel of the root folder
    pub fn root() -> Self {
        Self(Self::ROOT.to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == Self::ROOT
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RemoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One child returned by [`RemoteStore::list_children`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    pub id: RemoteId,
    pub name: String,
}

/// Type filter of a listing query
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EntryFilter<'a> {
    Folder,
    File { mime_type: &'a str },
}

impl EntryFilter<'_> {
    pub fn mime_type(&self) -> &str {
        match self {
            EntryFilter::Folder => FOLDER_MIME_TYPE,
            EntryFilter::File { mime_type } => mime_type,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Request failed: {0}")]
    Request(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("Unknown remote id {0}")]
    UnknownId(RemoteId),
    #[error("{id} cannot be exported as {mime_type}")]
    ExportUnsupported { id: RemoteId, mime_type: String },
}

/// Request/response contract of a remote store exposing only flat "children of X" queries
#[async_trait::async_trait]
pub trait RemoteStore: Send + Sync + 'static {
    /// Children of `parent`, optionally restricted to an exact `name`, that match `filter`
    async fn list_children(
        &self,
        parent: &RemoteId,
        name: Option<&str>,
        filter: EntryFilter<'_>,
    ) -> Result<Vec<RemoteEntry>, StoreError>;

    async fn download(&self, id: &RemoteId) -> Result<Bytes, StoreError>;

    /// Content of `id` converted server-side to `target_mime`
    async fn export(&self, id: &RemoteId, target_mime: &str) -> Result<Bytes, StoreError>;
}

impl From<StoreError> for LoadError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UnknownId(id) => LoadError::NotFound(id.to_string()),
            err => LoadError::Transport(err.to_string()),
        }
    }
}
