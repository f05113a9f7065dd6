use crate::store::{EntryFilter, RemoteEntry, RemoteId, RemoteStore, StoreError};
use bytes::Bytes;

/// REST binding of the [`RemoteStore`] contract
///
/// * `GET {base}/children?parent=&name=&mime=` answers a JSON array of `{id, name}`
/// * `GET {base}/files/content?id=` answers the raw bytes
/// * `GET {base}/files/export?id=&mime=` answers the converted bytes
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: reqwest::Client,
    base: String,
}

impl HttpStore {
    pub fn new(base: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base)
    }

    pub fn with_client(client: reqwest::Client, base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self { client, base }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base, endpoint)
    }

    async fn fetch(
        &self,
        request: reqwest::RequestBuilder,
        id: &RemoteId,
    ) -> Result<Bytes, StoreError> {
        let response = request.send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::UnknownId(id.clone()));
        }
        Ok(response.error_for_status()?.bytes().await?)
    }
}

#[async_trait::async_trait]
impl RemoteStore for HttpStore {
    async fn list_children(
        &self,
        parent: &RemoteId,
        name: Option<&str>,
        filter: EntryFilter<'_>,
    ) -> Result<Vec<RemoteEntry>, StoreError> {
        let mut query = vec![("parent", parent.as_str()), ("mime", filter.mime_type())];
        if let Some(name) = name {
            query.push(("name", name));
        }
        let response = self
            .client
            .get(self.url("children"))
            .query(&query)
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::UnknownId(parent.clone()));
        }
        let entries = response.error_for_status()?.json::<Vec<RemoteEntry>>().await?;
        Ok(entries)
    }

    async fn download(&self, id: &RemoteId) -> Result<Bytes, StoreError> {
        let request = self
            .client
            .get(self.url("files/content"))
            .query(&[("id", id.as_str())]);
        self.fetch(request, id).await
    }

    async fn export(&self, id: &RemoteId, target_mime: &str) -> Result<Bytes, StoreError> {
        let request = self
            .client
            .get(self.url("files/export"))
            .query(&[("id", id.as_str()), ("mime", target_mime)]);
        match self.fetch(request, id).await {
            Err(StoreError::Http(e))
                if e.status() == Some(reqwest::StatusCode::UNPROCESSABLE_ENTITY) =>
            {
                Err(StoreError::ExportUnsupported {
                    id: id.clone(),
                    mime_type: target_mime.to_string(),
                })
            }
            result => result,
        }
    }
}
