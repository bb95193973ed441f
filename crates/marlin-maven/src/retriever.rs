//! Fetching text content (POMs, metadata) from Maven repositories.
//!
//! Every fetch goes through [`ContentRetriever`]. A missing artifact is
//! reported as [`MarlinError::ArtifactNotFound`] so callers can move on to
//! the next repository; every other failure is [`MarlinError::ArtifactRetrieval`].

use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;

use marlin_util::errors::{MarlinError, MarlinResult};

use crate::auth;
use crate::repository::RepositoryArtifact;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const USER_AGENT: &str = concat!("marlin/", env!("CARGO_PKG_VERSION"));

/// Source of text content for repository artifacts.
pub trait ContentRetriever: Send + Sync {
    /// Fetch the content at `artifact`.
    fn retrieve(&self, artifact: &RepositoryArtifact) -> MarlinResult<String>;
}

impl<T: ContentRetriever + ?Sized> ContentRetriever for Arc<T> {
    fn retrieve(&self, artifact: &RepositoryArtifact) -> MarlinResult<String> {
        (**self).retrieve(artifact)
    }
}

impl<T: ContentRetriever + ?Sized> ContentRetriever for &T {
    fn retrieve(&self, artifact: &RepositoryArtifact) -> MarlinResult<String> {
        (**self).retrieve(artifact)
    }
}

/// Reads artifacts from local (filesystem) repositories.
#[derive(Debug, Clone, Default)]
pub struct FileRetriever;

impl ContentRetriever for FileRetriever {
    fn retrieve(&self, artifact: &RepositoryArtifact) -> MarlinResult<String> {
        let path = artifact
            .local_path()
            .ok_or_else(|| MarlinError::ArtifactRetrieval {
                location: artifact.url(),
                message: "not a local repository".to_string(),
            })?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                tracing::trace!("Read {}", path.display());
                Ok(content)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(MarlinError::not_found(artifact.url()))
            }
            Err(e) => Err(MarlinError::ArtifactRetrieval {
                location: artifact.url(),
                message: e.to_string(),
            }),
        }
    }
}

/// Fetches artifacts from remote repositories over HTTP(S).
///
/// A 404 is "not found"; any other non-success status or transport failure
/// is a retrieval error. Requests are not retried.
#[derive(Debug, Clone)]
pub struct HttpRetriever {
    client: Client,
}

impl HttpRetriever {
    pub fn new() -> MarlinResult<Self> {
        Ok(Self {
            client: build_client()?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

/// Build a shared blocking client for repository fetches.
pub fn build_client() -> MarlinResult<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| MarlinError::ArtifactRetrieval {
            location: "HTTP client".to_string(),
            message: format!("Failed to create HTTP client: {e}"),
        })
}

impl ContentRetriever for HttpRetriever {
    fn retrieve(&self, artifact: &RepositoryArtifact) -> MarlinResult<String> {
        let url = artifact.url();
        let request = auth::apply_auth(self.client.get(&url), &artifact.repository);

        let response = request.send().map_err(|e| MarlinError::ArtifactRetrieval {
            location: url.clone(),
            message: format!("Request failed: {e}"),
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!("Not found: {url}");
            return Err(MarlinError::not_found(url));
        }
        if !status.is_success() {
            return Err(MarlinError::ArtifactRetrieval {
                location: url,
                message: format!("HTTP {status}"),
            });
        }

        tracing::debug!("Fetched {url}");
        response.text().map_err(|e| MarlinError::ArtifactRetrieval {
            location: url,
            message: format!("Failed to read response: {e}"),
        })
    }
}

/// Dispatches to the file or HTTP retriever by repository locality.
#[derive(Debug, Clone)]
pub struct DefaultRetriever {
    file: FileRetriever,
    http: HttpRetriever,
}

impl DefaultRetriever {
    pub fn new() -> MarlinResult<Self> {
        Ok(Self {
            file: FileRetriever,
            http: HttpRetriever::new()?,
        })
    }
}

impl ContentRetriever for DefaultRetriever {
    fn retrieve(&self, artifact: &RepositoryArtifact) -> MarlinResult<String> {
        if artifact.repository.is_local() {
            self.file.retrieve(artifact)
        } else {
            self.http.retrieve(artifact)
        }
    }
}
