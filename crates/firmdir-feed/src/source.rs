//! Feed source selection and fetching.
//!
//! The feed document is read either from a local file or from a remote
//! endpoint, selected by configuration.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

use crate::error::FeedResult;
use crate::snapshot::PdaSnapshot;

/// Where the feed document comes from.
#[derive(Debug, Clone)]
pub enum FeedSource {
    /// A JSON document on the local filesystem.
    File(PathBuf),
    /// A remote endpoint serving the JSON document.
    Http(Url),
}

impl std::fmt::Display for FeedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "file:{}", path.display()),
            Self::Http(url) => write!(f, "{url}"),
        }
    }
}

/// Client that fetches and parses feed snapshots.
#[derive(Debug, Clone)]
pub struct FeedClient {
    source: FeedSource,
    http: reqwest::Client,
}

impl FeedClient {
    /// Default timeout for remote feed requests.
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    /// Create a client for the given source.
    #[must_use]
    pub fn new(source: FeedSource) -> Self {
        Self {
            source,
            http: reqwest::Client::new(),
        }
    }

    /// The configured source.
    #[must_use]
    pub fn source(&self) -> &FeedSource {
        &self.source
    }

    /// Fetch and parse the current feed document.
    ///
    /// # Errors
    ///
    /// Any failure here means "no valid snapshot"; callers abort the
    /// reconciliation pass without touching the store.
    pub async fn fetch_snapshot(&self) -> FeedResult<PdaSnapshot> {
        let body = match &self.source {
            FeedSource::File(path) => {
                tracing::debug!(path = %path.display(), "Reading feed from file");
                tokio::fs::read_to_string(path).await?
            }
            FeedSource::Http(url) => {
                tracing::debug!(url = %url, "Fetching feed from endpoint");
                self.http
                    .get(url.clone())
                    .timeout(Self::REQUEST_TIMEOUT)
                    .send()
                    .await?
                    .error_for_status()?
                    .text()
                    .await?
            }
        };

        let snapshot = PdaSnapshot::from_json(&body)?;
        tracing::debug!(firms = snapshot.firm_count(), "Parsed feed snapshot");
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_display() {
        let file = FeedSource::File(PathBuf::from("/var/feeds/pda.json"));
        assert_eq!(file.to_string(), "file:/var/feeds/pda.json");

        let url: Url = "https://feeds.example.com/pda".parse().unwrap();
        let http = FeedSource::Http(url);
        assert!(http.to_string().starts_with("https://feeds.example.com"));
    }
}
