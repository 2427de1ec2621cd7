/// HTTP download of tool artifacts
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use url::Url;

/// Fetches a URL and streams the response body into a file
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// Perform a single GET and write the whole body to `dest`.
    ///
    /// Returns the number of bytes written.
    async fn fetch(&self, url: &Url, dest: &mut File) -> Result<u64>;
}

/// Default fetcher backed by reqwest
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
    reject_http_errors: bool,
}

impl ReqwestFetcher {
    /// Create a fetcher with an optional overall request timeout
    pub fn new(timeout: Option<Duration>, reject_http_errors: bool) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            reject_http_errors,
        })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &Url, dest: &mut File) -> Result<u64> {
        debug!("GET {}", url);

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .context("get url")?;

        let status = response.status();
        if !status.is_success() {
            if self.reject_http_errors {
                anyhow::bail!("server responded with status {} for {}", status, url);
            }
            warn!("Server responded with status {} for {}, keeping body", status, url);
        }

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await.context("read response body")? {
            dest.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        dest.flush().await?;

        debug!("Downloaded {} bytes from {}", written, url);
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    async fn fetch_into(fetcher: &ReqwestFetcher, url: &str) -> (Result<u64>, Vec<u8>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("download");
        let mut file = File::create(&path).await.unwrap();
        let url = Url::parse(url).unwrap();
        let result = fetcher.fetch(&url, &mut file).await;
        drop(file);
        let body = tokio::fs::read(&path).await.unwrap();
        (result, body)
    }

    #[tokio::test]
    async fn test_fetch_writes_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/bin/tool");
                then.status(200).body("#!/bin/sh\necho ok\n");
            })
            .await;

        let fetcher = ReqwestFetcher::new(Some(Duration::from_secs(10)), true).unwrap();
        let (result, body) = fetch_into(&fetcher, &server.url("/bin/tool")).await;

        assert_eq!(result.unwrap(), 18);
        assert_eq!(body, b"#!/bin/sh\necho ok\n");
    }

    #[tokio::test]
    async fn test_fetch_rejects_404() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/missing");
                then.status(404).body("Not Found");
            })
            .await;

        let fetcher = ReqwestFetcher::new(None, true).unwrap();
        let (result, body) = fetch_into(&fetcher, &server.url("/missing")).await;

        let err = result.unwrap_err().to_string();
        assert!(err.contains("404"), "error should mention 404: {}", err);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_permissive_keeps_error_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/missing");
                then.status(500).body("Internal Server Error");
            })
            .await;

        let fetcher = ReqwestFetcher::new(None, false).unwrap();
        let (result, body) = fetch_into(&fetcher, &server.url("/missing")).await;

        assert!(result.is_ok());
        assert_eq!(body, b"Internal Server Error");
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let fetcher = ReqwestFetcher::new(Some(Duration::from_secs(5)), true).unwrap();
        let (result, _) = fetch_into(&fetcher, "http://127.0.0.1:1/tool").await;

        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "get url");
    }
}
