//! Streaming file downloads

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::header::{HeaderName, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::naming::{
    extension_for_content_type, filename_from_disposition, filename_from_url, sanitize_filename,
};
use crate::error::{Error, Result, ServiceError};

/// Body chunks of a download
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// An open download: response headers plus the body stream
pub struct FetchedFile {
    pub content_disposition: Option<String>,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub body: ByteStream,
}

/// Opens downloads for file URLs
#[async_trait]
pub trait FileFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedFile>;
}

/// Plain HTTP fetcher; Canvas file URLs are pre-signed and need no token
#[derive(Debug, Clone, Default)]
pub struct HttpFileFetcher {
    client: Client,
}

impl HttpFileFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FileFetcher for HttpFileFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedFile> {
        tracing::debug!("Downloading {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Api {
                service: "Download".to_string(),
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("request failed").to_string(),
            }
            .into());
        }

        let header = |name: HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let content_disposition = header(CONTENT_DISPOSITION);
        let content_type = header(CONTENT_TYPE);
        let content_length = response.content_length();

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(Error::from))
            .boxed();

        Ok(FetchedFile {
            content_disposition,
            content_type,
            content_length,
            body,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    Success,
    Skipped,
    Error,
}

/// What happened to one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadOutcome {
    pub status: DownloadStatus,
    pub filename: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    pub message: String,
}

impl DownloadOutcome {
    pub fn error<S: Into<String>>(filename: S, path: &Path, message: String) -> Self {
        Self {
            status: DownloadStatus::Error,
            filename: filename.into(),
            path: path.display().to_string(),
            size: None,
            message,
        }
    }
}

/// Download `url` into `dir`
///
/// The file name is `filename` when given, otherwise taken from the response.
/// Failures are reported in the outcome.
pub async fn download_file(
    fetcher: &dyn FileFetcher,
    url: &str,
    dir: &Path,
    filename: Option<&str>,
) -> DownloadOutcome {
    let mut resolved = filename.filter(|f| !f.is_empty()).map(str::to_string);

    match try_download(fetcher, url, dir, &mut resolved).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!("Download of {} failed: {}", url, e);
            DownloadOutcome::error(
                resolved.unwrap_or_else(|| "unknown".to_string()),
                dir,
                format!("Error downloading file: {}", e),
            )
        }
    }
}

async fn try_download(
    fetcher: &dyn FileFetcher,
    url: &str,
    dir: &Path,
    resolved: &mut Option<String>,
) -> Result<DownloadOutcome> {
    let mut fetched = fetcher.fetch(url).await?;

    let raw_name = match resolved.take() {
        Some(name) => name,
        None => fetched
            .content_disposition
            .as_deref()
            .and_then(filename_from_disposition)
            .or_else(|| filename_from_url(url))
            .unwrap_or_else(|| "download".to_string()),
    };

    let mut filename = sanitize_filename(&raw_name);
    if !filename.contains('.') {
        if let Some(ext) = fetched.content_type.as_deref().and_then(extension_for_content_type) {
            filename.push_str(ext);
        }
    }
    *resolved = Some(filename.clone());

    let full_path = dir.join(&filename);
    fs::create_dir_all(dir).await?;

    if let Ok(existing) = fs::metadata(&full_path).await {
        if existing.is_file() && existing.len() == fetched.content_length.unwrap_or(0) {
            return Ok(DownloadOutcome {
                status: DownloadStatus::Skipped,
                filename,
                path: full_path.display().to_string(),
                size: Some(existing.len()),
                message: "File already exists with same size".to_string(),
            });
        }
    }

    let mut file = fs::File::create(&full_path).await?;
    while let Some(chunk) = fetched.body.next().await {
        file.write_all(&chunk?).await?;
    }
    file.flush().await?;

    let size = fs::metadata(&full_path).await?.len();
    tracing::debug!("Saved {} ({} bytes)", full_path.display(), size);

    Ok(DownloadOutcome {
        status: DownloadStatus::Success,
        filename,
        path: full_path.display().to_string(),
        size: Some(size),
        message: "File downloaded successfully".to_string(),
    })
}
