//! Custom subtitle fetching
//!
//! Resolves a host-supplied source to a download location, fetches the
//! payload and caches it in ~/.cache/streamplay/subtitles/.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SubtitleError;
use crate::models::{SubFormat, SubtitleSource};

/// Download location resolved from a provider file id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSubtitle {
    pub url: String,
    pub filename: String,
}

/// Host hook turning a provider file id into a download location
#[async_trait]
pub trait SubtitleFetcher: Send + Sync {
    async fn resolve(&self, file_id: &str) -> Result<ResolvedSubtitle, SubtitleError>;
}

/// Payload ready for the parser
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSubtitle {
    pub content: String,
    /// Format implied by the filename, `None` means detect from content
    pub format: Option<SubFormat>,
}

// =============================================================================
// HTTP fetcher (OpenSubtitles-style download endpoint)
// =============================================================================

/// Resolves file ids with `POST {base}/download {"file_id": ...}`
pub struct HttpSubtitleFetcher {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct DownloadRequest<'a> {
    file_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct DownloadResponse {
    link: String,
    #[serde(default)]
    file_name: Option<String>,
}

impl HttpSubtitleFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

#[async_trait]
impl SubtitleFetcher for HttpSubtitleFetcher {
    async fn resolve(&self, file_id: &str) -> Result<ResolvedSubtitle, SubtitleError> {
        let url = format!("{}/download", self.base_url);
        let mut request = self.client.post(&url).json(&DownloadRequest { file_id });
        if let Some(key) = &self.api_key {
            request = request.header("Api-Key", key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(SubtitleError::Resolve {
                file_id: file_id.to_string(),
                reason: format!("HTTP {}", response.status().as_u16()),
            });
        }

        let body: DownloadResponse = response.json().await?;
        let filename = body
            .file_name
            .unwrap_or_else(|| format!("{}.srt", file_id));
        Ok(ResolvedSubtitle {
            url: body.link,
            filename,
        })
    }
}

// =============================================================================
// Loader
// =============================================================================

/// Downloads custom subtitle payloads
///
/// Cheap to clone; every fetch task gets its own copy.
#[derive(Clone)]
pub struct SubtitleLoader {
    client: reqwest::Client,
    fetcher: Option<Arc<dyn SubtitleFetcher>>,
    cache_dir: Option<PathBuf>,
}

impl SubtitleLoader {
    /// Loader with the default cache directory and no file-id fetcher
    pub fn new() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("streamplay")
            .join("subtitles");

        Self {
            client: reqwest::Client::new(),
            fetcher: None,
            cache_dir: Some(cache_dir),
        }
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn SubtitleFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.cache_dir = None;
        self
    }

    /// Fetch the payload for a source
    pub async fn load(&self, source: &SubtitleSource) -> Result<LoadedSubtitle, SubtitleError> {
        if let Some(path) = self.cache_path(source) {
            if let Ok(content) = tokio::fs::read_to_string(&path).await {
                debug!(path = %path.display(), "subtitle cache hit");
                return Ok(LoadedSubtitle {
                    format: SubFormat::from_filename(&source.url),
                    content,
                });
            }
        }

        let (url, filename) = self.locate(source).await?;
        let content = self.download(&url).await?;
        if content.trim().is_empty() {
            return Err(SubtitleError::Empty);
        }

        if let Some(path) = self.cache_path(source) {
            if let Err(e) = write_cache(&path, &content).await {
                debug!(error = %e, "failed to cache subtitle");
            }
        }

        Ok(LoadedSubtitle {
            content,
            format: SubFormat::from_filename(&filename),
        })
    }

    /// Direct url wins; otherwise resolve the file id through the fetcher
    async fn locate(&self, source: &SubtitleSource) -> Result<(String, String), SubtitleError> {
        if !source.url.is_empty() && source.file_id.is_none() {
            return Ok((source.url.clone(), source.url.clone()));
        }

        match (&source.file_id, &self.fetcher) {
            (Some(file_id), Some(fetcher)) => {
                let resolved = fetcher.resolve(file_id).await?;
                Ok((resolved.url, resolved.filename))
            }
            (Some(file_id), None) if source.url.is_empty() => Err(SubtitleError::Resolve {
                file_id: file_id.clone(),
                reason: "no subtitle fetcher configured".to_string(),
            }),
            (Some(_), None) => Ok((source.url.clone(), source.url.clone())),
            (None, _) => Err(SubtitleError::NoLocation),
        }
    }

    async fn download(&self, url: &str) -> Result<String, SubtitleError> {
        if let Some(path) = url.strip_prefix("file://") {
            return Ok(tokio::fs::read_to_string(path).await?);
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Ok(tokio::fs::read_to_string(url).await?);
        }

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(SubtitleError::Status(response.status().as_u16()));
        }
        Ok(response.text().await?)
    }

    fn cache_path(&self, source: &SubtitleSource) -> Option<PathBuf> {
        // Local files are already on disk
        if source.file_id.is_none() && !source.url.starts_with("http") {
            return None;
        }
        let dir = self.cache_dir.as_ref()?;
        Some(dir.join(urlencoding::encode(&source.cache_key()).into_owned()))
    }
}

impl Default for SubtitleLoader {
    fn default() -> Self {
        Self::new()
    }
}

async fn write_cache(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content).await
}
