//! Source listing and document text extraction.
//!
//! A sources file lists one source per line as `type, path`, where `type` is
//! `url` or `file`. Only the first comma separates the two, so paths may
//! contain commas. Blank lines and `#` comments are ignored.

use crate::types::Document;
use faqbot_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Timeout for fetching a URL source.
pub const URL_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Kind of a listed source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Url,
    File,
}

impl SourceKind {
    /// Parse a source type name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "url" => Some(Self::Url),
            "file" => Some(Self::File),
            _ => None,
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::File => "file",
        }
    }
}

/// One entry of the sources file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Source kind
    #[serde(rename = "type")]
    pub kind: SourceKind,

    /// URL or file path
    pub path: String,
}

impl SourceDescriptor {
    pub fn new(kind: SourceKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

/// File formats the loader can extract text from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Pdf,
    PlainText,
}

impl FileFormat {
    /// Detect format from file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("pdf") => Some(Self::Pdf),
            Some("txt") => Some(Self::PlainText),
            _ => None,
        }
    }
}

/// Parse the contents of a sources file.
///
/// Returns one descriptor per well-formed line, in file order. Lines with an
/// unsupported type or no comma are skipped with a warning.
pub fn parse_sources(contents: &str) -> Vec<SourceDescriptor> {
    let mut sources = Vec::new();

    for (index, raw) in contents.lines().enumerate() {
        let line_num = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((kind, path)) = line.split_once(',') else {
            tracing::warn!("Invalid format on line {}: {}", line_num, line);
            continue;
        };

        let kind = kind.trim();
        let path = path.trim();

        match SourceKind::parse(kind) {
            Some(kind) if !path.is_empty() => sources.push(SourceDescriptor::new(kind, path)),
            Some(_) => tracing::warn!("Missing path on line {}", line_num),
            None => tracing::warn!("Unsupported source type '{}' on line {}", kind, line_num),
        }
    }

    sources
}

/// Read and parse a sources file.
pub fn load_sources_from_file(path: &Path) -> AppResult<Vec<SourceDescriptor>> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        AppError::Knowledge(format!("Failed to read sources file {:?}: {}", path, e))
    })?;

    let sources = parse_sources(&contents);
    tracing::info!("Loaded {} sources from {:?}", sources.len(), path);
    Ok(sources)
}

/// Extract visible text from an HTML page.
///
/// Text inside `script`, `style` and `noscript` is dropped; the remaining
/// text nodes are trimmed and joined with newlines.
pub fn html_to_text(html: &str) -> String {
    use scraper::Html;

    let document = Html::parse_document(html);
    let mut parts: Vec<&str> = Vec::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map(|el| matches!(el.name(), "script" | "style" | "noscript"))
                .unwrap_or(false)
        });
        if hidden {
            continue;
        }

        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }

    parts.join("\n")
}

/// Loads documents from source descriptors.
pub struct DocumentLoader {
    client: reqwest::Client,
}

impl DocumentLoader {
    /// Create a loader with the default URL timeout.
    pub fn new() -> AppResult<Self> {
        Self::with_timeout(URL_FETCH_TIMEOUT)
    }

    /// Create a loader whose URL fetches time out after `timeout`.
    pub fn with_timeout(timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Knowledge(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Load one source.
    ///
    /// Extraction failures and empty text are logged and yield `None`.
    pub async fn load(&self, source: &SourceDescriptor) -> Option<Document> {
        let result = match source.kind {
            SourceKind::Url => self.extract_url(&source.path).await,
            SourceKind::File => {
                let path = Path::new(&source.path);
                match FileFormat::from_path(path) {
                    Some(format) => extract_file(path, format).await,
                    None => {
                        tracing::warn!("Unsupported file extension: {}", source.path);
                        return None;
                    }
                }
            }
        };

        match result {
            Ok(text) if !text.trim().is_empty() => {
                tracing::debug!("Extracted {} bytes from {}", text.len(), source.path);
                Some(Document::new(text, &source.path, source.kind.as_str()))
            }
            Ok(_) => {
                tracing::info!("No text extracted from {}", source.path);
                None
            }
            Err(e) => {
                tracing::error!("Error extracting text from {}: {}", source.path, e);
                None
            }
        }
    }

    /// Load every source in order, keeping the ones that produced text.
    pub async fn load_all(&self, sources: &[SourceDescriptor]) -> Vec<Document> {
        let mut documents = Vec::with_capacity(sources.len());

        for (i, source) in sources.iter().enumerate() {
            tracing::info!("Processing source {}/{}: {}", i + 1, sources.len(), source.path);
            if let Some(doc) = self.load(source).await {
                documents.push(doc);
            }
        }

        documents
    }

    async fn extract_url(&self, url: &str) -> AppResult<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::Knowledge(format!("Failed to fetch {}: {}", url, e)))?;

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to read body of {}: {}", url, e)))?;

        Ok(html_to_text(&body))
    }
}

async fn extract_file(path: &Path, format: FileFormat) -> AppResult<String> {
    match format {
        FileFormat::PlainText => Ok(tokio::fs::read_to_string(path).await?),
        FileFormat::Pdf => {
            let path = path.to_path_buf();
            tokio::task::spawn_blocking(move || pdf_extract::extract_text(&path))
                .await
                .map_err(|e| AppError::Knowledge(format!("PDF extraction task failed: {}", e)))?
                .map_err(|e| AppError::Knowledge(format!("Failed to extract PDF text: {}", e)))
        }
    }
}
