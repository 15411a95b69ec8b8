//! Upload service abstractions for photo backends.

mod r2;

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use uuid::Uuid;

use crate::media::{BlobApiClient, BlobConfig};
use crate::{Error, Result};

pub use r2::{R2Config, R2Storage};

/// Accepts a file and returns a publicly addressable URL for it.
#[allow(async_fn_in_trait)]
pub trait UploadService {
    async fn upload(&self, file: &UploadFile, path_prefix: &str) -> Result<String>;
}

/// A photo picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    /// MIME type sniffed from the bytes when recognizable
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let content_type = sniff_content_type(&bytes);
        Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Self::new(file_name, bytes))
    }

    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|content_type| content_type.starts_with("image/"))
    }
}

fn sniff_content_type(bytes: &[u8]) -> Option<String> {
    image::guess_format(bytes)
        .ok()
        .map(|format| format.to_mime_type().to_string())
}

/// Object key `{prefix}{id}_{file-name}`, unique per upload.
pub fn build_object_key(path_prefix: &str, file_name: &str) -> String {
    let prefix = path_prefix.trim().trim_start_matches('/');
    let id = Uuid::now_v7().simple();
    format!("{prefix}{id}_{}", sanitize_file_name(file_name))
}

fn sanitize_file_name(file_name: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let unsafe_run = UNSAFE.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

    let trimmed = file_name.trim().trim_matches('/');
    let (stem, ext) = trimmed.rsplit_once('.').unwrap_or((trimmed, ""));
    let clean = |part: &str| {
        unsafe_run
            .replace_all(&part.to_lowercase(), "-")
            .trim_matches('-')
            .to_string()
    };

    let stem = clean(stem);
    let stem = if stem.is_empty() {
        "photo".to_string()
    } else {
        stem
    };
    let ext = clean(ext);
    if ext.is_empty() {
        stem
    } else {
        format!("{stem}.{ext}")
    }
}

/// The upload backend selected from the environment.
#[derive(Debug, Clone)]
pub enum UploadBackend {
    R2(R2Storage),
    Blob(BlobApiClient),
}

impl UploadBackend {
    /// Prefer R2 when configured, then the blob API; `None` when neither is set.
    pub fn from_env() -> Result<Option<Self>> {
        if let Some(config) = R2Config::from_env()? {
            return Ok(Some(Self::R2(R2Storage::new(config))));
        }
        match BlobConfig::from_env()? {
            Some(config) => Ok(Some(Self::Blob(
                BlobApiClient::new(config).map_err(Error::Config)?,
            ))),
            None => Ok(None),
        }
    }
}

impl UploadService for UploadBackend {
    async fn upload(&self, file: &UploadFile, path_prefix: &str) -> Result<String> {
        match self {
            Self::R2(storage) => storage.upload(file, path_prefix).await,
            Self::Blob(client) => client.upload(file, path_prefix).await,
        }
    }
}

/// An absent backend refuses every upload.
impl<U: UploadService> UploadService for Option<U> {
    async fn upload(&self, file: &UploadFile, path_prefix: &str) -> Result<String> {
        match self {
            Some(service) => service.upload(file, path_prefix).await,
            None => Err(Error::Config(
                "No upload backend configured (set R2_* or BLOB_* variables)".to_string(),
            )),
        }
    }
}
