//! HTTP blob API client for photo uploads.
//!
//! Photos are `PUT` to `{api_url}/{object-key}` with a bearer token; the
//! service answers with the public URL of the stored blob.

use std::env;
use std::time::Duration;

use serde::Deserialize;

use crate::storage::{build_object_key, UploadFile, UploadService};
use crate::util::{compact_text, normalize_base_url, normalize_text_option};
use crate::{Error, Result};

const ENV_API_URL: &str = "BLOB_API_URL";
const ENV_TOKEN: &str = "BLOB_READ_WRITE_TOKEN";
const BLOB_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, PartialEq, Eq)]
pub struct BlobConfig {
    pub api_url: String,
    pub token: String,
}

impl std::fmt::Debug for BlobConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("BlobConfig")
            .field("api_url", &self.api_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl BlobConfig {
    /// `Ok(None)` when neither variable is set.
    pub fn from_env() -> Result<Option<Self>> {
        parse_config(
            normalize_text_option(env::var(ENV_API_URL).ok()),
            normalize_text_option(env::var(ENV_TOKEN).ok()),
        )
    }
}

fn parse_config(api_url: Option<String>, token: Option<String>) -> Result<Option<BlobConfig>> {
    match (api_url, token) {
        (None, None) => Ok(None),
        (Some(api_url), Some(token)) => Ok(Some(BlobConfig {
            api_url: normalize_base_url(&api_url, ENV_API_URL).map_err(Error::Config)?,
            token,
        })),
        (None, Some(_)) => Err(Error::Config(format!("{ENV_API_URL} is required"))),
        (Some(_), None) => Err(Error::Config(format!("{ENV_TOKEN} is required"))),
    }
}

/// Client for the blob upload endpoint.
#[derive(Debug, Clone)]
pub struct BlobApiClient {
    config: BlobConfig,
    client: reqwest::Client,
}

impl BlobApiClient {
    pub fn new(config: BlobConfig) -> std::result::Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(BLOB_HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|error| format!("Failed to construct HTTP client: {error}"))?;
        Ok(Self { config, client })
    }

    pub fn api_url(&self) -> &str {
        &self.config.api_url
    }

    fn object_url(&self, object_key: &str) -> String {
        let encoded = object_key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{encoded}", self.config.api_url)
    }
}

impl UploadService for BlobApiClient {
    async fn upload(&self, file: &UploadFile, path_prefix: &str) -> Result<String> {
        if file.bytes.is_empty() {
            return Err(Error::InvalidInput("Photo file is empty".to_string()));
        }

        let object_key = build_object_key(path_prefix, &file.file_name);
        let mut request = self
            .client
            .put(self.object_url(&object_key))
            .bearer_auth(&self.config.token)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(content_type) = &file.content_type {
            request = request.header(reqwest::header::CONTENT_TYPE, content_type);
        }

        let response = request
            .body(file.bytes.clone())
            .send()
            .await
            .map_err(|error| Error::Upload(format!("Upload request failed: {error}")))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upload(format!(
                "Upload request failed with HTTP {status}: {}",
                compact_text(&body)
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|error| Error::Upload(format!("Failed to read upload response: {error}")))?;
        let url = parse_upload_response(&body)?;
        tracing::debug!(%object_key, %url, "Uploaded photo to blob API");
        Ok(url)
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: Option<String>,
}

fn parse_upload_response(body: &str) -> Result<String> {
    let payload: UploadResponse = serde_json::from_str(body)?;
    payload
        .url
        .and_then(|url| normalize_text_option(Some(url)))
        .ok_or_else(|| Error::Upload("Upload response did not include a url".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> BlobApiClient {
        BlobApiClient::new(BlobConfig {
            api_url: "https://blob.example.com".to_string(),
            token: "rw-token".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn parse_config_requires_both_values() {
        assert!(parse_config(None, None).unwrap().is_none());
        assert!(parse_config(Some("https://blob.example.com".into()), None).is_err());
        assert!(parse_config(None, Some("token".into())).is_err());
        assert!(parse_config(Some("blob.example.com".into()), Some("token".into())).is_err());

        let config = parse_config(Some("https://blob.example.com/".into()), Some("t".into()))
            .unwrap()
            .unwrap();
        assert_eq!(config.api_url, "https://blob.example.com");
    }

    #[test]
    fn config_debug_redacts_token() {
        let debug = format!("{:?}", client().config);
        assert!(!debug.contains("rw-token"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn object_url_encodes_each_segment() {
        assert_eq!(
            client().object_url("a/01_our photo.png"),
            "https://blob.example.com/a/01_our%20photo.png"
        );
    }

    #[test]
    fn parse_upload_response_extracts_url() {
        assert_eq!(
            parse_upload_response(r#"{"url":"https://cdn.example.com/a/1_x.png","size":3}"#)
                .unwrap(),
            "https://cdn.example.com/a/1_x.png"
        );
        assert!(parse_upload_response(r#"{"url":"  "}"#).is_err());
        assert!(parse_upload_response("not json").is_err());
    }
}
