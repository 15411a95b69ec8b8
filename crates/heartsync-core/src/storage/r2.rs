//! Cloudflare R2 photo uploads over the S3 API.

use std::env;

use aws_credential_types::Credentials;
use aws_sdk_s3::{primitives::ByteStream, Client};
use aws_types::region::Region;

use super::{build_object_key, UploadFile, UploadService};
use crate::util::is_http_url;
use crate::{Error, Result};

const ENV_ACCOUNT_ID: &str = "R2_ACCOUNT_ID";
const ENV_BUCKET: &str = "R2_BUCKET";
const ENV_ACCESS_KEY_ID: &str = "R2_ACCESS_KEY_ID";
const ENV_SECRET_ACCESS_KEY: &str = "R2_SECRET_ACCESS_KEY";
const ENV_PUBLIC_BASE_URL: &str = "R2_PUBLIC_BASE_URL";

/// Cloudflare R2 configuration.
///
/// Photos are rendered straight from their URL, so a public base URL is
/// mandatory here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct R2Config {
    pub account_id: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub public_base_url: String,
}

impl R2Config {
    /// Load R2 configuration from environment variables.
    ///
    /// Returns `Ok(None)` when no R2 variables are set and an error when only
    /// some of them are.
    pub fn from_env() -> Result<Option<Self>> {
        parse_config(|key| env::var(key).ok())
    }

    /// S3-compatible endpoint URL.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        format!("https://{}.r2.cloudflarestorage.com", self.account_id)
    }
}

#[derive(Clone, Debug)]
pub struct R2Storage {
    config: R2Config,
    client: Client,
}

impl R2Storage {
    #[must_use]
    pub fn new(config: R2Config) -> Self {
        let client = build_s3_client(&config);
        Self { config, client }
    }

    #[must_use]
    pub const fn config(&self) -> &R2Config {
        &self.config
    }

    /// Check that the configured bucket is reachable with current credentials.
    pub async fn bucket_is_reachable(&self) -> Result<()> {
        self.client
            .head_bucket()
            .bucket(&self.config.bucket)
            .send()
            .await
            .map_err(|error| storage_error("head_bucket", &self.config.bucket, None, error))?;
        Ok(())
    }

    async fn put_object(
        &self,
        object_key: &str,
        bytes: &[u8],
        content_type: Option<&str>,
    ) -> Result<()> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.config.bucket)
            .key(object_key)
            .body(ByteStream::from(bytes.to_vec()));
        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }

        request.send().await.map_err(|error| {
            storage_error("put_object", &self.config.bucket, Some(object_key), error)
        })?;
        Ok(())
    }

    #[must_use]
    pub fn public_object_url(&self, object_key: &str) -> String {
        format!(
            "{}/{}",
            self.config.public_base_url,
            object_key.trim_matches('/')
        )
    }
}

impl UploadService for R2Storage {
    async fn upload(&self, file: &UploadFile, path_prefix: &str) -> Result<String> {
        if file.bytes.is_empty() {
            return Err(Error::InvalidInput("Photo file is empty".to_string()));
        }

        let object_key = build_object_key(path_prefix, &file.file_name);
        self.put_object(&object_key, &file.bytes, file.content_type.as_deref())
            .await?;
        tracing::debug!(bucket = %self.config.bucket, %object_key, "Uploaded photo to R2");
        Ok(self.public_object_url(&object_key))
    }
}

fn parse_config(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<R2Config>> {
    let read = |key: &str| {
        lookup(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };
    let keys = [
        ENV_ACCOUNT_ID,
        ENV_BUCKET,
        ENV_ACCESS_KEY_ID,
        ENV_SECRET_ACCESS_KEY,
        ENV_PUBLIC_BASE_URL,
    ];
    let values = keys.map(read);

    if values.iter().all(Option::is_none) {
        return Ok(None);
    }

    let missing = keys
        .iter()
        .zip(&values)
        .filter(|(_, value)| value.is_none())
        .map(|(key, _)| *key)
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(Error::Config(format!(
            "R2 configuration is incomplete. Missing: {}",
            missing.join(", ")
        )));
    }

    let [Some(account_id), Some(bucket), Some(access_key_id), Some(secret_access_key), Some(public_base_url)] =
        values
    else {
        return Ok(None);
    };

    if !is_http_url(&public_base_url) {
        return Err(Error::Config(format!(
            "{ENV_PUBLIC_BASE_URL} must start with http:// or https://"
        )));
    }

    Ok(Some(R2Config {
        account_id,
        bucket,
        access_key_id,
        secret_access_key,
        public_base_url: public_base_url.trim_end_matches('/').to_string(),
    }))
}

fn build_s3_client(config: &R2Config) -> Client {
    let credentials = Credentials::new(
        config.access_key_id.clone(),
        config.secret_access_key.clone(),
        None,
        None,
        "heartsync-r2-storage",
    );

    let sdk_config = aws_sdk_s3::config::Builder::new()
        .region(Region::new("auto"))
        .credentials_provider(credentials)
        .endpoint_url(config.endpoint_url())
        .force_path_style(true)
        .build();

    Client::from_conf(sdk_config)
}

fn storage_error(
    operation: &str,
    bucket: &str,
    object_key: Option<&str>,
    error: impl std::fmt::Display,
) -> Error {
    let target = object_key.map_or_else(|| bucket.to_string(), |key| format!("{bucket}/{key}"));
    Error::Storage(format!("R2 {operation} failed for {target}: {error}"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn parse_from_map(map: &HashMap<&str, &str>) -> Result<Option<R2Config>> {
        parse_config(|key| map.get(key).map(|value| (*value).to_string()))
    }

    fn full_map() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            (ENV_ACCOUNT_ID, "account-1"),
            (ENV_BUCKET, "photos"),
            (ENV_ACCESS_KEY_ID, "AKID123"),
            (ENV_SECRET_ACCESS_KEY, "SECRET123"),
            (ENV_PUBLIC_BASE_URL, "https://cdn.example.com/love/"),
        ])
    }

    #[test]
    fn parse_config_none_returns_none() {
        assert!(parse_from_map(&HashMap::new()).unwrap().is_none());
    }

    #[test]
    fn parse_config_reports_every_missing_value() {
        let map = HashMap::from([(ENV_ACCOUNT_ID, "account"), (ENV_BUCKET, "bucket")]);

        match parse_from_map(&map).unwrap_err() {
            Error::Config(message) => {
                assert!(message.contains(ENV_ACCESS_KEY_ID));
                assert!(message.contains(ENV_SECRET_ACCESS_KEY));
                assert!(message.contains(ENV_PUBLIC_BASE_URL));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_config_normalizes_public_url() {
        let config = parse_from_map(&full_map()).unwrap().unwrap();
        assert_eq!(config.public_base_url, "https://cdn.example.com/love");
        assert_eq!(
            config.endpoint_url(),
            "https://account-1.r2.cloudflarestorage.com"
        );
    }

    #[test]
    fn parse_config_rejects_invalid_public_base_url() {
        let mut map = full_map();
        map.insert(ENV_PUBLIC_BASE_URL, "cdn.example.com/love");

        match parse_from_map(&map).unwrap_err() {
            Error::Config(message) => assert!(message.contains(ENV_PUBLIC_BASE_URL)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn public_object_url_joins_key() {
        let config = parse_from_map(&full_map()).unwrap().unwrap();
        let storage = R2Storage::new(config);
        assert_eq!(
            storage.public_object_url("/a/123_us.png"),
            "https://cdn.example.com/love/a/123_us.png"
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn empty_file_is_rejected_before_network() {
        let storage = R2Storage::new(parse_from_map(&full_map()).unwrap().unwrap());
        let error = storage
            .upload(&UploadFile::new("empty.png", Vec::new()), "a/")
            .await
            .unwrap_err();
        assert!(matches!(error, Error::InvalidInput(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    #[ignore = "Requires local R2 env vars plus network access"]
    async fn r2_bucket_exists_and_is_reachable() {
        let _ = dotenvy::dotenv();

        let config = R2Config::from_env()
            .expect("R2 env parsing should not error")
            .expect("R2 config should be present");
        let storage = R2Storage::new(config.clone());

        storage.bucket_is_reachable().await.unwrap_or_else(|error| {
            panic!(
                "R2 bucket health check failed for bucket '{}': {error}",
                config.bucket
            )
        });
    }
}
