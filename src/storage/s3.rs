//! S3-compatible object store (MinIO in production)

use super::objects::{ObjectStore, PutObject};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;

/// Object store backed by an S3-compatible endpoint
///
/// Objects are readable at `{public_base_url}/{bucket}/{name}`.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: S3Client,
    public_base_url: String,
}

impl S3ObjectStore {
    pub fn new(client: S3Client, public_base_url: impl Into<String>) -> Self {
        Self {
            client,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Build a path-style client for a MinIO endpoint with static credentials
    pub fn from_endpoint(
        endpoint: &str,
        access_key: &str,
        secret_key: &str,
        region: &str,
        public_base_url: impl Into<String>,
    ) -> Self {
        let credentials = Credentials::new(access_key, secret_key, None, None, "static");
        let config = aws_sdk_s3::config::Builder::new()
            .endpoint_url(endpoint)
            .credentials_provider(credentials)
            .region(Region::new(region.to_string()))
            .force_path_style(true)
            .behavior_version(BehaviorVersion::latest())
            .build();

        Self::new(S3Client::from_conf(config), public_base_url)
    }

    pub fn object_url(&self, bucket: &str, name: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, bucket, name)
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(&self, object: PutObject) -> Result<String> {
        let url = self.object_url(&object.bucket, &object.name);
        let length = object.bytes.len() as i64;

        self.client
            .put_object()
            .bucket(&object.bucket)
            .key(&object.name)
            .body(ByteStream::from(object.bytes))
            .content_length(length)
            .content_type(&object.content_type)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to put object {}: {}", object.name, e))?;

        Ok(url)
    }
}
