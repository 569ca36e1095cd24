// src/store/gcs.rs

use anyhow::{Context, Result};
use google_cloud_storage::{
    client::{Client, ClientConfig},
    http::{
        objects::{
            download::Range,
            get::GetObjectRequest,
            upload::{Media, UploadObjectRequest, UploadType},
        },
        Error as GcsError,
    },
};
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

use super::{decode_lines, BlobStore};
use crate::error::StoreError;

/// Google Cloud Storage bucket acting as the container. The client is async;
/// a private current-thread runtime drives each request to completion.
pub struct GcsStore {
    bucket: String,
    client: Client,
    runtime: Runtime,
}

impl GcsStore {
    /// Authenticate with application default credentials.
    pub fn connect(bucket: impl Into<String>) -> Result<Self> {
        let bucket = bucket.into();
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .context("building runtime for GCS client")?;
        let config = runtime
            .block_on(ClientConfig::default().with_auth())
            .context("authenticating to GCS")?;
        info!(bucket = %bucket, "connected to GCS");
        Ok(Self {
            bucket,
            client: Client::new(config),
            runtime,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

fn cloud_err(
    resource: &str,
    source: impl std::error::Error + Send + Sync + 'static,
) -> StoreError {
    StoreError::Cloud {
        resource: resource.to_string(),
        source: Box::new(source),
    }
}

/// A 404 from the service means the object does not exist.
fn download_err(resource: &str, err: GcsError) -> StoreError {
    match err {
        GcsError::Response(ref response) if response.code == 404 => {
            StoreError::NotFound(resource.to_string())
        }
        other => cloud_err(resource, other),
    }
}

impl BlobStore for GcsStore {
    fn open_text(&self, resource: &str) -> Result<Vec<String>, StoreError> {
        let request = GetObjectRequest {
            bucket: self.bucket.clone(),
            object: resource.to_string(),
            ..Default::default()
        };
        let bytes = self
            .runtime
            .block_on(self.client.download_object(&request, &Range(None, None)))
            .map_err(|e| download_err(resource, e))?;
        debug!(object = %resource, bytes = bytes.len(), "downloaded from GCS");
        decode_lines(resource, bytes)
    }

    fn put(&self, resource: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        let len = bytes.len();
        let mut media = Media::new(resource.to_string());
        media.content_length = Some(len as u64);
        let request = UploadObjectRequest {
            bucket: self.bucket.clone(),
            ..Default::default()
        };
        self.runtime
            .block_on(
                self.client
                    .upload_object(&request, bytes, &UploadType::Simple(media)),
            )
            .map_err(|e| cloud_err(resource, e))?;
        debug!(object = %resource, bytes = len, "uploaded to GCS");
        Ok(())
    }

    fn describe(&self, resource: &str) -> String {
        format!("gs://{}/{}", self.bucket, resource)
    }
}
