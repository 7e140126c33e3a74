use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use tracing::{debug, error, instrument};

pub mod location;

pub use location::{ObjectLocation, StoreUrl};

/// Read access to named objects in the configured store
///
/// Implementations never fail: every error, including a missing object, is
/// logged and reported as `None`. Deciding what an absent object means is up
/// to the caller.
#[async_trait]
pub trait ObjectReader: Send + Sync {
    /// Fetch the raw bytes of `name`
    async fn read_bytes(&self, name: &str) -> Option<Vec<u8>>;

    /// Fetch `name` decoded as UTF-8, replacing invalid sequences
    async fn read_string(&self, name: &str) -> Option<String> {
        self.read_bytes(name)
            .await
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// S3-backed object reader rooted at a store URL
#[derive(Clone)]
pub struct S3Bucket {
    client: Client,
    store: StoreUrl,
}

impl S3Bucket {
    pub fn new(client: Client, store: StoreUrl) -> Self {
        Self { client, store }
    }

    pub fn store(&self) -> &StoreUrl {
        &self.store
    }

    async fn download(&self, location: &ObjectLocation) -> Result<Vec<u8>> {
        debug!("Downloading from {}", location);

        let response = self
            .client
            .get_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .send()
            .await
            .with_context(|| format!("Failed to download from S3: {}", location))?;

        // The body stream is consumed here, which releases the connection on both paths
        let data = response
            .body
            .collect()
            .await
            .context("Failed to read S3 response body")?
            .into_bytes()
            .to_vec();

        debug!("Downloaded {} bytes from {}", data.len(), location);

        Ok(data)
    }
}

#[async_trait]
impl ObjectReader for S3Bucket {
    #[instrument(skip(self))]
    async fn read_bytes(&self, name: &str) -> Option<Vec<u8>> {
        let location = self.store.resolve(name);

        match self.download(&location).await {
            Ok(data) => Some(data),
            Err(e) => {
                error!(
                    error = ?e,
                    file_name = name,
                    store_url = %self.store,
                    "Failed to read file from object store"
                );
                None
            },
        }
    }
}
