//! Cloud Storage JSON API client, used to fetch the job config document.

use std::sync::Arc;

use reqwest::Url;

use crate::auth::TokenProvider;
use crate::error::GcpError;
use crate::transport::{normalise_base_url, Transport, TransportSettings};

const DEFAULT_BASE_URL: &str = "https://storage.googleapis.com/storage/v1/";

pub struct StorageClient {
    transport: Transport,
    base_url: Url,
}

impl StorageClient {
    /// # Errors
    ///
    /// Returns [`GcpError::Http`] if the HTTP client cannot be constructed.
    pub fn new(auth: Arc<TokenProvider>, settings: &TransportSettings) -> Result<Self, GcpError> {
        Self::with_base_url(auth, settings, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`GcpError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        auth: Arc<TokenProvider>,
        settings: &TransportSettings,
        base_url: &str,
    ) -> Result<Self, GcpError> {
        Ok(Self {
            transport: Transport::new(auth, settings)?,
            base_url: normalise_base_url(base_url)?,
        })
    }

    /// Downloads the contents of `gs://{bucket}/{object}`.
    ///
    /// # Errors
    ///
    /// Returns [`GcpError::Api`] (usually 404 or 403) if the object cannot be
    /// read, or transport errors after retries.
    pub async fn download(&self, bucket: &str, object: &str) -> Result<Vec<u8>, GcpError> {
        let mut url = self.base_url.clone();
        // Object names may contain '/', which must be a single encoded segment.
        url.path_segments_mut()
            .map_err(|()| GcpError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["b", bucket, "o", object]);
        url.query_pairs_mut().append_pair("alt", "media");

        let context = format!("download(gs://{bucket}/{object})");
        let bytes = self
            .transport
            .execute(&context, |client| client.get(url.clone()))
            .await?;
        tracing::debug!(bucket, object, bytes = bytes.len(), "downloaded object");
        Ok(bytes)
    }
}
