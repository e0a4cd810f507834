//! Persisting ciphertext into the storage network through a pinning service

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::identifier::ContentId;

/// Default pinning API endpoint
pub const DEFAULT_PINNING_API: &str = "https://api.pinata.cloud";
/// Content type of an uploaded blob: the payload is base64 ciphertext
pub const ENCRYPTED_BLOB_MIME: &str = "text/plain";

const PIN_FILE_PATH: &str = "pinning/pinFileToIPFS";

#[derive(Debug, thiserror::Error)]
pub enum PinningError {
    #[error("pinning request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid pinning url: {0}")]
    Url(#[from] url::ParseError),
    #[error("pinning service returned HTTP status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("pinning service response carried no content identifier: {body}")]
    MissingHash { body: String },
}

/// An encrypted file ready to be pinned
///
/// The blob itself is opaque ciphertext; the original name and MIME type
/// travel alongside it only as metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlob {
    pub file_name: String,
    pub original_type: String,
    pub ciphertext: String,
}

#[async_trait]
pub trait Pinner: Send + Sync + std::fmt::Debug + 'static {
    /// Pin `blob` and return the content identifier it was stored under
    async fn pin(&self, blob: &EncryptedBlob) -> Result<ContentId, PinningError>;
}

#[derive(Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: Option<String>,
}

/// Client for Pinata's `pinFileToIPFS` endpoint
#[derive(Clone)]
pub struct PinataClient {
    api_url: Url,
    jwt: String,
    client: Client,
}

impl std::fmt::Debug for PinataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinataClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl PinataClient {
    pub fn new(api_url: Url, jwt: impl Into<String>) -> Result<Self, PinningError> {
        Ok(Self {
            api_url,
            jwt: jwt.into(),
            client: Client::builder().build()?,
        })
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    fn endpoint(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!(
            "{}/{}",
            self.api_url.as_str().trim_end_matches('/'),
            PIN_FILE_PATH
        ))
    }
}

#[async_trait]
impl Pinner for PinataClient {
    async fn pin(&self, blob: &EncryptedBlob) -> Result<ContentId, PinningError> {
        let metadata = json!({
            "name": blob.file_name,
            "keyvalues": {
                "originalType": blob.original_type,
                "originalName": blob.file_name,
                "encrypted": "true",
            }
        });
        let options = json!({ "cidVersion": 1 });

        let file = Part::text(blob.ciphertext.clone())
            .file_name(blob.file_name.clone())
            .mime_str(ENCRYPTED_BLOB_MIME)?;
        let form = Form::new()
            .part("file", file)
            .text("pinataMetadata", metadata.to_string())
            .text("pinataOptions", options.to_string());

        let endpoint = self.endpoint()?;
        tracing::debug!(%endpoint, name = %blob.file_name, "pinning encrypted blob");

        let response = self
            .client
            .post(endpoint)
            .bearer_auth(&self.jwt)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(PinningError::Status { status, body });
        }

        let hash = serde_json::from_str::<PinResponse>(&body)
            .ok()
            .and_then(|r| r.ipfs_hash)
            .and_then(|h| ContentId::parse(&h).ok());

        match hash {
            Some(cid) => {
                tracing::info!(%cid, "pinned encrypted blob");
                Ok(cid)
            }
            None => Err(PinningError::MissingHash { body }),
        }
    }
}
