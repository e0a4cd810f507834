//! Read-only retrieval of pinned content through public gateways
//!
//! Gateways are tried strictly in order, one at a time, and the first
//! successful response wins. Nothing is remembered between calls: a
//! gateway that failed last time is still tried first next time.

use std::fmt;

use bytes::Bytes;
use reqwest::Client;
use url::Url;

use crate::identifier::ContentId;

/// Gateways used when none are configured, in the order they are tried
pub const DEFAULT_GATEWAYS: [&str; 3] = [
    "https://ipfs.io",
    "https://gateway.pinata.cloud",
    "https://cloudflare-ipfs.com",
];

/// One failed request against one gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayAttempt {
    pub url: Url,
    pub reason: String,
}

impl fmt::Display for GatewayAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.url, self.reason)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("no gateways configured")]
    NoGateways,
    #[error("invalid gateway url {0:?}: {1}")]
    InvalidUrl(String, url::ParseError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("failed to fetch from every gateway: {}", display_attempts(.attempts))]
    Unavailable { attempts: Vec<GatewayAttempt> },
}

fn display_attempts(attempts: &[GatewayAttempt]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone)]
pub struct GatewayFetcher {
    gateways: Vec<Url>,
    client: Client,
}

impl GatewayFetcher {
    pub fn new(gateways: Vec<Url>) -> Result<Self, GatewayError> {
        let client = Client::builder().build().map_err(GatewayError::Client)?;
        Self::with_client(gateways, client)
    }

    pub fn with_client(gateways: Vec<Url>, client: Client) -> Result<Self, GatewayError> {
        if gateways.is_empty() {
            return Err(GatewayError::NoGateways);
        }
        Ok(Self { gateways, client })
    }

    /// Parse gateway base URLs, keeping their order
    pub fn from_urls<S: AsRef<str>>(gateways: &[S]) -> Result<Self, GatewayError> {
        let gateways = gateways
            .iter()
            .map(|g| {
                Url::parse(g.as_ref())
                    .map_err(|e| GatewayError::InvalidUrl(g.as_ref().to_string(), e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(gateways)
    }

    pub fn defaults() -> Result<Self, GatewayError> {
        Self::from_urls(&DEFAULT_GATEWAYS)
    }

    pub fn gateways(&self) -> &[Url] {
        &self.gateways
    }

    /// Fetch the bytes pinned under `cid`
    ///
    /// Returns the body from the first gateway that answers with a
    /// success status. Later gateways are not contacted once one succeeds.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Unavailable`] listing every gateway's failure, in
    /// the order they were tried, if none of them succeeded.
    pub async fn fetch(&self, cid: &ContentId) -> Result<Bytes, GatewayError> {
        self.fetch_literal(cid.as_str()).await
    }

    /// [`GatewayFetcher::fetch`] for an identifier that is not known to be a CID
    ///
    /// `identifier` is escaped into a single path segment, so whatever it
    /// contains the request stays under `/ipfs/` and a gateway decides
    /// whether it names anything.
    pub async fn fetch_literal(&self, identifier: &str) -> Result<Bytes, GatewayError> {
        let mut attempts = Vec::with_capacity(self.gateways.len());

        for base in &self.gateways {
            let url = match object_url(base, identifier) {
                Ok(url) => url,
                Err(e) => {
                    attempts.push(GatewayAttempt {
                        url: base.clone(),
                        reason: format!("invalid object url: {e}"),
                    });
                    continue;
                }
            };

            tracing::debug!(%url, "trying gateway");
            match self.try_gateway(&url).await {
                Ok(body) => {
                    tracing::debug!(%url, bytes = body.len(), "fetched from gateway");
                    return Ok(body);
                }
                Err(reason) => {
                    tracing::warn!(%url, %reason, "gateway failed");
                    attempts.push(GatewayAttempt { url, reason });
                }
            }
        }

        Err(GatewayError::Unavailable { attempts })
    }

    async fn try_gateway(&self, url: &Url) -> Result<Bytes, String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP status {status}"));
        }

        response.bytes().await.map_err(|e| e.to_string())
    }
}

fn object_url(base: &Url, identifier: &str) -> Result<Url, String> {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|_| format!("{base} cannot be a base url"))?
        .pop_if_empty()
        .push("ipfs")
        .push(identifier);
    Ok(url)
}
