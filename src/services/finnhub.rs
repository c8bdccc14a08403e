use async_trait::async_trait;
use isahc::{config::Configurable, prelude::*, HttpClient};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug)]
pub enum FinnhubError {
    Http(isahc::Error),
    Serialization(serde_json::Error),
    RateLimit,
    InvalidResponse(String),
}

impl From<isahc::Error> for FinnhubError {
    fn from(error: isahc::Error) -> Self {
        FinnhubError::Http(error)
    }
}

impl From<serde_json::Error> for FinnhubError {
    fn from(error: serde_json::Error) -> Self {
        FinnhubError::Serialization(error)
    }
}

impl std::fmt::Display for FinnhubError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinnhubError::Http(e) => write!(f, "HTTP error: {}", e),
            FinnhubError::Serialization(e) => write!(f, "Serialization error: {}", e),
            FinnhubError::RateLimit => write!(f, "Rate limit exceeded"),
            FinnhubError::InvalidResponse(s) => write!(f, "Invalid response: {}", s),
        }
    }
}

impl std::error::Error for FinnhubError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FinnhubError::Http(e) => Some(e),
            FinnhubError::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

/// Latest quote for a symbol. Finnhub uses terse field names and omits or
/// nulls fields outside trading hours, so everything is optional here.
#[derive(Debug, Clone, Deserialize)]
pub struct Quote {
    #[serde(rename = "c")]
    pub current_price: Option<f64>,
    #[serde(rename = "d")]
    pub change: Option<f64>,
    #[serde(rename = "dp")]
    pub change_percent: Option<f64>,
    #[serde(rename = "h")]
    pub high: Option<f64>,
    #[serde(rename = "l")]
    pub low: Option<f64>,
    #[serde(rename = "o")]
    pub open: Option<f64>,
    #[serde(rename = "pc")]
    pub previous_close: Option<f64>,
    #[serde(rename = "v", default)]
    pub volume: Option<u64>,
}

/// Company profile subset used by the heatmap.
#[derive(Debug, Clone, Deserialize)]
pub struct CompanyProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "marketCapitalization", default)]
    pub market_cap: Option<f64>,
}

/// The two upstream calls the fetcher needs per symbol. Kept behind a trait
/// so refresh logic can be exercised without network access.
#[async_trait]
pub trait QuoteApi: Send + Sync {
    async fn quote(&self, symbol: &str) -> Result<Quote, FinnhubError>;
    async fn profile(&self, symbol: &str) -> Result<CompanyProfile, FinnhubError>;
}

pub struct FinnhubClient {
    client: HttpClient,
    base_url: String,
    token: String,
}

impl FinnhubClient {
    pub fn new(token: &str, timeout: Duration) -> Result<Self, FinnhubError> {
        let client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: "https://finnhub.io/api/v1".to_string(),
            token: token.to_string(),
        })
    }

    /// Point the client at a different server, for tests and proxies
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        symbol: &str,
    ) -> Result<T, FinnhubError> {
        let url = format!(
            "{}/{}?symbol={}&token={}",
            self.base_url, path, symbol, self.token
        );

        debug!(endpoint = path, symbol = symbol, "Upstream request");
        let mut response = self.client.get_async(url.as_str()).await?;
        let status = response.status();

        if status.as_u16() == 429 {
            return Err(FinnhubError::RateLimit);
        }
        if !status.is_success() {
            return Err(FinnhubError::InvalidResponse(format!(
                "{} returned HTTP {}",
                path,
                status.as_u16()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| FinnhubError::InvalidResponse(format!("Body read error: {}", e)))?;

        serde_json::from_str(&text).map_err(FinnhubError::from)
    }
}

#[async_trait]
impl QuoteApi for FinnhubClient {
    async fn quote(&self, symbol: &str) -> Result<Quote, FinnhubError> {
        self.get_json("quote", symbol).await
    }

    async fn profile(&self, symbol: &str) -> Result<CompanyProfile, FinnhubError> {
        self.get_json("stock/profile2", symbol).await
    }
}
