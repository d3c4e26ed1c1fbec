//! Product lookup client
//!
//! One-shot search against the RapidAPI real-time Amazon data endpoint.
//! Transport and decode failures surface as a typed error; the caller
//! renders the user-visible message from it.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default search endpoint host
pub const DEFAULT_HOST: &str = "real-time-amazon-data.p.rapidapi.com";

/// How many results a search returns at most
const MAX_RESULTS: usize = 3;

/// Why a product search failed
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("product search request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("product search returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("could not decode product search response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// One search hit, fields passed through verbatim from the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductResult {
    #[serde(rename = "product_title")]
    pub title: Option<String>,
    #[serde(rename = "product_price")]
    pub price: Option<String>,
    #[serde(rename = "product_url")]
    pub url: Option<String>,
    pub sales_volume: Option<String>,
}

/// Client for the product search endpoint
#[derive(Clone)]
pub struct ProductLookupClient {
    client: Client,
    base_url: String,
    host: String,
    api_key: String,
}

impl std::fmt::Debug for ProductLookupClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductLookupClient")
            .field("client", &"<reqwest::Client>")
            .field("base_url", &self.base_url)
            .field("host", &self.host)
            .field("api_key", &"<masked>")
            .finish()
    }
}

impl ProductLookupClient {
    /// Create a new lookup client for the default RapidAPI host
    pub fn new(api_key: String) -> Self {
        Self::with_host(api_key, DEFAULT_HOST.to_string())
    }

    /// Create a new lookup client for a specific RapidAPI host
    pub fn with_host(api_key: String, host: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: format!("https://{}", host),
            host,
            api_key,
        }
    }

    /// Point the client at a different base URL (stub servers in tests)
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Search the marketplace for a product name. Returns up to three
    /// results in the order the endpoint supplied them; an empty list means
    /// no hits.
    pub async fn search(&self, product_name: &str) -> Result<Vec<ProductResult>, LookupError> {
        let url = format!("{}/search", self.base_url);

        debug!("Searching marketplace for {:?}", product_name);

        let response = self
            .client
            .get(&url)
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", &self.host)
            .query(&[
                ("query", product_name),
                ("page", "1"),
                ("country", "US"),
                ("sort_by", "RELEVANCE"),
                ("product_condition", "ALL"),
                ("is_prime", "True"),
                ("deals_and_discounts", "NONE"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::Status { status, body });
        }

        let body = response.text().await?;
        let value: serde_json::Value = serde_json::from_str(&body)?;

        let products = value
            .get("data")
            .and_then(|d| d.get("products"))
            .and_then(|p| p.as_array())
            .cloned()
            .unwrap_or_default();

        let results = products
            .into_iter()
            .take(MAX_RESULTS)
            .map(serde_json::from_value)
            .collect::<Result<Vec<ProductResult>, _>>()?;

        debug!("Search for {:?} returned {} results", product_name, results.len());

        Ok(results)
    }
}

/// Render search results the way they are shown to the user
pub fn format_results(results: &[ProductResult]) -> String {
    results
        .iter()
        .map(|p| {
            format!(
                "Product: {}\nPrice: {}\nSales Volume: {}\nURL: {}\n",
                p.title.as_deref().unwrap_or("n/a"),
                p.price.as_deref().unwrap_or("n/a"),
                p.sales_volume.as_deref().unwrap_or("n/a"),
                p.url.as_deref().unwrap_or("n/a"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
