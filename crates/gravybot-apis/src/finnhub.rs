//! Finnhub stock quotes.
//!
//! Short single-word queries are taken as ticker symbols. Anything else is run
//! through symbol search first and the top hit is quoted.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use gravybot_core::{ports::StockQuotes, Result};

use crate::{decode_json, request_error};

const API_BASE: &str = "https://finnhub.io/api/v1";

#[derive(Debug, Default, Deserialize)]
pub struct Quote {
    /// Current price.
    #[serde(default)]
    pub c: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub result: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub description: String,
    pub symbol: String,
}

#[derive(Debug, Default, Deserialize)]
struct Profile {
    #[serde(default)]
    name: String,
}

pub fn looks_like_ticker(query: &str) -> bool {
    query.chars().count() <= 5 && !query.contains(' ')
}

pub fn format_quote(symbol: &str, company: &str, price: f64) -> String {
    format!("{symbol}({company}): ${price:.2}")
}

#[derive(Clone, Debug)]
pub struct FinnhubClient {
    api_key: String,
    http: reqwest::Client,
}

enum Fetched<T> {
    Body(T),
    Status(StatusCode),
}

impl FinnhubClient {
    pub fn new(api_key: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            api_key: api_key.into(),
            http,
        }
    }

    async fn get<T>(&self, path: &str, params: &[(&str, &str)]) -> Result<Fetched<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let resp = self
            .http
            .get(format!("{API_BASE}/{path}"))
            .query(params)
            .query(&[("token", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| request_error("finnhub", e))?;

        let status = resp.status();
        if status != StatusCode::OK {
            tracing::warn!(path, status = status.as_u16(), "finnhub api error");
            return Ok(Fetched::Status(status));
        }

        Ok(Fetched::Body(decode_json("finnhub", resp).await?))
    }

    async fn company_name(&self, symbol: &str) -> Option<String> {
        match self.get::<Profile>("stock/profile2", &[("symbol", symbol)]).await {
            Ok(Fetched::Body(p)) if !p.name.trim().is_empty() => Some(p.name),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(symbol, "profile lookup failed: {e}");
                None
            }
        }
    }
}

fn status_text(status: StatusCode) -> String {
    format!("Stock error: API returned code {}", status.as_u16())
}

#[async_trait]
impl StockQuotes for FinnhubClient {
    async fn lookup_stock(&self, query: &str) -> Result<String> {
        let query = query.trim();
        let mut symbol = query.to_uppercase();
        let mut company = None;

        if !looks_like_ticker(query) {
            let search = match self.get::<SearchResults>("search", &[("q", query)]).await? {
                Fetched::Body(s) => s,
                Fetched::Status(status) => return Ok(status_text(status)),
            };
            let Some(hit) = search.result.into_iter().next().filter(|_| search.count > 0) else {
                return Ok(format!("Stock error: no results found for '{query}'"));
            };
            tracing::debug!(symbol = %hit.symbol, "search hit");
            symbol = hit.symbol;
            company = Some(hit.description).filter(|d| !d.trim().is_empty());
        }

        let quote = match self.get::<Quote>("quote", &[("symbol", symbol.as_str())]).await? {
            Fetched::Body(q) => q,
            Fetched::Status(status) => return Ok(status_text(status)),
        };
        if quote.c == 0.0 {
            return Ok(format!("Stock error: no quote found for '{symbol}'"));
        }

        let company = match company {
            Some(c) => c,
            None => self
                .company_name(&symbol)
                .await
                .unwrap_or_else(|| symbol.clone()),
        };

        Ok(format_quote(&symbol, &company, quote.c))
    }
}
