//! Yirp URL shortener.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use gravybot_core::{errors::Error, ports::UrlShortener, Result};

use crate::{decode_json, request_error};

#[derive(Debug, Serialize)]
struct ShortenRequest<'a> {
    api_key: &'a str,
    long_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ShortenResponse {
    short_url: String,
}

#[derive(Clone, Debug)]
pub struct YirpClient {
    api_addr: String,
    api_key: String,
    http: reqwest::Client,
}

impl YirpClient {
    pub fn new(
        api_addr: impl Into<String>,
        api_key: impl Into<String>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            api_addr: api_addr.into(),
            api_key: api_key.into(),
            http,
        }
    }
}

#[async_trait]
impl UrlShortener for YirpClient {
    async fn shorten(&self, long_url: &str) -> Result<String> {
        tracing::info!(url = long_url, "shortening url");

        let resp = self
            .http
            .post(&self.api_addr)
            .json(&ShortenRequest {
                api_key: &self.api_key,
                long_url,
            })
            .send()
            .await
            .map_err(|e| request_error("yirp", e))?;

        let status = resp.status();
        tracing::info!(status = status.as_u16(), "yirp responded");
        if status != StatusCode::OK && status != StatusCode::CREATED {
            return Err(Error::External(format!(
                "Yirp error: URL API returned code: {}",
                status.as_u16()
            )));
        }

        let body: ShortenResponse = decode_json("yirp", resp).await?;
        tracing::debug!(short = %body.short_url, long = long_url, "url shortened");

        Ok(body.short_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_carries_key_and_long_url() {
        let req = ShortenRequest {
            api_key: "k",
            long_url: "http://www.example.org",
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"api_key": "k", "long_url": "http://www.example.org"})
        );
    }

    #[test]
    fn response_ignores_extra_fields() {
        let body: ShortenResponse = serde_json::from_value(json!({
            "short_url": "https://yirp.org/abc",
            "long_url": "http://www.example.org",
            "created_at": "2026-10-16T12:00:00Z"
        }))
        .unwrap();
        assert_eq!(body.short_url, "https://yirp.org/abc");
    }
}
