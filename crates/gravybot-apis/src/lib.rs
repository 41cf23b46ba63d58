//! HTTP adapters for the bot's lookups.
//!
//! Each client implements one `gravybot-core` port. They share a single
//! `reqwest::Client` so every request carries the same timeout.

use std::{sync::Arc, time::Duration};

use serde::de::DeserializeOwned;

use gravybot_core::{config::Config, errors::Error, ports::Adapters, Result};

pub mod finnhub;
pub mod translate;
pub mod weather;
pub mod yirp;

pub use finnhub::FinnhubClient;
pub use translate::GoogleTranslateClient;
pub use weather::WeatherApiClient;
pub use yirp::YirpClient;

/// Shared HTTP client with a per-request timeout.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("gravybot/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::External(format!("http client build failed: {e}")))
}

/// Wire every port to its HTTP implementation.
pub fn http_adapters(cfg: &Config) -> Result<Adapters> {
    let http = http_client(cfg.adapter_timeout)?;

    Ok(Adapters {
        shortener: Arc::new(YirpClient::new(
            cfg.yirp_api_addr.clone(),
            cfg.yirp_api_key.clone(),
            http.clone(),
        )),
        weather: Arc::new(WeatherApiClient::new(cfg.weather_api_key.clone(), http.clone())),
        translator: Arc::new(GoogleTranslateClient::new(http.clone())),
        stocks: Arc::new(FinnhubClient::new(cfg.finnhub_api_key.clone(), http)),
    })
}

/// Map a transport-level reqwest failure.
pub(crate) fn request_error(api: &str, e: reqwest::Error) -> Error {
    if e.is_timeout() {
        return Error::External(format!("{api} request timed out: {e}"));
    }
    Error::External(format!("{api} request error: {e}"))
}

/// Read the whole body and decode it. Transport failures are `External`; a body that
/// does not fit `T` is `Json`.
pub(crate) async fn decode_json<T: DeserializeOwned>(
    api: &str,
    resp: reqwest::Response,
) -> Result<T> {
    let body = resp.bytes().await.map_err(|e| request_error(api, e))?;
    decode_body(&body)
}

pub(crate) fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize)]
    struct Short {
        short_url: String,
    }

    #[test]
    fn bodies_decode_into_the_expected_shape() {
        let body: Short = decode_body(br#"{"short_url": "https://yirp.org/abc"}"#).unwrap();
        assert_eq!(body.short_url, "https://yirp.org/abc");
    }

    #[test]
    fn malformed_bodies_are_json_errors() {
        assert!(matches!(
            decode_body::<Short>(b"<html>bad gateway</html>"),
            Err(Error::Json(_))
        ));
        assert!(matches!(
            decode_body::<Short>(br#"{"long_url": "x"}"#),
            Err(Error::Json(_))
        ));
    }
}
