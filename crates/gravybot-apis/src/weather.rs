//! WeatherAPI.com current conditions.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use gravybot_core::{ports::WeatherLookup, Result};

use crate::{decode_json, request_error};

const CURRENT_URL: &str = "https://api.weatherapi.com/v1/current.json";

#[derive(Debug, Deserialize)]
pub struct CurrentWeather {
    pub location: Location,
    pub current: Conditions,
}

#[derive(Debug, Deserialize)]
pub struct Location {
    pub name: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Deserialize)]
pub struct Conditions {
    pub temp_c: f64,
    pub temp_f: f64,
    pub condition: Condition,
    pub wind_mph: f64,
    pub wind_kph: f64,
    #[serde(default)]
    pub wind_dir: String,
    pub humidity: f64,
}

#[derive(Debug, Deserialize)]
pub struct Condition {
    pub text: String,
}

/// One-line report. US locations get imperial units and the state; everything else
/// gets metric and the country. `%%` is the MUSH escape for a literal percent sign.
pub fn format_report(w: &CurrentWeather) -> String {
    let loc = &w.location;
    let cur = &w.current;
    let is_us =
        loc.country.starts_with("United States of America") || loc.country.starts_with("USA");

    if is_us {
        format!(
            "{}, {}: {} {:.1}F {:.1}%% {:.1}mph {}",
            loc.name,
            loc.region,
            cur.condition.text,
            cur.temp_f,
            cur.humidity,
            cur.wind_mph,
            cur.wind_dir
        )
    } else {
        format!(
            "{}, {}: {} {:.1}C {:.1}%% {:.1}kph {}",
            loc.name,
            loc.country,
            cur.condition.text,
            cur.temp_c,
            cur.humidity,
            cur.wind_kph,
            cur.wind_dir
        )
    }
}

#[derive(Clone, Debug)]
pub struct WeatherApiClient {
    api_key: String,
    http: reqwest::Client,
}

impl WeatherApiClient {
    pub fn new(api_key: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            api_key: api_key.into(),
            http,
        }
    }
}

#[async_trait]
impl WeatherLookup for WeatherApiClient {
    async fn lookup_weather(&self, query: &str) -> Result<String> {
        let resp = self
            .http
            .get(CURRENT_URL)
            .query(&[("key", self.api_key.as_str()), ("q", query), ("aqi", "no")])
            .send()
            .await
            .map_err(|e| request_error("weather", e))?;

        let status = resp.status();
        if status == StatusCode::BAD_REQUEST {
            return Ok(format!(
                "Weather error: {query} not found. Try using a city state or city country pair."
            ));
        }
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "weather api error");
            return Ok(format!(
                "Weather error: API returned code: {}",
                status.as_u16()
            ));
        }

        let body: CurrentWeather = decode_json("weather", resp).await?;

        Ok(format_report(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(country: &str) -> CurrentWeather {
        serde_json::from_value(json!({
            "location": {"name": "Austin", "region": "Texas", "country": country, "lat": 30.27, "lon": -97.74},
            "current": {
                "last_updated": "2026-10-16 12:00",
                "temp_c": 32.8, "temp_f": 91.0,
                "condition": {"text": "Sunny"},
                "wind_mph": 5.0, "wind_kph": 8.0, "wind_dir": "S",
                "humidity": 40
            }
        }))
        .unwrap()
    }

    #[test]
    fn us_locations_use_imperial_units() {
        assert_eq!(
            format_report(&sample("United States of America")),
            "Austin, Texas: Sunny 91.0F 40.0%% 5.0mph S"
        );
    }

    #[test]
    fn other_locations_use_metric_and_country() {
        assert_eq!(
            format_report(&sample("Mexico")),
            "Austin, Mexico: Sunny 32.8C 40.0%% 8.0kph S"
        );
    }

    #[test]
    fn missing_current_block_is_a_json_error() {
        let res = crate::decode_body::<CurrentWeather>(br#"{"location": {"name": "Nowhere"}}"#);
        assert!(matches!(res, Err(gravybot_core::Error::Json(_))));
    }
}
