//! Google Translate via the keyless `gtx` endpoint.

use async_trait::async_trait;
use serde_json::Value;

use gravybot_core::{errors::Error, ports::Translator, Result};

use crate::{decode_json, request_error};

const TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";

/// Pull the translated text out of the nested-array response.
///
/// The body looks like `[[["Bonjour. ","Hello. ",...],["Au revoir","Goodbye",...]],...]`;
/// the first element of each segment is the translation.
pub fn parse_translation(body: &Value) -> Result<String> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| Error::External("unable to parse translation response".to_string()))?;

    let text: String = segments
        .iter()
        .filter_map(|seg| seg.get(0).and_then(Value::as_str))
        .collect();

    if text.is_empty() {
        return Err(Error::External(
            "unable to parse translation response".to_string(),
        ));
    }
    Ok(text)
}

#[derive(Clone, Debug)]
pub struct GoogleTranslateClient {
    http: reqwest::Client,
}

impl GoogleTranslateClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Translator for GoogleTranslateClient {
    async fn translate(&self, source_lang: &str, target_lang: &str, text: &str) -> Result<String> {
        let resp = self
            .http
            .get(TRANSLATE_URL)
            .query(&[
                ("client", "gtx"),
                ("sl", source_lang),
                ("tl", target_lang),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| request_error("translate", e))?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "translate api error");
            return Ok(format!(
                "Translation error: API returned code: {}",
                status.as_u16()
            ));
        }

        let body: Value = decode_json("translate", resp).await?;

        parse_translation(&body)
    }
}
