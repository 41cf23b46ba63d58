//! Turns a classified intent into the command text written back to the server.
//!
//! Dispatch never fails: adapter errors become an in-chat error message carrying the
//! intent's usual prefix, and a bad URL batch is dropped with a log line.

use std::{future::Future, time::Duration};

use crate::{
    errors::Error,
    intent::{Intent, RuleId},
    ports::Adapters,
    Result,
};

pub const HANGOUT_COMMAND: &str = "@dolist me={gautoreturn on;hangout}\n";
pub const HOME_COMMAND: &str = "@dolist me={gautoreturn off;home}\n";
pub const URL_TRIGGER_COMMAND: &str = "@trigger me/TRIGGER_LAST_URL\n";

const WEATHER_MARKER: &str = "W";
const TRANSLATE_MARKER: &str = "T";
const STOCK_MARKER: &str = "S";

pub struct Dispatcher {
    adapters: Adapters,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(adapters: Adapters, timeout: Duration) -> Self {
        Self { adapters, timeout }
    }

    /// Run the handler for `intent`. An empty string means "nothing to send".
    pub async fn dispatch(&self, intent: &Intent) -> String {
        let caps = &intent.captures;
        match intent.rule {
            RuleId::UrlBatch => match self.shorten_urls(&intent.speaker, caps).await {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::error!(speaker = %intent.speaker, "url batch aborted: {e}");
                    String::new()
                }
            },
            RuleId::Hangout => HANGOUT_COMMAND.to_string(),
            RuleId::Home => HOME_COMMAND.to_string(),
            RuleId::Translate => {
                let [source, target, text] = caps.as_slice() else {
                    return String::new();
                };
                let res = self
                    .bounded(self.adapters.translator.translate(source, target, text))
                    .await;
                pose(TRANSLATE_MARKER, res, "Error: translation failed.")
            }
            RuleId::Weather => {
                let [query] = caps.as_slice() else {
                    return String::new();
                };
                let res = self
                    .bounded(self.adapters.weather.lookup_weather(query))
                    .await;
                pose(WEATHER_MARKER, res, "Error: weather api call failed.")
            }
            RuleId::Stock => {
                let [query] = caps.as_slice() else {
                    return String::new();
                };
                let res = self.bounded(self.adapters.stocks.lookup_stock(query)).await;
                pose(STOCK_MARKER, res, "Error: stock quote api call failed.")
            }
        }
    }

    async fn shorten_urls(&self, speaker: &str, urls: &[String]) -> Result<String> {
        let long_urls = urls
            .iter()
            .map(|raw| absolute_url(raw))
            .collect::<Result<Vec<_>>>()?;

        let mut out = String::new();
        for long_url in &long_urls {
            match self.bounded(self.adapters.shortener.shorten(long_url)).await {
                Ok(short) if !short.trim().is_empty() => {
                    out.push_str(&format!("add_url {speaker} {} {long_url}\n", short.trim()));
                    out.push_str(URL_TRIGGER_COMMAND);
                }
                Ok(_) => tracing::warn!(url = %long_url, "shortener returned an empty url"),
                Err(e) => tracing::warn!(url = %long_url, "shortening failed: {e}"),
            }
        }
        Ok(out)
    }

    async fn bounded<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| Error::Timeout(self.timeout))?
    }
}

/// Give scheme-less `www.` links an explicit scheme and check the result is well formed.
pub fn absolute_url(raw: &str) -> Result<String> {
    let long_url = if raw.to_ascii_lowercase().starts_with("www") {
        format!("http://{raw}")
    } else {
        raw.to_string()
    };

    check_url(&long_url).map_err(|reason| Error::InvalidUrl {
        url: long_url.clone(),
        reason: reason.to_string(),
    })?;

    Ok(long_url)
}

/// Lenient well-formedness check. Empty hosts, bare schemes and out-of-range ports
/// pass; control characters, broken percent-escapes outside the query, an unclosed
/// IPv6 bracket and a non-numeric port do not.
fn check_url(url: &str) -> std::result::Result<(), &'static str> {
    if url.bytes().any(|b| b < 0x20 || b == 0x7f) {
        return Err("invalid control character in url");
    }

    let (rest, fragment) = url.split_once('#').unwrap_or((url, ""));
    let (rest, _query) = rest.split_once('?').unwrap_or((rest, ""));
    if !valid_escapes(rest) || !valid_escapes(fragment) {
        return Err("invalid percent-escape");
    }

    let Some((_scheme, rest)) = rest.split_once(':') else {
        return Err("missing scheme");
    };
    let Some(rest) = rest.strip_prefix("//") else {
        return Ok(());
    };
    let authority = rest.split_once('/').map_or(rest, |(a, _)| a);
    let host = authority.rsplit_once('@').map_or(authority, |(_, h)| h);

    let port = if let Some(bracketed) = host.strip_prefix('[') {
        let Some((_, after)) = bracketed.split_once(']') else {
            return Err("missing ']' in host");
        };
        if after.is_empty() {
            return Ok(());
        }
        after.strip_prefix(':').ok_or("invalid port after host")?
    } else {
        match host.rsplit_once(':') {
            Some((_, port)) => port,
            None => return Ok(()),
        }
    };

    if port.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err("invalid port")
    }
}

fn valid_escapes(s: &str) -> bool {
    s.split('%')
        .skip(1)
        .all(|tail| tail.len() >= 2 && tail.as_bytes()[..2].iter().all(u8::is_ascii_hexdigit))
}

fn pose(marker: &str, res: Result<String>, fallback: &str) -> String {
    let text = match res {
        Ok(text) => text.trim_end_matches(['\r', '\n']).to_string(),
        Err(e) => {
            tracing::warn!(marker, "adapter call failed: {e}");
            fallback.to_string()
        }
    };
    format!("pose {marker}> {text}\n")
}
