use std::{env, fs, path::Path, time::Duration};

use crate::{errors::Error, Result};

pub const DEFAULT_SERVER_ADDR: &str = "dino.surly.org:6250";
pub const DEFAULT_YIRP_API_ADDR: &str = "https://api.yirp.org/v1/shorten";
pub const DEFAULT_TRIGGER: &str = "Gravybot";

/// Typed configuration, built once at startup and passed by reference.
#[derive(Clone, Debug)]
pub struct Config {
    // Session
    pub server_addr: String,
    pub credentials: Credentials,
    pub trigger: String,

    // Adapters
    pub yirp_api_addr: String,
    pub yirp_api_key: String,
    pub weather_api_key: String,
    pub finnhub_api_key: String,

    // Timeouts
    pub connect_timeout: Duration,
    pub adapter_timeout: Duration,
}

/// Login pair sent once at session start.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<password>")
            .finish()
    }
}

impl Config {
    /// Load from the process environment (after applying `.env` if present).
    ///
    /// `.env` values are written into the process environment, so call this before
    /// any other thread (including an async runtime's workers) is started.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_vars(env_str)
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let username = get("BOT_USERNAME").and_then(non_empty).ok_or_else(|| {
            Error::Config("BOT_USERNAME environment variable is required".to_string())
        })?;
        let password = get("BOT_PASSWORD").and_then(non_empty).ok_or_else(|| {
            Error::Config("BOT_PASSWORD environment variable is required".to_string())
        })?;

        let server_addr = get("GRAVYBOT_SERVER")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string());
        let trigger = get("BOT_TRIGGER")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_TRIGGER.to_string());

        let yirp_api_addr = get("YIRP_API_ADDR")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_YIRP_API_ADDR.to_string());
        let yirp_api_key = get("YIRP_APIKEY").unwrap_or_default();
        let weather_api_key = get("WEATHER_APIKEY").unwrap_or_default();
        let finnhub_api_key = get("FINNHUB_APIKEY").unwrap_or_default();

        let connect_timeout =
            Duration::from_millis(parse_u64(get("CONNECT_TIMEOUT_MS")).unwrap_or(30_000));
        let adapter_timeout =
            Duration::from_millis(parse_u64(get("ADAPTER_TIMEOUT_MS")).unwrap_or(10_000));

        if adapter_timeout.is_zero() {
            return Err(Error::Config(
                "ADAPTER_TIMEOUT_MS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            server_addr,
            credentials: Credentials { username, password },
            trigger,
            yirp_api_addr,
            yirp_api_key,
            weather_api_key,
            finnhub_api_key,
            connect_timeout,
            adapter_timeout,
        })
    }

    /// Names of adapter keys that are unset. Lookups still run; the upstream API rejects them.
    pub fn missing_api_keys(&self) -> Vec<&'static str> {
        [
            ("YIRP_APIKEY", &self.yirp_api_key),
            ("WEATHER_APIKEY", &self.weather_api_key),
            ("FINNHUB_APIKEY", &self.finnhub_api_key),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect()
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn parse_u64(v: Option<String>) -> Option<u64> {
    v.and_then(|s| s.trim().parse::<u64>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
