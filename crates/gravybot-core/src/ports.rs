use std::{io, sync::Arc};

use async_trait::async_trait;

use crate::Result;

/// Byte-read primitive consumed by the line assembler.
///
/// `Ok(0)` means "nothing available yet" and is retried. End of stream is reported as
/// an error of kind [`io::ErrorKind::UnexpectedEof`].
#[async_trait]
pub trait ByteSource: Send {
    async fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// URL shortening service (Yirp today).
#[async_trait]
pub trait UrlShortener: Send + Sync {
    async fn shorten(&self, long_url: &str) -> Result<String>;
}

/// Current-conditions weather lookup.
#[async_trait]
pub trait WeatherLookup: Send + Sync {
    async fn lookup_weather(&self, query: &str) -> Result<String>;
}

/// Machine translation.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, source_lang: &str, target_lang: &str, text: &str) -> Result<String>;
}

/// Stock quote lookup by ticker or company name.
#[async_trait]
pub trait StockQuotes: Send + Sync {
    async fn lookup_stock(&self, query: &str) -> Result<String>;
}

/// The set of adapters handed to the dispatcher.
#[derive(Clone)]
pub struct Adapters {
    pub shortener: Arc<dyn UrlShortener>,
    pub weather: Arc<dyn WeatherLookup>,
    pub translator: Arc<dyn Translator>,
    pub stocks: Arc<dyn StockQuotes>,
}
