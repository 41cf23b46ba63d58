//! Core of the MUSH chat bot: line assembly, intent classification, dispatch and
//! the session loop.
//!
//! This crate is intentionally HTTP-agnostic. The weather / translation / stock /
//! URL-shortening services live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod dispatch;
pub mod errors;
pub mod intent;
pub mod line;
pub mod logging;
pub mod ports;
pub mod session;
pub mod transport;

pub use errors::{Error, Result};
