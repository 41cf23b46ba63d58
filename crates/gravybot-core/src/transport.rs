//! TCP transport and telnet decoding.
//!
//! The MUSH speaks telnet. We never negotiate options; the decoder only strips
//! negotiation traffic so the line assembler sees payload bytes. Outbound text is
//! UTF-8 and can never contain `0xFF`, so writes need no escaping.

use std::{io, time::Duration};

use async_trait::async_trait;
use tokio::{
    io::{AsyncRead, AsyncReadExt, BufReader},
    net::TcpStream,
};

use crate::{errors::Error, ports::ByteSource, Result};

const IAC: u8 = 255;
const DONT: u8 = 254;
const WILL: u8 = 251;
const SB: u8 = 250;
const SE: u8 = 240;

/// Connect to the chat server, bounded by `timeout`.
pub async fn connect(addr: &str, timeout: Duration) -> Result<TcpStream> {
    let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| Error::Timeout(timeout))??;
    stream.set_nodelay(true)?;
    Ok(stream)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum DecodeState {
    #[default]
    Data,
    Iac,
    Negotiate,
    Sub,
    SubIac,
}

/// Byte-at-a-time telnet decoder.
#[derive(Clone, Debug, Default)]
pub struct TelnetDecoder {
    state: DecodeState,
}

impl TelnetDecoder {
    /// Feed one raw byte; returns the payload byte it produced, if any.
    pub fn feed(&mut self, b: u8) -> Option<u8> {
        use DecodeState::*;

        let (next, out) = match (self.state, b) {
            (Data, IAC) => (Iac, None),
            (Data, _) => (Data, Some(b)),
            (Iac, IAC) => (Data, Some(IAC)),
            (Iac, WILL..=DONT) => (Negotiate, None),
            (Iac, SB) => (Sub, None),
            (Iac, _) => (Data, None),
            (Negotiate, _) => (Data, None),
            (Sub, IAC) => (SubIac, None),
            (Sub, _) => (Sub, None),
            (SubIac, SE) => (Data, None),
            (SubIac, _) => (Sub, None),
        };
        self.state = next;
        out
    }
}

/// [`ByteSource`] over a raw telnet stream.
///
/// Reads one raw byte per call. A byte consumed by negotiation yields `Ok(0)`.
pub struct TelnetReader<R> {
    inner: BufReader<R>,
    decoder: TelnetDecoder,
}

impl<R: AsyncRead + Unpin + Send> TelnetReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
            decoder: TelnetDecoder::default(),
        }
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> ByteSource for TelnetReader<R> {
    async fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let mut raw = [0u8; 1];
        if self.inner.read(&mut raw).await? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "telnet stream closed",
            ));
        }

        match self.decoder.feed(raw[0]) {
            Some(b) => {
                buf[0] = b;
                Ok(1)
            }
            None => Ok(0),
        }
    }
}
