//! The single chat-server session: login, then read → classify → dispatch → write.

use std::io;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::{
    config::Credentials, dispatch::Dispatcher, errors::Error, intent::Classifier,
    line::LineAssembler, ports::ByteSource, Result,
};

/// Sentinel written after every input line.
pub const ACK: &str = "@@\n";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    LoggingIn,
    Streaming,
    Closed,
}

pub struct Session<S, W> {
    credentials: Credentials,
    source: S,
    sink: W,
    assembler: LineAssembler,
    classifier: Classifier,
    dispatcher: Dispatcher,
    state: SessionState,
}

impl<S, W> Session<S, W>
where
    S: ByteSource,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(
        credentials: Credentials,
        source: S,
        sink: W,
        classifier: Classifier,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            credentials,
            source,
            sink,
            assembler: LineAssembler::new(),
            classifier,
            dispatcher,
            state: SessionState::Connecting,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drive the session until the connection fails.
    ///
    /// Only returns with an error: [`Error::ConnectionClosed`] on end of stream,
    /// [`Error::Io`] on a read failure.
    pub async fn run(&mut self) -> Result<()> {
        self.state = SessionState::LoggingIn;
        self.login().await;

        self.state = SessionState::Streaming;
        let err = loop {
            match self.assembler.next_line(&mut self.source).await {
                Ok(Some(line)) => self.handle_line(&line).await,
                Ok(None) => break Error::ConnectionClosed,
                Err(e) => break Error::Io(e),
            }
        };

        self.state = SessionState::Closed;
        tracing::error!("session closed: {err}");
        Err(err)
    }

    async fn login(&mut self) {
        let user = &self.credentials.username;
        tracing::info!("connect {user} <password>");
        let line = format!("connect {user} {}\n", self.credentials.password);
        if let Err(e) = self.write_raw(&line).await {
            tracing::error!("login write failed: {e}");
        }
    }

    async fn handle_line(&mut self, line: &str) {
        tracing::info!("{line}");

        let reply = match self.classifier.classify(line) {
            Some(intent) => {
                tracing::debug!(rule = ?intent.rule, speaker = %intent.speaker, "intent matched");
                self.dispatcher.dispatch(&intent).await
            }
            None => String::new(),
        };

        self.send(ACK).await;
        if !reply.is_empty() {
            self.send(&reply).await;
        }
    }

    /// Write failures are logged only; a dead link surfaces on the next read.
    async fn send(&mut self, data: &str) {
        tracing::info!("{}", data.trim_end());
        if let Err(e) = self.write_raw(data).await {
            tracing::error!("write failed: {e}");
        }
    }

    async fn write_raw(&mut self, data: &str) -> io::Result<()> {
        self.sink.write_all(data.as_bytes()).await?;
        self.sink.flush().await
    }
}
