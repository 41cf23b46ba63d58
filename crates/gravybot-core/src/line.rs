//! Turns an unframed byte stream into trimmed lines.

use std::io;

use crate::ports::ByteSource;

pub const LINE_TERMINATOR: u8 = b'\n';

/// Accumulates bytes until a terminator is seen.
///
/// No maximum line length is enforced.
#[derive(Debug, Default)]
pub struct LineAssembler {
    buf: Vec<u8>,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read until the next `\n` and return the trimmed line.
    ///
    /// `Ok(None)` is end of stream; a partial line buffered at that point is dropped.
    pub async fn next_line<S>(&mut self, source: &mut S) -> io::Result<Option<String>>
    where
        S: ByteSource + ?Sized,
    {
        let mut byte = [0u8; 1];
        loop {
            let n = match source.read_bytes(&mut byte).await {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    if !self.buf.is_empty() {
                        tracing::debug!(
                            bytes = self.buf.len(),
                            "dropping unterminated line at end of stream"
                        );
                        self.buf.clear();
                    }
                    return Ok(None);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };

            if n == 0 {
                tracing::trace!("read 0 bytes; retrying");
                tokio::task::yield_now().await;
                continue;
            }

            self.buf.push(byte[0]);
            if byte[0] == LINE_TERMINATOR {
                let line = String::from_utf8_lossy(&self.buf).trim().to_string();
                self.buf.clear();
                return Ok(Some(line));
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;

    /// Scripted byte source: each step is delivered by one `read_bytes` call.
    pub(crate) struct ScriptedSource {
        steps: VecDeque<io::Result<Vec<u8>>>,
    }

    impl ScriptedSource {
        pub(crate) fn bytes(data: &[u8]) -> Self {
            Self {
                steps: data.iter().map(|&b| Ok(vec![b])).collect(),
            }
        }

        pub(crate) fn steps(steps: Vec<io::Result<Vec<u8>>>) -> Self {
            Self {
                steps: steps.into(),
            }
        }
    }

    #[async_trait]
    impl ByteSource for ScriptedSource {
        async fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.steps.pop_front() {
                None => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "script done")),
                Some(Err(e)) => Err(e),
                Some(Ok(chunk)) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    if n < chunk.len() {
                        self.steps.push_front(Ok(chunk[n..].to_vec()));
                    }
                    Ok(n)
                }
            }
        }
    }

    async fn collect(data: &[u8]) -> Vec<String> {
        let mut src = ScriptedSource::bytes(data);
        let mut asm = LineAssembler::new();
        let mut out = Vec::new();
        while let Some(line) = asm.next_line(&mut src).await.unwrap() {
            out.push(line);
        }
        out
    }

    #[tokio::test]
    async fn one_line_per_terminator_trimmed() {
        let lines = collect(b"  first line \r\nsecond\n\n\tthird\t\n").await;
        assert_eq!(lines, vec!["first line", "second", "", "third"]);
    }

    #[tokio::test]
    async fn trailing_fragment_is_dropped() {
        let lines = collect(b"complete\npartial with no end").await;
        assert_eq!(lines, vec!["complete"]);
    }

    #[tokio::test]
    async fn zero_byte_reads_are_retried() {
        let mut src = ScriptedSource::steps(vec![
            Ok(b"h".to_vec()),
            Ok(Vec::new()),
            Ok(Vec::new()),
            Ok(b"i".to_vec()),
            Err(io::Error::new(io::ErrorKind::Interrupted, "signal")),
            Ok(b"\n".to_vec()),
        ]);
        let mut asm = LineAssembler::new();
        assert_eq!(asm.next_line(&mut src).await.unwrap().as_deref(), Some("hi"));
        assert_eq!(asm.next_line(&mut src).await.unwrap(), None);
    }

    #[tokio::test]
    async fn read_errors_surface() {
        let mut src = ScriptedSource::steps(vec![
            Ok(b"x".to_vec()),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
        ]);
        let mut asm = LineAssembler::new();
        let err = asm.next_line(&mut src).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
    }

    #[tokio::test]
    async fn invalid_utf8_is_replaced_not_fatal() {
        let lines = collect(b"caf\xe9\n").await;
        assert_eq!(lines, vec!["caf\u{fffd}"]);
    }
}
