//! Line framing for streamed HTTP bodies
//!
//! Both network backends receive newline-delimited records split arbitrarily
//! across TCP chunks. Bytes are buffered until a full line is available, so a
//! multi-byte character cut in half by a chunk boundary is reassembled before
//! UTF-8 decoding.

use super::{BackendError, TokenStream};
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::VecDeque;
use std::fmt::Display;

/// What a backend-specific parser made of one line
#[derive(Debug)]
pub(super) enum LineOutcome {
    /// A text fragment to hand to the consumer
    Fragment(String),
    /// Keep-alives, role-only chunks, `event:` lines
    Skip,
    /// The backend signalled completion
    Done,
    /// The backend reported an error in-band
    Fail(BackendError),
}

struct Framer {
    bytes: BoxStream<'static, Result<Bytes, String>>,
    buffer: Vec<u8>,
    pending: VecDeque<Result<String, BackendError>>,
    finished: bool,
    parse: fn(&str) -> LineOutcome,
}

impl Framer {
    /// Drain every complete line currently in the buffer
    fn take_lines(&mut self) {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.handle_line(&line);
            if self.finished {
                self.buffer.clear();
                return;
            }
        }
    }

    fn handle_line(&mut self, raw: &[u8]) {
        let line = match std::str::from_utf8(raw) {
            Ok(line) => line.trim(),
            Err(e) => {
                self.fail(BackendError::Decode(e.to_string()));
                return;
            }
        };
        if line.is_empty() {
            return;
        }

        match (self.parse)(line) {
            LineOutcome::Fragment(text) => {
                if !text.is_empty() {
                    self.pending.push_back(Ok(text));
                }
            }
            LineOutcome::Skip => {}
            LineOutcome::Done => self.finished = true,
            LineOutcome::Fail(err) => self.fail(err),
        }
    }

    fn fail(&mut self, err: BackendError) {
        self.pending.push_back(Err(err));
        self.finished = true;
    }
}

/// Turn a chunked byte stream into a fragment stream using `parse` per line
pub(super) fn frame_lines<S, E>(bytes: S, parse: fn(&str) -> LineOutcome) -> TokenStream
where
    S: futures::Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display,
{
    let framer = Framer {
        bytes: bytes.map(|chunk| chunk.map_err(|e| e.to_string())).boxed(),
        buffer: Vec::new(),
        pending: VecDeque::new(),
        finished: false,
        parse,
    };

    stream::unfold(framer, |mut framer| async move {
        loop {
            if let Some(item) = framer.pending.pop_front() {
                return Some((item, framer));
            }
            if framer.finished {
                return None;
            }

            match framer.bytes.next().await {
                Some(Ok(chunk)) => {
                    framer.buffer.extend_from_slice(&chunk);
                    framer.take_lines();
                }
                Some(Err(e)) => {
                    framer.fail(BackendError::Transport(e));
                }
                None => {
                    // Body ended without a trailing newline
                    if !framer.buffer.is_empty() {
                        let rest = std::mem::take(&mut framer.buffer);
                        framer.handle_line(&rest);
                    }
                    framer.finished = true;
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_parse(line: &str) -> LineOutcome {
        match line {
            "END" => LineOutcome::Done,
            "BOOM" => LineOutcome::Fail(BackendError::Remote("boom".to_string())),
            "ping" => LineOutcome::Skip,
            other => LineOutcome::Fragment(other.to_string()),
        }
    }

    fn chunks(parts: &[&'static [u8]]) -> impl futures::Stream<Item = Result<Bytes, String>> {
        stream::iter(
            parts
                .iter()
                .map(|p| Ok(Bytes::from_static(p)))
                .collect::<Vec<_>>(),
        )
    }

    async fn collect(stream: TokenStream) -> Vec<Result<String, String>> {
        stream
            .map(|item| item.map_err(|e| e.to_string()))
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_lines_split_across_chunks() {
        let out = collect(frame_lines(chunks(&[b"al", b"pha\nbe", b"ta\n"]), echo_parse)).await;
        assert_eq!(out, vec![Ok("alpha".to_string()), Ok("beta".to_string())]);
    }

    #[tokio::test]
    async fn test_multibyte_char_split_across_chunks() {
        // "é" is 0xC3 0xA9
        let out = collect(frame_lines(chunks(&[b"caf\xC3", b"\xA9\n"]), echo_parse)).await;
        assert_eq!(out, vec![Ok("café".to_string())]);
    }

    #[tokio::test]
    async fn test_done_stops_reading() {
        let out = collect(frame_lines(chunks(&[b"a\nEND\nb\n"]), echo_parse)).await;
        assert_eq!(out, vec![Ok("a".to_string())]);
    }

    #[tokio::test]
    async fn test_in_band_failure_is_terminal() {
        let out = collect(frame_lines(chunks(&[b"a\nping\nBOOM\nb\n"]), echo_parse)).await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], Ok("a".to_string()));
        assert!(out[1].is_err());
    }

    #[tokio::test]
    async fn test_transport_error_after_fragments() {
        let bytes = stream::iter(vec![
            Ok(Bytes::from_static(b"Hel\n")),
            Err("connection reset".to_string()),
            Ok(Bytes::from_static(b"never\n")),
        ]);
        let out = collect(frame_lines(bytes, echo_parse)).await;
        assert_eq!(out[0], Ok("Hel".to_string()));
        assert_eq!(
            out[1],
            Err("stream interrupted: connection reset".to_string())
        );
        assert_eq!(out.len(), 2);
    }

    #[tokio::test]
    async fn test_trailing_line_without_newline() {
        let out = collect(frame_lines(chunks(&[b"last"]), echo_parse)).await;
        assert_eq!(out, vec![Ok("last".to_string())]);
    }
}
