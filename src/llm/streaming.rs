//! Streaming response handling

use std::pin::Pin;

use futures::Stream;
use futures::StreamExt;
use serde::Deserialize;

use crate::errors::DocChatError;
use crate::errors::Result;

/// Boxed stream of generated text pieces
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Streaming response from LLM
pub struct StreamingResponse {
    stream: TokenStream,
}

impl StreamingResponse {
    pub fn new(stream: TokenStream) -> Self {
        Self { stream }
    }

    /// Collect all chunks into a single string
    pub async fn collect_all(mut self) -> Result<String> {
        let mut result = String::new();
        while let Some(chunk) = self.stream.next().await {
            result.push_str(&chunk?);
        }
        Ok(result)
    }

    /// Get the underlying stream
    pub fn into_stream(self) -> TokenStream {
        self.stream
    }
}

#[derive(Deserialize)]
struct CompletionChunk {
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    delta: ChunkDelta,
}

#[derive(Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

/// Parse a single OpenAI-style SSE line. Returns:
/// - Some(Ok(content)) for content deltas
/// - Some(Err(e)) for malformed payloads
/// - None to skip (blank lines, non-data fields, `[DONE]`, role-only chunks)
pub(crate) fn parse_sse_line(line: &str) -> Option<Result<String>> {
    let line = line.trim();
    let data = line.strip_prefix("data:")?.trim();

    if data.is_empty() || data == "[DONE]" {
        return None;
    }

    match serde_json::from_str::<CompletionChunk>(data) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta.content)
            .filter(|content| !content.is_empty())
            .map(Ok),
        Err(e) => Some(Err(DocChatError::LlmError(format!(
            "Failed to parse stream chunk: {e}"
        )))),
    }
}

/// Convert a byte stream into a stream of complete lines.
///
/// Bytes are buffered until a newline so multi-byte characters split across
/// network chunks are decoded intact.
pub(crate) fn stream_lines<S, B, E>(byte_stream: S) -> impl Stream<Item = Result<String>> + Send
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    futures::stream::unfold(
        (Box::pin(byte_stream), Vec::<u8>::new(), false),
        |(mut stream, mut buffer, finished)| async move {
            loop {
                if let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    let line = String::from_utf8_lossy(&line[..pos]).into_owned();
                    if line.trim().is_empty() {
                        continue;
                    }
                    return Some((Ok(line), (stream, buffer, finished)));
                }

                if finished {
                    if buffer.iter().all(u8::is_ascii_whitespace) {
                        return None;
                    }
                    let rest = String::from_utf8_lossy(&std::mem::take(&mut buffer)).into_owned();
                    return Some((Ok(rest), (stream, buffer, true)));
                }

                match stream.next().await {
                    Some(Ok(bytes)) => buffer.extend_from_slice(bytes.as_ref()),
                    Some(Err(e)) => {
                        return Some((
                            Err(DocChatError::HttpError(format!("Stream read error: {e}"))),
                            (stream, buffer, true),
                        ));
                    }
                    None => {
                        return if buffer.iter().all(u8::is_ascii_whitespace) {
                            None
                        } else {
                            let rest =
                                String::from_utf8_lossy(&std::mem::take(&mut buffer)).into_owned();
                            Some((Ok(rest), (stream, buffer, true)))
                        };
                    }
                }
            }
        },
    )
}

/// Turn a raw SSE byte stream into content deltas
pub(crate) fn sse_token_stream<S, B, E>(byte_stream: S) -> TokenStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    Box::pin(stream_lines(byte_stream).filter_map(|line| async move {
        match line {
            Ok(line) => parse_sse_line(&line),
            Err(e) => Some(Err(e)),
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(parts: &[&str]) -> Vec<std::result::Result<Vec<u8>, std::io::Error>> {
        parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect()
    }

    #[test]
    fn test_parse_data_line() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hello"}}]}"#;
        assert_eq!(parse_sse_line(line).unwrap().unwrap(), "Hello");
    }

    #[test]
    fn test_parse_done() {
        assert!(parse_sse_line("data: [DONE]").is_none());
    }

    #[test]
    fn test_parse_role_only_chunk() {
        let line = r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#;
        assert!(parse_sse_line(line).is_none());
    }

    #[test]
    fn test_parse_empty_choices() {
        assert!(parse_sse_line(r#"data: {"choices":[]}"#).is_none());
    }

    #[test]
    fn test_parse_malformed() {
        let result = parse_sse_line("data: {broken json");
        assert!(matches!(result, Some(Err(DocChatError::LlmError(_)))));
    }

    #[test]
    fn test_parse_non_data_line() {
        assert!(parse_sse_line("event: message").is_none());
        assert!(parse_sse_line(": keep-alive").is_none());
        assert!(parse_sse_line("").is_none());
    }

    #[tokio::test]
    async fn test_stream_lines_reassembles_split_lines() {
        let input = chunks(&["data: one\nda", "ta: two\n\n", "data: three"]);
        let lines: Vec<String> = stream_lines(futures::stream::iter(input))
            .map(|l| l.unwrap())
            .collect()
            .await;
        assert_eq!(lines, vec!["data: one", "data: two", "data: three"]);
    }

    #[tokio::test]
    async fn test_stream_lines_keeps_multibyte_chars_intact() {
        let text = "data: ⚛️ react\n".as_bytes().to_vec();
        let (a, b) = text.split_at(7);
        let input: Vec<std::result::Result<Vec<u8>, std::io::Error>> =
            vec![Ok(a.to_vec()), Ok(b.to_vec())];
        let lines: Vec<String> = stream_lines(futures::stream::iter(input))
            .map(|l| l.unwrap())
            .collect()
            .await;
        assert_eq!(lines, vec!["data: ⚛️ react"]);
    }

    #[tokio::test]
    async fn test_sse_token_stream_yields_content_only() {
        let input = chunks(&[
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"Use \"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"hooks\"}}]}\n\n",
            "data: [DONE]\n\n",
        ]);
        let text = StreamingResponse::new(sse_token_stream(futures::stream::iter(input)))
            .collect_all()
            .await
            .unwrap();
        assert_eq!(text, "Use hooks");
    }

    #[tokio::test]
    async fn test_read_error_ends_stream_after_error() {
        let input: Vec<std::result::Result<Vec<u8>, std::io::Error>> = vec![
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n".to_vec()),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n".to_vec()),
        ];
        let items: Vec<Result<String>> = sse_token_stream(futures::stream::iter(input))
            .collect()
            .await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "a");
        assert!(items[1].is_err());
    }
}
