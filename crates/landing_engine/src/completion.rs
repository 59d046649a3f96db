use std::time::Duration;

use encoding_rs::{CoderResult, Decoder, UTF_8};
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::{CompletionError, CompletionRequest, EngineEvent, StreamProtocol};

#[derive(Debug, Clone)]
pub struct CompletionSettings {
    pub endpoint: String,
    pub connect_timeout: Duration,
    /// Longest silence tolerated between two body chunks.
    pub read_timeout: Duration,
    pub protocol: StreamProtocol,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3000/api/chat".to_string(),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(60),
            protocol: StreamProtocol::Text,
        }
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Source of streamed assistant replies.
#[async_trait::async_trait]
pub trait CompletionSource: Send + Sync {
    /// Streams the reply as `CompletionDelta` events; returns when it ends.
    async fn stream(
        &self,
        request: &CompletionRequest,
        sink: &dyn EventSink,
    ) -> Result<(), CompletionError>;
}

#[derive(Debug, Clone)]
pub struct HttpCompletionSource {
    settings: CompletionSettings,
}

impl HttpCompletionSource {
    pub fn new(settings: CompletionSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, CompletionError> {
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .read_timeout(self.settings.read_timeout)
            .build()
            .map_err(|err| CompletionError::Network(err.to_string()))
    }

    fn forward(
        &self,
        text: &str,
        lines: &mut DataLineParser,
        sink: &dyn EventSink,
    ) -> Result<(), CompletionError> {
        match self.settings.protocol {
            StreamProtocol::Text => {
                if !text.is_empty() {
                    sink.emit(EngineEvent::CompletionDelta(text.to_string()));
                }
            }
            StreamProtocol::Data => {
                for part in lines.push(text) {
                    emit_part(part, sink)?;
                }
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl CompletionSource for HttpCompletionSource {
    async fn stream(
        &self,
        request: &CompletionRequest,
        sink: &dyn EventSink,
    ) -> Result<(), CompletionError> {
        let url = Url::parse(&self.settings.endpoint)
            .map_err(|err| CompletionError::InvalidUrl(err.to_string()))?;
        let body =
            serde_json::to_vec(request).map_err(|err| CompletionError::Encode(err.to_string()))?;
        let client = self.build_client()?;

        let response = client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CompletionError::HttpStatus(status.as_u16()));
        }

        let mut decoder = Utf8Decoder::default();
        let mut lines = DataLineParser::default();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let text = decoder.push(&chunk);
            self.forward(&text, &mut lines, sink)?;
        }

        let rest = decoder.finish();
        self.forward(&rest, &mut lines, sink)?;
        if self.settings.protocol == StreamProtocol::Data {
            if let Some(part) = lines.finish() {
                emit_part(part, sink)?;
            }
        }
        Ok(())
    }
}

fn emit_part(part: DataPart, sink: &dyn EventSink) -> Result<(), CompletionError> {
    match part {
        DataPart::Text(text) => {
            sink.emit(EngineEvent::CompletionDelta(text));
            Ok(())
        }
        DataPart::Error(message) => Err(CompletionError::Reported(message)),
    }
}

fn map_reqwest_error(err: reqwest::Error) -> CompletionError {
    if err.is_timeout() {
        return CompletionError::Timeout;
    }
    CompletionError::Network(err.to_string())
}

/// Decodes UTF-8 across chunk boundaries; an incomplete trailing sequence
/// waits for the next chunk.
struct Utf8Decoder {
    decoder: Decoder,
}

impl Default for Utf8Decoder {
    fn default() -> Self {
        Self {
            decoder: UTF_8.new_decoder(),
        }
    }
}

impl Utf8Decoder {
    fn push(&mut self, chunk: &[u8]) -> String {
        self.decode(chunk, false)
    }

    fn finish(&mut self) -> String {
        self.decode(&[], true)
    }

    fn decode(&mut self, mut chunk: &[u8], last: bool) -> String {
        let mut out = String::new();
        loop {
            // Malformed sequences come out as U+FFFD.
            let needed = self
                .decoder
                .max_utf8_buffer_length(chunk.len())
                .unwrap_or(chunk.len() + 4);
            out.reserve(needed);
            let (result, read, _) = self.decoder.decode_to_string(chunk, &mut out, last);
            chunk = &chunk[read..];
            if let CoderResult::InputEmpty = result {
                return out;
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum DataPart {
    Text(String),
    Error(String),
}

#[derive(Debug, Default)]
struct DataLineParser {
    buffer: String,
}

impl DataLineParser {
    fn push(&mut self, text: &str) -> Vec<DataPart> {
        self.buffer.push_str(text);
        let mut parts = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            if let Some(part) = parse_data_line(line.trim_end()) {
                parts.push(part);
            }
        }
        parts
    }

    fn finish(&mut self) -> Option<DataPart> {
        let line = std::mem::take(&mut self.buffer);
        parse_data_line(line.trim_end())
    }
}

fn parse_data_line(line: &str) -> Option<DataPart> {
    let (prefix, payload) = line.split_once(':')?;
    match prefix {
        "0" => serde_json::from_str::<String>(payload).ok().map(DataPart::Text),
        "3" => serde_json::from_str::<String>(payload)
            .ok()
            .map(DataPart::Error),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_multibyte_character_waits_for_next_chunk() {
        let mut decoder = Utf8Decoder::default();
        let bytes = "café".as_bytes();
        let (head, tail) = bytes.split_at(bytes.len() - 1);
        assert_eq!(decoder.push(head), "caf");
        assert_eq!(decoder.push(tail), "é");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn invalid_bytes_are_replaced() {
        let mut decoder = Utf8Decoder::default();
        assert_eq!(decoder.push(b"a\xffb"), "a\u{fffd}b");
    }

    #[test]
    fn truncated_sequence_is_replaced_at_end_of_stream() {
        let mut decoder = Utf8Decoder::default();
        assert_eq!(decoder.push(b"ok\xc3"), "ok");
        assert_eq!(decoder.finish(), "\u{fffd}");
    }

    #[test]
    fn data_lines_yield_text_and_errors() {
        let mut parser = DataLineParser::default();
        let parts = parser.push("0:\"<h1>\"\n2:[{\"x\":1}]\n0:\"Hi\\n\"\n3:\"boom\"\n");
        assert_eq!(
            parts,
            vec![
                DataPart::Text("<h1>".into()),
                DataPart::Text("Hi\n".into()),
                DataPart::Error("boom".into()),
            ]
        );
    }

    #[test]
    fn data_line_split_across_chunks() {
        let mut parser = DataLineParser::default();
        assert!(parser.push("0:\"<p>pa").is_empty());
        assert_eq!(parser.push("rt</p>\"\n"), vec![DataPart::Text("<p>part</p>".into())]);
        assert_eq!(parser.finish(), None);
    }

    #[test]
    fn unterminated_last_line_is_flushed() {
        let mut parser = DataLineParser::default();
        assert!(parser.push("0:\"end\"").is_empty());
        assert_eq!(parser.finish(), Some(DataPart::Text("end".into())));
    }
}
