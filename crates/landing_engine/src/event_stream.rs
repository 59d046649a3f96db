use std::time::Duration;

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use landing_logging::{landing_debug, landing_trace};
use reqwest::header::ACCEPT;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::completion::EventSink;
use crate::{EngineEvent, StreamError};

#[derive(Debug, Clone)]
pub struct FragmentStreamSettings {
    pub url: String,
    pub connect_timeout: Duration,
}

impl Default for FragmentStreamSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000/api/chat".to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Server-sent event subscription whose payloads are page fragments.
///
/// Each event's data goes to the sink as [`EngineEvent::Fragment`] in arrival
/// order. The subscription ends when the server closes it, on error, or when
/// the token is cancelled.
#[derive(Debug, Clone)]
pub struct FragmentStream {
    settings: FragmentStreamSettings,
}

impl FragmentStream {
    pub fn new(settings: FragmentStreamSettings) -> Self {
        Self { settings }
    }

    /// Returns the number of fragments delivered.
    pub async fn run(
        &self,
        sink: &dyn EventSink,
        cancel: CancellationToken,
    ) -> Result<usize, StreamError> {
        let url = Url::parse(&self.settings.url)
            .map_err(|err| StreamError::InvalidUrl(err.to_string()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .build()
            .map_err(|err| StreamError::Network(err.to_string()))?;

        let request = client.get(url).header(ACCEPT, "text/event-stream").send();
        let response = tokio::select! {
            _ = cancel.cancelled() => return Ok(0),
            response = request => response.map_err(|err| StreamError::Network(err.to_string()))?,
        };
        let status = response.status();
        if !status.is_success() {
            return Err(StreamError::HttpStatus(status.as_u16()));
        }
        landing_debug!("Fragment stream opened: {}", self.settings.url);

        let mut events = std::pin::pin!(response.bytes_stream().eventsource());
        let mut delivered = 0;
        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => break,
                next = events.next() => next,
            };
            match next {
                Some(Ok(event)) => {
                    landing_trace!("Fragment event '{}' bytes={}", event.event, event.data.len());
                    sink.emit(EngineEvent::Fragment(event.data));
                    delivered += 1;
                }
                Some(Err(err)) => return Err(StreamError::Decode(err.to_string())),
                None => break,
            }
        }
        Ok(delivered)
    }
}
