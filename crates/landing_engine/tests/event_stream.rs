use std::sync::{Arc, Mutex};

use landing_engine::{
    EngineEvent, EventSink, FragmentStream, FragmentStreamSettings, StreamError,
};
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct TestSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl TestSink {
    fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl EventSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn stream_for(server: &MockServer) -> FragmentStream {
    FragmentStream::new(FragmentStreamSettings {
        url: format!("{}/api/chat", server.uri()),
        ..FragmentStreamSettings::default()
    })
}

#[tokio::test]
async fn every_event_becomes_a_fragment_in_order() {
    let server = MockServer::start().await;
    let body = "data: <section>One</section>\n\nevent: update\ndata: <p>Two</p>\n\n";
    Mock::given(method("GET"))
        .and(path("/api/chat"))
        .and(header("accept", "text/event-stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let sink = TestSink::default();
    let delivered = stream_for(&server)
        .run(&sink, CancellationToken::new())
        .await
        .expect("stream ok");

    assert_eq!(delivered, 2);
    assert_eq!(
        sink.take(),
        vec![
            EngineEvent::Fragment("<section>One</section>".into()),
            EngineEvent::Fragment("<p>Two</p>".into()),
        ]
    );
}

#[tokio::test]
async fn error_status_closes_without_fragments() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let sink = TestSink::default();
    let err = stream_for(&server)
        .run(&sink, CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err, StreamError::HttpStatus(404));
    assert!(sink.take().is_empty());
}

#[tokio::test]
async fn cancelled_token_stops_before_delivery() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("data: <p>late</p>\n\n", "text/event-stream")
                .set_delay(std::time::Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let sink = TestSink::default();
    let delivered = stream_for(&server).run(&sink, cancel).await.expect("cancelled");
    assert_eq!(delivered, 0);
    assert!(sink.take().is_empty());
}
