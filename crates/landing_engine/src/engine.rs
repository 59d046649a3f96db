use std::sync::{mpsc, Arc};
use std::thread;

use landing_logging::{landing_debug, landing_error, landing_info, landing_warn};
use tokio_util::sync::CancellationToken;

use crate::completion::{
    ChannelEventSink, CompletionSettings, CompletionSource, EventSink, HttpCompletionSource,
};
use crate::event_stream::{FragmentStream, FragmentStreamSettings};
use crate::{CompletionRequest, EngineEvent};

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub completion: CompletionSettings,
    /// Channel B is only opened when configured.
    pub fragment_stream: Option<FragmentStreamSettings>,
}

enum EngineCommand {
    StartCompletion(CompletionRequest),
    OpenFragmentStream,
    CloseFragmentStream,
}

/// Front end of the IO worker. Commands go in, [`EngineEvent`]s come out.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Self {
        let source = Arc::new(HttpCompletionSource::new(config.completion.clone()));
        Self::with_source(config, source)
    }

    /// Uses `source` for Channel A instead of the HTTP client.
    pub fn with_source(config: EngineConfig, source: Arc<dyn CompletionSource>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let stream = config.fragment_stream.map(FragmentStream::new);

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    landing_error!("Engine runtime could not start: {}", err);
                    return;
                }
            };
            let mut stream_cancel: Option<CancellationToken> = None;
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::StartCompletion(request) => {
                        let source = source.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            run_completion(source.as_ref(), request, event_tx).await;
                        });
                    }
                    EngineCommand::OpenFragmentStream => {
                        let Some(stream) = stream.clone() else {
                            landing_debug!("No fragment stream configured");
                            continue;
                        };
                        if stream_cancel.is_some() {
                            continue;
                        }
                        let token = CancellationToken::new();
                        stream_cancel = Some(token.clone());
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            run_fragment_stream(&stream, token, event_tx).await;
                        });
                    }
                    EngineCommand::CloseFragmentStream => {
                        if let Some(token) = stream_cancel.take() {
                            token.cancel();
                        }
                    }
                }
            }
            if let Some(token) = stream_cancel.take() {
                token.cancel();
            }
        });

        Self { cmd_tx, event_rx }
    }

    pub fn start_completion(&self, request: CompletionRequest) {
        let _ = self.cmd_tx.send(EngineCommand::StartCompletion(request));
    }

    pub fn open_fragment_stream(&self) {
        let _ = self.cmd_tx.send(EngineCommand::OpenFragmentStream);
    }

    pub fn close_fragment_stream(&self) {
        let _ = self.cmd_tx.send(EngineCommand::CloseFragmentStream);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

async fn run_completion(
    source: &dyn CompletionSource,
    request: CompletionRequest,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let sink = ChannelEventSink::new(event_tx);
    landing_info!("Completion started with {} messages", request.messages.len());
    match source.stream(&request, &sink).await {
        Ok(()) => sink.emit(EngineEvent::CompletionFinished),
        Err(err) => {
            landing_warn!("Completion failed: {}", err);
            sink.emit(EngineEvent::CompletionFailed(err));
        }
    }
}

async fn run_fragment_stream(
    stream: &FragmentStream,
    cancel: CancellationToken,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let sink = ChannelEventSink::new(event_tx);
    let error = match stream.run(&sink, cancel).await {
        Ok(count) => {
            landing_info!("Fragment stream closed after {} fragments", count);
            None
        }
        Err(err) => {
            landing_warn!("Fragment stream failed: {}", err);
            Some(err)
        }
    };
    sink.emit(EngineEvent::FragmentStreamClosed { error });
}
