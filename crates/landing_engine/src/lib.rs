//! Landing engine: sandbox document, edit instrumentation and streaming IO.
mod completion;
mod dom;
mod edit_session;
mod engine;
mod event_stream;
mod export;
mod overlay;
mod persist;
mod sandbox;
mod types;

pub use completion::{
    ChannelEventSink, CompletionSettings, CompletionSource, EventSink, HttpCompletionSource,
};
pub use edit_session::EditSession;
pub use engine::{EngineConfig, EngineHandle};
pub use event_stream::{FragmentStream, FragmentStreamSettings};
pub use export::{export_document, export_file_name, HtmlExport, DEFAULT_EXPORT_NAME, HTML_MEDIA_TYPE};
pub use overlay::{HoverPair, ListenerId, ListenerOwner};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use sandbox::{ClickEvent, NodeHandle, RenderView, SandboxError, SandboxPolicy, SandboxRenderer};
pub use types::{
    ChatMessage, ChatRole, CompletionError, CompletionRequest, EngineEvent, StreamError,
    StreamProtocol,
};
