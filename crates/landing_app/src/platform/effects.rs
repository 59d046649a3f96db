use std::path::PathBuf;

use landing_core::{Effect, ElementToken, Message, Msg, Role, ViewMode};
use landing_engine::{
    export_document, ChatMessage, ChatRole, CompletionRequest, EditSession, EngineEvent,
    EngineHandle, NodeHandle, RenderView, SandboxError, SandboxPolicy, SandboxRenderer,
};
use landing_logging::{landing_debug, landing_error, landing_info, landing_warn};

/// Executes core effects against the sandbox and the engine.
///
/// Runs on the dispatch thread; effects that observe the document answer with
/// follow-up messages that must be dispatched before the next inbox item.
pub struct EffectRunner {
    renderer: SandboxRenderer,
    session: EditSession,
    engine: EngineHandle,
    export_dir: PathBuf,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, export_dir: PathBuf) -> Self {
        Self {
            renderer: SandboxRenderer::new(SandboxPolicy::default()),
            session: EditSession::new(),
            engine,
            export_dir,
        }
    }

    pub fn renderer(&self) -> &SandboxRenderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut SandboxRenderer {
        &mut self.renderer
    }

    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    pub fn run(&mut self, effects: Vec<Effect>) -> Vec<Msg> {
        let mut follow_ups = Vec::new();
        for effect in effects {
            if let Some(msg) = self.run_one(effect) {
                follow_ups.push(msg);
            }
        }
        follow_ups
    }

    fn run_one(&mut self, effect: Effect) -> Option<Msg> {
        match effect {
            Effect::StartCompletion { messages } => {
                landing_info!("StartCompletion messages={}", messages.len());
                self.engine.start_completion(CompletionRequest {
                    messages: messages.iter().map(to_chat_message).collect(),
                });
                None
            }
            Effect::Render { html, view } => {
                self.session.discard();
                let generation = self.renderer.mount(&html, to_render_view(view));
                Some(Msg::DocumentMounted { generation })
            }
            Effect::AppendFragment { html } => {
                if self.renderer.append_fragment(&html).is_none() {
                    landing_debug!("Fragment dropped before first render");
                }
                self.adopt_new_elements();
                None
            }
            Effect::EnableEditing => {
                match self.session.enable(&mut self.renderer) {
                    Ok(count) => landing_debug!("Editing enabled on {} elements", count),
                    Err(err) => landing_warn!("Could not enable editing: {}", err),
                }
                None
            }
            Effect::DisableEditing { sync } => {
                self.session.disable(&mut self.renderer);
                if sync {
                    self.synced()
                } else {
                    None
                }
            }
            Effect::CommitSelection { token, markup } => {
                let handle = to_node_handle(token);
                match self.renderer.set_inner_markup(handle, &markup) {
                    Ok(()) => {
                        let pruned = self.session.prune(&self.renderer);
                        landing_debug!("Committed selection, pruned {} registry entries", pruned);
                        self.adopt_new_elements();
                        self.synced()
                    }
                    Err(err) => {
                        landing_warn!("Commit skipped: {}", err);
                        None
                    }
                }
            }
            Effect::ExportDocument {
                file_name,
                contents,
            } => {
                match export_document(&self.export_dir, &file_name, &contents) {
                    Ok(export) => landing_info!(
                        "Saved {} ({}, {} bytes)",
                        export.path.display(),
                        export.media_type,
                        export.byte_len
                    ),
                    Err(err) => landing_error!("Export of {} failed: {}", file_name, err),
                }
                None
            }
        }
    }

    fn adopt_new_elements(&mut self) {
        match self.session.adopt(&mut self.renderer) {
            Ok(0) => {}
            Ok(count) => landing_debug!("Edit session adopted {} new elements", count),
            Err(err) => landing_warn!("Could not make new elements editable: {}", err),
        }
    }

    fn synced(&self) -> Option<Msg> {
        let markup = self.renderer.read_full_markup()?;
        Some(Msg::DocumentSynced {
            generation: self.renderer.generation(),
            markup,
        })
    }

    /// Dispatches a click on the sandbox element at `handle`.
    pub fn click(&self, handle: NodeHandle) -> Result<Option<Msg>, SandboxError> {
        Ok(self
            .renderer
            .click(handle)?
            .map(|event| Msg::ElementClicked {
                token: ElementToken::new(event.handle.generation(), event.handle.serial()),
                inner_markup: event.inner_markup,
            }))
    }

    /// Drains engine output without blocking.
    pub fn poll_engine(&self) -> Vec<Msg> {
        let mut msgs = Vec::new();
        while let Some(event) = self.engine.try_recv() {
            if let Some(msg) = map_engine_event(event) {
                msgs.push(msg);
            }
        }
        msgs
    }
}

pub(crate) fn map_engine_event(event: EngineEvent) -> Option<Msg> {
    match event {
        EngineEvent::CompletionDelta(text) => Some(Msg::CompletionDelta(text)),
        EngineEvent::CompletionFinished => Some(Msg::CompletionFinished),
        EngineEvent::CompletionFailed(err) => Some(Msg::CompletionFailed(err.to_string())),
        EngineEvent::Fragment(html) => Some(Msg::StreamFragment(html)),
        EngineEvent::FragmentStreamClosed { error } => {
            match error {
                Some(err) => landing_warn!("Fragment stream closed: {}", err),
                None => landing_info!("Fragment stream closed"),
            }
            None
        }
    }
}

fn to_chat_message(message: &Message) -> ChatMessage {
    ChatMessage {
        role: match message.role {
            Role::User => ChatRole::User,
            Role::Assistant => ChatRole::Assistant,
        },
        content: message.content.clone(),
    }
}

fn to_render_view(view: ViewMode) -> RenderView {
    match view {
        ViewMode::Preview => RenderView::Preview,
        ViewMode::Source => RenderView::Source,
    }
}

fn to_node_handle(token: ElementToken) -> NodeHandle {
    NodeHandle::from_parts(token.generation(), token.serial())
}
