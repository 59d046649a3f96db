use crate::mode::ModeState;
use crate::view_model::{AppViewModel, SelectionView};

pub const DEFAULT_FILE_NAME: &str = "index.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Opaque reference to one element of a mounted sandbox document.
///
/// Only valid for the mount generation it was issued in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementToken {
    generation: u64,
    serial: u64,
}

impl ElementToken {
    pub fn new(generation: u64, serial: u64) -> Self {
        Self { generation, serial }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub token: ElementToken,
    pub working_copy: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceSize {
    Mobile,
    Tablet,
    #[default]
    Desktop,
}

impl DeviceSize {
    /// Share of the available width the preview frame takes.
    pub fn width_fraction(self) -> (u8, u8) {
        match self {
            DeviceSize::Mobile => (1, 2),
            DeviceSize::Tablet => (3, 4),
            DeviceSize::Desktop => (1, 1),
        }
    }
}

/// Export name for the page: the user's choice, or `index.html` when blank.
pub fn resolve_file_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        DEFAULT_FILE_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    messages: Vec<Message>,
    input: String,
    loading: bool,
    content: String,
    mode: ModeState,
    mounted_generation: Option<u64>,
    selection: Option<Selection>,
    file_name: String,
    device: DeviceSize,
    last_error: Option<String>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        let has_content = !self.content.is_empty();
        let can_edit = !self.loading && has_content && self.mode.view() == crate::ViewMode::Preview;
        AppViewModel {
            input: self.input.clone(),
            input_enabled: !self.loading,
            placeholder: if self.loading {
                "Generating... "
            } else {
                "Say something..."
            },
            loading: self.loading,
            message_count: self.messages.len(),
            show_preview: has_content,
            view_mode: self.mode.view(),
            editing: self.mode.is_editing(),
            edit_button: can_edit.then_some(if self.mode.is_editing() {
                "Save"
            } else {
                "Edit"
            }),
            view_button: match self.mode.view() {
                crate::ViewMode::Preview => "Code",
                crate::ViewMode::Source => "Preview",
            },
            selection: self
                .selection
                .as_ref()
                .filter(|_| self.mode.is_editing())
                .map(|selection| SelectionView {
                    working_copy: selection.working_copy.clone(),
                }),
            file_name: resolve_file_name(&self.file_name),
            device: self.device,
            content_len: self.content.len(),
            last_error: self.last_error.clone(),
            dirty: self.dirty,
        }
    }

    /// The Content Buffer.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn mode(&self) -> ModeState {
        self.mode
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn mounted_generation(&self) -> Option<u64> {
        self.mounted_generation
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn input(&self) -> &str {
        &self.input
    }

    pub(crate) fn set_input(&mut self, input: String) {
        self.input = input;
        self.mark_dirty();
    }

    pub(crate) fn begin_turn(&mut self, prompt: String) {
        self.messages.push(Message::user(prompt));
        self.input.clear();
        self.loading = true;
        self.last_error = None;
        self.mark_dirty();
    }

    pub(crate) fn end_turn(&mut self, error: Option<String>) {
        self.loading = false;
        self.last_error = error;
        self.mark_dirty();
    }

    /// Appends a streamed chunk to the in-progress assistant message.
    pub(crate) fn push_assistant_delta(&mut self, delta: &str) {
        match self.messages.last_mut() {
            Some(last) if last.role == Role::Assistant => last.content.push_str(delta),
            _ => self.messages.push(Message::assistant(delta)),
        }
    }

    /// Copies the latest non-user message into the Content Buffer.
    ///
    /// Returns whether the buffer was replaced.
    pub(crate) fn project_latest_message(&mut self) -> bool {
        match self.messages.last() {
            Some(last) if last.role != Role::User => {
                self.content = last.content.clone();
                self.mark_dirty();
                true
            }
            _ => false,
        }
    }

    pub(crate) fn replace_content(&mut self, content: String) {
        self.content = content;
        self.mark_dirty();
    }

    pub(crate) fn set_mode(&mut self, mode: ModeState) {
        if !mode.is_editing() {
            self.selection = None;
        }
        self.mode = mode;
        self.mark_dirty();
    }

    pub(crate) fn set_mounted_generation(&mut self, generation: u64) {
        self.mounted_generation = Some(generation);
    }

    pub(crate) fn select(&mut self, selection: Selection) {
        self.selection = Some(selection);
        self.mark_dirty();
    }

    pub(crate) fn selection_mut(&mut self) -> Option<&mut Selection> {
        self.selection.as_mut()
    }

    pub(crate) fn take_selection(&mut self) -> Option<Selection> {
        let taken = self.selection.take();
        if taken.is_some() {
            self.mark_dirty();
        }
        taken
    }

    pub(crate) fn file_name(&self) -> &str {
        &self.file_name
    }

    pub(crate) fn set_file_name(&mut self, name: String) {
        self.file_name = name;
        self.mark_dirty();
    }

    pub(crate) fn set_device(&mut self, device: DeviceSize) {
        self.device = device;
        self.mark_dirty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_file_name_falls_back_to_index() {
        assert_eq!(resolve_file_name(""), "index.html");
        assert_eq!(resolve_file_name("   "), "index.html");
        assert_eq!(resolve_file_name(" landing.html "), "landing.html");
    }

    #[test]
    fn deltas_extend_the_open_assistant_message() {
        let mut state = AppState::new();
        state.begin_turn("a page".into());
        state.push_assistant_delta("<h1>");
        state.push_assistant_delta("Hi</h1>");
        assert_eq!(state.messages().len(), 2);
        assert_eq!(state.messages()[1], Message::assistant("<h1>Hi</h1>"));
        assert!(state.project_latest_message());
        assert_eq!(state.content(), "<h1>Hi</h1>");
    }

    #[test]
    fn user_message_is_never_projected() {
        let mut state = AppState::new();
        state.begin_turn("a page".into());
        assert!(!state.project_latest_message());
        assert_eq!(state.content(), "");
    }
}
