use crate::{DeviceSize, ViewMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionView {
    pub working_copy: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppViewModel {
    pub input: String,
    pub input_enabled: bool,
    pub placeholder: &'static str,
    pub loading: bool,
    pub message_count: usize,
    /// The preview frame is only shown once there is something to render.
    pub show_preview: bool,
    pub view_mode: ViewMode,
    pub editing: bool,
    /// Label of the Edit/Save button, `None` while it is hidden.
    pub edit_button: Option<&'static str>,
    pub view_button: &'static str,
    pub selection: Option<SelectionView>,
    pub file_name: String,
    pub device: DeviceSize,
    pub content_len: usize,
    pub last_error: Option<String>,
    pub dirty: bool,
}
