use crate::{ElementToken, Message, ViewMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send the conversation to the completion source.
    StartCompletion { messages: Vec<Message> },
    /// Replace the whole sandbox document.
    Render { html: String, view: ViewMode },
    /// Append a fragment to the mounted document, leaving the buffer alone.
    AppendFragment { html: String },
    EnableEditing,
    /// End the edit session; with `sync` the sandbox markup is read back.
    DisableEditing { sync: bool },
    /// Replace one element's inner markup, then read the document back.
    CommitSelection { token: ElementToken, markup: String },
    ExportDocument { file_name: String, contents: String },
}
