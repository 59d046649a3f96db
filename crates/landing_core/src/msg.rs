#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    InputChanged(String),
    PromptSubmitted,
    /// Channel A: next chunk of the assistant reply.
    CompletionDelta(String),
    CompletionFinished,
    CompletionFailed(String),
    /// Channel B: raw fragment from the event stream.
    StreamFragment(String),
    DocumentMounted { generation: u64 },
    /// Sandbox markup was read back after an edit.
    DocumentSynced { generation: u64, markup: String },
    /// User clicked Edit or Save.
    EditToggled,
    ViewToggled,
    ElementClicked {
        token: crate::ElementToken,
        inner_markup: String,
    },
    WorkingCopyChanged(String),
    CommitClicked,
    FileNameChanged(String),
    SaveClicked,
    DeviceSizeSelected(crate::DeviceSize),
    /// UI/render tick to coalesce rendering.
    Tick,
    NoOp,
}
