use thiserror::Error;

/// What the sandbox shows: the rendered page or its literal source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Preview,
    Source,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditSession {
    #[default]
    Disabled,
    Enabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ModeError {
    #[error("the edit session is only available in preview")]
    EditRequiresPreview,
}

/// Combined view/edit mode. `Enabled` together with `Source` cannot be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeState {
    view: ViewMode,
    edit: EditSession,
}

impl ModeState {
    pub fn new(view: ViewMode, edit: EditSession) -> Result<Self, ModeError> {
        match (view, edit) {
            (ViewMode::Source, EditSession::Enabled) => Err(ModeError::EditRequiresPreview),
            _ => Ok(Self { view, edit }),
        }
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    pub fn edit(&self) -> EditSession {
        self.edit
    }

    pub fn is_editing(&self) -> bool {
        self.edit == EditSession::Enabled
    }

    /// Flips the edit session. Rejected in source view.
    pub fn toggle_edit(self) -> Result<Self, ModeError> {
        let edit = match self.edit {
            EditSession::Disabled => EditSession::Enabled,
            EditSession::Enabled => EditSession::Disabled,
        };
        Self::new(self.view, edit)
    }

    /// Flips between preview and source. Leaving preview always ends the edit session.
    pub fn toggle_view(self) -> Self {
        match self.view {
            ViewMode::Preview => Self {
                view: ViewMode::Source,
                edit: EditSession::Disabled,
            },
            ViewMode::Source => Self {
                view: ViewMode::Preview,
                edit: EditSession::Disabled,
            },
        }
    }

    /// Ends the edit session without changing the view.
    pub fn reset_edit(self) -> Self {
        Self {
            view: self.view,
            edit: EditSession::Disabled,
        }
    }
}
