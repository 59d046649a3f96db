//! Landing core: pure state machine for the page studio and its view model.
mod effect;
mod mode;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use mode::{EditSession, ModeError, ModeState, ViewMode};
pub use msg::Msg;
pub use state::{
    resolve_file_name, AppState, DeviceSize, ElementToken, Message, Role, Selection,
    DEFAULT_FILE_NAME,
};
pub use update::update;
pub use view_model::{AppViewModel, SelectionView};
