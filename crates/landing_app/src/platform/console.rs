use landing_core::{AppViewModel, DeviceSize, Msg, ViewMode};
use thiserror::Error;

/// One line typed at the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    /// Plain text: becomes the prompt and is submitted.
    Prompt(String),
    /// Maps directly onto a core message.
    Core(Msg),
    Click(usize),
    Hover(usize),
    Leave(usize),
    Type(usize, String),
    Elements,
    Markup,
    Host,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum CommandError {
    #[error("unknown command ':{0}', try :help")]
    Unknown(String),
    #[error(":{0} needs an element index, see :elements")]
    MissingIndex(&'static str),
    #[error("'{0}' is not an element index")]
    BadIndex(String),
    #[error("device must be mobile, tablet or desktop")]
    BadDevice,
}

pub(crate) const HELP: &str = "\
text            submit text as the prompt
:edit           toggle the edit session (Edit/Save)
:code           toggle between preview and source
:elements       list sandbox elements with their index
:click N        click element N
:hover N        move the pointer onto element N
:leave N        move the pointer off element N
:type N TEXT    type TEXT into editable element N
:set MARKUP     edit the selection's working copy
:update         commit the selection
:name NAME      set the export file name
:save           export the page
:device D       mobile, tablet or desktop
:markup         print the sandbox markup
:host           print a host page embedding the sandbox
:quit           exit";

pub(crate) fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(rest) = line.strip_prefix(':') else {
        if line.trim().is_empty() {
            return Ok(None);
        }
        return Ok(Some(Command::Prompt(line.to_string())));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim_start()),
        None => (rest, ""),
    };
    let command = match name {
        "edit" => Command::Core(Msg::EditToggled),
        "code" => Command::Core(Msg::ViewToggled),
        "update" => Command::Core(Msg::CommitClicked),
        "save" => Command::Core(Msg::SaveClicked),
        "set" => Command::Core(Msg::WorkingCopyChanged(arg.to_string())),
        "name" => Command::Core(Msg::FileNameChanged(arg.to_string())),
        "device" => Command::Core(Msg::DeviceSizeSelected(parse_device(arg)?)),
        "click" => Command::Click(parse_index("click", arg)?),
        "hover" => Command::Hover(parse_index("hover", arg)?),
        "leave" => Command::Leave(parse_index("leave", arg)?),
        "type" => {
            let (index, text) = match arg.split_once(char::is_whitespace) {
                Some((index, text)) => (index, text),
                None => (arg, ""),
            };
            Command::Type(parse_index("type", index)?, text.to_string())
        }
        "elements" => Command::Elements,
        "markup" => Command::Markup,
        "host" => Command::Host,
        "help" => Command::Help,
        "quit" | "q" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn parse_index(command: &'static str, arg: &str) -> Result<usize, CommandError> {
    let arg = arg.trim();
    if arg.is_empty() {
        return Err(CommandError::MissingIndex(command));
    }
    arg.parse()
        .map_err(|_| CommandError::BadIndex(arg.to_string()))
}

fn parse_device(arg: &str) -> Result<DeviceSize, CommandError> {
    match arg.trim().to_ascii_lowercase().as_str() {
        "mobile" => Ok(DeviceSize::Mobile),
        "tablet" => Ok(DeviceSize::Tablet),
        "desktop" => Ok(DeviceSize::Desktop),
        _ => Err(CommandError::BadDevice),
    }
}

/// Text rendition of the view model.
pub(crate) fn render(view: &AppViewModel) -> String {
    let mut lines = Vec::new();

    let input = if view.input.is_empty() {
        format!("({})", view.placeholder.trim_end())
    } else {
        view.input.clone()
    };
    let lock = if view.input_enabled { "" } else { " [locked]" };
    lines.push(format!("> {input}{lock}"));

    let mut status = format!("messages: {}", view.message_count);
    if view.loading {
        status.push_str(" | generating");
    }
    if view.show_preview {
        let mode = match view.view_mode {
            ViewMode::Preview => "preview",
            ViewMode::Source => "source",
        };
        let (num, den) = view.device.width_fraction();
        status.push_str(&format!(
            " | {mode} {}B | width {num}/{den}",
            view.content_len
        ));
    }
    lines.push(status);

    let mut buttons = Vec::new();
    if let Some(label) = view.edit_button {
        buttons.push(format!("[{label}] :edit"));
    }
    if view.show_preview {
        buttons.push(format!("[{}] :code", view.view_button));
        buttons.push(format!("[Download {}] :save", view.file_name));
    }
    if !buttons.is_empty() {
        lines.push(buttons.join("  "));
    }

    if let Some(selection) = &view.selection {
        lines.push(format!("selected: {}", selection.working_copy));
        lines.push("[Update] :update  (edit with :set)".to_string());
    }
    if let Some(error) = &view.last_error {
        lines.push(format!("error: {error}"));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use landing_core::{update, AppState};
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_text_is_a_prompt() {
        assert_eq!(
            parse_command("a landing page for a bakery\n"),
            Ok(Some(Command::Prompt("a landing page for a bakery".into())))
        );
        assert_eq!(parse_command("   "), Ok(None));
    }

    #[test]
    fn colon_commands_map_to_messages() {
        assert_eq!(
            parse_command(":set <b>Hi</b> there"),
            Ok(Some(Command::Core(Msg::WorkingCopyChanged(
                "<b>Hi</b> there".into()
            ))))
        );
        assert_eq!(
            parse_command(":device Tablet"),
            Ok(Some(Command::Core(Msg::DeviceSizeSelected(DeviceSize::Tablet))))
        );
        assert_eq!(
            parse_command(":type 3 Open daily"),
            Ok(Some(Command::Type(3, "Open daily".into())))
        );
        assert_eq!(parse_command(":click 0"), Ok(Some(Command::Click(0))));
    }

    #[test]
    fn bad_commands_are_reported() {
        assert_eq!(
            parse_command(":bogus"),
            Err(CommandError::Unknown("bogus".into()))
        );
        assert_eq!(
            parse_command(":click"),
            Err(CommandError::MissingIndex("click"))
        );
        assert_eq!(
            parse_command(":hover two"),
            Err(CommandError::BadIndex("two".into()))
        );
        assert_eq!(parse_command(":device watch"), Err(CommandError::BadDevice));
    }

    #[test]
    fn initial_view_shows_placeholder_only() {
        let view = AppState::new().view();
        assert_eq!(render(&view), "> (Say something...)\nmessages: 0");
    }

    #[test]
    fn loading_view_locks_input_and_hides_edit() {
        let (state, _) = update(AppState::new(), Msg::InputChanged("page".into()));
        let (state, _) = update(state, Msg::PromptSubmitted);
        let (state, _) = update(state, Msg::CompletionDelta("<h1>A</h1>".into()));
        let text = render(&state.view());
        assert!(text.starts_with("> (Generating...) [locked]"));
        assert!(text.contains("generating"));
        assert!(!text.contains(":edit"));
        assert!(text.contains("[Download index.html] :save"));
    }
}
