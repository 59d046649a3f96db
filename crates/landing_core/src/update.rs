use crate::{resolve_file_name, AppState, Effect, Msg, Selection};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::InputChanged(text) => {
            // The input is disabled while a reply is streaming.
            if !state.is_loading() {
                state.set_input(text);
            }
            Vec::new()
        }
        Msg::PromptSubmitted => {
            if state.is_loading() || state.input().trim().is_empty() {
                return (state, Vec::new());
            }
            let prompt = state.input().to_string();
            state.begin_turn(prompt);
            vec![Effect::StartCompletion {
                messages: state.messages().to_vec(),
            }]
        }
        Msg::CompletionDelta(delta) => {
            if !state.is_loading() {
                return (state, Vec::new());
            }
            state.push_assistant_delta(&delta);
            if state.project_latest_message() {
                full_render(&mut state)
            } else {
                Vec::new()
            }
        }
        Msg::CompletionFinished => {
            if state.is_loading() {
                state.end_turn(None);
            }
            Vec::new()
        }
        Msg::CompletionFailed(reason) => {
            if state.is_loading() {
                state.end_turn(Some(reason));
            }
            Vec::new()
        }
        Msg::StreamFragment(html) => vec![Effect::AppendFragment { html }],
        Msg::DocumentMounted { generation } => {
            state.set_mounted_generation(generation);
            Vec::new()
        }
        Msg::DocumentSynced { generation, markup } => {
            // A render in between replaced the tree this markup came from.
            if state.mounted_generation() == Some(generation) {
                state.replace_content(markup);
            }
            Vec::new()
        }
        Msg::EditToggled => {
            if state.is_loading() || state.content().is_empty() {
                return (state, Vec::new());
            }
            match state.mode().toggle_edit() {
                Ok(next) if next.is_editing() => {
                    state.set_mode(next);
                    vec![Effect::EnableEditing]
                }
                Ok(next) => {
                    state.set_mode(next);
                    vec![Effect::DisableEditing { sync: true }]
                }
                Err(_) => Vec::new(),
            }
        }
        Msg::ViewToggled => {
            if state.content().is_empty() {
                return (state, Vec::new());
            }
            let was_editing = state.mode().is_editing();
            let next = state.mode().toggle_view();
            state.set_mode(next);
            let mut effects = Vec::with_capacity(2);
            if was_editing {
                effects.push(Effect::DisableEditing { sync: false });
            }
            effects.push(Effect::Render {
                html: state.content().to_string(),
                view: next.view(),
            });
            effects
        }
        Msg::ElementClicked {
            token,
            inner_markup,
        } => {
            if state.mode().is_editing() && state.mounted_generation() == Some(token.generation())
            {
                state.select(Selection {
                    token,
                    working_copy: inner_markup,
                });
            }
            Vec::new()
        }
        Msg::WorkingCopyChanged(text) => {
            if let Some(selection) = state.selection_mut() {
                selection.working_copy = text;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::CommitClicked => match state.take_selection() {
            Some(selection)
                if state.mounted_generation() == Some(selection.token.generation()) =>
            {
                vec![Effect::CommitSelection {
                    token: selection.token,
                    markup: selection.working_copy,
                }]
            }
            _ => Vec::new(),
        },
        Msg::FileNameChanged(name) => {
            state.set_file_name(name);
            Vec::new()
        }
        Msg::SaveClicked => {
            if state.content().is_empty() {
                return (state, Vec::new());
            }
            vec![Effect::ExportDocument {
                file_name: resolve_file_name(state.file_name()),
                contents: state.content().to_string(),
            }]
        }
        Msg::DeviceSizeSelected(device) => {
            state.set_device(device);
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

/// Effects for a Content Buffer replacement: the edit session cannot survive
/// the tree it instrumented.
fn full_render(state: &mut AppState) -> Vec<Effect> {
    let mut effects = Vec::with_capacity(2);
    if state.mode().is_editing() {
        let mode = state.mode().reset_edit();
        state.set_mode(mode);
        effects.push(Effect::DisableEditing { sync: false });
    }
    effects.push(Effect::Render {
        html: state.content().to_string(),
        view: state.mode().view(),
    });
    effects
}
