use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use landing_core::{update, AppState, Msg};
use landing_engine::{EngineHandle, NodeHandle};
use landing_logging::{landing_info, landing_warn};

use super::config::AppConfig;
use super::console::{self, Command};
use super::effects::EffectRunner;

const TICK_INTERVAL: Duration = Duration::from_millis(75);
const ENGINE_POLL: Duration = Duration::from_millis(20);

enum Input {
    Line(String),
    Tick,
    Closed,
}

pub fn run_app() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    landing_logging::initialize(&config.log_settings()?);
    landing_info!(
        "Starting landing studio, completion={} protocol={:?}",
        config.completion_url,
        config.protocol
    );

    let engine = EngineHandle::new(config.engine_config());
    let runner = EffectRunner::new(engine, config.export_dir.clone());
    let mut app = App::new(runner);
    if let Some(name) = config.file_name.clone() {
        app.dispatch(Msg::FileNameChanged(name));
    }

    let (input_tx, input_rx) = mpsc::channel();
    spawn_stdin_reader(input_tx.clone());
    // Coalesces console redraws the same way the UI tick throttles rendering.
    thread::spawn(move || {
        while input_tx.send(Input::Tick).is_ok() {
            thread::sleep(TICK_INTERVAL);
        }
    });

    app.runner.engine().open_fragment_stream();
    app.print(console::HELP);
    app.redraw();

    loop {
        match input_rx.recv_timeout(ENGINE_POLL) {
            Ok(Input::Line(line)) => {
                if !app.handle_line(&line) {
                    break;
                }
            }
            Ok(Input::Tick) => app.dispatch(Msg::Tick),
            Ok(Input::Closed) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => {}
        }
        for msg in app.runner.poll_engine() {
            app.dispatch(msg);
        }
    }

    app.runner.engine().close_fragment_stream();
    landing_info!("Landing studio stopped");
    Ok(())
}

fn spawn_stdin_reader(tx: mpsc::Sender<Input>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(Input::Line(line)).is_err() {
                        return;
                    }
                }
                Err(err) => {
                    landing_warn!("stdin read failed: {}", err);
                    break;
                }
            }
        }
        let _ = tx.send(Input::Closed);
    });
}

struct App {
    state: AppState,
    runner: EffectRunner,
}

impl App {
    fn new(runner: EffectRunner) -> Self {
        Self {
            state: AppState::new(),
            runner,
        }
    }

    /// Applies `msg` and every follow-up it produces before returning.
    fn dispatch(&mut self, msg: Msg) {
        let redraw = matches!(msg, Msg::Tick);
        let mut pending = VecDeque::from([msg]);
        while let Some(msg) = pending.pop_front() {
            let state = std::mem::take(&mut self.state);
            let (state, effects) = update(state, msg);
            self.state = state;
            let follow_ups = self.runner.run(effects);
            for msg in follow_ups.into_iter().rev() {
                pending.push_front(msg);
            }
        }
        if redraw && self.state.consume_dirty() {
            self.redraw();
        }
    }

    /// Returns `false` when the user asked to quit.
    fn handle_line(&mut self, line: &str) -> bool {
        let command = match console::parse_command(line) {
            Ok(Some(command)) => command,
            Ok(None) => return true,
            Err(err) => {
                self.print(&err.to_string());
                return true;
            }
        };
        match command {
            Command::Prompt(text) => {
                self.dispatch(Msg::InputChanged(text));
                self.dispatch(Msg::PromptSubmitted);
            }
            Command::Core(msg) => self.dispatch(msg),
            Command::Click(index) => {
                if let Some(handle) = self.element(index) {
                    match self.runner.click(handle) {
                        Ok(Some(msg)) => self.dispatch(msg),
                        Ok(None) => {}
                        Err(err) => self.print(&err.to_string()),
                    }
                }
            }
            Command::Hover(index) => {
                if let Some(handle) = self.element(index) {
                    if let Err(err) = self.runner.renderer_mut().pointer_enter(handle) {
                        self.print(&err.to_string());
                    }
                }
            }
            Command::Leave(index) => {
                if let Some(handle) = self.element(index) {
                    if let Err(err) = self.runner.renderer_mut().pointer_leave(handle) {
                        self.print(&err.to_string());
                    }
                }
            }
            Command::Type(index, text) => {
                if let Some(handle) = self.element(index) {
                    if let Err(err) = self.runner.renderer_mut().replace_text(handle, &text) {
                        self.print(&err.to_string());
                    }
                }
            }
            Command::Elements => self.list_elements(),
            Command::Markup => {
                let markup = self.runner.renderer().read_full_markup();
                self.print(markup.as_deref().unwrap_or("(nothing rendered yet)"));
            }
            Command::Host => {
                let page = self.runner.renderer().host_page();
                self.print(page.as_deref().unwrap_or("(nothing rendered yet)"));
            }
            Command::Help => self.print(console::HELP),
            Command::Quit => return false,
        }
        true
    }

    fn element(&self, index: usize) -> Option<NodeHandle> {
        let handle = self.runner.renderer().elements().get(index).copied();
        if handle.is_none() {
            self.print(&format!("no element {index}, see :elements"));
        }
        handle
    }

    fn list_elements(&self) {
        let renderer = self.runner.renderer();
        let mut lines = Vec::new();
        for (index, handle) in renderer.elements().into_iter().enumerate() {
            let tag = renderer.tag_name(handle).unwrap_or_default();
            let mut flags = String::new();
            if renderer.is_editable(handle).unwrap_or(false) {
                flags.push_str(" editable");
            }
            if renderer.is_highlighted(handle).unwrap_or(false) {
                flags.push_str(" highlighted");
            }
            lines.push(format!("[{index}] <{tag}>{flags}"));
        }
        if lines.is_empty() {
            self.print("(nothing rendered yet)");
        } else {
            self.print(&lines.join("\n"));
        }
    }

    fn redraw(&self) {
        self.print(&console::render(&self.state.view()));
    }

    fn print(&self, text: &str) {
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{text}");
        let _ = out.flush();
    }
}
