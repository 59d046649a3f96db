//! Console front end: configuration, effect execution and the dispatch loop.
mod app;
mod config;
mod console;
mod effects;

pub use app::run_app;
