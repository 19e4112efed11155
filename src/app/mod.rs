//! The headless application layer: state, commands and the background scan.
//!
//! A shell (the CLI in `main.rs`, or any GUI) owns an `Arc<Mutex<AppState>>`,
//! calls the handlers in `commands` and renders the `UserEvent`s it receives
//! through its `EventProxy`.

pub mod clipboard;
pub mod commands;
pub mod events;
pub mod file_dialog;
pub mod helpers;
pub mod proxy;
pub mod state;
pub mod tasks;
pub mod view_model;
