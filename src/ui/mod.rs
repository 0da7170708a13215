//! Ratatui front-end: a searchable card list with an add form and a delete
//! confirmation layered on top as modes.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
