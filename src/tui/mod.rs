//! Terminal UI: sign-in, transaction entry and statistics

mod app;
mod form;
mod theme;
pub mod widgets;

pub use app::run;
