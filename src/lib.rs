//! prestatrack: record service transactions and review earnings from the
//! terminal, backed by a remote spreadsheet script.

pub mod cli;
pub mod logging;
pub mod services;
pub mod tui;
pub mod types;
