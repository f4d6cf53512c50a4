//! TUI widgets

pub mod help;
pub mod login;
pub mod quit_confirm;
pub mod record;
pub mod spinner;
pub mod stats;
pub mod status;
pub mod tabs;
