//! CLI library components for the Shelf catalog shell.

pub mod logging;
pub mod render;
pub mod settings;
pub mod shell;
