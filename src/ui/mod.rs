//! View helpers for the keyword sidebar, result grid and settings panel

pub mod grid;
pub mod settings;
pub mod sidebar;
pub mod theme;
