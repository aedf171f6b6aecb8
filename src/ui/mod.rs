//! Terminal rendering using ratatui.
//!
//! One fixed view: a header line, four stacked metric chart panels, and a
//! status bar, with an optional help overlay.

pub mod charts;
pub mod common;
pub mod theme;

pub use theme::Theme;
