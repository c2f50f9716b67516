// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. render::RenderError)
    clippy::module_name_repetitions
)]

//! # Chartpad
//!
//! A terminal workbench for chart documents.
//!
//! Chartpad edits a JSON chart description next to a live preview:
//! - Built-in templates per chart type
//! - Theme and font selections merged into the document
//! - SVG or PNG rendering through an HTTP chart service
//! - Inline previews (Kitty, Sixel, half-block fallback) or a text summary
//!
//! ## Architecture
//!
//! The preview logic lives in [`workbench::Workbench`], a state machine that
//! knows nothing about terminals. The terminal front end uses The Elm
//! Architecture (TEA):
//! - **Model**: Application state
//! - **Message**: Events and actions
//! - **Update**: Pure state transitions
//! - **View**: Render to terminal
//!
//! ## Modules
//!
//! - [`app`]: Main application loop and state
//! - [`workbench`]: Template, option and render orchestration
//! - [`document`]: Chart document parsing and serialization
//! - [`editor`]: Text buffer behind the document editor
//! - [`options`]: Format, theme and font selections
//! - [`template`]: Built-in chart templates
//! - [`render`]: Rendering service client
//! - [`preview`]: Turning artifacts into terminal images
//! - [`ui`]: Terminal UI components
//! - [`config`]: Persistent flag defaults

pub mod app;
pub mod config;
pub mod document;
pub mod editor;
pub mod options;
pub mod preview;
pub mod render;
pub mod template;
pub mod ui;
pub mod workbench;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model};
    pub use crate::document::ChartDocument;
    pub use crate::render::{HttpRenderClient, RenderBackend};
    pub use crate::workbench::Workbench;
}
