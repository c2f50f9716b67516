//! Application state and main event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: Pure function for state transitions
//! - [`App::run`]: Main event loop with rendering
//!
//! Render and metadata requests block on HTTP, so they run on worker
//! threads and come back to the loop as messages.

mod effects;
mod event_loop;
mod input;
mod model;
mod update;

pub use model::{Model, PreviewImage, ToastLevel};
pub use update::{Message, update};

use std::path::PathBuf;

use crate::config::DEFAULT_SERVER;
use crate::options::OptionState;

/// Main application struct that owns the terminal and runs the event loop.
pub struct App {
    file_path: Option<PathBuf>,
    server_url: String,
    options: OptionState,
    template: Option<String>,
    images_enabled: bool,
    force_half_cell: bool,
    config_global_path: Option<PathBuf>,
    config_local_path: Option<PathBuf>,
}

impl App {
    /// Create a new application, optionally editing a document file.
    pub fn new(file_path: Option<PathBuf>) -> Self {
        Self {
            file_path,
            server_url: DEFAULT_SERVER.to_string(),
            options: OptionState::default(),
            template: None,
            images_enabled: true,
            force_half_cell: false,
            config_global_path: None,
            config_local_path: None,
        }
    }

    /// Set the rendering service base URL.
    #[must_use]
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    /// Set the initial format, theme and font override.
    #[must_use]
    pub fn with_options(mut self, options: OptionState) -> Self {
        self.options = options;
        self
    }

    /// Start from this template instead of the first one.
    #[must_use]
    pub fn with_template(mut self, template: Option<String>) -> Self {
        self.template = template;
        self
    }

    /// Enable or disable image previews.
    #[must_use]
    pub const fn with_images_enabled(mut self, enabled: bool) -> Self {
        self.images_enabled = enabled;
        self
    }

    /// Use half-block cells instead of probing the terminal.
    #[must_use]
    pub const fn with_force_half_cell(mut self, force: bool) -> Self {
        self.force_half_cell = force;
        self
    }

    /// Set config paths to show in help.
    #[must_use]
    pub fn with_config_paths(
        mut self,
        global_path: Option<PathBuf>,
        local_path: Option<PathBuf>,
    ) -> Self {
        self.config_global_path = global_path;
        self.config_local_path = local_path;
        self
    }
}
