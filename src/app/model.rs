use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use ratatui_image::picker::Picker;
use ratatui_image::protocol::StatefulProtocol;
use tracing::{debug, info};

use crate::editor::EditorBuffer;
use crate::render::Metadata;
use crate::workbench::{RenderJob, Workbench};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// The decoded preview, ready for the terminal graphics protocol.
pub struct PreviewImage {
    pub protocol: StatefulProtocol,
    /// Size in terminal cells at the artifact's natural resolution.
    pub cols: u16,
    pub rows: u16,
}

/// The complete application state.
///
/// All state lives here - no global or scattered state.
pub struct Model {
    /// The preview workbench, owning the editor buffer
    pub workbench: Workbench<EditorBuffer>,
    /// Document file loaded at startup and written by save
    pub file_path: Option<PathBuf>,
    /// Terminal size (columns, rows)
    pub terminal_size: (u16, u16),
    /// Scroll offset for the editor viewport (line index of first visible line)
    pub editor_scroll_offset: usize,
    /// Rendering service base URL shown in the header
    pub server_url: String,
    /// Font families published by the rendering service
    pub font_families: Vec<String>,
    /// Rendering service version, once known
    pub service_version: Option<String>,
    /// Global config path shown in help
    pub config_global_path: Option<PathBuf>,
    /// Local override path shown in help
    pub config_local_path: Option<PathBuf>,
    /// Whether help overlay is visible
    pub help_visible: bool,
    /// Scroll offset inside the help overlay
    pub help_scroll_offset: usize,
    toast: Option<Toast>,
    /// Image picker for terminal rendering
    pub picker: Option<Picker>,
    /// Whether the preview is drawn as an image
    pub images_enabled: bool,
    /// Decoded preview for the current artifact
    pub preview_image: Option<PreviewImage>,
    /// Accepted render request waiting to be dispatched
    pub(super) pending_job: Option<RenderJob>,
    /// Whether the app should quit
    pub should_quit: bool,
    /// Set after first quit attempt with unsaved changes; allows second quit to proceed
    pub quit_confirmed: bool,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("workbench", &self.workbench)
            .field("file_path", &self.file_path)
            .field("terminal_size", &self.terminal_size)
            .field("help_visible", &self.help_visible)
            .finish_non_exhaustive()
    }
}

impl Model {
    /// Create a new model around a workbench.
    ///
    /// The buffer starts out clean whatever the workbench wrote into it.
    pub fn new(mut workbench: Workbench<EditorBuffer>, terminal_size: (u16, u16)) -> Self {
        workbench.buffer_mut().mark_clean();
        Self {
            workbench,
            file_path: None,
            terminal_size,
            editor_scroll_offset: 0,
            server_url: String::new(),
            font_families: Vec::new(),
            service_version: None,
            config_global_path: None,
            config_local_path: None,
            help_visible: false,
            help_scroll_offset: 0,
            toast: None,
            picker: None,
            images_enabled: true,
            preview_image: None,
            pending_job: None,
            should_quit: false,
            quit_confirmed: false,
        }
    }

    /// Set the image picker.
    #[must_use]
    pub fn with_picker(mut self, picker: Option<Picker>) -> Self {
        self.picker = picker;
        self
    }

    pub const fn buffer(&self) -> &EditorBuffer {
        self.workbench.buffer()
    }

    /// Whether the document has changes not yet written to its file.
    pub const fn is_dirty(&self) -> bool {
        self.workbench.buffer().is_dirty()
    }

    /// Load a document file into the editor, replacing the current text.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        self.workbench.edit(&text);
        self.workbench.buffer_mut().mark_clean();
        self.workbench.buffer_mut().move_to_start();
        self.editor_scroll_offset = 0;
        self.file_path = Some(path.to_path_buf());
        info!(path = %path.display(), bytes = text.len(), "document loaded");
        Ok(())
    }

    /// Write the editor text to the document file and mark it clean.
    ///
    /// Returns the path written, or `None` when no file is associated.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_file(&mut self) -> Result<Option<PathBuf>> {
        let Some(path) = self.file_path.clone() else {
            return Ok(None);
        };
        let text = self.workbench.buffer().text();
        std::fs::write(&path, text)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        self.workbench.buffer_mut().mark_clean();
        info!(path = %path.display(), "document saved");
        Ok(Some(path))
    }

    /// Record service metadata.
    pub fn set_metadata(&mut self, metadata: Metadata) {
        self.font_families = metadata.families;
        self.service_version = Some(metadata.version).filter(|v| !v.is_empty());
    }

    /// The font override after the current one: no override, then each
    /// published family in order, wrapping around.
    pub fn next_font_family(&self) -> Option<String> {
        let current = self.workbench.options().font_family.as_deref();
        let next_idx = match current {
            None => 0,
            Some(font) => self
                .font_families
                .iter()
                .position(|f| f == font)
                .map_or(self.font_families.len(), |idx| idx + 1),
        };
        self.font_families.get(next_idx).cloned()
    }

    /// Editor rows visible on screen.
    pub fn editor_visible_rows(&self) -> usize {
        usize::from(
            crate::ui::screen_layout_for(self.terminal_size)
                .editor_inner()
                .height,
        )
    }

    /// Rebuild the preview image for the current artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be decoded; the previous image
    /// is dropped in that case.
    pub fn refresh_preview_image(&mut self) -> Result<()> {
        self.preview_image = None;
        if !self.images_enabled {
            return Ok(());
        }
        let (Some(picker), Some(preview)) = (&self.picker, self.workbench.artifact()) else {
            return Ok(());
        };
        let width_px = Some(preview.width).filter(|w| *w > 0);
        let image = crate::preview::decode_artifact(&preview.artifact, width_px)?;
        let (cols, rows) =
            crate::preview::cell_size(image.width(), image.height(), picker.font_size());
        debug!(
            px_width = image.width(),
            px_height = image.height(),
            cols,
            rows,
            "preview image decoded"
        );
        let protocol = picker.new_resize_protocol(image);
        self.preview_image = Some(PreviewImage {
            protocol,
            cols,
            rows,
        });
        Ok(())
    }

    pub(super) fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + Duration::from_secs(4),
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }
}

/// Placeholder left behind by `std::mem::take` while `update` runs; carries
/// no templates so it costs nothing to build.
impl Default for Model {
    fn default() -> Self {
        Self::new(
            Workbench::new(
                EditorBuffer::empty(),
                crate::template::TemplateLibrary::new(Vec::new()),
                crate::options::OptionState::default(),
            ),
            (80, 24),
        )
    }
}
