//! The preview workbench: the state machine tying the document buffer, the
//! user's option selections and the rendering service together.
//!
//! Rendering is split in two so the caller decides where the blocking HTTP
//! call runs. [`Workbench::begin_generate`] parses the buffer, enters the
//! in-flight state and hands back a [`RenderJob`]; the job runs anywhere
//! (a worker thread in the terminal UI) and its result is fed back through
//! [`Workbench::finish_generate`]. [`Workbench::generate`] does both inline.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::document::{ChartDocument, DocumentError};
use crate::editor::DocumentBuffer;
use crate::options::{OptionState, OutputFormat, Theme};
use crate::render::{Artifact, RenderBackend, RenderError};
use crate::template::TemplateLibrary;


/// Everything that can go wrong at the workbench boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkbenchError {
    #[error(transparent)]
    Parse(#[from] DocumentError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("unknown chart template: {0}")]
    UnknownTemplate(String),
}

/// Whether a render request is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    /// Carries the dimensions of the document being rendered so the result
    /// can be laid out once it arrives.
    InFlight { width: u32, height: u32 },
}

/// The last successful render, with the size its document declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewArtifact {
    pub artifact: Artifact,
    pub width: u32,
    pub height: u32,
}

impl PreviewArtifact {
    /// A 0×0 artifact is drawn at the pane origin instead of centered.
    pub const fn is_unsized(&self) -> bool {
        self.width == 0 && self.height == 0
    }
}

/// One accepted render request, detached from the workbench.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderJob {
    pub document: ChartDocument,
    pub format: OutputFormat,
}

impl RenderJob {
    /// Perform the request. Blocks for the duration of the call.
    ///
    /// # Errors
    ///
    /// Whatever the backend reports.
    pub fn run(&self, backend: &dyn RenderBackend) -> Result<Artifact, RenderError> {
        backend.render(&self.document, self.format)
    }
}

/// Orchestrates a document buffer, option state and rendering requests.
pub struct Workbench<B> {
    buffer: B,
    templates: TemplateLibrary,
    options: OptionState,
    chart_type: Option<String>,
    request: RequestState,
    artifact: Option<PreviewArtifact>,
    error: Option<WorkbenchError>,
}

impl<B: DocumentBuffer> Workbench<B> {
    /// Create a workbench and load the library's first template into
    /// `buffer`, merged with `options`.
    pub fn new(buffer: B, templates: TemplateLibrary, options: OptionState) -> Self {
        let mut workbench = Self {
            buffer,
            templates,
            options,
            chart_type: None,
            request: RequestState::Idle,
            artifact: None,
            error: None,
        };
        let first = workbench.templates.first().map(|t| t.chart_type.clone());
        if let Some(key) = first {
            // The key comes from the library itself, so this cannot miss.
            let _ = workbench.select_template(&key);
        }
        workbench
    }

    pub const fn buffer(&self) -> &B {
        &self.buffer
    }

    /// Direct access for user edits.
    pub const fn buffer_mut(&mut self) -> &mut B {
        &mut self.buffer
    }

    /// Replace the whole buffer text, as if the user had typed it.
    pub fn edit(&mut self, text: &str) {
        self.buffer.write(text);
    }

    pub const fn options(&self) -> &OptionState {
        &self.options
    }

    pub const fn templates(&self) -> &TemplateLibrary {
        &self.templates
    }

    /// Key of the last template successfully selected.
    pub fn chart_type(&self) -> Option<&str> {
        self.chart_type.as_deref()
    }

    pub const fn request_state(&self) -> RequestState {
        self.request
    }

    pub const fn is_processing(&self) -> bool {
        matches!(self.request, RequestState::InFlight { .. })
    }

    pub const fn artifact(&self) -> Option<&PreviewArtifact> {
        self.artifact.as_ref()
    }

    pub const fn error(&self) -> Option<&WorkbenchError> {
        self.error.as_ref()
    }

    /// Text for the message slot.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// Parse the buffer.
    ///
    /// A parse failure is recorded in the message slot and yields `None`.
    pub fn document(&mut self) -> Option<ChartDocument> {
        match ChartDocument::parse(&self.buffer.read()) {
            Ok(document) => Some(document),
            Err(err) => {
                debug!(error = %err, "document does not parse");
                self.error = Some(err.into());
                None
            }
        }
    }

    /// Load a fresh copy of a template, merged with the current options.
    ///
    /// # Errors
    ///
    /// [`WorkbenchError::UnknownTemplate`] when the library has no such key.
    /// The buffer and message slot are left untouched in that case.
    pub fn select_template(&mut self, chart_type: &str) -> Result<(), WorkbenchError> {
        let Some(template) = self.templates.get(chart_type) else {
            warn!(chart_type, "unknown chart template, selection ignored");
            return Err(WorkbenchError::UnknownTemplate(chart_type.to_string()));
        };
        let mut document = template.document.clone();
        self.options.apply_to(&mut document);
        self.chart_type = Some(chart_type.to_string());
        debug!(chart_type, theme = self.options.theme.as_str(), "template selected");
        self.rewrite(&document);
        Ok(())
    }

    /// Change the theme and merge it into the current document.
    pub fn select_theme(&mut self, theme: Theme) {
        self.options.theme = theme;
        debug!(theme = theme.as_str(), "theme selected");
        self.remerge();
    }

    /// Change the font override and merge it into the current document.
    ///
    /// `None` or a blank name clears the override without touching the
    /// document's own font.
    pub fn select_font_family(&mut self, family: Option<String>) {
        self.options.set_font_family(family);
        debug!(font_family = ?self.options.font_family, "font family selected");
        self.remerge();
    }

    /// Change the output format. The document is not touched.
    pub fn select_format(&mut self, format: OutputFormat) {
        self.options.format = format;
    }

    /// Accept a generate trigger.
    ///
    /// Returns `None` when a request is already in flight (the trigger is
    /// dropped) or when the buffer does not parse (the error is recorded and
    /// the workbench stays idle).
    pub fn begin_generate(&mut self) -> Option<RenderJob> {
        if self.is_processing() {
            debug!("generate dropped, render already in flight");
            return None;
        }
        let document = self.document()?;
        self.request = RequestState::InFlight {
            width: document.width(),
            height: document.height(),
        };
        Some(RenderJob {
            document,
            format: self.options.format,
        })
    }

    /// Apply the outcome of the job handed out by
    /// [`Workbench::begin_generate`] and return to idle.
    ///
    /// A result arriving while idle has no request to complete and is
    /// ignored.
    pub fn finish_generate(&mut self, result: Result<Artifact, RenderError>) {
        let RequestState::InFlight { width, height } = self.request else {
            warn!("render result arrived with no request in flight");
            return;
        };
        self.request = RequestState::Idle;
        match result {
            Ok(artifact) => {
                info!(kind = artifact.kind.as_str(), width, height, "preview updated");
                self.artifact = Some(PreviewArtifact {
                    artifact,
                    width,
                    height,
                });
                self.error = None;
            }
            Err(err) => {
                warn!(error = %err, "render failed, keeping previous preview");
                self.error = Some(err.into());
            }
        }
    }

    /// Run a full generate cycle against `backend` on the current thread.
    ///
    /// Returns `true` if a request was sent.
    pub fn generate(&mut self, backend: &dyn RenderBackend) -> bool {
        let Some(job) = self.begin_generate() else {
            return false;
        };
        let result = job.run(backend);
        self.finish_generate(result);
        true
    }

    fn remerge(&mut self) {
        let Some(mut document) = self.document() else {
            return;
        };
        self.options.apply_to(&mut document);
        self.rewrite(&document);
    }

    fn rewrite(&mut self, document: &ChartDocument) {
        self.buffer.write(&document.to_pretty_string());
        if matches!(self.error, Some(WorkbenchError::Parse(_))) {
            self.error = None;
        }
    }
}

impl<B> std::fmt::Debug for Workbench<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workbench")
            .field("options", &self.options)
            .field("chart_type", &self.chart_type)
            .field("request", &self.request)
            .field("artifact", &self.artifact.as_ref().map(|a| a.artifact.kind))
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}
