use std::io::stdout;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use ratatui::DefaultTerminal;
use tracing::{debug, info, warn};

use crate::app::{App, Message, Model, update};
use crate::editor::EditorBuffer;
use crate::render::HttpRenderClient;
use crate::workbench::Workbench;

use super::effects::RenderDispatcher;

pub(super) struct ResizeDebouncer {
    delay_ms: u64,
    pending: Option<(u16, u16, u64)>,
}

impl ResizeDebouncer {
    pub(super) const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub(super) const fn queue(&mut self, width: u16, height: u16, now_ms: u64) {
        self.pending = Some((width, height, now_ms));
    }

    pub(super) fn take_ready(&mut self, now_ms: u64) -> Option<(u16, u16)> {
        let (width, height, queued_at) = self.pending?;
        if now_ms.saturating_sub(queued_at) >= self.delay_ms {
            self.pending = None;
            Some((width, height))
        } else {
            None
        }
    }

    pub(super) const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl App {
    /// Run the main event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal initialization, loading the document
    /// file, or the event loop encounters an I/O failure.
    pub fn run(&mut self) -> Result<()> {
        // Create image picker BEFORE initializing terminal (queries stdio)
        let picker = if self.images_enabled {
            crate::preview::create_picker(self.force_half_cell)
        } else {
            None
        };

        let mut model = self.build_model(picker)?;

        let client = HttpRenderClient::new(self.server_url.clone());
        info!(server = client.base_url(), "using rendering service");
        let (tx, rx) = std::sync::mpsc::channel();
        let dispatcher = RenderDispatcher::new(std::sync::Arc::new(client), tx);
        dispatcher.spawn_metadata();

        // Initialize terminal
        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal - chartpad requires an interactive terminal")?;
        let size = terminal.size()?;
        model = update(model, Message::Resize(size.width, size.height));

        // Main loop
        let result = self.event_loop(&mut terminal, &mut model, &dispatcher, &rx);

        // Restore terminal
        let _ = execute!(stdout(), DisableMouseCapture);
        ratatui::restore();

        result
    }

    /// Build the initial model: starting template, options and the
    /// document file, if any.
    pub(super) fn build_model(&self, picker: Option<ratatui_image::picker::Picker>) -> Result<Model> {
        let workbench = Workbench::new(
            EditorBuffer::empty(),
            crate::template::TemplateLibrary::builtin(),
            self.options.clone(),
        );
        let mut model = Model::new(workbench, (80, 24)).with_picker(picker);
        model.images_enabled = self.images_enabled;
        model.server_url.clone_from(&self.server_url);
        model
            .config_global_path
            .clone_from(&self.config_global_path);
        model.config_local_path.clone_from(&self.config_local_path);

        if let Some(key) = &self.template {
            super::update::select_template(&mut model, key);
            model.workbench.buffer_mut().mark_clean();
        }
        if let Some(path) = &self.file_path {
            if path.exists() {
                model.load_file(path)?;
            } else {
                debug!(path = %path.display(), "new document file");
                model.file_path = Some(path.clone());
            }
        }
        Ok(model)
    }

    fn event_loop(
        &self,
        terminal: &mut DefaultTerminal,
        model: &mut Model,
        dispatcher: &RenderDispatcher,
        rx: &Receiver<Message>,
    ) -> Result<()> {
        let start = Instant::now();
        let mut resize_debouncer = ResizeDebouncer::new(100);
        let mut needs_render = true;
        execute!(stdout(), EnableMouseCapture)?;

        loop {
            if model.expire_toast(Instant::now()) {
                needs_render = true;
            }

            let now_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

            if let Some((width, height)) = resize_debouncer.take_ready(now_ms) {
                debug!(width, height, "terminal resized");
                let msg = Message::Resize(width, height);
                *model = update(std::mem::take(model), msg.clone());
                self.handle_message_side_effects(model, dispatcher, &msg);
                needs_render = true;
            }

            // Results from render and metadata workers
            while let Ok(msg) = rx.try_recv() {
                debug!(msg = message_label(&msg), "worker message");
                let side_msg = msg.clone();
                *model = update(std::mem::take(model), msg);
                self.handle_message_side_effects(model, dispatcher, &side_msg);
                needs_render = true;
            }

            // Handle events
            let poll_ms = if needs_render {
                0
            } else if resize_debouncer.is_pending() || model.workbench.is_processing() {
                10
            } else {
                250
            };
            if event::poll(Duration::from_millis(poll_ms))? {
                // Refresh timestamp after poll wait so debouncers use accurate times.
                let event_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                let event = event::read()?;
                if let Some(msg) = self.handle_event(event, model, event_ms, &mut resize_debouncer)
                {
                    self.dispatch(model, dispatcher, msg);
                    needs_render = true;
                }

                // Coalesce key repeat bursts into a single render.
                while event::poll(Duration::from_millis(0))? {
                    let drain_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                    let event = event::read()?;
                    if let Some(msg) =
                        self.handle_event(event, model, drain_ms, &mut resize_debouncer)
                    {
                        self.dispatch(model, dispatcher, msg);
                        needs_render = true;
                    }
                }
            }

            if needs_render {
                terminal
                    .draw(|frame| Self::view(model, frame))
                    .inspect_err(|err| warn!(error = %err, "draw failed"))?;
                needs_render = false;
            }

            if model.should_quit {
                break;
            }
        }
        let _ = execute!(stdout(), DisableMouseCapture);
        if model.workbench.is_processing() {
            debug!("quit with a render in flight; result discarded");
        }
        Ok(())
    }

    fn dispatch(&self, model: &mut Model, dispatcher: &RenderDispatcher, msg: Message) {
        debug!(msg = message_label(&msg), "input message");
        let side_msg = msg.clone();
        *model = update(std::mem::take(model), msg);
        self.handle_message_side_effects(model, dispatcher, &side_msg);
    }
}

/// Short name for logging, without artifact payloads.
fn message_label(msg: &Message) -> String {
    match msg {
        Message::RenderFinished(Ok(artifact)) => {
            format!("RenderFinished(Ok({}, {} bytes))", artifact.kind.as_str(), artifact.payload.len())
        }
        other => format!("{other:?}"),
    }
}
