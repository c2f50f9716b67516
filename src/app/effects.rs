use std::sync::Arc;
use std::sync::mpsc::Sender;

use tracing::{debug, warn};

use crate::app::{App, Message, Model, ToastLevel};
use crate::render::RenderBackend;
use crate::workbench::RenderJob;

/// Runs blocking service calls off the UI thread and reports back through
/// the event loop's message channel.
#[derive(Clone)]
pub(super) struct RenderDispatcher {
    backend: Arc<dyn RenderBackend>,
    tx: Sender<Message>,
}

impl RenderDispatcher {
    pub(super) fn new(backend: Arc<dyn RenderBackend>, tx: Sender<Message>) -> Self {
        Self { backend, tx }
    }

    pub(super) fn spawn_render(&self, job: RenderJob) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let result = job.run(backend.as_ref());
            // The receiver is gone once the app has quit.
            let _ = tx.send(Message::RenderFinished(result));
        });
    }

    pub(super) fn spawn_metadata(&self) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let _ = tx.send(Message::MetadataLoaded(backend.metadata()));
        });
    }
}

impl App {
    pub(super) fn handle_message_side_effects(
        &self,
        model: &mut Model,
        dispatcher: &RenderDispatcher,
        msg: &Message,
    ) {
        match msg {
            Message::Generate => {
                if let Some(job) = model.pending_job.take() {
                    debug!(format = job.format.as_str(), "dispatching render");
                    dispatcher.spawn_render(job);
                }
            }
            Message::RenderFinished(Ok(_)) | Message::Resize(..) => {
                Self::refresh_preview(model);
            }
            Message::Save => match model.save_file() {
                Ok(Some(path)) => {
                    model.show_toast(ToastLevel::Info, format!("Saved {}", path.display()));
                }
                Ok(None) => {
                    model.show_toast(ToastLevel::Warning, "No file to save to");
                }
                Err(err) => {
                    warn!(error = %err, "save failed");
                    model.show_toast(ToastLevel::Error, format!("Save failed: {err}"));
                }
            },
            _ => {}
        }
    }

    fn refresh_preview(model: &mut Model) {
        if let Err(err) = model.refresh_preview_image() {
            warn!(error = %err, "preview image unavailable");
            model.show_toast(ToastLevel::Warning, format!("Preview unavailable: {err}"));
        }
    }
}
