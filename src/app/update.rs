use tracing::warn;

use crate::app::{Model, ToastLevel};
use crate::editor::Direction;
use crate::render::{Artifact, Metadata, RenderError};
use crate::workbench::WorkbenchError;

/// Spaces inserted by the Tab key.
const TAB_TEXT: &str = "  ";

/// All possible events and actions in the application.
///
/// These represent user input, worker completions, and internal actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Editor
    /// Insert a character at the cursor
    EditorInsertChar(char),
    /// Insert indentation at the cursor (Tab)
    EditorInsertTab,
    /// Delete character before cursor (Backspace)
    EditorDeleteBack,
    /// Delete character at cursor (Delete)
    EditorDeleteForward,
    /// Split line at cursor (Enter)
    EditorSplitLine,
    /// Move cursor in a direction
    EditorMoveCursor(Direction),
    /// Move cursor to beginning of line (Home)
    EditorMoveHome,
    /// Move cursor to end of line (End)
    EditorMoveEnd,
    /// Move cursor to start of buffer (Ctrl+Home)
    EditorMoveToStart,
    /// Move cursor to end of buffer (Ctrl+End)
    EditorMoveToEnd,
    /// Move cursor up one page
    EditorPageUp,
    /// Move cursor down one page
    EditorPageDown,
    /// Scroll editor viewport up by n lines
    EditorScrollUp(usize),
    /// Scroll editor viewport down by n lines
    EditorScrollDown(usize),

    // Options
    /// Load the next chart template
    NextTemplate,
    /// Switch to the next color theme
    NextTheme,
    /// Toggle between svg and png output
    ToggleFormat,
    /// Cycle the font family override
    NextFont,

    // Rendering
    /// Render the current document
    Generate,
    /// A render request completed
    RenderFinished(Result<Artifact, RenderError>),
    /// The service metadata request completed
    MetadataLoaded(Result<Metadata, RenderError>),

    // File
    /// Save the document to its file
    Save,

    // Help
    /// Toggle help overlay
    ToggleHelp,
    /// Hide help overlay
    HideHelp,
    /// Scroll help overlay up
    HelpScrollUp,
    /// Scroll help overlay down
    HelpScrollDown,

    // Window
    /// Terminal resized
    Resize(u16, u16),

    // Application
    /// Quit the application
    Quit,
}

/// Pure function that updates the model based on a message.
///
/// This is the core of TEA - all state transitions happen here. File I/O,
/// threads and image decoding are left to the side-effect handler.
pub fn update(mut model: Model, msg: Message) -> Model {
    // Save preserves the flag so Ctrl+S can complete a pending quit.
    if !matches!(msg, Message::Quit | Message::Save) {
        model.quit_confirmed = false;
    }

    match msg {
        // Editor
        Message::EditorInsertChar(ch) => {
            model.workbench.buffer_mut().insert_char(ch);
            editor_ensure_cursor_visible(&mut model);
        }
        Message::EditorInsertTab => {
            model.workbench.buffer_mut().insert_str(TAB_TEXT);
            editor_ensure_cursor_visible(&mut model);
        }
        Message::EditorDeleteBack => {
            model.workbench.buffer_mut().delete_back();
            editor_ensure_cursor_visible(&mut model);
        }
        Message::EditorDeleteForward => {
            model.workbench.buffer_mut().delete_forward();
        }
        Message::EditorSplitLine => {
            model.workbench.buffer_mut().split_line();
            editor_ensure_cursor_visible(&mut model);
        }
        Message::EditorMoveCursor(dir) => {
            model.workbench.buffer_mut().move_cursor(dir);
            editor_ensure_cursor_visible(&mut model);
        }
        Message::EditorMoveHome => {
            model.workbench.buffer_mut().move_home();
        }
        Message::EditorMoveEnd => {
            model.workbench.buffer_mut().move_end();
        }
        Message::EditorMoveToStart => {
            model.workbench.buffer_mut().move_to_start();
            editor_ensure_cursor_visible(&mut model);
        }
        Message::EditorMoveToEnd => {
            model.workbench.buffer_mut().move_to_end();
            editor_ensure_cursor_visible(&mut model);
        }
        Message::EditorPageUp | Message::EditorPageDown => {
            let page = isize::try_from(model.editor_visible_rows().max(1)).unwrap_or(isize::MAX);
            let delta = if msg == Message::EditorPageUp {
                -page
            } else {
                page
            };
            model.workbench.buffer_mut().move_lines(delta);
            editor_ensure_cursor_visible(&mut model);
        }
        Message::EditorScrollUp(n) => {
            model.editor_scroll_offset = model.editor_scroll_offset.saturating_sub(n);
        }
        Message::EditorScrollDown(n) => {
            let max = model.buffer().line_count().saturating_sub(1);
            model.editor_scroll_offset = (model.editor_scroll_offset + n).min(max);
        }

        // Options
        Message::NextTemplate => {
            let current = model.workbench.chart_type().unwrap_or_default();
            let next = model
                .workbench
                .templates()
                .next_key(current)
                .map(ToString::to_string);
            if let Some(key) = next {
                select_template(&mut model, &key);
            }
        }
        Message::NextTheme => {
            let theme = model.workbench.options().theme.next();
            model.workbench.select_theme(theme);
            report_merge(&mut model, format!("Theme: {}", theme.as_str()));
        }
        Message::ToggleFormat => {
            let format = model.workbench.options().format.toggled();
            model.workbench.select_format(format);
            model.show_toast(ToastLevel::Info, format!("Format: {}", format.as_str()));
        }
        Message::NextFont => {
            let family = model.next_font_family();
            let label = family.clone().unwrap_or_else(|| "default".to_string());
            model.workbench.select_font_family(family);
            report_merge(&mut model, format!("Font: {label}"));
        }

        // Rendering
        Message::Generate => {
            let was_processing = model.workbench.is_processing();
            model.pending_job = model.workbench.begin_generate();
            if model.pending_job.is_none() {
                if was_processing {
                    model.show_toast(ToastLevel::Info, "Render already in progress");
                } else if let Some(message) = model.workbench.error_message() {
                    model.show_toast(ToastLevel::Error, message);
                }
            }
        }
        Message::RenderFinished(result) => {
            model.workbench.finish_generate(result);
            if let Some(WorkbenchError::Render(err)) = model.workbench.error() {
                let message = err.to_string();
                model.show_toast(ToastLevel::Error, message);
            }
        }
        Message::MetadataLoaded(result) => match result {
            Ok(metadata) => model.set_metadata(metadata),
            Err(err) => warn!(error = %err, "service metadata unavailable"),
        },

        // Help
        Message::ToggleHelp => {
            model.help_visible = !model.help_visible;
            model.help_scroll_offset = 0;
        }
        Message::HideHelp => {
            model.help_visible = false;
        }
        Message::HelpScrollUp => {
            model.help_scroll_offset = model.help_scroll_offset.saturating_sub(1);
        }
        Message::HelpScrollDown => {
            model.help_scroll_offset += 1;
        }

        // Window
        Message::Resize(width, height) => {
            model.terminal_size = (width, height);
            editor_ensure_cursor_visible(&mut model);
        }

        // Handled as side effects
        Message::Save => {}

        // Application
        Message::Quit => {
            if model.is_dirty() && !model.quit_confirmed {
                let hint = if model.file_path.is_some() {
                    "Unsaved changes! Press Ctrl+Q again to quit, or Ctrl+S to save"
                } else {
                    "Unsaved changes! Press Ctrl+Q again to quit"
                };
                model.show_toast(ToastLevel::Warning, hint);
                model.quit_confirmed = true;
            } else {
                model.should_quit = true;
            }
        }
    }
    model
}

/// Load a template by key, reporting an unknown key as a warning.
pub(super) fn select_template(model: &mut Model, key: &str) {
    match model.workbench.select_template(key) {
        Ok(()) => {
            editor_ensure_cursor_visible(model);
            model.show_toast(ToastLevel::Info, format!("Template: {key}"));
        }
        Err(err) => model.show_toast(ToastLevel::Warning, err.to_string()),
    }
}

/// Confirm an option change, or explain why the document was left alone.
fn report_merge(model: &mut Model, applied: String) {
    if let Some(WorkbenchError::Parse(err)) = model.workbench.error() {
        let message = format!("{applied} (document not updated: {err})");
        model.show_toast(ToastLevel::Warning, message);
    } else {
        editor_ensure_cursor_visible(model);
        model.show_toast(ToastLevel::Info, applied);
    }
}

/// Ensure the editor cursor line is visible in the viewport.
pub(super) fn editor_ensure_cursor_visible(model: &mut Model) {
    let cursor_line = model.buffer().cursor().line;
    let visible_height = model.editor_visible_rows();
    if visible_height == 0 {
        model.editor_scroll_offset = cursor_line;
        return;
    }

    if cursor_line < model.editor_scroll_offset {
        model.editor_scroll_offset = cursor_line;
    } else if cursor_line >= model.editor_scroll_offset + visible_height {
        model.editor_scroll_offset = cursor_line + 1 - visible_height;
    }
}
