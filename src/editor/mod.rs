//! Text buffer behind the chart document editor pane.
//!
//! The workbench only needs to read and replace the whole document text, so
//! it sees buffers through [`DocumentBuffer`]. The terminal UI uses the
//! rope-backed [`EditorBuffer`]; headless rendering uses a plain `String`.

mod buffer;

pub use buffer::{Cursor, Direction, EditorBuffer};

/// Opaque text storage holding the current chart document.
pub trait DocumentBuffer {
    /// The full current text.
    fn read(&self) -> String;

    /// Replace the full text. No validation is performed.
    fn write(&mut self, text: &str);
}

impl DocumentBuffer for String {
    fn read(&self) -> String {
        self.clone()
    }

    fn write(&mut self, text: &str) {
        text.clone_into(self);
    }
}
