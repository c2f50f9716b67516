//! Terminal UI components.
//!
//! The screen is a one-line header, the document editor and preview panes
//! side by side, and two footer lines (toast, status). [`screen_layout`] is
//! shared with the model so scrolling and image sizing agree with what is
//! drawn.

mod overlays;
mod render;
mod status;

pub use render::{line_number_width, render};

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::widgets::{Block, Borders};

pub const EDITOR_WIDTH_PERCENT: u16 = 50;
pub const PREVIEW_WIDTH_PERCENT: u16 = 50;

/// Areas of the main screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenLayout {
    pub header: Rect,
    pub editor: Rect,
    pub preview: Rect,
    pub toast: Rect,
    pub status: Rect,
}

impl ScreenLayout {
    /// Editor text area inside its border.
    pub fn editor_inner(&self) -> Rect {
        pane_block().inner(self.editor)
    }

    /// Preview drawing area inside its border.
    pub fn preview_inner(&self) -> Rect {
        pane_block().inner(self.preview)
    }
}

pub fn screen_layout(area: Rect) -> ScreenLayout {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(EDITOR_WIDTH_PERCENT),
            Constraint::Percentage(PREVIEW_WIDTH_PERCENT),
        ])
        .split(rows[1]);
    ScreenLayout {
        header: rows[0],
        editor: panes[0],
        preview: panes[1],
        toast: rows[2],
        status: rows[3],
    }
}

/// Layout for a terminal of the given size.
pub fn screen_layout_for(size: (u16, u16)) -> ScreenLayout {
    screen_layout(Rect::new(0, 0, size.0, size.1))
}

fn pane_block() -> Block<'static> {
    Block::default().borders(Borders::ALL)
}

#[cfg(test)]
mod tests;
