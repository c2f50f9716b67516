use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::Frame;
use ratatui::layout::Rect;

use crate::app::{App, Message, Model};
use crate::editor::Direction;

use super::event_loop::ResizeDebouncer;

/// Lines moved per mouse wheel notch.
const WHEEL_LINES: usize = 3;

impl App {
    pub(super) fn handle_event(
        &self,
        event: Event,
        model: &Model,
        now_ms: u64,
        resize_debouncer: &mut ResizeDebouncer,
    ) -> Option<Message> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.handle_key(key, model),
            Event::Mouse(mouse) => self.handle_mouse(mouse, model),
            Event::Resize(w, h) => {
                resize_debouncer.queue(w, h, now_ms);
                None
            }
            _ => None,
        }
    }

    pub(super) fn handle_mouse(&self, mouse: MouseEvent, model: &Model) -> Option<Message> {
        let _ = self;
        if model.help_visible {
            return match mouse.kind {
                MouseEventKind::ScrollDown => Some(Message::HelpScrollDown),
                MouseEventKind::ScrollUp => Some(Message::HelpScrollUp),
                _ => None,
            };
        }

        let editor = crate::ui::screen_layout_for(model.terminal_size).editor;
        if !point_in_rect(mouse.column, mouse.row, editor) {
            return None;
        }
        match mouse.kind {
            MouseEventKind::ScrollDown => Some(Message::EditorScrollDown(WHEEL_LINES)),
            MouseEventKind::ScrollUp => Some(Message::EditorScrollUp(WHEEL_LINES)),
            _ => None,
        }
    }

    pub(super) fn handle_key(&self, key: KeyEvent, model: &Model) -> Option<Message> {
        let _ = self;
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if model.help_visible {
            return match key.code {
                KeyCode::Char('j') | KeyCode::Down => Some(Message::HelpScrollDown),
                KeyCode::Char('k') | KeyCode::Up => Some(Message::HelpScrollUp),
                _ => Some(Message::HideHelp),
            };
        }

        match key.code {
            // Application
            KeyCode::Char('q' | 'c') if ctrl => Some(Message::Quit),
            KeyCode::Char('s') if ctrl => Some(Message::Save),
            KeyCode::Char('g') if ctrl => Some(Message::Generate),
            KeyCode::F(1) => Some(Message::ToggleHelp),

            // Options
            KeyCode::F(5) => Some(Message::Generate),
            KeyCode::F(2) => Some(Message::NextTemplate),
            KeyCode::F(3) => Some(Message::NextTheme),
            KeyCode::F(4) => Some(Message::ToggleFormat),
            KeyCode::F(6) => Some(Message::NextFont),

            // Navigation
            KeyCode::Up => Some(Message::EditorMoveCursor(Direction::Up)),
            KeyCode::Down => Some(Message::EditorMoveCursor(Direction::Down)),
            KeyCode::Left => Some(Message::EditorMoveCursor(Direction::Left)),
            KeyCode::Right => Some(Message::EditorMoveCursor(Direction::Right)),
            KeyCode::Home if ctrl => Some(Message::EditorMoveToStart),
            KeyCode::End if ctrl => Some(Message::EditorMoveToEnd),
            KeyCode::Home => Some(Message::EditorMoveHome),
            KeyCode::End => Some(Message::EditorMoveEnd),
            KeyCode::PageUp => Some(Message::EditorPageUp),
            KeyCode::PageDown => Some(Message::EditorPageDown),

            // Editing
            KeyCode::Tab => Some(Message::EditorInsertTab),
            KeyCode::Enter => Some(Message::EditorSplitLine),
            KeyCode::Backspace => Some(Message::EditorDeleteBack),
            KeyCode::Delete => Some(Message::EditorDeleteForward),
            KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                Some(Message::EditorInsertChar(c))
            }

            _ => None,
        }
    }

    pub(super) fn view(model: &mut Model, frame: &mut Frame) {
        crate::ui::render(model, frame);
    }
}

const fn point_in_rect(col: u16, row: u16, rect: Rect) -> bool {
    col >= rect.x && col < rect.x + rect.width && row >= rect.y && row < rect.y + rect.height
}
