use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui_image::{Resize, StatefulImage};

use crate::app::Model;
use crate::workbench::PreviewArtifact;

use super::{overlays, screen_layout, status};

/// Render the complete UI.
pub fn render(model: &mut Model, frame: &mut Frame) {
    let area = frame.area();
    let layout = screen_layout(area);

    render_header(model, frame, layout.header);
    render_editor(model, frame, layout.editor);
    render_preview(model, frame, layout.preview);
    status::render_toast_bar(model, frame, layout.toast);
    status::render_status_bar(model, frame, layout.status);

    if model.help_visible {
        overlays::render_help_overlay(model, frame, area);
    }
}

fn render_header(model: &Model, frame: &mut Frame, area: Rect) {
    let options = model.workbench.options();
    let label = Style::default().fg(Color::Indexed(250));
    let value = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
    let font = options.font_family.as_deref().unwrap_or("default");
    let template = model.workbench.chart_type().unwrap_or("-");

    let mut spans = vec![
        Span::styled(" template ", label),
        Span::styled(template.to_string(), value),
        Span::styled("  theme ", label),
        Span::styled(options.theme.as_str(), value),
        Span::styled("  format ", label),
        Span::styled(options.format.as_str(), value),
        Span::styled("  font ", label),
        Span::styled(font.to_string(), value),
        Span::raw("  "),
    ];
    spans.push(if model.workbench.is_processing() {
        Span::styled(
            " Processing... ",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        )
    } else {
        Span::styled(
            " Generate (F5) ",
            Style::default().bg(Color::Green).fg(Color::Black),
        )
    });

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Blue));
    frame.render_widget(header, area);
}

fn render_editor(model: &Model, frame: &mut Frame, area: Rect) {
    let buf = model.buffer();
    let dirty_indicator = if buf.is_dirty() { " [modified]" } else { "" };
    let title = model.file_path.as_ref().and_then(|p| p.file_name()).map_or_else(
        || format!(" Document{dirty_indicator} "),
        |name| format!(" {}{dirty_indicator} ", name.to_string_lossy()),
    );
    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(area);

    // Line number gutter width
    let total_lines = buf.line_count();
    let gutter_width = line_number_width(total_lines);

    let visible_height = inner.height as usize;
    let start = model.editor_scroll_offset;
    let end = (start + visible_height).min(total_lines);
    let cursor = buf.cursor();

    let mut content: Vec<Line> = Vec::new();
    for line_idx in start..end {
        let line_text = buf.line_at(line_idx).unwrap_or_default();
        let line_num = format!("{:>width$} ", line_idx + 1, width = gutter_width as usize);

        let mut spans = vec![Span::styled(line_num, Style::default().fg(Color::DarkGray))];

        if line_idx == cursor.line {
            // Split line at cursor position for cursor rendering
            let col = cursor.col.min(line_text.len());
            let before = &line_text[..col];
            let cursor_char = line_text[col..].chars().next();
            let after = cursor_char.map_or("", |c| &line_text[col + c.len_utf8()..]);

            if !before.is_empty() {
                spans.push(Span::raw(before.to_string()));
            }
            spans.push(Span::styled(
                cursor_char.map_or_else(|| " ".to_string(), |c| c.to_string()),
                Style::default().bg(Color::White).fg(Color::Black),
            ));
            if !after.is_empty() {
                spans.push(Span::raw(after.to_string()));
            }
        } else {
            spans.push(Span::raw(line_text));
        }

        content.push(Line::from(spans));
    }

    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(content).block(block), area);
}

fn render_preview(model: &mut Model, frame: &mut Frame, area: Rect) {
    let block = Block::default().title(" Preview ").borders(Borders::ALL);
    let inner = block.inner(area);
    // Clear first so a previous image does not leak around a smaller one.
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let flush = model
        .workbench
        .artifact()
        .is_some_and(PreviewArtifact::is_unsized);
    if let Some(image) = model.preview_image.as_mut() {
        let rect = crate::preview::preview_rect(inner, image.cols, image.rows, flush);
        frame.render_stateful_widget(
            StatefulImage::default().resize(Resize::Fit(None)),
            rect,
            &mut image.protocol,
        );
        return;
    }

    let dim = Style::default().fg(Color::Indexed(245));
    let lines: Vec<Line> = match model.workbench.artifact() {
        Some(preview) => crate::preview::summary_lines(preview, inner.height as usize)
            .into_iter()
            .enumerate()
            .map(|(idx, line)| {
                if idx == 0 {
                    Line::styled(line, Style::default().add_modifier(Modifier::BOLD))
                } else {
                    Line::styled(line, dim)
                }
            })
            .collect(),
        None => vec![Line::styled("Press F5 to render the chart", dim)],
    };
    frame.render_widget(Paragraph::new(lines), inner);
}

/// Calculate the width needed for line numbers.
pub const fn line_number_width(total_lines: usize) -> u16 {
    if total_lines < 10 {
        1
    } else if total_lines < 100 {
        2
    } else if total_lines < 1_000 {
        3
    } else if total_lines < 10_000 {
        4
    } else if total_lines < 100_000 {
        5
    } else {
        6
    }
}
