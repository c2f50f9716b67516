use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{Model, ToastLevel};

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let buffer = model.buffer();
    let position = format!(
        "Ln {}, Col {}",
        buffer.cursor().line + 1,
        buffer.cursor_char_col() + 1
    );

    if let Some(message) = model.workbench.error_message() {
        let status = format!(" {position}  error: {message}");
        let bar = Paragraph::new(status).style(Style::default().bg(Color::Red).fg(Color::White));
        frame.render_widget(bar, area);
        return;
    }

    let artifact_info = model.workbench.artifact().map_or_else(
        || "no preview".to_string(),
        |preview| {
            format!(
                "{} {}x{}",
                preview.artifact.kind.as_str(),
                preview.width,
                preview.height
            )
        },
    );
    let version = model
        .service_version
        .as_deref()
        .map_or_else(String::new, |v| format!(" v{v}"));

    let status = format!(
        " {position}  [{artifact_info}]  {}{version}  F1:help",
        model.server_url
    );

    let status_bar =
        Paragraph::new(status).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(status_bar, area);
}

pub fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        ToastLevel::Info => (
            "[info]",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        ToastLevel::Error => ("[error]", Style::default().bg(Color::Red).fg(Color::White)),
    };
    let toast = Paragraph::new(format!("{prefix} {message}")).style(style);
    frame.render_widget(toast, area);
}
