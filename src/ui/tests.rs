use super::*;
use crate::app::{Message, Model, update};
use crate::editor::EditorBuffer;
use crate::options::OptionState;
use crate::render::{Artifact, RenderError};
use crate::template::TemplateLibrary;
use crate::workbench::Workbench;
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::style::Color;
use ratatui_image::picker::Picker;

const RED_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20"><rect width="40" height="20" fill="#ff0000"/></svg>"##;

fn create_test_terminal() -> Terminal<TestBackend> {
    let backend = TestBackend::new(80, 24);
    Terminal::new(backend).unwrap()
}

fn create_test_model() -> Model {
    let workbench = Workbench::new(
        EditorBuffer::empty(),
        TemplateLibrary::builtin(),
        OptionState::default(),
    );
    Model::new(workbench, (80, 24))
}

fn should_run_image_tests() -> bool {
    std::env::var("CHARTPAD_RUN_IMAGE_TESTS")
        .ok()
        .as_deref()
        .is_some_and(|v| v == "1")
}

/// Finish a render of `text` with `artifact`.
fn with_artifact(mut model: Model, text: &str, artifact: Artifact) -> Model {
    model.workbench.edit(text);
    let model = update(model, Message::Generate);
    update(model, Message::RenderFinished(Ok(artifact)))
}

fn draw(model: &mut Model) -> Terminal<TestBackend> {
    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(model, frame)).unwrap();
    terminal
}

fn row_text(terminal: &Terminal<TestBackend>, row: u16) -> String {
    let buffer = terminal.backend().buffer();
    (0..buffer.area.width)
        .map(|col| buffer[(col, row)].symbol())
        .collect()
}

fn screen_text(terminal: &Terminal<TestBackend>) -> String {
    let buffer = terminal.backend().buffer();
    (0..buffer.area.height)
        .map(|row| row_text(terminal, row))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_screen_layout_splits_panes_evenly() {
    let layout = screen_layout(Rect::new(0, 0, 80, 24));
    assert_eq!(layout.header, Rect::new(0, 0, 80, 1));
    assert_eq!(layout.editor, Rect::new(0, 1, 40, 21));
    assert_eq!(layout.preview, Rect::new(40, 1, 40, 21));
    assert_eq!(layout.toast, Rect::new(0, 22, 80, 1));
    assert_eq!(layout.status, Rect::new(0, 23, 80, 1));
}

#[test]
fn test_pane_inner_areas_exclude_borders() {
    let layout = screen_layout_for((80, 24));
    assert_eq!(layout.editor_inner(), Rect::new(1, 2, 38, 19));
    assert_eq!(layout.preview_inner(), Rect::new(41, 2, 38, 19));
}

#[test]
fn test_line_number_width() {
    assert_eq!(line_number_width(9), 1);
    assert_eq!(line_number_width(10), 2);
    assert_eq!(line_number_width(999), 3);
    assert_eq!(line_number_width(1_000), 4);
}

#[test]
fn test_header_shows_selections_and_generate_button() {
    let mut model = create_test_model();
    let terminal = draw(&mut model);
    let header = row_text(&terminal, 0);
    assert!(header.contains("template barBasic"), "{header}");
    assert!(header.contains("theme grafana"), "{header}");
    assert!(header.contains("format svg"), "{header}");
    assert!(header.contains("font default"), "{header}");
    assert!(header.contains("Generate (F5)"), "{header}");
}

#[test]
fn test_header_shows_processing_while_in_flight() {
    let mut model = update(create_test_model(), Message::Generate);
    let terminal = draw(&mut model);
    let header = row_text(&terminal, 0);
    assert!(header.contains("Processing..."), "{header}");
    assert!(!header.contains("Generate (F5)"), "{header}");
}

#[test]
fn test_editor_shows_numbered_lines() {
    let mut model = create_test_model();
    model.workbench.edit("{\n  \"a\": 1\n}");
    let terminal = draw(&mut model);
    assert!(row_text(&terminal, 2).starts_with("│1 {"), "{}", row_text(&terminal, 2));
    assert!(row_text(&terminal, 3).starts_with("│2   \"a\": 1"));
    assert!(row_text(&terminal, 4).starts_with("│3 }"));
}

#[test]
fn test_editor_cursor_cell_is_highlighted() {
    let mut model = create_test_model();
    model.workbench.edit("{}");
    let terminal = draw(&mut model);
    let buffer = terminal.backend().buffer();
    // Border, one-digit gutter, space
    let cell = &buffer[(3, 2)];
    assert_eq!(cell.symbol(), "{");
    assert_eq!(cell.bg, Color::White);
}

#[test]
fn test_editor_title_marks_unsaved_changes() {
    let mut model = update(create_test_model(), Message::EditorInsertChar(' '));
    let terminal = draw(&mut model);
    assert!(row_text(&terminal, 1).contains("[modified]"));
}

#[test]
fn test_editor_follows_scroll_offset() {
    let mut model = create_test_model();
    let text: String = (0..50).map(|i| format!("row{i}\n")).collect();
    model.workbench.edit(&text);
    model.editor_scroll_offset = 10;
    let terminal = draw(&mut model);
    assert!(row_text(&terminal, 2).contains("11 row10"));
}

#[test]
fn test_preview_placeholder_before_first_render() {
    let mut model = create_test_model();
    let terminal = draw(&mut model);
    assert!(screen_text(&terminal).contains("Press F5 to render the chart"));
}

#[test]
fn test_preview_summary_without_graphics() {
    let mut model = with_artifact(
        create_test_model(),
        r#"{"width": 600, "height": 400}"#,
        Artifact::svg("<svg>\n<rect/>\n</svg>"),
    );
    let terminal = draw(&mut model);
    let row = row_text(&terminal, 2);
    assert!(row.contains("svg 600x400"), "{row}");
    assert!(row_text(&terminal, 3).contains("<svg>"));
}

#[test]
fn test_status_bar_shows_error_slot() {
    let model = update(create_test_model(), Message::Generate);
    let mut model = update(
        model,
        Message::RenderFinished(Err(RenderError::Service {
            status: 400,
            message: "invalid color".to_string(),
        })),
    );
    let terminal = draw(&mut model);
    let status = row_text(&terminal, 23);
    assert!(status.contains("error: invalid color"), "{status}");
}

#[test]
fn test_status_bar_column_counts_characters() {
    let mut model = create_test_model();
    model.workbench.edit("\"日本\"");
    let mut model = update(model, Message::EditorMoveEnd);
    let terminal = draw(&mut model);
    let status = row_text(&terminal, 23);
    assert!(status.contains("Ln 1, Col 5"), "{status}");
}

#[test]
fn test_status_bar_shows_last_artifact() {
    let mut model = with_artifact(
        create_test_model(),
        r#"{"width": 300, "height": 200}"#,
        Artifact::svg("<svg/>"),
    );
    model.server_url = "http://charts.local".to_string();
    let terminal = draw(&mut model);
    let status = row_text(&terminal, 23);
    assert!(status.contains("[svg 300x200]"), "{status}");
    assert!(status.contains("http://charts.local"), "{status}");
}

#[test]
fn test_toast_bar_renders_level_prefix() {
    let mut model = update(create_test_model(), Message::NextTheme);
    let terminal = draw(&mut model);
    let toast = row_text(&terminal, 22);
    assert!(toast.starts_with("[info] Theme: light"), "{toast}");
}

#[test]
fn test_help_overlay_lists_chart_keys() {
    let mut model = update(create_test_model(), Message::ToggleHelp);
    let terminal = draw(&mut model);
    let text = screen_text(&terminal);
    assert!(text.contains("Help"));
    assert!(text.contains("Next template"));
    assert!(text.contains("Generate preview"));
}

#[test]
fn test_refresh_preview_image_builds_protocol() {
    let mut model = with_artifact(
        create_test_model(),
        r#"{"width": 40, "height": 20}"#,
        Artifact::svg(RED_SVG),
    );
    model.picker = Some(Picker::halfblocks());
    model.refresh_preview_image().unwrap();
    let image = model.preview_image.as_ref().unwrap();
    assert!(image.cols > 0 && image.rows > 0);
}

#[test]
fn test_refresh_preview_image_respects_disabled_images() {
    let mut model = with_artifact(create_test_model(), "{}", Artifact::svg(RED_SVG));
    model.picker = Some(Picker::halfblocks());
    model.images_enabled = false;
    model.refresh_preview_image().unwrap();
    assert!(model.preview_image.is_none());
}

#[test]
fn test_refresh_preview_image_reports_bad_markup() {
    let mut model = with_artifact(create_test_model(), "{}", Artifact::svg("not svg"));
    model.picker = Some(Picker::halfblocks());
    assert!(model.refresh_preview_image().is_err());
    assert!(model.preview_image.is_none());
}

#[test]
#[ignore = "requires image rendering; set CHARTPAD_RUN_IMAGE_TESTS=1"]
fn test_unsized_preview_is_drawn_at_pane_origin() {
    if !should_run_image_tests() {
        return;
    }
    let mut model = with_artifact(create_test_model(), "{}", Artifact::svg(RED_SVG));
    model.picker = Some(Picker::halfblocks());
    model.refresh_preview_image().unwrap();

    let terminal = draw(&mut model);
    let buffer = terminal.backend().buffer();
    let inner = screen_layout_for((80, 24)).preview_inner();
    let cell = &buffer[(inner.x, inner.y)];
    assert!(
        matches!(cell.fg, Color::Rgb(255, 0, 0)) || matches!(cell.bg, Color::Rgb(255, 0, 0)),
        "Should render red preview at the pane origin"
    );
}

#[test]
#[ignore = "requires image rendering; set CHARTPAD_RUN_IMAGE_TESTS=1"]
fn test_sized_preview_is_centered() {
    if !should_run_image_tests() {
        return;
    }
    let mut model = with_artifact(
        create_test_model(),
        r#"{"width": 40, "height": 20}"#,
        Artifact::svg(RED_SVG),
    );
    model.picker = Some(Picker::halfblocks());
    model.refresh_preview_image().unwrap();

    let terminal = draw(&mut model);
    let buffer = terminal.backend().buffer();
    let inner = screen_layout_for((80, 24)).preview_inner();
    let origin = &buffer[(inner.x, inner.y)];
    assert!(!matches!(origin.bg, Color::Rgb(255, 0, 0)));
    let has_red_cells = buffer.content().iter().any(|c| {
        matches!(c.fg, Color::Rgb(255, 0, 0)) || matches!(c.bg, Color::Rgb(255, 0, 0))
    });
    assert!(has_red_cells, "Should render red test image with Rgb(255,0,0) color cells");
}
