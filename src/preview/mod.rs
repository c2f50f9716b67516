//! Turning render artifacts into something the terminal can show.
//!
//! With a graphics-capable terminal the artifact is decoded into a bitmap
//! (SVG rasterized with resvg, PNG decoded from its data URI) and handed to a
//! `ratatui-image` protocol. Without one, [`summary_lines`] describes it.

#[cfg(unix)]
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use image::DynamicImage;
use ratatui::layout::Rect;
use ratatui_image::picker::Picker;
#[cfg(unix)]
use ratatui_image::picker::cap_parser::QueryStdioOptions;
use tracing::debug;

use crate::render::{Artifact, ArtifactKind};
use crate::workbench::PreviewArtifact;

const PICKER_QUERY_TIMEOUT_MS: u64 = 250;

/// Largest bitmap edge we are willing to allocate when rasterizing.
const MAX_RASTER_EDGE: u32 = 4096;

/// Create a picker for terminal image rendering.
///
/// The picker detects terminal capabilities and chooses the best protocol.
pub fn create_picker(force_half_cell: bool) -> Option<Picker> {
    if force_half_cell {
        debug!("forced half-cell image protocol");
        return Some(Picker::halfblocks());
    }

    // The stdio capability query can leave a reader stuck on the console
    // input buffer outside unix; use half-blocks there.
    #[cfg(not(unix))]
    {
        return Some(Picker::halfblocks());
    }

    #[cfg(unix)]
    {
        let picker = Picker::from_query_stdio_with_options(query_options()).ok()?;
        debug!(protocol = ?picker.protocol_type(), "terminal image protocol detected");
        Some(picker)
    }
}

#[cfg(unix)]
fn query_options() -> QueryStdioOptions {
    // `blacklist_protocols` is private upstream, so struct-update syntax is
    // unavailable; set the public field on the default instead.
    let mut options = QueryStdioOptions::default();
    options.timeout = Duration::from_millis(PICKER_QUERY_TIMEOUT_MS);
    options
}

/// Decode an artifact into a bitmap.
///
/// SVGs are rasterized at `width_px` when given, otherwise at their
/// intrinsic size.
///
/// # Errors
///
/// Returns an error if the SVG cannot be parsed or the raster payload is not
/// a decodable image.
pub fn decode_artifact(artifact: &Artifact, width_px: Option<u32>) -> Result<DynamicImage> {
    match artifact.kind {
        ArtifactKind::Svg => rasterize_svg(&artifact.payload, width_px),
        ArtifactKind::Png => {
            let bytes = artifact
                .raster_bytes()
                .ok_or_else(|| anyhow!("raster payload is not a base64 data URI"))?;
            image::load_from_memory(&bytes).context("failed to decode raster preview")
        }
    }
}

fn rasterize_svg(svg: &str, width_px: Option<u32>) -> Result<DynamicImage> {
    let mut opts = resvg::usvg::Options::default();
    opts.fontdb_mut().load_system_fonts();

    let tree = resvg::usvg::Tree::from_str(svg, &opts).context("failed to parse SVG preview")?;
    let size = tree.size();

    #[allow(clippy::cast_precision_loss)]
    let target = width_px.filter(|w| *w > 0).map_or(size.width(), |w| w as f32);
    #[allow(clippy::cast_precision_loss)]
    let max_scale = MAX_RASTER_EDGE as f32 / size.width().max(size.height());
    let scale = (target / size.width()).min(max_scale);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let width = (size.width() * scale).ceil().max(1.0) as u32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let height = (size.height() * scale).ceil().max(1.0) as u32;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| anyhow!("failed to create pixmap {width}x{height}"))?;

    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    let rgba = pixmap.data().to_vec();
    let img_buf = image::RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| anyhow!("failed to create image from pixmap data"))?;

    Ok(DynamicImage::ImageRgba8(img_buf))
}

/// Cells needed to show a `px_width`×`px_height` bitmap at the given font
/// cell size, rounded up.
pub fn cell_size(px_width: u32, px_height: u32, font_size: (u16, u16)) -> (u16, u16) {
    let (fw, fh) = (u32::from(font_size.0.max(1)), u32::from(font_size.1.max(1)));
    let cols = u16::try_from(px_width.div_ceil(fw)).unwrap_or(u16::MAX);
    let rows = u16::try_from(px_height.div_ceil(fh)).unwrap_or(u16::MAX);
    (cols.max(1), rows.max(1))
}

/// Where to draw a `cols`×`rows` preview inside `pane`.
///
/// Unsized (0×0) artifacts sit flush at the pane origin; everything else is
/// centered. The result never exceeds the pane.
pub fn preview_rect(pane: Rect, cols: u16, rows: u16, flush: bool) -> Rect {
    let width = cols.min(pane.width);
    let height = rows.min(pane.height);
    if flush {
        return Rect::new(pane.x, pane.y, width, height);
    }
    Rect::new(
        pane.x + (pane.width - width) / 2,
        pane.y + (pane.height - height) / 2,
        width,
        height,
    )
}

/// Text description of an artifact for terminals without graphics.
pub fn summary_lines(preview: &PreviewArtifact, max_lines: usize) -> Vec<String> {
    let artifact = &preview.artifact;
    let mut lines = vec![format!(
        "{} {}x{} ({} bytes)",
        artifact.kind.as_str(),
        preview.width,
        preview.height,
        artifact.payload.len()
    )];
    match artifact.kind {
        ArtifactKind::Svg => lines.extend(
            artifact
                .payload
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .take(max_lines.saturating_sub(1))
                .map(ToString::to_string),
        ),
        ArtifactKind::Png => {
            let size = artifact.raster_bytes().map_or(0, |b| b.len());
            lines.push(format!("raster image, {size} bytes decoded"));
        }
    }
    lines.truncate(max_lines);
    lines
}
