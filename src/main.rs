//! Chartpad - a terminal workbench for chart documents rendered by a
//! chart service.
//!
//! # Usage
//!
//! ```bash
//! chartpad
//! chartpad --theme dark --template pie chart.json
//! chartpad --format png --output chart.png chart.json
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chartpad::app::App;
use chartpad::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    save_config_flags,
};
use chartpad::options::{OptionState, OutputFormat, Theme};
use chartpad::render::{ArtifactKind, HttpRenderClient};
use chartpad::template::TemplateLibrary;
use chartpad::workbench::Workbench;

/// Edit chart documents and preview them through a rendering service
#[derive(Parser, Debug)]
#[command(name = "chartpad", version, about, long_about = None)]
struct Cli {
    /// Chart document (JSON) to edit; created on save if missing
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Rendering service base URL
    #[arg(long, value_name = "URL")]
    server: Option<String>,

    /// Output format requested from the service
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Color theme merged into the document
    #[arg(long, value_enum)]
    theme: Option<Theme>,

    /// Font family merged into the document
    #[arg(long, value_name = "NAME")]
    font: Option<String>,

    /// Chart template to start from
    #[arg(long, value_name = "KEY")]
    template: Option<String>,

    /// Show a text summary instead of drawing the preview
    #[arg(long)]
    no_images: bool,

    /// Force image rendering to use half-cell fallback mode
    #[arg(long)]
    force_half_cell: bool,

    /// Write log events to a file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Render once and write the artifact to PATH instead of starting the UI
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

impl Cli {
    /// The flags given on this command line, for layering over config files.
    fn config_flags(&self) -> ConfigFlags {
        ConfigFlags {
            server: self.server.clone(),
            format: self.format,
            theme: self.theme,
            font: self.font.clone(),
            template: self.template.clone(),
            no_images: self.no_images,
            force_half_cell: self.force_half_cell,
            log_file: self.log_file.clone(),
        }
    }
}

fn init_logging(log_file: Option<&Path>, headless: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if let Some(path) = log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        builder
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    } else if headless {
        builder.with_writer(std::io::stderr).init();
    } else {
        // The terminal belongs to the UI.
        builder.with_writer(std::io::sink).init();
    }
    Ok(())
}

fn option_state(flags: &ConfigFlags) -> OptionState {
    let mut options = OptionState {
        format: flags.format.unwrap_or_default(),
        theme: flags.theme.unwrap_or_default(),
        font_family: None,
    };
    options.set_font_family(flags.font.clone());
    options
}

/// Render once without the UI and write the artifact to `output`.
fn render_to_file(flags: &ConfigFlags, file: Option<&Path>, output: &Path) -> Result<()> {
    let mut workbench = Workbench::new(
        String::new(),
        TemplateLibrary::builtin(),
        option_state(flags),
    );
    if let Some(key) = flags.template.as_deref() {
        workbench.select_template(key)?;
    }
    if let Some(path) = file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        workbench.edit(&text);
    }

    let client = HttpRenderClient::new(flags.server_url());
    workbench.generate(&client);
    if let Some(err) = workbench.error() {
        anyhow::bail!("Render failed: {err}");
    }
    let preview = workbench
        .artifact()
        .context("Render produced no artifact")?;

    match preview.artifact.kind {
        ArtifactKind::Svg => std::fs::write(output, &preview.artifact.payload),
        ArtifactKind::Png => {
            let bytes = preview
                .artifact
                .raster_bytes()
                .context("Raster payload is not a base64 data URI")?;
            std::fs::write(output, bytes)
        }
    }
    .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(
        path = %output.display(),
        kind = preview.artifact.kind.as_str(),
        "artifact written"
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = cli.config_flags();

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    init_logging(effective.log_file.as_deref(), cli.output.is_some())?;

    if let Some(output) = cli.output.as_deref() {
        return render_to_file(&effective, cli.file.as_deref(), output);
    }

    // Run the application
    let mut app = App::new(cli.file)
        .with_server_url(effective.server_url())
        .with_options(option_state(&effective))
        .with_template(effective.template.clone())
        .with_images_enabled(!effective.no_images)
        .with_force_half_cell(effective.force_half_cell)
        .with_config_paths(
            Some(global_path.clone()),
            if local_path.exists() {
                Some(local_path.clone())
            } else {
                None
            },
        );

    app.run().context("Application error")
}
