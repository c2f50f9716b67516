use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::options::{OutputFormat, Theme};

/// Rendering service used when no `--server` is configured.
pub const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub server: Option<String>,
    pub format: Option<OutputFormat>,
    pub theme: Option<Theme>,
    pub font: Option<String>,
    pub template: Option<String>,
    pub no_images: bool,
    pub force_half_cell: bool,
    pub log_file: Option<PathBuf>,
}

impl ConfigFlags {
    /// Layer `other` over `self`: valued flags from `other` win, switches
    /// are OR-ed.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            server: other.server.clone().or_else(|| self.server.clone()),
            format: other.format.or(self.format),
            theme: other.theme.or(self.theme),
            font: other.font.clone().or_else(|| self.font.clone()),
            template: other.template.clone().or_else(|| self.template.clone()),
            no_images: self.no_images || other.no_images,
            force_half_cell: self.force_half_cell || other.force_half_cell,
            log_file: other.log_file.clone().or_else(|| self.log_file.clone()),
        }
    }

    pub fn server_url(&self) -> &str {
        self.server.as_deref().unwrap_or(DEFAULT_SERVER)
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("chartpad").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("chartpad")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("chartpad").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("chartpad")
                .join("config");
        }
    }

    local_override_path()
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".chartpadrc")
}

/// Read flags from a config file. A missing file yields no flags.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(split_tokens)
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

/// Split a config line on whitespace, keeping double-quoted runs together.
fn split_tokens(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;
    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if has_token {
        tokens.push(current);
    }
    tokens
}

fn quoted(value: &str) -> String {
    if value.chars().any(char::is_whitespace) {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}

/// Write flags to a config file, creating parent directories.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# chartpad defaults (saved with --save)".to_string()];
    if let Some(server) = &flags.server {
        lines.push(format!("--server {}", quoted(server)));
    }
    if let Some(format) = flags.format {
        lines.push(format!("--format {}", format.as_str()));
    }
    if let Some(theme) = flags.theme {
        lines.push(format!("--theme {}", theme.as_str()));
    }
    if let Some(font) = &flags.font {
        lines.push(format!("--font {}", quoted(font)));
    }
    if let Some(template) = &flags.template {
        lines.push(format!("--template {}", quoted(template)));
    }
    if flags.no_images {
        lines.push("--no-images".to_string());
    }
    if flags.force_half_cell {
        lines.push("--force-half-cell".to_string());
    }
    if let Some(path) = &flags.log_file {
        lines.push(format!("--log-file {}", quoted(&path.display().to_string())));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

/// Remove a config file if present.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be removed.
pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Extract known flags from command-line style tokens.
///
/// Unknown tokens (the program name, the document path, `--save`) are
/// skipped, as are values that do not parse.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline_value) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value)),
            _ => (token, None),
        };
        match name {
            "--no-images" => flags.no_images = true,
            "--force-half-cell" => flags.force_half_cell = true,
            "--server" | "--format" | "--theme" | "--font" | "--template" | "--log-file" => {
                let value = match inline_value {
                    Some(value) => Some(value),
                    None => {
                        i += 1;
                        tokens.get(i).map(String::as_str)
                    }
                };
                if let Some(value) = value {
                    apply_valued_flag(&mut flags, name, value);
                }
            }
            _ => {}
        }
        i += 1;
    }
    flags
}

fn apply_valued_flag(flags: &mut ConfigFlags, name: &str, value: &str) {
    match name {
        "--server" => flags.server = Some(value.to_string()),
        "--format" => flags.format = OutputFormat::parse(value),
        "--theme" => flags.theme = Theme::parse(value),
        "--font" => flags.font = Some(value.to_string()),
        "--template" => flags.template = Some(value.to_string()),
        "--log-file" => flags.log_file = Some(PathBuf::from(value)),
        _ => {}
    }
}
