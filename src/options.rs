//! Presentation options chosen by the user.
//!
//! Options live independently of the document text. They are merged into a
//! document only when a template, theme or font is selected, and the output
//! format never touches the document at all: it decides which endpoint is
//! called and how the response is read.

use crate::document::{ChartDocument, FONT_FAMILY_KEY, THEME_KEY};

/// How the rendering service should return the chart.
#[derive(clap::ValueEnum, Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    /// Inline vector markup.
    #[default]
    Svg,
    /// Raster image, shown as a `data:` URI.
    Png,
}

impl OutputFormat {
    pub const ALL: [Self; 2] = [Self::Svg, Self::Png];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == s)
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Svg => Self::Png,
            Self::Png => Self::Svg,
        }
    }
}

/// Named color themes understood by the rendering service.
#[derive(clap::ValueEnum, Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Theme {
    #[default]
    Grafana,
    Light,
    Dark,
    Ant,
}

impl Theme {
    /// Selector order.
    pub const ALL: [Self; 4] = [Self::Grafana, Self::Light, Self::Dark, Self::Ant];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Grafana => "grafana",
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Ant => "ant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// The next theme in selector order, wrapping around.
    #[must_use]
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// The user's current selections.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OptionState {
    pub format: OutputFormat,
    pub theme: Theme,
    /// Font override; `None` keeps whatever the document specifies.
    pub font_family: Option<String>,
}

impl OptionState {
    /// Store a font override. Empty or blank names clear it.
    pub fn set_font_family(&mut self, family: Option<String>) {
        self.font_family = family.filter(|f| !f.trim().is_empty());
    }

    /// Merge the selected theme and font into `document`.
    ///
    /// The theme always wins over a stale `theme` key. The font is written
    /// last and only when an override is set, so the default selection never
    /// clobbers a font the document names itself.
    pub fn apply_to(&self, document: &mut ChartDocument) {
        document.set(THEME_KEY, self.theme.as_str());
        if let Some(family) = self.font_family.as_deref().filter(|f| !f.is_empty()) {
            document.set(FONT_FAMILY_KEY, family);
        }
    }
}
