//! Built-in chart templates.
//!
//! Each template is a complete default document for one chart type. The
//! library is built once at startup and only ever handed out by reference;
//! selecting a template always works on a clone.

use serde_json::{Map, Value, json};

use crate::document::ChartDocument;

/// A default document associated with a chart-type selector key.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub chart_type: String,
    pub document: ChartDocument,
}

/// Fixed mapping from chart-type key to template, in selector order.
#[derive(Debug, Clone)]
pub struct TemplateLibrary {
    templates: Vec<Template>,
}

impl TemplateLibrary {
    pub fn new(templates: Vec<Template>) -> Self {
        Self { templates }
    }

    /// The templates shipped with the workbench.
    pub fn builtin() -> Self {
        let entries = [
            ("barBasic", bar_basic()),
            ("lineBasic", line_basic()),
            ("horizontalBar", horizontal_bar()),
            ("pie", pie()),
            ("radar", radar()),
        ];
        Self::new(
            entries
                .into_iter()
                .map(|(key, fields)| Template {
                    chart_type: key.to_string(),
                    document: with_base_options(fields),
                })
                .collect(),
        )
    }

    pub fn get(&self, chart_type: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.chart_type == chart_type)
    }

    pub fn first(&self) -> Option<&Template> {
        self.templates.first()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.templates.iter().map(|t| t.chart_type.as_str())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// The key after `current` in selector order, wrapping around.
    ///
    /// An unknown `current` starts over at the first template.
    pub fn next_key(&self, current: &str) -> Option<&str> {
        let next = self
            .templates
            .iter()
            .position(|t| t.chart_type == current)
            .map_or(0, |idx| (idx + 1) % self.templates.len());
        self.templates.get(next).map(|t| t.chart_type.as_str())
    }
}

impl Default for TemplateLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Options shared by every chart type.
fn base_options() -> Value {
    json!({
        "quality": 80,
        "width": 600,
        "height": 400,
        "margin": {"left": 5, "top": 5, "right": 5, "bottom": 5},
        "font_family": "Roboto",
        "title_font_size": 18,
        "title_font_weight": "bold",
        "title_margin": {"left": 0, "top": 0, "right": 0, "bottom": 0},
        "title_align": "center",
        "title_height": 30,
        "sub_title_text": "Sub Title",
        "sub_title_font_size": 14,
        "sub_title_margin": {"left": 0, "top": 0, "right": 0, "bottom": 0},
        "sub_title_align": "center",
        "sub_title_height": 20,
        "legend_font_size": 14,
        "legend_align": "center",
        "legend_margin": {"left": 0, "top": 0, "right": 0, "bottom": 0},
        "legend_category": "normal",
        "legend_show": true,
        "x_axis_height": 30,
        "x_axis_font_size": 14,
        "x_axis_name_gap": 5,
        "x_axis_name_rotate": 0,
        "x_boundary_gap": false
    })
}

/// Lay chart-specific fields over the base options.
///
/// Keys already present keep their position; new keys are appended.
fn with_base_options(fields: Value) -> ChartDocument {
    let mut merged = match base_options() {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    if let Value::Object(extra) = fields {
        for (key, value) in extra {
            merged.insert(key, value);
        }
    }
    ChartDocument::from_map(merged)
}

fn week_days() -> Value {
    json!(["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"])
}

fn bar_basic() -> Value {
    json!({
        "type": "bar",
        "title_text": "Bar Chart",
        "legend_align": "left",
        "x_axis_data": week_days(),
        "series_list": [
            {
                "name": "Email",
                "label_show": true,
                "data": [120.0, 132.0, 101.0, 134.0, 90.0, 230.0, 210.0]
            },
            {
                "name": "Union Ads",
                "data": [220.0, 182.0, 191.0, 234.0, 290.0, 330.0, 310.0]
            }
        ]
    })
}

fn line_basic() -> Value {
    json!({
        "type": "line",
        "title_text": "Line Chart",
        "x_axis_data": week_days(),
        "series_list": [
            {
                "name": "Email",
                "data": [120.0, 132.0, 101.0, 134.0, 90.0, 230.0, 210.0]
            },
            {
                "name": "Direct",
                "data": [320.0, 332.0, 301.0, 334.0, 390.0, 330.0, 320.0]
            }
        ]
    })
}

fn horizontal_bar() -> Value {
    json!({
        "type": "horizontal_bar",
        "title_text": "World Population",
        "legend_align": "left",
        "x_axis_data": ["Brazil", "Indonesia", "USA", "India", "China", "World"],
        "series_list": [
            {
                "name": "2011",
                "data": [18203.0, 23489.0, 29034.0, 104970.0, 131744.0, 630230.0]
            },
            {
                "name": "2012",
                "data": [19325.0, 23438.0, 31000.0, 121594.0, 134141.0, 681807.0]
            }
        ]
    })
}

fn pie() -> Value {
    json!({
        "type": "pie",
        "title_text": "Traffic Sources",
        "legend_show": false,
        "radius": 130,
        "inner_radius": 30,
        "series_list": [
            {"name": "Search Engine", "data": [1048.0]},
            {"name": "Direct", "data": [735.0]},
            {"name": "Email", "data": [580.0]},
            {"name": "Union Ads", "data": [484.0]},
            {"name": "Video Ads", "data": [300.0]}
        ]
    })
}

fn radar() -> Value {
    json!({
        "type": "radar",
        "title_text": "Budget vs Spending",
        "indicators": [
            {"name": "Sales", "max": 6500.0},
            {"name": "Administration", "max": 16000.0},
            {"name": "Technology", "max": 30000.0},
            {"name": "Customer Support", "max": 38000.0},
            {"name": "Development", "max": 52000.0},
            {"name": "Marketing", "max": 25000.0}
        ],
        "series_list": [
            {
                "name": "Allocated Budget",
                "data": [4200.0, 3000.0, 20000.0, 35000.0, 50000.0, 18000.0]
            },
            {
                "name": "Actual Spending",
                "data": [5000.0, 14000.0, 28000.0, 26000.0, 42000.0, 21000.0]
            }
        ]
    })
}
