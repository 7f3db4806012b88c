//! Engine configuration and theme presets.

use std::fmt;

use prismatic_config::DiagramTheme;
use prismatic_dom::Document;
use serde::Serialize;

/// How the diagram theme is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThemeMode {
    /// Follow the `dark` class on the document's `<html>` element.
    #[default]
    Auto,
    Dark,
    Light,
}

impl ThemeMode {
    /// Resolve to a preset for this document.
    #[must_use]
    pub fn resolve(self, doc: &Document) -> ThemePreset {
        match self {
            Self::Dark => ThemePreset::Dark,
            Self::Light => ThemePreset::Light,
            Self::Auto => {
                let dark = doc
                    .html_element()
                    .is_some_and(|html| doc.has_class(html, "dark"));
                if dark {
                    ThemePreset::Dark
                } else {
                    ThemePreset::Light
                }
            }
        }
    }
}

impl From<DiagramTheme> for ThemeMode {
    fn from(theme: DiagramTheme) -> Self {
        match theme {
            DiagramTheme::Auto => Self::Auto,
            DiagramTheme::Dark => Self::Dark,
            DiagramTheme::Light => Self::Light,
        }
    }
}

/// Resolved color scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemePreset {
    Dark,
    Light,
}

impl ThemePreset {
    /// Name of the engine's built-in base theme.
    #[must_use]
    pub fn engine_theme(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "default",
        }
    }
}

impl fmt::Display for ThemePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dark => "dark",
            Self::Light => "light",
        })
    }
}

/// Color and font overrides passed to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeVariables {
    pub primary_color: String,
    pub primary_text_color: String,
    pub primary_border_color: String,
    pub line_color: String,
    pub secondary_color: String,
    pub tertiary_color: String,
    pub background: String,
    pub main_bkg: String,
    pub second_bkg: String,
    pub font_family: String,
    pub font_size: String,
}

impl ThemeVariables {
    #[must_use]
    pub fn dark() -> Self {
        Self {
            primary_color: "#3b82f6".to_owned(),
            primary_text_color: "#f9fafb".to_owned(),
            primary_border_color: "#3b82f6".to_owned(),
            line_color: "#9ca3af".to_owned(),
            secondary_color: "#1e3a5f".to_owned(),
            tertiary_color: "#374151".to_owned(),
            background: "#0d1117".to_owned(),
            main_bkg: "#1f2937".to_owned(),
            second_bkg: "#374151".to_owned(),
            font_family: FONT_FAMILY.to_owned(),
            font_size: "14px".to_owned(),
        }
    }

    #[must_use]
    pub fn light() -> Self {
        Self {
            primary_color: "#3b82f6".to_owned(),
            primary_text_color: "#1f2937".to_owned(),
            primary_border_color: "#3b82f6".to_owned(),
            line_color: "#6b7280".to_owned(),
            secondary_color: "#dbeafe".to_owned(),
            tertiary_color: "#f3f4f6".to_owned(),
            background: "#ffffff".to_owned(),
            main_bkg: "#ffffff".to_owned(),
            second_bkg: "#f3f4f6".to_owned(),
            font_family: FONT_FAMILY.to_owned(),
            font_size: "14px".to_owned(),
        }
    }
}

const FONT_FAMILY: &str = "Inter, sans-serif";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowchartConfig {
    pub use_max_width: bool,
    pub html_labels: bool,
    pub curve: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceConfig {
    pub use_max_width: bool,
    pub wrap: bool,
    pub diagram_margin_x: u32,
    pub diagram_margin_y: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GanttConfig {
    pub use_max_width: bool,
}

/// Engine initialization options, serialized as the engine's JSON config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub start_on_load: bool,
    pub theme: String,
    pub theme_variables: ThemeVariables,
    pub security_level: String,
    pub font_family: String,
    pub flowchart: FlowchartConfig,
    pub sequence: SequenceConfig,
    pub gantt: GanttConfig,
    /// Preset the configuration was built from.
    #[serde(skip)]
    pub preset: ThemePreset,
}

impl EngineConfig {
    /// Configuration for a preset.
    #[must_use]
    pub fn for_preset(preset: ThemePreset) -> Self {
        let theme_variables = match preset {
            ThemePreset::Dark => ThemeVariables::dark(),
            ThemePreset::Light => ThemeVariables::light(),
        };
        Self {
            start_on_load: false,
            theme: preset.engine_theme().to_owned(),
            theme_variables,
            security_level: "loose".to_owned(),
            font_family: FONT_FAMILY.to_owned(),
            flowchart: FlowchartConfig {
                use_max_width: true,
                html_labels: true,
                curve: "basis".to_owned(),
            },
            sequence: SequenceConfig {
                use_max_width: true,
                wrap: true,
                diagram_margin_x: 50,
                diagram_margin_y: 30,
            },
            gantt: GanttConfig {
                use_max_width: true,
            },
            preset,
        }
    }

    /// Compact JSON form.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}
