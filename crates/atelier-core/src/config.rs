//! Canvas option bag.
//!
//! Every field is defaulted so hosts can send a partial JSON object.

use crate::error::EditorResult;
use crate::model::{LineStyle, WorkareaLayout};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    pub editable: bool,
    /// Percent.
    pub min_zoom: f64,
    /// Percent.
    pub max_zoom: f64,
    pub zoom_enabled: bool,
    pub workarea: WorkareaConfig,
    pub guideline: GuidelineConfig,
    pub grid: GridConfig,
    pub key_event: KeyEventConfig,
    /// Extra keys kept by `export_json` beyond the built-in allow-list.
    pub properties_to_include: Vec<String>,
    pub duplicate_offset: f64,
    pub link_style: LineStyle,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            editable: true,
            min_zoom: 30.0,
            max_zoom: 300.0,
            zoom_enabled: true,
            workarea: WorkareaConfig::default(),
            guideline: GuidelineConfig::default(),
            grid: GridConfig::default(),
            key_event: KeyEventConfig::default(),
            properties_to_include: Vec::new(),
            duplicate_offset: 10.0,
            link_style: LineStyle::Curved,
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> EditorResult<Self> {
        let config: EditorConfig = serde_json::from_str(json)?;
        Ok(config.normalized())
    }

    /// Swap inverted zoom bounds, floor them at 1% and clamp negative sizes.
    pub fn normalized(mut self) -> Self {
        if self.min_zoom > self.max_zoom {
            log::warn!(
                "minZoom {} exceeds maxZoom {}, swapping",
                self.min_zoom,
                self.max_zoom
            );
            std::mem::swap(&mut self.min_zoom, &mut self.max_zoom);
        }
        self.min_zoom = self.min_zoom.max(1.0);
        self.max_zoom = self.max_zoom.max(self.min_zoom);
        self.grid.size = self.grid.size.max(1.0);
        self.guideline.margin = self.guideline.margin.max(0.0);
        self
    }

    /// Zoom bounds as ratios.
    pub fn zoom_bounds(&self) -> (f64, f64) {
        (self.min_zoom / 100.0, self.max_zoom / 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkareaConfig {
    pub width: f64,
    pub height: f64,
    pub layout: WorkareaLayout,
    pub background_color: String,
    pub src: Option<String>,
}

impl Default for WorkareaConfig {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 400.0,
            layout: WorkareaLayout::Fixed,
            background_color: "#ffffff".into(),
            src: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GuidelineConfig {
    pub enabled: bool,
    /// Snap tolerance in canvas px.
    pub margin: f64,
    /// Length of guide lines drawn against the workarea.
    pub span: f64,
    pub color: String,
}

impl Default for GuidelineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            margin: 4.0,
            span: 5000.0,
            color: "rgb(255,0,0)".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridConfig {
    pub enabled: bool,
    pub size: f64,
    pub snap_to_grid: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            size: 10.0,
            snap_to_grid: false,
        }
    }
}

/// Per-shortcut toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyEventConfig {
    #[serde(rename = "move")]
    pub nudge: bool,
    pub all: bool,
    pub copy: bool,
    pub paste: bool,
    pub esc: bool,
    pub del: bool,
    pub clipboard: bool,
    pub transaction: bool,
    pub zoom: bool,
    pub cut: bool,
    pub grab: bool,
}

impl Default for KeyEventConfig {
    fn default() -> Self {
        Self {
            nudge: true,
            all: true,
            copy: true,
            paste: true,
            esc: true,
            del: true,
            clipboard: false,
            transaction: true,
            zoom: true,
            cut: true,
            grab: true,
        }
    }
}
