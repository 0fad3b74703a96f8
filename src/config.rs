//! Host-facing pagination configuration

use crate::error::ConfigError;
use crate::layout::{PageGeometry, TextStyle};
use serde::{Deserialize, Deserializer, Serialize};

/// Complete configuration for a paginated manuscript.
///
/// Page dimensions and margins are in inches; font sizes and title padding
/// are in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaginationConfig {
    pub page_width: f32,
    pub page_height: f32,
    pub font_size: f32,
    pub font_family: String,
    /// Line height multiplier
    pub line_height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub chapter_title: Option<String>,
    pub chapter_title_font_size: f32,
    pub chapter_title_padding: f32,
    pub show_chapter_title: bool,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_width: 6.0, // trade paperback
            page_height: 9.0,
            font_size: 12.0,
            font_family: "Times New Roman".to_string(),
            line_height: 1.5,
            margin_top: 0.75,
            margin_bottom: 0.75,
            margin_left: 0.75,
            margin_right: 0.75,
            chapter_title: None,
            chapter_title_font_size: 24.0,
            chapter_title_padding: 24.0,
            show_chapter_title: true,
        }
    }
}

impl PaginationConfig {
    /// Parse a (possibly partial) JSON configuration; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Page geometry in inches
    pub fn geometry(&self) -> PageGeometry {
        PageGeometry {
            width: self.page_width,
            height: self.page_height,
            margin_top: self.margin_top,
            margin_bottom: self.margin_bottom,
            margin_left: self.margin_left,
            margin_right: self.margin_right,
        }
    }

    /// Body text style
    pub fn text_style(&self) -> TextStyle {
        TextStyle {
            font_size: self.font_size,
            font_family: self.font_family.clone(),
            line_height: self.line_height,
        }
    }

    /// Height reserved for the chapter title band on a chapter's first page.
    ///
    /// Zero when there is no title or titles are hidden.
    pub fn chapter_title_reserved_height(&self) -> f32 {
        let has_title = self
            .chapter_title
            .as_deref()
            .is_some_and(|title| !title.trim().is_empty());

        if self.show_chapter_title && has_title {
            self.chapter_title_font_size + self.chapter_title_padding
        } else {
            0.0
        }
    }

    /// Merge a partial update into this configuration
    pub fn merge(&mut self, partial: PartialConfig) {
        let PartialConfig {
            page_width,
            page_height,
            font_size,
            font_family,
            line_height,
            margin_top,
            margin_bottom,
            margin_left,
            margin_right,
            chapter_title,
            chapter_title_font_size,
            chapter_title_padding,
            show_chapter_title,
        } = partial;

        if let Some(v) = page_width {
            self.page_width = v;
        }
        if let Some(v) = page_height {
            self.page_height = v;
        }
        if let Some(v) = font_size {
            self.font_size = v;
        }
        if let Some(v) = font_family {
            self.font_family = v;
        }
        if let Some(v) = line_height {
            self.line_height = v;
        }
        if let Some(v) = margin_top {
            self.margin_top = v;
        }
        if let Some(v) = margin_bottom {
            self.margin_bottom = v;
        }
        if let Some(v) = margin_left {
            self.margin_left = v;
        }
        if let Some(v) = margin_right {
            self.margin_right = v;
        }
        if let Some(v) = chapter_title {
            self.chapter_title = v;
        }
        if let Some(v) = chapter_title_font_size {
            self.chapter_title_font_size = v;
        }
        if let Some(v) = chapter_title_padding {
            self.chapter_title_padding = v;
        }
        if let Some(v) = show_chapter_title {
            self.show_chapter_title = v;
        }
    }
}

/// A partial configuration update; `None` fields are left unchanged.
///
/// `chapter_title` is doubly optional so that an explicit `null` clears the
/// title while an absent field keeps it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialConfig {
    pub page_width: Option<f32>,
    pub page_height: Option<f32>,
    pub font_size: Option<f32>,
    pub font_family: Option<String>,
    pub line_height: Option<f32>,
    pub margin_top: Option<f32>,
    pub margin_bottom: Option<f32>,
    pub margin_left: Option<f32>,
    pub margin_right: Option<f32>,
    #[serde(deserialize_with = "present_or_null")]
    pub chapter_title: Option<Option<String>>,
    pub chapter_title_font_size: Option<f32>,
    pub chapter_title_padding: Option<f32>,
    pub show_chapter_title: Option<bool>,
}

impl PartialConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_height_requires_title() {
        let mut config = PaginationConfig::default();
        assert_eq!(config.chapter_title_reserved_height(), 0.0);

        config.chapter_title = Some("Chapter One".to_string());
        assert_eq!(config.chapter_title_reserved_height(), 48.0);

        config.show_chapter_title = false;
        assert_eq!(config.chapter_title_reserved_height(), 0.0);
    }

    #[test]
    fn test_partial_json_merge() {
        let mut config = PaginationConfig {
            chapter_title: Some("Prologue".to_string()),
            ..PaginationConfig::default()
        };

        let partial = PartialConfig::from_json(r#"{"fontSize": 14, "marginLeft": 1.0}"#).unwrap();
        config.merge(partial);
        assert_eq!(config.font_size, 14.0);
        assert_eq!(config.margin_left, 1.0);
        assert_eq!(config.chapter_title.as_deref(), Some("Prologue"));

        let clear = PartialConfig::from_json(r#"{"chapterTitle": null}"#).unwrap();
        assert_eq!(clear.chapter_title, Some(None));
        config.merge(clear);
        assert_eq!(config.chapter_title, None);
    }

    #[test]
    fn test_config_json_defaults() {
        let config = PaginationConfig::from_json(r#"{"pageWidth": 5.5, "fontFamily": "Georgia"}"#)
            .unwrap();
        assert_eq!(config.page_width, 5.5);
        assert_eq!(config.font_family, "Georgia");
        assert_eq!(config.page_height, 9.0);
        assert!(config.show_chapter_title);
    }
}
