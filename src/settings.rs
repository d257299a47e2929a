//! Typographic settings for a sheet

use crate::Result;
use crate::constants::*;
use crate::error::SheetError;
use serde::{Deserialize, Serialize};

/// Typographic configuration shared by every block on the sheet
///
/// Field names on the wire follow the persisted session format
/// (`blocks`, `fontSize`, `charSpacing`, `lineHeight`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "blocks")]
    pub block_count: usize,
    #[serde(rename = "fontSize")]
    pub font_size_px: f64,
    /// Tracking in hundredths of an em, may be negative
    #[serde(rename = "charSpacing")]
    pub letter_spacing: f64,
    #[serde(rename = "lineHeight")]
    pub line_height: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            block_count: DEFAULT_BLOCKS,
            font_size_px: DEFAULT_FONT_SIZE_PX,
            letter_spacing: DEFAULT_LETTER_SPACING,
            line_height: DEFAULT_LINE_HEIGHT,
        }
    }
}

impl Settings {
    /// Settings with the default typography and the given block count
    pub fn with_blocks(block_count: usize) -> Self {
        Self {
            block_count,
            ..Default::default()
        }
    }

    /// Replace the block count
    pub fn block_count(mut self, block_count: usize) -> Self {
        self.block_count = block_count;
        self
    }

    /// Replace the font size in pixels
    pub fn font_size(mut self, font_size_px: f64) -> Self {
        self.font_size_px = font_size_px;
        self
    }

    /// Replace the letter spacing
    pub fn letter_spacing(mut self, letter_spacing: f64) -> Self {
        self.letter_spacing = letter_spacing;
        self
    }

    /// Replace the line height multiplier
    pub fn line_height(mut self, line_height: f64) -> Self {
        self.line_height = line_height;
        self
    }

    /// The preset block counts, each applied on top of these settings
    pub fn presets(&self) -> impl Iterator<Item = Settings> + '_ {
        BLOCK_PRESETS
            .iter()
            .map(move |&count| self.block_count(count))
    }

    /// Check that the settings describe a layout that can be built
    pub fn validate(&self) -> Result<()> {
        if self.block_count == 0 || self.block_count > MAX_BLOCKS {
            return Err(SheetError::InvalidSettings(format!(
                "block count {} must be between 1 and {}",
                self.block_count, MAX_BLOCKS
            )));
        }
        if !self.font_size_px.is_finite() || self.font_size_px <= 0.0 {
            return Err(SheetError::InvalidSettings(format!(
                "font size {} must be a positive number",
                self.font_size_px
            )));
        }
        if !self.line_height.is_finite() || self.line_height <= 0.0 {
            return Err(SheetError::InvalidSettings(format!(
                "line height {} must be a positive number",
                self.line_height
            )));
        }
        if !self.letter_spacing.is_finite() {
            return Err(SheetError::InvalidSettings(format!(
                "letter spacing {} must be finite",
                self.letter_spacing
            )));
        }
        Ok(())
    }

    /// Snap the typographic values into the ranges and steps of the toolbar controls
    pub fn clamp_to_controls(&self) -> Self {
        let (font_min, font_max) = FONT_SIZE_RANGE;
        let (line_min, line_max) = LINE_HEIGHT_RANGE;
        let (spacing_min, spacing_max) = LETTER_SPACING_RANGE;
        Self {
            block_count: self.block_count.clamp(1, MAX_BLOCKS),
            font_size_px: self.font_size_px.round().clamp(font_min, font_max),
            letter_spacing: snap(self.letter_spacing, LETTER_SPACING_STEP)
                .clamp(spacing_min, spacing_max),
            line_height: snap(self.line_height, LINE_HEIGHT_STEP).clamp(line_min, line_max),
        }
    }

    /// Inline style the view layer applies to every block editor
    pub fn block_style(&self) -> BlockStyle {
        BlockStyle {
            font_size_px: self.font_size_px,
            letter_spacing_em: self.letter_spacing / 100.0,
            line_height: self.line_height,
        }
    }
}

fn snap(value: f64, step: f64) -> f64 {
    if value.is_finite() {
        (value / step).round() * step
    } else {
        0.0
    }
}

/// Style values for a rendered block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockStyle {
    pub font_size_px: f64,
    pub letter_spacing_em: f64,
    pub line_height: f64,
}

impl BlockStyle {
    /// Render as a CSS declaration list
    pub fn to_css(&self) -> String {
        format!(
            "font-size: {}px; letter-spacing: {}em; line-height: {}",
            self.font_size_px, self.letter_spacing_em, self.line_height
        )
    }
}
