//! Font metrics for measured capacity estimates

use crate::constants::CHAR_WIDTH_RATIO;

/// Sample text whose mean advance stands in for the width of a typical character
pub const AVERAGE_WIDTH_SAMPLE: &str =
    "the quick brown fox jumps over the lazy dog THE QUICK BROWN FOX 0123456789";

/// Trait for measuring text dimensions.
///
/// Implement this trait to base block budgets on a real font instead of the
/// fixed width heuristic.
pub trait FontMetrics {
    /// Width of a single character in pixels at the given font size
    fn char_width(&self, ch: char, font_size: f32) -> f32;

    /// Total width of a string in pixels at the given font size
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars().map(|ch| self.char_width(ch, font_size)).sum()
    }

    /// Mean advance of a typical character at the given font size
    fn average_char_width(&self, font_size: f32) -> f32 {
        let count = AVERAGE_WIDTH_SAMPLE.chars().count() as f32;
        self.text_width(AVERAGE_WIDTH_SAMPLE, font_size) / count
    }
}

/// Fixed-ratio metrics: every glyph is the same fraction of the font size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicMetrics {
    pub char_width_ratio: f32,
}

impl Default for HeuristicMetrics {
    fn default() -> Self {
        Self {
            char_width_ratio: CHAR_WIDTH_RATIO as f32,
        }
    }
}

impl FontMetrics for HeuristicMetrics {
    fn char_width(&self, _ch: char, font_size: f32) -> f32 {
        font_size * self.char_width_ratio
    }

    fn average_char_width(&self, font_size: f32) -> f32 {
        font_size * self.char_width_ratio
    }
}

/// TrueType font metrics using ttf-parser for glyph advance measurement.
///
/// This struct owns the font data and parses it on demand for measurements.
#[cfg(feature = "ttf-parser")]
pub struct TtfFontMetrics {
    font_data: Vec<u8>,
    units_per_em: f32,
}

#[cfg(feature = "ttf-parser")]
impl TtfFontMetrics {
    /// Create new font metrics from raw TTF/TTC font data.
    ///
    /// Validates the font by parsing it and extracting units_per_em.
    pub fn new(font_data: Vec<u8>) -> crate::Result<Self> {
        let face = ttf_parser::Face::parse(&font_data, 0).map_err(|e| {
            crate::error::SheetError::FontError(format!("Failed to parse font: {e}"))
        })?;
        let units_per_em = face.units_per_em() as f32;
        Ok(Self {
            font_data,
            units_per_em,
        })
    }

    fn advance(&self, face: Option<&ttf_parser::Face<'_>>, ch: char, font_size: f32) -> f32 {
        face.and_then(|face| {
            face.glyph_index(ch)
                .and_then(|gid| face.glyph_hor_advance(gid))
        })
        .map(|advance| advance as f32 / self.units_per_em * font_size)
        .unwrap_or(font_size * CHAR_WIDTH_RATIO as f32)
    }
}

#[cfg(feature = "ttf-parser")]
impl FontMetrics for TtfFontMetrics {
    fn char_width(&self, ch: char, font_size: f32) -> f32 {
        let face = ttf_parser::Face::parse(&self.font_data, 0).ok();
        self.advance(face.as_ref(), ch, font_size)
    }

    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        let face = ttf_parser::Face::parse(&self.font_data, 0).ok();
        text.chars()
            .map(|ch| self.advance(face.as_ref(), ch, font_size))
            .sum()
    }
}

#[cfg(feature = "ttf-parser")]
impl std::fmt::Debug for TtfFontMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtfFontMetrics")
            .field("units_per_em", &self.units_per_em)
            .field("font_data_len", &self.font_data.len())
            .finish()
    }
}
