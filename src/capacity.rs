//! Character capacity estimation for a block of a given height

use crate::constants::*;
use crate::font::FontMetrics;
use tracing::trace;

/// Heuristic constants behind the capacity estimate
///
/// The default table reproduces the editor's observable budgets exactly.
/// Changing any value shifts every budget on the sheet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapacityModel {
    /// Usable text width of one column
    pub column_inner_width_px: f64,
    /// Average glyph width as a fraction of font size
    pub char_width_ratio: f64,
    /// Letter spacing units per pixel of extra glyph width
    pub letter_spacing_divisor: f64,
    pub min_char_width_px: f64,
    pub min_lines: usize,
    pub min_chars_per_line: usize,
    pub min_capacity: usize,
}

impl Default for CapacityModel {
    fn default() -> Self {
        Self {
            column_inner_width_px: COLUMN_INNER_WIDTH_PX,
            char_width_ratio: CHAR_WIDTH_RATIO,
            letter_spacing_divisor: LETTER_SPACING_DIVISOR,
            min_char_width_px: MIN_CHAR_WIDTH_PX,
            min_lines: MIN_LINES,
            min_chars_per_line: MIN_CHARS_PER_LINE,
            min_capacity: MIN_CAPACITY,
        }
    }
}

impl CapacityModel {
    /// Estimate how many plain-text characters fit in a block
    pub fn estimate(
        &self,
        block_height_px: f64,
        font_size_px: f64,
        line_height: f64,
        letter_spacing: f64,
    ) -> usize {
        self.estimate_from_glyph_width(
            block_height_px,
            font_size_px,
            line_height,
            letter_spacing,
            self.char_width_ratio * font_size_px,
        )
    }

    /// Same estimate, with the average glyph width measured from real font metrics
    pub fn estimate_with_metrics(
        &self,
        block_height_px: f64,
        font_size_px: f64,
        line_height: f64,
        letter_spacing: f64,
        metrics: &dyn FontMetrics,
    ) -> usize {
        let glyph_width = f64::from(metrics.average_char_width(font_size_px as f32));
        self.estimate_from_glyph_width(
            block_height_px,
            font_size_px,
            line_height,
            letter_spacing,
            glyph_width,
        )
    }

    fn estimate_from_glyph_width(
        &self,
        block_height_px: f64,
        font_size_px: f64,
        line_height: f64,
        letter_spacing: f64,
        glyph_width_px: f64,
    ) -> usize {
        let line_px = font_size_px * line_height;
        let lines = floor_to_count(block_height_px / line_px).max(self.min_lines);

        let char_width = (glyph_width_px + letter_spacing / self.letter_spacing_divisor)
            .max(self.min_char_width_px);
        let chars_per_line =
            floor_to_count(self.column_inner_width_px / char_width).max(self.min_chars_per_line);

        let capacity = lines.saturating_mul(chars_per_line).max(self.min_capacity);
        trace!(
            lines,
            chars_per_line, capacity, "Estimated capacity for {block_height_px}px block"
        );
        capacity
    }
}

/// Estimate a block's character budget with the default heuristic
pub fn estimate_capacity(
    block_height_px: f64,
    font_size_px: f64,
    line_height: f64,
    letter_spacing: f64,
) -> usize {
    CapacityModel::default().estimate(block_height_px, font_size_px, line_height, letter_spacing)
}

/// Floor a ratio into a count; NaN and negatives become zero so the floors take over
fn floor_to_count(value: f64) -> usize {
    if value.is_nan() || value <= 0.0 {
        0
    } else {
        value.floor() as usize
    }
}
