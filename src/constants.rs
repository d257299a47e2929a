//! Constants for page geometry, capacity heuristics and defaults

/// Number of columns on a sheet
pub const COLUMN_COUNT: usize = 4;

/// Sheet height in CSS pixels (A4 at 96 dpi)
pub const PAGE_HEIGHT_PX: u32 = 1122;

/// Sheet width in CSS pixels (A4 at 96 dpi)
pub const PAGE_WIDTH_PX: u32 = 794;

/// Column padding in pixels, applied at the top and at the bottom
pub const COLUMN_PADDING_PX: u32 = 12;

/// Vertical gap between consecutive blocks in a column
pub const BLOCK_GAP_PX: u32 = 8;

/// Inset of the column divider from the top and bottom page edges
pub const DIVIDER_INSET_PX: u32 = 8;

/// Usable text width of one column, used by the capacity estimate
pub const COLUMN_INNER_WIDTH_PX: f64 = 240.0;

/// Average character width as a fraction of font size
pub const CHAR_WIDTH_RATIO: f64 = 0.6;

/// Letter spacing units per pixel of extra character width
pub const LETTER_SPACING_DIVISOR: f64 = 10.0;

/// Narrowest character width the estimate will assume
pub const MIN_CHAR_WIDTH_PX: f64 = 1.0;

/// Lower bound on the number of lines in a block
pub const MIN_LINES: usize = 1;

/// Lower bound on characters per line
pub const MIN_CHARS_PER_LINE: usize = 5;

/// Lower bound on any block's character capacity
pub const MIN_CAPACITY: usize = 10;

/// Largest accepted block count
pub const MAX_BLOCKS: usize = 40;

/// Default block count
pub const DEFAULT_BLOCKS: usize = 8;

/// Default font size in pixels
pub const DEFAULT_FONT_SIZE_PX: f64 = 6.0;

/// Default letter spacing in hundredths of an em
pub const DEFAULT_LETTER_SPACING: f64 = -60.0;

/// Default line height multiplier
pub const DEFAULT_LINE_HEIGHT: f64 = 1.0;

/// Block counts offered as one-tap presets
pub const BLOCK_PRESETS: [usize; 3] = [4, 8, 12];

/// Font size control range in pixels
pub const FONT_SIZE_RANGE: (f64, f64) = (4.0, 14.0);

/// Line height control range and step
pub const LINE_HEIGHT_RANGE: (f64, f64) = (0.8, 2.0);
pub const LINE_HEIGHT_STEP: f64 = 0.05;

/// Letter spacing control range and step
pub const LETTER_SPACING_RANGE: (f64, f64) = (-200.0, 200.0);
pub const LETTER_SPACING_STEP: f64 = 5.0;

/// A4 page width in millimetres
pub const A4_WIDTH_MM: f32 = 210.0;

/// A4 page height in millimetres
pub const A4_HEIGHT_MM: f32 = 297.0;

/// PDF points per millimetre
pub const POINTS_PER_MM: f32 = 72.0 / 25.4;

/// Capture scale used when rasterizing the sheet for export
pub const DEFAULT_EXPORT_SCALE: f32 = 2.0;

/// File name offered for the exported document
pub const DEFAULT_EXPORT_FILE_NAME: &str = "a4-text-blocks.pdf";

/// Current persisted snapshot schema version
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;
