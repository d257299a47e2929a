//! Rasterization of the laid-out sheet

use crate::Result;
use crate::constants::*;
use crate::content::BlockContent;
use crate::error::SheetError;
use crate::layout::{BlockDescriptor, SheetLayout};
use crate::settings::Settings;
use crate::style::{Color, RasterStyle};
use crate::text::{paragraphs, wrap_text};
use image::RgbImage;
use tracing::{debug, instrument, trace};

/// Largest raster edge accepted for export
const MAX_RASTER_EDGE_PX: f32 = 16_384.0;

/// Inset of greeked text from the block frame
const TEXT_INSET_PX: f32 = 4.0;

/// The rendered sheet handed to a rasterizer
#[derive(Debug, Clone, Copy)]
pub struct PageSurface<'a> {
    pub settings: &'a Settings,
    pub layout: &'a SheetLayout,
    pub contents: &'a BlockContent,
}

impl<'a> PageSurface<'a> {
    pub fn new(settings: &'a Settings, layout: &'a SheetLayout, contents: &'a BlockContent) -> Self {
        Self {
            settings,
            layout,
            contents,
        }
    }

    pub fn width_px(&self) -> u32 {
        PAGE_WIDTH_PX
    }

    pub fn height_px(&self) -> u32 {
        PAGE_HEIGHT_PX
    }

    pub fn column_width_px(&self) -> f32 {
        PAGE_WIDTH_PX as f32 / COLUMN_COUNT as f32
    }

    /// Frames of every block in surface pixels
    pub fn block_frames(&self) -> Vec<(BlockDescriptor, Rect)> {
        let column_width = self.column_width_px();
        let padding = COLUMN_PADDING_PX as f32;
        let mut frames = Vec::with_capacity(self.layout.block_count());

        for (column, blocks) in self.layout.columns.iter().enumerate() {
            let x = column as f32 * column_width + padding;
            let mut y = padding;
            for block in blocks {
                let height = block.height_px as f32;
                frames.push((
                    *block,
                    Rect {
                        x,
                        y,
                        width: column_width - 2.0 * padding,
                        height,
                    },
                ));
                y += height + BLOCK_GAP_PX as f32;
            }
        }
        frames
    }
}

/// Axis-aligned rectangle in surface pixels, origin top-left
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Captures a sheet surface as a raster image
pub trait Rasterizer {
    /// Rasterize the surface at `scale` raster pixels per surface pixel
    fn rasterize(&self, surface: &PageSurface<'_>, scale: f32) -> Result<RgbImage>;
}

/// Rasterizer that paints block text as greeked bars, one per wrapped line
#[derive(Debug, Clone, Default)]
pub struct GreekingRasterizer {
    pub style: RasterStyle,
}

impl GreekingRasterizer {
    pub fn new(style: RasterStyle) -> Self {
        Self { style }
    }
}

impl Rasterizer for GreekingRasterizer {
    #[instrument(skip(self, surface))]
    fn rasterize(&self, surface: &PageSurface<'_>, scale: f32) -> Result<RgbImage> {
        let width = surface.width_px() as f32 * scale;
        let height = surface.height_px() as f32 * scale;
        let usable = scale.is_finite() && scale > 0.0;
        if !usable || width > MAX_RASTER_EDGE_PX || height > MAX_RASTER_EDGE_PX {
            return Err(SheetError::Export(format!("unusable raster scale {scale}")));
        }

        let mut canvas = Canvas {
            image: RgbImage::from_pixel(
                width.round() as u32,
                height.round() as u32,
                self.style.background.to_pixel(),
            ),
            scale,
        };
        debug!(
            "Rasterizing sheet into {}x{} pixels",
            canvas.image.width(),
            canvas.image.height()
        );

        // Dividers to the right of every column but the last
        let column_width = surface.column_width_px();
        let inset = DIVIDER_INSET_PX as f32;
        for column in 1..COLUMN_COUNT {
            canvas.fill(
                Rect {
                    x: column as f32 * column_width - 1.0,
                    y: inset,
                    width: 1.0,
                    height: surface.height_px() as f32 - 2.0 * inset,
                },
                self.style.divider,
            );
        }

        for (block, frame) in surface.block_frames() {
            canvas.stroke(frame, self.style.block_border);
            let over_budget = surface.contents.remaining(&block.id, block.capacity) < 0;
            let ink = if over_budget {
                self.style.overflow_ink
            } else {
                self.style.ink
            };
            self.greek_block(&mut canvas, surface, &block, frame, ink);
        }

        Ok(canvas.image)
    }
}

impl GreekingRasterizer {
    fn greek_block(
        &self,
        canvas: &mut Canvas,
        surface: &PageSurface<'_>,
        block: &BlockDescriptor,
        frame: Rect,
        ink: Color,
    ) {
        let markup = surface.contents.get(&block.id);
        if markup.is_empty() {
            return;
        }

        let settings = surface.settings;
        let line_px = (settings.font_size_px * settings.line_height) as f32;
        let char_width = ((CHAR_WIDTH_RATIO * settings.font_size_px
            + settings.letter_spacing / LETTER_SPACING_DIVISOR)
            .max(MIN_CHAR_WIDTH_PX)) as f32;
        let text_width = frame.width - 2.0 * TEXT_INSET_PX;
        let chars_per_line = ((text_width / char_width).floor() as usize).max(1);
        let bar_height = (settings.font_size_px as f32 * 0.6).max(1.0);

        let bottom = frame.bottom() - TEXT_INSET_PX;
        let mut y = frame.y + TEXT_INSET_PX;
        let mut painted = 0;

        'paragraphs: for paragraph in paragraphs(markup) {
            for line in wrap_text(&paragraph, chars_per_line) {
                if y + line_px > bottom {
                    break 'paragraphs;
                }
                let length = line.chars().count() as f32 * char_width;
                if length > 0.0 {
                    canvas.fill(
                        Rect {
                            x: frame.x + TEXT_INSET_PX,
                            y: y + (line_px - bar_height) / 2.0,
                            width: length.min(text_width),
                            height: bar_height,
                        },
                        ink,
                    );
                    painted += 1;
                }
                y += line_px;
            }
        }
        trace!(block = %block.id, painted, "Greeked block text");
    }
}

struct Canvas {
    image: RgbImage,
    scale: f32,
}

impl Canvas {
    /// Fill a surface-space rectangle, clipped to the image
    fn fill(&mut self, rect: Rect, color: Color) {
        let to_px = |v: f32, limit: u32| ((v * self.scale).round().max(0.0) as u32).min(limit);
        let (width, height) = self.image.dimensions();
        let x0 = to_px(rect.x, width);
        let y0 = to_px(rect.y, height);
        // Keep hairlines visible at fractional scales
        let x1 = to_px(rect.x + rect.width, width).max((x0 + 1).min(width));
        let y1 = to_px(rect.bottom(), height).max((y0 + 1).min(height));

        let pixel = color.to_pixel();
        for y in y0..y1 {
            for x in x0..x1 {
                self.image.put_pixel(x, y, pixel);
            }
        }
    }

    /// Outline a rectangle with one surface pixel wide edges
    fn stroke(&mut self, rect: Rect, color: Color) {
        let Rect {
            x,
            y,
            width,
            height,
        } = rect;
        self.fill(Rect { x, y, width, height: 1.0 }, color);
        self.fill(Rect { x, y: rect.bottom() - 1.0, width, height: 1.0 }, color);
        self.fill(Rect { x, y, width: 1.0, height }, color);
        self.fill(Rect { x: x + width - 1.0, y, width: 1.0, height }, color);
    }
}
