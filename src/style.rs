//! Colors and the paint style of a rasterized sheet

use image::Rgb;

/// RGB color representation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values should be 0.0-1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
        }
    }

    /// Create a color from 8-bit channels
    pub fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
        )
    }

    /// Black color
    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    /// White color
    pub fn white() -> Self {
        Self::rgb(1.0, 1.0, 1.0)
    }

    /// Gray color
    pub fn gray(level: f32) -> Self {
        let l = level.clamp(0.0, 1.0);
        Self::rgb(l, l, l)
    }

    /// Pixel value for raster output
    pub fn to_pixel(self) -> Rgb<u8> {
        let channel = |v: f32| (v * 255.0).round() as u8;
        Rgb([channel(self.r), channel(self.g), channel(self.b)])
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// Colors used when painting the sheet surface
///
/// Exports always use a white page regardless of the editor theme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterStyle {
    pub background: Color,
    pub divider: Color,
    pub block_border: Color,
    pub ink: Color,
    /// Ink for blocks whose text no longer fits their capacity
    pub overflow_ink: Color,
}

impl Default for RasterStyle {
    fn default() -> Self {
        Self {
            background: Color::white(),
            divider: Color::rgb8(0xe4, 0xe4, 0xe7),
            block_border: Color::rgb8(0xe4, 0xe4, 0xe7),
            ink: Color::rgb8(0x18, 0x18, 0x1b),
            overflow_ink: Color::rgb8(0xdc, 0x26, 0x26),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channels_are_clamped() {
        let color = Color::rgb(1.5, -0.2, 0.5);
        assert_eq!(color.r, 1.0);
        assert_eq!(color.g, 0.0);
        assert_eq!(color.to_pixel(), Rgb([255, 0, 128]));
    }

    #[test]
    fn test_rgb8_round_trips_to_pixel() {
        assert_eq!(Color::rgb8(0xe4, 0xe4, 0xe7).to_pixel(), Rgb([0xe4, 0xe4, 0xe7]));
        assert_eq!(Color::white().to_pixel(), Rgb([255, 255, 255]));
    }
}
