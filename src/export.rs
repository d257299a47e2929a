//! Export of a rasterized sheet to a single-page A4 PDF

use crate::constants::*;
use crate::drawing::{create_a4_document, document_bytes};
use crate::error::SheetError;
use crate::raster::{PageSurface, Rasterizer};
use crate::{Result, SheetDrawing};
use tracing::{debug, instrument, warn};

/// Options for one export run
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    /// Raster pixels per surface pixel
    pub scale: f32,
    /// Name of the written file
    pub file_name: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            scale: DEFAULT_EXPORT_SCALE,
            file_name: DEFAULT_EXPORT_FILE_NAME.to_string(),
        }
    }
}

/// Placement of the raster image on the A4 page, in millimetres from the top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFit {
    pub x_mm: f32,
    pub y_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
}

impl PageFit {
    /// Scale an image to the full page width and center it vertically
    ///
    /// Images taller than the page start at the top edge and run off the bottom.
    pub fn for_image(width_px: u32, height_px: u32) -> Self {
        let width_mm = A4_WIDTH_MM;
        let height_mm = if width_px == 0 {
            0.0
        } else {
            height_px as f32 * width_mm / width_px as f32
        };
        let y_mm = ((A4_HEIGHT_MM - height_mm) / 2.0).max(0.0);
        Self {
            x_mm: 0.0,
            y_mm,
            width_mm,
            height_mm,
        }
    }

    /// Rectangle in PDF user space: (x, y of the bottom edge, width, height) in points
    pub fn to_pdf_rect(&self) -> (f32, f32, f32, f32) {
        let bottom_mm = A4_HEIGHT_MM - self.y_mm - self.height_mm;
        (
            self.x_mm * POINTS_PER_MM,
            bottom_mm * POINTS_PER_MM,
            self.width_mm * POINTS_PER_MM,
            self.height_mm * POINTS_PER_MM,
        )
    }
}

/// Rasterize a sheet and assemble it into PDF bytes
///
/// A missing surface means there is nothing rendered to export yet; that is
/// not an error and yields `Ok(None)`.
#[instrument(skip_all, fields(scale = options.scale))]
pub fn export_to_pdf(
    surface: Option<&PageSurface<'_>>,
    rasterizer: &dyn Rasterizer,
    options: &ExportOptions,
) -> Result<Option<Vec<u8>>> {
    let Some(surface) = surface else {
        debug!("No rendered sheet to export");
        return Ok(None);
    };

    let image = rasterizer
        .rasterize(surface, options.scale)
        .map_err(|e| match e {
            SheetError::Export(_) => e,
            other => SheetError::Export(format!("rasterization failed: {other}")),
        })?;
    if image.width() == 0 || image.height() == 0 {
        return Err(SheetError::Export("rasterizer produced an empty image".to_string()));
    }

    let fit = PageFit::for_image(image.width(), image.height());
    debug!(?fit, "Placing {}x{} raster", image.width(), image.height());

    let (mut doc, page_id) = create_a4_document();
    doc.draw_sheet_image(page_id, &image, fit)?;
    let bytes = document_bytes(&mut doc).inspect_err(|e| warn!("PDF assembly failed: {e}"))?;

    debug!("Exported sheet as {} PDF bytes", bytes.len());
    Ok(Some(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::BlockContent;
    use crate::layout::{BlockId, build_layout};
    use crate::raster::GreekingRasterizer;
    use crate::settings::Settings;
    use image::RgbImage;
    use lopdf::{Document, Object};

    struct FailingRasterizer;

    impl Rasterizer for FailingRasterizer {
        fn rasterize(&self, _surface: &PageSurface<'_>, _scale: f32) -> Result<RgbImage> {
            Err(SheetError::Io(std::io::Error::other("capture lost")))
        }
    }

    struct FixedRasterizer(u32, u32);

    impl Rasterizer for FixedRasterizer {
        fn rasterize(&self, _surface: &PageSurface<'_>, _scale: f32) -> Result<RgbImage> {
            Ok(RgbImage::new(self.0, self.1))
        }
    }

    #[test]
    fn test_fit_sheet_image() {
        let fit = PageFit::for_image(1588, 2244);
        assert_eq!(fit.width_mm, 210.0);
        assert!((fit.height_mm - 296.75).abs() < 0.01);
        assert!((fit.y_mm - 0.125).abs() < 0.01);
        assert_eq!(fit.x_mm, 0.0);
    }

    #[test]
    fn test_fit_wide_image_is_centered() {
        let fit = PageFit::for_image(2100, 1000);
        assert!((fit.height_mm - 100.0).abs() < 1e-3);
        assert!((fit.y_mm - 98.5).abs() < 1e-3);
        let (_, bottom, _, height) = fit.to_pdf_rect();
        assert!((bottom - 98.5 * POINTS_PER_MM).abs() < 1e-2);
        assert!((height - 100.0 * POINTS_PER_MM).abs() < 1e-2);
    }

    #[test]
    fn test_fit_tall_image_clamps_top() {
        let fit = PageFit::for_image(100, 300);
        assert_eq!(fit.y_mm, 0.0);
        assert!((fit.height_mm - 630.0).abs() < 1e-3);
        let (_, bottom, _, _) = fit.to_pdf_rect();
        assert!(bottom < 0.0);
    }

    #[test]
    fn test_missing_surface_is_a_no_op() {
        let result = export_to_pdf(None, &FailingRasterizer, &ExportOptions::default()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_rasterizer_failure_is_an_export_error() {
        let settings = Settings::default();
        let layout = build_layout(&settings);
        let contents = BlockContent::new();
        let surface = PageSurface::new(&settings, &layout, &contents);
        let err = export_to_pdf(Some(&surface), &FailingRasterizer, &ExportOptions::default())
            .unwrap_err();
        assert!(matches!(err, SheetError::Export(ref msg) if msg.contains("capture lost")));
    }

    #[test]
    fn test_empty_raster_is_rejected() {
        let settings = Settings::default();
        let layout = build_layout(&settings);
        let contents = BlockContent::new();
        let surface = PageSurface::new(&settings, &layout, &contents);
        let result = export_to_pdf(
            Some(&surface),
            &FixedRasterizer(0, 0),
            &ExportOptions::default(),
        );
        assert!(matches!(result, Err(SheetError::Export(_))));
    }

    #[test]
    fn test_exported_pdf_has_one_a4_page_with_image() {
        let settings = Settings::default();
        let layout = build_layout(&settings);
        let mut contents = BlockContent::new();
        contents
            .set(BlockId::new(0, 0), "<p>Exported text</p>", 100)
            .unwrap();
        let surface = PageSurface::new(&settings, &layout, &contents);
        let options = ExportOptions {
            scale: 0.5,
            ..Default::default()
        };

        let bytes = export_to_pdf(Some(&surface), &GreekingRasterizer::default(), &options)
            .unwrap()
            .unwrap();
        assert!(bytes.starts_with(b"%PDF-"));

        let doc = Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);

        let images: Vec<_> = doc
            .objects
            .values()
            .filter_map(|object| match object {
                Object::Stream(stream) => Some(stream),
                _ => None,
            })
            .filter(|stream| {
                matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(name)) if name == b"Image")
            })
            .collect();
        assert_eq!(images.len(), 1);
        assert!(matches!(images[0].dict.get(b"Width"), Ok(Object::Integer(397))));
        assert!(matches!(images[0].dict.get(b"Height"), Ok(Object::Integer(561))));
    }
}
