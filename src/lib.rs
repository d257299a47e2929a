//! A4 sheet of text blocks with character budgets and PDF export built on lopdf
//!
//! A sheet is an A4 page split into four columns of independently editable
//! rich-text blocks. Each block gets a character budget estimated from its
//! height and the sheet's typography, edits beyond the budget are rejected,
//! and the finished page can be rasterized and exported as a one-page PDF.

use image::RgbImage;
use lopdf::{Document, ObjectId};
use tracing::{debug, instrument};

pub mod capacity;
pub mod constants;
pub mod content;
mod drawing;
pub mod error;
pub mod export;
pub mod font;
pub mod layout;
pub mod raster;
pub mod session;
pub mod settings;
pub mod storage;
pub mod style;
pub mod text;

pub use capacity::{CapacityModel, estimate_capacity};
pub use content::BlockContent;
pub use error::{Result, SheetError};
pub use export::{ExportOptions, PageFit, export_to_pdf};
pub use font::{FontMetrics, HeuristicMetrics};
#[cfg(feature = "ttf-parser")]
pub use font::TtfFontMetrics;
pub use layout::{BlockDescriptor, BlockId, SheetLayout, build_layout, distribute};
pub use raster::{GreekingRasterizer, PageSurface, Rasterizer};
pub use session::{BlockView, Sheet};
pub use settings::Settings;
pub use storage::{
    FileStorage, KeyValueSnapshotStore, KeyValueStorage, MemoryStorage, PersistedSnapshot,
    SnapshotStore,
};
pub use style::{Color, RasterStyle};

/// Extension trait for lopdf::Document to place rasterized sheets
pub trait SheetDrawing {
    /// Draw a sheet raster onto a page
    ///
    /// # Arguments
    /// * `page_id` - The object ID of the page to draw on
    /// * `image` - The rasterized sheet
    /// * `fit` - Where the image lands on the A4 page
    ///
    /// # Returns
    /// Returns Ok(()) on success, or an error if the page cannot be updated
    fn draw_sheet_image(&mut self, page_id: ObjectId, image: &RgbImage, fit: PageFit)
    -> Result<()>;
}

impl SheetDrawing for Document {
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    fn draw_sheet_image(
        &mut self,
        page_id: ObjectId,
        image: &RgbImage,
        fit: PageFit,
    ) -> Result<()> {
        if !self.get_pages().values().any(|id| *id == page_id) {
            return Err(SheetError::Export(format!("page {page_id:?} not found")));
        }

        let xobject_id = drawing::add_image_xobject(self, image);
        let name = format!("Sheet{}", xobject_id.0);
        debug!("Registering sheet image as /{}", name);

        drawing::register_xobject(self, page_id, &name, xobject_id)?;
        let operations = drawing::place_image_operations(&name, &fit);
        drawing::add_operations_to_page(self, page_id, operations)?;

        Ok(())
    }
}
