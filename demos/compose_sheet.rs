//! Compose a sheet, persist it to a directory and export it as a PDF

use blocksheet::{
    BlockId, ExportOptions, FileStorage, GreekingRasterizer, KeyValueSnapshotStore, Settings,
    SheetError, Sheet,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .init();

    let store = KeyValueSnapshotStore::new(FileStorage::open("sheet-session")?);
    let mut sheet = Sheet::open(store)?;

    sheet.apply_settings(Settings::with_blocks(10).font_size(9.0).letter_spacing(0.0))?;
    println!("Columns hold {:?} blocks", sheet.layout().distribution());

    sheet.set_content(
        BlockId::new(0, 0),
        "<p><strong>Agenda</strong></p><ol><li>Review</li><li>Plan</li></ol>",
    )?;
    sheet.set_content(BlockId::new(1, 0), "<p>Notes &amp; follow-ups</p>")?;

    let too_long = "<p>".to_string() + &"overflow ".repeat(2000) + "</p>";
    match sheet.set_content(BlockId::new(3, 1), too_long) {
        Err(SheetError::CapacityExceeded {
            length, capacity, ..
        }) => println!("Rejected {length} characters for a {capacity} character block"),
        other => println!("Unexpected result: {other:?}"),
    }

    for view in sheet.blocks() {
        println!(
            "{:>4} {:>4}px  {:>6} left",
            view.block.id.to_string(),
            view.block.height_px,
            view.remaining
        );
    }

    let path = sheet.save_pdf(&GreekingRasterizer::default(), &ExportOptions::default(), ".")?;
    println!("PDF saved as '{}'", path.display());

    Ok(())
}
