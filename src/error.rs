//! Error types for the blocksheet library

use crate::layout::BlockId;
use thiserror::Error;

/// Result type alias using SheetError
pub type Result<T> = std::result::Result<T, SheetError>;

/// Errors that can occur when editing, persisting or exporting a sheet
#[derive(Debug, Error)]
pub enum SheetError {
    /// Error from the underlying lopdf library
    #[error("PDF operation failed: {0}")]
    PdfError(#[from] lopdf::Error),

    /// Storage backend I/O failure
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot entry could not be encoded or decoded
    #[error("Snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Edit rejected because its plain text does not fit the block
    #[error("Block {id} holds at most {capacity} characters, edit has {length}")]
    CapacityExceeded {
        id: BlockId,
        length: usize,
        capacity: usize,
    },

    /// Block id is not part of the current layout
    #[error("Block {0} is not part of the current layout")]
    UnknownBlock(BlockId),

    /// Malformed block id string
    #[error("Invalid block id: {0:?}")]
    InvalidBlockId(String),

    /// Settings outside the supported ranges
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// Snapshot written by a newer schema
    #[error("Snapshot schema version {found} is newer than supported version {supported}")]
    UnsupportedSchema { found: u32, supported: u32 },

    /// Rasterization or document assembly failed
    #[error("Export failed: {0}")]
    Export(String),

    /// Font data could not be parsed
    #[error("Font loading failed: {0}")]
    FontError(String),
}
