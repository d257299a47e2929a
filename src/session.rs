//! The editable sheet: settings, layout and contents with write-through persistence

use crate::Result;
use crate::content::BlockContent;
use crate::error::SheetError;
use crate::export::{ExportOptions, export_to_pdf};
use crate::layout::{BlockDescriptor, BlockId, SheetLayout, build_layout};
use crate::raster::{PageSurface, Rasterizer};
use crate::settings::Settings;
use crate::storage::{KeyValueSnapshotStore, MemoryStorage, PersistedSnapshot, SnapshotStore};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// What the view layer needs to draw one block
#[derive(Debug, Clone, PartialEq)]
pub struct BlockView<'a> {
    pub block: BlockDescriptor,
    pub markup: &'a str,
    /// Characters left; negative when the block is over budget
    pub remaining: i64,
}

impl BlockView<'_> {
    pub fn is_over_budget(&self) -> bool {
        self.remaining < 0
    }
}

/// Application state for one editing session
///
/// Every mutation is written through to the snapshot store before it returns.
#[derive(Debug)]
pub struct Sheet<S: SnapshotStore> {
    settings: Settings,
    layout: SheetLayout,
    contents: BlockContent,
    store: S,
}

impl Sheet<KeyValueSnapshotStore<MemoryStorage>> {
    /// A fresh sheet backed by in-memory storage
    pub fn in_memory() -> Self {
        Self::from_snapshot(
            KeyValueSnapshotStore::new(MemoryStorage::new()),
            PersistedSnapshot::default(),
        )
    }
}

impl<S: SnapshotStore> Sheet<S> {
    /// Restore the sheet from the store, falling back to defaults
    ///
    /// A corrupt or invalid snapshot is logged and replaced by defaults.
    /// Snapshots written by a newer schema and storage failures are returned
    /// as errors so the stored data is never overwritten.
    #[instrument(skip(store))]
    pub fn open(store: S) -> Result<Self> {
        let snapshot = match store.load() {
            Ok(Some(snapshot)) => match snapshot.settings.validate() {
                Ok(()) => snapshot,
                Err(e) => {
                    warn!("Ignoring stored snapshot: {e}");
                    PersistedSnapshot::default()
                }
            },
            Ok(None) => PersistedSnapshot::default(),
            Err(SheetError::Serialization(e)) => {
                warn!("Ignoring unreadable snapshot: {e}");
                PersistedSnapshot::default()
            }
            Err(e) => return Err(e),
        };
        Ok(Self::from_snapshot(store, snapshot))
    }

    fn from_snapshot(store: S, snapshot: PersistedSnapshot) -> Self {
        let layout = build_layout(&snapshot.settings);
        debug!(
            blocks = layout.block_count(),
            entries = snapshot.contents.len(),
            "Opened sheet"
        );
        Self {
            settings: snapshot.settings,
            layout,
            contents: snapshot.contents,
            store,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn layout(&self) -> &SheetLayout {
        &self.layout
    }

    pub fn contents(&self) -> &BlockContent {
        &self.contents
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Give back the snapshot store, ending the session
    pub fn into_store(self) -> S {
        self.store
    }

    /// Replace the settings wholesale and rebuild the layout
    ///
    /// Content stays keyed by block id and is never truncated; blocks whose
    /// capacity shrank report a negative remaining count instead.
    #[instrument(skip(self))]
    pub fn apply_settings(&mut self, next: Settings) -> Result<()> {
        next.validate()?;
        self.store.save(&next, &self.contents)?;

        self.settings = next;
        self.layout = build_layout(&self.settings);
        info!(
            blocks = self.settings.block_count,
            "Applied settings as {:?}",
            self.layout.distribution()
        );
        Ok(())
    }

    /// Edit a block, returning the characters left
    ///
    /// Edits whose plain text exceeds the block's current capacity are
    /// rejected with [`SheetError::CapacityExceeded`] and change nothing.
    pub fn set_content(&mut self, id: BlockId, markup: impl Into<String>) -> Result<i64> {
        let capacity = self
            .layout
            .capacity_of(&id)
            .ok_or(SheetError::UnknownBlock(id))?;

        let previous = self.contents.entry(&id).cloned();
        let remaining = self.contents.set(id, markup, capacity)?;
        if let Err(e) = self.store.save(&self.settings, &self.contents) {
            self.contents.restore(id, previous);
            return Err(e);
        }
        Ok(remaining)
    }

    /// Empty a block regardless of capacity
    pub fn clear_content(&mut self, id: BlockId) -> Result<()> {
        let previous = self.contents.entry(&id).cloned();
        self.contents.clear(id);
        if let Err(e) = self.store.save(&self.settings, &self.contents) {
            self.contents.restore(id, previous);
            return Err(e);
        }
        Ok(())
    }

    /// Characters left in a block of the current layout
    pub fn remaining(&self, id: &BlockId) -> Option<i64> {
        self.layout
            .capacity_of(id)
            .map(|capacity| self.contents.remaining(id, capacity))
    }

    /// Every block of the current layout with its content, column by column
    pub fn blocks(&self) -> impl Iterator<Item = BlockView<'_>> {
        self.layout.blocks().map(|block| BlockView {
            block: *block,
            markup: self.contents.get(&block.id),
            remaining: self.contents.remaining(&block.id, block.capacity),
        })
    }

    /// Ids holding content that the current layout does not show
    pub fn orphaned_blocks(&self) -> Vec<BlockId> {
        self.contents.orphans(&self.layout)
    }

    /// Delete content the current layout does not show, returning how many entries went
    pub fn discard_orphans(&mut self) -> Result<usize> {
        let mut kept = self.contents.clone();
        let dropped = kept.retain_layout(&self.layout);
        if dropped > 0 {
            self.store.save(&self.settings, &kept)?;
            self.contents = kept;
            debug!(dropped, "Discarded orphaned block content");
        }
        Ok(dropped)
    }

    /// Restore default settings, empty every block and forget the stored snapshot
    ///
    /// The in-memory state only changes once the store is cleared.
    #[instrument(skip(self))]
    pub fn reset_all(&mut self) -> Result<()> {
        self.store.clear()?;
        self.settings = Settings::default();
        self.layout = build_layout(&self.settings);
        self.contents = BlockContent::new();
        info!("Reset sheet to defaults");
        Ok(())
    }

    /// The rendered page as a rasterizer sees it
    pub fn surface(&self) -> PageSurface<'_> {
        PageSurface::new(&self.settings, &self.layout, &self.contents)
    }

    /// Rasterize the sheet and assemble a PDF
    ///
    /// Takes `&mut self` so no edit or second export can overlap a running one.
    pub fn export_pdf(
        &mut self,
        rasterizer: &dyn Rasterizer,
        options: &ExportOptions,
    ) -> Result<Vec<u8>> {
        let surface = self.surface();
        export_to_pdf(Some(&surface), rasterizer, options)?
            .ok_or_else(|| SheetError::Export("nothing was rendered".to_string()))
    }

    /// Export the sheet into `dir` under the configured file name
    pub fn save_pdf(
        &mut self,
        rasterizer: &dyn Rasterizer,
        options: &ExportOptions,
        dir: impl AsRef<Path>,
    ) -> Result<PathBuf> {
        let bytes = self.export_pdf(rasterizer, options)?;
        let path = dir.as_ref().join(&options.file_name);
        fs::write(&path, bytes)?;
        info!("Saved sheet to {}", path.display());
        Ok(path)
    }
}
