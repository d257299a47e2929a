//! Block content store with capacity enforcement

use crate::Result;
use crate::error::SheetError;
use crate::layout::{BlockId, SheetLayout};
use crate::text::plain_len;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Markup of every block that has been edited, keyed by block id
///
/// Entries outlive layout changes: an id that drops out of the layout keeps
/// its content until it is cleared or discarded explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockContent {
    entries: BTreeMap<BlockId, String>,
}

impl BlockContent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored markup for a block, empty when never edited
    pub fn get(&self, id: &BlockId) -> &str {
        self.entries.get(id).map(String::as_str).unwrap_or("")
    }

    /// Store markup if its plain text fits `capacity`, returning the characters left
    ///
    /// An edit that does not fit leaves the stored markup untouched.
    pub fn set(&mut self, id: BlockId, markup: impl Into<String>, capacity: usize) -> Result<i64> {
        let markup = markup.into();
        let length = plain_len(&markup);
        if length > capacity {
            debug!(%id, length, capacity, "Rejected edit over block capacity");
            return Err(SheetError::CapacityExceeded {
                id,
                length,
                capacity,
            });
        }

        trace!(%id, length, capacity, "Stored block content");
        self.entries.insert(id, markup);
        Ok(remaining_for(length, capacity))
    }

    /// Empty a block without checking capacity
    pub fn clear(&mut self, id: BlockId) {
        self.entries.insert(id, String::new());
    }

    /// Put back a previous value exactly as it was, including absence
    pub(crate) fn restore(&mut self, id: BlockId, previous: Option<String>) {
        match previous {
            Some(markup) => {
                self.entries.insert(id, markup);
            }
            None => {
                self.entries.remove(&id);
            }
        }
    }

    pub(crate) fn entry(&self, id: &BlockId) -> Option<&String> {
        self.entries.get(id)
    }

    /// Characters left in a block; negative once capacity shrank below the stored text
    pub fn remaining(&self, id: &BlockId, capacity: usize) -> i64 {
        remaining_for(plain_len(self.get(id)), capacity)
    }

    /// Ids with stored content that the layout no longer shows
    pub fn orphans(&self, layout: &SheetLayout) -> Vec<BlockId> {
        self.entries
            .keys()
            .filter(|id| !layout.contains(id))
            .copied()
            .collect()
    }

    /// Drop every entry the layout no longer shows, returning how many were dropped
    pub fn retain_layout(&mut self, layout: &SheetLayout) -> usize {
        let before = self.entries.len();
        self.entries.retain(|id, _| layout.contains(id));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BlockId, &str)> {
        self.entries.iter().map(|(id, markup)| (id, markup.as_str()))
    }
}

fn remaining_for(length: usize, capacity: usize) -> i64 {
    capacity as i64 - length as i64
}
