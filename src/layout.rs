//! Layout calculation for the four-column sheet

use crate::capacity::CapacityModel;
use crate::constants::*;
use crate::error::SheetError;
use crate::settings::Settings;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, trace};

/// Number of blocks in each column, leading columns first
pub type ColumnDistribution = [usize; COLUMN_COUNT];

/// Split a block count across the columns, giving remainder blocks to the leading columns
pub fn distribute(total: usize) -> ColumnDistribution {
    let base = total / COLUMN_COUNT;
    let extra = total % COLUMN_COUNT;
    let mut distribution = [base; COLUMN_COUNT];
    for count in distribution.iter_mut().take(extra) {
        *count += 1;
    }
    distribution
}

/// Position of a block on the sheet, also its content key
///
/// Rendered and persisted as `"{column}-{position}"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlockId {
    pub column: usize,
    pub position: usize,
}

impl BlockId {
    pub fn new(column: usize, position: usize) -> Self {
        Self { column, position }
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.column, self.position)
    }
}

impl FromStr for BlockId {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SheetError::InvalidBlockId(s.to_string());
        let (column, position) = s.split_once('-').ok_or_else(invalid)?;
        let column = column.parse().map_err(|_| invalid())?;
        let position = position.parse().map_err(|_| invalid())?;
        let id = Self { column, position };
        // Only the printed form is a valid key
        if id.to_string() != s {
            return Err(invalid());
        }
        Ok(id)
    }
}

impl TryFrom<String> for BlockId {
    type Error = SheetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BlockId> for String {
    fn from(id: BlockId) -> Self {
        id.to_string()
    }
}

/// One editable block in the computed layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDescriptor {
    pub id: BlockId,
    pub height_px: u32,
    pub capacity: usize,
}

/// Calculated layout information for a sheet
#[derive(Debug, Clone, PartialEq)]
pub struct SheetLayout {
    pub columns: [Vec<BlockDescriptor>; COLUMN_COUNT],
}

impl SheetLayout {
    /// Descriptor for a block, if the block exists in this layout
    pub fn block(&self, id: &BlockId) -> Option<&BlockDescriptor> {
        self.columns
            .get(id.column)
            .and_then(|column| column.get(id.position))
    }

    /// Capacity of a block in this layout
    pub fn capacity_of(&self, id: &BlockId) -> Option<usize> {
        self.block(id).map(|block| block.capacity)
    }

    pub fn contains(&self, id: &BlockId) -> bool {
        self.block(id).is_some()
    }

    /// All blocks, column by column, top to bottom
    pub fn blocks(&self) -> impl Iterator<Item = &BlockDescriptor> {
        self.columns.iter().flatten()
    }

    pub fn block_count(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }

    /// Blocks per column
    pub fn distribution(&self) -> ColumnDistribution {
        let mut distribution = [0; COLUMN_COUNT];
        for (count, column) in distribution.iter_mut().zip(&self.columns) {
            *count = column.len();
        }
        distribution
    }
}

/// Height of each block in a column holding `count` blocks
pub fn block_height_px(count: usize) -> u32 {
    let gaps = BLOCK_GAP_PX as i64 * (count as i64 - 1);
    let inner = PAGE_HEIGHT_PX as i64 - 2 * COLUMN_PADDING_PX as i64 - gaps;
    let height = inner.div_euclid(count.max(1) as i64);
    height.max(0) as u32
}

/// Calculate the layout for a sheet with the default capacity heuristic
pub fn build_layout(settings: &Settings) -> SheetLayout {
    build_layout_with(settings, &CapacityModel::default())
}

/// Calculate the layout for a sheet with a custom capacity model
pub fn build_layout_with(settings: &Settings, model: &CapacityModel) -> SheetLayout {
    let distribution = distribute(settings.block_count);
    debug!(
        "Calculating layout for {} blocks as {:?}",
        settings.block_count, distribution
    );

    let columns: [Vec<BlockDescriptor>; COLUMN_COUNT] = std::array::from_fn(|column| {
        let count = distribution[column];
        let height_px = block_height_px(count);
        let capacity = model.estimate(
            f64::from(height_px),
            settings.font_size_px,
            settings.line_height,
            settings.letter_spacing,
        );
        trace!(column, count, height_px, capacity, "Column layout");

        (0..count)
            .map(|position| BlockDescriptor {
                id: BlockId::new(column, position),
                height_px,
                capacity,
            })
            .collect()
    });

    SheetLayout { columns }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distribute_examples() {
        assert_eq!(distribute(0), [0, 0, 0, 0]);
        assert_eq!(distribute(8), [2, 2, 2, 2]);
        assert_eq!(distribute(9), [3, 2, 2, 2]);
        assert_eq!(distribute(10), [3, 3, 2, 2]);
        assert_eq!(distribute(11), [3, 3, 3, 2]);
        assert_eq!(distribute(1), [1, 0, 0, 0]);
    }

    #[test]
    fn test_distribute_is_fair() {
        for total in 0..=200 {
            let distribution = distribute(total);
            assert_eq!(distribution.iter().sum::<usize>(), total);
            let max = distribution.iter().max().unwrap();
            let min = distribution.iter().min().unwrap();
            assert!(max - min <= 1, "unfair split {distribution:?} for {total}");
            assert!(distribution.windows(2).all(|pair| pair[0] >= pair[1]));
        }
    }

    #[test]
    fn test_block_heights() {
        // 1122 - 24 = 1098
        assert_eq!(block_height_px(1), 1098);
        // (1098 - 8) / 2
        assert_eq!(block_height_px(2), 545);
        // (1098 - 16) / 3 = 360.67
        assert_eq!(block_height_px(3), 360);
        // Empty columns keep the full inner height plus one gap
        assert_eq!(block_height_px(0), 1106);
    }

    #[test]
    fn test_default_layout() {
        let layout = build_layout(&Settings::default());
        assert_eq!(layout.distribution(), [2, 2, 2, 2]);
        assert_eq!(layout.block_count(), 8);
        for block in layout.blocks() {
            assert_eq!(block.height_px, 545);
            // 545 / 6 = 90 lines at 240 chars
            assert_eq!(block.capacity, 90 * 240);
        }
    }

    #[test]
    fn test_ids_follow_column_and_position() {
        let layout = build_layout(&Settings::with_blocks(10));
        let ids: Vec<String> = layout.blocks().map(|b| b.id.to_string()).collect();
        assert_eq!(
            ids,
            vec!["0-0", "0-1", "0-2", "1-0", "1-1", "1-2", "2-0", "2-1", "3-0", "3-1"]
        );
        assert!(layout.contains(&BlockId::new(1, 2)));
        assert!(!layout.contains(&BlockId::new(2, 2)));
        assert!(!layout.contains(&BlockId::new(4, 0)));
    }

    #[test]
    fn test_uneven_columns_have_different_heights() {
        let layout = build_layout(&Settings::with_blocks(9));
        assert_eq!(layout.columns[0][0].height_px, 360);
        assert_eq!(layout.columns[1][0].height_px, 545);
        assert!(layout.columns[0][0].capacity <= layout.columns[1][0].capacity);
    }

    #[test]
    fn test_relayout_restores_ids() {
        let eight = build_layout(&Settings::with_blocks(8));
        let four = build_layout(&Settings::with_blocks(4));
        assert_eq!(four.distribution(), [1, 1, 1, 1]);
        assert!(!four.contains(&BlockId::new(0, 1)));
        let back = build_layout(&Settings::with_blocks(8));
        assert_eq!(back, eight);
    }

    #[test]
    fn test_block_id_round_trip() {
        let id: BlockId = "3-12".parse().unwrap();
        assert_eq!(id, BlockId::new(3, 12));
        assert_eq!(id.to_string(), "3-12");
        assert!("3".parse::<BlockId>().is_err());
        assert!("a-1".parse::<BlockId>().is_err());
        assert!("1-".parse::<BlockId>().is_err());
    }

    #[test]
    fn test_block_id_rejects_non_canonical_forms() {
        for raw in ["01-2", "+0-1", "0-+1", "0-01", " 0-1", "0-1 "] {
            assert!(
                matches!(raw.parse::<BlockId>(), Err(SheetError::InvalidBlockId(ref s)) if s == raw),
                "{raw} should be rejected"
            );
        }
        assert!(serde_json::from_str::<BlockId>(r#""00-0""#).is_err());
    }

    #[test]
    fn test_block_id_serializes_as_string() {
        let json = serde_json::to_string(&BlockId::new(2, 1)).unwrap();
        assert_eq!(json, "\"2-1\"");
        let id: BlockId = serde_json::from_str("\"0-3\"").unwrap();
        assert_eq!(id, BlockId::new(0, 3));
    }
}
