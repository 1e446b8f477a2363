//! Compact two-column packing.
//!
//! Under every node with at least two childless displayed children, those
//! children are packed into a two-column grid instead of being spread along
//! the cross axis. The flextree pass reserves the whole grid once, on the
//! first member; a second pass then moves every member into its cell.

use serde::Serialize;

/// Drift below which a packed group is snapped onto its parent's axis.
pub const RECENTER_THRESHOLD: f32 = 10.0;

/// Where one member sits inside its group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactSlot {
    /// Layout index of the group's first member.
    pub first: usize,
    pub row: usize,
    /// 0 for even members, 1 for odd.
    pub column: usize,
    /// Cross extent of the whole block, pair margin included.
    pub block_cross: f32,
}

impl CompactSlot {
    #[inline]
    pub fn is_even(&self) -> bool {
        self.column == 0
    }
}

/// One packed run of childless siblings. Rebuilt every layout pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CompactGroup {
    pub parent: usize,
    /// Members in child order; `members[i]` sits at row `i / 2`, column `i % 2`.
    pub members: Vec<usize>,
    /// Twice the widest member cross extent over both columns.
    pub column_width: f32,
    /// Per row: tallest member main extent plus the between margin.
    pub row_heights: Vec<f32>,
    /// `[column_width + pair margin, sum(row_heights) - between margin]`.
    pub block: [f32; 2],
}

impl CompactGroup {
    #[inline]
    pub fn first(&self) -> usize {
        self.members[0]
    }

    pub fn slot(&self, i: usize) -> CompactSlot {
        CompactSlot {
            first: self.first(),
            row: i / 2,
            column: i % 2,
            block_cross: self.block[0],
        }
    }

    /// Footprint charged to member `i` by the outer layout.
    pub fn footprint(&self, i: usize) -> [f32; 2] {
        if i == 0 { self.block } else { [0.0, 0.0] }
    }
}

/// Margins used while packing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompactMargins {
    /// Gap between the two columns.
    pub pair: f32,
    /// Gap between rows.
    pub between: f32,
}

/// Find and size every compact group.
///
/// `cross` and `main` are node extents in the layout frame.
pub fn pack(
    children: &[Vec<usize>],
    cross: &[f32],
    main: &[f32],
    margins: CompactMargins,
) -> Vec<CompactGroup> {
    let mut groups = Vec::new();
    for (parent, kids) in children.iter().enumerate() {
        if kids.len() < 2 {
            continue;
        }
        let members: Vec<usize> = kids
            .iter()
            .copied()
            .filter(|&c| children[c].is_empty())
            .collect();
        if members.len() < 2 {
            continue;
        }

        let column_max = |column: usize| {
            members
                .iter()
                .skip(column)
                .step_by(2)
                .map(|&m| cross[m])
                .fold(0.0f32, f32::max)
        };
        let column_width = column_max(0).max(column_max(1)) * 2.0;

        let row_heights: Vec<f32> = members
            .chunks(2)
            .map(|row| {
                row.iter()
                    .map(|&m| main[m] + margins.between)
                    .fold(0.0f32, f32::max)
            })
            .collect();
        let block_main = row_heights.iter().sum::<f32>() - margins.between;

        tracing::trace!(
            parent,
            members = members.len(),
            rows = row_heights.len(),
            column_width,
            "packed compact group"
        );
        groups.push(CompactGroup {
            parent,
            members,
            column_width,
            row_heights,
            block: [column_width + margins.pair, block_main],
        });
    }
    groups
}

/// Move every member into its grid cell.
///
/// Expects the flextree pass to have placed the first member at the center of
/// the reserved block. `x` is the cross-axis center and `y` the main-axis start.
pub fn position(groups: &[CompactGroup], x: &mut [f32], y: &mut [f32], margins: CompactMargins) {
    for group in groups {
        let first = group.first();
        let dim = group.block[0];
        let left = x[first] - dim / 2.0;
        let top = y[first];

        for (i, &m) in group.members.iter().enumerate() {
            x[m] = if i % 2 == 0 {
                left + dim * 0.25 - margins.pair / 4.0
            } else {
                left + dim * 0.75 + margins.pair / 4.0
            };
        }

        let center = left + dim * 0.5;
        let offset = x[group.parent] - center;
        if offset.abs() < RECENTER_THRESHOLD {
            for &m in &group.members {
                x[m] += offset;
            }
        }

        let mut row_top = top;
        for (row, pair) in group.members.chunks(2).enumerate() {
            for &m in pair {
                y[m] = row_top;
            }
            row_top += group.row_heights[row];
        }
    }
}
