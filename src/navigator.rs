//! Order/row seeking across the order → pattern → row hierarchy
//!
//! The walks here are pure functions over a [`PatternLayout`] so the
//! arithmetic can be exercised without a decoder. The engine applies the
//! result with [`crate::ModuleDecoder::set_position_order_row`].
//!
//! Orders that reference no pattern (negative index, e.g. `+++` skip markers)
//! or a pattern with zero rows are treated as zero-length: they contribute no
//! rows but the order cursor still moves across them.

use crate::decoder::ModuleDecoder;

/// Read-only view of the order list and pattern sizes
pub trait PatternLayout {
    /// Length of the order list
    fn order_count(&self) -> i32;
    /// Pattern referenced by `order` (negative for none)
    fn pattern_for_order(&self, order: i32) -> i32;
    /// Rows in `pattern` (0 or negative for invalid)
    fn rows_in_pattern(&self, pattern: i32) -> i32;

    /// Rows playable at `order`, 0 when the order is skipped
    fn rows_in_order(&self, order: i32) -> i32 {
        let pattern = self.pattern_for_order(order);
        if pattern < 0 {
            return 0;
        }
        self.rows_in_pattern(pattern).max(0)
    }
}

impl PatternLayout for dyn ModuleDecoder + '_ {
    fn order_count(&self) -> i32 {
        self.num_orders()
    }

    fn pattern_for_order(&self, order: i32) -> i32 {
        self.order_pattern(order)
    }

    fn rows_in_pattern(&self, pattern: i32) -> i32 {
        self.pattern_num_rows(pattern)
    }
}

/// A row inside the order list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPosition {
    /// Order index
    pub order: i32,
    /// Row inside the order's pattern
    pub row: i32,
}

impl RowPosition {
    /// Position at `row` of `order`
    pub fn new(order: i32, row: i32) -> Self {
        RowPosition { order, row }
    }
}

/// A row that playback has not reached yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewPosition {
    /// Order index
    pub order: i32,
    /// Pattern played at that order
    pub pattern: i32,
    /// Row inside the pattern
    pub row: i32,
}

/// `current + delta` clamped to `[0, order_count - 1]`.
///
/// Returns `None` when the layout has no orders.
pub fn clamp_order(current: i32, delta: i32, order_count: i32) -> Option<i32> {
    if order_count <= 0 {
        return None;
    }
    let target = i64::from(current) + i64::from(delta);
    Some(target.clamp(0, i64::from(order_count - 1)) as i32)
}

/// Move `delta_rows` rows from `from`, clamping at both ends of the song.
///
/// Returns `from` unchanged for `delta_rows == 0` and `None` for an empty
/// order list.
pub fn walk_rows<L: PatternLayout + ?Sized>(
    layout: &L,
    from: RowPosition,
    delta_rows: i32,
) -> Option<RowPosition> {
    let total = layout.order_count();
    if total <= 0 {
        return None;
    }
    let start = RowPosition::new(from.order.clamp(0, total - 1), from.row.max(0));
    let target = match delta_rows.signum() {
        1 => walk_forward(layout, start, delta_rows.unsigned_abs()),
        -1 => walk_backward(layout, start, delta_rows.unsigned_abs()),
        _ => start,
    };
    Some(target)
}

fn walk_forward<L: PatternLayout + ?Sized>(
    layout: &L,
    from: RowPosition,
    mut remaining: u32,
) -> RowPosition {
    let total = layout.order_count();
    let RowPosition { mut order, mut row } = from;

    while remaining > 0 && order < total {
        let rows = layout.rows_in_order(order);
        if rows <= 0 {
            order += 1;
            row = 0;
            continue;
        }
        // rows left after the current one
        let rows_left = (rows - row.min(rows - 1) - 1) as u32;
        if remaining <= rows_left {
            row = row.min(rows - 1) + remaining as i32;
            remaining = 0;
            break;
        }
        remaining -= rows_left + 1;
        order += 1;
        row = 0;
    }

    if order >= total {
        order = total - 1;
        row = (layout.rows_in_order(order) - 1).max(0);
    }
    RowPosition { order, row }
}

fn walk_backward<L: PatternLayout + ?Sized>(
    layout: &L,
    from: RowPosition,
    mut remaining: u32,
) -> RowPosition {
    let RowPosition { mut order, mut row } = from;

    while remaining > 0 {
        if row > 0 {
            let step = (row as u32).min(remaining);
            row -= step as i32;
            remaining -= step;
            if remaining == 0 {
                break;
            }
        }
        order -= 1;
        if order < 0 {
            return RowPosition::new(0, 0);
        }
        let rows = layout.rows_in_order(order);
        if rows <= 0 {
            row = 0;
            continue;
        }
        // entering the previous pattern at its last row costs one step
        row = rows - 1;
        remaining -= 1;
    }
    RowPosition { order, row }
}

/// Rows following `(order, pattern, row)`, at most `limit` of them.
///
/// Starts on the row after the current one inside `pattern` (the pattern
/// actually playing, which may differ from the order list's entry during
/// pattern breaks), then continues through subsequent orders with the same
/// skipping rules as [`walk_rows`]. Returns nothing if any of the inputs is
/// negative.
pub fn preview_positions<L: PatternLayout + ?Sized>(
    layout: &L,
    order: i32,
    pattern: i32,
    row: i32,
    limit: usize,
) -> Vec<PreviewPosition> {
    let mut previews = Vec::new();
    if order < 0 || pattern < 0 || row < 0 {
        return previews;
    }
    let total = layout.order_count();
    let mut order_index = order;
    let mut pattern_index = pattern;
    let mut row_index = row + 1;

    while previews.len() < limit && order_index < total {
        let rows = if pattern_index < 0 {
            0
        } else {
            layout.rows_in_pattern(pattern_index)
        };
        while row_index < rows && previews.len() < limit {
            previews.push(PreviewPosition {
                order: order_index,
                pattern: pattern_index,
                row: row_index,
            });
            row_index += 1;
        }
        if previews.len() >= limit {
            break;
        }
        order_index += 1;
        row_index = 0;
        if order_index >= total {
            break;
        }
        pattern_index = layout.pattern_for_order(order_index);
    }
    previews
}
