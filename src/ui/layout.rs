//! Screen geometry
//!
//! Pure functions so placement can be tested without a terminal.

use ratatui::layout::Rect;
use std::ops::Range;

/// Display width of a label in terminal cells
pub fn label_width(label: &str) -> u16 {
    u16::try_from(label.chars().count()).unwrap_or(u16::MAX)
}

/// Entries of a `len`-long list that fit in `rows`, keeping `selected`
/// visible and roughly centred.
pub fn visible_window(len: usize, selected: usize, rows: usize) -> Range<usize> {
    if len <= rows {
        return 0..len;
    }
    let start = selected.saturating_sub(rows / 2).min(len - rows);
    start..start + rows
}

/// Top-left cell for each label inside `area`.
///
/// The block of labels is centred vertically (row `h/2 - n/2 + i`) and each
/// label is centred horizontally (column `w/2 - width/2`). Labels wider
/// than the area start at its left edge. Callers pass only the labels that
/// fit, see [`visible_window`].
pub fn menu_positions(area: Rect, labels: &[&str]) -> Vec<(u16, u16)> {
    let count = u16::try_from(labels.len()).unwrap_or(u16::MAX);
    let top = (area.height / 2).saturating_sub(count / 2);
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let x = (area.width / 2).saturating_sub(label_width(label) / 2);
            let y = top.saturating_add(i as u16);
            (area.x + x, area.y + y)
        })
        .collect()
}

/// Rectangle of at most `width` x `height` centred in `area`
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
