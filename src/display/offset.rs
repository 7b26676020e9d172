//! Scroll offset arithmetic for the viewport

/// New horizontal offset, never negative
pub fn horizontal_offset(delta: i64, current: usize) -> usize {
    let next = current as i64 + delta;
    next.max(0) as usize
}

/// New vertical offset relative to the focus line.
///
/// The offset saturates: the topmost displayed row (`focus + offset - half + 1`)
/// stays above zero, then the bottommost row (`focus + offset + half + 1`) stays
/// within `total_lines + 2`, which admits the end-of-file marker row and one
/// filler row after it. When both cannot hold (a window taller than the
/// document) the bottom bound wins.
pub fn vertical_offset(
    delta: i64,
    current: i64,
    focus_line: usize,
    total_lines: usize,
    half_window: usize,
) -> i64 {
    let focus = focus_line as i64;
    let half = half_window as i64;
    let total = total_lines as i64;

    let mut offset = current + delta;

    // focus + offset - half + 1 > 0
    let lowest = half - focus;
    if offset < lowest {
        offset = lowest;
    }

    // focus + offset + half + 1 <= total + 2
    let highest = total + 1 - focus - half;
    if offset > highest {
        offset = highest;
    }

    offset
}
