use ratatui::layout::Rect;

use mindtick::exercise::path::{AREA_HEIGHT, AREA_WIDTH};

/// Horizontal bar of `width` cells filled to `percent`.
pub fn bar(percent: u8, width: u16) -> String {
    let width = width as usize;
    let filled = (percent.min(100) as usize * width + 50) / 100;
    let mut s = "█".repeat(filled);
    s.push_str(&"░".repeat(width - filled));
    s
}

/// Maps a play-area coordinate onto a terminal cell inside `canvas`.
pub fn area_to_cell(canvas: Rect, x: i64, y: i64) -> (u16, u16) {
    let w = canvas.width.max(1) as i64;
    let h = canvas.height.max(1) as i64;
    let col = (x * w / AREA_WIDTH).clamp(0, w - 1);
    let row = (y * h / AREA_HEIGHT).clamp(0, h - 1);
    (canvas.x + col as u16, canvas.y + row as u16)
}

/// Inverse of [`area_to_cell`], taking the centre of the clicked cell.
/// `None` when the click falls outside `canvas`.
pub fn cell_to_area(canvas: Rect, col: u16, row: u16) -> Option<(i64, i64)> {
    if canvas.width == 0
        || canvas.height == 0
        || col < canvas.x
        || row < canvas.y
        || col >= canvas.x + canvas.width
        || row >= canvas.y + canvas.height
    {
        return None;
    }
    let dx = (col - canvas.x) as i64 * 2 + 1;
    let dy = (row - canvas.y) as i64 * 2 + 1;
    Some((
        dx * AREA_WIDTH / (canvas.width as i64 * 2),
        dy * AREA_HEIGHT / (canvas.height as i64 * 2),
    ))
}
