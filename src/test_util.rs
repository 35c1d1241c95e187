#![forbid(unsafe_code)]

//! Buffer inspection helpers shared by the unit tests.

use ratatui::buffer::Buffer;

/// Render the buffer as newline-joined rows of cell symbols.
pub(crate) fn buffer_text(buf: &Buffer) -> String {
    let mut out = String::new();
    for y in buf.area.top()..buf.area.bottom() {
        if y > buf.area.top() {
            out.push('\n');
        }
        for x in buf.area.left()..buf.area.right() {
            if let Some(cell) = buf.cell((x, y)) {
                out.push_str(cell.symbol());
            }
        }
    }
    out
}

/// Whether every cell in the buffer still holds the empty symbol.
pub(crate) fn buffer_is_blank(buf: &Buffer) -> bool {
    buffer_text(buf)
        .chars()
        .all(|c| c == ' ' || c == '\n')
}
