// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// The handful of VT100 sequences the editor speaks, as byte constants and
// as pure functions that write them to any `impl Write`. No state, no
// decisions about when to emit; the frame loop and geometry fallback decide.
//
// All functions return `io::Result` propagated from the underlying writer.

use std::io::{self, Write};

/// Erase the entire display (ED 2).
pub const CLEAR_SCREEN: &[u8] = b"\x1b[2J";

/// Move the cursor to row 1, column 1 (CUP with no parameters).
pub const CURSOR_HOME: &[u8] = b"\x1b[H";

/// Push the cursor as far right, then as far down, as the terminal allows.
///
/// CUF/CUD stop at the screen edge, so 999 reliably lands bottom-right
/// on any terminal smaller than 999×999.
pub const CURSOR_TO_FAR_CORNER: &[u8] = b"\x1b[999C\x1b[999B";

/// Device Status Report 6: ask the terminal to report the cursor position.
///
/// The terminal answers on stdin with `ESC [ <row> ; <col> R`.
pub const REQUEST_CURSOR_POSITION: &[u8] = b"\x1b[6n";

/// Row marker painted on every screen line.
pub const ROW_MARKER: &[u8] = b"~";

/// Line break between rows. `OPOST` is off in raw mode, so `\n` alone
/// would not return the carriage.
pub const CRLF: &[u8] = b"\r\n";

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Clear the entire screen (ED 2).
#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(CLEAR_SCREEN)
}

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to the top-left corner.
#[inline]
pub fn cursor_home(w: &mut impl Write) -> io::Result<()> {
    w.write_all(CURSOR_HOME)
}

/// Move the cursor to the bottom-right-most reachable cell.
#[inline]
pub fn cursor_to_far_corner(w: &mut impl Write) -> io::Result<()> {
    w.write_all(CURSOR_TO_FAR_CORNER)
}

/// Request a cursor position report (DSR 6).
#[inline]
pub fn request_cursor_position(w: &mut impl Write) -> io::Result<()> {
    w.write_all(REQUEST_CURSOR_POSITION)
}

/// Clear the screen and home the cursor, as one write.
///
/// Used on quit and before a fatal diagnostic.
pub fn reset_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J\x1b[H")?;
    w.flush()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn capture(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> Vec<u8> {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        out
    }

    #[test]
    fn clear_screen_sequence() {
        assert_eq!(capture(|w| clear_screen(w)), b"\x1b[2J");
    }

    #[test]
    fn cursor_home_sequence() {
        assert_eq!(capture(|w| cursor_home(w)), b"\x1b[H");
    }

    #[test]
    fn far_corner_moves_right_then_down() {
        let out = capture(|w| cursor_to_far_corner(w));
        assert_eq!(out, b"\x1b[999C\x1b[999B");
        assert_eq!(out.len(), 12);
    }

    #[test]
    fn request_cursor_position_sequence() {
        assert_eq!(capture(|w| request_cursor_position(w)), b"\x1b[6n");
    }

    #[test]
    fn reset_screen_is_clear_then_home() {
        let out = capture(|w| reset_screen(w));
        assert_eq!(out, [CLEAR_SCREEN, CURSOR_HOME].concat());
    }

    #[test]
    fn crlf_is_carriage_return_then_line_feed() {
        assert_eq!(CRLF, b"\r\n");
    }
}
