// SPDX-License-Identifier: MIT
//
// Window geometry — how many rows and columns the editor may paint.
//
// The direct route is `ioctl(TIOCGWINSZ)`. It fails, or reports zero
// columns, on some pseudo-terminals and serial consoles, so there is a
// second route that only needs a VT100-compatible terminal:
//
//   1. push the cursor to the bottom-right corner (`ESC[999C ESC[999B`,
//      which the terminal clamps at its edges)
//   2. ask where the cursor is (`ESC[6n`)
//   3. read the reply `ESC [ <rows> ; <cols> R`
//
// The cursor's coordinates at the far corner are the window size. The
// reply arrives on stdin, so the terminal must already be in raw mode or
// the line discipline would hold it (and echo it) until Enter.

use std::io::{self, Read, Write};

use crate::ansi;
use crate::error::GeometryError;
use crate::terminal::{Size, Tty};

/// Longest cursor position report we accept, excluding the `R`.
///
/// `ESC[65535;65535` is 13 bytes, so 31 leaves ample slack for terminals
/// that pad their replies.
const REPORT_CAPACITY: usize = 31;

/// Determine the window size, falling back to the cursor-position report when the
/// direct query fails or reports an empty window.
///
/// # Errors
///
/// Returns a [`GeometryError`] if the fallback is needed and cannot produce
/// a valid size.
pub fn resolve_window_size<T: Tty>(tty: &mut T) -> Result<Size, GeometryError> {
    match tty.window_size() {
        Ok(size) if !size.is_empty() => {
            tracing::debug!(rows = size.rows, cols = size.cols, "window size from ioctl");
            return Ok(size);
        }
        Ok(size) => {
            tracing::debug!(rows = size.rows, cols = size.cols, "ioctl reported an empty window");
        }
        Err(err) => tracing::debug!(%err, "ioctl window size query failed"),
    }

    ansi::cursor_to_far_corner(tty).map_err(GeometryError::CursorWrite)?;
    let size = cursor_position(tty)?;
    tracing::debug!(rows = size.rows, cols = size.cols, "window size from cursor position");
    Ok(size)
}

/// Ask the terminal where the cursor is and parse the answer.
///
/// # Errors
///
/// Returns a [`GeometryError`] if the request cannot be written, the
/// reply cannot be read, or the reply is malformed.
pub fn cursor_position<T: Read + Write>(tty: &mut T) -> Result<Size, GeometryError> {
    ansi::request_cursor_position(tty).map_err(GeometryError::CursorWrite)?;
    tty.flush().map_err(GeometryError::CursorWrite)?;

    let report = read_report(tty)?;
    parse_cursor_report(&report)
}

/// Collect the reply byte by byte until `R`, a timed-out read, or the
/// buffer is full. The `R` itself is not kept.
fn read_report(r: &mut impl Read) -> Result<Vec<u8>, GeometryError> {
    let mut report = Vec::with_capacity(REPORT_CAPACITY);
    let mut byte = [0u8; 1];

    while report.len() < REPORT_CAPACITY {
        match r.read(&mut byte) {
            Ok(1) if byte[0] == b'R' => break,
            Ok(1) => report.push(byte[0]),
            Ok(_) => break,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => break,
            Err(err) => return Err(GeometryError::CursorRead(err)),
        }
    }

    Ok(report)
}

/// Parse a cursor position report body: `ESC [ <rows> ; <cols>`.
///
/// Both numbers must be plain decimal and non-zero.
///
/// # Errors
///
/// [`GeometryError::MissingPrefix`] if the report does not start with
/// `ESC [`, [`GeometryError::Malformed`] if the body is not two
/// semicolon-separated numbers, [`GeometryError::ZeroSize`] if either is 0.
pub fn parse_cursor_report(report: &[u8]) -> Result<Size, GeometryError> {
    let body = report
        .strip_prefix(b"\x1b[")
        .ok_or(GeometryError::MissingPrefix)?;
    let malformed = || GeometryError::Malformed(String::from_utf8_lossy(body).into_owned());

    let text = std::str::from_utf8(body).map_err(|_| malformed())?;
    let (rows, cols) = text.split_once(';').ok_or_else(malformed)?;
    let rows = parse_decimal(rows).ok_or_else(malformed)?;
    let cols = parse_decimal(cols).ok_or_else(malformed)?;

    let size = Size { cols, rows };
    if size.is_empty() {
        return Err(GeometryError::ZeroSize);
    }
    Ok(size)
}

/// Digits only: no sign, no whitespace, at least one digit.
fn parse_decimal(s: &str) -> Option<u16> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

// ─── Tests ───────────────────────────────────────────────────────────────────
