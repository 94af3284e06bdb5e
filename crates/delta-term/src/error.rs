// SPDX-License-Identifier: MIT
//
// Error types for terminal control.
//
// Every fallible boundary (attribute get/set, geometry, key read) returns
// one of these. Nothing in this crate terminates the process: the binary
// has a single top-level handler that clears the screen, restores cooked
// mode and prints the `Display` form, which names the failing operation
// followed by the OS error.

use std::io;

use thiserror::Error;

/// A failure the editor cannot recover from.
#[derive(Debug, Error)]
pub enum TermError {
    /// Reading the terminal's current attributes failed.
    #[error("tcgetattr: {0}")]
    GetAttributes(#[source] io::Error),

    /// Applying raw-mode attributes failed.
    #[error("tcsetattr: {0}")]
    SetAttributes(#[source] io::Error),

    /// Reapplying the original attributes failed.
    #[error("tcsetattr (restore): {0}")]
    RestoreAttributes(#[source] io::Error),

    /// Neither the direct query nor the cursor-position report produced a size.
    #[error("getWindowSize: {0}")]
    WindowSize(#[source] GeometryError),

    /// Reading a key failed for a reason other than a timeout.
    #[error("read: {0}")]
    Read(#[source] io::Error),
}

/// Why the cursor-position fallback could not determine the window size.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("cursor position request failed: {0}")]
    CursorWrite(#[source] io::Error),

    #[error("cursor position report read failed: {0}")]
    CursorRead(#[source] io::Error),

    /// The report did not start with `ESC [`.
    #[error("cursor position report does not start with ESC [")]
    MissingPrefix,

    /// The report body was not `<rows>;<cols>`.
    #[error("malformed cursor position report {0:?}")]
    Malformed(String),

    #[error("terminal reported a zero-sized window")]
    ZeroSize,
}

impl From<GeometryError> for TermError {
    fn from(err: GeometryError) -> Self {
        Self::WindowSize(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_operation() {
        let err = TermError::GetAttributes(io::Error::from_raw_os_error(libc::ENOTTY));
        let msg = err.to_string();
        assert!(msg.starts_with("tcgetattr: "), "{msg}");
    }

    #[test]
    fn read_error_display() {
        let err = TermError::Read(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
        assert_eq!(err.to_string(), "read: gone");
    }

    #[test]
    fn geometry_error_wraps_into_window_size() {
        let err: TermError = GeometryError::MissingPrefix.into();
        assert!(matches!(err, TermError::WindowSize(GeometryError::MissingPrefix)));
        assert_eq!(
            err.to_string(),
            "getWindowSize: cursor position report does not start with ESC ["
        );
    }

    #[test]
    fn malformed_report_is_debug_quoted() {
        let err = GeometryError::Malformed("24;x".into());
        assert_eq!(err.to_string(), "malformed cursor position report \"24;x\"");
    }
}
