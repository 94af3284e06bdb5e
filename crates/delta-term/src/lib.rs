// SPDX-License-Identifier: MIT
//
// delta-term — terminal control for the delta editor.
//
// Everything the editor needs from the controlling terminal lives here:
// raw mode with guaranteed restoration, window geometry (ioctl first,
// cursor-position report as fallback), single-byte key reads on a timed
// read, and an append buffer that lets a whole frame reach the terminal
// in one write.
//
// All device access goes through the `Tty` trait so that every piece can
// be driven by a scripted fake in tests. The only real implementation,
// `Stdio`, talks to file descriptors 0 and 1 through termios and raw
// `read`/`write` calls.

#[cfg(not(unix))]
compile_error!("delta-term requires a POSIX terminal (termios)");

pub mod ansi;
pub mod error;
pub mod event_loop;
pub mod geometry;
pub mod input;
pub mod output;
pub mod terminal;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{GeometryError, TermError};
