// SPDX-License-Identifier: MIT
//
// Key input.
//
// In raw mode with VMIN=0/VTIME=1, `read()` returns after 100 ms whether
// or not a key arrived. A zero-byte read is therefore "nothing yet", not
// end of input, and the reader simply asks again. Bytes are returned as
// they come: no escape-sequence decoding, so an arrow key arrives as three
// separate keys.

use std::fmt;
use std::io::{self, Read};

use crate::TermError;

/// One byte of keyboard input.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key(pub u8);

impl Key {
    /// Ctrl-Q.
    pub const QUIT: Self = Self::ctrl(b'q');

    /// The byte a terminal sends for Ctrl + `ch`: the low five bits of `ch`.
    ///
    /// Works for letters in either case: `ctrl(b'q') == ctrl(b'Q') == 0x11`.
    #[inline]
    #[must_use]
    pub const fn ctrl(ch: u8) -> Self {
        Self(ch & 0x1f)
    }

    /// Whether this is a C0 control byte (0x00–0x1f) or DEL.
    #[inline]
    #[must_use]
    pub const fn is_control(self) -> bool {
        self.0 < 0x20 || self.0 == 0x7f
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            b @ 0x01..=0x1a => write!(f, "Key(^{})", char::from(b + b'@')),
            b if self.is_control() => write!(f, "Key({b:#04x})"),
            b => write!(f, "Key({:?})", char::from(b)),
        }
    }
}

/// Block until exactly one byte is read.
///
/// Zero-byte reads (timeouts), `EAGAIN` and `EINTR` are retried.
///
/// # Errors
///
/// [`TermError::Read`] for any other read failure.
pub fn read_key(r: &mut impl Read) -> Result<Key, TermError> {
    let mut byte = [0u8; 1];
    loop {
        match r.read(&mut byte) {
            Ok(1) => return Ok(Key(byte[0])),
            Ok(_) => tracing::trace!("read timed out, retrying"),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                tracing::trace!(%err, "read interrupted, retrying");
            }
            Err(err) => return Err(TermError::Read(err)),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
