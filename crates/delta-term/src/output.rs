// SPDX-License-Identifier: MIT
//
// Output batching.
//
// A frame is a few hundred escape codes and row markers. Writing each one
// separately means hundreds of syscalls and a terminal that may repaint
// halfway through. `AppendBuffer` collects the whole frame in memory so it
// reaches the terminal in a single write.
//
// Growth is best-effort: if the allocator refuses, the fragment is dropped
// and the buffer keeps what it already had. A frame missing a few bytes is
// repaired by the next one; an editor that aborts on a transient
// allocation failure loses the user's session.

use std::collections::TryReserveError;
use std::io::{self, Write};

// ─── AppendBuffer ────────────────────────────────────────────────────────────

/// A growable byte buffer holding one frame of terminal output.
///
/// Created empty at the start of a frame, flushed once, then
/// [`release`](Self::release)d. It is never carried across frames.
#[derive(Debug, Default)]
pub struct AppendBuffer {
    buf: Vec<u8>,
}

impl AppendBuffer {
    /// Create an empty buffer. No storage is allocated until the first append.
    #[must_use]
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Number of bytes accumulated.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The accumulated bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append `bytes` to the end of the buffer.
    ///
    /// If the buffer cannot grow, the fragment is dropped and the existing
    /// contents are left untouched.
    pub fn append(&mut self, bytes: &[u8]) {
        if let Err(err) = self.try_append(bytes) {
            tracing::warn!(dropped = bytes.len(), held = self.buf.len(), %err, "append dropped");
        }
    }

    /// Append `bytes`, reporting a failed growth instead of swallowing it.
    ///
    /// # Errors
    ///
    /// Returns the allocator's error if the buffer cannot hold `len + bytes.len()`
    /// bytes. The buffer is unchanged in that case.
    pub fn try_append(&mut self, bytes: &[u8]) -> Result<(), TryReserveError> {
        self.buf.try_reserve(bytes.len())?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Write the whole frame to `w` and flush it.
    ///
    /// The buffer keeps its contents; call [`release`](Self::release) when
    /// the frame is done.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails.
    pub fn flush_to(&self, w: &mut impl Write) -> io::Result<()> {
        if !self.buf.is_empty() {
            w.write_all(&self.buf)?;
            w.flush()?;
        }
        Ok(())
    }

    /// Release the buffer's storage. The buffer is consumed.
    pub fn release(self) {
        drop(self.buf);
    }
}

impl Write for AppendBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.try_append(buf)
            .map_err(|err| io::Error::new(io::ErrorKind::OutOfMemory, err))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Intentionally a no-op. Real flushing goes through flush_to().
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn new_is_empty() {
        let buf = AppendBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.as_bytes(), b"");
    }

    #[test]
    fn append_concatenates_in_call_order() {
        let mut buf = AppendBuffer::new();
        buf.append(b"\x1b[2J");
        buf.append(b"\x1b[H");
        buf.append(b"~");
        assert_eq!(buf.as_bytes(), b"\x1b[2J\x1b[H~");
        assert_eq!(buf.len(), 8);
    }

    #[test]
    fn append_empty_slice_is_noop() {
        let mut buf = AppendBuffer::new();
        buf.append(b"abc");
        buf.append(b"");
        assert_eq!(buf.as_bytes(), b"abc");
    }

    #[test]
    fn growth_preserves_earlier_bytes() {
        let mut buf = AppendBuffer::new();
        let chunk = [b'x'; 1000];
        buf.append(b"head");
        for _ in 0..64 {
            buf.append(&chunk);
        }
        assert!(buf.as_bytes().starts_with(b"headxxx"));
        assert_eq!(buf.len(), 4 + 64 * 1000);
    }

    #[test]
    fn write_trait_appends() {
        let mut buf = AppendBuffer::new();
        write!(buf, "\x1b[{}C", 999).unwrap();
        assert_eq!(buf.as_bytes(), b"\x1b[999C");
    }

    // No slice is long enough to make the allocator refuse, so only the
    // success path of `try_append` is reachable from a test.
    #[test]
    fn try_append_appends_and_reports_ok() {
        let mut buf = AppendBuffer::new();
        buf.append(b"~");
        assert!(buf.try_append(b"\r\n~").is_ok());
        assert!(buf.try_append(b"").is_ok());
        assert_eq!(buf.as_bytes(), b"~\r\n~");
    }

    #[test]
    fn flush_to_writes_everything_once() {
        let mut buf = AppendBuffer::new();
        buf.append(b"frame ");
        buf.append(b"data");
        let mut dest = Vec::new();
        buf.flush_to(&mut dest).unwrap();
        assert_eq!(dest, b"frame data");
        // Flushing does not consume the frame.
        assert_eq!(buf.len(), 10);
    }

    #[test]
    fn flush_to_empty_writes_nothing() {
        let buf = AppendBuffer::new();
        let mut dest = Vec::new();
        buf.flush_to(&mut dest).unwrap();
        assert!(dest.is_empty());
    }

    #[test]
    fn release_consumes_the_buffer() {
        let mut buf = AppendBuffer::new();
        buf.append(b"gone");
        buf.release();
        // `buf` is moved; a fresh buffer is required for the next frame.
        let next = AppendBuffer::new();
        assert!(next.is_empty());
    }

    proptest! {
        #[test]
        fn prop_content_is_concatenation(chunks in proptest::collection::vec(
            proptest::collection::vec(any::<u8>(), 0..64), 0..32)
        ) {
            let mut buf = AppendBuffer::new();
            for chunk in &chunks {
                buf.append(chunk);
            }
            let expected: Vec<u8> = chunks.concat();
            prop_assert_eq!(buf.as_bytes(), expected.as_slice());
            prop_assert_eq!(buf.len(), chunks.iter().map(Vec::len).sum::<usize>());
        }
    }
}
