// SPDX-License-Identifier: MIT
//
// Terminal control — raw mode, device access, and RAII cleanup.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), and raw fd reads/writes. These are the
// standard POSIX interfaces for terminal control and have no safe
// alternative. Each unsafe block is minimal.
#![allow(unsafe_code)]
//
// Raw mode changes state that outlives this process: the terminal device
// is shared with the shell that launched us. Leaving it raw means a shell
// with no echo and no line editing. So the original attributes are owned
// by a guard, `RawMode`, which restores them on every path out: explicit
// `leave()`, early return, `?` propagation, or panic unwinding. A panic
// hook additionally restores before the panic message is printed, so the
// message lands on a cooked terminal.
//
// Every device operation goes through the `Tty` trait. `Stdio` is the real
// terminal; tests substitute a scripted fake.

use std::io::{self, Read, Write};
use std::os::unix::io::RawFd;
use std::sync::{Mutex, Once};
use std::time::Duration;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of columns (width in character cells).
    pub cols: u16,
    /// Number of rows (height in character cells).
    pub rows: u16,
}

impl Size {
    /// Whether either dimension is zero.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.cols == 0 || self.rows == 0
    }
}

// ─── TerminalState ──────────────────────────────────────────────────────────

/// A snapshot of the terminal's line discipline settings.
///
/// Wraps `termios`: input/output/control/local flags, control characters,
/// and line speeds. Equality compares every field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalState(libc::termios);

impl TerminalState {
    /// Wrap a raw `termios` value.
    #[must_use]
    pub const fn from_termios(termios: libc::termios) -> Self {
        Self(termios)
    }

    /// The wrapped `termios` value.
    #[must_use]
    pub const fn as_termios(&self) -> &libc::termios {
        &self.0
    }

    /// Derive the raw-mode attributes from this (original) state.
    ///
    /// - input: no break-as-SIGINT, no CR→NL, no parity check, no 8th-bit
    ///   strip, no XON/XOFF flow control
    /// - output: no post-processing
    /// - control: 8-bit characters
    /// - local: no echo, no canonical mode, no extended input, no signal keys
    /// - `VMIN`/`VTIME` from `config`
    #[must_use]
    pub fn to_raw(self, config: &RawConfig) -> Self {
        let mut raw = self.0;
        raw.c_iflag &= !(libc::BRKINT | libc::ICRNL | libc::INPCK | libc::ISTRIP | libc::IXON);
        raw.c_oflag &= !libc::OPOST;
        raw.c_cflag |= libc::CS8;
        raw.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG);
        raw.c_cc[libc::VMIN] = config.min_bytes;
        raw.c_cc[libc::VTIME] = config.timeout_deciseconds();
        Self(raw)
    }
}

// ─── RawConfig ──────────────────────────────────────────────────────────────

/// Read timing applied while in raw mode.
///
/// The defaults make `read()` return after at most 100 ms even when no
/// byte arrived, so a key read never blocks forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawConfig {
    /// How long a `read()` waits for input (`VTIME`, 0.1 s granularity).
    pub read_timeout: Duration,
    /// Minimum bytes a `read()` waits for (`VMIN`).
    pub min_bytes: u8,
}

impl RawConfig {
    /// `read_timeout` in deciseconds, rounded up and clamped to `VTIME`'s range.
    ///
    /// A zero timeout stays zero (pure polling).
    #[must_use]
    pub fn timeout_deciseconds(&self) -> u8 {
        let ms = self.read_timeout.as_millis();
        if ms == 0 {
            return 0;
        }
        u8::try_from(ms.div_ceil(100)).unwrap_or(u8::MAX)
    }
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(100),
            min_bytes: 0,
        }
    }
}

// ─── Tty ────────────────────────────────────────────────────────────────────

/// A terminal device: a byte stream plus its line discipline and geometry.
pub trait Tty: Read + Write {
    /// Read the current attributes.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the device is not a terminal.
    fn get_attrs(&self) -> io::Result<TerminalState>;

    /// Apply `state`, after flushing any output not yet transmitted and
    /// discarding unread input.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the attributes cannot be applied.
    fn set_attrs(&mut self, state: &TerminalState) -> io::Result<()>;

    /// Ask the device directly for its window size.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the query is unsupported.
    fn window_size(&self) -> io::Result<Size>;

    /// Record (`Some`) or forget (`None`) the attributes a panic should
    /// restore. Only the process's own terminal needs this.
    fn set_panic_backup(&self, _original: Option<TerminalState>) {}
}

// ─── Stdio ──────────────────────────────────────────────────────────────────

/// The process's controlling terminal, as standard input and output.
///
/// Attributes are read and applied on stdin; geometry is queried on
/// stdout; bytes are read from fd 0 and written to fd 1 without any
/// userspace buffering, so a timed-out `read()` surfaces as `Ok(0)`.
#[derive(Debug, Clone, Copy)]
pub struct Stdio {
    input: RawFd,
    output: RawFd,
}

impl Stdio {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            input: libc::STDIN_FILENO,
            output: libc::STDOUT_FILENO,
        }
    }
}

impl Default for Stdio {
    fn default() -> Self {
        Self::new()
    }
}

impl Read for Stdio {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = unsafe { libc::read(self.input, buf.as_mut_ptr().cast::<libc::c_void>(), buf.len()) };
        usize::try_from(n).map_err(|_| io::Error::last_os_error())
    }
}

impl Write for Stdio {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = unsafe { libc::write(self.output, buf.as_ptr().cast::<libc::c_void>(), buf.len()) };
        usize::try_from(n).map_err(|_| io::Error::last_os_error())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Unbuffered: every write() already reached the device.
        Ok(())
    }
}

impl Tty for Stdio {
    fn get_attrs(&self) -> io::Result<TerminalState> {
        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(self.input, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(TerminalState(termios))
        }
    }

    fn set_attrs(&mut self, state: &TerminalState) -> io::Result<()> {
        if unsafe { libc::tcsetattr(self.input, libc::TCSAFLUSH, &raw const state.0) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn window_size(&self) -> io::Result<Size> {
        let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
        if unsafe { libc::ioctl(self.output, libc::TIOCGWINSZ, &raw mut ws) } == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    }

    fn set_panic_backup(&self, original: Option<TerminalState>) {
        if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
            *guard = original;
        }
    }
}

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Global backup of the original attributes for panic recovery.
///
/// The [`RawMode`] guard owns its own copy, but the panic hook runs before
/// unwinding reaches the guard. This backup lets the hook restore cooked
/// mode first so the panic message is readable. Filled by [`Stdio`] while
/// a guard is active, empty otherwise.
static TERMIOS_BACKUP: Mutex<Option<TerminalState>> = Mutex::new(None);

/// Panic hook guard — ensures the hook is installed at most once per process.
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that restores the backed-up attributes on stdin,
/// then delegates to the previous hook.
///
/// Install it before entering raw mode so a panic at any point while raw
/// prints its message on a cooked terminal. Idempotent.
pub fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore_termios_from_backup();
            previous(info);
        }));
    });
}

/// Restore termios from the global backup. Best-effort, ignores errors.
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = *guard {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, &raw const original.0);
            }
        }
    }
}

// ─── RawMode ────────────────────────────────────────────────────────────────

/// A terminal held in raw mode.
///
/// [`enter`](Self::enter) captures the current attributes and applies the
/// raw ones. The captured state is reapplied by [`leave`](Self::leave), or
/// by `Drop` if `leave` was never reached.
///
/// # Example
///
/// ```no_run
/// use delta_term::terminal::{RawConfig, RawMode, Stdio};
///
/// let mut raw = RawMode::enter(Stdio::new(), &RawConfig::default())?;
/// // ... read keys, paint frames through raw.tty_mut() ...
/// raw.leave()?;
/// # Ok::<(), delta_term::TermError>(())
/// ```
pub struct RawMode<T: Tty> {
    tty: T,
    /// Attributes captured before entering raw mode. Never mutated.
    original: TerminalState,
    /// Whether raw attributes are currently applied.
    active: bool,
}

impl<T: Tty> RawMode<T> {
    /// Capture the terminal's attributes and switch it to raw mode.
    ///
    /// # Errors
    ///
    /// [`TermError::GetAttributes`] if the attributes cannot be read,
    /// [`TermError::SetAttributes`] if the raw ones cannot be applied. In
    /// both cases the terminal is left as it was.
    pub fn enter(mut tty: T, config: &RawConfig) -> Result<Self, crate::TermError> {
        let original = tty.get_attrs().map_err(crate::TermError::GetAttributes)?;
        let raw = original.to_raw(config);
        tty.set_panic_backup(Some(original));
        if let Err(err) = tty.set_attrs(&raw) {
            tty.set_panic_backup(None);
            return Err(crate::TermError::SetAttributes(err));
        }

        tracing::debug!(
            vmin = config.min_bytes,
            vtime = config.timeout_deciseconds(),
            "entered raw mode"
        );

        Ok(Self {
            tty,
            original,
            active: true,
        })
    }

    /// The attributes that will be restored.
    #[inline]
    #[must_use]
    pub const fn original(&self) -> &TerminalState {
        &self.original
    }

    /// Whether raw attributes are currently applied.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    #[must_use]
    pub const fn tty(&self) -> &T {
        &self.tty
    }

    #[inline]
    pub const fn tty_mut(&mut self) -> &mut T {
        &mut self.tty
    }

    /// Reapply the original attributes.
    ///
    /// Idempotent: only the first successful call touches the terminal.
    ///
    /// # Errors
    ///
    /// [`TermError::RestoreAttributes`] if the terminal rejects the
    /// original attributes. The guard stays active so `Drop` tries again.
    pub fn leave(&mut self) -> Result<(), crate::TermError> {
        if !self.active {
            return Ok(());
        }
        self.tty
            .set_attrs(&self.original)
            .map_err(crate::TermError::RestoreAttributes)?;
        self.tty.set_panic_backup(None);
        self.active = false;
        tracing::debug!("left raw mode");
        Ok(())
    }
}

impl<T: Tty> Drop for RawMode<T> {
    fn drop(&mut self) {
        if let Err(err) = self.leave() {
            tracing::error!(%err, "could not restore terminal attributes");
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
