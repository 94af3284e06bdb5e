// SPDX-License-Identifier: MIT
//
// Event loop — the heartbeat of the editor.
//
// One thread, one blocking point. Each iteration:
//
//   1. build the whole frame in a fresh `AppendBuffer`
//      (clear screen, cursor home, app paints, cursor home)
//   2. flush it to the terminal in one write, release the buffer
//   3. read one key (retrying through 100 ms read timeouts)
//   4. hand the key to the app, which says continue or quit
//
// On quit the screen is cleared and the loop returns; the caller then
// restores cooked mode. Startup order matters: raw mode first, geometry
// second, because the cursor-position fallback reads the terminal's reply
// from stdin and needs canonical mode and echo switched off.

use crate::TermError;
use crate::ansi;
use crate::geometry;
use crate::input::{self, Key};
use crate::output::AppendBuffer;
use crate::terminal::{RawConfig, RawMode, Size, TerminalState, Tty};

// ─── App Trait ───────────────────────────────────────────────────────────────

/// What the application tells the event loop to do after handling a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Continue running.
    Continue,
    /// Exit the event loop cleanly.
    Quit,
}

/// Application interface for the event loop.
pub trait App {
    /// Handle one key. Return [`Action::Quit`] to exit the event loop.
    fn on_key(&mut self, _key: Key) -> Action {
        Action::Continue
    }

    /// Paint the screen body into `buf`.
    ///
    /// The loop has already cleared the screen and homed the cursor, and
    /// homes it again afterwards.
    fn paint(&mut self, buf: &mut AppendBuffer);
}

/// Build one frame: clear, home, the app's body, home.
pub fn render_frame(app: &mut impl App, buf: &mut AppendBuffer) {
    buf.append(ansi::CLEAR_SCREEN);
    buf.append(ansi::CURSOR_HOME);
    app.paint(buf);
    buf.append(ansi::CURSOR_HOME);
}

// ─── EventLoop ───────────────────────────────────────────────────────────────

/// The terminal event loop.
///
/// Owns the terminal in raw mode and the window size resolved at startup.
/// The size is fixed for the lifetime of the loop.
///
/// # Example
///
/// ```no_run
/// use delta_term::event_loop::{Action, App, EventLoop};
/// use delta_term::input::Key;
/// use delta_term::output::AppendBuffer;
/// use delta_term::terminal::{RawConfig, Stdio};
///
/// struct MyApp;
///
/// impl App for MyApp {
///     fn on_key(&mut self, key: Key) -> Action {
///         if key == Key::QUIT { Action::Quit } else { Action::Continue }
///     }
///
///     fn paint(&mut self, buf: &mut AppendBuffer) {
///         buf.append(b"hello");
///     }
/// }
///
/// let mut event_loop = EventLoop::new(Stdio::new(), &RawConfig::default())?;
/// event_loop.run(&mut MyApp)?;
/// event_loop.leave()?;
/// # Ok::<(), delta_term::TermError>(())
/// ```
pub struct EventLoop<T: Tty> {
    raw: RawMode<T>,
    size: Size,
}

impl<T: Tty> EventLoop<T> {
    /// Enter raw mode, then resolve the window size.
    ///
    /// # Errors
    ///
    /// Returns an error if raw mode cannot be entered or the size cannot
    /// be determined. If raw mode was entered, it has been undone by the
    /// time this returns.
    pub fn new(tty: T, config: &RawConfig) -> Result<Self, TermError> {
        let mut raw = RawMode::enter(tty, config)?;
        let size = geometry::resolve_window_size(raw.tty_mut())?;
        tracing::info!(rows = size.rows, cols = size.cols, "terminal ready");
        Ok(Self { raw, size })
    }

    /// The window size resolved at startup.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// The attributes that [`leave`](Self::leave) will restore.
    #[inline]
    #[must_use]
    pub const fn original_state(&self) -> &TerminalState {
        self.raw.original()
    }

    #[inline]
    #[must_use]
    pub const fn tty(&self) -> &T {
        self.raw.tty()
    }

    #[inline]
    pub const fn tty_mut(&mut self) -> &mut T {
        self.raw.tty_mut()
    }

    /// Paint and read keys until the application returns [`Action::Quit`].
    ///
    /// On quit the screen is cleared and the cursor homed. The terminal
    /// stays in raw mode until [`leave`](Self::leave) or drop.
    ///
    /// # Errors
    ///
    /// Returns [`TermError::Read`] if reading a key fails.
    pub fn run(&mut self, app: &mut impl App) -> Result<(), TermError> {
        loop {
            self.refresh_screen(app);

            let key = input::read_key(self.raw.tty_mut())?;
            tracing::trace!(?key, "key");

            if app.on_key(key) == Action::Quit {
                if let Err(err) = ansi::reset_screen(self.raw.tty_mut()) {
                    tracing::warn!(%err, "could not clear screen on quit");
                }
                tracing::info!("quit");
                return Ok(());
            }
        }
    }

    /// Render one frame and write it in a single flush.
    ///
    /// A failed write is logged and otherwise ignored; the next frame
    /// repaints everything.
    pub fn refresh_screen(&mut self, app: &mut impl App) {
        let mut buf = AppendBuffer::new();
        render_frame(app, &mut buf);
        if let Err(err) = buf.flush_to(self.raw.tty_mut()) {
            tracing::warn!(%err, bytes = buf.len(), "frame write failed");
        }
        buf.release();
    }

    /// Restore the terminal's original attributes.
    ///
    /// # Errors
    ///
    /// Returns [`TermError::RestoreAttributes`] if the terminal rejects them.
    pub fn leave(&mut self) -> Result<(), TermError> {
        self.raw.leave()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
