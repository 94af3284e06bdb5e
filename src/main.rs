// SPDX-License-Identifier: MIT
//
// delta — a minimalist terminal text editor.
//
// This is the binary that wires the editor onto delta-term:
//
//   delta-term → raw mode, window size, key reads, batched frame output
//   Editor     → what a frame looks like and what a key does
//
// The Editor implements delta-term's App trait. Each iteration of the
// event loop paints one `~` per screen row and reads one key; Ctrl-Q
// quits. There is no text buffer yet.
//
// Failure handling lives in exactly one place, `exit_code`: by the time an
// error from the terminal layer reaches it, cooked mode is already back.
// It clears the screen, prints `delta: <operation>: <os error>` and exits
// with status 1.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use delta_term::TermError;
use delta_term::ansi;
use delta_term::event_loop::{Action, App, EventLoop};
use delta_term::input::Key;
use delta_term::output::AppendBuffer;
use delta_term::terminal::{self, RawConfig, Size, Stdio, Tty};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (e.g. `debug`).
const LOG_ENV: &str = "DELTA_LOG";

// ─── EditorConfig ───────────────────────────────────────────────────────────

/// Screen geometry the editor paints into, fixed at startup.
///
/// The terminal's original attributes are not kept here. The `RawMode`
/// guard inside the event loop owns them and puts them back on every exit
/// path, so the editor never touches terminal state directly. `cols` is
/// the width future row drawing clips to; today only `rows` shapes a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EditorConfig {
    rows: u16,
    cols: u16,
}

impl From<Size> for EditorConfig {
    fn from(size: Size) -> Self {
        Self {
            rows: size.rows,
            cols: size.cols,
        }
    }
}

// ─── Editor ─────────────────────────────────────────────────────────────────

/// The editor application state.
struct Editor {
    config: EditorConfig,
}

impl Editor {
    fn new(config: EditorConfig) -> Self {
        tracing::debug!(rows = config.rows, cols = config.cols, "editor ready");
        Self { config }
    }

    /// One marker per row, `\r\n` between rows but not after the last, so
    /// the bottom line never scrolls the screen.
    fn draw_rows(&self, buf: &mut AppendBuffer) {
        let rows = self.config.rows;
        for y in 0..rows {
            buf.append(ansi::ROW_MARKER);
            if y + 1 < rows {
                buf.append(ansi::CRLF);
            }
        }
    }
}

impl App for Editor {
    fn on_key(&mut self, key: Key) -> Action {
        if key == Key::QUIT {
            Action::Quit
        } else {
            Action::Continue
        }
    }

    fn paint(&mut self, buf: &mut AppendBuffer) {
        self.draw_rows(buf);
    }
}

// ─── Logging ────────────────────────────────────────────────────────────────

/// Where log lines go. Never the terminal: stdout is the screen.
fn log_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .map_or_else(|| PathBuf::from("delta.log"), |home| home.join(".delta").join("delta.log"))
}

/// Install a file-backed subscriber if `DELTA_LOG` is set.
///
/// Logging is optional; any problem setting it up leaves it off.
fn init_logging() {
    let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) else {
        return;
    };

    let path = log_path();
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

// ─── Main ───────────────────────────────────────────────────────────────────

/// Run the editor on `tty` until quit or a fatal error.
///
/// On return the terminal is in its original mode, whether the loop ended
/// in a quit, a failed key read or a failed startup.
fn run<T: Tty>(tty: T) -> Result<(), TermError> {
    let mut event_loop = EventLoop::new(tty, &RawConfig::default())?;

    let mut editor = Editor::new(event_loop.size().into());
    let result = event_loop.run(&mut editor);

    let restored = event_loop.leave();
    result.and(restored)
}

/// Clear the screen on `out`, print the diagnostic on `diag`, exit 1.
fn report_fatal(err: &TermError, out: &mut impl Write, diag: &mut impl Write) -> ExitCode {
    tracing::error!(%err, "fatal");
    if let Err(write_err) = ansi::reset_screen(out) {
        tracing::warn!(%write_err, "could not clear screen");
    }
    let _ = writeln!(diag, "delta: {err}");
    ExitCode::FAILURE
}

/// Map the outcome of [`run`] to the process exit status.
fn exit_code(
    result: Result<(), TermError>,
    out: &mut impl Write,
    diag: &mut impl Write,
) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report_fatal(&err, out, diag),
    }
}

fn main() -> ExitCode {
    init_logging();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "delta starting");
    terminal::install_panic_hook();

    exit_code(run(Stdio::new()), &mut io::stdout(), &mut io::stderr())
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use delta_term::terminal::TerminalState;
    use delta_term::testing::{FakeTty, Step, cooked_state};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Captures output and fails the test if anything is written while
    /// the terminal is still raw.
    struct AfterRestore {
        log: Rc<RefCell<Vec<TerminalState>>>,
        bytes: Vec<u8>,
    }

    impl AfterRestore {
        fn new(tty: &FakeTty) -> Self {
            Self {
                log: tty.attrs_log(),
                bytes: Vec::new(),
            }
        }
    }

    impl Write for AfterRestore {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            assert_eq!(
                self.log.borrow().last(),
                Some(&cooked_state()),
                "wrote {buf:?} before cooked mode was restored"
            );
            self.bytes.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn editor(rows: u16, cols: u16) -> Editor {
        Editor::new(EditorConfig { rows, cols })
    }

    fn painted(e: &mut Editor) -> Vec<u8> {
        let mut buf = AppendBuffer::new();
        e.paint(&mut buf);
        buf.as_bytes().to_vec()
    }

    #[test]
    fn config_from_size() {
        let config = EditorConfig::from(Size { cols: 120, rows: 40 });
        assert_eq!(config, EditorConfig { rows: 40, cols: 120 });
    }

    #[test]
    fn paints_one_marker_per_row() {
        assert_eq!(painted(&mut editor(3, 80)), b"~\r\n~\r\n~");
    }

    #[test]
    fn no_trailing_line_break() {
        let out = painted(&mut editor(24, 80));
        assert!(!out.ends_with(b"\r\n"));
        assert_eq!(out.iter().filter(|&&b| b == b'~').count(), 24);
        assert_eq!(out.windows(2).filter(|w| *w == b"\r\n").count(), 23);
    }

    #[test]
    fn zero_rows_paints_nothing() {
        assert!(painted(&mut editor(0, 80)).is_empty());
    }

    #[test]
    fn full_frame_for_three_rows() {
        let mut buf = AppendBuffer::new();
        delta_term::event_loop::render_frame(&mut editor(3, 80), &mut buf);
        assert_eq!(buf.as_bytes(), b"\x1b[2J\x1b[H~\r\n~\r\n~\x1b[H");
    }

    #[test]
    fn ctrl_q_quits() {
        assert_eq!(editor(24, 80).on_key(Key::ctrl(b'q')), Action::Quit);
    }

    #[test]
    fn other_keys_continue() {
        let mut e = editor(24, 80);
        for b in [b'q', b'Q', 0x1b, b'a', 0x03, 0x1a] {
            assert_eq!(e.on_key(Key(b)), Action::Continue, "{:?}", Key(b));
        }
    }

    #[test]
    fn log_path_is_a_log_file() {
        assert_eq!(log_path().file_name().unwrap(), "delta.log");
    }

    // ── Exit paths ─────────────────────────────────────────────────────────

    #[test]
    fn quit_exits_zero_with_terminal_restored() {
        let tty = FakeTty::new().with_size(3, 10).with_input(&[Key::QUIT.0]);
        let log = tty.attrs_log();
        let mut out = Vec::new();
        let mut diag = Vec::new();

        let code = exit_code(run(tty), &mut out, &mut diag);

        assert_eq!(code, ExitCode::SUCCESS);
        assert_eq!(log.borrow().len(), 2);
        assert_eq!(log.borrow().last(), Some(&cooked_state()));
        assert!(out.is_empty());
        assert!(diag.is_empty());
    }

    #[test]
    fn read_error_exits_one_after_restore() {
        let tty = FakeTty::new()
            .with_size(3, 10)
            .with_step(Step::Error(io::ErrorKind::BrokenPipe));
        let mut out = AfterRestore::new(&tty);
        let mut diag = AfterRestore::new(&tty);

        let code = exit_code(run(tty), &mut out, &mut diag);

        assert_eq!(code, ExitCode::FAILURE);
        assert_eq!(out.bytes, b"\x1b[2J\x1b[H");
        let msg = String::from_utf8(diag.bytes).unwrap();
        assert!(msg.starts_with("delta: read: "), "{msg}");
        assert!(msg.ends_with('\n'));
    }

    #[test]
    fn malformed_window_size_exits_one_after_restore() {
        let tty = FakeTty::new()
            .without_size()
            .with_input(b"garbage")
            .with_step(Step::Timeout);
        let log = tty.attrs_log();
        let mut out = AfterRestore::new(&tty);
        let mut diag = AfterRestore::new(&tty);

        let code = exit_code(run(tty), &mut out, &mut diag);

        assert_eq!(code, ExitCode::FAILURE);
        assert_eq!(log.borrow().len(), 2);
        assert_eq!(out.bytes, b"\x1b[2J\x1b[H");
        let msg = String::from_utf8(diag.bytes).unwrap();
        assert!(msg.starts_with("delta: getWindowSize: "), "{msg}");
    }

    #[test]
    fn raw_mode_refused_exits_one() {
        let tty = FakeTty::new().failing_get();
        let mut out = Vec::new();
        let mut diag = Vec::new();

        let code = exit_code(run(tty), &mut out, &mut diag);

        assert_eq!(code, ExitCode::FAILURE);
        assert_eq!(out, b"\x1b[2J\x1b[H");
        assert!(String::from_utf8(diag).unwrap().starts_with("delta: tcgetattr: "));
    }
}
