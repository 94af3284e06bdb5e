// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Scripted terminal device for tests.
//
// Compiled for this crate's own tests and, behind the `testing` feature,
// for downstream crates that drive the event loop without a real TTY.
//
// `FakeTty` answers attribute and geometry queries from fields the test
// sets up, replays a script of reads (bytes, timeouts, errors) and records
// every write. When the read script runs out it reports `UnexpectedEof`, so
// a loop that would otherwise spin forever fails the test instead.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::rc::Rc;

use crate::terminal::{Size, TerminalState, Tty};

/// A typical cooked-mode termios: canonical, echoing, signal keys on,
/// CR→NL translation and output post-processing enabled.
pub fn cooked_state() -> TerminalState {
    let mut t: libc::termios = unsafe { std::mem::zeroed() };
    t.c_iflag = libc::BRKINT | libc::ICRNL | libc::IXON;
    t.c_oflag = libc::OPOST;
    t.c_cflag = libc::CREAD;
    t.c_lflag = libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG;
    t.c_cc[libc::VMIN] = 1;
    t.c_cc[libc::VTIME] = 0;
    TerminalState::from_termios(t)
}

/// One scripted `read()` outcome.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    Byte(u8),
    /// `VTIME` expired with nothing to read.
    Timeout,
    Error(io::ErrorKind),
}

#[allow(clippy::struct_excessive_bools)]
pub struct FakeTty {
    pub attrs: TerminalState,
    pub set_calls: usize,
    pub fail_get: bool,
    pub fail_set: bool,
    /// `None` makes the direct size query fail.
    pub size: Option<Size>,
    pub input: VecDeque<Step>,
    /// Every byte written, in order.
    pub output: Vec<u8>,
    /// Number of `write()` calls.
    pub writes: usize,
    /// What a panic would restore right now.
    pub panic_backup: Rc<Cell<Option<TerminalState>>>,
    log: Rc<RefCell<Vec<TerminalState>>>,
}

impl Default for FakeTty {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeTty {
    #[must_use]
    pub fn new() -> Self {
        Self {
            attrs: cooked_state(),
            set_calls: 0,
            fail_get: false,
            fail_set: false,
            size: Some(Size { cols: 80, rows: 24 }),
            input: VecDeque::new(),
            output: Vec::new(),
            writes: 0,
            panic_backup: Rc::new(Cell::new(None)),
            log: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn with_size(mut self, rows: u16, cols: u16) -> Self {
        self.size = Some(Size { cols, rows });
        self
    }

    pub fn without_size(mut self) -> Self {
        self.size = None;
        self
    }

    pub fn with_input(mut self, bytes: &[u8]) -> Self {
        self.input.extend(bytes.iter().copied().map(Step::Byte));
        self
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.input.push_back(step);
        self
    }

    pub fn failing_get(mut self) -> Self {
        self.fail_get = true;
        self
    }

    pub fn failing_set(mut self) -> Self {
        self.fail_set = true;
        self
    }

    /// Shared log of every attribute set applied, readable after the
    /// device has been moved into a guard and dropped.
    pub fn attrs_log(&self) -> Rc<RefCell<Vec<TerminalState>>> {
        Rc::clone(&self.log)
    }

    pub fn panic_backup_handle(&self) -> Rc<Cell<Option<TerminalState>>> {
        Rc::clone(&self.panic_backup)
    }
}

impl Read for FakeTty {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.input.pop_front() {
            Some(Step::Byte(b)) => {
                buf[0] = b;
                Ok(1)
            }
            Some(Step::Timeout) => Ok(0),
            Some(Step::Error(kind)) => Err(io::Error::from(kind)),
            None => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "read script exhausted")),
        }
    }
}

impl Write for FakeTty {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writes += 1;
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Tty for FakeTty {
    fn get_attrs(&self) -> io::Result<TerminalState> {
        if self.fail_get {
            return Err(io::Error::from_raw_os_error(libc::ENOTTY));
        }
        Ok(self.attrs)
    }

    fn set_attrs(&mut self, state: &TerminalState) -> io::Result<()> {
        if self.fail_set {
            return Err(io::Error::from_raw_os_error(libc::EIO));
        }
        self.set_calls += 1;
        self.attrs = *state;
        self.log.borrow_mut().push(*state);
        Ok(())
    }

    fn window_size(&self) -> io::Result<Size> {
        self.size
            .ok_or_else(|| io::Error::from_raw_os_error(libc::ENOTTY))
    }

    fn set_panic_backup(&self, original: Option<TerminalState>) {
        self.panic_backup.set(original);
    }
}
