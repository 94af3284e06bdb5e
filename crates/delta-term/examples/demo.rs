// SPDX-License-Identifier: MIT
//
// delta-term demo — a key viewer that exercises the whole pipeline.
//
// Raw mode → window size → frame built in an AppendBuffer → one write →
// one key read → repeat. Each key press shows its byte value, so you can
// see what the terminal really sends (arrow keys arrive as three bytes,
// Ctrl-letters as 0x01–0x1a). Ctrl-Q to quit.
//
// Usage:
//   cargo run -p delta-term --example demo

use std::collections::VecDeque;
use std::process::ExitCode;

use delta_term::ansi;
use delta_term::event_loop::{Action, App, EventLoop};
use delta_term::input::Key;
use delta_term::output::AppendBuffer;
use delta_term::terminal::{RawConfig, Size, Stdio};

/// The demo application state.
struct Demo {
    size: Size,
    /// Most recent keys, newest last.
    keys: VecDeque<Key>,
}

impl Demo {
    fn new(size: Size) -> Self {
        Self {
            size,
            keys: VecDeque::new(),
        }
    }

    fn log_rows(&self) -> usize {
        usize::from(self.size.rows).saturating_sub(2)
    }
}

impl App for Demo {
    fn on_key(&mut self, key: Key) -> Action {
        if key == Key::QUIT {
            return Action::Quit;
        }
        self.keys.push_back(key);
        while self.keys.len() > self.log_rows() {
            self.keys.pop_front();
        }
        Action::Continue
    }

    fn paint(&mut self, buf: &mut AppendBuffer) {
        let header = format!(
            "delta-term demo: {}x{}, Ctrl-Q quits",
            self.size.cols, self.size.rows
        );
        buf.append(header.as_bytes());
        buf.append(ansi::CRLF);
        buf.append(ansi::CRLF);

        for (i, key) in self.keys.iter().enumerate() {
            let line = format!("{:3}  {:#04x}  {:?}", key.0, key.0, key);
            buf.append(line.as_bytes());
            if i + 1 < self.keys.len() {
                buf.append(ansi::CRLF);
            }
        }
    }
}

fn main() -> ExitCode {
    let mut event_loop = match EventLoop::new(Stdio::new(), &RawConfig::default()) {
        Ok(ev) => ev,
        Err(err) => {
            eprintln!("demo: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut demo = Demo::new(event_loop.size());
    let result = event_loop.run(&mut demo).and(event_loop.leave());

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("demo: {err}");
            ExitCode::FAILURE
        }
    }
}
