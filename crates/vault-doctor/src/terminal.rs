//! Terminal-backed capabilities: the interactive unseal prompt and the
//! terminal width used for column layout.

use std::io::{self, BufRead, IsTerminal, Write};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;

use crate::report::Palette;
use crate::unseal::{is_affirmative, UnsealNotice, UnsealPrompt};

pub const DEFAULT_TERM_WIDTH: usize = 80;

/// Width to lay out against: a positive `COLUMNS` value wins, then the
/// probed size of stdout, then [`DEFAULT_TERM_WIDTH`].
pub fn term_width() -> usize {
    let columns = std::env::var("COLUMNS").ok();
    let probed = terminal::size().ok().map(|(cols, _)| cols);
    resolve_width(columns.as_deref(), probed)
}

fn resolve_width(columns: Option<&str>, probed: Option<u16>) -> usize {
    columns
        .and_then(|c| c.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
        .or_else(|| probed.map(usize::from).filter(|&n| n > 0))
        .unwrap_or(DEFAULT_TERM_WIDTH)
}

/// [`UnsealPrompt`] reading from stdin and writing to stdout.
pub struct TerminalPrompt {
    palette: Palette,
}

impl TerminalPrompt {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }
}

impl UnsealPrompt for TerminalPrompt {
    fn confirm(&mut self) -> io::Result<bool> {
        let mut stdout = io::stdout();
        writeln!(stdout)?;
        write!(
            stdout,
            "{} Do you want to unseal now? [y/N]: ",
            self.palette.yellow("Node is sealed.")
        )?;
        stdout.flush()?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(is_affirmative(&answer))
    }

    fn next_key(&mut self) -> io::Result<Option<String>> {
        let mut stdout = io::stdout();
        write!(stdout, "Enter unseal key (blank to stop): ")?;
        stdout.flush()?;

        let key = if io::stdin().is_terminal() { read_hidden()? } else { read_piped()? };
        writeln!(stdout)?;
        Ok(key)
    }

    fn notify(&mut self, notice: &UnsealNotice) {
        let text = notice.to_string();
        let line = match notice {
            UnsealNotice::Partial => self.palette.yellow(&text),
            UnsealNotice::Unsealed => self.palette.green(&text),
            UnsealNotice::Failed(_) => self.palette.red(&text),
        };
        println!("{}", line);
    }
}

/// Read one line from a non-interactive stdin. `None` at end of input.
fn read_piped() -> io::Result<Option<String>> {
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line)? {
        0 => Ok(None),
        _ => Ok(Some(line.trim_end_matches(['\r', '\n']).to_string())),
    }
}

/// Read one line in raw mode without echoing it.
fn read_hidden() -> io::Result<Option<String>> {
    terminal::enable_raw_mode()?;
    let result = read_keys();
    terminal::disable_raw_mode()?;
    result
}

fn read_keys() -> io::Result<Option<String>> {
    let mut buf = String::new();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter => return Ok(Some(buf)),
            KeyCode::Char('c') if ctrl => {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "interrupted"));
            }
            KeyCode::Char('d') if ctrl => {
                return Ok(if buf.is_empty() { None } else { Some(buf) });
            }
            KeyCode::Backspace => {
                buf.pop();
            }
            KeyCode::Char(c) => buf.push(c),
            _ => {}
        }
    }
}
