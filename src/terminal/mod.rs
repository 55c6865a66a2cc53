//! Console output
//!
//! The interpreter and the remote session engine write through the
//! [`Console`] trait. [`StdConsole`] draws on the real terminal with ANSI
//! cursor addressing; [`BufferConsole`] records everything for inspection.

pub mod ansi;

pub use ansi::strip_control_sequences;

use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};

/// Line-oriented console with fixed-row drawing
///
/// Implementations are shared between the interpreter thread and transport
/// reader threads.
pub trait Console: Send + Sync {
    /// Write text followed by a newline
    fn write_line(&self, text: &str);

    /// Write text without a newline
    fn write(&self, text: &str);

    /// Overwrite a whole row (1-based)
    fn write_at(&self, row: u16, text: &str);

    /// Clear the screen and home the cursor
    fn clear(&self);

    /// Display width in columns
    fn width(&self) -> usize;
}

/// Console backed by the process's stdout
pub struct StdConsole {
    width: usize,
}

impl StdConsole {
    pub fn new(width: usize) -> Self {
        Self { width }
    }

    fn emit(&self, text: &str) {
        let mut stdout = io::stdout().lock();
        if let Err(e) = stdout.write_all(text.as_bytes()).and_then(|_| stdout.flush()) {
            debug!("Console write failed: {}", e);
        }
    }
}

impl Console for StdConsole {
    fn write_line(&self, text: &str) {
        self.emit(&format!("{}\n", text));
    }

    fn write(&self, text: &str) {
        self.emit(text);
    }

    fn write_at(&self, row: u16, text: &str) {
        // Move to column 1 of the row, then erase the rest of the line
        self.emit(&format!("\x1b[{};1H{}\x1b[K", row.max(1), text));
    }

    fn clear(&self) {
        self.emit("\x1b[2J\x1b[H");
    }

    fn width(&self) -> usize {
        self.width
    }
}

/// One recorded console operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEntry {
    Line(String),
    Text(String),
    Row { row: u16, text: String },
    Clear,
}

/// Console that records output in memory
pub struct BufferConsole {
    entries: Mutex<Vec<ConsoleEntry>>,
    width: usize,
}

impl BufferConsole {
    pub fn new(width: usize) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            width,
        }
    }

    fn guard(&self) -> MutexGuard<'_, Vec<ConsoleEntry>> {
        // A panicking writer leaves the log readable
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Every recorded operation, in order
    pub fn entries(&self) -> Vec<ConsoleEntry> {
        self.guard().clone()
    }

    /// Text of `Line` entries
    pub fn lines(&self) -> Vec<String> {
        self.guard()
            .iter()
            .filter_map(|e| match e {
                ConsoleEntry::Line(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Text of `Row` entries for one row
    pub fn rows(&self, row: u16) -> Vec<String> {
        self.guard()
            .iter()
            .filter_map(|e| match e {
                ConsoleEntry::Row { row: r, text } if *r == row => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Whether any written text contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.guard().iter().any(|e| match e {
            ConsoleEntry::Line(text) | ConsoleEntry::Text(text) => text.contains(needle),
            ConsoleEntry::Row { text, .. } => text.contains(needle),
            ConsoleEntry::Clear => false,
        })
    }

    /// Drain the log
    pub fn take(&self) -> Vec<ConsoleEntry> {
        std::mem::take(&mut *self.guard())
    }
}

impl Default for BufferConsole {
    fn default() -> Self {
        Self::new(80)
    }
}

impl Console for BufferConsole {
    fn write_line(&self, text: &str) {
        self.guard().push(ConsoleEntry::Line(text.to_string()));
    }

    fn write(&self, text: &str) {
        self.guard().push(ConsoleEntry::Text(text.to_string()));
    }

    fn write_at(&self, row: u16, text: &str) {
        self.guard().push(ConsoleEntry::Row {
            row,
            text: text.to_string(),
        });
    }

    fn clear(&self) {
        self.guard().push(ConsoleEntry::Clear);
    }

    fn width(&self) -> usize {
        self.width
    }
}

/// Pad or cut `text` to exactly `width` characters
pub fn fit_to_width(text: &str, width: usize) -> String {
    let mut fitted: String = text.chars().take(width).collect();
    let len = fitted.chars().count();
    fitted.extend(std::iter::repeat(' ').take(width - len));
    fitted
}
