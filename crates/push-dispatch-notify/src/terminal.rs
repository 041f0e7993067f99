//! Blocking terminal notifier.

use std::io::{self, Write};

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    style::{Print, PrintStyledContent, Stylize},
    terminal,
};

use crate::{Notifier, NotifyError};

/// Prints the notification and waits for a key press.
#[derive(Debug, Clone)]
pub struct TerminalNotifier {
    title: String,
}

impl Default for TerminalNotifier {
    fn default() -> Self {
        Self::new("Message from server")
    }
}

impl TerminalNotifier {
    /// Create a notifier with a heading line.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    fn render(&self, out: &mut impl Write, text: &str) -> io::Result<()> {
        execute!(
            out,
            Print("\n"),
            PrintStyledContent(format!("== {} ==", self.title).bold()),
            Print("\n"),
            Print(text),
            Print("\n"),
            PrintStyledContent("Press any key to continue".dim()),
            Print("\n"),
        )
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, text: &str) -> Result<(), NotifyError> {
        self.render(&mut io::stdout().lock(), text)?;
        let _raw = RawModeGuard::enable()?;
        wait_for_key()?;
        Ok(())
    }
}

fn wait_for_key() -> io::Result<()> {
    loop {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                return Ok(());
            }
        }
    }
}

/// Restores cooked mode when dropped.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            tracing::warn!("Failed to restore terminal mode: {e}");
        }
    }
}
