use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use colored::Colorize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    /// Menu titles and entries.
    Menu,
    Info,
    Warning,
    Error,
}

/// Line-oriented terminal the selection menus talk to.
pub trait SelectionTerminal {
    fn render_line(&mut self, style: LineStyle, text: &str) -> Result<()>;

    /// Prompts and reads one line. `None` means the input stream is closed.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Colored output to `writer`, line input from `reader`.
pub struct LineSelectionTerminal<R, W> {
    reader: R,
    writer: W,
}

pub type StdioSelectionTerminal = LineSelectionTerminal<io::StdinLock<'static>, io::Stdout>;

impl StdioSelectionTerminal {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> LineSelectionTerminal<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

impl<R: BufRead, W: Write> SelectionTerminal for LineSelectionTerminal<R, W> {
    fn render_line(&mut self, style: LineStyle, text: &str) -> Result<()> {
        let rendered = match style {
            LineStyle::Menu | LineStyle::Info => text.cyan(),
            LineStyle::Warning => text.yellow(),
            LineStyle::Error => text.red(),
        };
        writeln!(self.writer, "{rendered}").context("failed to write selection menu")
    }

    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.writer, "{prompt}: ").context("failed to write selection prompt")?;
        self.writer
            .flush()
            .context("failed to flush selection prompt")?;
        let mut buffer = String::new();
        let read = self
            .reader
            .read_line(&mut buffer)
            .context("failed to read selection response")?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(buffer.trim_end_matches(&['\r', '\n'][..]).to_string()))
    }
}
