//! Terminal rendering for markdown output.
//!
//! Rich mode styles the markdown with termimad; plain mode prints it
//! unchanged, which keeps output stable for pipes and tests.

use std::io::{self, Write};

use anyhow::{Context, Result};
use termimad::{crossterm::style::Color, MadSkin};

const HEADER_STYLE: &str = "\x1b[1;34m";
const RESET: &str = "\x1b[0m";

/// Renders markdown to stdout, styled or plain.
pub struct TerminalRenderer {
    rich_enabled: bool,
    skin: MadSkin,
}

impl TerminalRenderer {
    pub fn new(rich_enabled: bool) -> Self {
        let mut skin = MadSkin::default();
        skin.set_headers_fg(Color::Blue);
        skin.bold.set_fg(Color::Yellow);
        skin.italic.set_fg(Color::Magenta);
        skin.inline_code.set_bg(Color::AnsiValue(238));

        Self { rich_enabled, skin }
    }

    /// Formats markdown for the terminal.
    ///
    /// Header lines keep their `#` markers so the structure stays visible
    /// in both modes.
    pub fn format(&self, markdown: &str) -> String {
        if !self.rich_enabled {
            return markdown.to_string();
        }
        let mut output = String::with_capacity(markdown.len());
        for line in markdown.lines() {
            if line.starts_with('#') {
                output.push_str(HEADER_STYLE);
                output.push_str(line);
                output.push_str(RESET);
            } else {
                output.push_str(&self.skin.inline(line).to_string());
            }
            output.push('\n');
        }
        output
    }

    pub fn render(&self, markdown: &str) -> Result<()> {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(self.format(markdown).as_bytes())
            .and_then(|()| stdout.flush())
            .context("Failed to write to stdout")
    }

    /// Prints the chat prompt without a trailing newline.
    pub fn prompt(&self, label: &str) -> Result<()> {
        let mut stdout = io::stdout().lock();
        let styled = if self.rich_enabled {
            format!("{HEADER_STYLE}{label}>{RESET} ")
        } else {
            format!("{label}> ")
        };
        stdout
            .write_all(styled.as_bytes())
            .and_then(|()| stdout.flush())
            .context("Failed to write to stdout")
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_output_is_unchanged() {
        let renderer = TerminalRenderer::new(false);
        let markdown = "# Active Loops\n\n- **Status**: active\n";
        assert_eq!(renderer.format(markdown), markdown);
    }

    #[test]
    fn test_rich_output_styles_headers() {
        let renderer = TerminalRenderer::new(true);
        let output = renderer.format("# Read a book\nplain line");
        assert!(output.starts_with(HEADER_STYLE));
        assert!(output.contains("# Read a book"));
        assert!(output.contains("plain line"));
    }

    #[test]
    fn test_default_is_rich() {
        let renderer = TerminalRenderer::default();
        assert!(renderer.rich_enabled);
    }
}
