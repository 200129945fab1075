// src/system/prompt.rs

use dialoguer::{Input, theme::ColorfulTheme};
use std::io::{BufRead, ErrorKind, IsTerminal, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PromptError {
    #[error("User Interface Error: {0}")]
    Dialoguer(#[from] dialoguer::Error),
    #[error("Failed to read from standard input: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of menu selections, one line per call.
pub trait Prompter {
    /// Shows `prompt` and reads one line. `Ok(None)` means input is exhausted.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, PromptError>;
}

/// Reads selections from the controlling terminal, falling back to plain line
/// reads when standard input is piped.
#[derive(Debug)]
pub struct TerminalPrompter {
    interactive: bool,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        let interactive = std::io::stdin().is_terminal() && std::io::stdout().is_terminal();
        log::debug!("Prompting with {} input.", if interactive { "terminal" } else { "plain" });
        Self { interactive }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, PromptError> {
        if self.interactive {
            let result = Input::<String>::with_theme(&ColorfulTheme::default())
                .with_prompt(prompt)
                .allow_empty(true)
                .interact_text();
            return match result {
                Ok(line) => Ok(Some(line)),
                // Ctrl+C at the prompt ends the session like `exit`.
                Err(dialoguer::Error::IO(e))
                    if matches!(e.kind(), ErrorKind::UnexpectedEof | ErrorKind::Interrupted) =>
                {
                    Ok(None)
                }
                Err(e) => Err(e.into()),
            };
        }

        let mut stdout = std::io::stdout();
        write!(stdout, "{} ", prompt)?;
        stdout.flush()?;
        read_plain_line(&mut std::io::stdin().lock())
    }
}

/// Reads one line, stripping the trailing newline. Returns `None` at end of input.
pub fn read_plain_line(reader: &mut impl BufRead) -> Result<Option<String>, PromptError> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let trimmed_len = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed_len);
    Ok(Some(line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_plain_line_strips_newlines() {
        let mut input = Cursor::new("analyst\r\n 3 \n");
        assert_eq!(read_plain_line(&mut input).unwrap().as_deref(), Some("analyst"));
        assert_eq!(read_plain_line(&mut input).unwrap().as_deref(), Some(" 3 "));
        assert_eq!(read_plain_line(&mut input).unwrap(), None);
    }

    #[test]
    fn test_last_line_without_newline() {
        let mut input = Cursor::new("exit");
        assert_eq!(read_plain_line(&mut input).unwrap().as_deref(), Some("exit"));
    }
}
