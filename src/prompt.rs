//! # Credential Prompter
//!
//! Sequential, line-oriented gathering of credential fields on a TTY.
//!
//! ## Flow
//!
//! [`TtyPrompter::get`] walks an ordered list of [`Field`]s. For each
//! field, in order:
//!
//! 1. An override for the field's key wins outright — no prompt.
//! 2. Otherwise a prompt line is printed, showing the label and the
//!    default value (if any) in parentheses.
//! 3. Sensitive fields are read masked (raw mode, `*` echo); plain
//!    fields are read as a trimmed line.
//! 4. An empty entry falls back to the field's default.
//!
//! Any read failure aborts the remaining fields and surfaces the error
//! immediately — there is no partial success.
//!
//! Input is abstracted behind [`PromptInput`] so tests (or embedders
//! without a TTY) can script entries; [`TtyInput`] is the interactive
//! implementation.

use std::collections::HashMap;
use std::io::{self, BufRead, Write};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;

/// One credential field to gather.
#[derive(Debug, Clone)]
pub struct Field {
    /// Key the answer is stored under.
    pub key: String,
    /// Human-readable label shown in the prompt.
    pub display: String,
    /// Default value, substituted when the entry is empty. Empty
    /// string means no default.
    pub value: String,
    /// Masked entry instead of echoed.
    pub sensitive: bool,
}

impl Field {
    pub fn new(key: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            display: display.into(),
            value: String::new(),
            sensitive: false,
        }
    }

    /// Set the default value.
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Mark the field for masked entry.
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }
}

/// Source of interactive entries.
pub trait PromptInput {
    /// Read one plain line, trimmed of surrounding whitespace.
    fn read_line(&mut self) -> io::Result<String>;
    /// Read one secret line without echoing it.
    fn read_secret(&mut self) -> io::Result<String>;
}

/// Interactive [`PromptInput`]: plain lines from stdin, secrets via a
/// raw-mode key loop that echoes `*` per character.
pub struct TtyInput;

impl PromptInput for TtyInput {
    fn read_line(&mut self) -> io::Result<String> {
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stdin closed while reading a prompt entry",
            ));
        }
        Ok(line.trim().to_string())
    }

    fn read_secret(&mut self) -> io::Result<String> {
        read_masked(&mut io::stdout())
    }
}

/// Restores cooked mode when dropped, so an error inside the masked
/// read loop cannot leave the terminal raw.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Read a secret from the keyboard, echoing `*` per character.
///
/// Enter finishes the entry, Backspace erases, Ctrl+C aborts with an
/// `Interrupted` error. Non-key events are ignored.
fn read_masked(out: &mut impl Write) -> io::Result<String> {
    let _guard = RawModeGuard::enable()?;
    let mut secret = String::new();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Enter => break,
            KeyCode::Backspace => {
                if secret.pop().is_some() {
                    write!(out, "\x08 \x08")?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Err(io::Error::new(
                    io::ErrorKind::Interrupted,
                    "masked entry interrupted",
                ));
            }
            KeyCode::Char(c) => {
                secret.push(c);
                write!(out, "*")?;
                out.flush()?;
            }
            _ => {}
        }
    }
    // Raw mode swallowed the Enter echo.
    writeln!(out, "\r")?;
    out.flush()?;
    Ok(secret)
}

/// Gathers answers for an ordered list of fields.
pub trait Prompter {
    /// Gather an answer for every field, in order. A read failure
    /// aborts the remaining fields.
    fn get(&self, fields: &[Field]) -> io::Result<HashMap<String, String>>;
    /// One-line error notification on the diagnostic stream.
    fn error(&self, display: &str);
    /// One-line success notification on the diagnostic stream.
    fn success(&self);
}

/// The interactive prompter: prompts on stdout, reads via
/// [`TtyInput`], notifies on stderr.
pub struct TtyPrompter {
    prefix: String,
    overrides: HashMap<String, String>,
}

impl TtyPrompter {
    /// `prefix` tags every line this prompter emits; `overrides`
    /// answer fields by key without prompting.
    pub fn new(prefix: impl Into<String>, overrides: HashMap<String, String>) -> Self {
        Self {
            prefix: prefix.into(),
            overrides,
        }
    }

    /// [`Prompter::get`] over an explicit input source and prompt
    /// sink. This is the whole gathering logic; [`Prompter::get`]
    /// merely plugs in the TTY.
    pub fn get_with(
        &self,
        input: &mut impl PromptInput,
        out: &mut impl Write,
        fields: &[Field],
    ) -> io::Result<HashMap<String, String>> {
        let mut values = HashMap::new();
        for field in fields {
            if let Some(value) = self.overrides.get(&field.key) {
                values.insert(field.key.clone(), value.clone());
                continue;
            }
            if field.value.is_empty() {
                write!(out, "[{}] {}: ", self.prefix, field.display)?;
            } else {
                write!(out, "[{}] {} ({}): ", self.prefix, field.display, field.value)?;
            }
            out.flush()?;
            let entered = if field.sensitive {
                input.read_secret()?
            } else {
                match input.read_line() {
                    Ok(line) => line,
                    Err(err) => {
                        self.error(&err.to_string());
                        return Err(err);
                    }
                }
            };
            let entered = if entered.is_empty() {
                field.value.clone()
            } else {
                entered
            };
            values.insert(field.key.clone(), entered);
        }
        Ok(values)
    }
}

impl Prompter for TtyPrompter {
    fn get(&self, fields: &[Field]) -> io::Result<HashMap<String, String>> {
        self.get_with(&mut TtyInput, &mut io::stdout(), fields)
    }

    fn error(&self, display: &str) {
        eprintln!("[{}] Error: {}", self.prefix, display);
    }

    fn success(&self) {
        eprintln!("[{}] Success.", self.prefix);
    }
}
