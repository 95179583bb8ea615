//! # ANSI Cursor Primitives
//!
//! Raw CSI escape-sequence emitters used by the dispatcher. Only the
//! three controls the console needs are implemented:
//!
//! | Sequence      | Effect                          |
//! |---------------|---------------------------------|
//! | `\r ESC [2K`  | Clear the current line          |
//! | `ESC [{n}A`   | Move the cursor up `n` lines    |
//! | `ESC [{n}B`   | Move the cursor down `n` lines  |
//!
//! An ANSI-compatible output stream is assumed; no capability
//! negotiation is attempted.

use std::io::{self, Write};

/// The CSI introducer.
const CSI: &str = "\x1b[";

/// Clear the line the cursor is on and return the cursor to column 0.
pub fn clear_line(out: &mut impl Write) -> io::Result<()> {
    write!(out, "\r{CSI}2K")
}

/// Move the cursor up `n` lines. A zero move emits nothing.
pub fn cursor_up(out: &mut impl Write, n: usize) -> io::Result<()> {
    if n == 0 {
        return Ok(());
    }
    write!(out, "{CSI}{n}A")
}

/// Move the cursor down `n` lines. A zero move emits nothing.
pub fn cursor_down(out: &mut impl Write, n: usize) -> io::Result<()> {
    if n == 0 {
        return Ok(());
    }
    write!(out, "{CSI}{n}B")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_line_bytes() {
        let mut buf = Vec::new();
        clear_line(&mut buf).expect("write to vec");
        assert_eq!(buf, b"\r\x1b[2K");
    }

    #[test]
    fn test_cursor_moves() {
        let mut buf = Vec::new();
        cursor_up(&mut buf, 3).expect("write to vec");
        cursor_down(&mut buf, 12).expect("write to vec");
        assert_eq!(buf, b"\x1b[3A\x1b[12B");
    }

    #[test]
    fn test_zero_move_is_silent() {
        let mut buf = Vec::new();
        cursor_up(&mut buf, 0).expect("write to vec");
        cursor_down(&mut buf, 0).expect("write to vec");
        assert!(buf.is_empty());
    }
}
