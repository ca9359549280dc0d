//! Timestamped operator output.
//!
//! Progress and results are printed as `[YYYY-MM-DD HH:MM:SS] message`
//! lines on stdout; fatal lines go to stderr.

use chrono::Local;
use std::io::Write;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn stamp(message: &str) -> String {
    format!("[{}] {}", Local::now().format(TIMESTAMP_FORMAT), message)
}

pub fn info(message: impl AsRef<str>) {
    println!("{}", stamp(message.as_ref()));
}

/// Same as [`info`] without the trailing newline, so progress dots can follow.
pub fn info_inline(message: impl AsRef<str>) {
    let mut stdout = std::io::stdout().lock();
    let _ = write!(stdout, "{}", stamp(message.as_ref()));
    let _ = stdout.flush();
}

pub fn tick() {
    let mut stdout = std::io::stdout().lock();
    let _ = write!(stdout, ".");
    let _ = stdout.flush();
}

/// Terminates a line of progress dots.
pub fn end_line() {
    println!(" ");
}

pub fn fatal(message: impl AsRef<str>) {
    eprintln!("{}", stamp(message.as_ref()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamp_layout() {
        let line = stamp("Update Complete!");
        assert!(line.starts_with('['));
        assert!(line.ends_with("] Update Complete!"));
        // [2024-01-31 12:00:00]
        assert_eq!(line.find(']'), Some(20));
    }
}
