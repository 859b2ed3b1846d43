//! Cleanup of raw shell output before it is handed to callers.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;

/// CSI sequences (colours, cursor movement, private modes such as bracketed
/// paste) and OSC sequences (window titles) terminated by BEL or ST.
fn escape_regex() -> &'static Regex {
    static ESCAPES: OnceLock<Regex> = OnceLock::new();
    ESCAPES.get_or_init(|| {
        Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)")
            .expect("escape pattern is valid")
    })
}

/// Remove terminal escape sequences, leaving the visible text untouched
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    escape_regex().replace_all(text, "")
}

/// Turn the bytes captured between a command and the next prompt into the
/// text a caller sees.
///
/// A leading echo of `command` is dropped, every line is trimmed, escape
/// sequences are removed and the block is trimmed as a whole.
pub fn sanitize_output(raw: &str, command: &str) -> String {
    let mut lines: Vec<&str> = raw.split('\n').collect();
    if lines
        .first()
        .is_some_and(|first| first.trim() == command.trim())
    {
        lines.remove(0);
    }

    let joined = lines
        .iter()
        .map(|line| line.trim())
        .collect::<Vec<_>>()
        .join("\n");

    strip_ansi(&joined).trim().to_string()
}
