//! Escaping and unescaping of keys, values and whole entries.
//!
//! Three independent concerns live here:
//!
//! 1. **Structural escaping**: keys must escape separators, whitespace and
//!    comment characters; values only need newlines and backslashes escaped.
//! 2. **Unicode representation**: `\uXXXX` escape sequences versus real
//!    characters. This is charset-dependent and decided at write time, which
//!    is why [`escape_unicode`] and [`unescape_unicode`] exist separately
//!    from the structural functions.
//! 3. **Continuation mechanics**: a logical line may span physical lines via
//!    a trailing backslash; [`unescape`] resolves those joins (dropping the
//!    line break and the continuation line's leading whitespace).
//!
//! Malformed `\uXXXX` sequences never fail: they are reported through
//! `tracing` and kept as literal text, matching the permissive nature of the
//! format.

use tracing::warn;

/// Translate the 4 hex digits of a `\uXXXX` escape sequence into the actual
/// character. Returns `None` if any digit is not a hex digit or the value is
/// not a valid scalar (e.g. a lone surrogate).
fn translate_unicode(digits: &[char]) -> Option<char> {
    debug_assert_eq!(digits.len(), 4);

    let mut value: u32 = 0;
    for &d in digits {
        value = (value << 4) | u32::from(d.to_digit(16)?);
    }
    char::from_u32(value)
}

/// Unescape a key or value read from a properties file.
///
/// The following conversions are done:
/// - `\uXXXX` unicode escape sequences are replaced by the actual character
/// - `\\` is reduced to a single backslash
/// - the literal escapes `\n` and `\r` become real control characters
/// - a backslash before any other character is dropped (the character stays)
/// - a backslash as the last character is dropped
/// - real line breaks (continuation joins) are removed entirely
/// - whitespace at the start of each physical line is removed
///
/// Invalid unicode escape sequences are left unmodified and reported via
/// `tracing`; this function never fails.
pub fn unescape(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut non_whitespace_found = false;

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];

        if c == '\\' {
            // a backslash as the very last character is dropped
            if i + 1 == chars.len() {
                i += 1;
                continue;
            }

            match chars[i + 1] {
                '\\' => {
                    out.push('\\');
                    i += 2;
                }
                'u' => {
                    if i + 5 < chars.len() {
                        if let Some(ch) = translate_unicode(&chars[i + 2..i + 6]) {
                            out.push(ch);
                            i += 6;
                            continue;
                        }
                        let seq: String = chars[i..i + 6].iter().collect();
                        warn!("invalid unicode escape sequence {seq:?}, keeping it as is");
                    } else {
                        let seq: String = chars[i..].iter().collect();
                        warn!("truncated unicode escape sequence {seq:?}, keeping it as is");
                    }
                    // keep the backslash; the following characters are
                    // processed as ordinary content
                    out.push('\\');
                    i += 1;
                }
                'n' => {
                    out.push('\n');
                    i += 2;
                }
                'r' => {
                    out.push('\r');
                    i += 2;
                }
                _ => {
                    // the backslash is dropped, the escaped character is
                    // processed in the next round (and may still count as
                    // leading whitespace)
                    i += 1;
                }
            }
        } else if c == '\n' {
            // a real line break is a continuation join and leaves no trace
            non_whitespace_found = false;
            i += 1;
        } else if c == '\r' {
            if i + 1 < chars.len() && chars[i + 1] == '\n' {
                i += 1;
            }
            non_whitespace_found = false;
            i += 1;
        } else if !non_whitespace_found && (c == ' ' || c == '\t' || c == '\x0c') {
            // whitespace at the beginning of a physical line is skipped
            i += 1;
        } else {
            non_whitespace_found = true;
            out.push(c);
            i += 1;
        }
    }

    out
}

/// Replace all `\uXXXX` escape sequences with their actual character, leaving
/// every other backslash sequence untouched.
///
/// This is the write-side counterpart of [`unescape`]: entries keep their
/// escaped form on disk, and only the unicode representation changes when the
/// target charset can carry the characters directly.
pub fn unescape_unicode(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];

        if c == '\\' && i + 1 < chars.len() && chars[i + 1] == 'u' {
            if i + 5 < chars.len() {
                if let Some(ch) = translate_unicode(&chars[i + 2..i + 6]) {
                    out.push(ch);
                    i += 6;
                    continue;
                }
                let seq: String = chars[i..i + 6].iter().collect();
                warn!("invalid unicode escape sequence {seq:?}, keeping it as is");
            } else {
                let seq: String = chars[i..].iter().collect();
                warn!("truncated unicode escape sequence {seq:?}, keeping it as is");
            }
        }

        out.push(c);
        i += 1;
    }

    out
}

/// Escape a string for use as a property key.
///
/// Whitespace, the separator characters `=` and `:`, the comment characters
/// `#` and `!`, line breaks and backslashes are prefixed with a backslash.
/// A CRLF pair is escaped as one unit so the LF half is not escaped again.
pub fn escape_key(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];

        if matches!(
            c,
            ' ' | '\t' | '\x0c' | '=' | ':' | '\n' | '\r' | '#' | '!' | '\\'
        ) {
            out.push('\\');
        }
        out.push(c);

        if c == '\r' && i + 1 < chars.len() && chars[i + 1] == '\n' {
            out.push('\n');
            i += 1;
        }

        i += 1;
    }

    out
}

/// Escape a string for use as a property value.
///
/// Only line breaks and backslashes need escaping in values; whitespace and
/// separator characters are unambiguous there and pass through unchanged.
pub fn escape_value(s: &str) -> String {
    let mut out = String::with_capacity(s.len());

    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }

    out
}

/// Replace every character above `0x7f` with a `\uXXXX` escape sequence.
///
/// Code points above `0xffff` use the longer, un-padded hex form. Characters
/// within the ASCII range pass through unchanged.
pub fn escape_unicode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());

    for c in s.chars() {
        let codepoint = u32::from(c);
        if codepoint <= 0x7f {
            out.push(c);
        } else if codepoint > 0xffff {
            out.push_str(&format!("\\u{codepoint:x}"));
        } else {
            out.push_str(&format!("\\u{codepoint:04x}"));
        }
    }

    out
}

/// Comment out a piece of text by prefixing it with `#`.
///
/// Entries can span multiple physical lines, so every line after an embedded
/// line break is prefixed as well (CRLF counts as one break). No `#` is added
/// after a trailing line break with nothing behind it.
pub fn comment_out(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 2);
    out.push('#');

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        out.push(c);

        if c == '\n' || c == '\r' {
            if c == '\r' && i + 1 < chars.len() && chars[i + 1] == '\n' {
                out.push('\n');
                i += 1;
            }
            if i + 1 < chars.len() {
                out.push('#');
            }
        }

        i += 1;
    }

    out
}
