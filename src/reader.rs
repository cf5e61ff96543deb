//! Reading documents: the logical-line reader and the entry parser.
//!
//! Reading happens in two stages. [`LogicalLines`] reconstructs *logical
//! lines* from a character stream; a logical line is everything belonging to
//! one entry, possibly spanning several physical lines via backslash
//! continuation, with the trailing line ending kept. [`parse_entry`] then
//! splits one logical line into an [`Entry`], preserving the original escaped
//! text of every part.
//!
//! Parsing is total: there is no invalid syntax in this format, only
//! degenerate splits, so any character sequence produces some document.

use std::fs::File;
use std::io::Read;
use std::iter::Peekable;
use std::path::Path;

use anyhow::Context;

use crate::charset::Charset;
use crate::entry::{BasicEntry, Entry, PropertyEntry};

/// Reads logical lines from a character stream.
pub struct LogicalLines<I: Iterator<Item = char>> {
    chars: Peekable<I>,
}

impl<I: Iterator<Item = char>> LogicalLines<I> {
    /// Create a reader over the given character stream.
    pub fn new(chars: I) -> Self {
        Self {
            chars: chars.peekable(),
        }
    }

    /// Read the next logical line, including its trailing line ending.
    ///
    /// A line ending is consumed as `\n`, `\r` or `\r\n`. An ending is part
    /// of the line (continuation) only when it is escaped, i.e. preceded by
    /// an odd number of backslashes, and the line is not a comment or blank
    /// line: those always end at the first line terminator. A lone backslash
    /// at the end of input is consumed without effect.
    ///
    /// Returns `None` when the input is exhausted.
    pub fn read_logical_line(&mut self) -> Option<String> {
        self.chars.peek()?;

        let mut line = String::new();
        let mut escaped = false;
        let mut is_comment = false;
        let mut is_blank = true;

        while let Some(c) = self.chars.next() {
            line.push(c);

            // the first non-whitespace character decides the classification
            if is_blank && (c == '#' || c == '!') {
                is_comment = true;
                is_blank = false;
            }
            if is_blank && !matches!(c, ' ' | '\t' | '\x0c') && !escaped {
                // a backslash directly before a line break keeps the line blank
                let next = self.chars.peek().copied();
                if c != '\\' || matches!(next, Some(n) if n != '\n' && n != '\r') {
                    is_blank = false;
                }
            }

            if c == '\n' && (!escaped || is_comment || is_blank) {
                break;
            }
            if c == '\r' && (!escaped || is_comment || is_blank) {
                if self.chars.peek() == Some(&'\n') {
                    line.push('\n');
                    self.chars.next();
                }
                break;
            }

            if c == '\r' && escaped {
                // an escaped CR followed by LF: the escape covers the whole
                // CRLF pair, so the LF continues the line as well
                if self.chars.peek() != Some(&'\n') {
                    escaped = false;
                }
            } else {
                escaped = c == '\\' && !escaped;
            }
        }

        Some(line)
    }
}

/// Parse one logical line into an [`Entry`].
///
/// Comment lines (first non-whitespace character `#` or `!`) and blank lines
/// become a [`BasicEntry`] wrapping the raw text. Everything else is split
/// into leading whitespace, key, separator, value and line ending, all still
/// escaped, such that the five parts concatenate back to the input. A line
/// without a line ending (end of input) gets `"\n"`.
pub fn parse_entry(logical_line: &str) -> Entry {
    let chars: Vec<char> = logical_line.chars().collect();

    if is_comment(&chars) || is_blank(&chars) {
        return Entry::Basic(BasicEntry::new(logical_line));
    }

    let whitespace_end = parse_leading_whitespace(&chars);
    let key_end = parse_key(&chars, whitespace_end);
    let separator_end = parse_separator(&chars, key_end);
    let value_end = split_line_ending(&chars, separator_end);

    let text = |range: std::ops::Range<usize>| chars[range].iter().collect::<String>();

    let line_ending = if value_end < chars.len() {
        text(value_end..chars.len())
    } else {
        "\n".to_string()
    };

    Entry::Property(PropertyEntry::with_format(
        text(0..whitespace_end),
        text(whitespace_end..key_end),
        text(key_end..separator_end),
        text(separator_end..value_end),
        line_ending,
    ))
}

/// Whether the first non-whitespace character of the line is `#` or `!`.
fn is_comment(chars: &[char]) -> bool {
    for &c in chars {
        if matches!(c, ' ' | '\t' | '\x0c' | '\n' | '\r') {
            continue;
        }
        return c == '#' || c == '!';
    }
    false
}

/// Whether the line contains only unescaped whitespace. A backslash directly
/// before a line break does not make the line non-blank.
fn is_blank(chars: &[char]) -> bool {
    let mut escaped = false;
    for i in 0..chars.len() {
        let c = chars[i];

        if c == '\\' {
            if i + 1 < chars.len() && !escaped {
                let next = chars[i + 1];
                if next == '\n' || next == '\r' {
                    return true;
                }
            } else {
                escaped = !escaped;
            }
        }

        if !matches!(c, ' ' | '\t' | '\x0c' | '\n' | '\r') {
            return false;
        }
    }
    true
}

/// End index of the leading whitespace. If the line starts its separator
/// before any key character, the whitespace belongs to the separator and the
/// leading whitespace is empty.
fn parse_leading_whitespace(chars: &[char]) -> usize {
    for (i, &c) in chars.iter().enumerate() {
        if c == '=' || c == ':' {
            return 0;
        }
        if !matches!(c, ' ' | '\t' | '\x0c' | '\n' | '\r') {
            return i;
        }
    }
    chars.len()
}

/// End index of the key, scanning from `start`.
///
/// The key runs until an unescaped whitespace, `=` or `:`. Escaped characters
/// (including escaped line breaks with their continuation whitespace) stay
/// inside the key; whitespace that follows the last escaped character is
/// handed to the separator.
fn parse_key(chars: &[char], start: usize) -> usize {
    let mut ignore_whitespace = false;
    let mut start_of_whitespace: Option<usize> = None;

    let mut i = start;
    while i < chars.len() {
        let c = chars[i];

        // whitespace at the start of a continuation line stays in the key
        if ignore_whitespace && matches!(c, ' ' | '\t' | '\x0c') {
            i += 1;
            continue;
        }

        if c == '\n' || c == '\r' {
            if c == '\r' && i + 1 < chars.len() && chars[i + 1] == '\n' {
                i += 1;
            }
            ignore_whitespace = true;
        }

        if c == '\\' && i + 1 < chars.len() {
            let next = chars[i + 1];
            if next == '\n' || next == '\r' {
                ignore_whitespace = true;
            }
            i += 1;
            start_of_whitespace = Some(i + 1);
        } else if matches!(c, ' ' | '\t' | '\x0c' | '\n' | '\r' | '=' | ':') {
            return start_of_whitespace.unwrap_or(i);
        } else {
            ignore_whitespace = false;
            start_of_whitespace = None;
        }

        i += 1;
    }

    chars.len()
}

/// End index of the separator, scanning from `start`: a run of whitespace,
/// at most one `=` or `:`, and another run of whitespace. A second separator
/// character belongs to the value.
fn parse_separator(chars: &[char], start: usize) -> usize {
    let mut separator_char_consumed = false;

    let mut i = start;
    while i < chars.len() {
        let c = chars[i];

        if c == '=' || c == ':' {
            if separator_char_consumed {
                return i;
            }
            separator_char_consumed = true;
        }

        if !matches!(c, ' ' | '\t' | '\x0c' | '=' | ':') {
            return i;
        }

        i += 1;
    }

    chars.len()
}

/// Index where the trailing line ending starts, scanning backwards from the
/// end of the line. Everything from `start` to that index is the value.
fn split_line_ending(chars: &[char], start: usize) -> usize {
    let mut i = chars.len();
    while i > start && matches!(chars[i - 1], '\n' | '\r') {
        i -= 1;
    }
    i
}

/// Reads the entries of one document from a byte source.
///
/// The source is read completely and decoded with the given [`Charset`]
/// before the first entry is produced; a document is a unit of work, not a
/// stream. Not thread safe.
pub struct PropertyReader {
    lines: LogicalLines<std::vec::IntoIter<char>>,
}

impl PropertyReader {
    /// Read a document from a file, assuming UTF-8.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Self::from_file_with_charset(path, Charset::Utf8)
    }

    /// Read a document from a file in the given charset.
    pub fn from_file_with_charset(
        path: impl AsRef<Path>,
        charset: Charset,
    ) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open properties file {}", path.display()))?;
        Self::from_reader(file, charset)
            .with_context(|| format!("Failed to read properties file {}", path.display()))
    }

    /// Read a document from any byte reader in the given charset.
    pub fn from_reader(mut reader: impl Read, charset: Charset) -> anyhow::Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(Self::from_bytes(&bytes, charset))
    }

    /// Read a document from raw bytes in the given charset.
    pub fn from_bytes(bytes: &[u8], charset: Charset) -> Self {
        Self::from_text(&charset.decode(bytes))
    }

    /// Read a document from already-decoded text.
    pub fn from_text(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        Self {
            lines: LogicalLines::new(chars.into_iter()),
        }
    }

    /// Read the next entry, or `None` when the source is exhausted.
    pub fn read_entry(&mut self) -> Option<Entry> {
        self.lines
            .read_logical_line()
            .map(|line| parse_entry(&line))
    }
}
