//! Entry data structures

/// A single entry of a properties document.
///
/// A document is an ordered sequence of entries. Every physical piece of the
/// source text belongs to exactly one entry, so concatenating the text of all
/// entries reproduces the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Entry {
    /// A comment line or a blank line, kept verbatim.
    Basic(BasicEntry),
    /// A key-value pair with all its surrounding formatting.
    Property(PropertyEntry),
}

impl Entry {
    /// Returns the exact text of this entry as it appears in the file,
    /// including the trailing line ending.
    pub fn to_text(&self) -> String {
        match self {
            Entry::Basic(basic) => basic.content.clone(),
            Entry::Property(property) => property.to_text(),
        }
    }

    /// Returns the contained property entry, if this is one.
    pub fn as_property(&self) -> Option<&PropertyEntry> {
        match self {
            Entry::Basic(_) => None,
            Entry::Property(property) => Some(property),
        }
    }

    /// Whether this entry is a key-value pair.
    pub fn is_property(&self) -> bool {
        matches!(self, Entry::Property(_))
    }
}

impl From<BasicEntry> for Entry {
    fn from(entry: BasicEntry) -> Self {
        Entry::Basic(entry)
    }
}

impl From<PropertyEntry> for Entry {
    fn from(entry: PropertyEntry) -> Self {
        Entry::Property(entry)
    }
}

/// An entry with no key-value meaning: a blank line or a comment line.
///
/// The content is stored verbatim, line ending included. No un-/escaping is
/// ever applied to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BasicEntry {
    /// The raw text of the line, including its line ending.
    pub content: String,
}

impl BasicEntry {
    /// Create a new basic entry wrapping the given raw text.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// A key-value entry of a properties document.
///
/// Besides the key and the value this struct stores the leading whitespace,
/// the separator (with its surrounding whitespace) and the line ending, which
/// allows writing the entry back in exactly the form it was read.
///
/// All five fields hold *escaped* text, the characters exactly as they appear
/// in the file. Use [`crate::escape::unescape`] to obtain the logical key or
/// value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyEntry {
    /// Whitespace before the key.
    pub leading_whitespace: String,
    /// The escaped key.
    pub key: String,
    /// The separator with surrounding whitespace.
    pub separator: String,
    /// The escaped value.
    pub value: String,
    /// The line ending character(s).
    pub line_ending: String,
}

impl PropertyEntry {
    /// Create a new property entry with the given *escaped* key and value and
    /// default formatting: no leading whitespace, `" = "` as separator and
    /// `"\n"` as line ending.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            leading_whitespace: String::new(),
            key: key.into(),
            separator: " = ".to_string(),
            value: value.into(),
            line_ending: "\n".to_string(),
        }
    }

    /// Create a new property entry with explicit formatting. All fields are
    /// *escaped* text.
    pub fn with_format(
        leading_whitespace: impl Into<String>,
        key: impl Into<String>,
        separator: impl Into<String>,
        value: impl Into<String>,
        line_ending: impl Into<String>,
    ) -> Self {
        Self {
            leading_whitespace: leading_whitespace.into(),
            key: key.into(),
            separator: separator.into(),
            value: value.into(),
            line_ending: line_ending.into(),
        }
    }

    /// Replace the *escaped* value of this entry, keeping all formatting.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Concatenation of all five fields: the exact file text of this entry.
    pub fn to_text(&self) -> String {
        let mut text = String::with_capacity(
            self.leading_whitespace.len()
                + self.key.len()
                + self.separator.len()
                + self.value.len()
                + self.line_ending.len(),
        );
        text.push_str(&self.leading_whitespace);
        text.push_str(&self.key);
        text.push_str(&self.separator);
        text.push_str(&self.value);
        text.push_str(&self.line_ending);
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_entry_roundtrip_text() {
        let entry = PropertyEntry::with_format("  ", "key", " = ", "value", "\r\n");
        assert_eq!(entry.to_text(), "  key = value\r\n");
    }

    #[test]
    fn test_property_entry_defaults() {
        let entry = PropertyEntry::new("key", "value");
        assert_eq!(entry.leading_whitespace, "");
        assert_eq!(entry.separator, " = ");
        assert_eq!(entry.line_ending, "\n");
        assert_eq!(entry.to_text(), "key = value\n");
    }

    #[test]
    fn test_basic_entry_keeps_text_verbatim() {
        let entry = BasicEntry::new("# a comment\n");
        assert_eq!(Entry::from(entry).to_text(), "# a comment\n");
    }

    #[test]
    fn test_set_value_keeps_formatting() {
        let mut entry = PropertyEntry::with_format("", "key", "\t:\t", "old", "\n");
        entry.set_value("new");
        assert_eq!(entry.to_text(), "key\t:\tnew\n");
    }

    #[test]
    fn test_structural_equality() {
        let a = PropertyEntry::with_format("", "key", " = ", "value", "\n");
        let b = PropertyEntry::with_format("", "key", "=", "value", "\n");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }
}
