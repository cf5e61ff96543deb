//! Reformatting and reordering of documents.
//!
//! Two independent operations share one grouping primitive:
//!
//! - **Reformat** rewrites the layout of every entry (leading whitespace,
//!   separator, line ending, optionally also the key and value themselves)
//!   according to a format string such as `<key> = <value>\n`, without
//!   changing the entry order.
//! - **Reorder** resequences the entries, either alphabetically by key or
//!   following the key order of a template document. Comment and blank lines
//!   carry no identity of their own, so an [`AttachComments`] policy decides
//!   which key-value pair they travel with.

use std::fmt;
use std::path::Path;

use crate::document::PropertyDocument;
use crate::entry::{BasicEntry, Entry, PropertyEntry};
use crate::escape;
use crate::options::WriteOptions;
use crate::charset::Charset;

/// How to handle comment lines and blank lines when reordering entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttachComments {
    /// Comments and blank lines belong to the key-value pair *after* them
    /// (the default).
    #[default]
    NextProperty,
    /// Comments and blank lines belong to the key-value pair *before* them.
    PrevProperty,
    /// Comments and blank lines stay at their original line position; only
    /// the key-value pairs rotate through the remaining positions.
    OrigLine,
}

/// The result of parsing a format string: the literal layout text to apply
/// to every entry.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PropertyFormat {
    leading_whitespace: String,
    separator: String,
    line_ending: String,
}

/// A format string that does not conform to the format grammar.
///
/// A valid format string is e.g. `<key> = <value>\n`: optional leading
/// whitespace, the `<key>` placeholder, a separator (`=` or `:` with
/// optional surrounding whitespace), the `<value>` placeholder and one of
/// the line endings `\n`, `\r` or `\r\n`, with all whitespace and line
/// endings written as literal escape sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidFormatError {
    format: String,
}

impl InvalidFormatError {
    fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }

    /// The offending format string.
    pub fn format(&self) -> &str {
        &self.format
    }
}

impl fmt::Display for InvalidFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid format string {:?}. A usual format is \"<key> = <value>\\n\"",
            self.format
        )
    }
}

impl std::error::Error for InvalidFormatError {}

/// Options for reformatting and reordering.
///
/// Immutable: the `with_*` methods return a modified copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReformatOptions {
    /// The charset used by the file-level operations.
    pub charset: Charset,
    /// The format string applied when reformatting key-value pairs.
    pub format: String,
    /// Whether to also rewrite the keys and values themselves, stripping
    /// insignificant whitespace, line breaks and escape characters.
    pub reformat_key_and_value: bool,
    /// How comments and blank lines travel when reordering.
    pub attach_comments: AttachComments,
}

impl Default for ReformatOptions {
    fn default() -> Self {
        Self {
            charset: Charset::Utf8,
            format: "<key> = <value>\\n".to_string(),
            reformat_key_and_value: false,
            attach_comments: AttachComments::NextProperty,
        }
    }
}

impl ReformatOptions {
    /// Create options with the default values: UTF-8, the format
    /// `<key> = <value>\n`, keys and values untouched, comments attached to
    /// the following key-value pair.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy with the given charset.
    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    /// Return a copy with the given format string.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Return a copy with the given key-and-value reformatting flag.
    pub fn with_reformat_key_and_value(mut self, reformat_key_and_value: bool) -> Self {
        self.reformat_key_and_value = reformat_key_and_value;
        self
    }

    /// Return a copy with the given comment attachment policy.
    pub fn with_attach_comments(mut self, attach_comments: AttachComments) -> Self {
        self.attach_comments = attach_comments;
        self
    }
}

/// A group of entries that is moved as one unit when reordering: at most one
/// property entry plus the basic entries attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct EntryGroup {
    /// The entries of this group in document order.
    entries: Vec<Entry>,
    /// The *escaped* key of the contained property entry, if any.
    property_key: Option<String>,
}

impl EntryGroup {
    /// Build a group from the given entries.
    ///
    /// Panics if the list is empty or contains more than one property entry;
    /// both are programming errors in the grouping code, not input errors.
    fn new(entries: Vec<Entry>) -> Self {
        assert!(!entries.is_empty(), "an entry group may not be empty");

        let mut property_key = None;
        for entry in &entries {
            if let Entry::Property(property) = entry {
                assert!(
                    property_key.is_none(),
                    "at most one property entry is allowed per group"
                );
                property_key = Some(property.key.clone());
            }
        }

        Self {
            entries,
            property_key,
        }
    }
}

/// Group a document's entries according to the given attachment policy.
fn group_entries(entries: &[Entry], attach: AttachComments) -> Vec<EntryGroup> {
    let mut groups = Vec::new();
    let mut buffer: Vec<Entry> = Vec::new();

    match attach {
        AttachComments::NextProperty => {
            for entry in entries {
                buffer.push(entry.clone());
                if entry.is_property() {
                    groups.push(EntryGroup::new(std::mem::take(&mut buffer)));
                }
            }
            if !buffer.is_empty() {
                groups.push(EntryGroup::new(buffer));
            }
        }
        AttachComments::PrevProperty => {
            for entry in entries {
                if entry.is_property() && !buffer.is_empty() {
                    groups.push(EntryGroup::new(std::mem::take(&mut buffer)));
                }
                buffer.push(entry.clone());
            }
            if !buffer.is_empty() {
                groups.push(EntryGroup::new(buffer));
            }
        }
        AttachComments::OrigLine => {
            for entry in entries {
                groups.push(EntryGroup::new(vec![entry.clone()]));
            }
        }
    }

    groups
}

/// Sort groups by their escaped property key according to the attachment
/// policy: keyless groups go last for [`AttachComments::NextProperty`],
/// first for [`AttachComments::PrevProperty`]. For
/// [`AttachComments::OrigLine`] only the property groups are sorted among
/// themselves and written back into the property positions, leaving every
/// basic entry at its original index.
fn sort_groups(groups: &mut [EntryGroup], attach: AttachComments) {
    use std::cmp::Ordering;

    match attach {
        AttachComments::NextProperty => {
            groups.sort_by(|a, b| match (&a.property_key, &b.property_key) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            });
        }
        AttachComments::PrevProperty => {
            groups.sort_by(|a, b| match (&a.property_key, &b.property_key) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(a), Some(b)) => a.cmp(b),
            });
        }
        AttachComments::OrigLine => {
            let mut sorted: Vec<EntryGroup> = groups
                .iter()
                .filter(|group| group.property_key.is_some())
                .cloned()
                .collect();
            sorted.sort_by(|a, b| a.property_key.cmp(&b.property_key));

            let mut sorted = sorted.into_iter();
            for slot in groups.iter_mut() {
                if slot.property_key.is_some() {
                    *slot = sorted
                        .next()
                        .expect("one sorted property group per property position");
                }
            }
        }
    }
}

/// Reformats and reorders properties documents.
#[derive(Debug, Clone, Default)]
pub struct Reformatter {
    options: ReformatOptions,
}

impl Reformatter {
    /// Create a reformatter with the default [`ReformatOptions`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a reformatter with the given options.
    pub fn with_options(options: ReformatOptions) -> Self {
        Self { options }
    }

    /// Rewrite the layout of every entry according to the configured format
    /// string. The entry order is unchanged.
    ///
    /// Property entries get the format's leading whitespace, separator and
    /// line ending; with `reformat_key_and_value` enabled the key and value
    /// are additionally canonicalized, which collapses multi-line entries to
    /// a single physical line. Basic entries have their line breaks replaced
    /// by the format's line ending.
    ///
    /// Fails fast on an invalid format string; no entry is touched then.
    pub fn reformat(&self, document: &mut PropertyDocument) -> Result<(), InvalidFormatError> {
        let format = parse_format(&self.options.format)?;

        let mut formatted = Vec::with_capacity(document.entries().len());
        for entry in document.entries() {
            match entry {
                Entry::Property(property) => {
                    let key = if self.options.reformat_key_and_value {
                        escape::escape_key(&escape::unescape(&property.key))
                    } else {
                        property.key.clone()
                    };
                    let value = if self.options.reformat_key_and_value {
                        escape::escape_value(&escape::unescape(&property.value))
                    } else {
                        property.value.clone()
                    };
                    formatted.push(Entry::Property(PropertyEntry::with_format(
                        format.leading_whitespace.clone(),
                        key,
                        format.separator.clone(),
                        value,
                        format.line_ending.clone(),
                    )));
                }
                Entry::Basic(basic) => {
                    let mut stripped: String = basic
                        .content
                        .chars()
                        .filter(|c| *c != '\n' && *c != '\r')
                        .collect();
                    stripped.push_str(&format.line_ending);
                    formatted.push(Entry::Basic(BasicEntry::new(stripped)));
                }
            }
        }

        document.set_entries(formatted);
        Ok(())
    }

    /// Reorder the document's entries alphabetically by their escaped keys.
    ///
    /// Comments and blank lines travel according to the configured
    /// [`AttachComments`] policy.
    pub fn reorder_by_key(&self, document: &mut PropertyDocument) {
        let mut groups = group_entries(document.entries(), self.options.attach_comments);
        sort_groups(&mut groups, self.options.attach_comments);

        let reordered = groups.into_iter().flat_map(|group| group.entries).collect();
        document.set_entries(reordered);
    }

    /// Reorder the document's entries to follow the key order of the given
    /// template document.
    ///
    /// Keys that exist only in `document` but not in the template keep their
    /// relative order and move to the end. The template is never modified.
    pub fn reorder_by_template(
        &self,
        template: &PropertyDocument,
        document: &mut PropertyDocument,
    ) {
        let mut groups = group_entries(document.entries(), self.options.attach_comments);
        let mut ordered = Vec::with_capacity(document.entries().len());

        for entry in template.entries() {
            // only key-value pairs of the template drive the order
            if let Entry::Property(reference) = entry {
                let found = groups
                    .iter()
                    .position(|group| group.property_key.as_deref() == Some(reference.key.as_str()));
                if let Some(position) = found {
                    ordered.extend(groups.remove(position).entries);
                }
            }
        }

        // entries without a counterpart in the template go to the end
        for group in groups {
            ordered.extend(group.entries);
        }

        document.set_entries(ordered);
    }

    /// Reformat the given file on disk.
    pub fn reformat_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let mut document = PropertyDocument::from_file_with_charset(path, self.options.charset)?;
        self.reformat(&mut document)?;
        document.overwrite_file(path, &WriteOptions::new().with_charset(self.options.charset))
    }

    /// Reorder the given file on disk alphabetically by key.
    pub fn reorder_file_by_key(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let mut document = PropertyDocument::from_file_with_charset(path, self.options.charset)?;
        self.reorder_by_key(&mut document);
        document.overwrite_file(path, &WriteOptions::new().with_charset(self.options.charset))
    }

    /// Reorder the given file on disk following the key order of the given
    /// template file. The template file is not modified.
    pub fn reorder_file_by_template(
        &self,
        template: impl AsRef<Path>,
        path: impl AsRef<Path>,
    ) -> anyhow::Result<()> {
        let path = path.as_ref();
        let template =
            PropertyDocument::from_file_with_charset(template, self.options.charset)?;
        let mut document = PropertyDocument::from_file_with_charset(path, self.options.charset)?;
        self.reorder_by_template(&template, &mut document);
        document.overwrite_file(path, &WriteOptions::new().with_charset(self.options.charset))
    }
}

/// Parse a format string against the format grammar.
fn parse_format(format: &str) -> Result<PropertyFormat, InvalidFormatError> {
    if !format.is_ascii() {
        return Err(InvalidFormatError::new(format));
    }

    let key_position =
        find_placeholder(format, "<key>").ok_or_else(|| InvalidFormatError::new(format))?;
    let value_position =
        find_placeholder(format, "<value>").ok_or_else(|| InvalidFormatError::new(format))?;
    if value_position < key_position + "<key>".len() {
        return Err(InvalidFormatError::new(format));
    }

    let leading_whitespace = &format[..key_position];
    let separator = &format[key_position + "<key>".len()..value_position];
    let line_ending = &format[value_position + "<value>".len()..];

    if !skip_whitespace_tokens(leading_whitespace).is_empty()
        || !is_valid_separator(separator)
        || !matches!(line_ending, "\\n" | "\\r" | "\\r\\n")
    {
        return Err(InvalidFormatError::new(format));
    }

    Ok(PropertyFormat {
        leading_whitespace: convert_escapes(leading_whitespace),
        separator: convert_escapes(separator),
        line_ending: convert_escapes(line_ending),
    })
}

/// Byte position of a case-insensitive placeholder. Safe to slice at since
/// the format string is checked to be plain ASCII.
fn find_placeholder(format: &str, placeholder: &str) -> Option<usize> {
    format
        .as_bytes()
        .windows(placeholder.len())
        .position(|window| window.eq_ignore_ascii_case(placeholder.as_bytes()))
}

/// Strip leading whitespace tokens: a space or the literal escapes `\t` and
/// `\f`.
fn skip_whitespace_tokens(mut s: &str) -> &str {
    loop {
        if let Some(rest) = s.strip_prefix(' ') {
            s = rest;
        } else if let Some(rest) = s.strip_prefix("\\t") {
            s = rest;
        } else if let Some(rest) = s.strip_prefix("\\f") {
            s = rest;
        } else {
            return s;
        }
    }
}

/// A valid separator: optional whitespace tokens around exactly one `=` or
/// `:`.
fn is_valid_separator(s: &str) -> bool {
    let rest = skip_whitespace_tokens(s);
    let mut chars = rest.chars();
    if !matches!(chars.next(), Some('=' | ':')) {
        return false;
    }
    skip_whitespace_tokens(chars.as_str()).is_empty()
}

/// Replace the literal escape sequences of a format string with the real
/// characters.
fn convert_escapes(s: &str) -> String {
    s.replace("\\t", "\t")
        .replace("\\f", "\x0c")
        .replace("\\r", "\r")
        .replace("\\n", "\n")
}
