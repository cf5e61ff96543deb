//! The document model: an ordered entry sequence with a key index.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use tracing::warn;

use crate::charset::Charset;
use crate::entry::{BasicEntry, Entry, PropertyEntry};
use crate::escape;
use crate::options::{MissingKeyAction, UnicodeHandling, WriteOptions};
use crate::reader::PropertyReader;
use crate::writer::PropertyWriter;

/// A properties document that retains the order of its entries as well as
/// all blank lines, comment lines and formatting.
///
/// The document offers two views on its content: the full ordered entry
/// sequence (including comments and blank lines), and a key-value view over
/// the property entries. Keys and values in the key-value view are
/// *unescaped*; the entries themselves keep the escaped file text, which is
/// what makes byte-identical round trips possible.
///
/// Duplicate keys may exist in the sequence; the key-value view always
/// resolves to the entry appended last ("last write wins"), while earlier
/// duplicates stay physically present until removed explicitly.
///
/// Equality is structural equality of the entry sequence: two documents are
/// equal exactly when they would serialize to identical text.
///
/// Not thread safe.
#[derive(Debug, Clone, Default)]
pub struct PropertyDocument {
    /// All entries in document order.
    entries: Vec<Entry>,
    /// Unescaped key -> position of the property entry appended last for
    /// that key. Positions are kept consistent on every structural change.
    index: HashMap<String, usize>,
}

impl PartialEq for PropertyDocument {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for PropertyDocument {}

impl PropertyDocument {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a document from already-decoded text.
    pub fn from_text(text: &str) -> Self {
        let mut document = Self::new();
        let mut reader = PropertyReader::from_text(text);
        while let Some(entry) = reader.read_entry() {
            document.append(entry);
        }
        document
    }

    /// Parse a document from raw bytes in the given charset.
    pub fn from_bytes(bytes: &[u8], charset: Charset) -> Self {
        Self::from_text(&charset.decode(bytes))
    }

    /// Read a document from a file, assuming UTF-8.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Self::from_file_with_charset(path, Charset::Utf8)
    }

    /// Read a document from a file in the given charset.
    pub fn from_file_with_charset(
        path: impl AsRef<Path>,
        charset: Charset,
    ) -> anyhow::Result<Self> {
        let mut reader = PropertyReader::from_file_with_charset(path, charset)?;
        let mut document = Self::new();
        while let Some(entry) = reader.read_entry() {
            document.append(entry);
        }
        Ok(document)
    }

    /// Append an entry to the end of the document.
    ///
    /// A property entry updates the key index even when an entry with the
    /// same key already exists; the earlier entry stays in the sequence but
    /// is no longer reachable through the key-value view.
    pub fn append(&mut self, entry: impl Into<Entry>) {
        let entry = entry.into();
        if let Entry::Property(property) = &entry {
            let key = escape::unescape(&property.key);
            self.index.insert(key, self.entries.len());
        }
        self.entries.push(entry);
    }

    /// Set the value for a key. Both `key` and `value` are unescaped.
    ///
    /// If the key exists, only the entry's value is replaced: leading
    /// whitespace, separator, line ending and therefore the position and
    /// formatting of the entry are preserved. Otherwise a new entry with
    /// default formatting is appended.
    pub fn set(&mut self, key: &str, value: &str) {
        if let Some(&position) = self.index.get(key) {
            if let Entry::Property(property) = &mut self.entries[position] {
                property.set_value(escape::escape_value(value));
            }
        } else {
            self.append(PropertyEntry::new(
                escape::escape_key(key),
                escape::escape_value(value),
            ));
        }
    }

    /// The unescaped value for the given unescaped key, if present.
    pub fn get(&self, key: &str) -> Option<String> {
        self.property_entry(key)
            .map(|property| escape::unescape(&property.value))
    }

    /// The property entry for the given unescaped key. The returned entry
    /// contains the *escaped* key and value.
    pub fn property_entry(&self, key: &str) -> Option<&PropertyEntry> {
        self.index
            .get(key)
            .and_then(|&position| self.entries[position].as_property())
    }

    /// Whether the document contains a property entry with the given
    /// unescaped key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// The unescaped keys of all reachable property entries, in document
    /// order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.index.len());
        for (position, entry) in self.entries.iter().enumerate() {
            if let Entry::Property(property) = entry {
                let key = escape::unescape(&property.key);
                if self.index.get(&key) == Some(&position) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    /// The unescaped values of all reachable property entries, in document
    /// order.
    pub fn values(&self) -> Vec<String> {
        let mut values = Vec::with_capacity(self.index.len());
        for (position, entry) in self.entries.iter().enumerate() {
            if let Entry::Property(property) = entry {
                let key = escape::unescape(&property.key);
                if self.index.get(&key) == Some(&position) {
                    values.push(escape::unescape(&property.value));
                }
            }
        }
        values
    }

    /// A snapshot of the key-value view with unescaped keys and values.
    /// Later changes to the document are not reflected in the map.
    pub fn to_map(&self) -> HashMap<String, String> {
        self.index
            .iter()
            .filter_map(|(key, &position)| {
                self.entries[position]
                    .as_property()
                    .map(|property| (key.clone(), escape::unescape(&property.value)))
            })
            .collect()
    }

    /// The number of reachable key-value pairs.
    pub fn properties_len(&self) -> usize {
        self.index.len()
    }

    /// The number of entries, including blank and comment lines.
    pub fn entries_len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the document has no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in document order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    /// Replace all entries of this document.
    pub fn set_entries(&mut self, entries: Vec<Entry>) {
        self.clear();
        for entry in entries {
            self.append(entry);
        }
    }

    /// Remove the property entry for the given unescaped key.
    ///
    /// Only the entry tracked by the key index is removed; earlier literal
    /// duplicates of the key stay in the sequence (and stay unreachable).
    pub fn remove_key(&mut self, key: &str) {
        if let Some(position) = self.index.remove(key) {
            self.entries.remove(position);
            for p in self.index.values_mut() {
                if *p > position {
                    *p -= 1;
                }
            }
        }
    }

    /// Remove an entry from the document.
    ///
    /// All structurally equal occurrences are removed, which matters for
    /// repeated identical basic entries such as blank lines.
    pub fn remove_entry(&mut self, entry: &Entry) {
        let removed: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| *e == entry)
            .map(|(position, _)| position)
            .collect();
        if removed.is_empty() {
            return;
        }

        self.entries.retain(|e| e != entry);
        self.index.retain(|_, position| !removed.contains(position));
        for position in self.index.values_mut() {
            *position -= removed.iter().filter(|&&r| r < *position).count();
        }
    }

    /// Replace the first structural occurrence of `old` with `new`.
    /// The entries do not need to be of the same kind.
    ///
    /// Returns whether `old` was found and replaced.
    pub fn replace_entry(&mut self, old: &Entry, new: impl Into<Entry>) -> bool {
        let Some(position) = self.entries.iter().position(|e| e == old) else {
            return false;
        };

        if old.is_property() {
            let entries = &self.entries;
            self.index.retain(|_, &mut p| entries[p] != *old);
        }

        let new = new.into();
        if let Entry::Property(property) = &new {
            let key = escape::unescape(&property.key);
            self.index.insert(key, position);
        }
        self.entries[position] = new;
        true
    }

    /// The full text of the document: the concatenation of all entries.
    pub fn to_text(&self) -> String {
        self.entries.iter().map(Entry::to_text).collect()
    }

    /// Write all entries to the given sink using the charset and unicode
    /// handling from `options` (the overwrite protocol; a plain sink cannot
    /// be updated in place).
    pub fn write_to(&self, sink: impl Write, options: &WriteOptions) -> io::Result<()> {
        let mut writer = PropertyWriter::new(sink, options);
        for entry in &self.entries {
            writer.write_entry(entry)?;
        }
        writer.finish()?;
        Ok(())
    }

    /// Save this document to the given file: update it in place when it
    /// exists, write a fresh file otherwise.
    pub fn save_to(&self, path: impl AsRef<Path>, options: &WriteOptions) -> anyhow::Result<()> {
        if path.as_ref().exists() {
            self.update_file(path, options)
        } else {
            self.overwrite_file(path, options)
        }
    }

    /// Write this document to the given file, replacing any previous
    /// content. Missing parent directories are created.
    pub fn overwrite_file(
        &self,
        path: impl AsRef<Path>,
        options: &WriteOptions,
    ) -> anyhow::Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create directories for {}", path.display())
                    })?;
                }
            }
        }

        let options = options.with_unicode_handling(UnicodeHandling::ByCharset);
        write_entries_to_file(path, &self.entries, &options)
    }

    /// Update the given file in place with the entries of this document.
    ///
    /// The target file is read as a fresh document. For every key-value pair
    /// in this document the target's value is replaced only if the
    /// *unescaped* values differ; a pair whose value merely changed its
    /// escaping keeps its physical lines untouched. Keys missing from the
    /// target are appended; keys present in the target but missing from this
    /// document are handled according to the configured
    /// [`MissingKeyAction`].
    pub fn update_file(
        &self,
        path: impl AsRef<Path>,
        options: &WriteOptions,
    ) -> anyhow::Result<()> {
        let path = path.as_ref();
        let mut existing = Self::from_file_with_charset(path, options.charset)?;

        for entry in &self.entries {
            // only key-value pairs take part in an update
            let Entry::Property(property) = entry else {
                continue;
            };
            let key = escape::unescape(&property.key);
            if let Some(&position) = existing.index.get(&key) {
                if let Entry::Property(existing_property) = &mut existing.entries[position] {
                    let value = escape::unescape(&property.value);
                    if escape::unescape(&existing_property.value) != value {
                        existing_property.set_value(property.value.clone());
                    }
                }
            } else {
                existing.append(property.clone());
            }
        }

        let missing: Vec<String> = existing
            .keys()
            .into_iter()
            .filter(|key| !self.contains_key(key))
            .collect();
        match options.missing_key_action {
            MissingKeyAction::Nothing => {}
            MissingKeyAction::Delete => {
                for key in missing {
                    existing.remove_key(&key);
                }
            }
            MissingKeyAction::Comment => {
                for key in missing {
                    if let Some(property) = existing.property_entry(&key).cloned() {
                        let commented = BasicEntry::new(escape::comment_out(&property.to_text()));
                        existing.replace_entry(&Entry::Property(property), commented);
                    }
                }
            }
        }

        write_entries_to_file(path, &existing.entries, options)
    }
}

/// Write entries to a file, guaranteeing that a flush failure never masks an
/// earlier write failure: the first error wins, later ones are only logged.
fn write_entries_to_file(
    path: &Path,
    entries: &[Entry],
    options: &WriteOptions,
) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to open {} for writing", path.display()))?;
    let mut writer = PropertyWriter::new(BufWriter::new(file), options);

    let mut result = Ok(());
    for entry in entries {
        if let Err(e) = writer.write_entry(entry) {
            result = Err(e);
            break;
        }
    }

    match writer.finish() {
        Ok(_) => {}
        Err(e) if result.is_ok() => result = Err(e),
        Err(e) => warn!("error closing {} after failed write: {e}", path.display()),
    }

    result.with_context(|| format!("Error writing properties file {}", path.display()))
}
