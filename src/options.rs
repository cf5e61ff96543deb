//! Options for writing documents.

use crate::charset::Charset;

/// How to represent characters outside the ASCII range when writing.
///
/// Whatever the policy says, a charset that cannot carry unicode characters
/// always forces `\uXXXX` escaping; the fallback is never silent corruption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UnicodeHandling {
    /// Keep each entry's existing representation (the default).
    #[default]
    DoNothing,
    /// Always write unicode characters as `\uXXXX` escape sequences.
    Escape,
    /// Always expand existing `\uXXXX` escape sequences to real characters.
    Unicode,
    /// Like [`UnicodeHandling::Unicode`] for unicode-capable charsets, like
    /// [`UnicodeHandling::Escape`] otherwise.
    ByCharset,
}

/// What to do, during an in-place update, with keys that exist in the target
/// file but not in the document being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MissingKeyAction {
    /// Leave the existing key-value pair untouched (the default).
    #[default]
    Nothing,
    /// Delete the key-value pair from the file.
    Delete,
    /// Comment the lines of the key-value pair out.
    Comment,
}

/// Options for writing a document.
///
/// Immutable: the `with_*` methods return a modified copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteOptions {
    /// The charset to encode the output with.
    pub charset: Charset,
    /// How to treat keys missing from the document on in-place updates.
    /// Ignored by the overwrite protocol.
    pub missing_key_action: MissingKeyAction,
    /// How to represent non-ASCII characters.
    pub unicode_handling: UnicodeHandling,
}

impl WriteOptions {
    /// Create options with the default values: UTF-8,
    /// [`MissingKeyAction::Nothing`] and [`UnicodeHandling::DoNothing`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy with the given charset.
    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    /// Return a copy with the given missing-key action.
    pub fn with_missing_key_action(mut self, action: MissingKeyAction) -> Self {
        self.missing_key_action = action;
        self
    }

    /// Return a copy with the given unicode handling.
    pub fn with_unicode_handling(mut self, handling: UnicodeHandling) -> Self {
        self.unicode_handling = handling;
        self
    }
}
