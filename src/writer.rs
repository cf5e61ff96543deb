//! Writing entries to a byte sink.
//!
//! Entries keep their escaped text; the only transformation applied on the
//! way out is the unicode representation, which depends on the target charset
//! and the configured [`UnicodeHandling`]. A charset that cannot carry
//! unicode characters always forces `\uXXXX` escaping, whatever the policy
//! says; the fallback is never silent corruption.

use std::io::{self, Write};

use crate::charset::Charset;
use crate::entry::Entry;
use crate::escape;
use crate::options::{UnicodeHandling, WriteOptions};

/// Writes the entries of one document to a byte sink.
///
/// Not thread safe.
pub struct PropertyWriter<W: Write> {
    sink: W,
    charset: Charset,
    unicode_handling: UnicodeHandling,
}

impl<W: Write> PropertyWriter<W> {
    /// Create a writer for the given sink using the charset and unicode
    /// handling from `options`.
    pub fn new(sink: W, options: &WriteOptions) -> Self {
        Self {
            sink,
            charset: options.charset,
            unicode_handling: options.unicode_handling,
        }
    }

    /// Write a single entry in its exact textual form, transformed only by
    /// the unicode policy.
    pub fn write_entry(&mut self, entry: &Entry) -> io::Result<()> {
        let text = entry.to_text();

        let text = if self.unicode_handling == UnicodeHandling::Escape || !self.charset.is_unicode()
        {
            escape::escape_unicode(&text)
        } else if matches!(
            self.unicode_handling,
            UnicodeHandling::Unicode | UnicodeHandling::ByCharset
        ) {
            escape::unescape_unicode(&text)
        } else {
            text
        };

        self.sink.write_all(&self.charset.encode(&text))
    }

    /// Flush the sink and hand it back.
    pub fn finish(mut self) -> io::Result<W> {
        self.sink.flush()?;
        Ok(self.sink)
    }
}
