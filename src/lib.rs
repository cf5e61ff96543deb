//! # propdoc
//!
//! Format-preserving document model for the Java `.properties` file dialect.
//!
//! A properties file is a line-oriented key/value format:
//!
//! ```text
//! # application settings
//! greeting = Hello World
//! path.with.spaces = some\ value \
//!     continued on the next line
//! schlüssel : wert
//! ```
//!
//! This crate parses such a document into a fully reversible in-memory
//! representation: every entry keeps its original escaped text, leading
//! whitespace, separator and line ending, so an unmodified document writes
//! back byte-for-byte. Changing a value updates only that entry's text and
//! leaves all surrounding formatting, comments and blank lines untouched.
//!
//! ## Reading and updating
//!
//! ```no_run
//! use propdoc::{PropertyDocument, WriteOptions};
//!
//! fn example() -> anyhow::Result<()> {
//!     let mut document = PropertyDocument::from_file("app.properties")?;
//!     assert_eq!(document.get("greeting").as_deref(), Some("Hello World"));
//!
//!     document.set("greeting", "Hello propdoc");
//!     document.save_to("app.properties", &WriteOptions::new())?;
//!     Ok(())
//! }
//! ```
//!
//! Saving to an existing file uses the *update-in-place* protocol: a value
//! is only rewritten if its unescaped content actually changed, so entries
//! whose escaping merely differs keep their physical lines.
//!
//! ## Reformatting and reordering
//!
//! [`Reformatter`] rewrites entry layout according to a format string such
//! as `<key> = <value>\n`, and reorders entries alphabetically or following
//! a template document. Comments and blank lines travel with a neighboring
//! key-value pair according to an [`AttachComments`] policy.
//!
//! ## Escaped and unescaped text
//!
//! Entries store *escaped* text (backslash escapes, `\uXXXX` sequences,
//! continuation line breaks) exactly as it appears in the file; the
//! key-value view ([`PropertyDocument::get`], [`PropertyDocument::set`],
//! [`PropertyDocument::to_map`]) works on *unescaped* logical strings. The
//! conversions live in the [`escape`] module.

pub mod charset;
pub mod document;
pub mod entry;
pub mod escape;
pub mod options;
pub mod reader;
pub mod reformat;
pub mod writer;

pub use charset::Charset;
pub use document::PropertyDocument;
pub use entry::{BasicEntry, Entry, PropertyEntry};
pub use options::{MissingKeyAction, UnicodeHandling, WriteOptions};
pub use reader::{LogicalLines, PropertyReader};
pub use reformat::{AttachComments, InvalidFormatError, ReformatOptions, Reformatter};
pub use writer::PropertyWriter;
