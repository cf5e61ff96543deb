//! End-to-end tests: reading, updating and overwriting real files.

use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use propdoc::{
    Charset, MissingKeyAction, PropertyDocument, UnicodeHandling, WriteOptions,
};

fn create_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn read_bytes(path: &Path) -> Vec<u8> {
    fs::read(path).unwrap()
}

#[test]
fn roundtrip_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let content = "# header\n\nkeyA1=valueA1\nkeyA2 = value A2\r keyA3 : multi \\\r\n   line\r\n\t\n! footer\n";
    let path = create_file(&dir, "roundtrip.properties", content);

    let document = PropertyDocument::from_file(&path).unwrap();
    let target = dir.path().join("out.properties");
    document
        .overwrite_file(&target, &WriteOptions::new())
        .unwrap();

    assert_eq!(read_bytes(&target), content.as_bytes());
}

#[test]
fn continued_value_parses_to_joined_logical_value() {
    let dir = TempDir::new().unwrap();
    let path = create_file(&dir, "continued.properties", "keyA = va\\\n  lueA\n");

    let document = PropertyDocument::from_file(&path).unwrap();
    assert_eq!(document.get("keyA").as_deref(), Some("valueA"));

    // writing the unmodified entry reproduces the continued physical form
    let target = dir.path().join("out.properties");
    document
        .overwrite_file(&target, &WriteOptions::new())
        .unwrap();
    assert_eq!(read_bytes(&target), b"keyA = va\\\n  lueA\n");
}

#[test]
fn update_with_equal_logical_value_leaves_bytes_untouched() {
    let dir = TempDir::new().unwrap();
    let content = "keyA = my\\ value\\ \\\n    over multiple \\\n    lines\nkeyB = B\n";
    let path = create_file(&dir, "update.properties", content);

    // same logical value, escaped differently
    let mut document = PropertyDocument::new();
    document.set("keyA", "my value over multiple lines");
    document.set("keyB", "B");
    document.update_file(&path, &WriteOptions::new()).unwrap();

    assert_eq!(read_bytes(&path), content.as_bytes());
}

#[test]
fn update_with_changed_value_rewrites_only_that_entry() {
    let dir = TempDir::new().unwrap();
    let path = create_file(
        &dir,
        "update.properties",
        "# comment\nkeyA   =\tone \\\n  two\nkeyB : B\n",
    );

    let mut document = PropertyDocument::new();
    document.set("keyA", "changed");
    document.set("keyB", "B");
    document.update_file(&path, &WriteOptions::new()).unwrap();

    // keyA keeps its separator and position, the continued value collapses;
    // every other line is untouched
    assert_eq!(
        read_bytes(&path),
        b"# comment\nkeyA   =\tchanged\nkeyB : B\n"
    );
}

#[test]
fn update_appends_missing_keys() {
    let dir = TempDir::new().unwrap();
    let path = create_file(&dir, "update.properties", "keyA = A\n");

    let mut document = PropertyDocument::new();
    document.set("keyA", "A");
    document.set("keyB", "new entry");
    document.update_file(&path, &WriteOptions::new()).unwrap();

    assert_eq!(read_bytes(&path), b"keyA = A\nkeyB = new entry\n");
}

#[test]
fn update_missing_key_action_nothing_keeps_entries() {
    let dir = TempDir::new().unwrap();
    let path = create_file(&dir, "update.properties", "keyA = A\nkeyB = B\n");

    let mut document = PropertyDocument::new();
    document.set("keyA", "A");
    document.update_file(&path, &WriteOptions::new()).unwrap();

    assert_eq!(read_bytes(&path), b"keyA = A\nkeyB = B\n");
}

#[test]
fn update_missing_key_action_delete_removes_entries() {
    let dir = TempDir::new().unwrap();
    let path = create_file(&dir, "update.properties", "keyA = A\nkeyB = B\nkeyC = C\n");

    let mut document = PropertyDocument::new();
    document.set("keyB", "B");
    let options = WriteOptions::new().with_missing_key_action(MissingKeyAction::Delete);
    document.update_file(&path, &options).unwrap();

    assert_eq!(read_bytes(&path), b"keyB = B\n");
}

#[test]
fn update_missing_key_action_comment_comments_all_lines() {
    let dir = TempDir::new().unwrap();
    let path = create_file(
        &dir,
        "update.properties",
        "keyA = one \\\n  two\nkeyB = B\n",
    );

    let mut document = PropertyDocument::new();
    document.set("keyB", "B");
    let options = WriteOptions::new().with_missing_key_action(MissingKeyAction::Comment);
    document.update_file(&path, &options).unwrap();

    assert_eq!(read_bytes(&path), b"#keyA = one \\\n#  two\nkeyB = B\n");
}

#[test]
fn save_to_creates_missing_file_and_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deep").join("app.properties");

    let mut document = PropertyDocument::new();
    document.set("key", "value");
    document.save_to(&path, &WriteOptions::new()).unwrap();

    assert_eq!(read_bytes(&path), b"key = value\n");
}

#[test]
fn save_to_updates_existing_file() {
    let dir = TempDir::new().unwrap();
    let path = create_file(&dir, "app.properties", "# keep me\nkey\t=\told\n");

    let mut document = PropertyDocument::new();
    document.set("key", "new");
    document.save_to(&path, &WriteOptions::new()).unwrap();

    assert_eq!(read_bytes(&path), b"# keep me\nkey\t=\tnew\n");
}

#[test]
fn overwrite_with_non_unicode_charset_escapes_characters() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("latin1.properties");

    let document = PropertyDocument::from_text("schl\u{00fc}ssel = wert\n");
    let options = WriteOptions::new().with_charset(Charset::Iso8859_1);
    document.overwrite_file(&path, &options).unwrap();

    assert_eq!(read_bytes(&path), b"schl\\u00fcssel = wert\n");

    let reread = PropertyDocument::from_file_with_charset(&path, Charset::Iso8859_1).unwrap();
    assert_eq!(reread.get("schl\u{00fc}ssel").as_deref(), Some("wert"));
}

#[test]
fn overwrite_with_utf16_roundtrips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("utf16.properties");

    let document = PropertyDocument::from_text("schl\u{00fc}ssel = \u{7de8}\u{96c6}\n");
    let options = WriteOptions::new().with_charset(Charset::Utf16Be);
    document.overwrite_file(&path, &options).unwrap();

    let reread = PropertyDocument::from_file_with_charset(&path, Charset::Utf16Be).unwrap();
    assert_eq!(
        reread.get("schl\u{00fc}ssel").as_deref(),
        Some("\u{7de8}\u{96c6}")
    );
}

#[test]
fn overwrite_expands_escapes_on_unicode_charsets() {
    // overwriting forces BY_CHARSET handling: existing \uXXXX escapes become
    // real characters when the charset can carry them
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("expanded.properties");

    let document = PropertyDocument::from_text("key = w\\u00e4hlen\n");
    document
        .overwrite_file(&path, &WriteOptions::new())
        .unwrap();

    assert_eq!(read_bytes(&path), "key = w\u{00e4}hlen\n".as_bytes());
}

#[test]
fn update_escape_only_unicode_handling_keeps_ascii_files_ascii() {
    let dir = TempDir::new().unwrap();
    let path = create_file(&dir, "ascii.properties", "key = w\\u00e4hlen\n");

    // the logical values match, so the escaped form survives the update
    let mut document = PropertyDocument::new();
    document.set("key", "w\u{00e4}hlen");
    document.update_file(&path, &WriteOptions::new()).unwrap();

    assert_eq!(read_bytes(&path), b"key = w\\u00e4hlen\n");
}

#[test]
fn missing_file_reports_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("does-not-exist.properties");
    let result = PropertyDocument::from_file(&missing);
    assert!(result.is_err());
}

#[test]
fn duplicate_keys_survive_roundtrip_with_last_write_wins_lookup() {
    let dir = TempDir::new().unwrap();
    let content = "key = first\nkey = second\n";
    let path = create_file(&dir, "dup.properties", content);

    let document = PropertyDocument::from_file(&path).unwrap();
    assert_eq!(document.entries_len(), 2);
    assert_eq!(document.get("key").as_deref(), Some("second"));

    let target = dir.path().join("out.properties");
    document
        .overwrite_file(&target, &WriteOptions::new())
        .unwrap();
    assert_eq!(read_bytes(&target), content.as_bytes());
}

#[test]
fn reformat_file_on_disk() {
    use propdoc::{ReformatOptions, Reformatter};

    let dir = TempDir::new().unwrap();
    let path = create_file(
        &dir,
        "reformat.properties",
        "# comment\nkeyB:B\nkeyA   A\r\n",
    );

    let reformatter = Reformatter::with_options(
        ReformatOptions::new().with_format("<key> = <value>\\n"),
    );
    reformatter.reformat_file(&path).unwrap();

    assert_eq!(read_bytes(&path), b"# comment\nkeyB = B\nkeyA = A\n");
}

#[test]
fn reorder_file_by_template_on_disk() {
    use propdoc::{ReformatOptions, Reformatter};

    let dir = TempDir::new().unwrap();
    let template = create_file(&dir, "template.properties", "keyY = y\n");
    let path = create_file(&dir, "target.properties", "keyX = X\nkeyY = Y\n");

    Reformatter::with_options(ReformatOptions::new())
        .reorder_file_by_template(&template, &path)
        .unwrap();

    assert_eq!(read_bytes(&path), b"keyY = Y\nkeyX = X\n");
    // the template file itself is untouched
    assert_eq!(read_bytes(&template), b"keyY = y\n");
}

#[test]
fn unicode_handling_escape_option_applies_on_plain_writes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("escaped.properties");

    let document = PropertyDocument::from_text("key = \u{00e4}\n");
    let mut sink = Vec::new();
    document
        .write_to(
            &mut sink,
            &WriteOptions::new().with_unicode_handling(UnicodeHandling::Escape),
        )
        .unwrap();
    assert_eq!(sink, b"key = \\u00e4\n");

    // while the default write keeps the character
    document
        .overwrite_file(&path, &WriteOptions::new())
        .unwrap();
    assert_eq!(read_bytes(&path), "key = \u{00e4}\n".as_bytes());
}
