/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::fs;
use std::path::Path;
use kbp2ass::file_utils::FileManager;
use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "song.kbp", "content")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::file_exists(temp_dir.path()));
    assert!(FileManager::dir_exists(temp_dir.path()));
    Ok(())
}

/// Test that file_exists returns false for non-existent files
#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.kbp"));
}

/// Test that generate_output_path swaps the extension
#[test]
fn test_generate_output_path_withKbpSource_shouldUseAssExtension() {
    let output_path = FileManager::generate_output_path(Path::new("/tmp/songs/my.song.kbp"));
    assert_eq!(output_path, Path::new("/tmp/songs/my.song.ass"));
}

/// Test folder discovery is recursive and case-insensitive
#[test]
fn test_find_files_withNestedFolders_shouldFindKbpFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("album");
    FileManager::ensure_dir(&nested)?;
    common::create_test_file(temp_dir.path(), "one.kbp", "")?;
    common::create_test_file(&nested, "two.KBP", "")?;
    common::create_test_file(&nested, "two.ass", "")?;

    let files = FileManager::find_files(temp_dir.path(), ".kbp")?;

    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|path| path.extension().unwrap().eq_ignore_ascii_case("kbp")));
    Ok(())
}

/// Test reading UTF-8 sources with a byte order mark
#[test]
fn test_read_source_withBom_shouldStripIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("bom.kbp");
    fs::write(&path, b"\xEF\xBB\xBFcaf\xC3\xA9")?;

    assert_eq!(FileManager::read_source(&path)?, "café");
    Ok(())
}

/// Test reading Windows-1252 sources, including the 0x80-0x9F quote range
#[test]
fn test_read_source_withWindows1252Bytes_shouldFallBack() -> Result<()> {
    common::init_test_logger();
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("cp1252.kbp");
    fs::write(&path, b"don\x92t \x93x\x94 caf\xE9 cr\xE8me")?;

    assert_eq!(FileManager::read_source(&path)?, "don\u{2019}t \u{201C}x\u{201D} café crème");
    Ok(())
}

/// Test that written scripts carry a byte order mark and replace old files
#[test]
fn test_write_ass_shouldPrefixBomAndOverwrite() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("out").join("song.ass");

    FileManager::write_ass(&path, "[Script Info]\r\n")?;
    FileManager::write_ass(&path, "[Script Info]\r\nTitle: x\r\n")?;

    let bytes = fs::read(&path)?;
    assert!(bytes.starts_with(b"\xEF\xBB\xBF"));
    assert_eq!(&bytes[3..], b"[Script Info]\r\nTitle: x\r\n");

    // Only the final file remains in the directory
    assert_eq!(fs::read_dir(path.parent().unwrap())?.count(), 1);
    Ok(())
}

/// Test reading a missing file
#[test]
fn test_read_source_withMissingFile_shouldFail() {
    let error = FileManager::read_source("missing.kbp").unwrap_err();
    assert!(error.to_string().contains("Failed to read file"));
}
