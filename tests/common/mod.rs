/*!
 * Common test utilities for the kbp2ass test suite
 */

#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const DIVIDER: &str = "-----------------------------";

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Header block with a two colour palette and a single style in slot 0
pub fn sample_header() -> String {
    [
        DIVIDER,
        "HEADERV2",
        "",
        "'--- Template Information ---",
        "",
        "'Palette Colours (0-15)",
        "000,FFF,F80,00F",
        "",
        "'Styles",
        "'Style## contains: Style Name, Text Colour, Outline Colour, Text Wipe Colour, Outline Wipe Colour",
        "'  Font Name, Size, Style, Charset",
        "'  Outline Left, Right, Top, Bottom, Shadow Right, Shadow Down, Wipe Style, Capitals",
        "  Style00,Default,1,0,2,3",
        "  Arial,12,B,0",
        "  2,2,2,2,0,0,0,N",
        "",
        "  StyleEnd",
        "",
        "'Margins (L,R,T,Spacing)",
        "  2,2,7,12",
        "",
        "'Other (Border Colour,Wipe Detail)",
        "  0,3",
        "",
        "'--- Track Information ---",
        "",
        "Status         1",
        "Title          Test Song",
        "Artist         Test Artist",
        "Audio          song.mp3",
        "BuildFile      song.kbp",
        "Intro",
        "Outro",
        "Comments       first line",
        "  second line",
    ]
    .join("\n")
}

/// One `PAGEV2` block from line texts
pub fn page_block(lines: &[&str]) -> String {
    let mut block = vec![DIVIDER.to_string(), "PAGEV2".to_string(), "FX/L/L".to_string()];
    for line in lines {
        block.push(line.to_string());
        block.push(String::new());
    }
    block.join("\n")
}

/// A complete project from page blocks
pub fn kbp_with_pages(pages: &[String]) -> String {
    let mut text = sample_header();
    for page in pages {
        text.push('\n');
        text.push_str(page);
    }
    text.push('\n');
    text.push_str(DIVIDER);
    text.push('\n');
    text
}

/// Two syllables, "Ka" from 0 to 50 cs and "ra" from 50 to 100 cs
pub fn ka_ra_kbp() -> String {
    kbp_with_pages(&[page_block(&["L/A/0/100/0/0/0\nKa/0/50/0\nra/50/100/0"])])
}

/// A multi-page project with a centered line, an offset line and a fixed line
pub fn sample_kbp() -> String {
    kbp_with_pages(&[
        page_block(&[
            "C/A/100/400/0/0/0\nHel/100/150/0\nlo /150/200/0\nworld/210/400/0",
            "L/A/150/500/5/-3/0\nsec/ 160/260/0\nond/261/450/0",
        ]),
        page_block(&["R/a/600/900/0/0/0\nfixed/600/900/0"]),
    ])
}

/// Writes the sample project to a file
pub fn create_test_kbp(dir: &Path, filename: &str) -> Result<PathBuf> {
    create_test_file(dir, filename, &sample_kbp())
}

pub fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
