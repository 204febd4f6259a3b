use anyhow::{Context, Result};
use encoding_rs::WINDOWS_1252;
use log::{debug, warn};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

// @module: File and directory utilities

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @generates: Output path next to the source, `.ass` extension
    pub fn generate_output_path<P: AsRef<Path>>(source: P) -> PathBuf {
        source.as_ref().with_extension("ass")
    }

    /// Find files with a specific extension in a directory
    pub fn find_files<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();
        let extension = extension.trim_start_matches('.');

        for entry in WalkDir::new(dir.as_ref()).follow_links(true).sort_by_file_name() {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    if ext.to_string_lossy().eq_ignore_ascii_case(extension) {
                        result.push(path.to_path_buf());
                    }
                }
            }
        }

        Ok(result)
    }

    /// Read a KBP source file.
    ///
    /// UTF-8 is tried first (with or without a byte order mark). Files saved
    /// by older editors are usually Windows-1252, which is the fallback.
    pub fn read_source<P: AsRef<Path>>(path: P) -> Result<String> {
        let path = path.as_ref();
        let bytes = fs::read(path).with_context(|| format!("Failed to read file: {:?}", path))?;
        Ok(Self::decode(&bytes, path))
    }

    fn decode(bytes: &[u8], path: &Path) -> String {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(error) => {
                warn!(
                    "{:?} is not valid UTF-8 (byte {}), reading it as Windows-1252",
                    path,
                    error.valid_up_to()
                );
                let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
                text.into_owned()
            }
        }
    }

    /// Write an ASS script with a UTF-8 byte order mark.
    ///
    /// The content goes to a temporary file in the target directory first and
    /// replaces the destination only once fully written.
    pub fn write_ass<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        let path = path.as_ref();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self::ensure_dir(&parent)?;

        let mut file = NamedTempFile::new_in(&parent)
            .with_context(|| format!("Failed to create temporary file in {:?}", parent))?;
        file.write_all(UTF8_BOM)
            .and_then(|_| file.write_all(content.as_bytes()))
            .and_then(|_| file.flush())
            .with_context(|| format!("Failed to write to file: {:?}", path))?;
        file.persist(path)
            .with_context(|| format!("Failed to write to file: {:?}", path))?;

        debug!("Wrote {} bytes to {:?}", content.len() + UTF8_BOM.len(), path);
        Ok(())
    }
}
