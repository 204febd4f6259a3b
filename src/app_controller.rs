use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::ass::document::format_timestamp;
use crate::ass::AssConverter;
use crate::errors::ConversionError;
use crate::file_utils::FileManager;
use crate::kbp::{KbpDocument, ParseWarning, TimeRange};

// @module: Application controller for KBP conversion

// @const: Source files picked up in folder mode
pub const SOURCE_EXTENSION: &str = "kbp";

/// Result of parsing a file without converting it
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub path: PathBuf,
    pub document: KbpDocument,
    pub warnings: Vec<ParseWarning>,
}

impl CheckReport {
    // @returns: First line start to last line end over all pages
    pub fn time_range(&self) -> Option<TimeRange> {
        self.document
            .pages
            .iter()
            .filter_map(|page| page.bounds())
            .reduce(|all, page| all.union(&page))
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.path.display())?;
        if let Some(title) = self.document.title() {
            writeln!(f, "  title:    {}", title)?;
        }
        if let Some(artist) = self.document.artist() {
            writeln!(f, "  artist:   {}", artist)?;
        }
        writeln!(f, "  styles:   {}", self.document.styles.len())?;
        writeln!(f, "  pages:    {}", self.document.pages.len())?;
        writeln!(f, "  lines:    {}", self.document.lines().filter(|line| !line.is_empty()).count())?;
        if let Some(range) = self.time_range() {
            writeln!(
                f,
                "  time:     {} - {}",
                format_timestamp(range.start.to_centis()),
                format_timestamp(range.end.to_centis())
            )?;
        }
        write!(f, "  warnings: {}", self.warnings.len())?;
        for warning in &self.warnings {
            write!(f, "\n    {}", warning)?;
        }
        Ok(())
    }
}

/// Counts of a folder run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderSummary {
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Main application controller for KBP to ASS conversion
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Parse and convert a source file to ASS text, nothing is written
    pub fn convert_file(&self, source: &Path) -> Result<String> {
        let text = FileManager::read_source(source)?;
        let (document, warnings) = KbpDocument::parse_with_warnings(&text)
            .map_err(ConversionError::from)
            .with_context(|| format!("Failed to parse {:?}", source))?;
        debug!("Parsed {:?} with {} warnings", source, warnings.len());

        AssConverter::new(self.config.options)
            .convert(&document)
            .with_context(|| format!("Failed to convert {:?}", source))
    }

    /// Convert one file, returns the path written
    pub fn run(&self, source: PathBuf, destination: Option<PathBuf>, force_overwrite: bool) -> Result<PathBuf> {
        let start_time = Instant::now();
        if !FileManager::file_exists(&source) {
            return Err(anyhow!("Source file does not exist: {:?}", source));
        }

        let destination = destination.unwrap_or_else(|| FileManager::generate_output_path(&source));
        if destination.exists() && !force_overwrite {
            return Err(anyhow!(
                "Output file already exists: {:?} (use -f to force overwrite)",
                destination
            ));
        }

        // Fully converted before anything touches the destination
        let script = self.convert_file(&source)?;
        FileManager::write_ass(&destination, &script)?;

        info!(
            "Success: {} ({})",
            destination.display(),
            Self::format_duration(start_time.elapsed())
        );
        Ok(destination)
    }

    /// Convert every KBP file below a directory, next to its source.
    /// Files that already have an ASS script are skipped unless forced.
    pub fn run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<FolderSummary> {
        let start_time = Instant::now();
        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let sources = FileManager::find_files(&input_dir, SOURCE_EXTENSION)?;
        if sources.is_empty() {
            return Err(anyhow!("No .{} files found in directory: {:?}", SOURCE_EXTENSION, input_dir));
        }

        let progress = ProgressBar::new(sources.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress.set_style(style.progress_chars("#>-"));

        let mut summary = FolderSummary::default();
        for source in &sources {
            let file_name = source
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            progress.set_message(format!("Converting: {}", file_name));

            let destination = FileManager::generate_output_path(source);
            if destination.exists() && !force_overwrite {
                warn!("Skipping {}, {:?} already exists (use -f to force overwrite)", file_name, destination);
                summary.skipped += 1;
                progress.inc(1);
                continue;
            }

            match self.run(source.clone(), Some(destination), true) {
                Ok(_) => summary.converted += 1,
                Err(e) => {
                    error!("Error converting {}: {:#}", file_name, e);
                    summary.failed += 1;
                }
            }
            progress.inc(1);
        }
        progress.finish_with_message("Folder conversion complete");

        info!(
            "Folder conversion completed: {} converted, {} skipped, {} errors in {}",
            summary.converted,
            summary.skipped,
            summary.failed,
            Self::format_duration(start_time.elapsed())
        );
        Ok(summary)
    }

    /// Parse a file and report what was found
    pub fn check(&self, source: &Path) -> Result<CheckReport> {
        let text = FileManager::read_source(source)?;
        let (document, warnings) = KbpDocument::parse_with_warnings(&text)
            .map_err(ConversionError::from)
            .with_context(|| format!("Failed to parse {:?}", source))?;
        Ok(CheckReport {
            path: source.to_path_buf(),
            document,
            warnings,
        })
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;

        if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
