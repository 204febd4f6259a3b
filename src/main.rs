// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{debug, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use kbp2ass::app_config::{self, Config, Offset};
use kbp2ass::app_controller::Controller;

// @const: Configuration file looked up when none is given
const DEFAULT_CONFIG_PATH: &str = "kbp2ass.json";

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a KBP file and report what was found, without converting it
    Check {
        /// KBP file to check
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print the parsed document as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions for kbp2ass
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// kbp2ass - Karaoke Builder Studio project to ASS subtitle converter
#[derive(Parser, Debug)]
#[command(name = "kbp2ass")]
#[command(version)]
#[command(about = "Convert KBP karaoke projects to ASS subtitles")]
#[command(long_about = "kbp2ass converts Karaoke Builder Studio (.kbp) projects into Advanced SubStation Alpha (.ass) karaoke scripts.

EXAMPLES:
    kbp2ass song.kbp                          # Write song.ass next to the source
    kbp2ass song.kbp out/song.ass             # Choose the output file
    kbp2ass --no-border --float-pos song.kbp  # Opaque boxes, explicit positions
    kbp2ass --target-x 1920 --target-y 1080 song.kbp
    kbp2ass --offset -150 song.kbp            # Shift everything 150ms earlier
    kbp2ass -f /karaoke/                      # Convert every .kbp file in a folder
    kbp2ass check song.kbp                    # Report parse warnings
    kbp2ass completions bash > kbp2ass.bash   # Generate bash completions

CONFIGURATION:
    Options are read from kbp2ass.json when it exists, or from the file given
    with --config. Command line flags override the file.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// KBP file or directory to convert
    #[arg(value_name = "SOURCE")]
    source: Option<PathBuf>,

    /// Output file, defaults to the source with an .ass extension
    #[arg(value_name = "DEST")]
    destination: Option<PathBuf>,

    /// Outline text (default)
    #[arg(long, overrides_with = "no_border")]
    border: bool,

    /// Draw an opaque box behind the text instead of an outline
    #[arg(long, overrides_with = "border")]
    no_border: bool,

    /// Shrink the font on crowded pages (default)
    #[arg(long, overrides_with = "no_float_font")]
    float_font: bool,

    /// Use the declared font sizes unchanged
    #[arg(long, overrides_with = "float_font")]
    no_float_font: bool,

    /// Give every line an explicit position
    #[arg(long, overrides_with = "no_float_pos")]
    float_pos: bool,

    /// Place every line at the --target-x/--target-y anchor (default)
    #[arg(long, overrides_with = "float_pos")]
    no_float_pos: bool,

    /// Make the background colour and unsung text see-through (default)
    #[arg(long, overrides_with = "no_transparency")]
    transparency: bool,

    /// Render every colour opaque
    #[arg(long, overrides_with = "transparency")]
    no_transparency: bool,

    /// Output canvas width and x of the fixed anchor
    #[arg(long, value_name = "PIXELS")]
    target_x: Option<i64>,

    /// Output canvas height and y of the fixed anchor
    #[arg(long, value_name = "PIXELS")]
    target_y: Option<i64>,

    /// Fade in duration in milliseconds
    #[arg(long, value_name = "MS")]
    fade_in: Option<i64>,

    /// Fade out duration in milliseconds
    #[arg(long, value_name = "MS")]
    fade_out: Option<i64>,

    /// Time shift: auto (from the project), none, or milliseconds
    #[arg(long, value_name = "auto|none|MS", allow_hyphen_values = true)]
    offset: Option<Offset>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,
}

// @returns: Explicit choice of a --x/--no-x pair, if any
fn flag_pair(yes: bool, no: bool) -> Option<bool> {
    match (yes, no) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour and tag for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "ERROR"),
            Level::Warn => ("\x1B[1;33m", "WARN "),
            Level::Info => ("\x1B[1;32m", "INFO "),
            Level::Debug => ("\x1B[1;36m", "DEBUG"),
            Level::Trace => ("\x1B[1;35m", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, tag) = Self::style_for_level(record.level());
            let _ = writeln!(std::io::stderr(), "{}{} {} {}\x1B[0m", color, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn main() -> Result<()> {
    // Upper bound for the logger, narrowed once the config is loaded
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();
    if let Some(level) = &cli.log_level {
        log::set_max_level(level_filter(&level.clone().into()));
    }

    match &cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(*shell, &mut cmd, "kbp2ass", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Check { file, json }) => {
            let controller = Controller::with_config(load_config(&cli)?)?;
            let report = controller.check(file)?;
            if *json {
                let dump = serde_json::to_string_pretty(&report.document)
                    .context("Failed to serialize document to JSON")?;
                println!("{}", dump);
            } else {
                println!("{}", report);
            }
            Ok(())
        }
        None => run_convert(&cli),
    }
}

// @returns: Config file values with command line overrides applied
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::from_file(DEFAULT_CONFIG_PATH)?,
        None => {
            debug!("No {} found, using default options", DEFAULT_CONFIG_PATH);
            Config::default()
        }
    };

    let options = &mut config.options;
    if let Some(border) = flag_pair(cli.border, cli.no_border) {
        options.border = border;
    }
    if let Some(float_font) = flag_pair(cli.float_font, cli.no_float_font) {
        options.float_font = float_font;
    }
    if let Some(float_pos) = flag_pair(cli.float_pos, cli.no_float_pos) {
        options.float_pos = float_pos;
    }
    if let Some(transparency) = flag_pair(cli.transparency, cli.no_transparency) {
        options.transparency = transparency;
    }
    if let Some(target_x) = cli.target_x {
        options.target_x = target_x;
    }
    if let Some(target_y) = cli.target_y {
        options.target_y = target_y;
    }
    if let Some(fade_in) = cli.fade_in {
        options.fade_in = fade_in;
    }
    if let Some(fade_out) = cli.fade_out {
        options.fade_out = fade_out;
    }
    if let Some(offset) = cli.offset {
        options.offset = offset;
    }

    match &cli.log_level {
        Some(level) => config.log_level = level.clone().into(),
        None => log::set_max_level(level_filter(&config.log_level)),
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

fn run_convert(cli: &CommandLineOptions) -> Result<()> {
    let source = cli
        .source
        .clone()
        .ok_or_else(|| anyhow!("SOURCE is required when no subcommand is specified"))?;
    let controller = Controller::with_config(load_config(cli)?)?;

    if source.is_file() {
        controller.run(source, cli.destination.clone(), cli.force_overwrite)?;
    } else if source.is_dir() {
        if cli.destination.is_some() {
            warn!("DEST is ignored in folder mode, scripts are written next to their sources");
        }
        let summary = controller.run_folder(source, cli.force_overwrite)?;
        if summary.failed > 0 {
            return Err(anyhow!("{} file(s) failed to convert", summary.failed));
        }
    } else {
        return Err(anyhow!("Source path does not exist: {:?}", source));
    }

    info!("Done");
    Ok(())
}
