/*!
 * Tokenizer for the KBP text format.
 *
 * Splits a project file into structural records (palette, styles, margins,
 * track information, pages, line headers, syllables, images). Each record
 * keeps the 1-based source line it came from so later stages can point at
 * the offending input.
 *
 * Layout of a project file:
 * - blocks are separated by a divider line of 29 dashes
 * - a block starts with its kind: `HEADERV2`, `PAGEV2` or `IMAGE`
 * - lines starting with `'` are comments, except inside a line where a
 *   syllable may start with an apostrophe
 */

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::errors::FormatError;
use crate::kbp::model::STYLE_SLOTS;

// @const: Block separator
pub const DIVIDER: &str = "-----------------------------";

// @const: Latest accepted time (1000 hours in centiseconds)
pub const MAX_TIME_CS: i64 = 360_000_000;

const LINE_HEADER_PATTERN: &str = "A/S/start/end/right/down/rotation with A one of L, C, R and S a style letter";
const SYLLABLE_PATTERN: &str = "text/start/end/wipe";

// @const: Line header, style letter and rotation are optional in legacy files
static LINE_HEADER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([LCR])/(?:([A-Za-z])/)?(\d+)/(\d+)/(-?\d+)/(-?\d+)(?:/(-?\d+))?$").unwrap()
});

// @const: Anything shaped like a syllable record
static SYLLABLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^/]*/ *\d+/\d+/\d+$").unwrap()
});

/// Unparsed style definition, colours are still palette indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRecord {
    pub slot: u8,
    pub name: String,
    // @field: Text, outline, text wipe, outline wipe
    pub colors: [u8; 4],
    pub font_name: String,
    pub font_size: u32,
    pub font_style: String,
    pub charset: u32,
    pub outlines: [i32; 4],
    pub shadows: [i32; 2],
    pub wipe_style: i32,
    pub capitals: String,
}

/// Line header fields in centiseconds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineHeaderRecord {
    pub alignment: char,
    // @field: None for legacy headers without a style letter
    pub style: Option<char>,
    pub start: i64,
    pub end: i64,
    pub right: i32,
    pub down: i32,
    pub rotation: i32,
}

/// Syllable fields in centiseconds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyllableRecord {
    pub text: String,
    pub start: i64,
    pub end: i64,
    pub wipe: u32,
}

/// Image fields in centiseconds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub start: i64,
    pub end: i64,
    pub filename: String,
    pub leave_on_screen: bool,
}

/// One structural element of a KBP file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Palette(Vec<String>),
    Style(StyleRecord),
    Margins { left: i32, right: i32, top: i32, spacing: i32 },
    Other { border_color: u8, wipe_detail: u32 },
    TrackInfo { key: String, value: String },
    PageStart,
    Transition { remove: String, display: String },
    LineHeader(LineHeaderRecord),
    Syllable(SyllableRecord),
    LineEnd,
    PageEnd,
    Image(ImageRecord),
}

/// Record tagged with its source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub line: usize,
    pub record: Record,
}

/// Something skipped while tokenizing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    pub line: usize,
    pub message: String,
}

impl ParseWarning {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        let warning = ParseWarning { line, message: message.into() };
        warn!("{}", warning);
        warning
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Records and warnings of one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStream {
    pub records: Vec<Located>,
    pub warnings: Vec<ParseWarning>,
}

/// Split project text into records
pub fn tokenize(text: &str) -> Result<RecordStream, FormatError> {
    Tokenizer::new(text).run()
}

// @struct: Line cursor over normalised text
struct Tokenizer {
    lines: Vec<String>,
    pos: usize,
    stream: RecordStream,
}

impl Tokenizer {
    fn new(text: &str) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let lines = text
            .replace("\r\n", "\n")
            .replace('\r', "\n")
            .split('\n')
            .map(|line| line.trim_end().to_string())
            .collect();

        Tokenizer {
            lines,
            pos: 0,
            stream: RecordStream::default(),
        }
    }

    // @returns: 1-based number of the line under the cursor
    fn line_no(&self) -> usize {
        self.pos + 1
    }

    fn current(&self) -> Option<&str> {
        self.lines.get(self.pos).map(|line| line.as_str())
    }

    fn push(&mut self, line: usize, record: Record) {
        self.stream.records.push(Located { line, record });
    }

    fn warn(&mut self, line: usize, message: impl Into<String>) {
        self.stream.warnings.push(ParseWarning::new(line, message));
    }

    fn run(mut self) -> Result<RecordStream, FormatError> {
        // Blank and comment lines keep the previous divider in effect
        let mut after_divider = false;

        while let Some(line) = self.current().map(str::to_string) {
            let line_no = self.line_no();

            if line == DIVIDER {
                after_divider = true;
                self.pos += 1;
                continue;
            }
            if line.is_empty() || line.starts_with('\'') {
                self.pos += 1;
                continue;
            }

            self.pos += 1;
            match line.as_str() {
                "HEADERV2" if after_divider => self.header()?,
                "PAGEV2" if after_divider => self.page(line_no)?,
                "IMAGE" if after_divider => self.images()?,
                other if LINE_HEADER_REGEX.is_match(other) || SYLLABLE_REGEX.is_match(other) => {
                    return Err(FormatError::new(
                        line_no,
                        "line record outside of a page",
                        other,
                        "a PAGEV2 page header before the first line",
                    ));
                }
                other if after_divider => {
                    self.warn(line_no, format!("skipping unsupported block '{}'", other));
                    self.skip_block();
                }
                other => {
                    self.warn(line_no, format!("skipping stray line '{}'", other));
                }
            }
            after_divider = false;
        }

        Ok(self.stream)
    }

    fn skip_block(&mut self) {
        while let Some(line) = self.current() {
            if line == DIVIDER {
                break;
            }
            self.pos += 1;
        }
    }

    // @returns: The data line following a header sub-section title
    fn value_line(&mut self, section: &str) -> Result<(usize, String), FormatError> {
        let line_no = self.line_no();
        match self.current() {
            Some(line) if line != DIVIDER && !line.trim().is_empty() => {
                let value = line.trim().to_string();
                self.pos += 1;
                Ok((line_no, value))
            }
            other => Err(FormatError::new(
                line_no,
                format!("missing {} values", section),
                other.unwrap_or("end of file"),
                format!("a line of comma separated {} values", section),
            )),
        }
    }

    fn header(&mut self) -> Result<(), FormatError> {
        while let Some(line) = self.current().map(str::to_string) {
            let line_no = self.line_no();
            if line == DIVIDER {
                break;
            }
            self.pos += 1;

            if line.starts_with("'Palette Colours") {
                let (value_no, value) = self.value_line("palette")?;
                let colors = value.split(',').map(|c| c.trim().to_string()).collect();
                self.push(value_no, Record::Palette(colors));
            } else if line.starts_with("'Styles") {
                self.styles(line_no)?;
            } else if line.starts_with("'Margins") {
                let (value_no, value) = self.value_line("margin")?;
                let [left, right, top, spacing] = parse_ints::<i32, 4>(&value, value_no, "left,right,top,spacing")?;
                self.push(value_no, Record::Margins { left, right, top, spacing });
            } else if line.starts_with("'Other") {
                let (value_no, value) = self.value_line("other")?;
                let [border_color, wipe_detail] = parse_ints::<u32, 2>(&value, value_no, "bordercolour,wipedetail")?;
                let border_color = u8::try_from(border_color).map_err(|_| {
                    FormatError::new(value_no, "border colour out of range", value.clone(), "a palette index")
                })?;
                self.push(value_no, Record::Other { border_color, wipe_detail });
            } else if line == "'--- Track Information ---" {
                self.track_info();
            } else if line.is_empty() || line.starts_with('\'') {
                continue;
            } else {
                self.warn(line_no, format!("skipping unrecognised header line '{}'", line));
            }
        }
        Ok(())
    }

    fn styles(&mut self, title_no: usize) -> Result<(), FormatError> {
        let mut body: Vec<(usize, String)> = Vec::new();
        loop {
            let line_no = self.line_no();
            match self.current().map(str::to_string) {
                Some(line) if line.trim() == "StyleEnd" => {
                    self.pos += 1;
                    break;
                }
                Some(line) if line != DIVIDER => {
                    self.pos += 1;
                    let trimmed = line.trim_start();
                    if !trimmed.starts_with('\'') {
                        body.push((line_no, trimmed.to_string()));
                    }
                }
                other => {
                    return Err(FormatError::new(
                        title_no,
                        "unterminated style block",
                        other.unwrap_or_else(|| "end of file".to_string()),
                        "StyleEnd",
                    ));
                }
            }
        }

        let mut n = 0;
        while n < body.len() {
            let (line_no, ref line) = body[n];
            if line.is_empty() {
                n += 1;
                continue;
            }
            if !line.starts_with("Style") {
                self.warn(line_no, format!("skipping unexpected style line '{}'", line));
                n += 1;
                continue;
            }
            let font = body.get(n + 1).filter(|(_, l)| !l.is_empty());
            let outline = body.get(n + 2).filter(|(_, l)| !l.is_empty());
            match (font, outline) {
                (Some(font), Some(outline)) => {
                    let record = parse_style((line_no, line.as_str()), (font.0, font.1.as_str()), (outline.0, outline.1.as_str()))?;
                    self.push(line_no, Record::Style(record));
                    n += 3;
                }
                _ => {
                    return Err(FormatError::new(
                        line_no,
                        "incomplete style definition",
                        line.clone(),
                        "three lines: StyleNN,name,colours / font,size,style,charset / outlines,shadows,wipe,capitals",
                    ));
                }
            }
        }
        Ok(())
    }

    fn track_info(&mut self) {
        let mut entries: Vec<(usize, String, String)> = Vec::new();
        while let Some(line) = self.current().map(str::to_string) {
            let line_no = self.line_no();
            if line == DIVIDER {
                break;
            }
            self.pos += 1;

            if line.starts_with(' ') && !line.trim().is_empty() {
                match entries.last_mut() {
                    Some((_, _, value)) => {
                        value.push('\n');
                        value.push_str(line.trim_start());
                    }
                    None => self.warn(line_no, "skipping continuation line without a field"),
                }
            } else if !line.is_empty() && !line.starts_with('\'') {
                let (key, value) = line.split_once(char::is_whitespace).unwrap_or((line.as_str(), ""));
                entries.push((line_no, key.to_lowercase(), value.trim().to_string()));
            }
        }

        for (line_no, key, value) in entries {
            self.push(line_no, Record::TrackInfo { key, value });
        }
    }

    fn page(&mut self, page_no: usize) -> Result<(), FormatError> {
        self.push(page_no, Record::PageStart);
        let mut open = false;

        while let Some(line) = self.current().map(str::to_string) {
            let line_no = self.line_no();
            if line == DIVIDER {
                break;
            }
            self.pos += 1;

            if !open && LINE_HEADER_REGEX.is_match(&line) {
                let header = parse_line_header(&line, line_no)?;
                self.push(line_no, Record::LineHeader(header));
                open = true;
            } else if line.is_empty() {
                if open {
                    self.push(line_no, Record::LineEnd);
                    open = false;
                }
            } else if !open && line.starts_with("FX/") {
                let mut fields = line.split('/').skip(1).map(str::to_string);
                let remove = fields.next().unwrap_or_default();
                let display = fields.next().unwrap_or_default();
                self.push(line_no, Record::Transition { remove, display });
            } else if open {
                let syllable = parse_syllable(&line, line_no)?;
                self.push(line_no, Record::Syllable(syllable));
            } else if line.starts_with('\'') {
                continue;
            } else {
                return Err(FormatError::new(
                    line_no,
                    "syllable without a line header",
                    line,
                    LINE_HEADER_PATTERN,
                ));
            }
        }

        let end_no = self.line_no();
        if open {
            self.push(end_no, Record::LineEnd);
        }
        self.push(end_no, Record::PageEnd);
        Ok(())
    }

    fn images(&mut self) -> Result<(), FormatError> {
        while let Some(line) = self.current().map(str::to_string) {
            let line_no = self.line_no();
            if line == DIVIDER {
                break;
            }
            self.pos += 1;
            if line.is_empty() || line.starts_with('\'') {
                continue;
            }

            let fields: Vec<&str> = line.split('/').collect();
            if fields.len() < 4 {
                return Err(FormatError::new(line_no, "malformed image record", line, "start/end/filename/leaveonscreen"));
            }
            let start = parse_time(fields[0], line_no, "image start time")?;
            let end = parse_time(fields[1], line_no, "image end time")?;
            let leave = parse_field::<i64>(fields[fields.len() - 1], line_no, "leave on screen flag")?;
            let filename = fields[2..fields.len() - 1].join("/");
            self.push(line_no, Record::Image(ImageRecord { start, end, filename, leave_on_screen: leave != 0 }));
        }
        Ok(())
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, line: usize, what: &str) -> Result<T, FormatError> {
    field
        .trim()
        .parse::<T>()
        .map_err(|_| FormatError::new(line, format!("invalid {}", what), field, format!("a number for the {}", what)))
}

// @returns: Centisecond time within 0..=MAX_TIME_CS
fn parse_time(field: &str, line: usize, what: &str) -> Result<i64, FormatError> {
    let time = parse_field::<i64>(field, line, what)?;
    if (0..=MAX_TIME_CS).contains(&time) {
        Ok(time)
    } else {
        Err(FormatError::new(
            line,
            format!("{} out of range", what),
            field,
            format!("centiseconds from 0 to {}", MAX_TIME_CS),
        ))
    }
}

fn parse_ints<T: std::str::FromStr + Copy + Default, const N: usize>(
    value: &str,
    line: usize,
    expected: &str,
) -> Result<[T; N], FormatError> {
    let fields: Vec<&str> = value.split(',').collect();
    if fields.len() != N {
        return Err(FormatError::new(line, format!("expected {} values", N), value, expected));
    }
    let mut out = [T::default(); N];
    for (slot, field) in out.iter_mut().zip(fields) {
        *slot = field
            .trim()
            .parse::<T>()
            .map_err(|_| FormatError::new(line, "invalid number", field, expected))?;
    }
    Ok(out)
}

fn parse_style(
    (name_no, name_line): (usize, &str),
    (font_no, font_line): (usize, &str),
    (outline_no, outline_line): (usize, &str),
) -> Result<StyleRecord, FormatError> {
    let fields: Vec<&str> = name_line.split(',').collect();
    if fields.len() < 6 {
        return Err(FormatError::new(name_no, "malformed style header", name_line, "StyleNN,name,text,outline,textwipe,outlinewipe"));
    }
    let slot = parse_field::<u8>(&fields[0]["Style".len()..], name_no, "style number")?;
    if slot >= STYLE_SLOTS {
        return Err(FormatError::new(
            name_no,
            "style number out of range",
            fields[0],
            format!("Style00 to Style{:02}", STYLE_SLOTS - 1),
        ));
    }
    let name = fields[1..fields.len() - 4].join(",");
    let colors = parse_ints::<u8, 4>(&fields[fields.len() - 4..].join(","), name_no, "four palette indices")?;

    // Font names may contain commas, the last three fields never do
    let font: Vec<&str> = font_line.rsplitn(4, ',').collect();
    if font.len() != 4 {
        return Err(FormatError::new(font_no, "malformed style font", font_line, "fontname,size,style,charset"));
    }
    let charset = parse_field::<u32>(font[0], font_no, "charset")?;
    let font_style = font[1].trim().to_string();
    let font_size = parse_field::<u32>(font[2], font_no, "font size")?;
    let font_name = font[3].trim().to_string();

    let outline: Vec<&str> = outline_line.split(',').collect();
    if outline.len() != 8 {
        return Err(FormatError::new(outline_no, "malformed style outline", outline_line, "L,R,T,B,shadowR,shadowD,wipe,capitals"));
    }
    let outlines = parse_ints::<i32, 4>(&outline[..4].join(","), outline_no, "four outline widths")?;
    let shadows = parse_ints::<i32, 2>(&outline[4..6].join(","), outline_no, "two shadow offsets")?;
    let wipe_style = parse_field::<i32>(outline[6], outline_no, "wipe style")?;
    let capitals = outline[7].trim().to_string();

    Ok(StyleRecord {
        slot,
        name,
        colors,
        font_name,
        font_size,
        font_style,
        charset,
        outlines,
        shadows,
        wipe_style,
        capitals,
    })
}

fn parse_line_header(line: &str, line_no: usize) -> Result<LineHeaderRecord, FormatError> {
    let caps = LINE_HEADER_REGEX
        .captures(line)
        .ok_or_else(|| FormatError::new(line_no, "malformed line header", line, LINE_HEADER_PATTERN))?;

    let number = |idx: usize, what: &str| -> Result<i64, FormatError> {
        caps.get(idx).map_or(Ok(0), |m| parse_time(m.as_str(), line_no, what))
    };
    let small = |idx: usize, what: &str| -> Result<i32, FormatError> {
        caps.get(idx).map_or(Ok(0), |m| parse_field::<i32>(m.as_str(), line_no, what))
    };

    Ok(LineHeaderRecord {
        alignment: caps[1].chars().next().unwrap_or('C'),
        style: caps.get(2).and_then(|m| m.as_str().chars().next()),
        start: number(3, "line start time")?,
        end: number(4, "line end time")?,
        right: small(5, "horizontal offset")?,
        down: small(6, "vertical offset")?,
        rotation: small(7, "rotation")?,
    })
}

fn parse_syllable(line: &str, line_no: usize) -> Result<SyllableRecord, FormatError> {
    let fields: Vec<&str> = line.split('/').collect();
    if fields.len() != 4 {
        return Err(FormatError::new(line_no, "malformed syllable", line, SYLLABLE_PATTERN));
    }

    // Only the start time may carry padding
    let start = fields[1].trim_start();
    for (field, what) in [(start, "syllable start"), (fields[2], "syllable end"), (fields[3], "wipe code")] {
        if field.is_empty() || !field.chars().all(|c| c.is_ascii_digit()) {
            return Err(FormatError::new(line_no, format!("invalid {}", what), line, SYLLABLE_PATTERN));
        }
    }

    Ok(SyllableRecord {
        text: fields[0].replace("{-}", "/"),
        start: parse_time(start, line_no, "syllable start")?,
        end: parse_time(fields[2], line_no, "syllable end")?,
        wipe: parse_field::<u32>(fields[3], line_no, "wipe code")?,
    })
}
