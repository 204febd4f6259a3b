/*!
 * Builds a `KbpDocument` from a record stream.
 *
 * Records are applied one by one. References that can only be checked
 * once the whole header is known (palette indices, style letters) are
 * resolved in `finish`.
 */

use log::{debug, warn};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::errors::FormatError;
use crate::kbp::model::{
    Alignment, Capitals, FontStyle, Image, KbpColor, KbpDocument, Line, Margins, Millis, OtherSettings, Page,
    PaletteColor, PositionHint, Style, StyleRef, Syllable, TimeRange, TrackInfoEntry, Transitions,
};
use crate::kbp::records::{
    tokenize, LineHeaderRecord, Located, ParseWarning, Record, RecordStream, StyleRecord, SyllableRecord,
};

// @struct: Line waiting for its syllables
struct OpenLine {
    source_line: usize,
    header: LineHeaderRecord,
    syllables: Vec<(usize, Syllable)>,
}

// @struct: Style letter to check against the finished style table
struct PendingStyle {
    source_line: usize,
    page: usize,
    line: usize,
    letter: Option<char>,
}

/// Accumulates records into a document
#[derive(Default)]
pub struct DocumentBuilder {
    palette: Option<(usize, Vec<KbpColor>)>,
    styles: BTreeMap<u8, (usize, StyleRecord)>,
    margins: Margins,
    other: Option<(usize, OtherSettings)>,
    track_info: Vec<TrackInfoEntry>,
    pages: Vec<Page>,
    page: Option<Page>,
    line: Option<OpenLine>,
    pending: Vec<PendingStyle>,
    images: Vec<Image>,
    warnings: Vec<ParseWarning>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from a whole record stream
    pub fn build(stream: RecordStream) -> Result<(KbpDocument, Vec<ParseWarning>), FormatError> {
        let mut builder = DocumentBuilder::new();
        builder.warnings = stream.warnings;
        for located in stream.records {
            builder.apply(located)?;
        }
        builder.finish()
    }

    pub fn apply(&mut self, located: Located) -> Result<(), FormatError> {
        let Located { line, record } = located;
        match record {
            Record::Palette(colors) => self.palette(line, colors),
            Record::Style(style) => {
                self.style(line, style);
                Ok(())
            }
            Record::Margins { left, right, top, spacing } => {
                self.margins = Margins { left, right, top, spacing };
                Ok(())
            }
            Record::Other { border_color, wipe_detail } => {
                self.other = Some((line, OtherSettings { border_color, wipe_detail }));
                Ok(())
            }
            Record::TrackInfo { key, value } => {
                self.track_info.retain(|entry| entry.key != key);
                self.track_info.push(TrackInfoEntry { key, value });
                Ok(())
            }
            Record::PageStart => {
                self.page = Some(Page::default());
                Ok(())
            }
            Record::Transition { remove, display } => {
                let page = self.page_mut(line, "FX/remove/display")?;
                page.transitions = Transitions { remove, display };
                Ok(())
            }
            Record::LineHeader(header) => self.open_line(line, header),
            Record::Syllable(syllable) => self.syllable(line, syllable),
            Record::LineEnd => self.close_line(),
            Record::PageEnd => self.close_page(line),
            Record::Image(image) => {
                self.images.push(Image {
                    start: Millis::from_centis(image.start),
                    end: Millis::from_centis(image.end),
                    filename: image.filename,
                    leave_on_screen: image.leave_on_screen,
                });
                Ok(())
            }
        }
    }

    fn palette(&mut self, line: usize, colors: Vec<String>) -> Result<(), FormatError> {
        let palette = colors
            .iter()
            .map(|hex| {
                KbpColor::from_hex(hex)
                    .ok_or_else(|| FormatError::new(line, "invalid palette colour", hex.as_str(), "three hex digits (RGB)"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.palette = Some((line, palette));
        Ok(())
    }

    fn style(&mut self, line: usize, style: StyleRecord) {
        if let Some((previous, _)) = self.styles.get(&style.slot) {
            let message = format!("style {} already defined on line {}, using the later definition", style.slot, previous);
            self.warnings.push(ParseWarning::new(line, message));
        }
        self.styles.insert(style.slot, (line, style));
    }

    fn page_mut(&mut self, line: usize, found: &str) -> Result<&mut Page, FormatError> {
        self.page
            .as_mut()
            .ok_or_else(|| FormatError::new(line, "line record outside of a page", found, "a PAGEV2 page header before the first line"))
    }

    fn open_line(&mut self, line: usize, header: LineHeaderRecord) -> Result<(), FormatError> {
        self.page_mut(line, "line header")?;
        if header.end < header.start {
            return Err(FormatError::new(
                line,
                "line display ends before it starts",
                format!("{}/{}", header.start, header.end),
                "an end time not before the start time",
            ));
        }
        self.line = Some(OpenLine { source_line: line, header, syllables: Vec::new() });
        Ok(())
    }

    fn syllable(&mut self, line: usize, record: SyllableRecord) -> Result<(), FormatError> {
        let open = self.line.as_mut().ok_or_else(|| {
            FormatError::new(line, "syllable without a line header", record.text.as_str(), "a line header before the syllable")
        })?;
        open.syllables.push((
            line,
            Syllable {
                text: record.text,
                start: Millis::from_centis(record.start),
                end: Millis::from_centis(record.end),
                wipe: record.wipe,
            },
        ));
        Ok(())
    }

    fn close_line(&mut self) -> Result<(), FormatError> {
        let Some(open) = self.line.take() else {
            return Ok(());
        };

        let mut previous_end: Option<Millis> = None;
        for (source_line, syllable) in &open.syllables {
            if syllable.end < syllable.start {
                return Err(FormatError::new(
                    *source_line,
                    "syllable ends before it starts",
                    syllable.text.as_str(),
                    "an end time not before the start time",
                ));
            }
            if previous_end.is_some_and(|end| syllable.start < end) {
                return Err(FormatError::new(
                    *source_line,
                    "syllable starts before the previous one ends",
                    syllable.text.as_str(),
                    "syllables in chronological order",
                ));
            }
            previous_end = Some(syllable.end);
        }

        let header = open.header;
        let alignment = Alignment::from_code(header.alignment).unwrap_or(Alignment::Center);
        let page_index = self.pages.len();
        let page = self.page_mut(open.source_line, "line header")?;
        page.lines.push(Line {
            alignment,
            style: StyleRef::default(),
            display: TimeRange::new(Millis::from_centis(header.start), Millis::from_centis(header.end)),
            position: PositionHint::from_offsets(header.right, header.down),
            rotation: header.rotation,
            syllables: open.syllables.into_iter().map(|(_, syllable)| syllable).collect(),
        });
        let line_index = page.lines.len() - 1;

        self.pending.push(PendingStyle {
            source_line: open.source_line,
            page: page_index,
            line: line_index,
            letter: header.style,
        });
        Ok(())
    }

    fn close_page(&mut self, line: usize) -> Result<(), FormatError> {
        self.close_line()?;
        match self.page.take() {
            Some(page) => {
                if page.lines.is_empty() {
                    warn!("Page {} ending on line {} has no lines", self.pages.len() + 1, line);
                }
                self.pages.push(page);
            }
            None => {
                return Err(FormatError::new(line, "page end without a page", "divider", "a PAGEV2 page header"));
            }
        }
        Ok(())
    }

    /// Resolve deferred references and produce the document
    pub fn finish(mut self) -> Result<(KbpDocument, Vec<ParseWarning>), FormatError> {
        if self.page.is_some() {
            let line = self.line.as_ref().map_or(0, |open| open.source_line);
            self.close_page(line)?;
        }

        let (palette_line, palette) = self.palette.take().unwrap_or_default();

        let mut styles = BTreeMap::new();
        for (slot, (line, record)) in std::mem::take(&mut self.styles) {
            styles.insert(slot, resolve_style(line, record, &palette, palette_line)?);
        }

        let other = match self.other {
            Some((line, other)) => {
                if usize::from(other.border_color) >= palette.len() {
                    return Err(FormatError::new(
                        line,
                        "border colour is not in the palette",
                        other.border_color.to_string(),
                        format!("a palette index below {}", palette.len()),
                    ));
                }
                other
            }
            None => OtherSettings::default(),
        };

        let mut document = KbpDocument {
            palette,
            styles,
            margins: self.margins,
            other,
            track_info: self.track_info,
            pages: self.pages,
            images: self.images,
        };

        let default_slot = document.default_style_slot();
        for pending in &self.pending {
            let style = match pending.letter {
                Some(letter) => StyleRef::from_letter(letter),
                None => Some(StyleRef { slot: default_slot, fixed: false }),
            };
            let style = style
                .filter(|style| document.styles.contains_key(&style.slot))
                .ok_or_else(|| {
                    let found = match pending.letter {
                        Some(letter) => letter.to_string(),
                        None => "no style letter and no styles".to_string(),
                    };
                    FormatError::new(
                        pending.source_line,
                        "line refers to an undefined style",
                        found,
                        "a style letter defined in the 'Styles section",
                    )
                })?;
            document.pages[pending.page].lines[pending.line].style = style;
        }

        debug!(
            "Built document with {} styles, {} pages and {} lines",
            document.styles.len(),
            document.pages.len(),
            document.lines().count()
        );
        Ok((document, self.warnings))
    }
}

fn palette_color(index: u8, palette: &[KbpColor], line: usize, palette_line: usize) -> Result<PaletteColor, FormatError> {
    palette
        .get(usize::from(index))
        .map(|color| PaletteColor { index, color: *color })
        .ok_or_else(|| {
            FormatError::new(
                line,
                "style colour is not in the palette",
                index.to_string(),
                format!("a palette index below {} (palette on line {})", palette.len(), palette_line),
            )
        })
}

fn resolve_style(line: usize, record: StyleRecord, palette: &[KbpColor], palette_line: usize) -> Result<Style, FormatError> {
    let [text, outline, text_wipe, outline_wipe] = record.colors;
    let capitals = Capitals::from_code(&record.capitals)
        .ok_or_else(|| FormatError::new(line, "invalid capitalisation mode", record.capitals.as_str(), "N, U or L"))?;

    Ok(Style {
        slot: record.slot,
        name: record.name,
        text_color: palette_color(text, palette, line, palette_line)?,
        outline_color: palette_color(outline, palette, line, palette_line)?,
        text_wipe_color: palette_color(text_wipe, palette, line, palette_line)?,
        outline_wipe_color: palette_color(outline_wipe, palette, line, palette_line)?,
        font_name: record.font_name,
        font_size: record.font_size,
        font_style: FontStyle::from_letters(&record.font_style),
        charset: record.charset,
        outlines: record.outlines,
        shadows: record.shadows,
        wipe_style: record.wipe_style,
        capitals,
    })
}

impl KbpDocument {
    /// Parse KBP project text
    pub fn parse(text: &str) -> Result<Self, FormatError> {
        Self::parse_with_warnings(text).map(|(document, _)| document)
    }

    /// Parse KBP project text, also returning what was skipped
    pub fn parse_with_warnings(text: &str) -> Result<(Self, Vec<ParseWarning>), FormatError> {
        let stream = tokenize(text)?;
        debug!("Tokenized {} records", stream.records.len());
        DocumentBuilder::build(stream)
    }
}

impl FromStr for KbpDocument {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
