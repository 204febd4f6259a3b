/*!
 * Document model for KBP karaoke projects.
 *
 * A `KbpDocument` owns its pages, which own their lines, which own their
 * syllables. Lines refer to styles by slot number only, so the tree has no
 * back references and is plain data once built.
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Number of style slots a KBP project can address (`A` to `T`)
pub const STYLE_SLOTS: u8 = 20;

/// A point in time or a duration in whole milliseconds.
///
/// KBP stores centiseconds, ASS prints centiseconds, and everything in
/// between is exact integer arithmetic on this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millis(i64);

impl Millis {
    pub const ZERO: Millis = Millis(0);

    pub const fn from_millis(ms: i64) -> Self {
        Millis(ms)
    }

    pub const fn from_centis(cs: i64) -> Self {
        Millis(cs.saturating_mul(10))
    }

    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// Nearest centisecond, halves rounded up
    pub const fn to_centis(self) -> i64 {
        self.0.saturating_add(5).div_euclid(10)
    }

    pub const fn shifted(self, ms: i64) -> Self {
        Millis(self.0.saturating_add(ms))
    }
}

impl fmt::Display for Millis {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Closed time interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Millis,
    pub end: Millis,
}

impl TimeRange {
    pub fn new(start: Millis, end: Millis) -> Self {
        TimeRange { start, end }
    }

    /// Smallest range covering both
    pub fn union(&self, other: &TimeRange) -> TimeRange {
        TimeRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// 12-bit palette colour, one nibble per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct KbpColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl KbpColor {
    /// Parse the three hex digit `RGB` notation used by the palette line
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits: Vec<u8> = hex
            .chars()
            .map(|c| c.to_digit(16).map(|d| d as u8))
            .collect::<Option<Vec<u8>>>()?;

        match digits.as_slice() {
            [red, green, blue] => Some(KbpColor { red: *red, green: *green, blue: *blue }),
            _ => None,
        }
    }

    /// Channels widened to 8 bits (`F` becomes `FF`)
    pub fn to_rgb8(self) -> (u8, u8, u8) {
        (self.red * 17, self.green * 17, self.blue * 17)
    }
}

impl fmt::Display for KbpColor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:X}{:X}{:X}", self.red, self.green, self.blue)
    }
}

/// A colour reference resolved against the palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteColor {
    // @field: Palette slot, 0 is the background colour
    pub index: u8,
    pub color: KbpColor,
}

/// Font style letters (`B`old, `I`talic, `U`nderline, `S`trikeout)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FontStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikeout: bool,
}

impl FontStyle {
    pub fn from_letters(letters: &str) -> Self {
        let upper = letters.to_uppercase();
        FontStyle {
            bold: upper.contains('B'),
            italic: upper.contains('I'),
            underline: upper.contains('U'),
            strikeout: upper.contains('S'),
        }
    }
}

/// Capitalisation applied to a style's text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Capitals {
    #[default]
    None,
    Upper,
    Lower,
}

impl Capitals {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "N" | "n" => Some(Capitals::None),
            "U" | "u" => Some(Capitals::Upper),
            "L" | "l" => Some(Capitals::Lower),
            _ => None,
        }
    }

    pub fn apply(&self, text: &str) -> String {
        match self {
            Capitals::None => text.to_string(),
            Capitals::Upper => text.to_uppercase(),
            Capitals::Lower => text.to_lowercase(),
        }
    }
}

/// Named bundle of font and colour settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub slot: u8,
    pub name: String,
    // @field: Text before the wipe
    pub text_color: PaletteColor,
    pub outline_color: PaletteColor,
    // @field: Text after the wipe
    pub text_wipe_color: PaletteColor,
    pub outline_wipe_color: PaletteColor,
    pub font_name: String,
    pub font_size: u32,
    pub font_style: FontStyle,
    pub charset: u32,
    // @field: Left, right, top, bottom
    pub outlines: [i32; 4],
    // @field: Right, down
    pub shadows: [i32; 2],
    pub wipe_style: i32,
    pub capitals: Capitals,
}

/// Line reference to a style slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StyleRef {
    pub slot: u8,
    // @field: Lowercase style letter, the line is shown without a wipe
    pub fixed: bool,
}

impl StyleRef {
    /// Map a style letter (`A`..`T`, any case) to its slot
    pub fn from_letter(letter: char) -> Option<Self> {
        if !letter.is_ascii_alphabetic() {
            return None;
        }
        let fixed = letter.is_ascii_lowercase();
        let slot = letter.to_ascii_uppercase() as u8 - b'A';
        (slot < STYLE_SLOTS).then_some(StyleRef { slot, fixed })
    }

    pub fn letter(&self) -> char {
        let base = if self.fixed { b'a' } else { b'A' };
        (base + self.slot) as char
    }
}

/// Horizontal alignment of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl Alignment {
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'L' => Some(Alignment::Left),
            'C' => Some(Alignment::Center),
            'R' => Some(Alignment::Right),
            _ => None,
        }
    }
}

/// Where a line goes on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PositionHint {
    // @hint: Page layout decides
    #[default]
    Default,
    // @hint: Shift from the page layout in source pixels
    Offset { right: i32, down: i32 },
}

impl PositionHint {
    pub fn from_offsets(right: i32, down: i32) -> Self {
        if right == 0 && down == 0 {
            PositionHint::Default
        } else {
            PositionHint::Offset { right, down }
        }
    }

    pub fn offsets(&self) -> (i32, i32) {
        match self {
            PositionHint::Default => (0, 0),
            PositionHint::Offset { right, down } => (*right, *down),
        }
    }
}

/// One timed fragment of lyrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Syllable {
    pub text: String,
    pub start: Millis,
    pub end: Millis,
    // @field: Wipe code, below 5 wipes progressively
    pub wipe: u32,
}

impl Syllable {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A row of syllables shown together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub alignment: Alignment,
    pub style: StyleRef,
    // @field: When the line appears and disappears
    pub display: TimeRange,
    pub position: PositionHint,
    pub rotation: i32,
    pub syllables: Vec<Syllable>,
}

impl Line {
    /// Min start / max end of the syllables
    pub fn span(&self) -> Option<TimeRange> {
        let start = self.syllables.iter().map(|s| s.start).min()?;
        let end = self.syllables.iter().map(|s| s.end).max()?;
        Some(TimeRange::new(start, end))
    }

    /// Display window widened to cover every syllable
    pub fn visible_range(&self) -> TimeRange {
        match self.span() {
            Some(span) => self.display.union(&span),
            None => self.display,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self.syllables.as_slice() {
            [] => true,
            [only] => only.is_empty(),
            _ => false,
        }
    }

    pub fn text(&self) -> String {
        self.syllables.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Page transition effects from the `FX/` record
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Transitions {
    pub remove: String,
    pub display: String,
}

/// Lines displayed on screen together
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Page {
    pub transitions: Transitions,
    pub lines: Vec<Line>,
}

impl Page {
    /// Earliest start of a non-empty line to latest end of any line
    pub fn bounds(&self) -> Option<TimeRange> {
        let start = self
            .lines
            .iter()
            .filter(|line| !line.is_empty())
            .map(|line| line.visible_range().start)
            .min()?;
        let end = self.lines.iter().map(|line| line.visible_range().end).max()?;
        Some(TimeRange::new(start, end))
    }
}

/// Layout margins in source pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Margins {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub spacing: i32,
}

impl Default for Margins {
    fn default() -> Self {
        Margins { left: 2, right: 2, top: 7, spacing: 12 }
    }
}

/// The `'Other` header settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtherSettings {
    // @field: Palette slot of the border colour
    pub border_color: u8,
    pub wipe_detail: u32,
}

impl Default for OtherSettings {
    fn default() -> Self {
        OtherSettings { border_color: 0, wipe_detail: 3 }
    }
}

/// Background image shown between two times
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub start: Millis,
    pub end: Millis,
    pub filename: String,
    pub leave_on_screen: bool,
}

/// One `'--- Track Information ---` field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfoEntry {
    // @field: Lowercased field name
    pub key: String,
    pub value: String,
}

/// A parsed KBP project
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KbpDocument {
    pub palette: Vec<KbpColor>,
    pub styles: BTreeMap<u8, Style>,
    pub margins: Margins,
    pub other: OtherSettings,
    pub track_info: Vec<TrackInfoEntry>,
    pub pages: Vec<Page>,
    pub images: Vec<Image>,
}

impl KbpDocument {
    pub fn style(&self, slot: u8) -> Option<&Style> {
        self.styles.get(&slot)
    }

    /// Slot used by lines that do not name a style
    pub fn default_style_slot(&self) -> u8 {
        self.styles.keys().next().copied().unwrap_or(0)
    }

    /// Look up a track information field, case-insensitively
    pub fn track_info(&self, key: &str) -> Option<&str> {
        self.track_info
            .iter()
            .find(|entry| entry.key.eq_ignore_ascii_case(key))
            .map(|entry| entry.value.as_str())
    }

    pub fn title(&self) -> Option<&str> {
        self.track_info("title").filter(|title| !title.is_empty())
    }

    pub fn artist(&self) -> Option<&str> {
        self.track_info("artist").filter(|artist| !artist.is_empty())
    }

    /// Sync offset declared by the `Offset` track field, converted from centiseconds
    pub fn sync_offset_ms(&self) -> Option<i64> {
        self.track_info("offset")
            .and_then(|value| value.trim().parse::<i64>().ok())
            .map(|cs| Millis::from_centis(cs).as_millis())
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.pages.iter().flat_map(|page| page.lines.iter())
    }

    /// Plain lyrics, one line per row, pages joined by `page_separator`
    pub fn lyrics_text(&self, page_separator: &str, include_empty: bool) -> String {
        self.pages
            .iter()
            .map(|page| {
                page.lines
                    .iter()
                    .filter(|line| include_empty || !line.is_empty())
                    .map(|line| line.text())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .collect::<Vec<_>>()
            .join(&format!("\n{}\n", page_separator))
    }
}
