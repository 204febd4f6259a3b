/*!
 * ASS script model and serialisation.
 *
 * Only the three sections a karaoke script needs are modelled:
 * `[Script Info]`, `[V4+ Styles]` and `[Events]`. Output uses CRLF line
 * endings. The byte order mark is left to the file writer.
 */

use std::fmt;

use crate::ass::layout::AssColor;

pub const STYLE_FORMAT: &str = "Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, \
Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, \
MarginL, MarginR, MarginV, Encoding";

pub const EVENT_FORMAT: &str = "Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

const NEWLINE: &str = "\r\n";

/// One `Style:` line
#[derive(Debug, Clone, PartialEq)]
pub struct AssStyle {
    pub name: String,
    pub font_name: String,
    pub font_size: f64,
    pub primary: AssColor,
    pub secondary: AssColor,
    pub outline_color: AssColor,
    pub back_color: AssColor,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikeout: bool,
    // @field: 1 outline and shadow, 3 opaque box
    pub border_style: u8,
    pub outline: f64,
    pub shadow: f64,
    pub alignment: u8,
    pub margin_l: i64,
    pub margin_r: i64,
    pub margin_v: i64,
    pub encoding: u32,
}

impl fmt::Display for AssStyle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Style: {},{},{},{},{},{},{},{},{},{},{},100,100,0,0,{},{},{},{},{},{},{},{}",
            self.name,
            self.font_name,
            format_number(self.font_size),
            self.primary,
            self.secondary,
            self.outline_color,
            self.back_color,
            flag(self.bold),
            flag(self.italic),
            flag(self.underline),
            flag(self.strikeout),
            self.border_style,
            format_number(self.outline),
            format_number(self.shadow),
            self.alignment,
            self.margin_l,
            self.margin_r,
            self.margin_v,
            self.encoding
        )
    }
}

/// One `Dialogue:` event, times in centiseconds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialogue {
    pub layer: u32,
    pub start: i64,
    pub end: i64,
    pub style: String,
    pub margin_l: i64,
    pub margin_r: i64,
    pub margin_v: i64,
    pub effect: String,
    pub text: String,
}

impl fmt::Display for Dialogue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Dialogue: {},{},{},{},,{},{},{},{},{}",
            self.layer,
            format_timestamp(self.start),
            format_timestamp(self.end),
            self.style,
            self.margin_l,
            self.margin_r,
            self.margin_v,
            self.effect,
            self.text
        )
    }
}

/// A complete ASS script
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssDocument {
    // @field: Ordered `Key: value` pairs
    pub script_info: Vec<(String, String)>,
    pub styles: Vec<AssStyle>,
    pub events: Vec<Dialogue>,
}

impl AssDocument {
    pub fn info(&self, key: &str) -> Option<&str> {
        self.script_info
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Display for AssDocument {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[Script Info]{}", NEWLINE)?;
        for (key, value) in &self.script_info {
            write!(f, "{}: {}{}", key, value, NEWLINE)?;
        }

        write!(f, "{}[V4+ Styles]{}", NEWLINE, NEWLINE)?;
        write!(f, "Format: {}{}", STYLE_FORMAT, NEWLINE)?;
        for style in &self.styles {
            write!(f, "{}{}", style, NEWLINE)?;
        }

        write!(f, "{}[Events]{}", NEWLINE, NEWLINE)?;
        write!(f, "Format: {}{}", EVENT_FORMAT, NEWLINE)?;
        for event in &self.events {
            write!(f, "{}{}", event, NEWLINE)?;
        }
        Ok(())
    }
}

/// Format centiseconds as `H:MM:SS.CC`, negative times clamp to zero
pub fn format_timestamp(centis: i64) -> String {
    let centis = centis.max(0);
    let hours = centis / 360_000;
    let minutes = (centis % 360_000) / 6_000;
    let seconds = (centis % 6_000) / 100;
    let cs = centis % 100;
    format!("{}:{:02}:{:02}.{:02}", hours, minutes, seconds, cs)
}

/// Shortest decimal form with at most two fractional digits
pub fn format_number(value: f64) -> String {
    let text = format!("{:.2}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

fn flag(value: bool) -> i8 {
    if value { -1 } else { 0 }
}
