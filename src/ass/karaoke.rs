/*!
 * Karaoke text generation.
 *
 * Turns a resolved line into the text field of a `Dialogue:` event: an
 * override block for layout and fades, followed by one `\k`/`\kf` timing
 * directive per syllable. All arithmetic is on whole centiseconds.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ass::document::format_number;
use crate::ass::layout::ResolvedLine;
use crate::kbp::model::{Line, Millis, Style};

// @const: Wipe codes below this sweep smoothly (`\kf`), others switch at once (`\k`)
pub const SMOOTH_WIPE_LIMIT: u32 = 5;

static BRACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"([{}])").unwrap());

/// Event timing and text of one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KaraokeEvent {
    pub start: i64,
    pub end: i64,
    pub text: String,
}

// @returns: Offset-shifted time in centiseconds, never negative
pub fn shifted_centis(time: Millis, offset_ms: i64) -> i64 {
    time.shifted(offset_ms).to_centis().max(0)
}

/// Escape override braces in lyrics
pub fn escape_text(text: &str) -> String {
    BRACE_REGEX.replace_all(text, r"\$1").into_owned()
}

/// Shrink fades that do not fit the event, keeping their ratio
pub fn scale_fades(fade_in: i64, fade_out: i64, duration_ms: i64) -> (i64, i64) {
    let duration_ms = duration_ms.max(0);
    let total = fade_in + fade_out;
    if total <= duration_ms || total == 0 {
        return (fade_in, fade_out);
    }
    (fade_in * duration_ms / total, fade_out * duration_ms / total)
}

/// Syllable timing directives for a line that starts at `line_start` (cs)
pub fn karaoke_tags(line: &Line, style: &Style, line_start: i64, offset_ms: i64) -> String {
    let mut text = String::new();
    let mut cursor = line_start;
    let mut syllables = line.syllables.iter().peekable();

    while let Some(syllable) = syllables.next() {
        let start = shifted_centis(syllable.start, offset_ms).max(cursor);
        let end = shifted_centis(syllable.end, offset_ms).max(start);

        if start > cursor {
            text.push_str(&format!("{{\\k{}}}", start - cursor));
        }

        // One centisecond gaps are rounding noise, fold them into this syllable
        let mut duration = end - start;
        if let Some(next) = syllables.peek() {
            if shifted_centis(next.start, offset_ms) - end == 1 {
                duration += 1;
            }
        }

        let tag = if syllable.wipe < SMOOTH_WIPE_LIMIT { "kf" } else { "k" };
        text.push_str(&format!("{{\\{}{}}}", tag, duration));
        text.push_str(&escape_text(&style.capitals.apply(&syllable.text)));
        cursor = start + duration;
    }
    text
}

/// Override block for layout, font size, rotation and fades
pub fn override_block(resolved: &ResolvedLine, fade_in: i64, fade_out: i64) -> String {
    let (align, x, y) = resolved.placement.anchor();
    let mut tags = Vec::new();
    if let Some(align) = align {
        tags.push(format!("\\an{}", align));
    }
    tags.push(format!("\\pos({},{})", format_number(x), format_number(y)));
    if let Some(size) = resolved.font_size {
        tags.push(format!("\\fs{}", format_number(size)));
    }
    if resolved.rotation != 0 {
        tags.push(format!("\\frz{}", resolved.rotation));
    }
    if fade_in != 0 || fade_out != 0 {
        tags.push(format!("\\fad({},{})", fade_in, fade_out));
    }
    format!("{{{}}}", tags.concat())
}

/// Build the event for one resolved line
pub fn line_event(resolved: &ResolvedLine, offset_ms: i64, fade_in: i64, fade_out: i64) -> KaraokeEvent {
    let range = resolved.line.visible_range();
    let start = shifted_centis(range.start, offset_ms);
    let end = shifted_centis(range.end, offset_ms).max(start);
    let (fade_in, fade_out) = scale_fades(fade_in, fade_out, (end - start) * 10);

    let body = if resolved.line.style.fixed {
        escape_text(&resolved.style.capitals.apply(&resolved.line.text()))
    } else {
        karaoke_tags(resolved.line, resolved.style, start, offset_ms)
    };

    KaraokeEvent {
        start,
        end,
        text: format!("{}{}", override_block(resolved, fade_in, fade_out), body),
    }
}
