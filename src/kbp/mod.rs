/*!
 * KBP karaoke project reading.
 *
 * - `records`: line-level tokenizer
 * - `builder`: turns records into the document model
 * - `model`: the document model itself
 */

pub mod builder;
pub mod model;
pub mod records;

pub use builder::DocumentBuilder;
pub use model::{
    Alignment, Capitals, FontStyle, Image, KbpColor, KbpDocument, Line, Margins, Millis, OtherSettings, Page,
    PaletteColor, PositionHint, Style, StyleRef, Syllable, TimeRange, TrackInfoEntry, Transitions, STYLE_SLOTS,
};
pub use records::{tokenize, ParseWarning, Record, RecordStream};
