/*!
 * Layout and style resolution.
 *
 * Maps KBP styles and lines onto the ASS canvas: font sizes, positions,
 * colours, border treatment and the time offset. Everything here is
 * computed from the document and the options alone, so resolving the same
 * input twice gives the same result.
 */

use log::debug;
use std::fmt;

use crate::app_config::{AssOptions, MAX_OFFSET_MS};
use crate::ass::document::AssStyle;
use crate::errors::{ConfigurationError, ConversionError, ResolutionError};
use crate::kbp::model::{Alignment, KbpColor, KbpDocument, Line, PaletteColor, Style};

/// Width of the KBP source canvas
pub const SOURCE_WIDTH: f64 = 300.0;
/// Height of the KBP source canvas
pub const SOURCE_HEIGHT: f64 = 216.0;
/// KBP point sizes to ASS pixel sizes
pub const FONT_SCALE: f64 = 1.4;
/// Pages with up to this many lines keep the full font size
pub const LINES_AT_FULL_SIZE: usize = 4;
pub const MIN_FONT_SIZE: f64 = 8.0;
pub const LINE_HEIGHT: f64 = 19.0;
pub const TOP_PADDING: f64 = 12.0;
pub const SIDE_PADDING: f64 = 6.0;
pub const BOX_PADDING: f64 = 2.0;

// @const: Top-center, the anchor every generated style uses
pub const STYLE_ALIGNMENT: u8 = 8;

const ALPHA_OPAQUE: u8 = 0x00;
const ALPHA_HALF: u8 = 0x80;
const ALPHA_CLEAR: u8 = 0xFF;

/// An ASS `&HAABBGGRR` colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssColor {
    pub alpha: u8,
    pub blue: u8,
    pub green: u8,
    pub red: u8,
}

impl AssColor {
    pub fn opaque(color: KbpColor) -> Self {
        let (red, green, blue) = color.to_rgb8();
        AssColor { alpha: ALPHA_OPAQUE, blue, green, red }
    }

    pub fn with_alpha(self, alpha: u8) -> Self {
        AssColor { alpha, ..self }
    }
}

impl fmt::Display for AssColor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "&H{:02X}{:02X}{:02X}{:02X}", self.alpha, self.blue, self.green, self.red)
    }
}

/// Where a resolved line is drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    // @placement: Stacked by line index on the page
    Positioned { align: Option<u8>, x: f64, y: f64 },
    // @placement: The fixed target anchor, shifted by the line's own offsets
    Anchored { align: Option<u8>, x: f64, y: f64 },
}

impl Placement {
    // @returns: `\an` override and `\pos` point
    pub fn anchor(&self) -> (Option<u8>, f64, f64) {
        match *self {
            Placement::Positioned { align, x, y } | Placement::Anchored { align, x, y } => (align, x, y),
        }
    }
}

/// A line with every layout decision made
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLine<'a> {
    pub line: &'a Line,
    pub style: &'a Style,
    pub style_name: String,
    // @field: 1-based page number
    pub page: usize,
    // @field: 0-based index within the page, empty lines included
    pub index: usize,
    // @field: `\fs` override, None when the style size applies
    pub font_size: Option<f64>,
    pub placement: Placement,
    pub rotation: i32,
}

/// Everything the emitter needs
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedScript<'a> {
    pub title: Option<String>,
    pub play_res_x: i64,
    pub play_res_y: i64,
    pub styles: Vec<AssStyle>,
    pub lines: Vec<ResolvedLine<'a>>,
    pub offset_ms: i64,
    pub fade_in: i64,
    pub fade_out: i64,
}

/// Resolves a document against a set of options
pub struct LayoutResolver<'a> {
    document: &'a KbpDocument,
    options: AssOptions,
    scale_x: f64,
    scale_y: f64,
}

impl<'a> LayoutResolver<'a> {
    // @creates: Resolver, rejects invalid options up front
    pub fn new(document: &'a KbpDocument, options: &AssOptions) -> Result<Self, ConversionError> {
        options.validate()?;
        Ok(LayoutResolver {
            document,
            options: *options,
            scale_x: options.target_x as f64 / SOURCE_WIDTH,
            scale_y: options.target_y as f64 / SOURCE_HEIGHT,
        })
    }

    pub fn resolve(&self) -> Result<ResolvedScript<'a>, ConversionError> {
        let styles: Vec<AssStyle> = self.document.styles.values().map(|style| self.style(style)).collect();

        let mut lines = Vec::new();
        for (page_index, page) in self.document.pages.iter().enumerate() {
            if page.lines.is_empty() {
                return Err(ResolutionError::EmptyPage { page: page_index + 1 }.into());
            }
            let line_scale = self.line_scale(page.lines.len());

            for (index, line) in page.lines.iter().enumerate() {
                let style = self.document.style(line.style.slot).ok_or(ResolutionError::UnknownStyle {
                    page: page_index + 1,
                    line: index + 1,
                    slot: line.style.slot,
                })?;
                if line.is_empty() {
                    continue;
                }

                let base_size = self.style_font_size(style);
                let font_size = if self.options.float_font {
                    let size = (base_size * line_scale).max(MIN_FONT_SIZE).min(base_size);
                    (round2(size) != round2(base_size)).then_some(round2(size))
                } else {
                    None
                };

                lines.push(ResolvedLine {
                    line,
                    style,
                    style_name: style_name(style),
                    page: page_index + 1,
                    index,
                    font_size,
                    placement: self.placement(line, index, line_scale),
                    rotation: line.rotation,
                });
            }
        }

        // Declared offsets are not covered by AssOptions::validate
        let offset_ms = self.options.offset.resolve(self.document.sync_offset_ms());
        if !(-MAX_OFFSET_MS..=MAX_OFFSET_MS).contains(&offset_ms) {
            return Err(ConfigurationError::OffsetOutOfRange { value: offset_ms, limit: MAX_OFFSET_MS }.into());
        }
        debug!(
            "Resolved {} styles and {} lines on a {}x{} canvas, offset {}ms",
            styles.len(),
            lines.len(),
            self.options.target_x,
            self.options.target_y,
            offset_ms
        );

        Ok(ResolvedScript {
            title: self.document.title().map(str::to_string),
            play_res_x: self.options.target_x,
            play_res_y: self.options.target_y,
            styles,
            lines,
            offset_ms,
            fade_in: self.options.fade_in,
            fade_out: self.options.fade_out,
        })
    }

    // @returns: Factor applied to crowded pages, 1 when float_font is off
    fn line_scale(&self, lines_on_page: usize) -> f64 {
        if !self.options.float_font || lines_on_page <= LINES_AT_FULL_SIZE {
            1.0
        } else {
            LINES_AT_FULL_SIZE as f64 / lines_on_page as f64
        }
    }

    fn style_font_size(&self, style: &Style) -> f64 {
        if self.options.float_font {
            style.font_size as f64 * FONT_SCALE * self.scale_y
        } else {
            style.font_size as f64
        }
    }

    fn color(&self, color: PaletteColor) -> AssColor {
        let resolved = AssColor::opaque(color.color);
        if self.options.transparency && color.index == 0 {
            resolved.with_alpha(ALPHA_CLEAR)
        } else {
            resolved
        }
    }

    fn style(&self, style: &Style) -> AssStyle {
        let margins = &self.document.margins;
        let mut secondary = self.color(style.text_color);
        if self.options.transparency && secondary.alpha != ALPHA_CLEAR {
            secondary = secondary.with_alpha(ALPHA_HALF);
        }

        let (border_style, outline, shadow, outline_color, back_color) = if self.options.border {
            (
                1,
                style.outlines.iter().sum::<i32>() as f64 / 4.0 * self.scale_y,
                style.shadows.iter().sum::<i32>() as f64 / 2.0 * self.scale_y,
                self.color(style.outline_color),
                self.color(style.outline_wipe_color),
            )
        } else {
            let border = self.border_color();
            (3, BOX_PADDING * self.scale_y, 0.0, border, border)
        };

        AssStyle {
            name: style_name(style),
            font_name: style.font_name.clone(),
            font_size: round2(self.style_font_size(style)),
            primary: self.color(style.text_wipe_color),
            secondary,
            outline_color,
            back_color,
            bold: style.font_style.bold,
            italic: style.font_style.italic,
            underline: style.font_style.underline,
            strikeout: style.font_style.strikeout,
            border_style,
            outline: round2(outline),
            shadow: round2(shadow),
            alignment: STYLE_ALIGNMENT,
            margin_l: (margins.left as f64 * self.scale_x).round() as i64,
            margin_r: (margins.right as f64 * self.scale_x).round() as i64,
            margin_v: (margins.top as f64 * self.scale_y).round() as i64,
            encoding: style.charset,
        }
    }

    // @returns: Opaque box colour, falls back to black outside the palette
    fn border_color(&self) -> AssColor {
        let color = self
            .document
            .palette
            .get(usize::from(self.document.other.border_color))
            .copied()
            .unwrap_or_default();
        AssColor::opaque(color)
    }

    fn placement(&self, line: &Line, index: usize, line_scale: f64) -> Placement {
        let (right, down) = line.position.offsets();
        let margins = &self.document.margins;
        let align = match line.alignment {
            Alignment::Left => Some(7),
            Alignment::Center => None,
            Alignment::Right => Some(9),
        };

        if self.options.float_pos {
            let y = margins.top as f64
                + index as f64 * (margins.spacing as f64 + LINE_HEIGHT * line_scale)
                + TOP_PADDING
                + down as f64;
            let x = match line.alignment {
                Alignment::Left => margins.left as f64 + SIDE_PADDING,
                Alignment::Center => SOURCE_WIDTH / 2.0,
                Alignment::Right => SOURCE_WIDTH - margins.right as f64 - SIDE_PADDING,
            } + right as f64;
            return Placement::Positioned {
                align,
                x: round2(x * self.scale_x),
                y: round2(y * self.scale_y),
            };
        }

        Placement::Anchored {
            align,
            x: round2(self.options.target_x as f64 + right as f64 * self.scale_x),
            y: round2(self.options.target_y as f64 + down as f64 * self.scale_y),
        }
    }
}

/// ASS style name of a KBP style, `StyleNN_<name>`
pub fn style_name(style: &Style) -> String {
    format!("Style{:02}_{}", style.slot, style.name.replace(',', ";"))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
