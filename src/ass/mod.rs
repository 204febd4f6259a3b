/*!
 * Conversion of KBP documents to ASS karaoke scripts.
 *
 * - `layout`: styles, sizes, positions and colours on the output canvas
 * - `karaoke`: timing directives and override tags of each event
 * - `document`: the ASS script model and its text form
 */

use log::debug;

use crate::app_config::AssOptions;
use crate::errors::ConversionError;
use crate::kbp::model::KbpDocument;

pub mod document;
pub mod karaoke;
pub mod layout;

pub use document::{AssDocument, AssStyle, Dialogue};
pub use layout::{AssColor, LayoutResolver, Placement, ResolvedLine, ResolvedScript};

// @const: Effect field of every generated event
pub const KARAOKE_EFFECT: &str = "karaoke";

/// Converts KBP documents with a fixed set of options
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AssConverter {
    options: AssOptions,
}

impl AssConverter {
    pub fn new(options: AssOptions) -> Self {
        AssConverter { options }
    }

    pub fn options(&self) -> &AssOptions {
        &self.options
    }

    /// Convert to ASS text with CRLF line endings
    pub fn convert(&self, document: &KbpDocument) -> Result<String, ConversionError> {
        Ok(self.build_document(document)?.to_string())
    }

    /// Convert to the ASS script model
    pub fn build_document(&self, document: &KbpDocument) -> Result<AssDocument, ConversionError> {
        let script = LayoutResolver::new(document, &self.options)?.resolve()?;

        let mut script_info = Vec::new();
        if let Some(title) = &script.title {
            script_info.push(("Title".to_string(), title.replace('\n', " ")));
        }
        for (key, value) in [
            ("ScriptType", "v4.00+".to_string()),
            ("WrapStyle", "0".to_string()),
            ("ScaledBorderAndShadow", "yes".to_string()),
            ("Collisions", "Normal".to_string()),
            ("PlayResX", script.play_res_x.to_string()),
            ("PlayResY", script.play_res_y.to_string()),
        ] {
            script_info.push((key.to_string(), value));
        }

        let mut events: Vec<Dialogue> = script
            .lines
            .iter()
            .map(|resolved| {
                let event = karaoke::line_event(resolved, script.offset_ms, script.fade_in, script.fade_out);
                Dialogue {
                    layer: 0,
                    start: event.start,
                    end: event.end,
                    style: resolved.style_name.clone(),
                    margin_l: 0,
                    margin_r: 0,
                    margin_v: 0,
                    effect: KARAOKE_EFFECT.to_string(),
                    text: event.text,
                }
            })
            .collect();

        // Stable, so ties keep page then line order
        events.sort_by_key(|event| event.start);
        debug!("Generated {} events", events.len());

        Ok(AssDocument {
            script_info,
            styles: script.styles,
            events,
        })
    }
}

/// Convert a document with the given options
pub fn convert(document: &KbpDocument, options: &AssOptions) -> Result<String, ConversionError> {
    AssConverter::new(*options).convert(document)
}
