/*!
 * Integration tests for the KBP to ASS conversion workflow
 */

use kbp2ass::app_config::{AssOptions, Offset};
use kbp2ass::ass::{convert, AssConverter};
use kbp2ass::errors::{ConfigurationError, ConversionError};
use kbp2ass::kbp::KbpDocument;
use crate::common;

fn event_lines(script: &str) -> Vec<&str> {
    script.split("\r\n").filter(|line| line.starts_with("Dialogue:")).collect()
}

/// Test the two syllable end-to-end example
#[test]
fn test_convert_withTwoSyllables_shouldEmitOneKaraokeEvent() {
    let document = KbpDocument::parse(&common::ka_ra_kbp()).unwrap();
    let script = convert(&document, &AssOptions::default()).unwrap();
    let events = event_lines(&script);

    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0],
        r"Dialogue: 0,0:00:00.00,0:00:01.00,Style00_Default,,0,0,0,karaoke,{\an7\pos(300,216)\fad(300,200)}{\kf50}Ka{\kf50}ra"
    );
}

/// Test the script sections and their order
#[test]
fn test_convert_sections_shouldFollowAssLayout() {
    let document = KbpDocument::parse(&common::ka_ra_kbp()).unwrap();
    let script = convert(&document, &AssOptions::default()).unwrap();

    let info = script.find("[Script Info]").unwrap();
    let styles = script.find("[V4+ Styles]").unwrap();
    let events = script.find("[Events]").unwrap();
    assert!(info < styles && styles < events);

    assert!(script.contains("Title: Test Song\r\n"));
    assert!(script.contains("ScriptType: v4.00+\r\n"));
    assert!(script.contains("WrapStyle: 0\r\n"));
    assert!(script.contains("ScaledBorderAndShadow: yes\r\n"));
    assert!(script.contains("Collisions: Normal\r\n"));
    assert!(script.contains("PlayResX: 300\r\nPlayResY: 216\r\n"));
    assert!(script.contains(
        "Style: Style00_Default,Arial,16.8,&H000088FF,&H80FFFFFF,&HFF000000,&H00FF0000,-1,0,0,0,100,100,0,0,1,2,0,8,2,2,7,0\r\n"
    ));
    assert!(script.contains("Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\r\n"));
    assert!(!script.replace("\r\n", "").contains('\n'));
}

/// Test a multi-page project with events ordered by start time
#[test]
fn test_convert_withSampleProject_shouldOrderEventsByStart() {
    let document = KbpDocument::parse(&common::sample_kbp()).unwrap();
    let script = convert(&document, &AssOptions::default()).unwrap();
    let events = event_lines(&script);

    assert_eq!(
        events,
        vec![
            r"Dialogue: 0,0:00:01.00,0:00:04.00,Style00_Default,,0,0,0,karaoke,{\pos(300,216)\fad(300,200)}{\kf50}Hel{\kf50}lo {\k10}{\kf190}world",
            r"Dialogue: 0,0:00:01.50,0:00:05.00,Style00_Default,,0,0,0,karaoke,{\an7\pos(305,213)\fad(300,200)}{\k10}{\kf101}sec{\kf189}ond",
            r"Dialogue: 0,0:00:06.00,0:00:09.00,Style00_Default,,0,0,0,karaoke,{\an9\pos(300,216)\fad(300,200)}fixed",
        ]
    );
}

/// Test that lines without floating positions sit at the target anchor
#[test]
fn test_convert_withFixedAnchor_shouldPositionEveryLineAtTarget() {
    let document = KbpDocument::parse(&common::ka_ra_kbp()).unwrap();
    let options = AssOptions { target_x: 150, target_y: 100, ..AssOptions::default() };
    let script = convert(&document, &options).unwrap();

    assert!(script.contains("PlayResX: 150\r\nPlayResY: 100\r\n"));
    assert_eq!(
        event_lines(&script)[0],
        r"Dialogue: 0,0:00:00.00,0:00:01.00,Style00_Default,,0,0,0,karaoke,{\an7\pos(150,100)\fad(300,200)}{\kf50}Ka{\kf50}ra"
    );
}

/// Test that a zero length syllable survives as a zero length wipe
#[test]
fn test_convert_withZeroDurationSyllable_shouldEmitZeroTag() {
    let text = common::kbp_with_pages(&[common::page_block(&["C/A/0/100/0/0/0\nKa/0/50/0\nla/50/50/0\nra/50/100/0"])]);
    let document = KbpDocument::parse(&text).unwrap();
    let options = AssOptions { fade_in: 0, fade_out: 0, ..AssOptions::default() };
    let script = convert(&document, &options).unwrap();

    assert!(event_lines(&script)[0].ends_with(r"{\pos(300,216)}{\kf50}Ka{\kf0}la{\kf50}ra"));
}

/// Test that an absurd declared offset fails instead of overflowing
#[test]
fn test_convert_withHugeDeclaredOffset_shouldFailWithConfigurationError() {
    let text = common::ka_ra_kbp().replace("Intro", "Offset 922337203685477580\nIntro");
    let document = KbpDocument::parse(&text).unwrap();

    let result = convert(&document, &AssOptions::default());
    assert!(matches!(
        result,
        Err(ConversionError::Configuration(ConfigurationError::OffsetOutOfRange { .. }))
    ));

    let disabled = AssOptions { offset: Offset::Disabled, ..AssOptions::default() };
    assert!(convert(&document, &disabled).is_ok());
}

/// Test that a later page with an earlier line still sorts by start
#[test]
fn test_convert_withOutOfOrderPages_shouldSortAndKeepTies() {
    let text = common::kbp_with_pages(&[
        common::page_block(&["C/A/500/600/0/0/0\nlate/500/600/0"]),
        common::page_block(&["C/A/100/200/0/0/0\nearly/100/200/0", "C/A/100/200/0/0/0\ntie/100/200/0"]),
    ]);
    let document = KbpDocument::parse(&text).unwrap();
    let options = AssOptions { fade_in: 0, fade_out: 0, ..AssOptions::default() };
    let script = convert(&document, &options).unwrap();
    let events = event_lines(&script);

    assert!(events[0].ends_with("early"));
    assert!(events[1].ends_with("tie"));
    assert!(events[2].ends_with("late"));
}

/// Test that converting twice gives byte-identical output
#[test]
fn test_convert_twice_shouldBeIdentical() {
    let document = KbpDocument::parse(&common::sample_kbp()).unwrap();
    let options = AssOptions { float_pos: true, target_x: 1920, target_y: 1080, ..AssOptions::default() };
    let converter = AssConverter::new(options);

    assert_eq!(converter.convert(&document).unwrap(), converter.convert(&document).unwrap());
}

/// Test timing stays exact over multi-hour projects
#[test]
fn test_convert_withMultiHourProject_shouldKeepExactTimestamps() {
    let text = common::kbp_with_pages(&[common::page_block(&[
        "C/A/1080000/1086012/0/0/0\nvery/1080000/1083001/0\nlate/1083001/1086012/0",
    ])]);
    let document = KbpDocument::parse(&text).unwrap();
    let options = AssOptions { fade_in: 0, fade_out: 0, ..AssOptions::default() };
    let script = convert(&document, &options).unwrap();

    assert_eq!(
        event_lines(&script)[0],
        r"Dialogue: 0,3:00:00.00,3:01:00.12,Style00_Default,,0,0,0,karaoke,{\pos(300,216)}{\kf3001}very{\kf3011}late"
    );
}

/// Test that the auto offset without a declared offset changes nothing
#[test]
fn test_convert_withAutoOffsetAndNoMetadata_shouldMatchDisabled() {
    let document = KbpDocument::parse(&common::sample_kbp()).unwrap();
    let auto = convert(&document, &AssOptions::default()).unwrap();
    let disabled = convert(&document, &AssOptions { offset: Offset::Disabled, ..AssOptions::default() }).unwrap();

    assert_eq!(auto, disabled);
}

/// Test a declared offset shifts every timestamp
#[test]
fn test_convert_withDeclaredOffset_shouldShiftTimestamps() {
    let document = KbpDocument::parse(&common::ka_ra_kbp().replace("Intro", "Offset 50\nIntro")).unwrap();
    let script = convert(&document, &AssOptions::default()).unwrap();

    assert!(event_lines(&script)[0].starts_with("Dialogue: 0,0:00:00.50,0:00:01.50,"));
}

/// Test that float_font off keeps the declared size in the style line
#[test]
fn test_convert_withFloatFontDisabled_shouldWriteDeclaredSize() {
    let document = KbpDocument::parse(&common::ka_ra_kbp()).unwrap();
    let script = convert(&document, &AssOptions { float_font: false, ..AssOptions::default() }).unwrap();

    assert!(script.contains("Style: Style00_Default,Arial,12,"));
    assert!(!script.contains(r"\fs"));
}

/// Test a project without a page header fails with no output
#[test]
fn test_parse_withoutPageHeader_shouldFailBeforeConversion() {
    let text = format!("{}\n{}\nC/A/0/100/0/0/0\nKa/0/50/0\nra/50/100/0\n", common::sample_header(), common::DIVIDER);
    let error = KbpDocument::parse(&text).unwrap_err();

    assert!(error.expected.contains("PAGEV2"));
    let wrapped: ConversionError = error.into();
    assert!(matches!(wrapped, ConversionError::Format(_)));
}

/// Test invalid options produce a configuration error and no script
#[test]
fn test_convert_withInvalidCanvas_shouldFail() {
    let document = KbpDocument::parse(&common::ka_ra_kbp()).unwrap();
    let result = convert(&document, &AssOptions { target_x: 0, ..AssOptions::default() });
    assert!(matches!(result, Err(ConversionError::Configuration(_))));
}

/// Test the script model view of a conversion
#[test]
fn test_build_document_shouldExposeInfoStylesAndEvents() {
    let document = KbpDocument::parse(&common::sample_kbp()).unwrap();
    let ass = AssConverter::new(AssOptions::default()).build_document(&document).unwrap();

    assert_eq!(ass.info("Title"), Some("Test Song"));
    assert_eq!(ass.info("PlayResY"), Some("216"));
    assert_eq!(ass.styles.len(), 1);
    assert_eq!(ass.events.len(), 3);
    assert!(ass.events.iter().all(|event| event.effect == "karaoke"));
}
