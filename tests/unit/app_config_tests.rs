/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use kbp2ass::app_config::{AssOptions, Config, LogLevel, Offset, MAX_OFFSET_MS};
use kbp2ass::errors::ConfigurationError;
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();
    let options = config.options;

    assert!(options.border);
    assert!(options.float_font);
    assert!(!options.float_pos);
    assert_eq!(options.target_x, 300);
    assert_eq!(options.target_y, 216);
    assert_eq!(options.fade_in, 300);
    assert_eq!(options.fade_out, 200);
    assert!(options.transparency);
    assert_eq!(options.offset, Offset::Auto);
    assert_eq!(config.log_level, LogLevel::Info);
}

/// Test that a partial JSON file keeps the defaults for missing fields
#[test]
fn test_config_from_file_withPartialJson_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "kbp2ass.json",
        r#"{ "options": { "border": false, "fade_in": 0, "offset": false }, "log_level": "debug" }"#,
    )?;

    let config = Config::from_file(&path)?;

    assert!(!config.options.border);
    assert_eq!(config.options.fade_in, 0);
    assert_eq!(config.options.fade_out, 200);
    assert_eq!(config.options.offset, Offset::Disabled);
    assert_eq!(config.log_level, LogLevel::Debug);
    Ok(())
}

/// Test the offset JSON forms
#[test]
fn test_offset_json_withFlagsAndNumbers_shouldRoundTrip() -> Result<()> {
    let options: AssOptions = serde_json::from_str(r#"{ "offset": true }"#)?;
    assert_eq!(options.offset, Offset::Auto);

    let options: AssOptions = serde_json::from_str(r#"{ "offset": -150 }"#)?;
    assert_eq!(options.offset, Offset::Fixed(-150));

    let json = serde_json::to_string(&options)?;
    assert!(json.contains(r#""offset":-150"#));
    Ok(())
}

/// Test a missing or malformed config file
#[test]
fn test_config_from_file_withBadInput_shouldFail() -> Result<()> {
    assert!(Config::from_file("does_not_exist.json").is_err());

    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "broken.json", "{ options: ")?;
    let error = Config::from_file(&path).unwrap_err();
    assert!(format!("{:#}", error).contains("Failed to parse config file"));
    Ok(())
}

/// Test option validation
#[test]
fn test_options_validate_withOutOfRangeValues_shouldReportWhich() {
    let mut options = AssOptions::default();
    assert!(options.validate().is_ok());

    options.fade_in = -1;
    assert_eq!(
        options.validate(),
        Err(ConfigurationError::NegativeFade { which: "fade_in", value: -1 })
    );

    options = AssOptions { fade_out: -20, ..AssOptions::default() };
    assert_eq!(
        options.validate(),
        Err(ConfigurationError::NegativeFade { which: "fade_out", value: -20 })
    );

    options = AssOptions { target_y: 0, ..AssOptions::default() };
    assert_eq!(options.validate(), Err(ConfigurationError::InvalidCanvas { x: 300, y: 0 }));

    options = AssOptions { offset: Offset::Fixed(MAX_OFFSET_MS + 1), ..AssOptions::default() };
    assert!(matches!(options.validate(), Err(ConfigurationError::OffsetOutOfRange { .. })));

    options = AssOptions { offset: Offset::Fixed(i64::MIN), ..AssOptions::default() };
    assert!(matches!(options.validate(), Err(ConfigurationError::OffsetOutOfRange { .. })));

    let config = Config { options, ..Config::default() };
    assert!(config.validate().is_err());
}

/// Test parsing offsets from the command line form
#[test]
fn test_offset_from_str_withVariousInputs_shouldParse() {
    assert_eq!("auto".parse::<Offset>().unwrap(), Offset::Auto);
    assert_eq!("None".parse::<Offset>().unwrap(), Offset::Disabled);
    assert_eq!("false".parse::<Offset>().unwrap(), Offset::Disabled);
    assert_eq!("-250".parse::<Offset>().unwrap(), Offset::Fixed(-250));
    assert!("soon".parse::<Offset>().is_err());

    assert_eq!(Offset::Fixed(40).to_string(), "40");
    assert_eq!(Offset::Auto.to_string(), "auto");
}

/// Test resolving the offset against the document value
#[test]
fn test_offset_resolve_shouldPreferModeOverDocument() {
    assert_eq!(Offset::Auto.resolve(Some(500)), 500);
    assert_eq!(Offset::Auto.resolve(None), 0);
    assert_eq!(Offset::Disabled.resolve(Some(500)), 0);
    assert_eq!(Offset::Fixed(-100).resolve(Some(500)), -100);
}
