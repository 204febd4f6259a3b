/*!
 * Tests for error types and conversions
 */

use kbp2ass::errors::{AppError, ConfigurationError, ConversionError, FormatError, ResolutionError};

/// Test that a format error names the line, the offending text and the expectation
#[test]
fn test_format_error_display_shouldIncludeLineFoundAndExpected() {
    let error = FormatError::new(12, "malformed syllable", "la/x/3/0", "text/start/end/wipe");
    let message = error.to_string();

    assert!(message.starts_with("line 12: malformed syllable"));
    assert!(message.contains("'la/x/3/0'"));
    assert!(message.ends_with("expected text/start/end/wipe)"));
}

/// Test resolution error messages
#[test]
fn test_resolution_error_display_shouldNamePageAndLine() {
    let error = ResolutionError::UnknownStyle { page: 2, line: 3, slot: 7 };
    assert_eq!(error.to_string(), "page 2, line 3: style slot 7 is not defined");

    let error = ResolutionError::EmptyPage { page: 4 };
    assert_eq!(error.to_string(), "page 4 has no lines");
}

/// Test configuration error messages
#[test]
fn test_configuration_error_display_shouldNameTheOption() {
    let error = ConfigurationError::NegativeFade { which: "fade_out", value: -5 };
    assert_eq!(error.to_string(), "fade_out must not be negative, got -5ms");

    let error = ConfigurationError::InvalidCanvas { x: 0, y: 216 };
    assert!(error.to_string().contains("0x216"));
}

/// Test wrapping into ConversionError via From
#[test]
fn test_conversion_error_from_shouldWrapEachKind() {
    let format: ConversionError = FormatError::new(1, "bad", "x", "y").into();
    assert!(matches!(format, ConversionError::Format(_)));
    assert!(format.to_string().starts_with("Format error: line 1"));

    let resolution: ConversionError = ResolutionError::EmptyPage { page: 1 }.into();
    assert!(matches!(resolution, ConversionError::Resolution(_)));

    let configuration: ConversionError = ConfigurationError::InvalidCanvas { x: 1, y: 0 }.into();
    assert!(configuration.to_string().starts_with("Configuration error:"));
}

/// Test conversion of library errors into the application error
#[test]
fn test_app_error_from_withLibraryErrors_shouldPickVariant() {
    let app: AppError = FormatError::new(3, "bad", "x", "y").into();
    assert!(matches!(app, AppError::Conversion(ConversionError::Format(_))));

    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.kbp");
    let app: AppError = io.into();
    assert!(matches!(app, AppError::File(_)));
    assert!(app.to_string().contains("missing.kbp"));

    let app: AppError = anyhow::anyhow!("something odd").into();
    assert!(matches!(app, AppError::Unknown(_)));
}

/// Test that serde_json errors become configuration errors
#[test]
fn test_app_error_from_withJsonError_shouldBeConfig() {
    let json_error = serde_json::from_str::<serde_json::Value>("{ not json").unwrap_err();
    let app: AppError = json_error.into();
    assert!(matches!(app, AppError::Config(_)));
}
