//! Tests for logging configuration and format parsing
//!
//! Covers the pure parsing helpers used when logging is configured from
//! `LOG_FORMAT` and `LOG_LEVEL`.

use text2sql_a2a::observability::logging::{parse_level, LogFormat};
use tracing::Level;

#[test]
fn test_log_format_parse_known_formats() {
    assert!(matches!(LogFormat::parse("json"), LogFormat::Json));
    assert!(matches!(LogFormat::parse("JSON"), LogFormat::Json));
    assert!(matches!(LogFormat::parse("pretty"), LogFormat::Pretty));
    assert!(matches!(LogFormat::parse("Pretty"), LogFormat::Pretty));
    assert!(matches!(LogFormat::parse("compact"), LogFormat::Compact));
    assert!(matches!(LogFormat::parse("COMPACT"), LogFormat::Compact));
}

#[test]
fn test_log_format_parse_invalid_defaults_to_json() {
    for input in ["invalid", "", "xml", "yaml", "123"] {
        assert!(
            matches!(LogFormat::parse(input), LogFormat::Json),
            "{input:?} should fall back to json"
        );
    }
}

#[test]
fn test_log_format_parse_whitespace() {
    assert!(matches!(LogFormat::parse("  json  "), LogFormat::Json));
    assert!(matches!(LogFormat::parse("compact\n"), LogFormat::Compact));
    assert!(matches!(LogFormat::parse("\tpretty"), LogFormat::Pretty));
}

#[test]
fn test_parse_level_case_insensitive() {
    assert_eq!(parse_level("error"), Level::ERROR);
    assert_eq!(parse_level("Warn"), Level::WARN);
    assert_eq!(parse_level("DEBUG"), Level::DEBUG);
    assert_eq!(parse_level(" trace "), Level::TRACE);
}

#[test]
fn test_parse_level_defaults_to_info() {
    assert_eq!(parse_level(""), Level::INFO);
    assert_eq!(parse_level("verbose"), Level::INFO);
}

#[test]
fn test_init_logging_twice_does_not_panic() {
    text2sql_a2a::observability::init_logging(Level::INFO, LogFormat::Compact, false);
    text2sql_a2a::observability::init_logging(Level::DEBUG, LogFormat::Json, true);
}
