use datadir_move::config::types::LogLevel;
use std::str::FromStr;

#[test]
fn parse_common_levels_case_insensitive() {
    assert_eq!(LogLevel::parse("quiet"), Some(LogLevel::Quiet));
    assert_eq!(LogLevel::parse("Error"), Some(LogLevel::Quiet));
    assert_eq!(LogLevel::parse("NORMAL"), Some(LogLevel::Normal));
    assert_eq!(LogLevel::parse("verbose"), Some(LogLevel::Info));
    assert_eq!(LogLevel::parse("detailed"), Some(LogLevel::Info));
    assert_eq!(LogLevel::parse("trace"), Some(LogLevel::Debug));
    assert_eq!(LogLevel::parse("loud"), None);
}

#[test]
fn display_roundtrips_with_fromstr() {
    for lvl in [LogLevel::Quiet, LogLevel::Normal, LogLevel::Info, LogLevel::Debug] {
        let s = lvl.to_string();
        assert_eq!(LogLevel::from_str(&s), Ok(lvl), "roundtrip failed for {s}");
    }
    assert!(LogLevel::from_str("").is_err());
}
