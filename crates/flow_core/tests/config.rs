// Tests for loading graph instance settings.

use flow_core::{ConfigError, GraphInstance, HostServices, Settings};

#[test]
fn test_partial_settings_keep_defaults() {
    let settings = Settings::from_ron_str("(max_trigger_depth: 8)").unwrap();
    assert_eq!(settings.max_trigger_depth, 8);
    assert_eq!(settings.max_resolve_depth, Settings::DEFAULT_MAX_RESOLVE_DEPTH);
    assert!(settings.record_messages);
}

#[test]
fn test_ron_round_trip() {
    let settings = Settings {
        max_trigger_depth: 3,
        max_resolve_depth: 4,
        record_messages: false,
    };
    let s = settings.to_ron_string().unwrap();
    assert_eq!(Settings::from_ron_str(&s).unwrap(), settings);
}

#[test]
fn test_invalid_ron() {
    let err = Settings::from_ron_str("(max_trigger_depth: \"deep\")").unwrap_err();
    assert!(matches!(err, ConfigError::Ron(_)));
}

#[test]
fn test_missing_file() {
    let err = Settings::load("this/file/does/not/exist.ron").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_json_settings() {
    let settings: Settings = serde_json::from_str(r#"{"max_resolve_depth": 2}"#).unwrap();
    assert_eq!(settings.max_resolve_depth, 2);
    assert_eq!(settings.max_trigger_depth, Settings::DEFAULT_MAX_TRIGGER_DEPTH);
}

#[test]
fn test_record_messages_switch() {
    let settings = Settings {
        record_messages: false,
        ..Default::default()
    };
    let mut g = GraphInstance::with_settings(HostServices::default(), settings);
    g.host_mut()
        .log(flow_core::Severity::Warning, None, "not recorded");
    assert!(g.host().messages().is_empty());

    let mut g = GraphInstance::default();
    g.host_mut().log(flow_core::Severity::Warning, None, "recorded");
    assert_eq!(g.host().messages().len(), 1);
}
