use cdev_core::settings::Settings;
use tempfile::tempdir;

#[test]
fn missing_settings_file_loads_as_defaults() {
    let dir = tempdir().expect("tempdir");
    let settings = Settings::load(&dir.path().join("snippet.json")).expect("load defaults");
    assert_eq!(settings, Settings::default());
}

#[test]
fn save_and_load_round_trip() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("tools/snippet.json");

    let settings = Settings {
        last_snippet: Some("print(\"hi\");".to_string()),
        last_c_file: Some("/tmp/cdevsnippet-abc.c".to_string()),
        last_binary: Some("/tmp/cdevsnippet-abc.binary".to_string()),
        editor: Some("nano".to_string()),
    };
    settings.save(&path).expect("save creates parent dirs");

    let loaded = Settings::load(&path).expect("load back");
    assert_eq!(loaded, settings);
}

#[test]
fn malformed_settings_are_an_error_not_a_reset() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("snippet.json");
    std::fs::write(&path, "{not json").expect("write junk");
    assert!(Settings::load(&path).is_err());
}

#[test]
fn partial_settings_files_fill_in_defaults() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("snippet.json");
    std::fs::write(&path, "{\"last_binary\": \"/tmp/b\"}").expect("write partial");

    let loaded = Settings::load(&path).expect("load partial");
    assert_eq!(loaded.last_binary.as_deref(), Some("/tmp/b"));
    assert!(loaded.last_snippet.is_none());
}

#[test]
fn editor_resolution_prefers_the_explicit_setting() {
    let settings = Settings { editor: Some("nano".to_string()), ..Settings::default() };
    assert_eq!(settings.resolve_editor(), "nano");
}
