use paperchat::config::{normalize_endpoint, JsonConfig};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_normalize_endpoint_full_path_kept() {
    assert_eq!(
        normalize_endpoint("https://api.openai.com/v1/chat/completions"),
        "https://api.openai.com/v1/chat/completions"
    );
}

#[test]
fn test_normalize_endpoint_v1_suffix() {
    assert_eq!(
        normalize_endpoint("http://localhost:11434/v1"),
        "http://localhost:11434/v1/chat/completions"
    );
    assert_eq!(
        normalize_endpoint("http://localhost:11434/v1/"),
        "http://localhost:11434/v1/chat/completions"
    );
}

#[test]
fn test_normalize_endpoint_bare_host() {
    assert_eq!(
        normalize_endpoint("http://localhost:11434"),
        "http://localhost:11434/v1/chat/completions"
    );
    assert_eq!(
        normalize_endpoint("http://localhost:11434/"),
        "http://localhost:11434/v1/chat/completions"
    );
}

#[test]
fn test_json_config_full_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(
        &path,
        r#"{
            "api": {"endpoint": "http://localhost:11434/v1"},
            "model": {"default_model": "llama3", "system_prompt": "Be brief."},
            "server": {"command": "python", "args": ["server.py"]},
            "tools": {"max_rounds": 4, "timeout_secs": 10}
        }"#,
    )
    .unwrap();

    let config = JsonConfig::load_from(&path).unwrap();
    assert_eq!(config.api.endpoint.as_deref(), Some("http://localhost:11434/v1"));
    assert_eq!(config.model.default_model.as_deref(), Some("llama3"));
    assert_eq!(config.model.system_prompt.as_deref(), Some("Be brief."));
    assert_eq!(config.server.command.as_deref(), Some("python"));
    assert_eq!(config.server.args, Some(vec!["server.py".to_string()]));
    assert_eq!(config.tools.max_rounds, 4);
    assert_eq!(config.tools.timeout_secs, 10);
}

#[test]
fn test_json_config_missing_sections_default() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(&path, r#"{"model": {"default_model": "gpt-4o-mini"}}"#).unwrap();

    let config = JsonConfig::load_from(&path).unwrap();
    assert_eq!(config.model.default_model.as_deref(), Some("gpt-4o-mini"));
    assert!(config.api.endpoint.is_none());
    assert!(config.server.command.is_none());
    assert_eq!(config.tools.max_rounds, 8);
    assert_eq!(config.tools.timeout_secs, 30);
}

#[test]
fn test_json_config_invalid_json_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(&path, "{not valid").unwrap();

    assert!(JsonConfig::load_from(&path).is_err());
}
