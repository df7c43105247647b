use super::*;

#[test]
fn test_defaults_when_empty() {
    let cfg = parse("").unwrap();
    assert_eq!(cfg.app.name, "Lantern");
    assert_eq!(cfg.app.log_level, "info");
    assert_eq!(cfg.memory.convo_keep, 120);
    assert_eq!(cfg.memory.context_window, 14);
    assert_eq!(cfg.memory.message_log_limit, 200);
    assert_eq!(cfg.telegram.api_base, "https://api.telegram.org");
    assert!(cfg.scheduler.enabled);
    assert_eq!(cfg.api.port, 8000);
    assert!(cfg.api.api_key.is_empty());
}

#[test]
fn test_partial_sections_keep_other_defaults() {
    let toml_str = r#"
        [memory]
        convo_keep = 50

        [api]
        port = 9090
        api_key = "secret"
    "#;
    let cfg = parse(toml_str).unwrap();
    assert_eq!(cfg.memory.convo_keep, 50);
    assert_eq!(cfg.memory.context_window, 14);
    assert_eq!(cfg.api.port, 9090);
    assert_eq!(cfg.api.host, "0.0.0.0");
    assert_eq!(cfg.api.api_key, "secret");
}

#[test]
fn test_telegram_section() {
    let toml_str = r#"
        [telegram]
        api_base = "http://localhost:8081"
        poll_timeout_secs = 5
    "#;
    let cfg = parse(toml_str).unwrap();
    assert_eq!(cfg.telegram.api_base, "http://localhost:8081");
    assert_eq!(cfg.telegram.poll_timeout_secs, 5);
}

#[test]
fn test_invalid_toml_is_config_error() {
    let err = parse("[memory\nconvo_keep = ").unwrap_err();
    assert!(err.is_config());
}

#[test]
fn test_missing_file_uses_defaults() {
    let cfg = load("/nonexistent/__lantern_test__/config.toml").unwrap();
    assert_eq!(cfg.memory.db_path, "~/.lantern/data/lantern.db");
}

#[test]
fn test_in_memory_config() {
    let mem = MemoryConfig::in_memory();
    assert_eq!(mem.db_path, ":memory:");
    assert_eq!(mem.convo_keep, 120);
}

#[test]
fn test_shellexpand_leaves_plain_paths() {
    assert_eq!(shellexpand("/var/lib/lantern.db"), "/var/lib/lantern.db");
    assert_eq!(shellexpand(":memory:"), ":memory:");
}
