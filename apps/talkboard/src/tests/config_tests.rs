use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_config(contents: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("talkboard_config_test_{suffix}.toml"));
    fs::write(&path, contents).expect("write config");
    path
}

#[test]
fn missing_file_keeps_defaults() {
    let path = env::temp_dir().join("talkboard_config_test_does_not_exist.toml");
    let settings = load_settings(&path, Overrides::default()).expect("load");
    assert_eq!(settings.realtime_url, None);
    assert!(settings.graphql_url.starts_with("http://"));
}

#[test]
fn file_values_are_overridden_by_command_line() {
    let path = temp_config(
        r#"
graphql_url = "https://api.example.com/graphql"
realtime_url = "wss://realtime.example.com/graphql"
api_key = "from-file"
"#,
    );

    let settings = load_settings(
        &path,
        Overrides {
            api_key: Some("from-cli".into()),
            ..Overrides::default()
        },
    )
    .expect("load");

    assert_eq!(settings.graphql_url, "https://api.example.com/graphql");
    assert_eq!(
        settings.realtime_url.as_deref(),
        Some("wss://realtime.example.com/graphql")
    );
    assert_eq!(settings.credential(), Credential::ApiKey("from-cli".into()));

    fs::remove_file(path).expect("cleanup");
}

#[test]
fn malformed_file_is_an_error() {
    let path = temp_config("graphql_url = [");
    assert!(load_settings(&path, Overrides::default()).is_err());
    fs::remove_file(path).expect("cleanup");
}

#[test]
fn prefixed_env_wins_over_plain_env() {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("TALKBOARD_GRAPHQL_URL", "http://plain/graphql"),
        ("APP__GRAPHQL_URL", "http://prefixed/graphql"),
        ("TALKBOARD_AUTH_TOKEN", "token"),
    ]);
    let mut settings = Settings::default();

    apply_env(&mut settings, |key| vars.get(key).map(|v| v.to_string()));

    assert_eq!(settings.graphql_url, "http://prefixed/graphql");
    assert_eq!(settings.credential(), Credential::Bearer("token".into()));
}

#[test]
fn rejects_invalid_urls_and_conflicting_credentials() {
    let mut settings = Settings {
        graphql_url: "not a url".into(),
        ..Settings::default()
    };
    assert!(validate(&settings).is_err());

    settings.graphql_url = "http://127.0.0.1/graphql".into();
    settings.api_key = Some("key".into());
    settings.auth_token = Some("token".into());
    assert!(validate(&settings).is_err());

    settings.auth_token = None;
    assert!(validate(&settings).is_ok());
    assert_eq!(Settings::default().credential(), Credential::Anonymous);
}
