use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use client_core::Credential;
use serde::Deserialize;
use url::Url;

pub const DEFAULT_CONFIG_PATH: &str = "talkboard.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub graphql_url: String,
    pub realtime_url: Option<String>,
    pub api_key: Option<String>,
    pub auth_token: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            graphql_url: "http://127.0.0.1:20002/graphql".into(),
            realtime_url: None,
            api_key: None,
            auth_token: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    graphql_url: Option<String>,
    realtime_url: Option<String>,
    api_key: Option<String>,
    auth_token: Option<String>,
}

/// Command-line values, applied last.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub graphql_url: Option<String>,
    pub realtime_url: Option<String>,
    pub api_key: Option<String>,
    pub auth_token: Option<String>,
}

/// Defaults, then the TOML file (if present), then environment, then overrides.
pub fn load_settings(path: &Path, overrides: Overrides) -> Result<Settings> {
    let mut settings = Settings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let file_cfg: FileSettings = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
        apply_file(&mut settings, file_cfg);
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());

    if let Some(v) = overrides.graphql_url {
        settings.graphql_url = v;
    }
    if let Some(v) = overrides.realtime_url {
        settings.realtime_url = Some(v);
    }
    if let Some(v) = overrides.api_key {
        settings.api_key = Some(v);
    }
    if let Some(v) = overrides.auth_token {
        settings.auth_token = Some(v);
    }

    validate(&settings)?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.graphql_url {
        settings.graphql_url = v;
    }
    if file_cfg.realtime_url.is_some() {
        settings.realtime_url = file_cfg.realtime_url;
    }
    if file_cfg.api_key.is_some() {
        settings.api_key = file_cfg.api_key;
    }
    if file_cfg.auth_token.is_some() {
        settings.auth_token = file_cfg.auth_token;
    }
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    // APP__* wins over TALKBOARD_* when both are set.
    let lookup = |plain: &str, prefixed: &str| var(prefixed).or_else(|| var(plain));

    if let Some(v) = lookup("TALKBOARD_GRAPHQL_URL", "APP__GRAPHQL_URL") {
        settings.graphql_url = v;
    }
    if let Some(v) = lookup("TALKBOARD_REALTIME_URL", "APP__REALTIME_URL") {
        settings.realtime_url = Some(v);
    }
    if let Some(v) = lookup("TALKBOARD_API_KEY", "APP__API_KEY") {
        settings.api_key = Some(v);
    }
    if let Some(v) = lookup("TALKBOARD_AUTH_TOKEN", "APP__AUTH_TOKEN") {
        settings.auth_token = Some(v);
    }
}

fn validate(settings: &Settings) -> Result<()> {
    Url::parse(&settings.graphql_url)
        .with_context(|| format!("invalid graphql_url '{}'", settings.graphql_url))?;
    if let Some(realtime_url) = &settings.realtime_url {
        Url::parse(realtime_url)
            .with_context(|| format!("invalid realtime_url '{realtime_url}'"))?;
    }
    if settings.api_key.is_some() && settings.auth_token.is_some() {
        bail!("configure either api_key or auth_token, not both");
    }
    Ok(())
}

impl Settings {
    pub fn credential(&self) -> Credential {
        match (&self.api_key, &self.auth_token) {
            (Some(key), _) => Credential::ApiKey(key.clone()),
            (None, Some(token)) => Credential::Bearer(token.clone()),
            (None, None) => Credential::Anonymous,
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
