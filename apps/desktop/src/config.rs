use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context};
use client_core::{FetchOrdering, SyncConfig};
use serde::Deserialize;
use tracing::warn;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8090/projeto/api/v1/chat";
pub const DEFAULT_CONFIG_FILE: &str = "board.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub endpoint: String,
    pub poll_interval_secs: u64,
    pub fetch_ordering: FetchOrdering,
    pub request_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            poll_interval_secs: 5,
            fetch_ordering: FetchOrdering::LastResolved,
            request_timeout_secs: None,
        }
    }
}

impl Settings {
    pub fn into_sync_config(self) -> anyhow::Result<SyncConfig> {
        let endpoint = Url::parse(self.endpoint.trim())
            .with_context(|| format!("invalid board endpoint '{}'", self.endpoint))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            bail!(
                "board endpoint must use http or https, got '{}'",
                endpoint.scheme()
            );
        }
        if self.poll_interval_secs == 0 {
            bail!("poll_interval_secs must be at least 1");
        }

        let mut config = SyncConfig::new(endpoint);
        config.poll_interval = Duration::from_secs(self.poll_interval_secs);
        config.ordering = self.fetch_ordering;
        config.request_timeout = self.request_timeout_secs.map(Duration::from_secs);
        Ok(config)
    }
}

/// Defaults, then the optional TOML file, then the endpoint variables.
pub fn load_settings(path: &Path) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<Settings>(&raw) {
            Ok(file_cfg) => settings = file_cfg,
            Err(error) => {
                warn!(path = %path.display(), %error, "ignoring unreadable board config")
            }
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("BOARD_ENDPOINT") {
        settings.endpoint = v;
    }
    if let Some(v) = lookup("APP__ENDPOINT") {
        settings.endpoint = v;
    }
}
