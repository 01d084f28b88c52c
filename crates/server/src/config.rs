use std::{collections::HashMap, fs};

use serde::Deserialize;

pub const DEFAULT_BOARD_PATH: &str = "/projeto/api/v1/chat";

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server_bind: String,
    pub board_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8090".into(),
            board_path: DEFAULT_BOARD_PATH.into(),
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("server.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("bind_addr") {
                settings.server_bind = v.clone();
            }
            if let Some(v) = file_cfg.get("board_path") {
                settings.board_path = v.clone();
            }
        }
    }

    if let Ok(v) = std::env::var("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Ok(v) = std::env::var("APP__BIND_ADDR") {
        settings.server_bind = v;
    }
    if let Ok(v) = std::env::var("APP__BOARD_PATH") {
        settings.board_path = v;
    }

    settings.board_path = normalize_board_path(&settings.board_path);
    settings
}

/// Leading slash, no trailing slash; blank falls back to the default path.
pub fn normalize_board_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        return DEFAULT_BOARD_PATH.to_string();
    }
    format!("/{trimmed}")
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
