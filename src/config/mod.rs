use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::editor::tools::{Color, ToolKind, ToolState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigPathError {
    #[error("neither XDG_CONFIG_HOME nor HOME is set")]
    MissingHomeDirectory,
}

const APP_DIR: &str = "snapink";
const APP_CONFIG_FILE: &str = "config.json";

const DEFAULT_SYNC_DEBOUNCE_MS: u64 = 120;
const DEFAULT_THUMBNAIL_WIDTH: u32 = 240;

/// Editor settings from `config.json`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tool: Option<ToolKind>,
    pub stroke_color: Option<String>,
    pub stroke_size: Option<u8>,
    pub opacity: Option<u8>,
    pub text_size: Option<u8>,
    pub fill_enabled: Option<bool>,
    pub font_path: Option<PathBuf>,
    pub sync_debounce_ms: u64,
    pub thumbnail_width: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tool: None,
            stroke_color: None,
            stroke_size: None,
            opacity: None,
            text_size: None,
            fill_enabled: None,
            font_path: None,
            sync_debounce_ms: DEFAULT_SYNC_DEBOUNCE_MS,
            thumbnail_width: DEFAULT_THUMBNAIL_WIDTH,
        }
    }
}

impl AppConfig {
    pub fn sync_debounce(&self) -> Duration {
        Duration::from_millis(self.sync_debounce_ms)
    }

    /// Initial tool parameters, clamped by the same setters the toolbar uses.
    pub fn tool_state(&self) -> ToolState {
        let mut tools = ToolState::new();
        if let Some(tool) = self.tool {
            tools.select_tool(tool);
        }
        if let Some(hex) = self.stroke_color.as_deref() {
            match Color::from_hex(hex) {
                Some(color) => tools.set_color(color),
                None => tracing::warn!(color = hex, "invalid stroke_color in config; ignoring"),
            }
        }
        if let Some(size) = self.stroke_size {
            tools.set_stroke_size(size);
        }
        if let Some(opacity) = self.opacity {
            tools.set_opacity(opacity);
        }
        if let Some(size) = self.text_size {
            tools.set_text_size(size);
        }
        if let Some(fill) = self.fill_enabled {
            tools.set_fill_enabled(fill);
        }
        tools
    }
}

pub fn load_app_config() -> AppConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_app_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_app_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> AppConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(err) => {
            tracing::debug!(%err, "no config directory; using defaults");
            return AppConfig::default();
        }
    };
    if !path.exists() {
        return AppConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => parse_app_config(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            AppConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            AppConfig::default()
        }
    }
}

/// Location of `config.json` for the current environment.
pub fn default_config_path() -> Result<PathBuf, ConfigPathError> {
    let (xdg_config_home, home) = config_env_dirs();
    app_config_path(
        APP_DIR,
        APP_CONFIG_FILE,
        xdg_config_home.as_deref(),
        home.as_deref(),
    )
}

pub fn parse_app_config(contents: &str) -> serde_json::Result<AppConfig> {
    serde_json::from_str(contents)
}

pub fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}
