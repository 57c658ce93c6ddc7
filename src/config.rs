use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::kanban_board::UnrecognizedStatus;

pub const APP_NAME: &str = "taskdeck";
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub log: LogSettings,
    pub session: SessionSettings,
    pub board: BoardSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub level: String,
    pub directory: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionSettings {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BoardSettings {
    /// Put tasks with an unknown status in the pending column instead of
    /// hiding them.
    #[serde(default)]
    pub show_unknown_as_pending: bool,
}

impl BoardSettings {
    pub fn unrecognized_status(&self) -> UnrecognizedStatus {
        if self.show_unknown_as_pending {
            UnrecognizedStatus::Pending
        } else {
            UnrecognizedStatus::Exclude
        }
    }
}

impl Settings {
    /// Defaults, then `taskdeck.toml` in the config directory (or `file`),
    /// then `TASKDECK__SECTION__KEY` environment variables.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_NAME);
        let file = file.map(Path::to_path_buf).or_else(default_config_file);

        let mut builder = Config::builder()
            .set_default("api.base_url", DEFAULT_API_URL)?
            .set_default("api.timeout_secs", 30)?
            .set_default("log.level", "info")?
            .set_default("log.directory", path_str(&data_dir.join("logs")))?
            .set_default("session.path", path_str(&data_dir.join("session.json")))?
            .set_default("board.show_unknown_as_pending", false)?;

        if let Some(file) = file {
            builder = builder.add_source(File::from(file).required(false));
        }

        builder
            .add_source(
                Environment::with_prefix("TASKDECK")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }
}

fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME).join("taskdeck.toml"))
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
