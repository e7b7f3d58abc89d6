use crate::backend::{CommandDetector, CommandFrameSource, CommandRecognizer, CommandSpec};
use crate::context::Context;
use crate::tracker::PresenceTracker;
use crate::worker::TICK_INTERVAL;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{key} does not contain a runnable command: {value:?}")]
    BadCommand { key: &'static str, value: String },
}

/// Engine configuration, loaded from environment variables.
pub struct Config {
    /// Root of the per-person reference-image directories.
    pub faces_dir: PathBuf,
    /// Path to the known-face store file.
    pub store_path: PathBuf,
    /// External capture command (one image on stdout per run).
    pub capture_cmd: String,
    /// External detection command (PNG on stdin, JSON boxes on stdout).
    pub detect_cmd: String,
    /// External recognition command (PNG crop on stdin, JSON embedding on stdout).
    pub recognize_cmd: String,
    /// Pause between recognition passes.
    pub tick_interval: Duration,
}

impl Config {
    /// Load configuration from `GLANCE_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let data_dir = std::env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                PathBuf::from(home).join(".local/share")
            })
            .join("glance");

        Self {
            faces_dir: env_path("GLANCE_FACES_DIR", data_dir.join("known_faces")),
            store_path: env_path("GLANCE_STORE_PATH", data_dir.join("known_faces.json")),
            capture_cmd: env_string(
                "GLANCE_CAPTURE_CMD",
                "rpicam-still --nopreview --encoding png --output -",
            ),
            detect_cmd: env_string("GLANCE_DETECT_CMD", "glance-detect"),
            recognize_cmd: env_string("GLANCE_RECOGNIZE_CMD", "glance-recognize"),
            tick_interval: Duration::from_secs(env_u64(
                "GLANCE_TICK_SECS",
                TICK_INTERVAL.as_secs(),
            )),
        }
    }

    /// Wire the external collaborators and produce the engine context.
    pub fn build_context(&self) -> Result<Context, ConfigError> {
        let capture = parse_command("GLANCE_CAPTURE_CMD", &self.capture_cmd)?;
        let detect = parse_command("GLANCE_DETECT_CMD", &self.detect_cmd)?;
        let recognize = parse_command("GLANCE_RECOGNIZE_CMD", &self.recognize_cmd)?;

        Ok(Context {
            source: Arc::new(CommandFrameSource::new(capture)),
            detector: Arc::new(CommandDetector::new(detect)),
            recognizer: Arc::new(CommandRecognizer::new(recognize)),
            tracker: Arc::new(PresenceTracker::new()),
            store_path: self.store_path.clone(),
            faces_dir: self.faces_dir.clone(),
            tick_interval: self.tick_interval,
        })
    }
}

fn parse_command(key: &'static str, value: &str) -> Result<CommandSpec, ConfigError> {
    CommandSpec::parse(value).ok_or_else(|| ConfigError::BadCommand {
        key,
        value: value.to_string(),
    })
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_path(key: &str, default: PathBuf) -> PathBuf {
    std::env::var(key).map(PathBuf::from).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
