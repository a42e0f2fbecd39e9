//! Configuration module - environment variable parsing

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::chat::Provider;
use crate::render::ActorSkinKind;

const APP_DIR: &str = "flappy-chat";

/// Runtime configuration for both binaries, loaded from the environment
/// (and a `.env` file when the caller has loaded one).
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Directory for the game's log file
    pub log_dir: PathBuf,

    /// Where the high score is persisted
    pub high_score_path: PathBuf,
    /// Sprite or plain rectangle for the actor
    pub skin: ActorSkinKind,
    /// Disable tone output entirely
    pub mute: bool,

    /// Chat completion endpoint
    pub chat_endpoint: String,
    /// Provider id sent with every chat request
    pub chat_provider: Provider,
    /// Per-request timeout for the chat backend
    pub chat_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let data_dir = data_dir();

        let skin = match env::var("FLAPPY_SKIN") {
            Ok(value) => value.parse().map_err(|_| ConfigError::Invalid {
                var: "FLAPPY_SKIN",
                value,
            })?,
            Err(_) => ActorSkinKind::Sprite,
        };

        let chat_provider = match env::var("CHAT_PROVIDER") {
            Ok(value) => value.parse().map_err(|_| ConfigError::Invalid {
                var: "CHAT_PROVIDER",
                value,
            })?,
            Err(_) => Provider::default(),
        };

        let chat_timeout = match env::var("CHAT_TIMEOUT_SECS") {
            Ok(value) => value
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid {
                    var: "CHAT_TIMEOUT_SECS",
                    value,
                })?,
            Err(_) => Duration::from_secs(30),
        };

        Ok(Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_dir: env::var_os("FLAPPY_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join("logs")),

            high_score_path: env::var_os("FLAPPY_HIGHSCORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join("highscore.json")),
            skin,
            mute: env::var("FLAPPY_MUTE").is_ok_and(|v| is_truthy(&v)),

            chat_endpoint: env::var("CHAT_ENDPOINT")
                .unwrap_or_else(|_| "http://127.0.0.1:5000/chat".to_string()),
            chat_provider,
            chat_timeout,
        })
    }
}

/// Per-user data root, `dirs::data_dir()/flappy-chat`.
fn data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| env::temp_dir().join(APP_DIR))
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for environment variable {var}")]
    Invalid { var: &'static str, value: String },

    #[error(
        "Obstacle gap {gap} with margin {margin} does not fit a playfield {height} units tall"
    )]
    SpawnGeometry { gap: f64, margin: f64, height: f64 },

    #[error("Game constant {0} must be positive")]
    NonPositive(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_values() {
        assert!(is_truthy("1"));
        assert!(is_truthy(" TRUE "));
        assert!(is_truthy("on"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn data_dir_ends_with_app_name() {
        assert!(data_dir().ends_with(APP_DIR));
    }
}
