//! Application-level configuration loading, including the gameplay timing
//! table shared by the phase machine and the timer scheduler.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SKETCH_GUESS_BACK_CONFIG_PATH";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Countdown shown before the first turn, in seconds.
    pub countdown_secs: u64,
    /// How long the drawer gets to pick a word before one is auto-picked.
    pub word_select_secs: u64,
    /// Drawing time applied when the start request does not specify one.
    pub default_draw_secs: u64,
    /// How long the turn result stays on display.
    pub turn_result_secs: u64,
    /// Delay into the drawing phase at which the length hint fires.
    pub first_hint_delay_secs: u64,
    /// Delay into the drawing phase at which the letter-head hint fires.
    pub second_hint_delay_secs: u64,
    /// Grace delay between the last correct answer and the turn actually
    /// ending, so the final answer broadcast lands before the phase flips.
    pub all_correct_grace_ms: u64,
    /// Post-game window during which players may return to the lobby.
    pub lobby_return_secs: u64,
    /// Number of candidate words offered to the drawer.
    pub word_choice_count: usize,
    /// Retention bound applied to every persisted state write.
    pub state_retention_secs: u64,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// baked-in defaults when the file is absent or unreadable.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded timing configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Retention bound as a [`Duration`].
    pub fn state_retention(&self) -> Duration {
        Duration::from_secs(self.state_retention_secs)
    }

    /// Grace delay as a [`Duration`].
    pub fn all_correct_grace(&self) -> Duration {
        Duration::from_millis(self.all_correct_grace_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            countdown_secs: 3,
            word_select_secs: 10,
            default_draw_secs: 90,
            turn_result_secs: 5,
            first_hint_delay_secs: 30,
            second_hint_delay_secs: 60,
            all_correct_grace_ms: 1_500,
            lobby_return_secs: 30,
            word_choice_count: 3,
            state_retention_secs: 24 * 60 * 60,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file. Every field is optional so
/// a partial file only overrides what it names.
struct RawConfig {
    countdown_secs: Option<u64>,
    word_select_secs: Option<u64>,
    default_draw_secs: Option<u64>,
    turn_result_secs: Option<u64>,
    first_hint_delay_secs: Option<u64>,
    second_hint_delay_secs: Option<u64>,
    all_correct_grace_ms: Option<u64>,
    lobby_return_secs: Option<u64>,
    word_choice_count: Option<usize>,
    state_retention_secs: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            countdown_secs: value.countdown_secs.unwrap_or(defaults.countdown_secs),
            word_select_secs: value.word_select_secs.unwrap_or(defaults.word_select_secs),
            default_draw_secs: value
                .default_draw_secs
                .unwrap_or(defaults.default_draw_secs),
            turn_result_secs: value.turn_result_secs.unwrap_or(defaults.turn_result_secs),
            first_hint_delay_secs: value
                .first_hint_delay_secs
                .unwrap_or(defaults.first_hint_delay_secs),
            second_hint_delay_secs: value
                .second_hint_delay_secs
                .unwrap_or(defaults.second_hint_delay_secs),
            all_correct_grace_ms: value
                .all_correct_grace_ms
                .unwrap_or(defaults.all_correct_grace_ms),
            lobby_return_secs: value
                .lobby_return_secs
                .unwrap_or(defaults.lobby_return_secs),
            word_choice_count: value
                .word_choice_count
                .unwrap_or(defaults.word_choice_count),
            state_retention_secs: value
                .state_retention_secs
                .unwrap_or(defaults.state_retention_secs),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
