//! Application-level configuration loading: game defaults and buzzer timing.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PHRASE_BUZZ_CONFIG_PATH";
/// Phrase used until the host sets one.
pub const DEFAULT_PHRASE: &str = "MARK SHIBLEY";
const DEFAULT_REENABLE_DELAY: Duration = Duration::from_millis(5_000);
const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_SSE_CAPACITY: usize = 32;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    default_phrase: String,
    skip_turn_after_guess: bool,
    show_dancing_unicorn: bool,
    reenable_delay: Duration,
    honor_early_reenable: bool,
    upload_timeout: Duration,
    sse_capacity: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        phrase_length = app_config.default_phrase.chars().count(),
                        reenable_delay_ms = app_config.reenable_delay.as_millis() as u64,
                        "loaded configuration"
                    );
                    app_config
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

    /// Phrase installed at startup (already uppercased).
    pub fn default_phrase(&self) -> &str {
        &self.default_phrase
    }

    /// Initial value of the "last guesser sits out" toggle.
    pub fn skip_turn_after_guess(&self) -> bool {
        self.skip_turn_after_guess
    }

    /// Initial value of the cosmetic unicorn flag.
    pub fn show_dancing_unicorn(&self) -> bool {
        self.show_dancing_unicorn
    }

    /// How long buzzers stay paused after an accepted guess.
    pub fn reenable_delay(&self) -> Duration {
        self.reenable_delay
    }

    /// Whether a client-sent `reenable_buzzers` may clear the pause before the deadline.
    pub fn honor_early_reenable(&self) -> bool {
        self.honor_early_reenable
    }

    /// Upper bound on a single winner photo upload.
    pub fn upload_timeout(&self) -> Duration {
        self.upload_timeout
    }

    /// Buffer size of each SSE broadcast hub.
    pub fn sse_capacity(&self) -> usize {
        self.sse_capacity
    }

    /// Override the re-enable delay, mostly useful for tests driving the timer.
    pub fn with_reenable_delay(mut self, delay: Duration) -> Self {
        self.reenable_delay = delay;
        self
    }

    /// Override whether early client re-enable calls are honoured.
    pub fn with_honor_early_reenable(mut self, honor: bool) -> Self {
        self.honor_early_reenable = honor;
        self
    }

    /// Override the upload bound.
    pub fn with_upload_timeout(mut self, limit: Duration) -> Self {
        self.upload_timeout = limit;
        self
    }

    /// Override the startup phrase.
    pub fn with_default_phrase(mut self, phrase: &str) -> Self {
        self.default_phrase = normalize_phrase(Some(phrase.to_string()));
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_phrase: DEFAULT_PHRASE.to_string(),
            skip_turn_after_guess: true,
            show_dancing_unicorn: true,
            reenable_delay: DEFAULT_REENABLE_DELAY,
            honor_early_reenable: false,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
            sse_capacity: DEFAULT_SSE_CAPACITY,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    default_phrase: Option<String>,
    skip_turn_after_guess: Option<bool>,
    show_dancing_unicorn: Option<bool>,
    reenable_delay_ms: Option<u64>,
    honor_early_reenable: Option<bool>,
    upload_timeout_ms: Option<u64>,
    sse_capacity: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            default_phrase: normalize_phrase(value.default_phrase),
            skip_turn_after_guess: value
                .skip_turn_after_guess
                .unwrap_or(defaults.skip_turn_after_guess),
            show_dancing_unicorn: value
                .show_dancing_unicorn
                .unwrap_or(defaults.show_dancing_unicorn),
            reenable_delay: value
                .reenable_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.reenable_delay),
            honor_early_reenable: value
                .honor_early_reenable
                .unwrap_or(defaults.honor_early_reenable),
            upload_timeout: value
                .upload_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.upload_timeout),
            // A zero-capacity broadcast channel panics on creation.
            sse_capacity: value
                .sse_capacity
                .filter(|capacity| *capacity > 0)
                .unwrap_or(defaults.sse_capacity),
        }
    }
}

fn normalize_phrase(phrase: Option<String>) -> String {
    phrase
        .map(|value| value.trim().to_uppercase())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_PHRASE.to_string())
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
