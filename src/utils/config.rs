// src/utils/config.rs
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; profile-extract/0.1; +https://example.invalid/bot)";

/// Process-level settings, read from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// A single profile file or a directory of them.
    pub profiles_path: PathBuf,
    pub dictionary_path: Option<PathBuf>,
    pub dictionary_category: String,
    pub image_fetch_enabled: bool,
    pub image_fetch_attempts: u32,
    pub image_fetch_backoff: Duration,
    pub image_fetch_timeout: Duration,
    pub image_fetch_user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            profiles_path: PathBuf::from("profiles"),
            dictionary_path: None,
            dictionary_category: "watch".to_string(),
            image_fetch_enabled: true,
            image_fetch_attempts: 3,
            image_fetch_backoff: Duration::from_millis(1000),
            image_fetch_timeout: Duration::from_millis(15_000),
            image_fetch_user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let profiles_path = lookup("PROFILES_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.profiles_path);
        let dictionary_path = lookup("ALIAS_DICTIONARY_PATH")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);
        let dictionary_category = lookup("ALIAS_DICTIONARY_CATEGORY")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.dictionary_category);

        let image_fetch_enabled = parse_or(
            &lookup,
            "IMAGE_FETCH_ENABLED",
            defaults.image_fetch_enabled,
        );
        let image_fetch_attempts = parse_or(
            &lookup,
            "IMAGE_FETCH_ATTEMPTS",
            defaults.image_fetch_attempts,
        )
        .max(1);
        let image_fetch_backoff = Duration::from_millis(parse_or(
            &lookup,
            "IMAGE_FETCH_BACKOFF_MS",
            defaults.image_fetch_backoff.as_millis() as u64,
        ));
        let image_fetch_timeout = Duration::from_millis(parse_or(
            &lookup,
            "IMAGE_FETCH_TIMEOUT_MS",
            defaults.image_fetch_timeout.as_millis() as u64,
        ));
        let image_fetch_user_agent =
            lookup("IMAGE_FETCH_USER_AGENT").unwrap_or(defaults.image_fetch_user_agent);

        let settings = Self {
            profiles_path,
            dictionary_path,
            dictionary_category,
            image_fetch_enabled,
            image_fetch_attempts,
            image_fetch_backoff,
            image_fetch_timeout,
            image_fetch_user_agent,
        };
        tracing::debug!("Resolved settings: {:?}", settings);
        settings
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy + std::fmt::Debug,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring unparsable {}='{}', using default {:?}", key, raw, default);
                default
            }
        },
        None => default,
    }
}
