// src/profile/registry.rs
use crate::profile::models::{Profile, ProfileDoc};
use crate::utils::config::Settings;
use crate::utils::error::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// All loaded profiles, highest priority first.
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: Vec<Arc<Profile>>,
}

impl ProfileRegistry {
    /// Builds a registry from already compiled profiles. Ties keep their given order.
    pub fn new(profiles: Vec<Profile>) -> Self {
        let mut profiles: Vec<Arc<Profile>> = profiles.into_iter().map(Arc::new).collect();
        profiles.sort_by_key(|p| std::cmp::Reverse(p.priority()));
        Self { profiles }
    }

    /// Loads a single profile file, or every `*.yaml`/`*.yml` file of a directory in name order.
    ///
    /// A file that fails to read, parse or compile is logged and skipped.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let files = if path.is_dir() {
            profile_files(path)?
        } else if path.exists() {
            vec![path.to_path_buf()]
        } else {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "profile path does not exist"),
            });
        };

        let mut profiles = Vec::new();
        for file in &files {
            match load_file(file) {
                Ok(loaded) => {
                    tracing::debug!("Loaded {} profile(s) from {}", loaded.len(), file.display());
                    profiles.extend(loaded);
                }
                Err(e) => {
                    tracing::warn!("Skipping profile file {}: {}", file.display(), e);
                }
            }
        }

        let registry = Self::new(profiles);
        tracing::info!(
            "Profile registry ready: {} profile(s) from {} file(s)",
            registry.len(),
            files.len()
        );
        Ok(registry)
    }

    /// Loads from `settings.profiles_path`.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        Self::load(&settings.profiles_path)
    }

    /// First profile, in priority order, whose domain or URL pattern matches `url`.
    pub fn match_profile(&self, url: &str) -> Option<Arc<Profile>> {
        let found = self.profiles.iter().find(|p| p.matches(url)).cloned();
        match &found {
            Some(profile) => tracing::info!("Matched profile '{}' for {}", profile.name, url),
            None => tracing::warn!("No profile matches {}", url),
        }
        found
    }

    pub fn get(&self, name: &str) -> Option<Arc<Profile>> {
        self.profiles.iter().find(|p| p.name == name).cloned()
    }

    pub fn profiles(&self) -> &[Arc<Profile>] {
        &self.profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

fn profile_files(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let io_error = |source| ConfigError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
        if path.is_file() && is_yaml {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Reads and compiles every profile in one file.
pub fn load_file(path: &Path) -> Result<Vec<Profile>, ConfigError> {
    let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_profiles(&source)
}

/// Accepts either `profiles: [...]` or a single profile document.
pub fn parse_profiles(source: &str) -> Result<Vec<Profile>, ConfigError> {
    let document: serde_yaml::Value = serde_yaml::from_str(source)?;
    let docs: Vec<ProfileDoc> = match document {
        serde_yaml::Value::Null => Vec::new(),
        serde_yaml::Value::Mapping(mut mapping) if mapping.contains_key("profiles") => {
            match mapping.remove("profiles") {
                Some(serde_yaml::Value::Null) | None => Vec::new(),
                Some(list) => serde_yaml::from_value(list)?,
            }
        }
        other => vec![serde_yaml::from_value(other)?],
    };
    docs.into_iter().map(Profile::from_doc).collect()
}
