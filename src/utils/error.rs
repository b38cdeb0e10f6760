// src/utils/error.rs
use std::path::PathBuf;
use thiserror::Error;

// Errors raised while loading and compiling profile files
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Profile is missing a name (or id)")]
    MissingName,

    #[error("Profile '{profile}': {message}")]
    Invalid { profile: String, message: String },

    #[error("Unknown transform type: {0}")]
    UnknownTransform(String),

    #[error("Unknown list process method: {0}")]
    UnknownProcess(String),

    #[error("Unknown strategy type: {0}")]
    UnknownStrategy(String),

    #[error("Invalid regular expression '{pattern}': {message}")]
    Regex { pattern: String, message: String },

    #[error("Invalid path query '{query}': {message}")]
    PathQuery { query: String, message: String },

    #[error("Invalid '{kind}' config: {message}")]
    TransformConfig { kind: &'static str, message: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message} at offset {offset}")]
pub struct PathSyntaxError {
    pub offset: usize,
    pub message: String,
}

// A selector candidate neither engine could interpret
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectorError {
    #[error("Selector '{selector}' is not valid CSS ({css}) nor a valid path query ({path})")]
    Unsupported {
        selector: String,
        css: String,
        path: String,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("Cannot join '{value}' onto base '{base}': {message}")]
    UrlJoin {
        value: String,
        base: String,
        message: String,
    },
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("HTTP error: {status} for {url}")]
    Http { status: reqwest::StatusCode, url: String },

    #[error("Gave up on {url} after {attempts} attempts: {last}")]
    Exhausted {
        url: String,
        attempts: u32,
        last: String,
    },
}

#[derive(Error, Debug)]
pub enum DictionaryError {
    #[error("Failed to read dictionary {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse dictionary {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Image fetching failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Dictionary error: {0}")]
    Dictionary(#[from] DictionaryError),
}
