// src/lib.rs
//! Profile-driven structured extraction from rendered HTML pages.
//!
//! A [`ProfileRegistry`] picks the profile for a URL, and an [`ExtractEngine`] applies it to a
//! [`Page`] to produce a [`Record`].

pub mod dictionary;
pub mod extractors;
pub mod fetch;
pub mod models;
pub mod profile;
pub mod transforms;
pub mod utils;

pub use dictionary::{AliasDictionary, DictionaryStore};
pub use extractors::ExtractEngine;
pub use fetch::{HttpImageFetcher, ImageFetcher, RetryPolicy};
pub use models::{FieldError, ImageData, Item, Page, Record};
pub use profile::{Profile, ProfileRegistry};
pub use utils::{AppError, Settings};
