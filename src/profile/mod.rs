// src/profile/mod.rs
pub mod models;
pub mod registry;

pub use models::{
    FetchConfig,
    FieldConfig,
    ItemPick,
    MatchConfig,
    ParseConfig,
    ParseKind,
    Profile,
    ProfileDoc,
};
pub use registry::ProfileRegistry;
