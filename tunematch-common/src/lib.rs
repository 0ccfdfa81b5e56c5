//! # TuneMatch Common Library
//!
//! Shared code for the TuneMatch scorer and its callers:
//! - Profile data model (themes, moods, activities) in its upstream wire shape
//! - Configuration loading (TOML + environment + compiled defaults)
//! - Logging bootstrap
//! - Common error type

pub mod config;
pub mod error;
pub mod logging;
pub mod models;

pub use error::{Error, Result};
pub use models::{
    DominantMood, GroundTruth, ModelVariant, MoodRequest, MoodStep, Profile, RankingRequest,
    SongEntry, Theme, TrackInfo,
};
