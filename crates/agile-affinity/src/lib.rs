//! Personality-driven affinity scoring and agile practice recommendations.
//!
//! The [`engine`] module holds the scoring, aggregation, and matching logic
//! behind [`engine::AffinityService`]; [`config`], [`telemetry`], and
//! [`error`] carry the service-level plumbing shared with the API binary.

pub mod config;
pub mod engine;
pub mod error;
pub mod telemetry;
