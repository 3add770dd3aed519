//! `stockcast-core`: shared building blocks for the forecasting workspace.
//!
//! This crate contains **pure** primitives (identifiers, error model) with no
//! infrastructure concerns.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{CategoryId, ItemId, LocationId, OrganizationId, PredictionId, UserId};
