//! Infrastructure layer: in-memory adapters for the forecasting ports and
//! configuration loading.

pub mod adapters;
pub mod config;
pub mod read_model;


pub use adapters::{
    InMemoryFeatureUsage, InMemoryInventory, InMemoryPredictionStore, InMemorySupplierPreferences,
};
