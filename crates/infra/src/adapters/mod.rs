//! In-memory implementations of the forecasting ports.

pub mod inventory;
pub mod predictions;
pub mod suppliers;
pub mod usage;

pub use inventory::InMemoryInventory;
pub use predictions::InMemoryPredictionStore;
pub use suppliers::InMemorySupplierPreferences;
pub use usage::InMemoryFeatureUsage;
