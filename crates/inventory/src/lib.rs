//! Inventory read models consumed by the forecasting engine.
//!
//! Items and change events are owned by the surrounding application; this crate
//! only describes their shape and the derivations (usage/restock amounts) the
//! forecasting code relies on. No IO, no storage.

pub mod change;
pub mod item;

pub use change::{ChangeEvent, ChangeType};
pub use item::{Item, ItemRef};
