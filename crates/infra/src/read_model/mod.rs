//! Organization-isolated storage primitives.

pub mod org_store;

pub use org_store::{InMemoryOrgStore, OrgStore};
