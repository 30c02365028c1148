//! Fixture-backed value store for the guardrule engine.
//!
//! [`MemoryStore`] implements the engine's `ValueStore` and `Entity`
//! interfaces over rows loaded from a JSON fixture, and
//! [`RecordLookupCallback`] supplies root entities keyed by a record field.

pub mod callback;
pub mod error;
pub mod fixture;
pub mod memory;

pub use callback::RecordLookupCallback;
pub use error::StoreError;
pub use fixture::Fixture;
pub use memory::{MemoryStore, StoredEntity};
