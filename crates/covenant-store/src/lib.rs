//! Covenant contract store.
//!
//! Versioned repository and exclusive lifecycle owner for contracts and
//! their clause sets. Mutations are version-CAS'd per contract, history is
//! append-only, and `submit_for_review` enforces Gate 1 before a contract
//! can reach legal review.

pub mod error;
pub mod history;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use history::{AuditEvent, VersionRecord};
pub use store::ContractStore;
