//! Durable baseline store for the vigil file integrity monitor.
//!
//! This crate owns the persisted mapping from file path to last-known
//! content digest. Detecting change *across* process runs is the whole
//! point of the monitor, so the store is backed by SQLite rather than
//! memory: a single `files` table keyed by path, surviving restarts.
//!
//! # Concurrency
//!
//! All access goes through one serialized connection behind a mutex. Scans
//! are the only writer; reporting collaborators may call
//! [`StateStore::all_records`] while a scan is in flight and will observe
//! each record either before or after its upsert, never torn.
//!
//! # Example
//!
//! ```no_run
//! use vigil_store::StateStore;
//! use vigil_core::{Classification, Digest};
//! use camino::Utf8Path;
//!
//! # fn main() -> Result<(), vigil_store::StoreError> {
//! let store = StateStore::open(Utf8Path::new("vigil.db"))?;
//!
//! let digest = Digest::from_bytes([0u8; 32]);
//! let outcome = store.upsert(Utf8Path::new("/watched/a.txt"), &digest, 1_700_000_000)?;
//! assert_eq!(outcome.classification, Classification::New);
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod error;
mod schema;
mod store;

pub use error::StoreError;
pub use store::{StateStore, Upsert};
