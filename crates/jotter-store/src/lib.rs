//! Record storage for jotter.
//!
//! Posts, comments and the profile live in memory inside a single [`Store`].
//! After every successful operation the store serializes its entire state
//! through a [`SnapshotWriter`], so the persisted document is always a full
//! copy of memory.
//!
//! # Key Types
//!
//! - [`Collection`] — Ordered records with a monotonic id counter
//! - [`Dataset`] — The two collections plus the profile
//! - [`Store`] — One lock around the dataset, snapshot after each call
//! - [`JsonFileSnapshot`] — Indented JSON file, replaced atomically
//! - [`MemorySnapshot`] — Keeps the last document in memory
//!
//! # Rules
//!
//! 1. Ids are assigned from a counter and never reused.
//! 2. Updates replace the whole record; the id is kept.
//! 3. Deleting a post leaves its comments alone unless cascading is enabled.
//! 4. Snapshot failures are logged; they only fail the call under
//!    [`PersistPolicy::Strict`].

pub mod collection;
pub mod dataset;
pub mod error;
pub mod snapshot;
pub mod store;

pub use collection::Collection;
pub use dataset::{Dataset, OwnedSnapshot, SnapshotDocument};
pub use error::{StoreError, StoreResult};
pub use snapshot::{render, JsonFileSnapshot, MemorySnapshot, SnapshotWriter};
pub use store::{PersistPolicy, Store, StoreOptions};
