//! Record types for jotter.
//!
//! Every other jotter crate depends on `jotter-types`. The types here are
//! plain data: they serialize to the JSON shapes used both on the wire and in
//! the snapshot file.
//!
//! # Key Types
//!
//! - [`RecordId`] — Numeric identifier assigned by a collection on create
//! - [`Post`] / [`PostDraft`] — A post and the payload that creates or replaces it
//! - [`Comment`] / [`CommentDraft`] — A comment with a soft reference to a post
//! - [`Profile`] — The singleton profile record
//! - [`Record`] — Trait tying a record to its draft and kind

pub mod error;
pub mod id;
pub mod record;

pub use error::TypeError;
pub use id::RecordId;
pub use record::{Comment, CommentDraft, Post, PostDraft, Profile, Record, RecordKind};
