use serde::{Deserialize, Deserializer, Serialize};

use jotter_types::{Comment, Post, Profile};

use crate::collection::Collection;

/// The complete in-memory state: both collections and the profile.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dataset {
    pub posts: Collection<Post>,
    pub comments: Collection<Comment>,
    pub profile: Profile,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the state as a snapshot document.
    pub fn document(&self) -> SnapshotDocument<'_> {
        SnapshotDocument {
            posts: self.posts.list_all(),
            comments: self.comments.list_all(),
            profile: &self.profile,
        }
    }

    /// Rebuild state from a loaded snapshot. Id counters resume after the
    /// highest stored id of each collection.
    pub fn from_snapshot(snapshot: OwnedSnapshot) -> Self {
        Self {
            posts: Collection::from_records(snapshot.posts),
            comments: Collection::from_records(snapshot.comments),
            profile: snapshot.profile,
        }
    }
}

/// The persisted layout, borrowed from a [`Dataset`].
///
/// Field order is the on-disk key order.
#[derive(Debug, Serialize)]
pub struct SnapshotDocument<'a> {
    pub posts: &'a [Post],
    pub comments: &'a [Comment],
    pub profile: &'a Profile,
}

/// The persisted layout, owned. Produced when a snapshot file is read back.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct OwnedSnapshot {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub posts: Vec<Post>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub profile: Profile,
}

// Older snapshot files encode empty collections as `null`.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
