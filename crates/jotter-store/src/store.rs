use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use jotter_types::{Comment, CommentDraft, Post, PostDraft, Profile, Record, RecordId};

use crate::dataset::Dataset;
use crate::error::{StoreError, StoreResult};
use crate::snapshot::{MemorySnapshot, SnapshotWriter};

/// What happens when a snapshot write fails after an operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistPolicy {
    /// Log the failure and report the operation as successful.
    #[default]
    BestEffort,
    /// Report the operation as failed with [`StoreError::Persistence`].
    /// The in-memory change is kept either way.
    Strict,
}

/// Behavior switches for a [`Store`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreOptions {
    pub policy: PersistPolicy,
    /// Remove a post's comments when the post itself is deleted.
    pub cascade_post_delete: bool,
}

/// The shared record store.
///
/// All three record collections sit behind one mutex. Every successful
/// operation, reads included, writes a full snapshot before releasing the
/// lock, so the persisted document always matches the state the operation
/// observed. Failed lookups write nothing.
pub struct Store {
    data: Mutex<Dataset>,
    snapshot: Box<dyn SnapshotWriter>,
    options: StoreOptions,
}

impl Store {
    pub fn new(snapshot: impl SnapshotWriter + 'static, options: StoreOptions) -> Self {
        Self {
            data: Mutex::new(Dataset::new()),
            snapshot: Box::new(snapshot),
            options,
        }
    }

    /// A store that snapshots into memory only.
    pub fn in_memory() -> Self {
        Self::new(MemorySnapshot::new(), StoreOptions::default())
    }

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    /// Where snapshots go.
    pub fn snapshot_location(&self) -> String {
        self.snapshot.location()
    }

    // ---- Posts ----

    pub fn list_posts(&self) -> StoreResult<Vec<Post>> {
        self.apply("list_posts", |data| Ok(data.posts.list_all().to_vec()))
    }

    pub fn get_post(&self, id: RecordId) -> StoreResult<Post> {
        self.apply("get_post", |data| {
            data.posts
                .get(id)
                .cloned()
                .ok_or_else(|| StoreError::not_found(Post::KIND, id))
        })
    }

    pub fn create_post(&self, draft: PostDraft) -> StoreResult<Post> {
        self.apply("create_post", |data| data.posts.create(draft))
    }

    pub fn update_post(&self, id: RecordId, draft: PostDraft) -> StoreResult<Post> {
        self.apply("update_post", |data| {
            data.posts
                .update(id, draft)
                .ok_or_else(|| StoreError::not_found(Post::KIND, id))
        })
    }

    /// Delete a post and return the posts that remain.
    ///
    /// Comments referencing the post are left in place unless the store was
    /// built with `cascade_post_delete`.
    pub fn delete_post(&self, id: RecordId) -> StoreResult<Vec<Post>> {
        let cascade = self.options.cascade_post_delete;
        self.apply("delete_post", |data| {
            data.posts
                .delete(id)
                .ok_or_else(|| StoreError::not_found(Post::KIND, id))?;
            if cascade {
                let removed = data.comments.remove_where(|c| c.post_id == id);
                debug!(post = %id, comments = removed.len(), "cascaded post delete");
            }
            Ok(data.posts.list_all().to_vec())
        })
    }

    /// Posts whose author equals `author` exactly.
    pub fn posts_by_author(&self, author: &str) -> StoreResult<Vec<Post>> {
        self.apply("posts_by_author", |data| {
            Ok(data.posts.filter(|p| p.author == author))
        })
    }

    // ---- Comments ----

    pub fn list_comments(&self) -> StoreResult<Vec<Comment>> {
        self.apply("list_comments", |data| Ok(data.comments.list_all().to_vec()))
    }

    pub fn get_comment(&self, id: RecordId) -> StoreResult<Comment> {
        self.apply("get_comment", |data| {
            data.comments
                .get(id)
                .cloned()
                .ok_or_else(|| StoreError::not_found(Comment::KIND, id))
        })
    }

    pub fn create_comment(&self, draft: CommentDraft) -> StoreResult<Comment> {
        self.apply("create_comment", |data| data.comments.create(draft))
    }

    pub fn update_comment(&self, id: RecordId, draft: CommentDraft) -> StoreResult<Comment> {
        self.apply("update_comment", |data| {
            data.comments
                .update(id, draft)
                .ok_or_else(|| StoreError::not_found(Comment::KIND, id))
        })
    }

    /// Delete a comment and return the comments that remain.
    pub fn delete_comment(&self, id: RecordId) -> StoreResult<Vec<Comment>> {
        self.apply("delete_comment", |data| {
            data.comments
                .delete(id)
                .ok_or_else(|| StoreError::not_found(Comment::KIND, id))?;
            Ok(data.comments.list_all().to_vec())
        })
    }

    /// Comments whose `post_id` equals `post_id`. The post need not exist.
    pub fn comments_for_post(&self, post_id: RecordId) -> StoreResult<Vec<Comment>> {
        self.apply("comments_for_post", |data| {
            Ok(data.comments.filter(|c| c.post_id == post_id))
        })
    }

    /// Remove every comment on `post_id` and return exactly those removed,
    /// in their original order.
    pub fn delete_comments_by_post(&self, post_id: RecordId) -> StoreResult<Vec<Comment>> {
        self.apply("delete_comments_by_post", |data| {
            Ok(data.comments.remove_where(|c| c.post_id == post_id))
        })
    }

    // ---- Profile ----

    pub fn profile(&self) -> StoreResult<Profile> {
        self.apply("profile", |data| Ok(data.profile.clone()))
    }

    /// Replace the profile wholesale.
    pub fn set_profile(&self, profile: Profile) -> StoreResult<Profile> {
        self.apply("set_profile", |data| {
            data.profile = profile;
            Ok(data.profile.clone())
        })
    }

    /// Reset the profile to its zero value and return it.
    pub fn clear_profile(&self) -> StoreResult<Profile> {
        self.apply("clear_profile", |data| {
            data.profile = Profile::default();
            Ok(data.profile.clone())
        })
    }

    // ---- Persistence ----

    /// Replace the in-memory state with the persisted snapshot, if one exists.
    ///
    /// Returns `true` when a snapshot was loaded.
    pub fn restore(&self) -> StoreResult<bool> {
        let Some(snapshot) = self.snapshot.load()? else {
            debug!(location = %self.snapshot.location(), "no snapshot to restore");
            return Ok(false);
        };
        let restored = Dataset::from_snapshot(snapshot);
        info!(
            location = %self.snapshot.location(),
            posts = restored.posts.len(),
            comments = restored.comments.len(),
            "restored snapshot"
        );
        *self.lock()? = restored;
        Ok(true)
    }

    /// Write a snapshot of the current state, reporting any failure
    /// regardless of the persist policy. Used for the final write on shutdown.
    pub fn flush(&self) -> StoreResult<()> {
        let data = self.lock()?;
        self.snapshot.write(&data.document())
    }

    /// Copy of the current state without writing a snapshot.
    pub fn dataset(&self) -> StoreResult<Dataset> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Dataset>> {
        self.data.lock().map_err(|_| StoreError::Poisoned)
    }

    fn apply<T, F>(&self, op: &'static str, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Dataset) -> StoreResult<T>,
    {
        let mut data = self.lock()?;
        let out = f(&mut data)?;
        self.persist(op, &data)?;
        Ok(out)
    }

    fn persist(&self, op: &'static str, data: &Dataset) -> StoreResult<()> {
        match self.snapshot.write(&data.document()) {
            Ok(()) => Ok(()),
            Err(e) => match self.options.policy {
                PersistPolicy::BestEffort => {
                    warn!(op, location = %self.snapshot.location(), error = %e, "snapshot failed");
                    Ok(())
                }
                PersistPolicy::Strict => {
                    error!(op, location = %self.snapshot.location(), error = %e, "snapshot failed");
                    Err(StoreError::Persistence(e.to_string()))
                }
            },
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("snapshot", &self.snapshot.location())
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::OwnedSnapshot;
    use crate::snapshot::JsonFileSnapshot;
    use jotter_types::RecordKind;
    use proptest::prelude::*;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn memory_store(options: StoreOptions) -> (Store, MemorySnapshot) {
        let snap = MemorySnapshot::new();
        (Store::new(snap.clone(), options), snap)
    }

    /// Writer whose writes always fail.
    struct BrokenSnapshot;

    impl SnapshotWriter for BrokenSnapshot {
        fn write(&self, _document: &crate::dataset::SnapshotDocument<'_>) -> StoreResult<()> {
            Err(StoreError::Io(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied")))
        }

        fn load(&self) -> StoreResult<Option<OwnedSnapshot>> {
            Ok(None)
        }

        fn location(&self) -> String {
            "broken".into()
        }
    }

    // -----------------------------------------------------------------------
    // Posts
    // -----------------------------------------------------------------------

    #[test]
    fn create_assigns_sequential_ids() {
        let store = Store::in_memory();
        for n in 1..=5u64 {
            let post = store.create_post(PostDraft::new(format!("t{n}"), "bob")).unwrap();
            assert_eq!(post.id, RecordId::new(n));
        }
        let ids: Vec<u64> = store.list_posts().unwrap().iter().map(|p| p.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn delete_then_create_does_not_collide() {
        let store = Store::in_memory();
        for _ in 0..3 {
            store.create_post(PostDraft::new("t", "a")).unwrap();
        }
        store.delete_post(RecordId::new(1)).unwrap();
        let fresh = store.create_post(PostDraft::new("n", "a")).unwrap();
        assert_eq!(fresh.id, RecordId::new(4));

        let ids: HashSet<RecordId> = store.list_posts().unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn get_missing_post_is_not_found() {
        let store = Store::in_memory();
        let err = store.get_post(RecordId::new(1)).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "post not found: 1");
    }

    #[test]
    fn update_missing_leaves_state_unchanged() {
        let (store, snap) = memory_store(StoreOptions::default());
        store.create_post(PostDraft::new("A", "bob")).unwrap();
        let before = store.dataset().unwrap();
        let writes = snap.write_count();

        let err = store.update_post(RecordId::new(9), PostDraft::new("x", "y")).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.dataset().unwrap(), before);
        assert_eq!(snap.write_count(), writes, "failed lookups write no snapshot");
    }

    #[test]
    fn update_replaces_whole_record() {
        let store = Store::in_memory();
        store.create_post(PostDraft::new("A", "bob")).unwrap();
        let updated = store
            .update_post(RecordId::new(1), PostDraft { title: "B".into(), ..Default::default() })
            .unwrap();
        assert_eq!(updated, Post { id: RecordId::new(1), title: "B".into(), author: String::new() });
        assert_eq!(store.get_post(RecordId::new(1)).unwrap(), updated);
    }

    #[test]
    fn delete_post_returns_remaining() {
        let store = Store::in_memory();
        for t in ["a", "b", "c"] {
            store.create_post(PostDraft::new(t, "x")).unwrap();
        }
        let remaining = store.delete_post(RecordId::new(2)).unwrap();
        assert_eq!(remaining.iter().map(|p| p.title.as_str()).collect::<Vec<_>>(), ["a", "c"]);
        assert!(store.delete_post(RecordId::new(2)).unwrap_err().is_not_found());
    }

    #[test]
    fn delete_post_keeps_comments_by_default() {
        let store = Store::in_memory();
        let post = store.create_post(PostDraft::new("A", "bob")).unwrap();
        store.create_comment(CommentDraft::new("c", post.id)).unwrap();

        store.delete_post(post.id).unwrap();
        assert_eq!(store.comments_for_post(post.id).unwrap().len(), 1);
    }

    #[test]
    fn delete_post_cascades_when_enabled() {
        let (store, _) = memory_store(StoreOptions { cascade_post_delete: true, ..Default::default() });
        let a = store.create_post(PostDraft::new("A", "bob")).unwrap();
        let b = store.create_post(PostDraft::new("B", "bob")).unwrap();
        store.create_comment(CommentDraft::new("on a", a.id)).unwrap();
        store.create_comment(CommentDraft::new("on b", b.id)).unwrap();

        store.delete_post(a.id).unwrap();
        let left = store.list_comments().unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].post_id, b.id);
    }

    #[test]
    fn posts_by_author_is_exact() {
        let store = Store::in_memory();
        store.create_post(PostDraft::new("1", "bob")).unwrap();
        store.create_post(PostDraft::new("2", "Bob")).unwrap();
        store.create_post(PostDraft::new("3", "bob")).unwrap();
        let bobs = store.posts_by_author("bob").unwrap();
        assert_eq!(bobs.iter().map(|p| p.id.get()).collect::<Vec<_>>(), vec![1, 3]);
        assert!(store.posts_by_author("nobody").unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // Comments
    // -----------------------------------------------------------------------

    #[test]
    fn delete_comments_by_post_removes_exactly_matches() {
        let store = Store::in_memory();
        for post in [1, 1, 2, 1, 3, 2] {
            store.create_comment(CommentDraft::new(format!("p{post}"), RecordId::new(post))).unwrap();
        }

        let removed = store.delete_comments_by_post(RecordId::new(1)).unwrap();
        assert_eq!(removed.iter().map(|c| c.id.get()).collect::<Vec<_>>(), vec![1, 2, 4]);
        assert!(removed.iter().all(|c| c.post_id == RecordId::new(1)));

        let left = store.list_comments().unwrap();
        assert_eq!(left.iter().map(|c| c.id.get()).collect::<Vec<_>>(), vec![3, 5, 6]);
    }

    #[test]
    fn delete_comments_by_post_with_no_matches() {
        let store = Store::in_memory();
        store.create_comment(CommentDraft::new("x", RecordId::new(1))).unwrap();
        assert!(store.delete_comments_by_post(RecordId::new(5)).unwrap().is_empty());
        assert_eq!(store.list_comments().unwrap().len(), 1);
    }

    #[test]
    fn comment_crud() {
        let store = Store::in_memory();
        let c = store.create_comment(CommentDraft::new("first", RecordId::new(4))).unwrap();
        assert_eq!(c.id, RecordId::FIRST);
        assert_eq!(store.get_comment(c.id).unwrap().body, "first");

        let u = store.update_comment(c.id, CommentDraft::new("edited", RecordId::new(5))).unwrap();
        assert_eq!(u.post_id, RecordId::new(5));

        assert!(store.delete_comment(c.id).unwrap().is_empty());
        assert!(store.get_comment(c.id).unwrap_err().is_not_found());
    }

    // -----------------------------------------------------------------------
    // Profile
    // -----------------------------------------------------------------------

    #[test]
    fn profile_lifecycle() {
        let store = Store::in_memory();
        assert!(store.profile().unwrap().is_empty());
        store.set_profile(Profile::new("ann")).unwrap();
        assert_eq!(store.profile().unwrap().name, "ann");
        assert!(store.clear_profile().unwrap().is_empty());
        assert!(store.profile().unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    #[test]
    fn snapshot_matches_state_after_each_mutation() {
        let (store, snap) = memory_store(StoreOptions::default());

        store.create_post(PostDraft::new("A", "bob")).unwrap();
        store.create_comment(CommentDraft::new("hi", RecordId::new(1))).unwrap();
        store.set_profile(Profile::new("ann")).unwrap();
        assert_eq!(
            snap.last().unwrap(),
            json!({
                "posts": [{"id": 1, "title": "A", "author": "bob"}],
                "comments": [{"id": 1, "body": "hi", "postID": 1}],
                "profile": {"name": "ann"},
            })
        );

        store.delete_post(RecordId::new(1)).unwrap();
        assert_eq!(snap.last().unwrap()["posts"], json!([]));
    }

    #[test]
    fn reads_also_snapshot() {
        let (store, snap) = memory_store(StoreOptions::default());
        store.list_posts().unwrap();
        store.list_comments().unwrap();
        store.profile().unwrap();
        assert_eq!(snap.write_count(), 3);
    }

    #[test]
    fn best_effort_swallows_snapshot_failure() {
        let store = Store::new(BrokenSnapshot, StoreOptions::default());
        let post = store.create_post(PostDraft::new("A", "bob")).unwrap();
        assert_eq!(post.id, RecordId::FIRST);
    }

    #[test]
    fn strict_reports_snapshot_failure_but_keeps_change() {
        let store = Store::new(
            BrokenSnapshot,
            StoreOptions { policy: PersistPolicy::Strict, ..Default::default() },
        );
        let err = store.create_post(PostDraft::new("A", "bob")).unwrap_err();
        assert!(matches!(err, StoreError::Persistence(_)));
        assert_eq!(store.dataset().unwrap().posts.len(), 1);
    }

    #[test]
    fn flush_reports_failure_regardless_of_policy() {
        let store = Store::new(BrokenSnapshot, StoreOptions::default());
        assert!(store.flush().is_err());
    }

    #[test]
    fn restore_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");

        let first = Store::new(JsonFileSnapshot::new(&path), StoreOptions::default());
        first.create_post(PostDraft::new("A", "bob")).unwrap();
        first.create_post(PostDraft::new("B", "bob")).unwrap();
        first.set_profile(Profile::new("ann")).unwrap();

        let second = Store::new(JsonFileSnapshot::new(&path), StoreOptions::default());
        assert!(second.restore().unwrap());
        assert_eq!(second.dataset().unwrap(), first.dataset().unwrap());
        assert_eq!(second.create_post(PostDraft::default()).unwrap().id, RecordId::new(3));
    }

    #[test]
    fn restored_counter_at_max_refuses_further_creates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        std::fs::write(
            &path,
            json!({
                "posts": [{"id": u64::MAX - 1, "title": "old", "author": "bob"}],
                "comments": [],
                "profile": {"name": ""},
            })
            .to_string(),
        )
        .unwrap();

        let store = Store::new(JsonFileSnapshot::new(&path), StoreOptions::default());
        assert!(store.restore().unwrap());

        let a = store.create_post(PostDraft::new("a", "bob")).unwrap();
        assert_eq!(a.id, RecordId::new(u64::MAX));

        let err = store.create_post(PostDraft::new("b", "bob")).unwrap_err();
        assert!(matches!(err, StoreError::IdsExhausted(RecordKind::Post)));

        let ids: HashSet<RecordId> = store.list_posts().unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn restore_without_snapshot_is_noop() {
        let store = Store::in_memory();
        assert!(!store.restore().unwrap());
        assert!(store.list_posts().unwrap().is_empty());
    }

    #[test]
    fn concurrent_creates_get_distinct_ids() {
        let store = Arc::new(Store::in_memory());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    (0..25)
                        .map(|_| store.create_post(PostDraft::new("t", "a")).unwrap().id)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let ids: HashSet<RecordId> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        assert_eq!(ids.len(), 200);
        assert_eq!(store.list_posts().unwrap().len(), 200);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Create,
        Delete(u64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![Just(Op::Create), (1u64..20).prop_map(Op::Delete)]
    }

    proptest! {
        #[test]
        fn ids_stay_unique_under_any_create_delete_sequence(ops in prop::collection::vec(op(), 0..60)) {
            let store = Store::in_memory();
            let mut ever_assigned = HashSet::new();
            for op in ops {
                match op {
                    Op::Create => {
                        let post = store.create_post(PostDraft::default()).unwrap();
                        prop_assert!(ever_assigned.insert(post.id), "id {} reused", post.id);
                    }
                    Op::Delete(id) => {
                        let _ = store.delete_post(RecordId::new(id));
                    }
                }
            }
            let live = store.list_posts().unwrap();
            let unique: HashSet<RecordId> = live.iter().map(|p| p.id).collect();
            prop_assert_eq!(unique.len(), live.len());
        }
    }
}
