use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::RecordId;

/// The kinds of record kept in an id-keyed collection.
///
/// The profile is a singleton and has no kind of its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Post,
    Comment,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Post => write!(f, "post"),
            Self::Comment => write!(f, "comment"),
        }
    }
}

/// A record stored in a collection under a [`RecordId`].
///
/// `Draft` is the client-supplied payload: every field except the id. Creating
/// or replacing a record always goes through a draft so the collection stays
/// in charge of ids.
pub trait Record: Clone {
    const KIND: RecordKind;
    type Draft;

    fn id(&self) -> RecordId;

    fn from_draft(id: RecordId, draft: Self::Draft) -> Self;
}

/// A blog post.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: RecordId,
    pub title: String,
    pub author: String,
}

/// Payload for creating or replacing a [`Post`].
///
/// Missing fields deserialize to empty strings, so a replace with a partial
/// body clears the omitted fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostDraft {
    pub title: String,
    pub author: String,
}

impl PostDraft {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
        }
    }
}

impl Record for Post {
    const KIND: RecordKind = RecordKind::Post;
    type Draft = PostDraft;

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_draft(id: RecordId, draft: PostDraft) -> Self {
        Self {
            id,
            title: draft.title,
            author: draft.author,
        }
    }
}

/// A comment attached to a post.
///
/// `post_id` is a soft reference: nothing checks that the post exists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: RecordId,
    pub body: String,
    #[serde(rename = "postID")]
    pub post_id: RecordId,
}

/// Payload for creating or replacing a [`Comment`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentDraft {
    pub body: String,
    #[serde(rename = "postID")]
    pub post_id: RecordId,
}

impl CommentDraft {
    pub fn new(body: impl Into<String>, post_id: RecordId) -> Self {
        Self {
            body: body.into(),
            post_id,
        }
    }
}

impl Record for Comment {
    const KIND: RecordKind = RecordKind::Comment;
    type Draft = CommentDraft;

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_draft(id: RecordId, draft: CommentDraft) -> Self {
        Self {
            id,
            body: draft.body,
            post_id: draft.post_id,
        }
    }
}

/// The singleton profile. An unset profile is the zero value, not an absence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub name: String,
}

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns `true` for the zero-valued profile.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}
