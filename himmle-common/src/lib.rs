use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};

mod store;

pub use store::{ChatStore, StoreEvent};

/// Identifier of the local user. Stored in `participants` and `sender_id` like any other user id.
pub const CURRENT_USER: &str = "currentUser";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: Arc<str>,
    pub username: Arc<str>,
    pub display_name: Arc<str>,
    pub avatar_url: Option<Arc<str>>,
    pub is_online: bool,
    pub date_of_birth: Option<Arc<str>>,
    pub location: Option<Arc<str>>,
    pub profession: Option<Arc<str>>,
    pub hobby: Option<Arc<str>>,
    pub bio: Option<Arc<str>>,
}

impl User {
    /// A user with no avatar, offline, and no profile details.
    pub fn new(
        id: impl Into<Arc<str>>,
        username: impl Into<Arc<str>>,
        display_name: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            display_name: display_name.into(),
            avatar_url: None,
            is_online: false,
            date_of_birth: None,
            location: None,
            profession: None,
            hobby: None,
            bio: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub id: Arc<str>,
    pub sender_id: Arc<str>,
    pub chat_id: Arc<str>,
    pub content: Arc<str>,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
    // TODO: no flow produces attachments yet; the send path always passes `None`
    pub attachments: Option<Vec<Attachment>>,
}

impl Message {
    pub fn is_from_current_user(&self) -> bool {
        &*self.sender_id == CURRENT_USER
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatKind {
    /// One-to-one conversation between the current user and a single counterpart.
    Direct,
    Group {
        name: Arc<str>,
        avatar: Option<Arc<str>>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chat {
    pub id: Arc<str>,
    pub participants: Vec<Arc<str>>,
    /// Copy of the newest message in this chat, maintained by [`ChatStore`].
    pub last_message: Option<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub kind: ChatKind,
}

impl Chat {
    pub fn direct(
        id: impl Into<Arc<str>>,
        counterpart: impl Into<Arc<str>>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            participants: vec![CURRENT_USER.into(), counterpart.into()],
            last_message: None,
            created_at,
            updated_at: created_at,
            kind: ChatKind::Direct,
        }
    }

    /// Builds a group chat. The current user is added to the front of `members` if missing.
    pub fn group(
        id: impl Into<Arc<str>>,
        members: impl IntoIterator<Item = Arc<str>>,
        name: impl Into<Arc<str>>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let mut participants = members.into_iter().collect::<Vec<_>>();
        if !participants.iter().any(|id| &**id == CURRENT_USER) {
            participants.insert(0, CURRENT_USER.into());
        }
        Self {
            id: id.into(),
            participants,
            last_message: None,
            created_at,
            updated_at: created_at,
            kind: ChatKind::Group {
                name: name.into(),
                avatar: None,
            },
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, ChatKind::Group { .. })
    }

    pub fn group_name(&self) -> Option<&str> {
        match &self.kind {
            ChatKind::Group { name, .. } => Some(name),
            ChatKind::Direct => None,
        }
    }

    pub fn group_avatar(&self) -> Option<&str> {
        match &self.kind {
            ChatKind::Group { avatar, .. } => avatar.as_deref(),
            ChatKind::Direct => None,
        }
    }

    /// The first participant that isn't the current user.
    pub fn counterpart_id(&self) -> Option<&str> {
        self.participants
            .iter()
            .map(|id| &**id)
            .find(|id| *id != CURRENT_USER)
    }

    /// Timestamp used to order the chat list: the last message, or `updated_at` for empty chats.
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_message
            .as_ref()
            .map_or(self.updated_at, |message| message.timestamp)
    }
}

/// Something another participant did, to be applied with [`ChatStore::apply`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Activity {
    Message {
        chat_id: Arc<str>,
        sender_id: Arc<str>,
        content: Arc<str>,
    },
    Presence {
        user_id: Arc<str>,
        online: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub id: Arc<str>,
    pub kind: AttachmentKind,
    pub url: Arc<str>,
    pub thumbnail_url: Option<Arc<str>>,
    /// Size in bytes.
    pub size: u64,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AttachmentKind {
    Image,
    Video,
    Document,
    Audio,
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Document => "document",
            Self::Audio => "audio",
        })
    }
}
