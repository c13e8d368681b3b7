use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{Activity, Chat, Message, User, CURRENT_USER};

const EVENT_CAPACITY: usize = 64;

/// Change notifications published by [`ChatStore`] after each mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    MessageSent {
        chat_id: Arc<str>,
        message_id: Arc<str>,
    },
    PresenceChanged {
        user_id: Arc<str>,
        online: bool,
    },
    ChatRead {
        chat_id: Arc<str>,
    },
}

/// In-memory owner of all users, chats and messages.
///
/// Invariants kept after every mutation:
/// - `chats` is ordered by [`Chat::last_activity`], newest first;
/// - each message sequence is sorted by timestamp, oldest first;
/// - `Chat::last_message` is a copy of the newest message stored for that chat.
#[derive(Debug)]
pub struct ChatStore {
    users: Vec<User>,
    chats: Vec<Chat>,
    messages: HashMap<Arc<str>, Vec<Message>>,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for ChatStore {
    fn default() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            users: Vec::new(),
            chats: Vec::new(),
            messages: HashMap::new(),
            events,
        }
    }
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembles a store from prepared data, re-establishing the ordering and `last_message`
    /// invariants regardless of how the input was arranged.
    pub fn from_parts(
        users: Vec<User>,
        chats: Vec<Chat>,
        mut messages: HashMap<Arc<str>, Vec<Message>>,
    ) -> Self {
        for sequence in messages.values_mut() {
            sequence.sort_by_key(|message| message.timestamp);
        }
        let mut store = Self {
            users,
            chats,
            messages,
            ..Self::default()
        };
        for chat in &mut store.chats {
            chat.last_message = store
                .messages
                .get(&chat.id)
                .and_then(|sequence| sequence.last())
                .cloned();
        }
        store.sort_chats();
        store
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn chats(&self) -> &[Chat] {
        &self.chats
    }

    pub fn messages(&self) -> &HashMap<Arc<str>, Vec<Message>> {
        &self.messages
    }

    pub fn get_user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|user| &*user.id == id)
    }

    pub fn get_chat(&self, id: &str) -> Option<&Chat> {
        self.chats.iter().find(|chat| &*chat.id == id)
    }

    /// Messages stored for `chat_id`; empty for ids that were never used.
    pub fn get_messages(&self, chat_id: &str) -> &[Message] {
        self.messages.get(chat_id).map_or(&[], Vec::as_slice)
    }

    /// Sends `content` to `chat_id` on behalf of the current user.
    pub fn send_message(&mut self, content: impl Into<Arc<str>>, chat_id: &str) -> Message {
        self.send_message_as(content, chat_id, CURRENT_USER)
    }

    /// Adds a new unread message to `chat_id`, stamped with the current time.
    ///
    /// The message goes after every stored message that isn't newer than it, so a sequence
    /// holding future-dated messages stays sorted and keeps its newest message as the last one.
    /// Unknown chat ids still get their message sequence; only the chat list is left alone.
    pub fn send_message_as(
        &mut self,
        content: impl Into<Arc<str>>,
        chat_id: &str,
        sender_id: impl Into<Arc<str>>,
    ) -> Message {
        let message = Message {
            id: Uuid::now_v7().to_string().into(),
            sender_id: sender_id.into(),
            chat_id: chat_id.into(),
            content: content.into(),
            timestamp: Utc::now(),
            is_read: false,
            attachments: None,
        };
        let sequence = self.messages.entry(message.chat_id.clone()).or_default();
        let at = sequence.partition_point(|stored| stored.timestamp <= message.timestamp);
        sequence.insert(at, message.clone());
        let last = sequence.last().cloned();

        match self.chats.iter().position(|chat| &*chat.id == chat_id) {
            Some(idx) => {
                self.chats[idx].last_message = last;
                self.sort_chats();
            }
            None => tracing::debug!(chat_id, "message stored for unknown chat"),
        }
        tracing::debug!(
            chat_id,
            message_id = %message.id,
            sender_id = %message.sender_id,
            "message sent"
        );

        self.notify(StoreEvent::MessageSent {
            chat_id: message.chat_id.clone(),
            message_id: message.id.clone(),
        });
        message
    }

    pub fn apply(&mut self, activity: Activity) {
        match activity {
            Activity::Message {
                chat_id,
                sender_id,
                content,
            } => {
                self.send_message_as(content, &chat_id, sender_id);
            }
            Activity::Presence { user_id, online } => {
                if !self.set_online(&user_id, online) {
                    tracing::debug!(%user_id, "presence for unknown user");
                }
            }
        }
    }

    /// Returns `false` if no user has the given id.
    pub fn set_online(&mut self, user_id: &str, online: bool) -> bool {
        let Some(user) = self.users.iter_mut().find(|user| &*user.id == user_id) else {
            return false;
        };
        if user.is_online != online {
            user.is_online = online;
            tracing::debug!(user_id, online, "presence changed");
            let user_id = user.id.clone();
            self.notify(StoreEvent::PresenceChanged { user_id, online });
        }
        true
    }

    /// Marks every incoming message in the chat as read and returns how many changed.
    pub fn mark_read(&mut self, chat_id: &str) -> usize {
        let Some(sequence) = self.messages.get_mut(chat_id) else {
            return 0;
        };
        let mut changed = 0;
        for message in sequence
            .iter_mut()
            .filter(|message| !message.is_read && !message.is_from_current_user())
        {
            message.is_read = true;
            changed += 1;
        }
        if changed == 0 {
            return 0;
        }

        let last = sequence.last().cloned();
        if let Some(chat) = self.chats.iter_mut().find(|chat| &*chat.id == chat_id) {
            chat.last_message = last;
        }
        tracing::debug!(chat_id, changed, "chat marked read");
        self.notify(StoreEvent::ChatRead {
            chat_id: chat_id.into(),
        });
        changed
    }

    /// Incoming messages in the chat that haven't been read yet.
    pub fn unread_count(&self, chat_id: &str) -> usize {
        self.get_messages(chat_id)
            .iter()
            .filter(|message| !message.is_read && !message.is_from_current_user())
            .count()
    }

    /// The other user of a direct chat. `None` for groups and for unknown user ids.
    pub fn counterpart(&self, chat: &Chat) -> Option<&User> {
        if chat.is_group() {
            return None;
        }
        chat.counterpart_id().and_then(|id| self.get_user(id))
    }

    pub fn chat_display_name<'a>(&'a self, chat: &'a Chat) -> &'a str {
        self.searchable_name(chat).unwrap_or("Unknown User")
    }

    /// Chats whose display name contains `query`, ignoring case, newest first.
    pub fn search_chats(&self, query: &str) -> Vec<&Chat> {
        let query = query.to_lowercase();
        if query.is_empty() {
            return self.chats.iter().collect();
        }
        self.chats
            .iter()
            .filter(|chat| {
                self.searchable_name(chat)
                    .is_some_and(|name| name.to_lowercase().contains(&query))
            })
            .collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn searchable_name<'a>(&'a self, chat: &'a Chat) -> Option<&'a str> {
        match chat.group_name() {
            Some(name) => Some(name),
            None => self.counterpart(chat).map(|user| &*user.display_name),
        }
    }

    fn sort_chats(&mut self) {
        self.chats.sort_by(|a, b| b.last_activity().cmp(&a.last_activity()));
    }

    fn notify(&self, event: StoreEvent) {
        // an error only means nobody is subscribed
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration};

    use super::*;

    fn epoch() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn message(id: &str, chat_id: &str, sender_id: &str, minutes: i64, is_read: bool) -> Message {
        Message {
            id: id.into(),
            sender_id: sender_id.into(),
            chat_id: chat_id.into(),
            content: format!("message {id}").into(),
            timestamp: epoch() + Duration::minutes(minutes),
            is_read,
            attachments: None,
        }
    }

    fn store() -> ChatStore {
        let mut john = User::new("user1", "johnsmith", "John Smith");
        john.is_online = true;
        let users = vec![john, User::new("user2", "sarahjohnson", "Sarah Johnson")];
        let chats = vec![
            Chat::direct("chat1", "user1", epoch()),
            Chat::direct("chat2", "user2", epoch()),
            Chat::group(
                "group",
                ["user1", "user2"].map(Arc::<str>::from),
                "Friends",
                epoch(),
            ),
            Chat::direct("chat9", "user9", epoch() - Duration::days(1)),
        ];
        let messages = HashMap::from([
            (
                "chat1".into(),
                vec![
                    message("c1-b", "chat1", CURRENT_USER, 20, true),
                    message("c1-a", "chat1", "user1", 10, true),
                ],
            ),
            (
                "chat2".into(),
                vec![
                    message("c2-a", "chat2", "user2", 5, true),
                    message("c2-b", "chat2", "user2", 30, false),
                ],
            ),
            (
                "group".into(),
                vec![
                    message("g-a", "group", "user1", 1, false),
                    message("g-b", "group", CURRENT_USER, 2, true),
                ],
            ),
        ]);
        ChatStore::from_parts(users, chats, messages)
    }

    fn chat_ids(store: &ChatStore) -> Vec<&str> {
        store.chats().iter().map(|chat| &*chat.id).collect()
    }

    #[test]
    fn from_parts_restores_invariants() {
        let store = store();
        assert_eq!(chat_ids(&store), ["chat2", "chat1", "group", "chat9"]);

        let chat1 = store.get_messages("chat1");
        assert_eq!(&*chat1[0].id, "c1-a");
        assert_eq!(&*chat1[1].id, "c1-b");
        for chat in store.chats() {
            assert_eq!(
                chat.last_message.as_ref(),
                store.get_messages(&chat.id).last()
            );
        }
    }

    #[test]
    fn lookups_return_none_for_unknown_ids() {
        let store = store();
        assert_eq!(store.get_user("nonexistent"), None);
        assert_eq!(store.get_chat("nonexistent"), None);
        assert!(store.get_messages("nonexistent").is_empty());

        let john = store.get_user("user1").unwrap();
        assert_eq!(&*john.display_name, "John Smith");
        assert!(john.is_online);
    }

    #[test]
    fn lookups_are_repeatable() {
        let store = store();
        assert_eq!(store.get_user("user2"), store.get_user("user2"));
        assert_eq!(store.get_chat("chat1"), store.get_chat("chat1"));
        assert_eq!(store.get_messages("chat2"), store.get_messages("chat2"));
    }

    #[test]
    fn send_message_appends_and_updates_chat() {
        let mut store = store();
        let before = store.get_messages("chat9").len();

        let sent = store.send_message("hello", "chat9");

        let messages = store.get_messages("chat9");
        assert_eq!(messages.len(), before + 1);
        let last = messages.last().unwrap();
        assert_eq!(last, &sent);
        assert_eq!(&*last.content, "hello");
        assert_eq!(&*last.sender_id, CURRENT_USER);
        assert!(!last.is_read);
        assert_eq!(last.attachments, None);

        let chat = store.get_chat("chat9").unwrap();
        assert_eq!(chat.last_message.as_ref(), Some(&sent));
        assert_eq!(chat.updated_at, epoch() - Duration::days(1));
        assert_eq!(chat_ids(&store)[0], "chat9");
    }

    #[test]
    fn send_message_keeps_future_messages_last() {
        let now = Utc::now();
        let mut scheduled = message("later", "chat1", "user1", 0, true);
        scheduled.timestamp = now + Duration::hours(1);
        let mut store = ChatStore::from_parts(
            vec![User::new("user1", "johnsmith", "John Smith")],
            vec![Chat::direct("chat1", "user1", now)],
            HashMap::from([("chat1".into(), vec![scheduled.clone()])]),
        );

        let sent = store.send_message("now", "chat1");

        let messages = store.get_messages("chat1");
        assert_eq!(messages, [sent, scheduled.clone()]);
        assert!(messages
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp));
        let chat = store.get_chat("chat1").unwrap();
        assert_eq!(chat.last_message.as_ref(), Some(&scheduled));
    }

    #[test]
    fn send_message_as_uses_given_sender() {
        let mut store = store();
        let sent = store.send_message_as("yo", "chat2", "user2");
        assert_eq!(&*sent.sender_id, "user2");
        assert_eq!(store.unread_count("chat2"), 2);
    }

    #[test]
    fn send_message_ids_are_unique() {
        let mut store = store();
        let a = store.send_message("a", "chat1");
        let b = store.send_message("b", "chat1");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn send_message_to_unknown_chat_only_records_message() {
        let mut store = store();
        let chats_before = store.chats().to_vec();

        store.send_message("lost", "nowhere");

        let messages = store.get_messages("nowhere");
        assert_eq!(messages.len(), 1);
        assert_eq!(&*messages[0].content, "lost");
        assert_eq!(store.chats(), chats_before.as_slice());
        assert_eq!(store.get_chat("nowhere"), None);
    }

    #[test]
    fn empty_content_is_accepted() {
        let mut store = store();
        store.send_message("", "chat1");
        assert_eq!(&*store.get_messages("chat1").last().unwrap().content, "");
    }

    #[test]
    fn unread_count_ignores_own_messages() {
        let mut store = store();
        assert_eq!(store.unread_count("chat2"), 1);
        assert_eq!(store.unread_count("group"), 1);
        store.send_message("mine", "group");
        assert_eq!(store.unread_count("group"), 1);
        assert_eq!(store.unread_count("nonexistent"), 0);
    }

    #[test]
    fn mark_read_clears_incoming_unread() {
        let mut store = store();
        store.send_message("mine", "chat2");

        assert_eq!(store.mark_read("chat2"), 1);
        assert_eq!(store.unread_count("chat2"), 0);
        // own message stays unread
        assert!(!store.get_messages("chat2").last().unwrap().is_read);
        assert_eq!(store.mark_read("chat2"), 0);
        assert_eq!(store.mark_read("nonexistent"), 0);
    }

    #[test]
    fn mark_read_refreshes_last_message() {
        let mut store = store();
        store.mark_read("chat2");
        let chat = store.get_chat("chat2").unwrap();
        assert!(chat.last_message.as_ref().unwrap().is_read);
    }

    #[test]
    fn set_online_updates_known_users() {
        let mut store = store();
        assert!(store.set_online("user2", true));
        assert!(store.get_user("user2").unwrap().is_online);
        assert!(!store.set_online("nonexistent", true));
    }

    #[test]
    fn apply_routes_activity() {
        let mut store = store();
        store.apply(Activity::Message {
            chat_id: "chat1".into(),
            sender_id: "user1".into(),
            content: "from john".into(),
        });
        let last = store.get_messages("chat1").last().unwrap();
        assert_eq!(&*last.sender_id, "user1");
        assert_eq!(&*last.content, "from john");
        assert_eq!(store.unread_count("chat1"), 1);

        store.apply(Activity::Presence {
            user_id: "user2".into(),
            online: true,
        });
        assert!(store.get_user("user2").unwrap().is_online);
        store.apply(Activity::Presence {
            user_id: "ghost".into(),
            online: true,
        });
    }

    #[test]
    fn display_names() {
        let store = store();
        let name = |id| store.chat_display_name(store.get_chat(id).unwrap());
        assert_eq!(name("chat1"), "John Smith");
        assert_eq!(name("group"), "Friends");
        assert_eq!(name("chat9"), "Unknown User");
        assert_eq!(store.counterpart(store.get_chat("group").unwrap()), None);
    }

    #[test]
    fn search_is_case_insensitive_and_ordered() {
        let store = store();
        let ids = |query| {
            store
                .search_chats(query)
                .into_iter()
                .map(|chat| &*chat.id)
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(""), ["chat2", "chat1", "group", "chat9"]);
        assert_eq!(ids("SMITH"), ["chat1"]);
        assert_eq!(ids("john"), ["chat2", "chat1"]);
        assert_eq!(ids("fri"), ["group"]);
        assert_eq!(ids("son"), ["chat2"]);
        // whitespace is part of the query
        assert!(ids(" ").is_empty());
        assert!(ids("smith ").is_empty());
        assert_eq!(ids("john "), ["chat1"]);
        // unknown counterparts never match, not even on the fallback name
        assert!(ids("unknown").is_empty());
    }

    #[test]
    fn subscribers_see_mutations() {
        let mut store = store();
        let mut events = store.subscribe();

        let sent = store.send_message("hello", "chat1");
        store.set_online("user1", false);
        store.set_online("user1", false);
        store.mark_read("chat2");

        assert_eq!(
            events.try_recv().unwrap(),
            StoreEvent::MessageSent {
                chat_id: "chat1".into(),
                message_id: sent.id,
            }
        );
        assert_eq!(
            events.try_recv().unwrap(),
            StoreEvent::PresenceChanged {
                user_id: "user1".into(),
                online: false,
            }
        );
        assert_eq!(
            events.try_recv().unwrap(),
            StoreEvent::ChatRead {
                chat_id: "chat2".into(),
            }
        );
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn mutations_without_subscribers_succeed() {
        let mut store = ChatStore::new();
        store.send_message("hello", "chat1");
        assert_eq!(store.get_messages("chat1").len(), 1);
    }
}
