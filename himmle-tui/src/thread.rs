use std::sync::Arc;

use chrono::Local;
use himmle_common::{Chat, ChatStore};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget, Wrap},
};

/// A chat opened for reading and replying.
#[derive(Debug)]
pub struct OpenChat {
    pub chat_id: Arc<str>,
    pub input: String,
}

impl OpenChat {
    pub fn new(chat_id: Arc<str>) -> Self {
        Self {
            chat_id,
            input: String::new(),
        }
    }
}

pub struct ChatThread<'a> {
    store: &'a ChatStore,
    chat: &'a OpenChat,
}

impl<'a> ChatThread<'a> {
    pub fn new(store: &'a ChatStore, chat: &'a OpenChat) -> Self {
        Self { store, chat }
    }
}

impl Widget for ChatThread<'_> {
    fn render(self, area: Rect, buffer: &mut Buffer) {
        let [header, body, input] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .areas(area);

        header_line(self.store, &self.chat.chat_id).render(header, buffer);

        // scroll so the newest message sits at the bottom once wrapped
        let thread = Paragraph::new(thread_lines(self.store, &self.chat.chat_id))
            .wrap(Wrap { trim: false });
        let overflow = thread
            .line_count(body.width)
            .saturating_sub(usize::from(body.height));
        thread
            .scroll((u16::try_from(overflow).unwrap_or(u16::MAX), 0))
            .render(body, buffer);

        Paragraph::new(self.chat.input.as_str())
            .block(Block::bordered().title(" Message "))
            .render(input, buffer);
    }
}

fn header_line(store: &ChatStore, chat_id: &str) -> Line<'static> {
    let Some(chat) = store.get_chat(chat_id) else {
        return Line::from(chat_id.to_owned()).bold();
    };
    let status = match store.counterpart(chat) {
        Some(user) if user.is_online => "online".to_owned(),
        Some(_) => "offline".to_owned(),
        None if chat.is_group() => format!("{} participants", chat.participants.len()),
        None => String::new(),
    };
    Line::from(vec![
        Span::styled(store.chat_display_name(chat).to_owned(), Style::new().bold()),
        Span::styled(format!("  {status}"), Style::new().dim()),
    ])
}

/// One line per message, oldest first. Own messages are right-aligned.
pub fn thread_lines(store: &ChatStore, chat_id: &str) -> Vec<Line<'static>> {
    let mut messages = store.get_messages(chat_id).iter().collect::<Vec<_>>();
    messages.sort_by_key(|message| message.timestamp);
    let is_group = store.get_chat(chat_id).is_some_and(Chat::is_group);

    messages
        .into_iter()
        .map(|message| {
            let own = message.is_from_current_user();
            let mut spans = Vec::new();
            if is_group && !own {
                let sender = store
                    .get_user(&message.sender_id)
                    .map_or(&*message.sender_id, |user| &*user.display_name);
                spans.push(Span::styled(format!("{sender}: "), Style::new().bold()));
            }
            spans.push(Span::raw(message.content.to_string()));
            for attachment in message.attachments.iter().flatten() {
                spans.push(Span::styled(
                    format!(" [{}]", attachment.kind),
                    Style::new().italic(),
                ));
            }
            let time = message.timestamp.with_timezone(&Local).format("%H:%M");
            spans.push(Span::styled(format!(" {time}"), Style::new().dim()));

            let line = Line::from(spans);
            if own {
                line.right_aligned().blue()
            } else {
                line.left_aligned()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::{DateTime, Duration, Utc};
    use himmle_common::{Attachment, AttachmentKind, Message, User, CURRENT_USER};
    use ratatui::layout::Alignment;

    use super::*;
    use crate::tests::buffer_text;

    fn message(sender: &str, chat_id: &str, content: &str, minutes: i64) -> Message {
        Message {
            id: format!("{chat_id}-{minutes}").into(),
            sender_id: sender.into(),
            chat_id: chat_id.into(),
            content: content.into(),
            timestamp: DateTime::from_timestamp(1_700_000_000, 0).unwrap()
                + Duration::minutes(minutes),
            is_read: true,
            attachments: None,
        }
    }

    fn store() -> ChatStore {
        let now = Utc::now();
        let mut photo = message("user1", "group", "look", 3);
        photo.attachments = Some(vec![Attachment {
            id: "a1".into(),
            kind: AttachmentKind::Image,
            url: "https://example.com/a.png".into(),
            thumbnail_url: None,
            size: 1024,
        }]);
        ChatStore::from_parts(
            vec![User::new("user1", "johnsmith", "John Smith")],
            vec![
                Chat::direct("chat1", "user1", now),
                Chat::group(
                    "group",
                    ["user1", "user2"].map(Arc::<str>::from),
                    "Friends",
                    now,
                ),
            ],
            HashMap::from([
                (
                    "chat1".into(),
                    vec![
                        message(CURRENT_USER, "chat1", "second", 2),
                        message("user1", "chat1", "first", 1),
                    ],
                ),
                (
                    "group".into(),
                    vec![message("user2", "group", "hey all", 1), photo],
                ),
            ]),
        )
    }

    fn plain(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn lines_are_chronological_and_aligned_by_sender() {
        let store = store();
        let lines = thread_lines(&store, "chat1");
        assert_eq!(lines.len(), 2);
        assert!(plain(&lines[0]).starts_with("first"));
        assert_eq!(lines[0].alignment, Some(Alignment::Left));
        assert!(plain(&lines[1]).starts_with("second"));
        assert_eq!(lines[1].alignment, Some(Alignment::Right));
    }

    #[test]
    fn group_lines_name_the_sender() {
        let store = store();
        let lines = thread_lines(&store, "group");
        // unknown users fall back to their id
        assert!(plain(&lines[0]).starts_with("user2: hey all"));
        assert!(plain(&lines[1]).starts_with("John Smith: look [image]"));
    }

    #[test]
    fn unknown_chat_has_no_lines() {
        assert!(thread_lines(&store(), "nowhere").is_empty());
    }

    #[test]
    fn long_messages_wrap_and_newest_stays_visible() {
        let mut store = store();
        store.send_message_as(
            "alpha beta gamma delta epsilon zeta eta theta",
            "chat1",
            "user1",
        );
        let chat = OpenChat::new("chat1".into());

        let mut buffer = Buffer::empty(Rect::new(0, 0, 20, 12));
        ChatThread::new(&store, &chat).render(buffer.area, &mut buffer);
        let text = buffer_text(&buffer);
        assert!(text.contains("first"), "{text}");
        assert!(text.contains("alpha"), "{text}");
        assert!(text.contains("theta"), "{text}");

        // too short for the whole thread: the start scrolls away
        let mut buffer = Buffer::empty(Rect::new(0, 0, 20, 7));
        ChatThread::new(&store, &chat).render(buffer.area, &mut buffer);
        let text = buffer_text(&buffer);
        assert!(!text.contains("first"), "{text}");
        assert!(text.contains("theta"), "{text}");
    }

    #[test]
    fn renders_header_messages_and_input() {
        let store = store();
        let mut chat = OpenChat::new("chat1".into());
        chat.input.push_str("draft");

        let mut buffer = Buffer::empty(Rect::new(0, 0, 40, 8));
        ChatThread::new(&store, &chat).render(buffer.area, &mut buffer);
        let text = buffer_text(&buffer);
        assert!(text.contains("John Smith  offline"), "{text}");
        assert!(text.contains("first"), "{text}");
        assert!(text.contains("draft"), "{text}");
    }
}
