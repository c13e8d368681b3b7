use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use himmle_common::{Chat, ChatStore};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, List, ListItem, ListState, StatefulWidget, Widget},
};

#[derive(Debug)]
pub struct ChatListView {
    /// Chat ids in display order.
    rows: Vec<Arc<str>>,
    cursor: Option<Arc<str>>,
    list_state: ListState,
    list_items: List<'static>,
}

impl Default for ChatListView {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            cursor: None,
            list_state: Default::default(),
            list_items: List::default()
                .highlight_symbol("> ")
                .block(Block::bordered().title(" Chats ")),
        }
    }
}

impl ChatListView {
    pub fn selected(&self) -> Option<&Arc<str>> {
        self.cursor.as_ref()
    }

    pub fn rows(&self) -> &[Arc<str>] {
        &self.rows
    }

    pub fn select_next(&mut self) {
        let idx = self
            .cursor_index()
            .map_or(0, |idx| (idx + 1).min(self.rows.len().saturating_sub(1)));
        self.select(idx);
    }

    pub fn select_prev(&mut self) {
        let idx = self.cursor_index().map_or(0, |idx| idx.saturating_sub(1));
        self.select(idx);
    }

    pub fn select_first(&mut self) {
        self.select(0);
    }

    pub fn select_last(&mut self) {
        self.select(self.rows.len().saturating_sub(1));
    }

    /// Rebuilds the rows from `store`, keeping only chats matching `query`.
    ///
    /// The cursor stays on the same chat if it is still listed, otherwise it moves to the top.
    pub fn refresh(&mut self, store: &ChatStore, query: &str) {
        let chats = store.search_chats(query);
        self.rows = chats.iter().map(|chat| chat.id.clone()).collect();
        let items = chats
            .iter()
            .map(|chat| chat_item(store, chat))
            .collect::<Vec<_>>();
        self.list_items = std::mem::take(&mut self.list_items).items(items);
        let idx = self.cursor_index().unwrap_or(0);
        self.select(idx);
    }

    fn cursor_index(&self) -> Option<usize> {
        let cursor = self.cursor.as_ref()?;
        self.rows.iter().position(|id| id == cursor)
    }

    fn select(&mut self, idx: usize) {
        self.cursor = self.rows.get(idx).cloned();
        self.list_state.select(self.cursor.as_ref().map(|_| idx));
    }
}

impl Widget for &mut ChatListView {
    fn render(self, area: Rect, buffer: &mut Buffer) {
        StatefulWidget::render(&self.list_items, area, buffer, &mut self.list_state);
    }
}

fn chat_item(store: &ChatStore, chat: &Chat) -> ListItem<'static> {
    let marker = if store.unread_count(&chat.id) > 0 {
        Span::styled("● ", Style::new().blue())
    } else {
        Span::raw("  ")
    };
    let mut header = vec![
        marker,
        Span::styled(store.chat_display_name(chat).to_owned(), Style::new().bold()),
    ];
    if store.counterpart(chat).is_some_and(|user| user.is_online) {
        header.push(Span::styled(" •", Style::new().green()));
    }
    if let Some(message) = &chat.last_message {
        header.push(Span::styled(
            format!("  {}", list_time(message.timestamp)),
            Style::new().dim(),
        ));
    }

    let preview = chat
        .last_message
        .as_ref()
        .map_or_else(|| "No messages yet".to_owned(), |message| message.content.to_string());
    ListItem::new(Text::from(vec![
        Line::from(header),
        Line::from(vec![Span::raw("  "), Span::styled(preview, Style::new().dim())]),
    ]))
}

fn list_time(timestamp: DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%-I:%M %p")
        .to_string()
}
