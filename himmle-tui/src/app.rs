use std::sync::Arc;

use crossterm::event::KeyModifiers;
use himmle_common::{Activity, ChatStore, StoreEvent};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Style, Stylize},
    text::Line,
    widgets::{Block, Clear, Paragraph, Tabs, Widget},
};
use tokio::{
    sync::broadcast,
    time::{Duration, Instant},
};

use crate::{
    chat_list::ChatListView,
    keymap::{KeyCode, KeyEvent, Keymap},
    profile::ProfileCard,
    thread::{ChatThread, OpenChat},
    Error,
};

/// User shown on the profile tab until there is a real login.
const PROFILE_USER: &str = "user1";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Action {
    Quit,
    Next,
    Prev,
    First,
    Last,
    Open,
    Back,
    Search,
    Submit,
    ShowProfile,
    NextTab,
}

#[derive(Clone, Debug)]
pub struct Keymaps {
    /// Used while browsing: every key is a command.
    normal: Keymap<Action>,
    /// Used while typing a search query or a message: unbound keys edit the text.
    input: Keymap<Action>,
}

impl Keymaps {
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let mut normal = Keymap::new(timeout);
        normal
            .bind("q", Action::Quit)?
            .bind("<C-c>", Action::Quit)?
            .bind("j", Action::Next)?
            .bind("<Down>", Action::Next)?
            .bind("k", Action::Prev)?
            .bind("<Up>", Action::Prev)?
            .bind("gg", Action::First)?
            .bind("<Home>", Action::First)?
            .bind("G", Action::Last)?
            .bind("<End>", Action::Last)?
            .bind("<CR>", Action::Open)?
            .bind("l", Action::Open)?
            .bind("<Esc>", Action::Back)?
            .bind("h", Action::Back)?
            .bind("/", Action::Search)?
            .bind("p", Action::ShowProfile)?
            .bind("<Tab>", Action::NextTab)?;

        let mut input = Keymap::new(timeout);
        input
            .bind("<C-c>", Action::Quit)?
            .bind("<Esc>", Action::Back)?
            .bind("<CR>", Action::Submit)?
            .bind("<C-p>", Action::ShowProfile)?;

        Ok(Self { normal, input })
    }

    pub fn timeout(&self) -> Duration {
        self.normal.timeout
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Tab {
    #[default]
    Chats,
    Profile,
}

#[derive(Debug)]
pub struct App {
    store: ChatStore,
    events: broadcast::Receiver<StoreEvent>,
    keymaps: Keymaps,
    pending: Vec<KeyEvent>,
    /// When the partial key sequence in `pending` gives up waiting for its next key.
    key_deadline: Option<Instant>,
    tab: Tab,
    chat_list: ChatListView,
    query: String,
    searching: bool,
    open_chat: Option<OpenChat>,
    /// User id of the profile popup, if shown.
    popup: Option<Arc<str>>,
    quit: bool,
}

impl App {
    pub fn new(store: ChatStore, keymaps: Keymaps) -> Self {
        let mut app = Self {
            events: store.subscribe(),
            store,
            keymaps,
            pending: Vec::new(),
            key_deadline: None,
            tab: Tab::default(),
            chat_list: ChatListView::default(),
            query: String::new(),
            searching: false,
            open_chat: None,
            popup: None,
            quit: false,
        };
        app.refresh();
        app
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn key_deadline(&self) -> Option<Instant> {
        self.key_deadline
    }

    pub fn handle_key(&mut self, event: KeyEvent) {
        let keymap = if self.takes_text() {
            &self.keymaps.input
        } else {
            &self.keymaps.normal
        };
        let resolved = keymap.feed(&mut self.pending, event);
        // each key of a sequence gets a full timeout, other input doesn't extend it
        self.key_deadline =
            (!self.pending.is_empty()).then(|| Instant::now() + self.keymaps.timeout());
        for key in resolved.passthru {
            self.type_key(key);
        }
        if let Some(action) = resolved.action {
            tracing::debug!(?action, "key action");
            self.perform(action);
        }
    }

    /// Gives up on a partially typed key sequence.
    pub fn flush_pending_keys(&mut self) {
        self.key_deadline = None;
        for key in std::mem::take(&mut self.pending) {
            self.type_key(key);
        }
    }

    pub fn apply_activity(&mut self, activity: Activity) {
        let chat_id = match &activity {
            Activity::Message { chat_id, .. } => Some(chat_id.clone()),
            Activity::Presence { .. } => None,
        };
        self.store.apply(activity);
        // messages arriving in the chat on screen are read right away
        if let (Some(chat_id), Some(open)) = (chat_id, &self.open_chat) {
            if open.chat_id == chat_id {
                self.store.mark_read(&chat_id);
            }
        }
        self.sync_store();
    }

    fn takes_text(&self) -> bool {
        self.open_chat.is_some() || self.searching
    }

    fn type_key(&mut self, key: KeyEvent) {
        if key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return;
        }
        let text = match (&mut self.open_chat, self.searching) {
            (Some(open), _) => &mut open.input,
            (None, true) => &mut self.query,
            (None, false) => return,
        };
        match key.code {
            KeyCode::Char(c) => text.push(c),
            KeyCode::Backspace => {
                text.pop();
            }
            _ => return,
        }
        if self.open_chat.is_none() {
            self.refresh();
        }
    }

    fn perform(&mut self, action: Action) {
        match action {
            Action::Quit => self.quit = true,
            Action::Next => self.chat_list.select_next(),
            Action::Prev => self.chat_list.select_prev(),
            Action::First => self.chat_list.select_first(),
            Action::Last => self.chat_list.select_last(),
            Action::Open => self.open_selected(),
            Action::Back => self.back(),
            Action::Search => {
                if self.tab == Tab::Chats {
                    self.searching = true;
                }
            }
            Action::Submit => self.submit(),
            Action::ShowProfile => self.show_profile(),
            Action::NextTab => {
                self.tab = match self.tab {
                    Tab::Chats => Tab::Profile,
                    Tab::Profile => Tab::Chats,
                };
            }
        }
    }

    fn open_selected(&mut self) {
        if self.tab != Tab::Chats {
            return;
        }
        let Some(chat_id) = self.chat_list.selected().cloned() else {
            return;
        };
        self.store.mark_read(&chat_id);
        tracing::info!(%chat_id, "opened chat");
        self.open_chat = Some(OpenChat::new(chat_id));
        self.sync_store();
    }

    fn back(&mut self) {
        if self.popup.take().is_some() {
            return;
        }
        if self.open_chat.take().is_some() {
            return;
        }
        self.searching = false;
        if !self.query.is_empty() {
            self.query.clear();
            self.refresh();
        }
    }

    fn submit(&mut self) {
        if self.searching {
            self.searching = false;
            return;
        }
        let Some(open) = &mut self.open_chat else {
            return;
        };
        let content = open.input.trim();
        if content.is_empty() {
            return;
        }
        self.store.send_message(content, &open.chat_id);
        open.input.clear();
        self.sync_store();
    }

    fn show_profile(&mut self) {
        let chat_id = match &self.open_chat {
            Some(open) => Some(&open.chat_id),
            None if self.tab == Tab::Chats => self.chat_list.selected(),
            None => None,
        };
        let user_id = chat_id
            .and_then(|id| self.store.get_chat(id))
            .and_then(|chat| self.store.counterpart(chat))
            .map(|user| user.id.clone());
        match user_id {
            Some(user_id) => self.popup = Some(user_id),
            None => tracing::debug!("no profile to show for the current chat"),
        }
    }

    /// Rebuilds the chat list if the store changed since the last call.
    fn sync_store(&mut self) {
        let mut changed = false;
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    tracing::trace!(?event, "store event");
                    changed = true;
                }
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "store events lagged");
                    changed = true;
                }
                Err(_) => break,
            }
        }
        if changed {
            self.refresh();
        }
    }

    fn refresh(&mut self) {
        self.chat_list.refresh(&self.store, &self.query);
    }

    fn hints(&self) -> &'static str {
        if self.popup.is_some() {
            "Esc close"
        } else if self.open_chat.is_some() {
            "Enter send · Esc back · C-p profile · C-c quit"
        } else if self.searching {
            "type to filter · Enter keep · Esc clear"
        } else {
            "j/k move · Enter open · / search · p profile · Tab switch · q quit"
        }
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buffer: &mut Buffer) {
        let [tabs, main, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(area);

        let selected = match self.tab {
            Tab::Chats => 0,
            Tab::Profile => 1,
        };
        Tabs::new(["Chats", "Profile"])
            .select(selected)
            .highlight_style(Style::new().bold().reversed())
            .render(tabs, buffer);

        if let Some(open) = &self.open_chat {
            ChatThread::new(&self.store, open).render(main, buffer);
        } else {
            match self.tab {
                Tab::Chats => {
                    let list = if self.searching || !self.query.is_empty() {
                        let [search, list] =
                            Layout::vertical([Constraint::Length(1), Constraint::Min(0)])
                                .areas(main);
                        Line::from(format!("/{}", self.query)).render(search, buffer);
                        list
                    } else {
                        main
                    };
                    (&mut self.chat_list).render(list, buffer);
                }
                Tab::Profile => match self.store.get_user(PROFILE_USER) {
                    Some(user) => ProfileCard::new(user).render(main, buffer),
                    None => Paragraph::new("No profile").render(main, buffer),
                },
            }
        }

        Line::from(self.hints()).dim().render(footer, buffer);

        if let Some(user) = self.popup.as_ref().and_then(|id| self.store.get_user(id)) {
            let popup = centered(main, 60, 80);
            Clear.render(popup, buffer);
            let block = Block::bordered().title(" Profile ");
            let inner = block.inner(popup);
            block.render(popup, buffer);
            ProfileCard::new(user).render(inner, buffer);
        }
    }
}

fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [_, middle, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(area);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(middle);
    center
}
