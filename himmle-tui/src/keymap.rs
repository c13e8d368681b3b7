use std::{cmp, collections::BTreeMap};

use crossterm::event::KeyModifiers;
use tokio::time::Duration;

use crate::Error;

// key sequences are written vim-style: `j`, `gg`, `<CR>`, `<C-c>`, `<Down>`.
//
// a sequence that is a strict prefix of a binding stays pending until the next key arrives or the
// timeout expires. on timeout the pending keys are passed thru to the focused text input, so the
// caller has to drive the deadline instead of checking it when the next key comes in

pub fn parse_key_sequence(input: &str) -> Result<Vec<KeyEvent>, nom::error::Error<&str>> {
    use nom::Finish;
    nom::combinator::all_consuming(nom::multi::many1(parse_key))(input)
        .finish()
        .map(|(_, k)| k)
}

fn parse_key(input: &str) -> nom::IResult<&str, KeyEvent> {
    use nom::{
        branch::alt,
        bytes::complete::tag,
        character::complete::one_of,
        combinator::map,
        sequence::{delimited, separated_pair},
    };

    let key = alt((KeyCode::parse_special, KeyCode::parse_char));
    let modifiers = nom::multi::fold_many1(
        map(one_of("ACMS"), |c| match c {
            'A' => KeyModifiers::ALT,
            'C' => KeyModifiers::CONTROL,
            'M' => KeyModifiers::META,
            'S' => KeyModifiers::SHIFT,
            _ => unreachable!(),
        }),
        KeyModifiers::empty,
        KeyModifiers::union,
    );

    let bracketed = alt((
        map(
            separated_pair(modifiers, tag("-"), key),
            |(modifiers, code)| KeyEvent { modifiers, code },
        ),
        map(KeyCode::parse_special, KeyEvent::from),
    ));
    alt((
        delimited(tag("<"), bracketed, tag(">")),
        map(KeyCode::parse_char, KeyEvent::from),
    ))(input)
}

#[derive(Clone, Copy, Debug, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl From<KeyCode> for KeyEvent {
    fn from(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::empty(),
        }
    }
}

impl From<crossterm::event::KeyEvent> for KeyEvent {
    fn from(event: crossterm::event::KeyEvent) -> Self {
        let code = KeyCode::from(event.code);
        let mut modifiers = event.modifiers;
        // the shift is already part of the character
        if let KeyCode::Char(_) = code {
            modifiers.remove(KeyModifiers::SHIFT);
        }
        Self { code, modifiers }
    }
}

// manually impl `Ord` since `KeyModifiers` isn't `Ord`
// https://github.com/crossterm-rs/crossterm/pull/951
impl Ord for KeyEvent {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.code
            .cmp(&other.code)
            .then(self.modifiers.bits().cmp(&other.modifiers.bits()))
    }
}

impl PartialOrd for KeyEvent {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for KeyEvent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == cmp::Ordering::Equal
    }
}

// Our own version of `crossterm::event::KeyCode`
// https://github.com/crossterm-rs/crossterm/pull/951
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum KeyCode {
    Char(char),
    Backspace,
    Delete,
    Enter,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Tab,
    Insert,
    Escape,
    F(u8),
    Unknown,
}

impl KeyCode {
    fn parse_char(input: &str) -> nom::IResult<&str, Self> {
        nom::combinator::map(
            nom::character::complete::satisfy(|c| {
                nom_unicode::is_alphanumeric(c) || (c.is_ascii_punctuation() && c != '<')
            }),
            Self::Char,
        )(input)
    }

    fn parse_special(input: &str) -> nom::IResult<&str, Self> {
        use nom::{
            bytes::complete::tag,
            combinator::{map, value},
            sequence::preceded,
        };
        nom::branch::alt((
            value(Self::Backspace, tag("BS")),
            value(Self::Delete, tag("Del")),
            value(Self::Enter, tag("CR")),
            value(Self::Left, tag("Left")),
            value(Self::Right, tag("Right")),
            value(Self::Up, tag("Up")),
            value(Self::Down, tag("Down")),
            value(Self::Home, tag("Home")),
            value(Self::End, tag("End")),
            value(Self::PageUp, tag("PageUp")),
            value(Self::PageDown, tag("PageDown")),
            value(Self::Tab, tag("Tab")),
            value(Self::Insert, tag("Ins")),
            value(Self::Escape, tag("Esc")),
            value(Self::Char(' '), tag("Space")),
            value(Self::Char('<'), tag("lt")),
            map(preceded(tag("F"), nom::character::complete::u8), Self::F),
        ))(input)
    }
}

impl From<crossterm::event::KeyCode> for KeyCode {
    fn from(code: crossterm::event::KeyCode) -> Self {
        use crossterm::event::KeyCode as Kc;
        match code {
            Kc::Char(c) => Self::Char(c),
            Kc::Backspace => Self::Backspace,
            Kc::Delete => Self::Delete,
            Kc::Enter => Self::Enter,
            Kc::Left => Self::Left,
            Kc::Right => Self::Right,
            Kc::Up => Self::Up,
            Kc::Down => Self::Down,
            Kc::Home => Self::Home,
            Kc::End => Self::End,
            Kc::PageUp => Self::PageUp,
            Kc::PageDown => Self::PageDown,
            Kc::Tab => Self::Tab,
            Kc::Insert => Self::Insert,
            Kc::Esc => Self::Escape,
            Kc::F(n) => Self::F(n),
            _ => Self::Unknown,
        }
    }
}

/// Outcome of feeding one key into a [`Keymap`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolved<A> {
    /// Keys that can no longer start a binding, oldest first.
    pub passthru: Vec<KeyEvent>,
    pub action: Option<A>,
}

#[derive(Clone, Debug)]
pub struct Keymap<A> {
    keys: BTreeMap<Vec<KeyEvent>, A>,
    pub timeout: Duration,
}

impl<A: Clone> Keymap<A> {
    pub fn new(timeout: Duration) -> Self {
        Self {
            keys: BTreeMap::new(),
            timeout,
        }
    }

    /// Binds `sequence` (e.g. `"gg"` or `"<C-c>"`) to `action`, replacing any earlier binding.
    pub fn bind(&mut self, sequence: &str, action: A) -> Result<&mut Self, Error> {
        let keys = parse_key_sequence(sequence).map_err(|_| Error::KeySequence {
            sequence: sequence.to_owned(),
        })?;
        self.keys.insert(keys, action);
        Ok(self)
    }

    /// Adds `event` to `pending` and resolves as much of the buffer as possible.
    ///
    /// Leading keys that can't start any binding are returned as passthru. When a binding
    /// matches, its action is returned and the buffer is cleared.
    pub fn feed(&self, pending: &mut Vec<KeyEvent>, event: KeyEvent) -> Resolved<A> {
        pending.push(event);
        let (skipped, action) = (0..pending.len())
            .find_map(|i| self.get(&pending[i..]).map(|action| (i, action)))
            .unwrap_or((pending.len(), None));
        let passthru = pending.drain(..skipped).collect();
        if action.is_some() {
            pending.clear();
        }
        Resolved { passthru, action }
    }

    fn entries_with_prefix<'s, 'p>(
        &'s self,
        prefix: &'p [KeyEvent],
    ) -> impl Iterator<Item = (&'s Vec<KeyEvent>, &'s A)> + use<'s, 'p, A> {
        use std::ops::Bound;

        self.keys
            .range::<[_], _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(move |(k, _)| k.starts_with(prefix))
    }

    /// Finds the action corresponding to the provided key sequence.
    ///
    /// ## Return values
    /// - `Some(Some(action))`: the key sequence is mapped to the action
    /// - `Some(None)`: the key sequence is a prefix to at least one action
    /// - `None`: the key sequence is not a prefix to any action
    fn get(&self, keys: &[KeyEvent]) -> Option<Option<A>> {
        self.entries_with_prefix(keys)
            .next()
            .map(|(k, v)| (k == keys).then_some(v.clone()))
    }
}
