#![forbid(unsafe_code)]

//! Canonical key event types.
//!
//! Hosts translate their native keyboard input into [`KeyEvent`]s before
//! handing them to the navigator. All types derive `Clone`, `PartialEq`, and
//! `Eq` for use in tests and pattern matching.
//!
//! # Design Notes
//!
//! - `KeyEventKind` defaults to `Press` when the platform cannot distinguish
//!   presses from repeats. A DOM `keyup` maps to `Release`.
//! - `Modifiers` use bitflags for easy combination.
//! - `BackTab` exists because some platforms report Shift+Tab as its own key;
//!   the engine treats it exactly like Tab with `SHIFT` held.

use std::str::FromStr;

use bitflags::bitflags;

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key code that was pressed.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,

    /// The type of key event (press, repeat, or release).
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// Create a new key event with default modifiers and Press kind.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
        }
    }

    /// Create a key event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Create a key event with a specific kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Check if Ctrl modifier is held.
    #[must_use]
    pub const fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    /// Check if Alt modifier is held.
    #[must_use]
    pub const fn alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }

    /// Check if Shift modifier is held.
    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    /// Whether this is a key-down style event (press or auto-repeat).
    #[must_use]
    pub const fn is_down(&self) -> bool {
        !matches!(self.kind, KeyEventKind::Release)
    }

    /// Parse a DOM-style key description such as `ArrowUp`, `Tab`, or
    /// `Shift+Tab`.
    ///
    /// Modifier prefixes (`Shift+`, `Ctrl+`, `Alt+`, `Super+`) may be
    /// combined. Short aliases (`Up`, `Esc`, `Space`) are accepted, and any
    /// single character parses as [`KeyCode::Char`].
    ///
    /// # Example
    ///
    /// ```
    /// use tvnav_core::event::{KeyCode, KeyEvent};
    ///
    /// let key = KeyEvent::parse("Shift+Tab").unwrap();
    /// assert_eq!(key.code, KeyCode::Tab);
    /// assert!(key.shift());
    /// ```
    pub fn parse(input: &str) -> Result<Self, ParseKeyError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ParseKeyError::Empty);
        }

        let mut modifiers = Modifiers::NONE;
        let mut rest = trimmed;
        // A lone "+" is the plus key, not a separator.
        while let Some((head, tail)) = rest.split_once('+')
            && !tail.is_empty()
        {
            let modifier = match head.to_ascii_lowercase().as_str() {
                "shift" => Modifiers::SHIFT,
                "ctrl" | "control" => Modifiers::CTRL,
                "alt" | "option" => Modifiers::ALT,
                "super" | "meta" | "cmd" => Modifiers::SUPER,
                _ => return Err(ParseKeyError::UnknownModifier(head.to_owned())),
            };
            modifiers |= modifier;
            rest = tail;
        }

        let code = rest.parse::<KeyCode>()?;
        Ok(Self::new(code).with_modifiers(modifiers))
    }
}

impl FromStr for KeyEvent {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Key codes for keyboard events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A regular character key.
    Char(char),

    /// Enter/Return key.
    Enter,

    /// Escape key.
    Escape,

    /// Tab key.
    Tab,

    /// Shift+Tab (back-tab).
    BackTab,

    /// Up arrow key.
    Up,

    /// Down arrow key.
    Down,

    /// Left arrow key.
    Left,

    /// Right arrow key.
    Right,

    /// Home key.
    Home,

    /// End key.
    End,

    /// Page Up key.
    PageUp,

    /// Page Down key.
    PageDown,

    /// Function key (F1-F24).
    F(u8),
}

impl FromStr for KeyCode {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Ok(Self::Char(c));
        }

        let code = match s.to_ascii_lowercase().as_str() {
            "arrowup" | "up" => Self::Up,
            "arrowdown" | "down" => Self::Down,
            "arrowleft" | "left" => Self::Left,
            "arrowright" | "right" => Self::Right,
            "enter" | "return" => Self::Enter,
            "escape" | "esc" => Self::Escape,
            "tab" => Self::Tab,
            "backtab" => Self::BackTab,
            "home" => Self::Home,
            "end" => Self::End,
            "pageup" => Self::PageUp,
            "pagedown" => Self::PageDown,
            "space" | "spacebar" => Self::Char(' '),
            lower => {
                if let Some(n) = lower.strip_prefix('f')
                    && let Ok(n) = n.parse::<u8>()
                    && (1..=24).contains(&n)
                {
                    Self::F(n)
                } else {
                    return Err(ParseKeyError::UnknownKey(s.to_owned()));
                }
            }
        };
        Ok(code)
    }
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    /// Key was pressed (default when not distinguishable).
    #[default]
    Press,

    /// Key is being held (repeat event).
    Repeat,

    /// Key was released.
    Release,
}

bitflags! {
    /// Modifier keys that can be held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// Errors produced by [`KeyEvent::parse`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseKeyError {
    #[error("empty key description")]
    Empty,
    #[error("unknown key name {0:?}")]
    UnknownKey(String),
    #[error("unknown modifier {0:?}")]
    UnknownModifier(String),
}
