#![forbid(unsafe_code)]

//! Core: the input vocabulary shared by the tvnav engine and its hosts.
//!
//! # Role in tvnav
//! `tvnav-core` is the input layer. It owns the four navigation
//! [`Direction`]s and the normalized key event types that the engine's key
//! mapping consumes. It knows nothing about the navigation tree, so hosts can
//! translate their native input into these types without pulling in the
//! engine.
//!
//! # Primary responsibilities
//! - **Direction**: up/right/down/left plus the Tab "friend" pairing.
//! - **KeyEvent**: canonical key presses, repeats, and releases.
//! - **Key-name parsing**: DOM-style names (`ArrowUp`, `Shift+Tab`) for
//!   replay tooling and web bridges.

pub mod direction;
pub mod event;

pub use direction::{Direction, ParseDirectionError};
pub use event::{KeyCode, KeyEvent, KeyEventKind, Modifiers, ParseKeyError};
