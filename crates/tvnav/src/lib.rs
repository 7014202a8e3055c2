#![forbid(unsafe_code)]

//! Directional focus navigation for remote-control style interfaces.
//!
//! # Role in tvnav
//! This crate is the engine. Hosts register their focusable elements as a
//! tree of nodes (containers and leaves), then feed the [`Navigator`] key
//! presses, pointer presses, and native focus notifications. The navigator
//! decides which single node holds focus and asks the host, through
//! [`NavHost`], to apply the visible side effects.
//!
//! # Primary responsibilities
//! - **Tree**: parent-indexed nodes with explicit or auto-derived
//!   up/right/down/left links, list and grid layouts.
//! - **Resolution**: descend into containers, honoring veto gates and the
//!   per-container memory of the last focused child.
//! - **Engine**: one focused node, ordered unfocus/focus commits, Tab
//!   fallback, and recovery when the focused node is removed.
//! - **Layouts** (feature `layout`): declarative TOML/JSON trees mounted in
//!   one call.
//!
//! # Example
//! ```
//! use tvnav::{Direction, Navigator, NodeConfig, NullHost};
//!
//! let mut nav = Navigator::new(NullHost);
//! let root = nav.register_root(NodeConfig::container("menu")).unwrap();
//! let first = nav.register_child(root, NodeConfig::leaf("play")).unwrap();
//! let second = nav.register_child(root, NodeConfig::leaf("settings")).unwrap();
//! nav.stabilize(root).unwrap();
//!
//! assert_eq!(nav.current(), Some(first));
//! nav.change_focus(Direction::Down, false);
//! assert_eq!(nav.current(), Some(second));
//! ```

pub mod attr;
pub mod config;
pub mod error;
pub mod host;
#[cfg(feature = "layout")]
pub mod layout;
pub mod navigator;
pub mod node;
pub mod tree;

pub use attr::{AttrValue, coerce_boolean, coerce_grid_size};
pub use config::NavigatorConfig;
#[cfg(feature = "layout")]
pub use error::LayoutError;
pub use error::{NavError, Result};
pub use host::{HostEffect, NavHost, NullHost, RecordingHost, ScrollAlign, ScrollMode, ScrollOptions};
#[cfg(feature = "layout")]
pub use layout::{Layout, LayoutNode, MountedLayout};
pub use navigator::{KeyOutcome, NavEvent, Navigator};
pub use node::{FocusGate, GateContext, NavId, NavNode, NodeConfig, NodeFlags};
pub use tree::{FocusRequest, MemoryMode, NavTree, NodeLabel, check_structure};
pub use tvnav_core::{Direction, KeyCode, KeyEvent, KeyEventKind, Modifiers, ParseKeyError};
