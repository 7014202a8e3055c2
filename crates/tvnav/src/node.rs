#![forbid(unsafe_code)]

//! Navigable nodes and their configuration.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use tvnav_core::Direction;

use crate::attr::{AttrValue, coerce_boolean, coerce_grid_size};

/// Handle of a node inside one [`Navigator`](crate::Navigator).
///
/// Handles are never reused, so a handle kept after its node was removed
/// simply stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NavId(pub(crate) u64);

impl NavId {
    /// Raw numeric value, for host-side bookkeeping.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NavId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

bitflags! {
    /// Capability flags of a node.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NodeFlags: u8 {
        /// The node itself can hold focus.
        const FOCUSABLE    = 0b0000_0001;
        /// Auto-link children left/right instead of up/down.
        const HORIZONTAL   = 0b0000_0010;
        /// Never restore remembered children inside this subtree.
        const NO_MEMORY    = 0b0000_0100;
        /// Move the host's platform input focus on commit.
        const NATIVE_FOCUS = 0b0000_1000;
        /// Scroll the host element into view on commit.
        const NEED_SCROLL  = 0b0001_0000;
    }
}

/// Arguments handed to a [`FocusGate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateContext {
    /// For `will_focus`: the node currently holding focus.
    /// For `will_unfocus`: the node about to receive focus.
    pub other: Option<NavId>,
    /// Direction of travel; `None` for initial, recovery, and pointer focus.
    pub direction: Option<Direction>,
    /// Whether the platform's own input (click, native focus) triggered this.
    pub native: bool,
}

/// Veto callback. Returning `false` cancels the transition.
pub type FocusGate = Arc<dyn Fn(&GateContext) -> bool + Send + Sync>;

/// A directional link slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Link {
    pub(crate) target: NavId,
    /// Configured by the author rather than synthesized from sibling order.
    pub(crate) explicit: bool,
}

/// Per-node configuration, built once when the host mounts an element.
#[derive(Clone, Default)]
pub struct NodeConfig {
    pub(crate) id: Option<String>,
    pub(crate) flags: NodeFlags,
    pub(crate) grid_size: Option<usize>,
    pub(crate) links: [Option<NavId>; 4],
    pub(crate) will_focus: Option<FocusGate>,
    pub(crate) will_unfocus: Option<FocusGate>,
    pub(crate) tab_index: Option<i32>,
}

impl fmt::Debug for NodeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeConfig")
            .field("id", &self.id)
            .field("flags", &self.flags)
            .field("grid_size", &self.grid_size)
            .field("links", &self.links)
            .field("will_focus", &self.will_focus.is_some())
            .field("will_unfocus", &self.will_unfocus.is_some())
            .field("tab_index", &self.tab_index)
            .finish()
    }
}

impl NodeConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a focusable leaf with a debug id.
    #[must_use]
    pub fn leaf(id: impl Into<String>) -> Self {
        Self::new().id(id).focusable(true)
    }

    /// Shorthand for a non-focusable container with a debug id.
    #[must_use]
    pub fn container(id: impl Into<String>) -> Self {
        Self::new().id(id)
    }

    /// Debug-only identifier, shown in logs.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn focusable(self, on: bool) -> Self {
        self.flag(NodeFlags::FOCUSABLE, on)
    }

    #[must_use]
    pub fn horizontal(self, on: bool) -> Self {
        self.flag(NodeFlags::HORIZONTAL, on)
    }

    #[must_use]
    pub fn no_memory(self, on: bool) -> Self {
        self.flag(NodeFlags::NO_MEMORY, on)
    }

    #[must_use]
    pub fn native_focus(self, on: bool) -> Self {
        self.flag(NodeFlags::NATIVE_FOCUS, on)
    }

    #[must_use]
    pub fn need_scroll(self, on: bool) -> Self {
        self.flag(NodeFlags::NEED_SCROLL, on)
    }

    /// Set a flag from a raw attribute value (see [`coerce_boolean`]).
    #[must_use]
    pub fn attr(self, flag: NodeFlags, value: &AttrValue) -> Self {
        self.flag(flag, coerce_boolean(value))
    }

    #[must_use]
    pub fn flag(mut self, flag: NodeFlags, on: bool) -> Self {
        self.flags.set(flag, on);
        self
    }

    /// Row width for grid auto-linking. Zero means list mode.
    #[must_use]
    pub fn grid_size(mut self, width: usize) -> Self {
        self.grid_size = (width > 0).then_some(width);
        self
    }

    /// Grid width from a raw attribute value (see [`coerce_grid_size`]).
    #[must_use]
    pub fn grid_size_attr(mut self, value: &AttrValue) -> Self {
        self.grid_size = coerce_grid_size(value);
        self
    }

    /// Explicit neighbor override.
    #[must_use]
    pub fn link(mut self, direction: Direction, target: NavId) -> Self {
        self.links[direction.index()] = Some(target);
        self
    }

    /// Veto gate consulted before this node accepts focus.
    #[must_use]
    pub fn will_focus<F>(mut self, gate: F) -> Self
    where
        F: Fn(&GateContext) -> bool + Send + Sync + 'static,
    {
        self.will_focus = Some(Arc::new(gate));
        self
    }

    /// Veto gate consulted before this node gives focus away.
    #[must_use]
    pub fn will_unfocus<F>(mut self, gate: F) -> Self
    where
        F: Fn(&GateContext) -> bool + Send + Sync + 'static,
    {
        self.will_unfocus = Some(Arc::new(gate));
        self
    }

    /// Initial native ordering index written to the host on registration.
    #[must_use]
    pub fn tab_index(mut self, index: i32) -> Self {
        self.tab_index = Some(index);
        self
    }

    #[must_use]
    pub fn flags(&self) -> NodeFlags {
        self.flags
    }
}

/// One entry of the navigation tree.
#[derive(Clone)]
pub struct NavNode {
    pub(crate) debug_id: Option<String>,
    pub(crate) parent: Option<NavId>,
    pub(crate) children: Vec<NavId>,
    pub(crate) links: [Option<Link>; 4],
    pub(crate) flags: NodeFlags,
    pub(crate) grid_size: Option<usize>,
    pub(crate) will_focus: Option<FocusGate>,
    pub(crate) will_unfocus: Option<FocusGate>,
    pub(crate) focused: bool,
    pub(crate) memory: Option<NavId>,
    pub(crate) stabilized: bool,
}

impl NavNode {
    pub(crate) fn from_config(config: NodeConfig, parent: Option<NavId>) -> Self {
        let mut links = [None; 4];
        for (slot, target) in links.iter_mut().zip(config.links) {
            *slot = target.map(|target| Link {
                target,
                explicit: true,
            });
        }
        Self {
            debug_id: config.id,
            parent,
            children: Vec::new(),
            links,
            flags: config.flags,
            grid_size: config.grid_size,
            will_focus: config.will_focus,
            will_unfocus: config.will_unfocus,
            focused: false,
            memory: None,
            stabilized: false,
        }
    }

    #[must_use]
    pub fn debug_id(&self) -> Option<&str> {
        self.debug_id.as_deref()
    }

    #[must_use]
    pub fn parent(&self) -> Option<NavId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[NavId] {
        &self.children
    }

    #[must_use]
    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    #[must_use]
    pub fn is_focusable(&self) -> bool {
        self.flags.contains(NodeFlags::FOCUSABLE)
    }

    #[must_use]
    pub fn is_horizontal(&self) -> bool {
        self.flags.contains(NodeFlags::HORIZONTAL)
    }

    #[must_use]
    pub fn grid_size(&self) -> Option<usize> {
        self.grid_size
    }

    #[must_use]
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Remembered child, as stored. May be stale; see [`NavTree::memory`].
    ///
    /// [`NavTree::memory`]: crate::tree::NavTree::memory
    #[must_use]
    pub fn raw_memory(&self) -> Option<NavId> {
        self.memory
    }

    /// Whether the link in `direction` was configured rather than synthesized.
    #[must_use]
    pub fn is_explicit_link(&self, direction: Direction) -> bool {
        self.links[direction.index()].is_some_and(|l| l.explicit)
    }
}

impl fmt::Debug for NavNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavNode")
            .field("debug_id", &self.debug_id)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("links", &self.links)
            .field("flags", &self.flags)
            .field("grid_size", &self.grid_size)
            .field("focused", &self.focused)
            .field("memory", &self.memory)
            .finish_non_exhaustive()
    }
}
