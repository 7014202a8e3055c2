#![forbid(unsafe_code)]

//! The host boundary.
//!
//! The navigator never touches UI elements directly. Every platform side
//! effect (native input focus, the visual `focused` marker, scrolling,
//! synthesized clicks) is a call on a [`NavHost`], keyed by the node's
//! [`NavId`]. The host owns the mapping from handles to real elements.

use ahash::{AHashMap, AHashSet};

use crate::node::NavId;

/// How far a scroll-into-view request should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollMode {
    /// Only scroll when the element is not already fully visible.
    #[default]
    IfNeeded,
    Always,
}

/// Alignment of the element inside the scrolled viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollAlign {
    Start,
    #[default]
    Center,
    End,
    Nearest,
}

/// Options for [`NavHost::scroll_into_view`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollOptions {
    pub mode: ScrollMode,
    pub block: ScrollAlign,
    pub inline: ScrollAlign,
}

/// Side effects the navigator requests from the hosting UI.
pub trait NavHost {
    /// Native ordering index of the element (negative: skipped by native
    /// sequential focus).
    fn tab_index(&self, id: NavId) -> i32;

    fn set_tab_index(&mut self, id: NavId, index: i32);

    /// Move the platform's input focus onto the element.
    fn focus_native(&mut self, id: NavId);

    /// Remove the platform's input focus from the element.
    fn blur_native(&mut self, id: NavId);

    fn scroll_into_view(&mut self, id: NavId, options: ScrollOptions);

    /// Add (`true`) or remove (`false`) the visual focused marker.
    fn set_focused_marker(&mut self, id: NavId, focused: bool);

    /// Synthesize the element's primary action (Enter).
    fn activate(&mut self, id: NavId);

    /// The node was dropped from the tree.
    fn detach(&mut self, _id: NavId) {}
}

/// A host with no elements. Every index reads as `0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHost;

impl NavHost for NullHost {
    fn tab_index(&self, _id: NavId) -> i32 {
        0
    }
    fn set_tab_index(&mut self, _id: NavId, _index: i32) {}
    fn focus_native(&mut self, _id: NavId) {}
    fn blur_native(&mut self, _id: NavId) {}
    fn scroll_into_view(&mut self, _id: NavId, _options: ScrollOptions) {}
    fn set_focused_marker(&mut self, _id: NavId, _focused: bool) {}
    fn activate(&mut self, _id: NavId) {}
}

/// One call recorded by [`RecordingHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEffect {
    TabIndex { id: NavId, index: i32 },
    FocusNative(NavId),
    BlurNative(NavId),
    Scroll { id: NavId, options: ScrollOptions },
    Marker { id: NavId, focused: bool },
    Activate(NavId),
    Detach(NavId),
}

/// Headless host that keeps element state in memory and records every call.
///
/// Used by tests and by the replay CLI.
#[derive(Debug, Default)]
pub struct RecordingHost {
    tab_indexes: AHashMap<NavId, i32>,
    markers: AHashSet<NavId>,
    native_focus: Option<NavId>,
    effects: Vec<HostEffect>,
}

impl RecordingHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded call, oldest first.
    #[must_use]
    pub fn effects(&self) -> &[HostEffect] {
        &self.effects
    }

    pub fn take_effects(&mut self) -> Vec<HostEffect> {
        std::mem::take(&mut self.effects)
    }

    /// Element currently holding platform input focus.
    #[must_use]
    pub fn native_focus(&self) -> Option<NavId> {
        self.native_focus
    }

    #[must_use]
    pub fn has_marker(&self, id: NavId) -> bool {
        self.markers.contains(&id)
    }

    /// Elements currently carrying the focused marker.
    #[must_use]
    pub fn marked(&self) -> Vec<NavId> {
        let mut out: Vec<_> = self.markers.iter().copied().collect();
        out.sort_unstable();
        out
    }

    /// Number of [`HostEffect::Activate`] calls for `id`.
    #[must_use]
    pub fn activations(&self, id: NavId) -> usize {
        self.effects
            .iter()
            .filter(|e| **e == HostEffect::Activate(id))
            .count()
    }
}

impl NavHost for RecordingHost {
    fn tab_index(&self, id: NavId) -> i32 {
        self.tab_indexes.get(&id).copied().unwrap_or(0)
    }

    fn set_tab_index(&mut self, id: NavId, index: i32) {
        self.tab_indexes.insert(id, index);
        self.effects.push(HostEffect::TabIndex { id, index });
    }

    fn focus_native(&mut self, id: NavId) {
        self.native_focus = Some(id);
        self.effects.push(HostEffect::FocusNative(id));
    }

    fn blur_native(&mut self, id: NavId) {
        if self.native_focus == Some(id) {
            self.native_focus = None;
        }
        self.effects.push(HostEffect::BlurNative(id));
    }

    fn scroll_into_view(&mut self, id: NavId, options: ScrollOptions) {
        self.effects.push(HostEffect::Scroll { id, options });
    }

    fn set_focused_marker(&mut self, id: NavId, focused: bool) {
        if focused {
            self.markers.insert(id);
        } else {
            self.markers.remove(&id);
        }
        self.effects.push(HostEffect::Marker { id, focused });
    }

    fn activate(&mut self, id: NavId) {
        self.effects.push(HostEffect::Activate(id));
    }

    fn detach(&mut self, id: NavId) {
        self.tab_indexes.remove(&id);
        self.markers.remove(&id);
        if self.native_focus == Some(id) {
            self.native_focus = None;
        }
        self.effects.push(HostEffect::Detach(id));
    }
}
