#![forbid(unsafe_code)]

//! The navigation engine.
//!
//! A [`Navigator`] owns one [`NavTree`], one host, and the single "currently
//! focused" handle. Hosts feed it registrations, key events, and pointer
//! events; it resolves targets in the tree and commits focus changes through
//! the host.
//!
//! # Invariants
//!
//! 1. **Uniqueness**: at most one node has `focused` set, and it is
//!    [`Navigator::current`].
//! 2. **Ordered commit**: the old node is fully unfocused (flag cleared, host
//!    updated, [`NavEvent::Blurred`] queued) before the new node's flag is set.
//! 3. **Clean veto**: a refused transition has no observable side effects.
//! 4. **Consistency**: every mutation and every resolution goes through
//!    `&mut Navigator`. Gates see only a [`GateContext`], never the tree, so a
//!    resolution pass always observes one consistent tree.
//!
//! # Failure Modes
//!
//! - No acceptor in a direction: nothing moves (logged at debug level only).
//! - Focused node removed: focus moves to the sibling now at the same index,
//!   else to the first target found walking up the ancestors, else nowhere
//!   (logged as an error).
//! - Second root: logged as an error and rejected; state is unchanged.

use tvnav_core::{Direction, KeyCode, KeyEvent};

use crate::config::NavigatorConfig;
use crate::error::{NavError, Result};
use crate::host::{NavHost, ScrollOptions};
use crate::node::{GateContext, NavId, NodeConfig, NodeFlags};
use crate::tree::{FocusRequest, MemoryMode, NavTree, Removal};

/// Focus notifications, one per commit step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEvent {
    Focused { id: NavId },
    Blurred { id: NavId },
}

/// Result of [`Navigator::handle_key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyOutcome {
    /// The host should suppress default handling and stop propagation.
    pub consumed: bool,
    /// Focus changed.
    pub moved: bool,
    /// The focused element was activated (Enter).
    pub activated: bool,
}

/// The navigation engine: one tree, one host, one focus.
#[derive(Debug)]
pub struct Navigator<H: NavHost> {
    tree: NavTree,
    host: H,
    config: NavigatorConfig,
    current: Option<NavId>,
    initial_resolved: bool,
    events: Vec<NavEvent>,
}

impl<H: NavHost + Default> Default for Navigator<H> {
    fn default() -> Self {
        Self::new(H::default())
    }
}

impl<H: NavHost> Navigator<H> {
    #[must_use]
    pub fn new(host: H) -> Self {
        Self::with_config(host, NavigatorConfig::default())
    }

    #[must_use]
    pub fn with_config(host: H, config: NavigatorConfig) -> Self {
        Self {
            tree: NavTree::new(),
            host,
            config,
            current: None,
            initial_resolved: false,
            events: Vec::new(),
        }
    }

    #[must_use]
    pub fn tree(&self) -> &NavTree {
        &self.tree
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    #[must_use]
    pub fn config(&self) -> NavigatorConfig {
        self.config
    }

    /// Currently focused node.
    #[inline]
    #[must_use]
    pub fn current(&self) -> Option<NavId> {
        self.current
    }

    #[must_use]
    pub fn is_focused(&self, id: NavId) -> bool {
        self.current == Some(id)
    }

    #[must_use]
    pub fn root(&self) -> Option<NavId> {
        self.tree.root()
    }

    /// Take and clear queued focus notifications.
    pub fn take_events(&mut self) -> Vec<NavEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Register the single parentless node.
    pub fn register_root(&mut self, config: NodeConfig) -> Result<NavId> {
        if let Some(existing) = self.tree.root() {
            tracing::error!(
                existing = %self.tree.label(existing),
                "there must be exactly one root; wrap sibling roots in one container"
            );
            return Err(NavError::DuplicateRoot { existing });
        }
        let tab_index = config.tab_index;
        let id = self.tree.insert_root(config);
        self.apply_tab_index(id, tab_index);
        tracing::info!(root = %self.tree.label(id), "root registered");
        Ok(id)
    }

    /// Register `config` as the last child of `parent`.
    pub fn register_child(&mut self, parent: NavId, config: NodeConfig) -> Result<NavId> {
        let tab_index = config.tab_index;
        let id = self
            .tree
            .insert_child(parent, config)
            .ok_or(NavError::UnknownNode(parent))?;
        self.apply_tab_index(id, tab_index);
        if self.tree.get(parent).is_some_and(|p| p.stabilized) {
            let host = &self.host;
            self.tree
                .create_auto_links(parent, false, |c| host.tab_index(c));
        }
        tracing::trace!(parent = %self.tree.label(parent), child = %self.tree.label(id), "child registered");
        Ok(id)
    }

    /// Mark `id`'s children as settled and link them.
    ///
    /// Once the root is stable the initial focus target is resolved and
    /// committed. While nothing holds focus, every later stabilization retries
    /// that resolution.
    pub fn stabilize(&mut self, id: NavId) -> Result<()> {
        let node = self.tree.get_mut(id).ok_or(NavError::UnknownNode(id))?;
        node.stabilized = true;
        let host = &self.host;
        self.tree.create_auto_links(id, false, |c| host.tab_index(c));

        let root_ready = self
            .tree
            .root()
            .and_then(|r| self.tree.get(r))
            .is_some_and(|r| r.stabilized);
        if root_ready && self.current.is_none() {
            self.resolve_initial_focus();
        }
        Ok(())
    }

    /// Remove `id` and its subtree.
    ///
    /// The parent's links are recreated (explicit links may be overwritten,
    /// since the topology changed). If focus was inside the removed subtree a
    /// replacement is chosen.
    pub fn unregister(&mut self, id: NavId) -> Result<()> {
        let removal = self
            .tree
            .remove_subtree(id, self.current)
            .ok_or(NavError::UnknownNode(id))?;
        for gone in &removal.removed {
            self.host.detach(*gone);
        }

        if let Some(parent) = removal.parent {
            let host = &self.host;
            self.tree
                .create_auto_links(parent, true, |c| host.tab_index(c));
        } else {
            tracing::info!("root unregistered; navigator is empty");
            self.initial_resolved = false;
        }

        if removal.contained_focus
            && let Some(lost) = self.current.take()
        {
            self.events.push(NavEvent::Blurred { id: lost });
            self.focused_deleted(&removal);
        }
        Ok(())
    }

    /// Toggle whether `id` can hold focus itself, and re-sync its tab index.
    pub fn set_focusable(&mut self, id: NavId, focusable: bool) -> Result<()> {
        let node = self.tree.get_mut(id).ok_or(NavError::UnknownNode(id))?;
        node.flags.set(NodeFlags::FOCUSABLE, focusable);
        self.apply_tab_index(id, None);
        Ok(())
    }

    /// Configure (or clear) an explicit neighbor.
    pub fn set_link(&mut self, id: NavId, direction: Direction, target: Option<NavId>) -> Result<()> {
        if let Some(target) = target
            && !self.tree.contains(target)
        {
            return Err(NavError::UnknownNode(target));
        }
        if self.tree.set_explicit_link(id, direction, target) {
            Ok(())
        } else {
            Err(NavError::UnknownNode(id))
        }
    }

    /// Focusable elements join native sequential focus (`>= 0`); containers
    /// leave it (`-1`).
    fn apply_tab_index(&mut self, id: NavId, initial: Option<i32>) {
        if let Some(index) = initial {
            self.host.set_tab_index(id, index);
        }
        let Some(node) = self.tree.get(id) else {
            return;
        };
        let current = self.host.tab_index(id);
        if node.is_focusable() {
            if current < 0 {
                self.host.set_tab_index(id, 0);
            }
        } else if current != -1 {
            self.host.set_tab_index(id, -1);
        }
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    /// Resolve the target focus would land on when arriving at `id`.
    pub fn find_focus(&mut self, id: NavId, direction: Option<Direction>, native: bool) -> Option<NavId> {
        let request = FocusRequest {
            direction,
            native,
            memory: MemoryMode::Use,
            current: self.current,
        };
        self.tree.find_focus(id, &request)
    }

    fn resolve_initial_focus(&mut self) {
        let Some(root) = self.tree.root() else {
            return;
        };
        let target = self.tree.find_focus(root, &FocusRequest::undirected(self.current));
        match target {
            Some(t) => tracing::debug!(node = %self.tree.label(t), "initial focus resolved"),
            None if !self.initial_resolved => {
                tracing::warn!(root = %self.tree.label(root), "nothing in the tree can hold focus yet");
            }
            None => {}
        }
        self.initial_resolved = true;
        self.change_focus_to(target, None, false);
    }

    /// Commit focus to `target` (`None` commits "no focus").
    ///
    /// The currently focused node's `will_unfocus` gate may veto. Returns
    /// whether focus changed.
    pub fn change_focus_to(&mut self, target: Option<NavId>, direction: Option<Direction>, native: bool) -> bool {
        if target == self.current {
            return false;
        }
        if let Some(t) = target
            && !self.tree.contains(t)
        {
            tracing::warn!(node = %t, "focus requested for an unknown node");
            return false;
        }

        if let Some(current) = self.current
            && let Some(gate) = self.tree.get(current).and_then(|n| n.will_unfocus.clone())
        {
            let ctx = GateContext {
                other: target,
                direction,
                native,
            };
            if !gate(&ctx) {
                tracing::debug!(node = %self.tree.label(current), "will_unfocus vetoed the change");
                return false;
            }
        }

        if let Some(previous) = self.current.take() {
            self.set_focused(previous, false);
        }
        self.current = target;
        if let Some(next) = target {
            tracing::debug!(node = %self.tree.label(next), ?direction, native, "focus committed");
            self.set_focused(next, true);
        }
        true
    }

    fn set_focused(&mut self, id: NavId, focused: bool) {
        let Some(node) = self.tree.get_mut(id) else {
            return;
        };
        node.focused = focused;
        let flags = node.flags;
        if focused {
            if flags.contains(NodeFlags::NATIVE_FOCUS) {
                self.host.focus_native(id);
            }
            if flags.contains(NodeFlags::NEED_SCROLL) {
                self.host.scroll_into_view(id, ScrollOptions::default());
            }
            self.host.set_focused_marker(id, true);
            self.events.push(NavEvent::Focused { id });
        } else {
            if flags.contains(NodeFlags::NATIVE_FOCUS) {
                self.host.blur_native(id);
            }
            self.host.set_focused_marker(id, false);
            self.events.push(NavEvent::Blurred { id });
        }
    }

    /// Move focus one step in `direction`.
    ///
    /// Walks outward from the focused node: its neighbor in `direction` (and
    /// that neighbor's neighbor, and so on, while they refuse), then the same
    /// from each ancestor, recording the child being left in the ancestor's
    /// memory. A Tab-triggered move that finds nothing retries once along
    /// [`Direction::tab_friend`].
    pub fn change_focus(&mut self, direction: Direction, is_tab: bool) -> bool {
        if self.step(direction) {
            return true;
        }
        if is_tab && self.config.tab_fallback {
            let friend = direction.tab_friend();
            tracing::debug!(%direction, %friend, "tab move found nothing; trying friend direction");
            return self.step(friend);
        }
        false
    }

    fn step(&mut self, direction: Direction) -> bool {
        let Some(start) = self.current else {
            tracing::debug!(%direction, "no focused node to move from");
            return false;
        };
        let request = FocusRequest {
            direction: Some(direction),
            native: false,
            memory: MemoryMode::Use,
            current: Some(start),
        };

        // Resolution consumes and records memory; a veto must undo that.
        self.tree.begin_memory_journal();
        let mut level = start;
        loop {
            if let Some(target) = self.ask_along(level, direction, &request) {
                let committed = self.change_focus_to(Some(target), Some(direction), false);
                if committed {
                    self.tree.commit_memory_journal();
                } else {
                    self.tree.rollback_memory_journal();
                }
                return committed;
            }
            let Some(parent) = self.tree.parent(level) else {
                self.tree.commit_memory_journal();
                tracing::debug!(%direction, from = %self.tree.label(start), "no target in direction");
                return false;
            };
            self.tree.set_memory(parent, level);
            level = parent;
        }
    }

    /// Ask `from`'s neighbor, then the neighbor's neighbor, until one accepts.
    fn ask_along(&mut self, from: NavId, direction: Direction, request: &FocusRequest) -> Option<NavId> {
        let mut visited = vec![from];
        let mut cursor = from;
        while let Some(next) = self.tree.link(cursor, direction) {
            if visited.contains(&next) {
                tracing::debug!(node = %self.tree.label(next), %direction, "link cycle; stopping");
                return None;
            }
            visited.push(next);
            if let Some(target) = self.tree.find_focus(next, request) {
                return Some(target);
            }
            tracing::trace!(
                from = %self.tree.label(cursor),
                refused = %self.tree.label(next),
                %direction,
                "neighbor refused focus; asking the next one over"
            );
            cursor = next;
        }
        None
    }

    fn focused_deleted(&mut self, removal: &Removal) {
        let Some(parent) = removal.parent else {
            tracing::debug!("focused root removed");
            return;
        };

        if let Some(&sibling) = self.tree.children(parent).get(removal.index)
            && self.tree.get(sibling).is_some_and(|n| n.is_focusable())
        {
            self.change_focus_to(Some(sibling), None, false);
            return;
        }

        let mut level = Some(parent);
        while let Some(ancestor) = level {
            let request = FocusRequest::undirected(None);
            if let Some(target) = self.tree.find_focus(ancestor, &request) {
                self.change_focus_to(Some(target), None, false);
                return;
            }
            level = self.tree.parent(ancestor);
        }
        tracing::error!("no node anywhere can take focus after deletion");
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    /// Map one key event onto navigation.
    ///
    /// Arrows move in their direction. Tab and Shift+Tab (or BackTab) move
    /// forward/backward along the focused node's parent axis with Tab
    /// fallback. Enter activates the focused element. Releases are ignored.
    pub fn handle_key(&mut self, key: &KeyEvent) -> KeyOutcome {
        let recognized = matches!(
            key.code,
            KeyCode::Up
                | KeyCode::Right
                | KeyCode::Down
                | KeyCode::Left
                | KeyCode::Tab
                | KeyCode::BackTab
                | KeyCode::Enter
        );
        let mut outcome = KeyOutcome {
            consumed: recognized || self.config.consume_all_keys,
            ..KeyOutcome::default()
        };
        if !recognized || !key.is_down() {
            return outcome;
        }

        match key.code {
            KeyCode::Up => outcome.moved = self.change_focus(Direction::Up, false),
            KeyCode::Right => outcome.moved = self.change_focus(Direction::Right, false),
            KeyCode::Down => outcome.moved = self.change_focus(Direction::Down, false),
            KeyCode::Left => outcome.moved = self.change_focus(Direction::Left, false),
            KeyCode::Tab | KeyCode::BackTab => {
                let backward = key.code == KeyCode::BackTab || key.shift();
                let direction = self.tab_direction(backward);
                outcome.moved = self.change_focus(direction, true);
            }
            KeyCode::Enter => outcome.activated = self.activate(),
            _ => {}
        }
        outcome
    }

    fn tab_direction(&self, backward: bool) -> Direction {
        let horizontal = self
            .current
            .and_then(|c| self.tree.parent(c))
            .and_then(|p| self.tree.get(p))
            .is_some_and(|p| p.is_horizontal());
        match (horizontal, backward) {
            (true, false) => Direction::Right,
            (true, true) => Direction::Left,
            (false, false) => Direction::Down,
            (false, true) => Direction::Up,
        }
    }

    /// Synthesize the primary action on the focused element.
    pub fn activate(&mut self) -> bool {
        match self.current {
            Some(id) => {
                self.host.activate(id);
                true
            }
            None => {
                tracing::error!("Enter pressed with no focused element to activate");
                false
            }
        }
    }

    /// Direct pointer press on `id` (click-to-focus).
    pub fn pointer_down(&mut self, id: NavId) -> bool {
        let Some(node) = self.tree.get(id) else {
            tracing::warn!(node = %id, "pointer press on an unknown node");
            return false;
        };
        if !node.is_focusable() {
            tracing::error!(node = %self.tree.label(id), "click on a node that cannot hold focus");
            return false;
        }
        self.change_focus_to(Some(id), None, true)
    }

    /// The platform moved its input focus onto `id`.
    ///
    /// Expected only as an echo of a commit; anything else means focus was
    /// moved around the navigator. A focusable intruder is adopted.
    pub fn native_focus_in(&mut self, id: NavId) -> bool {
        if self.current == Some(id) {
            return false;
        }
        let Some(node) = self.tree.get(id) else {
            return false;
        };
        tracing::error!(
            node = %self.tree.label(id),
            "element received native focus without the navigator; route focus through the navigator"
        );
        if node.is_focusable() {
            self.change_focus_to(Some(id), None, true)
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostEffect, NullHost, RecordingHost};
    use tvnav_core::{KeyEventKind, Modifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code)
    }

    /// root (vertical): a, b, c, all focusable.
    fn column() -> (Navigator<RecordingHost>, [NavId; 3]) {
        let mut nav = Navigator::new(RecordingHost::new());
        let root = nav.register_root(NodeConfig::container("root")).unwrap();
        let a = nav.register_child(root, NodeConfig::leaf("a")).unwrap();
        let b = nav.register_child(root, NodeConfig::leaf("b")).unwrap();
        let c = nav.register_child(root, NodeConfig::leaf("c")).unwrap();
        for id in [a, b, c, root] {
            nav.stabilize(id).unwrap();
        }
        (nav, [a, b, c])
    }

    #[test]
    fn initial_focus_on_first_focusable() {
        let (nav, [a, ..]) = column();
        assert_eq!(nav.current(), Some(a));
        assert!(nav.tree().get(a).unwrap().is_focused());
        assert!(nav.host().has_marker(a));
    }

    #[test]
    fn no_initial_focus_before_root_stabilizes() {
        let mut nav = Navigator::new(NullHost);
        let root = nav.register_root(NodeConfig::container("root")).unwrap();
        let a = nav.register_child(root, NodeConfig::leaf("a")).unwrap();
        nav.stabilize(a).unwrap();
        assert_eq!(nav.current(), None);
        nav.stabilize(root).unwrap();
        assert_eq!(nav.current(), Some(a));
    }

    #[test]
    fn second_root_rejected_without_state_change() {
        let (mut nav, [a, ..]) = column();
        let root = nav.root().unwrap();
        let err = nav.register_root(NodeConfig::container("other")).unwrap_err();
        assert_eq!(err, NavError::DuplicateRoot { existing: root });
        assert_eq!(nav.root(), Some(root));
        assert_eq!(nav.current(), Some(a));
        assert_eq!(nav.tree().len(), 4);
    }

    #[test]
    fn arrows_move_along_list() {
        let (mut nav, [a, b, c]) = column();
        assert_eq!(nav.current(), Some(a));
        assert!(nav.change_focus(Direction::Down, false));
        assert_eq!(nav.current(), Some(b));
        assert!(nav.change_focus(Direction::Down, false));
        assert_eq!(nav.current(), Some(c));
        assert!(!nav.change_focus(Direction::Down, false));
        assert_eq!(nav.current(), Some(c));
        assert!(nav.change_focus(Direction::Up, false));
        assert_eq!(nav.current(), Some(b));
    }

    #[test]
    fn commit_emits_blur_then_focus() {
        let (mut nav, [a, b, _]) = column();
        nav.take_events();
        nav.change_focus(Direction::Down, false);
        assert_eq!(
            nav.take_events(),
            vec![NavEvent::Blurred { id: a }, NavEvent::Focused { id: b }]
        );
    }

    #[test]
    fn recommitting_current_is_noop() {
        let (mut nav, [a, ..]) = column();
        nav.take_events();
        assert!(!nav.change_focus_to(Some(a), None, false));
        assert!(nav.take_events().is_empty());
    }

    #[test]
    fn committing_none_clears_focus() {
        let (mut nav, [a, ..]) = column();
        assert!(nav.change_focus_to(None, None, false));
        assert_eq!(nav.current(), None);
        assert!(!nav.tree().get(a).unwrap().is_focused());
        assert!(nav.host().marked().is_empty());
    }

    #[test]
    fn refusing_neighbor_passes_to_next_one_over() {
        let mut nav = Navigator::new(NullHost);
        let root = nav.register_root(NodeConfig::container("root")).unwrap();
        let a = nav.register_child(root, NodeConfig::leaf("a")).unwrap();
        let b = nav
            .register_child(root, NodeConfig::leaf("b").will_focus(|_| false))
            .unwrap();
        let c = nav.register_child(root, NodeConfig::leaf("c")).unwrap();
        nav.stabilize(root).unwrap();
        assert_eq!(nav.current(), Some(a));
        nav.take_events();
        assert!(nav.change_focus(Direction::Down, false));
        assert_eq!(nav.current(), Some(c));
        assert!(!nav.take_events().contains(&NavEvent::Focused { id: b }));
    }

    #[test]
    fn explicit_link_cycle_terminates() {
        let mut nav = Navigator::new(NullHost);
        let root = nav.register_root(NodeConfig::container("root").horizontal(true)).unwrap();
        let a = nav.register_child(root, NodeConfig::leaf("a")).unwrap();
        let b = nav
            .register_child(root, NodeConfig::leaf("b").will_focus(|_| false))
            .unwrap();
        let c = nav
            .register_child(root, NodeConfig::leaf("c").will_focus(|_| false))
            .unwrap();
        nav.set_link(a, Direction::Up, Some(b)).unwrap();
        nav.set_link(b, Direction::Up, Some(c)).unwrap();
        nav.set_link(c, Direction::Up, Some(b)).unwrap();
        nav.stabilize(root).unwrap();
        assert!(!nav.change_focus(Direction::Up, false));
        assert_eq!(nav.current(), Some(a));
    }

    #[test]
    fn will_unfocus_veto_has_no_side_effects() {
        let mut nav = Navigator::new(RecordingHost::new());
        let root = nav.register_root(NodeConfig::container("root")).unwrap();
        let a = nav
            .register_child(root, NodeConfig::leaf("a").will_unfocus(|_| false))
            .unwrap();
        let _b = nav.register_child(root, NodeConfig::leaf("b")).unwrap();
        nav.stabilize(root).unwrap();
        nav.take_events();
        nav.host_mut().take_effects();

        assert!(!nav.change_focus(Direction::Down, false));
        assert_eq!(nav.current(), Some(a));
        assert!(nav.take_events().is_empty());
        assert!(nav.host().effects().is_empty());
    }

    #[test]
    fn will_unfocus_receives_target() {
        let mut nav = Navigator::new(NullHost);
        let root = nav.register_root(NodeConfig::container("root")).unwrap();
        let a = nav
            .register_child(
                root,
                NodeConfig::leaf("a").will_unfocus(|ctx| {
                    ctx.direction == Some(Direction::Down) && ctx.other.is_some() && !ctx.native
                }),
            )
            .unwrap();
        let b = nav.register_child(root, NodeConfig::leaf("b")).unwrap();
        nav.stabilize(root).unwrap();
        assert_eq!(nav.current(), Some(a));
        assert!(nav.change_focus(Direction::Down, false));
        assert_eq!(nav.current(), Some(b));
    }

    #[test]
    fn native_focus_and_scroll_effects() {
        let mut nav = Navigator::new(RecordingHost::new());
        let root = nav.register_root(NodeConfig::container("root")).unwrap();
        let a = nav
            .register_child(root, NodeConfig::leaf("a").native_focus(true))
            .unwrap();
        let b = nav
            .register_child(root, NodeConfig::leaf("b").need_scroll(true))
            .unwrap();
        nav.stabilize(root).unwrap();
        assert_eq!(nav.host().native_focus(), Some(a));

        nav.host_mut().take_effects();
        nav.change_focus(Direction::Down, false);
        assert_eq!(
            nav.host().effects(),
            &[
                HostEffect::BlurNative(a),
                HostEffect::Marker { id: a, focused: false },
                HostEffect::Scroll {
                    id: b,
                    options: ScrollOptions::default()
                },
                HostEffect::Marker { id: b, focused: true },
            ]
        );
        assert_eq!(nav.host().native_focus(), None);
    }

    #[test]
    fn tab_index_normalized_on_registration() {
        let mut nav = Navigator::new(RecordingHost::new());
        let root = nav.register_root(NodeConfig::container("root").tab_index(3)).unwrap();
        let a = nav
            .register_child(root, NodeConfig::leaf("a").tab_index(-5))
            .unwrap();
        let b = nav
            .register_child(root, NodeConfig::leaf("b").tab_index(2))
            .unwrap();
        assert_eq!(nav.host().tab_index(root), -1);
        assert_eq!(nav.host().tab_index(a), 0);
        assert_eq!(nav.host().tab_index(b), 2);

        nav.set_focusable(b, false).unwrap();
        assert_eq!(nav.host().tab_index(b), -1);
        nav.set_focusable(b, true).unwrap();
        assert_eq!(nav.host().tab_index(b), 0);
    }

    #[test]
    fn unknown_handles_are_errors() {
        let (mut nav, [a, ..]) = column();
        let ghost = NavId(999);
        assert_eq!(nav.register_child(ghost, NodeConfig::leaf("x")), Err(NavError::UnknownNode(ghost)));
        assert_eq!(nav.unregister(ghost), Err(NavError::UnknownNode(ghost)));
        assert_eq!(nav.stabilize(ghost), Err(NavError::UnknownNode(ghost)));
        assert_eq!(nav.set_link(a, Direction::Up, Some(ghost)), Err(NavError::UnknownNode(ghost)));
        assert!(!nav.change_focus_to(Some(ghost), None, false));
    }

    #[test]
    fn key_release_ignored_but_consumed() {
        let (mut nav, [a, ..]) = column();
        let outcome = nav.handle_key(&key(KeyCode::Down).with_kind(KeyEventKind::Release));
        assert!(outcome.consumed);
        assert!(!outcome.moved);
        assert_eq!(nav.current(), Some(a));
    }

    #[test]
    fn unrecognized_keys_follow_consume_setting() {
        let (mut nav, _) = column();
        assert!(nav.handle_key(&key(KeyCode::Char('x'))).consumed);

        let mut nav = Navigator::with_config(
            NullHost,
            NavigatorConfig::default().with_consume_all_keys(false),
        );
        assert!(!nav.handle_key(&key(KeyCode::Char('x'))).consumed);
        assert!(nav.handle_key(&key(KeyCode::Down)).consumed);
    }

    #[test]
    fn tab_moves_along_parent_axis() {
        let (mut nav, [a, b, _]) = column();
        assert!(nav.handle_key(&key(KeyCode::Tab)).moved);
        assert_eq!(nav.current(), Some(b));
        let back = key(KeyCode::Tab).with_modifiers(Modifiers::SHIFT);
        assert!(nav.handle_key(&back).moved);
        assert_eq!(nav.current(), Some(a));
        nav.handle_key(&key(KeyCode::Down));
        assert!(nav.handle_key(&key(KeyCode::BackTab)).moved);
        assert_eq!(nav.current(), Some(a));
    }

    #[test]
    fn tab_in_horizontal_row_moves_right() {
        let mut nav = Navigator::new(NullHost);
        let root = nav.register_root(NodeConfig::container("row").horizontal(true)).unwrap();
        let a = nav.register_child(root, NodeConfig::leaf("a")).unwrap();
        let b = nav.register_child(root, NodeConfig::leaf("b")).unwrap();
        nav.stabilize(root).unwrap();
        assert_eq!(nav.current(), Some(a));
        nav.handle_key(&key(KeyCode::Tab));
        assert_eq!(nav.current(), Some(b));
    }

    fn tab_fallback_tree(config: NavigatorConfig) -> (Navigator<NullHost>, NavId, NavId) {
        let mut nav = Navigator::with_config(NullHost, config);
        let root = nav.register_root(NodeConfig::container("root")).unwrap();
        let a = nav.register_child(root, NodeConfig::leaf("a")).unwrap();
        let b = nav.register_child(root, NodeConfig::leaf("b")).unwrap();
        nav.set_link(b, Direction::Right, Some(a)).unwrap();
        nav.stabilize(root).unwrap();
        assert!(nav.pointer_down(b));
        (nav, a, b)
    }

    #[test]
    fn tab_falls_back_to_friend_direction() {
        // b is last in a column: Down finds nothing, Right (its friend) leads to a.
        let (mut nav, a, _) = tab_fallback_tree(NavigatorConfig::default());
        assert!(nav.handle_key(&key(KeyCode::Tab)).moved);
        assert_eq!(nav.current(), Some(a));
    }

    #[test]
    fn tab_fallback_can_be_disabled() {
        let (mut nav, _, b) = tab_fallback_tree(NavigatorConfig::default().with_tab_fallback(false));
        assert!(!nav.handle_key(&key(KeyCode::Tab)).moved);
        assert_eq!(nav.current(), Some(b));
    }

    #[test]
    fn arrow_never_falls_back() {
        let (mut nav, _, b) = tab_fallback_tree(NavigatorConfig::default());
        assert!(!nav.handle_key(&key(KeyCode::Down)).moved);
        assert_eq!(nav.current(), Some(b));
    }

    #[test]
    fn enter_activates_focused_element() {
        let (mut nav, [a, ..]) = column();
        let outcome = nav.handle_key(&key(KeyCode::Enter));
        assert!(outcome.activated);
        assert_eq!(nav.host().activations(a), 1);
    }

    #[test]
    fn enter_without_focus_reports_nothing_activated() {
        let mut nav = Navigator::new(RecordingHost::new());
        let outcome = nav.handle_key(&key(KeyCode::Enter));
        assert!(outcome.consumed);
        assert!(!outcome.activated);
    }

    #[test]
    fn pointer_down_focuses_focusable_only() {
        let mut nav = Navigator::new(NullHost);
        let root = nav.register_root(NodeConfig::container("root")).unwrap();
        let a = nav.register_child(root, NodeConfig::leaf("a")).unwrap();
        let panel = nav.register_child(root, NodeConfig::container("panel")).unwrap();
        let c = nav.register_child(panel, NodeConfig::leaf("c")).unwrap();
        nav.stabilize(panel).unwrap();
        nav.stabilize(root).unwrap();
        assert_eq!(nav.current(), Some(a));

        assert!(!nav.pointer_down(panel));
        assert_eq!(nav.current(), Some(a));
        assert!(nav.pointer_down(c));
        assert_eq!(nav.current(), Some(c));
    }

    #[test]
    fn pointer_down_is_native_trigger() {
        let mut nav = Navigator::new(NullHost);
        let root = nav.register_root(NodeConfig::container("root")).unwrap();
        nav.register_child(root, NodeConfig::leaf("a").will_unfocus(|ctx| ctx.native))
            .unwrap();
        let b = nav.register_child(root, NodeConfig::leaf("b")).unwrap();
        nav.stabilize(root).unwrap();
        assert!(!nav.change_focus(Direction::Down, false));
        assert!(nav.pointer_down(b));
    }

    #[test]
    fn native_focus_in_adopts_focusable_intruder() {
        let (mut nav, [a, b, _]) = column();
        assert!(!nav.native_focus_in(a));
        assert!(nav.native_focus_in(b));
        assert_eq!(nav.current(), Some(b));
        let root = nav.root().unwrap();
        assert!(!nav.native_focus_in(root));
        assert_eq!(nav.current(), Some(b));
    }

    #[test]
    fn unregistering_root_allows_new_root() {
        let (mut nav, _) = column();
        let root = nav.root().unwrap();
        nav.unregister(root).unwrap();
        assert_eq!(nav.current(), None);
        assert!(nav.tree().is_empty());
        let fresh = nav.register_root(NodeConfig::leaf("fresh")).unwrap();
        nav.stabilize(fresh).unwrap();
        assert_eq!(nav.current(), Some(fresh));
    }

    #[test]
    fn empty_tree_later_gains_focus() {
        let mut nav = Navigator::new(NullHost);
        let root = nav.register_root(NodeConfig::container("root")).unwrap();
        nav.stabilize(root).unwrap();
        assert_eq!(nav.current(), None);
        let late = nav.register_child(root, NodeConfig::leaf("late")).unwrap();
        nav.stabilize(late).unwrap();
        assert_eq!(nav.current(), Some(late));
    }

    #[test]
    fn registering_into_stable_parent_relinks() {
        let (mut nav, [_, _, c]) = column();
        let root = nav.root().unwrap();
        let d = nav.register_child(root, NodeConfig::leaf("d")).unwrap();
        assert_eq!(nav.tree().link(c, Direction::Down), Some(d));
        assert_eq!(nav.tree().link(d, Direction::Up), Some(c));
    }

    /// R (vertical): A, B; B (vertical): B1, B2.
    fn scenario() -> (Navigator<RecordingHost>, NavId, NavId, NavId, NavId) {
        let mut nav = Navigator::new(RecordingHost::new());
        let r = nav.register_root(NodeConfig::container("R")).unwrap();
        let a = nav.register_child(r, NodeConfig::leaf("A")).unwrap();
        let b = nav.register_child(r, NodeConfig::container("B")).unwrap();
        let b1 = nav.register_child(b, NodeConfig::leaf("B1")).unwrap();
        let b2 = nav.register_child(b, NodeConfig::leaf("B2")).unwrap();
        for id in [a, b1, b2, b, r] {
            nav.stabilize(id).unwrap();
        }
        (nav, a, b, b1, b2)
    }

    #[test]
    fn memory_scenario_returns_to_remembered_child() {
        let (mut nav, a, b, b1, b2) = scenario();
        assert_eq!(nav.current(), Some(a));

        nav.handle_key(&key(KeyCode::Down));
        assert_eq!(nav.current(), Some(b1));

        nav.handle_key(&key(KeyCode::Up));
        assert_eq!(nav.current(), Some(a));
        assert_eq!(nav.tree().memory(b), Some(b1));

        nav.handle_key(&key(KeyCode::Down));
        assert_eq!(nav.current(), Some(b1));
        assert!(!nav.tree().get(b2).unwrap().is_focused());
    }

    /// R (vertical): A, B, C; B (vertical): B1, B2.
    fn sandwich(no_memory: bool) -> (Navigator<NullHost>, [NavId; 4]) {
        let mut nav = Navigator::new(NullHost);
        let r = nav.register_root(NodeConfig::container("R")).unwrap();
        let a = nav.register_child(r, NodeConfig::leaf("A")).unwrap();
        let b = nav
            .register_child(r, NodeConfig::container("B").no_memory(no_memory))
            .unwrap();
        let b1 = nav.register_child(b, NodeConfig::leaf("B1")).unwrap();
        let b2 = nav.register_child(b, NodeConfig::leaf("B2")).unwrap();
        let c = nav.register_child(r, NodeConfig::leaf("C")).unwrap();
        nav.stabilize(b).unwrap();
        nav.stabilize(r).unwrap();
        assert_eq!(nav.current(), Some(a));
        (nav, [b, b1, b2, c])
    }

    #[test]
    fn reentry_follows_latest_exit() {
        let (mut nav, [b, _, b2, c]) = sandwich(false);
        assert!(nav.pointer_down(b2));
        nav.change_focus(Direction::Down, false);
        assert_eq!(nav.current(), Some(c));
        assert_eq!(nav.tree().memory(b), Some(b2));
        nav.change_focus(Direction::Up, false);
        assert_eq!(nav.current(), Some(b2));
    }

    #[test]
    fn no_memory_container_enters_at_first_child() {
        let (mut nav, [b, b1, b2, c]) = sandwich(true);
        assert!(nav.pointer_down(b2));
        nav.change_focus(Direction::Down, false);
        assert_eq!(nav.current(), Some(c));
        nav.change_focus(Direction::Up, false);
        assert_eq!(nav.current(), Some(b1));
        assert_eq!(nav.tree().get(b).unwrap().raw_memory(), None);
    }

    #[test]
    fn vetoed_move_keeps_remembered_child() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicBool, Ordering};

        let locked = Arc::new(AtomicBool::new(false));
        let gate = Arc::clone(&locked);
        let mut nav = Navigator::new(RecordingHost::new());
        let r = nav.register_root(NodeConfig::container("R")).unwrap();
        let a = nav
            .register_child(
                r,
                NodeConfig::leaf("A").will_unfocus(move |_| !gate.load(Ordering::SeqCst)),
            )
            .unwrap();
        let b = nav
            .register_child(r, NodeConfig::container("B").horizontal(true))
            .unwrap();
        nav.register_child(b, NodeConfig::leaf("B1")).unwrap();
        let b2 = nav.register_child(b, NodeConfig::leaf("B2")).unwrap();
        nav.stabilize(b).unwrap();
        nav.stabilize(r).unwrap();

        assert!(nav.pointer_down(b2));
        assert!(nav.change_focus(Direction::Up, false));
        assert_eq!(nav.current(), Some(a));
        assert_eq!(nav.tree().memory(b), Some(b2));

        locked.store(true, Ordering::SeqCst);
        nav.take_events();
        nav.host_mut().take_effects();
        assert!(!nav.change_focus(Direction::Down, false));
        assert_eq!(nav.current(), Some(a));
        assert_eq!(nav.tree().memory(b), Some(b2));
        assert!(nav.take_events().is_empty());
        assert!(nav.host().effects().is_empty());

        locked.store(false, Ordering::SeqCst);
        assert!(nav.change_focus(Direction::Down, false));
        assert_eq!(nav.current(), Some(b2));
    }

    #[test]
    fn vetoed_ascent_does_not_record_memory() {
        let mut nav = Navigator::new(NullHost);
        let r = nav.register_root(NodeConfig::container("R")).unwrap();
        nav.register_child(r, NodeConfig::leaf("A")).unwrap();
        let b = nav
            .register_child(r, NodeConfig::container("B").horizontal(true))
            .unwrap();
        let b1 = nav
            .register_child(b, NodeConfig::leaf("B1").will_unfocus(|_| false))
            .unwrap();
        nav.stabilize(b).unwrap();
        nav.stabilize(r).unwrap();
        assert!(nav.pointer_down(b1));

        assert!(!nav.change_focus(Direction::Up, false));
        assert_eq!(nav.current(), Some(b1));
        assert_eq!(nav.tree().get(b).unwrap().raw_memory(), None);
    }

    #[test]
    fn deleting_focused_node_focuses_sibling_at_same_index() {
        let (mut nav, [_, b, c]) = column();
        nav.change_focus(Direction::Down, false);
        assert_eq!(nav.current(), Some(b));
        nav.take_events();

        nav.unregister(b).unwrap();
        assert_eq!(nav.current(), Some(c));
        assert_eq!(
            nav.take_events(),
            vec![NavEvent::Blurred { id: b }, NavEvent::Focused { id: c }]
        );
        assert!(nav.host().effects().contains(&HostEffect::Detach(b)));
    }

    #[test]
    fn deleting_last_child_falls_back_to_parent_subtree() {
        let (mut nav, [a, _, c]) = column();
        nav.pointer_down(c);
        nav.unregister(c).unwrap();
        assert_eq!(nav.current(), Some(a));
    }

    #[test]
    fn deleting_subtree_with_focus_walks_up_ancestors() {
        let (mut nav, a, b, b1, _) = scenario();
        nav.pointer_down(b1);
        nav.unregister(b).unwrap();
        assert!(!nav.tree().contains(b1));
        assert_eq!(nav.current(), Some(a));
        assert_eq!(nav.tree().link(a, Direction::Down), None);
    }

    #[test]
    fn deleting_only_focusable_leaves_nothing_focused() {
        let mut nav = Navigator::new(NullHost);
        let r = nav.register_root(NodeConfig::container("R")).unwrap();
        let only = nav.register_child(r, NodeConfig::leaf("only")).unwrap();
        nav.stabilize(r).unwrap();
        assert_eq!(nav.current(), Some(only));
        nav.unregister(only).unwrap();
        assert_eq!(nav.current(), None);
        assert_eq!(nav.tree().focused_nodes().count(), 0);
    }

    #[test]
    fn deleting_unfocused_node_keeps_focus() {
        let (mut nav, [a, b, c]) = column();
        nav.unregister(b).unwrap();
        assert_eq!(nav.current(), Some(a));
        assert_eq!(nav.tree().link(a, Direction::Down), Some(c));
    }
}
