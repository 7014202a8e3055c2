#![forbid(unsafe_code)]

//! The navigation tree: an arena of [`NavNode`]s addressed by [`NavId`].
//!
//! Ownership runs parent → children through each node's ordered child list.
//! `parent` is a plain handle used for lookup only, and directional links are
//! handles too, so removing a node never leaves a dangling reference behind:
//! a link or memory entry that names a removed node simply reads as absent.
//!
//! # Invariants
//!
//! 1. Exactly one parentless node (the root) exists while the tree is
//!    non-empty.
//! 2. `children` never has gaps; removal compacts immediately.
//! 3. The parent/child relation is acyclic. A node is always created as a
//!    fresh leaf under an existing parent, so no registration can close a
//!    cycle.
//! 4. Auto links never replace an explicit link unless a recreate pass is
//!    requested.

use std::fmt;

use ahash::{AHashMap, AHashSet};
use tvnav_core::Direction;

use crate::node::{GateContext, Link, NavId, NavNode, NodeConfig, NodeFlags};

/// Whether a resolution pass may restore remembered children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryMode {
    /// Re-enter containers at their remembered child.
    Use,
    /// Ignore (and discard) remembered children.
    Skip,
}

/// Parameters of one [`NavTree::find_focus`] pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusRequest {
    pub direction: Option<Direction>,
    pub native: bool,
    pub memory: MemoryMode,
    /// Node holding focus when the pass started; handed to `will_focus`.
    pub current: Option<NavId>,
}

impl FocusRequest {
    /// Request used for initial focus and deletion recovery.
    #[must_use]
    pub const fn undirected(current: Option<NavId>) -> Self {
        Self {
            direction: None,
            native: false,
            memory: MemoryMode::Skip,
            current,
        }
    }
}

/// Outcome of [`NavTree::remove_subtree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    /// Parent the subtree was detached from; `None` when the root went away.
    pub parent: Option<NavId>,
    /// Former position among the parent's children.
    pub index: usize,
    /// Every node dropped, the detached node first.
    pub removed: Vec<NavId>,
    /// Whether the supplied focused node was inside the subtree.
    pub contained_focus: bool,
}

/// Arena holding one navigation tree.
#[derive(Debug, Default)]
pub struct NavTree {
    nodes: AHashMap<NavId, NavNode>,
    root: Option<NavId>,
    next_id: u64,
    /// Prior memory values overwritten since `begin_memory_journal`.
    journal: Option<Vec<(NavId, Option<NavId>)>>,
}

impl NavTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn root(&self) -> Option<NavId> {
        self.root
    }

    #[must_use]
    pub fn get(&self, id: NavId) -> Option<&NavNode> {
        self.nodes.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: NavId) -> Option<&mut NavNode> {
        self.nodes.get_mut(&id)
    }

    #[must_use]
    pub fn contains(&self, id: NavId) -> bool {
        self.nodes.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All live node handles, in no particular order.
    pub fn node_ids(&self) -> impl Iterator<Item = NavId> + '_ {
        self.nodes.keys().copied()
    }

    #[must_use]
    pub fn parent(&self, id: NavId) -> Option<NavId> {
        self.nodes.get(&id)?.parent
    }

    /// Children of `id` in navigation order; empty for unknown handles.
    #[must_use]
    pub fn children(&self, id: NavId) -> &[NavId] {
        self.nodes.get(&id).map(|n| n.children.as_slice()).unwrap_or_default()
    }

    /// Neighbor of `id` in `direction`, if it names a live node.
    #[must_use]
    pub fn link(&self, id: NavId, direction: Direction) -> Option<NavId> {
        let link = self.nodes.get(&id)?.links[direction.index()]?;
        self.contains(link.target).then_some(link.target)
    }

    /// Remembered child of `id`, if it is still one of its children.
    #[must_use]
    pub fn memory(&self, id: NavId) -> Option<NavId> {
        let node = self.nodes.get(&id)?;
        node.memory.filter(|m| node.children.contains(m))
    }

    pub(crate) fn set_memory(&mut self, id: NavId, child: NavId) {
        self.write_memory(id, Some(child));
    }

    fn write_memory(&mut self, id: NavId, value: Option<NavId>) {
        if let Some(node) = self.nodes.get_mut(&id) {
            let previous = std::mem::replace(&mut node.memory, value);
            if let Some(journal) = self.journal.as_mut() {
                journal.push((id, previous));
            }
        }
    }

    /// Start recording memory writes so a vetoed move can undo them.
    pub(crate) fn begin_memory_journal(&mut self) {
        self.journal = Some(Vec::new());
    }

    /// Keep every memory write since the journal began.
    pub(crate) fn commit_memory_journal(&mut self) {
        self.journal = None;
    }

    /// Restore every memory slot written since the journal began.
    pub(crate) fn rollback_memory_journal(&mut self) {
        let Some(journal) = self.journal.take() else {
            return;
        };
        for (id, previous) in journal.into_iter().rev() {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.memory = previous;
            }
        }
    }

    /// Strict ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NavId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Number of edges between `id` and the root.
    #[must_use]
    pub fn depth(&self, id: NavId) -> usize {
        self.ancestors(id).count()
    }

    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: NavId, id: NavId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// Nodes whose `focused` flag is set. At most one in every reachable state.
    pub fn focused_nodes(&self) -> impl Iterator<Item = NavId> + '_ {
        self.nodes
            .iter()
            .filter(|(_, node)| node.focused)
            .map(|(id, _)| *id)
    }

    /// Log-friendly name: the debug id when present, the handle otherwise.
    #[must_use]
    pub fn label(&self, id: NavId) -> NodeLabel<'_> {
        NodeLabel {
            id,
            debug_id: self.nodes.get(&id).and_then(|n| n.debug_id.as_deref()),
        }
    }

    fn alloc_id(&mut self) -> NavId {
        self.next_id += 1;
        NavId(self.next_id)
    }

    /// Insert the parentless root. The caller guarantees no root exists.
    pub(crate) fn insert_root(&mut self, config: NodeConfig) -> NavId {
        debug_assert!(self.root.is_none(), "tree already has a root");
        let id = self.alloc_id();
        self.nodes.insert(id, NavNode::from_config(config, None));
        self.root = Some(id);
        id
    }

    /// Append a fresh leaf to `parent`'s children.
    pub(crate) fn insert_child(&mut self, parent: NavId, config: NodeConfig) -> Option<NavId> {
        if !self.contains(parent) {
            return None;
        }
        let id = self.alloc_id();
        self.nodes.insert(id, NavNode::from_config(config, Some(parent)));
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(id);
        }
        Some(id)
    }

    /// Detach `id` from its parent and drop its whole subtree.
    pub(crate) fn remove_subtree(&mut self, id: NavId, focused: Option<NavId>) -> Option<Removal> {
        let parent = self.nodes.get(&id)?.parent;
        let mut index = 0;
        if let Some(parent_node) = parent.and_then(|p| self.nodes.get_mut(&p))
            && let Some(pos) = parent_node.children.iter().position(|c| *c == id)
        {
            parent_node.children.remove(pos);
            index = pos;
        }
        if self.root == Some(id) {
            self.root = None;
        }

        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                stack.extend(node.children.iter().rev().copied());
                removed.push(next);
            }
        }
        let contained_focus = focused.is_some_and(|f| removed.contains(&f));

        Some(Removal {
            parent,
            index,
            removed,
            contained_focus,
        })
    }

    /// Set or clear a configured link. Explicit links outrank auto links.
    pub(crate) fn set_explicit_link(
        &mut self,
        id: NavId,
        direction: Direction,
        target: Option<NavId>,
    ) -> bool {
        let Some(node) = self.nodes.get_mut(&id) else {
            return false;
        };
        node.links[direction.index()] = target.map(|target| Link {
            target,
            explicit: true,
        });
        true
    }

    /// Synthesize neighbor links among `parent`'s children.
    ///
    /// Children are first stably sorted by ascending native ordering index
    /// (negative indexes count as `0`, they only opt out of native tabbing).
    /// A parent with `grid_size > 1` and more children than that links them
    /// as rows of that width; otherwise they form a list along the parent's
    /// axis.
    ///
    /// With `recreate` unset, an auto link that would replace a different
    /// explicit link is skipped with a warning.
    pub fn create_auto_links<F>(&mut self, parent: NavId, recreate: bool, tab_index_of: F)
    where
        F: Fn(NavId) -> i32,
    {
        let Some(node) = self.nodes.get_mut(&parent) else {
            return;
        };
        node.children.sort_by_key(|child| tab_index_of(*child).max(0));
        let children = node.children.clone();
        let horizontal = node.is_horizontal();
        let grid = node.grid_size.filter(|g| *g > 1 && children.len() > *g);

        match grid {
            Some(width) => self.link_grid(&children, width, recreate),
            None => self.link_list(&children, horizontal, recreate),
        }
    }

    fn link_grid(&mut self, children: &[NavId], width: usize, recreate: bool) {
        let len = children.len();
        for (i, &child) in children.iter().enumerate() {
            let up = i.checked_sub(width).map(|j| children[j]);
            let down = (i + width < len).then(|| children[i + width]);
            let left = (i % width != 0).then(|| children[i - 1]);
            let right = ((i + 1) % width != 0 && i + 1 < len).then(|| children[i + 1]);
            self.set_auto_link(child, Direction::Up, up, recreate);
            self.set_auto_link(child, Direction::Left, left, recreate);
            self.set_auto_link(child, Direction::Right, right, recreate);
            self.set_auto_link(child, Direction::Down, down, recreate);
        }
    }

    fn link_list(&mut self, children: &[NavId], horizontal: bool, recreate: bool) {
        let (forward, backward, cross) = if horizontal {
            (Direction::Right, Direction::Left, [Direction::Up, Direction::Down])
        } else {
            (Direction::Down, Direction::Up, [Direction::Left, Direction::Right])
        };
        for (i, &child) in children.iter().enumerate() {
            // Leftovers from an earlier grid pass.
            for direction in cross {
                self.clear_auto_link(child, direction);
            }
            let next = children.get(i + 1).copied();
            let prev = i.checked_sub(1).map(|j| children[j]);
            match next {
                Some(next) => self.set_auto_link(child, forward, Some(next), recreate),
                None => self.clear_auto_link(child, forward),
            }
            match prev {
                Some(prev) => self.set_auto_link(child, backward, Some(prev), recreate),
                None => self.clear_auto_link(child, backward),
            }
        }
    }

    fn set_auto_link(
        &mut self,
        id: NavId,
        direction: Direction,
        value: Option<NavId>,
        recreate: bool,
    ) {
        let live = |t: NavId| self.nodes.contains_key(&t);
        let existing = self
            .nodes
            .get(&id)
            .and_then(|n| n.links[direction.index()])
            .filter(|l| live(l.target));

        if let (Some(existing), Some(value)) = (existing, value) {
            if existing.target == value {
                return;
            }
            if existing.explicit && !recreate {
                tracing::warn!(
                    node = %self.label(id),
                    direction = %direction,
                    explicit = %self.label(existing.target),
                    auto = %self.label(value),
                    "node is part of a list but has a fixed link that contradicts it; keeping the fixed link"
                );
                return;
            }
        }

        if let Some(node) = self.nodes.get_mut(&id) {
            node.links[direction.index()] = value.map(|target| Link {
                target,
                explicit: false,
            });
        }
    }

    /// Drop an auto link at a list end. Explicit links are left alone.
    fn clear_auto_link(&mut self, id: NavId, direction: Direction) {
        if let Some(node) = self.nodes.get_mut(&id)
            && node.links[direction.index()].is_some_and(|l| !l.explicit)
        {
            node.links[direction.index()] = None;
        }
    }

    /// Resolve the node that should receive focus when navigation arrives at
    /// `id`, or `None` if nothing in this subtree accepts it.
    ///
    /// In order: the `will_focus` gate may refuse outright; a focusable node
    /// takes focus itself; a remembered child is tried next (memory is
    /// consumed by the attempt); then children in order.
    pub fn find_focus(&mut self, id: NavId, request: &FocusRequest) -> Option<NavId> {
        let node = self.nodes.get(&id)?;

        if let Some(gate) = node.will_focus.clone() {
            let ctx = GateContext {
                other: request.current,
                direction: request.direction,
                native: request.native,
            };
            if !gate(&ctx) {
                tracing::debug!(node = %self.label(id), "will_focus refused");
                return None;
            }
        }

        let node = self.nodes.get(&id)?;
        if node.is_focusable() {
            return Some(id);
        }

        let inner = FocusRequest {
            memory: if node.flags.contains(NodeFlags::NO_MEMORY) {
                MemoryMode::Skip
            } else {
                request.memory
            },
            ..*request
        };
        let children = node.children.clone();
        let remembered = node.memory;
        let mut tried = None;

        if let Some(remembered) = remembered {
            self.write_memory(id, None);
            if !children.contains(&remembered) {
                tracing::warn!(
                    node = %self.label(id),
                    "remembered child is no longer a child; ignoring memory"
                );
            } else if inner.memory == MemoryMode::Skip {
                tracing::warn!(
                    node = %self.label(id),
                    child = %self.label(remembered),
                    "remembered child present but memory mode is disabled"
                );
            } else {
                if let Some(found) = self.find_focus(remembered, &inner) {
                    return Some(found);
                }
                tracing::warn!(
                    node = %self.label(id),
                    child = %self.label(remembered),
                    "remembered child has no place left to hold focus"
                );
                tried = Some(remembered);
            }
        }

        children
            .into_iter()
            .filter(|child| Some(*child) != tried)
            .find_map(|child| self.find_focus(child, &inner))
    }
}

/// Iterator over strict ancestors, nearest first.
pub struct Ancestors<'a> {
    tree: &'a NavTree,
    next: Option<NavId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NavId;

    fn next(&mut self) -> Option<NavId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

/// Display adapter produced by [`NavTree::label`].
#[derive(Debug, Clone, Copy)]
pub struct NodeLabel<'a> {
    id: NavId,
    debug_id: Option<&'a str>,
}

impl fmt::Display for NodeLabel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.debug_id {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "{}", self.id),
        }
    }
}

/// Walk every node reachable from the root and check structural invariants.
///
/// Returns a description of the first violation found.
pub fn check_structure(tree: &NavTree) -> Result<(), String> {
    let Some(root) = tree.root() else {
        return if tree.is_empty() {
            Ok(())
        } else {
            Err("nodes present without a root".into())
        };
    };
    if tree.parent(root).is_some() {
        return Err(format!("root {root} has a parent"));
    }

    let mut seen = AHashSet::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            return Err(format!("{id} reachable twice (cycle or shared child)"));
        }
        for &child in tree.children(id) {
            if tree.parent(child) != Some(id) {
                return Err(format!("{child} listed under {id} but points elsewhere"));
            }
            stack.push(child);
        }
    }
    if seen.len() != tree.len() {
        return Err(format!(
            "{} nodes unreachable from the root",
            tree.len() - seen.len()
        ));
    }
    if tree.focused_nodes().count() > 1 {
        return Err("more than one node is focused".into());
    }
    Ok(())
}
