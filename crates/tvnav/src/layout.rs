#![forbid(unsafe_code)]

//! Declarative navigation layouts.
//!
//! A [`Layout`] describes a whole tree as data, loaded from TOML or JSON, and
//! mounts it onto a [`Navigator`] in one call: nodes are registered in
//! document order, explicit links are resolved by `id`, and containers are
//! stabilized bottom-up so the initial focus is resolved last.
//!
//! # Loading
//!
//! ```toml
//! # menu.toml
//! [root]
//! id = "menu"
//!
//! [[root.children]]
//! id = "play"
//! focusable = true
//!
//! [[root.children]]
//! id = "tiles"
//! gridSize = 3
//! ```
//!
//! ```rust,ignore
//! let layout = Layout::from_path("menu.toml")?;
//! let mounted = layout.mount(&mut navigator)?;
//! let play = mounted.get("play");
//! ```
//!
//! Flag attributes accept markup-style values: `true`, `""` (a bare
//! attribute), or `"true"`. Everything else reads as `false`.

use std::path::Path;

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use tvnav_core::Direction;

use crate::attr::AttrValue;
use crate::error::LayoutError;
use crate::host::NavHost;
use crate::navigator::Navigator;
use crate::node::{NavId, NodeConfig, NodeFlags};

/// A whole navigation tree as data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub root: LayoutNode,
}

/// One node of a [`Layout`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutNode {
    /// Debug id; also the name other nodes use to link here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub focusable: Option<AttrValue>,

    #[serde(alias = "isHorizontal", skip_serializing_if = "Option::is_none")]
    pub horizontal: Option<AttrValue>,

    #[serde(alias = "noMemory", skip_serializing_if = "Option::is_none")]
    pub no_memory: Option<AttrValue>,

    #[serde(alias = "nativeFocus", skip_serializing_if = "Option::is_none")]
    pub native_focus: Option<AttrValue>,

    #[serde(alias = "needScroll", skip_serializing_if = "Option::is_none")]
    pub need_scroll: Option<AttrValue>,

    #[serde(alias = "gridSize", skip_serializing_if = "Option::is_none")]
    pub grid_size: Option<AttrValue>,

    #[serde(alias = "tabIndex", skip_serializing_if = "Option::is_none")]
    pub tab_index: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub up: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub down: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<LayoutNode>,
}

impl LayoutNode {
    /// Configured link target id in `direction`.
    #[must_use]
    pub fn link(&self, direction: Direction) -> Option<&str> {
        match direction {
            Direction::Up => self.up.as_deref(),
            Direction::Right => self.right.as_deref(),
            Direction::Down => self.down.as_deref(),
            Direction::Left => self.left.as_deref(),
        }
    }

    /// Engine configuration for this node alone (links and children aside).
    #[must_use]
    pub fn to_config(&self) -> NodeConfig {
        let mut config = NodeConfig::new();
        if let Some(id) = &self.id {
            config = config.id(id.clone());
        }
        let flags = [
            (NodeFlags::FOCUSABLE, &self.focusable),
            (NodeFlags::HORIZONTAL, &self.horizontal),
            (NodeFlags::NO_MEMORY, &self.no_memory),
            (NodeFlags::NATIVE_FOCUS, &self.native_focus),
            (NodeFlags::NEED_SCROLL, &self.need_scroll),
        ];
        for (flag, value) in flags {
            if let Some(value) = value {
                config = config.attr(flag, value);
            }
        }
        if let Some(grid) = &self.grid_size {
            config = config.grid_size_attr(grid);
        }
        if let Some(index) = self.tab_index {
            config = config.tab_index(index);
        }
        config
    }

    fn walk<'a>(&'a self, out: &mut Vec<&'a LayoutNode>) {
        out.push(self);
        for child in &self.children {
            child.walk(out);
        }
    }
}

impl Layout {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, LayoutError> {
        toml::from_str(s).map_err(LayoutError::Toml)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, LayoutError> {
        serde_json::from_str(s).map_err(LayoutError::Json)
    }

    /// Load from a `.toml` or `.json` file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LayoutError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let parse: fn(&str) -> Result<Self, LayoutError> = match ext.as_str() {
            "toml" => Self::from_toml_str,
            "json" => Self::from_json_str,
            _ => return Err(LayoutError::UnsupportedFormat(path.display().to_string())),
        };
        let content = std::fs::read_to_string(path)?;
        parse(&content)
    }

    /// Every node in document order (pre-order).
    #[must_use]
    pub fn nodes(&self) -> Vec<&LayoutNode> {
        let mut out = Vec::new();
        self.root.walk(&mut out);
        out
    }

    /// Check that ids are unique and every link names an existing id.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let nodes = self.nodes();
        let mut ids = AHashSet::new();
        for id in nodes.iter().filter_map(|n| n.id.as_deref()) {
            if !ids.insert(id) {
                return Err(LayoutError::DuplicateId(id.to_owned()));
            }
        }
        for node in &nodes {
            for direction in Direction::ALL {
                if let Some(target) = node.link(direction)
                    && !ids.contains(target)
                {
                    return Err(LayoutError::UnknownLink {
                        node: node.id.clone().unwrap_or_default(),
                        direction,
                        target: target.to_owned(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Register the whole layout on `nav`.
    ///
    /// Fails before touching the navigator if the layout does not validate.
    pub fn mount<H: NavHost>(&self, nav: &mut Navigator<H>) -> Result<MountedLayout, LayoutError> {
        self.validate()?;

        let root = nav.register_root(self.root.to_config())?;
        let mut mounted = MountedLayout {
            root,
            by_id: AHashMap::new(),
        };
        // (layout node, handle) in document order.
        let mut order = vec![(&self.root, root)];
        let mut cursor = 0;
        while cursor < order.len() {
            let (node, handle) = order[cursor];
            if let Some(id) = &node.id {
                mounted.by_id.insert(id.clone(), handle);
            }
            let mut registered = Vec::with_capacity(node.children.len());
            for child in &node.children {
                registered.push((child, nav.register_child(handle, child.to_config())?));
            }
            // Keep pre-order so stabilization below can walk it backwards.
            order.splice(cursor + 1..cursor + 1, registered);
            cursor += 1;
        }

        for &(node, handle) in &order {
            for direction in Direction::ALL {
                if let Some(target) = node.link(direction).and_then(|t| mounted.get(t)) {
                    nav.set_link(handle, direction, Some(target))?;
                }
            }
        }

        // Reverse pre-order visits every child before its parent.
        for &(_, handle) in order.iter().rev() {
            nav.stabilize(handle)?;
        }

        tracing::info!(
            nodes = order.len(),
            focused = ?nav.current().map(|c| nav.tree().label(c).to_string()),
            "layout mounted"
        );
        Ok(mounted)
    }
}

/// Handles produced by [`Layout::mount`].
#[derive(Debug, Clone)]
pub struct MountedLayout {
    pub root: NavId,
    by_id: AHashMap<String, NavId>,
}

impl MountedLayout {
    /// Handle of the node declared with `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<NavId> {
        self.by_id.get(id).copied()
    }

    /// Number of nodes that declared an id.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
