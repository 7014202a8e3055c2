#![forbid(unsafe_code)]

//! Error types.

use thiserror::Error;

use crate::node::NavId;

/// Rejected registration or lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavError {
    #[error("a root is already registered ({existing}); wrap sibling roots in one container")]
    DuplicateRoot { existing: NavId },
    #[error("no node {0} in this navigator")]
    UnknownNode(NavId),
}

pub type Result<T> = std::result::Result<T, NavError>;

/// Failure to load or mount a declarative layout.
#[cfg(feature = "layout")]
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("failed to read layout: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse layout TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to parse layout JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported layout format {0:?} (expected .toml or .json)")]
    UnsupportedFormat(String),
    #[error("node id {0:?} is used more than once")]
    DuplicateId(String),
    #[error("node {node:?} links {direction} to unknown id {target:?}")]
    UnknownLink {
        node: String,
        direction: tvnav_core::Direction,
        target: String,
    },
    #[error(transparent)]
    Nav(#[from] NavError),
}
