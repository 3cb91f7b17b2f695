use serde::{Deserialize, Serialize};

use crate::hierarchy::NodeId;
use crate::paging::PageWindow;

/// Failures the tree view can run into while loading data.
///
/// Errors travel as values through relays and wire messages, so they stay
/// `Clone` and serializable and carry their context as plain strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum LoadError {
    #[error("failed to load children of node {node_id}: {reason}")]
    ChildLoad { node_id: NodeId, reason: String },
    #[error("failed to load items {window}: {reason}")]
    PageFetch { window: PageWindow, reason: String },
    #[error("failed to parse items: {0}")]
    Parse(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("backend unreachable: {0}")]
    Connection(String),
}

impl LoadError {
    pub fn child_load(node_id: NodeId, reason: impl Into<String>) -> Self {
        LoadError::ChildLoad {
            node_id,
            reason: reason.into(),
        }
    }

    pub fn page_fetch(window: PageWindow, reason: impl Into<String>) -> Self {
        LoadError::PageFetch {
            window,
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(error: serde_json::Error) -> Self {
        LoadError::Parse(error.to_string())
    }
}

impl From<toml::de::Error> for LoadError {
    fn from(error: toml::de::Error) -> Self {
        LoadError::Config(error.to_string())
    }
}
