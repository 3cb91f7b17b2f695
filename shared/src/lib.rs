use serde::{Deserialize, Serialize};

pub mod builder;
pub mod config;
pub mod error;
pub mod expansion;
pub mod hierarchy;
pub mod layout;
pub mod model;
pub mod paging;
pub mod tree;

pub use builder::{BuildObserver, ChildLoader, HierarchyChildLoader, SiblingLoading, TreeBuilder};
pub use config::{AppConfig, AppSection, DatasetConfig, PageSourceConfig, TreeViewConfig};
pub use error::LoadError;
pub use expansion::ExpansionSet;
pub use hierarchy::{AppendSummary, Hierarchy, HierarchyItem, NodeId};
pub use layout::{RowLayout, RowSizing, VisibleRange};
pub use model::TreeModel;
pub use paging::{
    PageOutcome, PageRequest, PageWindow, Pager, ScrollDirection, ScrollTracker,
    parse_page_response,
};
pub use tree::{Children, Forest, TreeNode, VisibleRow};

// ===== MESSAGE TYPES =====

#[derive(Serialize, Deserialize, Debug)]
pub enum UpMsg {
    LoadConfig,
    LoadInitialItems,
    LoadPage { request_id: u64, window: PageWindow },
}

#[derive(Serialize, Deserialize, Debug)]
pub enum DownMsg {
    ConfigLoaded(AppConfig),
    ConfigError(String),
    InitialItems(Vec<HierarchyItem>),
    PageLoaded {
        request_id: u64,
        items: Vec<HierarchyItem>,
    },
    PageError {
        request_id: u64,
        error: LoadError,
    },
}
