//! Expansion-aware construction of [`Forest`] snapshots.
//!
//! Every pass walks the hierarchy from its roots. Each visited node gets its
//! children loaded (or reused from the previous snapshot), and the walk only
//! descends into nodes whose whole ancestor chain is expanded. Collapsed
//! branches therefore never pay any loading cost below their first level.

use futures::future::{self, LocalBoxFuture};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::LoadError;
use crate::expansion::ExpansionSet;
use crate::hierarchy::{Hierarchy, HierarchyItem, NodeId};
use crate::tree::{Children, Forest, TreeNode};

/// Asynchronously resolves the children of a node.
///
/// Failures are returned as values; a failing node never aborts its siblings.
pub trait ChildLoader {
    fn load_children<'a>(
        &'a self,
        node_id: NodeId,
        source: &'a Hierarchy,
    ) -> LocalBoxFuture<'a, Result<Vec<HierarchyItem>, LoadError>>;
}

/// Filters the hierarchy by parent id, keeping source order. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchyChildLoader;

impl ChildLoader for HierarchyChildLoader {
    fn load_children<'a>(
        &'a self,
        node_id: NodeId,
        source: &'a Hierarchy,
    ) -> LocalBoxFuture<'a, Result<Vec<HierarchyItem>, LoadError>> {
        future::ready(Ok(source.children_of(node_id))).boxed_local()
    }
}

/// Hooks into a build pass, e.g. to show per-node loading indicators.
///
/// Only calls that reach the [`ChildLoader`] are reported; children reused
/// from the previous snapshot are not.
pub trait BuildObserver {
    fn load_started(&self, _node_id: NodeId) {}
    fn load_finished(&self, _node_id: NodeId, _error: Option<&LoadError>) {}
}

impl BuildObserver for () {}

/// Whether sibling loads of one level run at the same time.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SiblingLoading {
    #[default]
    Concurrent,
    Sequential,
}

pub struct TreeBuilder<L> {
    loader: L,
    sibling_loading: SiblingLoading,
}

impl<L: ChildLoader> TreeBuilder<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            sibling_loading: SiblingLoading::default(),
        }
    }

    pub fn with_sibling_loading(mut self, sibling_loading: SiblingLoading) -> Self {
        self.sibling_loading = sibling_loading;
        self
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn sibling_loading(&self) -> SiblingLoading {
        self.sibling_loading
    }

    /// Build a fresh snapshot.
    ///
    /// Children already loaded in `previous` are reused instead of being
    /// requested again; failed loads are retried.
    pub async fn build(
        &self,
        hierarchy: &Hierarchy,
        expansion: &ExpansionSet,
        previous: Option<&Forest>,
        observer: &dyn BuildObserver,
    ) -> Forest {
        let previous = previous.map(Forest::index).unwrap_or_default();
        let pass = BuildPass {
            loader: &self.loader,
            sibling_loading: self.sibling_loading,
            hierarchy,
            expansion,
            previous: &previous,
            observer,
        };
        Forest::new(pass.build_level(hierarchy.roots(), true).await)
    }
}

struct BuildPass<'a, L> {
    loader: &'a L,
    sibling_loading: SiblingLoading,
    hierarchy: &'a Hierarchy,
    expansion: &'a ExpansionSet,
    previous: &'a HashMap<NodeId, &'a TreeNode>,
    observer: &'a dyn BuildObserver,
}

impl<'a, L: ChildLoader> BuildPass<'a, L> {
    fn build_level(
        &self,
        items: Vec<HierarchyItem>,
        parent_expanded: bool,
    ) -> LocalBoxFuture<'_, Vec<TreeNode>> {
        async move {
            match self.sibling_loading {
                SiblingLoading::Concurrent => {
                    let nodes = items
                        .into_iter()
                        .map(|item| self.build_node(item, parent_expanded));
                    future::join_all(nodes).await
                }
                SiblingLoading::Sequential => {
                    let mut nodes = Vec::with_capacity(items.len());
                    for item in items {
                        nodes.push(self.build_node(item, parent_expanded).await);
                    }
                    nodes
                }
            }
        }
        .boxed_local()
    }

    fn build_node(
        &self,
        item: HierarchyItem,
        parent_expanded: bool,
    ) -> LocalBoxFuture<'_, TreeNode> {
        async move {
            let node_id = item.id;
            let reused = self
                .previous
                .get(&node_id)
                .and_then(|node| node.loaded_children());
            let loaded = match reused {
                Some(children) => Ok(children.iter().map(|child| child.item.clone()).collect()),
                None => {
                    self.observer.load_started(node_id);
                    let loaded = self.loader.load_children(node_id, self.hierarchy).await;
                    self.observer.load_finished(node_id, loaded.as_ref().err());
                    loaded
                }
            };

            let is_expanded = parent_expanded && self.expansion.contains(node_id);
            let children = match loaded {
                Ok(items) if is_expanded => Children::Loaded(self.build_level(items, true).await),
                Ok(items) => Children::Loaded(items.into_iter().map(TreeNode::pending).collect()),
                Err(error) => Children::Failed(error),
            };
            TreeNode { item, children }
        }
        .boxed_local()
    }
}
