//! # Address Space Arena and Explorer
//!
//! The browsed server hierarchy is kept in a single arena: every node stores
//! its parent index and its child indices, and the arena's own enumeration
//! order is the flat index used for name lookups. There is no second
//! structure to keep in sync with the tree.
//!
//! ```text
//! [0] <root i=85>
//!  ├─[1] Line1
//!  │   ├─[3] Tank
//!  │   │   └─[5] Start
//!  │   └─[4] Mixer
//!  │       └─[6] Start
//!  └─[2] Server
//! ```
//!
//! Exploration is breadth-first, one level at a time. The browse calls of a
//! level run concurrently, results come back in request order and are
//! inserted by the single owner of the arena, so the arena layout does not
//! depend on which call finishes first.

use futures::stream::{self, StreamExt};
use hashbrown::HashSet;
use tracing::{debug, info, warn};

use crate::config::BrowseConfig;
use crate::{Error, Result};

use super::memory::{AddressSpaceSnapshot, SnapshotNode};
use super::session::UaSession;
use super::types::{BrowseReference, EndpointDescription, NodeClass, NodeClassMask, UaNodeId};

// ============================================================================
// Arena
// ============================================================================

/// Position of a node in its [`AddressSpace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(usize);

/// One node of the browsed hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressSpaceNode {
    pub node_id: UaNodeId,
    pub browse_name: String,
    pub node_class: NodeClass,
    parent: Option<NodeIndex>,
    children: Vec<NodeIndex>,
    depth: usize,
}

impl AddressSpaceNode {
    /// `None` only for the synthetic root.
    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    /// Distance from the root (root = 0).
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Single-rooted, acyclic tree of browsed nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressSpace {
    nodes: Vec<AddressSpaceNode>,
}

impl AddressSpace {
    /// A tree holding only the synthetic root for `root_id`.
    pub fn new(root_id: UaNodeId) -> Self {
        Self {
            nodes: vec![AddressSpaceNode {
                node_id: root_id,
                browse_name: String::new(),
                node_class: NodeClass::Object,
                parent: None,
                children: Vec::new(),
                depth: 0,
            }],
        }
    }

    pub fn root(&self) -> NodeIndex {
        NodeIndex(0)
    }

    /// Indices are only minted by this arena, so lookups cannot miss.
    pub fn node(&self, idx: NodeIndex) -> &AddressSpaceNode {
        &self.nodes[idx.0]
    }

    /// Attach a new child under `parent` and return its index.
    pub fn add_child(&mut self, parent: NodeIndex, reference: BrowseReference) -> NodeIndex {
        let idx = NodeIndex(self.nodes.len());
        let depth = self.nodes[parent.0].depth + 1;
        self.nodes.push(AddressSpaceNode {
            node_id: reference.node_id,
            browse_name: reference.browse_name,
            node_class: reference.node_class,
            parent: Some(parent),
            children: Vec::new(),
            depth,
        });
        self.nodes[parent.0].children.push(idx);
        idx
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when nothing beyond the root was discovered.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Flat index over every node, root first.
    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &AddressSpaceNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeIndex(i), n))
    }

    /// Non-root nodes whose browse name equals `name`.
    pub fn find_by_browse_name(&self, name: &str) -> Vec<NodeIndex> {
        self.iter()
            .filter(|(_, n)| !n.is_root() && n.browse_name == name)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Ancestor `level` steps up (0 = the node itself).
    pub fn ancestor(&self, idx: NodeIndex, level: usize) -> Option<NodeIndex> {
        let mut current = idx;
        for _ in 0..level {
            current = self.node(current).parent?;
        }
        Some(current)
    }

    /// Does `id` occur on the chain from `idx` up to the root (inclusive)?
    pub fn chain_contains(&self, idx: NodeIndex, id: &UaNodeId) -> bool {
        let mut current = Some(idx);
        while let Some(i) = current {
            let node = self.node(i);
            if node.node_id == *id {
                return true;
            }
            current = node.parent;
        }
        false
    }

    /// Browse names from the first level below the root down to `idx`.
    pub fn browse_path(&self, idx: NodeIndex) -> Vec<&str> {
        let mut names = Vec::with_capacity(self.node(idx).depth);
        let mut current = idx;
        while let Some(parent) = self.node(current).parent {
            names.push(self.node(current).browse_name.as_str());
            current = parent;
        }
        names.reverse();
        names
    }

    /// Record the tree as a snapshot that `MemoryConnector` can serve.
    ///
    /// A node id reached through several references is written once.
    pub fn to_snapshot(&self, endpoints: Vec<EndpointDescription>) -> AddressSpaceSnapshot {
        let mut written: HashSet<&UaNodeId> = HashSet::new();
        let mut nodes = Vec::new();

        for (_, node) in self.iter() {
            if node.children.is_empty() || !written.insert(&node.node_id) {
                continue;
            }
            let references = node
                .children
                .iter()
                .map(|&c| {
                    let child = self.node(c);
                    BrowseReference::new(child.node_id.clone(), child.browse_name.clone(), child.node_class)
                })
                .collect();
            nodes.push(SnapshotNode { node_id: node.node_id.clone(), references });
        }

        AddressSpaceSnapshot { root: self.node(self.root()).node_id.clone(), endpoints, nodes }
    }
}

// ============================================================================
// Explorer
// ============================================================================

/// Result of exploring a server: the tree plus the branches that failed.
///
/// A non-empty `failures` list means the tree is partial.
#[derive(Debug)]
pub struct Exploration {
    pub space: AddressSpace,
    pub failures: Vec<Error>,
}

/// Browse everything reachable from `root` into an [`AddressSpace`].
///
/// Never fails as a whole: a failed or timed-out browse call is logged,
/// recorded in `failures`, and its node is left childless.
pub async fn explore(session: &dyn UaSession, root: UaNodeId, config: &BrowseConfig) -> Exploration {
    let mask = NodeClassMask::OBJECT_AND_VARIABLE;
    let timeout = config.request_timeout();
    let mut space = AddressSpace::new(root);
    let mut failures = Vec::new();
    let mut frontier = vec![space.root()];

    while !frontier.is_empty() {
        let requests: Vec<(NodeIndex, UaNodeId)> = frontier
            .iter()
            .map(|&idx| (idx, space.node(idx).node_id.clone()))
            .collect();
        debug!(nodes = requests.len(), "browsing level");

        let results: Vec<(NodeIndex, UaNodeId, Result<Vec<BrowseReference>>)> = stream::iter(requests)
            .map(|(idx, id)| async move {
                let result = match tokio::time::timeout(timeout, session.browse(&id, mask)).await {
                    Ok(result) => result,
                    Err(_) => Err(Error::Browse {
                        node: id.to_string(),
                        message: format!("timed out after {} ms", timeout.as_millis()),
                    }),
                };
                (idx, id, result)
            })
            .buffered(config.concurrency.max(1))
            .collect()
            .await;

        let mut next = Vec::new();
        for (idx, id, result) in results {
            let references = match result {
                Ok(references) => references,
                Err(e) => {
                    warn!(node = %id, error = %e, "browse failed, treating branch as childless");
                    failures.push(as_browse_failure(&id, e));
                    continue;
                }
            };

            for reference in references {
                if !mask.contains(reference.node_class) {
                    continue;
                }
                let cyclic = space.chain_contains(idx, &reference.node_id);
                let child = space.add_child(idx, reference);
                if cyclic {
                    debug!(node = %space.node(child).node_id, "reference back into own ancestry, not descending");
                } else if space.node(child).depth() < config.max_depth {
                    next.push(child);
                }
            }
        }
        frontier = next;
    }

    info!(nodes = space.len(), failures = failures.len(), "address space explored");
    Exploration { space, failures }
}

fn as_browse_failure(node: &UaNodeId, e: Error) -> Error {
    match e {
        Error::Browse { .. } => e,
        other => Error::Browse { node: node.to_string(), message: other.to_string() },
    }
}

// ============================================================================
// Tests
// ============================================================================
