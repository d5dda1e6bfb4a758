//! In-memory OPC UA server.
//!
//! This is the reference implementation of `UaConnector` / `UaSession`.
//! It serves a fixed reference table protected by RwLock, either built by
//! hand or loaded from an [`AddressSpaceSnapshot`] file.
//!
//! ## Test hooks
//!
//! - `fail_browse(node)`: browsing that node returns `Error::Browse`.
//! - `delay_browse(node, d)`: browsing that node sleeps `d` first, to
//!   exercise per-call timeouts.
//!
//! `UnreachableConnector` stands in when no server is available at all.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use hashbrown::{HashMap, HashSet};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::Credentials;
use crate::{Error, Result};

use super::endpoint::select_endpoint;
use super::session::{UaConnector, UaSession};
use super::types::{BrowseReference, EndpointDescription, NodeClass, NodeClassMask, UaNodeId, UserTokenType};

// ============================================================================
// Snapshot format
// ============================================================================

/// Serializable record of a server's browsable hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressSpaceSnapshot {
    /// Node the recording started from.
    pub root: UaNodeId,
    #[serde(default)]
    pub endpoints: Vec<EndpointDescription>,
    pub nodes: Vec<SnapshotNode>,
}

/// Forward references of one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub node_id: UaNodeId,
    pub references: Vec<BrowseReference>,
}

impl AddressSpaceSnapshot {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

// ============================================================================
// MemoryConnector
// ============================================================================

/// In-memory server reachable at exactly one endpoint URL.
pub struct MemoryConnector {
    endpoint_url: String,
    endpoints: Vec<EndpointDescription>,
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    references: RwLock<HashMap<UaNodeId, Vec<BrowseReference>>>,
    failing: RwLock<HashSet<UaNodeId>>,
    delays: RwLock<HashMap<UaNodeId, Duration>>,
    browse_calls: AtomicU64,
}

impl MemoryConnector {
    /// Empty server with one unsecured endpoint accepting anonymous and
    /// user-name tokens.
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        let endpoint_url = endpoint_url.into();
        let endpoint = EndpointDescription::unsecured(
            endpoint_url.clone(),
            vec![UserTokenType::Anonymous, UserTokenType::UserName],
        );
        Self {
            endpoint_url,
            endpoints: vec![endpoint],
            inner: Arc::new(MemoryInner {
                references: RwLock::new(HashMap::new()),
                failing: RwLock::new(HashSet::new()),
                delays: RwLock::new(HashMap::new()),
                browse_calls: AtomicU64::new(0),
            }),
        }
    }

    /// Serve a recorded snapshot. Its endpoints replace the default one
    /// unless the snapshot has none.
    pub fn from_snapshot(endpoint_url: impl Into<String>, snapshot: AddressSpaceSnapshot) -> Self {
        let mut connector = Self::new(endpoint_url);
        if !snapshot.endpoints.is_empty() {
            connector.endpoints = snapshot.endpoints;
        }
        {
            let mut refs = connector.inner.references.write();
            for node in snapshot.nodes {
                refs.entry(node.node_id).or_default().extend(node.references);
            }
        }
        connector
    }

    pub fn add_reference(&self, parent: &UaNodeId, reference: BrowseReference) {
        self.inner.references.write().entry(parent.clone()).or_default().push(reference);
    }

    pub fn add_object(&self, parent: &UaNodeId, id: UaNodeId, browse_name: &str) {
        self.add_reference(parent, BrowseReference::new(id, browse_name, NodeClass::Object));
    }

    pub fn add_variable(&self, parent: &UaNodeId, id: UaNodeId, browse_name: &str) {
        self.add_reference(parent, BrowseReference::new(id, browse_name, NodeClass::Variable));
    }

    pub fn fail_browse(&self, node: &UaNodeId) {
        self.inner.failing.write().insert(node.clone());
    }

    pub fn delay_browse(&self, node: &UaNodeId, delay: Duration) {
        self.inner.delays.write().insert(node.clone(), delay);
    }

    /// Total browse calls served across all sessions.
    pub fn browse_calls(&self) -> u64 {
        self.inner.browse_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl UaConnector for MemoryConnector {
    async fn connect(
        &self,
        endpoint_url: &str,
        credentials: Option<&Credentials>,
    ) -> Result<Box<dyn UaSession>> {
        if endpoint_url.trim_end_matches('/') != self.endpoint_url.trim_end_matches('/') {
            return Err(Error::Connection(format!("no server listening at {endpoint_url}")));
        }
        let endpoint = select_endpoint(&self.endpoints, credentials)?.clone();
        Ok(Box::new(MemorySession { inner: Arc::clone(&self.inner), endpoint }))
    }
}

// ============================================================================
// MemorySession
// ============================================================================

/// Session on a [`MemoryConnector`].
pub struct MemorySession {
    inner: Arc<MemoryInner>,
    endpoint: EndpointDescription,
}

#[async_trait]
impl UaSession for MemorySession {
    async fn browse(&self, node: &UaNodeId, mask: NodeClassMask) -> Result<Vec<BrowseReference>> {
        self.inner.browse_calls.fetch_add(1, Ordering::Relaxed);

        let delay = self.inner.delays.read().get(node).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.inner.failing.read().contains(node) {
            return Err(Error::Browse {
                node: node.to_string(),
                message: "BadNodeIdUnknown".into(),
            });
        }

        let refs = self.inner.references.read();
        Ok(refs
            .get(node)
            .map(|r| r.iter().filter(|r| mask.contains(r.node_class)).cloned().collect())
            .unwrap_or_default())
    }

    fn endpoint(&self) -> &EndpointDescription {
        &self.endpoint
    }
}

// ============================================================================
// UnreachableConnector
// ============================================================================

/// Connector for when no transport is configured: every connect fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnreachableConnector;

#[async_trait]
impl UaConnector for UnreachableConnector {
    async fn connect(
        &self,
        endpoint_url: &str,
        _credentials: Option<&Credentials>,
    ) -> Result<Box<dyn UaSession>> {
        Err(Error::Connection(format!("no OPC UA transport available for {endpoint_url}")))
    }
}

// ============================================================================
// Tests
// ============================================================================
