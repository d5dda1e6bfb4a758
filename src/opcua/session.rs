//! # Protocol Session Trait
//!
//! The contract between the mapper and an OPC UA client stack. The wire
//! protocol, secure channel and session handshake live behind it; the mapper
//! only ever connects, browses, and reads the negotiated endpoint.
//!
//! ## Implementations
//!
//! | Connector | Module | Description |
//! |-----------|--------|-------------|
//! | `MemoryConnector` | `memory` | Serves a recorded or hand-built address space |
//! | `UnreachableConnector` | `memory` | Always fails to connect |

use async_trait::async_trait;

use crate::config::Credentials;
use crate::Result;

use super::types::{BrowseReference, EndpointDescription, NodeClassMask, UaNodeId};

/// An established session with one server. One session serves one mapping run.
#[async_trait]
pub trait UaSession: Send + Sync {
    /// Forward references of `node` whose target class is in `mask`.
    ///
    /// Fails with `Error::Browse` on protocol errors.
    async fn browse(&self, node: &UaNodeId, mask: NodeClassMask) -> Result<Vec<BrowseReference>>;

    /// The endpoint this session was negotiated on.
    fn endpoint(&self) -> &EndpointDescription;
}

/// Opens sessions. Fails with `Error::Connection`.
#[async_trait]
pub trait UaConnector: Send + Sync {
    async fn connect(
        &self,
        endpoint_url: &str,
        credentials: Option<&Credentials>,
    ) -> Result<Box<dyn UaSession>>;
}
