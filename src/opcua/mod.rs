//! # OPC UA Side
//!
//! Everything that talks to, or stands in for, the industrial control server:
//! the session seam, endpoint selection, the explored address-space arena,
//! and identifier resolution on top of it.
//!
//! ```text
//! UaConnector::connect ──> UaSession ──explore()──> AddressSpace ──NodeIdResolver──> UaNodeId
//! ```

pub mod types;
pub mod session;
pub mod endpoint;
pub mod memory;
pub mod address_space;
pub mod resolver;

pub use types::{
    BrowseReference, EndpointDescription, Identifier, MessageSecurityMode,
    NodeClass, NodeClassMask, UaNodeId, UserTokenType,
};
pub use session::{UaConnector, UaSession};
pub use endpoint::select_endpoint;
pub use memory::{AddressSpaceSnapshot, MemoryConnector, UnreachableConnector};
pub use address_space::{explore, AddressSpace, AddressSpaceNode, Exploration, NodeIndex};
pub use resolver::{NodeIdResolver, PathSegments, PLACEHOLDER_MARKER};
