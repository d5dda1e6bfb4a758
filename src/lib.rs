//! # plc2skill - PLC Programs to Semantic Skill Models
//!
//! Maps a PLCopen XML project onto skill / capability assertions and fills
//! in the OPC UA node ids of every skill, parameter and output by browsing
//! the live server's address space.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `RuleEngine` and `UaConnector` are the contracts to the outside
//! 2. **Arena tree**: the browsed address space is one `Vec`, indexed, parent-linked
//! 3. **Pure fix-ups**: every pass returns a `QuadDelta`; the pipeline applies it
//! 4. **Degrade, don't abort**: only the rule engine can fail a run
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use plc2skill::{MappingConfig, Mapper, PlcOpenRules, MemoryConnector};
//!
//! # async fn example() -> plc2skill::Result<()> {
//! let connector = MemoryConnector::new("opc.tcp://plc:4840");
//! let mapper = Mapper::new(PlcOpenRules, connector);
//!
//! let config = MappingConfig::new("opc.tcp://plc:4840")
//!     .with_base_iri("http://example.org/plant");
//! let output = mapper.execute("project.xml".as_ref(), &config).await?;
//!
//! for warning in &output.warnings {
//!     eprintln!("{warning}");
//! }
//! println!("{}", output.document);
//! # Ok(())
//! # }
//! ```
//!
//! ## Connectors
//!
//! | Connector | Description |
//! |-----------|-------------|
//! | `MemoryConnector` | In-memory server, hand-built or loaded from a snapshot |
//! | `UnreachableConnector` | Always fails to connect; output degrades to placeholders |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod store;
pub mod opcua;
pub mod plcopen;
pub mod engine;
pub mod fixup;
pub mod template;
pub mod pipeline;
pub mod config;

// ============================================================================
// Re-exports: Model and store
// ============================================================================

pub use model::{Iri, Literal, Quad, Term};
pub use store::{QuadDelta, QuadStore};

// ============================================================================
// Re-exports: OPC UA
// ============================================================================

pub use opcua::{
    AddressSpace, AddressSpaceSnapshot, MemoryConnector, NodeIdResolver,
    UaConnector, UaNodeId, UaSession, UnreachableConnector,
};

// ============================================================================
// Re-exports: Pipeline
// ============================================================================

pub use config::{BrowseConfig, Credentials, MappingConfig};
pub use engine::{PlcOpenRules, RuleEngine};
pub use pipeline::{execute_mapping, Mapper, MappingOutput};
pub use template::StateMachineTemplate;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Mapping engine failure: {0}")]
    MappingEngine(String),

    #[error("Connection failure: {0}")]
    Connection(String),

    #[error("Unresolved identifier: no node matches '{path}'")]
    UnresolvedIdentifier { path: String },

    #[error("Ambiguous identifier: '{path}' matches {candidates} distinct nodes")]
    AmbiguousIdentifier { path: String, candidates: usize },

    #[error("Browse failure at {node}: {message}")]
    Browse { node: String, message: String },

    #[error("Document error: {0}")]
    Document(String),

    #[error("Invalid node id: {0}")]
    InvalidNodeId(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Fatal errors abort a run; all others are reported as warnings.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::MappingEngine(_) | Error::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
