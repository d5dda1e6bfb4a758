//! Mapping configuration.
//!
//! Every field has a default, so a JSON config file only needs the keys it
//! overrides. The CLI layers its flags on top of a loaded file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::opcua::UaNodeId;
use crate::{Error, Result};

pub const DEFAULT_BASE_IRI: &str = "http://www.hsu-ifa.de/ontologies/plc2skill";

/// User name / password pair for an OPC UA `UserName` token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self { user: user.into(), password: password.into() }
    }

    /// Blank user or password counts as no credentials.
    pub fn is_blank(&self) -> bool {
        self.user.trim().is_empty() || self.password.trim().is_empty()
    }
}

/// Limits for address-space exploration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowseConfig {
    /// Per-call browse timeout.
    pub request_timeout_ms: u64,
    /// Nodes deeper than this are kept but not browsed.
    pub max_depth: usize,
    /// Browse calls in flight at once.
    pub concurrency: usize,
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self { request_timeout_ms: 5000, max_depth: 32, concurrency: 4 }
    }
}

impl BrowseConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Options for one mapping run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    pub base_iri: String,
    /// Explicit resource identity; derived from the configuration name if unset.
    pub resource_iri: Option<String>,
    pub endpoint_url: String,
    pub credentials: Option<Credentials>,
    /// Root-identifier override: replaces the placeholder marker textually
    /// and skips live resolution.
    pub node_id_root: Option<String>,
    /// Where browsing starts.
    pub root_node: UaNodeId,
    pub browse: BrowseConfig,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            base_iri: DEFAULT_BASE_IRI.to_string(),
            resource_iri: None,
            endpoint_url: String::new(),
            credentials: None,
            node_id_root: None,
            root_node: UaNodeId::objects_folder(),
            browse: BrowseConfig::default(),
        }
    }
}

impl MappingConfig {
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self { endpoint_url: endpoint_url.into(), ..Self::default() }
    }

    /// Load a JSON config file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_iri.trim().is_empty() {
            return Err(Error::Config("base_iri must not be empty".into()));
        }
        if self.browse.concurrency == 0 {
            return Err(Error::Config("browse.concurrency must be > 0".into()));
        }
        Ok(())
    }

    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Self {
        self.base_iri = base_iri.into();
        self
    }

    pub fn with_resource_iri(mut self, resource_iri: impl Into<String>) -> Self {
        self.resource_iri = Some(resource_iri.into());
        self
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::new(user, password));
        self
    }

    pub fn with_node_id_root(mut self, root: impl Into<String>) -> Self {
        self.node_id_root = Some(root.into());
        self
    }

    pub fn with_browse(mut self, browse: BrowseConfig) -> Self {
        self.browse = browse;
        self
    }

    /// Non-blank credentials, if any.
    pub fn effective_credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref().filter(|c| !c.is_blank())
    }

    /// Non-blank root-identifier override, if any.
    pub fn effective_node_id_root(&self) -> Option<&str> {
        self.node_id_root.as_deref().filter(|r| !r.trim().is_empty())
    }

    /// The base IRI as a namespace: ends in `#` or `/`. A blank base IRI
    /// falls back to [`DEFAULT_BASE_IRI`].
    pub fn base_namespace(&self) -> String {
        let base = Some(self.base_iri.trim()).filter(|b| !b.is_empty()).unwrap_or(DEFAULT_BASE_IRI);
        if base.ends_with('#') || base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}#")
        }
    }

    /// `{namespace}{local}`.
    pub fn mint(&self, local: &str) -> String {
        format!("{}{local}", self.base_namespace())
    }
}
