//! OPC UA value types exchanged with a protocol session.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

// ============================================================================
// Node identifiers
// ============================================================================

/// Identifier part of a node id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Identifier {
    Numeric(u32),
    String(String),
    Guid(String),
    Opaque(String),
}

/// Namespace-qualified node identifier.
///
/// Displays and parses in the OPC UA parseable form: `i=85`, `ns=4;s=Foo`,
/// `ns=1;g=<guid>`, `ns=1;b=<base64>`. Namespace 0 is printed without prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UaNodeId {
    pub namespace: u16,
    pub identifier: Identifier,
}

impl UaNodeId {
    pub fn numeric(namespace: u16, id: u32) -> Self {
        Self { namespace, identifier: Identifier::Numeric(id) }
    }

    pub fn string(namespace: u16, id: impl Into<String>) -> Self {
        Self { namespace, identifier: Identifier::String(id.into()) }
    }

    /// `i=85`, the standard Objects folder.
    pub fn objects_folder() -> Self {
        Self::numeric(0, 85)
    }
}

impl Default for UaNodeId {
    fn default() -> Self {
        Self::objects_folder()
    }
}

impl fmt::Display for UaNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace != 0 {
            write!(f, "ns={};", self.namespace)?;
        }
        match &self.identifier {
            Identifier::Numeric(n) => write!(f, "i={n}"),
            Identifier::String(s) => write!(f, "s={s}"),
            Identifier::Guid(g) => write!(f, "g={g}"),
            Identifier::Opaque(b) => write!(f, "b={b}"),
        }
    }
}

impl FromStr for UaNodeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidNodeId(s.to_string());

        let (namespace, rest) = match s.strip_prefix("ns=") {
            Some(tail) => {
                let (ns, rest) = tail.split_once(';').ok_or_else(invalid)?;
                (ns.parse::<u16>().map_err(|_| invalid())?, rest)
            }
            None => (0, s),
        };

        let (kind, value) = rest.split_once('=').ok_or_else(invalid)?;
        let identifier = match kind {
            "i" => Identifier::Numeric(value.parse().map_err(|_| invalid())?),
            "s" => Identifier::String(value.to_string()),
            "g" => Identifier::Guid(value.to_string()),
            "b" => Identifier::Opaque(value.to_string()),
            _ => return Err(invalid()),
        };
        Ok(Self { namespace, identifier })
    }
}

impl Serialize for UaNodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for UaNodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Node classes
// ============================================================================

/// The node classes the explorer asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeClass {
    Object,
    Variable,
}

impl NodeClass {
    /// OPC UA `NodeClass` enumeration value (also its mask bit).
    pub fn value(self) -> u32 {
        match self {
            NodeClass::Object => 1,
            NodeClass::Variable => 2,
        }
    }
}

/// Bit mask over [`NodeClass`] values, as sent in a browse description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeClassMask(pub u32);

impl NodeClassMask {
    pub const OBJECT_AND_VARIABLE: NodeClassMask = NodeClassMask(1 | 2);

    pub fn contains(self, class: NodeClass) -> bool {
        self.0 & class.value() != 0
    }
}

/// One forward reference returned by a browse call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BrowseReference {
    pub node_id: UaNodeId,
    pub browse_name: String,
    pub node_class: NodeClass,
}

impl BrowseReference {
    pub fn new(node_id: UaNodeId, browse_name: impl Into<String>, node_class: NodeClass) -> Self {
        Self { node_id, browse_name: browse_name.into(), node_class }
    }
}

// ============================================================================
// Endpoints
// ============================================================================

pub const SECURITY_POLICY_NONE: &str = "http://opcfoundation.org/UA/SecurityPolicy#None";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageSecurityMode {
    None,
    Sign,
    SignAndEncrypt,
}

impl fmt::Display for MessageSecurityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MessageSecurityMode::None => "None",
            MessageSecurityMode::Sign => "Sign",
            MessageSecurityMode::SignAndEncrypt => "SignAndEncrypt",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserTokenType {
    Anonymous,
    UserName,
    Certificate,
    IssuedToken,
}

impl fmt::Display for UserTokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// An endpoint offered by a server, and after connecting the one in use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDescription {
    pub url: String,
    pub security_mode: MessageSecurityMode,
    pub security_policy_uri: String,
    pub user_token_types: Vec<UserTokenType>,
}

impl EndpointDescription {
    /// Unsecured endpoint accepting the given token types.
    pub fn unsecured(url: impl Into<String>, user_token_types: Vec<UserTokenType>) -> Self {
        Self {
            url: url.into(),
            security_mode: MessageSecurityMode::None,
            security_policy_uri: SECURITY_POLICY_NONE.to_string(),
            user_token_types,
        }
    }

    pub fn accepts(&self, token: UserTokenType) -> bool {
        self.user_token_types.contains(&token)
    }
}
