//! # Fix-up Passes
//!
//! Each pass reads a store and returns a [`QuadDelta`]; none of them mutates
//! anything. The pipeline applies the deltas in order:
//!
//! ```text
//! rule engine ─> resource_identity ─> resolve_node_ids + endpoint_facts ─> serialize
//! ```
//!
//! Passes only add what is missing, so running one twice yields an empty
//! second delta.

use tracing::{debug, warn};

use crate::model::vocab::*;
use crate::model::{Iri, Literal, Quad, Term};
use crate::opcua::resolver::{is_placeholder, NodeIdResolver, PLACEHOLDER_MARKER};
use crate::opcua::{EndpointDescription, UserTokenType};
use crate::store::{QuadDelta, QuadStore};
use crate::Error;

fn add_missing(store: &QuadStore, delta: &mut QuadDelta, quad: Quad) {
    if !store.contains(&quad) && !delta.additions.contains(&quad) {
        delta.add(quad);
    }
}

// ============================================================================
// Resource identity
// ============================================================================

/// Declare `resource` as a `CSS:Resource` providing every skill and
/// capability in the store.
pub fn resource_identity(store: &QuadStore, resource: &Iri) -> QuadDelta {
    let mut delta = QuadDelta::new();
    add_missing(store, &mut delta, Quad::new(resource.clone(), RDF_TYPE, Term::iri(CSS_RESOURCE)));

    for skill in store.subjects_of_type(CSS_SKILL) {
        add_missing(store, &mut delta, Quad::new(resource.clone(), CSS_PROVIDES_SKILL, skill));
    }
    for capability in store.subjects_of_type(CSS_CAPABILITY) {
        add_missing(store, &mut delta, Quad::new(resource.clone(), CSS_PROVIDES_CAPABILITY, capability));
    }
    delta
}

// ============================================================================
// Node ids
// ============================================================================

/// Outcome of the node-id pass.
#[derive(Debug, Default)]
pub struct NodeIdFixup {
    pub delta: QuadDelta,
    /// One `UnresolvedIdentifier` / `AmbiguousIdentifier` per placeholder
    /// left in place.
    pub failures: Vec<Error>,
    pub resolved: usize,
}

/// Replace every `OpcUa:nodeId` placeholder literal by the node id it
/// resolves to. Placeholders that do not resolve are kept unchanged.
pub fn resolve_node_ids(store: &QuadStore, resolver: &NodeIdResolver<'_>) -> NodeIdFixup {
    let node_id = Iri::new(OPCUA_NODE_ID);
    let mut fixup = NodeIdFixup::default();

    for quad in store.matching(None, Some(&node_id), None) {
        let Some(placeholder) = quad.object.as_lexical().filter(|l| is_placeholder(l)) else {
            continue;
        };
        match resolver.resolve(placeholder) {
            Ok(id) => {
                debug!(placeholder, node = %id, "placeholder resolved");
                let resolved = Quad::new(quad.subject.clone(), node_id.clone(), Literal::string(id.to_string()));
                fixup.delta.replace(quad.clone(), resolved);
                fixup.resolved += 1;
            }
            Err(e) => {
                warn!(placeholder, error = %e, "placeholder left unresolved");
                fixup.failures.push(e);
            }
        }
    }
    fixup
}

/// Text-level alternative to live resolution: every occurrence of the
/// placeholder marker in a serialized document becomes `root`.
pub fn substitute_marker(document: &str, root: &str) -> String {
    document.replace(PLACEHOLDER_MARKER, root)
}

// ============================================================================
// Endpoint facts
// ============================================================================

/// `server a OpcUa:UAServer`, its endpoint URL, and `resource OpcUa:hasServer server`.
pub fn server_facts(store: &QuadStore, resource: &Iri, server: &Iri, endpoint_url: &str) -> QuadDelta {
    let mut delta = QuadDelta::new();
    add_missing(store, &mut delta, Quad::new(server.clone(), RDF_TYPE, Term::iri(OPCUA_SERVER)));
    add_missing(store, &mut delta, Quad::new(resource.clone(), OPCUA_HAS_SERVER, server.clone()));
    add_missing(store, &mut delta, Quad::new(server.clone(), OPCUA_ENDPOINT_URL, Literal::string(endpoint_url)));
    delta
}

/// [`server_facts`] plus the security descriptors of the negotiated endpoint.
pub fn endpoint_facts(
    store: &QuadStore,
    resource: &Iri,
    server: &Iri,
    endpoint: &EndpointDescription,
    token: UserTokenType,
) -> QuadDelta {
    let mut delta = server_facts(store, resource, server, &endpoint.url);
    let facts = [
        (OPCUA_SECURITY_MODE, endpoint.security_mode.to_string()),
        (OPCUA_SECURITY_POLICY, endpoint.security_policy_uri.clone()),
        (OPCUA_USER_TOKEN_TYPE, token.to_string()),
    ];
    for (predicate, value) in facts {
        add_missing(store, &mut delta, Quad::new(server.clone(), predicate, Literal::string(value)));
    }
    delta
}

// ============================================================================
// Tests
// ============================================================================
