//! # Node Identity Resolution
//!
//! Turns a partial, dotted path from the PLC program's naming hierarchy
//! into the one node id it denotes on the server.
//!
//! Browse names are not unique server-wide, so resolution works like a
//! relative path against a directory tree, read from the leaf outwards:
//!
//! ```text
//! placeholder  ".Tank.Start"          segments  [Start, Tank]
//!
//! candidates named "Start":  Line1.Tank.Start   Line1.Mixer.Start
//! level 1 (parent == Tank):  Line1.Tank.Start                       -> unique
//! ```
//!
//! Candidates are collapsed by node id before and after every level, since
//! several references may lead to the same target node. Filtering stops at
//! the first level that leaves a single node id.

use hashbrown::HashSet;
use smallvec::SmallVec;

use crate::{Error, Result};

use super::address_space::{AddressSpace, NodeIndex};
use super::types::UaNodeId;

/// Reserved prefix of placeholder literals written by the rule engine.
pub const PLACEHOLDER_MARKER: &str = "PLCIdentifier";

pub const PATH_SEPARATOR: char = '.';

/// Drop the placeholder marker, if the literal carries one.
///
/// Only a whole leading segment counts: `PLCIdentifierX.Y` is left alone.
pub fn strip_marker(literal: &str) -> &str {
    literal
        .strip_prefix(PLACEHOLDER_MARKER)
        .filter(|rest| rest.is_empty() || rest.starts_with(PATH_SEPARATOR))
        .unwrap_or(literal)
}

/// Is this literal still an unresolved placeholder?
pub fn is_placeholder(literal: &str) -> bool {
    strip_marker(literal).len() != literal.len()
}

// ============================================================================
// PathSegments
// ============================================================================

/// Path split on `.` and reversed: `[0]` is the leaf name, higher indices
/// walk outward through the enclosing units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegments<'a>(SmallVec<[&'a str; 8]>);

impl<'a> PathSegments<'a> {
    /// Strips the placeholder marker and one leading separator before splitting. Empty segments are kept
    /// as written, so `"a..b"` has an empty middle name that matches nothing.
    pub fn parse(path: &'a str) -> Self {
        let path = strip_marker(path);
        let path = path.strip_prefix(PATH_SEPARATOR).unwrap_or(path);
        let mut segments: SmallVec<[&str; 8]> = path.split(PATH_SEPARATOR).collect();
        segments.reverse();
        Self(segments)
    }

    pub fn leaf(&self) -> &'a str {
        self.0.first().copied().unwrap_or_default()
    }

    pub fn get(&self, level: usize) -> Option<&'a str> {
        self.0.get(level).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|s| s.is_empty())
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Resolves placeholder paths against one explored address space.
///
/// Borrows the arena for the whole resolution session; nothing can mutate
/// it while lookups are running.
pub struct NodeIdResolver<'s> {
    space: &'s AddressSpace,
}

impl<'s> NodeIdResolver<'s> {
    pub fn new(space: &'s AddressSpace) -> Self {
        Self { space }
    }

    /// Resolve a dotted path (root-to-leaf, optional marker and leading `.`).
    ///
    /// Fails with `UnresolvedIdentifier` when no node fits and with
    /// `AmbiguousIdentifier` when several distinct node ids still fit once
    /// the path is exhausted.
    pub fn resolve(&self, partial_path: &str) -> Result<UaNodeId> {
        let segments = PathSegments::parse(partial_path);
        let unresolved = || Error::UnresolvedIdentifier { path: partial_path.to_string() };

        if segments.is_empty() {
            return Err(unresolved());
        }

        let mut candidates = self.space.find_by_browse_name(segments.leaf());
        self.dedup_by_node_id(&mut candidates);

        let mut level = 1;
        while candidates.len() > 1 {
            let Some(name) = segments.get(level) else { break };
            candidates.retain(|&c| self.ancestor_named(c, level, name));
            self.dedup_by_node_id(&mut candidates);
            level += 1;
        }

        match candidates.as_slice() {
            [] => Err(unresolved()),
            [only] => Ok(self.space.node(*only).node_id.clone()),
            _ => Err(Error::AmbiguousIdentifier {
                path: partial_path.to_string(),
                candidates: candidates.len(),
            }),
        }
    }

    /// Keep the first entry per node id; several references may lead to
    /// the same target.
    fn dedup_by_node_id(&self, candidates: &mut Vec<NodeIndex>) {
        let mut seen: HashSet<&UaNodeId> = HashSet::with_capacity(candidates.len());
        candidates.retain(|&c| seen.insert(&self.space.node(c).node_id));
    }

    /// Is the ancestor `level` steps above `idx` a non-root node named `name`?
    fn ancestor_named(&self, idx: NodeIndex, level: usize, name: &str) -> bool {
        self.space
            .ancestor(idx, level)
            .map(|a| self.space.node(a))
            .is_some_and(|a| !a.is_root() && a.browse_name == name)
    }
}

// ============================================================================
// Tests
// ============================================================================
