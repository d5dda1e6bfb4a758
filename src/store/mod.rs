//! # Quad Store
//!
//! The intermediate representation produced by the rule engine and mutated
//! by the fix-up passes. A set of quads: inserting an existing quad is a
//! no-op, so duplicate assertions collapse naturally.
//!
//! Fix-up passes never mutate the store directly. They compute a
//! [`QuadDelta`] from a read-only view and the pipeline applies it, which
//! keeps every pass testable against a fixed input store.

pub mod turtle;

use std::collections::BTreeSet;

use crate::model::{Iri, Quad, Term};

// ============================================================================
// QuadStore
// ============================================================================

/// In-memory quad set with pattern queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuadStore {
    quads: BTreeSet<Quad>,
}

impl QuadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a quad. Returns false if it was already present.
    pub fn add(&mut self, quad: Quad) -> bool {
        self.quads.insert(quad)
    }

    /// Remove a quad. Returns true if it existed.
    pub fn remove(&mut self, quad: &Quad) -> bool {
        self.quads.remove(quad)
    }

    /// All quads matching the pattern; `None` positions are wildcards.
    pub fn matching<'a>(
        &'a self,
        s: Option<&'a Iri>,
        p: Option<&'a Iri>,
        o: Option<&'a Term>,
    ) -> impl Iterator<Item = &'a Quad> + 'a {
        self.quads.iter().filter(move |q| q.matches(s, p, o))
    }

    /// Remove every quad matching the pattern. Returns how many were removed.
    pub fn remove_matching(&mut self, s: Option<&Iri>, p: Option<&Iri>, o: Option<&Term>) -> usize {
        let before = self.quads.len();
        self.quads.retain(|q| !q.matches(s, p, o));
        before - self.quads.len()
    }

    /// Distinct subjects carrying `rdf:type <class>`.
    pub fn subjects_of_type(&self, class: &str) -> Vec<Iri> {
        let rdf_type = Iri::new(crate::model::vocab::RDF_TYPE);
        let class = Term::iri(class);
        let mut subjects: Vec<Iri> = self
            .matching(None, Some(&rdf_type), Some(&class))
            .map(|q| q.subject.clone())
            .collect();
        subjects.dedup();
        subjects
    }

    pub fn contains(&self, quad: &Quad) -> bool {
        self.quads.contains(quad)
    }

    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Quad> {
        self.quads.iter()
    }

    /// Apply a delta: removals first, then additions.
    pub fn apply(&mut self, delta: QuadDelta) {
        for quad in &delta.removals {
            self.quads.remove(quad);
        }
        self.quads.extend(delta.additions);
    }

    /// Consuming variant of [`QuadStore::apply`] for stage chaining.
    pub fn with_delta(mut self, delta: QuadDelta) -> Self {
        self.apply(delta);
        self
    }
}

impl FromIterator<Quad> for QuadStore {
    fn from_iter<I: IntoIterator<Item = Quad>>(iter: I) -> Self {
        Self { quads: iter.into_iter().collect() }
    }
}

impl Extend<Quad> for QuadStore {
    fn extend<I: IntoIterator<Item = Quad>>(&mut self, iter: I) {
        self.quads.extend(iter);
    }
}

// ============================================================================
// QuadDelta
// ============================================================================

/// The output of a fix-up pass: quads to retract and quads to assert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuadDelta {
    pub removals: Vec<Quad>,
    pub additions: Vec<Quad>,
}

impl QuadDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, quad: Quad) {
        self.additions.push(quad);
    }

    /// Replace `old` with `new` (remove + add).
    pub fn replace(&mut self, old: Quad, new: Quad) {
        self.removals.push(old);
        self.additions.push(new);
    }

    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.additions.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
