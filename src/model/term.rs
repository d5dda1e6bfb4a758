//! RDF terms and the quad (subject, predicate, object) assertion.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::vocab;

/// A named resource (absolute IRI).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Iri(String);

impl Iri {
    pub fn new(iri: impl Into<String>) -> Self {
        Self(iri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

impl From<&str> for Iri {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A literal value with an optional datatype IRI.
///
/// `datatype: None` is a plain `xsd:string` literal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub lexical: String,
    pub datatype: Option<Iri>,
}

impl Literal {
    pub fn string(lexical: impl Into<String>) -> Self {
        Self { lexical: lexical.into(), datatype: None }
    }

    pub fn typed(lexical: impl Into<String>, datatype: impl Into<Iri>) -> Self {
        let datatype = datatype.into();
        if datatype.as_str() == vocab::XSD_STRING {
            return Self::string(lexical);
        }
        Self { lexical: lexical.into(), datatype: Some(datatype) }
    }
}

/// Object position of a quad: a named resource or a literal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Term {
    Iri(Iri),
    Literal(Literal),
}

impl Term {
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::Iri(Iri::new(iri))
    }

    pub fn literal(lexical: impl Into<String>) -> Self {
        Term::Literal(Literal::string(lexical))
    }

    /// Lexical form of a literal, `None` for IRIs.
    pub fn as_lexical(&self) -> Option<&str> {
        match self {
            Term::Literal(lit) => Some(&lit.lexical),
            Term::Iri(_) => None,
        }
    }
}

impl From<Iri> for Term {
    fn from(iri: Iri) -> Self {
        Term::Iri(iri)
    }
}

impl From<Literal> for Term {
    fn from(lit: Literal) -> Self {
        Term::Literal(lit)
    }
}

/// One subject-predicate-object assertion.
///
/// Ordering is lexicographic over (subject, predicate, object), which gives
/// the store a stable enumeration and serialization order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Quad {
    pub subject: Iri,
    pub predicate: Iri,
    pub object: Term,
}

impl Quad {
    pub fn new(subject: impl Into<Iri>, predicate: impl Into<Iri>, object: impl Into<Term>) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    /// Does this quad match the pattern? `None` positions are wildcards.
    pub fn matches(&self, s: Option<&Iri>, p: Option<&Iri>, o: Option<&Term>) -> bool {
        s.is_none_or(|s| *s == self.subject)
            && p.is_none_or(|p| *p == self.predicate)
            && o.is_none_or(|o| *o == self.object)
    }
}
