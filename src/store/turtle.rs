//! Turtle serialization of a [`QuadStore`].
//!
//! Produces a prefix header followed by one block per subject:
//!
//! ```text
//! @prefix CSS: <http://www.w3id.org/hsu-aut/css#> .
//!
//! <http://ex#Dose> a CSS:Skill ;
//!     OpcUa:nodeId "ns=4;s=|var|PLC.Application.MAIN.Dose" .
//! ```
//!
//! Output order follows the store's quad order, so serialization is
//! deterministic for a given set of assertions.

use std::fmt::Write;

use crate::model::{vocab, Iri, Literal, Quad, Term};

use super::QuadStore;

/// Serialize the store as a Turtle document.
pub fn to_turtle(store: &QuadStore) -> String {
    let mut out = String::with_capacity(64 * store.len() + 256);

    for (prefix, namespace) in vocab::PREFIXES {
        let _ = writeln!(out, "@prefix {prefix}: <{namespace}> .");
    }

    let mut current: Option<&Iri> = None;
    for quad in store.iter() {
        if current == Some(&quad.subject) {
            out.push_str(" ;\n    ");
        } else {
            if current.is_some() {
                out.push_str(" .\n");
            }
            out.push('\n');
            out.push_str(&format_iri(&quad.subject));
            out.push(' ');
            current = Some(&quad.subject);
        }
        write_predicate_object(&mut out, quad);
    }
    if current.is_some() {
        out.push_str(" .\n");
    }

    out
}

fn write_predicate_object(out: &mut String, quad: &Quad) {
    if quad.predicate.as_str() == vocab::RDF_TYPE {
        out.push('a');
    } else {
        out.push_str(&format_iri(&quad.predicate));
    }
    out.push(' ');
    out.push_str(&format_term(&quad.object));
}

/// Format an IRI as a prefixed name when possible, `<...>` otherwise.
pub(crate) fn format_iri(iri: &Iri) -> String {
    for (prefix, namespace) in vocab::PREFIXES {
        if let Some(local) = iri.as_str().strip_prefix(namespace) {
            if is_simple_local_name(local) {
                return format!("{prefix}:{local}");
            }
        }
    }
    format!("<{}>", escape_iriref(iri.as_str()))
}

/// Percent-encode the characters IRIREF excludes: controls, space and the
/// delimiters `<` `>` `"` `{` `}` `|` `^` backtick and backslash.
fn escape_iriref(iri: &str) -> String {
    let mut out = String::with_capacity(iri.len());
    for c in iri.chars() {
        if c <= ' ' || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\') {
            let _ = write!(out, "%{:02X}", c as u32);
        } else {
            out.push(c);
        }
    }
    out
}

fn format_term(term: &Term) -> String {
    match term {
        Term::Iri(iri) => format_iri(iri),
        Term::Literal(lit) => format_literal(lit),
    }
}

fn format_literal(lit: &Literal) -> String {
    let quoted = turtle_string(&lit.lexical);
    match &lit.datatype {
        Some(dt) => format!("{quoted}^^{}", format_iri(dt)),
        None => quoted,
    }
}

fn turtle_string(s: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r");
    format!("\"{escaped}\"")
}

/// Conservative subset of PN_LOCAL: letters, digits, `_` and `-`, not
/// starting with `-`.
fn is_simple_local_name(local: &str) -> bool {
    !local.is_empty()
        && !local.starts_with('-')
        && local.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
