//! # Assertion Model
//!
//! Plain data for the intermediate assertion store: IRIs, literals, quads.
//! These types cross every boundary: rule engine ↔ store ↔ fix-ups ↔ serializer.
//!
//! Design rule: no I/O, no state, no async in this module.

pub mod term;
pub mod vocab;

pub use term::{Iri, Literal, Quad, Term};
