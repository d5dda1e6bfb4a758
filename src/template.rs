//! State-machine templating.
//!
//! Plain token substitution over a loaded Turtle template. Every occurrence
//! of [`SKILL_NAME_TOKEN`] and [`BASE_IRI_TOKEN`] is replaced; there is no
//! other logic. Once rendered, a block has no tokens left, so rendering it
//! again with another name changes nothing.

use std::path::Path;

use crate::Result;

pub const SKILL_NAME_TOKEN: &str = "${SkillName}";
pub const BASE_IRI_TOKEN: &str = "${BaseIri}";

const BUILTIN: &str = include_str!("../templates/PLCStateMachine.ttl");

/// Replace every name and base-IRI token in `template`.
pub fn render(template: &str, skill_name: &str, base_iri: &str) -> String {
    template.replace(SKILL_NAME_TOKEN, skill_name).replace(BASE_IRI_TOKEN, base_iri)
}

/// A loaded state-machine template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateMachineTemplate {
    text: String,
}

impl StateMachineTemplate {
    /// The bundled ISA-88 state machine.
    pub fn builtin() -> Self {
        Self { text: BUILTIN.to_string() }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self::from_text(std::fs::read_to_string(path)?))
    }

    pub fn render(&self, skill_name: &str, base_iri: &str) -> String {
        render(&self.text, skill_name, base_iri)
    }

    /// One block per name, blank-line separated, trailing whitespace trimmed.
    pub fn render_all<'a>(&self, skill_names: impl IntoIterator<Item = &'a str>, base_iri: &str) -> String {
        skill_names
            .into_iter()
            .map(|name| self.render(name, base_iri).trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl Default for StateMachineTemplate {
    fn default() -> Self {
        Self::builtin()
    }
}
