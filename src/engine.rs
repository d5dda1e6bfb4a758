//! # Rule Engine
//!
//! The first pipeline stage: source document in, initial [`QuadStore`] out.
//! Any failure here aborts the run as `Error::MappingEngine`.
//!
//! [`PlcOpenRules`] is the built-in rule set for PLCopen XML. Per skill
//! instance `i` declared in POU `P` it asserts:
//!
//! ```text
//! <ns i>             a CSS:Skill ; OpcUa:nodeId "PLCIdentifier.P.i" ;
//!                    CSS:hasStateMachine <ns i_StateMachine> ;
//!                    CSS:hasSkillParameter <ns i_v> ; CSS:hasSkillOutput <ns i_w> .
//! <ns i_Capability>  a CSS:Capability ; CSS:isRealizedBy <ns i> .
//! <ns i_v>           a CSS:SkillParameter ; CSS:hasName "v" ; CSS:hasDataType "REAL" ;
//!                    OpcUa:nodeId "PLCIdentifier.P.i.v" .
//! ```
//!
//! The local name `i` becomes `P_i` when another POU declares an instance
//! of the same name.

use std::path::Path;

use tracing::{debug, info};

use crate::model::vocab::*;
use crate::model::{Iri, Literal, Quad, Term};
use crate::opcua::resolver::{PATH_SEPARATOR, PLACEHOLDER_MARKER};
use crate::plcopen::{PlcOpenDocument, Skill, Variable};
use crate::store::QuadStore;
use crate::{Error, Result};

/// Transforms a source document into assertions.
pub trait RuleEngine: Send + Sync {
    /// `base_namespace` already ends in `#` or `/`; minted IRIs are
    /// `{base_namespace}{local}`.
    fn run(&self, source: &Path, base_namespace: &str) -> Result<QuadStore>;
}

/// Placeholder literal for a root-to-leaf path.
pub fn placeholder(path: &str) -> String {
    format!("{PLACEHOLDER_MARKER}{PATH_SEPARATOR}{path}")
}

/// Built-in rules for PLCopen XML projects.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlcOpenRules;

impl RuleEngine for PlcOpenRules {
    fn run(&self, source: &Path, base_namespace: &str) -> Result<QuadStore> {
        let document = PlcOpenDocument::from_file(source)
            .map_err(|e| Error::MappingEngine(format!("cannot map {}: {e}", source.display())))?;
        let store = map_document(&document, base_namespace);
        info!(quads = store.len(), source = %source.display(), "rule engine finished");
        Ok(store)
    }
}

/// Apply the rules to an already parsed document.
pub fn map_document(document: &PlcOpenDocument, base_namespace: &str) -> QuadStore {
    let mut store = QuadStore::new();
    for skill in document.skills() {
        debug!(skill = %skill.instance_name, program = %skill.program, "mapping skill");
        map_skill(&mut store, &skill, base_namespace);
    }
    store
}

fn map_skill(store: &mut QuadStore, skill: &Skill, ns: &str) {
    let name = &skill.local_name;
    let skill_iri = Iri::new(format!("{ns}{name}"));

    store.add(Quad::new(skill_iri.clone(), RDF_TYPE, Term::iri(CSS_SKILL)));
    store.add(Quad::new(skill_iri.clone(), OPCUA_NODE_ID, Literal::string(placeholder(&skill.node_path()))));
    store.add(Quad::new(skill_iri.clone(), CSS_HAS_STATE_MACHINE, Term::iri(format!("{ns}{name}_StateMachine"))));

    let capability = Iri::new(format!("{ns}{name}_Capability"));
    store.add(Quad::new(capability.clone(), RDF_TYPE, Term::iri(CSS_CAPABILITY)));
    store.add(Quad::new(capability, CSS_IS_REALIZED_BY, skill_iri.clone()));

    for input in &skill.inputs {
        map_variable(store, skill, &skill_iri, input, ns, CSS_SKILL_PARAMETER, CSS_HAS_SKILL_PARAMETER);
    }
    for output in &skill.outputs {
        map_variable(store, skill, &skill_iri, output, ns, CSS_SKILL_OUTPUT, CSS_HAS_SKILL_OUTPUT);
    }
}

fn map_variable(
    store: &mut QuadStore,
    skill: &Skill,
    skill_iri: &Iri,
    variable: &Variable,
    ns: &str,
    class: &str,
    link: &str,
) {
    let iri = Iri::new(format!("{ns}{}_{}", skill.local_name, variable.name));
    let path = format!("{}{PATH_SEPARATOR}{}", skill.node_path(), variable.name);

    store.add(Quad::new(skill_iri.clone(), link, iri.clone()));
    store.add(Quad::new(iri.clone(), RDF_TYPE, Term::iri(class)));
    store.add(Quad::new(iri.clone(), CSS_HAS_NAME, Literal::string(variable.name.as_str())));
    store.add(Quad::new(iri.clone(), CSS_HAS_DATA_TYPE, Literal::string(variable.type_name.as_str())));
    store.add(Quad::new(iri, OPCUA_NODE_ID, Literal::string(placeholder(&path))));
}
