//! # PLCopen XML Reader
//!
//! Structural reading of a PLCopen (IEC 61131-10) project: the configuration
//! name, every program organization unit (POU) with its interface, and the
//! skill instances derived from them.
//!
//! Element names are matched by local name, so documents with or without the
//! `http://www.plcopen.org/xml/tc6_0200` default namespace read the same.
//!
//! A skill is a POU whose interface declares
//! `addData/data/Inheritance/Extends = TJ.Skill`; a skill *instance* is a
//! local variable of another POU whose derived type is that skill POU:
//!
//! ```text
//! pou "MAIN"                         pou "DoseSkill"  (Extends TJ.Skill)
//!   localVars                          inputVars   Amount : REAL
//!     Dose : derived "DoseSkill"  ──>  outputVars  Done   : BOOL
//! ```

use std::path::Path;

use hashbrown::HashMap;
use roxmltree::Node;

use crate::{Error, Result};

/// Supertype a POU extends to be recognized as a skill.
pub const SKILL_SUPERTYPE: &str = "TJ.Skill";

// ============================================================================
// Document model
// ============================================================================

/// A declared variable and its type name (elementary or derived).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub type_name: String,
}

/// One program organization unit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pou {
    pub name: String,
    pub extends: Option<String>,
    pub inputs: Vec<Variable>,
    pub outputs: Vec<Variable>,
    pub locals: Vec<Variable>,
}

impl Pou {
    pub fn is_skill(&self) -> bool {
        self.extends.as_deref() == Some(SKILL_SUPERTYPE)
    }
}

/// A skill instance: variable `instance_name` of skill type `type_name`,
/// declared in POU `program`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skill {
    pub type_name: String,
    pub instance_name: String,
    pub program: String,
    /// Local name of the minted individuals. The instance name, or
    /// `Program_Instance` when another program declares the same name.
    pub local_name: String,
    pub inputs: Vec<Variable>,
    pub outputs: Vec<Variable>,
}

impl Skill {
    /// Placeholder path of the instance, root to leaf: `Program.Instance`.
    pub fn node_path(&self) -> String {
        format!("{}.{}", self.program, self.instance_name)
    }
}

/// The parts of a PLCopen project the mapper reads.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlcOpenDocument {
    configuration_name: Option<String>,
    pous: Vec<Pou>,
}

impl PlcOpenDocument {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Document(format!("{}: {e}", path.display())))?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let doc = roxmltree::Document::parse(text).map_err(|e| Error::Document(e.to_string()))?;
        let root = doc.root_element();
        if root.tag_name().name() != "project" {
            return Err(Error::Document(format!(
                "expected <project> root element, found <{}>",
                root.tag_name().name()
            )));
        }

        let configuration_name = root
            .descendants()
            .find(|n| is(n, "configuration"))
            .and_then(|n| n.attribute("name"))
            .map(str::to_string);

        let pous = root.descendants().filter(|n| is(n, "pou")).map(read_pou).collect();

        Ok(Self { configuration_name, pous })
    }

    /// Name of the first `configuration` element.
    pub fn configuration_name(&self) -> Option<&str> {
        self.configuration_name.as_deref()
    }

    pub fn pous(&self) -> &[Pou] {
        &self.pous
    }

    pub fn pou(&self, name: &str) -> Option<&Pou> {
        self.pous.iter().find(|p| p.name == name)
    }

    /// Every skill instance in document order. The same instance declared
    /// twice (a POU listed in several places) is reported once.
    pub fn skills(&self) -> Vec<Skill> {
        let mut skills: Vec<Skill> = Vec::new();
        for program in &self.pous {
            for local in &program.locals {
                let Some(skill_type) = self.pou(&local.type_name).filter(|p| p.is_skill()) else {
                    continue;
                };
                if skills
                    .iter()
                    .any(|s| s.program == program.name && s.instance_name == local.name)
                {
                    continue;
                }
                skills.push(Skill {
                    type_name: skill_type.name.clone(),
                    instance_name: local.name.clone(),
                    program: program.name.clone(),
                    local_name: local.name.clone(),
                    inputs: skill_type.inputs.clone(),
                    outputs: skill_type.outputs.clone(),
                });
            }
        }
        qualify_colliding_names(&mut skills);
        skills
    }
}

/// Instance names shared by several programs get the program as prefix, so
/// each instance mints its own individuals.
fn qualify_colliding_names(skills: &mut [Skill]) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for skill in skills.iter() {
        *counts.entry(skill.instance_name.clone()).or_default() += 1;
    }
    for skill in skills.iter_mut() {
        if counts.get(&skill.instance_name).is_some_and(|&n| n > 1) {
            skill.local_name = format!("{}_{}", skill.program, skill.instance_name);
        }
    }
}

// ============================================================================
// Element helpers
// ============================================================================

fn is(node: &Node<'_, '_>, local_name: &str) -> bool {
    node.is_element() && node.tag_name().name() == local_name
}

fn child<'a, 'i>(node: Node<'a, 'i>, local_name: &str) -> Option<Node<'a, 'i>> {
    node.children().find(|n| is(n, local_name))
}

/// Follow a path of direct child elements.
fn path<'a, 'i>(node: Node<'a, 'i>, names: &[&str]) -> Option<Node<'a, 'i>> {
    names.iter().try_fold(node, |n, name| child(n, name))
}

fn read_pou(pou: Node<'_, '_>) -> Pou {
    let name = pou.attribute("name").unwrap_or_default().to_string();
    let Some(interface) = child(pou, "interface") else {
        return Pou { name, ..Pou::default() };
    };

    // addData may hold several data blocks; any one can carry the inheritance.
    let extends = child(interface, "addData").and_then(|add| {
        add.children()
            .filter(|n| is(n, "data"))
            .find_map(|data| path(data, &["Inheritance", "Extends"]))
            .and_then(|e| e.text())
            .map(|t| t.trim().to_string())
    });

    Pou {
        name,
        extends,
        inputs: read_vars(interface, "inputVars"),
        outputs: read_vars(interface, "outputVars"),
        locals: read_vars(interface, "localVars"),
    }
}

fn read_vars(interface: Node<'_, '_>, section: &str) -> Vec<Variable> {
    interface
        .children()
        .filter(|n| is(n, section))
        .flat_map(|s| s.children().filter(|n| is(n, "variable")))
        .filter_map(|v| {
            let name = v.attribute("name")?.to_string();
            Some(Variable { name, type_name: type_name(v) })
        })
        .collect()
}

/// `derived@name` for user types, otherwise the elementary type's tag.
fn type_name(variable: Node<'_, '_>) -> String {
    let Some(ty) = child(variable, "type").and_then(|t| t.children().find(|n| n.is_element())) else {
        return String::new();
    };
    if ty.tag_name().name() == "derived" {
        ty.attribute("name").unwrap_or_default().to_string()
    } else {
        ty.tag_name().name().to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================
