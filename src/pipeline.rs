//! # Mapping Pipeline
//!
//! Strictly sequential stages, each consuming the previous stage's store:
//!
//! ```text
//! 1. rule engine          source ──> QuadStore               (fatal on failure)
//! 2. resource identity    + resource providesSkill/Capability
//! 3. OPC UA               connect ─ explore ─ resolve placeholders ─ endpoint facts
//!                         (connection failure: placeholders stay, warning recorded)
//!                         (root override: no connection, marker replaced in text)
//! 4. state machines       one template block per skill instance
//! 5. assemble             turtle(store) + "\n\n" + blocks
//! ```
//!
//! Only stage 1 can fail the run. Everything later degrades the output and
//! is reported in [`MappingOutput::warnings`].

use std::path::Path;

use tracing::{info, warn};

use crate::config::MappingConfig;
use crate::engine::RuleEngine;
use crate::fixup;
use crate::model::Iri;
use crate::opcua::{explore, NodeIdResolver, UaConnector, UserTokenType};
use crate::plcopen::PlcOpenDocument;
use crate::store::{turtle, QuadStore};
use crate::template::StateMachineTemplate;
use crate::{Error, Result};

/// Local name of the resource when the document names no configuration.
pub const FALLBACK_RESOURCE_NAME: &str = "Resource";
/// Local name minted for the server individual.
pub const SERVER_NAME: &str = "OpcUaServer";

/// Result of a mapping run.
#[derive(Debug)]
pub struct MappingOutput {
    /// Turtle document: fixed-up store followed by the state machines.
    pub document: String,
    /// Non-fatal diagnostics, in the order they occurred.
    pub warnings: Vec<Error>,
    /// Placeholders replaced by live node ids.
    pub resolved: usize,
}

// ============================================================================
// Mapper handle
// ============================================================================

/// Owns the collaborators of a mapping run.
pub struct Mapper<E: RuleEngine, C: UaConnector> {
    engine: E,
    connector: C,
    template: StateMachineTemplate,
}

impl<E: RuleEngine, C: UaConnector> Mapper<E, C> {
    /// Mapper with the bundled state-machine template.
    pub fn new(engine: E, connector: C) -> Self {
        Self { engine, connector, template: StateMachineTemplate::builtin() }
    }

    pub fn with_template(mut self, template: StateMachineTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Map `source` to a skill document.
    pub async fn execute(&self, source: &Path, config: &MappingConfig) -> Result<MappingOutput> {
        execute_mapping(source, config, &self.engine, &self.connector, &self.template).await
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Run all stages.
///
/// The config is taken as given; `MappingConfig::validate` belongs to
/// whoever builds it, so only stage 1 can return an error here.
pub async fn execute_mapping(
    source: &Path,
    config: &MappingConfig,
    engine: &dyn RuleEngine,
    connector: &dyn UaConnector,
    template: &StateMachineTemplate,
) -> Result<MappingOutput> {
    let namespace = config.base_namespace();
    let mut warnings = Vec::new();

    // 1
    let store = run_engine(engine, source, &namespace)?;

    let document = match PlcOpenDocument::from_file(source) {
        Ok(document) => document,
        Err(e) => {
            warn!(error = %e, "source document unreadable after mapping, skipping structural stages");
            warnings.push(e);
            PlcOpenDocument::default()
        }
    };

    // 2
    let resource = resource_iri(config, &document).unwrap_or_else(|| {
        warn!("document names no configuration, using fallback resource name");
        Iri::new(config.mint(FALLBACK_RESOURCE_NAME))
    });
    let delta = fixup::resource_identity(&store, &resource);
    info!(resource = %resource, added = delta.additions.len(), "resource identity fixed up");
    let store = store.with_delta(delta);

    // 3
    let opcua = opcua_stage(store, &resource, config, connector).await;
    warnings.extend(opcua.warnings);

    // 4
    let machines = state_machines(&document, template, &namespace);

    // 5
    let mut serialized = turtle::to_turtle(&opcua.store);
    if let Some(root) = config.effective_node_id_root() {
        serialized = fixup::substitute_marker(&serialized, root);
    }
    let document = assemble(&serialized, &machines);

    info!(
        bytes = document.len(),
        resolved = opcua.resolved,
        warnings = warnings.len(),
        "mapping finished"
    );
    Ok(MappingOutput { document, warnings, resolved: opcua.resolved })
}

/// Stage 1. Every failure becomes `Error::MappingEngine`.
pub fn run_engine(engine: &dyn RuleEngine, source: &Path, namespace: &str) -> Result<QuadStore> {
    let store = engine.run(source, namespace).map_err(|e| match e {
        Error::MappingEngine(_) => e,
        other => Error::MappingEngine(other.to_string()),
    })?;
    info!(quads = store.len(), "rule engine stage done");
    Ok(store)
}

/// Explicit resource IRI, else `{namespace}{configuration name}`.
pub fn resource_iri(config: &MappingConfig, document: &PlcOpenDocument) -> Option<Iri> {
    if let Some(explicit) = config.resource_iri.as_deref().filter(|r| !r.trim().is_empty()) {
        return Some(Iri::new(explicit.trim()));
    }
    document
        .configuration_name()
        .filter(|n| !n.trim().is_empty())
        .map(|n| Iri::new(config.mint(n.trim())))
}

/// Output of stage 3.
#[derive(Debug)]
pub struct OpcUaStage {
    pub store: QuadStore,
    pub warnings: Vec<Error>,
    pub resolved: usize,
}

/// Stage 3: resolve placeholders against the live server and assert its
/// endpoint facts. Never fails.
pub async fn opcua_stage(
    store: QuadStore,
    resource: &Iri,
    config: &MappingConfig,
    connector: &dyn UaConnector,
) -> OpcUaStage {
    let server = Iri::new(config.mint(SERVER_NAME));

    if let Some(root) = config.effective_node_id_root() {
        info!(root, "root identifier given, skipping live resolution");
        let delta = fixup::server_facts(&store, resource, &server, &config.endpoint_url);
        return OpcUaStage { store: store.with_delta(delta), warnings: Vec::new(), resolved: 0 };
    }

    let credentials = config.effective_credentials();
    let session = match connector.connect(&config.endpoint_url, credentials).await {
        Ok(session) => session,
        Err(e) => {
            warn!(endpoint = %config.endpoint_url, error = %e, "connection failed, node ids stay unresolved");
            return OpcUaStage { store, warnings: vec![e], resolved: 0 };
        }
    };

    let exploration = explore(session.as_ref(), config.root_node.clone(), &config.browse).await;
    let mut warnings = exploration.failures;

    let resolver = NodeIdResolver::new(&exploration.space);
    let node_ids = fixup::resolve_node_ids(&store, &resolver);
    warnings.extend(node_ids.failures);

    let token = if credentials.is_some() { UserTokenType::UserName } else { UserTokenType::Anonymous };
    let store = store.with_delta(node_ids.delta);
    let delta = fixup::endpoint_facts(&store, resource, &server, session.endpoint(), token);
    let store = store.with_delta(delta);

    info!(resolved = node_ids.resolved, unresolved = warnings.len(), "OPC UA stage done");
    OpcUaStage { store, warnings, resolved: node_ids.resolved }
}

/// Stage 4: one rendered block per skill instance, in document order.
pub fn state_machines(document: &PlcOpenDocument, template: &StateMachineTemplate, namespace: &str) -> String {
    let skills = document.skills();
    info!(skills = skills.len(), "generating state machines");
    template.render_all(skills.iter().map(|s| s.local_name.as_str()), namespace)
}

/// Stage 5: serialized store, blank line, state machines.
pub fn assemble(serialized_store: &str, state_machines: &str) -> String {
    let mut out = serialized_store.trim_end().to_string();
    if !state_machines.is_empty() {
        out.push_str("\n\n");
        out.push_str(state_machines);
    }
    out.push('\n');
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::engine::PlcOpenRules;
    use crate::opcua::{MemoryConnector, UaNodeId, UnreachableConnector};

    const ENDPOINT: &str = "opc.tcp://plc:4840";

    const PROJECT: &str = r#"<project xmlns="http://www.plcopen.org/xml/tc6_0200">
  <types><pous>
    <pou name="DoseSkill" pouType="functionBlock">
      <interface>
        <inputVars><variable name="Amount"><type><REAL /></type></variable></inputVars>
        <addData><data name="inheritance"><Inheritance><Extends>TJ.Skill</Extends></Inheritance></data></addData>
      </interface>
    </pou>
    <pou name="MAIN" pouType="program">
      <interface>
        <localVars><variable name="Dose"><type><derived name="DoseSkill" /></type></variable></localVars>
      </interface>
    </pou>
  </pous></types>
  <instances><configurations><configuration name="Line1" /></configurations></instances>
</project>"#;

    fn fixture(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("plc2skill-pipeline-{name}-{}.xml", std::process::id()));
        std::fs::write(&path, PROJECT).unwrap();
        path
    }

    fn plc() -> MemoryConnector {
        let c = MemoryConnector::new(ENDPOINT);
        let app = UaNodeId::string(4, "App");
        let main = UaNodeId::string(4, "App.MAIN");
        let dose = UaNodeId::string(4, "App.MAIN.Dose");
        c.add_object(&UaNodeId::objects_folder(), app.clone(), "Application");
        c.add_object(&app, main.clone(), "MAIN");
        c.add_object(&main, dose.clone(), "Dose");
        c.add_variable(&dose, UaNodeId::string(4, "App.MAIN.Dose.Amount"), "Amount");
        c
    }

    fn config() -> MappingConfig {
        MappingConfig::new(ENDPOINT).with_base_iri("http://ex.org/plant")
    }

    #[tokio::test]
    async fn test_resource_named_after_configuration() {
        let source = fixture("resource");
        let mapper = Mapper::new(PlcOpenRules, plc());
        let output = mapper.execute(&source, &config()).await.unwrap();

        assert!(output.document.contains("<http://ex.org/plant#Line1> a CSS:Resource"));
        assert!(output.document.contains("CSS:providesSkill <http://ex.org/plant#Dose>"));
    }

    #[tokio::test]
    async fn test_explicit_resource_wins() {
        let source = fixture("explicit");
        let mapper = Mapper::new(PlcOpenRules, plc());
        let config = config().with_resource_iri("http://ex.org/other#Cell");
        let output = mapper.execute(&source, &config).await.unwrap();

        assert!(output.document.contains("<http://ex.org/other#Cell> a CSS:Resource"));
        assert!(!output.document.contains("plant#Line1>"));
    }

    #[tokio::test]
    async fn test_one_state_machine_per_skill() {
        let source = fixture("machines");
        let mapper = Mapper::new(PlcOpenRules, plc());
        let output = mapper.execute(&source, &config()).await.unwrap();

        assert_eq!(output.document.matches("a ISA88:ISA88-StateMachine").count(), 1);
        assert!(output.document.contains("<http://ex.org/plant#Dose_StateMachine> a ISA88:ISA88-StateMachine"));
    }

    #[tokio::test]
    async fn test_live_resolution() {
        let source = fixture("live");
        let mapper = Mapper::new(PlcOpenRules, plc());
        let output = mapper.execute(&source, &config()).await.unwrap();

        assert_eq!(output.resolved, 2);
        assert!(output.warnings.is_empty(), "{:?}", output.warnings);
        assert!(output.document.contains("OpcUa:nodeId \"ns=4;s=App.MAIN.Dose\""));
        assert!(output.document.contains("OpcUa:hasEndpointUrl \"opc.tcp://plc:4840\""));
        assert!(!output.document.contains("PLCIdentifier"));
    }

    #[tokio::test]
    async fn test_connection_failure_degrades() {
        let source = fixture("offline");
        let mapper = Mapper::new(PlcOpenRules, UnreachableConnector);
        let output = mapper.execute(&source, &config()).await.unwrap();

        assert_eq!(output.resolved, 0);
        assert_eq!(output.warnings.len(), 1);
        assert!(matches!(output.warnings[0], Error::Connection(_)));
        assert!(output.document.contains("OpcUa:nodeId \"PLCIdentifier.MAIN.Dose\""));
        assert!(output.document.contains("<http://ex.org/plant#Line1> a CSS:Resource"));
        assert!(output.document.contains("Dose_StateMachine"));
        assert!(!output.document.contains("OpcUa:UAServer"));
    }

    #[tokio::test]
    async fn test_root_override_skips_connection() {
        let source = fixture("override");
        let connector = plc();
        let mapper = Mapper::new(PlcOpenRules, connector);
        let config = config().with_node_id_root("ns=4;s=|var|PLC.Application");
        let output = mapper.execute(&source, &config).await.unwrap();

        assert_eq!(mapper.connector().browse_calls(), 0);
        assert!(output.warnings.is_empty());
        assert!(output.document.contains("OpcUa:nodeId \"ns=4;s=|var|PLC.Application.MAIN.Dose\""));
        assert!(output.document.contains("OpcUa:hasEndpointUrl \"opc.tcp://plc:4840\""));
        assert!(!output.document.contains("OpcUa:hasMessageSecurityMode"));
    }

    #[tokio::test]
    async fn test_missing_source_is_fatal() {
        let mapper = Mapper::new(PlcOpenRules, plc());
        let err = mapper.execute(Path::new("/nonexistent/plc.xml"), &config()).await.unwrap_err();
        assert!(matches!(err, Error::MappingEngine(_)));
    }

    #[tokio::test]
    async fn test_invalid_config_does_not_abort() {
        let source = fixture("lenient");
        let mapper = Mapper::new(PlcOpenRules, plc());
        let mut config = config().with_base_iri("  ");
        config.browse.concurrency = 0;
        assert!(config.validate().is_err());

        let output = mapper.execute(&source, &config).await.unwrap();
        assert!(output.warnings.is_empty(), "{:?}", output.warnings);
        assert_eq!(output.resolved, 2);
        assert!(output.document.contains("<http://www.hsu-ifa.de/ontologies/plc2skill#Line1> a CSS:Resource"));
    }

    #[test]
    fn test_assemble_separates_with_blank_line() {
        assert_eq!(assemble("a .\n", "b ."), "a .\n\nb .\n");
        assert_eq!(assemble("a .\n", ""), "a .\n");
    }
}
