//! End-to-end tests for the mapping pipeline.
//!
//! Each test writes a PLCopen fixture to the temp directory and drives
//! `Mapper` with `PlcOpenRules` against a `MemoryConnector` (or an
//! unreachable server), then inspects the Turtle document.

use std::path::PathBuf;

use plc2skill::opcua::UaNodeId;
use plc2skill::{Error, MappingConfig, Mapper, MemoryConnector, PlcOpenRules, StateMachineTemplate, UnreachableConnector};
use pretty_assertions::assert_eq;

const ENDPOINT: &str = "opc.tcp://192.168.0.10:4840";

// ============================================================================
// Fixtures
// ============================================================================

/// Two skill types, one instance each, plus a non-skill function block.
const LINE1: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<project xmlns="http://www.plcopen.org/xml/tc6_0200">
  <fileHeader companyName="" productName="CODESYS" productVersion="3.5" creationDateTime="2024-01-01T00:00:00" />
  <contentHeader name="Line1"><coordinateInfo /></contentHeader>
  <types><dataTypes /><pous /></types>
  <instances>
    <configurations>
      <configuration name="Line1">
        <resource name="Application">
          <addData>
            <data name="http://www.3s-software.com/plcopenxml/application" handleUnknown="implementation">
              <pou name="DoseSkill" pouType="functionBlock">
                <interface>
                  <inputVars>
                    <variable name="Amount"><type><REAL /></type></variable>
                  </inputVars>
                  <outputVars>
                    <variable name="Dosed"><type><REAL /></type></variable>
                  </outputVars>
                  <addData>
                    <data name="http://www.3s-software.com/plcopenxml/pouinheritance" handleUnknown="implementation">
                      <Inheritance><Extends>TJ.Skill</Extends></Inheritance>
                    </data>
                  </addData>
                </interface>
              </pou>
              <pou name="MixSkill" pouType="functionBlock">
                <interface>
                  <inputVars>
                    <variable name="Speed"><type><INT /></type></variable>
                  </inputVars>
                  <addData>
                    <data name="http://www.3s-software.com/plcopenxml/pouinheritance" handleUnknown="implementation">
                      <Inheritance><Extends>TJ.Skill</Extends></Inheritance>
                    </data>
                  </addData>
                </interface>
              </pou>
              <pou name="Motor" pouType="functionBlock">
                <interface>
                  <inputVars>
                    <variable name="Start"><type><BOOL /></type></variable>
                  </inputVars>
                </interface>
              </pou>
              <pou name="PLC_PRG" pouType="program">
                <interface>
                  <localVars>
                    <variable name="Dose"><type><derived name="DoseSkill" /></type></variable>
                    <variable name="Mix"><type><derived name="MixSkill" /></type></variable>
                    <variable name="Agitator"><type><derived name="Motor" /></type></variable>
                  </localVars>
                </interface>
              </pou>
            </data>
          </addData>
        </resource>
      </configuration>
    </configurations>
  </instances>
</project>"#;

fn write_fixture(name: &str, xml: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("plc2skill-e2e-{name}-{}.xml", std::process::id()));
    std::fs::write(&path, xml).unwrap();
    path
}

/// CODESYS-like address space for `LINE1`.
fn codesys_server() -> MemoryConnector {
    let c = MemoryConnector::new(ENDPOINT);
    let id = |s: &str| UaNodeId::string(4, format!("|var|CODESYS Control.{s}"));

    let device = UaNodeId::numeric(2, 5001);
    c.add_object(&UaNodeId::objects_folder(), device.clone(), "DeviceSet");
    c.add_object(&device, id("Application"), "Application");
    c.add_object(&id("Application"), id("Application.PLC_PRG"), "PLC_PRG");
    for (instance, vars) in [("Dose", &["Amount", "Dosed"][..]), ("Mix", &["Speed"][..]), ("Agitator", &["Start"][..])] {
        let inst = id(&format!("Application.PLC_PRG.{instance}"));
        c.add_object(&id("Application.PLC_PRG"), inst.clone(), instance);
        for var in vars {
            c.add_variable(&inst, id(&format!("Application.PLC_PRG.{instance}.{var}")), var);
        }
    }
    c
}

fn config() -> MappingConfig {
    MappingConfig::new(ENDPOINT).with_base_iri("http://www.hsu-ifa.de/ontologies/plc2skill")
}

// ============================================================================
// 1. Resource identity from the configuration name
// ============================================================================

#[tokio::test]
async fn test_resource_identity_from_configuration() {
    let source = write_fixture("resource", LINE1);
    let mapper = Mapper::new(PlcOpenRules, codesys_server());
    let output = mapper.execute(&source, &config()).await.unwrap();

    let resource = "<http://www.hsu-ifa.de/ontologies/plc2skill#Line1> a CSS:Resource ;";
    assert!(output.document.contains(resource), "{}", output.document);
    assert!(output.document.contains("CSS:providesSkill <http://www.hsu-ifa.de/ontologies/plc2skill#Dose>"));
    assert!(output.document.contains("CSS:providesSkill <http://www.hsu-ifa.de/ontologies/plc2skill#Mix>"));
    assert!(output.document.contains(
        "CSS:providesCapability <http://www.hsu-ifa.de/ontologies/plc2skill#Dose_Capability>"
    ));
}

// ============================================================================
// 2. One state machine per skill instance
// ============================================================================

#[tokio::test]
async fn test_state_machine_per_skill() {
    let source = write_fixture("machines", LINE1);
    let mapper = Mapper::new(PlcOpenRules, codesys_server());
    let output = mapper.execute(&source, &config()).await.unwrap();

    assert_eq!(output.document.matches("a ISA88:ISA88-StateMachine").count(), 2);
    assert!(output.document.contains("plc2skill#Dose_StateMachine> a ISA88:ISA88-StateMachine"));
    assert!(output.document.contains("plc2skill#Mix_StateMachine> a ISA88:ISA88-StateMachine"));
    assert!(!output.document.contains("Agitator_StateMachine"));
    assert!(!output.document.contains("${SkillName}"));
}

#[tokio::test]
async fn test_custom_template() {
    let source = write_fixture("template", LINE1);
    let template = StateMachineTemplate::from_text("<${BaseIri}${SkillName}_SM> a <urn:Machine> .\n");
    let mapper = Mapper::new(PlcOpenRules, codesys_server()).with_template(template);
    let output = mapper.execute(&source, &config()).await.unwrap();

    let tail = "\n\n<http://www.hsu-ifa.de/ontologies/plc2skill#Dose_SM> a <urn:Machine> .\n\n\
                <http://www.hsu-ifa.de/ontologies/plc2skill#Mix_SM> a <urn:Machine> .\n";
    assert!(output.document.ends_with(tail), "{}", output.document);
}

// ============================================================================
// 3. Live resolution
// ============================================================================

#[tokio::test]
async fn test_all_placeholders_resolved() {
    let source = write_fixture("live", LINE1);
    let mapper = Mapper::new(PlcOpenRules, codesys_server());
    let output = mapper.execute(&source, &config()).await.unwrap();

    // Dose, Dose.Amount, Dose.Dosed, Mix, Mix.Speed
    assert_eq!(output.resolved, 5);
    assert!(output.warnings.is_empty(), "{:?}", output.warnings);
    assert!(!output.document.contains("PLCIdentifier"));
    assert!(output.document.contains(
        "OpcUa:nodeId \"ns=4;s=|var|CODESYS Control.Application.PLC_PRG.Dose.Amount\""
    ));
    assert!(output.document.contains("OpcUa:hasMessageSecurityMode \"None\""));
    assert!(output.document.contains("OpcUa:hasUserTokenType \"Anonymous\""));
}

#[tokio::test]
async fn test_credentials_select_user_name_token() {
    let source = write_fixture("credentials", LINE1);
    let mapper = Mapper::new(PlcOpenRules, codesys_server());
    let config = config().with_credentials("operator", "secret");
    let output = mapper.execute(&source, &config).await.unwrap();

    assert!(output.document.contains("OpcUa:hasUserTokenType \"UserName\""));
}

#[tokio::test]
async fn test_failed_branch_leaves_its_placeholders() {
    let source = write_fixture("branch", LINE1);
    let server = codesys_server();
    server.fail_browse(&UaNodeId::string(4, "|var|CODESYS Control.Application.PLC_PRG.Mix"));
    let mapper = Mapper::new(PlcOpenRules, server);
    let output = mapper.execute(&source, &config()).await.unwrap();

    // Mix itself is found (its parent was browsed); Mix.Speed is not.
    assert_eq!(output.resolved, 4);
    let browse_failures = output.warnings.iter().filter(|w| matches!(w, Error::Browse { .. })).count();
    let unresolved = output.warnings.iter().filter(|w| matches!(w, Error::UnresolvedIdentifier { .. })).count();
    assert_eq!((browse_failures, unresolved), (1, 1));
    assert!(output.document.contains("OpcUa:nodeId \"PLCIdentifier.PLC_PRG.Mix.Speed\""));
}

#[tokio::test]
async fn test_ambiguous_path_is_a_warning_and_keeps_placeholder() {
    let source = write_fixture("ambiguous", LINE1);
    let server = codesys_server();
    // A second application with its own PLC_PRG.Mix.Speed.
    let other = |s: &str| UaNodeId::string(4, format!("|var|Other.{s}"));
    server.add_object(&UaNodeId::objects_folder(), other("Application"), "Application2");
    server.add_object(&other("Application"), other("Application.PLC_PRG"), "PLC_PRG");
    server.add_object(&other("Application.PLC_PRG"), other("Application.PLC_PRG.Mix"), "Mix");
    server.add_variable(&other("Application.PLC_PRG.Mix"), other("Application.PLC_PRG.Mix.Speed"), "Speed");

    let mapper = Mapper::new(PlcOpenRules, server);
    let output = mapper.execute(&source, &config()).await.unwrap();

    // Dose, Dose.Amount, Dose.Dosed resolve; Mix and Mix.Speed do not.
    assert_eq!(output.resolved, 3);
    let ambiguous: Vec<&str> = output
        .warnings
        .iter()
        .filter_map(|w| match w {
            Error::AmbiguousIdentifier { path, candidates: 2 } => Some(path.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(ambiguous, vec!["PLCIdentifier.PLC_PRG.Mix", "PLCIdentifier.PLC_PRG.Mix.Speed"]);
    assert_eq!(output.warnings.len(), 2);
    assert!(output.document.contains("OpcUa:nodeId \"PLCIdentifier.PLC_PRG.Mix.Speed\""));
    assert!(!output.document.contains("|var|Other."));
}

// ============================================================================
// 4. Degraded runs
// ============================================================================

#[tokio::test]
async fn test_unreachable_server_keeps_placeholders() {
    let source = write_fixture("offline", LINE1);
    let mapper = Mapper::new(PlcOpenRules, UnreachableConnector);
    let output = mapper.execute(&source, &config()).await.unwrap();

    assert_eq!(output.resolved, 0);
    assert_eq!(output.warnings.len(), 1);
    assert!(matches!(output.warnings[0], Error::Connection(_)));
    assert!(output.document.contains("OpcUa:nodeId \"PLCIdentifier.PLC_PRG.Dose\""));
    assert!(output.document.contains("plc2skill#Line1> a CSS:Resource"));
    assert_eq!(output.document.matches("a ISA88:ISA88-StateMachine").count(), 2);
}

#[tokio::test]
async fn test_wrong_endpoint_is_a_connection_warning() {
    let source = write_fixture("wrong-endpoint", LINE1);
    let mapper = Mapper::new(PlcOpenRules, codesys_server());
    let output = mapper.execute(&source, &MappingConfig::new("opc.tcp://elsewhere:4840")).await.unwrap();

    assert!(matches!(output.warnings.as_slice(), [Error::Connection(_)]));
    assert_eq!(mapper.connector().browse_calls(), 0);
}

#[tokio::test]
async fn test_node_id_root_override() {
    let source = write_fixture("override", LINE1);
    let mapper = Mapper::new(PlcOpenRules, codesys_server());
    let config = config().with_node_id_root("ns=4;s=|var|CODESYS Control.Application");
    let output = mapper.execute(&source, &config).await.unwrap();

    assert_eq!(mapper.connector().browse_calls(), 0);
    assert!(output.warnings.is_empty());
    assert!(output.document.contains(
        "OpcUa:nodeId \"ns=4;s=|var|CODESYS Control.Application.PLC_PRG.Dose\""
    ));
    assert!(output.document.contains("OpcUa:hasEndpointUrl \"opc.tcp://192.168.0.10:4840\""));
}

#[tokio::test]
async fn test_malformed_document_is_fatal() {
    let source = write_fixture("malformed", "<project><instances>");
    let mapper = Mapper::new(PlcOpenRules, codesys_server());
    let err = mapper.execute(&source, &config()).await.unwrap_err();

    assert!(matches!(err, Error::MappingEngine(_)));
    assert!(err.is_fatal());
}

// ============================================================================
// 5. Output shape
// ============================================================================

#[tokio::test]
async fn test_same_instance_name_in_two_programs() {
    let prg2 = r#"</pou>
              <pou name="PRG2" pouType="program">
                <interface>
                  <localVars>
                    <variable name="Dose"><type><derived name="DoseSkill" /></type></variable>
                  </localVars>
                </interface>
              </pou>
            </data>"#;
    let source = write_fixture("two-programs", &LINE1.replacen("</pou>\n            </data>", prg2, 1));
    let mapper = Mapper::new(PlcOpenRules, UnreachableConnector);
    let output = mapper.execute(&source, &config()).await.unwrap();

    assert_eq!(output.document.matches("a CSS:Skill ;").count(), 3);
    assert!(output.document.contains("<http://www.hsu-ifa.de/ontologies/plc2skill#PLC_PRG_Dose> a CSS:Skill ;"));
    assert!(output.document.contains("<http://www.hsu-ifa.de/ontologies/plc2skill#PRG2_Dose> a CSS:Skill ;"));
    assert!(output.document.contains("<http://www.hsu-ifa.de/ontologies/plc2skill#Mix> a CSS:Skill ;"));
    assert!(output.document.contains("<http://www.hsu-ifa.de/ontologies/plc2skill#PRG2_Dose_Amount>"));

    assert_eq!(output.document.matches("a ISA88:ISA88-StateMachine").count(), 3);
    assert!(output.document.contains("plc2skill#PLC_PRG_Dose_StateMachine> a ISA88:ISA88-StateMachine"));
    assert!(output.document.contains("plc2skill#PRG2_Dose_StateMachine> a ISA88:ISA88-StateMachine"));
    assert!(!output.document.contains("plc2skill#Dose_StateMachine>"));
}

#[tokio::test]
async fn test_configuration_name_with_space_is_valid_iriref() {
    let source = write_fixture(
        "spaced-name",
        &LINE1.replace(r#"<configuration name="Line1">"#, r#"<configuration name="Line 1">"#),
    );
    let mapper = Mapper::new(PlcOpenRules, UnreachableConnector);
    let output = mapper.execute(&source, &config()).await.unwrap();

    assert!(output.document.contains("<http://www.hsu-ifa.de/ontologies/plc2skill#Line%201> a CSS:Resource ;"));
    assert!(!output.document.contains("#Line 1>"));
}

#[tokio::test]
async fn test_document_is_deterministic() {
    let source = write_fixture("deterministic", LINE1);
    let mapper = Mapper::new(PlcOpenRules, codesys_server());
    let first = mapper.execute(&source, &config()).await.unwrap();
    let second = mapper.execute(&source, &config()).await.unwrap();

    assert_eq!(first.document, second.document);
    assert!(first.document.starts_with("@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .\n"));
}
