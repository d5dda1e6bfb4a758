//! Vocabulary IRIs used by the mapping rules and the fix-up passes.

pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
pub const CSS: &str = "http://www.w3id.org/hsu-aut/css#";
pub const OPCUA: &str = "http://www.w3id.org/hsu-aut/OpcUa#";

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

// Capability / skill model
pub const CSS_RESOURCE: &str = "http://www.w3id.org/hsu-aut/css#Resource";
pub const CSS_SKILL: &str = "http://www.w3id.org/hsu-aut/css#Skill";
pub const CSS_CAPABILITY: &str = "http://www.w3id.org/hsu-aut/css#Capability";
pub const CSS_SKILL_PARAMETER: &str = "http://www.w3id.org/hsu-aut/css#SkillParameter";
pub const CSS_SKILL_OUTPUT: &str = "http://www.w3id.org/hsu-aut/css#SkillOutput";
pub const CSS_PROVIDES_SKILL: &str = "http://www.w3id.org/hsu-aut/css#providesSkill";
pub const CSS_PROVIDES_CAPABILITY: &str = "http://www.w3id.org/hsu-aut/css#providesCapability";
pub const CSS_IS_REALIZED_BY: &str = "http://www.w3id.org/hsu-aut/css#isRealizedBy";
pub const CSS_HAS_SKILL_PARAMETER: &str = "http://www.w3id.org/hsu-aut/css#hasSkillParameter";
pub const CSS_HAS_SKILL_OUTPUT: &str = "http://www.w3id.org/hsu-aut/css#hasSkillOutput";
pub const CSS_HAS_STATE_MACHINE: &str = "http://www.w3id.org/hsu-aut/css#hasStateMachine";
pub const CSS_HAS_NAME: &str = "http://www.w3id.org/hsu-aut/css#hasName";
pub const CSS_HAS_DATA_TYPE: &str = "http://www.w3id.org/hsu-aut/css#hasDataType";

// OPC UA
pub const OPCUA_NODE_ID: &str = "http://www.w3id.org/hsu-aut/OpcUa#nodeId";
pub const OPCUA_SERVER: &str = "http://www.w3id.org/hsu-aut/OpcUa#UAServer";
pub const OPCUA_HAS_SERVER: &str = "http://www.w3id.org/hsu-aut/OpcUa#hasServer";
pub const OPCUA_ENDPOINT_URL: &str = "http://www.w3id.org/hsu-aut/OpcUa#hasEndpointUrl";
pub const OPCUA_SECURITY_MODE: &str = "http://www.w3id.org/hsu-aut/OpcUa#hasMessageSecurityMode";
pub const OPCUA_SECURITY_POLICY: &str = "http://www.w3id.org/hsu-aut/OpcUa#hasSecurityPolicy";
pub const OPCUA_USER_TOKEN_TYPE: &str = "http://www.w3id.org/hsu-aut/OpcUa#hasUserTokenType";

/// Prefixes declared and abbreviated by the Turtle serializer.
pub const PREFIXES: &[(&str, &str)] = &[
    ("rdf", RDF),
    ("xsd", XSD),
    ("CSS", CSS),
    ("OpcUa", OPCUA),
];
