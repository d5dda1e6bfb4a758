//! `plc2skill` - Maps a PLCopen XML project to a skill model in Turtle.
//!
//! **Usage:**
//! ```text
//! plc2skill -f project.xml -e opc.tcp://plc:4840 [-u user --password pw]
//!           [-n <node id root>] [--resource-iri <iri>] [--base-iri <iri>]
//!           [--config mapping.json] [--address-space snapshot.json]
//!           [--template machine.ttl] [--output MappingOutput.ttl]
//! ```
//!
//! Without `--address-space` no server is reachable: node ids stay as
//! placeholders unless `-n` supplies the root identifier.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use plc2skill::opcua::UaConnector;
use plc2skill::{
    execute_mapping, AddressSpaceSnapshot, MappingConfig, MemoryConnector, PlcOpenRules,
    StateMachineTemplate, UnreachableConnector,
};

/// Map a PLCopen XML project to a skill model.
#[derive(Parser)]
#[command(name = "plc2skill", version, about = "Map PLCopen XML programs to semantic skill models")]
struct Args {
    /// PLCopen XML file to map.
    #[arg(short = 'f', long = "filename")]
    filename: PathBuf,

    /// OPC UA endpoint URL of the PLC.
    #[arg(short = 'e', long = "endpoint-url")]
    endpoint_url: String,

    /// OPC UA user name.
    #[arg(short = 'u', long)]
    user: Option<String>,

    /// OPC UA password.
    #[arg(long, requires = "user")]
    password: Option<String>,

    /// Node id prefix replacing the placeholder marker; skips live resolution.
    #[arg(short = 'n', long = "node-id-root")]
    node_id_root: Option<String>,

    /// IRI of the resource providing the skills.
    #[arg(long)]
    resource_iri: Option<String>,

    /// Base IRI for minted individuals.
    #[arg(long)]
    base_iri: Option<String>,

    /// JSON mapping configuration; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Recorded address space to resolve against instead of a live server.
    #[arg(long)]
    address_space: Option<PathBuf>,

    /// State-machine template replacing the bundled one.
    #[arg(long)]
    template: Option<PathBuf>,

    /// Output file.
    #[arg(long, default_value = "MappingOutput.ttl")]
    output: PathBuf,
}

impl Args {
    fn mapping_config(&self) -> Result<MappingConfig> {
        let mut config = match &self.config {
            Some(path) => MappingConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => MappingConfig::default(),
        };
        config.endpoint_url = self.endpoint_url.clone();
        if let Some(base) = &self.base_iri {
            config = config.with_base_iri(base);
        }
        if let Some(resource) = &self.resource_iri {
            config = config.with_resource_iri(resource);
        }
        if let Some(root) = &self.node_id_root {
            config = config.with_node_id_root(root);
        }
        if let Some(user) = &self.user {
            config = config.with_credentials(user, self.password.clone().unwrap_or_default());
        }
        config.validate()?;
        Ok(config)
    }

    fn connector(&self) -> Result<Box<dyn UaConnector>> {
        match &self.address_space {
            Some(path) => {
                let snapshot = AddressSpaceSnapshot::from_json_file(path)
                    .with_context(|| format!("Failed to load address space {}", path.display()))?;
                Ok(Box::new(MemoryConnector::from_snapshot(self.endpoint_url.clone(), snapshot)))
            }
            None => Ok(Box::new(UnreachableConnector)),
        }
    }

    fn template(&self) -> Result<StateMachineTemplate> {
        match &self.template {
            Some(path) => StateMachineTemplate::from_file(path)
                .with_context(|| format!("Failed to load template {}", path.display())),
            None => Ok(StateMachineTemplate::builtin()),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.mapping_config()?;
    let connector = args.connector()?;
    let template = args.template()?;

    let output = execute_mapping(&args.filename, &config, &PlcOpenRules, connector.as_ref(), &template)
        .await
        .with_context(|| format!("Failed to map {}", args.filename.display()))?;

    for warning in &output.warnings {
        warn!("{warning}");
    }

    fs::write(&args.output, &output.document)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!(
        output = %args.output.display(),
        resolved = output.resolved,
        warnings = output.warnings.len(),
        "written"
    );
    Ok(())
}
