//! CLI Tooling
//!
//! Command-line interface over the node store. Each command runs inside a
//! single store transaction, so a failure part way through leaves nothing
//! behind.

use crate::config::{ConfigLoader, PoolConfig};
use crate::device::DeviceRecord;
use crate::error::ApiError;
use crate::node::{NodeAddRequest, NodeInfoResponse, NodeRecord};
use crate::store::SledStore;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

/// Poolnode CLI - storage node records
#[derive(Parser)]
#[command(name = "poolnode")]
#[command(about = "Manage storage node records and their devices")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (layered over the global config)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Store directory (overrides configuration)
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,
}

impl Cli {
    /// Load configuration and apply command line overrides.
    pub fn resolve_config(&self) -> Result<PoolConfig, ApiError> {
        let mut config = match &self.config {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };
        if let Some(store) = &self.store {
            config.store.path = Some(store.clone());
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.logging.format = format.clone();
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Node commands (add, info, delete)
    Node {
        #[command(subcommand)]
        command: NodeCommands,
    },
    /// Device commands (add, remove)
    Device {
        #[command(subcommand)]
        command: DeviceCommands,
    },
}

#[derive(Subcommand)]
pub enum NodeCommands {
    /// Register a node in a cluster
    Add {
        /// Owning cluster id
        #[arg(long)]
        cluster: String,
        /// Node hostname (repeatable)
        #[arg(long = "hostname", required = true)]
        hostnames: Vec<String>,
        /// Failure domain
        #[arg(long, default_value = "1")]
        zone: i32,
    },
    /// Show a node and its devices
    Info {
        id: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Delete a node with no devices
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum DeviceCommands {
    /// Attach a new device to a node and register its capacity
    Add {
        /// Node to attach to
        #[arg(long)]
        node: String,
        /// Device path, e.g. /dev/sdb
        #[arg(long)]
        name: String,
        /// Capacity in bytes
        #[arg(long)]
        size: u64,
    },
    /// Detach a device and retire its capacity
    Remove { id: String },
}

/// CLI context holding the open store
pub struct CliContext {
    store: SledStore,
}

impl CliContext {
    /// Open the store named by the configuration, creating its directory if needed.
    pub fn new(config: &PoolConfig) -> Result<Self, ApiError> {
        let store_path = config.store.resolve_path()?;
        std::fs::create_dir_all(&store_path).map_err(|e| {
            ApiError::ConfigError(format!(
                "Failed to create store directory {}: {}",
                store_path.display(),
                e
            ))
        })?;
        let store = SledStore::open(&store_path)?;
        info!(path = %store_path.display(), "opened node store");
        Ok(Self { store })
    }

    pub fn with_store(store: SledStore) -> Self {
        Self { store }
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let output = match command {
            Commands::Node { command } => self.execute_node(command),
            Commands::Device { command } => self.execute_device(command),
        }?;
        self.store.flush()?;
        Ok(output)
    }

    fn execute_node(&self, command: &NodeCommands) -> Result<String, ApiError> {
        match command {
            NodeCommands::Add {
                cluster,
                hostnames,
                zone,
            } => {
                if cluster.trim().is_empty() {
                    return Err(ApiError::InvalidRequest(
                        "cluster id cannot be empty".to_string(),
                    ));
                }
                let node = NodeRecord::from_request(&NodeAddRequest {
                    cluster_id: cluster.clone(),
                    hostnames: hostnames.clone(),
                    zone: *zone,
                });
                self.store.transaction(|txn| node.save(txn))?;
                info!(node_id = %node.info.id, cluster_id = %cluster, "added node");
                Ok(node.info.id.clone())
            }
            NodeCommands::Info { id, format } => {
                let response = self
                    .store
                    .transaction(|txn| NodeRecord::load(txn, id)?.info_response(txn))?;
                match format.as_str() {
                    "json" => Ok(format_node_info_json(&response)),
                    "text" | _ => Ok(format_node_info_text(&response)),
                }
            }
            NodeCommands::Delete { id } => {
                self.store
                    .transaction(|txn| NodeRecord::load(txn, id)?.delete(txn))?;
                info!(node_id = %id, "deleted node");
                Ok(format!("Node {} deleted", id))
            }
        }
    }

    fn execute_device(&self, command: &DeviceCommands) -> Result<String, ApiError> {
        match command {
            DeviceCommands::Add { node, name, size } => {
                let device = DeviceRecord::new(name, node, *size);
                self.store.transaction(|txn| {
                    let mut record = NodeRecord::load(txn, node)?;
                    record.add_device(&device.info.id);
                    record.add_capacity(device.info.storage.total);
                    device.save(txn)?;
                    record.save(txn)
                })?;
                info!(device_id = %device.info.id, node_id = %node, size, "added device");
                Ok(device.info.id.clone())
            }
            DeviceCommands::Remove { id } => {
                self.store.transaction(|txn| {
                    let device = DeviceRecord::load(txn, id)?;
                    let mut record = NodeRecord::load(txn, &device.node_id)?;
                    record.remove_device(id);
                    record.remove_capacity(device.info.storage.total);
                    record.save(txn)?;
                    device.delete(txn)
                })?;
                info!(device_id = %id, "removed device");
                Ok(format!("Device {} removed", id))
            }
        }
    }
}

fn format_node_info_text(info: &NodeInfoResponse) -> String {
    let mut out = String::new();
    out.push_str(&format!("Node Id: {}\n", info.id));
    out.push_str(&format!("Cluster Id: {}\n", info.cluster_id));
    out.push_str(&format!("Zone: {}\n", info.zone));
    out.push_str(&format!("Hostnames: {}\n", info.hostnames.join(", ")));
    out.push_str(&format!(
        "Storage: total={} used={} free={}\n",
        info.storage.total, info.storage.used, info.storage.free
    ));
    out.push_str(&format!("Devices: {}", info.devices_info.len()));
    for device in &info.devices_info {
        out.push_str(&format!(
            "\n  Id:{}  Name:{}  Size (bytes):{}  Used:{}  Free:{}",
            device.id, device.name, device.storage.total, device.storage.used, device.storage.free
        ));
    }
    out
}

fn format_node_info_json(info: &NodeInfoResponse) -> String {
    serde_json::to_string_pretty(info).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceInfoResponse;
    use crate::types::StorageSize;

    fn response() -> NodeInfoResponse {
        NodeInfoResponse {
            cluster_id: "c1".to_string(),
            hostnames: vec!["h1".to_string(), "h2".to_string()],
            id: "n1".to_string(),
            storage: StorageSize::with_total(100),
            zone: 2,
            devices_info: vec![DeviceInfoResponse {
                id: "d1".to_string(),
                name: "/dev/sdb".to_string(),
                storage: StorageSize::with_total(100),
            }],
        }
    }

    #[test]
    fn test_format_node_info_text() {
        let text = format_node_info_text(&response());
        assert!(text.contains("Node Id: n1"));
        assert!(text.contains("Hostnames: h1, h2"));
        assert!(text.contains("Storage: total=100 used=0 free=100"));
        assert!(text.contains("Id:d1  Name:/dev/sdb"));
    }

    #[test]
    fn test_format_node_info_json() {
        let parsed: serde_json::Value =
            serde_json::from_str(&format_node_info_json(&response())).unwrap();
        assert_eq!(parsed["id"], "n1");
        assert_eq!(parsed["storage"]["free"], 100);
        assert_eq!(parsed["devices_info"][0]["name"], "/dev/sdb");
    }

    #[test]
    fn test_cli_parses_node_add() {
        let cli = Cli::try_parse_from([
            "poolnode",
            "node",
            "add",
            "--cluster",
            "c1",
            "--hostname",
            "h1",
            "--hostname",
            "h2",
            "--zone",
            "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Node {
                command:
                    NodeCommands::Add {
                        cluster,
                        hostnames,
                        zone,
                    },
            } => {
                assert_eq!(cluster, "c1");
                assert_eq!(hostnames, vec!["h1", "h2"]);
                assert_eq!(zone, 3);
            }
            _ => panic!("expected node add"),
        }
    }

    #[test]
    fn test_cli_store_override() {
        let cli = Cli::try_parse_from([
            "poolnode",
            "--store",
            "/srv/poolnode",
            "node",
            "delete",
            "n1",
        ])
        .unwrap();
        assert_eq!(cli.store, Some(PathBuf::from("/srv/poolnode")));
    }
}
