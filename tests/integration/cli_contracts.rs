use poolnode::tooling::cli::{CliContext, Commands, DeviceCommands, NodeCommands};
use poolnode::{ApiError, SledStore, StorageError};

fn context() -> CliContext {
    CliContext::with_store(SledStore::open_temporary().unwrap())
}

fn add_node(cli: &CliContext) -> String {
    cli.execute(&Commands::Node {
        command: NodeCommands::Add {
            cluster: "c1".to_string(),
            hostnames: vec!["h1".to_string()],
            zone: 1,
        },
    })
    .unwrap()
}

fn add_device(cli: &CliContext, node: &str, name: &str, size: u64) -> String {
    cli.execute(&Commands::Device {
        command: DeviceCommands::Add {
            node: node.to_string(),
            name: name.to_string(),
            size,
        },
    })
    .unwrap()
}

fn info_json(cli: &CliContext, node: &str) -> serde_json::Value {
    let output = cli
        .execute(&Commands::Node {
            command: NodeCommands::Info {
                id: node.to_string(),
                format: "json".to_string(),
            },
        })
        .unwrap();
    serde_json::from_str(&output).unwrap()
}

#[test]
fn node_info_json_contract_has_required_fields() {
    let cli = context();
    let node = add_node(&cli);
    add_device(&cli, &node, "/dev/sdb", 1000);

    let parsed = info_json(&cli, &node);
    assert_eq!(parsed["id"], node.as_str());
    assert_eq!(parsed["cluster_id"], "c1");
    assert_eq!(parsed["zone"], 1);
    assert_eq!(parsed["hostnames"][0], "h1");
    assert_eq!(parsed["storage"]["total"], 1000);
    assert_eq!(parsed["storage"]["used"], 0);
    assert_eq!(parsed["storage"]["free"], 1000);
    let devices = parsed["devices_info"].as_array().unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0]["name"], "/dev/sdb");
}

#[test]
fn device_remove_retires_capacity() {
    let cli = context();
    let node = add_node(&cli);
    let first = add_device(&cli, &node, "/dev/sdb", 300);
    add_device(&cli, &node, "/dev/sdc", 200);

    cli.execute(&Commands::Device {
        command: DeviceCommands::Remove { id: first },
    })
    .unwrap();

    let parsed = info_json(&cli, &node);
    assert_eq!(parsed["storage"]["total"], 200);
    assert_eq!(parsed["storage"]["free"], 200);
    assert_eq!(parsed["devices_info"].as_array().unwrap().len(), 1);
    assert_eq!(parsed["devices_info"][0]["name"], "/dev/sdc");
}

#[test]
fn node_delete_conflicts_while_devices_attached() {
    let cli = context();
    let node = add_node(&cli);
    let device = add_device(&cli, &node, "/dev/sdb", 10);

    let delete = Commands::Node {
        command: NodeCommands::Delete { id: node.clone() },
    };
    let err = cli.execute(&delete).unwrap_err();
    assert!(matches!(
        err,
        ApiError::StorageError(StorageError::Conflict(_))
    ));

    cli.execute(&Commands::Device {
        command: DeviceCommands::Remove { id: device },
    })
    .unwrap();
    let output = cli.execute(&delete).unwrap();
    assert!(output.contains(&node));
}

#[test]
fn device_add_to_unknown_node_is_not_found() {
    let cli = context();
    let err = cli
        .execute(&Commands::Device {
            command: DeviceCommands::Add {
                node: "missing".to_string(),
                name: "/dev/sdb".to_string(),
                size: 10,
            },
        })
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::StorageError(StorageError::NotFound(_))
    ));
}

#[test]
fn node_add_rejects_empty_cluster() {
    let cli = context();
    let err = cli
        .execute(&Commands::Node {
            command: NodeCommands::Add {
                cluster: " ".to_string(),
                hostnames: vec!["h1".to_string()],
                zone: 1,
            },
        })
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidRequest(_)));
}

#[test]
fn node_info_text_lists_devices() {
    let cli = context();
    let node = add_node(&cli);
    add_device(&cli, &node, "/dev/sdb", 42);

    let output = cli
        .execute(&Commands::Node {
            command: NodeCommands::Info {
                id: node.clone(),
                format: "text".to_string(),
            },
        })
        .unwrap();
    assert!(output.contains(&format!("Node Id: {}", node)));
    assert!(output.contains("Devices: 1"));
    assert!(output.contains("Name:/dev/sdb"));
}
