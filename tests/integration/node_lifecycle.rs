use poolnode::{
    DeviceRecord, NodeAddRequest, NodeRecord, SledStore, StorageError, StorageSize,
};

fn request() -> NodeAddRequest {
    NodeAddRequest {
        cluster_id: "c1".to_string(),
        hostnames: vec!["h1".to_string()],
        zone: 1,
    }
}

#[test]
fn node_lifecycle_scenario() {
    let store = SledStore::open_temporary().unwrap();
    let mut node = NodeRecord::from_request(&request());

    node.add_capacity(1000);
    assert_eq!(
        node.info.storage,
        StorageSize {
            total: 1000,
            used: 0,
            free: 1000
        }
    );

    node.allocate_capacity(400);
    assert_eq!(
        node.info.storage,
        StorageSize {
            total: 1000,
            used: 400,
            free: 600
        }
    );

    node.add_device("d1");
    node.add_device("d2");
    assert_eq!(node.devices(), &["d1", "d2"]);

    store.transaction(|txn| node.save(txn)).unwrap();
    let loaded = store
        .transaction(|txn| NodeRecord::load(txn, &node.info.id))
        .unwrap();
    assert_eq!(loaded, node);

    let result = store.transaction(|txn| node.delete(txn));
    assert!(matches!(result, Err(StorageError::Conflict(_))));

    node.remove_device("d1");
    node.remove_device("d2");
    store.transaction(|txn| node.delete(txn)).unwrap();

    let result = store.transaction(|txn| NodeRecord::load(txn, &node.info.id));
    assert!(matches!(result, Err(StorageError::NotFound(_))));
}

#[test]
fn failed_transaction_leaves_node_untouched() {
    let store = SledStore::open_temporary().unwrap();
    let node = NodeRecord::from_request(&request());
    store.transaction(|txn| node.save(txn)).unwrap();

    // Attach a device that was never stored, then fail the projection.
    let result = store.transaction(|txn| {
        let mut updated = NodeRecord::load(txn, &node.info.id)?;
        updated.add_device("missing");
        updated.add_capacity(10);
        updated.save(txn)?;
        updated.info_response(txn)
    });
    assert!(matches!(result, Err(StorageError::NotFound(_))));

    let loaded = store
        .transaction(|txn| NodeRecord::load(txn, &node.info.id))
        .unwrap();
    assert!(loaded.devices().is_empty());
    assert_eq!(loaded.info.storage, StorageSize::default());
}

#[test]
fn device_attach_and_detach_in_one_transaction() {
    let store = SledStore::open_temporary().unwrap();
    let node = NodeRecord::from_request(&request());
    let device = DeviceRecord::new("/dev/sdb", &node.info.id, 500);

    store
        .transaction(|txn| {
            let mut node = node.clone();
            node.add_device(&device.info.id);
            node.add_capacity(device.info.storage.total);
            device.save(txn)?;
            node.save(txn)
        })
        .unwrap();

    let info = store
        .transaction(|txn| NodeRecord::load(txn, &node.info.id)?.info_response(txn))
        .unwrap();
    assert_eq!(info.storage, StorageSize::with_total(500));
    assert_eq!(info.devices_info.len(), 1);
    assert_eq!(info.devices_info[0].id, device.info.id);

    store
        .transaction(|txn| {
            let mut node = NodeRecord::load(txn, &node.info.id)?;
            node.remove_device(&device.info.id);
            node.remove_capacity(device.info.storage.total);
            node.save(txn)?;
            device.delete(txn)?;
            node.delete(txn)
        })
        .unwrap();

    let result = store.transaction(|txn| DeviceRecord::load(txn, &device.info.id));
    assert!(matches!(result, Err(StorageError::NotFound(_))));
}

#[test]
fn node_survives_store_reopen() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("store");
    let mut node = NodeRecord::from_request(&request());
    node.add_device("d1");
    node.add_capacity(64);

    {
        let store = SledStore::open(&path).unwrap();
        store.transaction(|txn| node.save(txn)).unwrap();
        store.flush().unwrap();
    }

    let store = SledStore::open(&path).unwrap();
    let loaded = store
        .transaction(|txn| NodeRecord::load(txn, &node.info.id))
        .unwrap();
    assert_eq!(loaded, node);
}
