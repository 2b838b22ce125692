use std::sync::{Arc, Mutex};

use tablegraph::{
    GraphReindexer, GraphStore, GraphStoreError, MemoryStore, ReindexConfig, ReindexStage,
    StoreBackend, TableHandle, Value,
    store::{Cell, ScanSpec},
};

fn graph_with(store: &MemoryStore) -> GraphStore<MemoryStore> {
    GraphStore::with_prefix(store.clone(), "rx").expect("graph")
}

fn lookup(g: &GraphStore<MemoryStore>, key: &[u8], value: &[u8]) -> Vec<Vec<u8>> {
    g.vertex_lookup(key, value)
        .unwrap()
        .map(|hit| hit.unwrap().element_id)
        .collect()
}

fn populate(g: &GraphStore<MemoryStore>) {
    let rows: [(&[u8], &str, i64); 3] = [(b"1", "red", 1), (b"2", "blue", 2), (b"3", "red", 3)];
    for (id, color, size) in rows {
        g.add_vertex(Some(id)).unwrap();
        let props = g.vertex_properties();
        props.set_value(id, b"color", &Value::from(color)).unwrap();
        props.set_value(id, b"size", &Value::Int(size)).unwrap();
    }
    g.add_edge(Some(b"e"), b"1", b"2").unwrap();
    g.edge_properties().set_value(b"e", b"color", &Value::from("red")).unwrap();
}

#[test]
fn test_reindex_all_rebuilds_every_key() {
    let store = MemoryStore::new();
    let g = graph_with(&store);
    populate(&g);
    g.create_index(b"color").unwrap();
    g.create_index(b"size").unwrap();

    let result = g.reindex_all().unwrap();
    assert_eq!(result.keys, vec![b"color".to_vec(), b"size".to_vec()]);
    assert_eq!(result.vertices_indexed, 6);
    assert_eq!(result.edges_indexed, 1);
    assert_eq!(lookup(&g, b"color", b"red"), vec![b"1".to_vec(), b"3".to_vec()]);
    let hits: Vec<_> = g.edge_lookup(b"color", b"red").unwrap().collect();
    assert_eq!(hits.len(), 1);
}

#[test]
fn test_reindex_reports_progress() {
    let store = MemoryStore::new();
    let g = graph_with(&store);
    populate(&g);
    g.create_index(b"color").unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let config = ReindexConfig {
        edges: false,
        ..ReindexConfig::default()
    }
    .with_progress(move |p| sink.lock().unwrap().push((p.stage, p.current, p.total)));
    let result = GraphReindexer::new(&g, config).reindex().unwrap();

    assert_eq!(result.edges_indexed, 0);
    assert_eq!(result.vertices_indexed, 3);
    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![(ReindexStage::Vertices, 0, 1), (ReindexStage::Complete, 1, 1)]
    );
}

#[test]
fn test_reindex_with_no_indexes() {
    let store = MemoryStore::new();
    let g = graph_with(&store);
    populate(&g);
    let result = g.reindex_all().unwrap();
    assert!(result.keys.is_empty());
    assert_eq!(result.vertices_indexed, 0);
}

#[test]
fn test_repair_removes_stale_entries() {
    let store = MemoryStore::new();
    let g = graph_with(&store);
    g.create_index(b"color").unwrap();
    populate(&g);

    // Simulate drift: an entry for an element that never had the value, and
    // a property overwritten behind the index's back.
    let index = store.open_table("rx_idx_color").unwrap();
    index
        .put(b"green9", &[Cell::new("idx_vtx", &b"green"[..], &b"9"[..])])
        .unwrap();
    store
        .open_table("rx_vtxp")
        .unwrap()
        .put(b"3", &[Cell::new("vtxp", &b"color"[..], &b"blue"[..])])
        .unwrap();
    assert_eq!(lookup(&g, b"color", b"green"), vec![b"9".to_vec()]);
    assert_eq!(lookup(&g, b"color", b"red"), vec![b"1".to_vec(), b"3".to_vec()]);

    let result = g.repair_index(b"color").unwrap();
    assert_eq!(result.stale_removed, 2);
    assert_eq!(result.vertices_indexed, 3);
    assert_eq!(result.edges_indexed, 1);
    assert!(lookup(&g, b"color", b"green").is_empty());
    assert_eq!(lookup(&g, b"color", b"red"), vec![b"1".to_vec()]);
    assert_eq!(lookup(&g, b"color", b"blue"), vec![b"2".to_vec(), b"3".to_vec()]);

    let again = g.repair_index(b"color").unwrap();
    assert_eq!(again.stale_removed, 0);
}

#[test]
fn test_repair_unknown_index() {
    let store = MemoryStore::new();
    let g = graph_with(&store);
    assert!(matches!(
        g.repair_index(b"nope"),
        Err(GraphStoreError::IndexNotFound(_))
    ));
}

#[test]
fn test_index_rows_have_documented_layout() {
    let store = MemoryStore::new();
    let g = graph_with(&store);
    g.create_index(b"color").unwrap();
    g.vertex_properties().set_value(b"v1", b"color", &Value::from("red")).unwrap();
    let rows: Vec<_> = store
        .open_table("rx_idx_color")
        .unwrap()
        .scan(ScanSpec::full("idx_vtx", 10))
        .unwrap()
        .map(Result::unwrap)
        .collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].key, b"redv1".to_vec());
    assert_eq!(rows[0].value("idx_vtx", b"red"), Some(&b"v1"[..]));
}
