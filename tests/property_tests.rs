use tablegraph::{
    GraphStore, GraphStoreError, MemoryStore, StoreBackend, TableHandle, TypedValue, Value,
    store::Cell,
};

fn graph() -> GraphStore<MemoryStore> {
    GraphStore::with_prefix(MemoryStore::new(), "pt").expect("graph")
}

#[test]
fn test_set_get_serialized() {
    let g = graph();
    g.add_vertex(Some(b"v")).unwrap();
    let props = g.vertex_properties();
    props.set(b"v", b"name", b"\x04alice").unwrap();
    assert_eq!(props.get(b"v", b"name").unwrap(), Some(b"\x04alice".to_vec()));
    assert_eq!(
        props.get_typed(b"v", b"name").unwrap(),
        Some(TypedValue::new(4, &b"alice"[..]))
    );
    assert_eq!(props.get(b"v", b"missing").unwrap(), None);
}

#[test]
fn test_set_rejects_value_without_discriminator() {
    let g = graph();
    let err = g.vertex_properties().set(b"v", b"k", b"").unwrap_err();
    assert!(matches!(err, GraphStoreError::InvalidInput(_)));
}

#[test]
fn test_typed_values() {
    let g = graph();
    let props = g.edge_properties();
    props.set_value(b"e", b"weight", &Value::Float(0.5)).unwrap();
    props.set_value(b"e", b"since", &Value::Int(2019)).unwrap();
    props.set_value(b"e", b"meta", &Value::Json(serde_json::json!({"a": 1}))).unwrap();
    assert_eq!(props.get_value(b"e", b"weight").unwrap(), Some(Value::Float(0.5)));
    assert_eq!(props.get_value(b"e", b"since").unwrap(), Some(Value::Int(2019)));
    assert_eq!(
        props.get_value(b"e", b"meta").unwrap(),
        Some(Value::Json(serde_json::json!({"a": 1})))
    );
    assert_eq!(props.get_value(b"e", b"nope").unwrap(), None);
}

#[test]
fn test_overwrite_replaces_value_and_type() {
    let g = graph();
    let props = g.vertex_properties();
    props.set_value(b"v", b"age", &Value::from("ten")).unwrap();
    props.set_value(b"v", b"age", &Value::Int(10)).unwrap();
    assert_eq!(props.get_value(b"v", b"age").unwrap(), Some(Value::Int(10)));
    assert_eq!(props.list(b"v").unwrap().len(), 1);
}

#[test]
fn test_vertex_and_edge_properties_are_separate() {
    let g = graph();
    g.vertex_properties().set(b"x", b"k", b"\x04vertex").unwrap();
    g.edge_properties().set(b"x", b"k", b"\x04edge").unwrap();
    assert_eq!(g.vertex_properties().get(b"x", b"k").unwrap(), Some(b"\x04vertex".to_vec()));
    assert_eq!(g.edge_properties().get(b"x", b"k").unwrap(), Some(b"\x04edge".to_vec()));
}

#[test]
fn test_list_and_keys() {
    let g = graph();
    let props = g.vertex_properties();
    props.set(b"v", b"b", b"\x042").unwrap();
    props.set(b"v", b"a", b"\x041").unwrap();
    assert_eq!(
        props.list(b"v").unwrap(),
        vec![(b"a".to_vec(), b"1".to_vec()), (b"b".to_vec(), b"2".to_vec())]
    );
    assert_eq!(props.keys(b"v").unwrap(), vec![b"a".to_vec(), b"b".to_vec()]);
    assert!(props.list(b"none").unwrap().is_empty());
}

#[test]
fn test_list_skips_cells_without_type_companion() {
    let store = MemoryStore::new();
    let g = GraphStore::with_prefix(store.clone(), "half").unwrap();
    g.vertex_properties().set(b"v", b"ok", b"\x04yes").unwrap();
    store
        .open_table("half_vtxp")
        .unwrap()
        .put(b"v", &[Cell::new("vtxp", &b"orphan"[..], &b"x"[..])])
        .unwrap();
    let keys = g.vertex_properties().keys(b"v").unwrap();
    assert_eq!(keys, vec![b"ok".to_vec()]);
    assert_eq!(g.vertex_properties().get(b"v", b"orphan").unwrap(), None);
}

#[test]
fn test_remove_property() {
    let g = graph();
    let props = g.vertex_properties();
    props.set(b"v", b"a", b"\x041").unwrap();
    props.set(b"v", b"b", b"\x042").unwrap();
    props.remove(b"v", b"a").unwrap();
    assert_eq!(props.get(b"v", b"a").unwrap(), None);
    assert_eq!(props.get(b"v", b"b").unwrap(), Some(b"\x042".to_vec()));
    props.remove(b"v", b"a").unwrap();
}

#[test]
fn test_remove_all_deletes_row() {
    let store = MemoryStore::new();
    let g = GraphStore::with_prefix(store.clone(), "ra").unwrap();
    let props = g.vertex_properties();
    props.set(b"v", b"a", b"\x041").unwrap();
    props.set(b"v", b"b", b"\x042").unwrap();
    props.remove_all(b"v").unwrap();
    assert!(props.list(b"v").unwrap().is_empty());
    assert_eq!(store.row_count("ra_vtxp").unwrap(), 0);
}

#[test]
fn test_binary_keys() {
    let g = graph();
    let key = [0u8, 255, b'_', b' '];
    g.vertex_properties().set(b"v", &key, b"\x05\x00\x01").unwrap();
    assert_eq!(g.vertex_properties().get(b"v", &key).unwrap(), Some(vec![5, 0, 1]));
}
