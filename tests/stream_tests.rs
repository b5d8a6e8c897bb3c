use serde_json::{Value, json};

use graphcrawl::{
    AttrMap, CanonicalEdge, CanonicalNode, MirrorBackend, attrs,
    backends::StreamMirror,
    canonical::{edge_key, stable_id},
};

fn messages(mirror: StreamMirror<Vec<u8>>) -> Vec<Value> {
    let raw = String::from_utf8(mirror.into_writer()).expect("utf8");
    raw.lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect()
}

#[test]
fn test_add_node_message_shape() {
    let mut mirror = StreamMirror::new(Vec::new());
    mirror
        .add_node(&CanonicalNode {
            key: "k".to_string(),
            attrs: attrs([("name", json!("x")), ("class", json!("actor"))]),
        })
        .expect("node");

    let sent = messages(mirror);
    assert_eq!(sent.len(), 1);
    let id = stable_id("k").to_string();
    let node = &sent[0]["an"][&id];
    assert_eq!(node["name"], json!("x"));
    assert_eq!(node["class"], json!("actor"));
}

#[test]
fn test_add_edge_message_carries_direction_and_endpoints() {
    let mut mirror = StreamMirror::new(Vec::new());
    let key = edge_key("a", "b", "LINK");
    mirror
        .add_edge(&CanonicalEdge {
            key: key.clone(),
            source_key: "a".to_string(),
            target_key: "b".to_string(),
            rel_type: "LINK".to_string(),
            attrs: attrs([("weight", json!(2))]),
        })
        .expect("edge");

    let sent = messages(mirror);
    assert_eq!(sent.len(), 1);
    let id = stable_id(&key).to_string();
    let edge = &sent[0]["ae"][&id];
    assert_eq!(edge["directed"], json!(true));
    assert_eq!(edge["source"], json!(stable_id("a").to_string()));
    assert_eq!(edge["target"], json!(stable_id("b").to_string()));
    assert_eq!(edge["rel_type"], json!("LINK"));
    assert_eq!(edge["weight"], json!(2));
}

#[test]
fn test_resends_are_suppressed() {
    let mut mirror = StreamMirror::new(Vec::new());
    let node = CanonicalNode {
        key: "k".to_string(),
        attrs: AttrMap::new(),
    };
    mirror.add_node(&node).expect("first");
    mirror.add_node(&node).expect("resend");
    assert_eq!(messages(mirror).len(), 1);
}
