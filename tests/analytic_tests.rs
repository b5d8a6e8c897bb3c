use serde_json::json;
use tempfile::tempdir;

use graphcrawl::{
    AttrMap, CanonicalEdge, CanonicalNode, MirrorBackend, attrs,
    backends::AnalyticBackend,
    canonical::edge_key,
    gexf,
};

fn node(key: &str, name: &str) -> CanonicalNode {
    CanonicalNode {
        key: key.to_string(),
        attrs: attrs([("name", json!(name)), ("class", json!("event"))]),
    }
}

fn edge(source: &str, target: &str) -> CanonicalEdge {
    CanonicalEdge {
        key: edge_key(source, target, "leads_to"),
        source_key: source.to_string(),
        target_key: target.to_string(),
        rel_type: "leads_to".to_string(),
        attrs: AttrMap::new(),
    }
}

#[test]
fn test_accumulates_without_duplicates() {
    let mut backend = AnalyticBackend::new("unused.gexf");
    backend.add_node(&node("a", "a")).expect("a");
    backend.add_node(&node("b", "b")).expect("b");
    backend.add_node(&node("a", "a")).expect("a resend");
    backend.add_edge(&edge("a", "b")).expect("edge");
    backend.add_edge(&edge("a", "b")).expect("edge resend");

    assert_eq!(backend.node_count(), 2);
    assert_eq!(backend.edge_count(), 1);
}

#[test]
fn test_edge_ahead_of_endpoint_leaves_placeholder_then_fills() {
    let mut backend = AnalyticBackend::new("unused.gexf");
    backend.add_node(&node("a", "a")).expect("a");
    backend.add_edge(&edge("a", "b")).expect("edge first");
    assert_eq!(backend.node_count(), 2);

    backend.add_node(&node("b", "b")).expect("b late");
    assert_eq!(backend.node_count(), 2);
    let filled = backend
        .graph()
        .node_weights()
        .find(|w| w.key == "b")
        .expect("node b");
    assert_eq!(filled.attrs.get("name"), Some(&json!("b")));
}

#[test]
fn test_existing_attributes_are_never_merged() {
    let mut backend = AnalyticBackend::new("unused.gexf");
    backend.add_node(&node("a", "first")).expect("first");
    let mut retry = node("a", "second");
    retry.attrs.insert("extra".to_string(), json!("y"));
    backend.add_node(&retry).expect("resend");

    let weight = backend
        .graph()
        .node_weights()
        .find(|w| w.key == "a")
        .expect("node a");
    assert_eq!(weight.attrs.get("name"), Some(&json!("first")));
    assert!(!weight.attrs.contains_key("extra"));
}

#[test]
fn test_finish_writes_gexf_once() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("out.gexf");
    let mut backend = AnalyticBackend::new(path.clone());
    backend.add_node(&node("a", "phish")).expect("a");
    backend.add_node(&node("b", "creds")).expect("b");
    backend.add_edge(&edge("a", "b")).expect("edge");
    backend.finish().expect("finish");

    let written = std::fs::read_to_string(&path).expect("gexf file");
    assert!(written.contains("http://www.gexf.net/1.2draft"));
    assert!(written.contains("defaultedgetype=\"directed\""));
    assert!(written.contains("label=\"phish\""));
    assert!(written.contains("label=\"leads_to\""));
    assert!(written.contains("<attvalue"));

    // A second finish does not rewrite the file.
    std::fs::remove_file(&path).expect("remove");
    backend.finish().expect("second finish");
    assert!(!path.exists());
}

#[test]
fn test_gexf_escapes_markup() {
    let mut backend = AnalyticBackend::new("unused.gexf");
    backend
        .add_node(&CanonicalNode {
            key: "k".to_string(),
            attrs: attrs([("name", json!("a<b>&\"c\""))]),
        })
        .expect("node");
    let mut out = Vec::new();
    gexf::write_gexf(backend.graph(), &mut out).expect("write");
    let doc = String::from_utf8(out).expect("utf8");
    assert!(doc.contains("a&lt;b&gt;&amp;&quot;c&quot;"));
    assert!(!doc.contains("a<b>"));
}

#[test]
fn test_gexf_declares_attributes_for_both_classes() {
    let mut backend = AnalyticBackend::new("unused.gexf");
    backend.add_node(&node("a", "a")).expect("a");
    backend.add_node(&node("b", "b")).expect("b");
    let mut weighted = edge("a", "b");
    weighted.attrs.insert("weight".to_string(), json!(2));
    backend.add_edge(&weighted).expect("edge");

    let mut out = Vec::new();
    gexf::write_gexf(backend.graph(), &mut out).expect("write");
    let doc = String::from_utf8(out).expect("utf8");
    assert!(doc.contains("<attributes class=\"node\">"));
    assert!(doc.contains("<attributes class=\"edge\">"));
    assert!(doc.contains("title=\"class\""));
    assert!(doc.contains("title=\"weight\""));
}
