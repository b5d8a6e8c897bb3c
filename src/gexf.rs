//! GEXF 1.2 serialization of the analytic graph. The format is small enough
//! that the document is emitted with plain `write!` calls.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use petgraph::{graph::DiGraph, visit::EdgeRef};

use crate::{
    backends::analytic::{AnalyticEdge, AnalyticNode},
    backends::attr_text,
    errors::GraphCrawlError,
};

pub fn write_gexf_file<P: AsRef<Path>>(
    graph: &DiGraph<AnalyticNode, AnalyticEdge>,
    path: P,
) -> Result<(), GraphCrawlError> {
    let file = File::create(path).map_err(|e| GraphCrawlError::export(e.to_string()))?;
    let mut writer = BufWriter::new(file);
    write_gexf(graph, &mut writer)?;
    writer
        .flush()
        .map_err(|e| GraphCrawlError::export(e.to_string()))
}

pub fn write_gexf<W: Write>(
    graph: &DiGraph<AnalyticNode, AnalyticEdge>,
    out: &mut W,
) -> Result<(), GraphCrawlError> {
    let node_attr_ids = declare_attrs(graph.node_weights().map(|n| &n.attrs));
    let edge_attr_ids = declare_attrs(graph.edge_weights().map(|e| &e.attrs));

    emit(out, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n")?;
    emit(
        out,
        "<gexf xmlns=\"http://www.gexf.net/1.2draft\" version=\"1.2\">\n",
    )?;
    emit(
        out,
        "  <graph mode=\"static\" defaultedgetype=\"directed\">\n",
    )?;

    write_attr_decls(out, "node", &node_attr_ids)?;
    write_attr_decls(out, "edge", &edge_attr_ids)?;

    emit(out, "    <nodes>\n")?;
    for index in graph.node_indices() {
        let node = &graph[index];
        let label = node
            .attrs
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or(&node.key);
        writeln!(
            out,
            "      <node id=\"{}\" label=\"{}\">",
            escape(&node.key),
            escape(label)
        )
        .map_err(|e| GraphCrawlError::export(e.to_string()))?;
        write_attvalues(out, &node.attrs, &node_attr_ids)?;
        emit(out, "      </node>\n")?;
    }
    emit(out, "    </nodes>\n")?;

    emit(out, "    <edges>\n")?;
    for (seq, edge) in graph.edge_references().enumerate() {
        let source = &graph[edge.source()].key;
        let target = &graph[edge.target()].key;
        writeln!(
            out,
            "      <edge id=\"{seq}\" source=\"{}\" target=\"{}\" label=\"{}\">",
            escape(source),
            escape(target),
            escape(&edge.weight().rel_type)
        )
        .map_err(|e| GraphCrawlError::export(e.to_string()))?;
        write_attvalues(out, &edge.weight().attrs, &edge_attr_ids)?;
        emit(out, "      </edge>\n")?;
    }
    emit(out, "    </edges>\n")?;

    emit(out, "  </graph>\n")?;
    emit(out, "</gexf>\n")?;
    Ok(())
}

fn declare_attrs<'a, I>(maps: I) -> BTreeMap<String, usize>
where
    I: Iterator<Item = &'a crate::store::AttrMap>,
{
    let mut titles = BTreeMap::new();
    for map in maps {
        for title in map.keys() {
            let next = titles.len();
            titles.entry(title.clone()).or_insert(next);
        }
    }
    titles
}

fn write_attr_decls<W: Write>(
    out: &mut W,
    class: &str,
    ids: &BTreeMap<String, usize>,
) -> Result<(), GraphCrawlError> {
    if ids.is_empty() {
        return Ok(());
    }
    writeln!(out, "    <attributes class=\"{class}\">")
        .map_err(|e| GraphCrawlError::export(e.to_string()))?;
    for (title, id) in ids {
        writeln!(
            out,
            "      <attribute id=\"{id}\" title=\"{}\" type=\"string\"/>",
            escape(title)
        )
        .map_err(|e| GraphCrawlError::export(e.to_string()))?;
    }
    emit(out, "    </attributes>\n")
}

fn write_attvalues<W: Write>(
    out: &mut W,
    attrs: &crate::store::AttrMap,
    ids: &BTreeMap<String, usize>,
) -> Result<(), GraphCrawlError> {
    if attrs.is_empty() {
        return Ok(());
    }
    emit(out, "        <attvalues>\n")?;
    for (title, value) in attrs {
        if let Some(id) = ids.get(title) {
            writeln!(
                out,
                "          <attvalue for=\"{id}\" value=\"{}\"/>",
                escape(&attr_text(value))
            )
            .map_err(|e| GraphCrawlError::export(e.to_string()))?;
        }
    }
    emit(out, "        </attvalues>\n")
}

fn emit<W: Write>(out: &mut W, text: &str) -> Result<(), GraphCrawlError> {
    out.write_all(text.as_bytes())
        .map_err(|e| GraphCrawlError::export(e.to_string()))
}

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
