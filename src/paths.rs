//! Path-file ingestion: one path per line, `label, name:class, name:class...`.
//! Each line resolves into the authoritative store as a chain of nodes linked
//! by a configurable relationship type, fanned out to all mirrors as it goes.
//! The whole import is idempotent; re-running it creates nothing new.

use std::{fs, path::Path, thread, time::Duration};

use serde_json::json;
use tracing::info;

use crate::{
    canonical,
    config::ImportConfig,
    errors::GraphCrawlError,
    fanout::{CanonicalEdge, CanonicalNode, FanoutDispatcher},
    resolver::{resolve_or_create_edge, resolve_or_create_node},
    store::{AttrMap, GraphStore},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStop {
    pub name: String,
    pub class: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSpec {
    pub label: String,
    pub stops: Vec<PathStop>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportStats {
    pub paths: usize,
    pub nodes_resolved: usize,
    pub nodes_created: usize,
    pub edges_resolved: usize,
    pub edges_created: usize,
}

pub fn import_path_file<S: GraphStore>(
    store: &S,
    dispatcher: &mut FanoutDispatcher,
    config: &ImportConfig,
) -> Result<ImportStats, GraphCrawlError> {
    let raw = fs::read_to_string(Path::new(&config.path_file))
        .map_err(|e| GraphCrawlError::invalid_input(format!("{}: {e}", config.path_file)))?;
    let mut stats = ImportStats::default();
    for (lineno, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let spec = parse_path_line(line)
            .map_err(|e| GraphCrawlError::invalid_input(format!("line {}: {e}", lineno + 1)))?;
        import_path(store, dispatcher, &spec, config, &mut stats)?;
        stats.paths += 1;
        pace(config.path_pace_ms);
    }
    Ok(stats)
}

/// Resolver failures on this path hit the authoritative store and are fatal;
/// mirror failures stay contained in the dispatcher as usual.
pub fn import_path<S: GraphStore>(
    store: &S,
    dispatcher: &mut FanoutDispatcher,
    spec: &PathSpec,
    config: &ImportConfig,
    stats: &mut ImportStats,
) -> Result<(), GraphCrawlError> {
    info!(label = spec.label.as_str(), stops = spec.stops.len(), "importing path");
    let mut previous: Option<(i64, String)> = None;
    for stop in &spec.stops {
        let predicate = stop_predicate(stop);
        let resolved = resolve_or_create_node(store, &predicate, None)?;
        stats.nodes_resolved += 1;
        if !resolved.existed {
            stats.nodes_created += 1;
        }
        let key = canonical::node_key(&predicate);
        dispatcher.replicate_node(&CanonicalNode {
            key: key.clone(),
            attrs: predicate,
        });
        if let Some((source_id, source_key)) = previous {
            let edge = resolve_or_create_edge(
                store,
                source_id,
                resolved.entity.id,
                &config.rel_type,
                &AttrMap::new(),
            )?;
            stats.edges_resolved += 1;
            if !edge.existed {
                stats.edges_created += 1;
            }
            dispatcher.replicate_edge(&CanonicalEdge {
                key: canonical::edge_key(&source_key, &key, &config.rel_type),
                source_key,
                target_key: key.clone(),
                rel_type: config.rel_type.clone(),
                attrs: AttrMap::new(),
            });
        }
        previous = Some((resolved.entity.id, key));
        pace(config.node_pace_ms);
    }
    Ok(())
}

fn stop_predicate(stop: &PathStop) -> AttrMap {
    let mut predicate = AttrMap::new();
    predicate.insert("name".to_string(), json!(stop.name));
    predicate.insert("class".to_string(), json!(stop.class));
    predicate
}

/// First field is the path label, every following field is `name:class`.
/// Fields may be double-quoted; quoted commas stay inside the field.
pub fn parse_path_line(line: &str) -> Result<PathSpec, String> {
    let fields = split_csv(line);
    if fields.len() < 2 {
        return Err("a path needs a label and at least one stop".to_string());
    }
    let label = fields[0].clone();
    let mut stops = Vec::with_capacity(fields.len() - 1);
    for field in &fields[1..] {
        let (name, class) = field
            .split_once(':')
            .ok_or_else(|| format!("stop {field:?} is not name:class"))?;
        if name.is_empty() || class.is_empty() {
            return Err(format!("stop {field:?} is not name:class"));
        }
        stops.push(PathStop {
            name: name.to_string(),
            class: class.to_string(),
        });
    }
    Ok(PathSpec { label, stops })
}

fn split_csv(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for c in line.chars() {
        match c {
            '"' => quoted = !quoted,
            ',' if !quoted => {
                fields.push(current.trim().to_string());
                current = String::new();
            }
            other => current.push(other),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

fn pace(ms: u64) {
    if ms > 0 {
        thread::sleep(Duration::from_millis(ms));
    }
}
