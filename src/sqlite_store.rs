use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params, params_from_iter, types::Value as SqlValue};

use crate::{
    cache::NeighborCache,
    errors::GraphCrawlError,
    schema::ensure_schema,
    store::{AttrMap, GraphStore, NeighborRow, StoreEdge, StoreNode},
};

/// Durable store over SQLite. Attribute predicates are evaluated with the
/// built-in JSON functions; matches come back ordered by id, so ambiguous
/// resolutions are deterministic.
pub struct SqliteStore {
    conn: Connection,
    neighbor_cache: NeighborCache,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GraphCrawlError> {
        let conn =
            Connection::open(path).map_err(|e| GraphCrawlError::connection(e.to_string()))?;
        ensure_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self, GraphCrawlError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| GraphCrawlError::connection(e.to_string()))?;
        ensure_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    pub fn estimate_edge_count(&self) -> Result<i64, GraphCrawlError> {
        self.conn
            .query_row("SELECT COUNT(*) FROM crawl_edges", [], |row| row.get(0))
            .map_err(|e| GraphCrawlError::query(e.to_string()))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            neighbor_cache: NeighborCache::new(),
        }
    }

    fn entity_exists(&self, id: i64) -> Result<bool, GraphCrawlError> {
        let exists: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM crawl_nodes WHERE id=?1", params![id], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| GraphCrawlError::query(e.to_string()))?;
        Ok(exists.is_some())
    }

    fn collect_neighbor_rows(
        &self,
        sql: &str,
        bind: &[SqlValue],
    ) -> Result<Vec<NeighborRow>, GraphCrawlError> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| GraphCrawlError::query(e.to_string()))?;
        let rows = stmt
            .query_map(params_from_iter(bind.iter()), |row| {
                let rel_attrs: String = row.get(1)?;
                let target_attrs: String = row.get(4)?;
                Ok((
                    row.get::<_, i64>(0)?,
                    rel_attrs,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    target_attrs,
                ))
            })
            .map_err(|e| GraphCrawlError::query(e.to_string()))?;
        let mut result = Vec::new();
        for row in rows {
            let (origin_id, rel_attrs, rel_type, target_id, target_attrs) =
                row.map_err(|e| GraphCrawlError::query(e.to_string()))?;
            result.push(NeighborRow {
                origin_id,
                rel_attrs: parse_attrs(&rel_attrs)?,
                rel_type,
                target_attrs: parse_attrs(&target_attrs)?,
                target_id,
            });
        }
        Ok(result)
    }
}

impl GraphStore for SqliteStore {
    fn match_pattern(&self, origin: Option<i64>) -> Result<Vec<NeighborRow>, GraphCrawlError> {
        if let Some(id) = origin {
            if let Some(cached) = self.neighbor_cache.get(id) {
                return Ok(cached);
            }
            let rows = self.collect_neighbor_rows(
                "SELECT e.source_id, e.attrs, e.rel_type, n.id, n.attrs \
                 FROM crawl_edges e JOIN crawl_nodes n ON n.id = e.target_id \
                 WHERE e.source_id = ?1 ORDER BY e.id",
                &[SqlValue::Integer(id)],
            )?;
            self.neighbor_cache.insert(id, rows.clone());
            Ok(rows)
        } else {
            self.collect_neighbor_rows(
                "SELECT e.source_id, e.attrs, e.rel_type, n.id, n.attrs \
                 FROM crawl_edges e JOIN crawl_nodes n ON n.id = e.target_id \
                 ORDER BY e.id",
                &[],
            )
        }
    }

    fn find_nodes(
        &self,
        predicate: &AttrMap,
        filter: Option<&str>,
    ) -> Result<Vec<StoreNode>, GraphCrawlError> {
        let mut clauses = Vec::new();
        let mut bind = Vec::new();
        for (name, value) in predicate {
            clauses.push("json_extract(attrs, ?) = ?".to_string());
            bind.push(SqlValue::Text(format!("$.{name}")));
            bind.push(scalar_to_sql(name, value)?);
        }
        let mut sql = String::from("SELECT id, attrs FROM crawl_nodes");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        if let Some(expr) = filter {
            if clauses.is_empty() {
                sql.push_str(" WHERE ");
            } else {
                sql.push_str(" AND ");
            }
            sql.push('(');
            sql.push_str(expr);
            sql.push(')');
        }
        sql.push_str(" ORDER BY id");

        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| GraphCrawlError::query(e.to_string()))?;
        let rows = stmt
            .query_map(params_from_iter(bind.iter()), |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|e| GraphCrawlError::query(e.to_string()))?;
        let mut result = Vec::new();
        for row in rows {
            let (id, attrs) = row.map_err(|e| GraphCrawlError::query(e.to_string()))?;
            result.push(StoreNode {
                id,
                attrs: parse_attrs(&attrs)?,
            });
        }
        Ok(result)
    }

    fn find_edges(
        &self,
        source_id: i64,
        target_id: i64,
        rel_type: &str,
        predicate: &AttrMap,
    ) -> Result<Vec<StoreEdge>, GraphCrawlError> {
        let mut sql = String::from(
            "SELECT id, source_id, target_id, rel_type, attrs FROM crawl_edges \
             WHERE source_id = ? AND target_id = ? AND rel_type = ?",
        );
        let mut bind = vec![
            SqlValue::Integer(source_id),
            SqlValue::Integer(target_id),
            SqlValue::Text(rel_type.to_string()),
        ];
        for (name, value) in predicate {
            sql.push_str(" AND json_extract(attrs, ?) = ?");
            bind.push(SqlValue::Text(format!("$.{name}")));
            bind.push(scalar_to_sql(name, value)?);
        }
        sql.push_str(" ORDER BY id");

        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| GraphCrawlError::query(e.to_string()))?;
        let rows = stmt
            .query_map(params_from_iter(bind.iter()), |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(|e| GraphCrawlError::query(e.to_string()))?;
        let mut result = Vec::new();
        for row in rows {
            let (id, source_id, target_id, rel_type, attrs) =
                row.map_err(|e| GraphCrawlError::query(e.to_string()))?;
            result.push(StoreEdge {
                id,
                source_id,
                target_id,
                rel_type,
                attrs: parse_attrs(&attrs)?,
            });
        }
        Ok(result)
    }

    fn get_node(&self, id: i64) -> Result<StoreNode, GraphCrawlError> {
        let attrs: String = self
            .conn
            .query_row(
                "SELECT attrs FROM crawl_nodes WHERE id=?1",
                params![id],
                |row| row.get(0),
            )
            .map_err(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => {
                    GraphCrawlError::not_found(format!("node {id}"))
                }
                other => GraphCrawlError::query(other.to_string()),
            })?;
        Ok(StoreNode {
            id,
            attrs: parse_attrs(&attrs)?,
        })
    }

    fn create_node(&self, attrs: &AttrMap) -> Result<StoreNode, GraphCrawlError> {
        let payload = serde_json::to_string(attrs)
            .map_err(|e| GraphCrawlError::invalid_input(e.to_string()))?;
        self.conn
            .execute("INSERT INTO crawl_nodes(attrs) VALUES(?1)", params![payload])
            .map_err(|e| GraphCrawlError::query(e.to_string()))?;
        self.neighbor_cache.clear();
        Ok(StoreNode {
            id: self.conn.last_insert_rowid(),
            attrs: attrs.clone(),
        })
    }

    fn create_edge(
        &self,
        source_id: i64,
        target_id: i64,
        rel_type: &str,
        attrs: &AttrMap,
    ) -> Result<StoreEdge, GraphCrawlError> {
        if rel_type.trim().is_empty() {
            return Err(GraphCrawlError::invalid_input("edge type must be set"));
        }
        if !self.entity_exists(source_id)? || !self.entity_exists(target_id)? {
            return Err(GraphCrawlError::invalid_input(
                "edge endpoints must reference existing nodes",
            ));
        }
        let payload = serde_json::to_string(attrs)
            .map_err(|e| GraphCrawlError::invalid_input(e.to_string()))?;
        self.conn
            .execute(
                "INSERT INTO crawl_edges(source_id, target_id, rel_type, attrs) \
                 VALUES(?1, ?2, ?3, ?4)",
                params![source_id, target_id, rel_type, payload],
            )
            .map_err(|e| GraphCrawlError::query(e.to_string()))?;
        self.neighbor_cache.clear();
        Ok(StoreEdge {
            id: self.conn.last_insert_rowid(),
            source_id,
            target_id,
            rel_type: rel_type.to_string(),
            attrs: attrs.clone(),
        })
    }

    fn estimate_node_count(&self) -> Result<i64, GraphCrawlError> {
        self.conn
            .query_row("SELECT COUNT(*) FROM crawl_nodes", [], |row| row.get(0))
            .map_err(|e| GraphCrawlError::query(e.to_string()))
    }

    fn fetch_node_at_offset(&self, offset: i64) -> Result<Option<StoreNode>, GraphCrawlError> {
        let row: Option<(i64, String)> = self
            .conn
            .query_row(
                "SELECT id, attrs FROM crawl_nodes LIMIT 1 OFFSET ?1",
                params![offset],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| GraphCrawlError::query(e.to_string()))?;
        match row {
            Some((id, attrs)) => Ok(Some(StoreNode {
                id,
                attrs: parse_attrs(&attrs)?,
            })),
            None => Ok(None),
        }
    }

    fn clear(&self) -> Result<(), GraphCrawlError> {
        self.conn
            .execute_batch("DELETE FROM crawl_edges; DELETE FROM crawl_nodes;")
            .map_err(|e| GraphCrawlError::query(e.to_string()))?;
        self.neighbor_cache.clear();
        Ok(())
    }
}

fn parse_attrs(raw: &str) -> Result<AttrMap, GraphCrawlError> {
    serde_json::from_str(raw).map_err(|e| GraphCrawlError::query(e.to_string()))
}

/// JSON scalars map onto the SQL values `json_extract` yields for them;
/// booleans come back as 0/1 integers.
fn scalar_to_sql(name: &str, value: &serde_json::Value) -> Result<SqlValue, GraphCrawlError> {
    match value {
        serde_json::Value::String(s) => Ok(SqlValue::Text(s.clone())),
        serde_json::Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(SqlValue::Integer(i))
            } else if let Some(f) = n.as_f64() {
                Ok(SqlValue::Real(f))
            } else {
                Err(GraphCrawlError::invalid_input(format!(
                    "attribute {name} has an unrepresentable number"
                )))
            }
        }
        other => Err(GraphCrawlError::invalid_input(format!(
            "attribute {name} must be a scalar, got {other}"
        ))),
    }
}
