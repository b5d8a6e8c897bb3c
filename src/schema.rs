use rusqlite::Connection;

use crate::errors::GraphCrawlError;

pub fn ensure_schema(conn: &Connection) -> Result<(), GraphCrawlError> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;
        CREATE TABLE IF NOT EXISTS crawl_nodes (
            id    INTEGER PRIMARY KEY AUTOINCREMENT,
            attrs TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS crawl_edges (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            source_id INTEGER NOT NULL,
            target_id INTEGER NOT NULL,
            rel_type  TEXT NOT NULL,
            attrs     TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_crawl_edges_source ON crawl_edges(source_id);
        CREATE INDEX IF NOT EXISTS idx_crawl_edges_target ON crawl_edges(target_id);
        CREATE INDEX IF NOT EXISTS idx_crawl_edges_type ON crawl_edges(rel_type);
        "#,
    )
    .map_err(|e| GraphCrawlError::schema(e.to_string()))?;
    Ok(())
}
