pub mod queries;

use anyhow::Context;
use rusqlite::Connection;

/// Schema steps compiled into the binary, applied in order. Append new
/// steps, never edit applied ones.
const SCHEMA: &[(&str, &str)] = &[(
    "001_create_bookings",
    include_str!("../../migrations/001_create_bookings.sql"),
)];

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path).context("failed to open database")?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("failed to set database pragmas")?;

    apply_schema(&conn)?;

    Ok(conn)
}

/// Applied steps are recorded by name, so reopening an existing database
/// only runs what it has not seen yet.
fn apply_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _schema_history (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .context("failed to create schema history table")?;

    for &(name, sql) in SCHEMA {
        let applied: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM _schema_history WHERE name = ?1)",
            [name],
            |row| row.get(0),
        )?;
        if applied {
            continue;
        }

        conn.execute_batch(sql)
            .with_context(|| format!("failed to apply schema step: {name}"))?;
        conn.execute("INSERT INTO _schema_history (name) VALUES (?1)", [name])?;
        tracing::debug!("applied schema step: {name}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_creates_bookings_table() {
        let conn = init_db(":memory:").unwrap();
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM bookings", [], |row| row.get(0))
            .unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_schema_apply_is_idempotent() {
        let conn = init_db(":memory:").unwrap();
        apply_schema(&conn).unwrap();

        let applied: i64 = conn
            .query_row("SELECT COUNT(*) FROM _schema_history", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(applied, SCHEMA.len() as i64);
    }
}
