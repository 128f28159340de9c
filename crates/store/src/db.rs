use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

pub(crate) const MIGRATION_V1_SQL: &str = r#"
CREATE TABLE namespaces (
    ns_id       INTEGER PRIMARY KEY,
    ns_name     TEXT NOT NULL
);

CREATE TABLE pages (
    page_id         INTEGER PRIMARY KEY AUTOINCREMENT,
    page_namespace  INTEGER NOT NULL,
    page_title      TEXT NOT NULL,
    page_text       TEXT NOT NULL,
    page_touched    TEXT NOT NULL,
    UNIQUE (page_namespace, page_title)
);

CREATE TABLE revisions (
    rev_id          INTEGER PRIMARY KEY AUTOINCREMENT,
    page_id         INTEGER NOT NULL REFERENCES pages (page_id) ON DELETE CASCADE,
    rev_text        TEXT NOT NULL,
    rev_summary     TEXT NOT NULL,
    rev_minor       INTEGER NOT NULL DEFAULT 0,
    rev_timestamp   TEXT NOT NULL
);

INSERT INTO namespaces (ns_id, ns_name) VALUES
    (0, ''),
    (1, 'Talk'),
    (2, 'User'),
    (3, 'User talk'),
    (4, 'Project'),
    (5, 'Project talk'),
    (6, 'File'),
    (7, 'File talk'),
    (8, 'MediaWiki'),
    (9, 'MediaWiki talk'),
    (10, 'Template'),
    (11, 'Template talk'),
    (12, 'Help'),
    (13, 'Help talk'),
    (14, 'Category'),
    (15, 'Category talk');
"#;

const MIGRATION_V2_SQL: &str = r#"
ALTER TABLE revisions ADD COLUMN rev_bot INTEGER NOT NULL DEFAULT 0;

CREATE INDEX pages_namespace_idx
    ON pages (page_namespace, page_id);

CREATE INDEX revisions_page_idx
    ON revisions (page_id, rev_id);
"#;

const MIGRATIONS: &[(i64, &str)] = &[(1, MIGRATION_V1_SQL), (2, MIGRATION_V2_SQL)];

/// SQLite connection with the page schema applied.
#[derive(Debug)]
pub struct PageDb {
    conn: Connection,
}

impl PageDb {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create page store parent directory `{}`", parent.display())
            })?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open page store at `{}`", path.display()))?;
        Self::init(conn, true)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory page store")?;
        Self::init(conn, false)
    }

    fn init(mut conn: Connection, wal: bool) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .context("failed to enable sqlite foreign keys")?;
        if wal {
            conn.execute_batch("PRAGMA journal_mode = WAL;")
                .context("failed to configure sqlite journal mode")?;
        }

        ensure_migration_table(&conn)?;
        apply_pending_migrations(&mut conn)?;

        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn schema_version(&self) -> Result<i64> {
        current_schema_version(&self.conn)
    }
}

pub(crate) fn ensure_migration_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY,
            applied_at  TEXT NOT NULL
        );
        ",
    )
    .context("failed to ensure schema_migrations table exists")
}

fn current_schema_version(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_migrations", [], |row| row.get(0))
        .context("failed to read current schema version")
}

fn apply_pending_migrations(conn: &mut Connection) -> Result<()> {
    let mut current_version = current_schema_version(conn)?;

    for (version, sql) in MIGRATIONS {
        if *version <= current_version {
            continue;
        }

        let tx = conn.transaction().context("failed to start migration transaction")?;
        tx.execute_batch(sql)
            .with_context(|| format!("failed to apply page store migration v{version}"))?;
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, datetime('now'))",
            params![version],
        )
        .with_context(|| format!("failed to record migration v{version}"))?;
        tx.commit().with_context(|| format!("failed to commit migration v{version}"))?;
        current_version = *version;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::{ensure_migration_table, PageDb, MIGRATION_V1_SQL};

    const EXPECTED_TABLES: &[&str] = &["schema_migrations", "namespaces", "pages", "revisions"];

    #[test]
    fn open_creates_schema_and_records_latest_migration() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let db = PageDb::open(dir.path().join("pages.db")).expect("page db should open");

        for table in EXPECTED_TABLES {
            let exists: i64 = db
                .connection()
                .query_row(
                    "SELECT COUNT(1) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [table],
                    |row| row.get(0),
                )
                .expect("table existence query should succeed");

            assert_eq!(exists, 1, "expected `{table}` table to exist");
        }

        assert_eq!(db.schema_version().expect("schema version should be readable"), 2);
    }

    #[test]
    fn opening_twice_is_idempotent_for_all_migrations() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let db_path = dir.path().join("nested").join("pages.db");
        {
            let first = PageDb::open(&db_path).expect("first open should succeed");
            assert_eq!(first.schema_version().expect("schema version should be readable"), 2);
        }

        let second = PageDb::open(&db_path).expect("second open should succeed");
        let migration_rows: i64 = second
            .connection()
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .expect("schema migration count query should succeed");
        assert_eq!(migration_rows, 2);

        let namespaces: i64 = second
            .connection()
            .query_row("SELECT COUNT(*) FROM namespaces", [], |row| row.get(0))
            .expect("namespace count query should succeed");
        assert_eq!(namespaces, 16);
    }

    #[test]
    fn existing_v1_schema_is_migrated_to_v2() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let db_path = dir.path().join("pages.db");
        {
            let conn = Connection::open(&db_path).expect("v1 seed db should open");
            ensure_migration_table(&conn).expect("schema_migrations should be created");
            conn.execute_batch(MIGRATION_V1_SQL).expect("v1 schema should be applied");
            conn.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (1, datetime('now'))",
                [],
            )
            .expect("v1 migration row should be inserted");
        }

        let db = PageDb::open(&db_path).expect("page db should upgrade from v1 to v2");
        assert_eq!(db.schema_version().expect("schema version should be readable"), 2);

        let bot_column: i64 = db
            .connection()
            .query_row(
                "SELECT COUNT(1) FROM pragma_table_info('revisions') WHERE name = 'rev_bot'",
                [],
                |row| row.get(0),
            )
            .expect("column query should succeed");
        assert_eq!(bot_column, 1);
    }

    #[test]
    fn in_memory_database_is_migrated() {
        let db = PageDb::open_in_memory().expect("in-memory db should open");
        assert_eq!(db.schema_version().expect("schema version should be readable"), 2);
    }
}
