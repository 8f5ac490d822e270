use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub const SCHEMA_VERSION: i64 = 1;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                is_active   INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- short_name is expected to be unique but is not enforced
            CREATE TABLE versions (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                short_name          TEXT NOT NULL,
                full_name           TEXT NOT NULL,
                publisher_name      TEXT NOT NULL,
                permission_to_quote TEXT NOT NULL,
                copyright           TEXT NOT NULL
            );

            CREATE INDEX idx_versions_full_name ON versions(full_name);

            CREATE TABLE scripture_references (
                id       INTEGER PRIMARY KEY AUTOINCREMENT,
                chapter  INTEGER NOT NULL,
                verse    INTEGER NOT NULL
            );

            CREATE INDEX idx_references_position
                ON scripture_references(chapter, verse);

            CREATE TABLE verses (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                reference_id  INTEGER NOT NULL REFERENCES scripture_references(id),
                version_id    INTEGER NOT NULL REFERENCES versions(id),
                scripture     TEXT NOT NULL
            );

            CREATE INDEX idx_verses_lookup ON verses(reference_id, version_id);

            CREATE TABLE passages (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                version_id  INTEGER NOT NULL REFERENCES versions(id)
            );

            CREATE TABLE passage_references (
                passage_id    INTEGER NOT NULL REFERENCES passages(id) ON DELETE CASCADE,
                reference_id  INTEGER NOT NULL REFERENCES scripture_references(id),
                PRIMARY KEY (passage_id, reference_id)
            );

            CREATE TABLE user_profiles (
                user_id             TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
                default_version_id  INTEGER NOT NULL REFERENCES versions(id),
                show_references     INTEGER NOT NULL DEFAULT 1,
                activation_key      TEXT NOT NULL,
                key_expires         TEXT NOT NULL
            );

            CREATE INDEX idx_profiles_key_expires ON user_profiles(key_expires);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete (schema v{})", SCHEMA_VERSION);
    Ok(())
}
