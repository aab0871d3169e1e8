use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (credentials, links)");
        conn.execute_batch(
            "
            CREATE TABLE credentials (
                username        TEXT PRIMARY KEY,
                password_hash   TEXT NOT NULL,
                hash_version    TEXT NOT NULL,
                user_hash       TEXT NOT NULL UNIQUE,
                created_at      TEXT NOT NULL,
                last_login      TEXT
            );

            CREATE TABLE links (
                user_hash       TEXT NOT NULL REFERENCES credentials(user_hash),
                id              TEXT NOT NULL,
                url             TEXT NOT NULL,
                title           TEXT NOT NULL,
                category        TEXT NOT NULL DEFAULT 'general',
                domain          TEXT NOT NULL,
                date_added      TEXT NOT NULL,
                is_read         INTEGER NOT NULL DEFAULT 0,
                is_favorite     INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (user_hash, id)
            );

            CREATE INDEX idx_links_user_date ON links(user_hash, date_added);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (documents)");
        conn.execute_batch(
            "
            CREATE TABLE documents (
                name        TEXT PRIMARY KEY,
                version     INTEGER NOT NULL,
                body        TEXT NOT NULL,
                updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            INSERT INTO schema_version (version) VALUES (2);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
