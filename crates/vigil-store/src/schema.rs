//! Schema creation and connection pragmas.

use rusqlite::Connection;

/// Applies connection pragmas before any statement runs.
///
/// WAL keeps readers unblocked while a scan writes; NORMAL synchronous is
/// durable enough under WAL; the busy timeout covers contention from an
/// external reporting process opening the same file.
pub(crate) fn apply_pragmas(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = 5000;",
    )
}

/// Creates the baseline table if it does not exist.
///
/// One row per monitored path. The digest column holds 64 hex characters,
/// matching the rendered form of a 256-bit content digest.
pub(crate) fn create_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS files (
             path         TEXT PRIMARY KEY NOT NULL,
             digest       TEXT NOT NULL,
             last_seen_at INTEGER NOT NULL
         );",
    )
}
