//! The SQLite-backed state store.

use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use vigil_core::{Classification, Digest, FileRecord};

use crate::error::StoreError;
use crate::schema;

/// The result of one atomic upsert against the baseline.
///
/// Carries the classification plus, when a record already existed, the
/// digest it held before this scan — the old half of a change
/// notification's digest pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Upsert {
    /// How the fresh digest compared to the stored one.
    pub classification: Classification,
    /// The previously stored digest, if the path was already known.
    pub previous: Option<Digest>,
}

/// Durable mapping from file path to last-known content digest.
///
/// All operations go through one serialized connection; each upsert runs
/// in its own transaction and is all-or-nothing per path. The handle is
/// explicitly constructed at startup and passed into every component that
/// needs it — there is no ambient global store.
pub struct StateStore {
    /// Serialized connection. Scans are the only writer.
    conn: Mutex<Connection>,
    /// Database file path, `None` for in-memory stores.
    path: Option<Utf8PathBuf>,
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl StateStore {
    /// Opens (or creates) the baseline database at the given path.
    ///
    /// Applies connection pragmas and creates the schema on first open.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Open`] if the file cannot be opened or
    /// initialized.
    pub fn open(path: &Utf8Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_std_path()).map_err(|source| StoreError::Open {
            path: path.to_owned(),
            source,
        })?;
        Self::init(conn, Some(path.to_owned()))
    }

    /// Opens an in-memory store.
    ///
    /// The contents do not survive the process; intended for tests.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Open`] if the in-memory database cannot be
    /// created.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: Utf8PathBuf::from(":memory:"),
            source,
        })?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<Utf8PathBuf>) -> Result<Self, StoreError> {
        schema::apply_pragmas(&conn)?;
        schema::create_schema(&conn)?;

        debug!(path = ?path, "Opened state store");

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Returns the stored record for a path, if present.
    ///
    /// Never fails for a well-formed path that simply is not in the store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sql`] on a query failure or
    /// [`StoreError::CorruptDigest`] if the stored digest does not decode.
    pub fn get(&self, path: &Utf8Path) -> Result<Option<FileRecord>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT digest, last_seen_at FROM files WHERE path = ?1",
        )?;

        let row: Option<(String, i64)> = stmt
            .query_row(params![path.as_str()], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .optional()?;

        match row {
            None => Ok(None),
            Some((hex, last_seen_at)) => {
                let digest = decode_digest(path, &hex)?;
                Ok(Some(FileRecord::new(path.to_owned(), digest, last_seen_at)))
            }
        }
    }

    /// Atomically inserts or compares-and-updates the record for a path.
    ///
    /// - No record: inserts one and classifies the file as
    ///   [`Classification::New`].
    /// - Stored digest equals `digest`: refreshes `last_seen_at` only and
    ///   classifies as [`Classification::Unchanged`].
    /// - Stored digest differs: overwrites it and classifies as
    ///   [`Classification::Changed`], returning the overwritten digest in
    ///   [`Upsert::previous`].
    ///
    /// The whole operation runs in one transaction, so a record is never
    /// observable in a partially updated state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sql`] on a persistence failure (the
    /// transaction rolls back) or [`StoreError::CorruptDigest`] if the
    /// existing digest column does not decode.
    pub fn upsert(
        &self,
        path: &Utf8Path,
        digest: &Digest,
        seen_at: i64,
    ) -> Result<Upsert, StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let existing: Option<String> = tx
            .query_row(
                "SELECT digest FROM files WHERE path = ?1",
                params![path.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        let outcome = match existing {
            None => {
                tx.execute(
                    "INSERT INTO files (path, digest, last_seen_at) VALUES (?1, ?2, ?3)",
                    params![path.as_str(), digest.to_hex(), seen_at],
                )?;
                Upsert {
                    classification: Classification::New,
                    previous: None,
                }
            }
            Some(hex) => {
                let stored = decode_digest(path, &hex)?;
                if stored == *digest {
                    tx.execute(
                        "UPDATE files SET last_seen_at = ?2 WHERE path = ?1",
                        params![path.as_str(), seen_at],
                    )?;
                    Upsert {
                        classification: Classification::Unchanged,
                        previous: Some(stored),
                    }
                } else {
                    tx.execute(
                        "UPDATE files SET digest = ?2, last_seen_at = ?3 WHERE path = ?1",
                        params![path.as_str(), digest.to_hex(), seen_at],
                    )?;
                    Upsert {
                        classification: Classification::Changed,
                        previous: Some(stored),
                    }
                }
            }
        };

        tx.commit()?;
        Ok(outcome)
    }

    /// Enumerates every baseline record, ordered by path.
    ///
    /// Safe to call from a reporting collaborator while a scan is writing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sql`] on a query failure or
    /// [`StoreError::CorruptDigest`] if any stored digest does not decode.
    pub fn all_records(&self) -> Result<Vec<FileRecord>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT path, digest, last_seen_at FROM files ORDER BY path",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (path, hex, last_seen_at) = row?;
            let path = Utf8PathBuf::from(path);
            let digest = decode_digest(&path, &hex)?;
            records.push(FileRecord::new(path, digest, last_seen_at));
        }
        Ok(records)
    }

    /// Returns the number of baseline records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sql`] on a query failure.
    pub fn len(&self) -> Result<u64, StoreError> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Returns `true` if the store holds no records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sql`] on a query failure.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Returns the database file path, `None` for in-memory stores.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8Path> {
        self.path.as_deref()
    }

    /// Closes the store, flushing the connection.
    ///
    /// Dropping the store also closes it; this method surfaces the error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sql`] if the underlying connection fails to
    /// close cleanly.
    pub fn close(self) -> Result<(), StoreError> {
        let conn = self.conn.into_inner();
        conn.close().map_err(|(_conn, source)| StoreError::Sql(source))
    }
}

/// Decodes a stored hex digest column, attributing failures to the path.
fn decode_digest(path: &Utf8Path, hex: &str) -> Result<Digest, StoreError> {
    Digest::parse_hex(hex).map_err(|source| StoreError::CorruptDigest {
        path: path.to_owned(),
        source,
    })
}
