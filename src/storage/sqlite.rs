use crate::model::{Observation, StorageError};
use crate::utils::parse_datetime;
use chrono::Utc;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, ErrorCode, Row};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

/// Append-only log of price observations, one row per observation.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens the store, creating the schema if needed. A file that is not a
    /// readable database is moved aside and replaced by an empty store.
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db_path = db_path.as_ref();
        match Self::open(db_path) {
            Ok(storage) => Ok(storage),
            Err(StorageError::DatabaseError(e)) if is_corruption(&e) => {
                let moved = quarantine(db_path)?;
                error!(
                    "Store {} is unreadable ({}); moved to {} and starting empty",
                    db_path.display(),
                    e,
                    moved.display()
                );
                Self::open(db_path)
            }
            Err(e) => Err(e),
        }
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Runs raw SQL against the store, for tests that need to damage it.
    #[cfg(test)]
    pub fn execute_raw(&self, sql: &str) -> Result<(), StorageError> {
        Ok(self.conn.execute_batch(sql)?)
    }

    fn open(db_path: &Path) -> Result<Self, StorageError> {
        Self::init(Connection::open(db_path)?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS observations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                url TEXT NOT NULL,
                price REAL NOT NULL
            );
            ",
        )?;

        // Older stores may predate some columns
        Self::migrate_add_column_if_missing(&conn, "observations", "timestamp", "TEXT NOT NULL DEFAULT ''")?;
        Self::migrate_add_column_if_missing(&conn, "observations", "url", "TEXT NOT NULL DEFAULT ''")?;
        Self::migrate_add_column_if_missing(&conn, "observations", "price", "REAL")?;

        conn.execute_batch("CREATE INDEX IF NOT EXISTS idx_observations_url ON observations (url);")?;

        Ok(Self { conn })
    }

    fn migrate_add_column_if_missing(
        conn: &Connection,
        table: &str,
        column: &str,
        column_def: &str,
    ) -> Result<(), StorageError> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
        let existing_columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<_, _>>()?;

        if !existing_columns.iter().any(|c| c == column) {
            warn!("Adding missing column {}.{}", table, column);
            let alter_sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, column_def);
            conn.execute(&alter_sql, [])?;
        }

        Ok(())
    }

    /// Appends one observation as a single atomic insert.
    pub fn append(&self, observation: &Observation) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO observations (timestamp, url, price) VALUES (?1, ?2, ?3)",
            params![
                observation.timestamp.to_rfc3339(),
                &observation.url,
                observation.price,
            ],
        )?;
        debug!("Saved price {} for URL {}", observation.price, observation.url);
        Ok(())
    }

    /// Appends several observations in one transaction.
    pub fn append_all(&mut self, observations: &[Observation]) -> Result<usize, StorageError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare("INSERT INTO observations (timestamp, url, price) VALUES (?1, ?2, ?3)")?;
            for o in observations {
                stmt.execute(params![o.timestamp.to_rfc3339(), &o.url, o.price])?;
            }
        }
        tx.commit()?;
        Ok(observations.len())
    }

    /// All valid observations for `url`, oldest first.
    pub fn history(&self, url: &str) -> Result<Vec<Observation>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT timestamp, url, price FROM observations WHERE url = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![url], Self::map_observation)?;
        Self::collect_sorted(rows)
    }

    /// The whole log, oldest first.
    pub fn all(&self) -> Result<Vec<Observation>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT timestamp, url, price FROM observations ORDER BY id")?;
        let rows = stmt.query_map([], Self::map_observation)?;
        Self::collect_sorted(rows)
    }

    /// Number of valid observations for `url`. Goes through `history` so the
    /// count always agrees with it: timestamp validity is decided by
    /// `parse_datetime`, which SQL cannot express.
    pub fn count(&self, url: &str) -> Result<usize, StorageError> {
        Ok(self.history(url)?.len())
    }

    /// Distinct addresses that have at least one row.
    pub fn tracked_urls(&self) -> Result<Vec<String>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT url FROM observations ORDER BY url ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn collect_sorted(
        rows: impl Iterator<Item = rusqlite::Result<Option<Observation>>>,
    ) -> Result<Vec<Observation>, StorageError> {
        let mut observations = Vec::new();
        let mut dropped = 0usize;
        for row in rows {
            match row? {
                Some(o) => observations.push(o),
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            warn!("Dropped {} malformed observation rows", dropped);
        }
        // Insertion order is not guaranteed to be chronological
        observations.sort_by_key(|o| o.timestamp);
        Ok(observations)
    }

    /// Maps a row, yielding `None` when the timestamp or price cannot be read.
    fn map_observation(row: &Row) -> Result<Option<Observation>, rusqlite::Error> {
        let timestamp = match row.get_ref(0)? {
            ValueRef::Text(bytes) => std::str::from_utf8(bytes).ok().and_then(parse_datetime),
            _ => None,
        };
        let price = match row.get_ref(2)? {
            ValueRef::Real(p) => Some(p),
            ValueRef::Integer(p) => Some(p as f64),
            ValueRef::Text(bytes) => std::str::from_utf8(bytes).ok().and_then(|s| s.trim().parse::<f64>().ok()),
            _ => None,
        }
        .filter(|p| p.is_finite() && *p >= 0.0);

        let (Some(timestamp), Some(price)) = (timestamp, price) else {
            return Ok(None);
        };
        Ok(Some(Observation {
            timestamp,
            url: row.get(1)?,
            price,
        }))
    }
}

fn is_corruption(e: &rusqlite::Error) -> bool {
    matches!(
        e.sqlite_error_code(),
        Some(ErrorCode::NotADatabase) | Some(ErrorCode::DatabaseCorrupt)
    )
}

fn quarantine(db_path: &Path) -> Result<PathBuf, StorageError> {
    let mut target = db_path.as_os_str().to_owned();
    target.push(format!(".corrupt-{}", Utc::now().timestamp()));
    let target = PathBuf::from(target);
    fs::rename(db_path, &target)?;
    Ok(target)
}
