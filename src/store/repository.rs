//! Repository over the two persisted entities: users and daily log entries.
//!
//! Every logical operation runs inside a single transaction via
//! [`Store::with_tx`]; a handler either commits all of its writes or none of
//! them, including when the transport request is dropped mid-flight.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, TransactionBehavior};

use crate::error::Error;

/// A chat participant, created lazily on first contact.
#[derive(Clone, Debug)]
pub struct User {
    pub id: String,
    pub chat_id: i64,
    pub tz: String,
    pub created_at: i64,
}

/// One `/log` entry. Entries are only ever appended and counted.
#[derive(Clone, Debug)]
pub struct LogEntry {
    pub id: String,
    pub user_id: String,
    pub log_date: NaiveDate,
    pub text_log: String,
    pub created_at: i64,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    chat_id INTEGER NOT NULL UNIQUE,
    tz TEXT NOT NULL DEFAULT 'UTC',
    created_at INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS daily_logs (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id),
    log_date TEXT NOT NULL,
    text_log TEXT NOT NULL,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_daily_logs_user ON daily_logs(user_id, created_at);
"#;

/// Handle on the SQLite database. Cheap to clone; each operation opens its
/// own connection, so no connection is shared across concurrent updates.
#[derive(Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    /// Open the store, creating the database file and schema if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };
        let conn = store.connect()?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| Error::Store(format!("sqlite init: {}", e)))?;
        tracing::debug!("Opened store at {}", store.path.display());
        Ok(store)
    }

    fn connect(&self) -> Result<Connection, Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&self.path)
            .map_err(|e| Error::Store(format!("sqlite open: {}", e)))?;
        // Writers queue behind the busy timeout instead of failing outright.
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| Error::Store(format!("sqlite busy timeout: {}", e)))?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| Error::Store(format!("sqlite pragma: {}", e)))?;
        Ok(conn)
    }

    /// Run one logical operation in its own transaction.
    ///
    /// Commits on `Ok`, rolls back on `Err` or if the closure's work is
    /// abandoned. IMMEDIATE behavior takes the write lock up front, so two
    /// updates for the same chat serialize instead of deadlocking mid-read.
    pub fn with_tx<T, F>(&self, f: F) -> Result<T, Error>
    where
        F: FnOnce(&Repo<'_>) -> Result<T, Error>,
    {
        let mut conn = self.connect()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| Error::Store(format!("sqlite begin: {}", e)))?;
        let result = f(&Repo { conn: &tx });
        match result {
            Ok(value) => {
                tx.commit()
                    .map_err(|e| Error::Store(format!("sqlite commit: {}", e)))?;
                Ok(value)
            }
            // Dropping the transaction rolls it back.
            Err(e) => Err(e),
        }
    }
}

/// Transaction-scoped repository operations.
pub struct Repo<'a> {
    conn: &'a Connection,
}

impl Repo<'_> {
    /// Look up a user by Telegram chat id.
    pub fn find_user_by_chat_id(&self, chat_id: i64) -> Result<Option<User>, Error> {
        match self.conn.query_row(
            "SELECT id, chat_id, tz, created_at FROM users WHERE chat_id = ?1",
            params![chat_id],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    chat_id: row.get(1)?,
                    tz: row.get(2)?,
                    created_at: row.get(3)?,
                })
            },
        ) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::Store(format!("sqlite user lookup: {}", e))),
        }
    }

    /// Insert a new user for the chat id.
    ///
    /// Returns `Error::Conflict` if a concurrent insert got there first; the
    /// caller re-fetches instead of surfacing the race.
    pub fn create_user(&self, chat_id: i64) -> Result<User, Error> {
        let user = User {
            id: ulid::Ulid::new().to_string(),
            chat_id,
            tz: "UTC".to_string(),
            created_at: Utc::now().timestamp_millis(),
        };
        self.conn
            .execute(
                "INSERT INTO users (id, chat_id, tz, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![user.id, user.chat_id, user.tz, user.created_at],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(err, _)
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Error::Conflict(format!("user already exists for chat {}", chat_id))
                }
                other => Error::Store(format!("sqlite insert user: {}", other)),
            })?;
        Ok(user)
    }

    /// Count log entries for a user.
    pub fn count_log_entries(&self, user_id: &str) -> Result<u64, Error> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM daily_logs WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .map_err(|e| Error::Store(format!("sqlite count logs: {}", e)))?;
        Ok(count as u64)
    }

    /// Append a log entry dated today (UTC).
    pub fn append_log_entry(&self, user_id: &str, text: &str) -> Result<LogEntry, Error> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::Validation("log text must not be empty".to_string()));
        }
        let entry = LogEntry {
            id: ulid::Ulid::new().to_string(),
            user_id: user_id.to_string(),
            log_date: Utc::now().date_naive(),
            text_log: text.to_string(),
            created_at: Utc::now().timestamp_millis(),
        };
        self.conn
            .execute(
                "INSERT INTO daily_logs (id, user_id, log_date, text_log, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    entry.id,
                    entry.user_id,
                    entry.log_date.to_string(),
                    entry.text_log,
                    entry.created_at
                ],
            )
            .map_err(|e| Error::Store(format!("sqlite insert log: {}", e)))?;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path().join("coach.db")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_create_and_find_user() {
        let (_dir, store) = test_store();

        let created = store.with_tx(|repo| repo.create_user(111)).unwrap();
        assert_eq!(created.chat_id, 111);
        assert_eq!(created.tz, "UTC");

        let found = store
            .with_tx(|repo| repo.find_user_by_chat_id(111))
            .unwrap()
            .unwrap();
        assert_eq!(found.id, created.id);

        let missing = store.with_tx(|repo| repo.find_user_by_chat_id(999)).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_duplicate_user_is_conflict() {
        let (_dir, store) = test_store();

        store.with_tx(|repo| repo.create_user(111)).unwrap();
        let err = store.with_tx(|repo| repo.create_user(111)).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn test_append_and_count() {
        let (_dir, store) = test_store();

        let user = store.with_tx(|repo| repo.create_user(111)).unwrap();
        assert_eq!(
            store.with_tx(|repo| repo.count_log_entries(&user.id)).unwrap(),
            0
        );

        let entry = store
            .with_tx(|repo| repo.append_log_entry(&user.id, "2 eggs + dal"))
            .unwrap();
        assert_eq!(entry.text_log, "2 eggs + dal");
        assert_eq!(
            store.with_tx(|repo| repo.count_log_entries(&user.id)).unwrap(),
            1
        );
    }

    #[test]
    fn test_empty_log_text_rejected() {
        let (_dir, store) = test_store();

        let user = store.with_tx(|repo| repo.create_user(111)).unwrap();
        let err = store
            .with_tx(|repo| repo.append_log_entry(&user.id, "   "))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(
            store.with_tx(|repo| repo.count_log_entries(&user.id)).unwrap(),
            0
        );
    }

    #[test]
    fn test_failed_operation_rolls_back() {
        let (_dir, store) = test_store();

        let result: Result<(), Error> = store.with_tx(|repo| {
            repo.create_user(111)?;
            Err(Error::Validation("boom".to_string()))
        });
        assert!(result.is_err());

        // The insert must not have survived the rollback.
        let found = store.with_tx(|repo| repo.find_user_by_chat_id(111)).unwrap();
        assert!(found.is_none());
    }
}
