//! SQLite-backed session store.
//!
//! One row per session plus child tables for the interruption log and the
//! activity-interval log. A save replaces the whole record inside a single
//! transaction, so partially written sessions cannot exist on disk.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::error::StoreError;
use crate::session::{ActivityInterval, Interruption, Session, SessionStatus};

use super::SessionStore;

/// SQLite store at `~/.config/deepwork/deepwork.db`.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open the store in the data directory, creating the schema if needed.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let dir = super::data_dir().map_err(|e| StoreError::OpenFailed {
            path: PathBuf::from("~/.config/deepwork"),
            message: e.to_string(),
        })?;
        Self::open_at(dir.join("deepwork.db"))
    }

    /// Open a store at an explicit path.
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| StoreError::OpenFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory store (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::OpenFailed {
            path: PathBuf::from(":memory:"),
            message: e.to_string(),
        })?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    fn connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn migrate(&self) -> Result<(), StoreError> {
        let conn = self.connection()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id                 TEXT PRIMARY KEY,
                title              TEXT NOT NULL,
                goal               TEXT NOT NULL,
                scheduled_duration INTEGER NOT NULL,
                status             TEXT NOT NULL,
                created_at         TEXT NOT NULL,
                start_time         TEXT,
                end_time           TEXT,
                last_transition_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS interruptions (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL REFERENCES sessions(id),
                reason     TEXT NOT NULL,
                pause_time TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS activity_intervals (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL REFERENCES sessions(id),
                started_at TEXT NOT NULL,
                ended_at   TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_created_at ON sessions(created_at);
            CREATE INDEX IF NOT EXISTS idx_interruptions_session ON interruptions(session_id);
            CREATE INDEX IF NOT EXISTS idx_intervals_session ON activity_intervals(session_id);",
        )?;
        Ok(())
    }
}

impl SessionStore for SqliteStore {
    fn save(&self, session: &Session) -> Result<(), StoreError> {
        let mut conn = self.connection()?;
        let tx = conn.transaction().map_err(StoreError::from)?;

        tx.execute(
            "INSERT OR REPLACE INTO sessions
                (id, title, goal, scheduled_duration, status, created_at,
                 start_time, end_time, last_transition_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                session.id().to_string(),
                session.title(),
                session.goal(),
                session.scheduled_duration(),
                session.status().as_str(),
                session.created_at().to_rfc3339(),
                session.start_time().map(|t| t.to_rfc3339()),
                session.end_time().map(|t| t.to_rfc3339()),
                session.last_transition_at().to_rfc3339(),
            ],
        )?;

        let id = session.id().to_string();
        tx.execute("DELETE FROM interruptions WHERE session_id = ?1", [&id])?;
        for interruption in session.interruptions() {
            tx.execute(
                "INSERT INTO interruptions (session_id, reason, pause_time)
                 VALUES (?1, ?2, ?3)",
                params![id, interruption.reason, interruption.pause_time.to_rfc3339()],
            )?;
        }

        tx.execute(
            "DELETE FROM activity_intervals WHERE session_id = ?1",
            [&id],
        )?;
        for interval in session.activity_intervals() {
            tx.execute(
                "INSERT INTO activity_intervals (session_id, started_at, ended_at)
                 VALUES (?1, ?2, ?3)",
                params![
                    id,
                    interval.started_at.to_rfc3339(),
                    interval.ended_at.map(|t| t.to_rfc3339()),
                ],
            )?;
        }

        tx.commit().map_err(StoreError::from)
    }

    fn load_all(&self) -> Result<Vec<Session>, StoreError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT id, title, goal, scheduled_duration, status, created_at,
                    start_time, end_time, last_transition_at
             FROM sessions ORDER BY created_at",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SessionRow {
                id: row.get(0)?,
                title: row.get(1)?,
                goal: row.get(2)?,
                scheduled_duration: row.get(3)?,
                status: row.get(4)?,
                created_at: row.get(5)?,
                start_time: row.get(6)?,
                end_time: row.get(7)?,
                last_transition_at: row.get(8)?,
            })
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            let row = row.map_err(StoreError::from)?;
            sessions.push(decode_session(&conn, row)?);
        }
        Ok(sessions)
    }
}

struct SessionRow {
    id: String,
    title: String,
    goal: String,
    scheduled_duration: u64,
    status: String,
    created_at: String,
    start_time: Option<String>,
    end_time: Option<String>,
    last_transition_at: String,
}

fn decode_session(conn: &Connection, row: SessionRow) -> Result<Session, StoreError> {
    let id = Uuid::parse_str(&row.id).map_err(|e| corrupt(&row.id, e))?;
    let status = SessionStatus::parse(&row.status)
        .ok_or_else(|| corrupt(&row.id, format!("unknown status '{}'", row.status)))?;

    let mut stmt = conn.prepare(
        "SELECT reason, pause_time FROM interruptions
         WHERE session_id = ?1 ORDER BY id",
    )?;
    let interruptions = stmt
        .query_map([&row.id], |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()
        .map_err(StoreError::from)?
        .into_iter()
        .map(|(reason, pause_time)| {
            Ok(Interruption {
                reason,
                pause_time: parse_timestamp(&row.id, &pause_time)?,
            })
        })
        .collect::<Result<Vec<_>, StoreError>>()?;

    let mut stmt = conn.prepare(
        "SELECT started_at, ended_at FROM activity_intervals
         WHERE session_id = ?1 ORDER BY id",
    )?;
    let activity_intervals = stmt
        .query_map([&row.id], |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, Option<String>>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()
        .map_err(StoreError::from)?
        .into_iter()
        .map(|(started_at, ended_at)| {
            Ok(ActivityInterval {
                started_at: parse_timestamp(&row.id, &started_at)?,
                ended_at: ended_at
                    .map(|t| parse_timestamp(&row.id, &t))
                    .transpose()?,
            })
        })
        .collect::<Result<Vec<_>, StoreError>>()?;

    Ok(Session {
        id,
        title: row.title,
        goal: row.goal,
        scheduled_duration: row.scheduled_duration,
        status,
        created_at: parse_timestamp(&row.id, &row.created_at)?,
        start_time: row
            .start_time
            .as_deref()
            .map(|t| parse_timestamp(&row.id, t))
            .transpose()?,
        end_time: row
            .end_time
            .as_deref()
            .map(|t| parse_timestamp(&row.id, t))
            .transpose()?,
        activity_intervals,
        interruptions,
        last_transition_at: parse_timestamp(&row.id, &row.last_transition_at)?,
    })
}

fn parse_timestamp(id: &str, text: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| corrupt(id, e))
}

fn corrupt(id: &str, message: impl ToString) -> StoreError {
    StoreError::Corrupt {
        id: id.to_string(),
        message: message.to_string(),
    }
}
