use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::model::{PredictionInput, PredictionResult};
use crate::weather::WeatherData;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: String,
}

/// Everything needed to persist one finished prediction.
#[derive(Debug, Clone, Copy)]
pub struct NewPrediction<'a> {
    pub user_id: Option<i64>,
    pub input: &'a PredictionInput,
    pub result: &'a PredictionResult,
    pub weather: Option<&'a WeatherData>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredPrediction {
    pub id: i64,
    pub user_id: Option<i64>,
    pub team_a: String,
    pub team_b: String,
    pub match_format: String,
    pub gender: String,
    pub match_date: String,
    pub stadium: String,
    pub team_a_score: Option<u32>,
    pub prediction_mode: String,
    pub team_a_win_percentage: u8,
    pub team_b_win_percentage: u8,
    pub result_json: String,
    pub weather_json: Option<String>,
    pub created_at: String,
}

impl StoredPrediction {
    pub fn result(&self) -> Result<PredictionResult> {
        serde_json::from_str(&self.result_json)
            .with_context(|| format!("decode stored prediction {}", self.id))
    }

    pub fn weather(&self) -> Result<Option<WeatherData>> {
        self.weather_json
            .as_deref()
            .map(|raw| {
                serde_json::from_str(raw)
                    .with_context(|| format!("decode weather of prediction {}", self.id))
            })
            .transpose()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: i64,
    pub user_id: i64,
    pub content: String,
    pub from_admin: bool,
    pub read: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub token: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub created_at: String,
}

/// Fixed-width RFC 3339 so stored timestamps sort lexically.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn now() -> String {
    timestamp(Utc::now())
}

/// SQLite-backed users, predictions, messages and sessions.
#[derive(Debug)]
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let conn =
            Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn create_user(&self, username: &str, password_hash: &str, is_admin: bool) -> Result<User> {
        let created_at = now();
        self.conn
            .execute(
                "INSERT INTO users (username, password_hash, is_admin, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![username, password_hash, is_admin as i64, created_at],
            )
            .with_context(|| format!("insert user {username}"))?;
        Ok(User {
            id: self.conn.last_insert_rowid(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            is_admin,
            created_at,
        })
    }

    pub fn user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.conn
            .query_row(
                "SELECT id, username, password_hash, is_admin, created_at FROM users WHERE id = ?1",
                params![id],
                user_from_row,
            )
            .optional()
            .context("query user by id")
    }

    /// Case-insensitive lookup.
    pub fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.conn
            .query_row(
                "SELECT id, username, password_hash, is_admin, created_at FROM users WHERE username = ?1 COLLATE NOCASE",
                params![username.trim()],
                user_from_row,
            )
            .optional()
            .context("query user by username")
    }

    pub fn all_users(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, username, password_hash, is_admin, created_at FROM users ORDER BY id ASC")
            .context("prepare users query")?;
        let rows = stmt.query_map([], user_from_row).context("query users")?;
        collect(rows, "decode user row")
    }

    pub fn user_count(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .context("count users")
    }

    pub fn create_prediction(&self, new: NewPrediction<'_>) -> Result<StoredPrediction> {
        let input = new.input;
        let result_json = serde_json::to_string(new.result).context("serialize prediction")?;
        let weather_json = new
            .weather
            .map(serde_json::to_string)
            .transpose()
            .context("serialize weather")?;
        let created_at = now();
        self.conn
            .execute(
                r#"
                INSERT INTO predictions (
                    user_id, team_a, team_b, match_format, gender, match_date, stadium,
                    team_a_score, prediction_mode, team_a_win_percentage, team_b_win_percentage,
                    prediction_data, weather_data, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                "#,
                params![
                    new.user_id,
                    input.team_a,
                    input.team_b,
                    input.match_format.label(),
                    input.gender.label(),
                    input.match_date.to_string(),
                    input.stadium,
                    input.team_a_score,
                    input.prediction_mode.key(),
                    new.result.team_a_win_percentage,
                    new.result.team_b_win_percentage,
                    result_json,
                    weather_json,
                    created_at,
                ],
            )
            .context("insert prediction")?;
        let id = self.conn.last_insert_rowid();
        self.prediction(id)?
            .ok_or_else(|| anyhow!("prediction {id} missing after insert"))
    }

    pub fn prediction(&self, id: i64) -> Result<Option<StoredPrediction>> {
        self.conn
            .query_row(
                &format!("{PREDICTION_SELECT} WHERE id = ?1"),
                params![id],
                prediction_from_row,
            )
            .optional()
            .context("query prediction")
    }

    /// Newest first.
    pub fn user_predictions(&self, user_id: i64) -> Result<Vec<StoredPrediction>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "{PREDICTION_SELECT} WHERE user_id = ?1 ORDER BY created_at DESC, id DESC"
            ))
            .context("prepare user predictions query")?;
        let rows = stmt
            .query_map(params![user_id], prediction_from_row)
            .context("query user predictions")?;
        collect(rows, "decode prediction row")
    }

    /// Newest first.
    pub fn all_predictions(&self) -> Result<Vec<StoredPrediction>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PREDICTION_SELECT} ORDER BY created_at DESC, id DESC"))
            .context("prepare predictions query")?;
        let rows = stmt
            .query_map([], prediction_from_row)
            .context("query predictions")?;
        collect(rows, "decode prediction row")
    }

    pub fn create_message(&self, user_id: i64, content: &str, from_admin: bool) -> Result<Message> {
        let created_at = now();
        self.conn
            .execute(
                "INSERT INTO messages (user_id, content, from_admin, read, created_at) VALUES (?1, ?2, ?3, 0, ?4)",
                params![user_id, content, from_admin as i64, created_at],
            )
            .context("insert message")?;
        Ok(Message {
            id: self.conn.last_insert_rowid(),
            user_id,
            content: content.to_string(),
            from_admin,
            read: false,
            created_at,
        })
    }

    pub fn message(&self, id: i64) -> Result<Option<Message>> {
        self.conn
            .query_row(
                &format!("{MESSAGE_SELECT} WHERE id = ?1"),
                params![id],
                message_from_row,
            )
            .optional()
            .context("query message")
    }

    /// Conversation with one user, oldest first.
    pub fn user_messages(&self, user_id: i64) -> Result<Vec<Message>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "{MESSAGE_SELECT} WHERE user_id = ?1 ORDER BY created_at ASC, id ASC"
            ))
            .context("prepare user messages query")?;
        let rows = stmt
            .query_map(params![user_id], message_from_row)
            .context("query user messages")?;
        collect(rows, "decode message row")
    }

    /// Newest first.
    pub fn all_messages(&self) -> Result<Vec<Message>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MESSAGE_SELECT} ORDER BY created_at DESC, id DESC"))
            .context("prepare messages query")?;
        let rows = stmt.query_map([], message_from_row).context("query messages")?;
        collect(rows, "decode message row")
    }

    /// Returns whether a message with `id` existed.
    pub fn mark_message_read(&self, id: i64) -> Result<bool> {
        let changed = self
            .conn
            .execute("UPDATE messages SET read = 1 WHERE id = ?1", params![id])
            .context("mark message read")?;
        Ok(changed > 0)
    }

    pub fn create_session(&self, token: &str, user_id: i64, expires_at: DateTime<Utc>) -> Result<SessionRecord> {
        let created_at = now();
        self.conn
            .execute(
                "INSERT INTO sessions (token, user_id, expires_at, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![token, user_id, timestamp(expires_at), created_at],
            )
            .context("insert session")?;
        Ok(SessionRecord {
            token: token.to_string(),
            user_id,
            expires_at,
            created_at,
        })
    }

    pub fn session(&self, token: &str) -> Result<Option<SessionRecord>> {
        let raw = self
            .conn
            .query_row(
                "SELECT token, user_id, expires_at, created_at FROM sessions WHERE token = ?1",
                params![token],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()
            .context("query session")?;
        let Some((token, user_id, expires_at, created_at)) = raw else {
            return Ok(None);
        };
        let expires_at = DateTime::parse_from_rfc3339(&expires_at)
            .with_context(|| format!("parse session expiry {expires_at}"))?
            .with_timezone(&Utc);
        Ok(Some(SessionRecord {
            token,
            user_id,
            expires_at,
            created_at,
        }))
    }

    pub fn delete_session(&self, token: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM sessions WHERE token = ?1", params![token])
            .context("delete session")?;
        Ok(changed > 0)
    }

    /// Removes sessions that expired before `now`; returns how many.
    pub fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
        self.conn
            .execute(
                "DELETE FROM sessions WHERE expires_at <= ?1",
                params![timestamp(now)],
            )
            .context("purge expired sessions")
    }
}

const PREDICTION_SELECT: &str = r#"
    SELECT
        id, user_id, team_a, team_b, match_format, gender, match_date, stadium,
        team_a_score, prediction_mode, team_a_win_percentage, team_b_win_percentage,
        prediction_data, weather_data, created_at
    FROM predictions
"#;

const MESSAGE_SELECT: &str =
    "SELECT id, user_id, content, from_admin, read, created_at FROM messages";

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE COLLATE NOCASE,
            password_hash TEXT NOT NULL,
            is_admin INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS predictions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NULL REFERENCES users(id),
            team_a TEXT NOT NULL,
            team_b TEXT NOT NULL,
            match_format TEXT NOT NULL,
            gender TEXT NOT NULL,
            match_date TEXT NOT NULL,
            stadium TEXT NOT NULL,
            team_a_score INTEGER NULL,
            prediction_mode TEXT NOT NULL,
            team_a_win_percentage INTEGER NOT NULL,
            team_b_win_percentage INTEGER NOT NULL,
            prediction_data TEXT NOT NULL,
            weather_data TEXT NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_predictions_user ON predictions(user_id);
        CREATE TABLE IF NOT EXISTS messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id),
            content TEXT NOT NULL,
            from_admin INTEGER NOT NULL DEFAULT 0,
            read INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_messages_user ON messages(user_id);
        CREATE TABLE IF NOT EXISTS sessions (
            token TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id),
            expires_at TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .context("init sqlite schema")?;
    Ok(())
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        is_admin: row.get::<_, i64>(3)? != 0,
        created_at: row.get(4)?,
    })
}

fn prediction_from_row(row: &Row<'_>) -> rusqlite::Result<StoredPrediction> {
    Ok(StoredPrediction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        team_a: row.get(2)?,
        team_b: row.get(3)?,
        match_format: row.get(4)?,
        gender: row.get(5)?,
        match_date: row.get(6)?,
        stadium: row.get(7)?,
        team_a_score: row.get(8)?,
        prediction_mode: row.get(9)?,
        team_a_win_percentage: row.get(10)?,
        team_b_win_percentage: row.get(11)?,
        result_json: row.get(12)?,
        weather_json: row.get(13)?,
        created_at: row.get(14)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        user_id: row.get(1)?,
        content: row.get(2)?,
        from_admin: row.get::<_, i64>(3)? != 0,
        read: row.get::<_, i64>(4)? != 0,
        created_at: row.get(5)?,
    })
}

fn collect<T>(
    rows: impl Iterator<Item = rusqlite::Result<T>>,
    what: &'static str,
) -> Result<Vec<T>> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context(what)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn usernames_are_case_insensitive() {
        let store = Store::open_in_memory().unwrap();
        store.create_user("Alice", "hash", false).unwrap();
        assert!(store.user_by_username("alice").unwrap().is_some());
        assert!(store.create_user("ALICE", "hash", false).is_err());
    }

    #[test]
    fn expired_sessions_are_purged() {
        let store = Store::open_in_memory().unwrap();
        let user = store.create_user("bob", "hash", false).unwrap();
        let now = Utc::now();
        store
            .create_session("old", user.id, now - Duration::hours(1))
            .unwrap();
        store
            .create_session("new", user.id, now + Duration::hours(1))
            .unwrap();
        assert_eq!(store.purge_expired_sessions(now).unwrap(), 1);
        assert!(store.session("old").unwrap().is_none());
        assert!(store.session("new").unwrap().is_some());
    }
}
