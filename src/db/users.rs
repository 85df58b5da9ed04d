use rusqlite::OptionalExtension;
use crate::errors::{sql_err, HexstrikeError};
use crate::models::{NewUser, Session, User};
use super::codec;
use super::connection::{format_timestamp, now};
use super::Database;

const USER_COLUMNS: &str = "id, username, email, password_hash, role, is_active, preferences, \
                            created_at, updated_at, last_login";
const SESSION_COLUMNS: &str =
    "id, user_id, session_token, ip_address, user_agent, created_at, expires_at, is_active";

impl Database {
    /// Create a user. Fails with `Constraint` if the username is taken.
    pub fn create_user(&self, user: &NewUser) -> Result<i64, HexstrikeError> {
        if user.username.trim().is_empty() {
            return Err(HexstrikeError::InvalidInput("Username is required".into()));
        }
        self.with_tx(|tx| {
            let ts = now();
            tx.execute(
                "INSERT INTO users (username, email, password_hash, role, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                rusqlite::params![
                    user.username,
                    user.email,
                    user.password_hash,
                    user.role.as_deref().unwrap_or("user"),
                    ts
                ],
            )
            .map_err(sql_err("Failed to create user"))?;
            Ok(tx.last_insert_rowid())
        })
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>, HexstrikeError> {
        self.with_tx(|tx| {
            tx.query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                rusqlite::params![id],
                read_user_row,
            )
            .optional()
            .map_err(sql_err("Failed to read user"))
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>, HexstrikeError> {
        self.with_tx(|tx| {
            tx.query_row(
                &format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS),
                rusqlite::params![username],
                read_user_row,
            )
            .optional()
            .map_err(sql_err("Failed to read user"))
        })
    }

    pub fn update_user_preferences(
        &self,
        id: i64,
        preferences: &serde_json::Value,
    ) -> Result<bool, HexstrikeError> {
        self.with_tx(|tx| {
            let affected = tx
                .execute(
                    "UPDATE users SET preferences = ?2, updated_at = ?3 WHERE id = ?1",
                    rusqlite::params![id, codec::json_text(Some(preferences)), now()],
                )
                .map_err(sql_err("Failed to update preferences"))?;
            Ok(affected > 0)
        })
    }

    pub fn record_login(&self, id: i64) -> Result<bool, HexstrikeError> {
        self.with_tx(|tx| {
            let affected = tx
                .execute(
                    "UPDATE users SET last_login = ?2 WHERE id = ?1",
                    rusqlite::params![id, now()],
                )
                .map_err(sql_err("Failed to record login"))?;
            Ok(affected > 0)
        })
    }

    /// Open a session for `user_id` valid for `ttl`, returning it with a fresh
    /// random token.
    pub fn create_session(
        &self,
        user_id: i64,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
        ttl: chrono::Duration,
    ) -> Result<Session, HexstrikeError> {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let created = chrono::Utc::now();
        let expires = created.checked_add_signed(ttl).ok_or_else(|| {
            HexstrikeError::InvalidInput(format!("Session lifetime {} is out of range", ttl))
        })?;
        let created_at = format_timestamp(created);
        let expires_at = format_timestamp(expires);

        let id = self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO sessions
                    (user_id, session_token, ip_address, user_agent,
                     created_at, expires_at, is_active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)",
                rusqlite::params![user_id, token, ip_address, user_agent, created_at, expires_at],
            )
            .map_err(sql_err("Failed to create session"))?;
            Ok(tx.last_insert_rowid())
        })?;

        Ok(Session {
            id,
            user_id: Some(user_id),
            session_token: token,
            ip_address: ip_address.map(str::to_string),
            user_agent: user_agent.map(str::to_string),
            created_at,
            expires_at: Some(expires_at),
            is_active: true,
        })
    }

    /// The session for `token` if it is active and not yet expired.
    pub fn get_active_session(&self, token: &str) -> Result<Option<Session>, HexstrikeError> {
        self.with_tx(|tx| {
            tx.query_row(
                &format!(
                    "SELECT {} FROM sessions WHERE session_token = ?1 AND is_active = 1
                     AND (expires_at IS NULL OR julianday(expires_at) > julianday(?2))",
                    SESSION_COLUMNS
                ),
                rusqlite::params![token, now()],
                read_session_row,
            )
            .optional()
            .map_err(sql_err("Failed to read session"))
        })
    }

    pub fn invalidate_session(&self, token: &str) -> Result<bool, HexstrikeError> {
        self.with_tx(|tx| {
            let affected = tx
                .execute(
                    "UPDATE sessions SET is_active = 0 WHERE session_token = ?1 AND is_active = 1",
                    rusqlite::params![token],
                )
                .map_err(sql_err("Failed to invalidate session"))?;
            Ok(affected > 0)
        })
    }

    /// Deactivate every open session of a user; returns how many were closed.
    pub fn invalidate_user_sessions(&self, user_id: i64) -> Result<usize, HexstrikeError> {
        self.with_tx(|tx| {
            tx.execute(
                "UPDATE sessions SET is_active = 0 WHERE user_id = ?1 AND is_active = 1",
                rusqlite::params![user_id],
            )
            .map_err(sql_err("Failed to invalidate sessions"))
        })
    }
}

fn read_user_row(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: row.get::<_, Option<String>>(4)?.unwrap_or_else(|| "user".to_string()),
        is_active: row.get::<_, Option<bool>>(5)?.unwrap_or(true),
        preferences: codec::json_or_empty(row.get(6)?),
        created_at: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
        updated_at: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
        last_login: row.get(9)?,
    })
}

fn read_session_row(row: &rusqlite::Row) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        user_id: row.get(1)?,
        session_token: row.get(2)?,
        ip_address: row.get(3)?,
        user_agent: row.get(4)?,
        created_at: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        expires_at: row.get(6)?,
        is_active: row.get::<_, Option<bool>>(7)?.unwrap_or(true),
    })
}
