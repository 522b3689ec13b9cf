//! Settings database operations.

use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{Database, DbError, DbResult, KEY_AGENT_ID, KEY_API_KEY, KEY_EXTENSION_ENABLED};

impl Database {
    /// Read a JSON-encoded setting.
    pub fn get_setting<T: DeserializeOwned>(&self, key: &str) -> DbResult<Option<T>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?",
                [key],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Insert or replace a JSON-encoded setting.
    pub fn set_setting<T: Serialize>(&self, key: &str, value: &T) -> DbResult<()> {
        let json = serde_json::to_string(value)?;
        self.conn.execute(
            r#"
            INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, json],
        )?;
        Ok(())
    }

    /// Remove a setting. Returns whether it existed.
    pub fn delete_setting(&self, key: &str) -> DbResult<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM settings WHERE key = ?", [key])?;
        Ok(rows > 0)
    }

    /// Whether highlighting is enabled. Defaults to true when never saved.
    pub fn extension_enabled(&self) -> DbResult<bool> {
        Ok(self
            .get_setting::<bool>(KEY_EXTENSION_ENABLED)?
            .unwrap_or(true))
    }

    pub fn set_extension_enabled(&self, enabled: bool) -> DbResult<()> {
        self.set_setting(KEY_EXTENSION_ENABLED, &enabled)
    }

    pub fn api_key(&self) -> DbResult<Option<String>> {
        self.get_setting(KEY_API_KEY)
    }

    /// Save the agent API key. Empty keys are rejected.
    pub fn set_api_key(&self, api_key: &str) -> DbResult<()> {
        let trimmed = api_key.trim();
        if trimmed.is_empty() {
            return Err(DbError::Constraint("API key must not be empty".into()));
        }
        self.set_setting(KEY_API_KEY, &trimmed)
    }

    pub fn agent_id(&self) -> DbResult<Option<String>> {
        self.get_setting(KEY_AGENT_ID)
    }

    pub fn set_agent_id(&self, agent_id: &str) -> DbResult<()> {
        let trimmed = agent_id.trim();
        if trimmed.is_empty() {
            return Err(DbError::Constraint("Agent id must not be empty".into()));
        }
        self.set_setting(KEY_AGENT_ID, &trimmed)
    }
}
