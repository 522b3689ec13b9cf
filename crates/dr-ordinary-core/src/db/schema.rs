//! SQLite schema definition.

/// Key/value settings table. Values are JSON-encoded.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

pub const KEY_EXTENSION_ENABLED: &str = "extension_enabled";
pub const KEY_API_KEY: &str = "letta_api_key";
pub const KEY_AGENT_ID: &str = "letta_agent_id";
