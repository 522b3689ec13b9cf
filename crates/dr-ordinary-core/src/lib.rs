//! Dr. Ordinary Core Library
//!
//! Drug-name highlighting on web pages with an interaction side panel, plus
//! the prediction route of the Dr. Strange companion app.
//!
//! # Architecture
//!
//! ```text
//! Page HTML → Document ──▶ page text ──▶ WordSetProvider (agent / keywords)
//!                │                               │
//!                │                            WordSet
//!                │                               │
//!                └──────────▶ Highlighter ◀──────┘
//!                                 │
//!                     markers (data-dr-ordinary-marker)
//!                                 │ click
//!                                 ▼
//!                  SidePanel ◀── InteractionLookup (table / runtime bridge)
//!                 (generation-checked apply)
//!
//!  Selection ─▶ context menu ─▶ companion URL ─▶ /api/predict ─▶ PredictionBackend
//! ```
//!
//! # Core Principle
//!
//! **Highlighting is best-effort.** Acquisition failures highlight nothing,
//! per-match failures are skipped, and the page is otherwise left intact.
//!
//! # Modules
//!
//! - [`dom`]: Arena document with HTML parsing and serialization
//! - [`highlight`]: Word sets, match pattern, text-node walk, marker wrapping
//! - [`panel`]: Side panel state machine and rendering
//! - [`interactions`]: Interaction records, built-in table, drug reference data
//! - [`content`]: Content-script pipeline over a page
//! - [`background`]: Runtime message protocol and worker
//! - [`context_menu`]: Companion-app link for selected text
//! - [`predict`]: Companion prediction route
//! - [`db`]: SQLite settings store
//! - [`config`]: Agent, scan and app configuration

pub mod background;
pub mod config;
pub mod content;
pub mod context_menu;
pub mod db;
pub mod dom;
pub mod highlight;
pub mod interactions;
pub mod panel;
pub mod predict;

// Re-export commonly used types
pub use config::{AgentConfig, AppConfig, ScanConfig};
pub use content::{
    AcquisitionError, AcquisitionResult, ContentScript, Page, ScanReport, ToggleSource,
    WordSetProvider,
};
pub use db::Database;
pub use dom::Document;
pub use highlight::{HighlightOutcome, Highlighter, WordSet};
pub use interactions::{
    InteractionKind, InteractionLookup, InteractionRecord, InteractionTable, Severity,
};
pub use panel::SidePanel;

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use tracing::info;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum DrOrdinaryError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Document error: {0}")]
    DocumentError(String),
}

impl From<db::DbError> for DrOrdinaryError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::Constraint(message) => DrOrdinaryError::InvalidInput(message),
            other => DrOrdinaryError::DatabaseError(other.to_string()),
        }
    }
}

impl From<highlight::HighlightError> for DrOrdinaryError {
    fn from(e: highlight::HighlightError) -> Self {
        DrOrdinaryError::InvalidInput(e.to_string())
    }
}

impl From<config::ConfigError> for DrOrdinaryError {
    fn from(e: config::ConfigError) -> Self {
        DrOrdinaryError::ConfigError(e.to_string())
    }
}

impl From<dom::DomError> for DrOrdinaryError {
    fn from(e: dom::DomError) -> Self {
        DrOrdinaryError::DocumentError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for DrOrdinaryError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        DrOrdinaryError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Stateless Functions (exported to FFI)
// =========================================================================

/// Highlight `words` in an HTML document and return the new markup.
#[uniffi::export]
pub fn highlight_html(html: String, words: Vec<String>) -> Result<FfiHighlightResult, DrOrdinaryError> {
    let words = WordSet::new(words);
    let highlighter = Highlighter::new(&words)?;
    let mut doc = Document::parse(&html);
    let outcome = highlighter.scan(&mut doc);
    Ok(FfiHighlightResult::new(&doc, outcome))
}

/// Interaction records from the built-in table.
#[uniffi::export]
pub fn lookup_interactions(drug_name: String) -> Vec<FfiInteractionRecord> {
    InteractionTable::new()
        .lookup(&drug_name)
        .into_iter()
        .map(Into::into)
        .collect()
}

/// Companion-app URL for a selection, if it is not blank.
#[uniffi::export]
pub fn companion_url(selection: String) -> Result<Option<String>, DrOrdinaryError> {
    let link = context_menu::CompanionLink::from_config(&AppConfig::default())?;
    Ok(link.for_selection(&selection).map(|url| url.to_string()))
}

/// Whether a page URL is never analyzed.
#[uniffi::export]
pub fn is_excluded_url(url: String) -> bool {
    content::PageExclusions::from_config(&ScanConfig::default()).is_excluded(&url)
}

/// Capped, whitespace-collapsed rendered text of an HTML document.
#[uniffi::export]
pub fn page_text(html: String) -> String {
    let doc = Document::parse(&html);
    content::extract_page_text(&doc, config::DEFAULT_TEXT_CAP)
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a settings database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<DrOrdinaryCore>, DrOrdinaryError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(DrOrdinaryCore::new(db)))
}

/// Create an in-memory settings database.
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<DrOrdinaryCore>, DrOrdinaryError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(DrOrdinaryCore::new(db)))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe settings store and scanner for FFI.
#[derive(uniffi::Object)]
pub struct DrOrdinaryCore {
    db: Arc<Mutex<Database>>,
    scan: ScanConfig,
}

impl DrOrdinaryCore {
    fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            scan: ScanConfig::default(),
        }
    }
}

#[uniffi::export]
impl DrOrdinaryCore {
    // =========================================================================
    // Settings
    // =========================================================================

    /// Whether highlighting is enabled.
    pub fn is_enabled(&self) -> Result<bool, DrOrdinaryError> {
        let db = self.db.lock()?;
        Ok(db.extension_enabled()?)
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<(), DrOrdinaryError> {
        let db = self.db.lock()?;
        db.set_extension_enabled(enabled)?;
        Ok(())
    }

    pub fn api_key(&self) -> Result<Option<String>, DrOrdinaryError> {
        let db = self.db.lock()?;
        Ok(db.api_key()?)
    }

    /// Save the agent API key. Empty keys are rejected.
    pub fn set_api_key(&self, api_key: String) -> Result<(), DrOrdinaryError> {
        let db = self.db.lock()?;
        db.set_api_key(&api_key)?;
        Ok(())
    }

    pub fn set_agent_id(&self, agent_id: String) -> Result<(), DrOrdinaryError> {
        let db = self.db.lock()?;
        db.set_agent_id(&agent_id)?;
        Ok(())
    }

    /// Agent configuration from saved settings, as JSON.
    pub fn agent_config_json(&self, fallback_agent_id: Option<String>) -> Result<String, DrOrdinaryError> {
        let db = self.db.lock()?;
        let config = AgentConfig::from_store(&db, fallback_agent_id.as_deref())?;
        serde_json::to_string(&config).map_err(|e| DrOrdinaryError::ConfigError(e.to_string()))
    }

    // =========================================================================
    // Scanning
    // =========================================================================

    /// Highlight an already-acquired word list on a page, honoring the toggle
    /// and URL exclusions.
    pub fn scan_page(
        &self,
        url: String,
        html: String,
        words: Vec<String>,
    ) -> Result<FfiScanResult, DrOrdinaryError> {
        let enabled = self.is_enabled()?;
        if !enabled {
            info!("Extension is disabled");
            return Ok(FfiScanResult::unchanged(FfiScanStatus::Disabled, html));
        }
        if content::PageExclusions::from_config(&self.scan).is_excluded(&url) {
            return Ok(FfiScanResult::unchanged(FfiScanStatus::SkippedPage, html));
        }

        let words = WordSet::new(words);
        if words.is_empty() {
            return Ok(FfiScanResult::unchanged(FfiScanStatus::NoWords, html));
        }

        let highlighter = Highlighter::new(&words)?;
        let mut doc = Document::parse(&html);
        panel::inject_styles(&mut doc)?;
        let outcome = highlighter.scan(&mut doc);
        let result = FfiHighlightResult::new(&doc, outcome);

        Ok(FfiScanResult {
            status: FfiScanStatus::Highlighted,
            html: result.html,
            applied: result.applied,
            skipped: result.skipped,
        })
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe highlight result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiHighlightResult {
    pub html: String,
    pub applied: u32,
    pub skipped: u32,
    pub words: Vec<String>,
}

impl FfiHighlightResult {
    fn new(doc: &Document, outcome: HighlightOutcome) -> Self {
        Self {
            html: dom::inner_html(doc, doc.root()),
            applied: outcome.applied as u32,
            skipped: outcome.skipped as u32,
            words: outcome.markers.into_iter().map(|m| m.word).collect(),
        }
    }
}

/// What a scan did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiScanStatus {
    Disabled,
    SkippedPage,
    NoWords,
    Highlighted,
}

/// FFI-safe scan result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiScanResult {
    pub status: FfiScanStatus,
    pub html: String,
    pub applied: u32,
    pub skipped: u32,
}

impl FfiScanResult {
    fn unchanged(status: FfiScanStatus, html: String) -> Self {
        Self {
            status,
            html,
            applied: 0,
            skipped: 0,
        }
    }
}

/// FFI-safe interaction record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiInteractionRecord {
    pub kind: String,
    pub name: String,
    pub severity: String,
    pub description: String,
}

impl From<InteractionRecord> for FfiInteractionRecord {
    fn from(record: InteractionRecord) -> Self {
        Self {
            kind: record.kind.as_str().to_string(),
            name: record.name,
            severity: record.severity.label().to_string(),
            description: record.description,
        }
    }
}
