//! Content-script orchestration.
//!
//! ```text
//! toggle ──▶ exclusions ──▶ page text ──▶ provider ──▶ WordSet ──▶ scan
//!   │ false      │ excluded                   │ failure      │ empty
//!   ▼            ▼                            ▼              ▼
//! Disabled   SkippedPage                   NoWords        NoWords
//! ```
//!
//! Each step awaits at most once. Acquisition failures never propagate; they
//! degrade to highlighting nothing.

mod extract;
mod page;

pub use extract::*;
pub use page::*;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ScanConfig;
use crate::db::{Database, DbResult};
use crate::highlight::{HighlightOutcome, Highlighter, WordSet};
use crate::panel::inject_styles;

/// Word-set acquisition errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Upstream error {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Provider not configured: {0}")]
    Unconfigured(String),
}

pub type AcquisitionResult<T> = Result<T, AcquisitionError>;

/// Persisted on/off switch for highlighting.
#[allow(async_fn_in_trait)]
pub trait ToggleSource {
    async fn is_enabled(&self) -> DbResult<bool>;
}

impl ToggleSource for Database {
    async fn is_enabled(&self) -> DbResult<bool> {
        self.extension_enabled()
    }
}

impl<T: ToggleSource> ToggleSource for &T {
    async fn is_enabled(&self) -> DbResult<bool> {
        (**self).is_enabled().await
    }
}

/// Supplies candidate drug names for a page.
#[allow(async_fn_in_trait)]
pub trait WordSetProvider {
    async fn candidate_words(&self, page_text: &str, url: &str) -> AcquisitionResult<Vec<String>>;
}

impl<P: WordSetProvider> WordSetProvider for &P {
    async fn candidate_words(&self, page_text: &str, url: &str) -> AcquisitionResult<Vec<String>> {
        (**self).candidate_words(page_text, url).await
    }
}

/// What a content-script run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanReport {
    /// Highlighting is switched off
    Disabled,
    /// The page URL is excluded
    SkippedPage,
    /// The page was already scanned
    AlreadyScanned,
    /// No usable words were acquired
    NoWords,
    Highlighted(HighlightOutcome),
}

impl ScanReport {
    pub fn applied(&self) -> usize {
        match self {
            ScanReport::Highlighted(outcome) => outcome.applied,
            _ => 0,
        }
    }
}

/// Runs the highlight pipeline once per page.
pub struct ContentScript<'c, T, P> {
    config: &'c ScanConfig,
    exclusions: PageExclusions,
    toggle: T,
    provider: P,
}

impl<'c, T: ToggleSource, P: WordSetProvider> ContentScript<'c, T, P> {
    pub fn new(config: &'c ScanConfig, toggle: T, provider: P) -> Self {
        Self {
            config,
            exclusions: PageExclusions::from_config(config),
            toggle,
            provider,
        }
    }

    pub async fn run(&self, page: &mut Page) -> ScanReport {
        if !page.mark_scanned() {
            debug!(url = page.url(), "Page already scanned");
            return ScanReport::AlreadyScanned;
        }

        let enabled = match self.toggle.is_enabled().await {
            Ok(enabled) => enabled,
            Err(error) => {
                warn!(%error, "Could not read toggle, using default");
                true
            }
        };
        if !enabled {
            info!("Extension is disabled");
            return ScanReport::Disabled;
        }

        if self.exclusions.is_excluded(page.url()) {
            info!(url = page.url(), "Skipping analysis on this page");
            return ScanReport::SkippedPage;
        }

        let text = extract_page_text(page.document(), self.config.text_cap);
        let words = match self.provider.candidate_words(&text, page.url()).await {
            Ok(words) => words,
            Err(error) => {
                warn!(%error, "Could not acquire drug names");
                return ScanReport::NoWords;
            }
        };

        let words = WordSet::new(words);
        if words.is_empty() {
            info!("No drugs found on page");
            return ScanReport::NoWords;
        }
        info!(count = words.len(), "Drugs found on page");

        let highlighter = match Highlighter::new(&words) {
            Ok(highlighter) => highlighter,
            Err(error) => {
                warn!(%error, "Could not build highlight pattern");
                return ScanReport::NoWords;
            }
        };

        if let Err(error) = inject_styles(page.document_mut()) {
            warn!(%error, "Could not inject styles");
        }
        let outcome = highlighter.scan(page.document_mut());
        page.register(&outcome);
        ScanReport::Highlighted(outcome)
    }
}
