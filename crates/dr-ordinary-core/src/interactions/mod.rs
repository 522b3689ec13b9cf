//! Interaction records and the lookup seam used by the side panel.

mod records;
mod reference;
mod table;

pub use records::*;
pub use reference::*;
pub use table::*;

use thiserror::Error;

/// Interaction lookup errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Lookup failed: {0}")]
    Failed(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

pub type LookupResult<T> = Result<T, LookupError>;

/// Source of interaction records for a single drug name.
///
/// Implementations match names exactly after trimming and lower-casing, and
/// return a single informational record for unknown names.
#[allow(async_fn_in_trait)]
pub trait InteractionLookup {
    async fn interactions(&self, drug_name: &str) -> LookupResult<Vec<InteractionRecord>>;
}

impl<T: InteractionLookup> InteractionLookup for &T {
    async fn interactions(&self, drug_name: &str) -> LookupResult<Vec<InteractionRecord>> {
        (**self).interactions(drug_name).await
    }
}
