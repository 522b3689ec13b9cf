//! "Check with Dr. Strange" selection menu.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{AppConfig, ConfigResult};

pub const MENU_ITEM_ID: &str = "checkWithDrStrange";
pub const MENU_ITEM_TITLE: &str = "Check with Dr. Strange";

/// Characters left unescaped by `encodeURIComponent`. `Url` still escapes `'`
/// in the query of `http`/`https` links.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// A context menu registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMenuItem {
    pub id: String,
    pub title: String,
    pub contexts: Vec<String>,
}

impl ContextMenuItem {
    pub fn check_with_companion() -> Self {
        Self {
            id: MENU_ITEM_ID.to_string(),
            title: MENU_ITEM_TITLE.to_string(),
            contexts: vec!["selection".to_string()],
        }
    }
}

/// Builds companion-app links for selected text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanionLink {
    base: Url,
}

impl CompanionLink {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    pub fn from_config(config: &AppConfig) -> ConfigResult<Self> {
        Ok(Self::new(config.companion_base()?))
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// `<base>?drug=<selection>`; `None` for a blank selection.
    pub fn for_selection(&self, selection: &str) -> Option<Url> {
        if selection.trim().is_empty() {
            return None;
        }
        let encoded = utf8_percent_encode(selection, COMPONENT).to_string();
        let mut url = self.base.clone();
        url.set_query(Some(&format!("drug={encoded}")));
        Some(url)
    }

    /// Handle a menu click. Other menu ids are ignored.
    pub fn on_clicked(&self, menu_id: &str, selection: Option<&str>) -> Option<Url> {
        if menu_id != MENU_ITEM_ID {
            return None;
        }
        self.for_selection(selection?)
    }
}
