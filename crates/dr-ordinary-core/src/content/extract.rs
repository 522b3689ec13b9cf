//! Page text extraction and URL exclusion.

use tracing::debug;
use url::Url;

use crate::config::ScanConfig;
use crate::dom::{inner_text, Document};

/// URL prefixes that are never analyzed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageExclusions {
    prefixes: Vec<String>,
}

impl PageExclusions {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(&config.excluded_prefixes)
    }

    /// Whether `url` starts with an excluded prefix.
    ///
    /// Web URLs are also compared without their scheme and a leading `www.`,
    /// so `google.com/search` excludes `https://www.google.com/search?q=x`.
    pub fn is_excluded(&self, url: &str) -> bool {
        let forms = comparable_forms(url);
        let excluded = self
            .prefixes
            .iter()
            .any(|prefix| forms.iter().any(|form| form.starts_with(prefix.as_str())));
        if excluded {
            debug!(url, "URL matches an excluded prefix");
        }
        excluded
    }
}

fn comparable_forms(url: &str) -> Vec<String> {
    let raw = url.trim().to_lowercase();
    let Ok(parsed) = Url::parse(&raw) else {
        return vec![raw];
    };

    let mut forms = vec![parsed.as_str().to_owned()];
    if matches!(parsed.scheme(), "http" | "https") {
        if let Some(host) = parsed.host_str() {
            let host = host.strip_prefix("www.").unwrap_or(host);
            let mut bare = format!("{host}{}", parsed.path());
            if let Some(query) = parsed.query() {
                bare.push('?');
                bare.push_str(query);
            }
            forms.push(bare);
        }
    }
    forms
}

/// Rendered body text, whitespace collapsed, truncated to `cap` characters.
pub fn extract_page_text(doc: &Document, cap: usize) -> String {
    let text = inner_text(doc, doc.body());
    match text.char_indices().nth(cap) {
        Some((cut, _)) => text[..cut].trim_end().to_owned(),
        None => text,
    }
}
