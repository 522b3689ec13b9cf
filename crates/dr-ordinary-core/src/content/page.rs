//! A loaded page: its document, side panel and registered markers.

use std::collections::HashMap;

use tracing::debug;

use crate::dom::{inner_html, Document, DomResult, NodeId};
use crate::highlight::{marker_for, HighlightOutcome};
use crate::interactions::InteractionLookup;
use crate::panel::{ActivationTicket, SidePanel};

/// Result of dispatching one pointer event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// A marker was activated; resolve the ticket with a lookup
    Activated(ActivationTicket),
    /// The panel was hidden
    Dismissed,
    Ignored,
}

#[derive(Debug)]
pub struct Page {
    url: String,
    document: Document,
    panel: SidePanel,
    markers: HashMap<NodeId, String>,
    scanned: bool,
}

impl Page {
    pub fn new(url: impl Into<String>, document: Document) -> Self {
        Self {
            url: url.into(),
            document,
            panel: SidePanel::new(),
            markers: HashMap::new(),
            scanned: false,
        }
    }

    pub fn parse(url: impl Into<String>, html: &str) -> Self {
        Self::new(url, Document::parse(html))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn panel(&self) -> &SidePanel {
        &self.panel
    }

    /// Serialized page markup.
    pub fn html(&self) -> String {
        inner_html(&self.document, self.document.root())
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Word of a registered marker.
    pub fn marker_word(&self, marker: NodeId) -> Option<&str> {
        self.markers.get(&marker).map(String::as_str)
    }

    /// Claim this page's single scan. Returns false if it was already claimed.
    pub fn mark_scanned(&mut self) -> bool {
        !std::mem::replace(&mut self.scanned, true)
    }

    /// Register activation for every marker of a scan pass.
    pub fn register(&mut self, outcome: &HighlightOutcome) {
        for marker in &outcome.markers {
            self.markers.insert(marker.node, marker.word.clone());
        }
    }

    /// Dispatch a pointer event whose target is `target`.
    ///
    /// A registered marker activates the panel. Any other target is offered to
    /// the panel's outside-pointer dismissal. The event is finished afterwards.
    pub fn handle_click(&mut self, target: NodeId) -> DomResult<ClickOutcome> {
        let activated = match marker_for(&self.document, target) {
            Some((marker, _)) => self.markers.get(&marker).cloned(),
            None => None,
        };

        let outcome = match activated {
            Some(word) => {
                debug!(word = %word, "Marker activated");
                let ticket = self.panel.activate(&mut self.document, &word)?;
                // Same event reaching the document listener.
                self.panel.pointer_down(&mut self.document, target);
                ClickOutcome::Activated(ticket)
            }
            None if self.panel.pointer_down(&mut self.document, target) => ClickOutcome::Dismissed,
            None => ClickOutcome::Ignored,
        };

        self.panel.finish_event();
        Ok(outcome)
    }

    /// Look up interactions for an activation and render them if still current.
    pub async fn resolve<L: InteractionLookup>(
        &mut self,
        ticket: &ActivationTicket,
        lookup: &L,
    ) -> DomResult<bool> {
        let result = lookup.interactions(&ticket.lookup_key()).await;
        self.panel.apply(&mut self.document, ticket, result)
    }

    /// Click `target` and, if it activated a marker, resolve the lookup.
    pub async fn click<L: InteractionLookup>(
        &mut self,
        target: NodeId,
        lookup: &L,
    ) -> DomResult<ClickOutcome> {
        let outcome = self.handle_click(target)?;
        if let ClickOutcome::Activated(ticket) = &outcome {
            self.resolve(ticket, lookup).await?;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::{Highlighter, WordSet};
    use crate::interactions::InteractionTable;
    use crate::panel::PanelState;
    use futures::executor::block_on;

    fn highlighted() -> (Page, HighlightOutcome) {
        let mut page = Page::parse(
            "https://example.org/",
            "<html><body><p>Warfarin and aspirin</p><p>Other text</p></body></html>",
        );
        let highlighter = Highlighter::new(&WordSet::new(["warfarin", "aspirin"])).unwrap();
        let outcome = highlighter.scan(page.document_mut());
        page.register(&outcome);
        (page, outcome)
    }

    #[test]
    fn test_marker_click_activates_panel() {
        let (mut page, outcome) = highlighted();
        let table = InteractionTable::new();
        let marker = outcome.markers[0].node;

        let clicked = block_on(page.click(marker, &table)).unwrap();

        match clicked {
            ClickOutcome::Activated(ticket) => assert_eq!(ticket.word(), "Warfarin"),
            other => panic!("expected activation, got {other:?}"),
        }
        assert_eq!(page.panel().state(), PanelState::Visible);
        assert!(page.html().contains("NSAIDs (e.g., Ibuprofen, Naproxen)"));
    }

    #[test]
    fn test_click_on_marker_text_activates() {
        let (mut page, outcome) = highlighted();
        let marker = outcome.markers[1].node;
        let text = page.document().children(marker)[0];

        let clicked = page.handle_click(text).unwrap();
        assert!(matches!(clicked, ClickOutcome::Activated(ref t) if t.word() == "aspirin"));
    }

    #[test]
    fn test_outside_click_dismisses_after_activation() {
        let (mut page, outcome) = highlighted();
        let other = page.document().find_element("p").unwrap();

        page.handle_click(outcome.markers[0].node).unwrap();
        assert_eq!(page.handle_click(other).unwrap(), ClickOutcome::Dismissed);
        assert_eq!(page.panel().state(), PanelState::Hidden);
        assert_eq!(page.handle_click(other).unwrap(), ClickOutcome::Ignored);
    }

    #[test]
    fn test_unregistered_marker_is_ignored() {
        let mut page = Page::parse(
            "https://example.org/",
            r#"<body><span class="dr-ordinary-highlight" data-dr-ordinary-marker="aspirin">aspirin</span></body>"#,
        );
        let span = page.document().find_element("span").unwrap();

        assert_eq!(page.handle_click(span).unwrap(), ClickOutcome::Ignored);
        assert_eq!(page.panel().state(), PanelState::Hidden);
    }

    #[test]
    fn test_quick_second_activation_wins() {
        let (mut page, outcome) = highlighted();
        let table = InteractionTable::new();

        let first = match page.handle_click(outcome.markers[0].node).unwrap() {
            ClickOutcome::Activated(t) => t,
            other => panic!("unexpected {other:?}"),
        };
        let second = match page.handle_click(outcome.markers[1].node).unwrap() {
            ClickOutcome::Activated(t) => t,
            other => panic!("unexpected {other:?}"),
        };

        assert!(block_on(page.resolve(&second, &table)).unwrap());
        assert!(!block_on(page.resolve(&first, &table)).unwrap());
        assert!(page.html().contains("Warfarin and other Anticoagulants"));
        assert!(!page.html().contains("Antibiotics (e.g., Ciprofloxacin"));
    }
}
