//! Side panel controller.
//!
//! ```text
//!            activate(word)                 activate(other)
//!   Hidden ─────────────────▶ Visible ◀──────────────────┐
//!     ▲                        │  │                      │
//!     │   outside pointer      │  └──────────────────────┘
//!     └────────────────────────┘   (only once armed)
//! ```
//!
//! Every activation bumps a generation counter and hands back an
//! [`ActivationTicket`]. A lookup result is applied only while its ticket is
//! still current, so a slow response for an earlier marker never overwrites
//! the panel after a later marker was activated.

mod render;

pub use render::*;

use tracing::{debug, warn};

use crate::dom::{Document, DomResult, NodeId};
use crate::highlight::IGNORE_ATTR;
use crate::interactions::{InteractionLookup, InteractionRecord, LookupResult};

/// Panel visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Hidden,
    Visible,
}

/// Outside-pointer dismissal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DismissGuard {
    /// No dismissal listener
    Disarmed,
    /// Activated by the event currently propagating
    PendingEventEnd,
    /// Outside pointer events close the panel
    Armed,
}

/// Proof of one activation, used to apply its lookup result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationTicket {
    generation: u64,
    word: String,
}

impl ActivationTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The marker's word as displayed.
    pub fn word(&self) -> &str {
        &self.word
    }

    /// Key used for the interaction lookup.
    pub fn lookup_key(&self) -> String {
        self.word.trim().to_lowercase()
    }
}

/// Singleton panel showing interactions for the last activated marker.
#[derive(Debug)]
pub struct SidePanel {
    state: PanelState,
    generation: u64,
    dismiss: DismissGuard,
    root: Option<NodeId>,
}

impl Default for SidePanel {
    fn default() -> Self {
        Self::new()
    }
}

impl SidePanel {
    pub fn new() -> Self {
        Self {
            state: PanelState::Hidden,
            generation: 0,
            dismiss: DismissGuard::Disarmed,
            root: None,
        }
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state == PanelState::Visible
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The panel element, once created.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Show the loading state for `word` and start a new generation.
    pub fn activate(&mut self, doc: &mut Document, word: &str) -> DomResult<ActivationTicket> {
        let panel = self.ensure_root(doc)?;
        self.generation += 1;
        debug!(word, generation = self.generation, "Panel activated");

        render_panel(doc, panel, word, PanelBody::Loading)?;
        doc.add_class(panel, VISIBLE_CLASS);
        self.state = PanelState::Visible;
        self.dismiss = DismissGuard::PendingEventEnd;

        Ok(ActivationTicket {
            generation: self.generation,
            word: word.to_owned(),
        })
    }

    /// Render a lookup result if `ticket` is still current. Returns whether it was applied.
    pub fn apply(
        &mut self,
        doc: &mut Document,
        ticket: &ActivationTicket,
        result: LookupResult<Vec<InteractionRecord>>,
    ) -> DomResult<bool> {
        if ticket.generation != self.generation {
            debug!(
                word = ticket.word(),
                stale = ticket.generation,
                current = self.generation,
                "Discarding stale lookup response"
            );
            return Ok(false);
        }
        let Some(panel) = self.root else {
            return Ok(false);
        };

        match result {
            Ok(records) => render_panel(doc, panel, &ticket.word, PanelBody::Records(&records))?,
            Err(error) => {
                warn!(word = ticket.word(), %error, "Error fetching interactions");
                render_panel(doc, panel, &ticket.word, PanelBody::Error(ERROR_MESSAGE))?;
            }
        }
        Ok(true)
    }

    /// Activate, look up, and render in one step.
    pub async fn show<L: InteractionLookup>(
        &mut self,
        doc: &mut Document,
        word: &str,
        lookup: &L,
    ) -> DomResult<bool> {
        let ticket = self.activate(doc, word)?;
        let result = lookup.interactions(&ticket.lookup_key()).await;
        self.apply(doc, &ticket, result)
    }

    /// The activating event finished propagating; outside pointers may now dismiss.
    pub fn finish_event(&mut self) {
        if self.dismiss == DismissGuard::PendingEventEnd {
            self.dismiss = DismissGuard::Armed;
        }
    }

    /// Handle a pointer event on `target`. Returns whether the panel was hidden.
    pub fn pointer_down(&mut self, doc: &mut Document, target: NodeId) -> bool {
        if self.state != PanelState::Visible || self.dismiss != DismissGuard::Armed {
            return false;
        }
        let Some(panel) = self.root else {
            return false;
        };
        if doc.contains(panel, target) {
            return false;
        }

        doc.remove_class(panel, VISIBLE_CLASS);
        self.state = PanelState::Hidden;
        self.dismiss = DismissGuard::Disarmed;
        debug!("Panel dismissed");
        true
    }

    fn ensure_root(&mut self, doc: &mut Document) -> DomResult<NodeId> {
        if let Some(root) = self.root.filter(|r| doc.is_attached(*r)) {
            return Ok(root);
        }
        if let Some(existing) = doc.element_by_id(PANEL_ID) {
            self.root = Some(existing);
            return Ok(existing);
        }

        let panel = doc.create_element("div");
        doc.set_attr(panel, "id", PANEL_ID);
        doc.set_attr(panel, "class", PANEL_CLASS);
        doc.set_attr(panel, IGNORE_ATTR, "");
        let body = doc.body();
        doc.append_child(body, panel)?;
        self.root = Some(panel);
        Ok(panel)
    }
}
