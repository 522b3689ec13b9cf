//! Panel content construction and page styles.

use crate::dom::{Document, DomResult, NodeId};
use crate::interactions::InteractionRecord;

pub const PANEL_ID: &str = "dr-ordinary-side-menu";
pub const PANEL_CLASS: &str = "dr-ordinary-side-menu";
pub const VISIBLE_CLASS: &str = "visible";
pub const STYLE_ID: &str = "dr-ordinary-styles";

pub const LOADING_MESSAGE: &str = "Loading interactions...";
pub const ERROR_MESSAGE: &str = "Could not load interaction data.";
pub const EMPTY_MESSAGE: &str = "No interaction information found.";

/// What the panel body shows.
#[derive(Debug, Clone, Copy)]
pub enum PanelBody<'a> {
    Loading,
    Records(&'a [InteractionRecord]),
    Error(&'a str),
}

/// Replace the panel's children with a header and the given body.
pub fn render_panel(
    doc: &mut Document,
    panel: NodeId,
    word: &str,
    body: PanelBody<'_>,
) -> DomResult<()> {
    doc.clear_children(panel)?;

    let header = element(doc, "div", "dr-ordinary-side-menu-header");
    let title = doc.create_element("h3");
    doc.set_text_content(title, word)?;
    doc.append_child(header, title)?;
    doc.append_child(panel, header)?;

    let content = element(doc, "div", "dr-ordinary-side-menu-content");
    match body {
        PanelBody::Loading => append_paragraph(doc, content, LOADING_MESSAGE)?,
        PanelBody::Error(message) => append_paragraph(doc, content, message)?,
        PanelBody::Records([]) => append_paragraph(doc, content, EMPTY_MESSAGE)?,
        PanelBody::Records(records) => {
            for record in records {
                let item = render_record(doc, record)?;
                doc.append_child(content, item)?;
            }
        }
    }
    doc.append_child(panel, content)
}

fn render_record(doc: &mut Document, record: &InteractionRecord) -> DomResult<NodeId> {
    let tier = record.severity.tier();

    let item = element(
        doc,
        "div",
        &format!("dr-ordinary-interaction-item severity-{tier}"),
    );

    let title = element(doc, "div", "dr-ordinary-interaction-title");
    let name = doc.create_element("span");
    doc.set_text_content(name, &format!("{} ({})", record.name, record.kind.as_str()))?;
    let badge = element(
        doc,
        "span",
        &format!("dr-ordinary-interaction-severity {tier}"),
    );
    doc.set_text_content(badge, record.severity.label())?;
    doc.append_child(title, name)?;
    doc.append_child(title, badge)?;

    let description = element(doc, "div", "dr-ordinary-interaction-description");
    doc.set_text_content(description, &record.description)?;

    doc.append_child(item, title)?;
    doc.append_child(item, description)?;
    Ok(item)
}

fn element(doc: &mut Document, tag: &str, class: &str) -> NodeId {
    let node = doc.create_element(tag);
    doc.set_attr(node, "class", class);
    node
}

fn append_paragraph(doc: &mut Document, parent: NodeId, text: &str) -> DomResult<()> {
    let p = doc.create_element("p");
    doc.set_text_content(p, text)?;
    doc.append_child(parent, p)
}

/// Append the marker and panel stylesheet once per document.
pub fn inject_styles(doc: &mut Document) -> DomResult<bool> {
    if doc.element_by_id(STYLE_ID).is_some() {
        return Ok(false);
    }
    let target = doc.head().unwrap_or_else(|| doc.body());
    let style = doc.create_element("style");
    doc.set_attr(style, "id", STYLE_ID);
    doc.set_text_content(style, STYLESHEET)?;
    doc.append_child(target, style)?;
    Ok(true)
}

pub const STYLESHEET: &str = r#"
.dr-ordinary-highlight {
  background-color: #fffbe6 !important;
  border: 1px solid #ffe58f !important;
  border-radius: 3px !important;
  padding: 0 2px !important;
  font-weight: 600 !important;
  cursor: help !important;
  font-family: inherit !important;
  color: inherit !important;
  display: inline !important;
}
.dr-ordinary-highlight:hover {
  background-color: #ffeaa7 !important;
  border-color: #fdcb6e !important;
}
.dr-ordinary-side-menu {
  position: fixed !important;
  top: 0 !important;
  right: -350px !important;
  width: 320px !important;
  height: 100% !important;
  background-color: #ffffff !important;
  border-left: 1px solid #e0e0e0 !important;
  box-shadow: -2px 0 10px rgba(0,0,0,0.1) !important;
  z-index: 2147483647 !important;
  transition: right 0.3s ease-in-out !important;
  color: #333 !important;
  display: flex !important;
  flex-direction: column !important;
}
.dr-ordinary-side-menu.visible { right: 0 !important; }
.dr-ordinary-side-menu-header { padding: 15px !important; border-bottom: 1px solid #eee !important; }
.dr-ordinary-side-menu-header h3 { margin: 0 !important; font-size: 18px !important; text-transform: capitalize; }
.dr-ordinary-side-menu-content { padding: 15px !important; overflow-y: auto !important; flex-grow: 1 !important; }
.dr-ordinary-interaction-item { margin-bottom: 15px !important; padding: 10px !important; border-radius: 4px !important; border: 1px solid #eee !important; }
.dr-ordinary-interaction-item.severity-high { border-left: 4px solid #d9534f !important; }
.dr-ordinary-interaction-item.severity-medium { border-left: 4px solid #f0ad4e !important; }
.dr-ordinary-interaction-item.severity-low { border-left: 4px solid #5bc0de !important; }
.dr-ordinary-interaction-item.severity-info { border-left: 4px solid #999999 !important; }
.dr-ordinary-interaction-title { font-weight: bold !important; display: flex !important; justify-content: space-between !important; margin-bottom: 5px !important; }
.dr-ordinary-interaction-severity { font-size: 12px !important; padding: 2px 6px !important; border-radius: 10px !important; color: white !important; text-transform: uppercase !important; }
.dr-ordinary-interaction-severity.high { background-color: #d9534f !important; }
.dr-ordinary-interaction-severity.medium { background-color: #f0ad4e !important; }
.dr-ordinary-interaction-severity.low { background-color: #5bc0de !important; }
.dr-ordinary-interaction-severity.info { background-color: #999999 !important; }
.dr-ordinary-interaction-description { font-size: 14px !important; line-height: 1.4 !important; }
"#;
