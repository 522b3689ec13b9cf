//! Property tests for the scan pass.

use dr_ordinary_core::dom::{Document, NodeId};
use dr_ordinary_core::highlight::{Highlighter, WordSet, MARKER_ATTR};
use proptest::prelude::*;

const WORDS: &[&str] = &["aspirin", "warfarin", "ibuprofen", "ibuprofen sodium"];

fn token() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "aspirin", "Aspirin", "WARFARIN", "warfarins", "ibuprofen", "ibuprofen sodium", "take",
        " ", ", ", ".", "\n", "é", "naïve", "x", "-", "'",
    ])
}

fn text() -> impl Strategy<Value = String> {
    prop::collection::vec(token(), 0..24).prop_map(|tokens| tokens.concat())
}

fn document_with(paragraphs: &[String]) -> (Document, Vec<NodeId>) {
    let mut doc = Document::new();
    let root = doc.root();
    let mut blocks = Vec::new();
    for text in paragraphs {
        let p = doc.create_element("p");
        let node = doc.create_text(text.clone());
        doc.append_child(root, p).unwrap();
        doc.append_child(p, node).unwrap();
        blocks.push(p);
    }
    (doc, blocks)
}

fn markers(doc: &Document) -> Vec<NodeId> {
    doc.descendants(doc.root())
        .into_iter()
        .filter(|n| doc.attr(*n, MARKER_ATTR).is_some())
        .collect()
}

proptest! {
    #[test]
    fn prop_fragments_reconstruct_original_text(paragraphs in prop::collection::vec(text(), 1..4)) {
        let (mut doc, blocks) = document_with(&paragraphs);
        let highlighter = Highlighter::new(&WordSet::new(WORDS.iter().copied())).unwrap();

        let outcome = highlighter.scan(&mut doc);

        prop_assert_eq!(outcome.skipped, 0);
        for (p, original) in blocks.iter().zip(&paragraphs) {
            prop_assert_eq!(&doc.text_content(*p), original);
        }
        prop_assert_eq!(markers(&doc).len(), outcome.applied);
    }

    #[test]
    fn prop_markers_hold_exactly_one_listed_word(paragraphs in prop::collection::vec(text(), 1..4)) {
        let (mut doc, _) = document_with(&paragraphs);
        let words = WordSet::new(WORDS.iter().copied());
        Highlighter::new(&words).unwrap().scan(&mut doc);

        for marker in markers(&doc) {
            let key = doc.attr(marker, MARKER_ATTR).unwrap().to_string();
            prop_assert!(words.contains(&key));
            prop_assert_eq!(doc.text_content(marker), key);
            prop_assert_eq!(doc.children(marker).len(), 1);
        }
    }

    #[test]
    fn prop_second_scan_is_a_no_op(paragraphs in prop::collection::vec(text(), 1..4)) {
        let (mut doc, _) = document_with(&paragraphs);
        let highlighter = Highlighter::new(&WordSet::new(WORDS.iter().copied())).unwrap();

        highlighter.scan(&mut doc);
        let before = markers(&doc);
        let second = highlighter.scan(&mut doc);

        prop_assert_eq!(second.applied, 0);
        prop_assert_eq!(markers(&doc), before);
    }
}
