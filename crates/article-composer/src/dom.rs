// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The rich-text tree behind one block's editable region.

pub mod dom_handle;
pub mod formatting;
pub mod nodes;
pub mod parser;
pub mod range;
pub mod to_html;
pub mod unicode;

pub use dom_handle::DomHandle;
pub use nodes::{ContainerNode, ContainerNodeKind, DomNode, LeafSpan, TextNode};
pub use range::Caret;
pub use to_html::ToHtml;

/// A block's editable region: a generic root container and its content.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dom {
    document: ContainerNode,
}

impl Dom {
    pub fn new(children: Vec<DomNode>) -> Self {
        Self {
            document: ContainerNode::new_generic(children),
        }
    }

    /// Parse markup, keeping whatever the parser recovered if it reported
    /// errors.
    pub fn from_markup(markup: &str) -> Self {
        match parser::parse(markup) {
            Ok(dom) => dom,
            Err(e) => {
                tracing::warn!(
                    errors = ?e.parse_errors,
                    "recovered from malformed block markup"
                );
                e.recovered
            }
        }
    }

    pub fn document(&self) -> &ContainerNode {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut ContainerNode {
        &mut self.document
    }

    pub fn into_document(self) -> ContainerNode {
        self.document
    }

    pub fn text_len(&self) -> usize {
        self.document.text_len()
    }

    pub fn to_plain_text(&self) -> String {
        self.document.to_plain_text()
    }

    /// Check the tree invariants when the `assert-invariants` feature is
    /// enabled; otherwise do nothing.
    pub fn assert_invariants(&self) {
        #[cfg(feature = "assert-invariants")]
        self.explicitly_assert_invariants();
    }

    /// Panic unless every non-root container has a tag and no block-level
    /// container sits inside an inline one.
    pub fn explicitly_assert_invariants(&self) {
        fn check(container: &ContainerNode, inside_inline: bool) {
            for child in container.children() {
                if let DomNode::Container(c) = child {
                    assert!(!c.tag().is_empty(), "untagged inner container");
                    assert!(
                        !(inside_inline && c.is_block()),
                        "block <{}> inside inline content",
                        c.tag()
                    );
                    check(c, inside_inline || !c.is_block());
                }
            }
        }
        check(&self.document, false);
    }
}

impl ToHtml for Dom {
    fn fmt_html(&self, buf: &mut String) {
        self.document.fmt_html(buf);
    }
}
