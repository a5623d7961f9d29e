// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use crate::dom::Dom;
use crate::error::MarkupParseError;

/// Parse block markup into a [Dom]. On malformed input the error still
/// carries the tree the parser recovered.
pub fn parse(markup: &str) -> Result<Dom, MarkupParseError> {
    cfg_if::cfg_if! {
        if #[cfg(feature = "sys")] {
            sys::HtmlParser::default().parse(markup)
        } else {
            Err(MarkupParseError {
                parse_errors: vec![String::from(
                    "markup parsing needs the `sys` feature",
                )],
                recovered: Dom::new(vec![crate::dom::DomNode::new_text(
                    markup,
                )]),
            })
        }
    }
}

#[cfg(feature = "sys")]
mod sys {
    use super::super::padom::{PaDom, PaDomNode};
    use super::super::padom_creator::PaDomCreator;
    use super::super::panode_container::PaNodeContainer;
    use crate::dom::nodes::{is_block_tag, ContainerNode, DomNode};
    use crate::dom::Dom;
    use crate::error::MarkupParseError;

    /// Elements whose content never reaches the editable region.
    const DROPPED_TAGS: &[&str] =
        &["head", "meta", "script", "style", "template", "title"];

    #[derive(Default)]
    pub(super) struct HtmlParser;

    impl HtmlParser {
        pub(super) fn parse(
            &mut self,
            markup: &str,
        ) -> Result<Dom, MarkupParseError> {
            match PaDomCreator::parse(markup) {
                Ok(padom) => Ok(self.padom_to_dom(&padom)),
                Err(err) => {
                    let recovered = self.padom_to_dom(&err.dom);
                    Err(MarkupParseError {
                        parse_errors: err.parse_errors,
                        recovered,
                    })
                }
            }
        }

        /// Convert a [PaDom] into a [Dom]. Nodes html5ever created but
        /// never attached are not reachable from the document and so are
        /// left behind.
        fn padom_to_dom(&mut self, padom: &PaDom) -> Dom {
            let mut ret = Dom::new(Vec::new());
            if let PaDomNode::Document(padoc) = padom.get_document() {
                self.convert(padom, padoc, ret.document_mut());
            }
            ret
        }

        fn convert(
            &mut self,
            padom: &PaDom,
            panode: &PaNodeContainer,
            node: &mut ContainerNode,
        ) {
            let has_block_child = panode.children.iter().any(|h| {
                matches!(
                    padom.get_node(h),
                    PaDomNode::Container(c) if is_block_tag(c.tag())
                )
            });
            for child_handle in &panode.children {
                match padom.get_node(child_handle) {
                    PaDomNode::Container(child) => {
                        self.convert_container(padom, child, node)
                    }
                    PaDomNode::Document(_) => {
                        tracing::warn!("nested document dropped while parsing")
                    }
                    PaDomNode::Text(text) => {
                        let blank = text.content.trim().is_empty();
                        if text.content.is_empty()
                            || (blank && has_block_child)
                        {
                            continue;
                        }
                        node.append_child(DomNode::new_text(&text.content));
                    }
                }
            }
        }

        fn convert_container(
            &mut self,
            padom: &PaDom,
            child: &PaNodeContainer,
            node: &mut ContainerNode,
        ) {
            let tag = child.tag();
            match tag {
                "html" | "body" => self.convert(padom, child, node),
                "br" => node.append_child(DomNode::LineBreak),
                "span" => match child.formatting_tag_from_style() {
                    Some(formatting_tag) => {
                        let mut formatting = ContainerNode::new(
                            formatting_tag,
                            Vec::new(),
                            Vec::new(),
                        );
                        self.convert(padom, child, &mut formatting);
                        node.append_child(DomNode::Container(formatting));
                    }
                    None => self.convert(padom, child, node),
                },
                _ if DROPPED_TAGS.contains(&tag) => {
                    tracing::trace!(tag, "dropping non-content element");
                }
                _ => {
                    let mut container = ContainerNode::new(
                        tag,
                        child.attrs.clone(),
                        Vec::new(),
                    );
                    self.convert(padom, child, &mut container);
                    node.append_child(DomNode::Container(container));
                }
            }
        }
    }
}
