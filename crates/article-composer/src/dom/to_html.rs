// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use crate::dom::nodes::{ContainerNode, DomNode};

pub trait ToHtml {
    fn fmt_html(&self, buf: &mut String);

    fn to_html(&self) -> String {
        let mut buf = String::new();
        self.fmt_html(&mut buf);
        buf
    }
}

impl ToHtml for DomNode {
    fn fmt_html(&self, buf: &mut String) {
        match self {
            DomNode::Container(c) => c.fmt_html(buf),
            DomNode::Text(t) => {
                buf.push_str(&html_escape::encode_text(t.data()));
            }
            DomNode::LineBreak => buf.push_str("<br />"),
        }
    }
}

impl ToHtml for ContainerNode {
    /// Generic containers (region roots and fragments) only write their
    /// children.
    fn fmt_html(&self, buf: &mut String) {
        let tag = self.tag();
        if !tag.is_empty() {
            buf.push('<');
            buf.push_str(tag);
            for (name, value) in self.attrs() {
                buf.push(' ');
                buf.push_str(name);
                buf.push_str("=\"");
                buf.push_str(&html_escape::encode_double_quoted_attribute(
                    value,
                ));
                buf.push('"');
            }
            buf.push('>');
        }
        for child in self.children() {
            child.fmt_html(buf);
        }
        if !tag.is_empty() {
            buf.push_str("</");
            buf.push_str(tag);
            buf.push('>');
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::FormatKind;

    #[test]
    fn text_and_attributes_are_escaped() {
        let root = ContainerNode::new_generic(vec![
            DomNode::new_link(
                "https://a.b/?x=1&y=\"2\"",
                Vec::new(),
                vec![DomNode::new_text("<1 & 2>")],
            ),
            DomNode::LineBreak,
        ]);
        assert_eq!(
            root.to_html(),
            "<a href=\"https://a.b/?x=1&amp;y=&quot;2&quot;\">\
             &lt;1 &amp; 2&gt;</a><br />"
        );
    }

    #[test]
    fn nested_formatting_is_written_inside_out() {
        let node = DomNode::new_formatting(
            FormatKind::Bold,
            vec![DomNode::new_formatting(
                FormatKind::Italic,
                vec![DomNode::new_text("x")],
            )],
        );
        assert_eq!(node.to_html(), "<strong><em>x</em></strong>");
    }
}
