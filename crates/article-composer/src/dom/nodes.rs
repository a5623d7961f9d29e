// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use crate::dom::unicode::{byte_index, utf16_len, utf16_slice};
use crate::dom::DomHandle;
use crate::FormatKind;

const BLOCK_TAGS: &[&str] = &[
    "address",
    "blockquote",
    "div",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "li",
    "ol",
    "p",
    "pre",
    "ul",
];

/// Whether `tag` names a block-level element, which formatting never
/// crosses.
pub fn is_block_tag(tag: &str) -> bool {
    BLOCK_TAGS.contains(&tag.to_ascii_lowercase().as_str())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomNode {
    Container(ContainerNode),
    Text(TextNode),
    /// A `<br>`, one UTF-16 code unit long.
    LineBreak,
}

impl DomNode {
    pub fn new_text(data: &str) -> Self {
        Self::Text(TextNode::from(data))
    }

    pub fn new_formatting(kind: FormatKind, children: Vec<DomNode>) -> Self {
        Self::Container(ContainerNode::new(
            kind.canonical_tag(),
            Vec::new(),
            children,
        ))
    }

    pub fn new_link(
        url: &str,
        attrs: Vec<(String, String)>,
        children: Vec<DomNode>,
    ) -> Self {
        let mut all_attrs = vec![("href".to_owned(), url.to_owned())];
        all_attrs.extend(attrs);
        Self::Container(ContainerNode::new("a", all_attrs, children))
    }

    pub fn text_len(&self) -> usize {
        match self {
            Self::Container(c) => c.text_len(),
            Self::Text(t) => t.len(),
            Self::LineBreak => 1,
        }
    }

    pub fn is_block_node(&self) -> bool {
        matches!(self, Self::Container(c) if c.is_block())
    }

    pub fn as_container(&self) -> Option<&ContainerNode> {
        match self {
            Self::Container(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_container_mut(&mut self) -> Option<&mut ContainerNode> {
        match self {
            Self::Container(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextNode> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextNode {
    data: String,
}

impl TextNode {
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Length in UTF-16 code units.
    pub fn len(&self) -> usize {
        utf16_len(&self.data)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_blank(&self) -> bool {
        self.data.chars().all(char::is_whitespace)
    }

    pub fn slice(&self, start: usize, end: usize) -> TextNode {
        TextNode::from(utf16_slice(&self.data, start, end))
    }

    /// Keep `[0, offset)` and return the rest as a new node.
    pub fn split_off(&mut self, offset: usize) -> TextNode {
        let at = byte_index(&self.data, offset);
        TextNode {
            data: self.data.split_off(at),
        }
    }

    pub fn insert_str(&mut self, offset: usize, text: &str) {
        let at = byte_index(&self.data, offset);
        self.data.insert_str(at, text);
    }

    pub fn remove_range(&mut self, start: usize, end: usize) {
        let start = byte_index(&self.data, start);
        let end = byte_index(&self.data, end).max(start);
        self.data.replace_range(start..end, "");
    }

    pub fn push_str(&mut self, text: &str) {
        self.data.push_str(text);
    }
}

impl From<&str> for TextNode {
    fn from(data: &str) -> Self {
        Self {
            data: data.to_owned(),
        }
    }
}

/// What a container stands for, derived from its tag name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerNodeKind {
    /// A region root or detached fragment (empty tag name).
    Generic,
    Formatting(FormatKind),
    Link,
    List,
    ListItem,
    /// Any other block-level element (paragraph, heading, quote...).
    Block,
    /// Any other inline element (span, code, sup...).
    Inline,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContainerNode {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<DomNode>,
}

/// A text leaf together with the tags of every container above it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeafSpan {
    pub text: String,
    pub tags: Vec<String>,
}

impl LeafSpan {
    pub fn is_blank(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }

    pub fn has_format(&self, kind: FormatKind) -> bool {
        self.tags.iter().any(|tag| kind.matches_tag(tag))
    }
}

impl ContainerNode {
    pub fn new(
        tag: &str,
        attrs: Vec<(String, String)>,
        children: Vec<DomNode>,
    ) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs,
            children,
        }
    }

    /// A region root or detached fragment.
    pub fn new_generic(children: Vec<DomNode>) -> Self {
        Self::new("", Vec::new(), children)
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn children(&self) -> &[DomNode] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<DomNode> {
        &mut self.children
    }

    pub fn take_children(&mut self) -> Vec<DomNode> {
        std::mem::take(&mut self.children)
    }

    pub fn append_child(&mut self, child: DomNode) {
        self.children.push(child);
    }

    pub fn kind(&self) -> ContainerNodeKind {
        match self.tag.as_str() {
            "" => ContainerNodeKind::Generic,
            "a" => ContainerNodeKind::Link,
            "ol" | "ul" => ContainerNodeKind::List,
            "li" => ContainerNodeKind::ListItem,
            tag => {
                if let Some(kind) = FormatKind::from_tag(tag) {
                    ContainerNodeKind::Formatting(kind)
                } else if BLOCK_TAGS.contains(&tag) {
                    ContainerNodeKind::Block
                } else {
                    ContainerNodeKind::Inline
                }
            }
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(
            self.kind(),
            ContainerNodeKind::Block
                | ContainerNodeKind::List
                | ContainerNodeKind::ListItem
        )
    }

    pub fn is_link(&self) -> bool {
        self.kind() == ContainerNodeKind::Link
    }

    /// Same tag and attributes, ignoring children.
    pub fn same_shape(&self, other: &ContainerNode) -> bool {
        self.tag == other.tag && self.attrs == other.attrs
    }

    /// An empty container with the same tag and attributes.
    pub fn clone_shallow(&self) -> ContainerNode {
        ContainerNode {
            tag: self.tag.clone(),
            attrs: self.attrs.clone(),
            children: Vec::new(),
        }
    }

    /// `(start, end)` of every child in this container's coordinates.
    ///
    /// Two consecutive block-level children are separated by one code unit,
    /// so positions at the end of one item and the start of the next stay
    /// distinct.
    pub fn child_spans(&self) -> Vec<(usize, usize)> {
        let mut spans = Vec::with_capacity(self.children.len());
        let mut pos = 0;
        let mut prev_is_block = false;
        for (i, child) in self.children.iter().enumerate() {
            let is_block = child.is_block_node();
            if i > 0 && is_block && prev_is_block {
                pos += 1;
            }
            let start = pos;
            pos += child.text_len();
            spans.push((start, pos));
            prev_is_block = is_block;
        }
        spans
    }

    pub fn text_len(&self) -> usize {
        self.child_spans().last().map_or(0, |(_, end)| *end)
    }

    pub fn lookup(&self, handle: &DomHandle) -> Option<&DomNode> {
        let (first, rest) = handle.raw().split_first()?;
        let mut node = self.children.get(*first)?;
        for index in rest {
            node = node.as_container()?.children.get(*index)?;
        }
        Some(node)
    }

    pub fn lookup_mut(&mut self, handle: &DomHandle) -> Option<&mut DomNode> {
        let (first, rest) = handle.raw().split_first()?;
        let mut node = self.children.get_mut(*first)?;
        for index in rest {
            node = node.as_container_mut()?.children.get_mut(*index)?;
        }
        Some(node)
    }

    /// The container at `handle`, where the root handle is `self`.
    pub fn container_at(&self, handle: &DomHandle) -> Option<&ContainerNode> {
        if handle.is_root() {
            Some(self)
        } else {
            self.lookup(handle)?.as_container()
        }
    }

    pub fn container_at_mut(
        &mut self,
        handle: &DomHandle,
    ) -> Option<&mut ContainerNode> {
        if handle.is_root() {
            Some(self)
        } else {
            self.lookup_mut(handle)?.as_container_mut()
        }
    }

    /// Every container on the way from `self` (inclusive) down to the
    /// node at `handle` (inclusive when it is a container).
    pub fn containers_along(&self, handle: &DomHandle) -> Vec<&ContainerNode> {
        let mut found = vec![self];
        let mut current = self;
        for index in handle.raw() {
            match current.children.get(*index) {
                Some(DomNode::Container(c)) => {
                    found.push(c);
                    current = c;
                }
                _ => break,
            }
        }
        found
    }

    /// Text leaves in document order, each with its ancestor tags below
    /// `self`.
    pub fn text_leaves(&self) -> Vec<LeafSpan> {
        let mut leaves = Vec::new();
        collect_leaves(self, &mut Vec::new(), &mut leaves);
        leaves
    }

    /// The visible text. Line breaks and block separators become `\n`.
    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        let mut prev_is_block = false;
        for (i, child) in self.children.iter().enumerate() {
            let is_block = child.is_block_node();
            if i > 0 && is_block && prev_is_block {
                out.push('\n');
            }
            match child {
                DomNode::Container(c) => out.push_str(&c.to_plain_text()),
                DomNode::Text(t) => out.push_str(t.data()),
                DomNode::LineBreak => out.push('\n'),
            }
            prev_is_block = is_block;
        }
        out
    }

    /// Whether any list item exists in this subtree.
    pub fn has_list_item(&self) -> bool {
        self.children.iter().any(|child| match child {
            DomNode::Container(c) => {
                c.kind() == ContainerNodeKind::ListItem || c.has_list_item()
            }
            _ => false,
        })
    }
}

fn collect_leaves(
    container: &ContainerNode,
    tags: &mut Vec<String>,
    leaves: &mut Vec<LeafSpan>,
) {
    for child in &container.children {
        match child {
            DomNode::Text(t) => leaves.push(LeafSpan {
                text: t.data().to_owned(),
                tags: tags.clone(),
            }),
            DomNode::Container(c) => {
                tags.push(c.tag.clone());
                collect_leaves(c, tags, leaves);
                tags.pop();
            }
            DomNode::LineBreak => {}
        }
    }
}
