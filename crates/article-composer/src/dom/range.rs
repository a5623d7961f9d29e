// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Position and range primitives over a region tree: locating the caret,
//! cloning and extracting ranges, inserting text and nodes.

use crate::dom::nodes::{ContainerNode, ContainerNodeKind, DomNode};
use crate::dom::unicode::utf16_len;
use crate::dom::DomHandle;

/// Where typed text would land for a given offset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Caret {
    /// Inside, or at either end of, a text node.
    Text { handle: DomHandle, offset: usize },
    /// Between two children of a container, or inside an empty one.
    Between { parent: DomHandle, index: usize },
}

impl Caret {
    /// The handle of the innermost container holding the caret.
    pub fn container_handle(&self) -> DomHandle {
        match self {
            Self::Text { handle, .. } => {
                handle.parent_handle().unwrap_or_default()
            }
            Self::Between { parent, .. } => parent.clone(),
        }
    }
}

impl ContainerNode {
    /// Resolve an offset to a caret position.
    ///
    /// At a boundary between two leaves the left one wins, so text typed at
    /// the end of a formatted run continues that run. Links and line breaks
    /// are the exception: a caret at their end sits after them.
    pub fn locate(&self, pos: usize) -> Caret {
        let pos = pos.min(self.text_len());
        locate_in(self, DomHandle::root(), pos)
    }

    /// The containers enclosing the caret at `pos`, outermost first,
    /// including `self`.
    pub fn containers_at(&self, pos: usize) -> Vec<&ContainerNode> {
        let caret = self.locate(pos);
        self.containers_along(&caret.container_handle())
    }

    /// A detached copy of `[start, end)`. Every ancestor of a copied leaf
    /// below `self` is copied with it, so formatting context survives.
    pub fn slice(&self, start: usize, end: usize) -> ContainerNode {
        let mut out = self.clone_shallow();
        if start >= end {
            return out;
        }
        for (child, (cs, ce)) in self.children().iter().zip(self.child_spans())
        {
            if ce <= start || cs >= end {
                continue;
            }
            let from = start.saturating_sub(cs);
            let to = (end - cs).min(ce - cs);
            out.append_child(match child {
                DomNode::Text(t) => DomNode::Text(t.slice(from, to)),
                DomNode::Container(c) => DomNode::Container(c.slice(from, to)),
                DomNode::LineBreak => DomNode::LineBreak,
            });
        }
        out
    }

    /// Remove `[start, end)`. Block containers that are only partly covered
    /// keep their uncovered content; they are not merged.
    pub fn delete_range(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let spans = self.child_spans();
        let children = self.children_mut();
        for i in (0..children.len()).rev() {
            let (cs, ce) = spans[i];
            if ce <= start || cs >= end {
                continue;
            }
            if start <= cs && ce <= end {
                children.remove(i);
                continue;
            }
            let from = start.saturating_sub(cs);
            let to = (end - cs).min(ce - cs);
            match &mut children[i] {
                DomNode::Text(t) => t.remove_range(from, to),
                DomNode::Container(c) => c.delete_range(from, to),
                DomNode::LineBreak => {}
            }
        }
    }

    /// Remove `[start, end)` and return it as an inline-only fragment.
    /// Block structure inside the fragment is flattened, with a line break
    /// between consecutive blocks.
    pub fn extract_range(&mut self, start: usize, end: usize) -> ContainerNode {
        let fragment = self.slice(start, end);
        self.delete_range(start, end);
        self.normalize();
        let mut flat = ContainerNode::new_generic(flatten_blocks(fragment));
        flat.normalize();
        flat
    }

    /// Insert `text` at `pos`, returning the offset just after it.
    pub fn insert_text_at(&mut self, pos: usize, text: &str) -> usize {
        let pos = pos.min(self.text_len());
        match self.locate(pos) {
            Caret::Text { handle, offset } => {
                if let Some(DomNode::Text(t)) = self.lookup_mut(&handle) {
                    t.insert_str(offset, text);
                }
            }
            Caret::Between { parent, index } => {
                if let Some(c) = self.container_at_mut(&parent) {
                    c.children_mut().insert(index, DomNode::new_text(text));
                }
            }
        }
        pos + utf16_len(text)
    }

    /// Insert `node` at `pos`, splitting a text node if needed. Returns the
    /// offset just after the inserted node.
    pub fn insert_node_at(&mut self, pos: usize, node: DomNode) -> usize {
        let pos = pos.min(self.text_len());
        let len = node.text_len();
        let (parent, index) = match self.locate(pos) {
            Caret::Text { handle, offset } => {
                let right = match self.lookup_mut(&handle) {
                    Some(DomNode::Text(t)) => t.split_off(offset),
                    _ => Default::default(),
                };
                let index = handle.index_in_parent().unwrap_or(0) + 1;
                let parent = handle.parent_handle().unwrap_or_default();
                if !right.is_empty() {
                    if let Some(c) = self.container_at_mut(&parent) {
                        c.children_mut().insert(index, DomNode::Text(right));
                    }
                }
                (parent, index)
            }
            Caret::Between { parent, index } => (parent, index),
        };
        if let Some(c) = self.container_at_mut(&parent) {
            let index = index.min(c.children().len());
            c.children_mut().insert(index, node);
        }
        pos + len
    }

    /// Insert `node` at `pos` as a direct child of the innermost block
    /// there, or of `self` outside any block. Inline containers enclosing
    /// `pos` are split around it, so the node never lands inside a link or
    /// a formatting tag. Returns the offset just after the inserted node.
    pub fn insert_node_between_inlines(
        &mut self,
        pos: usize,
        node: DomNode,
    ) -> usize {
        let pos = pos.min(self.text_len());
        let len = node.text_len();
        self.split_at(pos);
        let (parent, base) = self
            .innermost_block(pos)
            .unwrap_or((DomHandle::root(), 0));
        if let Some(c) = self.container_at_mut(&parent) {
            let local = pos - base;
            let index = c
                .child_spans()
                .iter()
                .position(|(start, _)| *start >= local)
                .unwrap_or(c.children().len());
            c.children_mut().insert(index, node);
        }
        self.normalize();
        pos + len
    }

    /// Break the innermost block containing `pos` in two, as the
    /// paragraph-break key does. Formatting open at the caret is carried
    /// into the new block as empty containers, so the next typed text
    /// inherits it. Outside any block a line break is inserted instead.
    /// Returns the caret offset at the start of the new line.
    pub fn split_block_at(&mut self, pos: usize) -> usize {
        let pos = pos.min(self.text_len());
        let Some((block_handle, block_start)) = self.innermost_block(pos)
        else {
            return self.insert_node_at(pos, DomNode::LineBreak);
        };

        let shells: Vec<ContainerNode> = self
            .containers_at(pos)
            .into_iter()
            .skip(block_handle.raw().len() + 1)
            .filter(|c| !c.is_block() && !c.is_link())
            .map(ContainerNode::clone_shallow)
            .collect();

        let Some(block) = self.container_at_mut(&block_handle) else {
            return pos;
        };
        let mut right = block.split_off_at(pos - block_start);
        if right.children().is_empty() {
            let shell = shells.into_iter().rev().fold(
                None,
                |inner: Option<DomNode>, mut shell| {
                    if let Some(inner) = inner {
                        shell.append_child(inner);
                    }
                    Some(DomNode::Container(shell))
                },
            );
            if let Some(shell) = shell {
                right.append_child(shell);
            }
        }

        let parent = block_handle.parent_handle().unwrap_or_default();
        let index = block_handle.index_in_parent().unwrap_or(0) + 1;
        if let Some(c) = self.container_at_mut(&parent) {
            c.children_mut().insert(index, DomNode::Container(right));
        }
        pos + 1
    }

    /// The deepest block-level container whose extent includes `pos`, with
    /// its start offset in `self`'s coordinates.
    fn innermost_block(&self, pos: usize) -> Option<(DomHandle, usize)> {
        let mut found = None;
        let mut current = self;
        let mut handle = DomHandle::root();
        let mut base = 0;
        'descend: loop {
            for (i, (child, (cs, ce))) in current
                .children()
                .iter()
                .zip(current.child_spans())
                .enumerate()
            {
                if let DomNode::Container(c) = child {
                    if c.is_block() && cs <= pos - base && pos - base <= ce {
                        handle = handle.child_handle(i);
                        base += cs;
                        found = Some((handle.clone(), base));
                        current = c;
                        continue 'descend;
                    }
                }
            }
            break;
        }
        found
    }

    /// Unwrap every link touching `[start, end)`, or containing the caret
    /// when `start == end`. Returns whether anything changed.
    pub fn unwrap_links(&mut self, start: usize, end: usize) -> bool {
        let end = end.max(start + 1);
        let spans = self.child_spans();
        let mut changed = false;
        let children = self.children_mut();
        for i in (0..children.len()).rev() {
            let (cs, ce) = spans[i];
            if cs >= end || ce <= start {
                continue;
            }
            if let DomNode::Container(c) = &mut children[i] {
                changed |=
                    c.unwrap_links(start.saturating_sub(cs), end - cs);
                if c.is_link() {
                    let inner = c.take_children();
                    children.splice(i..=i, inner);
                    changed = true;
                }
            }
        }
        changed
    }

    /// The target of the link enclosing `pos`, if any.
    pub fn link_url_at(&self, pos: usize) -> Option<String> {
        let pos = pos.min(self.text_len());
        find_link(self, pos)
    }
}

fn find_link(container: &ContainerNode, pos: usize) -> Option<String> {
    let spans = container.child_spans();
    for (child, (cs, ce)) in container.children().iter().zip(spans) {
        if let DomNode::Container(c) = child {
            if cs <= pos && pos < ce || (cs == pos && ce == pos) {
                if c.is_link() {
                    return c.get_attr("href").map(str::to_owned);
                }
                if let Some(url) = find_link(c, pos - cs) {
                    return Some(url);
                }
            }
        }
    }
    None
}

fn locate_in(
    container: &ContainerNode,
    handle: DomHandle,
    pos: usize,
) -> Caret {
    let mut after = None;
    for (i, (child, (start, end))) in container
        .children()
        .iter()
        .zip(container.child_spans())
        .enumerate()
    {
        if pos < start {
            return Caret::Between {
                parent: handle,
                index: after.unwrap_or(i),
            };
        }
        if pos > end {
            continue;
        }
        match child {
            DomNode::Text(_) => {
                return Caret::Text {
                    handle: handle.child_handle(i),
                    offset: pos - start,
                };
            }
            DomNode::LineBreak => {
                if pos == start {
                    return Caret::Between {
                        parent: handle,
                        index: i,
                    };
                }
                after = Some(i + 1);
            }
            DomNode::Container(c) => {
                if c.is_link() && pos == end && start < end {
                    after = Some(i + 1);
                    continue;
                }
                return locate_in(c, handle.child_handle(i), pos - start);
            }
        }
    }
    Caret::Between {
        parent: handle,
        index: after.unwrap_or(container.children().len()),
    }
}

fn flatten_blocks(mut fragment: ContainerNode) -> Vec<DomNode> {
    let mut out = Vec::new();
    let mut prev_is_block = false;
    for child in fragment.take_children() {
        match child {
            DomNode::Container(c) if c.is_block() => {
                if prev_is_block {
                    out.push(DomNode::LineBreak);
                }
                out.extend(flatten_blocks(c));
                prev_is_block = true;
            }
            DomNode::Container(c)
                if c.kind() == ContainerNodeKind::Generic =>
            {
                out.extend(flatten_blocks(c));
                prev_is_block = false;
            }
            other => {
                out.push(other);
                prev_is_block = false;
            }
        }
    }
    out
}
