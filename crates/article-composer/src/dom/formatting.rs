// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Applying and removing inline formatting over a range of a region tree.
//!
//! Every operation first splits inline containers at the range edges, so
//! that each inline container lies wholly inside or wholly outside the
//! range, then wraps or unwraps, then normalizes.

use crate::dom::nodes::{ContainerNode, ContainerNodeKind, DomNode};
use crate::FormatKind;

impl ContainerNode {
    /// Make `pos` a child boundary at every inline level. Block containers
    /// are descended into but never split.
    pub fn split_at(&mut self, pos: usize) {
        let spans = self.child_spans();
        let Some(i) = spans.iter().position(|(s, e)| *s < pos && pos < *e)
        else {
            return;
        };
        let local = pos - spans[i].0;
        let right = match &mut self.children_mut()[i] {
            DomNode::Text(t) => Some(DomNode::Text(t.split_off(local))),
            DomNode::Container(c) if c.is_block() => {
                c.split_at(local);
                None
            }
            DomNode::Container(c) => {
                Some(DomNode::Container(c.split_off_at(local)))
            }
            DomNode::LineBreak => None,
        };
        if let Some(right) = right {
            self.children_mut().insert(i + 1, right);
        }
    }

    /// Keep `[0, pos)` in `self` and return `[pos, len)` in a container of
    /// the same shape.
    pub fn split_off_at(&mut self, pos: usize) -> ContainerNode {
        self.split_at(pos);
        let index = self
            .child_spans()
            .iter()
            .position(|(start, _)| *start >= pos)
            .unwrap_or(self.children().len());
        let mut right = self.clone_shallow();
        *right.children_mut() = self.children_mut().split_off(index);
        right
    }

    /// Wrap every unformatted text leaf in `[start, end)` in `kind`'s
    /// canonical tag.
    pub fn apply_format(&mut self, start: usize, end: usize, kind: FormatKind) {
        if start >= end {
            return;
        }
        self.split_at(start);
        self.split_at(end);
        wrap_unformatted(self, start, end, kind, false);
        self.normalize();
    }

    /// Unwrap every container carrying `kind` inside `[start, end)`.
    pub fn remove_format(
        &mut self,
        start: usize,
        end: usize,
        kind: FormatKind,
    ) {
        if start >= end {
            return;
        }
        self.split_at(start);
        self.split_at(end);
        unwrap_matching(self, start, end, &|c: &ContainerNode| {
            c.kind() == ContainerNodeKind::Formatting(kind)
        });
        self.normalize();
    }

    /// Unwrap every formatting container inside `[start, end)`.
    pub fn remove_all_formats(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        self.split_at(start);
        self.split_at(end);
        unwrap_matching(self, start, end, &|c: &ContainerNode| {
            matches!(c.kind(), ContainerNodeKind::Formatting(_))
        });
        self.normalize();
    }

    /// Drop empty text and empty inline containers, then merge adjacent
    /// texts and adjacent inline containers of the same shape.
    pub fn normalize(&mut self) {
        for child in self.children_mut().iter_mut() {
            if let DomNode::Container(c) = child {
                c.normalize();
            }
        }
        let children = self.take_children();
        let mut merged: Vec<DomNode> = Vec::with_capacity(children.len());
        for child in children {
            let keep = match &child {
                DomNode::Text(t) => !t.is_empty(),
                DomNode::Container(c) => {
                    c.is_block() || !c.children().is_empty()
                }
                DomNode::LineBreak => true,
            };
            if !keep {
                continue;
            }
            let leftover = match merged.last_mut() {
                Some(last) => merge_into(last, child),
                None => Some(child),
            };
            if let Some(child) = leftover {
                merged.push(child);
            }
        }
        *self.children_mut() = merged;
    }
}

fn merge_into(last: &mut DomNode, next: DomNode) -> Option<DomNode> {
    match (last, next) {
        (DomNode::Text(prev), DomNode::Text(t)) => {
            prev.push_str(t.data());
            None
        }
        (DomNode::Container(prev), DomNode::Container(mut c))
            if !prev.is_block() && !c.is_block() && prev.same_shape(&c) =>
        {
            prev.children_mut().extend(c.take_children());
            prev.normalize();
            None
        }
        (_, next) => Some(next),
    }
}

fn wrap_unformatted(
    container: &mut ContainerNode,
    start: usize,
    end: usize,
    kind: FormatKind,
    inherited: bool,
) {
    let spans = container.child_spans();
    for (i, (cs, ce)) in spans.into_iter().enumerate() {
        if ce <= start || cs >= end {
            continue;
        }
        let child = &mut container.children_mut()[i];
        match child {
            DomNode::Text(t) if !inherited && !t.is_empty() => {
                let text = std::mem::replace(child, DomNode::LineBreak);
                *child = DomNode::new_formatting(kind, vec![text]);
            }
            DomNode::Container(c) => {
                let formatted = inherited
                    || c.kind() == ContainerNodeKind::Formatting(kind);
                let local_end = (end - cs).min(ce - cs);
                wrap_unformatted(
                    c,
                    start.saturating_sub(cs),
                    local_end,
                    kind,
                    formatted,
                );
            }
            _ => {}
        }
    }
}

fn unwrap_matching(
    container: &mut ContainerNode,
    start: usize,
    end: usize,
    matches: &dyn Fn(&ContainerNode) -> bool,
) {
    let spans = container.child_spans();
    let children = container.children_mut();
    for i in (0..children.len()).rev() {
        let (cs, ce) = spans[i];
        if ce <= start || cs >= end {
            continue;
        }
        if let DomNode::Container(c) = &mut children[i] {
            unwrap_matching(
                c,
                start.saturating_sub(cs),
                (end - cs).min(ce - cs),
                matches,
            );
            if !c.is_block() && matches(c) && start <= cs && ce <= end {
                let inner = c.take_children();
                children.splice(i..=i, inner);
            }
        }
    }
}
