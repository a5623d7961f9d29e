// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The editable surface: a block's rich-text region plus the native
//! editing commands the engine drives it with.

use std::collections::HashMap;

use crate::dom::{ContainerNode, Dom, DomNode, ToHtml};
use crate::selection::Selection;
use crate::FormatKind;

/// The native editing capabilities a block needs from its text surface.
/// Commands are scoped to the selection they are given.
pub trait EditableSurface {
    fn markup(&self) -> String;

    fn set_markup(&mut self, markup: &str);

    fn plain_text(&self) -> String;

    fn text_len(&self) -> usize;

    /// Whether `kind` is active at the insertion point. For a range,
    /// whether every non-whitespace leaf in it carries `kind`.
    fn query_format(&self, selection: &Selection, kind: FormatKind) -> bool;

    fn toggle_format(&mut self, selection: &Selection, kind: FormatKind);

    fn clear_formatting(&mut self, selection: &Selection);

    /// Type `text`, replacing any selected content. Returns the caret
    /// offset after the text.
    fn insert_text(&mut self, selection: &Selection, text: &str) -> usize;

    /// The paragraph-break key. Returns the caret offset on the new line.
    fn enter(&mut self, selection: &Selection) -> usize;

    fn clone_contents(&self, start: usize, end: usize) -> ContainerNode;

    fn extract_range(&mut self, start: usize, end: usize) -> ContainerNode;

    /// Insert `node` at `pos` outside any inline container there. Returns
    /// the offset just after the inserted node.
    fn insert_node(&mut self, pos: usize, node: DomNode) -> usize;

    fn unwrap_links(&mut self, start: usize, end: usize) -> bool;

    fn link_url_at(&self, pos: usize) -> Option<String>;

    fn has_list_item(&self) -> bool;
}

/// Formats toggled at a collapsed caret with nothing typed yet. They only
/// apply while the selection stays where they were set.
#[derive(Clone, Debug, PartialEq, Eq)]
struct PendingFormat {
    at: Selection,
    overrides: HashMap<FormatKind, bool>,
}

/// [EditableSurface] over an in-memory [Dom].
#[derive(Clone, Debug, Default)]
pub struct DomSurface {
    dom: Dom,
    pending: Option<PendingFormat>,
}

impl DomSurface {
    pub fn new(markup: &str) -> Self {
        Self {
            dom: Dom::from_markup(markup),
            pending: None,
        }
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    fn pending_for(&self, selection: &Selection) -> Option<&PendingFormat> {
        self.pending.as_ref().filter(|p| p.at == *selection)
    }

    fn active_at(&self, pos: usize, kind: FormatKind) -> bool {
        self.dom
            .document()
            .containers_at(pos)
            .iter()
            .any(|c| kind.matches_tag(c.tag()))
    }

    fn fully_formatted(
        &self,
        start: usize,
        end: usize,
        kind: FormatKind,
    ) -> bool {
        let leaves = self.dom.document().slice(start, end).text_leaves();
        let mut visible = leaves.iter().filter(|l| !l.is_blank()).peekable();
        visible.peek().is_some() && visible.all(|l| l.has_format(kind))
    }

    fn set_override(
        &mut self,
        selection: &Selection,
        kind: FormatKind,
        on: bool,
    ) {
        match self.pending.as_mut().filter(|p| p.at == *selection) {
            Some(pending) => {
                pending.overrides.insert(kind, on);
            }
            None => {
                self.pending = Some(PendingFormat {
                    at: selection.clone(),
                    overrides: HashMap::from([(kind, on)]),
                });
            }
        }
    }

    /// Delete the selected content, if any, returning the collapsed caret.
    fn collapse(&mut self, selection: &Selection) -> usize {
        if !selection.is_collapsed() {
            let document = self.dom.document_mut();
            document.delete_range(selection.start(), selection.end());
            document.normalize();
        }
        selection.start()
    }
}

impl EditableSurface for DomSurface {
    fn markup(&self) -> String {
        self.dom.to_html()
    }

    fn set_markup(&mut self, markup: &str) {
        self.dom = Dom::from_markup(markup);
        self.pending = None;
        self.dom.assert_invariants();
    }

    fn plain_text(&self) -> String {
        self.dom.to_plain_text()
    }

    fn text_len(&self) -> usize {
        self.dom.text_len()
    }

    fn query_format(&self, selection: &Selection, kind: FormatKind) -> bool {
        if !selection.is_collapsed() {
            return self.fully_formatted(
                selection.start(),
                selection.end(),
                kind,
            );
        }
        self.pending_for(selection)
            .and_then(|p| p.overrides.get(&kind).copied())
            .unwrap_or_else(|| self.active_at(selection.start(), kind))
    }

    fn toggle_format(&mut self, selection: &Selection, kind: FormatKind) {
        if selection.is_collapsed() {
            let on = !self.query_format(selection, kind);
            self.set_override(selection, kind, on);
            return;
        }
        let (start, end) = (selection.start(), selection.end());
        let fully_formatted = self.fully_formatted(start, end, kind);
        let document = self.dom.document_mut();
        if fully_formatted {
            document.remove_format(start, end, kind);
        } else {
            document.apply_format(start, end, kind);
        }
        self.dom.assert_invariants();
    }

    fn clear_formatting(&mut self, selection: &Selection) {
        if selection.is_collapsed() {
            for kind in FormatKind::all() {
                if self.query_format(selection, kind) {
                    self.set_override(selection, kind, false);
                }
            }
            return;
        }
        self.dom
            .document_mut()
            .remove_all_formats(selection.start(), selection.end());
        self.dom.assert_invariants();
    }

    fn insert_text(&mut self, selection: &Selection, text: &str) -> usize {
        let pending = self.pending_for(selection).cloned();
        self.pending = None;
        let pos = self.collapse(selection);
        let active: Vec<(FormatKind, bool)> = FormatKind::all()
            .map(|kind| (kind, self.active_at(pos, kind)))
            .collect();
        let document = self.dom.document_mut();
        let end = document.insert_text_at(pos, text);
        if let Some(pending) = pending {
            for (kind, was_active) in active {
                match pending.overrides.get(&kind) {
                    Some(true) if !was_active => {
                        document.apply_format(pos, end, kind)
                    }
                    Some(false) if was_active => {
                        document.remove_format(pos, end, kind)
                    }
                    _ => {}
                }
            }
        }
        self.dom.assert_invariants();
        end
    }

    fn enter(&mut self, selection: &Selection) -> usize {
        self.pending = None;
        let pos = self.collapse(selection);
        let caret = self.dom.document_mut().split_block_at(pos);
        self.dom.assert_invariants();
        caret
    }

    fn clone_contents(&self, start: usize, end: usize) -> ContainerNode {
        self.dom.document().slice(start, end)
    }

    fn extract_range(&mut self, start: usize, end: usize) -> ContainerNode {
        self.pending = None;
        let fragment = self.dom.document_mut().extract_range(start, end);
        self.dom.assert_invariants();
        fragment
    }

    fn insert_node(&mut self, pos: usize, node: DomNode) -> usize {
        self.pending = None;
        let end = self
            .dom
            .document_mut()
            .insert_node_between_inlines(pos, node);
        self.dom.assert_invariants();
        end
    }

    fn unwrap_links(&mut self, start: usize, end: usize) -> bool {
        let changed = self.dom.document_mut().unwrap_links(start, end);
        if changed {
            self.dom.document_mut().normalize();
            self.dom.assert_invariants();
        }
        changed
    }

    fn link_url_at(&self, pos: usize) -> Option<String> {
        self.dom.document().link_url_at(pos)
    }

    fn has_list_item(&self) -> bool {
        self.dom.document().has_list_item()
    }
}

#[cfg(test)]
mod test {
    use speculoos::prelude::*;

    use super::*;

    fn caret(pos: usize) -> Selection {
        Selection::caret("b", pos)
    }

    fn range(start: usize, end: usize) -> Selection {
        Selection::range("b", start, end)
    }

    #[test]
    fn query_at_caret_reads_the_left_leaf() {
        let surface = DomSurface::new("<strong>ab</strong>cd");
        assert!(surface.query_format(&caret(2), FormatKind::Bold));
        assert!(!surface.query_format(&caret(3), FormatKind::Bold));
    }

    #[test]
    fn toggling_a_range_applies_then_removes() {
        let mut surface = DomSurface::new("abcd");
        surface.toggle_format(&range(1, 3), FormatKind::Bold);
        assert_eq!(surface.markup(), "a<strong>bc</strong>d");
        surface.toggle_format(&range(1, 3), FormatKind::Bold);
        assert_eq!(surface.markup(), "abcd");
    }

    #[test]
    fn toggling_a_mixed_range_formats_all_of_it() {
        let mut surface = DomSurface::new("<em>ab</em>cd");
        surface.toggle_format(&range(0, 4), FormatKind::Italic);
        assert_eq!(surface.markup(), "<em>abcd</em>");
    }

    #[test]
    fn caret_toggle_applies_to_the_next_typed_text() {
        let mut surface = DomSurface::new("ab");
        surface.toggle_format(&caret(2), FormatKind::Bold);
        assert!(surface.query_format(&caret(2), FormatKind::Bold));
        let end = surface.insert_text(&caret(2), "c");
        assert_eq!(end, 3);
        assert_eq!(surface.markup(), "ab<strong>c</strong>");
    }

    #[test]
    fn caret_toggle_is_forgotten_when_the_caret_moves() {
        let mut surface = DomSurface::new("ab");
        surface.toggle_format(&caret(2), FormatKind::Bold);
        assert!(!surface.query_format(&caret(1), FormatKind::Bold));
        surface.insert_text(&caret(1), "x");
        assert_eq!(surface.markup(), "axb");
    }

    #[test]
    fn clear_at_caret_turns_off_inherited_formats() {
        let mut surface =
            DomSurface::new("<li><strong><em>ab</em></strong></li>");
        let next = surface.enter(&caret(2));
        assert_eq!(next, 3);
        assert!(surface.query_format(&caret(next), FormatKind::Bold));
        surface.clear_formatting(&caret(next));
        for kind in FormatKind::all() {
            assert!(!surface.query_format(&caret(next), kind));
        }
        surface.insert_text(&caret(next), "c");
        assert_that!(surface.markup()).is_equal_to(
            "<li><strong><em>ab</em></strong></li><li>c</li>".to_owned(),
        );
    }

    #[test]
    fn clear_over_a_range_unwraps_formatting() {
        let mut surface = DomSurface::new("<u>ab</u><del>cd</del>");
        surface.clear_formatting(&range(0, 4));
        assert_eq!(surface.markup(), "abcd");
    }

    #[test]
    fn typing_over_a_range_replaces_it() {
        let mut surface = DomSurface::new("a<strong>bc</strong>d");
        assert_eq!(surface.insert_text(&range(1, 3), "X"), 2);
        assert_eq!(surface.markup(), "aXd");
    }
}
