// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Keeps one block's surface and the shared formatting slot in step.
//!
//! The surface is the observed truth and the slot the requested truth.
//! On each event the reconciler either pushes a requested change into the
//! surface or pulls the observed state out of it, never both. While its
//! own change is settling it does not observe, so it never mistakes its
//! own write for a new request.

use std::rc::Rc;

use crate::config::ComposerConfig;
use crate::event_loop::{EventLoop, Task};
use crate::format_detector;
use crate::formatting_slot::{FormattingSlot, SlotWrite};
use crate::lifecycle::{focus_baseline, FocusBaseline};
use crate::selection::{BlockId, Selection, SelectionInspector};
use crate::surface::EditableSurface;
use crate::{FormatKind, FormattingState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileState {
    /// Another block, or none, holds focus.
    Idle,
    /// Focused; the surface is authoritative.
    Observing,
    /// A formatting command is settling; observation is suppressed until
    /// the settle task for `generation` runs.
    Applying { generation: u64 },
    /// Forcing every flag off.
    Resetting,
}

/// What a formatting change in the slot led to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub applied: Vec<FormatKind>,
    /// Turning these on over partly formatted text was ambiguous, so the
    /// surface was left alone.
    pub refused: Vec<FormatKind>,
}

impl ToggleOutcome {
    /// The surface was mutated and its markup should go to the host.
    pub fn content_changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

pub struct ToggleReconciler {
    block_id: BlockId,
    slot: FormattingSlot,
    inspector: SelectionInspector,
    event_loop: EventLoop,
    config: Rc<ComposerConfig>,
    state: ReconcileState,
    generation: u64,
    /// The slot value this block last wrote or acknowledged.
    last_seen: SlotWrite,
}

impl ToggleReconciler {
    pub fn new(
        block_id: &str,
        slot: FormattingSlot,
        inspector: SelectionInspector,
        event_loop: EventLoop,
        config: Rc<ComposerConfig>,
    ) -> Self {
        Self {
            block_id: block_id.to_owned(),
            slot,
            inspector,
            event_loop,
            config,
            state: ReconcileState::Idle,
            generation: 0,
            last_seen: SlotWrite::default(),
        }
    }

    pub fn state(&self) -> ReconcileState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn transition(&mut self, state: ReconcileState) {
        if self.state != state {
            tracing::debug!(
                block = %self.block_id,
                from = ?self.state,
                to = ?state,
                "reconcile state"
            );
        }
        self.state = state;
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Write through this block's writer and remember the result, so the
    /// write is not later taken for a request.
    fn write(&mut self, state: FormattingState) -> bool {
        let Some(writer) = self.slot.writer_for(&self.block_id) else {
            return false;
        };
        match writer.write(state, false) {
            Ok(write) => {
                self.last_seen = write;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "formatting write dropped");
                false
            }
        }
    }

    /// The block gained focus. A freshly created blank block starts from
    /// cleared formatting; any other block shows what its caret sees.
    pub fn focus_gained<S: EditableSurface + ?Sized>(
        &mut self,
        surface: &mut S,
    ) {
        let Some(identity) = self.slot.focused() else {
            return;
        };
        if identity.block_id != self.block_id {
            return;
        }
        self.next_generation();
        self.last_seen = self.slot.last_write();
        self.transition(ReconcileState::Observing);
        match focus_baseline(&identity, surface) {
            FocusBaseline::Reset => self.reset(surface),
            FocusBaseline::Observe => self.pull(surface),
        }
    }

    /// Focus moved elsewhere. Pending settle and reset work for this block
    /// goes stale.
    pub fn focus_lost(&mut self) {
        self.next_generation();
        self.transition(ReconcileState::Idle);
    }

    /// Reflect the surface's formatting into the slot. Skipped unless
    /// observing.
    pub fn pull<S: EditableSurface + ?Sized>(&mut self, surface: &S) {
        if self.state != ReconcileState::Observing {
            tracing::trace!(
                block = %self.block_id,
                state = ?self.state,
                "pull skipped"
            );
            return;
        }
        let Some(selection) = self.inspector.selection_in_block() else {
            return;
        };
        let observed = format_detector::observe(surface, &selection);
        tracing::trace!(block = %self.block_id, ?observed, "pull");
        if observed != self.slot.read() {
            self.write(observed);
        }
    }

    /// The slot changed. User-initiated changes become formatting commands
    /// on the surface; anything else is only acknowledged.
    pub fn on_formatting_change<S: EditableSurface + ?Sized>(
        &mut self,
        surface: &mut S,
    ) -> ToggleOutcome {
        let mut outcome = ToggleOutcome::default();
        let write = self.slot.last_write();
        if write.revision <= self.last_seen.revision {
            return outcome;
        }
        let previous = self.last_seen.state;
        self.last_seen = write;
        if !write.user_initiated
            || self.state != ReconcileState::Observing
            || !self.slot.is_focused(&self.block_id)
        {
            return outcome;
        }
        let Some(selection) = self.inspector.selection_in_block() else {
            tracing::debug!(
                block = %self.block_id,
                "toggle without selection, restoring flags"
            );
            outcome.refused = write.state.changed_kinds(&previous);
            self.write(previous);
            return outcome;
        };

        for kind in write.state.changed_kinds(&previous) {
            if self.is_ambiguous(surface, &selection, kind, previous.get(kind))
            {
                tracing::debug!(
                    block = %self.block_id,
                    %kind,
                    "refusing to turn on partly applied format"
                );
                outcome.refused.push(kind);
            } else {
                surface.toggle_format(&selection, kind);
                outcome.applied.push(kind);
            }
        }

        if !outcome.refused.is_empty() {
            let mut restored = self.slot.read();
            for kind in &outcome.refused {
                restored.set(*kind, previous.get(*kind));
            }
            self.write(restored);
        }
        if outcome.content_changed() {
            let generation = self.next_generation();
            self.transition(ReconcileState::Applying { generation });
            self.event_loop.post(
                self.config.settle_ticks,
                Task::Settle {
                    block: self.block_id.clone(),
                    generation,
                },
            );
        }
        outcome
    }

    /// A request to turn `kind` on over a range that already has it in
    /// places cannot be resolved without guessing.
    fn is_ambiguous<S: EditableSurface + ?Sized>(
        &self,
        surface: &S,
        selection: &Selection,
        kind: FormatKind,
        was_on: bool,
    ) -> bool {
        if was_on || selection.is_collapsed() {
            return false;
        }
        let fragment =
            surface.clone_contents(selection.start(), selection.end());
        format_detector::coverage(&fragment, kind)
            == format_detector::Coverage::Mixed
    }

    /// The settle delay after an applied command has passed.
    pub fn settle<S: EditableSurface + ?Sized>(
        &mut self,
        generation: u64,
        surface: &S,
    ) {
        if self.state != (ReconcileState::Applying { generation }) {
            tracing::trace!(block = %self.block_id, generation, "stale settle");
            return;
        }
        self.transition(ReconcileState::Observing);
        self.pull(surface);
    }

    /// Force every flag off and clear formats still active at the caret.
    pub fn reset<S: EditableSurface + ?Sized>(&mut self, surface: &mut S) {
        if !self.slot.is_focused(&self.block_id) {
            return;
        }
        self.transition(ReconcileState::Resetting);
        self.write(FormattingState::default());
        if let Some(selection) = self
            .inspector
            .selection_in_block()
            .filter(Selection::is_collapsed)
        {
            if FormatKind::all().any(|k| surface.query_format(&selection, k)) {
                surface.clear_formatting(&selection);
            }
        }
        self.transition(ReconcileState::Observing);
    }

    /// Enter in a list: once the native surface has made the new line,
    /// reset so it does not inherit the previous item's formatting.
    pub fn schedule_list_reset(&mut self) {
        self.event_loop.post(
            self.config.list_enter_ticks,
            Task::ResetAfterListEnter {
                block: self.block_id.clone(),
                generation: self.generation,
            },
        );
    }

    pub fn list_reset_due<S: EditableSurface + ?Sized>(
        &mut self,
        generation: u64,
        surface: &mut S,
    ) {
        if generation != self.generation || self.state == ReconcileState::Idle
        {
            tracing::trace!(
                block = %self.block_id,
                generation,
                "stale list reset"
            );
            return;
        }
        self.reset(surface);
    }
}

#[cfg(test)]
mod test {
    use speculoos::prelude::*;

    use super::*;
    use crate::selection::SharedSelection;
    use crate::surface::DomSurface;

    struct Fixture {
        slot: FormattingSlot,
        selection: SharedSelection,
        event_loop: EventLoop,
        reconciler: ToggleReconciler,
        surface: DomSurface,
    }

    fn fixture(markup: &str) -> Fixture {
        let slot = FormattingSlot::new();
        let selection = SharedSelection::new();
        let event_loop = EventLoop::new();
        let reconciler = ToggleReconciler::new(
            "b",
            slot.clone(),
            SelectionInspector::new("b", selection.clone()),
            event_loop.clone(),
            Rc::new(ComposerConfig::default()),
        );
        Fixture {
            slot,
            selection,
            event_loop,
            reconciler,
            surface: DomSurface::new(markup),
        }
    }

    impl Fixture {
        fn focus(&mut self, selection: Selection) {
            self.selection.set(Some(selection));
            self.slot.set_focus("b", false);
            self.reconciler.focus_gained(&mut self.surface);
        }

        fn press(&mut self, kind: FormatKind) -> ToggleOutcome {
            self.slot.request_toggle(kind);
            self.reconciler.on_formatting_change(&mut self.surface)
        }

        fn settle(&mut self) {
            for task in self.event_loop.advance(10) {
                if let Task::Settle { generation, .. } = task {
                    self.reconciler.settle(generation, &self.surface);
                }
            }
        }
    }

    #[test]
    fn focusing_pulls_the_caret_state() {
        let mut f = fixture("<em>ab</em>");
        f.focus(Selection::caret("b", 1));
        assert!(f.slot.read().italic);
        assert!(!f.slot.last_write().user_initiated);
        assert_eq!(f.reconciler.state(), ReconcileState::Observing);
    }

    #[test]
    fn toggle_over_a_range_applies_and_settles() {
        let mut f = fixture("abcd");
        f.focus(Selection::range("b", 0, 4));
        let outcome = f.press(FormatKind::Bold);
        assert_eq!(outcome.applied, vec![FormatKind::Bold]);
        assert_eq!(f.surface.markup(), "<strong>abcd</strong>");
        assert_that!(f.reconciler.state())
            .matches(|s| matches!(s, ReconcileState::Applying { .. }));
        f.settle();
        assert_eq!(f.reconciler.state(), ReconcileState::Observing);
        assert!(f.slot.read().bold);
    }

    #[test]
    fn pulls_are_suppressed_while_applying() {
        let mut f = fixture("abcd");
        f.focus(Selection::range("b", 0, 4));
        f.press(FormatKind::Bold);
        let revision = f.slot.last_write().revision;
        f.reconciler.pull(&f.surface);
        assert_eq!(f.slot.last_write().revision, revision);
    }

    #[test]
    fn own_writes_are_not_taken_for_requests() {
        let mut f = fixture("abcd");
        f.focus(Selection::range("b", 0, 4));
        f.press(FormatKind::Bold);
        f.settle();
        let markup = f.surface.markup();
        let outcome = f.reconciler.on_formatting_change(&mut f.surface);
        assert_eq!(outcome, ToggleOutcome::default());
        assert_eq!(f.surface.markup(), markup);
        assert!(f.event_loop.is_idle());
    }

    #[test]
    fn turning_on_over_mixed_text_is_refused() {
        let mut f = fixture("<strong>ab</strong>cd");
        f.focus(Selection::range("b", 0, 4));
        assert!(!f.slot.read().bold);
        let outcome = f.press(FormatKind::Bold);
        assert_eq!(outcome.refused, vec![FormatKind::Bold]);
        assert!(outcome.applied.is_empty());
        assert_eq!(f.surface.markup(), "<strong>ab</strong>cd");
        assert!(!f.slot.read().bold);
        assert!(f.event_loop.is_idle());
    }

    #[test]
    fn toggles_without_a_selection_are_reverted() {
        let mut f = fixture("ab");
        f.focus(Selection::caret("b", 1));
        f.selection.set(None);
        let outcome = f.press(FormatKind::Bold);
        assert_eq!(outcome.refused, vec![FormatKind::Bold]);
        assert!(!outcome.content_changed());
        assert!(!f.slot.read().bold);
        assert!(!f.slot.last_write().user_initiated);
        assert_eq!(f.surface.markup(), "ab");
        assert_eq!(f.reconciler.state(), ReconcileState::Observing);
    }

    #[test]
    fn turning_off_over_a_fully_formatted_range_removes_it() {
        let mut f = fixture("<strong>ab</strong><b>cd</b>");
        f.focus(Selection::range("b", 0, 4));
        assert!(f.slot.read().bold);
        f.press(FormatKind::Bold);
        assert_eq!(f.surface.markup(), "abcd");
    }

    #[test]
    fn caret_toggle_sets_the_pending_format() {
        let mut f = fixture("ab");
        f.focus(Selection::caret("b", 2));
        let outcome = f.press(FormatKind::Underline);
        assert_eq!(outcome.applied, vec![FormatKind::Underline]);
        assert!(f
            .surface
            .query_format(&Selection::caret("b", 2), FormatKind::Underline));
        f.settle();
        assert!(f.slot.read().underline);
    }

    #[test]
    fn stale_settles_are_ignored() {
        let mut f = fixture("abcd");
        f.focus(Selection::range("b", 0, 4));
        f.press(FormatKind::Bold);
        let generation = f.reconciler.generation();
        f.reconciler.focus_lost();
        f.reconciler.settle(generation, &f.surface);
        assert_eq!(f.reconciler.state(), ReconcileState::Idle);
    }

    #[test]
    fn reset_clears_the_slot_and_caret_formats() {
        let mut f = fixture("<strong>ab</strong>");
        f.focus(Selection::caret("b", 2));
        assert!(f.slot.read().bold);
        f.reconciler.reset(&mut f.surface);
        assert!(f.slot.read().is_clear());
        assert!(!f
            .surface
            .query_format(&Selection::caret("b", 2), FormatKind::Bold));
    }

    #[test]
    fn new_blank_blocks_start_cleared() {
        let mut f = fixture("");
        f.slot.request_toggle(FormatKind::Italic);
        f.selection.set(Some(Selection::caret("b", 0)));
        f.slot.set_focus("b", true);
        f.reconciler.focus_gained(&mut f.surface);
        assert!(f.slot.read().is_clear());
    }
}
