// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! One editable block: its surface wired to the shared slot, the shared
//! selection and the event loop, with the entry points the host calls.

use std::collections::BTreeMap;
use std::rc::Rc;

use strum_macros::{AsRefStr, Display, EnumString};

use crate::config::ComposerConfig;
use crate::event_loop::{EventLoop, Task};
use crate::formatting_slot::FormattingSlot;
use crate::keyboard::{self, KeyCommand, KeyEvent, KeyOutcome};
use crate::lifecycle::{
    is_visually_empty, EmptinessTracker, EmptinessTransition,
};
use crate::link_annotation::{
    self, LinkAction, LinkAnnotation, LinkOutcome, LinkStage,
};
use crate::reconciler::{ReconcileState, ToggleOutcome, ToggleReconciler};
use crate::selection::{BlockId, SelectionInspector, SharedSelection};
use crate::surface::EditableSurface;
use crate::FormatKind;

/// The host's block type names.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Display, AsRefStr, EnumString,
)]
#[strum(serialize_all = "kebab-case")]
pub enum BlockKind {
    Paragraph,
    Header,
    Quote,
    ListOrdered,
    ListUnordered,
    Code,
}

impl BlockKind {
    pub fn is_list(&self) -> bool {
        matches!(self, Self::ListOrdered | Self::ListUnordered)
    }
}

/// A block as the host stores it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
    pub content: String,
    /// Host data the engine never interprets.
    pub data: BTreeMap<String, String>,
}

impl Block {
    pub fn new(id: &str, kind: BlockKind, content: &str) -> Self {
        Self {
            id: id.to_owned(),
            kind,
            content: content.to_owned(),
            data: BTreeMap::new(),
        }
    }
}

/// Receives the content a block pushes.
pub trait BlockHost {
    fn on_content_change(&mut self, block_id: &str, markup: &str);
}

/// A [BlockHost] that records every push.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContentLog {
    pub changes: Vec<(BlockId, String)>,
}

impl BlockHost for ContentLog {
    fn on_content_change(&mut self, block_id: &str, markup: &str) {
        self.changes.push((block_id.to_owned(), markup.to_owned()));
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ContentUpdate {
    #[default]
    Keep,
    /// Replace the stored content with this markup.
    ReplaceAll(String),
}

/// What an entry point changed, for the host to act on.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockUpdate {
    pub content: ContentUpdate,
    pub toggle: ToggleOutcome,
    pub link: Option<LinkOutcome>,
    pub key: Option<KeyOutcome>,
}

impl BlockUpdate {
    pub fn keep() -> Self {
        Self::default()
    }

    pub fn replace_all(markup: String) -> Self {
        Self {
            content: ContentUpdate::ReplaceAll(markup),
            ..Self::default()
        }
    }
}

pub struct EditableBlock<S: EditableSurface> {
    id: BlockId,
    kind: BlockKind,
    surface: S,
    slot: FormattingSlot,
    inspector: SelectionInspector,
    reconciler: ToggleReconciler,
    link: LinkAnnotation,
    emptiness: EmptinessTracker,
    config: Rc<ComposerConfig>,
}

impl<S: EditableSurface> EditableBlock<S> {
    pub fn new(
        block: &Block,
        surface: S,
        slot: FormattingSlot,
        selection: SharedSelection,
        event_loop: EventLoop,
        config: Rc<ComposerConfig>,
    ) -> Self {
        let inspector = SelectionInspector::new(&block.id, selection);
        let reconciler = ToggleReconciler::new(
            &block.id,
            slot.clone(),
            inspector.clone(),
            event_loop,
            Rc::clone(&config),
        );
        Self {
            id: block.id.clone(),
            kind: block.kind,
            surface,
            slot,
            inspector,
            reconciler,
            link: LinkAnnotation::new(),
            emptiness: EmptinessTracker::new(),
            config,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn markup(&self) -> String {
        self.surface.markup()
    }

    pub fn reconcile_state(&self) -> ReconcileState {
        self.reconciler.state()
    }

    pub fn link_stage(&self) -> LinkStage {
        self.link.stage()
    }

    fn is_focused(&self) -> bool {
        self.slot.is_focused(&self.id)
    }

    fn is_list(&self) -> bool {
        self.kind.is_list() || self.surface.has_list_item()
    }

    fn content_update(&self) -> BlockUpdate {
        BlockUpdate::replace_all(self.surface.markup())
    }

    /// Focus moved. Gaining it starts observation (or a reset for a new
    /// blank block); losing it makes this block inert.
    pub fn on_focus_change(&mut self) -> BlockUpdate {
        let focused = self.is_focused();
        match (focused, self.reconciler.state()) {
            (true, ReconcileState::Idle) => {
                self.reconciler.focus_gained(&mut self.surface)
            }
            (false, ReconcileState::Idle) => {}
            (false, _) => self.reconciler.focus_lost(),
            (true, _) => {}
        }
        BlockUpdate::keep()
    }

    pub fn on_selection_change(&mut self) -> BlockUpdate {
        self.reconciler.pull(&self.surface);
        BlockUpdate::keep()
    }

    /// The shared formatting slot changed.
    pub fn on_formatting_change(&mut self) -> BlockUpdate {
        let toggle = self.reconciler.on_formatting_change(&mut self.surface);
        let mut update = if toggle.content_changed() {
            self.content_update()
        } else {
            BlockUpdate::keep()
        };
        update.toggle = toggle;
        update
    }

    /// Toolbar entry point: request `kind` be toggled. Inert unless this
    /// block holds focus.
    pub fn apply_toggle(&mut self, kind: FormatKind) -> BlockUpdate {
        if !self.is_focused() {
            return BlockUpdate::keep();
        }
        self.slot.request_toggle(kind);
        self.on_formatting_change()
    }

    /// Typed text arrived from the platform.
    pub fn on_input(&mut self, text: &str) -> BlockUpdate {
        let Some(selection) = self.inspector.selection_in_block() else {
            return BlockUpdate::keep();
        };
        let caret = self.surface.insert_text(&selection, text);
        self.inspector.place_caret(caret);
        self.on_content_change()
    }

    /// Backspace: delete the selection, or the unit before the caret.
    pub fn on_delete_backward(&mut self) -> BlockUpdate {
        let Some(selection) = self.inspector.selection_in_block() else {
            return BlockUpdate::keep();
        };
        let (start, end) = match (selection.start(), selection.end()) {
            (0, 0) => return BlockUpdate::keep(),
            (s, e) if s == e => (s - self.unit_len_before(s), e),
            range => range,
        };
        self.surface.extract_range(start, end);
        self.inspector.place_caret(start);
        self.on_content_change()
    }

    /// UTF-16 length of the character ending at `pos`.
    fn unit_len_before(&self, pos: usize) -> usize {
        let text = self.surface.plain_text();
        let mut units = 0;
        let mut last = 1;
        for c in text.chars() {
            if units >= pos {
                break;
            }
            last = c.len_utf16();
            units += last;
        }
        last.min(pos)
    }

    /// The host replaced the block's content.
    pub fn set_content(&mut self, markup: &str) -> BlockUpdate {
        self.surface.set_markup(markup);
        self.on_content_change()
    }

    /// Run the lifecycle checks after the content changed and report the
    /// resulting markup.
    pub fn on_content_change(&mut self) -> BlockUpdate {
        if !self.is_focused() {
            return self.content_update();
        }
        match self.emptiness.observe(is_visually_empty(&self.surface)) {
            EmptinessTransition::BecameEmpty => {
                tracing::debug!(block = %self.id, "block became empty");
                self.surface.set_markup("");
                self.inspector.place_caret(0);
                self.reconciler.reset(&mut self.surface);
                BlockUpdate::replace_all(String::new())
            }
            EmptinessTransition::StillEmpty => self.content_update(),
            EmptinessTransition::NotEmpty => {
                self.reconciler.pull(&self.surface);
                self.content_update()
            }
        }
    }

    pub fn handle_key(&mut self, event: &KeyEvent) -> BlockUpdate {
        if !self.is_focused() {
            return BlockUpdate::keep();
        }
        let command = keyboard::resolve(
            event,
            self.is_list(),
            self.config.shortcuts_enabled,
        );
        let mut update = match command {
            Some(KeyCommand::ToggleFormat(kind)) => self.apply_toggle(kind),
            Some(KeyCommand::ListEnter) => self.list_enter(),
            None => BlockUpdate::keep(),
        };
        update.key = Some(if command.is_some() {
            KeyOutcome::Handled
        } else {
            KeyOutcome::Ignored
        });
        update
    }

    /// Enter in a list makes a new item natively, then resets formatting
    /// once that has happened.
    fn list_enter(&mut self) -> BlockUpdate {
        let Some(selection) = self.inspector.selection_in_block() else {
            return BlockUpdate::keep();
        };
        let caret = self.surface.enter(&selection);
        self.inspector.place_caret(caret);
        self.reconciler.schedule_list_reset();
        self.content_update()
    }

    /// A deferred task for this block fell due.
    pub fn run_task(&mut self, task: &Task) -> BlockUpdate {
        match task {
            Task::Settle { generation, .. } => {
                self.reconciler.settle(*generation, &self.surface)
            }
            Task::ResetAfterListEnter { generation, .. } => {
                self.reconciler.list_reset_due(*generation, &mut self.surface)
            }
        }
        BlockUpdate::keep()
    }

    pub fn link_action(&self) -> LinkAction {
        link_annotation::link_action(
            &self.surface,
            self.inspector.current_selection().as_ref(),
            &self.id,
        )
    }

    /// Open the link dialog; returns the label to prefill.
    pub fn begin_link(&mut self) -> String {
        self.link.begin(&self.surface, &self.inspector)
    }

    pub fn commit_link(&mut self, url: &str, label: &str) -> BlockUpdate {
        let outcome = self.link.commit(
            &mut self.surface,
            &self.inspector,
            &self.config,
            url,
            label,
        );
        self.link_update(outcome)
    }

    pub fn cancel_link(&mut self) -> BlockUpdate {
        self.link.cancel(&self.inspector);
        BlockUpdate::keep()
    }

    pub fn insert_link_with_text(
        &mut self,
        url: &str,
        text: &str,
    ) -> BlockUpdate {
        let outcome = self.link.insert_with_text(
            &mut self.surface,
            &self.inspector,
            &self.config,
            url,
            text,
        );
        self.link_update(outcome)
    }

    fn link_update(&mut self, outcome: LinkOutcome) -> BlockUpdate {
        let mut update = match outcome {
            LinkOutcome::Inserted { .. } => {
                self.reconciler.pull(&self.surface);
                self.content_update()
            }
            LinkOutcome::Aborted(_) => BlockUpdate::keep(),
        };
        update.link = Some(outcome);
        update
    }

    pub fn remove_link(&mut self) -> BlockUpdate {
        let Some(selection) = self.inspector.selection_in_block() else {
            return BlockUpdate::keep();
        };
        if link_annotation::remove_link(&mut self.surface, &selection) {
            self.content_update()
        } else {
            BlockUpdate::keep()
        }
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use speculoos::prelude::*;

    use super::*;
    use crate::keyboard::Modifiers;
    use crate::selection::Selection;
    use crate::surface::DomSurface;

    struct Fixture {
        slot: FormattingSlot,
        selection: SharedSelection,
        event_loop: EventLoop,
        block: EditableBlock<DomSurface>,
    }

    fn fixture(kind: BlockKind, markup: &str) -> Fixture {
        let slot = FormattingSlot::new();
        let selection = SharedSelection::new();
        let event_loop = EventLoop::new();
        let block = EditableBlock::new(
            &Block::new("b", kind, markup),
            DomSurface::new(markup),
            slot.clone(),
            selection.clone(),
            event_loop.clone(),
            Rc::new(ComposerConfig::default()),
        );
        Fixture {
            slot,
            selection,
            event_loop,
            block,
        }
    }

    impl Fixture {
        fn focus_at(&mut self, selection: Selection) {
            self.selection.set(Some(selection));
            self.slot.set_focus("b", false);
            self.block.on_focus_change();
        }

        fn run_tasks(&mut self) {
            let block = &mut self.block;
            self.event_loop.run_until_idle(8, |task| {
                block.run_task(&task);
            });
        }
    }

    #[test]
    fn block_kinds_parse_from_host_names() {
        assert_eq!(
            BlockKind::from_str("list-unordered"),
            Ok(BlockKind::ListUnordered)
        );
        assert!(BlockKind::ListOrdered.is_list());
        assert_eq!(BlockKind::Header.to_string(), "header");
        assert!(BlockKind::from_str("embed").is_err());
    }

    #[test]
    fn shortcut_toggles_through_the_slot() {
        let mut f = fixture(BlockKind::Paragraph, "abcd");
        f.focus_at(Selection::range("b", 1, 3));
        let update = f
            .block
            .handle_key(&KeyEvent::char('b', Modifiers::CTRL));
        assert_eq!(update.key, Some(KeyOutcome::Handled));
        assert_eq!(
            update.content,
            ContentUpdate::ReplaceAll("a<strong>bc</strong>d".into())
        );
        assert!(f.slot.read().bold);
        assert!(f.slot.last_write().user_initiated);
    }

    #[test]
    fn unfocused_blocks_are_inert() {
        let mut f = fixture(BlockKind::Paragraph, "abcd");
        f.selection.set(Some(Selection::range("b", 0, 4)));
        f.slot.set_focus("other", false);
        f.block.on_focus_change();
        let update = f.block.apply_toggle(FormatKind::Bold);
        assert_eq!(update, BlockUpdate::keep());
        let update = f.block.handle_key(&KeyEvent::char('i', Modifiers::META));
        assert_eq!(update, BlockUpdate::keep());
        assert!(!f.slot.read().bold);
    }

    #[test]
    fn emptying_the_block_clears_once() {
        let mut f = fixture(BlockKind::Paragraph, "<strong>a</strong>");
        f.focus_at(Selection::caret("b", 1));
        assert!(f.slot.read().bold);
        let update = f.block.on_delete_backward();
        assert_eq!(update.content, ContentUpdate::ReplaceAll(String::new()));
        assert!(f.slot.read().is_clear());
        assert_that!(f.selection.get())
            .is_equal_to(Some(Selection::caret("b", 0)));
        let revision = f.slot.last_write().revision;
        f.block.set_content("");
        assert_eq!(f.slot.last_write().revision, revision);
    }

    #[test]
    fn delete_backward_removes_a_whole_surrogate_pair() {
        let mut f = fixture(BlockKind::Paragraph, "a\u{1F4A9}");
        f.focus_at(Selection::caret("b", 3));
        let update = f.block.on_delete_backward();
        assert_eq!(update.content, ContentUpdate::ReplaceAll("a".into()));
        assert_that!(f.selection.get())
            .is_equal_to(Some(Selection::caret("b", 1)));
    }

    #[test]
    fn list_enter_resets_the_new_item() {
        let mut f =
            fixture(BlockKind::ListUnordered, "<li><strong>ab</strong></li>");
        f.focus_at(Selection::caret("b", 2));
        assert!(f.slot.read().bold);
        let update = f.block.handle_key(&KeyEvent::enter());
        assert_eq!(update.key, Some(KeyOutcome::Handled));
        f.run_tasks();
        assert!(f.slot.read().is_clear());
        f.block.on_input("c");
        assert!(f.slot.read().is_clear());
        assert_eq!(
            f.block.markup(),
            "<li><strong>ab</strong></li><li>c</li>"
        );
    }

    #[test]
    fn link_commit_pushes_markup() {
        let mut f = fixture(BlockKind::Paragraph, "click here");
        f.focus_at(Selection::range("b", 0, 10));
        assert_eq!(f.block.link_action(), LinkAction::Create);
        let label = f.block.begin_link();
        f.selection.set(Some(Selection::outside()));
        let update = f.block.commit_link("https://example.com", &label);
        assert_that!(update.content).matches(|c| {
            matches!(c, ContentUpdate::ReplaceAll(m) if m.contains("href"))
        });
        assert_eq!(f.block.link_stage(), LinkStage::Committed);
        assert_eq!(
            f.block.link_action(),
            LinkAction::CreateWithText,
            "caret after the link is outside it"
        );
    }
}
