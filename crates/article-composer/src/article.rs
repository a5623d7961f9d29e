// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! An article of blocks sharing one formatting slot, one selection and one
//! event loop, driven the way a host page drives them.

use std::rc::Rc;

use crate::block::{
    Block, BlockHost, BlockUpdate, ContentUpdate, EditableBlock,
};
use crate::config::ComposerConfig;
use crate::event_loop::{EventLoop, Task};
use crate::formatting_slot::FormattingSlot;
use crate::keyboard::{KeyEvent, KeyOutcome};
use crate::link_annotation::{LinkAction, LinkOutcome};
use crate::selection::{Selection, SharedSelection};
use crate::surface::DomSurface;
use crate::{FormatKind, FormattingState};

/// Upper bound on ticks [ArticleComposer::settle] will run.
const MAX_SETTLE_STEPS: usize = 64;

struct Entry {
    block: Block,
    editor: EditableBlock<DomSurface>,
}

pub struct ArticleComposer<H: BlockHost> {
    host: H,
    entries: Vec<Entry>,
    slot: FormattingSlot,
    selection: SharedSelection,
    event_loop: EventLoop,
    config: Rc<ComposerConfig>,
}

impl<H: BlockHost> ArticleComposer<H> {
    pub fn new(host: H, config: ComposerConfig) -> Self {
        Self {
            host,
            entries: Vec::new(),
            slot: FormattingSlot::new(),
            selection: SharedSelection::new(),
            event_loop: EventLoop::new(),
            config: Rc::new(config),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn slot(&self) -> &FormattingSlot {
        &self.slot
    }

    /// The toolbar's view of the formatting flags.
    pub fn formatting(&self) -> FormattingState {
        self.slot.read()
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection.get()
    }

    pub fn event_loop(&self) -> &EventLoop {
        &self.event_loop
    }

    pub fn add_block(&mut self, block: Block) {
        let editor = EditableBlock::new(
            &block,
            DomSurface::new(&block.content),
            self.slot.clone(),
            self.selection.clone(),
            self.event_loop.clone(),
            Rc::clone(&self.config),
        );
        self.entries.push(Entry { block, editor });
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.entries.iter().map(|e| &e.block)
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        self.entry(id).map(|e| &e.block)
    }

    pub fn editor(&self, id: &str) -> Option<&EditableBlock<DomSurface>> {
        self.entry(id).map(|e| &e.editor)
    }

    fn entry(&self, id: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.block.id == id)
    }

    fn entry_mut(&mut self, id: &str) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.block.id == id)
    }

    fn focused_id(&self) -> Option<String> {
        self.slot.focused().map(|f| f.block_id)
    }

    /// Record a block's update and pass changed content to the host.
    fn apply(&mut self, id: &str, update: &BlockUpdate) {
        let ContentUpdate::ReplaceAll(markup) = &update.content else {
            return;
        };
        let Some(entry) = self.entry_mut(id) else {
            return;
        };
        entry.block.content.clone_from(markup);
        self.host.on_content_change(id, markup);
    }

    /// Run `f` against the focused block and apply its update.
    fn with_focused(
        &mut self,
        f: impl FnOnce(&mut EditableBlock<DomSurface>) -> BlockUpdate,
    ) -> Option<BlockUpdate> {
        let id = self.focused_id()?;
        let update = f(&mut self.entry_mut(&id)?.editor);
        self.apply(&id, &update);
        if update.toggle.content_changed() || !update.toggle.refused.is_empty()
        {
            self.notify_formatting_change();
        }
        Some(update)
    }

    /// Every block hears about a slot change. The focused block has
    /// already acted on it; the others only acknowledge.
    fn notify_formatting_change(&mut self) {
        let ids: Vec<String> =
            self.entries.iter().map(|e| e.block.id.clone()).collect();
        for id in ids {
            if let Some(entry) = self.entry_mut(&id) {
                let update = entry.editor.on_formatting_change();
                self.apply(&id, &update);
            }
        }
    }

    /// Move focus to `id`, or nowhere.
    pub fn focus(&mut self, id: Option<&str>, just_created: bool) {
        match id {
            Some(id) => self.slot.set_focus(id, just_created),
            None => self.slot.clear_focus(),
        }
        let ids: Vec<String> =
            self.entries.iter().map(|e| e.block.id.clone()).collect();
        // Losers first, so the gainer's writes are the last ones.
        let (gained, lost): (Vec<_>, Vec<_>) = ids
            .into_iter()
            .partition(|candidate| Some(candidate.as_str()) == id);
        for id in lost.iter().chain(gained.iter()) {
            if let Some(entry) = self.entry_mut(id) {
                let update = entry.editor.on_focus_change();
                self.apply(id, &update);
            }
        }
    }

    /// The platform moved the selection.
    pub fn select(&mut self, selection: Option<Selection>) {
        self.selection.set(selection);
        self.with_focused(|editor| editor.on_selection_change());
    }

    pub fn type_text(&mut self, text: &str) {
        self.with_focused(|editor| editor.on_input(text));
    }

    pub fn delete_backward(&mut self) {
        self.with_focused(|editor| editor.on_delete_backward());
    }

    /// Replace a block's content from the host side.
    pub fn set_content(&mut self, id: &str, markup: &str) {
        let Some(entry) = self.entry_mut(id) else {
            return;
        };
        let update = entry.editor.set_content(markup);
        self.apply(id, &update);
    }

    pub fn press_key(&mut self, event: &KeyEvent) -> KeyOutcome {
        self.with_focused(|editor| editor.handle_key(event))
            .and_then(|u| u.key)
            .unwrap_or(KeyOutcome::Ignored)
    }

    /// A toolbar button press.
    pub fn toolbar_toggle(&mut self, kind: FormatKind) {
        self.with_focused(|editor| editor.apply_toggle(kind));
    }

    pub fn link_action(&self) -> LinkAction {
        self.focused_id()
            .and_then(|id| self.editor(&id))
            .map_or(LinkAction::Disabled, EditableBlock::link_action)
    }

    pub fn begin_link(&mut self) -> Option<String> {
        let id = self.focused_id()?;
        Some(self.entry_mut(&id)?.editor.begin_link())
    }

    pub fn commit_link(
        &mut self,
        url: &str,
        label: &str,
    ) -> Option<LinkOutcome> {
        self.with_focused(|editor| editor.commit_link(url, label))
            .and_then(|u| u.link)
    }

    pub fn cancel_link(&mut self) {
        self.with_focused(|editor| editor.cancel_link());
    }

    pub fn insert_link_with_text(
        &mut self,
        url: &str,
        text: &str,
    ) -> Option<LinkOutcome> {
        self.with_focused(|editor| editor.insert_link_with_text(url, text))
            .and_then(|u| u.link)
    }

    pub fn remove_link(&mut self) {
        self.with_focused(|editor| editor.remove_link());
    }

    fn run_task(&mut self, task: &Task) {
        let id = task.block().to_owned();
        if let Some(entry) = self.entry_mut(&id) {
            let update = entry.editor.run_task(task);
            self.apply(&id, &update);
        }
    }

    /// Advance the event loop and run whatever fell due.
    pub fn tick(&mut self, ticks: u64) {
        for task in self.event_loop.advance(ticks) {
            self.run_task(&task);
        }
    }

    /// Run the event loop until nothing is pending.
    pub fn settle(&mut self) {
        let event_loop = self.event_loop.clone();
        if !event_loop.run_until_idle(MAX_SETTLE_STEPS, |task| {
            self.run_task(&task)
        }) {
            tracing::warn!(
                pending = event_loop.pending(),
                "event loop did not settle"
            );
        }
    }
}

#[cfg(test)]
mod test {
    use speculoos::prelude::*;

    use super::*;
    use crate::block::{BlockKind, ContentLog};

    fn article(blocks: &[(&str, &str)]) -> ArticleComposer<ContentLog> {
        let mut article =
            ArticleComposer::new(ContentLog::default(), Default::default());
        for (id, content) in blocks {
            article.add_block(Block::new(id, BlockKind::Paragraph, content));
        }
        article
    }

    #[test]
    fn toolbar_toggle_pushes_content_to_the_host() {
        let mut article = article(&[("a", "hello")]);
        article.focus(Some("a"), false);
        article.select(Some(Selection::range("a", 0, 5)));
        article.toolbar_toggle(FormatKind::Italic);
        article.settle();
        assert_eq!(article.block("a").unwrap().content, "<em>hello</em>");
        assert_that!(article.host().changes).is_equal_to(vec![(
            "a".to_owned(),
            "<em>hello</em>".to_owned(),
        )]);
        assert!(article.formatting().italic);
    }

    #[test]
    fn focus_moves_hand_the_slot_over() {
        let mut article = article(&[("a", "<strong>x</strong>"), ("b", "y")]);
        article.focus(Some("a"), false);
        article.select(Some(Selection::caret("a", 1)));
        assert!(article.formatting().bold);
        article.focus(Some("b"), false);
        article.select(Some(Selection::caret("b", 1)));
        assert!(!article.formatting().bold);
        article.focus(None, false);
        article.toolbar_toggle(FormatKind::Bold);
        assert_eq!(article.block("b").unwrap().content, "y");
    }

    #[test]
    fn key_presses_without_focus_are_ignored() {
        let mut article = article(&[("a", "x")]);
        assert_eq!(article.press_key(&KeyEvent::enter()), KeyOutcome::Ignored);
        assert_eq!(article.link_action(), LinkAction::Disabled);
    }
}
