// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The live selection and read-only queries over it.
//!
//! There is one selection per composer, shared by every block. Offsets
//! are UTF-16 positions inside the editable region named by `region`.

use std::cell::RefCell;
use std::rc::Rc;

pub type BlockId = String;

/// A selection as the platform reports it. `anchor` is where it started,
/// `focus` where it ends; either may come first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    /// The block whose editable region holds the anchor, or `None` when
    /// the selection lives elsewhere (a dialog's text field, say).
    pub region: Option<BlockId>,
    pub anchor: usize,
    pub focus: usize,
}

impl Selection {
    pub fn caret(region: &str, offset: usize) -> Self {
        Self::range(region, offset, offset)
    }

    pub fn range(region: &str, anchor: usize, focus: usize) -> Self {
        Self {
            region: Some(region.to_owned()),
            anchor,
            focus,
        }
    }

    /// A selection outside every editable region.
    pub fn outside() -> Self {
        Self {
            region: None,
            anchor: 0,
            focus: 0,
        }
    }

    pub fn start(&self) -> usize {
        self.anchor.min(self.focus)
    }

    pub fn end(&self) -> usize {
        self.anchor.max(self.focus)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn is_in(&self, block_id: &str) -> bool {
        self.region.as_deref() == Some(block_id)
    }
}

/// A captured selection. Empty when nothing was selected at capture time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionSnapshot(Option<Selection>);

impl SelectionSnapshot {
    pub fn empty() -> Self {
        Self(None)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.0.as_ref()
    }
}

#[derive(Debug)]
struct SelectionState {
    available: bool,
    current: Option<Selection>,
}

/// The platform's selection, shared by the host and every block.
#[derive(Clone, Debug)]
pub struct SharedSelection {
    state: Rc<RefCell<SelectionState>>,
}

impl Default for SharedSelection {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedSelection {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(SelectionState {
                available: true,
                current: None,
            })),
        }
    }

    /// The live selection, or `None` when there is none or the platform
    /// cannot report it.
    pub fn get(&self) -> Option<Selection> {
        let state = self.state.borrow();
        if state.available {
            state.current.clone()
        } else {
            None
        }
    }

    pub fn set(&self, selection: Option<Selection>) {
        self.state.borrow_mut().current = selection;
    }

    /// Simulate a platform whose selection API is missing or broken.
    pub fn set_available(&self, available: bool) {
        self.state.borrow_mut().available = available;
    }
}

/// Read-only selection queries on behalf of one block.
#[derive(Clone, Debug)]
pub struct SelectionInspector {
    block_id: BlockId,
    shared: SharedSelection,
}

impl SelectionInspector {
    pub fn new(block_id: &str, shared: SharedSelection) -> Self {
        Self {
            block_id: block_id.to_owned(),
            shared,
        }
    }

    pub fn block_id(&self) -> &str {
        &self.block_id
    }

    pub fn current_selection(&self) -> Option<Selection> {
        let selection = self.shared.get();
        tracing::trace!(block = %self.block_id, ?selection, "selection query");
        selection
    }

    /// Whether the selection's anchor lies inside this block's region.
    pub fn is_within(&self) -> bool {
        self.current_selection()
            .is_some_and(|s| s.is_in(&self.block_id))
    }

    pub fn is_collapsed(selection: &Selection) -> bool {
        selection.is_collapsed()
    }

    /// The live selection if it lies inside this block.
    pub fn selection_in_block(&self) -> Option<Selection> {
        self.current_selection()
            .filter(|s| s.is_in(&self.block_id))
    }

    pub fn snapshot(selection: Option<&Selection>) -> SelectionSnapshot {
        SelectionSnapshot(selection.cloned())
    }

    /// Make the snapshot the live selection. An empty snapshot leaves the
    /// selection alone.
    pub fn restore(&self, snapshot: &SelectionSnapshot) {
        if let Some(selection) = snapshot.selection() {
            self.shared.set(Some(selection.clone()));
        }
    }

    /// Place a collapsed caret in this block.
    pub fn place_caret(&self, offset: usize) {
        self.shared.set(Some(Selection::caret(&self.block_id, offset)));
    }
}
