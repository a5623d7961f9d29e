// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The externally held formatting state shared by the toolbar and every
//! block, and the focus identity that decides who may write it.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::FormattingAccessError;
use crate::selection::BlockId;
use crate::{FormatKind, FormattingState};

/// The block currently allowed to read and write the shared state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FocusIdentity {
    pub block_id: BlockId,
    /// The host created this block moments ago and it has no content.
    pub just_created: bool,
}

/// The latest value written to the slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlotWrite {
    pub state: FormattingState,
    /// Came from a keyboard shortcut or toolbar press rather than from a
    /// block reflecting what it observed.
    pub user_initiated: bool,
    /// Bumped on every write.
    pub revision: u64,
}

#[derive(Debug, Default)]
struct SlotState {
    last_write: SlotWrite,
    focus: Option<FocusIdentity>,
}

/// Single-threaded shared handle; clones refer to the same slot.
#[derive(Clone, Debug, Default)]
pub struct FormattingSlot {
    inner: Rc<RefCell<SlotState>>,
}

impl FormattingSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self) -> FormattingState {
        self.inner.borrow().last_write.state
    }

    pub fn last_write(&self) -> SlotWrite {
        self.inner.borrow().last_write
    }

    pub fn focused(&self) -> Option<FocusIdentity> {
        self.inner.borrow().focus.clone()
    }

    pub fn is_focused(&self, block_id: &str) -> bool {
        self.inner
            .borrow()
            .focus
            .as_ref()
            .is_some_and(|f| f.block_id == block_id)
    }

    pub fn set_focus(&self, block_id: &str, just_created: bool) {
        tracing::debug!(block = block_id, just_created, "focus moved");
        self.inner.borrow_mut().focus = Some(FocusIdentity {
            block_id: block_id.to_owned(),
            just_created,
        });
    }

    pub fn clear_focus(&self) {
        tracing::debug!("focus cleared");
        self.inner.borrow_mut().focus = None;
    }

    /// Flip one flag on behalf of the user, as a toolbar button or a
    /// keyboard shortcut does.
    pub fn request_toggle(&self, kind: FormatKind) -> SlotWrite {
        let mut inner = self.inner.borrow_mut();
        let current = inner.last_write.state.get(kind);
        let state = inner.last_write.state.with(kind, !current);
        Self::store(&mut inner, state, true)
    }

    /// A writer for `block_id`, if that block holds focus.
    pub fn writer_for(&self, block_id: &str) -> Option<FormattingWriter> {
        self.is_focused(block_id).then(|| FormattingWriter {
            block_id: block_id.to_owned(),
            slot: self.clone(),
        })
    }

    fn store(
        inner: &mut SlotState,
        state: FormattingState,
        user_initiated: bool,
    ) -> SlotWrite {
        inner.last_write = SlotWrite {
            state,
            user_initiated,
            revision: inner.last_write.revision + 1,
        };
        inner.last_write
    }
}

/// Write access to the slot for the focused block. Every write checks
/// focus again, so a writer kept past a focus change is inert.
#[derive(Clone, Debug)]
pub struct FormattingWriter {
    block_id: BlockId,
    slot: FormattingSlot,
}

impl FormattingWriter {
    pub fn block_id(&self) -> &str {
        &self.block_id
    }

    pub fn read(&self) -> FormattingState {
        self.slot.read()
    }

    pub fn write(
        &self,
        state: FormattingState,
        user_initiated: bool,
    ) -> Result<SlotWrite, FormattingAccessError> {
        if !self.slot.is_focused(&self.block_id) {
            tracing::warn!(
                block = %self.block_id,
                "dropping formatting write from unfocused block"
            );
            return Err(FormattingAccessError::NotFocused {
                block_id: self.block_id.clone(),
            });
        }
        let mut inner = self.slot.inner.borrow_mut();
        Ok(FormattingSlot::store(&mut inner, state, user_initiated))
    }
}
