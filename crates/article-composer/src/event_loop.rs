// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Deferred work on the host's single-threaded event loop. Time is counted
//! in logical ticks; nothing sleeps.

use std::cell::RefCell;
use std::rc::Rc;

use crate::selection::BlockId;

/// Work a block scheduled for later.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Task {
    /// The platform has had time to report the block's own formatting
    /// change; stop suppressing observation.
    Settle { block: BlockId, generation: u64 },
    /// The native surface has created the new list line; reset formatting.
    ResetAfterListEnter { block: BlockId, generation: u64 },
}

impl Task {
    pub fn block(&self) -> &str {
        match self {
            Self::Settle { block, .. }
            | Self::ResetAfterListEnter { block, .. } => block,
        }
    }

    pub fn generation(&self) -> u64 {
        match self {
            Self::Settle { generation, .. }
            | Self::ResetAfterListEnter { generation, .. } => *generation,
        }
    }
}

#[derive(Debug)]
struct Deferred {
    due: u64,
    seq: u64,
    task: Task,
}

#[derive(Debug, Default)]
struct LoopState {
    now: u64,
    next_seq: u64,
    queue: Vec<Deferred>,
}

/// Shared handle to the queue; clones post to the same loop.
#[derive(Clone, Debug, Default)]
pub struct EventLoop {
    inner: Rc<RefCell<LoopState>>,
}

impl EventLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.inner.borrow().now
    }

    pub fn post(&self, delay: u64, task: Task) {
        let mut inner = self.inner.borrow_mut();
        let due = inner.now + delay;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        tracing::trace!(?task, due, "task posted");
        inner.queue.push(Deferred { due, seq, task });
    }

    /// Move time forward and return the tasks that fell due, earliest
    /// first, in posting order for equal times.
    pub fn advance(&self, ticks: u64) -> Vec<Task> {
        let mut inner = self.inner.borrow_mut();
        inner.now += ticks;
        let now = inner.now;
        let (mut due, waiting): (Vec<Deferred>, Vec<Deferred>) =
            std::mem::take(&mut inner.queue)
                .into_iter()
                .partition(|d| d.due <= now);
        inner.queue = waiting;
        due.sort_by_key(|d| (d.due, d.seq));
        due.into_iter().map(|d| d.task).collect()
    }

    /// Ticks until the earliest waiting task is due.
    pub fn next_due_in(&self) -> Option<u64> {
        let inner = self.inner.borrow();
        inner
            .queue
            .iter()
            .map(|d| d.due.saturating_sub(inner.now))
            .min()
    }

    /// Keep advancing to the next due task and hand each one to `run`,
    /// which may post more, until the queue is empty or `max_steps`
    /// advances have been made. Returns whether the loop went idle.
    pub fn run_until_idle(
        &self,
        max_steps: usize,
        mut run: impl FnMut(Task),
    ) -> bool {
        for _ in 0..max_steps {
            let Some(due) = self.next_due_in() else {
                return true;
            };
            for task in self.advance(due) {
                run(task);
            }
        }
        self.is_idle()
    }

    pub fn is_idle(&self) -> bool {
        self.inner.borrow().queue.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.inner.borrow().queue.len()
    }
}
