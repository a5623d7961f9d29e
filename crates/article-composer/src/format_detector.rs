// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Per-kind formatting coverage of a selection.
//!
//! Ranges are inspected through a detached copy of their content, so the
//! live region is never touched. Whitespace-only text does not count
//! either way.

use crate::dom::{ContainerNode, LeafSpan};
use crate::selection::Selection;
use crate::surface::EditableSurface;
use crate::{FormatKind, FormattingState};

/// How much of a fragment's visible text carries one format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Coverage {
    /// Every visible leaf has it.
    Full,
    /// Some visible leaves have it, some don't.
    Mixed,
    /// No visible leaf has it, or there is no visible text.
    Absent,
}

fn visible(leaves: &[LeafSpan]) -> impl Iterator<Item = &LeafSpan> {
    leaves.iter().filter(|leaf| !leaf.is_blank())
}

pub fn coverage_of(leaves: &[LeafSpan], kind: FormatKind) -> Coverage {
    let (with, without) = visible(leaves)
        .fold((0, 0), |(with, without), leaf| {
            if leaf.has_format(kind) {
                (with + 1, without)
            } else {
                (with, without + 1)
            }
        });
    match (with, without) {
        (0, _) => Coverage::Absent,
        (_, 0) => Coverage::Full,
        _ => Coverage::Mixed,
    }
}

pub fn coverage(fragment: &ContainerNode, kind: FormatKind) -> Coverage {
    coverage_of(&fragment.text_leaves(), kind)
}

/// True iff the fragment has visible text and all of it carries `kind`.
pub fn is_fully_formatted(fragment: &ContainerNode, kind: FormatKind) -> bool {
    coverage(fragment, kind) == Coverage::Full
}

/// True iff at least one visible leaf carries `kind`.
pub fn has_formatted_leaf(fragment: &ContainerNode, kind: FormatKind) -> bool {
    coverage(fragment, kind) != Coverage::Absent
}

/// The formatting state the surface currently shows for `selection`.
/// A caret asks the surface what is active at the insertion point; a
/// range is judged on a detached copy of its content.
pub fn observe<S: EditableSurface + ?Sized>(
    surface: &S,
    selection: &Selection,
) -> FormattingState {
    if selection.is_collapsed() {
        return FormattingState::from_fn(|kind| {
            surface.query_format(selection, kind)
        });
    }
    let leaves = surface
        .clone_contents(selection.start(), selection.end())
        .text_leaves();
    FormattingState::from_fn(|kind| {
        coverage_of(&leaves, kind) == Coverage::Full
    })
}
