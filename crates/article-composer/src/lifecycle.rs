// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Block-level transitions that force formatting back to a baseline.

use crate::formatting_slot::FocusIdentity;
use crate::surface::EditableSurface;

/// Whether the block shows no text: nothing, whitespace, or a bare line
/// break. A block holding a list item is never empty, since an empty item
/// is how a list starts out.
pub fn is_visually_empty<S: EditableSurface + ?Sized>(surface: &S) -> bool {
    !surface.has_list_item() && surface.plain_text().trim().is_empty()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmptinessTransition {
    /// Content just became empty. Clear and reset.
    BecameEmpty,
    /// Still empty since the last notification. Nothing to do.
    StillEmpty,
    NotEmpty,
}

/// Edge detector over content notifications.
#[derive(Clone, Debug, Default)]
pub struct EmptinessTracker {
    was_empty: bool,
}

impl EmptinessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn was_empty(&self) -> bool {
        self.was_empty
    }

    pub fn observe(&mut self, is_empty: bool) -> EmptinessTransition {
        let transition = match (self.was_empty, is_empty) {
            (false, true) => EmptinessTransition::BecameEmpty,
            (true, true) => EmptinessTransition::StillEmpty,
            (_, false) => EmptinessTransition::NotEmpty,
        };
        self.was_empty = is_empty;
        transition
    }
}

/// What a block does when it gains focus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusBaseline {
    /// Newly created and blank: force every flag off.
    Reset,
    /// Reflect the formatting at the caret.
    Observe,
}

pub fn focus_baseline<S: EditableSurface + ?Sized>(
    identity: &FocusIdentity,
    surface: &S,
) -> FocusBaseline {
    if identity.just_created && surface.plain_text().trim().is_empty() {
        FocusBaseline::Reset
    } else {
        FocusBaseline::Observe
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::surface::DomSurface;

    fn identity(just_created: bool) -> FocusIdentity {
        FocusIdentity {
            block_id: "b".into(),
            just_created,
        }
    }

    #[test]
    fn blank_content_is_empty() {
        for markup in ["", "   ", "<br />", "<strong> </strong><br />"] {
            assert!(is_visually_empty(&DomSurface::new(markup)), "{markup}");
        }
        assert!(!is_visually_empty(&DomSurface::new("a")));
    }

    #[test]
    fn empty_list_items_are_not_empty() {
        assert!(!is_visually_empty(&DomSurface::new("<li></li>")));
        assert!(!is_visually_empty(&DomSurface::new("<ul><li></li></ul>")));
    }

    #[test]
    fn becoming_empty_triggers_once() {
        let mut tracker = EmptinessTracker::new();
        assert_eq!(tracker.observe(true), EmptinessTransition::BecameEmpty);
        assert_eq!(tracker.observe(true), EmptinessTransition::StillEmpty);
        assert_eq!(tracker.observe(false), EmptinessTransition::NotEmpty);
        assert!(!tracker.was_empty());
        assert_eq!(tracker.observe(true), EmptinessTransition::BecameEmpty);
    }

    #[test]
    fn new_blank_blocks_reset_on_focus() {
        let blank = DomSurface::new("");
        let filled = DomSurface::new("<strong>x</strong>");
        assert_eq!(
            focus_baseline(&identity(true), &blank),
            FocusBaseline::Reset
        );
        assert_eq!(
            focus_baseline(&identity(true), &filled),
            FocusBaseline::Observe
        );
        assert_eq!(
            focus_baseline(&identity(false), &blank),
            FocusBaseline::Observe
        );
    }
}
