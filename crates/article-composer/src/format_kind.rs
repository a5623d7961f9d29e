// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// One of the four inline formats whose state is shared with the toolbar.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Display,
    AsRefStr,
    EnumIter,
    EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum FormatKind {
    Bold,
    Italic,
    Underline,
    StrikeThrough,
}

impl FormatKind {
    pub fn all() -> impl Iterator<Item = FormatKind> {
        Self::iter()
    }

    /// Every tag name recognised as carrying this format, lowercase.
    pub fn tag_synonyms(&self) -> &'static [&'static str] {
        match self {
            Self::Bold => &["b", "strong"],
            Self::Italic => &["i", "em"],
            Self::Underline => &["u"],
            Self::StrikeThrough => &["s", "strike", "del"],
        }
    }

    /// The tag written when this format is applied.
    pub fn canonical_tag(&self) -> &'static str {
        match self {
            Self::Bold => "strong",
            Self::Italic => "em",
            Self::Underline => "u",
            Self::StrikeThrough => "del",
        }
    }

    pub fn matches_tag(&self, tag: &str) -> bool {
        self.tag_synonyms()
            .iter()
            .any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// The format kind a tag name stands for, if any.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::iter().find(|kind| kind.matches_tag(tag))
    }
}

/// Whether each format is "fully on" for the current selection or caret.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FormattingState {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike_through: bool,
}

impl FormattingState {
    pub fn get(&self, kind: FormatKind) -> bool {
        match kind {
            FormatKind::Bold => self.bold,
            FormatKind::Italic => self.italic,
            FormatKind::Underline => self.underline,
            FormatKind::StrikeThrough => self.strike_through,
        }
    }

    pub fn set(&mut self, kind: FormatKind, value: bool) {
        match kind {
            FormatKind::Bold => self.bold = value,
            FormatKind::Italic => self.italic = value,
            FormatKind::Underline => self.underline = value,
            FormatKind::StrikeThrough => self.strike_through = value,
        }
    }

    pub fn with(mut self, kind: FormatKind, value: bool) -> Self {
        self.set(kind, value);
        self
    }

    pub fn is_clear(&self) -> bool {
        FormatKind::iter().all(|kind| !self.get(kind))
    }

    /// The kinds whose flag differs between `self` and `other`.
    pub fn changed_kinds(&self, other: &FormattingState) -> Vec<FormatKind> {
        FormatKind::iter()
            .filter(|kind| self.get(*kind) != other.get(*kind))
            .collect()
    }

    /// Build a state by asking `f` for each kind.
    pub fn from_fn(mut f: impl FnMut(FormatKind) -> bool) -> Self {
        let mut state = Self::default();
        for kind in FormatKind::iter() {
            state.set(kind, f(kind));
        }
        state
    }
}
