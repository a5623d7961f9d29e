// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Inline formatting and links for block-based article editors.
//!
//! Each block owns an editable surface. A single [FormattingSlot] holds the
//! bold, italic, underline and strikethrough flags the toolbar shows; the
//! focused block reflects its selection into it and turns user toggles of
//! it into formatting commands on its surface.

mod article;
mod block;
mod config;
pub mod dom;
mod error;
mod event_loop;
mod format_detector;
mod format_kind;
mod formatting_slot;
mod keyboard;
mod lifecycle;
mod link_annotation;
mod reconciler;
mod selection;
mod surface;

pub use crate::article::ArticleComposer;
pub use crate::block::{
    Block, BlockHost, BlockKind, BlockUpdate, ContentLog, ContentUpdate,
    EditableBlock,
};
pub use crate::config::ComposerConfig;
pub use crate::dom::Dom;
pub use crate::error::{FormattingAccessError, LinkError, MarkupParseError};
pub use crate::event_loop::{EventLoop, Task};
pub use crate::format_detector::{
    coverage, coverage_of, has_formatted_leaf, is_fully_formatted, observe,
    Coverage,
};
pub use crate::format_kind::{FormatKind, FormattingState};
pub use crate::formatting_slot::{
    FocusIdentity, FormattingSlot, FormattingWriter, SlotWrite,
};
pub use crate::keyboard::{
    format_shortcut, Key, KeyCommand, KeyEvent, KeyOutcome, Modifiers,
};
pub use crate::lifecycle::{
    focus_baseline, is_visually_empty, EmptinessTracker, EmptinessTransition,
    FocusBaseline,
};
pub use crate::link_annotation::{
    link_action, remove_link, validate_url, LinkAction, LinkAnnotation,
    LinkOutcome, LinkStage,
};
pub use crate::reconciler::{ReconcileState, ToggleOutcome, ToggleReconciler};
pub use crate::selection::{
    BlockId, Selection, SelectionInspector, SelectionSnapshot, SharedSelection,
};
pub use crate::surface::{DomSurface, EditableSurface};
