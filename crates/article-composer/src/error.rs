// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use thiserror::Error;

use crate::dom::Dom;

/// The markup parser reported errors. `recovered` is what it managed to
/// build anyway; blocks fall back to it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("markup parse errors: {}", parse_errors.join(", "))]
pub struct MarkupParseError {
    pub parse_errors: Vec<String>,
    pub recovered: Dom,
}

/// Why a link annotation did not touch the document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("`{0}` is not a valid link target")]
    InvalidUrl(String),
    #[error("there is no selection")]
    NoSelection,
    #[error("the selection is outside the block")]
    OutsideBlock,
    #[error("no selection was captured when the link dialog opened")]
    NoSnapshot,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormattingAccessError {
    #[error("block {block_id} no longer holds focus")]
    NotFocused { block_id: String },
}
