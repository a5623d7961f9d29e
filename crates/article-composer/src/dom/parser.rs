// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

#[cfg(feature = "sys")]
mod padom;
#[cfg(feature = "sys")]
mod padom_creator;
#[cfg(feature = "sys")]
mod panode_container;
mod parse;

pub use parse::parse;
