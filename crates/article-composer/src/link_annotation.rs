// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Wrapping a selection in a link, across a dialog that takes focus away
//! from the block while the user types the URL.

use email_address::EmailAddress;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::config::ComposerConfig;
use crate::dom::DomNode;
use crate::error::LinkError;
use crate::selection::{Selection, SelectionInspector, SelectionSnapshot};
use crate::surface::EditableSurface;

/// Host names with at least one dot, an optional port and path.
static BARE_DOMAIN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^[\w-]+(\.[\w-]+)+(:\d+)?([/?#]\S*)?$").ok()
});

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LinkStage {
    #[default]
    Idle,
    /// A selection was captured and the dialog is open.
    Captured,
    Committed,
    Cancelled,
}

/// What the link button should offer for the current selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkAction {
    Create,
    CreateWithText,
    Edit(String),
    Disabled,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkOutcome {
    /// A link to `url` was inserted; the caret sits at `caret`, just
    /// after it.
    Inserted { url: String, caret: usize },
    Aborted(LinkError),
}

#[derive(Clone, Debug, Default)]
pub struct LinkAnnotation {
    stage: LinkStage,
    snapshot: SelectionSnapshot,
    default_label: String,
}

impl LinkAnnotation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> LinkStage {
        self.stage
    }

    pub fn snapshot(&self) -> &SelectionSnapshot {
        &self.snapshot
    }

    /// Capture the selection for a link dialog and return the label to
    /// prefill. Without a usable selection the dialog still opens but
    /// nothing is captured, and commit will abort.
    pub fn begin<S: EditableSurface + ?Sized>(
        &mut self,
        surface: &S,
        inspector: &SelectionInspector,
    ) -> String {
        self.stage = LinkStage::Captured;
        match inspector.selection_in_block().filter(|s| !s.is_collapsed()) {
            Some(selection) => {
                self.default_label = surface
                    .clone_contents(selection.start(), selection.end())
                    .to_plain_text();
                self.snapshot = SelectionInspector::snapshot(Some(&selection));
            }
            None => {
                tracing::debug!(
                    block = inspector.block_id(),
                    "link dialog opened without a selection"
                );
                self.default_label.clear();
                self.snapshot = SelectionSnapshot::empty();
            }
        }
        self.default_label.clone()
    }

    /// Wrap the captured selection in a link to `url`. A `label` edited
    /// away from the prefilled one replaces the selected content;
    /// otherwise the content, formatting included, becomes the link text.
    pub fn commit<S: EditableSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        inspector: &SelectionInspector,
        config: &ComposerConfig,
        url: &str,
        label: &str,
    ) -> LinkOutcome {
        match self.try_commit(surface, inspector, config, url, label) {
            Ok(outcome) => {
                self.stage = LinkStage::Committed;
                self.snapshot = SelectionSnapshot::empty();
                self.default_label.clear();
                outcome
            }
            Err(e) => {
                tracing::debug!(error = %e, "link commit aborted");
                self.cancel(inspector);
                LinkOutcome::Aborted(e)
            }
        }
    }

    fn try_commit<S: EditableSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        inspector: &SelectionInspector,
        config: &ComposerConfig,
        url: &str,
        label: &str,
    ) -> Result<LinkOutcome, LinkError> {
        let url = validate_url(url, config)?;
        if self.snapshot.is_empty() {
            return Err(LinkError::NoSnapshot);
        }
        inspector.restore(&self.snapshot);
        let selection = checked_range(surface, inspector)?;
        let (start, end) = (selection.start(), selection.end());

        let mut fragment = surface.extract_range(start, end);
        let unedited =
            label.trim().is_empty() || label == self.default_label;
        let children = if unedited {
            let len = fragment.text_len();
            fragment.unwrap_links(0, len);
            fragment.normalize();
            fragment.take_children()
        } else {
            vec![DomNode::new_text(label)]
        };
        let caret = surface.insert_node(
            start,
            DomNode::new_link(&url, link_attrs(config), children),
        );
        inspector.place_caret(caret);
        tracing::debug!(block = inspector.block_id(), %url, "link inserted");
        Ok(LinkOutcome::Inserted { url, caret })
    }

    /// Close the dialog. The document is untouched and the captured
    /// selection is put back, so beginning again captures the same range.
    pub fn cancel(&mut self, inspector: &SelectionInspector) {
        inspector.restore(&self.snapshot);
        self.snapshot = SelectionSnapshot::empty();
        self.default_label.clear();
        self.stage = LinkStage::Cancelled;
    }

    /// Insert `text` as a new link at the caret, replacing any selected
    /// content. An empty `text` shows the URL itself.
    pub fn insert_with_text<S: EditableSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        inspector: &SelectionInspector,
        config: &ComposerConfig,
        url: &str,
        text: &str,
    ) -> LinkOutcome {
        let result = validate_url(url, config).and_then(|url| {
            let selection = inspector
                .selection_in_block()
                .ok_or(LinkError::OutsideBlock)?;
            let (start, end) = (selection.start(), selection.end());
            if start < end {
                surface.extract_range(start, end);
            }
            let text = if text.is_empty() { url.as_str() } else { text };
            let caret = surface.insert_node(
                start,
                DomNode::new_link(
                    &url,
                    link_attrs(config),
                    vec![DomNode::new_text(text)],
                ),
            );
            inspector.place_caret(caret);
            Ok(LinkOutcome::Inserted { url, caret })
        });
        result.unwrap_or_else(LinkOutcome::Aborted)
    }
}

fn link_attrs(config: &ComposerConfig) -> Vec<(String, String)> {
    vec![
        (String::from("target"), config.link_target.clone()),
        (String::from("rel"), config.link_rel.clone()),
    ]
}

/// The live selection, checked to lie inside the block's current content.
/// Only ranges are ever captured, so the restored one is never collapsed.
fn checked_range<S: EditableSurface + ?Sized>(
    surface: &S,
    inspector: &SelectionInspector,
) -> Result<Selection, LinkError> {
    let selection = inspector
        .current_selection()
        .ok_or(LinkError::NoSelection)?;
    if !selection.is_in(inspector.block_id())
        || selection.end() > surface.text_len()
    {
        return Err(LinkError::OutsideBlock);
    }
    Ok(selection)
}

/// Accept a URL with an allowed scheme as typed, turn a bare e-mail
/// address into a `mailto:` link and a bare domain into an `https://` one.
pub fn validate_url(
    raw: &str,
    config: &ComposerConfig,
) -> Result<String, LinkError> {
    let raw = raw.trim();
    let invalid = || LinkError::InvalidUrl(raw.to_owned());
    if raw.is_empty() || raw.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    if EmailAddress::is_valid(raw) && config.allows_scheme("mailto") {
        return Ok(format!("mailto:{raw}"));
    }
    if let Ok(url) = Url::parse(raw) {
        let needs_host = matches!(url.scheme(), "http" | "https" | "ftp");
        if config.allows_scheme(url.scheme())
            && (!needs_host || url.host_str().is_some_and(|h| !h.is_empty()))
        {
            return Ok(raw.to_owned());
        }
    }
    let bare_domain = BARE_DOMAIN.as_ref().is_some_and(|re| re.is_match(raw));
    if bare_domain && config.allows_scheme("https") {
        let candidate = format!("https://{raw}");
        if Url::parse(&candidate).is_ok() {
            return Ok(candidate);
        }
    }
    Err(invalid())
}

/// What the link control offers for `selection` in `block_id`.
pub fn link_action<S: EditableSurface + ?Sized>(
    surface: &S,
    selection: Option<&Selection>,
    block_id: &str,
) -> LinkAction {
    match selection.filter(|s| s.is_in(block_id)) {
        None => LinkAction::Disabled,
        Some(s) if !s.is_collapsed() => LinkAction::Create,
        Some(s) => match surface.link_url_at(s.start()) {
            Some(url) => LinkAction::Edit(url),
            None => LinkAction::CreateWithText,
        },
    }
}

/// Unwrap the links under the selection, or around the caret, keeping
/// their content. Returns whether anything changed.
pub fn remove_link<S: EditableSurface + ?Sized>(
    surface: &mut S,
    selection: &Selection,
) -> bool {
    surface.unwrap_links(selection.start(), selection.end())
}
