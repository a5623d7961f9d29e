// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use article_composer::{
    is_fully_formatted, ArticleComposer, Block, BlockKind,
    ComposerConfig, ContentLog, Dom, FormatKind, KeyEvent, KeyOutcome,
    LinkAction, LinkError, LinkOutcome, Modifiers, Selection,
};
use indoc::indoc;
use speculoos::prelude::*;

fn article_with(
    config: ComposerConfig,
    blocks: &[(&str, BlockKind, &str)],
) -> ArticleComposer<ContentLog> {
    let mut article = ArticleComposer::new(ContentLog::default(), config);
    for (id, kind, content) in blocks {
        article.add_block(Block::new(id, *kind, content));
    }
    article
}

/// One paragraph "p", focused, with `selection` in it.
fn paragraph(
    content: &str,
    anchor: usize,
    focus: usize,
) -> ArticleComposer<ContentLog> {
    let mut article = article_with(
        ComposerConfig::default(),
        &[("p", BlockKind::Paragraph, content)],
    );
    article.focus(Some("p"), false);
    article.select(Some(Selection::range("p", anchor, focus)));
    article
}

fn content(article: &ArticleComposer<ContentLog>, id: &str) -> String {
    article.block(id).map(|b| b.content.clone()).unwrap_or_default()
}

#[test]
fn emptying_a_block_clears_formatting_once() {
    let mut article = paragraph("<strong>a</strong>", 1, 1);
    assert!(article.formatting().bold);

    article.set_content("p", "");
    assert!(article.formatting().is_clear());
    let revision = article.slot().last_write().revision;

    article.set_content("p", "");
    assert_eq!(article.slot().last_write().revision, revision);
    assert_eq!(content(&article, "p"), "");
}

#[test]
fn mixed_formatting_is_not_fully_formatted() {
    let fully = |markup: &str| {
        let dom = Dom::from_markup(markup);
        is_fully_formatted(dom.document(), FormatKind::Bold)
    };
    assert!(!fully("<b>ab</b>cd"));
    assert!(fully("<b>ab</b><b>cd</b>"));
    assert!(!fully("   "));
    assert!(fully("<strong>ab</strong> <b>cd</b>"));
}

#[test]
fn turning_on_a_partly_applied_format_is_refused() {
    let mut article = paragraph("<strong>ab</strong>cd", 0, 4);
    assert!(!article.formatting().bold);

    article.toolbar_toggle(FormatKind::Bold);
    article.settle();

    assert_eq!(content(&article, "p"), "<strong>ab</strong>cd");
    assert!(!article.formatting().bold);
    assert_that!(article.host().changes).is_empty();
}

#[test]
fn applying_a_toggle_does_not_feed_back() {
    let mut article = paragraph("abcd", 0, 4);
    article.toolbar_toggle(FormatKind::Bold);
    // The platform reports the selection again before the settle delay.
    article.select(Some(Selection::range("p", 0, 4)));
    article.settle();
    article.select(Some(Selection::range("p", 0, 4)));
    article.settle();

    assert_eq!(content(&article, "p"), "<strong>abcd</strong>");
    assert_eq!(article.host().changes.len(), 1);
    assert!(article.formatting().bold);
    assert!(article.event_loop().is_idle());
}

#[test]
fn turning_a_format_off_settles_to_the_observed_state() {
    let mut article = paragraph("<em>ab</em>cd", 0, 2);
    assert!(article.formatting().italic);

    article.toolbar_toggle(FormatKind::Italic);
    assert!(article.slot().last_write().user_initiated);
    article.settle();

    assert_eq!(content(&article, "p"), "abcd");
    assert!(!article.formatting().italic);
}

#[test]
fn a_new_list_item_starts_unformatted() {
    let mut article = article_with(
        ComposerConfig::default(),
        &[(
            "l",
            BlockKind::ListUnordered,
            "<li><strong><em>ab</em></strong></li>",
        )],
    );
    article.focus(Some("l"), false);
    article.select(Some(Selection::caret("l", 2)));
    assert!(article.formatting().bold);
    assert!(article.formatting().italic);

    assert_eq!(article.press_key(&KeyEvent::enter()), KeyOutcome::Handled);
    article.settle();
    article.type_text("c");

    assert!(article.formatting().is_clear());
    assert_eq!(
        content(&article, "l"),
        "<li><strong><em>ab</em></strong></li><li>c</li>"
    );
}

#[test]
fn enter_outside_lists_is_left_to_the_platform() {
    let mut article = paragraph("ab", 2, 2);
    assert_eq!(article.press_key(&KeyEvent::enter()), KeyOutcome::Ignored);
    assert_eq!(content(&article, "p"), "ab");
}

#[test]
fn committing_a_link_with_the_prefilled_label() {
    let mut article = paragraph("click here", 0, 10);
    let label = article.begin_link().unwrap();
    assert_eq!(label, "click here");
    // Focus is in the dialog's URL field meanwhile.
    article.select(Some(Selection::outside()));

    let outcome = article.commit_link("https://example.com", &label);

    assert_eq!(
        outcome,
        Some(LinkOutcome::Inserted {
            url: "https://example.com".into(),
            caret: 10,
        })
    );
    assert_eq!(
        content(&article, "p"),
        "<a href=\"https://example.com\" target=\"_blank\" \
         rel=\"noopener noreferrer\">click here</a>"
    );
    assert_eq!(article.selection(), Some(Selection::caret("p", 10)));
}

#[test]
fn committing_a_link_with_an_edited_label() {
    let mut article = paragraph("click here", 0, 10);
    article.begin_link();
    article.select(Some(Selection::outside()));

    article.commit_link("https://example.com", "go");

    assert_eq!(
        content(&article, "p"),
        "<a href=\"https://example.com\" target=\"_blank\" \
         rel=\"noopener noreferrer\">go</a>"
    );
}

#[test]
fn an_invalid_url_leaves_everything_as_it_was() {
    let mut article = paragraph("click here", 0, 5);
    let label = article.begin_link().unwrap();
    article.select(Some(Selection::outside()));

    let outcome = article.commit_link("javascript:alert(1)", &label);

    assert_that!(outcome).matches(|o| {
        matches!(o, Some(LinkOutcome::Aborted(LinkError::InvalidUrl(_))))
    });
    assert_eq!(content(&article, "p"), "click here");
    assert_eq!(article.selection(), Some(Selection::range("p", 0, 5)));
    assert_that!(article.host().changes).is_empty();
}

#[test]
fn cancelled_link_dialogs_restore_the_same_selection() {
    let mut article = paragraph("some words here", 5, 10);
    for _ in 0..2 {
        assert_eq!(article.begin_link(), Some("words".to_owned()));
        article.select(Some(Selection::outside()));
        article.cancel_link();
        assert_eq!(article.selection(), Some(Selection::range("p", 5, 10)));
    }
    assert_eq!(content(&article, "p"), "some words here");
}

#[test]
fn links_can_be_inspected_and_removed() {
    let mut article = paragraph(r#"<a href="https://x.y">xy</a> z"#, 1, 1);
    assert_eq!(
        article.link_action(),
        LinkAction::Edit("https://x.y".to_owned())
    );
    article.remove_link();
    assert_eq!(content(&article, "p"), "xy z");
    assert_eq!(article.link_action(), LinkAction::CreateWithText);
}

#[test]
fn a_link_can_be_inserted_at_the_caret() {
    let mut article = paragraph("see ", 4, 4);
    let outcome = article.insert_link_with_text("example.com", "");
    assert_eq!(
        outcome,
        Some(LinkOutcome::Inserted {
            url: "https://example.com".into(),
            caret: 23,
        })
    );
    let dom = Dom::from_markup(&content(&article, "p"));
    assert_eq!(dom.document().to_plain_text(), "see https://example.com");
}

#[test]
fn writes_from_a_block_that_lost_focus_are_dropped() {
    let mut article = article_with(
        ComposerConfig::default(),
        &[
            ("a", BlockKind::Paragraph, "xy"),
            ("b", BlockKind::Paragraph, "<u>z</u>"),
        ],
    );
    article.focus(Some("a"), false);
    article.select(Some(Selection::range("a", 0, 2)));
    article.toolbar_toggle(FormatKind::Bold);

    article.focus(Some("b"), false);
    article.select(Some(Selection::caret("b", 1)));
    article.settle();

    assert!(!article.formatting().bold);
    assert!(article.formatting().underline);
    assert_eq!(content(&article, "a"), "<strong>xy</strong>");

    // Toggles now reach only the focused block.
    article.toolbar_toggle(FormatKind::Italic);
    assert_eq!(content(&article, "a"), "<strong>xy</strong>");
}

#[test]
fn a_new_blank_block_starts_from_cleared_formatting() {
    let mut article = article_with(
        ComposerConfig::default(),
        &[
            ("a", BlockKind::Paragraph, "<strong>x</strong>"),
            ("b", BlockKind::Paragraph, ""),
        ],
    );
    article.focus(Some("a"), false);
    article.select(Some(Selection::caret("a", 1)));
    assert!(article.formatting().bold);

    article.select(Some(Selection::caret("b", 0)));
    article.focus(Some("b"), true);
    assert!(article.formatting().is_clear());
}

#[test]
fn keyboard_shortcuts_toggle_formats() {
    let mut article = paragraph("abc", 0, 3);
    let ctrl_u = KeyEvent::char('u', Modifiers::CTRL);
    assert_eq!(article.press_key(&ctrl_u), KeyOutcome::Handled);
    article.settle();
    assert_eq!(content(&article, "p"), "<u>abc</u>");
    assert!(article.formatting().underline);

    let strike = KeyEvent::char('x', Modifiers::META | Modifiers::SHIFT);
    assert_eq!(article.press_key(&strike), KeyOutcome::Handled);
    article.settle();
    assert!(article.formatting().strike_through);

    let alt_b = KeyEvent::char('b', Modifiers::CTRL | Modifiers::ALT);
    assert_eq!(article.press_key(&alt_b), KeyOutcome::Ignored);
}

#[test]
fn shortcuts_can_be_disabled() {
    let mut article = article_with(
        ComposerConfig::default().with_shortcuts_enabled(false),
        &[("p", BlockKind::Paragraph, "abc")],
    );
    article.focus(Some("p"), false);
    article.select(Some(Selection::range("p", 0, 3)));
    let ctrl_b = KeyEvent::char('b', Modifiers::CTRL);
    assert_eq!(article.press_key(&ctrl_b), KeyOutcome::Ignored);
    assert_eq!(content(&article, "p"), "abc");
}

#[test]
fn pasted_markup_is_normalised_on_load() {
    let markup = indoc! {r#"
        <meta charset="utf-8"><span style="font-weight:bold">bold</span>
    "#};
    let article = article_with(
        ComposerConfig::default(),
        &[("p", BlockKind::Paragraph, markup.trim())],
    );
    let editor = article.editor("p").unwrap();
    assert_eq!(editor.markup(), "<strong>bold</strong>");
}
