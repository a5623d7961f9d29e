// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use html5ever::QualName;
use regex::Regex;

use super::padom::PaDomHandle;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PaNodeContainer {
    pub(crate) name: QualName,
    pub(crate) attrs: Vec<(String, String)>,
    pub(crate) children: Vec<PaDomHandle>,
}

impl PaNodeContainer {
    pub(crate) fn tag(&self) -> &str {
        self.name.local.as_ref()
    }

    pub(crate) fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _v)| n == name)
            .map(|(_n, v)| v.as_str())
    }

    /// Whether the inline `style` attribute sets `name` to `value`. A
    /// missing trailing semicolon still counts.
    pub(crate) fn contains_style(&self, name: &str, value: &str) -> bool {
        self.get_attr("style")
            .map(|v| {
                Regex::new(&format!(
                    r"(?i)(^|;)\s*{}\s*:\s*{}\s*(;|$)",
                    regex::escape(name),
                    regex::escape(value)
                ))
                .map(|re| re.is_match(v))
                .unwrap_or(false)
            })
            .unwrap_or(false)
    }

    /// The formatting tag an inline style stands for, as pasted spans
    /// express bold and friends.
    pub(crate) fn formatting_tag_from_style(&self) -> Option<&'static str> {
        if self.contains_style("font-weight", "bold")
            || self.contains_style("font-weight", "700")
        {
            Some("strong")
        } else if self.contains_style("font-style", "italic") {
            Some("em")
        } else if self.contains_style("text-decoration", "underline") {
            Some("u")
        } else if self.contains_style("text-decoration", "line-through") {
            Some("del")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dom::parser::padom::paqual_name;

    fn span(style: &str) -> PaNodeContainer {
        PaNodeContainer {
            name: paqual_name("span"),
            attrs: vec![("style".into(), style.into())],
            children: Vec::new(),
        }
    }

    #[test]
    fn test_contains_style() {
        let node = span("font-weight:bold;");
        assert!(node.contains_style("font-weight", "bold"));
        assert!(!node.contains_style("font-weight", "normal"));
    }

    #[test]
    fn style_without_trailing_semicolon_matches() {
        assert!(span("color: red; font-style: italic")
            .contains_style("font-style", "italic"));
    }

    #[test]
    fn styles_map_to_formatting_tags() {
        assert_eq!(
            span("font-weight:700;").formatting_tag_from_style(),
            Some("strong")
        );
        assert_eq!(
            span("text-decoration: line-through").formatting_tag_from_style(),
            Some("del")
        );
        assert_eq!(span("color: red").formatting_tag_from_style(), None);
    }
}
