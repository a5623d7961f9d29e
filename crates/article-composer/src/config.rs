// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

/// Tunables shared by every block of one composer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComposerConfig {
    /// Ticks to wait after a formatting command before observing the
    /// surface again.
    pub settle_ticks: u64,
    /// Ticks to wait after Enter in a list before resetting formatting.
    pub list_enter_ticks: u64,
    pub link_target: String,
    pub link_rel: String,
    pub allowed_link_schemes: Vec<String>,
    pub shortcuts_enabled: bool,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            settle_ticks: 1,
            list_enter_ticks: 1,
            link_target: String::from("_blank"),
            link_rel: String::from("noopener noreferrer"),
            allowed_link_schemes: ["http", "https", "mailto", "ftp", "tel"]
                .into_iter()
                .map(String::from)
                .collect(),
            shortcuts_enabled: true,
        }
    }
}

impl ComposerConfig {
    pub fn with_settle_ticks(mut self, ticks: u64) -> Self {
        self.settle_ticks = ticks;
        self
    }

    pub fn with_list_enter_ticks(mut self, ticks: u64) -> Self {
        self.list_enter_ticks = ticks;
        self
    }

    pub fn with_link_target(mut self, target: impl Into<String>) -> Self {
        self.link_target = target.into();
        self
    }

    pub fn with_link_rel(mut self, rel: impl Into<String>) -> Self {
        self.link_rel = rel.into();
        self
    }

    pub fn with_allowed_link_schemes<I, S>(mut self, schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_link_schemes =
            schemes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_shortcuts_enabled(mut self, enabled: bool) -> Self {
        self.shortcuts_enabled = enabled;
        self
    }

    pub fn allows_scheme(&self, scheme: &str) -> bool {
        self.allowed_link_schemes
            .iter()
            .any(|s| s.eq_ignore_ascii_case(scheme))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_open_links_safely() {
        let config = ComposerConfig::default();
        assert_eq!(config.link_target, "_blank");
        assert_eq!(config.link_rel, "noopener noreferrer");
        assert!(config.allows_scheme("HTTPS"));
        assert!(!config.allows_scheme("javascript"));
    }

    #[test]
    fn builders_override_fields() {
        let config = ComposerConfig::default()
            .with_settle_ticks(3)
            .with_allowed_link_schemes(["https"])
            .with_shortcuts_enabled(false);
        assert_eq!(config.settle_ticks, 3);
        assert!(!config.allows_scheme("http"));
        assert!(!config.shortcuts_enabled);
    }
}
