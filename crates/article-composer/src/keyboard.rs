// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Keyboard shortcuts a block intercepts.

use std::fmt;

use crate::FormatKind;

/// Modifier keys as a bitfield.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const CTRL: Modifiers = Modifiers(0b0001);
    pub const SHIFT: Modifiers = Modifiers(0b0010);
    pub const ALT: Modifiers = Modifiers(0b0100);
    /// Cmd on macOS, Win on Windows.
    pub const META: Modifiers = Modifiers(0b1000);

    #[inline]
    pub const fn ctrl(self) -> bool {
        self.0 & Self::CTRL.0 != 0
    }

    #[inline]
    pub const fn shift(self) -> bool {
        self.0 & Self::SHIFT.0 != 0
    }

    #[inline]
    pub const fn alt(self) -> bool {
        self.0 & Self::ALT.0 != 0
    }

    #[inline]
    pub const fn meta(self) -> bool {
        self.0 & Self::META.0 != 0
    }

    /// The format modifier: Ctrl or Meta, whichever the platform uses.
    #[inline]
    pub const fn has_format_modifier(self) -> bool {
        self.ctrl() || self.meta()
    }

    #[inline]
    pub const fn union(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 | other.0)
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.ctrl() {
            parts.push("Ctrl");
        }
        if self.shift() {
            parts.push("Shift");
        }
        if self.alt() {
            parts.push("Alt");
        }
        if self.meta() {
            parts.push("Meta");
        }
        write!(f, "{}", parts.join("+"))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn char(c: char, modifiers: Modifiers) -> Self {
        Self::new(Key::Char(c), modifiers)
    }

    pub fn enter() -> Self {
        Self::new(Key::Enter, Modifiers::NONE)
    }
}

/// What an intercepted key asks the block to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyCommand {
    ToggleFormat(FormatKind),
    /// Enter inside a list: new item, then reset its formatting.
    ListEnter,
}

/// `Handled` tells the host to prevent the platform default.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    Ignored,
}

/// The shortcut bound to a key combination, if any.
pub fn format_shortcut(event: &KeyEvent) -> Option<FormatKind> {
    let Key::Char(c) = event.key else {
        return None;
    };
    let m = event.modifiers;
    if !m.has_format_modifier() || m.alt() {
        return None;
    }
    match (c.to_ascii_lowercase(), m.shift()) {
        ('b', false) => Some(FormatKind::Bold),
        ('i', false) => Some(FormatKind::Italic),
        ('u', false) => Some(FormatKind::Underline),
        ('x', true) => Some(FormatKind::StrikeThrough),
        _ => None,
    }
}

/// Resolve a key event for a block. `in_list` says whether the block is a
/// list; `shortcuts_enabled` gates the format shortcuts.
pub fn resolve(
    event: &KeyEvent,
    in_list: bool,
    shortcuts_enabled: bool,
) -> Option<KeyCommand> {
    match event.key {
        Key::Enter if in_list && !event.modifiers.shift() => {
            Some(KeyCommand::ListEnter)
        }
        _ if shortcuts_enabled => {
            format_shortcut(event).map(KeyCommand::ToggleFormat)
        }
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ctrl_and_meta_both_work_as_format_modifier() {
        for m in [Modifiers::CTRL, Modifiers::META] {
            assert_eq!(
                format_shortcut(&KeyEvent::char('b', m)),
                Some(FormatKind::Bold)
            );
        }
        let plain = KeyEvent::char('b', Modifiers::NONE);
        assert_eq!(format_shortcut(&plain), None);
    }

    #[test]
    fn strikethrough_needs_shift() {
        let mod_shift = Modifiers::CTRL | Modifiers::SHIFT;
        assert_eq!(
            format_shortcut(&KeyEvent::char('X', mod_shift)),
            Some(FormatKind::StrikeThrough)
        );
        let ctrl_x = KeyEvent::char('x', Modifiers::CTRL);
        assert_eq!(format_shortcut(&ctrl_x), None);
        assert_eq!(format_shortcut(&KeyEvent::char('b', mod_shift)), None);
    }

    #[test]
    fn enter_only_matters_in_lists() {
        assert_eq!(
            resolve(&KeyEvent::enter(), true, true),
            Some(KeyCommand::ListEnter)
        );
        assert_eq!(resolve(&KeyEvent::enter(), false, true), None);
        let shift_enter = KeyEvent::new(Key::Enter, Modifiers::SHIFT);
        assert_eq!(resolve(&shift_enter, true, true), None);
    }

    #[test]
    fn disabled_shortcuts_are_ignored() {
        let event = KeyEvent::char('i', Modifiers::META);
        assert_eq!(resolve(&event, false, false), None);
        assert_eq!(
            resolve(&event, false, true),
            Some(KeyCommand::ToggleFormat(FormatKind::Italic))
        );
    }

    #[test]
    fn modifiers_display_joined() {
        let m = Modifiers::CTRL | Modifiers::SHIFT;
        assert_eq!(m.to_string(), "Ctrl+Shift");
    }
}
