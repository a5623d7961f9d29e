// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Helpers for addressing `str` data by UTF-16 code units, which is how
//! platform selection APIs report offsets.

pub fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

/// The byte index in `s` of the given UTF-16 offset. Offsets landing inside
/// a surrogate pair round up to the next character boundary; offsets past
/// the end clamp to `s.len()`.
pub fn byte_index(s: &str, utf16_offset: usize) -> usize {
    let mut units = 0;
    for (i, c) in s.char_indices() {
        if units >= utf16_offset {
            return i;
        }
        units += c.len_utf16();
    }
    s.len()
}

/// The substring between two UTF-16 offsets.
pub fn utf16_slice(s: &str, start: usize, end: usize) -> &str {
    let start = byte_index(s, start);
    let end = byte_index(s, end).max(start);
    &s[start..end]
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ascii_offsets_match_bytes() {
        assert_eq!(byte_index("hello", 2), 2);
        assert_eq!(utf16_slice("hello", 1, 4), "ell");
    }

    #[test]
    fn surrogate_pairs_count_as_two_units() {
        let s = "a\u{1F4A9}b";
        assert_eq!(utf16_len(s), 4);
        assert_eq!(utf16_slice(s, 1, 3), "\u{1F4A9}");
        assert_eq!(utf16_slice(s, 3, 4), "b");
    }

    #[test]
    fn offsets_past_the_end_clamp() {
        assert_eq!(byte_index("ab", 10), 2);
        assert_eq!(utf16_slice("ab", 1, 10), "b");
    }
}
