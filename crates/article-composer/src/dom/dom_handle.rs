// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

/// The path of child indexes from a region root to one of its nodes. The
/// empty path is the root itself.
///
/// Handles are only valid until the next structural edit of the tree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DomHandle {
    path: Vec<usize>,
}

impl DomHandle {
    pub fn root() -> Self {
        Self { path: Vec::new() }
    }

    pub fn from_raw(path: Vec<usize>) -> Self {
        Self { path }
    }

    pub fn raw(&self) -> &[usize] {
        &self.path
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    pub fn child_handle(&self, index: usize) -> Self {
        let mut path = self.path.clone();
        path.push(index);
        Self { path }
    }

    pub fn parent_handle(&self) -> Option<Self> {
        let (_, parent) = self.path.split_last()?;
        Some(Self {
            path: parent.to_vec(),
        })
    }

    pub fn index_in_parent(&self) -> Option<usize> {
        self.path.last().copied()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn child_and_parent_are_inverse() {
        let h = DomHandle::root().child_handle(2).child_handle(0);
        assert_eq!(h.raw(), &[2, 0]);
        assert_eq!(h.index_in_parent(), Some(0));
        assert_eq!(h.parent_handle(), Some(DomHandle::from_raw(vec![2])));
        assert_eq!(DomHandle::root().parent_handle(), None);
    }
}
