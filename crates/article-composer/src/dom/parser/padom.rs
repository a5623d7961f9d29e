// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! [PaDom] is the parse-time tree html5ever builds into. Nodes are owned
//! in one flat list and refer to their children by handle, which is what
//! html5ever's `TreeSink` wants; the result is converted into a
//! [crate::dom::Dom] once parsing is finished.

use html5ever::tree_builder::ElementFlags;
use html5ever::{Attribute, LocalName, Namespace, QualName};
use once_cell::sync::Lazy;

use super::panode_container::PaNodeContainer;

static TEXT_NAME: Lazy<QualName> = Lazy::new(|| paqual_name("#text"));

pub(crate) fn paqual_name(local_name: &str) -> QualName {
    QualName::new(
        None,
        Namespace::from("http://www.w3.org/1999/xhtml"),
        LocalName::from(local_name),
    )
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct PaDomHandle(pub(crate) usize);

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PaNodeText {
    pub(crate) content: String,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum PaDomNode {
    Document(PaNodeContainer),
    Container(PaNodeContainer),
    Text(PaNodeText),
}

impl PaDomNode {
    pub(crate) fn name(&self) -> &QualName {
        match self {
            Self::Document(c) | Self::Container(c) => &c.name,
            Self::Text(_) => &TEXT_NAME,
        }
    }

    pub(crate) fn children(&self) -> &[PaDomHandle] {
        match self {
            Self::Document(c) | Self::Container(c) => &c.children,
            Self::Text(_) => &[],
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<PaDomHandle>> {
        match self {
            Self::Document(c) | Self::Container(c) => Some(&mut c.children),
            Self::Text(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PaDom {
    nodes: Vec<PaDomNode>,
}

impl Default for PaDom {
    fn default() -> Self {
        Self {
            nodes: vec![PaDomNode::Document(PaNodeContainer {
                name: paqual_name(""),
                attrs: Vec::new(),
                children: Vec::new(),
            })],
        }
    }
}

impl PaDom {
    pub(crate) fn document_handle(&self) -> PaDomHandle {
        PaDomHandle(0)
    }

    pub(crate) fn get_document(&self) -> &PaDomNode {
        &self.nodes[0]
    }

    pub(crate) fn get_node(&self, handle: &PaDomHandle) -> &PaDomNode {
        &self.nodes[handle.0]
    }

    pub(crate) fn get_mut_node(
        &mut self,
        handle: &PaDomHandle,
    ) -> &mut PaDomNode {
        &mut self.nodes[handle.0]
    }

    pub(crate) fn add_node(&mut self, node: PaDomNode) -> PaDomHandle {
        self.nodes.push(node);
        PaDomHandle(self.nodes.len() - 1)
    }

    pub(crate) fn create_element(
        &mut self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> PaDomHandle {
        self.add_node(PaDomNode::Container(PaNodeContainer {
            name,
            attrs: attrs
                .into_iter()
                .map(|a| {
                    (a.name.local.as_ref().to_owned(), a.value.to_string())
                })
                .collect(),
            children: Vec::new(),
        }))
    }

    /// The node whose children include `child`, found by scanning. Nodes
    /// are few and this is only needed for html5ever's error recovery.
    pub(crate) fn parent_of(
        &self,
        child: &PaDomHandle,
    ) -> Option<(PaDomHandle, usize)> {
        self.nodes.iter().enumerate().find_map(|(i, node)| {
            node.children()
                .iter()
                .position(|c| c == child)
                .map(|pos| (PaDomHandle(i), pos))
        })
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct PaDomCreationError {
    pub(crate) dom: PaDom,
    pub(crate) parse_errors: Vec<String>,
}

impl PaDomCreationError {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}
