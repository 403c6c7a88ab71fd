//! BER-TLV decoding (ISO/IEC 7816-4, clause 5.2)
//!
//! A decoded structure is stored as an arena: all nodes live in one `Vec`
//! owned by [`BerTree`], and constructed nodes hold the indices of their
//! children. Index 0 is an anonymous constructed root (tag 0) whose
//! children are the top-level data objects.
//!
//! Several partial trees can be folded into one with [`BerTree::merge`]:
//! primitives with the same tag replace each other, constructed nodes
//! with the same tag are merged child by child.
//!
//! Nesting depth is bounded only by the input size. Parsing, merging and
//! printing walk the tree with an explicit work list, never by recursion.

use std::collections::VecDeque;
use std::fmt;

use crate::fields;
use crate::DecodeError;

/// Index of a node inside a [`BerTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Payload of a node: raw bytes for primitives, child indices otherwise
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeValue {
    Primitive(Vec<u8>),
    Constructed(Vec<NodeId>),
}

/// A single data object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BerNode {
    /// Complete tag, up to three encoded bytes
    pub tag: u32,
    pub value: NodeValue,
}

impl BerNode {
    pub fn is_primitive(&self) -> bool {
        matches!(self.value, NodeValue::Primitive(_))
    }

    /// Data of a primitive node, `None` for constructed nodes
    pub fn data(&self) -> Option<&[u8]> {
        match &self.value {
            NodeValue::Primitive(data) => Some(data),
            NodeValue::Constructed(_) => None,
        }
    }

    /// Children of a constructed node, empty for primitives
    pub fn children(&self) -> &[NodeId] {
        match &self.value {
            NodeValue::Primitive(_) => &[],
            NodeValue::Constructed(children) => children,
        }
    }
}

/// Decoded tag field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagHeader {
    pub tag: u32,
    pub primitive: bool,
    /// Number of bytes the tag occupies
    pub consumed: usize,
}

/// Decoded length field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthHeader {
    pub value: u32,
    /// Number of bytes the length field occupies
    pub consumed: usize,
}

/// Parse the tag at the start of `data`.
///
/// Bit 6 of the first byte marks a constructed object. When the low five
/// bits are all set the tag continues: a second byte with bit 8 clear
/// ends a two byte tag, otherwise a third byte follows.
pub fn parse_tag(data: &[u8]) -> Result<TagHeader, DecodeError> {
    let first = *data.first().ok_or(DecodeError::InvalidLength)?;
    let primitive = first & 0x20 == 0;

    let (tag, consumed) = match data {
        [b0, ..] if b0 & 0x1F != 0x1F => (u32::from(*b0), 1),
        [b0, b1, ..] if b1 & 0x80 == 0 => (u32::from_be_bytes([0, 0, *b0, *b1]), 2),
        [b0, b1, b2, ..] => (u32::from_be_bytes([0, *b0, *b1, *b2]), 3),
        _ => return Err(DecodeError::InvalidLength),
    };

    Ok(TagHeader {
        tag,
        primitive,
        consumed,
    })
}

/// Parse the length at the start of `data`.
///
/// Short form (`< 0x80`) and the `0x81`..`0x84` long forms are accepted.
/// The indefinite form `0x80` is rejected with `InvalidFormat`.
pub fn parse_length(data: &[u8]) -> Result<LengthHeader, DecodeError> {
    let (value, consumed) = match data {
        [b0, ..] if *b0 < 0x80 => (u32::from(*b0), 1),
        [0x80, ..] => return Err(DecodeError::InvalidFormat),
        [0x81, b1, ..] => (u32::from(*b1), 2),
        [0x82, b1, b2, ..] => (u32::from_be_bytes([0, 0, *b1, *b2]), 3),
        [0x83, b1, b2, b3, ..] => (u32::from_be_bytes([0, *b1, *b2, *b3]), 4),
        [0x84, b1, b2, b3, b4, ..] => (u32::from_be_bytes([*b1, *b2, *b3, *b4]), 5),
        _ => return Err(DecodeError::InvalidLength),
    };

    Ok(LengthHeader { value, consumed })
}

/// Arena-backed BER-TLV tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BerTree {
    nodes: Vec<BerNode>,
}

impl Default for BerTree {
    fn default() -> Self {
        Self::new()
    }
}

impl BerTree {
    /// The anonymous root node
    pub const ROOT: NodeId = NodeId(0);

    /// Create a tree holding only the root
    pub fn new() -> Self {
        Self {
            nodes: vec![BerNode {
                tag: 0,
                value: NodeValue::Constructed(Vec::new()),
            }],
        }
    }

    /// Parse a buffer of concatenated data objects.
    ///
    /// The whole buffer must be consumed; an empty buffer or an object
    /// whose length runs past the end fails with `InvalidLength`.
    pub fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        if data.is_empty() {
            return Err(DecodeError::InvalidLength);
        }

        let mut tree = Self::new();
        // constructed values still to decode, in document order
        let mut pending = VecDeque::from([(Self::ROOT, data)]);
        while let Some((parent, layer)) = pending.pop_front() {
            tree.parse_layer(parent, layer, &mut pending)?;
        }
        Ok(tree)
    }

    fn parse_layer<'a>(
        &mut self,
        parent: NodeId,
        data: &'a [u8],
        pending: &mut VecDeque<(NodeId, &'a [u8])>,
    ) -> Result<(), DecodeError> {
        let mut offset = 0;

        while offset < data.len() {
            let tag = parse_tag(&data[offset..])?;
            offset += tag.consumed;

            let length = parse_length(&data[offset..])?;
            offset += length.consumed;

            let end = offset
                .checked_add(length.value as usize)
                .filter(|end| *end <= data.len())
                .ok_or(DecodeError::InvalidLength)?;
            let value = &data[offset..end];

            if tag.primitive {
                self.insert_primitive(parent, tag.tag, value.to_vec())?;
            } else {
                let child = self.insert_constructed(parent, tag.tag)?;
                pending.push_back((child, value));
            }

            offset = end;
        }

        Ok(())
    }

    /// Look up a node by index, `None` for an id from another tree
    pub fn node(&self, id: NodeId) -> Option<&BerNode> {
        self.nodes.get(id.0)
    }

    /// Children of a node, empty for primitives and unknown ids
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(BerNode::children).unwrap_or_default()
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the tree holds nothing but the root
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    fn find_child(&self, parent: NodeId, tag: u32) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|id| self.nodes[id.0].tag == tag)
    }

    /// `parent` must be a constructed node of this tree; a foreign id is
    /// `InvalidFormat`
    fn ensure_constructed(&self, parent: NodeId) -> Result<(), DecodeError> {
        let node = self.node(parent).ok_or(DecodeError::InvalidFormat)?;
        if node.is_primitive() {
            return Err(DecodeError::TypeMismatch { tag: node.tag });
        }
        Ok(())
    }

    fn push_child(&mut self, parent: NodeId, node: BerNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        if let NodeValue::Constructed(children) = &mut self.nodes[parent.0].value {
            children.push(id);
        }
        id
    }

    /// Insert a primitive under `parent`, replacing the data of an
    /// existing primitive with the same tag.
    pub fn insert_primitive(
        &mut self,
        parent: NodeId,
        tag: u32,
        data: Vec<u8>,
    ) -> Result<NodeId, DecodeError> {
        self.ensure_constructed(parent)?;

        match self.find_child(parent, tag) {
            Some(id) => match &mut self.nodes[id.0].value {
                NodeValue::Primitive(old) => {
                    *old = data;
                    Ok(id)
                }
                NodeValue::Constructed(_) => Err(DecodeError::TypeMismatch { tag }),
            },
            None => Ok(self.push_child(
                parent,
                BerNode {
                    tag,
                    value: NodeValue::Primitive(data),
                },
            )),
        }
    }

    /// Insert an empty constructed node under `parent`, or return the
    /// existing constructed node with the same tag.
    pub fn insert_constructed(&mut self, parent: NodeId, tag: u32) -> Result<NodeId, DecodeError> {
        self.ensure_constructed(parent)?;

        match self.find_child(parent, tag) {
            Some(id) if self.nodes[id.0].is_primitive() => Err(DecodeError::TypeMismatch { tag }),
            Some(id) => Ok(id),
            None => Ok(self.push_child(
                parent,
                BerNode {
                    tag,
                    value: NodeValue::Constructed(Vec::new()),
                },
            )),
        }
    }

    /// Fold every node of `other` into this tree.
    ///
    /// Stops at the first `TypeMismatch`; nodes inserted before the
    /// conflict stay in place.
    pub fn merge(&mut self, other: &BerTree) -> Result<(), DecodeError> {
        // (node in self, matching node in other)
        let mut pending = VecDeque::from([(Self::ROOT, Self::ROOT)]);

        while let Some((into, from)) = pending.pop_front() {
            for &child in other.children(from) {
                let node = &other.nodes[child.0];
                match &node.value {
                    NodeValue::Primitive(data) => {
                        self.insert_primitive(into, node.tag, data.clone())?;
                    }
                    NodeValue::Constructed(_) => {
                        let target = self.insert_constructed(into, node.tag)?;
                        pending.push_back((target, child));
                    }
                }
            }
        }

        Ok(())
    }

    /// Find the node at the end of a tag path
    pub fn find(&self, path: &[u32]) -> Option<NodeId> {
        path.iter()
            .try_fold(Self::ROOT, |current, tag| self.find_child(current, *tag))
    }

    /// Data of the primitive at the end of a tag path
    pub fn access(&self, path: &[u32]) -> Result<&[u8], DecodeError> {
        let mut current = Self::ROOT;
        for &tag in path {
            current = self
                .find_child(current, tag)
                .ok_or(DecodeError::TagNotFound { tag })?;
        }

        let node = &self.nodes[current.0];
        node.data().ok_or(DecodeError::TypeMismatch { tag: node.tag })
    }

    /// Text of the primitive at `path`, empty when it can't be reached
    pub fn string(&self, path: &[u32]) -> String {
        fields::string(self.access(path).ok())
    }

}

impl fmt::Display for BerTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = |ids: &[NodeId], depth: usize| -> Vec<(NodeId, usize)> {
            ids.iter().rev().map(|&id| (id, depth)).collect()
        };
        let mut stack = level(self.children(Self::ROOT), 0);

        while let Some((id, depth)) = stack.pop() {
            let node = &self.nodes[id.0];
            let indent = depth * 2;
            match node.data() {
                Some(data) => writeln!(
                    f,
                    "{:indent$}{:X}: {}",
                    "",
                    node.tag,
                    String::from_utf8_lossy(data)
                )?,
                None => {
                    writeln!(f, "{:indent$}{:X}:", "", node.tag)?;
                    stack.extend(level(node.children(), depth + 1));
                }
            }
        }
        Ok(())
    }
}
