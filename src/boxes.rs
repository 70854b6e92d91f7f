use crate::parser::ParseError;
use crate::registry::{BoxDecoder, Property};
use anyhow::anyhow;
use std::fmt;
use std::str::FromStr;

#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub fn new(s: &str) -> Option<Self> {
        let b = s.as_bytes();
        if b.len() == 4 {
            Some(FourCC([b[0], b[1], b[2], b[3]]))
        } else {
            None
        }
    }

    pub fn as_str_lossy(&self) -> String {
        self.0
            .iter()
            .map(|&c| if (32..=126).contains(&c) { c as char } else { '.' })
            .collect()
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str_lossy())
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str_lossy())
    }
}

impl FromStr for FourCC {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FourCC::new(s).ok_or_else(|| format!("type code must be exactly 4 bytes, got {s:?}"))
    }
}

/// How the total size of a box was encoded in its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeField {
    /// Plain 32-bit size.
    Compact,
    /// Size field was `0`: the box runs to the end of its enclosing region.
    ToEnd,
    /// Size field was `1`: a 64-bit size follows the type code.
    Large,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxHeader {
    pub size: u64,          // total size including header, `ToEnd` already resolved
    pub typ: FourCC,        // 4CC or b"uuid"
    pub uuid: Option<[u8; 16]>,
    pub header_size: u64,   // 8, 16, 24 or 32
    pub start: u64,         // absolute offset of header start
    pub size_field: SizeField,
}

impl BoxHeader {
    pub fn payload_size(&self) -> u64 {
        self.size - self.header_size
    }

    pub fn payload_offset(&self) -> u64 {
        self.start + self.header_size
    }
}

/// Decoded state of a leaf box.
#[derive(Debug)]
pub enum LeafPayload {
    Decoded(Box<dyn BoxDecoder>),
    /// The registered decoder rejected the payload. Siblings were still parsed.
    Failed(ParseError),
    /// Payload was skipped without being read, see [`crate::ParseOptions::skip_data`].
    Skipped { data_len: u64 },
}

#[derive(Debug)]
pub enum NodeKind {
    Container(Vec<BoxNode>),
    Leaf(LeafPayload),
    Unknown { data: Vec<u8> },
}

#[derive(Debug)]
pub struct BoxNode {
    pub hdr: BoxHeader,
    pub kind: NodeKind,
}

impl BoxNode {
    pub fn typ(&self) -> FourCC {
        self.hdr.typ
    }

    pub fn size(&self) -> u64 {
        self.hdr.size
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Container(_) => "container",
            NodeKind::Leaf(_) => "leaf",
            NodeKind::Unknown { .. } => "unknown",
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, NodeKind::Container(_))
    }

    /// Child boxes; empty for anything but a container.
    pub fn children(&self) -> &[BoxNode] {
        match &self.kind {
            NodeKind::Container(kids) => kids,
            _ => &[],
        }
    }

    pub fn decoder(&self) -> Option<&dyn BoxDecoder> {
        match &self.kind {
            NodeKind::Leaf(LeafPayload::Decoded(d)) => Some(d.as_ref()),
            _ => None,
        }
    }

    /// Downcast the decoded state of a leaf to its concrete decoder type.
    pub fn decoded<T: BoxDecoder>(&self) -> Option<&T> {
        self.decoder().and_then(|d| d.as_any().downcast_ref::<T>())
    }

    pub fn decode_error(&self) -> Option<&ParseError> {
        match &self.kind {
            NodeKind::Leaf(LeafPayload::Failed(e)) => Some(e),
            _ => None,
        }
    }

    /// Raw payload retained for boxes of an unregistered type.
    pub fn raw_data(&self) -> Option<&[u8]> {
        match &self.kind {
            NodeKind::Unknown { data } => Some(data),
            _ => None,
        }
    }

    /// Label/value pairs for a presentation layer.
    ///
    /// Failures here stay local to this node: a malformed payload only makes
    /// this call fail, the tree itself parsed fine.
    pub fn display_properties(&self) -> anyhow::Result<Vec<Property>> {
        match &self.kind {
            NodeKind::Container(_) => Ok(Vec::new()),
            NodeKind::Leaf(LeafPayload::Decoded(d)) => d.display_properties(),
            NodeKind::Leaf(LeafPayload::Failed(e)) => {
                Err(anyhow!("'{}' box failed to decode: {}", self.hdr.typ, e))
            }
            NodeKind::Leaf(LeafPayload::Skipped { data_len }) => Ok(vec![(
                "Data".to_string(),
                format!("{data_len} bytes (skipped)"),
            )]),
            NodeKind::Unknown { data } => {
                Ok(vec![("Raw Data".to_string(), format!("{} bytes", data.len()))])
            }
        }
    }
}

/// Result of one parse: the ordered top-level boxes of a byte source.
#[derive(Debug)]
pub struct BoxTree {
    pub size: u64,
    pub boxes: Vec<BoxNode>,
}

impl BoxTree {
    pub fn boxes(&self) -> &[BoxNode] {
        &self.boxes
    }

    /// Look up a box by dotted path, e.g. `jumb.jumd` or `moov.trak[1].mdia`.
    ///
    /// A bare segment selects the first box of that type at its level.
    pub fn find(&self, path: &str) -> Option<&BoxNode> {
        let mut level: &[BoxNode] = &self.boxes;
        let mut found = None;
        for seg in path.split('.').filter(|s| !s.is_empty()) {
            let (name, index) = match seg.find('[') {
                Some(i) if seg.ends_with(']') => {
                    (&seg[..i], seg[i + 1..seg.len() - 1].parse::<usize>().ok()?)
                }
                _ => (seg, 0),
            };
            let typ = FourCC::new(name)?;
            let node = level.iter().filter(|b| b.hdr.typ == typ).nth(index)?;
            level = node.children();
            found = Some(node);
        }
        found
    }

    /// Depth-first, pre-order traversal yielding `(depth, node)`.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: self.boxes.iter().rev().map(|b| (0, b)).collect(),
        }
    }
}

pub struct Walk<'a> {
    stack: Vec<(usize, &'a BoxNode)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a BoxNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.children().iter().rev().map(|c| (depth + 1, c)));
        Some((depth, node))
    }
}
