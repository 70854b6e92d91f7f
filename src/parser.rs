use crate::boxes::{BoxHeader, BoxNode, BoxTree, FourCC, LeafPayload, NodeKind, SizeField};
use crate::registry::{BoxClass, Registry};
use crate::stream::BinaryStream;
use std::collections::HashSet;
use tracing::{debug, trace, warn};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("out of data at offset {offset}: needed {needed} bytes, {available} available")]
    OutOfData {
        offset: u64,
        needed: u64,
        available: u64,
    },
    #[error("unsupported size {size} for '{typ}' box at offset {offset}")]
    UnsupportedSize { offset: u64, typ: FourCC, size: u64 },
    #[error("structure error at offset {offset}: {issue}")]
    Structure { offset: u64, issue: StructureIssue },
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureIssue {
    #[error("box size {size} is smaller than its {header_size}-byte header")]
    SizeSmallerThanHeader { size: u64, header_size: u64 },
    #[error("{remaining} trailing bytes are too few for a box header")]
    TruncatedHeader { remaining: u64 },
    #[error("box of {size} bytes runs past its enclosing region ({available} bytes left)")]
    ExceedsRegion { size: u64, available: u64 },
    #[error("children cover {consumed} bytes of a {payload}-byte container payload")]
    ContainerMismatch { payload: u64, consumed: u64 },
    #[error("nesting deeper than {max_depth} levels")]
    DepthExceeded { max_depth: usize },
}

pub type Result<T> = std::result::Result<T, ParseError>;

pub const DEFAULT_MAX_DEPTH: usize = 64;

const MIN_HEADER_SIZE: usize = 8;

/// Per-parse settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Non-container types whose payload is stepped over without decoding
    /// (typically `mdat`).
    pub skip_data: HashSet<FourCC>,
    /// Deepest nesting level allowed; top-level boxes are at depth 0.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            skip_data: HashSet::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    pub fn with_skip_data(mut self, typ: FourCC) -> Self {
        self.skip_data.insert(typ);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// A parser bound to a registry. Cheap to create, reusable across inputs.
#[derive(Debug)]
pub struct Parser<'r> {
    registry: &'r Registry,
    options: ParseOptions,
}

impl<'r> Parser<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self::with_options(registry, ParseOptions::default())
    }

    pub fn with_options(registry: &'r Registry, options: ParseOptions) -> Self {
        Self { registry, options }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse a whole byte source. Either the complete tree or the first
    /// fatal error is returned.
    pub fn parse(&self, data: &[u8]) -> Result<BoxTree> {
        let mut s = BinaryStream::new(data);
        let boxes = parse_children(&mut s, self.registry, &self.options, 0)?;
        Ok(BoxTree {
            size: data.len() as u64,
            boxes,
        })
    }
}

/// Read one box header at the cursor.
///
/// A `0` size resolves to the rest of the stream, so `r` must be bounded to
/// the enclosing region.
pub fn read_box_header(r: &mut BinaryStream<'_>) -> Result<BoxHeader> {
    let start = r.offset();
    if r.remaining() < MIN_HEADER_SIZE {
        return Err(ParseError::Structure {
            offset: start,
            issue: StructureIssue::TruncatedHeader {
                remaining: r.remaining() as u64,
            },
        });
    }

    let size32 = r.read_u32()?;
    let typ = FourCC(r.read_array()?);
    let mut header_size = MIN_HEADER_SIZE as u64;

    let large_len = if size32 == 1 { 8 } else { 0 };
    let uuid_len = if &typ.0 == b"uuid" { 16 } else { 0 };
    let extra: usize = large_len + uuid_len;
    if r.remaining() < extra {
        return Err(ParseError::Structure {
            offset: start,
            issue: StructureIssue::TruncatedHeader {
                remaining: (MIN_HEADER_SIZE + r.remaining()) as u64,
            },
        });
    }

    let large = if size32 == 1 {
        header_size += 8;
        Some(r.read_u64()?)
    } else {
        None
    };

    let mut uuid = None;
    if &typ.0 == b"uuid" {
        uuid = Some(r.read_array::<16>()?);
        header_size += 16;
    }

    let (size, size_field) = match (size32, large) {
        (1, Some(large)) => {
            if large < header_size {
                return Err(ParseError::UnsupportedSize {
                    offset: start,
                    typ,
                    size: large,
                });
            }
            (large, SizeField::Large)
        }
        (0, _) => (header_size + r.remaining() as u64, SizeField::ToEnd),
        (n, _) => {
            let n = n as u64;
            if n < header_size {
                return Err(ParseError::Structure {
                    offset: start,
                    issue: StructureIssue::SizeSmallerThanHeader {
                        size: n,
                        header_size,
                    },
                });
            }
            (n, SizeField::Compact)
        }
    };

    Ok(BoxHeader {
        size,
        typ,
        uuid,
        header_size,
        start,
        size_field,
    })
}

/// Parse boxes until `r` is exactly exhausted.
pub fn parse_children(
    r: &mut BinaryStream<'_>,
    registry: &Registry,
    options: &ParseOptions,
    depth: usize,
) -> Result<Vec<BoxNode>> {
    let mut kids = Vec::new();
    while r.has_bytes_available() {
        let hdr = read_box_header(r)?;
        kids.push(parse_box(r, hdr, registry, options, depth)?);
    }
    Ok(kids)
}

fn parse_box(
    r: &mut BinaryStream<'_>,
    hdr: BoxHeader,
    registry: &Registry,
    options: &ParseOptions,
    depth: usize,
) -> Result<BoxNode> {
    let payload_len = hdr.payload_size();
    let len = usize::try_from(payload_len).map_err(|_| ParseError::UnsupportedSize {
        offset: hdr.start,
        typ: hdr.typ,
        size: hdr.size,
    })?;
    if len > r.remaining() {
        return Err(ParseError::Structure {
            offset: hdr.start,
            issue: StructureIssue::ExceedsRegion {
                size: hdr.size,
                available: hdr.header_size + r.remaining() as u64,
            },
        });
    }
    let mut payload = r.slice(len)?;

    debug!(offset = hdr.start, typ = %hdr.typ, size = hdr.size, depth, "box");

    let kind = match registry.resolve(&hdr.typ) {
        BoxClass::Container => {
            if depth >= options.max_depth {
                return Err(ParseError::Structure {
                    offset: hdr.start,
                    issue: StructureIssue::DepthExceeded {
                        max_depth: options.max_depth,
                    },
                });
            }
            let kids = parse_children(&mut payload, registry, options, depth + 1)?;
            let consumed: u64 = kids.iter().map(BoxNode::size).sum();
            if consumed != payload_len || payload.has_bytes_available() {
                return Err(ParseError::Structure {
                    offset: hdr.start,
                    issue: StructureIssue::ContainerMismatch {
                        payload: payload_len,
                        consumed,
                    },
                });
            }
            NodeKind::Container(kids)
        }
        _ if options.skip_data.contains(&hdr.typ) => NodeKind::Leaf(LeafPayload::Skipped {
            data_len: payload_len,
        }),
        BoxClass::Leaf { name, factory } => {
            let mut decoder = factory();
            match decoder.decode(&mut payload, &hdr) {
                Ok(()) => {
                    if payload.has_bytes_available() {
                        trace!(
                            typ = %hdr.typ,
                            decoder = name,
                            unread = payload.remaining(),
                            "decoder left payload bytes unread"
                        );
                    }
                    NodeKind::Leaf(LeafPayload::Decoded(decoder))
                }
                Err(e) => {
                    warn!(offset = hdr.start, typ = %hdr.typ, decoder = name, error = %e, "leaf decode failed");
                    NodeKind::Leaf(LeafPayload::Failed(e))
                }
            }
        }
        BoxClass::Unknown => NodeKind::Unknown {
            data: payload.read_all_data().to_vec(),
        },
    };

    Ok(BoxNode { hdr, kind })
}
