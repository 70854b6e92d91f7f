use crate::{
    boxes::{BoxNode, BoxTree, LeafPayload, NodeKind},
    known_boxes::KnownBox,
    parser::{ParseOptions, Parser},
    registry::Registry,
};
use anyhow::Context;
use serde::Serialize;
use std::{fs, io::Read, path::Path};

/// A JSON-serializable representation of a single box.
///
/// This is what `boxdump --json` prints, and what a UI would consume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonNode {
    /// Absolute byte offset of this box
    pub offset: u64,
    /// Total size of this box including header and payload
    pub size: u64,
    /// Size of just the box header (8, 16, 24 or 32 bytes)
    pub header_size: u64,
    /// Size of payload data
    pub payload_size: u64,

    /// Four-character box type code (e.g. "jumb", "moov")
    pub typ: String,
    /// Extended type for `uuid` boxes, as hex
    pub uuid: Option<String>,
    /// Box classification: "container", "leaf" or "unknown"
    pub kind: String,
    /// Human-readable box type name
    pub full_name: String,
    /// Decoded label/value pairs for leaf and unknown boxes
    pub properties: Option<Vec<(String, String)>>,
    /// Decode or display failure local to this box
    pub error: Option<String>,
    /// Child boxes for container types
    pub children: Option<Vec<JsonNode>>,
}

/// Build the JSON view of a parsed tree.
pub fn to_json_nodes(tree: &BoxTree, reg: &Registry) -> Vec<JsonNode> {
    tree.boxes().iter().map(|b| to_json_node(b, reg)).collect()
}

/// JSON view of one box and its subtree.
pub fn to_json_node(b: &BoxNode, reg: &Registry) -> JsonNode {
    let hdr = &b.hdr;
    let full_name = match KnownBox::from(hdr.typ) {
        KnownBox::Unknown(_) => reg.leaf_name(&hdr.typ).unwrap_or("Unknown Box").to_string(),
        kb => kb.full_name().to_string(),
    };

    let (properties, error, children) = match &b.kind {
        NodeKind::Container(kids) => (
            None,
            None,
            Some(kids.iter().map(|c| to_json_node(c, reg)).collect()),
        ),
        NodeKind::Leaf(LeafPayload::Failed(e)) => (None, Some(e.to_string()), None),
        _ => match b.display_properties() {
            Ok(props) => (Some(props), None, None),
            Err(e) => (None, Some(format!("{e:#}")), None),
        },
    };

    JsonNode {
        offset: hdr.start,
        size: hdr.size,
        header_size: hdr.header_size,
        payload_size: hdr.payload_size(),
        typ: hdr.typ.to_string(),
        uuid: hdr.uuid.map(hex::encode),
        kind: b.kind_name().to_string(),
        full_name,
        properties,
        error,
        children,
    }
}

/// Parse an in-memory byte source.
pub fn parse_bytes(data: &[u8], reg: &Registry, options: &ParseOptions) -> anyhow::Result<BoxTree> {
    let tree = Parser::with_options(reg, options.clone()).parse(data)?;
    Ok(tree)
}

/// Read `r` to the end and parse it.
pub fn parse_reader<R: Read>(
    r: &mut R,
    reg: &Registry,
    options: &ParseOptions,
) -> anyhow::Result<BoxTree> {
    let mut data = Vec::new();
    r.read_to_end(&mut data).context("reading input")?;
    parse_bytes(&data, reg, options)
}

/// Parse a file on disk.
///
/// # Example
/// ```no_run
/// use boxtree::{default_registry, parse_file, ParseOptions};
///
/// let reg = default_registry()?;
/// let tree = parse_file("manifest.jumbf", &reg, &ParseOptions::default())?;
/// for (depth, node) in tree.walk() {
///     println!("{}{} size={}", "  ".repeat(depth), node.typ(), node.size());
/// }
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn parse_file(
    path: impl AsRef<Path>,
    reg: &Registry,
    options: &ParseOptions,
) -> anyhow::Result<BoxTree> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    parse_bytes(&data, reg, options).with_context(|| format!("parsing {}", path.display()))
}
