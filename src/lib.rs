pub mod api;
pub mod boxes;
pub mod jumbf;
pub mod known_boxes;
pub mod parser;
pub mod registry;
pub mod stream;
pub mod util;

pub use api::{JsonNode, parse_bytes, parse_file, parse_reader, to_json_node, to_json_nodes};
pub use boxes::{BoxHeader, BoxNode, BoxTree, FourCC, LeafPayload, NodeKind, SizeField};
pub use parser::{ParseError, ParseOptions, Parser, StructureIssue, parse_children, read_box_header};
pub use registry::{BoxDecoder, Property, Registry, RegistryError, default_registry};
pub use stream::BinaryStream;
