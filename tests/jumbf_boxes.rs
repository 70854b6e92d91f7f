use boxtree::boxes::{BoxNode, FourCC, NodeKind};
use boxtree::jumbf::{DescriptionBox, JsonContentBox, TOGGLES_SIGNED};
use boxtree::parser::{ParseError, ParseOptions, Parser, StructureIssue};
use boxtree::{default_registry, to_json_nodes};

const JSON_CONTENT_UUID: [u8; 16] = [
    0x6A, 0x73, 0x6F, 0x6E, 0x00, 0x11, 0x00, 0x10, 0x80, 0x00, 0x00, 0xAA, 0x00, 0x38, 0x9B, 0x71,
];

fn bx(typ: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&(8 + payload.len() as u32).to_be_bytes());
    v.extend_from_slice(typ);
    v.extend_from_slice(payload);
    v
}

fn jumd_payload(toggles: u8, label: &str, tail: &[u8]) -> Vec<u8> {
    let mut v = JSON_CONTENT_UUID.to_vec();
    v.push(toggles);
    v.extend_from_slice(label.as_bytes());
    v.push(0);
    v.extend_from_slice(tail);
    v
}

/// jumb(64) = header(8) + jumd(30) + json(26)
fn sample_superbox() -> Vec<u8> {
    let mut children = bx(b"jumd", &jumd_payload(0x03, "c2pa", &[]));
    children.extend(bx(b"json", br#"{"key":"01234567"}"#));
    let data = bx(b"jumb", &children);
    assert_eq!(data.len(), 64);
    data
}

fn assert_containers_exactly_filled(nodes: &[BoxNode]) {
    for n in nodes {
        if let NodeKind::Container(kids) = &n.kind {
            let sum: u64 = kids.iter().map(|k| k.size()).sum();
            assert_eq!(sum, n.hdr.payload_size(), "container '{}'", n.typ());
            assert_containers_exactly_filled(kids);
        }
    }
}

#[test]
fn superbox_end_to_end() {
    let reg = default_registry().unwrap();
    let data = sample_superbox();
    let tree = Parser::new(&reg).parse(&data).unwrap();

    assert_eq!(tree.boxes().len(), 1);
    let root = &tree.boxes()[0];
    assert_eq!(root.typ(), FourCC(*b"jumb"));
    assert!(root.is_container());
    assert_eq!(root.size(), 64);

    let kids = root.children();
    assert_eq!(kids.len(), 2);
    assert_eq!(kids[0].typ(), FourCC(*b"jumd"));
    assert_eq!(kids[1].typ(), FourCC(*b"json"));
    assert_eq!(kids[0].size() + kids[1].size(), 64 - root.hdr.header_size);
    assert_containers_exactly_filled(tree.boxes());

    let jumd = kids[0].decoded::<DescriptionBox>().unwrap();
    assert_eq!(jumd.label, "c2pa");
    assert_eq!(jumd.content_type(), FourCC(*b"json"));
    assert_eq!(jumd.signature, None);
}

#[test]
fn signed_description_with_full_signature() {
    let sig: Vec<u8> = (0u8..32).collect();
    let data = bx(b"jumb", &bx(b"jumd", &jumd_payload(TOGGLES_SIGNED, "signed", &sig)));

    let reg = default_registry().unwrap();
    let tree = Parser::new(&reg).parse(&data).unwrap();
    let node = tree.find("jumb.jumd").unwrap();
    let jumd = node.decoded::<DescriptionBox>().unwrap();
    assert!(jumd.has_signature());
    assert_eq!(jumd.signature.map(|s| s.to_vec()), Some(sig));

    let props = node.display_properties().unwrap();
    assert_eq!(props[0], ("Box Type".to_string(), "json".to_string()));
    assert_eq!(props[3], ("Toggles".to_string(), "0x0B".to_string()));
    assert_eq!(props[4].0, "Signature");
    assert!(props[4].1.starts_with("0x000102030405"));
}

#[test]
fn signed_description_with_short_signature_fails_locally() {
    let mut children = bx(b"jumd", &jumd_payload(TOGGLES_SIGNED, "short", &[0xAB; 10]));
    children.extend(bx(b"json", br#"{"ok":true}"#));
    let data = bx(b"jumb", &children);

    let reg = default_registry().unwrap();
    let tree = Parser::new(&reg).parse(&data).unwrap();
    let kids = tree.boxes()[0].children();

    assert!(matches!(
        kids[0].decode_error(),
        Some(ParseError::OutOfData { needed: 32, available: 10, .. })
    ));
    assert!(kids[0].display_properties().is_err());

    let json = kids[1].decoded::<JsonContentBox>().unwrap();
    assert_eq!(json.data, br#"{"ok":true}"#);
    assert_containers_exactly_filled(tree.boxes());
}

#[test]
fn signed_description_ending_at_label_has_no_signature() {
    let mut children = bx(b"jumd", &jumd_payload(TOGGLES_SIGNED, "unsigned-yet", &[]));
    children.extend(bx(b"json", b"{}"));
    let data = bx(b"jumb", &children);

    let reg = default_registry().unwrap();
    let tree = Parser::new(&reg).parse(&data).unwrap();
    let node = tree.find("jumb.jumd").unwrap();
    assert!(node.decode_error().is_none());
    let jumd = node.decoded::<DescriptionBox>().unwrap();
    assert!(jumd.has_signature());
    assert_eq!(jumd.signature, None);
    assert_eq!(node.display_properties().unwrap().len(), 4);
}

#[test]
fn unsigned_description_without_trailing_bytes() {
    let data = bx(b"jumd", &jumd_payload(0x03, "plain", &[]));
    let reg = default_registry().unwrap();
    let tree = Parser::new(&reg).parse(&data).unwrap();

    let node = &tree.boxes()[0];
    let jumd = node.decoded::<DescriptionBox>().unwrap();
    assert!(!jumd.has_signature());
    assert_eq!(jumd.signature, None);
    let labels: Vec<_> = node
        .display_properties()
        .unwrap()
        .into_iter()
        .map(|(label, _)| label)
        .collect();
    assert_eq!(labels, vec!["Box Type", "UUID", "Label", "Toggles"]);
}

#[test]
fn unterminated_label_fails_only_that_box() {
    let mut payload = JSON_CONTENT_UUID.to_vec();
    payload.push(0x03);
    payload.extend_from_slice(b"no-nul");
    let mut data = bx(b"jumd", &payload);
    data.extend(bx(b"free", &[]));

    let reg = default_registry().unwrap();
    let tree = Parser::new(&reg).parse(&data).unwrap();
    assert!(tree.boxes()[0].decode_error().is_some());
    assert_eq!(tree.boxes()[1].typ(), FourCC(*b"free"));
}

#[test]
fn json_box_pretty_prints_valid_payload() {
    let data = bx(b"json", br#"{"a":[1,2]}"#);
    let reg = default_registry().unwrap();
    let tree = Parser::new(&reg).parse(&data).unwrap();

    let props = tree.boxes()[0].display_properties().unwrap();
    assert_eq!(props.len(), 1);
    assert_eq!(props[0].0, "Data");
    let expected = serde_json::to_string_pretty(&serde_json::json!({"a": [1, 2]})).unwrap();
    assert_eq!(props[0].1, expected);
}

#[test]
fn invalid_json_only_fails_its_own_display() {
    let mut children = bx(b"jumd", &jumd_payload(0x03, "bad", &[]));
    children.extend(bx(b"json", b"{not json"));
    let mut data = bx(b"jumb", &children);
    data.extend(bx(b"json", br#"{"fine":1}"#));

    let reg = default_registry().unwrap();
    let tree = Parser::new(&reg).parse(&data).unwrap();

    let bad = tree.find("jumb.json").unwrap();
    assert!(bad.decode_error().is_none());
    assert!(bad.display_properties().is_err());
    assert!(tree.find("jumb.jumd").unwrap().display_properties().is_ok());
    assert!(tree.find("json").unwrap().display_properties().is_ok());

    let nodes = to_json_nodes(&tree, &reg);
    let inner = &nodes[0].children.as_ref().unwrap()[1];
    assert!(inner.error.as_deref().unwrap().contains("not valid JSON"));
    assert!(nodes[1].error.is_none());
}

#[test]
fn container_child_overrunning_parent_aborts_parse() {
    // jumb claims a 16-byte payload but its child says 20
    let mut data = Vec::new();
    data.extend_from_slice(&24u32.to_be_bytes());
    data.extend_from_slice(b"jumb");
    data.extend_from_slice(&20u32.to_be_bytes());
    data.extend_from_slice(b"json");
    data.extend_from_slice(&[b' '; 8]);
    data.extend(bx(b"free", &[0; 4]));

    let reg = default_registry().unwrap();
    let err = Parser::new(&reg).parse(&data).unwrap_err();
    assert!(matches!(
        err,
        ParseError::Structure {
            offset: 8,
            issue: StructureIssue::ExceedsRegion { size: 20, available: 16 },
        }
    ));
}

#[test]
fn container_with_slack_aborts_parse() {
    let mut payload = bx(b"json", b"{}");
    payload.extend_from_slice(&[0, 0, 0, 0]);
    let data = bx(b"jumb", &payload);

    let reg = default_registry().unwrap();
    let err = Parser::new(&reg).parse(&data).unwrap_err();
    assert!(matches!(
        err,
        ParseError::Structure {
            issue: StructureIssue::TruncatedHeader { remaining: 4 },
            ..
        }
    ));
}

#[test]
fn nesting_depth_is_capped() {
    let data = bx(b"jumb", &bx(b"jumb", &bx(b"jumb", &[])));
    let reg = default_registry().unwrap();

    let ok = Parser::with_options(&reg, ParseOptions::default().with_max_depth(3)).parse(&data);
    assert!(ok.is_ok());

    let err = Parser::with_options(&reg, ParseOptions::default().with_max_depth(2))
        .parse(&data)
        .unwrap_err();
    assert_eq!(
        err,
        ParseError::Structure {
            offset: 16,
            issue: StructureIssue::DepthExceeded { max_depth: 2 },
        }
    );
}

#[test]
fn parsing_twice_gives_identical_trees() {
    let mut data = sample_superbox();
    data.extend(bx(b"vndr", &[1, 2, 3]));
    let reg = default_registry().unwrap();
    let parser = Parser::new(&reg);

    let first = parser.parse(&data).unwrap();
    let second = parser.parse(&data).unwrap();
    assert_eq!(to_json_nodes(&first, &reg), to_json_nodes(&second, &reg));
    assert_eq!(
        first.find("jumb.jumd").unwrap().decoded::<DescriptionBox>(),
        second.find("jumb.jumd").unwrap().decoded::<DescriptionBox>()
    );
}
