//! JUMBF (ISO/IEC 19566-5) box types: the `jumb` superbox, its `jumd`
//! description box and the `json` content box.

use crate::boxes::{BoxHeader, FourCC};
use crate::parser::Result;
use crate::registry::{BoxDecoder, Property, Registry, RegistryError};
use crate::stream::BinaryStream;
use crate::util::{format_uuid, hex_prefixed};
use anyhow::Context;
use std::any::Any;

pub const JUMB: FourCC = FourCC(*b"jumb");
pub const JUMD: FourCC = FourCC(*b"jumd");
pub const JSON: FourCC = FourCC(*b"json");

/// Toggles value marking a description box that ends with a SHA-256
/// signature of the superbox payload.
pub const TOGGLES_SIGNED: u8 = 0x0B;

pub const SIGNATURE_LEN: usize = 32;

/// Add the JUMBF box types to `reg`.
pub fn register(reg: &mut Registry) -> std::result::Result<(), RegistryError> {
    reg.register_container(JUMB)?;
    reg.register_leaf(JUMD, "jumd", || Box::new(DescriptionBox::default()))?;
    reg.register_leaf(JSON, "json", || Box::new(JsonContentBox::default()))?;
    Ok(())
}

/// `jumd`: content type UUID, toggles, label and an optional signature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptionBox {
    pub uuid: [u8; 16],
    pub toggles: u8,
    pub label: String,
    pub signature: Option<[u8; SIGNATURE_LEN]>,
}

impl DescriptionBox {
    pub fn has_signature(&self) -> bool {
        self.toggles == TOGGLES_SIGNED
    }

    /// The first four bytes of the content type UUID name the content type
    /// (`json`, `cbor`, `jp2c`, ...).
    pub fn content_type(&self) -> FourCC {
        FourCC([self.uuid[0], self.uuid[1], self.uuid[2], self.uuid[3]])
    }
}

impl BoxDecoder for DescriptionBox {
    fn decode(&mut self, r: &mut BinaryStream<'_>, _hdr: &BoxHeader) -> Result<()> {
        self.uuid = r.read_array()?;
        self.toggles = r.read_u8()?;
        self.label = r.read_nul_terminated_string()?;
        if self.has_signature() && r.has_bytes_available() {
            self.signature = Some(r.read_array()?);
        }
        Ok(())
    }

    fn display_properties(&self) -> anyhow::Result<Vec<Property>> {
        let mut props = vec![
            ("Box Type".to_string(), self.content_type().to_string()),
            ("UUID".to_string(), format_uuid(&self.uuid)),
            ("Label".to_string(), self.label.clone()),
            ("Toggles".to_string(), hex_prefixed(&[self.toggles])),
        ];
        if let Some(sig) = &self.signature {
            props.push(("Signature".to_string(), hex_prefixed(sig)));
        }
        Ok(props)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `json`: the payload kept verbatim. It is only parsed as JSON when
/// displayed, so bad JSON affects nothing but this box's display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonContentBox {
    pub data: Vec<u8>,
}

impl JsonContentBox {
    pub fn parse(&self) -> anyhow::Result<serde_json::Value> {
        serde_json::from_slice(&self.data).context("json box payload is not valid JSON")
    }
}

impl BoxDecoder for JsonContentBox {
    fn decode(&mut self, r: &mut BinaryStream<'_>, _hdr: &BoxHeader) -> Result<()> {
        self.data = r.read_all_data().to_vec();
        Ok(())
    }

    fn display_properties(&self) -> anyhow::Result<Vec<Property>> {
        let value = self.parse()?;
        let pretty = serde_json::to_string_pretty(&value)?;
        Ok(vec![("Data".to_string(), pretty)])
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
