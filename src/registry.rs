use crate::boxes::{BoxHeader, FourCC};
use crate::known_boxes::ISOBMFF_CONTAINERS;
use crate::stream::BinaryStream;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;

/// A `(label, value)` pair rendered by a presentation layer.
pub type Property = (String, String);

/// Trait for leaf box decoders.
///
/// One fresh instance is created per box occurrence. `decode` fills the
/// instance from a view bounded to exactly the box payload; whatever it leaves
/// unread is skipped by the parser. `display_properties` only formats state
/// that `decode` already captured and may be called any number of times.
pub trait BoxDecoder: Any + fmt::Debug + Send + Sync {
    fn decode(&mut self, r: &mut BinaryStream<'_>, hdr: &BoxHeader) -> crate::parser::Result<()>;

    fn display_properties(&self) -> anyhow::Result<Vec<Property>>;

    fn as_any(&self) -> &dyn Any;
}

/// Constructor producing one decoder per box.
pub type DecoderFactory = Box<dyn Fn() -> Box<dyn BoxDecoder> + Send + Sync>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("'{typ}' is already registered as a {existing}")]
    Conflict { typ: FourCC, existing: &'static str },
}

/// How the parser treats a box of a given type.
pub enum BoxClass<'a> {
    Container,
    Leaf { name: &'a str, factory: &'a DecoderFactory },
    Unknown,
}

/// Registry mapping type codes to container semantics or leaf decoders.
///
/// Build it once, then share it by reference with any number of parses; the
/// parser never mutates it.
pub struct Registry {
    containers: HashSet<FourCC>,
    leaves: HashMap<FourCC, LeafEntry>,
}

struct LeafEntry {
    factory: DecoderFactory,
    name: String,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            containers: HashSet::new(),
            leaves: HashMap::new(),
        }
    }

    /// Registry pre-populated with the standard ISOBMFF container boxes.
    pub fn isobmff() -> Self {
        Self {
            containers: ISOBMFF_CONTAINERS.iter().copied().collect(),
            leaves: HashMap::new(),
        }
    }

    pub fn register_container(&mut self, typ: FourCC) -> Result<(), RegistryError> {
        if self.leaves.contains_key(&typ) {
            return Err(RegistryError::Conflict {
                typ,
                existing: "leaf",
            });
        }
        self.containers.insert(typ);
        Ok(())
    }

    /// Associate `typ` with a decoder constructor.
    ///
    /// `name` is human-readable and used for logging and display. Registering
    /// the same type twice replaces the earlier factory.
    pub fn register_leaf<F>(&mut self, typ: FourCC, name: &str, factory: F) -> Result<(), RegistryError>
    where
        F: Fn() -> Box<dyn BoxDecoder> + Send + Sync + 'static,
    {
        if self.containers.contains(&typ) {
            return Err(RegistryError::Conflict {
                typ,
                existing: "container",
            });
        }
        let previous = self.leaves.insert(
            typ,
            LeafEntry {
                factory: Box::new(factory),
                name: name.to_string(),
            },
        );
        if previous.is_some() {
            debug!(%typ, decoder = name, "replaced leaf decoder");
        }
        Ok(())
    }

    /// Return the registry with `typ` marked as a container.
    pub fn with_container(mut self, typ: FourCC) -> Result<Self, RegistryError> {
        self.register_container(typ)?;
        Ok(self)
    }

    /// Return the registry with a decoder factory added for `typ`.
    pub fn with_leaf<F>(mut self, typ: FourCC, name: &str, factory: F) -> Result<Self, RegistryError>
    where
        F: Fn() -> Box<dyn BoxDecoder> + Send + Sync + 'static,
    {
        self.register_leaf(typ, name, factory)?;
        Ok(self)
    }

    /// Shorthand for decoders whose fresh state is their `Default`.
    pub fn with_default_leaf<D>(self, typ: FourCC, name: &str) -> Result<Self, RegistryError>
    where
        D: BoxDecoder + Default,
    {
        self.with_leaf(typ, name, || Box::new(D::default()) as Box<dyn BoxDecoder>)
    }

    pub fn resolve(&self, typ: &FourCC) -> BoxClass<'_> {
        if self.containers.contains(typ) {
            BoxClass::Container
        } else if let Some(entry) = self.leaves.get(typ) {
            BoxClass::Leaf {
                name: &entry.name,
                factory: &entry.factory,
            }
        } else {
            BoxClass::Unknown
        }
    }

    pub fn is_container(&self, typ: &FourCC) -> bool {
        self.containers.contains(typ)
    }

    pub fn leaf_name(&self, typ: &FourCC) -> Option<&str> {
        self.leaves.get(typ).map(|e| e.name.as_str())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut containers: Vec<_> = self.containers.iter().collect();
        containers.sort();
        let mut leaves: Vec<_> = self.leaves.keys().collect();
        leaves.sort();
        f.debug_struct("Registry")
            .field("containers", &containers)
            .field("leaves", &leaves)
            .finish()
    }
}

// ---------- Default registry ----------

/// ISOBMFF containers plus the JUMBF box types.
pub fn default_registry() -> Result<Registry, RegistryError> {
    let mut reg = Registry::isobmff();
    crate::jumbf::register(&mut reg)?;
    Ok(reg)
}
