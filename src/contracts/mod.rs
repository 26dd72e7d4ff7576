//! Resolved contracts, one closed variant per wire shape
//!
//! A [`Contract`] is immutable once published in the session cache. The few
//! pieces that are resolved lazily (known types, collection item contracts,
//! class callbacks) live in `OnceCell`s so they are computed at most once and
//! published atomically.

pub mod class;
pub mod collection;
pub mod enums;
pub mod member;
pub mod primitive;
pub mod xml;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::core::types::TypeRef;
use crate::core::xml::XmlName;
use crate::errors::ContractError;

pub use class::{CallbackMethods, ClassContract, ExtensionDataSetter};
pub use collection::{CollectionContract, CollectionKind, MethodRef};
pub use enums::{EnumContract, EnumMember};
pub use member::{DataMember, FlatMember};
pub use primitive::{PrimitiveContract, PrimitiveKind};
pub use xml::XmlContract;

/// Small integer identity of a canonical type within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContractId(pub usize);

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Known subtypes keyed by their qualified contract name.
pub type KnownContracts = BTreeMap<XmlName, ContractId>;

/// Whether a contract can be round-tripped.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum ReadOnlyState {
    #[default]
    Complete,
    /// Writing works; reading into the type fails with this message.
    CannotDeserialize(String),
    /// Neither direction works; the contract only exists so others can refer to it.
    CannotSerialize(String),
}

impl ReadOnlyState {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Complete => None,
            Self::CannotDeserialize(m) | Self::CannotSerialize(m) => Some(m),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenericParameterContract {
    pub position: u32,
}

#[derive(Debug, Clone)]
pub enum Shape {
    Primitive(PrimitiveContract),
    Class(ClassContract),
    Collection(CollectionContract),
    Enum(EnumContract),
    Xml(XmlContract),
    GenericParameter(GenericParameterContract),
}

impl Shape {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Primitive(_) => "primitive",
            Self::Class(_) => "class",
            Self::Collection(_) => "collection",
            Self::Enum(_) => "enum",
            Self::Xml(_) => "xml",
            Self::GenericParameter(_) => "generic_parameter",
        }
    }
}

#[derive(Debug)]
pub struct Contract {
    pub id: ContractId,
    pub underlying_type: TypeRef,
    pub original_underlying_type: TypeRef,
    /// Fully qualified type name, the sort key of emitted output.
    pub type_name: String,
    pub xml_name: XmlName,
    pub is_reference: bool,
    pub is_value_type: bool,
    pub has_root: bool,
    pub read_only: ReadOnlyState,
    /// Set on contracts standing in for a type whose construction failed.
    pub fault: Option<ContractError>,
    pub shape: Shape,
    known: OnceCell<KnownContracts>,
}

impl Contract {
    pub fn new(id: ContractId, ty: TypeRef, type_name: String, xml_name: XmlName, shape: Shape) -> Self {
        Self {
            id,
            underlying_type: ty,
            original_underlying_type: ty,
            type_name,
            xml_name,
            is_reference: false,
            is_value_type: false,
            has_root: true,
            read_only: ReadOnlyState::Complete,
            fault: None,
            shape,
            known: OnceCell::new(),
        }
    }

    pub fn with_reference(mut self, is_reference: bool) -> Self {
        self.is_reference = is_reference;
        self
    }

    pub fn with_value_type(mut self, is_value_type: bool) -> Self {
        self.is_value_type = is_value_type;
        self
    }

    pub fn with_root(mut self, has_root: bool) -> Self {
        self.has_root = has_root;
        self
    }

    pub fn with_read_only(mut self, read_only: ReadOnlyState) -> Self {
        self.read_only = read_only;
        self
    }

    /// Empty class-shaped contract for a type whose construction failed.
    pub fn placeholder(id: ContractId, ty: TypeRef, type_name: String, xml_name: XmlName, error: ContractError) -> Self {
        let message = error.to_string();
        let mut contract = Self::new(id, ty, type_name, xml_name, Shape::Class(ClassContract::empty()))
            .with_read_only(ReadOnlyState::CannotSerialize(message));
        contract.fault = Some(error);
        contract
    }

    pub fn name(&self) -> &str {
        &self.xml_name.name
    }

    pub fn namespace(&self) -> &str {
        &self.xml_name.namespace
    }

    pub fn is_placeholder(&self) -> bool {
        self.fault.is_some()
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self.shape, Shape::Primitive(_))
    }

    pub fn is_builtin(&self) -> bool {
        self.is_primitive()
    }

    pub fn is_iserializable(&self) -> bool {
        matches!(&self.shape, Shape::Class(c) if c.is_iserializable)
    }

    pub fn can_contain_references(&self) -> bool {
        !matches!(self.shape, Shape::Primitive(_) | Shape::Enum(_))
    }

    pub fn as_class(&self) -> Option<&ClassContract> {
        match &self.shape {
            Shape::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&CollectionContract> {
        match &self.shape {
            Shape::Collection(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumContract> {
        match &self.shape {
            Shape::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_primitive(&self) -> Option<&PrimitiveContract> {
        match &self.shape {
            Shape::Primitive(p) => Some(p),
            _ => None,
        }
    }

    /// Known subtypes, once imported by the session.
    pub fn known_contracts(&self) -> Option<&KnownContracts> {
        self.known.get()
    }

    pub(crate) fn known_cell(&self) -> &OnceCell<KnownContracts> {
        &self.known
    }
}

impl fmt::Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.shape.label(), self.xml_name, self.type_name)
    }
}
