//! Emission model handed to the code generator
//!
//! [`ContractSet`] is the renderer-facing view of a [`Resolution`]: contracts
//! sorted by fully qualified type name and numbered in that order, so two runs
//! over the same input produce identical output. Nothing here touches the type
//! host again except to map member types to their output ids.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Write as _};

use crate::analysis::closure::Resolution;
use crate::analysis::session::ResolutionSession;
use crate::contracts::{Contract, ContractId, MethodRef, ReadOnlyState, Shape};
use crate::core::types::{CallbackRole, TypeRef};
use crate::errors::{ContractError, Diagnostic};

/// Feature recognised during construction that the generator does not emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsupportedFeature {
    SerializeCallbacks,
    DeserializeCallbacks,
    ExtensionData,
    ReferencePreservation,
    ISerializable,
}

impl UnsupportedFeature {
    pub fn affects(self, direction: Direction) -> bool {
        match self {
            Self::SerializeCallbacks => direction == Direction::Write,
            Self::DeserializeCallbacks => direction == Direction::Read,
            _ => true,
        }
    }
}

impl fmt::Display for UnsupportedFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SerializeCallbacks => write!(f, "serialization callback invocation"),
            Self::DeserializeCallbacks => write!(f, "deserialization callback invocation"),
            Self::ExtensionData => write!(f, "extension data round-tripping"),
            Self::ReferencePreservation => write!(f, "reference preservation"),
            Self::ISerializable => write!(f, "ISerializable custom serialization"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Read,
    Write,
}

/// Features of `contract` the generator refuses to emit.
pub fn unsupported_features(contract: &Contract) -> Vec<UnsupportedFeature> {
    let mut features = Vec::new();
    if let Some(class) = contract.as_class() {
        if let Some(callbacks) = class.callbacks() {
            if callbacks.get(CallbackRole::OnSerializing).is_some() || callbacks.get(CallbackRole::OnSerialized).is_some() {
                features.push(UnsupportedFeature::SerializeCallbacks);
            }
            if callbacks.get(CallbackRole::OnDeserializing).is_some()
                || callbacks.get(CallbackRole::OnDeserialized).is_some()
            {
                features.push(UnsupportedFeature::DeserializeCallbacks);
            }
        }
        if class.has_extension_data {
            features.push(UnsupportedFeature::ExtensionData);
        }
        if class.is_iserializable {
            features.push(UnsupportedFeature::ISerializable);
        }
    }
    if contract.is_reference {
        features.push(UnsupportedFeature::ReferencePreservation);
    }
    features
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "message", rename_all = "snake_case")]
pub enum EmitMode {
    Full,
    /// Read and write bodies only throw this message.
    ThrowingStub(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDescriptor {
    pub name: String,
    pub member_name: String,
    pub type_name: String,
    pub type_id: Option<usize>,
    pub order: i32,
    pub is_required: bool,
    pub emit_default_value: bool,
    pub is_nullable: bool,
    pub is_get_only_collection: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatMemberDescriptor {
    pub name: String,
    pub namespace: String,
    pub type_name: String,
    pub depth: usize,
    pub conflicting_member: Option<usize>,
    pub has_conflicting_name_and_type: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDescriptor {
    pub kind: String,
    pub item_type: Option<String>,
    pub item_id: Option<usize>,
    pub item_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_name: Option<String>,
    pub add_method: Option<String>,
    pub get_enumerator: Option<String>,
    pub is_interface: bool,
    pub has_default_constructor: bool,
    pub populate_in_place: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValueDescriptor {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDescriptor {
    pub base_name: String,
    pub is_flags: bool,
    pub is_ulong: bool,
    pub values: Vec<EnumValueDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveDescriptor {
    pub reader: String,
    pub writer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XmlDescriptor {
    pub root_element: String,
    pub root_namespace: String,
    pub is_any: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDescriptor {
    pub id: usize,
    pub type_name: String,
    pub name: String,
    pub namespace: String,
    pub shape: String,
    pub is_reference: bool,
    pub is_value_type: bool,
    pub has_root: bool,
    pub read_only: ReadOnlyState,
    pub mode: EmitMode,
    pub base: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<MemberDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flattened: Vec<FlatMemberDescriptor>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub known_types: BTreeMap<String, usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<CollectionDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enumeration: Option<EnumDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primitive: Option<PrimitiveDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xml: Option<XmlDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unsupported: Vec<UnsupportedFeature>,
}

impl ContractDescriptor {
    /// Fail if a read or write body for this contract cannot be generated.
    pub fn require_supported(&self, direction: Direction) -> Result<(), ContractError> {
        if let EmitMode::ThrowingStub(message) = &self.mode {
            return Err(ContractError::StubContract { type_name: self.type_name.clone(), message: message.clone() });
        }
        if direction == Direction::Read {
            if let ReadOnlyState::CannotDeserialize(message) = &self.read_only {
                return Err(ContractError::NotSupported {
                    type_name: self.type_name.clone(),
                    feature: format!("deserialization ({})", message),
                });
            }
        }
        if let Some(feature) = self.unsupported.iter().find(|f| f.affects(direction)) {
            return Err(ContractError::NotSupported { type_name: self.type_name.clone(), feature: feature.to_string() });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractSet {
    pub contracts: Vec<ContractDescriptor>,
    pub roots: Vec<usize>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ContractSet {
    pub fn from_resolution(session: &ResolutionSession, resolution: &Resolution) -> Self {
        let mut ordered: Vec<&Contract> = resolution.contracts.values().map(|c| c.as_ref()).collect();
        ordered.sort_by(|a, b| a.type_name.cmp(&b.type_name));
        let numbering: HashMap<ContractId, usize> = ordered.iter().enumerate().map(|(i, c)| (c.id, i)).collect();

        let builder = DescriptorBuilder { session, numbering: &numbering };
        let contracts = ordered.iter().map(|c| builder.describe(c)).collect();
        let mut roots: Vec<usize> = resolution.roots.iter().filter_map(|id| numbering.get(id).copied()).collect();
        roots.sort_unstable();
        roots.dedup();

        Self { contracts, roots, diagnostics: resolution.diagnostics.clone() }
    }

    pub fn get(&self, type_name: &str) -> Option<&ContractDescriptor> {
        self.contracts.iter().find(|c| c.type_name == type_name)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for contract in &self.contracts {
            let _ = writeln!(
                out,
                "[{}] {} {} {{{}}}{} <- {}",
                contract.id,
                contract.shape,
                contract.name,
                contract.namespace,
                if contract.is_reference { " ref" } else { "" },
                contract.type_name
            );
            if let Some(base) = contract.base {
                let _ = writeln!(out, "    base [{}]", base);
            }
            for member in &contract.members {
                let _ = writeln!(
                    out,
                    "    {} : {} order={}{}",
                    member.name,
                    member.type_name,
                    member.order,
                    if member.is_required { " required" } else { "" }
                );
            }
            if let Some(collection) = &contract.collection {
                let _ = writeln!(
                    out,
                    "    {} of {}",
                    collection.kind,
                    collection.item_type.as_deref().unwrap_or("?")
                );
            }
            if let Some(enumeration) = &contract.enumeration {
                for value in &enumeration.values {
                    let _ = writeln!(out, "    {} = {}", value.name, value.value);
                }
            }
            for (name, id) in &contract.known_types {
                let _ = writeln!(out, "    known {} [{}]", name, id);
            }
            if let EmitMode::ThrowingStub(message) = &contract.mode {
                let _ = writeln!(out, "    stub: {}", message);
            }
        }
        out
    }
}

struct DescriptorBuilder<'a> {
    session: &'a ResolutionSession,
    numbering: &'a HashMap<ContractId, usize>,
}

impl DescriptorBuilder<'_> {
    fn id_of_type(&self, ty: TypeRef) -> Option<usize> {
        let id = self.session.id_of(ty).ok()?;
        self.numbering.get(&id).copied()
    }

    fn method(&self, method: &Option<MethodRef>) -> Option<String> {
        method
            .as_ref()
            .map(|m| format!("{}.{}", self.session.type_name(m.declaring_type), m.name))
    }

    fn describe(&self, contract: &Contract) -> ContractDescriptor {
        let mode = match (&contract.fault, &contract.read_only) {
            (Some(error), _) => EmitMode::ThrowingStub(error.to_string()),
            (None, ReadOnlyState::CannotSerialize(message)) => EmitMode::ThrowingStub(message.clone()),
            _ => EmitMode::Full,
        };

        let mut descriptor = ContractDescriptor {
            id: self.numbering.get(&contract.id).copied().unwrap_or_default(),
            type_name: contract.type_name.clone(),
            name: contract.xml_name.name.clone(),
            namespace: contract.xml_name.namespace.clone(),
            shape: contract.shape.label().to_string(),
            is_reference: contract.is_reference,
            is_value_type: contract.is_value_type,
            has_root: contract.has_root,
            read_only: contract.read_only.clone(),
            mode,
            base: None,
            members: Vec::new(),
            flattened: Vec::new(),
            known_types: BTreeMap::new(),
            collection: None,
            enumeration: None,
            primitive: None,
            xml: None,
            unsupported: unsupported_features(contract),
        };

        if let Some(known) = contract.known_contracts() {
            descriptor.known_types = known
                .iter()
                .filter_map(|(name, id)| self.numbering.get(id).map(|&n| (name.to_string(), n)))
                .collect();
        }

        match &contract.shape {
            Shape::Class(class) => {
                descriptor.base = class.base.and_then(|b| self.numbering.get(&b).copied());
                descriptor.members = class
                    .members
                    .iter()
                    .map(|m| MemberDescriptor {
                        name: m.name.clone(),
                        member_name: m.member_name.clone(),
                        type_name: self.session.type_name(m.member_type),
                        type_id: self.id_of_type(m.member_type),
                        order: m.order,
                        is_required: m.is_required,
                        emit_default_value: m.emit_default_value,
                        is_nullable: m.is_nullable,
                        is_get_only_collection: m.is_get_only_collection,
                    })
                    .collect();
                descriptor.flattened = class
                    .flattened
                    .iter()
                    .map(|m| FlatMemberDescriptor {
                        name: m.name.clone(),
                        namespace: m.namespace.clone(),
                        type_name: self.session.type_name(m.member_type),
                        depth: m.depth,
                        conflicting_member: m.conflicting_member,
                        has_conflicting_name_and_type: m.has_conflicting_name_and_type,
                    })
                    .collect();
            }
            Shape::Collection(collection) => {
                descriptor.collection = Some(CollectionDescriptor {
                    kind: collection.kind.label().to_string(),
                    item_type: collection.item_type.map(|t| self.session.type_name(t)),
                    item_id: collection.item_type.and_then(|t| self.id_of_type(t)),
                    item_name: collection.item_name.clone(),
                    key_name: collection.key_name.clone(),
                    value_name: collection.value_name.clone(),
                    add_method: self.method(&collection.add_method),
                    get_enumerator: self.method(&collection.get_enumerator),
                    is_interface: collection.is_interface,
                    has_default_constructor: collection.has_default_constructor,
                    populate_in_place: collection.populate_in_place,
                });
            }
            Shape::Enum(enumeration) => {
                descriptor.enumeration = Some(EnumDescriptor {
                    base_name: enumeration.base_name.name.clone(),
                    is_flags: enumeration.is_flags,
                    is_ulong: enumeration.is_ulong,
                    values: enumeration
                        .members
                        .iter()
                        .zip(&enumeration.values)
                        .map(|(m, &value)| EnumValueDescriptor { name: m.name.clone(), value })
                        .collect(),
                });
            }
            Shape::Primitive(primitive) => {
                descriptor.primitive = Some(PrimitiveDescriptor {
                    reader: primitive.kind.reader_method().to_string(),
                    writer: primitive.kind.writer_method().to_string(),
                });
            }
            Shape::Xml(xml) => {
                descriptor.xml = Some(XmlDescriptor {
                    root_element: xml.root_element.name.clone(),
                    root_namespace: xml.root_element.namespace.clone(),
                    is_any: xml.is_any,
                });
            }
            Shape::GenericParameter(_) => {}
        }
        descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(mode: EmitMode, read_only: ReadOnlyState, unsupported: Vec<UnsupportedFeature>) -> ContractDescriptor {
        ContractDescriptor {
            id: 0,
            type_name: "Zoo.Animal".into(),
            name: "Animal".into(),
            namespace: "http://schemas.datacontract.org/2004/07/Zoo".into(),
            shape: "class".into(),
            is_reference: false,
            is_value_type: false,
            has_root: true,
            read_only,
            mode,
            base: None,
            members: Vec::new(),
            flattened: Vec::new(),
            known_types: BTreeMap::new(),
            collection: None,
            enumeration: None,
            primitive: None,
            xml: None,
            unsupported,
        }
    }

    #[test]
    fn test_full_contract_supported() {
        let d = descriptor(EmitMode::Full, ReadOnlyState::Complete, Vec::new());
        assert!(d.require_supported(Direction::Read).is_ok());
        assert!(d.require_supported(Direction::Write).is_ok());
    }

    #[test]
    fn test_stub_refuses_both_directions() {
        let d = descriptor(EmitMode::ThrowingStub("broken".into()), ReadOnlyState::Complete, Vec::new());
        for direction in [Direction::Read, Direction::Write] {
            let err = d.require_supported(direction).unwrap_err();
            assert_eq!(err.code(), "DCS037");
        }
    }

    #[test]
    fn test_read_only_blocks_reading_only() {
        let d = descriptor(EmitMode::Full, ReadOnlyState::CannotDeserialize("no setter".into()), Vec::new());
        assert!(d.require_supported(Direction::Write).is_ok());
        assert_eq!(d.require_supported(Direction::Read).unwrap_err().code(), "DCS036");
    }

    #[test]
    fn test_callbacks_are_direction_specific() {
        let d = descriptor(EmitMode::Full, ReadOnlyState::Complete, vec![UnsupportedFeature::DeserializeCallbacks]);
        assert!(d.require_supported(Direction::Write).is_ok());
        assert!(d.require_supported(Direction::Read).is_err());
    }

    #[test]
    fn test_descriptor_json_shape() {
        let d = descriptor(EmitMode::Full, ReadOnlyState::Complete, Vec::new());
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["mode"]["mode"], "full");
        assert!(json.get("members").is_none());
        let back: ContractDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(back, d);
    }
}
