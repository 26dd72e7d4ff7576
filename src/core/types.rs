//! Host-facing type vocabulary
//!
//! The resolution engine never touches a concrete compiler API. Everything it
//! needs to know about a type is answered through [`TypeQuery`], which a host
//! implements once over its own symbol table.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::SourceLocation;

/// Opaque handle to a type known to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeRef(pub u32);

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Enum,
    Array { rank: u32 },
    GenericParameter { position: u32 },
    Pointer,
}

impl TypeKind {
    pub fn is_value_type(self) -> bool {
        matches!(self, Self::Struct | Self::Enum)
    }

    pub fn is_array(self) -> bool {
        matches!(self, Self::Array { .. })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Internal,
    Private,
}

/// Framework types the engine has to recognise by identity.
///
/// Generic entries name the open definition; a constructed type is matched
/// through its generic definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpecialType {
    Object,
    ValueType,
    Enum,
    Void,
    Nullable,
    String,
    Boolean,
    Char,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    Decimal,
    DateTime,
    TimeSpan,
    DateOnly,
    TimeOnly,
    Guid,
    Uri,
    XmlQualifiedName,
    IEnumerable,
    IEnumerableGeneric,
    IEnumerator,
    IEnumeratorGeneric,
    ICollection,
    ICollectionGeneric,
    IList,
    IListGeneric,
    IDictionary,
    IDictionaryGeneric,
    ListGeneric,
    DictionaryGeneric,
    ArrayList,
    Hashtable,
    KeyValue,
    ArraySegment,
    IXmlSerializable,
    ISerializable,
    IExtensibleDataObject,
    ExtensionDataObject,
    StreamingContext,
}

/// Underlying integer type of an enum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegerType {
    SByte,
    Byte,
    Int16,
    UInt16,
    #[default]
    Int32,
    UInt32,
    Int64,
    UInt64,
}

impl IntegerType {
    pub fn special_type(self) -> SpecialType {
        match self {
            Self::SByte => SpecialType::SByte,
            Self::Byte => SpecialType::Byte,
            Self::Int16 => SpecialType::Int16,
            Self::UInt16 => SpecialType::UInt16,
            Self::Int32 => SpecialType::Int32,
            Self::UInt32 => SpecialType::UInt32,
            Self::Int64 => SpecialType::Int64,
            Self::UInt64 => SpecialType::UInt64,
        }
    }
}

// Decoded annotation values. Field names follow the attribute properties.

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataContractAttr {
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub is_reference: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionDataContractAttr {
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub item_name: Option<String>,
    pub key_name: Option<String>,
    pub value_name: Option<String>,
    pub is_reference: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataMemberAttr {
    pub name: Option<String>,
    pub order: Option<i32>,
    pub is_required: bool,
    pub emit_default_value: bool,
}

impl Default for DataMemberAttr {
    fn default() -> Self {
        Self { name: None, order: None, is_required: false, emit_default_value: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnumMemberAttr {
    pub value: Option<String>,
}

/// Root element override of a self-describing XML type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XmlRootAttr {
    pub element_name: Option<String>,
    pub namespace: Option<String>,
    /// Schema provider declares the type as `xs:any`, so it never has a root.
    pub is_any: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingScope {
    Module,
    #[default]
    Assembly,
}

/// A `[ContractNamespace]` declaration redirecting a source namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractNamespaceMapping {
    pub clr_namespace: String,
    pub contract_namespace: String,
    #[serde(default)]
    pub scope: MappingScope,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeAttributes {
    pub data_contract: Option<DataContractAttr>,
    pub collection_data_contract: Option<CollectionDataContractAttr>,
    pub serializable: bool,
    pub flags: bool,
    pub known_types: Vec<TypeRef>,
    pub xml_root: Option<XmlRootAttr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Field,
    Property,
    Method,
    Event,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accessor {
    pub is_public: bool,
    #[serde(default)]
    pub is_override: bool,
}

impl Accessor {
    pub fn public() -> Self {
        Self { is_public: true, is_override: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub name: String,
    pub kind: MemberKind,
    pub member_type: TypeRef,
    pub is_public: bool,
    pub is_static: bool,
    pub getter: Option<Accessor>,
    pub setter: Option<Accessor>,
    pub is_indexer: bool,
    pub data_member: Option<DataMemberAttr>,
    pub enum_member: Option<EnumMemberAttr>,
    pub ignore: bool,
    pub non_serialized: bool,
    pub optional_field: bool,
    /// Constant value of an enum literal.
    pub constant: Option<i128>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CallbackRole {
    OnSerializing,
    OnSerialized,
    OnDeserializing,
    OnDeserialized,
}

impl CallbackRole {
    pub const ALL: [CallbackRole; 4] = [
        Self::OnSerializing,
        Self::OnSerialized,
        Self::OnDeserializing,
        Self::OnDeserialized,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for CallbackRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnSerializing => write!(f, "OnSerializing"),
            Self::OnSerialized => write!(f, "OnSerialized"),
            Self::OnDeserializing => write!(f, "OnDeserializing"),
            Self::OnDeserialized => write!(f, "OnDeserialized"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    pub name: String,
    pub parameters: Vec<TypeRef>,
    /// `None` for void.
    pub return_type: Option<TypeRef>,
    pub is_public: bool,
    pub is_static: bool,
    pub is_virtual: bool,
    /// Interface this method explicitly implements.
    pub explicit_interface: Option<TypeRef>,
    /// One entry per callback marker, duplicates included.
    pub callbacks: Vec<CallbackRole>,
    pub location: SourceLocation,
}

/// Capability queries the host answers for the resolution engine.
///
/// Implementations must be deterministic for the lifetime of a session;
/// `interfaces` returns every implemented interface, inherited ones
/// included, in declaration order.
pub trait TypeQuery: Send + Sync {
    fn kind(&self, ty: TypeRef) -> TypeKind;

    /// Metadata name with arity suffix, e.g. ``List`1``.
    fn name(&self, ty: TypeRef) -> String;

    fn namespace(&self, ty: TypeRef) -> Option<String>;

    fn declaring_type(&self, ty: TypeRef) -> Option<TypeRef>;

    /// Identity of a well-known framework definition.
    fn special_type(&self, ty: TypeRef) -> Option<SpecialType>;

    fn well_known(&self, special: SpecialType) -> Option<TypeRef>;

    fn generic_definition(&self, ty: TypeRef) -> Option<TypeRef>;

    /// Arguments of a constructed type, or the parameters of a definition.
    fn generic_arguments(&self, ty: TypeRef) -> Vec<TypeRef>;

    fn make_generic(&self, definition: TypeRef, arguments: &[TypeRef]) -> Option<TypeRef>;

    fn make_array(&self, element: TypeRef) -> Option<TypeRef>;

    fn element_type(&self, ty: TypeRef) -> Option<TypeRef>;

    fn base_type(&self, ty: TypeRef) -> Option<TypeRef>;

    fn interfaces(&self, ty: TypeRef) -> Vec<TypeRef>;

    fn visibility(&self, ty: TypeRef) -> Visibility;

    fn has_public_default_constructor(&self, ty: TypeRef) -> bool;

    fn attributes(&self, ty: TypeRef) -> TypeAttributes;

    /// Members declared directly on the type.
    fn members(&self, ty: TypeRef) -> Vec<MemberInfo>;

    /// Methods declared directly on the type.
    fn methods(&self, ty: TypeRef) -> Vec<MethodInfo>;

    fn enum_underlying_type(&self, ty: TypeRef) -> Option<IntegerType>;

    /// Namespace mappings visible to the type, module scope first.
    fn contract_namespaces(&self, ty: TypeRef) -> Vec<ContractNamespaceMapping>;

    fn location(&self, ty: TypeRef) -> SourceLocation;
}
