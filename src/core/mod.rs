//! Core vocabulary shared by every stage of contract resolution
//!
//! Host type queries, XML naming primitives and the capability helpers the
//! builders rely on.

pub mod capabilities;
pub mod types;
pub mod xml;

pub use types::{
    Accessor, CallbackRole, CollectionDataContractAttr, ContractNamespaceMapping, DataContractAttr,
    DataMemberAttr, EnumMemberAttr, IntegerType, MappingScope, MemberInfo, MemberKind, MethodInfo,
    SpecialType, TypeAttributes, TypeKind, TypeQuery, TypeRef, Visibility, XmlRootAttr,
};
pub use xml::XmlName;
