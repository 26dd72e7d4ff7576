//! Built-in leaf contracts
//!
//! The primitive set is fixed. Every primitive maps to an XML schema (or
//! serialization namespace) type and a pair of reader/writer method tokens
//! the code emitter calls.

use serde::{Deserialize, Serialize};

use crate::contracts::{Contract, ContractId, Shape};
use crate::core::capabilities::special_of;
use crate::core::types::{IntegerType, SpecialType, TypeKind, TypeQuery, TypeRef};
use crate::core::xml::XmlName;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PrimitiveKind {
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
    String,
    ByteArray,
    Object,
    TimeSpan,
    DateOnly,
    TimeOnly,
    Guid,
    Uri,
    QName,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 23] = [
        Self::Boolean,
        Self::Char,
        Self::SByte,
        Self::Byte,
        Self::Int16,
        Self::UInt16,
        Self::Int32,
        Self::UInt32,
        Self::Int64,
        Self::UInt64,
        Self::Single,
        Self::Double,
        Self::Decimal,
        Self::DateTime,
        Self::String,
        Self::ByteArray,
        Self::Object,
        Self::TimeSpan,
        Self::DateOnly,
        Self::TimeOnly,
        Self::Guid,
        Self::Uri,
        Self::QName,
    ];

    /// Framework type carrying this primitive; `None` for `byte[]`.
    pub fn special_type(self) -> Option<SpecialType> {
        Some(match self {
            Self::Boolean => SpecialType::Boolean,
            Self::Char => SpecialType::Char,
            Self::SByte => SpecialType::SByte,
            Self::Byte => SpecialType::Byte,
            Self::Int16 => SpecialType::Int16,
            Self::UInt16 => SpecialType::UInt16,
            Self::Int32 => SpecialType::Int32,
            Self::UInt32 => SpecialType::UInt32,
            Self::Int64 => SpecialType::Int64,
            Self::UInt64 => SpecialType::UInt64,
            Self::Single => SpecialType::Single,
            Self::Double => SpecialType::Double,
            Self::Decimal => SpecialType::Decimal,
            Self::DateTime => SpecialType::DateTime,
            Self::String => SpecialType::String,
            Self::ByteArray => return None,
            Self::Object => SpecialType::Object,
            Self::TimeSpan => SpecialType::TimeSpan,
            Self::DateOnly => SpecialType::DateOnly,
            Self::TimeOnly => SpecialType::TimeOnly,
            Self::Guid => SpecialType::Guid,
            Self::Uri => SpecialType::Uri,
            Self::QName => SpecialType::XmlQualifiedName,
        })
    }

    pub fn from_special(special: SpecialType) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.special_type() == Some(special))
    }

    pub fn from_integer(integer: IntegerType) -> Self {
        match integer {
            IntegerType::SByte => Self::SByte,
            IntegerType::Byte => Self::Byte,
            IntegerType::Int16 => Self::Int16,
            IntegerType::UInt16 => Self::UInt16,
            IntegerType::Int32 => Self::Int32,
            IntegerType::UInt32 => Self::UInt32,
            IntegerType::Int64 => Self::Int64,
            IntegerType::UInt64 => Self::UInt64,
        }
    }

    pub fn xml_name(self) -> XmlName {
        match self {
            Self::Char => XmlName::serialization("char"),
            Self::TimeSpan => XmlName::serialization("duration"),
            Self::Guid => XmlName::serialization("guid"),
            _ => XmlName::schema(self.schema_name()),
        }
    }

    fn schema_name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::SByte => "byte",
            Self::Byte => "unsignedByte",
            Self::Int16 => "short",
            Self::UInt16 => "unsignedShort",
            Self::Int32 => "int",
            Self::UInt32 => "unsignedInt",
            Self::Int64 => "long",
            Self::UInt64 => "unsignedLong",
            Self::Single => "float",
            Self::Double => "double",
            Self::Decimal => "decimal",
            Self::DateTime => "dateTime",
            Self::String => "string",
            Self::ByteArray => "base64Binary",
            Self::Object => "anyType",
            Self::DateOnly => "date",
            Self::TimeOnly => "time",
            Self::Uri => "anyURI",
            Self::QName => "QName",
            Self::Char => "char",
            Self::TimeSpan => "duration",
            Self::Guid => "guid",
        }
    }

    /// Token of the reader call that consumes one element of this type.
    pub fn reader_method(self) -> &'static str {
        match self {
            Self::Boolean => "ReadElementContentAsBoolean",
            Self::Char => "ReadElementContentAsChar",
            Self::SByte => "ReadElementContentAsSignedByte",
            Self::Byte => "ReadElementContentAsUnsignedByte",
            Self::Int16 => "ReadElementContentAsShort",
            Self::UInt16 => "ReadElementContentAsUnsignedShort",
            Self::Int32 => "ReadElementContentAsInt",
            Self::UInt32 => "ReadElementContentAsUnsignedInt",
            Self::Int64 => "ReadElementContentAsLong",
            Self::UInt64 => "ReadElementContentAsUnsignedLong",
            Self::Single => "ReadElementContentAsFloat",
            Self::Double => "ReadElementContentAsDouble",
            Self::Decimal => "ReadElementContentAsDecimal",
            Self::DateTime => "ReadElementContentAsDateTime",
            Self::String => "ReadElementContentAsString",
            Self::ByteArray => "ReadElementContentAsBase64",
            Self::Object => "ReadElementContentAsAnyType",
            Self::TimeSpan => "ReadElementContentAsTimeSpan",
            Self::DateOnly => "ReadElementContentAsDateOnly",
            Self::TimeOnly => "ReadElementContentAsTimeOnly",
            Self::Guid => "ReadElementContentAsGuid",
            Self::Uri => "ReadElementContentAsUri",
            Self::QName => "ReadElementContentAsQName",
        }
    }

    /// Token of the writer call that produces the content of one element.
    pub fn writer_method(self) -> &'static str {
        match self {
            Self::Boolean => "WriteBoolean",
            Self::Char => "WriteChar",
            Self::SByte => "WriteSignedByte",
            Self::Byte => "WriteUnsignedByte",
            Self::Int16 => "WriteShort",
            Self::UInt16 => "WriteUnsignedShort",
            Self::Int32 => "WriteInt",
            Self::UInt32 => "WriteUnsignedInt",
            Self::Int64 => "WriteLong",
            Self::UInt64 => "WriteUnsignedLong",
            Self::Single => "WriteFloat",
            Self::Double => "WriteDouble",
            Self::Decimal => "WriteDecimal",
            Self::DateTime => "WriteDateTime",
            Self::String => "WriteString",
            Self::ByteArray => "WriteBase64",
            Self::Object => "WriteAnyType",
            Self::TimeSpan => "WriteTimeSpan",
            Self::DateOnly => "WriteDateOnly",
            Self::TimeOnly => "WriteTimeOnly",
            Self::Guid => "WriteGuid",
            Self::Uri => "WriteUri",
            Self::QName => "WriteQName",
        }
    }

    pub fn is_value_type(self) -> bool {
        !matches!(self, Self::String | Self::ByteArray | Self::Object | Self::Uri | Self::QName)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimitiveContract {
    pub kind: PrimitiveKind,
    /// `anyType` standing in for a non-collection interface.
    pub interface_variant: bool,
}

/// Which built-in contract, if any, a type maps to.
pub fn builtin_kind(query: &dyn TypeQuery, ty: TypeRef) -> Option<PrimitiveContract> {
    match query.kind(ty) {
        TypeKind::Interface => {
            if crate::contracts::collection::known_interface_kind(query, ty).is_some() {
                return None;
            }
            return Some(PrimitiveContract { kind: PrimitiveKind::Object, interface_variant: true });
        }
        TypeKind::Array { rank: 1 } => {
            let element = query.element_type(ty)?;
            if query.special_type(element) == Some(SpecialType::Byte) {
                return Some(PrimitiveContract { kind: PrimitiveKind::ByteArray, interface_variant: false });
            }
            return None;
        }
        _ => {}
    }

    if query.generic_definition(ty).is_some() {
        return None;
    }
    let kind = PrimitiveKind::from_special(special_of(query, ty)?)?;
    Some(PrimitiveContract { kind, interface_variant: false })
}

pub(crate) fn build(id: ContractId, ty: TypeRef, type_name: String, primitive: PrimitiveContract) -> Contract {
    let kind = primitive.kind;
    Contract::new(id, ty, type_name, kind.xml_name(), Shape::Primitive(primitive))
        .with_value_type(kind.is_value_type())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::xml::{SCHEMA_NAMESPACE, SERIALIZATION_NAMESPACE};

    #[test]
    fn test_integer_names() {
        assert_eq!(PrimitiveKind::SByte.xml_name().name, "byte");
        assert_eq!(PrimitiveKind::Byte.xml_name().name, "unsignedByte");
        assert_eq!(PrimitiveKind::UInt64.xml_name().name, "unsignedLong");
        assert_eq!(PrimitiveKind::Int32.xml_name().namespace, SCHEMA_NAMESPACE);
    }

    #[test]
    fn test_serialization_namespace_primitives() {
        for kind in [PrimitiveKind::Char, PrimitiveKind::TimeSpan, PrimitiveKind::Guid] {
            assert_eq!(kind.xml_name().namespace, SERIALIZATION_NAMESPACE);
        }
    }

    #[test]
    fn test_special_round_trip() {
        for kind in PrimitiveKind::ALL {
            if let Some(special) = kind.special_type() {
                assert_eq!(PrimitiveKind::from_special(special), Some(kind));
            }
        }
    }

    #[test]
    fn test_method_tokens() {
        assert_eq!(PrimitiveKind::Int32.reader_method(), "ReadElementContentAsInt");
        assert_eq!(PrimitiveKind::ByteArray.writer_method(), "WriteBase64");
    }
}
