//! Enum contracts
//!
//! Members are the public static fields of the enum. Their wire values are the
//! declared names unless an enum member annotation overrides them; flags enums
//! write a combination as space separated names.

use std::collections::HashMap;
use tracing::debug;

use crate::analysis::session::ResolutionSession;
use crate::contracts::member::{check_and_add, DataMember};
use crate::contracts::primitive::PrimitiveKind;
use crate::contracts::{Contract, ContractId, Shape};
use crate::core::types::{IntegerType, MemberKind, TypeRef};
use crate::core::xml::XmlName;
use crate::errors::{ContractError, SourceLocation};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    /// Wire text of the value.
    pub name: String,
    pub field_name: String,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumContract {
    pub members: Vec<EnumMember>,
    /// Value of each member, parallel to `members`.
    pub values: Vec<i64>,
    pub is_flags: bool,
    /// Values are unsigned 64-bit, stored bit-for-bit in `values`.
    pub is_ulong: bool,
    pub underlying: IntegerType,
    pub base_name: XmlName,
    pub base_contract: Option<ContractId>,
}

impl EnumContract {
    pub fn value_of(&self, name: &str) -> Option<i64> {
        self.members.iter().position(|m| m.name == name).map(|i| self.values[i])
    }

    /// Wire text of `value`, or `None` if it has no representation.
    pub fn format_value(&self, value: i64) -> Option<String> {
        if !self.is_flags {
            return self
                .values
                .iter()
                .position(|&v| v == value)
                .map(|i| self.members[i].name.clone());
        }

        let mut remaining = value;
        let mut zero_index = None;
        let mut names: Vec<&str> = Vec::new();
        for (i, &member_value) in self.values.iter().enumerate() {
            if member_value == 0 {
                zero_index = Some(i);
                continue;
            }
            if remaining == 0 {
                break;
            }
            if member_value & remaining == member_value {
                names.push(&self.members[i].name);
                remaining &= !member_value;
            }
        }
        if remaining != 0 {
            return None;
        }
        if names.is_empty() {
            return zero_index.map(|i| self.members[i].name.clone());
        }
        Some(names.join(" "))
    }

    /// Value of wire text; flags enums accept space separated names.
    pub fn parse_value(&self, text: &str) -> Option<i64> {
        if !self.is_flags {
            return self.value_of(text);
        }
        let mut value = 0i64;
        for name in text.split(' ').filter(|part| !part.is_empty()) {
            value |= self.value_of(name)?;
        }
        Some(value)
    }
}

pub fn build(session: &ResolutionSession, id: ContractId, ty: TypeRef) -> Result<Contract, ContractError> {
    let query = session.query();
    let type_name = session.type_name(ty);
    let attributes = query.attributes(ty);

    let has_data_contract = attributes.data_contract.is_some();
    if attributes.data_contract.as_ref().and_then(|dc| dc.is_reference) == Some(true) {
        return Err(ContractError::EnumCannotHaveIsReference { type_name });
    }

    let underlying = query.enum_underlying_type(ty).unwrap_or_default();
    let base_kind = PrimitiveKind::from_integer(underlying);
    let base_contract = match query.well_known(underlying.special_type()) {
        Some(base) => Some(session.id_of(base)?),
        None => None,
    };
    let is_ulong = underlying == IntegerType::UInt64;
    let xml_name = session.naming().xml_name(ty)?;

    let mut checked: Vec<DataMember> = Vec::new();
    let mut seen = HashMap::new();
    let mut members = Vec::new();
    let mut values = Vec::new();

    let fields = query
        .members(ty)
        .into_iter()
        .filter(|m| m.kind == MemberKind::Field && m.is_static && m.is_public);
    for field in fields {
        let name = if has_data_contract {
            if field.data_member.is_some() {
                return Err(ContractError::DataMemberOnEnumField { type_name, member: field.name.clone() });
            }
            match field.enum_member.as_ref().map(|em| em.value.as_deref()) {
                None => continue,
                Some(Some("")) => {
                    return Err(ContractError::InvalidEnumMemberValue { type_name, member: field.name.clone() });
                }
                Some(Some(value)) => value.to_string(),
                Some(None) => field.name.clone(),
            }
        } else {
            if field.non_serialized {
                continue;
            }
            field.name.clone()
        };

        let entry = DataMember::new(name.clone(), field.name.clone(), ty, MemberKind::Field);
        check_and_add(&mut checked, &mut seen, entry, &type_name, true)?;

        let constant = field.constant.unwrap_or(0);
        values.push(if is_ulong { constant as u64 as i64 } else { constant as i64 });
        members.push(EnumMember { name, field_name: field.name.clone(), location: field.location.clone() });
    }

    debug!(%type_name, members = members.len(), flags = attributes.flags, "enum contract built");

    let contract = EnumContract {
        members,
        values,
        is_flags: attributes.flags,
        is_ulong,
        underlying,
        base_name: base_kind.xml_name(),
        base_contract,
    };
    Ok(Contract::new(id, ty, type_name, xml_name, Shape::Enum(contract)).with_value_type(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract(flags: bool, entries: &[(&str, i64)]) -> EnumContract {
        EnumContract {
            members: entries
                .iter()
                .map(|(name, _)| EnumMember {
                    name: name.to_string(),
                    field_name: name.to_string(),
                    location: SourceLocation::default(),
                })
                .collect(),
            values: entries.iter().map(|(_, v)| *v).collect(),
            is_flags: flags,
            is_ulong: false,
            underlying: IntegerType::Int32,
            base_name: PrimitiveKind::Int32.xml_name(),
            base_contract: None,
        }
    }

    #[test]
    fn test_plain_enum_text() {
        let color = contract(false, &[("Red", 0), ("Green", 1)]);
        assert_eq!(color.format_value(1).as_deref(), Some("Green"));
        assert_eq!(color.format_value(7), None);
        assert_eq!(color.parse_value("Red"), Some(0));
        assert_eq!(color.parse_value("Red Green"), None);
    }

    #[test]
    fn test_flags_combination() {
        let access = contract(true, &[("None", 0), ("r", 1), ("w", 2), ("x", 4)]);
        assert_eq!(access.format_value(3).as_deref(), Some("r w"));
        assert_eq!(access.format_value(0).as_deref(), Some("None"));
        assert_eq!(access.format_value(8), None);
        assert_eq!(access.parse_value("r w"), Some(3));
        assert_eq!(access.parse_value("x  r"), Some(5));
        assert_eq!(access.parse_value("q"), None);
    }

    #[test]
    fn test_flags_without_zero_member() {
        let access = contract(true, &[("r", 1), ("w", 2)]);
        assert_eq!(access.format_value(0), None);
        assert_eq!(access.parse_value(""), Some(0));
    }
}
