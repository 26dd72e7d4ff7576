//! Data members, member ordering and inheritance conflict detection

use std::collections::HashMap;

use crate::core::types::{MemberKind, TypeRef};
use crate::errors::{ContractError, SourceLocation};

/// Order of a member without an explicit one; sorts before every explicit order.
///
/// This is the wire order of the reference serializer: unordered members are
/// written first, alphabetically, then the ordered ones.
pub const DEFAULT_ORDER: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataMember {
    /// Wire name, already encoded.
    pub name: String,
    /// Declared identifier of the field or property.
    pub member_name: String,
    pub member_type: TypeRef,
    pub kind: MemberKind,
    pub order: i32,
    pub is_required: bool,
    pub is_nullable: bool,
    pub emit_default_value: bool,
    pub is_get_only_collection: bool,
    pub location: SourceLocation,
}

impl DataMember {
    pub fn new(name: String, member_name: String, member_type: TypeRef, kind: MemberKind) -> Self {
        Self {
            name,
            member_name,
            member_type,
            kind,
            order: DEFAULT_ORDER,
            is_required: false,
            is_nullable: false,
            emit_default_value: true,
            is_get_only_collection: false,
            location: SourceLocation::default(),
        }
    }
}

/// Sort by (order, ordinal name). Stable, so equal keys keep declaration order.
pub fn sort_members(members: &mut [DataMember]) {
    members.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
}

/// Add `member` unless its wire name is already taken.
pub fn check_and_add(
    members: &mut Vec<DataMember>,
    seen: &mut HashMap<String, usize>,
    member: DataMember,
    type_name: &str,
    is_enum: bool,
) -> Result<(), ContractError> {
    if let Some(&existing) = seen.get(&member.name) {
        let first = members[existing].member_name.clone();
        return Err(if is_enum {
            ContractError::DuplicateEnumMemberValue {
                type_name: type_name.to_string(),
                name: member.name,
                first,
                second: member.member_name,
            }
        } else {
            ContractError::DuplicateMemberName {
                type_name: type_name.to_string(),
                name: member.name,
                first,
                second: member.member_name,
            }
        });
    }
    seen.insert(member.name.clone(), members.len());
    members.push(member);
    Ok(())
}

/// One position of a class's flattened member list, root-most class first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatMember {
    pub name: String,
    pub namespace: String,
    pub member_type: TypeRef,
    /// Distance from the contract this list belongs to; 0 for its own members.
    pub depth: usize,
    /// Index of the next member with the same qualified name further up the hierarchy.
    pub conflicting_member: Option<usize>,
    pub has_conflicting_name_and_type: bool,
}

/// Link same-named members across the hierarchy and flag runs whose types differ.
pub fn mark_conflicts(flat: &mut [FlatMember]) {
    for member in flat.iter_mut() {
        member.conflicting_member = None;
        member.has_conflicting_name_and_type = false;
    }

    let mut order: Vec<usize> = (0..flat.len()).collect();
    order.sort_by(|&a, &b| {
        let (a, b) = (&flat[a], &flat[b]);
        a.namespace
            .cmp(&b.namespace)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.depth.cmp(&b.depth))
    });

    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len()
            && flat[order[end]].name == flat[order[start]].name
            && flat[order[end]].namespace == flat[order[start]].namespace
        {
            end += 1;
        }

        if end - start > 1 {
            let run = &order[start..end];
            let conflicting_type = run
                .windows(2)
                .any(|pair| flat[pair[0]].member_type != flat[pair[1]].member_type);
            for (k, &index) in run.iter().enumerate() {
                flat[index].conflicting_member = run.get(k + 1).copied();
                flat[index].has_conflicting_name_and_type = conflicting_type;
            }
        }
        start = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(name: &str, order: i32) -> DataMember {
        let mut m = DataMember::new(name.into(), name.into(), TypeRef(0), MemberKind::Field);
        m.order = order;
        m
    }

    fn flat(name: &str, ns: &str, ty: u32, depth: usize) -> FlatMember {
        FlatMember {
            name: name.into(),
            namespace: ns.into(),
            member_type: TypeRef(ty),
            depth,
            conflicting_member: None,
            has_conflicting_name_and_type: false,
        }
    }

    #[test]
    fn test_default_order_sorts_first() {
        let mut members = vec![member("b", 0), member("z", DEFAULT_ORDER), member("a", DEFAULT_ORDER)];
        sort_members(&mut members);
        let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["a", "z", "b"]);
    }

    #[test]
    fn test_ordinal_name_comparison() {
        let mut members = vec![member("b", 1), member("B", 1), member("a", 1)];
        sort_members(&mut members);
        let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["B", "a", "b"]);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut members = Vec::new();
        let mut seen = HashMap::new();
        check_and_add(&mut members, &mut seen, member("Id", 0), "T", false).unwrap();
        let err = check_and_add(&mut members, &mut seen, member("Id", 1), "T", false).unwrap_err();
        assert_eq!(err.code(), "DCS011");
        let err = check_and_add(&mut members, &mut seen, member("Id", 1), "E", true).unwrap_err();
        assert_eq!(err.code(), "DCS012");
    }

    #[test]
    fn test_conflicts_same_type_not_flagged() {
        let mut members = vec![flat("Name", "ns", 1, 1), flat("Name", "ns", 1, 0)];
        mark_conflicts(&mut members);
        assert_eq!(members[1].conflicting_member, Some(0));
        assert_eq!(members[0].conflicting_member, None);
        assert!(!members[0].has_conflicting_name_and_type);
        assert!(!members[1].has_conflicting_name_and_type);
    }

    #[test]
    fn test_conflicts_different_type_flagged() {
        let mut members = vec![
            flat("Name", "base", 1, 2),
            flat("Name", "mid", 2, 1),
            flat("Name", "base", 3, 0),
            flat("Other", "base", 3, 0),
        ];
        mark_conflicts(&mut members);
        assert!(members[0].has_conflicting_name_and_type);
        assert!(members[2].has_conflicting_name_and_type);
        assert!(!members[1].has_conflicting_name_and_type);
        assert!(!members[3].has_conflicting_name_and_type);
        assert_eq!(members[2].conflicting_member, Some(0));
    }
}
