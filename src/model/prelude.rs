//! Framework types every model starts with

use crate::core::types::{DataContractAttr, DataMemberAttr, MemberKind, SpecialType};
use crate::core::xml::COLLECTIONS_NAMESPACE;
use crate::model::schema::{AccessorSpec, DeclKind, MemberSpec, MethodSpec, ModelSpec, TypeSpec};

pub const PRELUDE_ASSEMBLY: &str = "mscorlib";

fn special(name: &str, kind: DeclKind, special: SpecialType) -> TypeSpec {
    let mut spec = TypeSpec::new(name, kind);
    spec.special = Some(special);
    spec
}

fn interface(name: &str, special: SpecialType, parents: &[&str], methods: Vec<MethodSpec>) -> TypeSpec {
    let mut spec = self::special(name, DeclKind::Interface, special);
    spec.default_constructor = false;
    spec.interfaces = parents.iter().map(|p| p.to_string()).collect();
    spec.methods = methods;
    spec
}

fn property(name: &str, ty: &str, setter: AccessorSpec) -> MemberSpec {
    MemberSpec {
        name: name.to_string(),
        kind: MemberKind::Property,
        member_type: Some(ty.to_string()),
        public: true,
        is_static: false,
        getter: AccessorSpec::Public,
        setter,
        indexer: false,
        data_member: None,
        enum_member: None,
        ignore: false,
        non_serialized: false,
        optional_field: false,
        value: None,
        line: 0,
    }
}

fn collection_class(name: &str, special: SpecialType, interfaces: &[&str], methods: Vec<MethodSpec>) -> TypeSpec {
    let mut spec = self::special(name, DeclKind::Class, special);
    spec.serializable = true;
    spec.interfaces = interfaces.iter().map(|i| i.to_string()).collect();
    spec.methods = methods;
    spec
}

fn key_value() -> TypeSpec {
    let mut spec = special("System.Runtime.Serialization.KeyValue`2", DeclKind::Struct, SpecialType::KeyValue);
    spec.generic_parameters = vec!["K".into(), "V".into()];
    spec.data_contract = Some(DataContractAttr {
        name: Some("KeyValueOf{0}{1}".into()),
        namespace: Some(COLLECTIONS_NAMESPACE.into()),
        is_reference: None,
    });
    let mut key = property("Key", "!0", AccessorSpec::Public);
    key.data_member = Some(DataMemberAttr { is_required: true, ..DataMemberAttr::default() });
    let mut value = property("Value", "!1", AccessorSpec::Public);
    value.data_member = Some(DataMemberAttr { is_required: true, order: Some(1), ..DataMemberAttr::default() });
    spec.members = vec![key, value];
    spec
}

/// Declarations of the well-known framework types.
pub fn prelude() -> ModelSpec {
    use DeclKind::{Class, Struct};
    use SpecialType as S;

    let mut types = vec![
        special("System.Object", Class, S::Object),
        special("System.ValueType", Class, S::ValueType),
        special("System.Enum", Class, S::Enum),
        special("System.Void", Struct, S::Void),
        special("System.String", Class, S::String),
        special("System.Boolean", Struct, S::Boolean),
        special("System.Char", Struct, S::Char),
        special("System.SByte", Struct, S::SByte),
        special("System.Byte", Struct, S::Byte),
        special("System.Int16", Struct, S::Int16),
        special("System.UInt16", Struct, S::UInt16),
        special("System.Int32", Struct, S::Int32),
        special("System.UInt32", Struct, S::UInt32),
        special("System.Int64", Struct, S::Int64),
        special("System.UInt64", Struct, S::UInt64),
        special("System.Single", Struct, S::Single),
        special("System.Double", Struct, S::Double),
        special("System.Decimal", Struct, S::Decimal),
        special("System.DateTime", Struct, S::DateTime),
        special("System.TimeSpan", Struct, S::TimeSpan),
        special("System.DateOnly", Struct, S::DateOnly),
        special("System.TimeOnly", Struct, S::TimeOnly),
        special("System.Guid", Struct, S::Guid),
        special("System.Uri", Class, S::Uri),
        special("System.Xml.XmlQualifiedName", Class, S::XmlQualifiedName),
        special("System.Nullable`1", Struct, S::Nullable),
        special("System.Runtime.Serialization.StreamingContext", Struct, S::StreamingContext),
        interface("System.Collections.IEnumerator", S::IEnumerator, &[], vec![MethodSpec::new("MoveNext", &[], Some("bool"))]),
        interface(
            "System.Collections.Generic.IEnumerator`1",
            S::IEnumeratorGeneric,
            &["System.Collections.IEnumerator"],
            Vec::new(),
        ),
        interface(
            "System.Collections.IEnumerable",
            S::IEnumerable,
            &[],
            vec![MethodSpec::new("GetEnumerator", &[], Some("System.Collections.IEnumerator"))],
        ),
        interface(
            "System.Collections.Generic.IEnumerable`1",
            S::IEnumerableGeneric,
            &["System.Collections.IEnumerable"],
            vec![MethodSpec::new("GetEnumerator", &[], Some("System.Collections.Generic.IEnumerator`1[!0]"))],
        ),
        interface("System.Collections.ICollection", S::ICollection, &["System.Collections.IEnumerable"], Vec::new()),
        interface(
            "System.Collections.Generic.ICollection`1",
            S::ICollectionGeneric,
            &["System.Collections.Generic.IEnumerable`1[!0]"],
            vec![MethodSpec::new("Add", &["!0"], None)],
        ),
        interface(
            "System.Collections.IList",
            S::IList,
            &["System.Collections.ICollection"],
            vec![MethodSpec::new("Add", &["object"], Some("int"))],
        ),
        interface(
            "System.Collections.Generic.IList`1",
            S::IListGeneric,
            &["System.Collections.Generic.ICollection`1[!0]"],
            vec![MethodSpec::new("Insert", &["int", "!0"], None)],
        ),
        interface(
            "System.Collections.IDictionary",
            S::IDictionary,
            &["System.Collections.ICollection"],
            vec![MethodSpec::new("Add", &["object", "object"], None)],
        ),
        interface(
            "System.Collections.Generic.IDictionary`2",
            S::IDictionaryGeneric,
            &["System.Collections.Generic.ICollection`1[System.Collections.Generic.KeyValuePair`2[!0,!1]]"],
            vec![MethodSpec::new("Add", &["!0", "!1"], None)],
        ),
        collection_class(
            "System.Collections.Generic.List`1",
            S::ListGeneric,
            &["System.Collections.Generic.IList`1[!0]", "System.Collections.IList"],
            vec![
                MethodSpec::new("Add", &["!0"], None),
                MethodSpec::new("GetEnumerator", &[], Some("System.Collections.Generic.IEnumerator`1[!0]")),
            ],
        ),
        collection_class(
            "System.Collections.Generic.Dictionary`2",
            S::DictionaryGeneric,
            &["System.Collections.Generic.IDictionary`2[!0,!1]", "System.Collections.IDictionary"],
            vec![
                MethodSpec::new("Add", &["!0", "!1"], None),
                MethodSpec::new(
                    "GetEnumerator",
                    &[],
                    Some("System.Collections.Generic.IEnumerator`1[System.Collections.Generic.KeyValuePair`2[!0,!1]]"),
                ),
            ],
        ),
        collection_class(
            "System.Collections.ArrayList",
            S::ArrayList,
            &["System.Collections.IList"],
            vec![
                MethodSpec::new("Add", &["object"], Some("int")),
                MethodSpec::new("GetEnumerator", &[], Some("System.Collections.IEnumerator")),
            ],
        ),
        collection_class(
            "System.Collections.Hashtable",
            S::Hashtable,
            &["System.Collections.IDictionary"],
            vec![
                MethodSpec::new("Add", &["object", "object"], None),
                MethodSpec::new("GetEnumerator", &[], Some("System.Collections.IEnumerator")),
            ],
        ),
        interface("System.Runtime.Serialization.ISerializable", S::ISerializable, &[], Vec::new()),
        interface("System.Xml.Serialization.IXmlSerializable", S::IXmlSerializable, &[], Vec::new()),
        key_value(),
    ];

    let mut extensible = interface(
        "System.Runtime.Serialization.IExtensibleDataObject",
        S::IExtensibleDataObject,
        &[],
        Vec::new(),
    );
    extensible.members = vec![property(
        "ExtensionData",
        "System.Runtime.Serialization.ExtensionDataObject",
        AccessorSpec::Public,
    )];
    types.push(extensible);

    let mut extension_data = special("System.Runtime.Serialization.ExtensionDataObject", Class, S::ExtensionDataObject);
    extension_data.default_constructor = false;
    types.push(extension_data);

    let mut segment = special("System.ArraySegment`1", Struct, S::ArraySegment);
    segment.interfaces = vec!["System.Collections.Generic.IList`1[!0]".into()];
    types.push(segment);

    let mut pair = TypeSpec::new("System.Collections.Generic.KeyValuePair`2", Struct);
    pair.generic_parameters = vec!["TKey".into(), "TValue".into()];
    pair.members = vec![property("Key", "!0", AccessorSpec::None), property("Value", "!1", AccessorSpec::None)];
    types.push(pair);

    ModelSpec { assembly: PRELUDE_ASSEMBLY.to_string(), contract_namespaces: Vec::new(), types }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_prelude_names_unique() {
        let prelude = prelude();
        let mut seen = HashSet::new();
        for spec in &prelude.types {
            assert!(seen.insert(spec.name.clone()), "duplicate {}", spec.name);
        }
    }

    #[test]
    fn test_prelude_covers_collection_interfaces() {
        let prelude = prelude();
        for special in [
            SpecialType::IEnumerable,
            SpecialType::IEnumerableGeneric,
            SpecialType::ICollection,
            SpecialType::ICollectionGeneric,
            SpecialType::IList,
            SpecialType::IListGeneric,
            SpecialType::IDictionary,
            SpecialType::IDictionaryGeneric,
        ] {
            assert!(prelude.types.iter().any(|t| t.special == Some(special)), "{:?} missing", special);
        }
    }

    #[test]
    fn test_key_value_members_required() {
        let spec = key_value();
        assert!(spec.members.iter().all(|m| m.data_member.as_ref().unwrap().is_required));
        assert_eq!(spec.members[1].data_member.as_ref().unwrap().order, Some(1));
    }
}
