use std::sync::Arc;
use xmlcontract::core::xml::COLLECTIONS_NAMESPACE;
use xmlcontract::naming::stable_namespace;
use xmlcontract::{ContractError, ResolutionSession, TypeModel, XmlName};

const ZOO: &str = r#"{
    "assembly": "Zoo",
    "types": [
        { "name": "Zoo.Animal", "data_contract": {},
          "members": [ { "name": "Name", "type": "string", "data_member": {} } ] },
        { "name": "Zoo.Keeper", "members": [ { "name": "Name", "type": "string" } ] },
        { "name": "Zoo.Renamed", "data_contract": { "name": "Beast", "namespace": "urn:zoo:beasts" } },
        { "name": "Zoo.Box`1", "generic_parameters": ["T"], "data_contract": {},
          "members": [ { "name": "Item", "type": "T", "data_member": {} } ] },
        { "name": "Zoo.Pen`1", "generic_parameters": ["T"], "data_contract": { "name": "Pen{0}" } },
        { "name": "Zoo.Outer" },
        { "name": "Zoo.Outer+Inner" },
        { "name": "Zoo.Herd", "base": "System.Collections.Generic.List`1[Zoo.Herd]" },
        { "name": "Zoo.Blank", "data_contract": { "name": "" } },
        { "name": "Zoo.Spaced", "data_contract": { "namespace": "urn:has space" } },
        { "name": "Zoo.Reserved", "data_contract": { "namespace": "http://schemas.microsoft.com/2003/10/Serialization/" } }
    ]
}"#;

fn session(json: &str) -> (Arc<TypeModel>, ResolutionSession) {
    let model = Arc::new(TypeModel::from_json(json).unwrap());
    let session = ResolutionSession::new(model.clone());
    (model, session)
}

fn name_of(json: &str, expression: &str) -> Result<XmlName, ContractError> {
    let (model, session) = session(json);
    let ty = model.parse_type(expression).unwrap();
    session.naming().xml_name(ty)
}

#[test]
fn test_data_contract_default_name() {
    let name = name_of(ZOO, "Zoo.Animal").unwrap();
    assert_eq!(name.name, "Animal");
    assert_eq!(name.namespace, "http://schemas.datacontract.org/2004/07/Zoo");
}

#[test]
fn test_non_attributed_name_uses_same_namespace() {
    let name = name_of(ZOO, "Zoo.Keeper").unwrap();
    assert_eq!(name, XmlName::new("Keeper", "http://schemas.datacontract.org/2004/07/Zoo"));
}

#[test]
fn test_explicit_name_and_namespace() {
    let name = name_of(ZOO, "Zoo.Renamed").unwrap();
    assert_eq!(name, XmlName::new("Beast", "urn:zoo:beasts"));
}

#[test]
fn test_primitive_names() {
    assert_eq!(name_of(ZOO, "int").unwrap(), XmlName::schema("int"));
    assert_eq!(name_of(ZOO, "string").unwrap(), XmlName::schema("string"));
    assert_eq!(name_of(ZOO, "byte[]").unwrap(), XmlName::schema("base64Binary"));
}

#[test]
fn test_collection_names() {
    let list = name_of(ZOO, "System.Collections.Generic.List`1[int]").unwrap();
    assert_eq!(list, XmlName::new("ArrayOfint", COLLECTIONS_NAMESPACE));

    let array = name_of(ZOO, "string[]").unwrap();
    assert_eq!(array, XmlName::new("ArrayOfstring", COLLECTIONS_NAMESPACE));

    let dictionary = name_of(ZOO, "System.Collections.Generic.Dictionary`2[string,int]").unwrap();
    assert_eq!(dictionary, XmlName::new("ArrayOfKeyValueOfstringint", COLLECTIONS_NAMESPACE));

    // Item namespace wins when the item is not a builtin.
    let animals = name_of(ZOO, "Zoo.Animal[]").unwrap();
    assert_eq!(animals, XmlName::new("ArrayOfAnimal", "http://schemas.datacontract.org/2004/07/Zoo"));

    let jagged = name_of(ZOO, "int[][]").unwrap();
    assert_eq!(jagged.name, "ArrayOfArrayOfint");
}

#[test]
fn test_nullable_item_name() {
    let name = name_of(ZOO, "System.Collections.Generic.List`1[int?]").unwrap();
    assert_eq!(name.name, "ArrayOfNullableOfint");
    assert_eq!(name.namespace, "http://schemas.datacontract.org/2004/07/System");
}

#[test]
fn test_generic_names() {
    let boxed = name_of(ZOO, "Zoo.Box`1[int]").unwrap();
    assert_eq!(boxed.name, "BoxOfint");

    // Arguments outside the builtin namespaces get a namespace digest appended.
    let boxed_animal = name_of(ZOO, "Zoo.Box`1[Zoo.Animal]").unwrap();
    assert!(boxed_animal.name.starts_with("BoxOfAnimal"));
    assert!(boxed_animal.name.len() > "BoxOfAnimal".len());

    let pen = name_of(ZOO, "Zoo.Pen`1[string]").unwrap();
    assert_eq!(pen.name, "Penstring");
}

#[test]
fn test_generic_digest_is_stable() {
    let a = name_of(ZOO, "Zoo.Box`1[Zoo.Animal]").unwrap();
    let b = name_of(ZOO, "Zoo.Box`1[Zoo.Animal]").unwrap();
    assert_eq!(a, b);
    let other = name_of(ZOO, "Zoo.Box`1[Zoo.Keeper]").unwrap();
    assert_ne!(a.name, other.name);
}

#[test]
fn test_nested_type_name() {
    let name = name_of(ZOO, "Zoo.Outer+Inner").unwrap();
    assert_eq!(name, XmlName::new("Outer.Inner", "http://schemas.datacontract.org/2004/07/Zoo"));
}

#[test]
fn test_recursive_collection_is_rejected() {
    let result = name_of(ZOO, "Zoo.Herd");
    assert!(matches!(result, Err(ContractError::RecursiveCollectionType { .. })));
}

#[test]
fn test_invalid_explicit_names() {
    assert!(matches!(name_of(ZOO, "Zoo.Blank"), Err(ContractError::InvalidContractName { .. })));
    assert!(matches!(name_of(ZOO, "Zoo.Spaced"), Err(ContractError::InvalidNamespace { .. })));
    assert!(matches!(name_of(ZOO, "Zoo.Reserved"), Err(ContractError::InvalidNamespace { .. })));
}

#[test]
fn test_contract_namespace_mapping() {
    let json = r#"{
        "assembly": "Zoo",
        "contract_namespaces": [
            { "clr_namespace": "Zoo", "contract_namespace": "urn:assembly" },
            { "clr_namespace": "Zoo", "contract_namespace": "urn:module", "scope": "module" }
        ],
        "types": [ { "name": "Zoo.Animal", "data_contract": {} }, { "name": "Park.Gate", "data_contract": {} } ]
    }"#;
    assert_eq!(name_of(json, "Zoo.Animal").unwrap().namespace, "urn:module");
    assert_eq!(name_of(json, "Park.Gate").unwrap().namespace, "http://schemas.datacontract.org/2004/07/Park");
}

#[test]
fn test_conflicting_contract_namespaces() {
    let json = r#"{
        "assembly": "Zoo",
        "contract_namespaces": [
            { "clr_namespace": "Zoo", "contract_namespace": "urn:one" },
            { "clr_namespace": "Zoo", "contract_namespace": "urn:two" }
        ],
        "types": [ { "name": "Zoo.Animal", "data_contract": {} } ]
    }"#;
    assert!(matches!(name_of(json, "Zoo.Animal"), Err(ContractError::NamespaceAlreadySet { .. })));
}

#[test]
fn test_stable_namespace_escaping() {
    assert_eq!(stable_namespace("Zoo.Park"), "http://schemas.datacontract.org/2004/07/Zoo.Park");
    assert_eq!(stable_namespace("Zoo Park"), "http://schemas.datacontract.org/2004/07/Zoo%20Park");
    assert_eq!(stable_namespace(""), "http://schemas.datacontract.org/2004/07/");
}
