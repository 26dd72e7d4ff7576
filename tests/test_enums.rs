use std::sync::Arc;
use xmlcontract::core::types::IntegerType;
use xmlcontract::{Contract, ContractError, ResolutionSession, TypeModel, XmlName};

const ZOO: &str = r#"{
    "assembly": "Zoo",
    "types": [
        { "name": "Zoo.Color", "kind": "enum",
          "members": [ { "name": "Red" }, { "name": "Green" }, { "name": "Blue", "value": 10 } ] },
        { "name": "Zoo.Diet", "kind": "enum", "data_contract": { "name": "FoodKind" },
          "members": [
            { "name": "Meat", "enum_member": {} },
            { "name": "Plants", "enum_member": { "value": "veg" } },
            { "name": "Internal" }
          ] },
        { "name": "Zoo.Access", "kind": "enum", "flags": true,
          "members": [
            { "name": "None", "value": 0 },
            { "name": "Feed", "value": 1 },
            { "name": "Clean", "value": 2 },
            { "name": "Vet", "value": 4 }
          ] },
        { "name": "Zoo.Huge", "kind": "enum", "underlying": "uint64",
          "members": [ { "name": "Small", "value": 1 }, { "name": "Max", "value": 18446744073709551615 } ] },
        { "name": "Zoo.Empty", "kind": "enum", "data_contract": {},
          "members": [ { "name": "Blank", "enum_member": { "value": "" } } ] },
        { "name": "Zoo.Mixed", "kind": "enum", "data_contract": {},
          "members": [ { "name": "Odd", "data_member": {} } ] },
        { "name": "Zoo.Shared", "kind": "enum", "data_contract": { "is_reference": true },
          "members": [ { "name": "One", "enum_member": {} } ] },
        { "name": "Zoo.Twin", "kind": "enum", "data_contract": {},
          "members": [
            { "name": "First", "enum_member": { "value": "X" } },
            { "name": "Second", "enum_member": { "value": "X" } }
          ] }
    ]
}"#;

fn zoo() -> (Arc<TypeModel>, ResolutionSession) {
    let model = Arc::new(TypeModel::from_json(ZOO).unwrap());
    let session = ResolutionSession::new(model.clone());
    (model, session)
}

fn build(name: &str) -> Result<Arc<Contract>, ContractError> {
    let (model, session) = zoo();
    session.contract_for(model.lookup(name).unwrap())
}

#[test]
fn test_plain_enum() {
    let color = build("Zoo.Color").unwrap();
    assert_eq!(color.xml_name, XmlName::new("Color", "http://schemas.datacontract.org/2004/07/Zoo"));
    assert!(color.is_value_type);

    let enumeration = color.as_enum().unwrap();
    let names: Vec<&str> = enumeration.members.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Red", "Green", "Blue"]);
    assert_eq!(enumeration.values, vec![0, 1, 10]);
    assert_eq!(enumeration.underlying, IntegerType::Int32);
    assert_eq!(enumeration.base_name, XmlName::schema("int"));
    assert!(!enumeration.is_flags);
}

#[test]
fn test_enum_base_contract() {
    let (model, session) = zoo();
    let color = session.contract_for(model.lookup("Zoo.Color").unwrap()).unwrap();
    let int = session.id_of(model.lookup("System.Int32").unwrap()).unwrap();
    assert_eq!(color.as_enum().unwrap().base_contract, Some(int));
}

#[test]
fn test_data_contract_enum_members() {
    let diet = build("Zoo.Diet").unwrap();
    assert_eq!(diet.name(), "FoodKind");
    let enumeration = diet.as_enum().unwrap();
    let names: Vec<&str> = enumeration.members.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Meat", "veg"]);
    assert_eq!(enumeration.members[1].field_name, "Plants");
    assert_eq!(enumeration.value_of("veg"), Some(1));
}

#[test]
fn test_flags_text() {
    let access = build("Zoo.Access").unwrap();
    let enumeration = access.as_enum().unwrap();
    assert!(enumeration.is_flags);
    assert_eq!(enumeration.format_value(0).as_deref(), Some("None"));
    assert_eq!(enumeration.format_value(5).as_deref(), Some("Feed Vet"));
    assert_eq!(enumeration.format_value(16), None);
    assert_eq!(enumeration.parse_value("Clean Feed"), Some(3));
    assert_eq!(enumeration.parse_value("Clean Bogus"), None);
}

#[test]
fn test_ulong_enum() {
    let huge = build("Zoo.Huge").unwrap();
    let enumeration = huge.as_enum().unwrap();
    assert!(enumeration.is_ulong);
    assert_eq!(enumeration.underlying, IntegerType::UInt64);
    // Stored as the two's complement bit pattern.
    assert_eq!(enumeration.values, vec![1, -1]);
    assert_eq!(enumeration.format_value(-1).as_deref(), Some("Max"));
    assert_eq!(enumeration.base_name, XmlName::schema("unsignedLong"));
}

#[test]
fn test_enum_errors() {
    assert!(matches!(build("Zoo.Empty"), Err(ContractError::InvalidEnumMemberValue { .. })));
    assert!(matches!(build("Zoo.Mixed"), Err(ContractError::DataMemberOnEnumField { .. })));
    assert!(matches!(build("Zoo.Shared"), Err(ContractError::EnumCannotHaveIsReference { .. })));
    assert!(matches!(build("Zoo.Twin"), Err(ContractError::DuplicateEnumMemberValue { .. })));
}

#[test]
fn test_enum_error_codes() {
    let error = build("Zoo.Twin").unwrap_err();
    assert_eq!(error.code(), "DCS012");
    assert!(error.to_string().contains("Zoo.Twin"));
}
