use std::sync::Arc;
use xmlcontract::contracts::ReadOnlyState;
use xmlcontract::core::types::CallbackRole;
use xmlcontract::{Contract, ContractError, ResolutionSession, TypeModel};

const ZOO: &str = r#"{
    "assembly": "Zoo",
    "types": [
        { "name": "Zoo.Animal", "data_contract": {},
          "members": [ { "name": "Name", "type": "string", "data_member": {} } ] },
        { "name": "Zoo.Dog", "base": "Zoo.Animal", "data_contract": {},
          "members": [ { "name": "Breed", "type": "string", "data_member": {} } ] },
        { "name": "Zoo.Tag", "data_contract": {},
          "members": [ { "name": "Label", "type": "string", "data_member": {} } ] },
        { "name": "Zoo.NumberTag", "base": "Zoo.Tag", "data_contract": {},
          "members": [ { "name": "Label", "type": "int", "data_member": {} } ] },
        { "name": "Zoo.NameTag", "base": "Zoo.Tag", "data_contract": {},
          "members": [ { "name": "Label", "type": "string", "data_member": {} } ] },
        { "name": "Zoo.Ordered", "data_contract": {},
          "members": [
            { "name": "C", "type": "int", "data_member": {} },
            { "name": "A", "type": "int", "data_member": { "order": 2 } },
            { "name": "B", "type": "int", "data_member": {} },
            { "name": "D", "type": "int", "data_member": { "order": 1 } },
            { "name": "Hidden", "type": "int" }
          ] },
        { "name": "Zoo.Keeper",
          "members": [
            { "name": "Name", "type": "string" },
            { "name": "Secret", "type": "string", "public": false },
            { "name": "Badge", "type": "int", "setter": "none" },
            { "name": "Tags", "type": "System.Collections.Generic.List`1[string]", "setter": "none" },
            { "name": "Count", "type": "int", "static": true },
            { "name": "Skipped", "type": "int", "ignore": true }
          ] },
        { "name": "Zoo.Frozen", "data_contract": {},
          "members": [ { "name": "Id", "type": "int", "setter": "none", "data_member": {} } ] },
        { "name": "Zoo.Thawed", "base": "Zoo.Frozen", "data_contract": {},
          "members": [ { "name": "Label", "type": "string", "data_member": {} } ] },
        { "name": "Zoo.Pen", "data_contract": {},
          "members": [ { "name": "Animals", "type": "System.Collections.Generic.List`1[Zoo.Animal]",
                         "setter": "none", "data_member": {} } ] },
        { "name": "Zoo.Legacy", "serializable": true,
          "members": [
            { "name": "b", "kind": "field", "type": "int", "optional_field": true },
            { "name": "a", "kind": "field", "type": "int", "public": false },
            { "name": "cache", "kind": "field", "type": "int", "non_serialized": true },
            { "name": "Shown", "type": "int" }
          ] },
        { "name": "Zoo.NoCtor", "default_constructor": false },
        { "name": "Zoo.Plain" },
        { "name": "Zoo.Fancy", "base": "Zoo.Plain", "data_contract": {} },
        { "name": "Zoo.Node", "data_contract": { "is_reference": true } },
        { "name": "Zoo.Leaf", "base": "Zoo.Node", "data_contract": { "is_reference": false } },
        { "name": "Zoo.Branch", "base": "Zoo.Node", "data_contract": {} },
        { "name": "Zoo.Point", "kind": "struct", "data_contract": { "is_reference": true } },
        { "name": "Zoo.Graph", "data_contract": { "is_reference": true },
          "members": [ { "name": "Id", "type": "int", "data_member": { "is_required": true } } ] },
        { "name": "Zoo.Custom", "data_contract": {},
          "interfaces": ["System.Runtime.Serialization.ISerializable"] },
        { "name": "Zoo.Opaque", "serializable": true,
          "interfaces": ["System.Runtime.Serialization.ISerializable"],
          "members": [ { "name": "state", "kind": "field", "type": "int" } ] },
        { "name": "Zoo.Extensible", "data_contract": {},
          "interfaces": ["System.Runtime.Serialization.IExtensibleDataObject"],
          "members": [
            { "name": "ExtensionData", "type": "System.Runtime.Serialization.ExtensionDataObject" },
            { "name": "Id", "type": "int", "data_member": {} }
          ] },
        { "name": "Zoo.Twice", "data_contract": {},
          "members": [
            { "name": "First", "type": "int", "data_member": { "name": "Value" } },
            { "name": "Second", "type": "int", "data_member": { "name": "Value" } }
          ] },
        { "name": "Zoo.Indexed", "data_contract": {},
          "members": [ { "name": "Item", "type": "int", "indexer": true, "data_member": {} } ] },
        { "name": "Zoo.WriteOnly", "data_contract": {},
          "members": [ { "name": "Sink", "type": "int", "getter": "none", "data_member": {} } ] },
        { "name": "Zoo.Hooked", "data_contract": {},
          "methods": [
            { "name": "OnLoaded", "parameters": ["System.Runtime.Serialization.StreamingContext"],
              "callbacks": ["OnDeserialized"] }
          ] },
        { "name": "Zoo.BadHook", "data_contract": {},
          "methods": [
            { "name": "OnSaving", "parameters": ["System.Runtime.Serialization.StreamingContext"],
              "returns": "int", "callbacks": ["OnSerializing"] }
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

fn member_names(contract: &Contract) -> Vec<String> {
    contract.as_class().unwrap().members.iter().map(|m| m.name.clone()).collect()
}

#[test]
fn test_attributed_members() {
    let animal = build("Zoo.Animal").unwrap();
    assert_eq!(animal.name(), "Animal");
    assert_eq!(member_names(&animal), vec!["Name"]);
    let class = animal.as_class().unwrap();
    assert!(class.has_data_contract);
    assert!(!class.is_non_attributed);
    assert!(class.members[0].is_nullable);
    assert!(animal.read_only.is_complete());
}

#[test]
fn test_member_order() {
    let ordered = build("Zoo.Ordered").unwrap();
    // Default order sorts first, ties broken by name.
    assert_eq!(member_names(&ordered), vec!["B", "C", "D", "A"]);
    let orders: Vec<i32> = ordered.as_class().unwrap().members.iter().map(|m| m.order).collect();
    assert_eq!(orders, vec![-1, -1, 1, 2]);
}

#[test]
fn test_non_attributed_members() {
    let keeper = build("Zoo.Keeper").unwrap();
    let class = keeper.as_class().unwrap();
    assert!(class.is_non_attributed);
    assert_eq!(member_names(&keeper), vec!["Name", "Tags"]);
    assert!(class.members[1].is_get_only_collection);
    assert!(keeper.read_only.is_complete());
}

#[test]
fn test_inheritance_and_flattening() {
    let (model, session) = zoo();
    let animal = session.contract_for(model.lookup("Zoo.Animal").unwrap()).unwrap();
    let dog = session.contract_for(model.lookup("Zoo.Dog").unwrap()).unwrap();
    let class = dog.as_class().unwrap();

    assert_eq!(class.base, Some(animal.id));
    assert_eq!(member_names(&dog), vec!["Breed"]);
    let flat: Vec<(&str, usize)> = class.flattened.iter().map(|m| (m.name.as_str(), m.depth)).collect();
    assert_eq!(flat, vec![("Name", 1), ("Breed", 0)]);
}

#[test]
fn test_redeclared_member_with_other_type() {
    let numbered = build("Zoo.NumberTag").unwrap();
    let flat = &numbered.as_class().unwrap().flattened;
    assert_eq!(flat.len(), 2);
    assert_eq!((flat[0].name.as_str(), flat[0].depth), ("Label", 1));
    assert_eq!((flat[1].name.as_str(), flat[1].depth), ("Label", 0));
    assert!(flat.iter().all(|m| m.has_conflicting_name_and_type));
    assert_eq!(flat[1].conflicting_member, Some(0));
    assert_eq!(flat[0].conflicting_member, None);
}

#[test]
fn test_redeclared_member_with_same_type() {
    let named = build("Zoo.NameTag").unwrap();
    let flat = &named.as_class().unwrap().flattened;
    assert_eq!(flat.len(), 2);
    assert!(flat.iter().all(|m| !m.has_conflicting_name_and_type));
    assert_eq!(flat[1].conflicting_member, Some(0));
}

#[test]
fn test_get_only_property_is_read_only() {
    let frozen = build("Zoo.Frozen").unwrap();
    assert!(matches!(frozen.read_only, ReadOnlyState::CannotDeserialize(_)));

    // The state carries over to derived contracts.
    let thawed = build("Zoo.Thawed").unwrap();
    assert!(matches!(thawed.read_only, ReadOnlyState::CannotDeserialize(_)));
}

#[test]
fn test_get_only_collection_member() {
    let pen = build("Zoo.Pen").unwrap();
    let member = &pen.as_class().unwrap().members[0];
    assert!(member.is_get_only_collection);
    assert!(pen.read_only.is_complete());
}

#[test]
fn test_legacy_serializable_fields() {
    let legacy = build("Zoo.Legacy").unwrap();
    let class = legacy.as_class().unwrap();
    assert_eq!(member_names(&legacy), vec!["a", "b"]);
    assert!(class.members[0].is_required);
    assert!(!class.members[1].is_required);
}

#[test]
fn test_type_not_serializable() {
    assert!(matches!(build("Zoo.NoCtor"), Err(ContractError::TypeNotSerializable { .. })));
}

#[test]
fn test_attributed_inherits_non_attributed() {
    assert!(matches!(build("Zoo.Fancy"), Err(ContractError::AttributedTypeInheritsNonAttributed { .. })));
}

#[test]
fn test_is_reference_rules() {
    assert!(build("Zoo.Node").unwrap().is_reference);
    assert!(build("Zoo.Branch").unwrap().is_reference);
    assert!(matches!(build("Zoo.Leaf"), Err(ContractError::IsReferenceMismatch { .. })));
    assert!(matches!(build("Zoo.Point"), Err(ContractError::ValueTypeCannotHaveIsReference { .. })));
    assert!(matches!(build("Zoo.Graph"), Err(ContractError::RequiredMemberOnReferenceType { .. })));
}

#[test]
fn test_iserializable() {
    assert!(matches!(build("Zoo.Custom"), Err(ContractError::ISerializableWithDataContract { .. })));

    let opaque = build("Zoo.Opaque").unwrap();
    assert!(opaque.is_iserializable());
    assert!(opaque.as_class().unwrap().members.is_empty());
}

#[test]
fn test_extension_data() {
    let extensible = build("Zoo.Extensible").unwrap();
    let class = extensible.as_class().unwrap();
    assert!(class.has_extension_data);
    assert_eq!(member_names(&extensible), vec!["Id"]);
}

#[test]
fn test_member_errors() {
    assert!(matches!(build("Zoo.Twice"), Err(ContractError::DuplicateMemberName { .. })));
    assert!(matches!(build("Zoo.Indexed"), Err(ContractError::IndexedPropertyCannotBeSerialized { .. })));
    assert!(matches!(build("Zoo.WriteOnly"), Err(ContractError::NoGetMethodForProperty { .. })));
}

#[test]
fn test_callbacks() {
    let (model, session) = zoo();
    let hooked = session.contract_for(model.lookup("Zoo.Hooked").unwrap()).unwrap();
    let callbacks = session.callbacks(&hooked).unwrap().unwrap();
    assert_eq!(callbacks.get(CallbackRole::OnDeserialized).unwrap().name, "OnLoaded");
    assert!(callbacks.get(CallbackRole::OnSerializing).is_none());

    let bad = session.contract_for(model.lookup("Zoo.BadHook").unwrap()).unwrap();
    assert!(matches!(session.callbacks(&bad), Err(ContractError::CallbackMustReturnVoid { .. })));
}

#[test]
fn test_failed_build_is_remembered() {
    let (model, session) = zoo();
    let ty = model.lookup("Zoo.Twice").unwrap();
    let first = session.contract_for(ty).unwrap_err();
    let second = session.contract_for(ty).unwrap_err();
    assert_eq!(first.code(), second.code());
}

#[test]
fn test_same_contract_instance() {
    let (model, session) = zoo();
    let ty = model.lookup("Zoo.Dog").unwrap();
    let a = session.contract_for(ty).unwrap();
    let b = session.contract_for(ty).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}
