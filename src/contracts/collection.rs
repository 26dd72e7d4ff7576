//! Collection and dictionary contracts
//!
//! [`analyze`] decides whether a type has a collection shape without building
//! anything. It is shared by the naming resolver (which only needs the item
//! type) and by [`build`], which turns an accepted shape into a contract.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::analysis::session::ResolutionSession;
use crate::contracts::{class, Contract, ContractId, ReadOnlyState, Shape};
use crate::core::capabilities::{
    display_name, effective_base, find_explicit_implementation, find_public_method, implements, is_special,
    is_value_type, special_of, unwrap_nullable,
};
use crate::core::types::{SpecialType, TypeKind, TypeQuery, TypeRef};
use crate::core::xml::{encode_local_name, KEY_LOCAL_NAME, VALUE_LOCAL_NAME};
use crate::errors::{CollectionDefect, ContractError};

/// Collection family, ordered from most to least specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CollectionKind {
    GenericDictionary = 1,
    Dictionary,
    GenericList,
    GenericCollection,
    List,
    GenericEnumerable,
    Collection,
    Enumerable,
    Array,
}

impl CollectionKind {
    const KNOWN_INTERFACES: [(SpecialType, CollectionKind); 8] = [
        (SpecialType::IDictionaryGeneric, Self::GenericDictionary),
        (SpecialType::IDictionary, Self::Dictionary),
        (SpecialType::IListGeneric, Self::GenericList),
        (SpecialType::ICollectionGeneric, Self::GenericCollection),
        (SpecialType::IList, Self::List),
        (SpecialType::IEnumerableGeneric, Self::GenericEnumerable),
        (SpecialType::ICollection, Self::Collection),
        (SpecialType::IEnumerable, Self::Enumerable),
    ];

    pub fn from_interface(special: SpecialType) -> Option<Self> {
        Self::KNOWN_INTERFACES
            .iter()
            .find(|(s, _)| *s == special)
            .map(|(_, kind)| *kind)
    }

    /// Interface defining this family; `None` for arrays.
    pub fn interface(self) -> Option<SpecialType> {
        Self::KNOWN_INTERFACES
            .iter()
            .find(|(_, kind)| *kind == self)
            .map(|(s, _)| *s)
    }

    pub fn is_dictionary(self) -> bool {
        matches!(self, Self::GenericDictionary | Self::Dictionary)
    }

    pub fn is_generic(self) -> bool {
        matches!(
            self,
            Self::GenericDictionary | Self::GenericList | Self::GenericCollection | Self::GenericEnumerable
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::GenericDictionary => "generic_dictionary",
            Self::Dictionary => "dictionary",
            Self::GenericList => "generic_list",
            Self::GenericCollection => "generic_collection",
            Self::List => "list",
            Self::GenericEnumerable => "generic_enumerable",
            Self::Collection => "collection",
            Self::Enumerable => "enumerable",
            Self::Array => "array",
        }
    }
}

/// Collection family of a well-known collection interface.
pub fn known_interface_kind(query: &dyn TypeQuery, ty: TypeRef) -> Option<CollectionKind> {
    if query.kind(ty) != TypeKind::Interface {
        return None;
    }
    CollectionKind::from_interface(special_of(query, ty)?)
}

/// A method the emitted code calls on the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodRef {
    pub declaring_type: TypeRef,
    pub name: String,
    /// Interface the call has to go through, for explicit implementations.
    pub via_interface: Option<TypeRef>,
}

impl MethodRef {
    fn on_interface(interface: TypeRef, name: &str) -> Self {
        Self { declaring_type: interface, name: name.to_string(), via_interface: Some(interface) }
    }
}

#[derive(Debug, Clone)]
pub struct CollectionContract {
    pub kind: CollectionKind,
    /// `None` only on invalid placeholders.
    pub item_type: Option<TypeRef>,
    pub item_name: String,
    pub key_name: Option<String>,
    pub value_name: Option<String>,
    pub add_method: Option<MethodRef>,
    pub get_enumerator: Option<MethodRef>,
    pub has_default_constructor: bool,
    pub is_interface: bool,
    /// Built for a get-only member, populated into an existing instance.
    pub populate_in_place: bool,
    /// Class view of the same type when it also qualifies as a class.
    pub shared_type_contract: Option<Arc<Contract>>,
    item_contract: OnceCell<Arc<Contract>>,
}

impl CollectionContract {
    /// Resolved item contract, once the session has resolved it.
    pub fn item_contract(&self) -> Option<&Arc<Contract>> {
        self.item_contract.get()
    }

    pub(crate) fn item_cell(&self) -> &OnceCell<Arc<Contract>> {
        &self.item_contract
    }
}

/// Accepted collection shape, before naming.
#[derive(Debug, Clone)]
pub struct CollectionShape {
    pub kind: CollectionKind,
    pub item_type: TypeRef,
    pub add_method: Option<MethodRef>,
    pub get_enumerator: Option<MethodRef>,
    pub has_default_constructor: bool,
    pub is_interface: bool,
    pub constructor_required: bool,
    pub read_only: ReadOnlyState,
}

#[derive(Debug, Clone)]
pub enum CollectionAnalysis {
    NotCollection,
    /// Looks like a collection but cannot be one. Hard failures are errors;
    /// soft ones still get a contract that refuses to serialize.
    Invalid { defect: CollectionDefect, hard: bool, item_type: Option<TypeRef> },
    Shape(CollectionShape),
}

/// Item type of `ty` if it is treated as a collection, valid or not.
pub fn is_collection(session: &ResolutionSession, ty: TypeRef, constructor_required: bool) -> Option<TypeRef> {
    match analyze(session, ty, constructor_required) {
        CollectionAnalysis::Shape(shape) => Some(shape.item_type),
        CollectionAnalysis::Invalid { item_type, .. } => {
            item_type.or_else(|| session.query().well_known(SpecialType::Object))
        }
        CollectionAnalysis::NotCollection => None,
    }
}

struct Verdict {
    has_collection_attribute: bool,
    create_with_error: bool,
}

impl Verdict {
    fn invalid(&self, defect: CollectionDefect, create_with_error: bool, item_type: Option<TypeRef>) -> CollectionAnalysis {
        if self.has_collection_attribute {
            CollectionAnalysis::Invalid { defect, hard: true, item_type }
        } else if create_with_error {
            CollectionAnalysis::Invalid { defect, hard: false, item_type }
        } else {
            CollectionAnalysis::NotCollection
        }
    }
}

/// Decide the collection shape of `ty`.
pub fn analyze(session: &ResolutionSession, ty: TypeRef, constructor_required: bool) -> CollectionAnalysis {
    let query = session.query();

    match query.kind(ty) {
        TypeKind::Array { .. } => {
            let Some(item_type) = query.element_type(ty) else {
                return CollectionAnalysis::NotCollection;
            };
            return CollectionAnalysis::Shape(CollectionShape {
                kind: CollectionKind::Array,
                item_type,
                add_method: None,
                get_enumerator: None,
                has_default_constructor: true,
                is_interface: false,
                constructor_required,
                read_only: ReadOnlyState::Complete,
            });
        }
        TypeKind::Enum | TypeKind::GenericParameter { .. } | TypeKind::Pointer => {
            return CollectionAnalysis::NotCollection
        }
        _ => {}
    }

    let attributes = query.attributes(ty);
    let is_serializable = attributes.serializable;
    let base_is_collection = effective_base(query, ty)
        .map(|base| is_collection(session, base, true).is_some())
        .unwrap_or(false);
    let verdict = Verdict {
        has_collection_attribute: attributes.collection_data_contract.is_some(),
        create_with_error: base_is_collection && !is_serializable,
    };

    if session.builtin(ty).is_some() {
        return verdict.invalid(CollectionDefect::BuiltIn, false, None);
    }
    if attributes.data_contract.is_some() {
        return verdict.invalid(CollectionDefect::HasDataContract, verdict.create_with_error, None);
    }
    if implements(query, ty, SpecialType::IXmlSerializable) || is_special(query, ty, SpecialType::ArraySegment) {
        return CollectionAnalysis::NotCollection;
    }
    if !implements(query, ty, SpecialType::IEnumerable) {
        return verdict.invalid(CollectionDefect::NotEnumerable, verdict.create_with_error, None);
    }

    if let Some(kind) = known_interface_kind(query, ty) {
        return analyze_interface(query, ty, kind, constructor_required);
    }

    let mut read_only = ReadOnlyState::Complete;
    let mut create_with_error = verdict.create_with_error;
    let has_default_constructor = is_value_type(query, ty) || query.has_public_default_constructor(ty);
    if !has_default_constructor && constructor_required {
        if is_serializable {
            return verdict.invalid(CollectionDefect::NoDefaultConstructor, create_with_error, None);
        }
        create_with_error = true;
        read_only = cannot_deserialize(session, ty, CollectionDefect::NoDefaultConstructor);
    }

    // Most specific known interface wins; equal ones are ambiguous.
    let mut chosen: Option<(CollectionKind, TypeRef)> = None;
    let mut multiple_definitions = false;
    for interface in query.interfaces(ty) {
        let Some(kind) = known_interface_kind(query, interface) else {
            continue;
        };
        match chosen {
            Some((current, _)) if kind > current => {}
            Some((current, _)) if kind == current => multiple_definitions = true,
            _ => {
                chosen = Some((kind, interface));
                multiple_definitions = false;
            }
        }
    }
    let Some((kind, interface)) = chosen else {
        return verdict.invalid(CollectionDefect::NotEnumerable, create_with_error, None);
    };

    let object = query.well_known(SpecialType::Object);
    let arguments = query.generic_arguments(interface);

    if matches!(kind, CollectionKind::Enumerable | CollectionKind::Collection | CollectionKind::GenericEnumerable) {
        let interface = if multiple_definitions {
            match query.well_known(SpecialType::IEnumerable) {
                Some(enumerable) => enumerable,
                None => return CollectionAnalysis::NotCollection,
            }
        } else {
            interface
        };
        let item_type = match query.generic_arguments(interface).first() {
            Some(&item) => item,
            None => match object {
                Some(object) => object,
                None => return CollectionAnalysis::NotCollection,
            },
        };

        let (get_enumerator, add_method) = collection_methods(query, ty, interface, &[item_type], false);
        if add_method.is_none() {
            let defect = CollectionDefect::NoAddMethod { item_type: display_name(query, item_type) };
            if is_serializable {
                return verdict.invalid(defect, create_with_error, Some(item_type));
            }
            if read_only.is_complete() {
                read_only = cannot_deserialize(session, ty, defect);
            }
        }
        let Some(get_enumerator) = get_enumerator else {
            return CollectionAnalysis::Invalid { defect: CollectionDefect::NoGetEnumerator, hard: true, item_type: Some(item_type) };
        };
        return CollectionAnalysis::Shape(CollectionShape {
            kind,
            item_type,
            add_method,
            get_enumerator: Some(get_enumerator),
            has_default_constructor,
            is_interface: false,
            constructor_required,
            read_only,
        });
    }

    if multiple_definitions {
        let interface_name = display_name(query, query.generic_definition(interface).unwrap_or(interface));
        return verdict.invalid(
            CollectionDefect::MultipleDefinitions { interface: interface_name },
            false,
            None,
        );
    }

    let (item_type, add_parameters) = match kind {
        CollectionKind::GenericDictionary => match key_value_type(query, &arguments) {
            Some(item) => (item, arguments.clone()),
            None => return CollectionAnalysis::NotCollection,
        },
        CollectionKind::Dictionary => match object {
            Some(object) => match key_value_type(query, &[object, object]) {
                Some(item) => (item, vec![object, object]),
                None => return CollectionAnalysis::NotCollection,
            },
            None => return CollectionAnalysis::NotCollection,
        },
        CollectionKind::GenericList | CollectionKind::GenericCollection => match arguments.first() {
            Some(&item) => (item, vec![item]),
            None => return CollectionAnalysis::NotCollection,
        },
        _ => match object {
            Some(object) => (object, vec![object]),
            None => return CollectionAnalysis::NotCollection,
        },
    };

    let (get_enumerator, add_method) = collection_methods(query, ty, interface, &add_parameters, true);
    let Some(get_enumerator) = get_enumerator else {
        return CollectionAnalysis::Invalid { defect: CollectionDefect::NoGetEnumerator, hard: true, item_type: Some(item_type) };
    };
    if add_method.is_none() {
        let defect = CollectionDefect::NoAddMethod { item_type: display_name(query, item_type) };
        if is_serializable {
            return verdict.invalid(defect, create_with_error, Some(item_type));
        }
        if read_only.is_complete() {
            read_only = cannot_deserialize(session, ty, defect);
        }
    }

    CollectionAnalysis::Shape(CollectionShape {
        kind,
        item_type,
        add_method,
        get_enumerator: Some(get_enumerator),
        has_default_constructor,
        is_interface: false,
        constructor_required,
        read_only,
    })
}

/// A well-known collection interface used directly as a type.
fn analyze_interface(
    query: &dyn TypeQuery,
    ty: TypeRef,
    kind: CollectionKind,
    constructor_required: bool,
) -> CollectionAnalysis {
    let arguments = query.generic_arguments(ty);
    let object = query.well_known(SpecialType::Object);

    let item_type = match kind {
        CollectionKind::GenericDictionary => key_value_type(query, &arguments),
        CollectionKind::Dictionary => object.and_then(|o| key_value_type(query, &[o, o])),
        _ if kind.is_generic() => arguments.first().copied(),
        _ => object,
    };
    let Some(item_type) = item_type else {
        return CollectionAnalysis::NotCollection;
    };

    let add_method = match kind {
        CollectionKind::GenericDictionary | CollectionKind::Dictionary => {
            interface_method(query, ty, "Add").map(|_| MethodRef::on_interface(ty, "Add"))
        }
        CollectionKind::GenericList | CollectionKind::GenericCollection => query
            .well_known(SpecialType::ICollectionGeneric)
            .and_then(|definition| query.make_generic(definition, &[item_type]))
            .map(|collection| MethodRef::on_interface(collection, "Add")),
        CollectionKind::List => Some(MethodRef::on_interface(ty, "Add")),
        _ => None,
    };

    let enumerable = if kind.is_generic() {
        if kind == CollectionKind::GenericEnumerable {
            Some(ty)
        } else {
            generic_enumerable_of(query, ty)
        }
    } else {
        None
    };
    let get_enumerator = enumerable
        .or_else(|| query.well_known(SpecialType::IEnumerable))
        .map(|enumerable| MethodRef::on_interface(enumerable, "GetEnumerator"));

    CollectionAnalysis::Shape(CollectionShape {
        kind,
        item_type,
        add_method,
        get_enumerator,
        has_default_constructor: false,
        is_interface: true,
        constructor_required,
        read_only: ReadOnlyState::Complete,
    })
}

fn cannot_deserialize(session: &ResolutionSession, ty: TypeRef, defect: CollectionDefect) -> ReadOnlyState {
    let error = ContractError::InvalidCollection { type_name: session.type_name(ty), defect };
    ReadOnlyState::CannotDeserialize(error.to_string())
}

fn key_value_type(query: &dyn TypeQuery, arguments: &[TypeRef]) -> Option<TypeRef> {
    if arguments.len() != 2 {
        return None;
    }
    let definition = query.well_known(SpecialType::KeyValue)?;
    query.make_generic(definition, arguments)
}

fn generic_enumerable_of(query: &dyn TypeQuery, interface: TypeRef) -> Option<TypeRef> {
    query
        .interfaces(interface)
        .into_iter()
        .find(|&parent| is_special(query, parent, SpecialType::IEnumerableGeneric))
}

fn interface_method(query: &dyn TypeQuery, interface: TypeRef, name: &str) -> Option<crate::core::types::MethodInfo> {
    query.methods(interface).into_iter().find(|m| m.name == name)
}

/// The type's implementation of `interface.name`, the interface slot itself if
/// the host declares no implementation.
fn implementation_of(query: &dyn TypeQuery, ty: TypeRef, interface: TypeRef, name: &str) -> Option<MethodRef> {
    let declared = interface_method(query, interface, name)?;
    if let Some((owner, method)) = find_explicit_implementation(query, ty, interface, name) {
        return Some(MethodRef { declaring_type: owner, name: method.name, via_interface: Some(interface) });
    }
    if let Some((owner, method)) = find_public_method(query, ty, name, &declared.parameters) {
        return Some(MethodRef { declaring_type: owner, name: method.name, via_interface: None });
    }
    Some(MethodRef::on_interface(interface, name))
}

/// Resolve (GetEnumerator, Add) for a concrete collection.
fn collection_methods(
    query: &dyn TypeQuery,
    ty: TypeRef,
    interface: TypeRef,
    add_parameters: &[TypeRef],
    add_method_on_interface: bool,
) -> (Option<MethodRef>, Option<MethodRef>) {
    let own_add = find_public_method(query, ty, "Add", add_parameters)
        .map(|(owner, method)| MethodRef { declaring_type: owner, name: method.name, via_interface: None });

    let mut get_enumerator = None;
    let mut add_method = own_add;
    if add_method_on_interface && add_method.is_none() {
        add_method = implementation_of(query, ty, interface, "Add");
        get_enumerator = implementation_of(query, ty, interface, "GetEnumerator");

        if add_method.is_none() {
            let mut parents: Vec<TypeRef> = query
                .interfaces(interface)
                .into_iter()
                .filter(|&parent| known_interface_kind(query, parent).is_some())
                .collect();
            parents.sort_by_cached_key(|&parent| display_name(query, parent));
            for parent in parents {
                add_method = implementation_of(query, ty, parent, "Add");
                if get_enumerator.is_none() {
                    get_enumerator = implementation_of(query, ty, parent, "GetEnumerator");
                }
                if add_method.is_some() {
                    break;
                }
            }
        }
    }

    if get_enumerator.is_none() {
        let public = find_public_method(query, ty, "GetEnumerator", &[]).filter(|(_, method)| {
            method
                .return_type
                .map(|ret| implements(query, ret, SpecialType::IEnumerator))
                .unwrap_or(false)
        });
        get_enumerator = match public {
            Some((owner, method)) => Some(MethodRef { declaring_type: owner, name: method.name, via_interface: None }),
            None => {
                let enumerable = if is_special(query, interface, SpecialType::IEnumerableGeneric) {
                    Some(interface)
                } else {
                    generic_enumerable_of(query, interface)
                };
                enumerable
                    .or_else(|| query.well_known(SpecialType::IEnumerable))
                    .and_then(|enumerable| implementation_of(query, ty, enumerable, "GetEnumerator"))
            }
        };
    }

    (get_enumerator, add_method)
}

/// Build the contract of an accepted collection shape.
pub fn build(
    session: &ResolutionSession,
    id: ContractId,
    ty: TypeRef,
    shape: CollectionShape,
) -> Result<Contract, ContractError> {
    let query = session.query();
    let type_name = session.type_name(ty);

    if let TypeKind::Array { rank } = query.kind(ty) {
        if rank > 1 {
            return Err(ContractError::MultidimensionalArray { type_name });
        }
    }

    let naming = session.naming();
    let attribute = query.attributes(ty).collection_data_contract.unwrap_or_default();
    let xml_name = naming.xml_name(ty)?;

    let item_name = match &attribute.item_name {
        Some(explicit) if explicit.is_empty() => {
            return Err(ContractError::InvalidContractName { type_name, property: "ItemName" })
        }
        Some(explicit) => encode_local_name(&naming.expand_if_generic(ty, explicit)?),
        None => naming.xml_name(unwrap_nullable(query, shape.item_type))?.name,
    };

    let (key_name, value_name) = if shape.kind.is_dictionary() {
        let key = explicit_or_default(&type_name, attribute.key_name.as_deref(), "KeyName", KEY_LOCAL_NAME)?;
        let value = explicit_or_default(&type_name, attribute.value_name.as_deref(), "ValueName", VALUE_LOCAL_NAME)?;
        if key == value {
            return Err(ContractError::DuplicateKeyValueName { type_name, name: key });
        }
        (Some(key), Some(value))
    } else {
        if attribute.key_name.is_some() {
            return Err(ContractError::KeyValueNameOnNonDictionary { type_name, property: "KeyName" });
        }
        if attribute.value_name.is_some() {
            return Err(ContractError::KeyValueNameOnNonDictionary { type_name, property: "ValueName" });
        }
        (None, None)
    };

    let value_type = is_value_type(query, ty);
    if value_type && attribute.is_reference {
        return Err(ContractError::ValueTypeCannotHaveIsReference { type_name });
    }

    let attributes = query.attributes(ty);
    let shared_type_contract = if !shape.is_interface && (attributes.serializable || attributes.data_contract.is_some()) {
        Some(Arc::new(class::build(session, id, ty)?))
    } else {
        None
    };

    if let Some(message) = shape.read_only.message() {
        warn!(%type_name, reason = message, "collection contract is read-only");
    }
    debug!(%type_name, kind = shape.kind.label(), item = %item_name, "collection contract built");

    let contract = CollectionContract {
        kind: shape.kind,
        item_type: Some(shape.item_type),
        item_name,
        key_name,
        value_name,
        add_method: shape.add_method,
        get_enumerator: shape.get_enumerator,
        has_default_constructor: shape.has_default_constructor,
        is_interface: shape.is_interface,
        populate_in_place: !shape.constructor_required,
        shared_type_contract,
        item_contract: OnceCell::new(),
    };
    Ok(Contract::new(id, ty, type_name, xml_name, Shape::Collection(contract))
        .with_reference(attribute.is_reference)
        .with_value_type(value_type)
        .with_read_only(shape.read_only))
}

fn explicit_or_default(
    type_name: &str,
    explicit: Option<&str>,
    property: &'static str,
    default: &str,
) -> Result<String, ContractError> {
    match explicit {
        Some("") => Err(ContractError::InvalidContractName { type_name: type_name.to_string(), property }),
        Some(name) => Ok(encode_local_name(name)),
        None => Ok(default.to_string()),
    }
}

/// Contract for a type that looks like a collection but cannot be one.
pub fn build_invalid(
    session: &ResolutionSession,
    id: ContractId,
    ty: TypeRef,
    defect: CollectionDefect,
    item_type: Option<TypeRef>,
) -> Result<Contract, ContractError> {
    let type_name = session.type_name(ty);
    let xml_name = session.naming().default_stable_name(ty)?;
    let message = ContractError::InvalidCollection { type_name: type_name.clone(), defect }.to_string();
    warn!(%type_name, reason = %message, "invalid collection contract");

    let contract = CollectionContract {
        kind: CollectionKind::Enumerable,
        item_type,
        item_name: String::new(),
        key_name: None,
        value_name: None,
        add_method: None,
        get_enumerator: None,
        has_default_constructor: false,
        is_interface: false,
        populate_in_place: false,
        shared_type_contract: None,
        item_contract: OnceCell::new(),
    };
    Ok(Contract::new(id, ty, type_name, xml_name, Shape::Collection(contract))
        .with_value_type(is_value_type(session.query(), ty))
        .with_read_only(ReadOnlyState::CannotSerialize(message)))
}

/// Concrete types registered alongside an interface-typed collection.
pub fn common_implementations(query: &dyn TypeQuery, contract: &Contract) -> Vec<TypeRef> {
    let Some(collection) = contract.as_collection() else {
        return Vec::new();
    };
    if !collection.is_interface {
        return Vec::new();
    }
    let arguments = query.generic_arguments(contract.underlying_type);
    let generic = |special, args: &[TypeRef]| query.well_known(special).and_then(|d| query.make_generic(d, args));
    let object = query.well_known(SpecialType::Object);

    let found = match collection.kind {
        CollectionKind::GenericList | CollectionKind::GenericCollection | CollectionKind::GenericEnumerable => {
            match arguments.first() {
                Some(&item) => vec![generic(SpecialType::ListGeneric, &[item]), query.make_array(item)],
                None => Vec::new(),
            }
        }
        CollectionKind::GenericDictionary => vec![generic(SpecialType::DictionaryGeneric, &arguments)],
        CollectionKind::List | CollectionKind::Collection | CollectionKind::Enumerable => vec![
            query.well_known(SpecialType::ArrayList),
            object.and_then(|o| query.make_array(o)),
        ],
        CollectionKind::Dictionary => vec![query.well_known(SpecialType::Hashtable)],
        CollectionKind::Array => Vec::new(),
    };
    found.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        assert!(CollectionKind::GenericDictionary < CollectionKind::Dictionary);
        assert!(CollectionKind::GenericList < CollectionKind::GenericCollection);
        assert!(CollectionKind::GenericEnumerable < CollectionKind::Enumerable);
        assert_eq!(CollectionKind::GenericDictionary as u8, 1);
    }

    #[test]
    fn test_interface_mapping() {
        for (special, kind) in CollectionKind::KNOWN_INTERFACES {
            assert_eq!(CollectionKind::from_interface(special), Some(kind));
            assert_eq!(kind.interface(), Some(special));
        }
        assert_eq!(CollectionKind::Array.interface(), None);
        assert_eq!(CollectionKind::from_interface(SpecialType::IEnumerator), None);
    }

    #[test]
    fn test_dictionary_kinds() {
        assert!(CollectionKind::GenericDictionary.is_dictionary());
        assert!(CollectionKind::Dictionary.is_dictionary());
        assert!(!CollectionKind::GenericList.is_dictionary());
        assert!(!CollectionKind::Array.is_generic());
    }
}
