//! Class (object) contracts
//!
//! Three import paths produce the member list of a class:
//! - attributed: members carrying a data member annotation,
//! - non-attributed: public fields and read/write properties of a plain type,
//! - legacy serializable: every instance field not marked non-serialized.
//!
//! Inheritance is modelled through the base contract id; the flattened member
//! list covers the whole hierarchy and carries the conflict marks.

use once_cell::sync::OnceCell;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::analysis::session::ResolutionSession;
use crate::contracts::collection::MethodRef;
use crate::contracts::member::{check_and_add, mark_conflicts, sort_members, DataMember, FlatMember, DEFAULT_ORDER};
use crate::contracts::{Contract, ContractId, ReadOnlyState, Shape};
use crate::core::capabilities::{
    accepts_null, effective_base, implements, is_special, is_value_type, is_visible, special_of,
};
use crate::core::types::{CallbackRole, MemberInfo, MemberKind, SpecialType, TypeKind, TypeQuery, TypeRef};
use crate::core::xml::encode_local_name;
use crate::errors::ContractError;

const EXTENSION_DATA_PROPERTY: &str = "ExtensionData";
const EXTENSION_DATA_SETTER: &str = "set_ExtensionData";
const EXTENSION_DATA_SETTER_EXPLICIT: &str = "System.Runtime.Serialization.IExtensibleDataObject.set_ExtensionData";

#[derive(Debug, Clone, Default)]
pub struct ClassContract {
    pub base: Option<ContractId>,
    /// Own members in wire order.
    pub members: Vec<DataMember>,
    /// Members of the whole hierarchy, root-most class first.
    pub flattened: Vec<FlatMember>,
    /// Contract namespace of every hierarchy level, root-most first.
    pub contract_namespaces: Vec<String>,
    pub has_data_contract: bool,
    pub is_non_attributed: bool,
    pub is_iserializable: bool,
    pub has_extension_data: bool,
    callbacks: OnceCell<CallbackMethods>,
}

impl ClassContract {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Callbacks, once scanned by the session.
    pub fn callbacks(&self) -> Option<&CallbackMethods> {
        self.callbacks.get()
    }

    pub(crate) fn callbacks_cell(&self) -> &OnceCell<CallbackMethods> {
        &self.callbacks
    }

    /// Copy with members renamed positionally and moved to `namespace`, with no base.
    pub fn with_member_names(&self, namespace: &str, names: &[String]) -> Self {
        let mut members = self.members.clone();
        for (member, name) in members.iter_mut().zip(names) {
            member.name = name.clone();
        }
        let mut flattened: Vec<FlatMember> = members
            .iter()
            .map(|m| FlatMember {
                name: m.name.clone(),
                namespace: namespace.to_string(),
                member_type: m.member_type,
                depth: 0,
                conflicting_member: None,
                has_conflicting_name_and_type: false,
            })
            .collect();
        mark_conflicts(&mut flattened);

        Self {
            base: None,
            members,
            flattened,
            contract_namespaces: vec![namespace.to_string()],
            has_data_contract: self.has_data_contract,
            is_non_attributed: self.is_non_attributed,
            is_iserializable: self.is_iserializable,
            has_extension_data: self.has_extension_data,
            callbacks: OnceCell::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionDataSetter {
    pub method: MethodRef,
    /// Set through the interface rather than a public method.
    pub explicit: bool,
}

/// Serialization hooks declared directly on one class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackMethods {
    slots: [Option<MethodRef>; 4],
    pub extension_data_setter: Option<ExtensionDataSetter>,
}

impl CallbackMethods {
    pub fn get(&self, role: CallbackRole) -> Option<&MethodRef> {
        self.slots[role.index()].as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none) && self.extension_data_setter.is_none()
    }
}

/// Whether a type without annotations may be serialized by its public shape.
pub fn is_non_attributed_type_valid(session: &ResolutionSession, ty: TypeRef) -> bool {
    let query = session.query();
    match query.kind(ty) {
        TypeKind::Array { .. } | TypeKind::GenericParameter { .. } | TypeKind::Pointer => return false,
        TypeKind::Enum => return true,
        _ => {}
    }
    if implements(query, ty, SpecialType::IXmlSerializable) {
        return false;
    }

    let attributes = query.attributes(ty);
    if !attributes.known_types.is_empty() {
        return false;
    }
    if !is_special(query, ty, SpecialType::ArraySegment)
        && query
            .interfaces(ty)
            .into_iter()
            .any(|iface| crate::contracts::collection::known_interface_kind(query, iface).is_some())
    {
        return false;
    }
    if attributes.serializable || attributes.data_contract.is_some() {
        return false;
    }
    if implements(query, ty, SpecialType::ISerializable) {
        return false;
    }

    if is_value_type(query, ty) {
        is_visible(query, ty)
    } else {
        is_visible(query, ty) && query.has_public_default_constructor(ty)
    }
}

/// Build the class contract of `ty`, or fail if it has no serializable shape.
pub fn build(session: &ResolutionSession, id: ContractId, ty: TypeRef) -> Result<Contract, ContractError> {
    let query = session.query();
    let type_name = session.type_name(ty);
    let attributes = query.attributes(ty);
    let has_data_contract = attributes.data_contract.is_some();
    let is_non_attributed =
        !has_data_contract && !attributes.serializable && is_non_attributed_type_valid(session, ty);

    if !has_data_contract && !attributes.serializable && !is_non_attributed {
        return Err(ContractError::TypeNotSerializable { type_name });
    }

    let is_iserializable = implements(query, ty, SpecialType::ISerializable);
    if is_iserializable && has_data_contract {
        return Err(ContractError::ISerializableWithDataContract { type_name });
    }

    let xml_name = session.naming().xml_name(ty)?;
    let value_type = is_value_type(query, ty);

    let base = match effective_base(query, ty) {
        Some(base_ty) => {
            let base = session.contract_for(base_ty)?;
            match base.as_collection().and_then(|c| c.shared_type_contract.clone()) {
                Some(shared) => Some(shared),
                None if base.as_class().is_some() => Some(base),
                None => None,
            }
        }
        None => None,
    };
    let base_class = base.as_ref().and_then(|b| b.as_class());

    if let (Some(base), Some(base_class)) = (&base, base_class) {
        if base_class.is_non_attributed && !is_non_attributed {
            return Err(ContractError::AttributedTypeInheritsNonAttributed {
                type_name,
                base_name: base.type_name.clone(),
            });
        }
    }

    let explicit_reference = attributes.data_contract.as_ref().and_then(|dc| dc.is_reference);
    let is_reference = match (&base, explicit_reference) {
        (Some(base), Some(value)) if base.is_reference != value => {
            return Err(ContractError::IsReferenceMismatch {
                type_name,
                base_name: base.type_name.clone(),
                value,
                base_value: base.is_reference,
            });
        }
        (_, Some(value)) => value,
        (Some(base), None) => base.is_reference,
        (None, None) => false,
    };
    if is_reference && value_type {
        return Err(ContractError::ValueTypeCannotHaveIsReference { type_name });
    }

    let has_extension_data = !is_iserializable
        && (has_data_contract || is_non_attributed)
        && implements(query, ty, SpecialType::IExtensibleDataObject);

    let mut importer = MemberImporter {
        session,
        type_name: &type_name,
        is_reference,
        has_extension_data,
        members: Vec::new(),
        seen: HashMap::new(),
        read_only: ReadOnlyState::Complete,
    };
    if is_iserializable {
        // Serialized through its own data, nothing to import.
    } else if has_data_contract {
        importer.import_attributed(query.members(ty))?;
    } else if is_non_attributed {
        importer.import_non_attributed(query.members(ty))?;
    } else {
        importer.import_legacy(query.members(ty))?;
    }
    let MemberImporter { mut members, mut read_only, .. } = importer;
    if members.len() > 1 {
        sort_members(&mut members);
    }

    if read_only.is_complete() {
        if let Some(base) = &base {
            read_only = base.read_only.clone();
        }
    }
    if let Some(message) = read_only.message() {
        warn!(%type_name, reason = message, "class contract is read-only");
    }

    let namespace = xml_name.namespace.clone();
    let mut flattened: Vec<FlatMember> = Vec::new();
    let mut contract_namespaces = Vec::new();
    if let Some(base_class) = base_class {
        flattened.extend(base_class.flattened.iter().map(|m| FlatMember { depth: m.depth + 1, ..m.clone() }));
        contract_namespaces.extend(base_class.contract_namespaces.iter().cloned());
    }
    flattened.extend(members.iter().map(|m| FlatMember {
        name: m.name.clone(),
        namespace: namespace.clone(),
        member_type: m.member_type,
        depth: 0,
        conflicting_member: None,
        has_conflicting_name_and_type: false,
    }));
    mark_conflicts(&mut flattened);
    contract_namespaces.push(namespace);

    debug!(%type_name, members = members.len(), inherited = flattened.len() - members.len(), "class contract built");

    let class = ClassContract {
        base: base.as_ref().map(|b| b.id),
        members,
        flattened,
        contract_namespaces,
        has_data_contract,
        is_non_attributed,
        is_iserializable,
        has_extension_data,
        callbacks: OnceCell::new(),
    };
    Ok(Contract::new(id, ty, type_name, xml_name, Shape::Class(class))
        .with_reference(is_reference)
        .with_value_type(value_type)
        .with_read_only(read_only))
}

struct MemberImporter<'a> {
    session: &'a ResolutionSession,
    type_name: &'a str,
    is_reference: bool,
    has_extension_data: bool,
    members: Vec<DataMember>,
    seen: HashMap<String, usize>,
    read_only: ReadOnlyState,
}

impl MemberImporter<'_> {
    fn add(&mut self, member: DataMember) -> Result<(), ContractError> {
        check_and_add(&mut self.members, &mut self.seen, member, self.type_name, false)
    }

    fn new_member(&self, info: &MemberInfo, name: String) -> DataMember {
        let mut member = DataMember::new(name, info.name.clone(), info.member_type, info.kind);
        member.is_nullable = accepts_null(self.session.query(), info.member_type);
        member.location = info.location.clone();
        member
    }

    /// Collection member populated in place when it has no usable setter.
    fn is_get_only_collection(&self, member_type: TypeRef) -> bool {
        !is_value_type(self.session.query(), member_type)
            && crate::contracts::collection::is_collection(self.session, member_type, false).is_some()
    }

    fn import_attributed(&mut self, declared: Vec<MemberInfo>) -> Result<(), ContractError> {
        for info in declared {
            let Some(attribute) = info.data_member.clone() else {
                continue;
            };
            if info.is_static {
                continue;
            }

            let mut get_only_collection = false;
            match info.kind {
                MemberKind::Property => {
                    if info.getter.map(|g| g.is_override).unwrap_or(false)
                        || info.setter.map(|s| s.is_override).unwrap_or(false)
                    {
                        continue;
                    }
                    if info.getter.is_none() {
                        return Err(ContractError::NoGetMethodForProperty {
                            type_name: self.type_name.to_string(),
                            member: info.name.clone(),
                        });
                    }
                    if info.setter.is_none() {
                        if self.is_get_only_collection(info.member_type) {
                            get_only_collection = true;
                        } else if self.read_only.is_complete() {
                            self.read_only = ReadOnlyState::CannotDeserialize(format!(
                                "no set method for property '{}' in type '{}'",
                                info.name, self.type_name
                            ));
                        }
                    }
                    if info.is_indexer {
                        return Err(ContractError::IndexedPropertyCannotBeSerialized {
                            type_name: self.type_name.to_string(),
                            member: info.name.clone(),
                        });
                    }
                }
                MemberKind::Field => {}
                MemberKind::Method | MemberKind::Event => {
                    return Err(ContractError::InvalidMember {
                        type_name: self.type_name.to_string(),
                        member: info.name.clone(),
                    });
                }
            }

            let name = match &attribute.name {
                Some(explicit) if explicit.is_empty() => {
                    return Err(ContractError::InvalidDataMemberName {
                        type_name: self.type_name.to_string(),
                        member: info.name.clone(),
                    });
                }
                Some(explicit) => explicit.clone(),
                None => info.name.clone(),
            };

            let mut member = self.new_member(&info, encode_local_name(&name));
            member.is_required = attribute.is_required;
            if attribute.is_required && self.is_reference {
                return Err(ContractError::RequiredMemberOnReferenceType {
                    type_name: self.type_name.to_string(),
                    member: info.name.clone(),
                });
            }
            member.emit_default_value = attribute.emit_default_value;
            member.order = attribute.order.unwrap_or(DEFAULT_ORDER);
            member.is_get_only_collection = get_only_collection;
            self.add(member)?;
        }
        Ok(())
    }

    fn import_non_attributed(&mut self, declared: Vec<MemberInfo>) -> Result<(), ContractError> {
        let query = self.session.query();
        for info in declared {
            if !info.is_public || info.is_static || info.ignore {
                continue;
            }

            let mut get_only_collection = false;
            match info.kind {
                MemberKind::Property => {
                    let Some(getter) = info.getter else {
                        continue;
                    };
                    if !getter.is_public || getter.is_override || info.is_indexer {
                        continue;
                    }
                    let settable = info.setter.map(|s| s.is_public && !s.is_override).unwrap_or(false);
                    if !settable {
                        if !self.is_get_only_collection(info.member_type) {
                            continue;
                        }
                        get_only_collection = true;
                    }
                    if self.has_extension_data
                        && info.name == EXTENSION_DATA_PROPERTY
                        && special_of(query, info.member_type) == Some(SpecialType::ExtensionDataObject)
                    {
                        continue;
                    }
                }
                MemberKind::Field => {}
                MemberKind::Method | MemberKind::Event => continue,
            }

            let mut member = self.new_member(&info, encode_local_name(&info.name));
            member.is_get_only_collection = get_only_collection;
            self.add(member)?;
        }
        Ok(())
    }

    fn import_legacy(&mut self, declared: Vec<MemberInfo>) -> Result<(), ContractError> {
        for info in declared {
            if info.kind != MemberKind::Field || info.is_static || info.non_serialized {
                continue;
            }
            let mut member = self.new_member(&info, encode_local_name(&info.name));
            if !info.optional_field {
                if self.is_reference {
                    return Err(ContractError::RequiredMemberOnReferenceType {
                        type_name: self.type_name.to_string(),
                        member: info.name.clone(),
                    });
                }
                member.is_required = true;
            }
            self.add(member)?;
        }
        Ok(())
    }
}

/// Find the serialization callbacks and extension data setter declared on `ty`.
pub fn scan_callbacks(
    session: &ResolutionSession,
    ty: TypeRef,
    has_extension_data: bool,
) -> Result<CallbackMethods, ContractError> {
    let query = session.query();
    let type_name = session.type_name(ty);
    let mut found = CallbackMethods::default();
    let mut owners: [Option<String>; 4] = Default::default();

    for method in query.methods(ty).into_iter().filter(|m| !m.is_static) {
        if has_extension_data {
            if let Some(explicit) = extension_setter_kind(query, &method) {
                let invalid = |reason| ContractError::InvalidExtensionDataSetter {
                    type_name: type_name.clone(),
                    method: method.name.clone(),
                    reason,
                };
                if found.extension_data_setter.is_some() {
                    return Err(invalid("it is declared more than once"));
                }
                if method.return_type.is_some() {
                    return Err(invalid("it must return void"));
                }
                let valid_parameter = method.parameters.len() == 1
                    && special_of(query, method.parameters[0]) == Some(SpecialType::ExtensionDataObject);
                if !valid_parameter {
                    return Err(invalid("it must take a single ExtensionDataObject parameter"));
                }
                let explicit = explicit || !method.is_public;
                found.extension_data_setter = Some(ExtensionDataSetter {
                    method: MethodRef {
                        declaring_type: ty,
                        name: method.name.clone(),
                        via_interface: if explicit { method.explicit_interface } else { None },
                    },
                    explicit,
                });
            }
        }

        let mut previous: Option<CallbackRole> = None;
        for &role in &method.callbacks {
            if let Some(first) = &owners[role.index()] {
                return Err(ContractError::DuplicateCallback {
                    type_name,
                    role: role.to_string(),
                    first: first.clone(),
                    second: method.name.clone(),
                });
            }
            if previous.is_some() {
                return Err(ContractError::DuplicateAttribute {
                    type_name,
                    method: method.name.clone(),
                    role: role.to_string(),
                });
            }
            if method.is_virtual {
                return Err(ContractError::CallbackMustNotBeVirtual { type_name, method: method.name.clone() });
            }
            if method.return_type.is_some() {
                return Err(ContractError::CallbackMustReturnVoid { type_name, method: method.name.clone() });
            }
            let valid_parameter = method.parameters.len() == 1
                && special_of(query, method.parameters[0]) == Some(SpecialType::StreamingContext);
            if !valid_parameter {
                return Err(ContractError::CallbackParameterInvalid { type_name, method: method.name.clone() });
            }
            previous = Some(role);
            owners[role.index()] = Some(method.name.clone());
            found.slots[role.index()] =
                Some(MethodRef { declaring_type: ty, name: method.name.clone(), via_interface: None });
        }
    }
    Ok(found)
}

/// `Some(explicit)` if `method` is the extension data setter.
fn extension_setter_kind(query: &dyn TypeQuery, method: &crate::core::types::MethodInfo) -> Option<bool> {
    if method.name == EXTENSION_DATA_SETTER_EXPLICIT {
        return Some(true);
    }
    if method.name != EXTENSION_DATA_SETTER {
        return None;
    }
    match method.explicit_interface {
        Some(iface) if is_special(query, iface, SpecialType::IExtensibleDataObject) => Some(true),
        Some(_) => None,
        None => Some(false),
    }
}
