//! Canonical XML names for types
//!
//! [`NameResolver`] answers `xml_name(type) -> (local name, namespace)`:
//! explicit annotation overrides, generic name expansion with its namespace
//! digest, default namespaces and their module/assembly redirection, and the
//! `ArrayOf...` synthesis for collections with its recursion guard.

pub mod digest;
pub mod generic;

use std::collections::HashSet;

use tracing::trace;

use crate::analysis::session::ResolutionSession;
use crate::core::capabilities::{implements, nesting_chain, unwrap_redundant_nullable};
use crate::core::types::{ContractNamespaceMapping, MappingScope, SpecialType, TypeKind, TypeQuery, TypeRef};
use crate::core::xml::{
    encode_local_name, is_builtin_namespace, XmlName, ARRAY_PREFIX, COLLECTIONS_NAMESPACE,
    DATA_CONTRACT_BASE_NAMESPACE, SERIALIZATION_NAMESPACE,
};
use crate::errors::{ContractError, NamespaceDefect};
use generic::{expand_generic_parameters, split_generic_name, GenericNameProvider};

pub struct NameResolver<'s> {
    session: &'s ResolutionSession,
}

impl<'s> NameResolver<'s> {
    pub fn new(session: &'s ResolutionSession) -> Self {
        Self { session }
    }

    fn query(&self) -> &'s dyn TypeQuery {
        self.session.query()
    }

    /// Canonical name of `ty`.
    pub fn xml_name(&self, ty: TypeRef) -> Result<XmlName, ContractError> {
        self.stable_name(ty, &mut HashSet::new())
    }

    fn stable_name(&self, ty: TypeRef, previous: &mut HashSet<TypeRef>) -> Result<XmlName, ContractError> {
        let ty = unwrap_redundant_nullable(self.query(), ty);

        if let Some(name) = self.builtin_xml_or_array_name(ty, previous)? {
            return Ok(name);
        }
        if self.query().attributes(ty).data_contract.is_some() {
            return self.data_contract_name(ty);
        }
        self.non_data_contract_name(ty, previous)
    }

    fn builtin_xml_or_array_name(
        &self,
        ty: TypeRef,
        previous: &mut HashSet<TypeRef>,
    ) -> Result<Option<XmlName>, ContractError> {
        if let Some(primitive) = self.session.builtin(ty) {
            return Ok(Some(primitive.kind.xml_name()));
        }
        if implements(self.query(), ty, SpecialType::IXmlSerializable) {
            return self.default_stable_name(ty).map(Some);
        }
        if let TypeKind::Array { .. } = self.query().kind(ty) {
            if let Some(item) = self.query().element_type(ty) {
                self.validate_previous_collection_types(ty, item, previous)?;
                return self.collection_name(ty, item, previous).map(Some);
            }
        }
        Ok(None)
    }

    fn data_contract_name(&self, ty: TypeRef) -> Result<XmlName, ContractError> {
        let attr = self.query().attributes(ty).data_contract.unwrap_or_default();
        let name = match &attr.name {
            Some(explicit) => self.explicit_local_name(ty, explicit, "Name")?,
            None => self.default_local_name(ty)?,
        };
        let namespace = match &attr.namespace {
            Some(explicit) => check_namespace_uri(explicit, &self.session.type_name(ty))?,
            None => self.default_data_contract_namespace(ty)?,
        };
        Ok(XmlName::new(name, namespace))
    }

    fn non_data_contract_name(
        &self,
        ty: TypeRef,
        previous: &mut HashSet<TypeRef>,
    ) -> Result<XmlName, ContractError> {
        if let Some(item) = self.session.is_collection(ty) {
            self.validate_previous_collection_types(ty, item, previous)?;
            return self.collection_name(ty, item, previous);
        }

        let name = self.default_local_name(ty)?;
        let namespace = if crate::contracts::class::is_non_attributed_type_valid(self.session, ty) {
            self.default_data_contract_namespace(ty)?
        } else {
            self.default_stable_namespace(ty)
        };
        Ok(XmlName::new(name, namespace))
    }

    fn collection_name(
        &self,
        ty: TypeRef,
        item: TypeRef,
        previous: &mut HashSet<TypeRef>,
    ) -> Result<XmlName, ContractError> {
        if let Some(attr) = self.query().attributes(ty).collection_data_contract {
            let name = match &attr.name {
                Some(explicit) => self.explicit_local_name(ty, explicit, "Name")?,
                None => self.default_local_name(ty)?,
            };
            let namespace = match &attr.namespace {
                Some(explicit) => check_namespace_uri(explicit, &self.session.type_name(ty))?,
                None => self.default_data_contract_namespace(ty)?,
            };
            return Ok(XmlName::new(name, namespace));
        }

        let mut item = item;
        let prefix = format!("{}{}", ARRAY_PREFIX, self.array_prefix(&mut item));
        let element = self.stable_name(item, previous)?;
        let namespace = if is_builtin_namespace(&element.namespace) {
            COLLECTIONS_NAMESPACE.to_string()
        } else {
            element.namespace
        };
        Ok(XmlName::new(format!("{}{}", prefix, element.name), namespace))
    }

    /// Fail when the item type of `collection` re-enters a collection being named.
    fn validate_previous_collection_types(
        &self,
        collection: TypeRef,
        item: TypeRef,
        previous: &mut HashSet<TypeRef>,
    ) -> Result<(), ContractError> {
        let query = self.query();
        previous.insert(collection);

        let mut item = item;
        while let Some(element) = query.element_type(item) {
            item = element;
        }

        let mut closure = vec![item];
        let mut next = 0;
        while next < closure.len() {
            let current = closure[next];
            next += 1;
            if previous.contains(&current) {
                return Err(ContractError::RecursiveCollectionType {
                    type_name: self.session.type_name(current),
                });
            }
            for argument in query.generic_arguments(current) {
                if !closure.contains(&argument) {
                    closure.push(argument);
                }
            }
        }
        Ok(())
    }

    fn explicit_local_name(&self, ty: TypeRef, explicit: &str, property: &'static str) -> Result<String, ContractError> {
        if explicit.is_empty() {
            return Err(ContractError::InvalidContractName {
                type_name: self.session.type_name(ty),
                property,
            });
        }
        Ok(encode_local_name(&self.expand_if_generic(ty, explicit)?))
    }

    /// Expand `{i}` and `{#}` in an explicit name of a constructed generic type.
    pub fn expand_if_generic(&self, ty: TypeRef, format: &str) -> Result<String, ContractError> {
        if self.query().generic_definition(ty).is_none() {
            return Ok(format.to_string());
        }
        let provider = self.generic_provider(ty)?;
        expand_generic_parameters(format, &provider, &self.session.type_name(ty))
    }

    fn generic_provider(&self, ty: TypeRef) -> Result<GenericNameProvider, ContractError> {
        let (_, nested_counts) = split_generic_name(&self.nested_path(ty));
        let parameters = self
            .query()
            .generic_arguments(ty)
            .into_iter()
            .map(|argument| self.xml_name(argument))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(GenericNameProvider::new(parameters, nested_counts))
    }

    /// Containing-type path joined with dots, e.g. ``Outer`1.Inner``.
    fn nested_path(&self, ty: TypeRef) -> String {
        let query = self.query();
        let ty = query.generic_definition(ty).unwrap_or(ty);
        nesting_chain(query, ty)
            .into_iter()
            .map(|t| query.name(t))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn array_prefix(&self, item: &mut TypeRef) -> String {
        let mut prefix = String::new();
        while let TypeKind::Array { .. } = self.query().kind(*item) {
            if self.session.builtin(*item).is_some() {
                break;
            }
            let Some(element) = self.query().element_type(*item) else {
                break;
            };
            prefix.push_str(ARRAY_PREFIX);
            *item = element;
        }
        prefix
    }

    pub fn default_local_name(&self, ty: TypeRef) -> Result<String, ContractError> {
        let query = self.query();
        if let TypeKind::GenericParameter { position } = query.kind(ty) {
            return Ok(format!("{{{}}}", position));
        }

        let mut ty = ty;
        let prefix = if query.kind(ty).is_array() { self.array_prefix(&mut ty) } else { String::new() };
        let type_name = format!("{}{}", prefix, self.nested_path(ty));

        let arguments = query.generic_arguments(ty);
        if arguments.is_empty() {
            return Ok(encode_local_name(&type_name));
        }

        let (mut local, nested_counts) = split_generic_name(&type_name);
        if query.generic_definition(ty).is_none() {
            // Open definition: keep placeholders for later expansion.
            for i in 0..arguments.len() {
                local.push_str(&format!("{{{}}}", i));
            }
            local.push_str("{#}");
            return Ok(encode_local_name(&local));
        }

        let mut parameters = Vec::with_capacity(arguments.len());
        for argument in arguments {
            let name = self.xml_name(argument)?;
            local.push_str(&name.name);
            parameters.push(name);
        }
        let provider = GenericNameProvider::new(parameters, nested_counts);
        if provider.needs_digest() {
            local.push_str(&provider.digest());
        }
        Ok(encode_local_name(&local))
    }

    /// Default namespace honouring `[ContractNamespace]` redirection.
    pub fn default_data_contract_namespace(&self, ty: TypeRef) -> Result<String, ContractError> {
        let query = self.query();
        let clr_namespace = self.clr_namespace(ty);
        let mappings = query.contract_namespaces(ty);

        for scope in [MappingScope::Module, MappingScope::Assembly] {
            if let Some(mapped) = global_contract_namespace(&clr_namespace, &mappings, scope)? {
                trace!(clr_namespace = %clr_namespace, contract_namespace = %mapped, "namespace redirected");
                return check_namespace_uri(&mapped, &self.session.type_name(ty));
            }
        }
        Ok(self.default_stable_namespace(ty))
    }

    /// Base-URI-derived namespace with no redirection.
    pub fn default_stable_namespace(&self, ty: TypeRef) -> String {
        if let TypeKind::GenericParameter { .. } = self.query().kind(ty) {
            return "{ns}".to_string();
        }
        stable_namespace(&self.clr_namespace(ty))
    }

    pub fn default_stable_name(&self, ty: TypeRef) -> Result<XmlName, ContractError> {
        Ok(XmlName::new(self.default_local_name(ty)?, self.default_stable_namespace(ty)))
    }

    fn clr_namespace(&self, ty: TypeRef) -> String {
        let query = self.query();
        let mut ty = ty;
        while let Some(element) = query.element_type(ty) {
            ty = element;
        }
        let outermost = nesting_chain(query, ty)[0];
        query.namespace(outermost).unwrap_or_default()
    }
}

fn global_contract_namespace(
    clr_namespace: &str,
    mappings: &[ContractNamespaceMapping],
    scope: MappingScope,
) -> Result<Option<String>, ContractError> {
    let mut found: Option<&str> = None;
    for mapping in mappings.iter().filter(|m| m.scope == scope && m.clr_namespace == clr_namespace) {
        match found {
            Some(first) if first != mapping.contract_namespace => {
                return Err(ContractError::NamespaceAlreadySet {
                    clr_namespace: clr_namespace.to_string(),
                    first: first.to_string(),
                    second: mapping.contract_namespace.clone(),
                });
            }
            _ => found = Some(&mapping.contract_namespace),
        }
    }
    Ok(found.map(str::to_string))
}

/// Namespace derived from a source namespace under the fixed base URI.
pub fn stable_namespace(clr_namespace: &str) -> String {
    let mut namespace = String::from(DATA_CONTRACT_BASE_NAMESPACE);
    for byte in clr_namespace.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'_' | b'-' | b'~') {
            namespace.push(byte as char);
        } else {
            namespace.push_str(&format!("%{:02X}", byte));
        }
    }
    namespace
}

/// Validate an explicit contract namespace.
pub fn check_namespace_uri(namespace: &str, type_name: &str) -> Result<String, ContractError> {
    let invalid = |defect| ContractError::InvalidNamespace {
        type_name: type_name.to_string(),
        namespace: namespace.to_string(),
        defect,
    };

    if namespace.is_empty() {
        return Ok(String::new());
    }
    let trimmed = namespace.trim();
    if trimmed.is_empty() {
        return Err(invalid(NamespaceDefect::Whitespace));
    }
    if trimmed.contains("##") {
        return Err(invalid(NamespaceDefect::DoubleHash));
    }
    if !is_uri_reference(trimmed) {
        return Err(invalid(NamespaceDefect::InvalidUri));
    }
    if trimmed == SERIALIZATION_NAMESPACE {
        return Err(invalid(NamespaceDefect::Reserved));
    }
    Ok(namespace.to_string())
}

fn is_uri_reference(text: &str) -> bool {
    !text.chars().any(|c| {
        c.is_control() || c.is_whitespace() || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '\\' | '^' | '`')
    })
}
