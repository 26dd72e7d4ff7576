//! Contracts of self-describing XML types
//!
//! These types read and write their own XML; the contract only fixes the type
//! name and the root element.

use tracing::debug;

use crate::analysis::session::ResolutionSession;
use crate::contracts::{Contract, ContractId, ReadOnlyState, Shape};
use crate::core::capabilities::is_value_type;
use crate::core::types::TypeRef;
use crate::core::xml::{encode_local_name, XmlName};
use crate::errors::ContractError;
use crate::naming::check_namespace_uri;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlContract {
    pub root_element: XmlName,
    /// Declared as `xs:any`: written without a root element of its own.
    pub is_any: bool,
}

pub fn build(session: &ResolutionSession, id: ContractId, ty: TypeRef) -> Result<Contract, ContractError> {
    let query = session.query();
    let type_name = session.type_name(ty);
    let xml_name = session.naming().xml_name(ty)?;
    let root = query.attributes(ty).xml_root.unwrap_or_default();

    let element = match root.element_name.as_deref() {
        Some("") => return Err(ContractError::InvalidXmlContractName { type_name }),
        Some(explicit) => encode_local_name(explicit),
        None => xml_name.name.clone(),
    };
    let namespace = match root.namespace.as_deref() {
        Some(explicit) => check_namespace_uri(explicit, &type_name)?,
        None => xml_name.namespace.clone(),
    };

    let value_type = is_value_type(query, ty);
    let read_only = if value_type || query.has_public_default_constructor(ty) {
        ReadOnlyState::Complete
    } else {
        ReadOnlyState::CannotDeserialize(format!(
            "type '{}' reads its own XML and must have a public parameterless constructor",
            type_name
        ))
    };

    debug!(%type_name, root = %element, is_any = root.is_any, "xml contract built");
    let contract = XmlContract { root_element: XmlName::new(element, namespace), is_any: root.is_any };
    Ok(Contract::new(id, ty, type_name, xml_name, Shape::Xml(contract))
        .with_value_type(value_type)
        .with_root(!root.is_any)
        .with_read_only(read_only))
}
