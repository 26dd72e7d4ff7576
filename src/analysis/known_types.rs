//! Known subtype import
//!
//! Known types declared anywhere on a type's base chain are collected by
//! qualified contract name, then the known types of each known type, until
//! nothing new turns up.

use std::collections::HashSet;
use tracing::trace;

use crate::analysis::session::ResolutionSession;
use crate::contracts::KnownContracts;
use crate::core::capabilities::{effective_base, unwrap_nullable};
use crate::core::types::TypeRef;
use crate::errors::ContractError;

/// Known contracts reachable from `ty`.
pub fn import(session: &ResolutionSession, ty: TypeRef) -> Result<KnownContracts, ContractError> {
    let mut checked = HashSet::new();
    let mut known = KnownContracts::new();
    walk_base_chain(session, ty, ty, &mut checked, &mut known)?;
    Ok(known)
}

fn walk_base_chain(
    session: &ResolutionSession,
    owner: TypeRef,
    ty: TypeRef,
    checked: &mut HashSet<TypeRef>,
    known: &mut KnownContracts,
) -> Result<(), ContractError> {
    let query = session.query();
    let mut current = Some(ty);
    while let Some(t) = current {
        if !checked.insert(t) {
            return Ok(());
        }
        for declared in query.attributes(t).known_types {
            check_and_add(session, owner, declared, checked, known)?;
        }
        current = effective_base(query, t);
    }
    Ok(())
}

fn check_and_add(
    session: &ResolutionSession,
    owner: TypeRef,
    ty: TypeRef,
    checked: &mut HashSet<TypeRef>,
    known: &mut KnownContracts,
) -> Result<(), ContractError> {
    let ty = unwrap_nullable(session.query(), ty);
    let contract = session.contract_for(ty)?;

    if let Some(&existing) = known.get(&contract.xml_name) {
        if existing == contract.id {
            return Ok(());
        }
        let first = session
            .type_of(existing)
            .map(|t| session.type_name(t))
            .unwrap_or_else(|| existing.to_string());
        return Err(ContractError::DuplicateContractInKnownTypes {
            type_name: session.type_name(owner),
            name: contract.xml_name.to_string(),
            first,
            second: contract.type_name.clone(),
        });
    }

    trace!(known = %contract.type_name, name = %contract.xml_name, "known type registered");
    known.insert(contract.xml_name.clone(), contract.id);
    walk_base_chain(session, owner, ty, checked, known)
}
