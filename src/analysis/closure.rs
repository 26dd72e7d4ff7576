//! Dependency closure resolution
//!
//! Starting from the root types, every contract reachable through members,
//! base classes, collection items and known types is forced into existence.
//! Passes repeat until one visits nothing new. Construction failures become
//! diagnostics plus a placeholder contract so the rest of the batch completes.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::analysis::session::ResolutionSession;
use crate::contracts::collection::common_implementations;
use crate::contracts::primitive::PrimitiveKind;
use crate::contracts::{Contract, ContractId, ReadOnlyState, Shape};
use crate::core::types::{SpecialType, TypeRef};
use crate::core::xml::XmlName;
use crate::emit::unsupported_features;
use crate::errors::{codes, ContractError, Diagnostic, DiagnosticCollector, Severity, SourceLocation};

/// Finished contract set of one resolution.
#[derive(Debug, Default)]
pub struct Resolution {
    pub contracts: BTreeMap<ContractId, Arc<Contract>>,
    pub diagnostics: Vec<Diagnostic>,
    pub roots: Vec<ContractId>,
    pub passes: usize,
}

impl Resolution {
    pub fn contract(&self, id: ContractId) -> Option<&Arc<Contract>> {
        self.contracts.get(&id)
    }

    pub fn by_type_name(&self, type_name: &str) -> Option<&Arc<Contract>> {
        self.contracts.values().find(|c| c.type_name == type_name)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }
}

/// Where a reference to a type came from, for diagnostics.
struct Origin {
    symbol: String,
    location: SourceLocation,
}

pub struct ClosureResolver<'s> {
    session: &'s ResolutionSession,
    collector: DiagnosticCollector,
    contracts: BTreeMap<ContractId, Arc<Contract>>,
    visited: HashSet<ContractId>,
}

impl<'s> ClosureResolver<'s> {
    pub fn new(session: &'s ResolutionSession) -> Self {
        let options = session.options();
        let collector = DiagnosticCollector::with_max_errors(options.max_errors)
            .suppress(options.suppress.iter().cloned())
            .warnings_as_errors(options.warnings_as_errors);
        Self { session, collector, contracts: BTreeMap::new(), visited: HashSet::new() }
    }

    pub fn resolve(mut self, roots: &[TypeRef]) -> Result<Resolution, ContractError> {
        let query = self.session.query();

        let mut root_ids = Vec::with_capacity(roots.len());
        for &root in roots {
            let origin = self.origin_of(root);
            if let Some(contract) = self.register(root, &origin)? {
                root_ids.push(contract.id);
            }
        }

        if self.session.options().include_primitives {
            for kind in PrimitiveKind::ALL {
                let ty = match kind.special_type() {
                    Some(special) => query.well_known(special),
                    None => query.well_known(SpecialType::Byte).and_then(|b| query.make_array(b)),
                };
                if let Some(ty) = ty {
                    let origin = self.origin_of(ty);
                    self.register(ty, &origin)?;
                }
            }
        }

        let mut passes = 0;
        loop {
            let mut pending: Vec<Arc<Contract>> = self
                .contracts
                .values()
                .filter(|c| !self.visited.contains(&c.id))
                .cloned()
                .collect();
            if pending.is_empty() {
                break;
            }
            passes += 1;
            pending.sort_by(|a, b| a.type_name.cmp(&b.type_name));
            debug!(pass = passes, pending = pending.len(), "closure pass");

            for contract in pending {
                self.visited.insert(contract.id);
                self.visit(&contract)?;
            }
        }

        self.report_states();

        let diagnostics = self.collector.into_sorted();
        info!(
            contracts = self.contracts.len(),
            passes,
            diagnostics = diagnostics.len(),
            "closure resolved"
        );
        Ok(Resolution { contracts: self.contracts, diagnostics, roots: root_ids, passes })
    }

    fn origin_of(&self, ty: TypeRef) -> Origin {
        Origin { symbol: self.session.type_name(ty), location: self.session.query().location(ty) }
    }

    fn record(&mut self, error: &ContractError, origin: &Origin) {
        self.collector.add_error(error, origin.symbol.clone(), origin.location.clone());
    }

    /// Contract for `ty`, publishing a placeholder if construction fails.
    fn register(&mut self, ty: TypeRef, origin: &Origin) -> Result<Option<Arc<Contract>>, ContractError> {
        let id = match self.session.id_of(ty) {
            Ok(id) => id,
            Err(error) if error.is_fatal() => return Err(error),
            Err(error) => {
                self.record(&error, origin);
                return Ok(None);
            }
        };
        if let Some(existing) = self.contracts.get(&id) {
            return Ok(Some(existing.clone()));
        }

        let contract = match self.session.contract(id) {
            Ok(contract) => contract,
            Err(error) if error.is_fatal() => return Err(error),
            Err(error) => {
                self.record(&error, origin);
                let ty = self.session.type_of(id).unwrap_or(ty);
                let type_name = self.session.type_name(ty);
                let xml_name = self
                    .session
                    .naming()
                    .default_stable_name(ty)
                    .unwrap_or_else(|_| XmlName::new(type_name.clone(), ""));
                warn!(%type_name, code = error.code(), "publishing placeholder contract");
                Arc::new(Contract::placeholder(id, ty, type_name, xml_name, error))
            }
        };
        self.contracts.insert(id, contract.clone());
        Ok(Some(contract))
    }

    fn register_id(&mut self, id: ContractId, origin: &Origin) -> Result<(), ContractError> {
        if let Some(ty) = self.session.type_of(id) {
            self.register(ty, origin)?;
        }
        Ok(())
    }

    fn visit(&mut self, contract: &Arc<Contract>) -> Result<(), ContractError> {
        if contract.is_placeholder() {
            return Ok(());
        }
        let own = Origin {
            symbol: contract.type_name.clone(),
            location: self.session.query().location(contract.underlying_type),
        };

        if let Err(error) = self.session.callbacks(contract) {
            self.record(&error, &own);
        }

        match &contract.shape {
            Shape::Class(class) => {
                if let Some(base) = class.base {
                    self.register_id(base, &own)?;
                }
                for member in &class.members {
                    let origin = Origin {
                        symbol: format!("{}.{}", contract.type_name, member.member_name),
                        location: member.location.clone(),
                    };
                    if member.is_get_only_collection {
                        match self.session.get_only_collection_contract(member.member_type) {
                            Ok(collection) => {
                                if let Err(error) = self.session.item_contract(&collection) {
                                    self.record(&error, &origin);
                                }
                            }
                            Err(error) if error.is_fatal() => return Err(error),
                            Err(error) => {
                                self.record(&error, &origin);
                                continue;
                            }
                        }
                    }
                    self.register(member.member_type, &origin)?;
                }
            }
            Shape::Collection(collection) => {
                match self.session.item_contract(contract) {
                    Ok(Some(item)) => {
                        self.register(item.underlying_type, &own)?;
                    }
                    Ok(None) => {}
                    Err(error) if error.is_fatal() => return Err(error),
                    Err(error) => self.record(&error, &own),
                }
                if self.session.options().register_common_implementations {
                    for implementation in common_implementations(self.session.query(), contract) {
                        self.register(implementation, &own)?;
                    }
                }
                if let Some(shared) = collection.shared_type_contract.as_ref().and_then(|s| s.as_class()) {
                    if let Some(base) = shared.base {
                        self.register_id(base, &own)?;
                    }
                    for member in &shared.members {
                        self.register(member.member_type, &own)?;
                    }
                }
            }
            Shape::Enum(enumeration) => {
                if let Some(base) = enumeration.base_contract {
                    self.register_id(base, &own)?;
                }
            }
            Shape::Primitive(_) | Shape::Xml(_) | Shape::GenericParameter(_) => {}
        }

        match self.session.known_contracts(contract) {
            Ok(known) => {
                for &id in known.values() {
                    self.register_id(id, &own)?;
                }
            }
            Err(error) if error.is_fatal() => return Err(error),
            Err(error) => self.record(&error, &own),
        }
        Ok(())
    }

    /// Warnings for degraded contracts and notes for unsupported features.
    fn report_states(&mut self) {
        let mut contracts: Vec<Arc<Contract>> = self.contracts.values().cloned().collect();
        contracts.sort_by(|a, b| a.type_name.cmp(&b.type_name));
        let report_unsupported = self.session.options().report_unsupported;

        for contract in contracts {
            if contract.is_placeholder() {
                continue;
            }
            let location = self.session.query().location(contract.underlying_type);
            match &contract.read_only {
                ReadOnlyState::Complete => {}
                ReadOnlyState::CannotDeserialize(message) => self.collector.add(Diagnostic::new(
                    codes::READ_ONLY_CONTRACT,
                    Severity::Warning,
                    contract.type_name.clone(),
                    location.clone(),
                    message.clone(),
                )),
                ReadOnlyState::CannotSerialize(message) => self.collector.add(Diagnostic::new(
                    codes::INVALID_COLLECTION_PLACEHOLDER,
                    Severity::Warning,
                    contract.type_name.clone(),
                    location.clone(),
                    message.clone(),
                )),
            }

            if report_unsupported {
                for feature in unsupported_features(&contract) {
                    self.collector.add(Diagnostic::new(
                        codes::UNSUPPORTED_FEATURE,
                        Severity::Info,
                        contract.type_name.clone(),
                        location.clone(),
                        format!("{} is recognised but code will not be generated for it", feature),
                    ));
                }
            }
        }
    }
}
