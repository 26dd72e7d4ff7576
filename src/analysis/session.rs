//! Resolution session: the explicit owner of every cache of one pass
//!
//! A session wraps the host's [`TypeQuery`], assigns contract ids, memoizes
//! built-in contracts and dispatches each type to the builder for its shape.
//! Sessions share nothing, so independent runs never observe each other.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::analysis::closure::{ClosureResolver, Resolution};
use crate::analysis::known_types;
use crate::contracts::class::{self, CallbackMethods};
use crate::contracts::collection::{self, CollectionAnalysis};
use crate::contracts::primitive::{self, PrimitiveContract};
use crate::contracts::{enums, xml, Contract, ContractId, GenericParameterContract, KnownContracts, Shape};
use crate::core::capabilities::{display_name, implements, unwrap_nullable};
use crate::core::types::{SpecialType, TypeKind, TypeQuery, TypeRef};
use crate::core::xml::XmlName;
use crate::errors::ContractError;
use crate::frontend::config::Config;
use crate::naming::NameResolver;
use crate::performance::cache::{CacheStats, ContractCache, DEFAULT_INITIAL_CAPACITY, DEFAULT_MAX_CONTRACTS};

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub initial_capacity: usize,
    pub max_contracts: usize,
    /// Seed every resolution with the primitive contracts.
    pub include_primitives: bool,
    /// Add `List<T>`, `T[]` and friends for interface-typed collections.
    pub register_common_implementations: bool,
    pub max_errors: usize,
    pub warnings_as_errors: bool,
    pub suppress: Vec<String>,
    /// Report features that code emission will refuse to generate.
    pub report_unsupported: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_contracts: DEFAULT_MAX_CONTRACTS,
            include_primitives: true,
            register_common_implementations: true,
            max_errors: 100,
            warnings_as_errors: false,
            suppress: Vec::new(),
            report_unsupported: true,
        }
    }
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            initial_capacity: config.cache.initial_capacity,
            max_contracts: config.cache.max_contracts,
            include_primitives: config.resolve.include_primitives,
            register_common_implementations: config.resolve.register_common_implementations,
            max_errors: config.diagnostics.max_errors,
            warnings_as_errors: config.diagnostics.warnings_as_errors,
            suppress: config.diagnostics.suppress.clone(),
            report_unsupported: config.diagnostics.report_unsupported,
        }
    }
}

pub struct ResolutionSession {
    query: Arc<dyn TypeQuery>,
    cache: ContractCache,
    builtins: DashMap<TypeRef, Option<PrimitiveContract>>,
    get_only: DashMap<ContractId, Arc<Contract>>,
    options: SessionOptions,
}

impl ResolutionSession {
    pub fn new(query: Arc<dyn TypeQuery>) -> Self {
        Self::with_options(query, SessionOptions::default())
    }

    pub fn with_options(query: Arc<dyn TypeQuery>, options: SessionOptions) -> Self {
        Self {
            query,
            cache: ContractCache::with_limits(options.initial_capacity, options.max_contracts),
            builtins: DashMap::new(),
            get_only: DashMap::new(),
            options,
        }
    }

    pub fn query(&self) -> &dyn TypeQuery {
        self.query.as_ref()
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn naming(&self) -> NameResolver<'_> {
        NameResolver::new(self)
    }

    pub fn type_name(&self, ty: TypeRef) -> String {
        display_name(self.query(), ty)
    }

    /// Built-in contract a type maps to, memoized per session.
    pub fn builtin(&self, ty: TypeRef) -> Option<PrimitiveContract> {
        if let Some(entry) = self.builtins.get(&ty) {
            return *entry;
        }
        let primitive = primitive::builtin_kind(self.query(), ty);
        *self.builtins.entry(ty).or_insert(primitive)
    }

    /// Shape test without construction: the item type if `ty` is a collection.
    pub fn is_collection(&self, ty: TypeRef) -> Option<TypeRef> {
        collection::is_collection(self, ty, true)
    }

    /// Stable id of the canonical (nullable-unwrapped) type.
    pub fn id_of(&self, ty: TypeRef) -> Result<ContractId, ContractError> {
        self.cache.id_of(unwrap_nullable(self.query(), ty))
    }

    pub fn type_of(&self, id: ContractId) -> Option<TypeRef> {
        self.cache.type_of(id)
    }

    pub fn contract(&self, id: ContractId) -> Result<Arc<Contract>, ContractError> {
        self.cache.get_or_create(id, |ty| self.create(id, ty))
    }

    pub fn contract_for(&self, ty: TypeRef) -> Result<Arc<Contract>, ContractError> {
        let id = self.id_of(ty)?;
        self.contract(id)
    }

    /// Already published contract, without triggering construction.
    pub fn cached(&self, id: ContractId) -> Option<Arc<Contract>> {
        self.cache.get(id)
    }

    pub fn contract_count(&self) -> usize {
        self.cache.len()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn create(&self, id: ContractId, ty: TypeRef) -> Result<Contract, ContractError> {
        let query = self.query();
        let type_name = self.type_name(ty);
        debug!(id = id.0, %type_name, "constructing contract");

        if let Some(builtin) = self.builtin(ty) {
            return Ok(primitive::build(id, ty, type_name, builtin));
        }

        match query.kind(ty) {
            TypeKind::Enum => return enums::build(self, id, ty),
            TypeKind::GenericParameter { position } => {
                let name = self.naming().xml_name(ty)?;
                let shape = Shape::GenericParameter(GenericParameterContract { position });
                return Ok(Contract::new(id, ty, type_name, name, shape));
            }
            TypeKind::Pointer => return Err(ContractError::TypeNotSerializable { type_name }),
            _ => {}
        }

        if !query.kind(ty).is_array() && implements(query, ty, SpecialType::IXmlSerializable) {
            return xml::build(self, id, ty);
        }

        match collection::analyze(self, ty, true) {
            CollectionAnalysis::Shape(shape) => collection::build(self, id, ty, shape),
            CollectionAnalysis::Invalid { defect, hard: true, .. } => {
                Err(ContractError::InvalidCollection { type_name, defect })
            }
            CollectionAnalysis::Invalid { defect, hard: false, item_type } => {
                collection::build_invalid(self, id, ty, defect, item_type)
            }
            CollectionAnalysis::NotCollection => class::build(self, id, ty),
        }
    }

    /// Contract used to populate a get-only collection member in place.
    pub fn get_only_collection_contract(&self, ty: TypeRef) -> Result<Arc<Contract>, ContractError> {
        let id = self.id_of(ty)?;
        if let Some(existing) = self.get_only.get(&id) {
            return Ok(existing.clone());
        }
        let ty = self.type_of(id).unwrap_or(ty);

        let contract = match collection::analyze(self, ty, false) {
            CollectionAnalysis::Shape(shape) => Arc::new(collection::build(self, id, ty, shape)?),
            _ => {
                let contract = self.contract(id)?;
                if contract.as_class().is_some() {
                    return Err(ContractError::NoSetMethodForGetOnlyMember { type_name: contract.type_name.clone() });
                }
                contract
            }
        };
        trace!(id = id.0, "get-only collection contract ready");
        Ok(self.get_only.entry(id).or_insert(contract).clone())
    }

    /// Item contract of a collection; for dictionaries the synthesized key/value contract.
    pub fn item_contract(&self, contract: &Contract) -> Result<Option<Arc<Contract>>, ContractError> {
        let Some(collection) = contract.as_collection() else {
            return Ok(None);
        };
        let Some(item_type) = collection.item_type else {
            return Ok(None);
        };

        let item = collection.item_cell().get_or_try_init(|| {
            let item = self.contract_for(item_type)?;
            if !collection.kind.is_dictionary() {
                return Ok(item);
            }
            match item.as_class() {
                Some(class) => {
                    let key = collection.key_name.clone().unwrap_or_default();
                    let value = collection.value_name.clone().unwrap_or_default();
                    let renamed = class.with_member_names(contract.namespace(), &[key, value]);
                    let synthesized = Contract::new(
                        item.id,
                        item.underlying_type,
                        item.type_name.clone(),
                        XmlName::new(item.name(), contract.namespace()),
                        Shape::Class(renamed),
                    )
                    .with_value_type(item.is_value_type);
                    Ok(Arc::new(synthesized))
                }
                None => Ok(item),
            }
        })?;
        Ok(Some(item.clone()))
    }

    /// Known subtypes of a contract, imported once on first request.
    pub fn known_contracts<'c>(&self, contract: &'c Contract) -> Result<&'c KnownContracts, ContractError> {
        contract
            .known_cell()
            .get_or_try_init(|| known_types::import(self, contract.underlying_type))
    }

    /// Serialization callbacks of a class contract, scanned once on first request.
    pub fn callbacks<'c>(&self, contract: &'c Contract) -> Result<Option<&'c CallbackMethods>, ContractError> {
        let Some(class) = contract.as_class() else {
            return Ok(None);
        };
        if contract.is_placeholder() {
            return Ok(None);
        }
        class
            .callbacks_cell()
            .get_or_try_init(|| class::scan_callbacks(self, contract.underlying_type, class.has_extension_data))
            .map(Some)
    }

    /// Resolve the closure of `roots` into a finished contract set.
    pub fn resolve(&self, roots: &[TypeRef]) -> Result<Resolution, ContractError> {
        ClosureResolver::new(self).resolve(roots)
    }
}
