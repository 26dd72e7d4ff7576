//! Contract cache and identity assignment
//!
//! Ids are handed out once per canonical type and never reassigned. Slots grow
//! by doubling up to a hard cap. Reads of assigned ids and published contracts
//! go through lock-free or shared-lock fast paths; allocation and publication
//! each take their own narrow lock and double-check after acquiring it.

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{fence, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::{debug, trace};

use crate::contracts::{Contract, ContractId};
use crate::core::types::TypeRef;
use crate::errors::ContractError;

pub const DEFAULT_INITIAL_CAPACITY: usize = 32;
pub const DEFAULT_MAX_CONTRACTS: usize = 1 << 20;

enum SlotState {
    Vacant,
    /// Under construction by the given thread.
    Building(ThreadId),
    Ready(Arc<Contract>),
    Failed(ContractError),
}

struct Slot {
    ty: Option<TypeRef>,
    state: SlotState,
}

impl Slot {
    fn vacant() -> Self {
        Self { ty: None, state: SlotState::Vacant }
    }
}

/// Cache statistics for monitoring
#[derive(Debug, Default, Clone, Copy)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub constructed: usize,
    pub discarded: usize,
    pub failed: usize,
    pub capacity: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

pub struct ContractCache {
    /// Type → id fast path
    ids: DashMap<TypeRef, ContractId>,
    /// Next id to hand out; only advanced under `alloc`
    next_id: AtomicUsize,
    alloc: Mutex<()>,
    slots: RwLock<Vec<Slot>>,
    max_contracts: usize,
    stats: RwLock<CacheStats>,
}

impl ContractCache {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_INITIAL_CAPACITY, DEFAULT_MAX_CONTRACTS)
    }

    pub fn with_limits(initial_capacity: usize, max_contracts: usize) -> Self {
        let max_contracts = max_contracts.max(1);
        let capacity = initial_capacity.clamp(1, max_contracts);
        let slots = (0..capacity).map(|_| Slot::vacant()).collect();
        Self {
            ids: DashMap::with_capacity(capacity),
            next_id: AtomicUsize::new(0),
            alloc: Mutex::new(()),
            slots: RwLock::new(slots),
            max_contracts,
            stats: RwLock::new(CacheStats { capacity, ..CacheStats::default() }),
        }
    }

    /// Id of a canonical type, assigning the next one on first sight.
    pub fn id_of(&self, ty: TypeRef) -> Result<ContractId, ContractError> {
        if let Some(id) = self.ids.get(&ty) {
            return Ok(*id);
        }

        let _guard = self.alloc.lock();
        if let Some(id) = self.ids.get(&ty) {
            return Ok(*id);
        }

        let id = self.next_id.load(Ordering::Relaxed);
        {
            let mut slots = self.slots.write();
            if id >= slots.len() {
                let grown = self.grown_capacity(slots.len())?;
                debug!(from = slots.len(), to = grown, "growing contract cache");
                slots.resize_with(grown, Slot::vacant);
                self.stats.write().capacity = grown;
            }
            slots[id].ty = Some(ty);
        }
        self.next_id.store(id + 1, Ordering::Release);
        self.ids.insert(ty, ContractId(id));
        trace!(id, %ty, "assigned contract id");
        Ok(ContractId(id))
    }

    fn grown_capacity(&self, current: usize) -> Result<usize, ContractError> {
        let doubled = current.saturating_mul(2).min(self.max_contracts);
        if doubled <= current {
            return Err(ContractError::CacheOverflow { limit: self.max_contracts });
        }
        Ok(doubled)
    }

    pub fn type_of(&self, id: ContractId) -> Option<TypeRef> {
        self.slots.read().get(id.0).and_then(|slot| slot.ty)
    }

    /// Published contract at `id`, if any.
    pub fn get(&self, id: ContractId) -> Option<Arc<Contract>> {
        match self.slots.read().get(id.0).map(|slot| &slot.state) {
            Some(SlotState::Ready(contract)) => Some(contract.clone()),
            _ => None,
        }
    }

    /// Contract at `id`, building it with `build` on first request.
    ///
    /// `build` runs outside every lock. When two threads race on the same id
    /// the first published result wins and the other is discarded. A request
    /// for an id the current thread is already building is an error.
    pub fn get_or_create<F>(&self, id: ContractId, build: F) -> Result<Arc<Contract>, ContractError>
    where
        F: FnOnce(TypeRef) -> Result<Contract, ContractError>,
    {
        let ty = {
            let slots = self.slots.read();
            let Some(slot) = slots.get(id.0) else {
                return Err(ContractError::UnknownType { type_name: format!("contract #{}", id) });
            };
            match &slot.state {
                SlotState::Ready(contract) => {
                    let contract = contract.clone();
                    drop(slots);
                    self.stats.write().hits += 1;
                    return Ok(contract);
                }
                SlotState::Failed(error) => return Err(error.clone()),
                // Builders only recurse into base classes; member and item
                // contracts are reached later by the closure resolver. Only a
                // host with a cyclic base chain lands here.
                SlotState::Building(owner) if *owner == thread::current().id() => {
                    return Err(ContractError::CyclicConstruction { type_name: format!("contract #{}", id) });
                }
                _ => {}
            }
            slot.ty.ok_or_else(|| ContractError::UnknownType { type_name: format!("contract #{}", id) })?
        };

        {
            let mut slots = self.slots.write();
            if let SlotState::Vacant = slots[id.0].state {
                slots[id.0].state = SlotState::Building(thread::current().id());
            }
        }
        self.stats.write().misses += 1;

        let built = build(ty);

        // Contract fields are complete before the slot makes them visible.
        fence(Ordering::Release);
        let mut slots = self.slots.write();
        let slot = &mut slots[id.0];
        match &slot.state {
            SlotState::Ready(existing) => {
                self.stats.write().discarded += 1;
                Ok(existing.clone())
            }
            SlotState::Failed(error) => Err(error.clone()),
            _ => match built {
                Ok(contract) => {
                    let contract = Arc::new(contract);
                    slot.state = SlotState::Ready(contract.clone());
                    self.stats.write().constructed += 1;
                    Ok(contract)
                }
                Err(error) => {
                    if error.is_fatal() {
                        slot.state = SlotState::Vacant;
                    } else {
                        slot.state = SlotState::Failed(error.clone());
                        self.stats.write().failed += 1;
                    }
                    Err(error)
                }
            },
        }
    }

    /// Number of ids assigned so far.
    pub fn len(&self) -> usize {
        self.next_id.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        *self.stats.read()
    }
}

impl Default for ContractCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::primitive::{PrimitiveContract, PrimitiveKind};
    use crate::contracts::Shape;
    use crate::core::xml::XmlName;

    fn primitive(id: ContractId, ty: TypeRef) -> Contract {
        Contract::new(
            id,
            ty,
            format!("T{}", ty.0),
            XmlName::schema("int"),
            Shape::Primitive(PrimitiveContract { kind: PrimitiveKind::Int32, interface_variant: false }),
        )
    }

    #[test]
    fn test_ids_are_stable() {
        let cache = ContractCache::new();
        let a = cache.id_of(TypeRef(10)).unwrap();
        let b = cache.id_of(TypeRef(11)).unwrap();
        assert_eq!(a, ContractId(0));
        assert_eq!(b, ContractId(1));
        assert_eq!(cache.id_of(TypeRef(10)).unwrap(), a);
        assert_eq!(cache.type_of(b), Some(TypeRef(11)));
    }

    #[test]
    fn test_growth_and_overflow() {
        let cache = ContractCache::with_limits(1, 4);
        for i in 0..4 {
            cache.id_of(TypeRef(i)).unwrap();
        }
        assert_eq!(cache.stats().capacity, 4);
        let err = cache.id_of(TypeRef(99)).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_get_or_create_builds_once() {
        let cache = ContractCache::new();
        let id = cache.id_of(TypeRef(3)).unwrap();
        let first = cache.get_or_create(id, |ty| Ok(primitive(id, ty))).unwrap();
        let second = cache
            .get_or_create(id, |_| panic!("contract must not be rebuilt"))
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats().constructed, 1);
    }

    #[test]
    fn test_failures_are_remembered() {
        let cache = ContractCache::new();
        let id = cache.id_of(TypeRef(5)).unwrap();
        let err = cache
            .get_or_create(id, |_| Err(ContractError::TypeNotSerializable { type_name: "T".into() }))
            .unwrap_err();
        assert_eq!(err.code(), "DCS001");
        let again = cache.get_or_create(id, |ty| Ok(primitive(id, ty))).unwrap_err();
        assert_eq!(again, err);
    }

    #[test]
    fn test_reentrant_request_is_cyclic() {
        let cache = ContractCache::new();
        let id = cache.id_of(TypeRef(1)).unwrap();
        let err = cache
            .get_or_create(id, |_| cache.get_or_create(id, |ty| Ok(primitive(id, ty))).map(|_| unreachable!()))
            .unwrap_err();
        assert_eq!(err.code(), "DCS034");
    }

    #[test]
    fn test_concurrent_publication_is_shared() {
        use rayon::prelude::*;

        let cache = ContractCache::with_limits(2, 1024);
        let contracts: Vec<Arc<Contract>> = (0..64u32)
            .into_par_iter()
            .map(|i| {
                let ty = TypeRef(i % 8);
                let id = cache.id_of(ty).unwrap();
                cache.get_or_create(id, |ty| Ok(primitive(id, ty))).unwrap()
            })
            .collect();

        assert_eq!(cache.len(), 8);
        for contract in &contracts {
            let published = cache.get(contract.id).unwrap();
            assert!(Arc::ptr_eq(contract, &published));
            assert_eq!(cache.type_of(contract.id), Some(contract.underlying_type));
        }
    }
}
