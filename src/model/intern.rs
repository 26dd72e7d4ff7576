//! Interning of constructed types
//!
//! Arrays and generic instantiations are created on demand and must keep a
//! single identity: asking twice for `List<int>` yields the same [`TypeRef`].
//! Declared types occupy the handles below `base`; constructed ones are
//! numbered from there.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use smallvec::SmallVec;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::core::types::TypeRef;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Array { element: TypeRef, rank: u32 },
    Generic { definition: TypeRef, arguments: SmallVec<[TypeRef; 2]> },
}

pub struct TypeInterner {
    key_to_ref: DashMap<TypeKey, TypeRef>,
    ref_to_key: DashMap<TypeRef, TypeKey>,
    base: u32,
    next: AtomicU32,
}

impl TypeInterner {
    pub fn new(base: u32) -> Self {
        Self {
            key_to_ref: DashMap::with_capacity(256),
            ref_to_key: DashMap::with_capacity(256),
            base,
            next: AtomicU32::new(0),
        }
    }

    pub fn intern(&self, key: TypeKey) -> TypeRef {
        if let Some(existing) = self.key_to_ref.get(&key) {
            return *existing;
        }
        // The entry guard holds the shard lock, so concurrent callers agree on one handle.
        match self.key_to_ref.entry(key) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let ty = TypeRef(self.base + self.next.fetch_add(1, Ordering::Relaxed));
                self.ref_to_key.insert(ty, entry.key().clone());
                entry.insert(ty);
                ty
            }
        }
    }

    pub fn key_of(&self, ty: TypeRef) -> Option<TypeKey> {
        if ty.0 < self.base {
            return None;
        }
        self.ref_to_key.get(&ty).map(|key| key.clone())
    }

    pub fn len(&self) -> usize {
        self.key_to_ref.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key_to_ref.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;
    use std::sync::Arc;

    #[test]
    fn test_same_key_same_handle() {
        let interner = TypeInterner::new(10);
        let list_int = TypeKey::Generic { definition: TypeRef(3), arguments: smallvec![TypeRef(1)] };
        let a = interner.intern(list_int.clone());
        let b = interner.intern(list_int.clone());
        assert_eq!(a, b);
        assert_eq!(a, TypeRef(10));
        assert_eq!(interner.key_of(a), Some(list_int));
        assert_eq!(interner.key_of(TypeRef(3)), None);
    }

    #[test]
    fn test_distinct_keys() {
        let interner = TypeInterner::new(0);
        let array = interner.intern(TypeKey::Array { element: TypeRef(1), rank: 1 });
        let matrix = interner.intern(TypeKey::Array { element: TypeRef(1), rank: 2 });
        assert_ne!(array, matrix);
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn test_concurrent_interning_agrees() {
        let interner = Arc::new(TypeInterner::new(100));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let interner = interner.clone();
                std::thread::spawn(move || {
                    (0..50)
                        .map(|i| interner.intern(TypeKey::Array { element: TypeRef(i), rank: 1 }))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let results: Vec<Vec<TypeRef>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for result in &results[1..] {
            assert_eq!(result, &results[0]);
        }
        assert_eq!(interner.len(), 50);
    }
}
