//! Parallel contract construction
//!
//! Root contracts and their direct member types are built on a rayon pool.
//! The cache guarantees one published contract per id, so the sequential
//! closure pass that follows only reads what the workers produced and its
//! output does not depend on scheduling.

use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::analysis::{Resolution, ResolutionSession};
use crate::contracts::Shape;
use crate::core::types::TypeRef;
use crate::errors::ContractError;

pub struct ParallelResolver {
    /// Number of worker threads (0 = rayon's default)
    workers: usize,
}

impl ParallelResolver {
    pub fn new(workers: usize) -> Self {
        Self { workers }
    }

    pub fn resolve(&self, session: &ResolutionSession, roots: &[TypeRef]) -> Result<Resolution, ContractError> {
        let start = Instant::now();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("xmlcontract-worker-{}", i))
            .build();

        match pool {
            Ok(pool) => {
                let warmed = pool.install(|| roots.par_iter().map(|&root| warm(session, root)).sum::<usize>());
                debug!(
                    roots = roots.len(),
                    warmed,
                    threads = pool.current_num_threads(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "contracts warmed"
                );
            }
            Err(error) => warn!(%error, "worker pool unavailable, resolving sequentially"),
        }

        let resolution = session.resolve(roots)?;
        let stats = session.cache_stats();
        info!(
            contracts = resolution.contracts.len(),
            hit_rate = stats.hit_rate(),
            discarded = stats.discarded,
            duration_ms = start.elapsed().as_millis() as u64,
            "parallel resolution finished"
        );
        Ok(resolution)
    }
}

/// Build `root` and the contracts of its members; failures stay in the cache
/// for the closure pass to report.
fn warm(session: &ResolutionSession, root: TypeRef) -> usize {
    let Ok(contract) = session.contract_for(root) else {
        return 0;
    };
    let mut built = 1;
    if let Shape::Class(class) = &contract.shape {
        built += class
            .members
            .par_iter()
            .filter(|member| session.contract_for(member.member_type).is_ok())
            .count();
    }
    built
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TypeModel;
    use std::sync::Arc;

    const MODEL: &str = r#"{
        "types": [
            { "name": "Shop.Order", "data_contract": {},
              "members": [
                { "name": "Lines", "type": "System.Collections.Generic.List`1[Shop.Line]", "data_member": {} },
                { "name": "Customer", "type": "Shop.Customer", "data_member": {} } ] },
            { "name": "Shop.Line", "data_contract": {}, "members": [ { "name": "Sku", "type": "string", "data_member": {} } ] },
            { "name": "Shop.Customer", "data_contract": {}, "members": [ { "name": "Name", "type": "string", "data_member": {} } ] }
        ]
    }"#;

    fn names(resolution: &Resolution) -> Vec<String> {
        let mut names: Vec<String> = resolution.contracts.values().map(|c| c.type_name.clone()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let model = Arc::new(TypeModel::from_json(MODEL).unwrap());
        let roots = model.roots();

        let sequential = ResolutionSession::new(model.clone()).resolve(&roots).unwrap();
        let session = ResolutionSession::new(model.clone());
        let parallel = ParallelResolver::new(4).resolve(&session, &roots).unwrap();

        assert_eq!(names(&sequential), names(&parallel));
        assert_eq!(sequential.diagnostics, parallel.diagnostics);
    }

    #[test]
    fn test_single_worker() {
        let model = Arc::new(TypeModel::from_json(MODEL).unwrap());
        let session = ResolutionSession::new(model.clone());
        let resolution = ParallelResolver::new(1).resolve(&session, &model.roots()).unwrap();
        assert!(resolution.by_type_name("Shop.Line").is_some());
        assert!(!resolution.has_errors());
    }
}
