//! Data contract resolution for XML serializer generation
//!
//! Given a host that can answer questions about types ([`TypeQuery`]), the
//! engine decides for every reachable type whether and how it serializes:
//! its XML name and namespace, its wire shape, its members in wire order and
//! the known types it admits. Results come back as an immutable, id-addressed
//! contract set plus diagnostics.

// Core modules
pub mod analysis;
pub mod contracts;
pub mod core;
pub mod emit;
pub mod errors;
pub mod frontend;
pub mod infrastructure;
pub mod model;
pub mod naming;
pub mod performance;

// Re-export commonly used items
pub use analysis::{ClosureResolver, Resolution, ResolutionSession, SessionOptions};
pub use contracts::{Contract, ContractId, Shape};
pub use crate::core::{SpecialType, TypeQuery, TypeRef, XmlName};
pub use emit::{ContractDescriptor, ContractSet, Direction, EmitMode};
pub use errors::{ContractError, Diagnostic, DiagnosticCollector, Severity, SourceLocation};
pub use frontend::{cli_main, Config};
pub use model::{ModelLoader, ModelSpec, TypeModel};
pub use naming::NameResolver;
pub use performance::{ContractCache, ParallelResolver};
