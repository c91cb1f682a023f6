//! Use-case services over the repositories.
//!
//! # Responsibility
//! - Turn repository results into `DbResponse` envelopes.
//! - Keep failure recovery and structured logging at the operation boundary.
//!
//! # Invariants
//! - Public operations never panic and never return a bare repository error
//!   for the six entity/link use-cases; failures become `status=false`
//!   envelopes with a distinct `ErrorKind`.

pub mod entity_store;
pub mod link_registry;
pub mod response;
