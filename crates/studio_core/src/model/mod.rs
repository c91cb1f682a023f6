//! Domain model for studio entities and the links between them.
//!
//! # Responsibility
//! - Define the four persisted entity types and their validation rules.
//! - Define the closed set of relationship kinds and their endpoint types.
//!
//! # Invariants
//! - Every entity is identified by an integer `EntityId` assigned by storage.
//! - The relationship kind set is fixed at compile time.

pub mod agent;
pub mod entity;
pub mod link;
pub mod llm_model;
pub mod skill;
pub mod workflow;
