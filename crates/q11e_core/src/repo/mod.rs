//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the generic CRUD contract and the address-keyed q11e contract.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes enforce `Q11e::validate()` before persistence.
//! - Every operation honors `RequestContext` cancellation and deadlines.

pub mod base;
pub mod context;
pub mod q11e_repo;
