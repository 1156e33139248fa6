//! Outbound adapters implementing domain ports.
//!
//! - **persistence**: PostgreSQL ledger store using Diesel
//! - **memory**: in-process ledger store with per-account locks
//! - **random**: draw sources backing the wheel
//!
//! Adapters translate between domain types and infrastructure
//! representations. Settlement rules stay in the domain.

pub mod memory;
pub mod persistence;
pub mod random;
