//! Outbound adapters implementing the domain ports.
//!
//! `persistence` talks to PostgreSQL; `memory` keeps everything in process
//! for local runs and handler tests.

pub mod memory;
pub mod persistence;
