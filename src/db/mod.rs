//! Database layer
//!
//! Every Readwell deployment runs on a single SQLite file, so the pool module
//! only knows about SQLite. Foreign keys are switched on for every
//! connection and migrations are embedded in the binary.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool};
