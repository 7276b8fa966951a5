//! Infrastructure layer for the proxy
//!
//! Implementations of the view store contract: Postgres for production and
//! an in-process store for tests and database-less runs.

pub mod database;
pub mod memory;

pub use database::{PgViewStore, ViewsTable};
pub use memory::InMemoryViewStore;
