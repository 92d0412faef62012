//! Database module: models and schema for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows and conversions
//! - `schema.rs`: SQL DDL and the seeded administrator account
//! - `sqlite.rs`: schema initialization and the customer credential store

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{DbCustomer, NewCustomer};
pub use schema::{ADMIN_EMAIL, SQLITE_INIT};
pub use sqlite::{CustomerStore, Database, SqlitePool};
