pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod password;
pub mod router;
pub mod session;

pub use db::{CustomerStore, Database};
pub use error::QualimedError;
pub use session::{Identity, Session};
