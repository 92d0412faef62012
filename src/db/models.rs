use serde::Deserialize;
use sqlx::FromRow;

use crate::session::Identity;

/// A `Customer` row, password hash included. Never serialized.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DbCustomer {
    pub customer_id: i64,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    pub is_admin: bool,
}

/// Registration input; the password is still in plaintext here, so no `Debug`.
#[derive(Clone, Deserialize)]
pub struct NewCustomer {
    pub full_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub contact_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl From<DbCustomer> for Identity {
    fn from(c: DbCustomer) -> Self {
        Identity {
            customer_id: c.customer_id,
            full_name: c.full_name,
            email: c.email,
            is_admin: c.is_admin,
        }
    }
}
