//! Authenticated identity held for the duration of one caller's session.
//!
//! A `Session` is a plain value owned by whoever serves the caller (one per
//! HTTP request, see `middleware::session`). There is no process-wide state.

use serde::{Deserialize, Serialize};

/// Snapshot of a customer taken at login time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub customer_id: i64,
    pub full_name: String,
    pub email: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Unauthenticated,
    Authenticated(Identity),
}

impl Session {
    pub fn new(identity: Option<Identity>) -> Self {
        let mut session = Session::default();
        session.set_customer(identity);
        session
    }

    /// Replace the current identity. `None` is the same as [`Session::clear`].
    pub fn set_customer(&mut self, identity: Option<Identity>) {
        *self = match identity {
            Some(identity) => Session::Authenticated(identity),
            None => Session::Unauthenticated,
        };
    }

    pub fn clear(&mut self) {
        *self = Session::Unauthenticated;
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Session::Authenticated(identity) => Some(identity),
            Session::Unauthenticated => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated(_))
    }

    pub fn customer_id(&self) -> Option<i64> {
        self.identity().map(|i| i.customer_id)
    }

    pub fn customer_name(&self) -> Option<&str> {
        self.identity().map(|i| i.full_name.as_str())
    }

    pub fn customer_email(&self) -> Option<&str> {
        self.identity().map(|i| i.email.as_str())
    }

    pub fn is_admin(&self) -> bool {
        self.identity().is_some_and(|i| i.is_admin)
    }
}
