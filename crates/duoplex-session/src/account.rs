use serde::{Deserialize, Serialize};

/// A registered user.
///
/// Passwords are stored and compared as plain text; this server makes
/// no attempt at credential security.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    pub password: String,
}

impl Account {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}
