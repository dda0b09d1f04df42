//! The account store: registered users plus a write-through save hook.
//!
//! The store itself only knows accounts in memory. Every successful
//! [`AccountStore::add`] hands the complete account set to an
//! [`AccountSink`], which decides where it ends up.

use std::collections::BTreeMap;

use crate::{Account, StoreError};

/// Receives the full account set after every successful registration.
///
/// `save` runs on the lobby task, so implementations must not block:
/// hand the snapshot off (see [`JsonFileSink`](crate::JsonFileSink)) or
/// keep it in memory (see [`MemorySink`](crate::MemorySink)).
///
/// # Example
///
/// ```rust
/// use duoplex_session::{Account, AccountSink, StoreError};
///
/// /// Drops every snapshot. Accounts live only as long as the process.
/// struct Forgetful;
///
/// impl AccountSink for Forgetful {
///     fn save(&self, _accounts: Vec<Account>) -> Result<(), StoreError> {
///         Ok(())
///     }
/// }
/// ```
pub trait AccountSink: Send + 'static {
    /// Accepts the complete, current account set.
    ///
    /// Returning an error makes the triggering `add` fail and roll back.
    fn save(&self, accounts: Vec<Account>) -> Result<(), StoreError>;
}

/// Result of checking a username/password pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The account exists and the password matches exactly.
    Success,
    /// The account exists but the password is different.
    WrongPassword,
    /// No account has this username.
    NotFound,
}

/// All registered accounts, keyed by username.
pub struct AccountStore {
    accounts: BTreeMap<String, Account>,
    sink: Box<dyn AccountSink>,
}

impl AccountStore {
    /// Creates an empty store that writes through to `sink`.
    pub fn new(sink: impl AccountSink) -> Self {
        Self::with_accounts(Vec::new(), sink)
    }

    /// Creates a store pre-filled with previously persisted accounts.
    ///
    /// If the list repeats a username, the first record wins.
    pub fn with_accounts(
        loaded: Vec<Account>,
        sink: impl AccountSink,
    ) -> Self {
        let mut accounts = BTreeMap::new();
        for account in loaded {
            if accounts.contains_key(&account.username) {
                tracing::warn!(
                    username = %account.username,
                    "duplicate account in persisted set, keeping the first"
                );
                continue;
            }
            accounts.insert(account.username.clone(), account);
        }
        Self {
            accounts,
            sink: Box::new(sink),
        }
    }

    /// Returns `true` if an account with this username exists.
    pub fn exists(&self, username: &str) -> bool {
        self.accounts.contains_key(username)
    }

    /// Looks up an account by username.
    pub fn get(&self, username: &str) -> Option<&Account> {
        self.accounts.get(username)
    }

    /// Registers a new account and persists the full set.
    ///
    /// # Errors
    /// - [`StoreError::AlreadyExists`]: the username is taken
    /// - [`StoreError::Persist`] (or another sink error): the save hook
    ///   refused the snapshot; the account is not kept
    pub fn add(&mut self, account: Account) -> Result<(), StoreError> {
        if self.exists(&account.username) {
            return Err(StoreError::AlreadyExists(account.username));
        }

        let username = account.username.clone();
        self.accounts.insert(username.clone(), account);

        if let Err(e) = self.sink.save(self.snapshot()) {
            self.accounts.remove(&username);
            tracing::error!(%username, error = %e, "account not persisted, rolled back");
            return Err(e);
        }

        tracing::info!(%username, total = self.accounts.len(), "account created");
        Ok(())
    }

    /// Returns `true` iff the account exists and the password matches
    /// exactly (case-sensitive).
    pub fn validate_login(&self, username: &str, password: &str) -> bool {
        self.login(username, password) == LoginOutcome::Success
    }

    /// Checks a username/password pair, telling apart an unknown user
    /// from a wrong password.
    pub fn login(&self, username: &str, password: &str) -> LoginOutcome {
        match self.accounts.get(username) {
            Some(account) if account.password == password => {
                LoginOutcome::Success
            }
            Some(_) => LoginOutcome::WrongPassword,
            None => LoginOutcome::NotFound,
        }
    }

    /// Returns the number of registered accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns `true` if no accounts are registered.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Clones every account, ordered by username.
    pub fn snapshot(&self) -> Vec<Account> {
        self.accounts.values().cloned().collect()
    }
}
