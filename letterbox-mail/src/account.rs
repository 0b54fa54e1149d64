//! Sender accounts.

use crate::{MailError, Result};
use rand::seq::IndexedRandom;
use std::fmt;

/// A mailbox the service is allowed to send from.
#[derive(Clone, PartialEq, Eq)]
pub struct SenderAccount {
    pub email: String,
    pub password: String,
}

impl SenderAccount {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for SenderAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SenderAccount")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Pool of sender accounts.
///
/// Each delivery picks an account at random to spread load across
/// provider quotas. There is no stickiness between deliveries.
#[derive(Debug, Clone)]
pub struct SenderPool {
    accounts: Vec<SenderAccount>,
}

impl SenderPool {
    /// Create a pool. Fails if `accounts` is empty.
    pub fn new(accounts: Vec<SenderAccount>) -> Result<Self> {
        if accounts.is_empty() {
            return Err(MailError::Config("sender pool is empty".to_string()));
        }
        Ok(Self { accounts })
    }

    /// Parse `email|password,email|password`.
    pub fn parse(raw: &str) -> Result<Self> {
        let accounts = raw
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let (email, password) = entry.split_once('|').ok_or_else(|| {
                    MailError::Config(format!("sender entry {:?} is not email|password", entry))
                })?;
                let (email, password) = (email.trim(), password.trim());
                if email.is_empty() || password.is_empty() {
                    return Err(MailError::Config(format!(
                        "sender entry {:?} has an empty email or password",
                        entry
                    )));
                }
                email
                    .parse::<lettre::Address>()
                    .map_err(|e| MailError::InvalidAddress(format!("{}: {}", email, e)))?;
                Ok(SenderAccount::new(email, password))
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(accounts)
    }

    /// Pick an account at random.
    pub fn choose(&self) -> &SenderAccount {
        // `new` guarantees at least one account
        self.accounts
            .choose(&mut rand::rng())
            .unwrap_or(&self.accounts[0])
    }

    pub fn accounts(&self) -> &[SenderAccount] {
        &self.accounts
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_parse_pool() {
        let pool = SenderPool::parse(" a@example.com|pw1 , b@example.org|pw2,").unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.accounts()[1], SenderAccount::new("b@example.org", "pw2"));
    }

    #[test]
    fn test_parse_rejects_bad_entries() {
        assert!(SenderPool::parse("").is_err());
        assert!(SenderPool::parse("a@example.com").is_err());
        assert!(SenderPool::parse("a@example.com|").is_err());
        assert!(SenderPool::parse("not-an-address|pw").is_err());
    }

    #[test]
    fn test_choose_covers_pool() {
        let pool = SenderPool::parse("a@example.com|1,b@example.com|2,c@example.com|3").unwrap();
        let picked: HashSet<String> = (0..300).map(|_| pool.choose().email.clone()).collect();
        assert_eq!(picked.len(), 3);
    }

    #[test]
    fn test_debug_hides_password() {
        let account = SenderAccount::new("a@example.com", "hunter2");
        let debug = format!("{:?}", account);
        assert!(debug.contains("a@example.com"));
        assert!(!debug.contains("hunter2"));
    }
}
