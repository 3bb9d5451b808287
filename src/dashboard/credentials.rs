//! Session-only datasource credentials.
//!
//! Records live in memory for the lifetime of the process. They are never
//! persisted, logged, or sent to the backend.

#![allow(missing_docs)]

use std::fmt;

/// One datasource credential record.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential {
    pub host: String,
    pub username: String,
    pub secret: String,
    pub share_path: String,
}

impl Credential {
    /// Secret replaced by a fixed-width mask.
    #[must_use]
    pub fn masked_secret(&self) -> &'static str {
        if self.secret.is_empty() { "" } else { "********" }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("secret", &self.masked_secret())
            .field("share_path", &self.share_path)
            .finish()
    }
}

/// Ordered credential list. Duplicates are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialStore {
    records: Vec<Credential>,
}

impl CredentialStore {
    /// Append unconditionally.
    pub fn save(&mut self, record: Credential) {
        self.records.push(record);
    }

    /// Remove by position. Out-of-range indices are ignored.
    /// Returns the removed record, if any.
    pub fn remove(&mut self, index: usize) -> Option<Credential> {
        (index < self.records.len()).then(|| self.records.remove(index))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Credential> {
        self.records.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Credential> {
        self.records.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Credential] {
        &self.records
    }
}
