//! Admin repository.

use serde_json::Value;
use tracing::{error, instrument};

use portfolio_core::StoreKey;

use super::ADMINS;
use crate::models::admin::AdminRecord;
use crate::store::{Reference, StoreError};

/// Repository for the `admins` collection.
pub struct AdminRepository<'a> {
    portfolio: &'a Reference,
}

impl<'a> AdminRepository<'a> {
    /// Create a repository over the `portfolio` reference.
    #[must_use]
    pub const fn new(portfolio: &'a Reference) -> Self {
        Self { portfolio }
    }

    fn admins(&self) -> Result<Reference, StoreError> {
        Ok(self.portfolio.child(&StoreKey::parse(ADMINS)?))
    }

    /// All admin records with their keys, in key order.
    ///
    /// Entries that are not objects are skipped.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the collection cannot be read.
    pub async fn list(&self) -> Result<Vec<(String, AdminRecord)>, StoreError> {
        let value = self.admins()?.get().await?;
        let Value::Object(map) = value else {
            return Ok(Vec::new());
        };
        Ok(map
            .iter()
            .filter_map(|(key, record)| Some((key.clone(), AdminRecord::from_value(record)?)))
            .collect())
    }

    /// Find the first admin whose stored `email` equals `email` exactly.
    ///
    /// The caller normalizes `email`. A failed read is logged and reported as
    /// "no such admin", so a store outage denies every login.
    #[instrument(skip(self))]
    pub async fn find_by_email(&self, email: &str) -> Option<AdminRecord> {
        match self.list().await {
            Ok(admins) => admins
                .into_iter()
                .map(|(_, record)| record)
                .find(|record| record.email == email),
            Err(e) => {
                error!(error = %e, "Admin lookup failed");
                None
            }
        }
    }

    /// Append a new admin record and return its key.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write fails.
    pub async fn insert(&self, record: &AdminRecord) -> Result<StoreKey, StoreError> {
        let value = serde_json::to_value(record)?;
        let created = self.admins()?.push(&value).await?;
        created
            .key()
            .cloned()
            .ok_or_else(|| StoreError::UnexpectedResponse("push returned the root".to_string()))
    }
}
