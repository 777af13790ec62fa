//! Authentication service.
//!
//! Password login against the `admins` collection, plus admin provisioning
//! for the CLI.

mod error;
pub mod password;

pub use error::AuthError;
pub use password::{hash_password, validate_password, verify_password};

use tracing::{info, instrument, warn};

use portfolio_core::{Email, StoreKey};

use crate::db::admins::AdminRepository;
use crate::models::admin::AdminRecord;
use crate::store::Reference;

/// Authentication service.
pub struct AuthService<'a> {
    admins: AdminRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service over the `portfolio` reference.
    #[must_use]
    pub const fn new(portfolio: &'a Reference) -> Self {
        Self {
            admins: AdminRepository::new(portfolio),
        }
    }

    /// Login with email and password.
    ///
    /// The email is trimmed and lowercased before lookup. An unknown email and
    /// a wrong password both yield `AuthError::InvalidCredentials`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AdminRecord, AuthError> {
        let email = Email::normalize(email);

        let Some(admin) = self.admins.find_by_email(&email).await else {
            warn!("Login failed");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &admin.password_hash) {
            warn!("Login failed");
            return Err(AuthError::InvalidCredentials);
        }

        info!("Admin logged in");
        Ok(admin)
    }

    /// Register a new admin.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password is too short.
    /// Returns `AuthError::AdminAlreadyExists` if the email is already registered.
    /// Returns `AuthError::Store` if the collection cannot be read or written.
    pub async fn register_admin(
        &self,
        email: &str,
        password: &str,
    ) -> Result<StoreKey, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        // A failed read must not look like "no duplicate".
        let existing = self.admins.list().await?;
        if existing.iter().any(|(_, r)| r.email == email.as_str()) {
            return Err(AuthError::AdminAlreadyExists);
        }

        let record = AdminRecord {
            email: email.into_inner(),
            password_hash: hash_password(password)?,
        };
        Ok(self.admins.insert(&record).await?)
    }

    /// Emails of every registered admin.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Store` if the collection cannot be read.
    pub async fn admin_emails(&self) -> Result<Vec<String>, AuthError> {
        Ok(self
            .admins
            .list()
            .await?
            .into_iter()
            .map(|(_, record)| record.email)
            .collect())
    }
}
