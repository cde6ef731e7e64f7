//! Login credentials type.

use std::fmt;

use crate::error::InvalidInputError;

/// Username and password submitted through the login form.
///
/// # Security
///
/// The password is never exposed in Debug output to prevent accidental logging.
///
/// # Example
///
/// ```
/// use sessiongate_core::Credentials;
///
/// let creds = Credentials::new("alice", "hunter2");
/// assert_eq!(creds.username(), "alice");
/// assert!(creds.validate().is_ok());
/// ```
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Create new credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns the username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the password.
    ///
    /// # Security
    ///
    /// Use this only when constructing the login request body.
    /// Never log or display this value.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Reject blank fields before anything reaches the network.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInputError::EmptyField`] naming the first blank field.
    pub fn validate(&self) -> Result<(), InvalidInputError> {
        if self.username.trim().is_empty() {
            return Err(InvalidInputError::EmptyField { field: "username" });
        }
        if self.password.is_empty() {
            return Err(InvalidInputError::EmptyField { field: "password" });
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
