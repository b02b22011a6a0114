//! Credentials for remote backends.

use std::fmt;

use crate::error::{HalError, HalResult};

/// Default environment variable holding the cloud API key.
pub const DEFAULT_CREDENTIAL_VAR: &str = "API_KEY";

/// A named secret used to authenticate against a backend.
///
/// `Debug` never prints the value.
#[derive(Clone)]
pub struct Credential {
    name: String,
    value: String,
}

impl Credential {
    /// Create a credential from an explicit value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Read a credential from the environment variable `var`.
    ///
    /// Fails with [`HalError::AuthenticationFailure`] if the variable is
    /// unset or empty.
    pub fn from_env(var: &str) -> HalResult<Self> {
        Self::from_lookup(var, |k| std::env::var(k).ok())
    }

    /// Read a credential through an arbitrary lookup function.
    pub fn from_lookup(var: &str, lookup: impl Fn(&str) -> Option<String>) -> HalResult<Self> {
        match lookup(var) {
            Some(value) if !value.trim().is_empty() => Ok(Self::new(var, value.trim())),
            Some(_) => Err(HalError::AuthenticationFailure(format!(
                "environment variable {var} is empty"
            ))),
            None => Err(HalError::AuthenticationFailure(format!(
                "environment variable {var} not set"
            ))),
        }
    }

    /// Name of the credential (the variable it came from).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The secret value.
    pub fn expose(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let cred = Credential::new("API_KEY", "super-secret");
        let debug = format!("{cred:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret"));
        assert_eq!(cred.expose(), "super-secret");
    }

    #[test]
    fn test_lookup() {
        let cred = Credential::from_lookup("API_KEY", |_| Some(" abc \n".into())).unwrap();
        assert_eq!(cred.name(), "API_KEY");
        assert_eq!(cred.expose(), "abc");

        assert!(matches!(
            Credential::from_lookup("API_KEY", |_| None),
            Err(HalError::AuthenticationFailure(msg)) if msg.contains("API_KEY")
        ));
        assert!(Credential::from_lookup("API_KEY", |_| Some(String::new())).is_err());
    }
}
