//! Portal credentials and the providers that obtain them.
//!
//! A provider is asked at most once per session: [`super::PortalClient`]
//! memoizes the first successful answer and reuses it for every later
//! authentication challenge.

use tracing::debug;

use super::error::TransportError;
use crate::prompt::{Console, TerminalConsole};

/// Username and password for the portal.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Creates a credential pair.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Account name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Secret.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Source of credentials, consulted on the first authentication challenge.
pub trait CredentialProvider: Send + Sync {
    /// Produces the credentials to answer a challenge with.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Credentials`] when nothing usable can be obtained.
    fn credentials(&self) -> Result<Credentials, TransportError>;
}

/// Fixed credentials, for scripted runs and tests.
#[derive(Debug, Clone)]
pub struct StaticCredentials(pub Credentials);

impl CredentialProvider for StaticCredentials {
    fn credentials(&self) -> Result<Credentials, TransportError> {
        Ok(self.0.clone())
    }
}

/// Uses configured values and prompts on the terminal for whatever is missing.
///
/// Prompts go to stderr; the password prompt is masked when stdin is a
/// terminal.
#[derive(Clone, Default)]
pub struct PromptingCredentials {
    username: Option<String>,
    password: Option<String>,
}

impl PromptingCredentials {
    /// Creates a provider with optional preset username and password.
    #[must_use]
    pub fn new(username: Option<String>, password: Option<String>) -> Self {
        Self { username, password }
    }
}

impl std::fmt::Debug for PromptingCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptingCredentials")
            .field("username", &self.username)
            .field("password_preset", &self.password.is_some())
            .finish()
    }
}

impl CredentialProvider for PromptingCredentials {
    fn credentials(&self) -> Result<Credentials, TransportError> {
        let mut console = TerminalConsole::stderr();

        let username = match &self.username {
            Some(username) => username.clone(),
            None => console
                .read_line("Enter your portal username: ")
                .map_err(|e| TransportError::credentials(e.to_string()))?
                .ok_or_else(|| TransportError::credentials("input closed before username"))?,
        };
        let username = username.trim().to_string();
        if username.is_empty() {
            return Err(TransportError::credentials("empty username"));
        }

        let password = match &self.password {
            Some(password) => password.clone(),
            None => console
                .read_secret("Enter your portal password: ")
                .map_err(|e| TransportError::credentials(e.to_string()))?
                .ok_or_else(|| TransportError::credentials("input closed before password"))?,
        };

        debug!(username = %username, "credentials obtained");
        Ok(Credentials::new(username, password))
    }
}
