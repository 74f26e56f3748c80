//! Options for building security handlers.

/// Options for [`crate::security::StandardSecurityHandler::with_config`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityConfig {
    /// User password. Empty means "no password", which is how most
    /// permission-only encrypted files are opened.
    pub password: Vec<u8>,

    /// Reject encryption dictionaries with missing or unparseable entries
    /// instead of silently deriving an unusable key.
    pub strict: bool,
}

impl SecurityConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the user password.
    pub fn password(mut self, password: impl AsRef<[u8]>) -> Self {
        self.password = password.as_ref().to_vec();
        self
    }

    /// Enables or disables strict validation.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}
