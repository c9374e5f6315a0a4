//! Secure in-memory handling of the reasoning component's credential.
//!
//! ```rust
//! use cdprovider::ApiKeyCredential;
//!
//! let credential = ApiKeyCredential::new("GEMINI_API_KEY", "sk-test").expect("valid key");
//! assert_eq!(credential.source(), "GEMINI_API_KEY");
//! assert_eq!(format!("{:?}", credential.secret()), "[REDACTED]");
//! ```

use crate::ProviderError;

#[derive(PartialEq, Eq)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn expose(&self) -> &str {
        self.value.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        unsafe {
            self.value.as_mut_vec().fill(0);
        }
    }
}

/// An API key together with where it was read from.
pub struct ApiKeyCredential {
    source: String,
    secret: SecretString,
}

impl ApiKeyCredential {
    pub fn new(source: impl Into<String>, value: impl Into<String>) -> Result<Self, ProviderError> {
        let source = source.into();
        let secret = SecretString::new(value);
        if secret.is_empty() {
            return Err(ProviderError::authentication(format!(
                "credential from '{source}' must not be empty"
            )));
        }

        Ok(Self { source, secret })
    }

    /// Picks the first non-empty value among `(source, value)` candidates.
    pub fn first_present<I, S, V>(candidates: I) -> Result<Self, ProviderError>
    where
        I: IntoIterator<Item = (S, Option<V>)>,
        S: Into<String>,
        V: Into<String>,
    {
        let mut tried = Vec::new();
        for (source, value) in candidates {
            let source = source.into();
            if let Some(value) = value
                && let Ok(credential) = Self::new(source.clone(), value)
            {
                return Ok(credential);
            }
            tried.push(source);
        }

        Err(ProviderError::authentication(format!(
            "no reasoning credential found (checked: {})",
            tried.join(", ")
        )))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn secret(&self) -> &SecretString {
        &self.secret
    }
}

impl std::fmt::Debug for ApiKeyCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyCredential")
            .field("source", &self.source)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProviderErrorKind;

    #[test]
    fn blank_credential_is_rejected() {
        let error = ApiKeyCredential::new("GEMINI_API_KEY", "   ").expect_err("blank key");
        assert_eq!(error.kind, ProviderErrorKind::Authentication);
        assert!(error.message.contains("GEMINI_API_KEY"));
    }

    #[test]
    fn first_present_skips_missing_and_blank_values() {
        let credential = ApiKeyCredential::first_present([
            ("CIVICDESK_API_KEY", None),
            ("GEMINI_API_KEY", Some("")),
            ("config", Some("key-123")),
        ])
        .expect("config value should be used");

        assert_eq!(credential.source(), "config");
        assert_eq!(credential.secret().expose(), "key-123");
    }

    #[test]
    fn first_present_lists_every_source_when_nothing_matches() {
        let error = ApiKeyCredential::first_present([
            ("CIVICDESK_API_KEY", None::<String>),
            ("GEMINI_API_KEY", None),
        ])
        .expect_err("no credential");

        assert!(error.message.contains("CIVICDESK_API_KEY"));
        assert!(error.message.contains("GEMINI_API_KEY"));
    }

    #[test]
    fn debug_output_never_contains_the_secret() {
        let credential = ApiKeyCredential::new("env", "super-secret").expect("valid");
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains("super-secret"));
    }
}
