use std::fmt;

/// Per-request API token for the actor platform.
///
/// The value is threaded through every upstream call and never stored.
/// `Debug` is redacted so a credential cannot leak through structured logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a caller-supplied token. Returns `None` for blank input.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == token.len() {
            Some(Self(token))
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The raw token, for placing on the wire.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_credential_rejected() {
        assert!(Credential::new("").is_none());
        assert!(Credential::new("   ").is_none());
    }

    #[test]
    fn test_credential_trimmed() {
        let credential = Credential::new("  apify_api_abc \n").unwrap();
        assert_eq!(credential.expose(), "apify_api_abc");
    }

    #[test]
    fn test_debug_is_redacted() {
        let credential = Credential::new("secret-token").unwrap();
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains("secret-token"));
        assert_eq!(rendered, "Credential(***)");
    }
}
