//! Login credential value object.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};

/// Identity/secret pair.
///
/// `Debug` output redacts `secret` so credentials can appear in error chains
/// without leaking it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub identity: String,
    pub secret: String,
}

impl Credential {
    pub fn new(identity: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            secret: secret.into(),
        }
    }

    /// Full equality on both fields.
    ///
    /// Both comparisons always run, so timing does not reveal which field
    /// differed first.
    pub fn matches(&self, other: &Credential) -> bool {
        let identity_ok = self.identity == other.identity;
        let secret_ok = self.secret == other.secret;
        identity_ok & secret_ok
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("identity", &self.identity)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Credential;

    #[test]
    fn matches_requires_both_fields() {
        let reference = Credential::new("ada", "s3cret");
        assert!(reference.matches(&Credential::new("ada", "s3cret")));
        assert!(!reference.matches(&Credential::new("ada", "S3cret")));
        assert!(!reference.matches(&Credential::new("Ada", "s3cret")));
        assert!(!reference.matches(&Credential::new("ad", "s3cret")));
        assert!(!reference.matches(&Credential::new("", "")));
    }

    #[test]
    fn debug_output_redacts_secret() {
        let rendered = format!("{:?}", Credential::new("ada", "hunter2"));
        assert!(rendered.contains("ada"));
        assert!(!rendered.contains("hunter2"));
    }
}
