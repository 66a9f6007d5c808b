//! Identity module - the authenticated user as seen by this layer

use serde::{Deserialize, Serialize};

/// The signed-in worker, as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Stable unique identifier
    pub uid: String,
    /// Display name, when the provider has one
    pub display_name: Option<String>,
    /// Email address, when the provider has one
    pub email: Option<String>,
}

impl UserIdentity {
    /// Create an identity carrying only a uid
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            email: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_carries_uid() {
        let identity = UserIdentity::new("worker-1");
        assert_eq!(identity.uid, "worker-1");
        assert!(identity.display_name.is_none());
    }
}
