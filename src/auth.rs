//! Admin gating. Identity itself lives with an external provider; this crate
//! only asks whether the current session belongs to an authenticated admin.

use tracing::warn;

/// The identity collaborator.
pub trait IdentityProvider: Send + Sync {
    fn is_admin_authenticated(&self) -> bool;
}

/// Proof that an admin session was checked. Required by the summary and
/// export entry points; it can only be obtained through [`AdminCapability::issue`].
#[derive(Debug, Clone)]
pub struct AdminCapability {
    _private: (),
}

impl AdminCapability {
    pub fn issue<P>(provider: &P) -> Option<Self>
    where
        P: IdentityProvider + ?Sized,
    {
        if provider.is_admin_authenticated() {
            Some(Self { _private: () })
        } else {
            warn!("admin capability requested without an authenticated admin session");
            None
        }
    }
}

/// Shared-secret provider for the command line: the presented token must
/// match the configured one, and nothing matches when none is configured.
#[derive(Debug, Clone)]
pub struct TokenIdentity {
    configured: Option<String>,
    presented: Option<String>,
}

impl TokenIdentity {
    pub fn new(configured: Option<String>, presented: Option<String>) -> Self {
        Self {
            configured,
            presented,
        }
    }
}

impl IdentityProvider for TokenIdentity {
    fn is_admin_authenticated(&self) -> bool {
        match (&self.configured, &self.presented) {
            (Some(configured), Some(presented)) => {
                !configured.is_empty() && configured == presented
            }
            _ => false,
        }
    }
}
