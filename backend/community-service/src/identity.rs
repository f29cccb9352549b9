//! Identity provider interface
//!
//! Session handling and CSRF token issuance live outside this crate. The
//! request layer resolves both through an `IdentityProvider` and hands the
//! result to the hub as a `RequestContext`.

use crate::error::AuthorizationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub username: String,
    pub badge: Option<String>,
}

pub trait IdentityProvider {
    fn current_user(&self) -> Option<AuthenticatedUser>;
    fn csrf_valid(&self, token: &str) -> bool;
}

/// Verified caller identity for one request
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub user: Option<AuthenticatedUser>,
    pub csrf_ok: bool,
}

impl RequestContext {
    pub fn from_provider(provider: &dyn IdentityProvider, csrf_token: Option<&str>) -> Self {
        Self {
            user: provider.current_user(),
            csrf_ok: csrf_token.map(|t| provider.csrf_valid(t)).unwrap_or(false),
        }
    }

    /// Anonymous read-only context
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Authenticated context with a verified token
    pub fn trusted(user: AuthenticatedUser) -> Self {
        Self {
            user: Some(user),
            csrf_ok: true,
        }
    }

    pub fn viewer_id(&self) -> Option<Uuid> {
        self.user.as_ref().map(|u| u.id)
    }

    /// Gate for state-changing operations
    pub fn require_mutation(&self) -> Result<&AuthenticatedUser, AuthorizationError> {
        let user = self
            .user
            .as_ref()
            .ok_or(AuthorizationError::Unauthenticated)?;
        if !self.csrf_ok {
            return Err(AuthorizationError::CsrfInvalid);
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubProvider {
        user: Option<AuthenticatedUser>,
        token: &'static str,
    }

    impl IdentityProvider for StubProvider {
        fn current_user(&self) -> Option<AuthenticatedUser> {
            self.user.clone()
        }

        fn csrf_valid(&self, token: &str) -> bool {
            token == self.token
        }
    }

    fn ultra() -> AuthenticatedUser {
        AuthenticatedUser {
            id: Uuid::new_v4(),
            username: "ultra_sud".to_string(),
            badge: None,
        }
    }

    #[test]
    fn test_mutation_requires_user_and_token() {
        let provider = StubProvider {
            user: Some(ultra()),
            token: "t0k",
        };

        let ok = RequestContext::from_provider(&provider, Some("t0k"));
        assert!(ok.require_mutation().is_ok());

        let bad_token = RequestContext::from_provider(&provider, Some("nope"));
        assert_eq!(
            bad_token.require_mutation().unwrap_err(),
            AuthorizationError::CsrfInvalid
        );

        let missing_token = RequestContext::from_provider(&provider, None);
        assert_eq!(
            missing_token.require_mutation().unwrap_err(),
            AuthorizationError::CsrfInvalid
        );
    }

    #[test]
    fn test_anonymous_cannot_mutate() {
        assert_eq!(
            RequestContext::anonymous().require_mutation().unwrap_err(),
            AuthorizationError::Unauthenticated
        );
    }
}
