//! Identity resolution: email → role-scoped account ID.
//!
//! Resolution is two strictly sequential lookups (user by email, then the
//! role account by user ID) and is cached in the [`SessionStore`] for the
//! lifetime of the session.

use crate::error::{DashboardError, Result};
use crate::session::SessionStore;
use marketplace_api::{ApiError, CustomerId, MarketplaceApi, ProviderId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::instrument;

/// Which dashboard the signed-in account uses
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Books services
    Customer,
    /// Offers services (vendor)
    Provider,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Customer => f.write_str("customer"),
            Self::Provider => f.write_str("provider"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(Self::Customer),
            "provider" | "vendor" => Ok(Self::Provider),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Role-scoped account ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccountId {
    /// A customer account
    Customer(CustomerId),
    /// A provider account
    Provider(ProviderId),
}

/// A resolved account: who is signed in and under which role account
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountIdentity {
    /// Email used to sign in
    pub email: String,
    /// User ID behind the email
    pub user_id: UserId,
    /// Role account resolved from the user ID
    pub account: AccountId,
}

impl AccountIdentity {
    /// Role of the resolved account
    #[must_use]
    pub const fn role(&self) -> Role {
        match self.account {
            AccountId::Customer(_) => Role::Customer,
            AccountId::Provider(_) => Role::Provider,
        }
    }

    /// Customer ID, when this is a customer identity
    #[must_use]
    pub const fn customer_id(&self) -> Option<CustomerId> {
        match self.account {
            AccountId::Customer(id) => Some(id),
            AccountId::Provider(_) => None,
        }
    }

    /// Provider ID, when this is a provider identity
    #[must_use]
    pub const fn provider_id(&self) -> Option<ProviderId> {
        match self.account {
            AccountId::Provider(id) => Some(id),
            AccountId::Customer(_) => None,
        }
    }
}

/// Maps a signed-in email to its role account, caching per session
#[derive(Clone)]
pub struct IdentityResolver {
    api: Arc<dyn MarketplaceApi>,
    session: Arc<SessionStore>,
}

impl IdentityResolver {
    /// Create a resolver backed by `api` and caching into `session`
    #[must_use]
    pub fn new(api: Arc<dyn MarketplaceApi>, session: Arc<SessionStore>) -> Self {
        Self { api, session }
    }

    /// Resolve `(email, role)` to an account identity
    ///
    /// The session cache is consulted before any request is made.
    ///
    /// # Errors
    ///
    /// - `DashboardError::IdentityNotFound` when either lookup finds no record
    /// - `DashboardError::IdentityLookup` for any other API failure
    #[instrument(skip(self))]
    pub async fn resolve(&self, email: &str, role: Role) -> Result<AccountIdentity> {
        if let Some(identity) = self.session.identity(email, role) {
            tracing::debug!(user_id = %identity.user_id, "Identity served from session cache");
            return Ok(identity);
        }

        let not_found = |error: ApiError| {
            if error.is_not_found() {
                DashboardError::IdentityNotFound {
                    email: email.to_string(),
                    role,
                }
            } else {
                DashboardError::IdentityLookup(error)
            }
        };

        let user = self.api.user_by_email(email).await.map_err(not_found)?;

        // The role lookup is keyed by the user ID, so it cannot start earlier.
        let account = match role {
            Role::Customer => self
                .api
                .customer_by_user(user.user_id)
                .await
                .map(|customer| AccountId::Customer(customer.customer_id)),
            Role::Provider => self
                .api
                .provider_by_user(user.user_id)
                .await
                .map(|provider| {
                    let provider_id = provider.provider_id;
                    self.session.remember_provider(provider);
                    AccountId::Provider(provider_id)
                }),
        }
        .map_err(not_found)?;

        let identity = AccountIdentity {
            email: email.to_string(),
            user_id: user.user_id,
            account,
        };
        self.session.remember_identity(identity.clone());

        tracing::info!(user_id = %identity.user_id, ?account, "Identity resolved");
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!("Customer".parse::<Role>(), Ok(Role::Customer));
        assert_eq!("vendor".parse::<Role>(), Ok(Role::Provider));
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_identity_accessors() {
        let identity = AccountIdentity {
            email: "shop@example.com".to_string(),
            user_id: UserId(9),
            account: AccountId::Provider(ProviderId(7)),
        };

        assert_eq!(identity.role(), Role::Provider);
        assert_eq!(identity.provider_id(), Some(ProviderId(7)));
        assert_eq!(identity.customer_id(), None);
    }
}
