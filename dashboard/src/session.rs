//! Session-scoped caches and in-flight request tracking.
//!
//! A [`SessionStore`] lives from sign-in to sign-out. Its caches are written
//! by many concurrent fetch completions, so every write merges a single entry
//! into the existing map; nothing ever replaces a whole map. Clearing the
//! store aborts every request started through [`SessionStore::run`].

use crate::identity::{AccountIdentity, Role};
use futures::future::{AbortHandle, Abortable};
use marketplace_api::{CustomerId, Provider, ProviderId, Service, ServiceId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

type IdentityKey = (String, Role);

fn identity_key(email: &str, role: Role) -> IdentityKey {
    (email.trim().to_ascii_lowercase(), role)
}

/// Entry counts, for logging and tests
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheSizes {
    /// Resolved identities
    pub identities: usize,
    /// Customer display names
    pub customer_names: usize,
    /// Service snapshots
    pub services: usize,
    /// Provider snapshots
    pub providers: usize,
}

/// Session-lifetime caches plus the registry of abortable requests
#[derive(Debug, Default)]
pub struct SessionStore {
    identities: RwLock<HashMap<IdentityKey, AccountIdentity>>,
    customer_names: RwLock<HashMap<CustomerId, String>>,
    services: RwLock<HashMap<ServiceId, Service>>,
    providers: RwLock<HashMap<ProviderId, Provider>>,
    in_flight: Mutex<HashMap<u64, AbortHandle>>,
    next_request: AtomicU64,
}

fn read<K, V>(map: &RwLock<HashMap<K, V>>, key: &K) -> Option<V>
where
    K: Eq + std::hash::Hash,
    V: Clone,
{
    map.read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(key)
        .cloned()
}

fn merge<K, V>(map: &RwLock<HashMap<K, V>>, key: K, value: V)
where
    K: Eq + std::hash::Hash,
{
    map.write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(key, value);
}

fn len<K, V>(map: &RwLock<HashMap<K, V>>) -> usize {
    map.read().unwrap_or_else(PoisonError::into_inner).len()
}

impl SessionStore {
    /// Create an empty session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached identity for `(email, role)`; email matching ignores case
    #[must_use]
    pub fn identity(&self, email: &str, role: Role) -> Option<AccountIdentity> {
        read(&self.identities, &identity_key(email, role))
    }

    /// Remember a resolved identity
    pub fn remember_identity(&self, identity: AccountIdentity) {
        let key = identity_key(&identity.email, identity.role());
        merge(&self.identities, key, identity);
    }

    /// Cached display name of a customer
    #[must_use]
    pub fn customer_name(&self, customer_id: CustomerId) -> Option<String> {
        read(&self.customer_names, &customer_id)
    }

    /// Remember a customer display name
    pub fn remember_customer_name(&self, customer_id: CustomerId, name: String) {
        merge(&self.customer_names, customer_id, name);
    }

    /// Cached service snapshot
    #[must_use]
    pub fn service(&self, service_id: ServiceId) -> Option<Service> {
        read(&self.services, &service_id)
    }

    /// Remember a service snapshot
    pub fn remember_service(&self, service: Service) {
        merge(&self.services, service.service_id, service);
    }

    /// Cached provider snapshot
    #[must_use]
    pub fn provider(&self, provider_id: ProviderId) -> Option<Provider> {
        read(&self.providers, &provider_id)
    }

    /// Remember a provider snapshot
    pub fn remember_provider(&self, provider: Provider) {
        merge(&self.providers, provider.provider_id, provider);
    }

    /// Current cache sizes
    #[must_use]
    pub fn sizes(&self) -> CacheSizes {
        CacheSizes {
            identities: len(&self.identities),
            customer_names: len(&self.customer_names),
            services: len(&self.services),
            providers: len(&self.providers),
        }
    }

    /// Number of requests started through [`run`](Self::run) that have not finished
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Run `future` as part of this session
    ///
    /// Returns `None` when the session is cleared before the future finishes;
    /// the future is dropped at its next suspension point.
    pub async fn run<F, T>(&self, future: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let (handle, registration) = AbortHandle::new_pair();
        let id = self.next_request.fetch_add(1, Ordering::Relaxed);
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, handle);

        let outcome = Abortable::new(future, registration).await;

        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);

        if outcome.is_err() {
            tracing::debug!(request = id, "Request aborted by session clear");
        }
        outcome.ok()
    }

    /// Abort in-flight requests and empty every cache
    pub fn clear(&self) {
        let aborted: Vec<AbortHandle> = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, handle)| handle)
            .collect();
        for handle in &aborted {
            handle.abort();
        }

        self.identities.write().unwrap_or_else(PoisonError::into_inner).clear();
        self.customer_names.write().unwrap_or_else(PoisonError::into_inner).clear();
        self.services.write().unwrap_or_else(PoisonError::into_inner).clear();
        self.providers.write().unwrap_or_else(PoisonError::into_inner).clear();

        tracing::debug!(aborted = aborted.len(), "Session cleared");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use crate::identity::AccountId;
    use marketplace_api::UserId;
    use std::sync::Arc;
    use std::time::Duration;

    fn service(id: i64, name: &str) -> Service {
        Service {
            service_id: ServiceId(id),
            provider_id: Some(ProviderId(7)),
            name: name.to_string(),
            description: String::new(),
            price: 50.0,
            duration: 60,
        }
    }

    #[test]
    fn test_identity_lookup_ignores_email_case() {
        let session = SessionStore::new();
        session.remember_identity(AccountIdentity {
            email: "Ada@Example.com".to_string(),
            user_id: UserId(5),
            account: AccountId::Customer(CustomerId(12)),
        });

        assert!(session.identity("ada@example.com", Role::Customer).is_some());
        assert!(session.identity("ada@example.com", Role::Provider).is_none());
    }

    #[tokio::test]
    async fn test_concurrent_writes_merge() {
        let session = Arc::new(SessionStore::new());

        let writers = (1..=20).map(|id| {
            let session = Arc::clone(&session);
            tokio::spawn(async move {
                session.remember_service(service(id, "Cut"));
                session.remember_customer_name(CustomerId(id), format!("Customer {id}"));
            })
        });
        for writer in writers {
            writer.await.unwrap();
        }

        let sizes = session.sizes();
        assert_eq!(sizes.services, 20);
        assert_eq!(sizes.customer_names, 20);
    }

    #[tokio::test]
    async fn test_clear_aborts_in_flight_requests() {
        let session = Arc::new(SessionStore::new());

        let pending = {
            let session = Arc::clone(&session);
            tokio::spawn(async move {
                session
                    .run(async {
                        tokio::time::sleep(Duration::from_secs(30)).await;
                        "finished"
                    })
                    .await
            })
        };

        while session.in_flight() == 0 {
            tokio::task::yield_now().await;
        }
        session.remember_service(service(3, "Trim"));
        session.clear();

        assert_eq!(pending.await.unwrap(), None);
        assert_eq!(session.in_flight(), 0);
        assert_eq!(session.sizes(), CacheSizes::default());
    }

    #[tokio::test]
    async fn test_run_returns_output() {
        let session = SessionStore::new();
        assert_eq!(session.run(async { 42 }).await, Some(42));
        assert_eq!(session.in_flight(), 0);
    }
}
