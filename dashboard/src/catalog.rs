//! Service catalog of a provider, as booking contexts.

use crate::error::{DashboardError, Result};
use crate::lifecycle::BookingContext;
use crate::session::SessionStore;
use marketplace_api::{MarketplaceApi, ProviderId};
use tracing::instrument;

/// Fetch a provider and its services
///
/// Each service becomes a [`BookingContext`] that can open the booking form.
/// Fetched snapshots are merged into the session caches.
///
/// # Errors
///
/// `DashboardError::CatalogUnavailable` when the provider or its service
/// list cannot be fetched.
#[instrument(skip(api, session))]
pub async fn load_catalog(
    api: &dyn MarketplaceApi,
    session: &SessionStore,
    provider_id: ProviderId,
) -> Result<Vec<BookingContext>> {
    let cached = session.provider(provider_id);
    let provider = async {
        match cached {
            Some(provider) => Ok(provider),
            None => api.provider(provider_id).await,
        }
    };

    let (provider, services) = tokio::join!(provider, api.provider_services(provider_id));
    let provider = provider.map_err(DashboardError::CatalogUnavailable)?;
    let services = services.map_err(DashboardError::CatalogUnavailable)?;

    session.remember_provider(provider.clone());
    let contexts: Vec<BookingContext> = services
        .into_iter()
        .map(|service| {
            session.remember_service(service.clone());
            BookingContext {
                service,
                provider: provider.clone(),
            }
        })
        .collect();

    tracing::debug!(services = contexts.len(), "Catalog loaded");
    Ok(contexts)
}
