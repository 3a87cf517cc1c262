//! Booking aggregation: raw list → enriched collection.

use crate::enrichment::{EnrichedBooking, Enricher, ReviewIndex};
use crate::error::{DashboardError, Result};
use crate::identity::{AccountId, AccountIdentity};
use futures::future::join_all;
use marketplace_api::MarketplaceApi;
use std::sync::Arc;
use tracing::instrument;

/// Result of one aggregation pass
#[derive(Clone, Debug, PartialEq)]
pub struct AggregatedBookings {
    /// One entry per raw booking, in server order
    pub bookings: Vec<EnrichedBooking>,
    /// Non-fatal problems encountered while aggregating
    pub warnings: Vec<DashboardError>,
}

/// Loads and enriches the bookings of a resolved account
#[derive(Clone)]
pub struct BookingAggregator {
    api: Arc<dyn MarketplaceApi>,
    enricher: Enricher,
}

impl BookingAggregator {
    /// Create an aggregator
    #[must_use]
    pub const fn new(api: Arc<dyn MarketplaceApi>, enricher: Enricher) -> Self {
        Self { api, enricher }
    }

    /// Fetch the account's bookings and reviews, then enrich every booking
    ///
    /// The booking list and review list are fetched concurrently, then one
    /// enrichment per booking runs concurrently. Sorting is left to the caller.
    ///
    /// # Errors
    ///
    /// `DashboardError::BookingsUnavailable` when the raw booking list cannot
    /// be fetched. A failed review fetch or enrichment only degrades the result.
    #[instrument(skip(self, identity), fields(email = %identity.email, account = ?identity.account))]
    pub async fn load(&self, identity: &AccountIdentity) -> Result<AggregatedBookings> {
        let (bookings, reviews) = match identity.account {
            AccountId::Customer(customer_id) => {
                tokio::join!(
                    self.api.customer_bookings(customer_id),
                    self.api.customer_reviews(customer_id),
                )
            },
            AccountId::Provider(provider_id) => {
                tokio::join!(
                    self.api.provider_bookings(provider_id),
                    self.api.provider_reviews(provider_id),
                )
            },
        };

        let bookings = bookings.map_err(|error| {
            tracing::error!(%error, "Booking list unavailable");
            DashboardError::BookingsUnavailable(error)
        })?;

        let mut warnings = Vec::new();
        let reviews = match reviews {
            Ok(reviews) => ReviewIndex::new(reviews, identity),
            Err(error) => {
                tracing::warn!(%error, "Reviews unavailable, review flags default to false");
                warnings.push(DashboardError::ReviewsUnavailable(error));
                ReviewIndex::default()
            },
        };

        let with_customer_name = matches!(identity.account, AccountId::Provider(_));
        let enrichments = bookings
            .into_iter()
            .map(|booking| self.enricher.enrich(booking, &reviews, with_customer_name));
        let bookings = join_all(enrichments).await;

        let degraded = bookings.iter().filter(|booking| booking.is_degraded()).count();
        tracing::debug!(
            count = bookings.len(),
            degraded,
            reviews = reviews.len(),
            "Bookings aggregated"
        );

        Ok(AggregatedBookings { bookings, warnings })
    }
}
