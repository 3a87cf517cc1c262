//! Enrichment: joining a raw booking with its service, provider and review.
//!
//! Each sub-fetch is isolated. A failure produces a [`Snapshot::Unavailable`]
//! carrying the typed error, and the display accessors on
//! [`EnrichedBooking`] apply the placeholder policy in [`fallback`].

use crate::identity::{AccountIdentity, AccountId};
use crate::session::SessionStore;
use marketplace_api::{
    ApiError, ApiResult, Booking, BookingId, BookingStatus, CustomerId, MarketplaceApi, Provider,
    ProviderId, Review, Service, ServiceId,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

/// Placeholder values shown when a snapshot is unavailable
pub mod fallback {
    use marketplace_api::{CustomerId, ProviderId, ServiceId};

    /// Location shown when the provider or its location is unknown
    pub const UNKNOWN_LOCATION: &str = "Unknown Location";

    /// `"Service #<id>"`
    #[must_use]
    pub fn service_name(service_id: ServiceId) -> String {
        format!("Service #{service_id}")
    }

    /// `"Provider #<id>"`
    #[must_use]
    pub fn provider_name(provider_id: ProviderId) -> String {
        format!("Provider #{provider_id}")
    }

    /// `"Customer #<id>"`
    #[must_use]
    pub fn customer_name(customer_id: CustomerId) -> String {
        format!("Customer #{customer_id}")
    }
}

/// Outcome of one enrichment sub-fetch
#[derive(Clone, Debug, PartialEq)]
pub enum Snapshot<T> {
    /// Fetched (or served from the session cache)
    Loaded(T),
    /// The fetch failed; the reason is kept for diagnostics
    Unavailable {
        /// Why the fetch failed
        reason: ApiError,
    },
}

impl<T> Snapshot<T> {
    /// The loaded value, if any
    #[must_use]
    pub const fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            Self::Unavailable { .. } => None,
        }
    }

    /// Whether the value was fetched
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

impl<T> From<ApiResult<T>> for Snapshot<T> {
    fn from(result: ApiResult<T>) -> Self {
        match result {
            Ok(value) => Self::Loaded(value),
            Err(reason) => Self::Unavailable { reason },
        }
    }
}

/// A booking joined with its service, provider and review
///
/// Rebuilt on every load, patched in place after local mutations.
#[derive(Clone, Debug, PartialEq)]
pub struct EnrichedBooking {
    /// Raw booking as returned by the server
    pub booking: Booking,
    /// Booked service
    pub service: Snapshot<Service>,
    /// Booked provider
    pub provider: Snapshot<Provider>,
    /// Customer display name, fetched only for the provider dashboard
    pub customer_name: Option<Snapshot<String>>,
    /// The customer's review of this booking, if one exists
    pub review: Option<Review>,
}

impl EnrichedBooking {
    /// Booking ID
    #[must_use]
    pub const fn id(&self) -> BookingId {
        self.booking.booking_id
    }

    /// Current status
    #[must_use]
    pub const fn status(&self) -> BookingStatus {
        self.booking.status
    }

    /// Whether the customer already reviewed this booking
    #[must_use]
    pub const fn has_review(&self) -> bool {
        self.review.is_some()
    }

    /// Service name or `"Service #<id>"`
    #[must_use]
    pub fn service_name(&self) -> String {
        self.service.loaded().map_or_else(
            || fallback::service_name(self.booking.service_id),
            |service| service.name.clone(),
        )
    }

    /// Service price, when the service is known
    #[must_use]
    pub fn price(&self) -> Option<f64> {
        self.service.loaded().map(|service| service.price)
    }

    /// Business name or `"Provider #<id>"`
    #[must_use]
    pub fn provider_name(&self) -> String {
        self.provider.loaded().map_or_else(
            || fallback::provider_name(self.booking.provider_id),
            |provider| provider.business_name.clone(),
        )
    }

    /// Provider location or `"Unknown Location"`
    #[must_use]
    pub fn location(&self) -> String {
        self.provider
            .loaded()
            .and_then(|provider| provider.location.as_deref())
            .filter(|location| !location.trim().is_empty())
            .unwrap_or(fallback::UNKNOWN_LOCATION)
            .to_string()
    }

    /// Customer display name or `"Customer #<id>"`
    #[must_use]
    pub fn customer_display_name(&self) -> String {
        self.customer_name
            .as_ref()
            .and_then(Snapshot::loaded)
            .cloned()
            .unwrap_or_else(|| fallback::customer_name(self.booking.customer_id))
    }

    /// Whether any sub-fetch failed
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.service.is_loaded()
            || !self.provider.is_loaded()
            || self
                .customer_name
                .as_ref()
                .is_some_and(|name| !name.is_loaded())
    }
}

/// Reviews indexed by booking and reviewer, restricted to the signed-in account
#[derive(Clone, Debug, Default)]
pub struct ReviewIndex {
    by_booking: HashMap<(BookingId, CustomerId), Review>,
}

impl ReviewIndex {
    /// Index reviews visible to `identity`
    ///
    /// A customer only sees reviews they wrote. A provider sees every review
    /// of their bookings; [`lookup`](Self::lookup) still requires the
    /// reviewer to be the booking's customer.
    #[must_use]
    pub fn new(reviews: Vec<Review>, identity: &AccountIdentity) -> Self {
        let by_booking = reviews
            .into_iter()
            .filter(|review| match identity.account {
                AccountId::Customer(customer_id) => review.customer_id == customer_id,
                AccountId::Provider(_) => true,
            })
            .map(|review| ((review.booking_id, review.customer_id), review))
            .collect();
        Self { by_booking }
    }

    /// Review for `booking` written by the booking's customer
    #[must_use]
    pub fn lookup(&self, booking: &Booking) -> Option<Review> {
        self.by_booking
            .get(&(booking.booking_id, booking.customer_id))
            .cloned()
    }

    /// Number of indexed reviews
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_booking.len()
    }

    /// Whether no reviews are indexed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_booking.is_empty()
    }
}

/// Fetches the snapshots a booking references, through the session caches
#[derive(Clone)]
pub struct Enricher {
    api: Arc<dyn MarketplaceApi>,
    session: Arc<SessionStore>,
}

impl Enricher {
    /// Create an enricher backed by `api` and caching into `session`
    #[must_use]
    pub fn new(api: Arc<dyn MarketplaceApi>, session: Arc<SessionStore>) -> Self {
        Self { api, session }
    }

    /// Enrich one booking
    ///
    /// Service, provider and (when `with_customer_name`) customer name are
    /// fetched concurrently; none of them can fail the enrichment.
    #[instrument(skip(self, booking, reviews), fields(booking_id = %booking.booking_id))]
    pub async fn enrich(
        &self,
        booking: Booking,
        reviews: &ReviewIndex,
        with_customer_name: bool,
    ) -> EnrichedBooking {
        let customer_name = async {
            if with_customer_name {
                Some(self.customer_name(booking.customer_id).await)
            } else {
                None
            }
        };

        let (service, provider, customer_name) = tokio::join!(
            self.service(booking.service_id),
            self.provider(booking.provider_id),
            customer_name,
        );

        let enriched = EnrichedBooking {
            review: reviews.lookup(&booking),
            booking,
            service,
            provider,
            customer_name,
        };

        if enriched.is_degraded() {
            tracing::warn!("Booking enriched with placeholders");
        }
        enriched
    }

    /// Service snapshot, cached per session
    pub async fn service(&self, service_id: ServiceId) -> Snapshot<Service> {
        if let Some(service) = self.session.service(service_id) {
            return Snapshot::Loaded(service);
        }

        let result = self.api.service(service_id).await;
        match &result {
            Ok(service) => self.session.remember_service(service.clone()),
            Err(error) => tracing::warn!(%service_id, %error, "Service lookup failed"),
        }
        result.into()
    }

    /// Provider snapshot, cached per session
    pub async fn provider(&self, provider_id: ProviderId) -> Snapshot<Provider> {
        if let Some(provider) = self.session.provider(provider_id) {
            return Snapshot::Loaded(provider);
        }

        let result = self.api.provider(provider_id).await;
        match &result {
            Ok(provider) => self.session.remember_provider(provider.clone()),
            Err(error) => tracing::warn!(%provider_id, %error, "Provider lookup failed"),
        }
        result.into()
    }

    /// `"<name> <surname>"` of a customer, cached per session
    pub async fn customer_name(&self, customer_id: CustomerId) -> Snapshot<String> {
        if let Some(name) = self.session.customer_name(customer_id) {
            return Snapshot::Loaded(name);
        }

        let result: ApiResult<String> = async {
            let customer = self.api.customer(customer_id).await?;
            let user = self.api.user(customer.user_id).await?;
            Ok(user.display_name())
        }
        .await;

        match result {
            Ok(name) if !name.is_empty() => {
                self.session.remember_customer_name(customer_id, name.clone());
                Snapshot::Loaded(name)
            },
            Ok(_) => Snapshot::Unavailable {
                reason: ApiError::ResponseParseFailed(format!("customer {customer_id} has no name")),
            },
            Err(reason) => {
                tracing::warn!(%customer_id, error = %reason, "Customer name lookup failed");
                Snapshot::Unavailable { reason }
            },
        }
    }
}
