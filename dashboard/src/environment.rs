//! Dashboard environment.
//!
//! Dependencies injected into the reducer. Everything is behind a trait or an
//! `Arc` so tests can swap in the in-memory API and a fixed clock.

use crate::aggregator::BookingAggregator;
use crate::availability::{Availability, SimulatedAvailability};
use crate::enrichment::Enricher;
use crate::identity::IdentityResolver;
use crate::session::SessionStore;
use chrono::NaiveDate;
use marketplace_api::MarketplaceApi;
use marketplace_core::environment::Clock;
use std::sync::Arc;
use std::time::Duration;

/// Default lifetime of a toast
pub const DEFAULT_TOAST_TTL: Duration = Duration::from_secs(5);

/// Dashboard environment
#[derive(Clone)]
pub struct DashboardEnvironment {
    /// Marketplace REST API
    pub api: Arc<dyn MarketplaceApi>,
    /// Per-session caches and in-flight requests
    pub session: Arc<SessionStore>,
    /// Source of "today"
    pub clock: Arc<dyn Clock>,
    /// Bookable slots per date
    pub availability: Arc<dyn Availability>,
    /// How long toasts stay visible; `None` keeps them until dismissed
    pub toast_ttl: Option<Duration>,
}

impl DashboardEnvironment {
    /// Environment with a fresh session, simulated availability and
    /// [`DEFAULT_TOAST_TTL`]
    #[must_use]
    pub fn new(api: Arc<dyn MarketplaceApi>, clock: Arc<dyn Clock>) -> Self {
        Self {
            api,
            session: Arc::new(SessionStore::new()),
            clock,
            availability: Arc::new(SimulatedAvailability),
            toast_ttl: Some(DEFAULT_TOAST_TTL),
        }
    }

    /// Replace the availability source
    #[must_use]
    pub fn with_availability(mut self, availability: Arc<dyn Availability>) -> Self {
        self.availability = availability;
        self
    }

    /// Replace the toast lifetime
    #[must_use]
    pub fn with_toast_ttl(mut self, toast_ttl: Option<Duration>) -> Self {
        self.toast_ttl = toast_ttl;
        self
    }

    /// Identity resolver sharing this environment's session
    #[must_use]
    pub fn resolver(&self) -> IdentityResolver {
        IdentityResolver::new(Arc::clone(&self.api), Arc::clone(&self.session))
    }

    /// Enricher sharing this environment's session
    #[must_use]
    pub fn enricher(&self) -> Enricher {
        Enricher::new(Arc::clone(&self.api), Arc::clone(&self.session))
    }

    /// Aggregator sharing this environment's session
    #[must_use]
    pub fn aggregator(&self) -> BookingAggregator {
        BookingAggregator::new(Arc::clone(&self.api), self.enricher())
    }

    /// Current calendar date
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }
}
