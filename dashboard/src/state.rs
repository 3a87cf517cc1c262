//! Dashboard state.

use crate::enrichment::EnrichedBooking;
use crate::identity::{AccountIdentity, Role};
use crate::lifecycle::{BookingContext, BookingForm, CancellationPhase};
use crate::notifications::{Banner, Notifications, PageStatus};
use crate::review::ReviewForm;
use crate::stats::{StatisticsSnapshot, compute_stats};
use chrono::NaiveDate;
use marketplace_api::BookingId;
use std::collections::HashSet;

/// The user who signed in, before their account is resolved
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedInUser {
    /// Account email
    pub email: String,
    /// Requested role
    pub role: Role,
}

/// Everything the dashboard screen renders
#[derive(Clone, Debug, Default)]
pub struct DashboardState {
    /// Signed-in user, if any
    pub user: Option<SignedInUser>,
    /// Resolved account, once loaded
    pub identity: Option<AccountIdentity>,
    /// Enriched bookings, server order
    pub bookings: Vec<EnrichedBooking>,
    /// Derived statistics; always computed from `bookings`
    pub stats: StatisticsSnapshot,
    /// Page loading state
    pub status: PageStatus,
    /// Dismissible page-level error
    pub banner: Option<Banner>,
    /// Toasts
    pub notifications: Notifications,
    /// Services offered by the provider being browsed
    pub catalog: Vec<BookingContext>,
    /// Booking creation form
    pub form: BookingForm,
    /// Cancellation prompt
    pub cancellation: CancellationPhase,
    /// Bookings with a provider status update in flight
    pub status_updates: HashSet<BookingId>,
    /// Review form
    pub review: ReviewForm,
    /// Incremented on every load and sign-out; older results are stale
    pub generation: u64,
}

impl DashboardState {
    /// Booking by ID
    #[must_use]
    pub fn booking(&self, booking_id: BookingId) -> Option<&EnrichedBooking> {
        self.bookings.iter().find(|booking| booking.id() == booking_id)
    }

    /// Mutable booking by ID
    pub fn booking_mut(&mut self, booking_id: BookingId) -> Option<&mut EnrichedBooking> {
        self.bookings.iter_mut().find(|booking| booking.id() == booking_id)
    }

    /// Bookings sorted by date, newest first
    #[must_use]
    pub fn bookings_newest_first(&self) -> Vec<&EnrichedBooking> {
        let mut bookings: Vec<&EnrichedBooking> = self.bookings.iter().collect();
        bookings.sort_by(|a, b| b.booking.booking_date.cmp(&a.booking.booking_date));
        bookings
    }

    /// Recompute statistics from the current collection
    pub fn recompute_stats(&mut self, today: NaiveDate) {
        self.stats = compute_stats(&self.bookings, today);
    }

    /// Role of the signed-in user
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|user| user.role)
    }
}
