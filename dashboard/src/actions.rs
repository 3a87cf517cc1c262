//! Dashboard actions.
//!
//! Every input to the dashboard reducer: user intents, plus the results that
//! effects feed back once a request settles.

use crate::availability::TimeSlot;
use crate::enrichment::EnrichedBooking;
use crate::error::DashboardError;
use crate::identity::{AccountIdentity, Role};
use crate::lifecycle::BookingContext;
use chrono::NaiveDate;
use marketplace_api::{Booking, BookingId, BookingStatus, ProviderId, Review};

/// Dashboard action
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardAction {
    // ═══════════════════════════════════════════════════════════════════════
    // Session
    // ═══════════════════════════════════════════════════════════════════════
    /// Sign in with an email and role, then load the dashboard
    ///
    /// Signing in as a different user clears every session cache.
    SignIn {
        /// Account email
        email: String,
        /// Requested role
        role: Role,
    },

    /// (Re)load identity, bookings and statistics for the signed-in user
    LoadDashboard,

    /// A load finished
    DashboardLoaded {
        /// Load the result belongs to; stale results are dropped
        generation: u64,
        /// Resolved account
        identity: AccountIdentity,
        /// Enriched bookings, server order
        bookings: Vec<EnrichedBooking>,
        /// Non-fatal problems
        warnings: Vec<DashboardError>,
    },

    /// A load failed
    DashboardLoadFailed {
        /// Load the result belongs to
        generation: u64,
        /// Why
        error: DashboardError,
    },

    /// Sign out: abort in-flight requests, clear caches and state
    SignOut,

    /// Hide the page banner
    DismissBanner,

    /// Hide a toast
    DismissToast {
        /// Toast to hide
        id: u64,
    },

    /// Fetch the services a provider offers
    LoadCatalog {
        /// Provider to browse
        provider_id: ProviderId,
    },

    /// Catalog fetched
    CatalogLoaded {
        /// Provider browsed
        provider_id: ProviderId,
        /// One context per service
        contexts: Vec<BookingContext>,
    },

    /// Catalog fetch failed
    CatalogLoadFailed {
        /// Provider browsed
        provider_id: ProviderId,
        /// Why
        error: DashboardError,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Booking creation
    // ═══════════════════════════════════════════════════════════════════════
    /// Open the booking form for a service
    OpenBookingForm {
        /// What to book
        context: BookingContext,
    },

    /// Close the booking form
    CloseBookingForm,

    /// Pick a date; weekends move to the next Monday
    SelectDate {
        /// Chosen date
        date: NaiveDate,
    },

    /// Pick a start time
    SelectSlot {
        /// Chosen slot
        slot: TimeSlot,
    },

    /// Edit the notes
    SetNotes {
        /// Notes as typed
        notes: String,
    },

    /// First submit: show the confirmation view
    SubmitBooking,

    /// Leave the confirmation view without submitting
    BackToForm,

    /// Explicit confirmation: issue the create request
    ConfirmBooking,

    /// Create request succeeded
    BookingCreated {
        /// New booking, enriched from the form context
        booking: EnrichedBooking,
    },

    /// Create request failed
    BookingCreationFailed {
        /// Why
        error: DashboardError,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Status changes
    // ═══════════════════════════════════════════════════════════════════════
    /// Open the cancellation prompt
    RequestCancellation {
        /// Booking to cancel
        booking_id: BookingId,
    },

    /// Close the cancellation prompt
    DismissCancellation,

    /// Confirm the cancellation prompt
    ConfirmCancellation,

    /// Server cancelled the booking
    BookingCancelled {
        /// Booking as returned by the server
        booking: Booking,
    },

    /// Cancellation request failed
    CancellationFailed {
        /// Booking that was not cancelled
        booking_id: BookingId,
        /// Why
        error: DashboardError,
    },

    /// Provider moves a booking along its lifecycle
    UpdateStatus {
        /// Booking to update
        booking_id: BookingId,
        /// Target status
        status: BookingStatus,
    },

    /// Status update succeeded
    StatusUpdated {
        /// Booking as returned by the server
        booking: Booking,
    },

    /// Status update failed
    StatusUpdateFailed {
        /// Booking that was not updated
        booking_id: BookingId,
        /// Why
        error: DashboardError,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Reviews
    // ═══════════════════════════════════════════════════════════════════════
    /// Open the review form for a completed booking
    OpenReview {
        /// Booking to review
        booking_id: BookingId,
    },

    /// Pick a rating
    SetReviewRating {
        /// Stars, 1 to 5
        rating: u8,
    },

    /// Edit the comment
    SetReviewComment {
        /// Comment as typed
        comment: String,
    },

    /// Submit the review
    SubmitReview,

    /// Close the review form
    CloseReview,

    /// Review stored
    ReviewSubmitted {
        /// Stored review
        review: Review,
    },

    /// Review submission failed
    ReviewFailed {
        /// Why
        error: DashboardError,
    },
}
