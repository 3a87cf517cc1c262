//! Booking lifecycle: creation form, confirmation gate and cancellation.
//!
//! # Creation
//!
//! ```text
//! Idle → FormFilled → AwaitingConfirmation → Submitting → Succeeded
//!                                                      ↘ Failed ─(retry)→ Submitting
//! ```
//!
//! The first submit only opens the confirmation view. The create request is
//! issued once, on explicit confirmation; a second confirmation while
//! `Submitting` is ignored.
//!
//! # Cancellation
//!
//! `Idle → Confirming → Cancelling → Idle`, or `Failed` (prompt kept open
//! for a retry).

use crate::availability::TimeSlot;
use crate::enrichment::{EnrichedBooking, Snapshot};
use crate::error::{DashboardError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use marketplace_api::{
    BookingId, CreateBookingRequest, CustomerId, MarketplaceApi, Provider, ProviderId, Service,
    ServiceId,
};

/// The service and provider a booking form is opened for
///
/// One form implementation serves every screen that offers booking; the
/// screen supplies the context.
#[derive(Clone, Debug, PartialEq)]
pub struct BookingContext {
    /// Service being booked
    pub service: Service,
    /// Provider offering it
    pub provider: Provider,
}

impl BookingContext {
    /// Booked service ID
    #[must_use]
    pub const fn service_id(&self) -> ServiceId {
        self.service.service_id
    }

    /// Booked provider ID
    #[must_use]
    pub const fn provider_id(&self) -> ProviderId {
        self.provider.provider_id
    }
}

/// User input collected by the form
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BookingDraft {
    /// Selected weekday
    pub date: Option<NaiveDate>,
    /// Selected start time
    pub slot: Option<TimeSlot>,
    /// Free-form notes
    pub notes: String,
}

impl BookingDraft {
    /// Date and time combined, once both are chosen
    #[must_use]
    pub fn starts_at(&self) -> Option<NaiveDateTime> {
        Some(self.date?.and_time(self.slot?.time()))
    }
}

/// Creation state machine
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CreationPhase {
    /// Form open, date or time missing
    #[default]
    Idle,
    /// Date and time chosen
    FormFilled,
    /// Confirmation view shown; no request yet
    AwaitingConfirmation,
    /// Create request in flight
    Submitting,
    /// Server accepted the booking
    Succeeded {
        /// Created booking
        booking_id: BookingId,
    },
    /// Server or transport rejected the booking; confirmation may be retried
    Failed {
        /// Why it failed
        error: DashboardError,
    },
}

/// Booking creation form
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BookingForm {
    /// What is being booked
    pub context: Option<BookingContext>,
    /// Collected input
    pub draft: BookingDraft,
    /// Slots offered for the selected date
    pub available_slots: Vec<TimeSlot>,
    /// Where the form is in the creation flow
    pub phase: CreationPhase,
    /// Inline error shown under the form
    pub inline_error: Option<String>,
}

impl BookingForm {
    /// Fresh form for `context`
    #[must_use]
    pub fn open(context: BookingContext) -> Self {
        Self {
            context: Some(context),
            ..Self::default()
        }
    }

    /// Whether a request is in flight
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        matches!(self.phase, CreationPhase::Submitting)
    }

    /// Set the date and its slots; drops a slot the new date does not offer
    pub fn select_date(&mut self, date: NaiveDate, slots: Vec<TimeSlot>) {
        if self.draft.slot.is_some_and(|slot| !slots.contains(&slot)) {
            self.draft.slot = None;
        }
        self.draft.date = Some(date);
        self.available_slots = slots;
        self.refresh_phase();
    }

    /// Set the slot
    ///
    /// # Errors
    ///
    /// `DashboardError::Validation` when the slot is not offered for the date.
    pub fn select_slot(&mut self, slot: TimeSlot) -> Result<()> {
        if !self.available_slots.contains(&slot) {
            return Err(DashboardError::Validation(format!(
                "{slot} is not available on the selected date"
            )));
        }
        self.draft.slot = Some(slot);
        self.refresh_phase();
        Ok(())
    }

    /// Editing invalidates a pending confirmation
    pub fn refresh_phase(&mut self) {
        if self.is_submitting() {
            return;
        }
        self.inline_error = None;
        self.phase = if self.draft.starts_at().is_some() {
            CreationPhase::FormFilled
        } else {
            CreationPhase::Idle
        };
    }

    /// Everything needed to issue the create request
    #[must_use]
    pub fn submission(&self) -> Option<BookingSubmission> {
        Some(BookingSubmission {
            context: self.context.clone()?,
            starts_at: self.draft.starts_at()?,
            notes: self.draft.notes.clone(),
        })
    }
}

/// A confirmed booking request, detached from the form
#[derive(Clone, Debug, PartialEq)]
pub struct BookingSubmission {
    /// What is being booked
    pub context: BookingContext,
    /// Date and slot combined
    pub starts_at: NaiveDateTime,
    /// Notes, possibly empty
    pub notes: String,
}

impl BookingSubmission {
    /// Wire request for `customer_id`
    #[must_use]
    pub fn request(&self, customer_id: CustomerId) -> CreateBookingRequest {
        CreateBookingRequest {
            customer_id,
            service_id: self.context.service_id(),
            provider_id: self.context.provider_id(),
            booking_date: self.starts_at,
            additional_notes: self.notes.trim().to_string(),
        }
    }

    /// Issue the create request and enrich the result from the context
    ///
    /// The status of the returned booking is whatever the server assigned.
    ///
    /// # Errors
    ///
    /// `DashboardError::Request` when the server or transport rejects it.
    pub async fn submit(self, api: &dyn MarketplaceApi, customer_id: CustomerId) -> Result<EnrichedBooking> {
        let booking = api
            .create_booking(self.request(customer_id))
            .await
            .map_err(DashboardError::Request)?;

        tracing::info!(
            booking_id = %booking.booking_id,
            status = %booking.status,
            "Booking created"
        );

        Ok(EnrichedBooking {
            booking,
            service: Snapshot::Loaded(self.context.service),
            provider: Snapshot::Loaded(self.context.provider),
            customer_name: None,
            review: None,
        })
    }
}

/// Cancellation prompt state
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CancellationPhase {
    /// No prompt
    #[default]
    Idle,
    /// Prompt open for a booking
    Confirming {
        /// Booking to cancel
        booking_id: BookingId,
    },
    /// Request in flight
    Cancelling {
        /// Booking being cancelled
        booking_id: BookingId,
    },
    /// Request failed; prompt still open
    Failed {
        /// Booking that was not cancelled
        booking_id: BookingId,
        /// Why it failed
        error: DashboardError,
    },
}

impl CancellationPhase {
    /// Booking the prompt is about
    #[must_use]
    pub const fn booking_id(&self) -> Option<BookingId> {
        match self {
            Self::Idle => None,
            Self::Confirming { booking_id }
            | Self::Cancelling { booking_id }
            | Self::Failed { booking_id, .. } => Some(*booking_id),
        }
    }
}
