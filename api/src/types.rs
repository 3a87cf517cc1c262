//! Wire types for the marketplace REST API
//!
//! Field names follow the server's JSON (`bookingID`, `businessName`, ...).
//! Identifiers are wrapped in newtypes so a provider ID cannot be passed where
//! a customer ID is expected.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Raw numeric value
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

id_type!(
    /// Identifier of a user account (shared by customers and providers)
    UserId
);
id_type!(
    /// Identifier of a customer account
    CustomerId
);
id_type!(
    /// Identifier of a provider (vendor) account
    ProviderId
);
id_type!(
    /// Identifier of a bookable service
    ServiceId
);
id_type!(
    /// Identifier of a booking
    BookingId
);
id_type!(
    /// Identifier of a review
    ReviewId
);

/// A user account
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// User ID
    #[serde(rename = "userID")]
    pub user_id: UserId,
    /// Given name
    #[serde(default)]
    pub name: String,
    /// Family name
    #[serde(default)]
    pub surname: String,
    /// Email address
    #[serde(default)]
    pub email: String,
    /// Phone number
    #[serde(rename = "phoneNumber", default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

impl User {
    /// `"<name> <surname>"`, trimmed
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.name, self.surname).trim().to_string()
    }
}

/// A customer account linked to a user
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Customer {
    /// Customer ID
    #[serde(rename = "customerID")]
    pub customer_id: CustomerId,
    /// Owning user
    #[serde(rename = "userID")]
    pub user_id: UserId,
}

/// A provider (vendor) account
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    /// Provider ID
    #[serde(rename = "providerID")]
    pub provider_id: ProviderId,
    /// Owning user
    #[serde(rename = "userID", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    /// Public business name
    #[serde(default)]
    pub business_name: String,
    /// Free-form location
    #[serde(default)]
    pub location: Option<String>,
    /// Contact phone number
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Average rating, when the provider has been rated
    #[serde(default)]
    pub rating: Option<f64>,
    /// Whether the marketplace verified this provider
    #[serde(default)]
    pub verified: bool,
}

/// A bookable service offered by a provider
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Service {
    /// Service ID
    #[serde(rename = "serviceID")]
    pub service_id: ServiceId,
    /// Offering provider
    #[serde(rename = "providerID", default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<ProviderId>,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Long description
    #[serde(default)]
    pub description: String,
    /// Price in the marketplace currency
    #[serde(default)]
    pub price: f64,
    /// Duration in minutes
    #[serde(default)]
    pub duration: u32,
}

/// Booking status as stored by the server
///
/// Transitions are monotone: `PENDING → CONFIRMED → COMPLETED`, or
/// `PENDING | CONFIRMED → CANCELLED`. Nothing leaves `COMPLETED` or `CANCELLED`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Awaiting provider confirmation
    Pending,
    /// Accepted by the provider
    Confirmed,
    /// Service delivered
    Completed,
    /// Cancelled by either party
    Cancelled,
}

impl BookingStatus {
    /// Pending or confirmed
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Completed or cancelled
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether moving from `self` to `next` respects the monotone lifecycle
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        !self.is_terminal()
            && matches!(
                (self, next),
                (Self::Pending, Self::Confirmed)
                    | (Self::Confirmed, Self::Completed)
                    | (Self::Pending | Self::Confirmed, Self::Cancelled)
            )
    }

    /// Wire representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(format!("unknown booking status: {other}")),
        }
    }
}

/// A booking as returned by the server
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Booking ID
    #[serde(rename = "bookingID")]
    pub booking_id: BookingId,
    /// Booking customer
    #[serde(rename = "customerID")]
    pub customer_id: CustomerId,
    /// Booked provider
    #[serde(rename = "providerID")]
    pub provider_id: ProviderId,
    /// Booked service
    #[serde(rename = "serviceID")]
    pub service_id: ServiceId,
    /// Start of the appointment (local wall-clock time)
    #[serde(with = "wire_datetime")]
    pub booking_date: NaiveDateTime,
    /// Current status
    pub status: BookingStatus,
    /// Notes left by the customer
    #[serde(default)]
    pub additional_notes: Option<String>,
}

/// A review left by a customer for a booking
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Review ID
    #[serde(rename = "reviewID")]
    pub review_id: ReviewId,
    /// Reviewed booking
    #[serde(rename = "bookingID")]
    pub booking_id: BookingId,
    /// Reviewing customer
    #[serde(rename = "customerID")]
    pub customer_id: CustomerId,
    /// Rating between 1 and 5
    pub rating: u8,
    /// Free-form comment
    #[serde(default)]
    pub comment: String,
    /// Creation time, when the server reports one
    #[serde(default, with = "wire_datetime::option")]
    pub created_at: Option<NaiveDateTime>,
}

/// Body of `POST /v1/bookings/customer`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    /// Booking customer
    #[serde(rename = "customerID")]
    pub customer_id: CustomerId,
    /// Booked service
    #[serde(rename = "serviceID")]
    pub service_id: ServiceId,
    /// Booked provider
    #[serde(rename = "providerID")]
    pub provider_id: ProviderId,
    /// Start of the appointment, sent as `YYYY-MM-DDTHH:MM:SS`
    #[serde(with = "wire_datetime")]
    pub booking_date: NaiveDateTime,
    /// Notes, empty string when none
    pub additional_notes: String,
}

/// Body of `PUT /v1/bookings/status/{bookingID}`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    /// Requested status
    pub new_status: BookingStatus,
}

/// Body of `POST /v1/reviews/customer`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateReviewRequest {
    /// Reviewing customer
    #[serde(rename = "customerID")]
    pub customer_id: CustomerId,
    /// Reviewed booking
    #[serde(rename = "bookingID")]
    pub booking_id: BookingId,
    /// Rating between 1 and 5
    pub rating: u8,
    /// Comment, never empty
    pub comment: String,
}

/// `YYYY-MM-DDTHH:MM:SS` on the way out, tolerant on the way in
///
/// The server stores wall-clock times without a zone but some deployments
/// append fractional seconds or an offset; both are accepted and the offset
/// is dropped.
pub mod wire_datetime {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Format used for every outgoing timestamp
    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    /// Parse a server timestamp
    ///
    /// # Errors
    ///
    /// Returns the input back when no accepted format matches.
    pub fn parse(raw: &str) -> Result<NaiveDateTime, String> {
        let raw = raw.trim();
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.naive_local()))
            .map_err(|_| format!("invalid timestamp: {raw}"))
    }

    /// Serialize with [`FORMAT`]
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    /// Deserialize with [`parse`]
    ///
    /// # Errors
    ///
    /// Fails when the string matches no accepted format.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    /// Optional variant
    pub mod option {
        use chrono::NaiveDateTime;
        use serde::{Deserialize, Deserializer, Serializer};

        /// Serialize `Some` with the wire format, `None` as null
        ///
        /// # Errors
        ///
        /// Propagates serializer errors.
        #[allow(clippy::ref_option)] // Signature required by serde(with)
        pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(value) => super::serialize(value, serializer),
                None => serializer.serialize_none(),
            }
        }

        /// Null, missing, and unparseable values all become `None`
        ///
        /// # Errors
        ///
        /// Fails only when the value is neither a string nor null.
        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let raw = Option::<String>::deserialize(deserializer)?;
            Ok(raw.and_then(|raw| super::parse(&raw).ok()))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_booking_deserializes_server_shape() {
        let json = r#"{
            "bookingID": 41,
            "customerID": 12,
            "providerID": 7,
            "serviceID": 3,
            "bookingDate": "2024-06-10T09:00:00.000Z",
            "status": "CONFIRMED",
            "additionalNotes": null
        }"#;

        let booking: Booking = serde_json::from_str(json).unwrap();

        assert_eq!(booking.booking_id, BookingId(41));
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(
            booking.booking_date,
            NaiveDate::from_ymd_opt(2024, 6, 10).unwrap().and_hms_opt(9, 0, 0).unwrap()
        );
        assert_eq!(booking.additional_notes, None);
    }

    #[test]
    fn test_create_request_uses_wire_format() {
        let request = CreateBookingRequest {
            customer_id: CustomerId(12),
            service_id: ServiceId(3),
            provider_id: ProviderId(7),
            booking_date: NaiveDate::from_ymd_opt(2024, 6, 10)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            additional_notes: String::new(),
        };

        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "customerID": 12,
                "serviceID": 3,
                "providerID": 7,
                "bookingDate": "2024-06-10T09:00:00",
                "additionalNotes": ""
            })
        );
    }

    #[test]
    fn test_status_transitions_are_monotone() {
        use BookingStatus::{Cancelled, Completed, Confirmed, Pending};

        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Confirmed.can_transition_to(Pending));
    }

    #[test]
    fn test_terminal_statuses_never_move() {
        use BookingStatus::{Cancelled, Completed, Confirmed, Pending};
        for from in [Completed, Cancelled] {
            assert!(from.is_terminal());
            for to in [Pending, Confirmed, Completed, Cancelled] {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
        assert!(!Pending.is_terminal());
        assert!(!Confirmed.is_terminal());
    }

    #[test]
    fn test_status_parses_case_insensitively() {
        assert_eq!("cancelled".parse::<BookingStatus>(), Ok(BookingStatus::Cancelled));
        assert!("ARCHIVED".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn test_review_tolerates_bad_created_at() {
        let json = r#"{"reviewID":1,"bookingID":2,"customerID":3,"rating":5,"createdAt":"yesterday"}"#;
        let review: Review = serde_json::from_str(json).unwrap();
        assert_eq!(review.created_at, None);
        assert_eq!(review.comment, "");
    }

    #[test]
    fn test_user_display_name() {
        let user = User {
            user_id: UserId(1),
            name: "Ada".to_string(),
            surname: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone_number: None,
        };
        assert_eq!(user.display_name(), "Ada Lovelace");
    }
}
