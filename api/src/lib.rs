//! # Marketplace API Client
//!
//! Typed Rust client for the service-booking marketplace REST API: accounts,
//! bookings, services, providers and reviews.
//!
//! ## Example
//!
//! ```no_run
//! use marketplace_api::{MarketplaceApi, MarketplaceClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MarketplaceClient::new("http://localhost:8080")?;
//!
//!     let user = client.user_by_email("ada@example.com").await?;
//!     let customer = client.customer_by_user(user.user_id).await?;
//!     let bookings = client.customer_bookings(customer.customer_id).await?;
//!
//!     println!("{} bookings", bookings.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - One method per endpoint, with newtype identifiers
//! - Structured errors: non-2xx bodies keep the server's error `code`
//! - [`MarketplaceApi`] trait so callers can inject a test double

pub mod client;
pub mod error;
pub mod gateway;
pub mod types;

// Re-export main types for convenience
pub use client::MarketplaceClient;
pub use error::{ApiError, ApiResult};
pub use gateway::{ApiFuture, MarketplaceApi};
pub use types::{
    Booking, BookingId, BookingStatus, CreateBookingRequest, CreateReviewRequest, Customer,
    CustomerId, Provider, ProviderId, Review, ReviewId, Service, ServiceId, UpdateStatusRequest,
    User, UserId,
};
