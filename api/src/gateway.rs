//! Object-safe abstraction over the marketplace API
//!
//! Reducers hold an `Arc<dyn MarketplaceApi>` in their environment so tests
//! can swap the HTTP client for an in-memory double. Every method returns a
//! boxed `'static` future that can be moved into an effect.

use crate::error::ApiResult;
use crate::types::{
    Booking, BookingId, BookingStatus, CreateBookingRequest, CreateReviewRequest, Customer,
    CustomerId, Provider, ProviderId, Review, Service, ServiceId, User, UserId,
};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by every [`MarketplaceApi`] call
pub type ApiFuture<T> = Pin<Box<dyn Future<Output = ApiResult<T>> + Send>>;

/// Every REST operation the dashboard consumes
pub trait MarketplaceApi: Send + Sync {
    /// `GET /v1/users/by-email/{email}`
    fn user_by_email(&self, email: &str) -> ApiFuture<User>;

    /// `GET /v1/users/{userID}`
    fn user(&self, user_id: UserId) -> ApiFuture<User>;

    /// `GET /v1/customers/user/{userID}`
    fn customer_by_user(&self, user_id: UserId) -> ApiFuture<Customer>;

    /// `GET /v1/customers/{customerID}`
    fn customer(&self, customer_id: CustomerId) -> ApiFuture<Customer>;

    /// `GET /v1/providers/user/{userID}`
    fn provider_by_user(&self, user_id: UserId) -> ApiFuture<Provider>;

    /// `GET /v1/providers/{providerID}`
    fn provider(&self, provider_id: ProviderId) -> ApiFuture<Provider>;

    /// `GET /v1/bookings/customer?customerID=`
    fn customer_bookings(&self, customer_id: CustomerId) -> ApiFuture<Vec<Booking>>;

    /// `GET /v1/bookings/provider/{providerID}`
    fn provider_bookings(&self, provider_id: ProviderId) -> ApiFuture<Vec<Booking>>;

    /// `POST /v1/bookings/customer`
    fn create_booking(&self, request: CreateBookingRequest) -> ApiFuture<Booking>;

    /// `PUT /v1/bookings/status/{bookingID}`
    fn update_booking_status(&self, booking_id: BookingId, status: BookingStatus) -> ApiFuture<Booking>;

    /// `GET /v1/services/{serviceID}`
    fn service(&self, service_id: ServiceId) -> ApiFuture<Service>;

    /// `GET /v1/services/provider/{providerID}`
    fn provider_services(&self, provider_id: ProviderId) -> ApiFuture<Vec<Service>>;

    /// `GET /v1/reviews/customer/{customerID}`
    fn customer_reviews(&self, customer_id: CustomerId) -> ApiFuture<Vec<Review>>;

    /// `GET /v1/reviews/provider/{providerID}`
    fn provider_reviews(&self, provider_id: ProviderId) -> ApiFuture<Vec<Review>>;

    /// `POST /v1/reviews/customer`
    fn create_review(&self, request: CreateReviewRequest) -> ApiFuture<Review>;
}
