//! In-memory marketplace API for tests.
//!
//! `MockMarketplaceApi` stores users, accounts, services, bookings and reviews
//! in memory, counts calls per endpoint, and can be told to fail specific
//! endpoints or specific records.

use chrono::Utc;
use marketplace_api::{
    ApiError, ApiFuture, ApiResult, Booking, BookingId, BookingStatus, CreateBookingRequest,
    CreateReviewRequest, Customer, CustomerId, MarketplaceApi, Provider, ProviderId, Review,
    ReviewId, Service, ServiceId, User, UserId,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// One REST operation, used for call counting and failure injection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `GET /v1/users/by-email/{email}`
    UserByEmail,
    /// `GET /v1/users/{userID}`
    User,
    /// `GET /v1/customers/user/{userID}`
    CustomerByUser,
    /// `GET /v1/customers/{customerID}`
    Customer,
    /// `GET /v1/providers/user/{userID}`
    ProviderByUser,
    /// `GET /v1/providers/{providerID}`
    Provider,
    /// `GET /v1/bookings/customer?customerID=`
    CustomerBookings,
    /// `GET /v1/bookings/provider/{providerID}`
    ProviderBookings,
    /// `POST /v1/bookings/customer`
    CreateBooking,
    /// `PUT /v1/bookings/status/{bookingID}`
    UpdateBookingStatus,
    /// `GET /v1/services/{serviceID}`
    Service,
    /// `GET /v1/services/provider/{providerID}`
    ProviderServices,
    /// `GET /v1/reviews/customer/{customerID}`
    CustomerReviews,
    /// `GET /v1/reviews/provider/{providerID}`
    ProviderReviews,
    /// `POST /v1/reviews/customer`
    CreateReview,
}

#[derive(Debug)]
struct Records {
    users: HashMap<UserId, User>,
    customers: HashMap<CustomerId, Customer>,
    providers: HashMap<ProviderId, Provider>,
    services: HashMap<ServiceId, Service>,
    bookings: BTreeMap<BookingId, Booking>,
    reviews: Vec<Review>,
    next_booking_id: i64,
    next_review_id: i64,
    initial_status: BookingStatus,
    calls: HashMap<Endpoint, usize>,
    failing_endpoints: HashMap<Endpoint, ApiError>,
    failing_services: HashSet<ServiceId>,
    failing_providers: HashSet<ProviderId>,
    service_delays: HashMap<ServiceId, Duration>,
}

impl Default for Records {
    fn default() -> Self {
        Self {
            users: HashMap::new(),
            customers: HashMap::new(),
            providers: HashMap::new(),
            services: HashMap::new(),
            bookings: BTreeMap::new(),
            reviews: Vec::new(),
            next_booking_id: 1000,
            next_review_id: 1,
            initial_status: BookingStatus::Pending,
            calls: HashMap::new(),
            failing_endpoints: HashMap::new(),
            failing_services: HashSet::new(),
            failing_providers: HashSet::new(),
            service_delays: HashMap::new(),
        }
    }
}

/// Mock marketplace API.
///
/// Uses in-memory storage for testing. Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MockMarketplaceApi {
    records: Arc<Mutex<Records>>,
}

fn not_found(resource: impl Into<String>) -> ApiError {
    ApiError::NotFound {
        resource: resource.into(),
    }
}

fn unavailable() -> ApiError {
    ApiError::Api {
        status: 503,
        code: Some("UNAVAILABLE".to_string()),
        message: "Service temporarily unavailable".to_string(),
    }
}

impl MockMarketplaceApi {
    /// Create an empty mock
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_records(self, update: impl FnOnce(&mut Records)) -> Self {
        update(&mut self.lock());
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Records> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a user
    #[must_use]
    pub fn with_user(self, user: User) -> Self {
        self.with_records(|r| {
            r.users.insert(user.user_id, user);
        })
    }

    /// Add a customer account
    #[must_use]
    pub fn with_customer(self, customer: Customer) -> Self {
        self.with_records(|r| {
            r.customers.insert(customer.customer_id, customer);
        })
    }

    /// Add a provider account
    #[must_use]
    pub fn with_provider(self, provider: Provider) -> Self {
        self.with_records(|r| {
            r.providers.insert(provider.provider_id, provider);
        })
    }

    /// Add a service
    #[must_use]
    pub fn with_service(self, service: Service) -> Self {
        self.with_records(|r| {
            r.services.insert(service.service_id, service);
        })
    }

    /// Add a booking
    #[must_use]
    pub fn with_booking(self, booking: Booking) -> Self {
        self.with_records(|r| {
            r.bookings.insert(booking.booking_id, booking);
        })
    }

    /// Add a review
    #[must_use]
    pub fn with_review(self, review: Review) -> Self {
        self.with_records(|r| r.reviews.push(review))
    }

    /// Status the server assigns to newly created bookings (default `PENDING`)
    #[must_use]
    pub fn with_initial_status(self, status: BookingStatus) -> Self {
        self.with_records(|r| r.initial_status = status)
    }

    /// Make every call to `endpoint` fail with `error`
    #[must_use]
    pub fn failing(self, endpoint: Endpoint, error: ApiError) -> Self {
        self.with_records(|r| {
            r.failing_endpoints.insert(endpoint, error);
        })
    }

    /// Make lookups of one service fail with a 503
    #[must_use]
    pub fn failing_service(self, service_id: ServiceId) -> Self {
        self.with_records(|r| {
            r.failing_services.insert(service_id);
        })
    }

    /// Make lookups of one provider fail with a 503
    #[must_use]
    pub fn failing_provider(self, provider_id: ProviderId) -> Self {
        self.with_records(|r| {
            r.failing_providers.insert(provider_id);
        })
    }

    /// Delay lookups of one service
    #[must_use]
    pub fn slow_service(self, service_id: ServiceId, delay: Duration) -> Self {
        self.with_records(|r| {
            r.service_delays.insert(service_id, delay);
        })
    }

    /// Stop failing `endpoint`
    pub fn recover(&self, endpoint: Endpoint) {
        self.lock().failing_endpoints.remove(&endpoint);
    }

    /// Number of calls made to `endpoint`
    #[must_use]
    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.lock().calls.get(&endpoint).copied().unwrap_or(0)
    }

    /// Total number of calls made to any endpoint
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.lock().calls.values().sum()
    }

    /// Current server-side copy of a booking
    #[must_use]
    pub fn booking(&self, booking_id: BookingId) -> Option<Booking> {
        self.lock().bookings.get(&booking_id).cloned()
    }

    /// All stored reviews
    #[must_use]
    pub fn reviews(&self) -> Vec<Review> {
        self.lock().reviews.clone()
    }

    /// Record the call and return the injected failure, if any
    fn enter(&self, endpoint: Endpoint) -> ApiResult<std::sync::MutexGuard<'_, Records>> {
        let mut records = self.lock();
        *records.calls.entry(endpoint).or_insert(0) += 1;
        match records.failing_endpoints.get(&endpoint) {
            Some(error) => Err(error.clone()),
            None => Ok(records),
        }
    }

    fn respond<T>(&self, endpoint: Endpoint, handler: impl FnOnce(&mut Records) -> ApiResult<T>) -> ApiFuture<T>
    where
        T: Send + 'static,
    {
        let result = self.enter(endpoint).and_then(|mut records| handler(&mut records));
        Box::pin(async move { result })
    }
}

impl MarketplaceApi for MockMarketplaceApi {
    fn user_by_email(&self, email: &str) -> ApiFuture<User> {
        let email = email.to_string();
        self.respond(Endpoint::UserByEmail, move |r| {
            r.users
                .values()
                .find(|user| user.email.eq_ignore_ascii_case(&email))
                .cloned()
                .ok_or_else(|| not_found(format!("user with email {email}")))
        })
    }

    fn user(&self, user_id: UserId) -> ApiFuture<User> {
        self.respond(Endpoint::User, move |r| {
            r.users
                .get(&user_id)
                .cloned()
                .ok_or_else(|| not_found(format!("user {user_id}")))
        })
    }

    fn customer_by_user(&self, user_id: UserId) -> ApiFuture<Customer> {
        self.respond(Endpoint::CustomerByUser, move |r| {
            r.customers
                .values()
                .find(|customer| customer.user_id == user_id)
                .cloned()
                .ok_or_else(|| not_found(format!("customer for user {user_id}")))
        })
    }

    fn customer(&self, customer_id: CustomerId) -> ApiFuture<Customer> {
        self.respond(Endpoint::Customer, move |r| {
            r.customers
                .get(&customer_id)
                .cloned()
                .ok_or_else(|| not_found(format!("customer {customer_id}")))
        })
    }

    fn provider_by_user(&self, user_id: UserId) -> ApiFuture<Provider> {
        self.respond(Endpoint::ProviderByUser, move |r| {
            r.providers
                .values()
                .find(|provider| provider.user_id == Some(user_id))
                .cloned()
                .ok_or_else(|| not_found(format!("provider for user {user_id}")))
        })
    }

    fn provider(&self, provider_id: ProviderId) -> ApiFuture<Provider> {
        self.respond(Endpoint::Provider, move |r| {
            if r.failing_providers.contains(&provider_id) {
                return Err(unavailable());
            }
            r.providers
                .get(&provider_id)
                .cloned()
                .ok_or_else(|| not_found(format!("provider {provider_id}")))
        })
    }

    fn customer_bookings(&self, customer_id: CustomerId) -> ApiFuture<Vec<Booking>> {
        self.respond(Endpoint::CustomerBookings, move |r| {
            Ok(r.bookings
                .values()
                .filter(|booking| booking.customer_id == customer_id)
                .cloned()
                .collect())
        })
    }

    fn provider_bookings(&self, provider_id: ProviderId) -> ApiFuture<Vec<Booking>> {
        self.respond(Endpoint::ProviderBookings, move |r| {
            Ok(r.bookings
                .values()
                .filter(|booking| booking.provider_id == provider_id)
                .cloned()
                .collect())
        })
    }

    fn create_booking(&self, request: CreateBookingRequest) -> ApiFuture<Booking> {
        self.respond(Endpoint::CreateBooking, move |r| {
            if !r.services.contains_key(&request.service_id) {
                return Err(ApiError::Api {
                    status: 422,
                    code: Some("UNKNOWN_SERVICE".to_string()),
                    message: format!("Service {} does not exist", request.service_id),
                });
            }

            let booking_id = BookingId(r.next_booking_id);
            r.next_booking_id += 1;

            let booking = Booking {
                booking_id,
                customer_id: request.customer_id,
                provider_id: request.provider_id,
                service_id: request.service_id,
                booking_date: request.booking_date,
                status: r.initial_status,
                additional_notes: Some(request.additional_notes),
            };
            r.bookings.insert(booking_id, booking.clone());
            Ok(booking)
        })
    }

    fn update_booking_status(&self, booking_id: BookingId, status: BookingStatus) -> ApiFuture<Booking> {
        self.respond(Endpoint::UpdateBookingStatus, move |r| {
            let booking = r
                .bookings
                .get_mut(&booking_id)
                .ok_or_else(|| not_found(format!("booking {booking_id}")))?;

            if !booking.status.can_transition_to(status) {
                return Err(ApiError::Api {
                    status: 409,
                    code: Some("INVALID_TRANSITION".to_string()),
                    message: format!("Cannot move booking from {} to {status}", booking.status),
                });
            }

            booking.status = status;
            Ok(booking.clone())
        })
    }

    fn service(&self, service_id: ServiceId) -> ApiFuture<Service> {
        let delay = self.lock().service_delays.get(&service_id).copied();
        let result = self.enter(Endpoint::Service).and_then(|r| {
            if r.failing_services.contains(&service_id) {
                return Err(unavailable());
            }
            r.services
                .get(&service_id)
                .cloned()
                .ok_or_else(|| not_found(format!("service {service_id}")))
        });

        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            result
        })
    }

    fn provider_services(&self, provider_id: ProviderId) -> ApiFuture<Vec<Service>> {
        self.respond(Endpoint::ProviderServices, move |r| {
            let mut services: Vec<Service> = r
                .services
                .values()
                .filter(|service| service.provider_id == Some(provider_id))
                .cloned()
                .collect();
            services.sort_by_key(|service| service.service_id);
            Ok(services)
        })
    }

    fn customer_reviews(&self, customer_id: CustomerId) -> ApiFuture<Vec<Review>> {
        self.respond(Endpoint::CustomerReviews, move |r| {
            Ok(r.reviews
                .iter()
                .filter(|review| review.customer_id == customer_id)
                .cloned()
                .collect())
        })
    }

    fn provider_reviews(&self, provider_id: ProviderId) -> ApiFuture<Vec<Review>> {
        self.respond(Endpoint::ProviderReviews, move |r| {
            let reviewed: HashSet<BookingId> = r
                .bookings
                .values()
                .filter(|booking| booking.provider_id == provider_id)
                .map(|booking| booking.booking_id)
                .collect();
            Ok(r.reviews
                .iter()
                .filter(|review| reviewed.contains(&review.booking_id))
                .cloned()
                .collect())
        })
    }

    fn create_review(&self, request: CreateReviewRequest) -> ApiFuture<Review> {
        self.respond(Endpoint::CreateReview, move |r| {
            if r.reviews.iter().any(|review| review.booking_id == request.booking_id) {
                return Err(ApiError::Api {
                    status: 409,
                    code: Some("REVIEW_EXISTS".to_string()),
                    message: "This booking already has a review".to_string(),
                });
            }

            let review = Review {
                review_id: ReviewId(r.next_review_id),
                booking_id: request.booking_id,
                customer_id: request.customer_id,
                rating: request.rating,
                comment: request.comment,
                created_at: Some(Utc::now().naive_utc()),
            };
            r.next_review_id += 1;
            r.reviews.push(review.clone());
            Ok(review)
        })
    }
}
