//! Marketplace REST client implementation

use crate::error::{ApiError, ApiResult};
use crate::gateway::{ApiFuture, MarketplaceApi};
use crate::types::{
    Booking, BookingId, BookingStatus, CreateBookingRequest, CreateReviewRequest, Customer,
    CustomerId, Provider, ProviderId, Review, Service, ServiceId, UpdateStatusRequest, User, UserId,
};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Marketplace API client
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone, Debug)]
pub struct MarketplaceClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl MarketplaceClient {
    /// Create a client for the given base URL (for example `https://api.example.com`)
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidRequest` if the URL does not parse or cannot
    /// carry a path.
    pub fn new(base_url: &str) -> ApiResult<Self> {
        Self::from_parts(Client::new(), base_url)
    }

    /// Create a client whose requests give up after `timeout`
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidRequest` if the URL is unusable or the HTTP
    /// client cannot be built.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        Self::from_parts(client, base_url)
    }

    /// Attach a bearer token sent with every request
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Base URL requests are resolved against
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn from_parts(client: Client, base_url: &str) -> ApiResult<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| ApiError::InvalidRequest(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidRequest(format!("{base_url}: cannot carry a path")));
        }

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Build `<base>/v1/<segments...>`, percent-encoding each segment
    fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| ApiError::InvalidRequest(format!("{}: cannot carry a path", self.base_url)))?;
            path.pop_if_empty().push("v1").extend(segments);
        }
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute<T>(&self, request: RequestBuilder, resource: String) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self
            .authorize(request)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        let status = response.status();
        tracing::debug!(%resource, status = status.as_u16(), "Marketplace API response");

        match status {
            StatusCode::OK | StatusCode::CREATED => response
                .json::<T>()
                .await
                .map_err(|e| ApiError::ResponseParseFailed(e.to_string())),
            StatusCode::NOT_FOUND => Err(ApiError::NotFound { resource }),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ApiError::Unauthorized),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(ApiError::from_response(status.as_u16(), &body))
            },
        }
    }

    async fn get<T>(&self, segments: &[&str], resource: String) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        tracing::debug!(%url, "GET");
        self.execute(self.client.get(url), resource).await
    }

    /// Look up a user by email
    ///
    /// # Errors
    ///
    /// `ApiError::NotFound` when no user has this email; transport and API
    /// errors otherwise.
    pub async fn fetch_user_by_email(&self, email: &str) -> ApiResult<User> {
        self.get(&["users", "by-email", email], format!("user with email {email}"))
            .await
    }

    /// Fetch a user
    ///
    /// # Errors
    ///
    /// Transport, API, or not-found errors.
    pub async fn fetch_user(&self, user_id: UserId) -> ApiResult<User> {
        self.get(&["users", &user_id.to_string()], format!("user {user_id}"))
            .await
    }

    /// Look up the customer account owned by a user
    ///
    /// # Errors
    ///
    /// `ApiError::NotFound` when the user has no customer account.
    pub async fn fetch_customer_by_user(&self, user_id: UserId) -> ApiResult<Customer> {
        self.get(
            &["customers", "user", &user_id.to_string()],
            format!("customer for user {user_id}"),
        )
        .await
    }

    /// Fetch a customer
    ///
    /// # Errors
    ///
    /// Transport, API, or not-found errors.
    pub async fn fetch_customer(&self, customer_id: CustomerId) -> ApiResult<Customer> {
        self.get(
            &["customers", &customer_id.to_string()],
            format!("customer {customer_id}"),
        )
        .await
    }

    /// Look up the provider account owned by a user
    ///
    /// # Errors
    ///
    /// `ApiError::NotFound` when the user has no provider account.
    pub async fn fetch_provider_by_user(&self, user_id: UserId) -> ApiResult<Provider> {
        self.get(
            &["providers", "user", &user_id.to_string()],
            format!("provider for user {user_id}"),
        )
        .await
    }

    /// Fetch a provider
    ///
    /// # Errors
    ///
    /// Transport, API, or not-found errors.
    pub async fn fetch_provider(&self, provider_id: ProviderId) -> ApiResult<Provider> {
        self.get(
            &["providers", &provider_id.to_string()],
            format!("provider {provider_id}"),
        )
        .await
    }

    /// List a customer's bookings
    ///
    /// # Errors
    ///
    /// Transport or API errors.
    pub async fn fetch_customer_bookings(&self, customer_id: CustomerId) -> ApiResult<Vec<Booking>> {
        let mut url = self.endpoint(&["bookings", "customer"])?;
        url.query_pairs_mut()
            .append_pair("customerID", &customer_id.to_string());
        tracing::debug!(%url, "GET");
        self.execute(
            self.client.get(url),
            format!("bookings for customer {customer_id}"),
        )
        .await
    }

    /// List a provider's bookings
    ///
    /// # Errors
    ///
    /// Transport or API errors.
    pub async fn fetch_provider_bookings(&self, provider_id: ProviderId) -> ApiResult<Vec<Booking>> {
        self.get(
            &["bookings", "provider", &provider_id.to_string()],
            format!("bookings for provider {provider_id}"),
        )
        .await
    }

    /// Create a booking
    ///
    /// # Errors
    ///
    /// Transport or API errors; the server's error code is preserved.
    pub async fn post_booking(&self, request: &CreateBookingRequest) -> ApiResult<Booking> {
        let url = self.endpoint(&["bookings", "customer"])?;
        tracing::debug!(%url, service_id = %request.service_id, "POST");
        self.execute(self.client.post(url).json(request), "new booking".to_string())
            .await
    }

    /// Request a status transition
    ///
    /// # Errors
    ///
    /// Transport or API errors.
    pub async fn put_booking_status(
        &self,
        booking_id: BookingId,
        status: BookingStatus,
    ) -> ApiResult<Booking> {
        let url = self.endpoint(&["bookings", "status", &booking_id.to_string()])?;
        tracing::debug!(%url, %status, "PUT");
        let body = UpdateStatusRequest { new_status: status };
        self.execute(self.client.put(url).json(&body), format!("booking {booking_id}"))
            .await
    }

    /// Fetch a service
    ///
    /// # Errors
    ///
    /// Transport, API, or not-found errors.
    pub async fn fetch_service(&self, service_id: ServiceId) -> ApiResult<Service> {
        self.get(&["services", &service_id.to_string()], format!("service {service_id}"))
            .await
    }

    /// List the services a provider offers
    ///
    /// # Errors
    ///
    /// Transport or API errors.
    pub async fn fetch_provider_services(&self, provider_id: ProviderId) -> ApiResult<Vec<Service>> {
        self.get(
            &["services", "provider", &provider_id.to_string()],
            format!("services for provider {provider_id}"),
        )
        .await
    }

    /// List reviews written by a customer
    ///
    /// # Errors
    ///
    /// Transport or API errors.
    pub async fn fetch_customer_reviews(&self, customer_id: CustomerId) -> ApiResult<Vec<Review>> {
        self.get(
            &["reviews", "customer", &customer_id.to_string()],
            format!("reviews by customer {customer_id}"),
        )
        .await
    }

    /// List reviews about a provider
    ///
    /// # Errors
    ///
    /// Transport or API errors.
    pub async fn fetch_provider_reviews(&self, provider_id: ProviderId) -> ApiResult<Vec<Review>> {
        self.get(
            &["reviews", "provider", &provider_id.to_string()],
            format!("reviews for provider {provider_id}"),
        )
        .await
    }

    /// Submit a review
    ///
    /// # Errors
    ///
    /// Transport or API errors.
    pub async fn post_review(&self, request: &CreateReviewRequest) -> ApiResult<Review> {
        let url = self.endpoint(&["reviews", "customer"])?;
        tracing::debug!(%url, booking_id = %request.booking_id, "POST");
        self.execute(
            self.client.post(url).json(request),
            format!("review for booking {}", request.booking_id),
        )
        .await
    }
}

impl MarketplaceApi for MarketplaceClient {
    fn user_by_email(&self, email: &str) -> ApiFuture<User> {
        let client = self.clone();
        let email = email.to_string();
        Box::pin(async move { client.fetch_user_by_email(&email).await })
    }

    fn user(&self, user_id: UserId) -> ApiFuture<User> {
        let client = self.clone();
        Box::pin(async move { client.fetch_user(user_id).await })
    }

    fn customer_by_user(&self, user_id: UserId) -> ApiFuture<Customer> {
        let client = self.clone();
        Box::pin(async move { client.fetch_customer_by_user(user_id).await })
    }

    fn customer(&self, customer_id: CustomerId) -> ApiFuture<Customer> {
        let client = self.clone();
        Box::pin(async move { client.fetch_customer(customer_id).await })
    }

    fn provider_by_user(&self, user_id: UserId) -> ApiFuture<Provider> {
        let client = self.clone();
        Box::pin(async move { client.fetch_provider_by_user(user_id).await })
    }

    fn provider(&self, provider_id: ProviderId) -> ApiFuture<Provider> {
        let client = self.clone();
        Box::pin(async move { client.fetch_provider(provider_id).await })
    }

    fn customer_bookings(&self, customer_id: CustomerId) -> ApiFuture<Vec<Booking>> {
        let client = self.clone();
        Box::pin(async move { client.fetch_customer_bookings(customer_id).await })
    }

    fn provider_bookings(&self, provider_id: ProviderId) -> ApiFuture<Vec<Booking>> {
        let client = self.clone();
        Box::pin(async move { client.fetch_provider_bookings(provider_id).await })
    }

    fn create_booking(&self, request: CreateBookingRequest) -> ApiFuture<Booking> {
        let client = self.clone();
        Box::pin(async move { client.post_booking(&request).await })
    }

    fn update_booking_status(&self, booking_id: BookingId, status: BookingStatus) -> ApiFuture<Booking> {
        let client = self.clone();
        Box::pin(async move { client.put_booking_status(booking_id, status).await })
    }

    fn service(&self, service_id: ServiceId) -> ApiFuture<Service> {
        let client = self.clone();
        Box::pin(async move { client.fetch_service(service_id).await })
    }

    fn provider_services(&self, provider_id: ProviderId) -> ApiFuture<Vec<Service>> {
        let client = self.clone();
        Box::pin(async move { client.fetch_provider_services(provider_id).await })
    }

    fn customer_reviews(&self, customer_id: CustomerId) -> ApiFuture<Vec<Review>> {
        let client = self.clone();
        Box::pin(async move { client.fetch_customer_reviews(customer_id).await })
    }

    fn provider_reviews(&self, provider_id: ProviderId) -> ApiFuture<Vec<Review>> {
        let client = self.clone();
        Box::pin(async move { client.fetch_provider_reviews(provider_id).await })
    }

    fn create_review(&self, request: CreateReviewRequest) -> ApiFuture<Review> {
        let client = self.clone();
        Box::pin(async move { client.post_review(&request).await })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_percent_encodes_email() {
        let client = MarketplaceClient::new("http://localhost:8080").unwrap();
        let url = client.endpoint(&["users", "by-email", "a b/c@example.com"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/v1/users/by-email/a%20b%2Fc@example.com"
        );
    }

    #[test]
    fn test_endpoint_respects_base_path() {
        let client = MarketplaceClient::new("https://api.example.com/marketplace/").unwrap();
        let url = client.endpoint(&["services", "3"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/marketplace/v1/services/3");
    }

    #[test]
    fn test_rejects_unusable_base_url() {
        assert!(matches!(
            MarketplaceClient::new("not a url"),
            Err(ApiError::InvalidRequest(_))
        ));
        assert!(matches!(
            MarketplaceClient::new("mailto:ops@example.com"),
            Err(ApiError::InvalidRequest(_))
        ));
    }
}
