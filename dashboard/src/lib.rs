//! # Marketplace Dashboard
//!
//! Client-side orchestration for the customer and provider dashboards of the
//! service marketplace.
//!
//! The crate turns the marketplace REST API into ready-to-render dashboard
//! state:
//!
//! - [`IdentityResolver`] maps a signed-in email to a role-scoped account ID
//! - [`BookingAggregator`] fetches bookings and reviews, then enriches every
//!   booking with its service, provider and (for providers) customer name
//! - [`compute_stats`] derives counters, revenue, rating and a 7-day series
//! - [`SimulatedAvailability`] offers deterministic bookable slots
//! - [`DashboardReducer`] drives sign-in, loading, booking creation,
//!   cancellation, provider status changes and reviews
//!
//! ## Example
//!
//! ```no_run
//! use marketplace_api::MarketplaceClient;
//! use marketplace_core::environment::SystemClock;
//! use marketplace_dashboard::{DashboardAction, DashboardEnvironment, DashboardReducer, DashboardState, Role};
//! use marketplace_runtime::Store;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = MarketplaceClient::new("http://localhost:8080")?;
//! let env = DashboardEnvironment::new(Arc::new(client), Arc::new(SystemClock)).with_toast_ttl(None);
//! let store = Store::new(DashboardState::default(), DashboardReducer::new(), env);
//!
//! store
//!     .send_and_settle(DashboardAction::SignIn {
//!         email: "ada@example.com".to_string(),
//!         role: Role::Customer,
//!     })
//!     .await?;
//!
//! let active = store.state(|s| s.stats.active).await;
//! println!("{active} active bookings");
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod aggregator;
pub mod availability;
pub mod catalog;
pub mod config;
pub mod enrichment;
pub mod environment;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod notifications;
pub mod reducers;
pub mod review;
pub mod session;
pub mod state;
pub mod stats;

pub use actions::DashboardAction;
pub use aggregator::{AggregatedBookings, BookingAggregator};
pub use availability::{Availability, SimulatedAvailability, TimeSlot};
pub use config::Config;
pub use enrichment::{EnrichedBooking, Enricher, Snapshot};
pub use environment::DashboardEnvironment;
pub use error::{DashboardError, Result, Severity};
pub use identity::{AccountId, AccountIdentity, IdentityResolver, Role};
pub use lifecycle::{BookingContext, BookingForm, CancellationPhase, CreationPhase};
pub use notifications::{Banner, Notifications, PageStatus, Shortcut, Toast, ToastKind};
pub use reducers::DashboardReducer;
pub use review::{ReviewForm, ReviewPhase};
pub use session::SessionStore;
pub use state::DashboardState;
pub use stats::{StatisticsSnapshot, compute_stats};
