//! # Marketplace Testing
//!
//! Testing utilities for the marketplace dashboard.
//!
//! This crate provides:
//! - `FixedClock` for deterministic "today"
//! - `MockMarketplaceApi`, an in-memory API with call counters and failure injection
//! - `ReducerTest`, a Given-When-Then harness for reducers
//! - Effect assertions and an inline effect resolver
//!
//! ## Example
//!
//! ```ignore
//! use marketplace_testing::{mocks::MockMarketplaceApi, test_clock};
//! use marketplace_runtime::Store;
//!
//! #[tokio::test]
//! async fn test_dashboard_loads() {
//!     let api = MockMarketplaceApi::new().with_user(user).with_customer(customer);
//!     let env = DashboardEnvironment::new(Arc::new(api), Arc::new(test_clock()));
//!     let store = Store::new(DashboardState::default(), DashboardReducer::new(), env);
//!
//!     store.send_and_settle(DashboardAction::SignIn { email, role }).await.unwrap();
//!
//!     let count = store.state(|s| s.bookings.len()).await;
//!     assert_eq!(count, 2);
//! }
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use marketplace_core::environment::Clock;

pub mod mocks;
pub mod reducer_test;

pub use reducer_test::{ReducerTest, assertions, resolve_effects};

/// Fixed clock for deterministic tests
///
/// Always returns the same time, making "today" and the statistics window
/// reproducible.
///
/// # Example
///
/// ```
/// use marketplace_testing::FixedClock;
/// use marketplace_core::environment::Clock;
/// use chrono::Utc;
///
/// let clock = FixedClock::new(Utc::now());
/// assert_eq!(clock.now(), clock.now());
/// ```
#[derive(Debug, Clone)]
pub struct FixedClock {
    time: DateTime<Utc>,
}

impl FixedClock {
    /// Create a new fixed clock with the given time
    #[must_use]
    pub const fn new(time: DateTime<Utc>) -> Self {
        Self { time }
    }

    /// Clock pinned to noon UTC on the given date
    #[must_use]
    pub fn at_noon(date: NaiveDate) -> Self {
        Self::new(date.and_hms_opt(12, 0, 0).unwrap_or_default().and_utc())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.time
    }
}

/// Default fixed clock for tests: Wednesday 2024-06-12 12:00:00 UTC
#[must_use]
pub fn test_clock() -> FixedClock {
    NaiveDate::from_ymd_opt(2024, 6, 12).map_or_else(
        || FixedClock::new(DateTime::<Utc>::UNIX_EPOCH),
        FixedClock::at_noon,
    )
}

/// Install a test-friendly tracing subscriber
///
/// Safe to call from every test; only the first call installs. Honours
/// `RUST_LOG`, defaulting to `debug` for marketplace crates.
pub fn init_test_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn,marketplace_dashboard=debug,marketplace_api=debug".into());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
