//! Marketplace Dashboard
//!
//! Signs in as the configured account, loads its dashboard and prints the
//! bookings and statistics.
//!
//! # Usage
//!
//! ```bash
//! MARKETPLACE_EMAIL=ada@example.com MARKETPLACE_ROLE=customer \
//!     cargo run --bin marketplace-dashboard
//! ```

use marketplace_api::MarketplaceClient;
use marketplace_core::environment::SystemClock;
use marketplace_dashboard::{
    Config, DashboardAction, DashboardEnvironment, DashboardReducer, DashboardState, PageStatus, Role,
};
use marketplace_runtime::Store;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,marketplace_dashboard=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!(
        api = %config.api.url,
        role = %config.account.role,
        "Configuration loaded"
    );

    let Some(email) = config.account.email.clone() else {
        eprintln!("MARKETPLACE_EMAIL is not set");
        std::process::exit(2);
    };

    let mut client = MarketplaceClient::with_timeout(&config.api.url, config.api_timeout())?;
    if let Some(token) = &config.api.token {
        client = client.with_token(token);
    }

    let environment = DashboardEnvironment::new(Arc::new(client), Arc::new(SystemClock))
        .with_toast_ttl(config.toast_ttl());
    let store = Store::new(DashboardState::default(), DashboardReducer::new(), environment);

    // Identity, bookings and every enrichment are sequential at worst.
    let deadline = config.api_timeout() * 4 + Duration::from_secs(1);
    store
        .send_and_wait_for(
            DashboardAction::SignIn {
                email,
                role: config.account.role,
            },
            |action| {
                matches!(
                    action,
                    DashboardAction::DashboardLoaded { .. } | DashboardAction::DashboardLoadFailed { .. }
                )
            },
            deadline,
        )
        .await?;

    let report = store
        .state(|state| {
            if let PageStatus::Failed { error } = &state.status {
                return Err(error.clone());
            }

            let mut lines = Vec::new();
            for booking in state.bookings_newest_first() {
                let counterpart = match state.role() {
                    Some(Role::Provider) => booking.customer_display_name(),
                    _ => booking.provider_name(),
                };
                lines.push(format!(
                    "#{:<6} {}  {:<10} {:<24} {:<24} {}{}",
                    booking.id(),
                    booking.booking.booking_date.format("%Y-%m-%d %H:%M"),
                    booking.status(),
                    booking.service_name(),
                    counterpart,
                    booking.location(),
                    if booking.has_review() { "  (reviewed)" } else { "" },
                ));
            }

            let stats = &state.stats;
            lines.push(String::new());
            lines.push(format!(
                "total {}  active {}  completed {}  cancelled {}  revenue {:.2}  rating {:.1} ({} reviews)",
                stats.total,
                stats.active,
                stats.completed,
                stats.cancelled,
                stats.revenue,
                stats.average_rating,
                stats.review_count,
            ));
            for bucket in &stats.daily {
                lines.push(format!(
                    "{}  {:>3} bookings  {:>9.2}",
                    bucket.date.format("%a %d %b"),
                    bucket.bookings,
                    bucket.revenue
                ));
            }
            for toast in state.notifications.toasts() {
                lines.push(format!("[{:?}] {}", toast.kind, toast.message));
            }
            Ok(lines)
        })
        .await;

    match report {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
        },
        Err(error) => {
            eprintln!("{error}");
            std::process::exit(1);
        },
    }

    store.shutdown(Duration::from_millis(200)).await.ok();
    Ok(())
}
