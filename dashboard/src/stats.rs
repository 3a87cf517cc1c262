//! Statistics derived from an enriched booking collection.

use crate::enrichment::EnrichedBooking;
use chrono::{Days, NaiveDate};
use marketplace_api::BookingStatus;

/// Number of daily buckets in the time series
pub const WINDOW_DAYS: usize = 7;

/// One calendar day of the time series
#[derive(Clone, Debug, PartialEq)]
pub struct DailyBucket {
    /// Calendar date
    pub date: NaiveDate,
    /// Confirmed and completed bookings on this date
    pub bookings: u32,
    /// Revenue of those bookings
    pub revenue: f64,
}

/// Aggregate view over a booking collection
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatisticsSnapshot {
    /// All bookings
    pub total: usize,
    /// Pending and confirmed bookings
    pub active: usize,
    /// Completed bookings
    pub completed: usize,
    /// Cancelled bookings
    pub cancelled: usize,
    /// Sum of service prices over completed bookings
    pub revenue: f64,
    /// Mean review rating rounded to one decimal, 0 without reviews
    pub average_rating: f64,
    /// Reviews that contributed to the average
    pub review_count: usize,
    /// Oldest first, ending today
    pub daily: Vec<DailyBucket>,
}

impl StatisticsSnapshot {
    /// Whether the status counters add up to the total
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.total == self.active + self.completed + self.cancelled
    }

    /// Optimistic patch after a booking moved from `previous` to `CANCELLED`
    ///
    /// Only the status counters change; the time series and revenue wait for
    /// the next full recompute.
    pub fn apply_cancellation(&mut self, previous: BookingStatus) {
        if previous.is_active() && self.active > 0 {
            self.active -= 1;
            self.cancelled += 1;
        }
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Recompute every statistic from scratch
///
/// `today` closes the seven-day window; bookings outside it only affect the
/// totals.
#[must_use]
#[allow(clippy::cast_precision_loss)] // Review counts are tiny
pub fn compute_stats(bookings: &[EnrichedBooking], today: NaiveDate) -> StatisticsSnapshot {
    let mut daily: Vec<DailyBucket> = (0..WINDOW_DAYS)
        .rev()
        .map(|offset| DailyBucket {
            date: today
                .checked_sub_days(Days::new(offset as u64))
                .unwrap_or(today),
            bookings: 0,
            revenue: 0.0,
        })
        .collect();
    let window_start = daily.first().map_or(today, |bucket| bucket.date);

    let mut stats = StatisticsSnapshot {
        total: bookings.len(),
        ..StatisticsSnapshot::default()
    };
    let mut rating_sum = 0u32;

    for enriched in bookings {
        let status = enriched.status();
        let price = enriched.price().unwrap_or(0.0);

        match status {
            BookingStatus::Pending | BookingStatus::Confirmed => stats.active += 1,
            BookingStatus::Completed => {
                stats.completed += 1;
                stats.revenue += price;
            },
            BookingStatus::Cancelled => stats.cancelled += 1,
        }

        if let Some(review) = &enriched.review {
            rating_sum += u32::from(review.rating);
            stats.review_count += 1;
        }

        let date = enriched.booking.booking_date.date();
        if matches!(status, BookingStatus::Confirmed | BookingStatus::Completed)
            && (window_start..=today).contains(&date)
        {
            if let Some(bucket) = daily.iter_mut().find(|bucket| bucket.date == date) {
                bucket.bookings += 1;
                bucket.revenue += price;
            }
        }
    }

    if stats.review_count > 0 {
        stats.average_rating = round_one_decimal(f64::from(rating_sum) / stats.review_count as f64);
    }
    stats.daily = daily;
    stats
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use crate::enrichment::Snapshot;
    use marketplace_api::{
        ApiError, Booking, BookingId, CustomerId, ProviderId, Review, ReviewId, Service, ServiceId,
    };
    use proptest::prelude::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 12).unwrap()
    }

    fn enriched(id: i64, status: BookingStatus, days_ago: u64, price: Option<f64>) -> EnrichedBooking {
        let date = today().checked_sub_days(Days::new(days_ago)).unwrap();
        EnrichedBooking {
            booking: Booking {
                booking_id: BookingId(id),
                customer_id: CustomerId(12),
                provider_id: ProviderId(7),
                service_id: ServiceId(3),
                booking_date: date.and_hms_opt(10, 0, 0).unwrap(),
                status,
                additional_notes: None,
            },
            service: price.map_or(
                Snapshot::Unavailable {
                    reason: ApiError::Unauthorized,
                },
                |price| {
                    Snapshot::Loaded(Service {
                        service_id: ServiceId(3),
                        provider_id: Some(ProviderId(7)),
                        name: "Deep clean".to_string(),
                        description: String::new(),
                        price,
                        duration: 60,
                    })
                },
            ),
            provider: Snapshot::Unavailable {
                reason: ApiError::Unauthorized,
            },
            customer_name: None,
            review: None,
        }
    }

    fn with_rating(mut booking: EnrichedBooking, rating: u8) -> EnrichedBooking {
        booking.review = Some(Review {
            review_id: ReviewId(booking.id().get()),
            booking_id: booking.id(),
            customer_id: CustomerId(12),
            rating,
            comment: String::new(),
            created_at: None,
        });
        booking
    }

    #[test]
    fn test_counts_revenue_and_rating() {
        let bookings = vec![
            with_rating(enriched(1, BookingStatus::Completed, 0, Some(80.0)), 5),
            with_rating(enriched(2, BookingStatus::Completed, 2, Some(40.0)), 4),
            with_rating(enriched(3, BookingStatus::Completed, 3, Some(10.0)), 4),
            enriched(4, BookingStatus::Pending, 1, Some(25.0)),
            enriched(5, BookingStatus::Confirmed, 1, Some(30.0)),
            enriched(6, BookingStatus::Cancelled, 1, Some(99.0)),
        ];

        let stats = compute_stats(&bookings, today());

        assert_eq!(stats.total, 6);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.completed, 3);
        assert_eq!(stats.cancelled, 1);
        assert!((stats.revenue - 130.0).abs() < f64::EPSILON);
        // 13 / 3 = 4.333...
        assert!((stats.average_rating - 4.3).abs() < f64::EPSILON);
        assert_eq!(stats.review_count, 3);
        assert!(stats.is_consistent());
    }

    #[test]
    fn test_daily_window_is_seven_days_ending_today() {
        let bookings = vec![
            enriched(1, BookingStatus::Completed, 0, Some(80.0)),
            enriched(2, BookingStatus::Confirmed, 0, Some(20.0)),
            enriched(3, BookingStatus::Pending, 0, Some(50.0)),
            enriched(4, BookingStatus::Cancelled, 0, Some(50.0)),
            enriched(5, BookingStatus::Completed, 6, Some(15.0)),
            enriched(6, BookingStatus::Completed, 7, Some(70.0)),
        ];

        let stats = compute_stats(&bookings, today());

        assert_eq!(stats.daily.len(), WINDOW_DAYS);
        assert_eq!(stats.daily[0].date, NaiveDate::from_ymd_opt(2024, 6, 6).unwrap());
        assert_eq!(stats.daily[6].date, today());

        assert_eq!(stats.daily[6].bookings, 2);
        assert!((stats.daily[6].revenue - 100.0).abs() < f64::EPSILON);
        assert_eq!(stats.daily[0].bookings, 1);
        assert_eq!(
            stats.daily.iter().map(|bucket| bucket.bookings).sum::<u32>(),
            3
        );
    }

    #[test]
    fn test_no_reviews_average_is_zero() {
        let stats = compute_stats(&[enriched(1, BookingStatus::Pending, 0, None)], today());
        assert!(stats.average_rating.abs() < f64::EPSILON);
        assert_eq!(stats.review_count, 0);
    }

    #[test]
    fn test_unknown_price_contributes_nothing() {
        let stats = compute_stats(&[enriched(1, BookingStatus::Completed, 0, None)], today());
        assert!(stats.revenue.abs() < f64::EPSILON);
        assert_eq!(stats.daily[6].bookings, 1);
    }

    #[test]
    fn test_cancellation_patch_moves_one_booking() {
        let bookings = vec![
            enriched(1, BookingStatus::Confirmed, 0, Some(80.0)),
            enriched(2, BookingStatus::Pending, 0, Some(80.0)),
        ];
        let mut stats = compute_stats(&bookings, today());
        let daily_before = stats.daily.clone();

        stats.apply_cancellation(BookingStatus::Confirmed);

        assert_eq!(stats.total, 2);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.daily, daily_before);
        assert!(stats.is_consistent());
    }

    fn status_strategy() -> impl Strategy<Value = BookingStatus> {
        prop_oneof![
            Just(BookingStatus::Pending),
            Just(BookingStatus::Confirmed),
            Just(BookingStatus::Completed),
            Just(BookingStatus::Cancelled),
        ]
    }

    proptest! {
        #[test]
        fn prop_counters_always_sum_to_total(
            entries in prop::collection::vec((status_strategy(), 0u64..20, prop::option::of(0.0f64..500.0)), 0..40)
        ) {
            let bookings: Vec<EnrichedBooking> = entries
                .into_iter()
                .enumerate()
                .map(|(index, (status, days_ago, price))| {
                    enriched(i64::try_from(index).unwrap(), status, days_ago, price)
                })
                .collect();

            let stats = compute_stats(&bookings, today());

            prop_assert_eq!(stats.total, bookings.len());
            prop_assert!(stats.is_consistent());
            prop_assert_eq!(stats.daily.len(), WINDOW_DAYS);
        }

        #[test]
        fn prop_cancellation_patch_keeps_consistency(
            statuses in prop::collection::vec(status_strategy(), 1..30),
            pick in any::<prop::sample::Index>()
        ) {
            let bookings: Vec<EnrichedBooking> = statuses
                .iter()
                .enumerate()
                .map(|(index, status)| enriched(i64::try_from(index).unwrap(), *status, 0, Some(10.0)))
                .collect();
            let mut stats = compute_stats(&bookings, today());

            let previous = bookings[pick.index(bookings.len())].status();
            stats.apply_cancellation(previous);

            prop_assert!(stats.is_consistent());
            prop_assert_eq!(stats.total, bookings.len());
        }
    }
}
