//! Booking business logic - Pricing, availability and the booking lifecycle.
//!
//! A slot is available when an availability window opened by an admin covers it and no
//! pending or confirmed booking of the same type overlaps it. [`create_booking`] runs
//! that check and the insert in one database transaction, so two members asking for the
//! same slot at the same time cannot both get it. Status changes are conditional updates
//! on the status they were checked against.
//!
//! Intervals are half-open: `[start_time, end_time)`.

use crate::{
    config::{database::retry_on_busy, settings::HourlyRates},
    core::{activity, report},
    entities::{
        Availability, Booking, BookingStatus, BookingType, availability, booking,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDateTime, Utc};
use sea_orm::{Iterable, QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{debug, info, instrument, warn};

/// Format accepted for user-entered times, interpreted as UTC.
pub const DATETIME_INPUT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Parses `YYYY-MM-DD HH:MM` (UTC).
pub fn parse_datetime(input: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(input.trim(), DATETIME_INPUT_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| {
            Error::validation(format!(
                "Invalid time '{input}': expected YYYY-MM-DD HH:MM (UTC)"
            ))
        })
}

fn validate_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<i64> {
    let minutes = (end - start).num_minutes();
    if minutes <= 0 {
        return Err(Error::validation("End time must be after start time"));
    }
    Ok(minutes)
}

/// Price in cents for booking `booking_type` from `start` to `end`.
///
/// The hourly rate is pro-rated by the minute and rounded to the nearest cent.
pub fn calculate_price(
    rates: &HourlyRates,
    booking_type: BookingType,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<i64> {
    let minutes = validate_range(start, end)?;
    let rate = rates.cents_per_hour(booking_type);
    let price = rate
        .checked_mul(minutes)
        .ok_or_else(|| Error::validation("Booking is too long"))?;
    Ok((price + 30) / 60)
}

/// Whether `[start, end)` of `booking_type` can be booked.
pub async fn is_slot_available<C>(
    db: &C,
    booking_type: BookingType,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<bool>
where
    C: ConnectionTrait,
{
    let window = Availability::find()
        .filter(availability::Column::BookingType.eq(booking_type))
        .filter(availability::Column::StartTime.lte(start))
        .filter(availability::Column::EndTime.gte(end))
        .one(db)
        .await?;
    if window.is_none() {
        return Ok(false);
    }

    let overlapping = Booking::find()
        .filter(booking::Column::BookingType.eq(booking_type))
        .filter(booking::Column::Status.is_in(BookingStatus::iter().filter(|s| s.holds_slot())))
        .filter(booking::Column::StartTime.lt(end))
        .filter(booking::Column::EndTime.gt(start))
        .one(db)
        .await?;

    Ok(overlapping.is_none())
}

/// A booking request from a member.
#[derive(Debug, Clone)]
pub struct NewBooking {
    /// Member the booking is for
    pub user_id: String,
    /// Service being booked
    pub booking_type: BookingType,
    /// Inclusive start
    pub start_time: DateTime<Utc>,
    /// Exclusive end
    pub end_time: DateTime<Utc>,
    /// Free-form request details; blank notes are dropped
    pub notes: Option<String>,
}

/// Books a slot. New bookings start as `pending`.
///
/// Rejects slots in the past, slots without an availability window and slots that
/// overlap an active booking.
#[instrument(skip(db, rates, request), fields(user_id = %request.user_id, booking_type = %request.booking_type))]
pub async fn create_booking(
    db: &DatabaseConnection,
    rates: &HourlyRates,
    request: NewBooking,
    now: DateTime<Utc>,
) -> Result<booking::Model> {
    let price = calculate_price(rates, request.booking_type, request.start_time, request.end_time)?;
    if request.start_time <= now {
        return Err(Error::validation("Bookings must start in the future"));
    }

    let request = &request;
    let created = retry_on_busy(move || create_once(db, request, price)).await?;
    info!(booking_id = created.id, price, "Booking created");
    Ok(created)
}

async fn create_once(
    db: &DatabaseConnection,
    request: &NewBooking,
    price: i64,
) -> Result<booking::Model> {
    let txn = db.begin().await?;

    if !is_slot_available(&txn, request.booking_type, request.start_time, request.end_time).await? {
        warn!("Requested slot is not available");
        return Err(Error::SlotUnavailable {
            booking_type: request.booking_type,
        });
    }

    let notes = request
        .notes
        .as_deref()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    let created_at = Utc::now();
    let new_booking = booking::ActiveModel {
        user_id: Set(request.user_id.clone()),
        booking_type: Set(request.booking_type),
        start_time: Set(request.start_time),
        end_time: Set(request.end_time),
        price: Set(price),
        status: Set(BookingStatus::Pending),
        notes: Set(notes),
        created_at: Set(created_at),
        updated_at: Set(created_at),
        ..Default::default()
    };
    let created = new_booking.insert(&txn).await?;

    activity::log_activity(
        &txn,
        &request.user_id,
        "booking.create",
        Some(format!(
            "#{} {} {}",
            created.id,
            created.booking_type,
            report::format_cents(price)
        )),
    )
    .await?;

    txn.commit().await?;
    Ok(created)
}

/// Opens a bookable window for `booking_type`.
pub async fn open_availability(
    db: &DatabaseConnection,
    admin_id: &str,
    booking_type: BookingType,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<availability::Model> {
    validate_range(start, end)?;

    let window = availability::ActiveModel {
        booking_type: Set(booking_type),
        start_time: Set(start),
        end_time: Set(end),
        created_by: Set(admin_id.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let window = window.insert(db).await?;
    info!(window_id = window.id, %booking_type, "Opened availability window");
    Ok(window)
}

/// Availability windows that have not ended by `after`, soonest first.
pub async fn upcoming_availability(
    db: &DatabaseConnection,
    booking_type: Option<BookingType>,
    after: DateTime<Utc>,
) -> Result<Vec<availability::Model>> {
    let mut query = Availability::find().filter(availability::Column::EndTime.gt(after));
    if let Some(booking_type) = booking_type {
        query = query.filter(availability::Column::BookingType.eq(booking_type));
    }
    query
        .order_by_asc(availability::Column::StartTime)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a booking by ID.
pub async fn get_booking(db: &DatabaseConnection, booking_id: i64) -> Result<Option<booking::Model>> {
    Booking::find_by_id(booking_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// All bookings of a user, soonest first.
pub async fn list_bookings_for_user(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Vec<booking::Model>> {
    Booking::find()
        .filter(booking::Column::UserId.eq(user_id))
        .order_by_asc(booking::Column::StartTime)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Moves a booking to `next` with an update conditioned on the status it was read in.
///
/// When another writer changed the status first, the booking is re-read and the move is
/// judged against its new status. Returns the booking and whether it changed; asking to
/// cancel a cancelled booking is a no-op.
async fn transition<C>(
    db: &C,
    mut current: booking::Model,
    next: BookingStatus,
) -> Result<(booking::Model, bool)>
where
    C: ConnectionTrait,
{
    loop {
        if current.status == next && next == BookingStatus::Cancelled {
            return Ok((current, false));
        }
        if !current.status.can_transition_to(next) {
            return Err(Error::InvalidBookingTransition {
                from: current.status,
                to: next,
            });
        }

        let previous = current.status;
        let update = Booking::update_many()
            .col_expr(booking::Column::Status, Expr::value(next))
            .col_expr(booking::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(booking::Column::Id.eq(current.id))
            .filter(booking::Column::Status.eq(previous))
            .exec(db)
            .await?;
        current = require_booking(db, current.id).await?;

        if update.rows_affected > 0 {
            info!(booking_id = current.id, from = %previous, to = %next, "Booking status changed");
            return Ok((current, true));
        }
        debug!(booking_id = current.id, status = %current.status, "Booking changed underneath, re-checking");
    }
}

async fn require_booking<C>(db: &C, booking_id: i64) -> Result<booking::Model>
where
    C: ConnectionTrait,
{
    Booking::find_by_id(booking_id)
        .one(db)
        .await?
        .ok_or(Error::BookingNotFound { id: booking_id })
}

/// Cancels a booking on behalf of `actor_id`.
///
/// Only the owner or an admin may cancel. Cancelling an already cancelled booking
/// returns it unchanged; completed bookings cannot be cancelled.
pub async fn cancel_booking(
    db: &DatabaseConnection,
    booking_id: i64,
    actor_id: &str,
    is_admin: bool,
) -> Result<booking::Model> {
    let existing = require_booking(db, booking_id).await?;

    if existing.user_id != actor_id && !is_admin {
        return Err(Error::Forbidden {
            message: format!("booking #{booking_id} belongs to another member"),
        });
    }

    let existing = &existing;
    retry_on_busy(move || cancel_once(db, existing, actor_id)).await
}

async fn cancel_once(
    db: &DatabaseConnection,
    existing: &booking::Model,
    actor_id: &str,
) -> Result<booking::Model> {
    let txn = db.begin().await?;
    let (updated, changed) = transition(&txn, existing.clone(), BookingStatus::Cancelled).await?;
    if changed {
        activity::log_activity(
            &txn,
            actor_id,
            "booking.cancel",
            Some(format!("#{}", updated.id)),
        )
        .await?;
    }
    txn.commit().await?;
    Ok(updated)
}

/// Confirms a pending booking (admin action).
pub async fn confirm_booking(db: &DatabaseConnection, booking_id: i64) -> Result<booking::Model> {
    let existing = require_booking(db, booking_id).await?;
    let (updated, _) = transition(db, existing, BookingStatus::Confirmed).await?;
    Ok(updated)
}

/// Marks a confirmed booking as completed (admin action).
pub async fn complete_booking(db: &DatabaseConnection, booking_id: i64) -> Result<booking::Model> {
    let existing = require_booking(db, booking_id).await?;
    let (updated, _) = transition(db, existing, BookingStatus::Completed).await?;
    Ok(updated)
}

/// Number of bookings per status, for the admin dashboard.
pub async fn count_by_status(db: &DatabaseConnection) -> Result<Vec<(BookingStatus, u64)>> {
    let mut counts = Vec::new();
    for status in [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ] {
        let count = Booking::find()
            .filter(booking::Column::Status.eq(status))
            .count(db)
            .await?;
        counts.push((status, count));
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use chrono::{Duration, TimeZone};
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 6, 1, hour, 0, 0).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 5, 1, 12, 0, 0).unwrap()
    }

    fn request(user: &str, booking_type: BookingType, start: u32, end: u32) -> NewBooking {
        NewBooking {
            user_id: user.to_string(),
            booking_type,
            start_time: at(start),
            end_time: at(end),
            notes: Some("Bring the vinyl".to_string()),
        }
    }

    #[test]
    fn test_calculate_price() {
        let rates = HourlyRates::default();

        assert_eq!(
            calculate_price(&rates, BookingType::Dj, at(18), at(21)).unwrap(),
            90_000
        );
        assert_eq!(
            calculate_price(&rates, BookingType::Studio, at(10), at(12)).unwrap(),
            20_000
        );
        // 90 minutes of consulting at 150/h
        assert_eq!(
            calculate_price(
                &rates,
                BookingType::Consulting,
                at(9),
                at(9) + Duration::minutes(90)
            )
            .unwrap(),
            22_500
        );
    }

    #[test]
    fn test_calculate_price_rejects_empty_range() {
        let rates = HourlyRates::default();
        assert!(matches!(
            calculate_price(&rates, BookingType::Dj, at(18), at(18)),
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            calculate_price(&rates, BookingType::Dj, at(20), at(18)),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn test_parse_datetime() {
        assert_eq!(parse_datetime("2030-06-01 18:00").unwrap(), at(18));
        assert!(parse_datetime("tomorrow at six").is_err());
    }

    #[test]
    fn test_status_machine() {
        use BookingStatus::{Cancelled, Completed, Confirmed, Pending};
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Confirmed));
    }

    #[tokio::test]
    async fn test_create_booking() -> Result<()> {
        let db = setup_test_db().await?;
        open_test_window(&db, BookingType::Studio, at(8), at(22)).await?;

        let booking = create_booking(
            &db,
            &HourlyRates::default(),
            request("user_a", BookingType::Studio, 10, 12),
            now(),
        )
        .await?;

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.price, 20_000);
        assert_eq!(booking.start_time, at(10));
        assert_eq!(booking.notes.as_deref(), Some("Bring the vinyl"));

        Ok(())
    }

    #[tokio::test]
    async fn test_booking_requires_window() -> Result<()> {
        let db = setup_test_db().await?;
        open_test_window(&db, BookingType::Studio, at(8), at(11)).await?;

        // Runs past the end of the window
        let result = create_booking(
            &db,
            &HourlyRates::default(),
            request("user_a", BookingType::Studio, 10, 12),
            now(),
        )
        .await;
        assert!(matches!(result, Err(Error::SlotUnavailable { .. })));

        // No window at all for DJs
        let result = create_booking(
            &db,
            &HourlyRates::default(),
            request("user_a", BookingType::Dj, 9, 10),
            now(),
        )
        .await;
        assert!(matches!(result, Err(Error::SlotUnavailable { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_overlapping_booking_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let rates = HourlyRates::default();
        open_test_window(&db, BookingType::Dj, at(8), at(23)).await?;

        create_booking(&db, &rates, request("user_a", BookingType::Dj, 18, 21), now()).await?;

        let result =
            create_booking(&db, &rates, request("user_b", BookingType::Dj, 20, 22), now()).await;
        assert!(matches!(result, Err(Error::SlotUnavailable { .. })));

        // Back-to-back is fine because intervals are half-open
        create_booking(&db, &rates, request("user_b", BookingType::Dj, 21, 23), now()).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_cancelled_booking_frees_slot() -> Result<()> {
        let db = setup_test_db().await?;
        let rates = HourlyRates::default();
        open_test_window(&db, BookingType::Dj, at(8), at(23)).await?;

        let first =
            create_booking(&db, &rates, request("user_a", BookingType::Dj, 18, 21), now()).await?;
        cancel_booking(&db, first.id, "user_a", false).await?;

        assert!(is_slot_available(&db, BookingType::Dj, at(18), at(21)).await?);
        create_booking(&db, &rates, request("user_b", BookingType::Dj, 18, 21), now()).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_requests_for_same_slot() -> Result<()> {
        let db = setup_test_db().await?;
        let rates = HourlyRates::default();
        open_test_window(&db, BookingType::Studio, at(8), at(22)).await?;

        let (first, second) = tokio::join!(
            create_booking(&db, &rates, request("user_a", BookingType::Studio, 10, 12), now()),
            create_booking(&db, &rates, request("user_b", BookingType::Studio, 11, 13), now())
        );
        assert!(first.is_ok() != second.is_ok());

        Ok(())
    }

    #[tokio::test]
    async fn test_booking_in_past_rejected() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_booking(
            &db,
            &HourlyRates::default(),
            request("user_a", BookingType::Studio, 10, 12),
            at(11),
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        open_test_window(&db, BookingType::Studio, at(8), at(22)).await?;
        let booking = create_booking(
            &db,
            &HourlyRates::default(),
            request("user_a", BookingType::Studio, 10, 12),
            now(),
        )
        .await?;

        let first = cancel_booking(&db, booking.id, "user_a", false).await?;
        let second = cancel_booking(&db, booking.id, "user_a", false).await?;

        assert_eq!(first.status, BookingStatus::Cancelled);
        assert_eq!(second.status, BookingStatus::Cancelled);
        assert_eq!(first.updated_at, second.updated_at);

        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_requires_owner_or_admin() -> Result<()> {
        let db = setup_test_db().await?;
        open_test_window(&db, BookingType::Studio, at(8), at(22)).await?;
        let booking = create_booking(
            &db,
            &HourlyRates::default(),
            request("user_a", BookingType::Studio, 10, 12),
            now(),
        )
        .await?;

        let result = cancel_booking(&db, booking.id, "user_b", false).await;
        assert!(matches!(result, Err(Error::Forbidden { .. })));

        let cancelled = cancel_booking(&db, booking.id, "admin", true).await?;
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        let result = cancel_booking(&db, 9_999, "user_a", false).await;
        assert!(matches!(result, Err(Error::BookingNotFound { id: 9_999 })));

        Ok(())
    }

    #[tokio::test]
    async fn test_lifecycle_transitions() -> Result<()> {
        let db = setup_test_db().await?;
        open_test_window(&db, BookingType::Consulting, at(8), at(22)).await?;
        let booking = create_booking(
            &db,
            &HourlyRates::default(),
            request("user_a", BookingType::Consulting, 9, 10),
            now(),
        )
        .await?;

        // Cannot complete before confirming
        let result = complete_booking(&db, booking.id).await;
        assert!(matches!(
            result,
            Err(Error::InvalidBookingTransition {
                from: BookingStatus::Pending,
                to: BookingStatus::Completed
            })
        ));

        confirm_booking(&db, booking.id).await?;
        let completed = complete_booking(&db, booking.id).await?;
        assert_eq!(completed.status, BookingStatus::Completed);

        let result = cancel_booking(&db, booking.id, "user_a", false).await;
        assert!(matches!(
            result,
            Err(Error::InvalidBookingTransition {
                from: BookingStatus::Completed,
                to: BookingStatus::Cancelled
            })
        ));

        let counts = count_by_status(&db).await?;
        assert!(counts.contains(&(BookingStatus::Completed, 1)));
        assert!(counts.contains(&(BookingStatus::Pending, 0)));

        Ok(())
    }

    #[tokio::test]
    async fn test_list_bookings_soonest_first() -> Result<()> {
        let db = setup_test_db().await?;
        let rates = HourlyRates::default();
        open_test_window(&db, BookingType::Studio, at(8), at(22)).await?;

        create_booking(&db, &rates, request("user_a", BookingType::Studio, 15, 16), now()).await?;
        create_booking(&db, &rates, request("user_a", BookingType::Studio, 9, 10), now()).await?;
        create_booking(&db, &rates, request("user_b", BookingType::Studio, 12, 13), now()).await?;

        let mine = list_bookings_for_user(&db, "user_a").await?;
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].start_time, at(9));
        assert_eq!(mine[1].start_time, at(15));

        let windows = upcoming_availability(&db, Some(BookingType::Studio), now()).await?;
        assert_eq!(windows.len(), 1);
        assert!(upcoming_availability(&db, Some(BookingType::Dj), now()).await?.is_empty());

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_requests_on_shared_database() -> Result<()> {
        let shared = setup_file_test_db().await?;
        open_test_window(&shared.db, BookingType::Studio, at(0), at(23)).await?;

        for hour in (0..20).step_by(3) {
            let book = |user: &'static str, start: u32| {
                let db = share_pool(&shared.db);
                tokio::spawn(async move {
                    create_booking(
                        &db,
                        &HourlyRates::default(),
                        request(user, BookingType::Studio, start, start + 2),
                        now(),
                    )
                    .await
                })
            };
            let (first, second) = tokio::join!(book("user_a", hour), book("user_b", hour + 1));
            let results = [first.unwrap(), second.unwrap()];

            assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
            assert!(
                results
                    .iter()
                    .any(|r| matches!(r, Err(Error::SlotUnavailable { .. })))
            );
        }

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_cancel_and_complete() -> Result<()> {
        let shared = setup_file_test_db().await?;
        let db = &shared.db;
        open_test_window(db, BookingType::Consulting, at(0), at(23)).await?;

        for hour in 0..20 {
            let booking_id = create_booking(
                db,
                &HourlyRates::default(),
                request("user_a", BookingType::Consulting, hour, hour + 1),
                now(),
            )
            .await?
            .id;
            confirm_booking(db, booking_id).await?;

            let cancel = {
                let db = share_pool(db);
                tokio::spawn(async move { cancel_booking(&db, booking_id, "user_a", false).await })
            };
            let complete = {
                let db = share_pool(db);
                tokio::spawn(async move { complete_booking(&db, booking_id).await })
            };
            let (cancelled, completed) = tokio::join!(cancel, complete);
            let (cancelled, completed) = (cancelled.unwrap(), completed.unwrap());

            let stored = get_booking(db, booking_id).await?.unwrap();
            match (&cancelled, &completed) {
                (Ok(_), Err(Error::InvalidBookingTransition { from, to })) => {
                    assert_eq!(*from, BookingStatus::Cancelled);
                    assert_eq!(*to, BookingStatus::Completed);
                    assert_eq!(stored.status, BookingStatus::Cancelled);
                }
                (Err(Error::InvalidBookingTransition { from, to }), Ok(_)) => {
                    assert_eq!(*from, BookingStatus::Completed);
                    assert_eq!(*to, BookingStatus::Cancelled);
                    assert_eq!(stored.status, BookingStatus::Completed);
                }
                other => panic!("both transitions were accepted or both failed: {other:?}"),
            }
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_after_concurrent_confirm_still_cancels() -> Result<()> {
        let db = setup_test_db().await?;
        open_test_window(&db, BookingType::Dj, at(8), at(22)).await?;
        let booking = create_booking(
            &db,
            &HourlyRates::default(),
            request("user_a", BookingType::Dj, 18, 20),
            now(),
        )
        .await?;

        // A copy read while pending, then confirmed by an admin before the cancel lands
        let stale = booking.clone();
        confirm_booking(&db, booking.id).await?;
        let (cancelled, changed) = transition(&db, stale.clone(), BookingStatus::Cancelled).await?;
        assert!(changed);
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        // The same stale copy can no longer confirm a cancelled booking
        let result = transition(&db, stale, BookingStatus::Confirmed).await;
        assert!(matches!(
            result,
            Err(Error::InvalidBookingTransition {
                from: BookingStatus::Cancelled,
                to: BookingStatus::Confirmed
            })
        ));

        Ok(())
    }
}
