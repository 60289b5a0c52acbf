//! Booking Discord commands - `slots`, `book`, `bookings` and `cancel_booking`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, ensure_author, handlers::autocomplete},
        core::{
            booking::{self, NewBooking},
            report,
        },
        entities::{BookingModel, BookingType},
        errors::{Error, Result},
    };
    use chrono::Utc;
    use std::fmt::Write;

    fn parse_booking_type(input: &str) -> Result<BookingType> {
        BookingType::parse(input).ok_or_else(|| {
            Error::validation(format!(
                "Unknown booking type '{input}': use dj, studio or consulting"
            ))
        })
    }

    fn booking_line(booking: &BookingModel) -> String {
        format!(
            "#{} **{}** {} → {} ({}, {})",
            booking.id,
            booking.booking_type,
            booking.start_time.format("%Y-%m-%d %H:%M"),
            booking.end_time.format("%H:%M"),
            report::format_cents(booking.price),
            booking.status
        )
    }

    /// Shows the open booking windows.
    #[poise::command(slash_command)]
    pub async fn slots(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Only show this booking type"]
        #[autocomplete = "autocomplete::autocomplete_booking_type"]
        booking_type: Option<String>,
    ) -> Result<()> {
        ensure_author(ctx).await?;
        let booking_type = booking_type.as_deref().map(parse_booking_type).transpose()?;

        let windows =
            booking::upcoming_availability(&ctx.data().database, booking_type, Utc::now()).await?;
        if windows.is_empty() {
            ctx.say("No open booking windows right now.").await?;
            return Ok(());
        }

        let mut text = String::from("**Open windows** (UTC)\n");
        for window in &windows {
            writeln!(
                text,
                "**{}** {} → {}",
                window.booking_type,
                window.start_time.format("%Y-%m-%d %H:%M"),
                window.end_time.format("%Y-%m-%d %H:%M")
            )?;
        }
        ctx.say(text).await?;
        Ok(())
    }

    /// Books a DJ, the studio or a consultant.
    #[poise::command(slash_command)]
    pub async fn book(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "What to book"]
        #[autocomplete = "autocomplete::autocomplete_booking_type"]
        booking_type: String,
        #[description = "Start, YYYY-MM-DD HH:MM (UTC)"] start: String,
        #[description = "End, YYYY-MM-DD HH:MM (UTC)"] end: String,
        #[description = "Anything we should know"] notes: Option<String>,
    ) -> Result<()> {
        let own = ensure_author(ctx).await?;
        let data = ctx.data();

        let request = NewBooking {
            user_id: own.user_id,
            booking_type: parse_booking_type(&booking_type)?,
            start_time: booking::parse_datetime(&start)?,
            end_time: booking::parse_datetime(&end)?,
            notes,
        };
        let created = booking::create_booking(
            &data.database,
            &data.config.booking.hourly_rates,
            request,
            Utc::now(),
        )
        .await?;

        ctx.say(format!(
            "📅 Booking requested: {}\nAn admin will confirm it soon.",
            booking_line(&created)
        ))
        .await?;
        Ok(())
    }

    /// Shows your bookings, soonest first.
    #[poise::command(slash_command)]
    pub async fn bookings(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let own = ensure_author(ctx).await?;

        let bookings = booking::list_bookings_for_user(&ctx.data().database, &own.user_id).await?;
        if bookings.is_empty() {
            ctx.say("You have no bookings. Use `/slots` to find a time.").await?;
            return Ok(());
        }

        let mut text = String::from("**Your bookings** (UTC)\n");
        for booking in &bookings {
            writeln!(text, "{}", booking_line(booking))?;
        }
        ctx.say(text).await?;
        Ok(())
    }

    /// Cancels one of your bookings.
    #[poise::command(slash_command)]
    pub async fn cancel_booking(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Booking number"] booking_id: i64,
    ) -> Result<()> {
        let own = ensure_author(ctx).await?;
        let data = ctx.data();

        let cancelled = booking::cancel_booking(
            &data.database,
            booking_id,
            &own.user_id,
            data.is_admin(&own.user_id),
        )
        .await?;

        ctx.say(format!("✅ Cancelled: {}", booking_line(&cancelled)))
            .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
