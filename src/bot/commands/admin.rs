//! Admin Discord commands - the `/admin` dashboard group.
//!
//! Every subcommand carries [`admin_check`](crate::bot::admin_check), so only IDs listed
//! in `JESTFLY_ADMIN_IDS` can run them.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, ensure_author, handlers::autocomplete},
        core::{
            activity, admin, booking, report,
            store::{self, ProductUpdate},
        },
        entities::BookingType,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use std::fmt::Write;

    fn parse_booking_type(input: &str) -> Result<BookingType> {
        BookingType::parse(input).ok_or_else(|| {
            Error::validation(format!(
                "Unknown booking type '{input}': use dj, studio or consulting"
            ))
        })
    }

    async fn find_product(
        ctx: poise::Context<'_, BotData, Error>,
        name: &str,
    ) -> Result<crate::entities::ProductModel> {
        store::get_product_by_name(&ctx.data().database, name)
            .await?
            .ok_or_else(|| Error::ProductNotFound {
                name: name.to_string(),
            })
    }

    /// Admin dashboard and management commands.
    #[poise::command(
        slash_command,
        check = "crate::bot::admin_check",
        subcommands(
            "admin_stats",
            "admin_airdrop",
            "admin_grant",
            "admin_deduct",
            "admin_open_slot",
            "admin_confirm_booking",
            "admin_complete_booking",
            "admin_product_add",
            "admin_product_update",
            "admin_product_delete",
            "admin_activity"
        )
    )]
    pub async fn admin(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Use one of the `/admin` subcommands.").await?;
        Ok(())
    }

    /// Shows the dashboard numbers.
    #[poise::command(slash_command, rename = "stats", check = "crate::bot::admin_check")]
    pub async fn admin_stats(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let stats = admin::dashboard_stats(&ctx.data().database).await?;

        let bookings = stats
            .bookings_by_status
            .iter()
            .map(|(status, count)| format!("{status}: {count}"))
            .collect::<Vec<_>>()
            .join("\n");

        let embed = serenity::CreateEmbed::default()
            .title("**JESTFLY Dashboard**")
            .field("Members", stats.profiles.to_string(), true)
            .field("Wallets", stats.wallets.to_string(), true)
            .field(
                "In circulation",
                report::format_coins(stats.coins_in_circulation),
                true,
            )
            .field("Ledger entries", stats.ledger_entries.to_string(), true)
            .field("Orders", stats.orders.to_string(), true)
            .field("Revenue", report::format_coins(stats.revenue), true)
            .field("Posts", stats.posts.to_string(), true)
            .field("Bookings", bookings, false)
            .color(0x0058_65F2);

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Gives every member the same amount of JestCoins.
    #[poise::command(slash_command, rename = "airdrop", check = "crate::bot::admin_check")]
    pub async fn admin_airdrop(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "JestCoins per member"] amount: f64,
        #[description = "Reason shown in every ledger"] description: Option<String>,
    ) -> Result<()> {
        let own = ensure_author(ctx).await?;
        let amount = report::parse_coins(amount)?;

        let recipients =
            admin::airdrop(&ctx.data().database, &own.user_id, amount, description).await?;

        ctx.say(format!(
            "🪂 Sent {} to {recipients} members.",
            report::format_coins(amount)
        ))
        .await?;
        Ok(())
    }

    /// Adds JestCoins to a member's wallet.
    #[poise::command(slash_command, rename = "grant", check = "crate::bot::admin_check")]
    pub async fn admin_grant(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Member to credit"] member: serenity::User,
        #[description = "Amount in JestCoins"] amount: f64,
        #[description = "Reason"] description: Option<String>,
    ) -> Result<()> {
        let own = ensure_author(ctx).await?;
        let amount = report::parse_coins(amount)?;

        let balance = admin::grant(
            &ctx.data().database,
            &own.user_id,
            &member.id.to_string(),
            amount,
            description,
        )
        .await?;

        ctx.say(format!(
            "✅ Granted {} to {}. New balance: {}",
            report::format_coins(amount),
            member.name,
            report::format_coins(balance)
        ))
        .await?;
        Ok(())
    }

    /// Removes JestCoins from a member's wallet.
    #[poise::command(slash_command, rename = "deduct", check = "crate::bot::admin_check")]
    pub async fn admin_deduct(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Member to debit"] member: serenity::User,
        #[description = "Amount in JestCoins"] amount: f64,
        #[description = "Reason"] description: Option<String>,
    ) -> Result<()> {
        let own = ensure_author(ctx).await?;
        let amount = report::parse_coins(amount)?;

        let balance = admin::deduct(
            &ctx.data().database,
            &own.user_id,
            &member.id.to_string(),
            amount,
            description,
        )
        .await?;

        ctx.say(format!(
            "✅ Deducted {} from {}. New balance: {}",
            report::format_coins(amount),
            member.name,
            report::format_coins(balance)
        ))
        .await?;
        Ok(())
    }

    /// Opens a bookable window.
    #[poise::command(slash_command, rename = "open_slot", check = "crate::bot::admin_check")]
    pub async fn admin_open_slot(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Booking type"]
        #[autocomplete = "autocomplete::autocomplete_booking_type"]
        booking_type: String,
        #[description = "Start, YYYY-MM-DD HH:MM (UTC)"] start: String,
        #[description = "End, YYYY-MM-DD HH:MM (UTC)"] end: String,
    ) -> Result<()> {
        let own = ensure_author(ctx).await?;
        let booking_type = parse_booking_type(&booking_type)?;

        let window = booking::open_availability(
            &ctx.data().database,
            &own.user_id,
            booking_type,
            booking::parse_datetime(&start)?,
            booking::parse_datetime(&end)?,
        )
        .await?;

        ctx.say(format!(
            "✅ Opened {} window {} → {}.",
            window.booking_type,
            window.start_time.format("%Y-%m-%d %H:%M"),
            window.end_time.format("%Y-%m-%d %H:%M")
        ))
        .await?;
        Ok(())
    }

    /// Confirms a pending booking.
    #[poise::command(
        slash_command,
        rename = "confirm_booking",
        check = "crate::bot::admin_check"
    )]
    pub async fn admin_confirm_booking(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Booking number"] booking_id: i64,
    ) -> Result<()> {
        let confirmed = booking::confirm_booking(&ctx.data().database, booking_id).await?;
        ctx.say(format!(
            "✅ Booking #{} is now {}.",
            confirmed.id, confirmed.status
        ))
        .await?;
        Ok(())
    }

    /// Marks a confirmed booking as completed.
    #[poise::command(
        slash_command,
        rename = "complete_booking",
        check = "crate::bot::admin_check"
    )]
    pub async fn admin_complete_booking(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Booking number"] booking_id: i64,
    ) -> Result<()> {
        let completed = booking::complete_booking(&ctx.data().database, booking_id).await?;
        ctx.say(format!(
            "✅ Booking #{} is now {}.",
            completed.id, completed.status
        ))
        .await?;
        Ok(())
    }

    /// Adds a product to the store.
    #[poise::command(slash_command, rename = "product_add", check = "crate::bot::admin_check")]
    pub async fn admin_product_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Unique product name (e.g., 'Tour Shirt')"] name: String,
        #[description = "Price in JestCoins"] price: f64,
        #[description = "Units available; leave empty for unlimited"]
        #[min = 0]
        stock: Option<i32>,
        #[description = "Catalogue description"] description: Option<String>,
    ) -> Result<()> {
        let price = report::parse_coins(price)?;

        let product =
            store::create_product(&ctx.data().database, &name, description, price, stock).await?;

        ctx.say(format!(
            "✅ Product '{}' added at **{}**.",
            product.name,
            report::format_coins(product.price)
        ))
        .await?;
        Ok(())
    }

    /// Updates a product's name, price, stock or description.
    #[poise::command(
        slash_command,
        rename = "product_update",
        check = "crate::bot::admin_check"
    )]
    pub async fn admin_product_update(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product to update"]
        #[autocomplete = "autocomplete::autocomplete_product_name"]
        product: String,
        #[description = "New name"] new_name: Option<String>,
        #[description = "New price in JestCoins"] price: Option<f64>,
        #[description = "New stock"]
        #[min = 0]
        stock: Option<i32>,
        #[description = "Make the product unlimited"] unlimited: Option<bool>,
        #[description = "New description"] description: Option<String>,
    ) -> Result<()> {
        let existing = find_product(ctx, &product).await?;

        let stock = if unlimited.unwrap_or(false) {
            Some(None)
        } else {
            stock.map(Some)
        };
        let changes = ProductUpdate {
            name: new_name,
            description,
            price: price.map(report::parse_coins).transpose()?,
            stock,
        };

        let updated = store::update_product(&ctx.data().database, existing.id, changes).await?;

        let stock = updated
            .stock
            .map_or_else(|| "unlimited".to_string(), |s| s.to_string());
        ctx.say(format!(
            "✅ '{}' now costs **{}** (stock: {stock}).",
            updated.name,
            report::format_coins(updated.price)
        ))
        .await?;
        Ok(())
    }

    /// Removes a product from the store. Past orders keep it.
    #[poise::command(
        slash_command,
        rename = "product_delete",
        check = "crate::bot::admin_check"
    )]
    pub async fn admin_product_delete(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product to delete"]
        #[autocomplete = "autocomplete::autocomplete_product_name"]
        product: String,
    ) -> Result<()> {
        let existing = find_product(ctx, &product).await?;
        store::delete_product(&ctx.data().database, existing.id).await?;

        ctx.say(format!("🗑️ Product '{}' deleted.", existing.name))
            .await?;
        Ok(())
    }

    /// Shows recent member activity.
    #[poise::command(slash_command, rename = "activity", check = "crate::bot::admin_check")]
    pub async fn admin_activity(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Only this member"] member: Option<serenity::User>,
        #[description = "How many entries"]
        #[min = 1]
        #[max = 50]
        limit: Option<u64>,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let limit = limit.unwrap_or(20);

        let entries = match &member {
            Some(user) => activity::activity_for_user(db, &user.id.to_string(), limit).await?,
            None => activity::recent_activity(db, limit).await?,
        };
        if entries.is_empty() {
            ctx.say("No activity recorded yet.").await?;
            return Ok(());
        }

        let mut text = String::from("**Recent activity**\n");
        for entry in &entries {
            writeln!(
                text,
                "`{}` <@{}> {} {}",
                entry.created_at.format("%Y-%m-%d %H:%M"),
                entry.user_id,
                entry.action,
                entry.details.as_deref().unwrap_or_default()
            )?;
        }
        ctx.say(text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
