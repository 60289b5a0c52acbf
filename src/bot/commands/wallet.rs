//! Wallet Discord commands - `balance`, `history`, `transfer` and `daily`.
//!
//! Amounts are typed in whole JestCoins with up to two decimals and converted to minor
//! units before they reach the core.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, ensure_author},
        core::{
            report, rewards,
            transfer::{self as transfer_core, TransferRequest},
            wallet,
        },
        errors::{Error, Result},
    };
    use chrono::Utc;
    use poise::serenity_prelude as serenity;
    use std::fmt::Write;

    /// Shows your JestCoin balance.
    #[poise::command(slash_command)]
    pub async fn balance(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let own = ensure_author(ctx).await?;
        let data = ctx.data();

        let summary =
            report::generate_wallet_report(&data.database, &own.user_id, data.config.wallet.history_limit)
                .await?;

        let embed = serenity::CreateEmbed::default()
            .title("JestCoin Wallet")
            .field("Balance", report::format_coins(summary.balance), false)
            .field("Received", report::format_coins(summary.total_received), true)
            .field("Spent", report::format_coins(summary.total_spent), true)
            .color(0x00F5_A623);

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Shows your latest ledger entries, newest first.
    #[poise::command(slash_command)]
    pub async fn history(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "How many entries to show"]
        #[min = 1]
        #[max = 50]
        limit: Option<u64>,
    ) -> Result<()> {
        let own = ensure_author(ctx).await?;
        let data = ctx.data();
        let limit = limit.unwrap_or(data.config.wallet.history_limit);

        let rows = wallet::get_transaction_history(&data.database, &own.user_id, limit).await?;
        if rows.is_empty() {
            ctx.say("No transactions yet. Try `/daily`!").await?;
            return Ok(());
        }

        let mut text = String::from("**Recent transactions**\n");
        for row in &rows {
            writeln!(
                text,
                "`{}` {}",
                row.created_at.format("%Y-%m-%d %H:%M"),
                report::format_transaction_summary(row)
            )?;
        }
        ctx.say(text).await?;
        Ok(())
    }

    /// Sends JestCoins to another member.
    #[poise::command(slash_command)]
    pub async fn transfer(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Member receiving the JestCoins"] recipient: serenity::User,
        #[description = "Amount in JestCoins (e.g., 12.50)"] amount: f64,
        #[description = "Optional note for the recipient"] description: Option<String>,
    ) -> Result<()> {
        let own = ensure_author(ctx).await?;
        let amount = report::parse_coins(amount)?;
        let data = ctx.data();

        let receipt = transfer_core::transfer(
            &data.database,
            TransferRequest {
                sender_id: own.user_id,
                recipient_id: recipient.id.to_string(),
                amount,
                description,
                // Discord redelivers the same interaction ID on retries
                idempotency_key: Some(format!("discord:{}", ctx.id())),
            },
        )
        .await?;

        ctx.say(format!(
            "✅ Sent **{}** to {}. Your balance: **{}**",
            report::format_coins(amount),
            recipient.name,
            report::format_coins(receipt.sender_balance)
        ))
        .await?;
        Ok(())
    }

    /// Claims today's JestCoin reward.
    #[poise::command(slash_command)]
    pub async fn daily(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let own = ensure_author(ctx).await?;
        let data = ctx.data();

        let claim = rewards::claim_daily_reward(
            &data.database,
            &own.user_id,
            data.config.rewards.daily_amount_minor(),
            Utc::now().date_naive(),
        )
        .await?;

        ctx.say(format!(
            "🎁 You claimed **{}**! Balance: **{}**. Come back tomorrow.",
            report::format_coins(claim.amount),
            report::format_coins(claim.new_balance)
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
