//! Store Discord commands - `shop`, `buy` and `orders`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, ensure_author, handlers::autocomplete},
        core::{
            report,
            store::{self, CartItem},
        },
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use std::fmt::Write;

    /// Lists the products for sale.
    #[poise::command(slash_command)]
    pub async fn shop(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ensure_author(ctx).await?;
        let products = store::get_all_active_products(&ctx.data().database).await?;

        if products.is_empty() {
            ctx.say("The store is empty right now. Check back soon!").await?;
            return Ok(());
        }

        let fields: Vec<(String, String, bool)> = products
            .into_iter()
            .map(|prod| {
                let stock = prod
                    .stock
                    .map_or_else(|| "unlimited".to_string(), |s| format!("{s} left"));
                let description = prod.description.unwrap_or_default();
                (
                    format!("{} ({})", prod.name, report::format_coins(prod.price)),
                    format!("{description}\n*{stock}*"),
                    false,
                )
            })
            .collect();

        let embed = serenity::CreateEmbed::default()
            .title("**JESTFLY Store**")
            .color(0x0058_65F2)
            .fields(fields);

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Buys a product with JestCoins.
    #[poise::command(slash_command)]
    pub async fn buy(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product to buy"]
        #[autocomplete = "autocomplete::autocomplete_product_name"]
        product: String,
        #[description = "Quantity (defaults to 1)"]
        #[min = 1]
        quantity: Option<i32>,
    ) -> Result<()> {
        let own = ensure_author(ctx).await?;
        let db = &ctx.data().database;

        let Some(found) = store::get_product_by_name(db, &product).await? else {
            ctx.say(format!(
                "❌ Product '{product}' not found. Use `/shop` to see what's for sale."
            ))
            .await?;
            return Ok(());
        };

        let quantity = quantity.unwrap_or(1);
        let receipt = store::checkout(
            db,
            &own.user_id,
            &[CartItem {
                product_id: found.id,
                quantity,
            }],
            Some(format!("discord:{}", ctx.id())),
        )
        .await?;

        ctx.say(format!(
            "🛍️ Order #{}: {quantity}x {} for **{}**. Balance: **{}**",
            receipt.order.id,
            found.name,
            report::format_coins(receipt.order.total),
            report::format_coins(receipt.new_balance)
        ))
        .await?;
        Ok(())
    }

    /// Shows your latest orders.
    #[poise::command(slash_command)]
    pub async fn orders(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let own = ensure_author(ctx).await?;
        let data = ctx.data();

        let orders =
            store::get_orders_for_user(&data.database, &own.user_id, data.config.wallet.history_limit)
                .await?;
        if orders.is_empty() {
            ctx.say("You have no orders yet. Use `/shop` to browse.").await?;
            return Ok(());
        }

        let mut text = String::from("**Your orders**\n");
        for order in &orders {
            let lines = store::get_order_items(&data.database, order.id).await?;
            let items = lines
                .iter()
                .map(|(item, product)| {
                    let name = product.as_ref().map_or("Unknown product", |p| p.name.as_str());
                    format!("{}x {name}", item.quantity)
                })
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(
                text,
                "#{} `{}` {} - {items}",
                order.id,
                order.created_at.format("%Y-%m-%d"),
                report::format_coins(order.total)
            )?;
        }
        ctx.say(text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
