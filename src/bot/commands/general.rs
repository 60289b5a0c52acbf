//! General Discord commands - ping and help.
//! These commands don't touch the database.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**JESTFLY Help**\n\
        Here is a summary of all available commands.\n\n\
        **JestCoin Wallet**\n\
        • `/balance` - Shows your balance and totals.\n\
        • `/history [limit]` - Shows your latest ledger entries.\n\
        • `/transfer <member> <amount> [description]` - Sends JestCoins to another member.\n\
        • `/daily` - Claims today's reward.\n\n\
        **Store**\n\
        • `/shop` - Lists products.\n\
        • `/buy <product> [quantity]` - Buys a product with JestCoins.\n\
        • `/orders` - Shows your orders.\n\n\
        **Bookings**\n\
        • `/slots [type]` - Shows open booking windows.\n\
        • `/book <type> <start> <end> [notes]` - Books a DJ, the studio or a consultant.\n\
        • `/bookings` - Shows your bookings.\n\
        • `/cancel_booking <id>` - Cancels one of your bookings.\n\n\
        **Community**\n\
        • `/post <content> [image_url]` - Publishes a post.\n\
        • `/feed [page]` - Shows the latest posts.\n\
        • `/comment <post_id> <content>` - Comments on a post.\n\
        • `/like [post_id] [comment_id]` - Likes or unlikes a post or comment.\n\
        • `/delete_post <post_id>` - Deletes one of your posts.\n\n\
        **Profile**\n\
        • `/profile show [member]` - Shows a profile.\n\
        • `/profile edit` - Edits your display name, bio or avatar.\n\n\
        Times are entered as `YYYY-MM-DD HH:MM` in UTC.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
