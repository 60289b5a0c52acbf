//! Community Discord commands - `post`, `feed`, `comment`, `like` and `delete_post`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, ensure_author},
        core::community,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    /// Publishes a post to the community feed.
    #[poise::command(slash_command)]
    pub async fn post(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "What's on your mind?"] content: String,
        #[description = "Optional image URL"] image_url: Option<String>,
    ) -> Result<()> {
        let own = ensure_author(ctx).await?;
        let data = ctx.data();

        let post = community::create_post(
            &data.database,
            &own.user_id,
            &content,
            image_url,
            data.config.community.max_post_length,
        )
        .await?;

        ctx.say(format!("✅ Posted as #{}.", post.id)).await?;
        Ok(())
    }

    /// Shows the latest posts.
    #[poise::command(slash_command)]
    pub async fn feed(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Page number (starts at 1)"]
        #[min = 1]
        page: Option<u64>,
    ) -> Result<()> {
        ensure_author(ctx).await?;
        let data = ctx.data();
        let page_size = data.config.community.feed_page_size;
        let offset = page.unwrap_or(1).saturating_sub(1).saturating_mul(page_size);

        let posts = community::list_feed(&data.database, page_size, offset).await?;
        if posts.is_empty() {
            ctx.say("Nothing here yet. Be the first to `/post`!").await?;
            return Ok(());
        }

        let mut reply = poise::CreateReply::default();
        for post in posts {
            let mut embed = serenity::CreateEmbed::default()
                .title(format!("Post #{}", post.id))
                .description(post.content)
                .field("By", format!("<@{}>", post.user_id), true)
                .field(
                    "❤️ / 💬",
                    format!("{} / {}", post.likes_count, post.comments_count),
                    true,
                );
            if let Ok(posted_at) = serenity::Timestamp::from_unix_timestamp(post.created_at.timestamp()) {
                embed = embed.timestamp(posted_at);
            }
            if let Some(image_url) = post.image_url {
                embed = embed.image(image_url);
            }
            reply = reply.embed(embed);
        }

        ctx.send(reply).await?;
        Ok(())
    }

    /// Comments on a post.
    #[poise::command(slash_command)]
    pub async fn comment(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Post number"] post_id: i64,
        #[description = "Your comment"] content: String,
    ) -> Result<()> {
        let own = ensure_author(ctx).await?;

        let comment =
            community::add_comment(&ctx.data().database, post_id, &own.user_id, &content).await?;

        ctx.say(format!("💬 Comment #{} added to post #{post_id}.", comment.id))
            .await?;
        Ok(())
    }

    /// Likes or unlikes a post or a comment.
    #[poise::command(slash_command)]
    pub async fn like(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Post number"] post_id: Option<i64>,
        #[description = "Comment number"] comment_id: Option<i64>,
    ) -> Result<()> {
        let own = ensure_author(ctx).await?;
        let db = &ctx.data().database;

        let (target, state) = match (post_id, comment_id) {
            (Some(post_id), None) => (
                format!("post #{post_id}"),
                community::toggle_post_like(db, post_id, &own.user_id).await?,
            ),
            (None, Some(comment_id)) => (
                format!("comment #{comment_id}"),
                community::toggle_comment_like(db, comment_id, &own.user_id).await?,
            ),
            _ => {
                return Err(Error::validation(
                    "Give either a post number or a comment number",
                ));
            }
        };

        let verb = if state.liked { "Liked" } else { "Unliked" };
        ctx.say(format!(
            "❤️ {verb} {target} ({} likes).",
            state.likes_count
        ))
        .await?;
        Ok(())
    }

    /// Deletes one of your posts with its comments and likes.
    #[poise::command(slash_command)]
    pub async fn delete_post(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Post number"] post_id: i64,
    ) -> Result<()> {
        let own = ensure_author(ctx).await?;
        let data = ctx.data();

        community::delete_post(
            &data.database,
            post_id,
            &own.user_id,
            data.is_admin(&own.user_id),
        )
        .await?;

        ctx.say(format!("🗑️ Post #{post_id} deleted.")).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
