//! Profile Discord commands - `profile show` and `profile edit`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, ensure_author},
        core::profile::{self, ProfileUpdate},
        entities::ProfileModel,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    fn profile_embed(profile: &ProfileModel) -> serenity::CreateEmbed {
        let mut embed = serenity::CreateEmbed::default()
            .title(&profile.display_name)
            .description(profile.bio.as_deref().unwrap_or("*No bio yet*"))
            .field("Username", format!("@{}", profile.username), true)
            .field(
                "Member since",
                profile.created_at.format("%Y-%m-%d").to_string(),
                true,
            )
            .color(0x00F5_A623);
        if let Some(avatar_url) = &profile.avatar_url {
            embed = embed.thumbnail(avatar_url);
        }
        embed
    }

    /// Shows or edits community profiles.
    #[poise::command(slash_command, subcommands("profile_show", "profile_edit"))]
    pub async fn profile(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Use `/profile show` or `/profile edit`.").await?;
        Ok(())
    }

    /// Shows your profile or another member's.
    #[poise::command(slash_command, rename = "show")]
    pub async fn profile_show(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Member to look up (defaults to you)"] member: Option<serenity::User>,
    ) -> Result<()> {
        let own = ensure_author(ctx).await?;

        let shown = match member {
            Some(user) => {
                let Some(found) =
                    profile::get_profile_by_user_id(&ctx.data().database, &user.id.to_string())
                        .await?
                else {
                    ctx.say(format!("{} has not joined JESTFLY yet.", user.name))
                        .await?;
                    return Ok(());
                };
                found
            }
            None => own,
        };

        ctx.send(poise::CreateReply::default().embed(profile_embed(&shown)))
            .await?;
        Ok(())
    }

    /// Edits your display name, bio or avatar.
    #[poise::command(slash_command, rename = "edit")]
    pub async fn profile_edit(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "New display name"] display_name: Option<String>,
        #[description = "New bio (send a single space to clear it)"] bio: Option<String>,
        #[description = "New avatar URL (send a single space to clear it)"] avatar_url: Option<
            String,
        >,
    ) -> Result<()> {
        let own = ensure_author(ctx).await?;

        if display_name.is_none() && bio.is_none() && avatar_url.is_none() {
            ctx.say("Nothing to change.").await?;
            return Ok(());
        }

        let updated = profile::update_profile(
            &ctx.data().database,
            &own.user_id,
            ProfileUpdate {
                display_name,
                bio,
                avatar_url,
            },
        )
        .await?;

        ctx.send(
            poise::CreateReply::default()
                .content("✅ Profile updated.")
                .embed(profile_embed(&updated)),
        )
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
