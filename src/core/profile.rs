//! Profile business logic - Community identities.
//!
//! Profiles are keyed by the authentication identity (`user_id`). The bot calls
//! [`ensure_profile`] for the author of every command, so anyone who has used the service
//! has a profile and can receive JestCoins.

use crate::{
    entities::{Profile, profile},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, SqlErr, prelude::*, sea_query::OnConflict};
use tracing::{debug, info};

/// Longest accepted display name, in characters.
pub const MAX_DISPLAY_NAME_LENGTH: usize = 64;
/// Longest accepted bio, in characters.
pub const MAX_BIO_LENGTH: usize = 500;

/// Finds a profile by authentication identity.
pub async fn get_profile_by_user_id<C>(db: &C, user_id: &str) -> Result<Option<profile::Model>>
where
    C: ConnectionTrait,
{
    Profile::find()
        .filter(profile::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a profile by its unique username.
pub async fn get_profile_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<profile::Model>> {
    Profile::find()
        .filter(profile::Column::Username.eq(username))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Returns the profile for `user_id`, creating it with `username` if missing.
///
/// Usernames are unique; when `username` is taken by someone else the new profile gets
/// the user ID appended to it.
pub async fn ensure_profile(
    db: &DatabaseConnection,
    user_id: &str,
    username: &str,
) -> Result<profile::Model> {
    if let Some(existing) = get_profile_by_user_id(db, user_id).await? {
        return Ok(existing);
    }

    let username = username.trim();
    if username.is_empty() {
        return Err(Error::validation("Username cannot be empty"));
    }

    let suffixed = format!("{username}-{user_id}");
    let handle = if get_profile_by_username(db, username).await?.is_some() {
        suffixed.as_str()
    } else {
        username
    };

    let inserted = match insert_profile(db, user_id, handle, username).await {
        Err(Error::Database(err))
            if handle == username
                && matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
        {
            // Someone else took the username between the check and the insert
            debug!(user_id, username, "Username taken concurrently, using suffixed handle");
            insert_profile(db, user_id, &suffixed, username).await?
        }
        other => other?,
    };
    if inserted > 0 {
        info!(user_id, "Created profile");
    }

    get_profile_by_user_id(db, user_id)
        .await?
        .ok_or_else(|| Error::ProfileNotFound {
            user_id: user_id.to_string(),
        })
}

/// Inserts a profile unless one exists for `user_id`. Returns the number of rows written.
async fn insert_profile(
    db: &DatabaseConnection,
    user_id: &str,
    handle: &str,
    display_name: &str,
) -> Result<u64> {
    let now = Utc::now();
    let new_profile = profile::ActiveModel {
        user_id: Set(user_id.to_string()),
        username: Set(handle.to_string()),
        display_name: Set(display_name.to_string()),
        bio: Set(None),
        avatar_url: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    Profile::insert(new_profile)
        .on_conflict(
            OnConflict::column(profile::Column::UserId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await
        .map_err(Into::into)
}

/// Changes to apply to a profile. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    /// Name shown next to posts
    pub display_name: Option<String>,
    /// Short self-description
    pub bio: Option<String>,
    /// Link to an avatar image
    pub avatar_url: Option<String>,
}

/// Updates the editable fields of a profile.
pub async fn update_profile(
    db: &DatabaseConnection,
    user_id: &str,
    changes: ProfileUpdate,
) -> Result<profile::Model> {
    let mut active: profile::ActiveModel = get_profile_by_user_id(db, user_id)
        .await?
        .ok_or_else(|| Error::ProfileNotFound {
            user_id: user_id.to_string(),
        })?
        .into();

    if let Some(display_name) = changes.display_name {
        let display_name = display_name.trim().to_string();
        if display_name.is_empty() {
            return Err(Error::validation("Display name cannot be empty"));
        }
        if display_name.chars().count() > MAX_DISPLAY_NAME_LENGTH {
            return Err(Error::validation(format!(
                "Display name is limited to {MAX_DISPLAY_NAME_LENGTH} characters"
            )));
        }
        active.display_name = Set(display_name);
    }

    if let Some(bio) = changes.bio {
        if bio.chars().count() > MAX_BIO_LENGTH {
            return Err(Error::validation(format!(
                "Bio is limited to {MAX_BIO_LENGTH} characters"
            )));
        }
        let bio = bio.trim().to_string();
        active.bio = Set((!bio.is_empty()).then_some(bio));
    }

    if let Some(avatar_url) = changes.avatar_url {
        let avatar_url = avatar_url.trim().to_string();
        active.avatar_url = Set((!avatar_url.is_empty()).then_some(avatar_url));
    }

    active.updated_at = Set(Utc::now());
    active.update(db).await.map_err(Into::into)
}

/// Every profile, oldest first.
pub async fn get_all_profiles<C>(db: &C) -> Result<Vec<profile::Model>>
where
    C: ConnectionTrait,
{
    Profile::find()
        .order_by_asc(profile::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Number of registered profiles.
pub async fn count_profiles(db: &DatabaseConnection) -> Result<u64> {
    Profile::find().count(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_ensure_profile_creates_once() -> Result<()> {
        let db = setup_test_db().await?;

        let first = ensure_profile(&db, "100", "dj_nova").await?;
        let second = ensure_profile(&db, "100", "renamed").await?;

        assert_eq!(first.id, second.id);
        assert_eq!(second.username, "dj_nova");
        assert_eq!(count_profiles(&db).await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_ensure_profile_disambiguates_taken_username() -> Result<()> {
        let db = setup_test_db().await?;

        ensure_profile(&db, "100", "nova").await?;
        let other = ensure_profile(&db, "200", "nova").await?;

        assert_eq!(other.username, "nova-200");
        assert_eq!(other.display_name, "nova");

        Ok(())
    }

    #[tokio::test]
    async fn test_taken_username_is_a_unique_violation() -> Result<()> {
        let db = setup_test_db().await?;
        ensure_profile(&db, "100", "nova").await?;

        let result = insert_profile(&db, "200", "nova", "nova").await;
        assert!(matches!(
            result,
            Err(Error::Database(ref err))
                if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
        ));
        // Same user again is a silent no-op
        assert_eq!(insert_profile(&db, "100", "nova", "nova").await?, 0);

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_first_time_members_with_same_name() -> Result<()> {
        let shared = setup_file_test_db().await?;

        for round in 0..10 {
            let name = format!("dj-{round}");
            let join = |user_id: String| {
                let db = share_pool(&shared.db);
                let name = name.clone();
                tokio::spawn(async move { ensure_profile(&db, &user_id, &name).await })
            };
            let (first, second) =
                tokio::join!(join(format!("a{round}")), join(format!("b{round}")));
            let (first, second) = (first.unwrap()?, second.unwrap()?);

            assert_ne!(first.username, second.username);
            assert!(first.username == name || second.username == name);
        }
        assert_eq!(count_profiles(&shared.db).await?, 20);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_profile() -> Result<()> {
        let db = setup_test_db().await?;
        ensure_profile(&db, "100", "nova").await?;

        let updated = update_profile(
            &db,
            "100",
            ProfileUpdate {
                display_name: Some("  DJ Nova ".to_string()),
                bio: Some("House and techno".to_string()),
                avatar_url: None,
            },
        )
        .await?;
        assert_eq!(updated.display_name, "DJ Nova");
        assert_eq!(updated.bio.as_deref(), Some("House and techno"));

        let cleared = update_profile(
            &db,
            "100",
            ProfileUpdate {
                bio: Some(String::new()),
                ..Default::default()
            },
        )
        .await?;
        assert!(cleared.bio.is_none());
        assert_eq!(cleared.display_name, "DJ Nova");

        Ok(())
    }

    #[tokio::test]
    async fn test_update_profile_validation() -> Result<()> {
        let db = setup_test_db().await?;
        ensure_profile(&db, "100", "nova").await?;

        let result = update_profile(
            &db,
            "100",
            ProfileUpdate {
                display_name: Some("   ".to_string()),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = update_profile(&db, "missing", ProfileUpdate::default()).await;
        assert!(matches!(result, Err(Error::ProfileNotFound { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_lookup_by_username() -> Result<()> {
        let db = setup_test_db().await?;
        ensure_profile(&db, "100", "nova").await?;

        let found = get_profile_by_username(&db, "nova").await?.unwrap();
        assert_eq!(found.user_id, "100");
        assert!(get_profile_by_username(&db, "ghost").await?.is_none());

        Ok(())
    }
}
