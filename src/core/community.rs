//! Community business logic - Posts, comments and likes.
//!
//! `likes_count` and `comments_count` are denormalised counters. They change in the same
//! database transaction as the row they count, using single-statement increments, and
//! the unique like indexes make sure one member counts once.

use crate::{
    config::database::retry_on_busy,
    entities::{
        CommentLike, CommunityPost, PostComment, PostLike, comment_like, community_post,
        post_comment, post_like,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{
    DatabaseTransaction, QueryOrder, QuerySelect, Set, TransactionTrait,
    prelude::*,
    sea_query::{Expr, OnConflict},
};
use tracing::{debug, info};

/// Longest accepted comment, in characters.
pub const MAX_COMMENT_LENGTH: usize = 1_000;

fn validate_content(content: &str, max_length: usize, what: &str) -> Result<String> {
    let content = content.trim();
    if content.is_empty() {
        return Err(Error::validation(format!("{what} cannot be empty")));
    }
    if content.chars().count() > max_length {
        return Err(Error::validation(format!(
            "{what} is limited to {max_length} characters"
        )));
    }
    Ok(content.to_string())
}

/// Publishes a post to the community feed.
pub async fn create_post(
    db: &DatabaseConnection,
    user_id: &str,
    content: &str,
    image_url: Option<String>,
    max_length: usize,
) -> Result<community_post::Model> {
    let content = validate_content(content, max_length, "Post")?;
    let now = Utc::now();

    let post = community_post::ActiveModel {
        user_id: Set(user_id.to_string()),
        content: Set(content),
        image_url: Set(image_url.filter(|url| !url.trim().is_empty())),
        likes_count: Set(0),
        comments_count: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let post = post.insert(db).await?;
    info!(post_id = post.id, user_id, "Published post");
    Ok(post)
}

/// One page of the feed, newest first.
pub async fn list_feed(
    db: &DatabaseConnection,
    limit: u64,
    offset: u64,
) -> Result<Vec<community_post::Model>> {
    CommunityPost::find()
        .order_by_desc(community_post::Column::CreatedAt)
        .order_by_desc(community_post::Column::Id)
        .limit(limit)
        .offset(offset)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a post by ID.
pub async fn get_post<C>(db: &C, post_id: i64) -> Result<Option<community_post::Model>>
where
    C: ConnectionTrait,
{
    CommunityPost::find_by_id(post_id)
        .one(db)
        .await
        .map_err(Into::into)
}

async fn require_post<C>(db: &C, post_id: i64) -> Result<community_post::Model>
where
    C: ConnectionTrait,
{
    get_post(db, post_id)
        .await?
        .ok_or(Error::PostNotFound { id: post_id })
}

async fn require_comment<C>(db: &C, comment_id: i64) -> Result<post_comment::Model>
where
    C: ConnectionTrait,
{
    PostComment::find_by_id(comment_id)
        .one(db)
        .await?
        .ok_or(Error::CommentNotFound { id: comment_id })
}

/// Deletes a post together with its comments and likes.
///
/// Only the author or an admin may delete a post.
pub async fn delete_post(
    db: &DatabaseConnection,
    post_id: i64,
    actor_id: &str,
    is_admin: bool,
) -> Result<()> {
    retry_on_busy(|| delete_post_once(db, post_id, actor_id, is_admin)).await?;
    info!(post_id, actor_id, "Deleted post");
    Ok(())
}

async fn delete_post_once(
    db: &DatabaseConnection,
    post_id: i64,
    actor_id: &str,
    is_admin: bool,
) -> Result<()> {
    let txn = db.begin().await?;
    let post = require_post(&txn, post_id).await?;
    if post.user_id != actor_id && !is_admin {
        return Err(Error::Forbidden {
            message: format!("post #{post_id} belongs to another member"),
        });
    }

    let comment_ids: Vec<i64> = PostComment::find()
        .select_only()
        .column(post_comment::Column::Id)
        .filter(post_comment::Column::PostId.eq(post_id))
        .into_tuple()
        .all(&txn)
        .await?;

    CommentLike::delete_many()
        .filter(comment_like::Column::CommentId.is_in(comment_ids))
        .exec(&txn)
        .await?;
    PostComment::delete_many()
        .filter(post_comment::Column::PostId.eq(post_id))
        .exec(&txn)
        .await?;
    PostLike::delete_many()
        .filter(post_like::Column::PostId.eq(post_id))
        .exec(&txn)
        .await?;
    CommunityPost::delete_by_id(post_id).exec(&txn).await?;

    txn.commit().await?;
    Ok(())
}

/// Comments on a post, oldest first.
pub async fn list_comments(
    db: &DatabaseConnection,
    post_id: i64,
) -> Result<Vec<post_comment::Model>> {
    PostComment::find()
        .filter(post_comment::Column::PostId.eq(post_id))
        .order_by_asc(post_comment::Column::CreatedAt)
        .order_by_asc(post_comment::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn bump_comments_count(txn: &DatabaseTransaction, post_id: i64, delta: i32) -> Result<()> {
    CommunityPost::update_many()
        .col_expr(
            community_post::Column::CommentsCount,
            Expr::col(community_post::Column::CommentsCount).add(delta),
        )
        .filter(community_post::Column::Id.eq(post_id))
        .exec(txn)
        .await?;
    Ok(())
}

/// Adds a comment to a post.
pub async fn add_comment(
    db: &DatabaseConnection,
    post_id: i64,
    user_id: &str,
    content: &str,
) -> Result<post_comment::Model> {
    let content = validate_content(content, MAX_COMMENT_LENGTH, "Comment")?;
    let content = content.as_str();
    let comment = retry_on_busy(move || add_comment_once(db, post_id, user_id, content)).await?;
    debug!(comment_id = comment.id, post_id, "Added comment");
    Ok(comment)
}

async fn add_comment_once(
    db: &DatabaseConnection,
    post_id: i64,
    user_id: &str,
    content: &str,
) -> Result<post_comment::Model> {
    let txn = db.begin().await?;
    require_post(&txn, post_id).await?;

    let comment = post_comment::ActiveModel {
        post_id: Set(post_id),
        user_id: Set(user_id.to_string()),
        content: Set(content.to_string()),
        likes_count: Set(0),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let comment = comment.insert(&txn).await?;
    bump_comments_count(&txn, post_id, 1).await?;

    txn.commit().await?;
    Ok(comment)
}

/// Deletes a comment and its likes. Only the author or an admin may delete it.
pub async fn delete_comment(
    db: &DatabaseConnection,
    comment_id: i64,
    actor_id: &str,
    is_admin: bool,
) -> Result<()> {
    retry_on_busy(|| delete_comment_once(db, comment_id, actor_id, is_admin)).await?;
    debug!(comment_id, actor_id, "Deleted comment");
    Ok(())
}

async fn delete_comment_once(
    db: &DatabaseConnection,
    comment_id: i64,
    actor_id: &str,
    is_admin: bool,
) -> Result<()> {
    let txn = db.begin().await?;
    let comment = require_comment(&txn, comment_id).await?;
    if comment.user_id != actor_id && !is_admin {
        return Err(Error::Forbidden {
            message: format!("comment #{comment_id} belongs to another member"),
        });
    }

    CommentLike::delete_many()
        .filter(comment_like::Column::CommentId.eq(comment_id))
        .exec(&txn)
        .await?;
    PostComment::delete_by_id(comment_id).exec(&txn).await?;
    bump_comments_count(&txn, comment.post_id, -1).await?;

    txn.commit().await?;
    Ok(())
}

/// Outcome of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeState {
    /// Whether the member likes the target after the toggle
    pub liked: bool,
    /// Likes on the target after the toggle
    pub likes_count: i32,
}

/// Likes the post, or removes the like if the member already liked it.
pub async fn toggle_post_like(
    db: &DatabaseConnection,
    post_id: i64,
    user_id: &str,
) -> Result<LikeState> {
    retry_on_busy(|| toggle_post_like_once(db, post_id, user_id)).await
}

async fn toggle_post_like_once(
    db: &DatabaseConnection,
    post_id: i64,
    user_id: &str,
) -> Result<LikeState> {
    let txn = db.begin().await?;
    require_post(&txn, post_id).await?;

    let removed = PostLike::delete_many()
        .filter(post_like::Column::PostId.eq(post_id))
        .filter(post_like::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?
        .rows_affected;

    let (liked, delta) = if removed > 0 {
        (false, -1)
    } else {
        let like = post_like::ActiveModel {
            post_id: Set(post_id),
            user_id: Set(user_id.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let inserted = PostLike::insert(like)
            .on_conflict(
                OnConflict::columns([post_like::Column::PostId, post_like::Column::UserId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;
        (true, i32::from(inserted > 0))
    };

    if delta != 0 {
        CommunityPost::update_many()
            .col_expr(
                community_post::Column::LikesCount,
                Expr::col(community_post::Column::LikesCount).add(delta),
            )
            .filter(community_post::Column::Id.eq(post_id))
            .exec(&txn)
            .await?;
    }

    let likes_count = require_post(&txn, post_id).await?.likes_count;
    txn.commit().await?;

    Ok(LikeState { liked, likes_count })
}

/// Likes the comment, or removes the like if the member already liked it.
pub async fn toggle_comment_like(
    db: &DatabaseConnection,
    comment_id: i64,
    user_id: &str,
) -> Result<LikeState> {
    retry_on_busy(|| toggle_comment_like_once(db, comment_id, user_id)).await
}

async fn toggle_comment_like_once(
    db: &DatabaseConnection,
    comment_id: i64,
    user_id: &str,
) -> Result<LikeState> {
    let txn = db.begin().await?;
    require_comment(&txn, comment_id).await?;

    let removed = CommentLike::delete_many()
        .filter(comment_like::Column::CommentId.eq(comment_id))
        .filter(comment_like::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?
        .rows_affected;

    let (liked, delta) = if removed > 0 {
        (false, -1)
    } else {
        let like = comment_like::ActiveModel {
            comment_id: Set(comment_id),
            user_id: Set(user_id.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let inserted = CommentLike::insert(like)
            .on_conflict(
                OnConflict::columns([comment_like::Column::CommentId, comment_like::Column::UserId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;
        (true, i32::from(inserted > 0))
    };

    if delta != 0 {
        PostComment::update_many()
            .col_expr(
                post_comment::Column::LikesCount,
                Expr::col(post_comment::Column::LikesCount).add(delta),
            )
            .filter(post_comment::Column::Id.eq(comment_id))
            .exec(&txn)
            .await?;
    }

    let likes_count = require_comment(&txn, comment_id).await?.likes_count;
    txn.commit().await?;

    Ok(LikeState { liked, likes_count })
}

/// Number of posts in the feed.
pub async fn count_posts(db: &DatabaseConnection) -> Result<u64> {
    CommunityPost::find().count(db).await.map_err(Into::into)
}
