//! Profile entity - A community member's public identity.
//!
//! `user_id` is the authentication identity (the Discord user ID when used through the bot)
//! and is what every other table refers to.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Profile database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    /// Unique identifier for the profile
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Authentication identity of the owner
    #[sea_orm(unique)]
    pub user_id: String,
    /// Unique handle shown in the community
    #[sea_orm(unique)]
    pub username: String,
    /// Free-form display name
    pub display_name: String,
    pub bio: Option<String>,
    /// Location of the avatar in object storage
    pub avatar_url: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
