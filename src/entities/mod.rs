//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod activity_log;
pub mod availability;
pub mod booking;
pub mod comment_like;
pub mod community_post;
pub mod order;
pub mod order_item;
pub mod post_comment;
pub mod post_like;
pub mod product;
pub mod profile;
pub mod transaction;
pub mod wallet;

// Re-export specific types to avoid conflicts
pub use activity_log::{Entity as ActivityLog, Model as ActivityLogModel};
pub use availability::{Entity as Availability, Model as AvailabilityModel};
pub use booking::{BookingStatus, BookingType, Entity as Booking, Model as BookingModel};
pub use comment_like::Entity as CommentLike;
pub use community_post::{Entity as CommunityPost, Model as CommunityPostModel};
pub use order::{Entity as Order, Model as OrderModel};
pub use order_item::{Entity as OrderItem, Model as OrderItemModel};
pub use post_comment::{Entity as PostComment, Model as PostCommentModel};
pub use post_like::Entity as PostLike;
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use profile::{Entity as Profile, Model as ProfileModel};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
    TransactionKind,
};
pub use wallet::{Column as WalletColumn, Entity as Wallet, Model as WalletModel};
