//! # Core Traits (Ports)
//!
//! Any storage plugin must implement these traits to be used by the binary.
//! Services receive them as `Arc<dyn ...>`; nothing reaches for a global handle.

use std::collections::HashSet;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Aggregate, Category, CategorySubscription, Comment, CommentLike, CommentRating, Favorite,
    Follow, GlobalStats, HistoryEntry, Like, Listing, ListingFilter, ListingQuery, Notification,
    Profile, Rating, SavedList, Tag, TagSubscription, User, UserStats,
};

/// Read side of the catalog plus writes for catalog-owned records
/// (users, listings, taxonomy, history).
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait CatalogStore: Send + Sync {
    // User Operations
    async fn create_user(&self, user: User) -> Result<()>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>>;
    async fn upsert_profile(&self, profile: Profile) -> Result<()>;
    async fn list_profiles(&self) -> Result<Vec<Profile>>;

    // Listing Operations
    /// Inserts the listing row and its tag/category links atomically.
    async fn create_listing(&self, listing: Listing) -> Result<()>;
    async fn get_listing(&self, id: Uuid) -> Result<Option<Listing>>;
    /// Replaces every writable field and both link sets.
    async fn update_listing(&self, listing: Listing) -> Result<()>;
    /// Returns `false` if nothing was deleted. Cascades to dependent rows.
    async fn delete_listing(&self, id: Uuid) -> Result<bool>;
    async fn search_listings(&self, query: ListingQuery) -> Result<Vec<Listing>>;
    /// Distinct listings matching either clause of the filter.
    async fn find_listings(&self, filter: ListingFilter) -> Result<Vec<Listing>>;
    async fn get_tags_for_listing(&self, listing_id: Uuid) -> Result<HashSet<Uuid>>;

    // Taxonomy
    async fn create_tag(&self, tag: Tag) -> Result<()>;
    async fn get_tag(&self, id: Uuid) -> Result<Option<Tag>>;
    async fn list_tags(&self) -> Result<Vec<Tag>>;
    async fn create_category(&self, category: Category) -> Result<()>;
    async fn get_category(&self, id: Uuid) -> Result<Option<Category>>;
    async fn list_categories(&self) -> Result<Vec<Category>>;

    // Interaction reads
    async fn get_favorites_for_user(&self, user_id: Uuid) -> Result<Vec<Favorite>>;
    async fn count_likes(&self, listing_id: Uuid) -> Result<i64>;
    async fn get_ratings(&self, listing_id: Uuid) -> Result<Vec<i32>>;
    /// Batch counterpart of `count_likes` + `get_ratings`. Unknown ids are skipped.
    async fn listing_aggregates(&self, listing_ids: &[Uuid]) -> Result<Vec<Aggregate>>;
    async fn get_followers(&self, user_id: Uuid) -> Result<HashSet<Uuid>>;
    async fn get_comment(&self, id: Uuid) -> Result<Option<Comment>>;
    /// Newest first.
    async fn list_comments(&self, listing_id: Uuid) -> Result<Vec<Comment>>;
    async fn comment_aggregates(&self, comment_ids: &[Uuid]) -> Result<Vec<Aggregate>>;
    async fn list_tag_subscriptions(&self, user_id: Uuid) -> Result<Vec<TagSubscription>>;
    async fn list_category_subscriptions(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<CategorySubscription>>;

    // Saved lists, each with its listing ids filled in
    async fn get_saved_list(&self, id: Uuid) -> Result<Option<SavedList>>;
    /// Oldest first.
    async fn list_saved_lists(&self, owner_id: Uuid) -> Result<Vec<SavedList>>;

    // History
    async fn record_history(&self, entry: HistoryEntry) -> Result<()>;
    async fn list_history(&self, user_id: Uuid) -> Result<Vec<HistoryEntry>>;

    // Counts
    async fn global_stats(&self) -> Result<GlobalStats>;
    async fn user_stats(&self, user_id: Uuid) -> Result<UserStats>;
}

/// Write side for user interactions. Pair uniqueness is enforced here and
/// surfaces as `AppError::Conflict`, except for ratings which replace.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait InteractionRecorder: Send + Sync {
    async fn add_like(&self, like: Like) -> Result<()>;
    async fn remove_like(&self, user_id: Uuid, listing_id: Uuid) -> Result<bool>;
    /// Insert-or-replace keyed on (user, listing).
    async fn upsert_rating(&self, rating: Rating) -> Result<()>;
    async fn add_favorite(&self, favorite: Favorite) -> Result<()>;
    async fn remove_favorite(&self, user_id: Uuid, listing_id: Uuid) -> Result<bool>;
    async fn add_follow(&self, follow: Follow) -> Result<()>;
    async fn remove_follow(&self, follower_id: Uuid, following_id: Uuid) -> Result<bool>;
    async fn create_comment(&self, comment: Comment) -> Result<()>;
    async fn delete_comment(&self, id: Uuid) -> Result<bool>;
    async fn add_comment_like(&self, like: CommentLike) -> Result<()>;
    /// Insert-or-replace keyed on (user, comment).
    async fn upsert_comment_rating(&self, rating: CommentRating) -> Result<()>;
    async fn add_tag_subscription(&self, subscription: TagSubscription) -> Result<()>;
    async fn add_category_subscription(&self, subscription: CategorySubscription) -> Result<()>;
    /// Stores the list header; `listing_ids` is ignored.
    async fn create_saved_list(&self, list: SavedList) -> Result<()>;
    async fn add_saved_item(&self, list_id: Uuid, listing_id: Uuid) -> Result<()>;
    async fn remove_saved_item(&self, list_id: Uuid, listing_id: Uuid) -> Result<bool>;
}

/// Notification persistence. Only the fan-out creates notifications.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create_notification(&self, recipient_id: Uuid, message: String) -> Result<Uuid>;
    /// Newest first.
    async fn list_notifications(&self, recipient_id: Uuid) -> Result<Vec<Notification>>;
    /// Returns `false` when the notification does not exist or belongs to someone else.
    async fn mark_notification_read(&self, id: Uuid, recipient_id: Uuid) -> Result<bool>;
}
