//! # Request and response shapes
//!
//! Every response type lists its fields explicitly so the wire format does
//! not drift with the domain models.

use chrono::{DateTime, NaiveDate, Utc};
use mc_core::models::{
    Category, CommentWithMetrics, Favorite, GlobalStats, HistoryEntry, Listing, ListingDraft,
    ListingMetrics, Notification, Profile, RecommendedListing, SavedList, Tag, User, UserStats,
};
use mc_services::Subscriptions;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn default_true() -> bool {
    true
}

// ── Requests ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    #[serde(default)]
    pub bio: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListingRequest {
    pub name: String,
    pub price_per_day_cents: i64,
    pub available_from: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
    pub attachment: Option<String>,
    pub image: Option<String>,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(default)]
    pub tags: Vec<Uuid>,
    #[serde(default)]
    pub categories: Vec<Uuid>,
}

impl From<ListingRequest> for ListingDraft {
    fn from(req: ListingRequest) -> Self {
        ListingDraft {
            name: req.name,
            price_per_day_cents: req.price_per_day_cents,
            available_from: req.available_from,
            description: req.description,
            attachment: req.attachment,
            image: req.image,
            is_public: req.is_public,
            tag_ids: req.tags,
            category_ids: req.categories,
        }
    }
}

/// Query string of `GET /items`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
    pub available_from: Option<NaiveDate>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub ordering: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub value: i32,
}

#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    #[serde(default = "default_true")]
    pub is_public: bool,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

/// Body for tag and category creation. Entries are owned by the caller
/// unless `global` is set.
#[derive(Debug, Deserialize)]
pub struct TaxonomyRequest {
    pub name: String,
    #[serde(default)]
    pub global: bool,
}

#[derive(Debug, Deserialize)]
pub struct SavedListRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SavedItemRequest {
    pub item_id: Uuid,
}

// ── Responses ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user_id: Uuid,
    pub bio: String,
    pub avatar: Option<String>,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self { user_id: profile.user_id, bio: profile.bio, avatar: profile.avatar }
    }
}

#[derive(Debug, Serialize)]
pub struct ListingResponse {
    pub id: Uuid,
    pub name: String,
    pub price_per_day_cents: i64,
    pub available_from: Option<NaiveDate>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub attachment: Option<String>,
    pub image: Option<String>,
    pub is_public: bool,
    pub author_id: Uuid,
    pub tags: Vec<Uuid>,
    pub categories: Vec<Uuid>,
}

impl From<Listing> for ListingResponse {
    fn from(listing: Listing) -> Self {
        Self {
            id: listing.id,
            name: listing.name,
            price_per_day_cents: listing.price_per_day_cents,
            available_from: listing.available_from,
            description: listing.description,
            created_at: listing.created_at,
            attachment: listing.attachment,
            image: listing.image,
            is_public: listing.is_public,
            author_id: listing.author_id,
            tags: listing.tag_ids,
            categories: listing.category_ids,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub like_count: i64,
    pub average_rating: f64,
}

impl From<ListingMetrics> for MetricsResponse {
    fn from(metrics: ListingMetrics) -> Self {
        Self { like_count: metrics.like_count, average_rating: metrics.average_rating }
    }
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    #[serde(flatten)]
    pub listing: ListingResponse,
    pub like_count: i64,
    pub average_rating: f64,
}

impl From<RecommendedListing> for RecommendationResponse {
    fn from(rec: RecommendedListing) -> Self {
        Self {
            listing: rec.listing.into(),
            like_count: rec.metrics.like_count,
            average_rating: rec.metrics.average_rating,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub like_count: i64,
    pub average_rating: f64,
}

impl From<CommentWithMetrics> for CommentResponse {
    fn from(entry: CommentWithMetrics) -> Self {
        let CommentWithMetrics { comment, like_count, average_rating } = entry;
        Self {
            id: comment.id,
            listing_id: comment.listing_id,
            author_id: comment.author_id,
            text: comment.text,
            created_at: comment.created_at,
            like_count,
            average_rating,
        }
    }
}

/// Shared by tags and categories.
#[derive(Debug, Serialize)]
pub struct TaxonomyResponse {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Option<Uuid>,
}

impl From<Tag> for TaxonomyResponse {
    fn from(tag: Tag) -> Self {
        Self { id: tag.id, name: tag.name, owner_id: tag.owner_id }
    }
}

impl From<Category> for TaxonomyResponse {
    fn from(category: Category) -> Self {
        Self { id: category.id, name: category.name, owner_id: category.owner_id }
    }
}

#[derive(Debug, Serialize)]
pub struct FavoriteResponse {
    pub listing_id: Uuid,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Favorite> for FavoriteResponse {
    fn from(favorite: Favorite) -> Self {
        Self {
            listing_id: favorite.listing_id,
            is_public: favorite.is_public,
            created_at: favorite.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FollowersResponse {
    pub user_id: Uuid,
    pub followers: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct SavedListResponse {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<Uuid>,
}

impl From<SavedList> for SavedListResponse {
    fn from(list: SavedList) -> Self {
        Self { id: list.id, name: list.name, created_at: list.created_at, items: list.listing_ids }
    }
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self { id: n.id, message: n.message, is_read: n.is_read, created_at: n.created_at }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub action: String,
    pub created_at: DateTime<Utc>,
}

impl From<HistoryEntry> for HistoryResponse {
    fn from(entry: HistoryEntry) -> Self {
        Self { action: entry.action, created_at: entry.created_at }
    }
}

#[derive(Debug, Serialize)]
pub struct SubscriptionsResponse {
    pub tags: Vec<Uuid>,
    pub categories: Vec<Uuid>,
}

impl From<Subscriptions> for SubscriptionsResponse {
    fn from(subs: Subscriptions) -> Self {
        Self {
            tags: subs.tags.into_iter().map(|s| s.tag_id).collect(),
            categories: subs.categories.into_iter().map(|s| s.category_id).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserStatsResponse {
    pub listings: i64,
    pub comments: i64,
    pub likes: i64,
    pub ratings: i64,
    pub follows: i64,
}

impl From<UserStats> for UserStatsResponse {
    fn from(s: UserStats) -> Self {
        Self {
            listings: s.listings,
            comments: s.comments,
            likes: s.likes,
            ratings: s.ratings,
            follows: s.follows,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GlobalStatsResponse {
    pub listings: i64,
    pub comments: i64,
    pub likes: i64,
    pub ratings: i64,
    pub users: i64,
    pub categories: i64,
}

impl From<GlobalStats> for GlobalStatsResponse {
    fn from(s: GlobalStats) -> Self {
        Self {
            listings: s.listings,
            comments: s.comments,
            likes: s.likes,
            ratings: s.ratings,
            users: s.users,
            categories: s.categories,
        }
    }
}
