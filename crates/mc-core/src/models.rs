//! # Domain Models
//!
//! These structs represent the core entities of Mini-Catalog.
//! We use UUID v7 for time-ordered, globally unique identification.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account. Credentials live with the upstream identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Display name, unique across the catalog
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: Uuid,
    pub bio: String,
    /// Reference to an avatar held by the file store
    pub avatar: Option<String>,
}

/// A rentable item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,
    pub name: String,
    /// Price per day in minor currency units
    pub price_per_day_cents: i64,
    pub available_from: Option<NaiveDate>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    /// Reference to a document held by the file store
    pub attachment: Option<String>,
    pub image: Option<String>,
    pub is_public: bool,
    pub author_id: Uuid,
    pub tag_ids: Vec<Uuid>,
    pub category_ids: Vec<Uuid>,
}

/// Writable fields of a listing, shared by create and update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingDraft {
    pub name: String,
    pub price_per_day_cents: i64,
    pub available_from: Option<NaiveDate>,
    pub description: String,
    pub attachment: Option<String>,
    pub image: Option<String>,
    pub is_public: bool,
    pub tag_ids: Vec<Uuid>,
    pub category_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    /// `None` for global tags
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: Uuid,
    pub listing_id: Uuid,
    /// Always within `RATING_RANGE`
    pub value: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Like {
    pub user_id: Uuid,
    pub listing_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    pub user_id: Uuid,
    pub listing_id: Uuid,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

/// Directed edge: `follower_id` follows `following_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Follow {
    pub follower_id: Uuid,
    pub following_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentLike {
    pub user_id: Uuid,
    pub comment_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRating {
    pub user_id: Uuid,
    pub comment_id: Uuid,
    pub value: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagSubscription {
    pub user_id: Uuid,
    pub tag_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySubscription {
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Audit trail of a user's catalog actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: String,
    pub created_at: DateTime<Utc>,
}

/// A named, owner-private shortlist of listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedList {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    /// Oldest addition first
    pub listing_ids: Vec<Uuid>,
}

/// Inclusive bounds for listing and comment ratings.
pub const RATING_RANGE: std::ops::RangeInclusive<i32> = 1..=5;

// ── Queries ─────────────────────────────────────────────────────────────────

/// Candidate selection for recommendations: a listing matches if it carries
/// any tag in `tag_in` OR its id is in `id_in`. Empty vectors match nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFilter {
    pub tag_in: Vec<Uuid>,
    pub id_in: Vec<Uuid>,
}

impl ListingFilter {
    pub fn is_empty(&self) -> bool {
        self.tag_in.is_empty() && self.id_in.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingOrdering {
    CreatedAsc,
    #[default]
    CreatedDesc,
    NameAsc,
    NameDesc,
}

impl ListingOrdering {
    /// Parses `created_at`, `-created_at`, `name` and `-name`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "created_at" => Some(Self::CreatedAsc),
            "-created_at" => Some(Self::CreatedDesc),
            "name" => Some(Self::NameAsc),
            "-name" => Some(Self::NameDesc),
            _ => None,
        }
    }
}

/// Browse/search parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingQuery {
    /// Substring matched against name, description and tag names
    pub search: Option<String>,
    pub available_from: Option<NaiveDate>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub ordering: ListingOrdering,
    /// Non-public listings are only returned to their author
    pub viewer: Option<Uuid>,
}

// ── Aggregates ──────────────────────────────────────────────────────────────

/// Raw per-subject counters returned by batch queries. The average is
/// derived by the engine so inline and batch paths share one rounding policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    pub subject_id: Uuid,
    pub like_count: i64,
    pub rating_sum: i64,
    pub rating_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ListingMetrics {
    pub like_count: i64,
    pub average_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedListing {
    pub listing: Listing,
    pub metrics: ListingMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentWithMetrics {
    pub comment: Comment,
    pub like_count: i64,
    pub average_rating: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub listings: i64,
    pub comments: i64,
    pub likes: i64,
    pub ratings: i64,
    pub follows: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalStats {
    pub listings: i64,
    pub comments: i64,
    pub likes: i64,
    pub ratings: i64,
    pub users: i64,
    pub categories: i64,
}
