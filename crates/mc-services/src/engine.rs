//! # Aggregation Engine
//!
//! Read-side computations over the catalog: per-listing metrics, tag-affinity
//! recommendations, comment metrics and stats. Nothing here mutates the store.
//! Callers check listing visibility, except for recommendations, which drop
//! other authors' private listings themselves.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use mc_core::error::{AppError, Result};
use mc_core::models::{
    Aggregate, CommentWithMetrics, GlobalStats, ListingFilter, ListingMetrics, RecommendedListing,
    UserStats,
};
use mc_core::traits::CatalogStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

/// Knobs for the recommendation set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationPolicy {
    /// Whether listings the user already favorited are recommended back.
    /// Defaults to `true`, which is how the catalog has always behaved.
    pub include_favorites: bool,
}

impl Default for RecommendationPolicy {
    fn default() -> Self {
        Self { include_favorites: true }
    }
}

/// Mean of `sum / count` rounded to 2 decimals; 0 for an empty set.
///
/// Every average in the engine goes through here so the inline and batch
/// paths can never disagree.
pub fn average_rating(sum: i64, count: i64) -> f64 {
    if count <= 0 {
        return 0.0;
    }
    round2(sum as f64 / count as f64)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn metrics_from(agg: &Aggregate) -> ListingMetrics {
    ListingMetrics {
        like_count: agg.like_count,
        average_rating: average_rating(agg.rating_sum, agg.rating_count),
    }
}

/// Highest average first, then newest, then lowest id.
fn recommendation_order(a: &RecommendedListing, b: &RecommendedListing) -> Ordering {
    b.metrics
        .average_rating
        .total_cmp(&a.metrics.average_rating)
        .then_with(|| b.listing.created_at.cmp(&a.listing.created_at))
        .then_with(|| a.listing.id.cmp(&b.listing.id))
}

pub struct AggregationEngine {
    store: Arc<dyn CatalogStore>,
    policy: RecommendationPolicy,
}

impl AggregationEngine {
    pub fn new(store: Arc<dyn CatalogStore>, policy: RecommendationPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> RecommendationPolicy {
        self.policy
    }

    async fn require_user(&self, user_id: Uuid) -> Result<()> {
        match self.store.get_user(user_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::not_found("User", user_id)),
        }
    }

    /// Like count and average rating for one listing.
    #[instrument(skip(self))]
    pub async fn get_listing_metrics(&self, listing_id: Uuid) -> Result<ListingMetrics> {
        if self.store.get_listing(listing_id).await?.is_none() {
            return Err(AppError::not_found("Listing", listing_id));
        }

        let like_count = self.store.count_likes(listing_id).await?;
        let ratings = self.store.get_ratings(listing_id).await?;
        let sum: i64 = ratings.iter().map(|v| i64::from(*v)).sum();

        Ok(ListingMetrics { like_count, average_rating: average_rating(sum, ratings.len() as i64) })
    }

    /// Listings sharing a tag with the user's favorites (plus, under the
    /// default policy, the favorites themselves), best rated first.
    ///
    /// Another author's private listing is never recommended, even when the
    /// user favorited it before it was hidden.
    #[instrument(skip(self))]
    pub async fn get_recommendations(&self, user_id: Uuid) -> Result<Vec<RecommendedListing>> {
        self.require_user(user_id).await?;

        let favorites = self.store.get_favorites_for_user(user_id).await?;
        if favorites.is_empty() {
            return Ok(Vec::new());
        }

        let favorite_ids: HashSet<Uuid> = favorites.iter().map(|f| f.listing_id).collect();
        let mut affinity: HashSet<Uuid> = HashSet::new();
        for listing_id in &favorite_ids {
            affinity.extend(self.store.get_tags_for_listing(*listing_id).await?);
        }

        let filter = ListingFilter {
            tag_in: affinity.into_iter().collect(),
            id_in: if self.policy.include_favorites {
                favorite_ids.iter().copied().collect()
            } else {
                Vec::new()
            },
        };

        let mut seen = HashSet::new();
        let candidates: Vec<_> = self
            .store
            .find_listings(filter)
            .await?
            .into_iter()
            .filter(|l| seen.insert(l.id))
            .filter(|l| l.is_public || l.author_id == user_id)
            .filter(|l| self.policy.include_favorites || !favorite_ids.contains(&l.id))
            .collect();

        let ids: Vec<Uuid> = candidates.iter().map(|l| l.id).collect();
        let aggregates: HashMap<Uuid, ListingMetrics> = self
            .store
            .listing_aggregates(&ids)
            .await?
            .iter()
            .map(|agg| (agg.subject_id, metrics_from(agg)))
            .collect();

        let mut recommended: Vec<RecommendedListing> = candidates
            .into_iter()
            .map(|listing| {
                let metrics = aggregates
                    .get(&listing.id)
                    .copied()
                    .unwrap_or(ListingMetrics { like_count: 0, average_rating: 0.0 });
                RecommendedListing { listing, metrics }
            })
            .collect();
        recommended.sort_by(recommendation_order);

        debug!(user = %user_id, count = recommended.len(), "recommendations computed");
        Ok(recommended)
    }

    /// Comments on a listing, newest first, each with its own metrics.
    pub async fn list_comments(&self, listing_id: Uuid) -> Result<Vec<CommentWithMetrics>> {
        if self.store.get_listing(listing_id).await?.is_none() {
            return Err(AppError::not_found("Listing", listing_id));
        }

        let comments = self.store.list_comments(listing_id).await?;
        let ids: Vec<Uuid> = comments.iter().map(|c| c.id).collect();
        let aggregates: HashMap<Uuid, Aggregate> = self
            .store
            .comment_aggregates(&ids)
            .await?
            .into_iter()
            .map(|agg| (agg.subject_id, agg))
            .collect();

        Ok(comments
            .into_iter()
            .map(|comment| {
                let (like_count, average) = aggregates
                    .get(&comment.id)
                    .map(|agg| (agg.like_count, average_rating(agg.rating_sum, agg.rating_count)))
                    .unwrap_or((0, 0.0));
                CommentWithMetrics { comment, like_count, average_rating: average }
            })
            .collect())
    }

    pub async fn get_user_stats(&self, user_id: Uuid) -> Result<UserStats> {
        self.require_user(user_id).await?;
        self.store.user_stats(user_id).await
    }

    pub async fn get_global_stats(&self) -> Result<GlobalStats> {
        self.store.global_stats().await
    }
}
