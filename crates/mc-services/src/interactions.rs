//! # Interaction Service
//!
//! Likes, ratings, favorites, follows, comments, subscriptions and saved
//! lists. Every operation validates its target first so storage only sees
//! well-formed pairs. A private listing is invisible to everyone except its
//! author, so interacting with it reports `NotFound`.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use mc_core::error::{AppError, Result};
use mc_core::models::{
    CategorySubscription, Comment, CommentLike, CommentRating, Favorite, Follow, HistoryEntry,
    Like, Listing, Notification, Rating, SavedList, TagSubscription, RATING_RANGE,
};
use mc_core::traits::{CatalogStore, InteractionRecorder, NotificationStore};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

/// Everything a user is subscribed to.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Subscriptions {
    pub tags: Vec<TagSubscription>,
    pub categories: Vec<CategorySubscription>,
}

pub fn validate_rating(value: i32) -> Result<()> {
    if RATING_RANGE.contains(&value) {
        Ok(())
    } else {
        Err(AppError::ValidationError(format!(
            "rating must be between {} and {}",
            RATING_RANGE.start(),
            RATING_RANGE.end()
        )))
    }
}

pub struct InteractionService {
    catalog: Arc<dyn CatalogStore>,
    recorder: Arc<dyn InteractionRecorder>,
    notifications: Arc<dyn NotificationStore>,
}

impl InteractionService {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        recorder: Arc<dyn InteractionRecorder>,
        notifications: Arc<dyn NotificationStore>,
    ) -> Self {
        Self { catalog, recorder, notifications }
    }

    /// Loads a listing `actor` is allowed to see.
    async fn require_listing(&self, actor: Uuid, listing_id: Uuid) -> Result<Listing> {
        match self.catalog.get_listing(listing_id).await? {
            Some(listing) if listing.is_public || listing.author_id == actor => Ok(listing),
            _ => Err(AppError::not_found("Listing", listing_id)),
        }
    }

    async fn require_comment(&self, comment_id: Uuid) -> Result<Comment> {
        self.catalog
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment", comment_id))
    }

    /// A comment is only reachable through a listing `actor` can see.
    async fn require_visible_comment(&self, actor: Uuid, comment_id: Uuid) -> Result<Comment> {
        let comment = self.require_comment(comment_id).await?;
        match self.require_listing(actor, comment.listing_id).await {
            Ok(_) => Ok(comment),
            Err(AppError::NotFound(_, _)) => Err(AppError::not_found("Comment", comment_id)),
            Err(err) => Err(err),
        }
    }

    /// Saved lists are private: anyone but the owner gets `NotFound`.
    async fn require_own_list(&self, actor: Uuid, list_id: Uuid) -> Result<SavedList> {
        match self.catalog.get_saved_list(list_id).await? {
            Some(list) if list.owner_id == actor => Ok(list),
            _ => Err(AppError::not_found("SavedList", list_id)),
        }
    }

    async fn require_user(&self, user_id: Uuid) -> Result<()> {
        match self.catalog.get_user(user_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::not_found("User", user_id)),
        }
    }

    // ── Listings ────────────────────────────────────────────────────────────

    pub async fn like(&self, user_id: Uuid, listing_id: Uuid) -> Result<()> {
        self.require_listing(user_id, listing_id).await?;
        self.recorder
            .add_like(Like { user_id, listing_id, created_at: Utc::now() })
            .await
    }

    pub async fn unlike(&self, user_id: Uuid, listing_id: Uuid) -> Result<()> {
        if !self.recorder.remove_like(user_id, listing_id).await? {
            return Err(AppError::not_found("Like", listing_id));
        }
        Ok(())
    }

    /// Rating again replaces the previous value.
    pub async fn rate(&self, user_id: Uuid, listing_id: Uuid, value: i32) -> Result<()> {
        validate_rating(value)?;
        self.require_listing(user_id, listing_id).await?;
        debug!(user = %user_id, listing = %listing_id, value, "rating listing");
        self.recorder
            .upsert_rating(Rating { user_id, listing_id, value, created_at: Utc::now() })
            .await
    }

    pub async fn favorite(&self, user_id: Uuid, listing_id: Uuid, is_public: bool) -> Result<()> {
        self.require_listing(user_id, listing_id).await?;
        self.recorder
            .add_favorite(Favorite { user_id, listing_id, is_public, created_at: Utc::now() })
            .await
    }

    pub async fn unfavorite(&self, user_id: Uuid, listing_id: Uuid) -> Result<()> {
        if !self.recorder.remove_favorite(user_id, listing_id).await? {
            return Err(AppError::not_found("Favorite", listing_id));
        }
        Ok(())
    }

    /// A user sees all of their own favorites; others see only the public ones.
    pub async fn list_favorites(
        &self,
        viewer: Option<Uuid>,
        user_id: Uuid,
    ) -> Result<Vec<Favorite>> {
        self.require_user(user_id).await?;
        let favorites = self.catalog.get_favorites_for_user(user_id).await?;
        if viewer == Some(user_id) {
            return Ok(favorites);
        }
        Ok(favorites.into_iter().filter(|f| f.is_public).collect())
    }

    // ── Follows ─────────────────────────────────────────────────────────────

    pub async fn follow(&self, follower_id: Uuid, following_id: Uuid) -> Result<()> {
        if follower_id == following_id {
            return Err(AppError::ValidationError("users cannot follow themselves".into()));
        }
        self.require_user(following_id).await?;
        self.recorder
            .add_follow(Follow { follower_id, following_id, created_at: Utc::now() })
            .await
    }

    pub async fn unfollow(&self, follower_id: Uuid, following_id: Uuid) -> Result<()> {
        if !self.recorder.remove_follow(follower_id, following_id).await? {
            return Err(AppError::not_found("Follow", following_id));
        }
        Ok(())
    }

    pub async fn list_followers(&self, user_id: Uuid) -> Result<HashSet<Uuid>> {
        self.require_user(user_id).await?;
        self.catalog.get_followers(user_id).await
    }

    // ── Comments ────────────────────────────────────────────────────────────

    pub async fn add_comment(
        &self,
        author_id: Uuid,
        listing_id: Uuid,
        text: &str,
    ) -> Result<Comment> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::ValidationError("comment must not be empty".into()));
        }
        self.require_listing(author_id, listing_id).await?;

        let comment = Comment {
            id: Uuid::now_v7(),
            listing_id,
            author_id,
            text: text.to_string(),
            created_at: Utc::now(),
        };
        self.recorder.create_comment(comment.clone()).await?;
        Ok(comment)
    }

    pub async fn delete_comment(&self, actor: Uuid, comment_id: Uuid) -> Result<()> {
        let comment = self.require_comment(comment_id).await?;
        if comment.author_id != actor {
            return Err(AppError::Forbidden("only the author may delete this comment".into()));
        }
        if !self.recorder.delete_comment(comment_id).await? {
            return Err(AppError::not_found("Comment", comment_id));
        }
        Ok(())
    }

    pub async fn like_comment(&self, user_id: Uuid, comment_id: Uuid) -> Result<()> {
        self.require_visible_comment(user_id, comment_id).await?;
        self.recorder
            .add_comment_like(CommentLike { user_id, comment_id, created_at: Utc::now() })
            .await
    }

    pub async fn rate_comment(&self, user_id: Uuid, comment_id: Uuid, value: i32) -> Result<()> {
        validate_rating(value)?;
        self.require_visible_comment(user_id, comment_id).await?;
        let rating = CommentRating { user_id, comment_id, value, created_at: Utc::now() };
        self.recorder.upsert_comment_rating(rating).await
    }

    // ── Subscriptions ───────────────────────────────────────────────────────

    pub async fn subscribe_tag(&self, user_id: Uuid, tag_id: Uuid) -> Result<()> {
        if self.catalog.get_tag(tag_id).await?.is_none() {
            return Err(AppError::not_found("Tag", tag_id));
        }
        self.recorder
            .add_tag_subscription(TagSubscription { user_id, tag_id, created_at: Utc::now() })
            .await
    }

    pub async fn subscribe_category(&self, user_id: Uuid, category_id: Uuid) -> Result<()> {
        if self.catalog.get_category(category_id).await?.is_none() {
            return Err(AppError::not_found("Category", category_id));
        }
        let subscription = CategorySubscription { user_id, category_id, created_at: Utc::now() };
        self.recorder.add_category_subscription(subscription).await
    }

    pub async fn list_subscriptions(&self, user_id: Uuid) -> Result<Subscriptions> {
        Ok(Subscriptions {
            tags: self.catalog.list_tag_subscriptions(user_id).await?,
            categories: self.catalog.list_category_subscriptions(user_id).await?,
        })
    }

    // ── Saved lists ─────────────────────────────────────────────────────────

    pub async fn create_list(&self, owner_id: Uuid, name: &str) -> Result<SavedList> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::ValidationError("list name must not be empty".into()));
        }
        let list = SavedList {
            id: Uuid::now_v7(),
            owner_id,
            name: name.to_string(),
            created_at: Utc::now(),
            listing_ids: Vec::new(),
        };
        self.recorder.create_saved_list(list.clone()).await?;
        debug!(owner = %owner_id, list = %list.id, "saved list created");
        Ok(list)
    }

    pub async fn list_lists(&self, owner_id: Uuid) -> Result<Vec<SavedList>> {
        self.catalog.list_saved_lists(owner_id).await
    }

    pub async fn get_list(&self, actor: Uuid, list_id: Uuid) -> Result<SavedList> {
        self.require_own_list(actor, list_id).await
    }

    /// Adding the same listing twice is a `Conflict`.
    pub async fn add_to_list(&self, actor: Uuid, list_id: Uuid, listing_id: Uuid) -> Result<()> {
        self.require_own_list(actor, list_id).await?;
        self.require_listing(actor, listing_id).await?;
        self.recorder.add_saved_item(list_id, listing_id).await
    }

    pub async fn remove_from_list(
        &self,
        actor: Uuid,
        list_id: Uuid,
        listing_id: Uuid,
    ) -> Result<()> {
        self.require_own_list(actor, list_id).await?;
        if !self.recorder.remove_saved_item(list_id, listing_id).await? {
            return Err(AppError::not_found("SavedItem", listing_id));
        }
        Ok(())
    }

    // ── Notifications & history ─────────────────────────────────────────────

    pub async fn list_notifications(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        self.notifications.list_notifications(user_id).await
    }

    pub async fn mark_notification_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<()> {
        if !self.notifications.mark_notification_read(notification_id, user_id).await? {
            return Err(AppError::not_found("Notification", notification_id));
        }
        Ok(())
    }

    /// History is private to its owner.
    pub async fn list_history(&self, viewer: Uuid, user_id: Uuid) -> Result<Vec<HistoryEntry>> {
        if viewer != user_id {
            return Err(AppError::Forbidden("history is only visible to its owner".into()));
        }
        self.catalog.list_history(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_core::models::User;
    use mc_core::traits::{MockCatalogStore, MockInteractionRecorder, MockNotificationStore};

    fn listing(id: Uuid) -> Listing {
        Listing {
            id,
            name: "Drill".into(),
            price_per_day_cents: 500,
            available_from: None,
            description: String::new(),
            created_at: Utc::now(),
            attachment: None,
            image: None,
            is_public: true,
            author_id: Uuid::now_v7(),
            tag_ids: vec![],
            category_ids: vec![],
        }
    }

    fn private_listing(id: Uuid, author_id: Uuid) -> Listing {
        Listing { is_public: false, author_id, ..listing(id) }
    }

    fn service(
        catalog: MockCatalogStore,
        recorder: MockInteractionRecorder,
        notifications: MockNotificationStore,
    ) -> InteractionService {
        InteractionService::new(Arc::new(catalog), Arc::new(recorder), Arc::new(notifications))
    }

    #[test]
    fn test_rating_bounds() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
    }

    #[tokio::test]
    async fn test_rate_out_of_range_never_reaches_storage() {
        let mut recorder = MockInteractionRecorder::new();
        recorder.expect_upsert_rating().never();

        let err = service(MockCatalogStore::new(), recorder, MockNotificationStore::new())
            .rate(Uuid::now_v7(), Uuid::now_v7(), 7)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_like_missing_listing() {
        let mut catalog = MockCatalogStore::new();
        catalog.expect_get_listing().returning(|_| Ok(None));
        let mut recorder = MockInteractionRecorder::new();
        recorder.expect_add_like().never();

        let err = service(catalog, recorder, MockNotificationStore::new())
            .like(Uuid::now_v7(), Uuid::now_v7())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(kind, _) if kind == "Listing"));
    }

    #[tokio::test]
    async fn test_duplicate_like_is_conflict() {
        let mut catalog = MockCatalogStore::new();
        catalog.expect_get_listing().returning(|id| Ok(Some(listing(id))));
        let mut recorder = MockInteractionRecorder::new();
        recorder
            .expect_add_like()
            .returning(|_| Err(AppError::Conflict("like already exists".into())));

        let err = service(catalog, recorder, MockNotificationStore::new())
            .like(Uuid::now_v7(), Uuid::now_v7())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_self_follow_rejected() {
        let me = Uuid::now_v7();
        let mut recorder = MockInteractionRecorder::new();
        recorder.expect_add_follow().never();

        let err = service(MockCatalogStore::new(), recorder, MockNotificationStore::new())
            .follow(me, me)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_private_favorites_hidden_from_others() {
        let owner = Uuid::now_v7();
        let mut catalog = MockCatalogStore::new();
        catalog.expect_get_user().returning(|id| {
            let username = "owner".to_string();
            Ok(Some(User { id, username, email: String::new(), created_at: Utc::now() }))
        });
        catalog.expect_get_favorites_for_user().returning(move |user_id| {
            let favorite = |is_public| Favorite {
                user_id,
                listing_id: Uuid::now_v7(),
                is_public,
                created_at: Utc::now(),
            };
            Ok(vec![favorite(true), favorite(false)])
        });
        let svc = service(catalog, MockInteractionRecorder::new(), MockNotificationStore::new());

        assert_eq!(svc.list_favorites(Some(owner), owner).await.unwrap().len(), 2);
        assert_eq!(svc.list_favorites(Some(Uuid::now_v7()), owner).await.unwrap().len(), 1);
        assert_eq!(svc.list_favorites(None, owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_comment_delete_by_stranger_is_forbidden() {
        let author = Uuid::now_v7();
        let mut catalog = MockCatalogStore::new();
        catalog.expect_get_comment().returning(move |id| {
            Ok(Some(Comment {
                id,
                listing_id: Uuid::now_v7(),
                author_id: author,
                text: "nice".into(),
                created_at: Utc::now(),
            }))
        });
        let mut recorder = MockInteractionRecorder::new();
        recorder.expect_delete_comment().never();

        let err = service(catalog, recorder, MockNotificationStore::new())
            .delete_comment(Uuid::now_v7(), Uuid::now_v7())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_mark_foreign_notification_is_not_found() {
        let mut notifications = MockNotificationStore::new();
        notifications.expect_mark_notification_read().returning(|_, _| Ok(false));

        let err = service(MockCatalogStore::new(), MockInteractionRecorder::new(), notifications)
            .mark_notification_read(Uuid::now_v7(), Uuid::now_v7())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(kind, _) if kind == "Notification"));
    }

    #[tokio::test]
    async fn test_private_listing_is_invisible_to_strangers() {
        let author = Uuid::now_v7();
        let stranger = Uuid::now_v7();
        let mut catalog = MockCatalogStore::new();
        catalog
            .expect_get_listing()
            .returning(move |id| Ok(Some(private_listing(id, author))));
        let mut recorder = MockInteractionRecorder::new();
        recorder.expect_add_like().never();
        recorder.expect_upsert_rating().never();
        recorder.expect_add_favorite().never();
        recorder.expect_create_comment().never();
        let svc = service(catalog, recorder, MockNotificationStore::new());
        let item = Uuid::now_v7();

        let hidden =
            |res: Result<()>| matches!(res, Err(AppError::NotFound(kind, _)) if kind == "Listing");
        assert!(hidden(svc.like(stranger, item).await));
        assert!(hidden(svc.rate(stranger, item, 4).await));
        assert!(hidden(svc.favorite(stranger, item, true).await));
        assert!(hidden(svc.add_comment(stranger, item, "mine now").await.map(|_| ())));
    }

    #[tokio::test]
    async fn test_author_interacts_with_own_private_listing() {
        let author = Uuid::now_v7();
        let mut catalog = MockCatalogStore::new();
        catalog
            .expect_get_listing()
            .returning(move |id| Ok(Some(private_listing(id, author))));
        let mut recorder = MockInteractionRecorder::new();
        recorder.expect_add_like().times(1).returning(|_| Ok(()));

        let svc = service(catalog, recorder, MockNotificationStore::new());

        assert!(svc.like(author, Uuid::now_v7()).await.is_ok());
    }

    #[tokio::test]
    async fn test_comments_on_private_listings_are_hidden() {
        let author = Uuid::now_v7();
        let mut catalog = MockCatalogStore::new();
        catalog.expect_get_comment().returning(move |id| {
            Ok(Some(Comment {
                id,
                listing_id: Uuid::now_v7(),
                author_id: author,
                text: "mine".into(),
                created_at: Utc::now(),
            }))
        });
        catalog
            .expect_get_listing()
            .returning(move |id| Ok(Some(private_listing(id, author))));
        let mut recorder = MockInteractionRecorder::new();
        recorder.expect_add_comment_like().never();
        recorder.expect_upsert_comment_rating().never();
        let svc = service(catalog, recorder, MockNotificationStore::new());
        let stranger = Uuid::now_v7();

        let err = svc.like_comment(stranger, Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(kind, _) if kind == "Comment"));
        let err = svc.rate_comment(stranger, Uuid::now_v7(), 5).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(kind, _) if kind == "Comment"));
    }

    #[tokio::test]
    async fn test_blank_list_name_rejected() {
        let mut recorder = MockInteractionRecorder::new();
        recorder.expect_create_saved_list().never();

        let err = service(MockCatalogStore::new(), recorder, MockNotificationStore::new())
            .create_list(Uuid::now_v7(), "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_saved_lists_belong_to_their_owner() {
        let owner = Uuid::now_v7();
        let mut catalog = MockCatalogStore::new();
        catalog.expect_get_saved_list().returning(move |id| {
            Ok(Some(SavedList {
                id,
                owner_id: owner,
                name: "Camping".into(),
                created_at: Utc::now(),
                listing_ids: vec![],
            }))
        });
        catalog.expect_get_listing().returning(|id| Ok(Some(listing(id))));
        let mut recorder = MockInteractionRecorder::new();
        recorder.expect_add_saved_item().times(1).returning(|_, _| Ok(()));
        recorder.expect_remove_saved_item().never();
        let svc = service(catalog, recorder, MockNotificationStore::new());
        let (list, item) = (Uuid::now_v7(), Uuid::now_v7());

        let intruder = Uuid::now_v7();
        let err = svc.add_to_list(intruder, list, item).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(kind, _) if kind == "SavedList"));
        assert!(svc.get_list(intruder, list).await.is_err());
        assert!(svc.remove_from_list(intruder, list, item).await.is_err());

        svc.add_to_list(owner, list, item).await.unwrap();
    }
}
