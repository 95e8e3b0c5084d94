//! `InteractionRecorder` over SQLite. Pair tables use composite primary keys,
//! so duplicate inserts fail with a unique violation and map to `Conflict`.

use async_trait::async_trait;
use chrono::Utc;
use mc_core::error::Result;
use mc_core::models::{
    CategorySubscription, Comment, CommentLike, CommentRating, Favorite, Follow, Like, Rating,
    SavedList, TagSubscription,
};
use mc_core::traits::InteractionRecorder;
use uuid::Uuid;

use crate::{db_err, write_err, SqliteCatalog};

#[async_trait]
impl InteractionRecorder for SqliteCatalog {
    async fn add_like(&self, like: Like) -> Result<()> {
        sqlx::query("INSERT INTO likes (user_id, listing_id, created_at) VALUES (?, ?, ?)")
            .bind(like.user_id)
            .bind(like.listing_id)
            .bind(like.created_at)
            .execute(&self.pool)
            .await
            .map_err(write_err("like"))?;
        Ok(())
    }

    async fn remove_like(&self, user_id: Uuid, listing_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM likes WHERE user_id = ? AND listing_id = ?")
            .bind(user_id)
            .bind(listing_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn upsert_rating(&self, rating: Rating) -> Result<()> {
        sqlx::query(
            "INSERT INTO ratings (user_id, listing_id, value, created_at) VALUES (?, ?, ?, ?) \
             ON CONFLICT(user_id, listing_id) \
             DO UPDATE SET value = excluded.value, created_at = excluded.created_at",
        )
        .bind(rating.user_id)
        .bind(rating.listing_id)
        .bind(rating.value)
        .bind(rating.created_at)
        .execute(&self.pool)
        .await
        .map_err(write_err("rating"))?;
        Ok(())
    }

    async fn add_favorite(&self, favorite: Favorite) -> Result<()> {
        sqlx::query(
            "INSERT INTO favorites (user_id, listing_id, is_public, created_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(favorite.user_id)
        .bind(favorite.listing_id)
        .bind(favorite.is_public)
        .bind(favorite.created_at)
        .execute(&self.pool)
        .await
        .map_err(write_err("favorite"))?;
        Ok(())
    }

    async fn remove_favorite(&self, user_id: Uuid, listing_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = ? AND listing_id = ?")
            .bind(user_id)
            .bind(listing_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_follow(&self, follow: Follow) -> Result<()> {
        sqlx::query("INSERT INTO follows (follower_id, following_id, created_at) VALUES (?, ?, ?)")
            .bind(follow.follower_id)
            .bind(follow.following_id)
            .bind(follow.created_at)
            .execute(&self.pool)
            .await
            .map_err(write_err("follow"))?;
        Ok(())
    }

    async fn remove_follow(&self, follower_id: Uuid, following_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM follows WHERE follower_id = ? AND following_id = ?")
            .bind(follower_id)
            .bind(following_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_comment(&self, comment: Comment) -> Result<()> {
        sqlx::query(
            "INSERT INTO comments (id, listing_id, author_id, text, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(comment.id)
        .bind(comment.listing_id)
        .bind(comment.author_id)
        .bind(comment.text)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await
        .map_err(write_err("comment"))?;
        Ok(())
    }

    async fn delete_comment(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_comment_like(&self, like: CommentLike) -> Result<()> {
        sqlx::query("INSERT INTO comment_likes (user_id, comment_id, created_at) VALUES (?, ?, ?)")
            .bind(like.user_id)
            .bind(like.comment_id)
            .bind(like.created_at)
            .execute(&self.pool)
            .await
            .map_err(write_err("comment like"))?;
        Ok(())
    }

    async fn upsert_comment_rating(&self, rating: CommentRating) -> Result<()> {
        sqlx::query(
            "INSERT INTO comment_ratings (user_id, comment_id, value, created_at) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT(user_id, comment_id) \
             DO UPDATE SET value = excluded.value, created_at = excluded.created_at",
        )
        .bind(rating.user_id)
        .bind(rating.comment_id)
        .bind(rating.value)
        .bind(rating.created_at)
        .execute(&self.pool)
        .await
        .map_err(write_err("comment rating"))?;
        Ok(())
    }

    async fn add_tag_subscription(&self, subscription: TagSubscription) -> Result<()> {
        sqlx::query("INSERT INTO tag_subscriptions (user_id, tag_id, created_at) VALUES (?, ?, ?)")
            .bind(subscription.user_id)
            .bind(subscription.tag_id)
            .bind(subscription.created_at)
            .execute(&self.pool)
            .await
            .map_err(write_err("tag subscription"))?;
        Ok(())
    }

    async fn add_category_subscription(&self, subscription: CategorySubscription) -> Result<()> {
        sqlx::query(
            "INSERT INTO category_subscriptions (user_id, category_id, created_at) \
             VALUES (?, ?, ?)",
        )
        .bind(subscription.user_id)
        .bind(subscription.category_id)
        .bind(subscription.created_at)
        .execute(&self.pool)
        .await
        .map_err(write_err("category subscription"))?;
        Ok(())
    }

    async fn create_saved_list(&self, list: SavedList) -> Result<()> {
        sqlx::query("INSERT INTO saved_lists (id, owner_id, name, created_at) VALUES (?, ?, ?, ?)")
            .bind(list.id)
            .bind(list.owner_id)
            .bind(list.name)
            .bind(list.created_at)
            .execute(&self.pool)
            .await
            .map_err(write_err("saved list"))?;
        Ok(())
    }

    async fn add_saved_item(&self, list_id: Uuid, listing_id: Uuid) -> Result<()> {
        sqlx::query("INSERT INTO saved_items (list_id, listing_id, added_at) VALUES (?, ?, ?)")
            .bind(list_id)
            .bind(listing_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(write_err("saved item"))?;
        Ok(())
    }

    async fn remove_saved_item(&self, list_id: Uuid, listing_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM saved_items WHERE list_id = ? AND listing_id = ?")
            .bind(list_id)
            .bind(listing_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }
}
