//! `CatalogStore` over SQLite.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use mc_core::error::Result;
use mc_core::models::{
    Aggregate, Category, CategorySubscription, Comment, Favorite, GlobalStats, HistoryEntry,
    Listing, ListingFilter, ListingOrdering, ListingQuery, Profile, SavedList, Tag,
    TagSubscription, User, UserStats,
};
use mc_core::traits::CatalogStore;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection};
use uuid::Uuid;

use crate::{db_err, push_id_list, write_err, SqliteCatalog};

const LISTING_COLUMNS: &str = "SELECT l.id, l.name, l.price_per_day_cents, l.available_from, \
     l.description, l.created_at, l.attachment, l.image, l.is_public, l.author_id FROM listings l";

fn listing_from_row(row: &SqliteRow) -> sqlx::Result<Listing> {
    Ok(Listing {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        price_per_day_cents: row.try_get("price_per_day_cents")?,
        available_from: row.try_get("available_from")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
        attachment: row.try_get("attachment")?,
        image: row.try_get("image")?,
        is_public: row.try_get("is_public")?,
        author_id: row.try_get("author_id")?,
        tag_ids: Vec::new(),
        category_ids: Vec::new(),
    })
}

fn user_from_row(row: &SqliteRow) -> sqlx::Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        created_at: row.try_get("created_at")?,
    })
}

fn profile_from_row(row: &SqliteRow) -> sqlx::Result<Profile> {
    Ok(Profile {
        user_id: row.try_get("user_id")?,
        bio: row.try_get("bio")?,
        avatar: row.try_get("avatar")?,
    })
}

fn tag_from_row(row: &SqliteRow) -> sqlx::Result<Tag> {
    Ok(Tag {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        owner_id: row.try_get("owner_id")?,
    })
}

fn category_from_row(row: &SqliteRow) -> sqlx::Result<Category> {
    Ok(Category {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        owner_id: row.try_get("owner_id")?,
    })
}

fn saved_list_from_row(row: &SqliteRow) -> sqlx::Result<SavedList> {
    Ok(SavedList {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
        listing_ids: Vec::new(),
    })
}

/// Escapes LIKE wildcards so a search term only ever matches literally.
/// Pair with `ESCAPE '\'` in the query.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn comment_from_row(row: &SqliteRow) -> sqlx::Result<Comment> {
    Ok(Comment {
        id: row.try_get("id")?,
        listing_id: row.try_get("listing_id")?,
        author_id: row.try_get("author_id")?,
        text: row.try_get("text")?,
        created_at: row.try_get("created_at")?,
    })
}

fn aggregate_from_row(row: &SqliteRow) -> sqlx::Result<Aggregate> {
    Ok(Aggregate {
        subject_id: row.try_get("subject_id")?,
        like_count: row.try_get("like_count")?,
        rating_sum: row.try_get("rating_sum")?,
        rating_count: row.try_get("rating_count")?,
    })
}

fn global_stats_from_row(row: &SqliteRow) -> sqlx::Result<GlobalStats> {
    Ok(GlobalStats {
        listings: row.try_get("listings")?,
        comments: row.try_get("comments")?,
        likes: row.try_get("likes")?,
        ratings: row.try_get("ratings")?,
        users: row.try_get("users")?,
        categories: row.try_get("categories")?,
    })
}

fn user_stats_from_row(row: &SqliteRow) -> sqlx::Result<UserStats> {
    Ok(UserStats {
        listings: row.try_get("listings")?,
        comments: row.try_get("comments")?,
        likes: row.try_get("likes")?,
        ratings: row.try_get("ratings")?,
        follows: row.try_get("follows")?,
    })
}

/// Writes both link tables for a listing inside the caller's transaction.
async fn insert_links(conn: &mut SqliteConnection, listing: &Listing) -> sqlx::Result<()> {
    for tag_id in &listing.tag_ids {
        sqlx::query("INSERT OR IGNORE INTO listing_tags (listing_id, tag_id) VALUES (?, ?)")
            .bind(listing.id)
            .bind(*tag_id)
            .execute(&mut *conn)
            .await?;
    }
    for category_id in &listing.category_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO listing_categories (listing_id, category_id) VALUES (?, ?)",
        )
        .bind(listing.id)
        .bind(*category_id)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

impl SqliteCatalog {
    /// Loads tag and category ids for a page of listings in two queries.
    async fn attach_links(&self, mut listings: Vec<Listing>) -> Result<Vec<Listing>> {
        if listings.is_empty() {
            return Ok(listings);
        }
        let ids: Vec<Uuid> = listings.iter().map(|l| l.id).collect();

        let mut tags: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT listing_id, tag_id FROM listing_tags WHERE listing_id IN ",
        );
        push_id_list(&mut qb, &ids);
        for row in qb.build().fetch_all(&self.pool).await.map_err(db_err)? {
            let listing_id: Uuid = row.try_get("listing_id").map_err(db_err)?;
            tags.entry(listing_id).or_default().push(row.try_get("tag_id").map_err(db_err)?);
        }

        let mut categories: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT listing_id, category_id FROM listing_categories WHERE listing_id IN ",
        );
        push_id_list(&mut qb, &ids);
        for row in qb.build().fetch_all(&self.pool).await.map_err(db_err)? {
            let listing_id: Uuid = row.try_get("listing_id").map_err(db_err)?;
            categories
                .entry(listing_id)
                .or_default()
                .push(row.try_get("category_id").map_err(db_err)?);
        }

        for listing in &mut listings {
            listing.tag_ids = tags.remove(&listing.id).unwrap_or_default();
            listing.category_ids = categories.remove(&listing.id).unwrap_or_default();
        }
        Ok(listings)
    }

    /// Fills `listing_ids` for a page of saved lists, oldest addition first.
    async fn attach_items(&self, mut lists: Vec<SavedList>) -> Result<Vec<SavedList>> {
        if lists.is_empty() {
            return Ok(lists);
        }
        let ids: Vec<Uuid> = lists.iter().map(|l| l.id).collect();

        let mut items: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT list_id, listing_id FROM saved_items WHERE list_id IN ",
        );
        push_id_list(&mut qb, &ids);
        qb.push(" ORDER BY added_at, listing_id");
        for row in qb.build().fetch_all(&self.pool).await.map_err(db_err)? {
            let list_id: Uuid = row.try_get("list_id").map_err(db_err)?;
            items.entry(list_id).or_default().push(row.try_get("listing_id").map_err(db_err)?);
        }

        for list in &mut lists {
            list.listing_ids = items.remove(&list.id).unwrap_or_default();
        }
        Ok(lists)
    }

    async fn fetch_listings(&self, mut qb: QueryBuilder<'_, Sqlite>) -> Result<Vec<Listing>> {
        let listings = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .iter()
            .map(listing_from_row)
            .collect::<sqlx::Result<Vec<_>>>()
            .map_err(db_err)?;
        self.attach_links(listings).await
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalog {
    async fn create_user(&self, user: User) -> Result<()> {
        sqlx::query("INSERT INTO users (id, username, email, created_at) VALUES (?, ?, ?, ?)")
            .bind(user.id)
            .bind(user.username)
            .bind(user.email)
            .bind(user.created_at)
            .execute(&self.pool)
            .await
            .map_err(write_err("user"))?;
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, username, email, created_at FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(user_from_row).transpose().map_err(db_err)
    }

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        let row = sqlx::query("SELECT user_id, bio, avatar FROM profiles WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(profile_from_row).transpose().map_err(db_err)
    }

    async fn upsert_profile(&self, profile: Profile) -> Result<()> {
        sqlx::query(
            "INSERT INTO profiles (user_id, bio, avatar) VALUES (?, ?, ?) \
             ON CONFLICT(user_id) DO UPDATE SET bio = excluded.bio, avatar = excluded.avatar",
        )
        .bind(profile.user_id)
        .bind(profile.bio)
        .bind(profile.avatar)
        .execute(&self.pool)
        .await
        .map_err(write_err("profile"))?;
        Ok(())
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>> {
        sqlx::query("SELECT user_id, bio, avatar FROM profiles ORDER BY user_id")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .iter()
            .map(profile_from_row)
            .collect::<sqlx::Result<Vec<_>>>()
            .map_err(db_err)
    }

    /// Atomic operation to create a listing and its tag/category links.
    ///
    /// # Developer Note
    /// Using a Transaction (tx) ensures we don't end up with listings that
    /// lost half their tags if a link insert fails.
    async fn create_listing(&self, listing: Listing) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            "INSERT INTO listings (id, name, price_per_day_cents, available_from, description, \
             created_at, attachment, image, is_public, author_id) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(listing.id)
        .bind(&listing.name)
        .bind(listing.price_per_day_cents)
        .bind(listing.available_from)
        .bind(&listing.description)
        .bind(listing.created_at)
        .bind(&listing.attachment)
        .bind(&listing.image)
        .bind(listing.is_public)
        .bind(listing.author_id)
        .execute(&mut *tx)
        .await
        .map_err(write_err("listing"))?;

        insert_links(&mut *tx, &listing).await.map_err(write_err("listing link"))?;

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn get_listing(&self, id: Uuid) -> Result<Option<Listing>> {
        let mut qb = QueryBuilder::<Sqlite>::new(LISTING_COLUMNS);
        qb.push(" WHERE l.id = ").push_bind(id);
        Ok(self.fetch_listings(qb).await?.into_iter().next())
    }

    async fn update_listing(&self, listing: Listing) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            "UPDATE listings SET name = ?, price_per_day_cents = ?, available_from = ?, \
             description = ?, attachment = ?, image = ?, is_public = ? WHERE id = ?",
        )
        .bind(&listing.name)
        .bind(listing.price_per_day_cents)
        .bind(listing.available_from)
        .bind(&listing.description)
        .bind(&listing.attachment)
        .bind(&listing.image)
        .bind(listing.is_public)
        .bind(listing.id)
        .execute(&mut *tx)
        .await
        .map_err(write_err("listing"))?;

        sqlx::query("DELETE FROM listing_tags WHERE listing_id = ?")
            .bind(listing.id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        sqlx::query("DELETE FROM listing_categories WHERE listing_id = ?")
            .bind(listing.id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        insert_links(&mut *tx, &listing).await.map_err(write_err("listing link"))?;

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn delete_listing(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM listings WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn search_listings(&self, query: ListingQuery) -> Result<Vec<Listing>> {
        let mut qb = QueryBuilder::<Sqlite>::new(LISTING_COLUMNS);
        qb.push(" WHERE 1 = 1");

        match query.viewer {
            Some(viewer) => {
                qb.push(" AND (l.is_public = 1 OR l.author_id = ").push_bind(viewer).push(")");
            }
            None => {
                qb.push(" AND l.is_public = 1");
            }
        }

        if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = like_pattern(term);
            qb.push(" AND (l.name LIKE ").push_bind(pattern.clone()).push(" ESCAPE '\\'");
            qb.push(" OR l.description LIKE ").push_bind(pattern.clone()).push(" ESCAPE '\\'");
            qb.push(
                " OR EXISTS (SELECT 1 FROM listing_tags lt JOIN tags t ON t.id = lt.tag_id \
                 WHERE lt.listing_id = l.id AND t.name LIKE ",
            )
            .push_bind(pattern)
            .push(" ESCAPE '\\'))");
        }

        if let Some(date) = query.available_from {
            qb.push(" AND l.available_from = ").push_bind(date);
        }

        if let Some(category) = query.category {
            qb.push(
                " AND EXISTS (SELECT 1 FROM listing_categories lc \
                 JOIN categories c ON c.id = lc.category_id \
                 WHERE lc.listing_id = l.id AND c.name = ",
            )
            .push_bind(category)
            .push(")");
        }

        if let Some(tag) = query.tag {
            qb.push(
                " AND EXISTS (SELECT 1 FROM listing_tags lt JOIN tags t ON t.id = lt.tag_id \
                 WHERE lt.listing_id = l.id AND t.name = ",
            )
            .push_bind(tag)
            .push(")");
        }

        qb.push(match query.ordering {
            ListingOrdering::CreatedAsc => " ORDER BY l.created_at ASC, l.id ASC",
            ListingOrdering::CreatedDesc => " ORDER BY l.created_at DESC, l.id DESC",
            ListingOrdering::NameAsc => " ORDER BY l.name ASC, l.id ASC",
            ListingOrdering::NameDesc => " ORDER BY l.name DESC, l.id DESC",
        });

        self.fetch_listings(qb).await
    }

    async fn find_listings(&self, filter: ListingFilter) -> Result<Vec<Listing>> {
        if filter.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(LISTING_COLUMNS);
        qb.push(" WHERE 0 = 1");
        if !filter.id_in.is_empty() {
            qb.push(" OR l.id IN ");
            push_id_list(&mut qb, &filter.id_in);
        }
        if !filter.tag_in.is_empty() {
            qb.push(
                " OR EXISTS (SELECT 1 FROM listing_tags lt \
                 WHERE lt.listing_id = l.id AND lt.tag_id IN ",
            );
            push_id_list(&mut qb, &filter.tag_in);
            qb.push(")");
        }
        qb.push(" ORDER BY l.created_at DESC, l.id DESC");

        let listings = self.fetch_listings(qb).await?;
        tracing::debug!(candidates = listings.len(), "find_listings");
        Ok(listings)
    }

    async fn get_tags_for_listing(&self, listing_id: Uuid) -> Result<HashSet<Uuid>> {
        let ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT tag_id FROM listing_tags WHERE listing_id = ?")
                .bind(listing_id)
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?;
        Ok(ids.into_iter().collect())
    }

    async fn create_tag(&self, tag: Tag) -> Result<()> {
        sqlx::query("INSERT INTO tags (id, name, owner_id) VALUES (?, ?, ?)")
            .bind(tag.id)
            .bind(tag.name)
            .bind(tag.owner_id)
            .execute(&self.pool)
            .await
            .map_err(write_err("tag"))?;
        Ok(())
    }

    async fn get_tag(&self, id: Uuid) -> Result<Option<Tag>> {
        let row = sqlx::query("SELECT id, name, owner_id FROM tags WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(tag_from_row).transpose().map_err(db_err)
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        sqlx::query("SELECT id, name, owner_id FROM tags ORDER BY name, id")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .iter()
            .map(tag_from_row)
            .collect::<sqlx::Result<Vec<_>>>()
            .map_err(db_err)
    }

    async fn create_category(&self, category: Category) -> Result<()> {
        sqlx::query("INSERT INTO categories (id, name, owner_id) VALUES (?, ?, ?)")
            .bind(category.id)
            .bind(category.name)
            .bind(category.owner_id)
            .execute(&self.pool)
            .await
            .map_err(write_err("category"))?;
        Ok(())
    }

    async fn get_category(&self, id: Uuid) -> Result<Option<Category>> {
        let row = sqlx::query("SELECT id, name, owner_id FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(category_from_row).transpose().map_err(db_err)
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        sqlx::query("SELECT id, name, owner_id FROM categories ORDER BY name, id")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .iter()
            .map(category_from_row)
            .collect::<sqlx::Result<Vec<_>>>()
            .map_err(db_err)
    }

    async fn get_favorites_for_user(&self, user_id: Uuid) -> Result<Vec<Favorite>> {
        sqlx::query(
            "SELECT user_id, listing_id, is_public, created_at FROM favorites \
             WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?
        .iter()
        .map(|row| -> sqlx::Result<Favorite> {
            Ok(Favorite {
                user_id: row.try_get("user_id")?,
                listing_id: row.try_get("listing_id")?,
                is_public: row.try_get("is_public")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .collect::<sqlx::Result<Vec<_>>>()
        .map_err(db_err)
    }

    async fn count_likes(&self, listing_id: Uuid) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE listing_id = ?")
            .bind(listing_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn get_ratings(&self, listing_id: Uuid) -> Result<Vec<i32>> {
        sqlx::query_scalar("SELECT value FROM ratings WHERE listing_id = ?")
            .bind(listing_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn listing_aggregates(&self, listing_ids: &[Uuid]) -> Result<Vec<Aggregate>> {
        if listing_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT l.id AS subject_id, \
             (SELECT COUNT(*) FROM likes k WHERE k.listing_id = l.id) AS like_count, \
             (SELECT COALESCE(SUM(r.value), 0) FROM ratings r \
              WHERE r.listing_id = l.id) AS rating_sum, \
             (SELECT COUNT(*) FROM ratings r WHERE r.listing_id = l.id) AS rating_count \
             FROM listings l WHERE l.id IN ",
        );
        push_id_list(&mut qb, listing_ids);
        qb.build()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .iter()
            .map(aggregate_from_row)
            .collect::<sqlx::Result<Vec<_>>>()
            .map_err(db_err)
    }

    async fn get_followers(&self, user_id: Uuid) -> Result<HashSet<Uuid>> {
        let ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT follower_id FROM follows WHERE following_id = ?")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?;
        Ok(ids.into_iter().collect())
    }

    async fn get_comment(&self, id: Uuid) -> Result<Option<Comment>> {
        let row = sqlx::query(
            "SELECT id, listing_id, author_id, text, created_at FROM comments WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.as_ref().map(comment_from_row).transpose().map_err(db_err)
    }

    async fn list_comments(&self, listing_id: Uuid) -> Result<Vec<Comment>> {
        sqlx::query(
            "SELECT id, listing_id, author_id, text, created_at FROM comments \
             WHERE listing_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(listing_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?
        .iter()
        .map(comment_from_row)
        .collect::<sqlx::Result<Vec<_>>>()
        .map_err(db_err)
    }

    async fn comment_aggregates(&self, comment_ids: &[Uuid]) -> Result<Vec<Aggregate>> {
        if comment_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT c.id AS subject_id, \
             (SELECT COUNT(*) FROM comment_likes k WHERE k.comment_id = c.id) AS like_count, \
             (SELECT COALESCE(SUM(r.value), 0) FROM comment_ratings r \
              WHERE r.comment_id = c.id) AS rating_sum, \
             (SELECT COUNT(*) FROM comment_ratings r WHERE r.comment_id = c.id) AS rating_count \
             FROM comments c WHERE c.id IN ",
        );
        push_id_list(&mut qb, comment_ids);
        qb.build()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .iter()
            .map(aggregate_from_row)
            .collect::<sqlx::Result<Vec<_>>>()
            .map_err(db_err)
    }

    async fn list_tag_subscriptions(&self, user_id: Uuid) -> Result<Vec<TagSubscription>> {
        sqlx::query(
            "SELECT user_id, tag_id, created_at FROM tag_subscriptions \
             WHERE user_id = ? ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?
        .iter()
        .map(|row| -> sqlx::Result<TagSubscription> {
            Ok(TagSubscription {
                user_id: row.try_get("user_id")?,
                tag_id: row.try_get("tag_id")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .collect::<sqlx::Result<Vec<_>>>()
        .map_err(db_err)
    }

    async fn list_category_subscriptions(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<CategorySubscription>> {
        sqlx::query(
            "SELECT user_id, category_id, created_at FROM category_subscriptions \
             WHERE user_id = ? ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?
        .iter()
        .map(|row| -> sqlx::Result<CategorySubscription> {
            Ok(CategorySubscription {
                user_id: row.try_get("user_id")?,
                category_id: row.try_get("category_id")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .collect::<sqlx::Result<Vec<_>>>()
        .map_err(db_err)
    }

    async fn get_saved_list(&self, id: Uuid) -> Result<Option<SavedList>> {
        let row = sqlx::query("SELECT id, owner_id, name, created_at FROM saved_lists WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        let Some(list) = row.as_ref().map(saved_list_from_row).transpose().map_err(db_err)? else {
            return Ok(None);
        };
        Ok(self.attach_items(vec![list]).await?.pop())
    }

    async fn list_saved_lists(&self, owner_id: Uuid) -> Result<Vec<SavedList>> {
        let lists = sqlx::query(
            "SELECT id, owner_id, name, created_at FROM saved_lists \
             WHERE owner_id = ? ORDER BY created_at, id",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?
        .iter()
        .map(saved_list_from_row)
        .collect::<sqlx::Result<Vec<_>>>()
        .map_err(db_err)?;
        self.attach_items(lists).await
    }

    async fn record_history(&self, entry: HistoryEntry) -> Result<()> {
        sqlx::query("INSERT INTO history (id, user_id, action, created_at) VALUES (?, ?, ?, ?)")
            .bind(entry.id)
            .bind(entry.user_id)
            .bind(entry.action)
            .bind(entry.created_at)
            .execute(&self.pool)
            .await
            .map_err(write_err("history entry"))?;
        Ok(())
    }

    async fn list_history(&self, user_id: Uuid) -> Result<Vec<HistoryEntry>> {
        sqlx::query(
            "SELECT id, user_id, action, created_at FROM history \
             WHERE user_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?
        .iter()
        .map(|row| -> sqlx::Result<HistoryEntry> {
            Ok(HistoryEntry {
                id: row.try_get("id")?,
                user_id: row.try_get("user_id")?,
                action: row.try_get("action")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .collect::<sqlx::Result<Vec<_>>>()
        .map_err(db_err)
    }

    async fn global_stats(&self) -> Result<GlobalStats> {
        let row = sqlx::query(
            "SELECT (SELECT COUNT(*) FROM listings) AS listings, \
             (SELECT COUNT(*) FROM comments) AS comments, \
             (SELECT COUNT(*) FROM likes) AS likes, \
             (SELECT COUNT(*) FROM ratings) AS ratings, \
             (SELECT COUNT(*) FROM users) AS users, \
             (SELECT COUNT(*) FROM categories) AS categories",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        global_stats_from_row(&row).map_err(db_err)
    }

    async fn user_stats(&self, user_id: Uuid) -> Result<UserStats> {
        let row = sqlx::query(
            "SELECT (SELECT COUNT(*) FROM listings WHERE author_id = ?) AS listings, \
             (SELECT COUNT(*) FROM comments WHERE author_id = ?) AS comments, \
             (SELECT COUNT(*) FROM likes WHERE user_id = ?) AS likes, \
             (SELECT COUNT(*) FROM ratings WHERE user_id = ?) AS ratings, \
             (SELECT COUNT(*) FROM follows WHERE follower_id = ?) AS follows",
        )
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        user_stats_from_row(&row).map_err(db_err)
    }
}
