//! # Catalog Service
//!
//! Listing lifecycle and taxonomy. Ownership checks live here; the listing
//! creation path is also where history and the follower fan-out are driven.

use std::sync::Arc;

use chrono::Utc;
use mc_core::error::{AppError, Result};
use mc_core::models::{Category, HistoryEntry, Listing, ListingDraft, ListingQuery, Tag};
use mc_core::traits::CatalogStore;
use tracing::{info, warn};
use uuid::Uuid;

use crate::fanout::NotificationFanOut;

/// File references a listing may carry.
pub const ALLOWED_ATTACHMENT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "pdf"];

pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    fanout: NotificationFanOut,
}

fn validate_draft(draft: &ListingDraft) -> Result<()> {
    if draft.name.trim().is_empty() {
        return Err(AppError::ValidationError("listing name must not be empty".into()));
    }
    if draft.price_per_day_cents < 0 {
        return Err(AppError::ValidationError("price must not be negative".into()));
    }
    for reference in [&draft.attachment, &draft.image].into_iter().flatten() {
        validate_attachment(reference)?;
    }
    Ok(())
}

/// Accepts only references whose extension is in `ALLOWED_ATTACHMENT_EXTENSIONS`.
pub fn validate_attachment(reference: &str) -> Result<()> {
    let extension = reference
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if ALLOWED_ATTACHMENT_EXTENSIONS.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(AppError::ValidationError(format!(
            "unsupported file type for {reference}; allowed: JPG, PNG, PDF"
        )))
    }
}

fn validate_name(kind: &str, name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::ValidationError(format!("{kind} name must not be empty")));
    }
    Ok(name.to_string())
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>, fanout: NotificationFanOut) -> Self {
        Self { store, fanout }
    }

    async fn check_references(&self, draft: &ListingDraft) -> Result<()> {
        for tag_id in &draft.tag_ids {
            if self.store.get_tag(*tag_id).await?.is_none() {
                return Err(AppError::not_found("Tag", tag_id));
            }
        }
        for category_id in &draft.category_ids {
            if self.store.get_category(*category_id).await?.is_none() {
                return Err(AppError::not_found("Category", category_id));
            }
        }
        Ok(())
    }

    /// History is an audit trail; failing to write it never fails the caller.
    async fn record(&self, user_id: Uuid, action: String) {
        let entry = HistoryEntry { id: Uuid::now_v7(), user_id, action, created_at: Utc::now() };
        if let Err(err) = self.store.record_history(entry).await {
            warn!(user = %user_id, error = %err, "failed to record history");
        }
    }

    /// Loads a listing the actor is allowed to modify.
    async fn owned_listing(&self, actor: Uuid, listing_id: Uuid) -> Result<Listing> {
        let listing = self
            .store
            .get_listing(listing_id)
            .await?
            .ok_or_else(|| AppError::not_found("Listing", listing_id))?;
        if listing.author_id != actor {
            return Err(AppError::Forbidden("only the author may modify this listing".into()));
        }
        Ok(listing)
    }

    pub async fn create_listing(&self, author_id: Uuid, draft: ListingDraft) -> Result<Listing> {
        validate_draft(&draft)?;
        if self.store.get_user(author_id).await?.is_none() {
            return Err(AppError::not_found("User", author_id));
        }
        self.check_references(&draft).await?;

        let listing = Listing {
            id: Uuid::now_v7(),
            name: draft.name.trim().to_string(),
            price_per_day_cents: draft.price_per_day_cents,
            available_from: draft.available_from,
            description: draft.description,
            created_at: Utc::now(),
            attachment: draft.attachment,
            image: draft.image,
            is_public: draft.is_public,
            author_id,
            tag_ids: draft.tag_ids,
            category_ids: draft.category_ids,
        };
        self.store.create_listing(listing.clone()).await?;
        info!(listing = %listing.id, author = %author_id, "listing created");

        self.record(author_id, format!("Added listing {}", listing.name)).await;

        // The listing is committed at this point; a failed fan-out is only logged.
        if let Err(err) = self.fanout.on_listing_created(listing.id, author_id).await {
            warn!(listing = %listing.id, error = %err, "fan-out aborted");
        }

        Ok(listing)
    }

    pub async fn update_listing(
        &self,
        actor: Uuid,
        listing_id: Uuid,
        draft: ListingDraft,
    ) -> Result<Listing> {
        validate_draft(&draft)?;
        let existing = self.owned_listing(actor, listing_id).await?;
        self.check_references(&draft).await?;

        let listing = Listing {
            name: draft.name.trim().to_string(),
            price_per_day_cents: draft.price_per_day_cents,
            available_from: draft.available_from,
            description: draft.description,
            attachment: draft.attachment,
            image: draft.image,
            is_public: draft.is_public,
            tag_ids: draft.tag_ids,
            category_ids: draft.category_ids,
            ..existing
        };
        self.store.update_listing(listing.clone()).await?;
        self.record(actor, format!("Updated listing {}", listing.name)).await;

        Ok(listing)
    }

    pub async fn delete_listing(&self, actor: Uuid, listing_id: Uuid) -> Result<()> {
        self.owned_listing(actor, listing_id).await?;
        if !self.store.delete_listing(listing_id).await? {
            return Err(AppError::not_found("Listing", listing_id));
        }
        info!(listing = %listing_id, "listing deleted");
        Ok(())
    }

    /// Non-public listings are reported as missing to everyone but their author.
    pub async fn get_listing(&self, viewer: Option<Uuid>, listing_id: Uuid) -> Result<Listing> {
        match self.store.get_listing(listing_id).await? {
            Some(listing) if listing.is_public || Some(listing.author_id) == viewer => Ok(listing),
            _ => Err(AppError::not_found("Listing", listing_id)),
        }
    }

    pub async fn search_listings(
        &self,
        viewer: Option<Uuid>,
        mut query: ListingQuery,
    ) -> Result<Vec<Listing>> {
        query.viewer = viewer;
        self.store.search_listings(query).await
    }

    pub async fn create_tag(&self, owner: Option<Uuid>, name: &str) -> Result<Tag> {
        let tag = Tag { id: Uuid::now_v7(), name: validate_name("tag", name)?, owner_id: owner };
        self.store.create_tag(tag.clone()).await?;
        Ok(tag)
    }

    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        self.store.list_tags().await
    }

    pub async fn create_category(&self, owner: Option<Uuid>, name: &str) -> Result<Category> {
        let name = validate_name("category", name)?;
        let category = Category { id: Uuid::now_v7(), name, owner_id: owner };
        self.store.create_category(category.clone()).await?;
        Ok(category)
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.store.list_categories().await
    }
}
