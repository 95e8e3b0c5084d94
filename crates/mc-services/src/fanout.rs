//! # Notification Fan-out
//!
//! Tells every follower of an author that a new listing exists. Invoked
//! explicitly by the listing-creation path once the insert has committed.
//! Private listings are announced to nobody.

use std::sync::Arc;

use mc_core::error::{AppError, Result};
use mc_core::traits::{CatalogStore, NotificationStore};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Outcome of one fan-out run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FanOutReport {
    pub delivered: usize,
    pub failed: usize,
}

pub fn listing_created_message(author: &str, listing: &str) -> String {
    format!("{author} added a new listing {listing}")
}

pub struct NotificationFanOut {
    catalog: Arc<dyn CatalogStore>,
    notifications: Arc<dyn NotificationStore>,
}

impl NotificationFanOut {
    pub fn new(catalog: Arc<dyn CatalogStore>, notifications: Arc<dyn NotificationStore>) -> Self {
        Self { catalog, notifications }
    }

    /// Creates one notification per follower of `author_id`.
    ///
    /// Per-follower failures are logged and counted; they never abort the
    /// remaining deliveries. Calling this twice notifies twice.
    pub async fn on_listing_created(
        &self,
        listing_id: Uuid,
        author_id: Uuid,
    ) -> Result<FanOutReport> {
        let author = self
            .catalog
            .get_user(author_id)
            .await?
            .ok_or_else(|| AppError::not_found("User", author_id))?;
        let listing = self
            .catalog
            .get_listing(listing_id)
            .await?
            .ok_or_else(|| AppError::not_found("Listing", listing_id))?;
        if !listing.is_public {
            debug!(listing = %listing_id, "private listing, fan-out skipped");
            return Ok(FanOutReport::default());
        }

        let followers = self.catalog.get_followers(author_id).await?;
        let message = listing_created_message(&author.username, &listing.name);

        let mut report = FanOutReport::default();
        for follower in followers {
            match self.notifications.create_notification(follower, message.clone()).await {
                Ok(_) => report.delivered += 1,
                Err(err) => {
                    warn!(
                        %follower,
                        listing = %listing_id,
                        error = %err,
                        "notification delivery failed"
                    );
                    report.failed += 1;
                }
            }
        }

        info!(
            listing = %listing_id,
            author = %author_id,
            delivered = report.delivered,
            failed = report.failed,
            "listing fan-out finished"
        );
        Ok(report)
    }
}
