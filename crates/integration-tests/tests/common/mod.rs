//! Shared fixtures: every service wired to one fresh in-memory SQLite store.
#![allow(dead_code)]

use std::sync::Arc;

use mc_core::models::ListingDraft;
use mc_core::traits::{CatalogStore, InteractionRecorder, NotificationStore};
use mc_db_sqlite::SqliteCatalog;
use mc_services::{
    AggregationEngine, CatalogService, InteractionService, NotificationFanOut, RecommendationPolicy,
    UserService,
};
use uuid::Uuid;

pub struct World {
    pub store: Arc<SqliteCatalog>,
    pub catalog: CatalogService,
    pub interactions: InteractionService,
    pub users: UserService,
    pub engine: AggregationEngine,
}

impl World {
    pub async fn new() -> Self {
        Self::with_policy(RecommendationPolicy::default()).await
    }

    pub async fn with_policy(policy: RecommendationPolicy) -> Self {
        let store = Arc::new(SqliteCatalog::in_memory().await.expect("in-memory store"));
        let catalog_store: Arc<dyn CatalogStore> = store.clone();
        let recorder: Arc<dyn InteractionRecorder> = store.clone();
        let notifications: Arc<dyn NotificationStore> = store.clone();

        World {
            catalog: CatalogService::new(
                catalog_store.clone(),
                NotificationFanOut::new(catalog_store.clone(), notifications.clone()),
            ),
            interactions: InteractionService::new(catalog_store.clone(), recorder, notifications),
            users: UserService::new(catalog_store.clone()),
            engine: AggregationEngine::new(catalog_store, policy),
            store,
        }
    }

    pub fn fanout(&self) -> NotificationFanOut {
        NotificationFanOut::new(self.store.clone(), self.store.clone())
    }

    pub async fn user(&self, name: &str) -> Uuid {
        self.users.register(name, &format!("{name}@example.com")).await.expect("register").id
    }

    pub async fn tag(&self, name: &str) -> Uuid {
        self.catalog.create_tag(None, name).await.expect("tag").id
    }

    pub async fn listing(&self, author: Uuid, name: &str, tags: &[Uuid]) -> Uuid {
        self.listing_with_visibility(author, name, tags, true).await
    }

    pub async fn private_listing(&self, author: Uuid, name: &str, tags: &[Uuid]) -> Uuid {
        self.listing_with_visibility(author, name, tags, false).await
    }

    async fn listing_with_visibility(
        &self,
        author: Uuid,
        name: &str,
        tags: &[Uuid],
        is_public: bool,
    ) -> Uuid {
        let draft = ListingDraft {
            name: name.to_string(),
            price_per_day_cents: 1000,
            description: format!("{name} for rent"),
            is_public,
            tag_ids: tags.to_vec(),
            ..Default::default()
        };
        self.catalog.create_listing(author, draft).await.expect("listing").id
    }

    /// Each value is submitted by a freshly registered rater.
    pub async fn rate_by_many(&self, listing: Uuid, values: &[i32]) {
        for value in values {
            let rater = self.user(&format!("rater-{}", Uuid::now_v7().simple())).await;
            self.interactions.rate(rater, listing, *value).await.expect("rate");
        }
    }
}
