use std::sync::Arc;

use chrono::Utc;
use mc_core::error::{AppError, Result};
use mc_core::models::{Profile, User};
use mc_core::traits::CatalogStore;
use tracing::info;
use uuid::Uuid;

use crate::catalog::validate_attachment;

pub struct UserService {
    store: Arc<dyn CatalogStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Username uniqueness is enforced by storage and surfaces as `Conflict`.
    pub async fn register(&self, username: &str, email: &str) -> Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::ValidationError("username must not be empty".into()));
        }
        let user = User {
            id: Uuid::now_v7(),
            username: username.to_string(),
            email: email.trim().to_string(),
            created_at: Utc::now(),
        };
        self.store.create_user(user.clone()).await?;
        info!(user = %user.id, username = %user.username, "user registered");
        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::not_found("User", id))
    }

    /// Users without a stored profile get an empty one.
    pub async fn get_profile(&self, user_id: Uuid) -> Result<Profile> {
        self.get_user(user_id).await?;
        Ok(self
            .store
            .get_profile(user_id)
            .await?
            .unwrap_or(Profile { user_id, bio: String::new(), avatar: None }))
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        bio: String,
        avatar: Option<String>,
    ) -> Result<Profile> {
        if let Some(avatar) = &avatar {
            validate_attachment(avatar)?;
        }
        self.get_user(user_id).await?;
        let profile = Profile { user_id, bio, avatar };
        self.store.upsert_profile(profile.clone()).await?;
        Ok(profile)
    }

    pub async fn list_profiles(&self) -> Result<Vec<Profile>> {
        self.store.list_profiles().await
    }
}
