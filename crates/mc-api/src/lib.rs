//! # mc-api
//!
//! The HTTP routing and orchestration layer for Mini-Catalog.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod middleware;

use actix_web::error::InternalError;
use actix_web::{web, HttpResponse};

pub use handlers::AppState;

use crate::error::ErrorBody;

/// Malformed JSON bodies get the same error shape as every other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let body = ErrorBody::new(err.to_string());
        InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let body = ErrorBody::new(err.to_string());
        InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    })
}

/// Configures the catalog routes.
///
/// # Developer Note
/// Everything is mounted under `/api`; the binary only adds middleware and state.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    use handlers::*;

    cfg.app_data(json_config()).app_data(query_config()).service(
        web::scope("/api")
            // Users & profiles
            .route("/users", web::post().to(register_user))
            .route("/me", web::get().to(me))
            .route("/users/{id}", web::get().to(get_user))
            .route("/profiles", web::get().to(list_profiles))
            .route("/profiles/me", web::put().to(update_profile))
            // Listings
            .route("/items", web::get().to(search_listings))
            .route("/items", web::post().to(create_listing))
            .route("/items/{id}", web::get().to(get_listing))
            .route("/items/{id}", web::put().to(update_listing))
            .route("/items/{id}", web::delete().to(delete_listing))
            .route("/items/{id}/metrics", web::get().to(listing_metrics))
            .route("/items/{id}/like", web::post().to(like_listing))
            .route("/items/{id}/like", web::delete().to(unlike_listing))
            .route("/items/{id}/rate", web::post().to(rate_listing))
            .route("/items/{id}/favorite", web::post().to(favorite_listing))
            .route("/items/{id}/favorite", web::delete().to(unfavorite_listing))
            // Comments
            .route("/items/{id}/comments", web::get().to(list_comments))
            .route("/items/{id}/comments", web::post().to(add_comment))
            .route("/comments/{id}", web::delete().to(delete_comment))
            .route("/comments/{id}/like", web::post().to(like_comment))
            .route("/comments/{id}/rate", web::post().to(rate_comment))
            // Follow graph & per-user reads
            .route("/users/{id}/follow", web::post().to(follow_user))
            .route("/users/{id}/follow", web::delete().to(unfollow_user))
            .route("/users/{id}/followers", web::get().to(list_followers))
            .route("/users/{id}/favorites", web::get().to(list_favorites))
            .route("/users/{id}/stats", web::get().to(user_stats))
            .route("/users/{id}/history", web::get().to(user_history))
            // Engine
            .route("/recommendations", web::get().to(recommendations))
            .route("/stats", web::get().to(global_stats))
            // Taxonomy & subscriptions
            .route("/tags", web::get().to(list_tags))
            .route("/tags", web::post().to(create_tag))
            .route("/tags/{id}/subscribe", web::post().to(subscribe_tag))
            .route("/categories", web::get().to(list_categories))
            .route("/categories", web::post().to(create_category))
            .route("/categories/{id}/subscribe", web::post().to(subscribe_category))
            .route("/subscriptions", web::get().to(list_subscriptions))
            // Saved lists
            .route("/lists", web::get().to(list_saved_lists))
            .route("/lists", web::post().to(create_saved_list))
            .route("/lists/{id}", web::get().to(get_saved_list))
            .route("/lists/{id}/items", web::post().to(add_saved_item))
            .route("/lists/{id}/items/{item_id}", web::delete().to(remove_saved_item))
            // Notifications
            .route("/notifications", web::get().to(list_notifications))
            .route("/notifications/{id}/read", web::post().to(mark_notification_read)),
    );
}
