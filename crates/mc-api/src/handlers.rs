//! # mc-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the services.
//! Handlers only extract, delegate and shape; rules live in `mc-services`.

use std::sync::Arc;

use actix_web::{web, HttpResponse};
use mc_core::error::AppError;
use mc_core::models::{CommentWithMetrics, ListingOrdering, ListingQuery};
use mc_core::traits::{CatalogStore, InteractionRecorder, NotificationStore};
use mc_services::{
    AggregationEngine, CatalogService, InteractionService, NotificationFanOut, RecommendationPolicy,
    UserService,
};
use uuid::Uuid;

use crate::dto::*;
use crate::error::ApiResult;
use crate::identity::{viewer_id, AuthenticatedUser};

/// State shared across all Actix-web workers.
pub struct AppState {
    pub catalog: CatalogService,
    pub interactions: InteractionService,
    pub users: UserService,
    pub engine: AggregationEngine,
}

impl AppState {
    /// Wires every service to one store implementing all three ports.
    pub fn new<S>(store: Arc<S>, policy: RecommendationPolicy) -> Self
    where
        S: CatalogStore + InteractionRecorder + NotificationStore + 'static,
    {
        let catalog_store: Arc<dyn CatalogStore> = store.clone();
        let recorder: Arc<dyn InteractionRecorder> = store.clone();
        let notifications: Arc<dyn NotificationStore> = store;

        let fanout = NotificationFanOut::new(catalog_store.clone(), notifications.clone());
        Self {
            catalog: CatalogService::new(catalog_store.clone(), fanout),
            interactions: InteractionService::new(catalog_store.clone(), recorder, notifications),
            users: UserService::new(catalog_store.clone()),
            engine: AggregationEngine::new(catalog_store, policy),
        }
    }
}

fn collect<T, R: From<T>>(items: Vec<T>) -> Vec<R> {
    items.into_iter().map(R::from).collect()
}

// ── Users & profiles ────────────────────────────────────────────────────────

pub async fn register_user(
    data: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let user = data.users.register(&body.username, &body.email).await?;
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

pub async fn me(data: web::Data<AppState>, user: AuthenticatedUser) -> ApiResult<HttpResponse> {
    let user = data.users.get_user(user.id()).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

pub async fn get_user(data: web::Data<AppState>, path: web::Path<Uuid>) -> ApiResult<HttpResponse> {
    let user = data.users.get_user(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

pub async fn list_profiles(data: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let profiles: Vec<ProfileResponse> = collect(data.users.list_profiles().await?);
    Ok(HttpResponse::Ok().json(profiles))
}

pub async fn update_profile(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<ProfileRequest>,
) -> ApiResult<HttpResponse> {
    let ProfileRequest { bio, avatar } = body.into_inner();
    let profile = data.users.update_profile(user.id(), bio, avatar).await?;
    Ok(HttpResponse::Ok().json(ProfileResponse::from(profile)))
}

// ── Listings ────────────────────────────────────────────────────────────────

pub async fn search_listings(
    data: web::Data<AppState>,
    viewer: Option<AuthenticatedUser>,
    params: web::Query<SearchParams>,
) -> ApiResult<HttpResponse> {
    let SearchParams { search, available_from, category, tag, ordering } = params.into_inner();
    let ordering = match ordering.as_deref() {
        None => ListingOrdering::default(),
        Some(raw) => ListingOrdering::parse(raw)
            .ok_or_else(|| AppError::ValidationError(format!("unknown ordering {raw}")))?,
    };
    let query = ListingQuery { search, available_from, category, tag, ordering, viewer: None };

    let listings: Vec<ListingResponse> =
        collect(data.catalog.search_listings(viewer_id(&viewer), query).await?);
    Ok(HttpResponse::Ok().json(listings))
}

pub async fn create_listing(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<ListingRequest>,
) -> ApiResult<HttpResponse> {
    let listing = data.catalog.create_listing(user.id(), body.into_inner().into()).await?;
    Ok(HttpResponse::Created().json(ListingResponse::from(listing)))
}

pub async fn get_listing(
    data: web::Data<AppState>,
    viewer: Option<AuthenticatedUser>,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let listing = data.catalog.get_listing(viewer_id(&viewer), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ListingResponse::from(listing)))
}

pub async fn update_listing(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<ListingRequest>,
) -> ApiResult<HttpResponse> {
    let listing = data
        .catalog
        .update_listing(user.id(), path.into_inner(), body.into_inner().into())
        .await?;
    Ok(HttpResponse::Ok().json(ListingResponse::from(listing)))
}

pub async fn delete_listing(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    data.catalog.delete_listing(user.id(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn listing_metrics(
    data: web::Data<AppState>,
    viewer: Option<AuthenticatedUser>,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let listing_id = path.into_inner();
    data.catalog.get_listing(viewer_id(&viewer), listing_id).await?;
    let metrics = data.engine.get_listing_metrics(listing_id).await?;
    Ok(HttpResponse::Ok().json(MetricsResponse::from(metrics)))
}

// ── Listing interactions ────────────────────────────────────────────────────

pub async fn like_listing(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    data.interactions.like(user.id(), path.into_inner()).await?;
    Ok(HttpResponse::Created().finish())
}

pub async fn unlike_listing(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    data.interactions.unlike(user.id(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Responds with the listing's refreshed metrics.
pub async fn rate_listing(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<RateRequest>,
) -> ApiResult<HttpResponse> {
    let listing_id = path.into_inner();
    data.interactions.rate(user.id(), listing_id, body.value).await?;
    let metrics = data.engine.get_listing_metrics(listing_id).await?;
    Ok(HttpResponse::Ok().json(MetricsResponse::from(metrics)))
}

pub async fn favorite_listing(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: Option<web::Json<FavoriteRequest>>,
) -> ApiResult<HttpResponse> {
    let is_public = body.map_or(true, |b| b.is_public);
    data.interactions.favorite(user.id(), path.into_inner(), is_public).await?;
    Ok(HttpResponse::Created().finish())
}

pub async fn unfavorite_listing(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    data.interactions.unfavorite(user.id(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ── Comments ────────────────────────────────────────────────────────────────

pub async fn list_comments(
    data: web::Data<AppState>,
    viewer: Option<AuthenticatedUser>,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let listing_id = path.into_inner();
    data.catalog.get_listing(viewer_id(&viewer), listing_id).await?;
    let comments: Vec<CommentResponse> = collect(data.engine.list_comments(listing_id).await?);
    Ok(HttpResponse::Ok().json(comments))
}

pub async fn add_comment(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<CommentRequest>,
) -> ApiResult<HttpResponse> {
    let comment = data.interactions.add_comment(user.id(), path.into_inner(), &body.text).await?;
    Ok(HttpResponse::Created().json(CommentResponse::from(CommentWithMetrics {
        comment,
        like_count: 0,
        average_rating: 0.0,
    })))
}

pub async fn delete_comment(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    data.interactions.delete_comment(user.id(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn like_comment(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    data.interactions.like_comment(user.id(), path.into_inner()).await?;
    Ok(HttpResponse::Created().finish())
}

pub async fn rate_comment(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<RateRequest>,
) -> ApiResult<HttpResponse> {
    data.interactions.rate_comment(user.id(), path.into_inner(), body.value).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ── Follow graph & per-user reads ───────────────────────────────────────────

pub async fn follow_user(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    data.interactions.follow(user.id(), path.into_inner()).await?;
    Ok(HttpResponse::Created().finish())
}

pub async fn unfollow_user(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    data.interactions.unfollow(user.id(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn list_followers(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let user_id = path.into_inner();
    let mut followers: Vec<Uuid> =
        data.interactions.list_followers(user_id).await?.into_iter().collect();
    followers.sort();
    Ok(HttpResponse::Ok().json(FollowersResponse { user_id, followers }))
}

pub async fn list_favorites(
    data: web::Data<AppState>,
    viewer: Option<AuthenticatedUser>,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let favorites: Vec<FavoriteResponse> =
        collect(data.interactions.list_favorites(viewer_id(&viewer), path.into_inner()).await?);
    Ok(HttpResponse::Ok().json(favorites))
}

pub async fn user_stats(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let stats = data.engine.get_user_stats(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(UserStatsResponse::from(stats)))
}

pub async fn user_history(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let history: Vec<HistoryResponse> =
        collect(data.interactions.list_history(user.id(), path.into_inner()).await?);
    Ok(HttpResponse::Ok().json(history))
}

// ── Engine ──────────────────────────────────────────────────────────────────

pub async fn recommendations(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let recs: Vec<RecommendationResponse> =
        collect(data.engine.get_recommendations(user.id()).await?);
    Ok(HttpResponse::Ok().json(recs))
}

pub async fn global_stats(data: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let stats = data.engine.get_global_stats().await?;
    Ok(HttpResponse::Ok().json(GlobalStatsResponse::from(stats)))
}

// ── Taxonomy & subscriptions ────────────────────────────────────────────────

pub async fn list_tags(data: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let tags: Vec<TaxonomyResponse> = collect(data.catalog.list_tags().await?);
    Ok(HttpResponse::Ok().json(tags))
}

pub async fn create_tag(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<TaxonomyRequest>,
) -> ApiResult<HttpResponse> {
    let owner = (!body.global).then_some(user.id());
    let tag = data.catalog.create_tag(owner, &body.name).await?;
    Ok(HttpResponse::Created().json(TaxonomyResponse::from(tag)))
}

pub async fn list_categories(data: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let categories: Vec<TaxonomyResponse> = collect(data.catalog.list_categories().await?);
    Ok(HttpResponse::Ok().json(categories))
}

pub async fn create_category(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<TaxonomyRequest>,
) -> ApiResult<HttpResponse> {
    let owner = (!body.global).then_some(user.id());
    let category = data.catalog.create_category(owner, &body.name).await?;
    Ok(HttpResponse::Created().json(TaxonomyResponse::from(category)))
}

pub async fn subscribe_tag(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    data.interactions.subscribe_tag(user.id(), path.into_inner()).await?;
    Ok(HttpResponse::Created().finish())
}

pub async fn subscribe_category(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    data.interactions.subscribe_category(user.id(), path.into_inner()).await?;
    Ok(HttpResponse::Created().finish())
}

pub async fn list_subscriptions(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let subs = data.interactions.list_subscriptions(user.id()).await?;
    Ok(HttpResponse::Ok().json(SubscriptionsResponse::from(subs)))
}

// ── Saved lists ─────────────────────────────────────────────────────────────

pub async fn list_saved_lists(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let lists: Vec<SavedListResponse> = collect(data.interactions.list_lists(user.id()).await?);
    Ok(HttpResponse::Ok().json(lists))
}

pub async fn create_saved_list(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<SavedListRequest>,
) -> ApiResult<HttpResponse> {
    let list = data.interactions.create_list(user.id(), &body.name).await?;
    Ok(HttpResponse::Created().json(SavedListResponse::from(list)))
}

pub async fn get_saved_list(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let list = data.interactions.get_list(user.id(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(SavedListResponse::from(list)))
}

pub async fn add_saved_item(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<SavedItemRequest>,
) -> ApiResult<HttpResponse> {
    data.interactions.add_to_list(user.id(), path.into_inner(), body.item_id).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({ "status": "added" })))
}

pub async fn remove_saved_item(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid)>,
) -> ApiResult<HttpResponse> {
    let (list_id, item_id) = path.into_inner();
    data.interactions.remove_from_list(user.id(), list_id, item_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ── Notifications ───────────────────────────────────────────────────────────

pub async fn list_notifications(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let notifications: Vec<NotificationResponse> =
        collect(data.interactions.list_notifications(user.id()).await?);
    Ok(HttpResponse::Ok().json(notifications))
}

pub async fn mark_notification_read(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    data.interactions.mark_notification_read(user.id(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
