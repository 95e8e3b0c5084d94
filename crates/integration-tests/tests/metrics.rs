mod common;

use common::World;
use mc_core::error::AppError;
use mc_core::traits::CatalogStore;

#[tokio::test]
async fn unrated_listing_averages_zero() {
    let world = World::new().await;
    let author = world.user("alice").await;
    let item = world.listing(author, "Tent", &[]).await;

    let metrics = world.engine.get_listing_metrics(item).await.unwrap();
    assert_eq!(metrics.like_count, 0);
    assert_eq!(metrics.average_rating, 0.0);
}

#[tokio::test]
async fn three_four_five_averages_four() {
    let world = World::new().await;
    let author = world.user("alice").await;
    let item = world.listing(author, "Tent", &[]).await;
    world.rate_by_many(item, &[3, 4, 5]).await;

    let metrics = world.engine.get_listing_metrics(item).await.unwrap();
    assert_eq!(metrics.average_rating, 4.0);
}

#[tokio::test]
async fn averages_round_to_two_decimals() {
    let world = World::new().await;
    let author = world.user("alice").await;
    let item = world.listing(author, "Tent", &[]).await;
    world.rate_by_many(item, &[1, 2, 2]).await;

    let metrics = world.engine.get_listing_metrics(item).await.unwrap();
    assert_eq!(metrics.average_rating, 1.67);
}

#[tokio::test]
async fn second_rating_replaces_the_first() {
    let world = World::new().await;
    let author = world.user("alice").await;
    let rater = world.user("bob").await;
    let item = world.listing(author, "Tent", &[]).await;

    world.interactions.rate(rater, item, 1).await.unwrap();
    world.interactions.rate(rater, item, 5).await.unwrap();

    assert_eq!(world.store.get_ratings(item).await.unwrap(), vec![5]);
    assert_eq!(world.engine.get_listing_metrics(item).await.unwrap().average_rating, 5.0);
}

#[tokio::test]
async fn likes_are_counted_once_per_user() {
    let world = World::new().await;
    let author = world.user("alice").await;
    let fan = world.user("bob").await;
    let item = world.listing(author, "Tent", &[]).await;

    world.interactions.like(author, item).await.unwrap();
    world.interactions.like(fan, item).await.unwrap();
    let err = world.interactions.like(fan, item).await.unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(world.engine.get_listing_metrics(item).await.unwrap().like_count, 2);
}

#[tokio::test]
async fn comments_carry_their_own_metrics() {
    let world = World::new().await;
    let author = world.user("alice").await;
    let fan = world.user("bob").await;
    let item = world.listing(author, "Tent", &[]).await;

    let comment = world.interactions.add_comment(fan, item, "Great tent").await.unwrap();
    world.interactions.like_comment(author, comment.id).await.unwrap();
    world.interactions.rate_comment(author, comment.id, 4).await.unwrap();
    world.interactions.rate_comment(fan, comment.id, 3).await.unwrap();

    let comments = world.engine.list_comments(item).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].like_count, 1);
    assert_eq!(comments[0].average_rating, 3.5);
}

#[tokio::test]
async fn metrics_for_missing_listing_is_not_found() {
    let world = World::new().await;
    let err = world.engine.get_listing_metrics(uuid::Uuid::now_v7()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(kind, _) if kind == "Listing"));
}

#[tokio::test]
async fn second_comment_rating_replaces_the_first() {
    let world = World::new().await;
    let author = world.user("alice").await;
    let fan = world.user("bob").await;
    let item = world.listing(author, "Tent", &[]).await;
    let comment = world.interactions.add_comment(fan, item, "Great tent").await.unwrap();

    world.interactions.rate_comment(author, comment.id, 2).await.unwrap();
    world.interactions.rate_comment(author, comment.id, 5).await.unwrap();

    let comments = world.engine.list_comments(item).await.unwrap();
    assert_eq!(comments[0].average_rating, 5.0);
    assert_eq!(world.engine.get_global_stats().await.unwrap().ratings, 0);
}
