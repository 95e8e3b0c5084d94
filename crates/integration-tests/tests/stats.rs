mod common;

use common::World;
use mc_core::models::UserStats;
use uuid::Uuid;

/// Builds a small but uneven catalog and returns every user id.
async fn populate(world: &World) -> Vec<Uuid> {
    let alice = world.user("alice").await;
    let bob = world.user("bob").await;
    let carol = world.user("carol").await;
    let tag = world.tag("outdoor").await;

    let tent = world.listing(alice, "Tent", &[tag]).await;
    let kayak = world.listing(alice, "Kayak", &[tag]).await;
    let drill = world.listing(bob, "Drill", &[]).await;

    world.interactions.like(bob, tent).await.unwrap();
    world.interactions.like(carol, tent).await.unwrap();
    world.interactions.like(carol, drill).await.unwrap();
    world.interactions.rate(bob, tent, 5).await.unwrap();
    world.interactions.rate(carol, kayak, 3).await.unwrap();
    world.interactions.rate(carol, kayak, 4).await.unwrap();
    world.interactions.add_comment(bob, tent, "roomy").await.unwrap();
    world.interactions.add_comment(carol, drill, "loud").await.unwrap();
    world.interactions.add_comment(carol, tent, "leaks").await.unwrap();
    world.interactions.follow(bob, alice).await.unwrap();

    vec![alice, bob, carol]
}

#[tokio::test]
async fn global_counts_match_per_user_sums() {
    let world = World::new().await;
    let users = populate(&world).await;

    let mut sum = UserStats::default();
    for user in &users {
        let stats = world.engine.get_user_stats(*user).await.unwrap();
        sum.listings += stats.listings;
        sum.comments += stats.comments;
        sum.likes += stats.likes;
        sum.ratings += stats.ratings;
    }
    let global = world.engine.get_global_stats().await.unwrap();

    assert_eq!(global.listings, sum.listings);
    assert_eq!(global.comments, sum.comments);
    assert_eq!(global.likes, sum.likes);
    assert_eq!(global.ratings, sum.ratings);
    assert_eq!(global.users, 3);
}

#[tokio::test]
async fn per_user_counts() {
    let world = World::new().await;
    let users = populate(&world).await;

    let carol = world.engine.get_user_stats(users[2]).await.unwrap();
    assert_eq!(carol, UserStats { listings: 0, comments: 2, likes: 2, ratings: 1, follows: 0 });

    let bob = world.engine.get_user_stats(users[1]).await.unwrap();
    assert_eq!(bob.follows, 1);
    assert_eq!(bob.listings, 1);
}
