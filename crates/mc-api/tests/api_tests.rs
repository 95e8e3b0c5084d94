use std::sync::Arc;

use actix_web::{test, web, App};
use mc_api::identity::USER_ID_HEADER;
use mc_api::{configure_routes, AppState};
use mc_db_sqlite::SqliteCatalog;
use mc_services::RecommendationPolicy;
use serde_json::{json, Value};

macro_rules! init_app {
    () => {{
        let store = Arc::new(SqliteCatalog::in_memory().await.unwrap());
        let state = web::Data::new(AppState::new(store, RecommendationPolicy::default()));
        test::init_service(App::new().app_data(state).configure(configure_routes)).await
    }};
}

/// Registers a user and returns its id as a string.
macro_rules! register {
    ($app:expr, $username:expr) => {{
        let email = format!("{}@example.com", $username);
        let req = test::TestRequest::post()
            .uri("/api/users")
            .set_json(json!({ "username": $username, "email": email }))
            .to_request();
        let resp: Value = test::call_and_read_body_json(&$app, req).await;
        resp["id"].as_str().unwrap().to_string()
    }};
}

macro_rules! create_tag {
    ($app:expr, $user:expr, $name:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/tags")
            .insert_header((USER_ID_HEADER, $user.clone()))
            .set_json(json!({ "name": $name, "global": true }))
            .to_request();
        let resp: Value = test::call_and_read_body_json(&$app, req).await;
        resp["id"].as_str().unwrap().to_string()
    }};
}

macro_rules! create_item {
    ($app:expr, $user:expr, $body:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/items")
            .insert_header((USER_ID_HEADER, $user.clone()))
            .set_json($body)
            .to_request();
        let resp: Value = test::call_and_read_body_json(&$app, req).await;
        resp["id"].as_str().unwrap().to_string()
    }};
}

#[actix_web::test]
async fn test_register_and_me() {
    let app = init_app!();
    let alice = register!(app, "alice");

    let req = test::TestRequest::get()
        .uri("/api/me")
        .insert_header((USER_ID_HEADER, alice.clone()))
        .to_request();
    let resp: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(resp["username"], "alice");
    assert_eq!(resp["id"], alice.as_str());
}

#[actix_web::test]
async fn test_duplicate_username_is_conflict() {
    let app = init_app!();
    register!(app, "alice");

    let req = test::TestRequest::post()
        .uri("/api/users")
        .set_json(json!({ "username": "alice" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 409);
}

#[actix_web::test]
async fn test_missing_identity_is_unauthorized() {
    let app = init_app!();

    let req = test::TestRequest::get().uri("/api/recommendations").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains(USER_ID_HEADER));
}

#[actix_web::test]
async fn test_malformed_json_uses_error_shape() {
    let app = init_app!();
    let alice = register!(app, "alice");

    let req = test::TestRequest::post()
        .uri("/api/items")
        .insert_header((USER_ID_HEADER, alice))
        .insert_header(("content-type", "application/json"))
        .set_payload("{ not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn test_private_listing_hidden_from_strangers() {
    let app = init_app!();
    let alice = register!(app, "alice");
    let bob = register!(app, "bob");
    let item = create_item!(
        app,
        alice,
        json!({ "name": "Kayak", "price_per_day_cents": 3000, "is_public": false })
    );

    let req = test::TestRequest::get()
        .uri(&format!("/api/items/{item}"))
        .insert_header((USER_ID_HEADER, alice))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    let req = test::TestRequest::get()
        .uri(&format!("/api/items/{item}"))
        .insert_header((USER_ID_HEADER, bob))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);

    let req = test::TestRequest::get().uri("/api/items").to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed.as_array().unwrap().len(), 0);
}

#[actix_web::test]
async fn test_update_by_non_author_is_forbidden() {
    let app = init_app!();
    let alice = register!(app, "alice");
    let bob = register!(app, "bob");
    let item = create_item!(app, alice, json!({ "name": "Tent", "price_per_day_cents": 1200 }));

    let req = test::TestRequest::put()
        .uri(&format!("/api/items/{item}"))
        .insert_header((USER_ID_HEADER, bob.clone()))
        .set_json(json!({ "name": "Mine now", "price_per_day_cents": 0 }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/items/{item}"))
        .insert_header((USER_ID_HEADER, bob))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);
}

#[actix_web::test]
async fn test_like_twice_is_conflict() {
    let app = init_app!();
    let alice = register!(app, "alice");
    let item = create_item!(app, alice, json!({ "name": "Ladder", "price_per_day_cents": 700 }));

    let like = || {
        test::TestRequest::post()
            .uri(&format!("/api/items/{item}/like"))
            .insert_header((USER_ID_HEADER, alice.clone()))
            .to_request()
    };
    assert_eq!(test::call_service(&app, like()).await.status(), 201);
    assert_eq!(test::call_service(&app, like()).await.status(), 409);
}

#[actix_web::test]
async fn test_rating_replaces_and_validates() {
    let app = init_app!();
    let alice = register!(app, "alice");
    let item = create_item!(app, alice, json!({ "name": "Saw", "price_per_day_cents": 300 }));

    let rate = |value: i32| {
        test::TestRequest::post()
            .uri(&format!("/api/items/{item}/rate"))
            .insert_header((USER_ID_HEADER, alice.clone()))
            .set_json(json!({ "value": value }))
            .to_request()
    };

    assert_eq!(test::call_service(&app, rate(0)).await.status(), 400);

    let first: Value = test::call_and_read_body_json(&app, rate(2)).await;
    assert_eq!(first["average_rating"], 2.0);

    let second: Value = test::call_and_read_body_json(&app, rate(5)).await;
    assert_eq!(second["average_rating"], 5.0);
}

#[actix_web::test]
async fn test_follower_is_notified_of_new_listing() {
    let app = init_app!();
    let alice = register!(app, "alice");
    let bob = register!(app, "bob");

    let req = test::TestRequest::post()
        .uri(&format!("/api/users/{alice}/follow"))
        .insert_header((USER_ID_HEADER, bob.clone()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    create_item!(app, alice, json!({ "name": "Canoe", "price_per_day_cents": 4000 }));

    let req = test::TestRequest::get()
        .uri("/api/notifications")
        .insert_header((USER_ID_HEADER, bob))
        .to_request();
    let notifications: Value = test::call_and_read_body_json(&app, req).await;
    let notifications = notifications.as_array().unwrap();

    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["message"], "alice added a new listing Canoe");
    assert_eq!(notifications[0]["is_read"], false);
}

#[actix_web::test]
async fn test_recommendations_follow_favorite_tags() {
    let app = init_app!();
    let alice = register!(app, "alice");

    let tag = create_tag!(app, alice, "camping");

    let tent = create_item!(
        app,
        alice,
        json!({ "name": "Tent", "price_per_day_cents": 1000, "tags": [tag] })
    );
    let stove = create_item!(
        app,
        alice,
        json!({ "name": "Stove", "price_per_day_cents": 500, "tags": [tag] })
    );
    create_item!(app, alice, json!({ "name": "Drill", "price_per_day_cents": 800 }));

    let req = test::TestRequest::post()
        .uri(&format!("/api/items/{tent}/favorite"))
        .insert_header((USER_ID_HEADER, alice.clone()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    let req = test::TestRequest::post()
        .uri(&format!("/api/items/{stove}/rate"))
        .insert_header((USER_ID_HEADER, alice.clone()))
        .set_json(json!({ "value": 4 }))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get()
        .uri("/api/recommendations")
        .insert_header((USER_ID_HEADER, alice))
        .to_request();
    let recs: Value = test::call_and_read_body_json(&app, req).await;
    let names: Vec<&str> =
        recs.as_array().unwrap().iter().map(|r| r["name"].as_str().unwrap()).collect();

    assert_eq!(names, vec!["Stove", "Tent"]);
}

#[actix_web::test]
async fn test_recommendations_skip_private_listings_of_others() {
    let app = init_app!();
    let alice = register!(app, "alice");
    let bob = register!(app, "bob");
    let tag = create_tag!(app, alice, "outdoor");

    let tent = create_item!(
        app,
        alice,
        json!({ "name": "Tent", "price_per_day_cents": 1000, "tags": [tag] })
    );
    let secret = json!({
        "name": "Secret Saw",
        "price_per_day_cents": 900,
        "tags": [tag],
        "is_public": false,
    });
    create_item!(app, alice, secret);

    let req = test::TestRequest::post()
        .uri(&format!("/api/items/{tent}/favorite"))
        .insert_header((USER_ID_HEADER, bob.clone()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    let req = test::TestRequest::get()
        .uri("/api/recommendations")
        .insert_header((USER_ID_HEADER, bob))
        .to_request();
    let recs: Value = test::call_and_read_body_json(&app, req).await;
    let names: Vec<&str> =
        recs.as_array().unwrap().iter().map(|r| r["name"].as_str().unwrap()).collect();

    assert_eq!(names, vec!["Tent"]);
}

#[actix_web::test]
async fn test_private_listing_rejects_stranger_interactions() {
    let app = init_app!();
    let alice = register!(app, "alice");
    let bob = register!(app, "bob");
    let item = create_item!(
        app,
        alice,
        json!({ "name": "Secret Saw", "price_per_day_cents": 900, "is_public": false })
    );

    let like = test::TestRequest::post()
        .uri(&format!("/api/items/{item}/like"))
        .insert_header((USER_ID_HEADER, bob.clone()))
        .to_request();
    assert_eq!(test::call_service(&app, like).await.status(), 404);

    let rate = test::TestRequest::post()
        .uri(&format!("/api/items/{item}/rate"))
        .insert_header((USER_ID_HEADER, bob.clone()))
        .set_json(json!({ "value": 5 }))
        .to_request();
    assert_eq!(test::call_service(&app, rate).await.status(), 404);

    let comment = test::TestRequest::post()
        .uri(&format!("/api/items/{item}/comments"))
        .insert_header((USER_ID_HEADER, bob))
        .set_json(json!({ "text": "nice saw" }))
        .to_request();
    assert_eq!(test::call_service(&app, comment).await.status(), 404);

    let own = test::TestRequest::post()
        .uri(&format!("/api/items/{item}/like"))
        .insert_header((USER_ID_HEADER, alice))
        .to_request();
    assert_eq!(test::call_service(&app, own).await.status(), 201);
}

#[actix_web::test]
async fn test_saved_lists_are_owner_only() {
    let app = init_app!();
    let alice = register!(app, "alice");
    let bob = register!(app, "bob");
    let item = create_item!(app, alice, json!({ "name": "Tent", "price_per_day_cents": 1000 }));

    let req = test::TestRequest::post()
        .uri("/api/lists")
        .insert_header((USER_ID_HEADER, alice.clone()))
        .set_json(json!({ "name": " " }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    let req = test::TestRequest::post()
        .uri("/api/lists")
        .insert_header((USER_ID_HEADER, alice.clone()))
        .set_json(json!({ "name": "Camping trip" }))
        .to_request();
    let list: Value = test::call_and_read_body_json(&app, req).await;
    let list_id = list["id"].as_str().unwrap().to_string();
    assert_eq!(list["items"], json!([]));

    let add = |user: &String| {
        test::TestRequest::post()
            .uri(&format!("/api/lists/{list_id}/items"))
            .insert_header((USER_ID_HEADER, user.clone()))
            .set_json(json!({ "item_id": item }))
            .to_request()
    };
    let resp = test::call_service(&app, add(&alice)).await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "added");
    assert_eq!(test::call_service(&app, add(&alice)).await.status(), 409);
    assert_eq!(test::call_service(&app, add(&bob)).await.status(), 404);

    let req = test::TestRequest::get()
        .uri(&format!("/api/lists/{list_id}"))
        .insert_header((USER_ID_HEADER, bob.clone()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);

    let req = test::TestRequest::get()
        .uri("/api/lists")
        .insert_header((USER_ID_HEADER, bob))
        .to_request();
    let lists: Value = test::call_and_read_body_json(&app, req).await;
    assert!(lists.as_array().unwrap().is_empty());

    let req = test::TestRequest::get()
        .uri("/api/lists")
        .insert_header((USER_ID_HEADER, alice))
        .to_request();
    let lists: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(lists[0]["name"], "Camping trip");
    assert_eq!(lists[0]["items"], json!([item]));
}
