mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{TestApp, get, post, register};

const IP: &str = "10.0.0.4";

#[tokio::test]
async fn fresh_account_has_empty_profile_fields() {
    let app = TestApp::start().await;
    let sid = register(&app, IP, "alice@example.com", "alice", "password123").await;

    let reply = get(&app.router, "/api/profile", IP, Some(&sid)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["email"], "alice@example.com");
    assert_eq!(reply.body["username"], "alice");
    assert_eq!(reply.body["name"], "Test User");
    assert_eq!(reply.body["about"], "");
    assert_eq!(reply.body["badges"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn partial_update_keeps_untouched_fields() {
    let app = TestApp::start().await;
    let sid = register(&app, IP, "alice@example.com", "alice", "password123").await;

    let reply = post(
        &app.router,
        "/api/profile",
        IP,
        Some(&sid),
        json!({ "about": "hello there" }),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);

    let reply = get(&app.router, "/api/profile", IP, Some(&sid)).await;
    assert_eq!(reply.body["about"], "hello there");
    assert_eq!(reply.body["name"], "Test User");
    assert_eq!(reply.body["username"], "alice");
}

#[tokio::test]
async fn update_validates_fields() {
    let app = TestApp::start().await;
    let sid = register(&app, IP, "alice@example.com", "alice", "password123").await;

    let reply = post(
        &app.router,
        "/api/profile",
        IP,
        Some(&sid),
        json!({ "name": "   " }),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.error_code(), "BAD_NAME");

    let reply = post(
        &app.router,
        "/api/profile",
        IP,
        Some(&sid),
        json!({ "username": "No Caps Allowed" }),
    )
    .await;
    assert_eq!(reply.error_code(), "BAD_USERNAME");

    let reply = post(
        &app.router,
        "/api/profile",
        IP,
        Some(&sid),
        json!({ "about": "a".repeat(241) }),
    )
    .await;
    assert_eq!(reply.error_code(), "BAD_ABOUT");
}

#[tokio::test]
async fn badges_are_filtered_against_the_allow_list() {
    let app = TestApp::start().await;
    let sid = register(&app, IP, "alice@example.com", "alice", "password123").await;

    let reply = post(
        &app.router,
        "/api/profile",
        IP,
        Some(&sid),
        json!({ "badges": ["verified", "made-up", "premium", "verified", "early"] }),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);

    let reply = get(&app.router, "/api/profile", IP, Some(&sid)).await;
    let badges: Vec<&str> = reply.body["badges"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b.as_str().unwrap())
        .collect();
    assert_eq!(badges, vec!["verified", "premium", "early"]);
}

#[tokio::test]
async fn username_change_moves_the_index() {
    let app = TestApp::start().await;
    let sid = register(&app, IP, "alice@example.com", "alice", "password123").await;
    let bob_sid = register(&app, IP, "bob@example.com", "bob", "password123").await;

    let reply = post(
        &app.router,
        "/api/profile",
        IP,
        Some(&sid),
        json!({ "username": "@Wonderland" }),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);

    // old handle is free, new one resolves
    let reply = get(&app.router, "/api/users/alice", IP, Some(&bob_sid)).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    let reply = get(&app.router, "/api/users/wonderland", IP, Some(&bob_sid)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["user"]["username"], "wonderland");

    // index and record agree
    let kv = app.kv();
    assert_eq!(
        kv.email_for_username("wonderland").await.unwrap().as_deref(),
        Some("alice@example.com")
    );
    assert_eq!(kv.email_for_username("alice").await.unwrap(), None);
}

#[tokio::test]
async fn username_change_to_a_taken_handle_is_refused() {
    let app = TestApp::start().await;
    let sid = register(&app, IP, "alice@example.com", "alice", "password123").await;
    register(&app, IP, "bob@example.com", "bob", "password123").await;

    let reply = post(
        &app.router,
        "/api/profile",
        IP,
        Some(&sid),
        json!({ "username": "bob" }),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.error_code(), "USERNAME_TAKEN");

    // nothing moved
    let kv = app.kv();
    assert_eq!(
        kv.email_for_username("alice").await.unwrap().as_deref(),
        Some("alice@example.com")
    );
    assert_eq!(
        kv.email_for_username("bob").await.unwrap().as_deref(),
        Some("bob@example.com")
    );
}

#[tokio::test]
async fn public_lookup_exposes_no_private_fields() {
    let app = TestApp::start().await;
    let sid = register(&app, IP, "alice@example.com", "alice", "password123").await;
    register(&app, IP, "bob@example.com", "bob", "password123").await;

    let reply = get(&app.router, "/api/users/bob", IP, Some(&sid)).await;
    assert_eq!(reply.status, StatusCode::OK);
    let user = &reply.body["user"];
    assert_eq!(user["username"], "bob");
    assert!(user.get("email").is_none());
    assert!(user.get("pwHash").is_none());

    let reply = get(&app.router, "/api/users/nobody", IP, Some(&sid)).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dangling_username_index_reads_as_not_found() {
    let app = TestApp::start().await;
    let sid = register(&app, IP, "alice@example.com", "alice", "password123").await;

    // simulate a crash that left an index without its record
    let kv = app.kv();
    kv.bind_username("phantom", "phantom@example.com").await.unwrap();

    let reply = get(&app.router, "/api/users/phantom", IP, Some(&sid)).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}
