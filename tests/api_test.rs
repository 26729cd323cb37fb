//! HTTP-level tests against the full router

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use techlabs::{
    api, app,
    config::{Config, StorageConfig, StorageDriver},
};

const ADMIN_EMAIL: &str = "admin@techlabs.org";
const ADMIN_PASSWORD: &str = "admin-password";

async fn server_with(storage: StorageConfig) -> TestServer {
    let mut config = Config::default();
    config.storage = storage;
    config.auth.admin_email = Some(ADMIN_EMAIL.to_string());
    config.auth.admin_password = Some(ADMIN_PASSWORD.to_string());

    let state = app::bootstrap(&config).await.expect("bootstrap");
    let router = api::build_router(state, &config.server).expect("router");
    TestServer::new(router).expect("test server")
}

/// Empty in-memory store with an admin account
async fn server() -> TestServer {
    server_with(StorageConfig {
        seed: false,
        ..StorageConfig::default()
    })
    .await
}

async fn admin_token(server: &TestServer) -> String {
    let response = server
        .post("/api/auth/login")
        .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    body["data"]["token"]
        .as_str()
        .expect("token in login response")
        .to_string()
}

fn event_body() -> Value {
    json!({
        "title": "Semester Kickoff",
        "blurb": "Meet the new Digital Shapers",
        "date": "2026-11-05",
        "location": "Berlin",
        "type": "upcoming",
        "imageUrl": "/images/kickoff.jpg",
        "href": "/events/kickoff"
    })
}

// ============================================================================
// Events
// ============================================================================

#[tokio::test]
async fn test_event_lifecycle() {
    let server = server().await;

    let created = server.post("/api/events").json(&event_body()).await;
    created.assert_status(StatusCode::CREATED);
    let created: Value = created.json();
    let event = &created["data"];
    let id = event["id"].as_str().expect("generated id");
    assert_eq!(event["title"], "Semester Kickoff");
    assert_eq!(event["date"], "2026-11-05");
    assert_eq!(event["type"], "upcoming");
    assert!(event["createdAt"].is_string());

    let fetched = server.get(&format!("/api/events/{}", id)).await;
    fetched.assert_status_ok();
    assert_eq!(fetched.json::<Value>()["data"], *event);

    let listed: Value = server.get("/api/events").await.json();
    assert_eq!(listed["data"].as_array().map(Vec::len), Some(1));
    assert!(listed.get("meta").is_none());

    let deleted = server.delete(&format!("/api/events/{}", id)).await;
    deleted.assert_status(StatusCode::NO_CONTENT);

    server
        .get(&format!("/api/events/{}", id))
        .await
        .assert_status_not_found();
    server
        .patch(&format!("/api/events/{}", id))
        .json(&json!({ "title": "Ghost" }))
        .await
        .assert_status_not_found();
    server
        .delete(&format!("/api/events/{}", id))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_partial_update_keeps_other_fields() {
    let server = server().await;
    let created: Value = server.post("/api/events").json(&event_body()).await.json();
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let response = server
        .patch(&format!("/api/events/{}", id))
        .json(&json!({ "location": "Hamburg", "type": "past" }))
        .await;
    response.assert_status_ok();
    let updated: Value = response.json();

    assert_eq!(updated["data"]["location"], "Hamburg");
    assert_eq!(updated["data"]["type"], "past");
    assert_eq!(updated["data"]["title"], created["data"]["title"]);
    assert_eq!(updated["data"]["blurb"], created["data"]["blurb"]);
    assert_eq!(updated["data"]["createdAt"], created["data"]["createdAt"]);

    // PUT follows the same merge semantics
    let put: Value = server
        .put(&format!("/api/events/{}", id))
        .json(&json!({ "title": "Kickoff, renamed" }))
        .await
        .json();
    assert_eq!(put["data"]["title"], "Kickoff, renamed");
    assert_eq!(put["data"]["location"], "Hamburg");
}

#[tokio::test]
async fn test_missing_field_is_validation_error() {
    let server = server().await;
    let mut body = event_body();
    body.as_object_mut().unwrap().remove("location");

    let response = server.post("/api/events").json(&body).await;
    response.assert_status_bad_request();
    let error: Value = response.json();
    assert_eq!(error["error"]["code"], "VALIDATION_ERROR");
    assert!(error["error"]["message"].is_string());
}

#[tokio::test]
async fn test_wrong_type_and_bad_date_are_validation_errors() {
    let server = server().await;

    let mut wrong_type = event_body();
    wrong_type["type"] = json!("someday");
    server
        .post("/api/events")
        .json(&wrong_type)
        .await
        .assert_status_bad_request();

    let mut bad_date = event_body();
    bad_date["date"] = json!("next tuesday");
    server
        .post("/api/events")
        .json(&bad_date)
        .await
        .assert_status_bad_request();

    let blank_title = {
        let mut body = event_body();
        body["title"] = json!("   ");
        body
    };
    let response = server.post("/api/events").json(&blank_title).await;
    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_malformed_json_is_validation_error() {
    let server = server().await;
    let response = server
        .post("/api/events")
        .content_type("application/json")
        .text("{ \"title\": ")
        .await;
    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_malformed_id_is_not_found() {
    let server = server().await;
    let response = server.get("/api/events/507f1f77bcf86cd799439011").await;
    response.assert_status_not_found();
    assert_eq!(response.json::<Value>()["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_pagination_meta() {
    let server = server().await;
    for day in 1..=5 {
        let mut body = event_body();
        body["date"] = json!(format!("2026-11-0{}", day));
        body["title"] = json!(format!("Event {}", day));
        server.post("/api/events").json(&body).await.assert_status(StatusCode::CREATED);
    }

    let page: Value = server
        .get("/api/events")
        .add_query_param("page", 2)
        .add_query_param("limit", 2)
        .await
        .json();
    assert_eq!(page["data"][0]["title"], "Event 3");
    assert_eq!(page["meta"]["total"], 5);
    assert_eq!(page["meta"]["totalPages"], 3);

    let desc: Value = server
        .get("/api/events")
        .add_query_param("order", "desc")
        .await
        .json();
    assert_eq!(desc["data"][0]["title"], "Event 5");

    server
        .get("/api/events")
        .add_query_param("sort", "password")
        .await
        .assert_status_bad_request();
    server
        .get("/api/events")
        .add_query_param("page", "first")
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn test_seeded_events() {
    let server = server_with(StorageConfig::default()).await;
    let listed: Value = server.get("/api/events").await.json();
    let events = listed["data"].as_array().expect("event list");
    assert!(!events.is_empty());

    let dates: Vec<&str> = events.iter().filter_map(|e| e["date"].as_str()).collect();
    let mut sorted = dates.clone();
    sorted.sort();
    assert_eq!(dates, sorted);

    let posts: Value = server.get("/api/blog").await.json();
    assert!(!posts["data"].as_array().unwrap().is_empty());
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn test_login_and_protected_routes() {
    let server = server().await;

    let wrong = server
        .post("/api/auth/login")
        .json(&json!({ "email": ADMIN_EMAIL, "password": "not-the-password" }))
        .await;
    wrong.assert_status_unauthorized();
    assert_eq!(wrong.json::<Value>()["error"]["code"], "UNAUTHORIZED");

    server.get("/api/auth/me").await.assert_status_unauthorized();
    server.get("/api/admin/stats").await.assert_status_unauthorized();

    let token = admin_token(&server).await;

    let me = server.get("/api/auth/me").authorization_bearer(&token).await;
    me.assert_status_ok();
    let me: Value = me.json();
    assert_eq!(me["data"]["email"], ADMIN_EMAIL);
    assert_eq!(me["data"]["role"], "admin");
    assert!(me["data"].get("passwordHash").is_none());

    let stats = server
        .get("/api/admin/stats")
        .authorization_bearer(&token)
        .await;
    stats.assert_status_ok();
    assert_eq!(stats.json::<Value>()["data"]["users"]["admins"], 1);

    server
        .get("/api/auth/me")
        .authorization_bearer("garbage.token.value")
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn test_non_admin_is_forbidden_from_admin_routes() {
    let server = server().await;
    let token = admin_token(&server).await;

    server
        .post("/api/admin/users")
        .authorization_bearer(&token)
        .json(&json!({ "email": "member@techlabs.org", "password": "member-password" }))
        .await
        .assert_status(StatusCode::CREATED);

    let login: Value = server
        .post("/api/auth/login")
        .json(&json!({ "email": "member@techlabs.org", "password": "member-password" }))
        .await
        .json();
    let member_token = login["data"]["token"].as_str().unwrap().to_string();

    server
        .get("/api/auth/me")
        .authorization_bearer(&member_token)
        .await
        .assert_status_ok();

    let forbidden = server
        .get("/api/admin/users")
        .authorization_bearer(&member_token)
        .await;
    forbidden.assert_status_forbidden();
    assert_eq!(forbidden.json::<Value>()["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_user_management() {
    let server = server().await;
    let token = admin_token(&server).await;

    let created = server
        .post("/api/admin/users")
        .authorization_bearer(&token)
        .json(&json!({ "email": "Editor@TechLabs.org", "password": "editor-password" }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let created: Value = created.json();
    assert_eq!(created["data"]["email"], "editor@techlabs.org");
    assert_eq!(created["data"]["role"], "user");
    let id = created["data"]["id"].as_str().unwrap().to_string();

    server
        .post("/api/admin/users")
        .authorization_bearer(&token)
        .json(&json!({ "email": "editor@techlabs.org", "password": "editor-password" }))
        .await
        .assert_status(StatusCode::CONFLICT);

    let deactivated: Value = server
        .patch(&format!("/api/admin/users/{}", id))
        .authorization_bearer(&token)
        .json(&json!({ "isActive": false }))
        .await
        .json();
    assert_eq!(deactivated["data"]["isActive"], false);

    server
        .post("/api/auth/login")
        .json(&json!({ "email": "editor@techlabs.org", "password": "editor-password" }))
        .await
        .assert_status_forbidden();

    server
        .delete(&format!("/api/admin/users/{}", id))
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let users: Value = server
        .get("/api/admin/users")
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(users["data"].as_array().map(Vec::len), Some(1));
}

// ============================================================================
// Blog
// ============================================================================

#[tokio::test]
async fn test_published_at_set_once_and_public_visibility() {
    let server = server().await;
    let token = admin_token(&server).await;

    let created = server
        .post("/api/admin/blog")
        .authorization_bearer(&token)
        .json(&json!({
            "title": "Demo Day Recap",
            "content": "Twelve teams presented their projects.",
            "author": "TechLabs Team",
            "tags": ["projects"]
        }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let created: Value = created.json();
    let id = created["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(created["data"]["slug"], "demo-day-recap");
    assert_eq!(created["data"]["status"], "draft");
    assert!(created["data"]["publishedAt"].is_null());

    // Drafts are invisible publicly
    server
        .get("/api/blog/demo-day-recap")
        .await
        .assert_status_not_found();

    let published: Value = server
        .patch(&format!("/api/admin/blog/{}", id))
        .authorization_bearer(&token)
        .json(&json!({ "status": "published" }))
        .await
        .json();
    let published_at = published["data"]["publishedAt"].clone();
    assert!(published_at.is_string());

    let public = server.get("/api/blog/demo-day-recap").await;
    public.assert_status_ok();
    assert_eq!(public.json::<Value>()["data"]["id"], id.as_str());

    let unpublished: Value = server
        .patch(&format!("/api/admin/blog/{}", id))
        .authorization_bearer(&token)
        .json(&json!({ "status": "draft" }))
        .await
        .json();
    assert_eq!(unpublished["data"]["publishedAt"], published_at);

    let republished: Value = server
        .patch(&format!("/api/admin/blog/{}", id))
        .authorization_bearer(&token)
        .json(&json!({ "status": "published" }))
        .await
        .json();
    assert_eq!(republished["data"]["publishedAt"], published_at);
}

#[tokio::test]
async fn test_duplicate_slug_conflicts() {
    let server = server().await;
    let token = admin_token(&server).await;
    let post = json!({
        "title": "Hello",
        "slug": "hello",
        "content": "First post",
        "author": "TechLabs Team"
    });

    server
        .post("/api/admin/blog")
        .authorization_bearer(&token)
        .json(&post)
        .await
        .assert_status(StatusCode::CREATED);

    let conflict = server
        .post("/api/admin/blog")
        .authorization_bearer(&token)
        .json(&post)
        .await;
    conflict.assert_status(StatusCode::CONFLICT);
    assert_eq!(conflict.json::<Value>()["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_admin_blog_requires_admin_token() {
    let server = server().await;
    server
        .post("/api/admin/blog")
        .json(&json!({ "title": "x", "content": "y", "author": "z" }))
        .await
        .assert_status_unauthorized();
}

// ============================================================================
// Router behaviour
// ============================================================================

#[tokio::test]
async fn test_health_and_headers() {
    let server = server().await;
    let response = server.get("/api/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["storage"], "memory");

    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.header("x-content-type-options"), "nosniff");
    assert_eq!(response.header("x-frame-options"), "DENY");
}

#[tokio::test]
async fn test_unknown_route_is_json_not_found() {
    let server = server().await;
    let response = server.get("/api/does-not-exist").await;
    response.assert_status_not_found();
    assert_eq!(response.json::<Value>()["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_sqlite_driver_round_trip() {
    let server = server_with(StorageConfig {
        driver: StorageDriver::Sqlite,
        url: ":memory:".to_string(),
        ..StorageConfig::default()
    })
    .await;

    let health: Value = server.get("/api/health").await.json();
    assert_eq!(health["data"]["storage"], "sqlite");

    let created: Value = server.post("/api/events").json(&event_body()).await.json();
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let fetched: Value = server.get(&format!("/api/events/{}", id)).await.json();
    for field in ["id", "title", "blurb", "date", "location", "type", "imageUrl", "href"] {
        assert_eq!(fetched["data"][field], created["data"][field], "{}", field);
    }

    let token = admin_token(&server).await;
    server
        .get("/api/admin/events")
        .authorization_bearer(&token)
        .await
        .assert_status_ok();
}
